//! 合成成员复用端到端测试
//!
//! 形状未变的匿名类型跨代零新行；首次出现的形状恰好一行；
//! 闭包捕获集变化合成新容器；不再需要的辅助例程不再进增量。

use std::sync::Arc;

use xinhuo::baseline::TableKind;
use xinhuo::delta::{MemorySink, TableRow};
use xinhuo::edits::SemanticEdit;
use xinhuo::emit_difference;
use xinhuo::slots::NullDebugInfoProvider;
use xinhuo::symbols::{
    AnonymousShape, BodyDescriptor, ClosureUse, HelperKind, StructuralSignature, SymbolGraph,
    SymbolGraphBuilder,
};

use super::common::{find_method, initial_baseline, int, text, void};

fn shape_a() -> AnonymousShape {
    AnonymousShape::new([("A".to_string(), int())])
}

fn shape_ab() -> AnonymousShape {
    AnonymousShape::new([("A".to_string(), int()), ("B".to_string(), text())])
}

/// F 的体里用一个匿名形状字面量；`code` 区分字面量的值
fn program_with_shape(shape: AnonymousShape, code: &[u8]) -> SymbolGraph {
    let mut b = SymbolGraphBuilder::new();
    let unit = b.unit("app", (1, 0, 0, 0));
    let ty = b.type_def(unit, "App.C");
    let f = b.method(ty, "F", StructuralSignature::method([], void()));
    b.set_body(
        f,
        BodyDescriptor {
            anonymous_shapes: vec![shape],
            code: code.to_vec(),
            ..Default::default()
        },
    );
    b.finish()
}

fn type_def_rows(delta: &xinhuo::delta::DeltaArtifacts) -> usize {
    delta.tables.rows_of(TableKind::TypeDef).len()
}

#[test]
fn test_unchanged_shape_emits_zero_container_rows_across_two_generations() {
    let gen0 = program_with_shape(shape_a(), &[0x01]);
    let baseline = initial_baseline(&gen0);

    // 两代只改字面量的值，字段元组不变
    let gen1_graph = program_with_shape(shape_a(), &[0x02]);
    let mut sink = MemorySink::new();
    let gen1 = emit_difference(
        &gen0,
        &gen1_graph,
        baseline,
        &[SemanticEdit::update(
            find_method(&gen0, "App.C.F"),
            find_method(&gen1_graph, "App.C.F"),
            None,
            false,
        )],
        &NullDebugInfoProvider,
        &mut sink,
    );
    assert!(gen1.success);
    assert_eq!(type_def_rows(gen1.delta.as_ref().unwrap()), 0);

    let gen2_graph = program_with_shape(shape_a(), &[0x03]);
    let mut sink = MemorySink::new();
    let gen2 = emit_difference(
        &gen1_graph,
        &gen2_graph,
        gen1.next_baseline,
        &[SemanticEdit::update(
            find_method(&gen1_graph, "App.C.F"),
            find_method(&gen2_graph, "App.C.F"),
            None,
            false,
        )],
        &NullDebugInfoProvider,
        &mut sink,
    );
    assert!(gen2.success);
    assert_eq!(type_def_rows(gen2.delta.as_ref().unwrap()), 0);
}

#[test]
fn test_first_use_of_new_shape_emits_exactly_one_container_row() {
    let gen0 = program_with_shape(shape_a(), &[0x01]);
    let baseline = initial_baseline(&gen0);
    let prior_names = baseline.synthesized_names.clone();

    let gen1_graph = program_with_shape(shape_ab(), &[0x01]);
    let mut sink = MemorySink::new();
    let gen1 = emit_difference(
        &gen0,
        &gen1_graph,
        baseline,
        &[SemanticEdit::update(
            find_method(&gen0, "App.C.F"),
            find_method(&gen1_graph, "App.C.F"),
            None,
            false,
        )],
        &NullDebugInfoProvider,
        &mut sink,
    );
    assert!(gen1.success);

    let delta = gen1.delta.unwrap();
    assert_eq!(type_def_rows(&delta), 1);

    // 新容器名带代后缀，且与历代存活名不冲突
    let (_, row) = &delta.tables.rows_of(TableKind::TypeDef)[0];
    match row {
        TableRow::TypeDef { name, .. } => {
            assert!(name.contains("#1"), "generation suffix expected: {}", name);
            assert!(!prior_names.contains(name));
        }
        other => panic!("unexpected row {:?}", other),
    }

    // 形状登记进了下一代基线
    assert!(gen1.next_baseline.anonymous_shapes.contains_key(&shape_ab()));
    // 旧形状的登记保持不变
    assert!(gen1.next_baseline.anonymous_shapes.contains_key(&shape_a()));
}

#[test]
fn test_closure_capture_change_synthesizes_suffixed_container() {
    // 基线：F 的闭包捕获 {x}
    let mut b = SymbolGraphBuilder::new();
    let unit = b.unit("app", (1, 0, 0, 0));
    let ty = b.type_def(unit, "App.C");
    let f = b.method(ty, "F", StructuralSignature::method([], void()));
    b.set_body(
        f,
        BodyDescriptor {
            closures: vec![ClosureUse::new(["x".to_string()])],
            ..Default::default()
        },
    );
    let old = b.finish();
    let baseline = initial_baseline(&old);
    let containers_before = baseline.closure_containers.len();

    // 编辑后捕获集变成 {x, y}
    let mut b = SymbolGraphBuilder::new();
    let unit = b.unit("app", (1, 0, 0, 0));
    let ty = b.type_def(unit, "App.C");
    let f_new = b.method(ty, "F", StructuralSignature::method([], void()));
    b.set_body(
        f_new,
        BodyDescriptor {
            closures: vec![ClosureUse::new(["x".to_string(), "y".to_string()])],
            ..Default::default()
        },
    );
    let new = b.finish();

    let mut sink = MemorySink::new();
    let result = emit_difference(
        &old,
        &new,
        baseline,
        &[SemanticEdit::update(
            find_method(&old, "App.C.F"),
            f_new,
            None,
            false,
        )],
        &NullDebugInfoProvider,
        &mut sink,
    );
    assert!(result.success);

    // 旧容器原样保留（可能还有存活实例），新容器另起一行
    assert_eq!(
        result.next_baseline.closure_containers.len(),
        containers_before + 1
    );
    assert_eq!(type_def_rows(result.delta.as_ref().unwrap()), 1);
}

#[test]
fn test_dropped_helper_is_not_resynthesized() {
    // 基线：F 的体需要字符串分支哈希辅助
    let mut b = SymbolGraphBuilder::new();
    let unit = b.unit("app", (1, 0, 0, 0));
    let ty = b.type_def(unit, "App.C");
    let f = b.method(ty, "F", StructuralSignature::method([], void()));
    b.set_body(
        f,
        BodyDescriptor {
            helpers: vec![HelperKind::StringSwitchHash],
            ..Default::default()
        },
    );
    let old = b.finish();
    let baseline = initial_baseline(&old);
    let helper_handle = baseline.helper_methods[&HelperKind::StringSwitchHash];

    // 编辑后的体不再含字符串分支
    let mut b = SymbolGraphBuilder::new();
    let unit = b.unit("app", (1, 0, 0, 0));
    let ty = b.type_def(unit, "App.C");
    let f_new = b.method(ty, "F", StructuralSignature::method([], void()));
    b.set_body(f_new, BodyDescriptor::default());
    let new = b.finish();

    let mut sink = MemorySink::new();
    let result = emit_difference(
        &old,
        &new,
        baseline,
        &[SemanticEdit::update(
            find_method(&old, "App.C.F"),
            f_new,
            None,
            false,
        )],
        &NullDebugInfoProvider,
        &mut sink,
    );
    assert!(result.success);

    // 增量里只有更新方法本身的行，辅助没有被重新合成
    let delta = result.delta.unwrap();
    assert_eq!(delta.tables.rows_of(TableKind::MethodDef).len(), 1);
    // 类型仍然存在：注册表里的句柄原样保留
    assert_eq!(
        result.next_baseline.helper_methods[&HelperKind::StringSwitchHash],
        helper_handle
    );
}

#[test]
fn test_helper_still_needed_reuses_prior_handle() {
    let mut b = SymbolGraphBuilder::new();
    let unit = b.unit("app", (1, 0, 0, 0));
    let ty = b.type_def(unit, "App.C");
    let f = b.method(ty, "F", StructuralSignature::method([], void()));
    b.set_body(
        f,
        BodyDescriptor {
            helpers: vec![HelperKind::StringSwitchHash],
            ..Default::default()
        },
    );
    let old = b.finish();
    let baseline = initial_baseline(&old);

    let mut b = SymbolGraphBuilder::new();
    let unit = b.unit("app", (1, 0, 0, 0));
    let ty = b.type_def(unit, "App.C");
    let f_new = b.method(ty, "F", StructuralSignature::method([], void()));
    b.set_body(
        f_new,
        BodyDescriptor {
            helpers: vec![HelperKind::StringSwitchHash],
            ..Default::default()
        },
    );
    let new = b.finish();

    let mut sink = MemorySink::new();
    let result = emit_difference(
        &old,
        &new,
        baseline,
        &[SemanticEdit::update(
            find_method(&old, "App.C.F"),
            f_new,
            None,
            false,
        )],
        &NullDebugInfoProvider,
        &mut sink,
    );
    assert!(result.success);
    // 复用基线的辅助：同样只有更新方法的一行
    assert_eq!(
        result
            .delta
            .unwrap()
            .tables
            .rows_of(TableKind::MethodDef)
            .len(),
        1
    );
}
