//! 匹配器集成测试
//!
//! 引用集独立性、少引用容忍、并发查询。

use std::sync::Arc;

use xinhuo::baseline::TableKind;
use xinhuo::delta::MemorySink;
use xinhuo::edits::SemanticEdit;
use xinhuo::emit_difference;
use xinhuo::matcher::SymbolMatcher;
use xinhuo::slots::NullDebugInfoProvider;
use xinhuo::symbols::{
    AssemblyIdentity, BodyDescriptor, StructuralSignature, SymbolGraph, SymbolGraphBuilder,
    TypeRef,
};

use super::common::{find_method, initial_baseline, int, object, void};

fn proclib() -> AssemblyIdentity {
    AssemblyIdentity::new("proclib", (1, 0, 0, 0))
}

fn extralib() -> AssemblyIdentity {
    AssemblyIdentity::new("extralib", (9, 9, 0, 0))
}

/// 基线快照：引用 proclib（以及可选的多余 extralib），
/// C 上有 F(object)/F(ProcessType) 重载和无关方法 G
fn old_snapshot(with_extra_reference: bool) -> SymbolGraph {
    let mut b = SymbolGraphBuilder::new();
    let unit = b.unit("app", (1, 0, 0, 0));
    b.reference(unit, proclib());
    if with_extra_reference {
        b.reference(unit, extralib());
    }
    let ty = b.type_def(unit, "App.C");
    b.method(ty, "F", StructuralSignature::method([object()], void()));
    b.method(
        ty,
        "F",
        StructuralSignature::method(
            [TypeRef::named(proclib(), "Lib.ProcessType")],
            void(),
        ),
    );
    let g = b.method(ty, "G", StructuralSignature::method([int()], int()));
    b.set_body(g, BodyDescriptor::default());
    b.finish()
}

#[test]
fn test_reference_set_independence() {
    // 基线多带一个从未用到的 extralib 引用
    let old = old_snapshot(true);
    let baseline = initial_baseline(&old);

    // 新快照保留全部引用，更新无关方法 G
    let mut b = SymbolGraphBuilder::new();
    let unit = b.unit("app", (1, 0, 0, 0));
    b.reference(unit, proclib());
    b.reference(unit, extralib());
    let ty = b.type_def(unit, "App.C");
    let f_obj = b.method(ty, "F", StructuralSignature::method([object()], void()));
    b.method(
        ty,
        "F",
        StructuralSignature::method(
            [TypeRef::named(proclib(), "Lib.ProcessType")],
            void(),
        ),
    );
    let g = b.method(ty, "G", StructuralSignature::method([int()], int()));
    b.set_body(g, BodyDescriptor::default());
    let new = b.finish();

    let matcher = SymbolMatcher::new(&old, &new, &baseline);

    // 多余引用不得影响重载绑定：F(object) 仍是第一条方法行
    let handle = matcher.map_definition(f_obj).expect("must match");
    assert_eq!(handle.table, TableKind::MethodDef);
    assert_eq!(handle.row, 1);

    // 无关方法照常解析为原句柄
    let g_handle = matcher.map_definition(g).expect("must match");
    assert_eq!(g_handle.row, 3);
}

#[test]
fn test_fewer_reference_tolerance_end_to_end() {
    let old = old_snapshot(false);
    let baseline = initial_baseline(&old);

    // 新快照不再引用 proclib：只剩 F(object)
    let mut b = SymbolGraphBuilder::new();
    let unit = b.unit("app", (1, 0, 0, 0));
    let ty = b.type_def(unit, "App.C");
    let f_obj = b.method(ty, "F", StructuralSignature::method([object()], void()));
    b.set_body(
        f_obj,
        BodyDescriptor {
            code: vec![0x2a],
            ..Default::default()
        },
    );
    let g = b.method(ty, "G", StructuralSignature::method([int()], int()));
    b.set_body(g, BodyDescriptor::default());
    let new = b.finish();

    let old_f = find_method(&old, "App.C.F");
    let mut sink = MemorySink::new();
    let result = emit_difference(
        &old,
        &new,
        Arc::clone(&baseline),
        &[SemanticEdit::update(old_f, f_obj, None, false)],
        &NullDebugInfoProvider,
        &mut sink,
    );

    assert!(result.success, "diagnostics: {:?}", result.diagnostics);
    let delta = result.delta.unwrap();
    // 必须绑到 F(object) 的行（第 1 行），而不是 F(ProcessType)
    assert_eq!(delta.bodies.bodies()[0].method.row, 1);
}

#[test]
fn test_concurrent_queries_need_no_external_locking() {
    let old = old_snapshot(true);
    let baseline = initial_baseline(&old);

    let mut b = SymbolGraphBuilder::new();
    let unit = b.unit("app", (1, 0, 0, 0));
    b.reference(unit, proclib());
    b.reference(unit, extralib());
    let ty = b.type_def(unit, "App.C");
    let f_obj = b.method(ty, "F", StructuralSignature::method([object()], void()));
    let g = b.method(ty, "G", StructuralSignature::method([int()], int()));
    let new = b.finish();

    let matcher = SymbolMatcher::new(&old, &new, &baseline);
    let expected_f = matcher.map_definition(f_obj);
    let expected_g = matcher.map_definition(g);

    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                for _ in 0..100 {
                    assert_eq!(matcher.map_definition(f_obj), expected_f);
                    assert_eq!(matcher.map_definition(g), expected_g);
                }
            });
        }
    });
}
