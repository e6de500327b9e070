//! 流水线端到端测试
//!
//! 覆盖一代增量的完整旅程：校验、编码、三个输出流、基线推进。

use std::sync::Arc;

use xinhuo::baseline::TableKind;
use xinhuo::delta::{DeltaSink, EditOperation, MemorySink, StreamKind, MISSING_MEMBER_BODY};
use xinhuo::edits::SemanticEdit;
use xinhuo::slots::NullDebugInfoProvider;
use xinhuo::symbols::{
    BodyDescriptor, LocalDecl, SequencePoint, StructuralSignature, SymbolGraph,
    SymbolGraphBuilder, SyntaxNodeId,
};
use xinhuo::{emit_difference, DeltaPipeline, EmitConfig};

use super::common::{find_method, initial_baseline, int, void};

/// App.C { F(int), G() } 的快照；`code` 是 F 的体
fn program(code: &[u8]) -> SymbolGraph {
    let mut b = SymbolGraphBuilder::new();
    let unit = b.unit("app", (1, 0, 0, 0));
    let ty = b.type_def(unit, "App.C");
    let f = b.method(ty, "F", StructuralSignature::method([int()], void()));
    b.set_body(
        f,
        BodyDescriptor {
            locals: vec![LocalDecl {
                syntax: SyntaxNodeId::new(10),
                name: "count".to_string(),
                ty: int(),
            }],
            code: code.to_vec(),
            document: "src/app.x".to_string(),
            sequence_points: vec![SequencePoint {
                il_offset: 0,
                line: 3,
                column: 5,
            }],
            ..Default::default()
        },
    );
    let g = b.method(ty, "G", StructuralSignature::method([], void()));
    b.set_body(g, BodyDescriptor::default());
    b.finish()
}

#[test]
fn test_update_produces_minimal_delta() {
    let old = program(&[0x2a]);
    let new = program(&[0x17, 0x2a]);
    let baseline = initial_baseline(&old);

    let edit = SemanticEdit::update(
        find_method(&old, "App.C.F"),
        find_method(&new, "App.C.F"),
        Some(Arc::new(|n| Some(n))),
        true,
    );
    let mut sink = MemorySink::new();
    let result = emit_difference(
        &old,
        &new,
        Arc::clone(&baseline),
        &[edit],
        &NullDebugInfoProvider,
        &mut sink,
    );

    assert!(result.success, "diagnostics: {:?}", result.diagnostics);
    let delta = result.delta.expect("delta on success");

    // 只有 F 被触及：一条 MethodDef 行，没有 TypeDef 行
    assert_eq!(delta.tables.rows_of(TableKind::MethodDef).len(), 1);
    assert!(delta.tables.rows_of(TableKind::TypeDef).is_empty());
    assert_eq!(delta.bodies.len(), 1);
    assert_eq!(delta.bodies.bodies()[0].code, vec![0x17, 0x2a]);

    // 编辑日志：更新行是 Default 操作
    assert!(delta
        .edit_log
        .entries()
        .iter()
        .any(|e| e.handle.table == TableKind::MethodDef
            && e.operation == EditOperation::Default));

    // 三个流都写出了字节
    assert!(!sink.metadata.is_empty());
    assert!(!sink.code.is_empty());
    assert!(!sink.debug.is_empty());

    // 基线推进了一代，行数只增不减
    assert_eq!(result.next_baseline.generation, 1);
    for (kind, count) in result.next_baseline.row_counts.iter() {
        assert!(count >= baseline.row_counts.count(kind));
    }
}

#[test]
fn test_insert_method_logs_parent_before_child() {
    let old = program(&[0x2a]);

    // 新快照多了一个方法 H(int)
    let mut b = SymbolGraphBuilder::new();
    let unit = b.unit("app", (1, 0, 0, 0));
    let ty = b.type_def(unit, "App.C");
    let f = b.method(ty, "F", StructuralSignature::method([int()], void()));
    b.set_body(f, BodyDescriptor::default());
    let g = b.method(ty, "G", StructuralSignature::method([], void()));
    b.set_body(g, BodyDescriptor::default());
    let h = b.method(ty, "H", StructuralSignature::method([int()], void()));
    b.set_body(h, BodyDescriptor::default());
    let new = b.finish();

    let baseline = initial_baseline(&old);
    let mut sink = MemorySink::new();
    let result = emit_difference(
        &old,
        &new,
        Arc::clone(&baseline),
        &[SemanticEdit::insert(h)],
        &NullDebugInfoProvider,
        &mut sink,
    );
    assert!(result.success, "diagnostics: {:?}", result.diagnostics);
    let delta = result.delta.unwrap();

    // 日志顺序：TypeDef AddMethod → MethodDef Default → AddParameter → Param
    let entries = delta.edit_log.entries();
    let add_method = entries
        .iter()
        .position(|e| e.operation == EditOperation::AddMethod)
        .expect("AddMethod entry");
    let method_row = entries
        .iter()
        .position(|e| {
            e.handle.table == TableKind::MethodDef && e.operation == EditOperation::Default
        })
        .expect("MethodDef entry");
    let add_param = entries
        .iter()
        .position(|e| e.operation == EditOperation::AddParameter)
        .expect("AddParameter entry");
    assert!(add_method < method_row);
    assert!(method_row < add_param);
    assert_eq!(entries[add_method].handle.table, TableKind::TypeDef);

    // 新方法在下一代基线里有句柄，行号在旧行数之后
    let identity = new.symbol(h).identity.clone();
    let handle = result.next_baseline.handle_of(&identity).expect("handle");
    assert!(handle.row > baseline.row_counts.count(TableKind::MethodDef));
}

#[test]
fn test_delete_method_keeps_row_and_traps_body() {
    let old = program(&[0x2a]);
    let new = program(&[0x2a]);
    let baseline = initial_baseline(&old);
    let f_old = find_method(&old, "App.C.F");
    let old_handle = baseline
        .handle_of(&old.symbol(f_old).identity)
        .expect("baseline handle");

    let mut sink = MemorySink::new();
    let result = emit_difference(
        &old,
        &new,
        Arc::clone(&baseline),
        &[SemanticEdit::delete(f_old)],
        &NullDebugInfoProvider,
        &mut sink,
    );
    assert!(result.success);
    let delta = result.delta.unwrap();

    // 行不回收：同一句柄，体换成陷阱
    assert_eq!(delta.bodies.len(), 1);
    let body = &delta.bodies.bodies()[0];
    assert_eq!(body.method, old_handle);
    assert_eq!(body.code, MISSING_MEMBER_BODY.to_vec());

    // MethodDef 行数没有减少
    assert_eq!(
        result.next_baseline.row_counts.count(TableKind::MethodDef),
        baseline.row_counts.count(TableKind::MethodDef)
    );
}

/// 指定流写失败的写入器
struct FailingSink {
    fail_on: StreamKind,
    inner: MemorySink,
}

impl DeltaSink for FailingSink {
    fn write(&mut self, stream: StreamKind, bytes: &[u8]) -> std::io::Result<()> {
        if stream == self.fail_on {
            return Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk full",
            ));
        }
        self.inner.write(stream, bytes)
    }
}

#[test]
fn test_stream_write_failure_identifies_stream() {
    let old = program(&[0x2a]);
    let new = program(&[0x17]);
    let baseline = initial_baseline(&old);
    let edit = SemanticEdit::update(
        find_method(&old, "App.C.F"),
        find_method(&new, "App.C.F"),
        None,
        false,
    );

    let mut sink = FailingSink {
        fail_on: StreamKind::Code,
        inner: MemorySink::new(),
    };
    let result = emit_difference(
        &old,
        &new,
        Arc::clone(&baseline),
        &[edit],
        &NullDebugInfoProvider,
        &mut sink,
    );

    assert!(!result.success);
    assert!(result.delta.is_none());
    let io_diags: Vec<_> = result
        .diagnostics
        .iter()
        .filter(|d| d.code == "E6001")
        .collect();
    assert_eq!(io_diags.len(), 1);
    assert!(io_diags[0].message.contains("code"));
    // 基线没有推进
    assert!(Arc::ptr_eq(&result.next_baseline, &baseline));
    // 先写的 metadata 流不受腐蚀
    assert!(!sink.inner.metadata.is_empty());
}

#[test]
fn test_debug_info_stream_can_be_disabled() {
    let old = program(&[0x2a]);
    let new = program(&[0x17]);
    let baseline = initial_baseline(&old);
    let edit = SemanticEdit::update(
        find_method(&old, "App.C.F"),
        find_method(&new, "App.C.F"),
        None,
        false,
    );

    let mut sink = MemorySink::new();
    let pipeline = DeltaPipeline::with_config(
        &old,
        &new,
        Arc::clone(&baseline),
        EmitConfig {
            emit_debug_info: false,
        },
    );
    let result = pipeline.emit(&[edit], &NullDebugInfoProvider, &mut sink);

    assert!(result.success);
    assert!(sink.debug.is_empty());
    assert!(!sink.metadata.is_empty());
}

#[test]
fn test_update_emits_debug_info_with_sequence_points() {
    let old = program(&[0x2a]);
    let new = program(&[0x17, 0x2a]);
    let baseline = initial_baseline(&old);
    let edit = SemanticEdit::update(
        find_method(&old, "App.C.F"),
        find_method(&new, "App.C.F"),
        Some(Arc::new(|n| Some(n))),
        true,
    );

    let mut sink = MemorySink::new();
    let result = emit_difference(
        &old,
        &new,
        Arc::clone(&baseline),
        &[edit],
        &NullDebugInfoProvider,
        &mut sink,
    );
    assert!(result.success);
    let delta = result.delta.unwrap();

    assert_eq!(delta.debug_info.len(), 1);
    let info = &delta.debug_info.methods()[0];
    assert_eq!(info.document, "src/app.x");
    assert_eq!(info.sequence_points.len(), 1);
    assert_eq!(info.locals.len(), 1);
    assert_eq!(info.locals[0].name, "count");
    assert_eq!(info.scope.end, 2);
}

#[test]
fn test_empty_edit_batch_is_a_successful_noop_generation() {
    let old = program(&[0x2a]);
    let new = program(&[0x2a]);
    let baseline = initial_baseline(&old);

    let mut sink = MemorySink::new();
    let result = emit_difference(
        &old,
        &new,
        Arc::clone(&baseline),
        &[],
        &NullDebugInfoProvider,
        &mut sink,
    );
    assert!(result.success);
    let delta = result.delta.unwrap();
    assert!(delta.tables.is_empty());
    assert!(delta.edit_map.is_empty());
    assert_eq!(result.next_baseline.generation, 1);
}
