//! 受限类型与跨单元可见性的拒绝路径
//!
//! 两类硬失败都要：每个违规符号一条诊断、零增量字节、基线不动。

use std::sync::Arc;

use xinhuo::delta::MemorySink;
use xinhuo::edits::SemanticEdit;
use xinhuo::emit_difference;
use xinhuo::slots::NullDebugInfoProvider;
use xinhuo::symbols::{
    AssemblyIdentity, BodyDescriptor, StructuralSignature, SymbolGraph, SymbolGraphBuilder,
    TypeRef,
};

use super::common::{find_method, initial_baseline, void};

fn app_assembly() -> AssemblyIdentity {
    AssemblyIdentity::new("app", (1, 0, 0, 0))
}

/// 带两个受限 interop 类型的快照；F 的体由 `touch_restricted` 决定
fn restricted_program(touch_restricted: bool) -> SymbolGraph {
    let mut b = SymbolGraphBuilder::new();
    let unit = b.unit("app", (1, 0, 0, 0));
    let handle_ref = b.type_def(unit, "Interop.HandleRef");
    b.set_restricted(handle_ref);
    let arg_iter = b.type_def(unit, "Interop.ArgIterator");
    b.set_restricted(arg_iter);
    let ty = b.type_def(unit, "App.C");
    let f = b.method(ty, "F", StructuralSignature::method([], void()));
    let body = if touch_restricted {
        BodyDescriptor {
            referenced_types: vec![
                TypeRef::named(app_assembly(), "Interop.HandleRef"),
                TypeRef::named(app_assembly(), "Interop.ArgIterator"),
            ],
            ..Default::default()
        }
    } else {
        BodyDescriptor::default()
    };
    b.set_body(f, body);
    b.finish()
}

#[test]
fn test_restricted_reference_rejected_with_no_delta_bytes() {
    let old = restricted_program(false);
    let new = restricted_program(true);
    let baseline = initial_baseline(&old);

    let mut sink = MemorySink::new();
    let result = emit_difference(
        &old,
        &new,
        Arc::clone(&baseline),
        &[SemanticEdit::update(
            find_method(&old, "App.C.F"),
            find_method(&new, "App.C.F"),
            None,
            false,
        )],
        &NullDebugInfoProvider,
        &mut sink,
    );

    assert!(!result.success);
    assert!(result.delta.is_none());
    // 每个违规类型一条诊断
    let restricted: Vec<_> = result
        .diagnostics
        .iter()
        .filter(|d| d.code == "E2001")
        .collect();
    assert_eq!(restricted.len(), 2);
    assert!(restricted.iter().any(|d| d.message.contains("Interop.HandleRef")));
    assert!(restricted
        .iter()
        .any(|d| d.message.contains("Interop.ArgIterator")));
    // 零增量字节，基线不动
    assert!(sink.metadata.is_empty());
    assert!(sink.code.is_empty());
    assert!(sink.debug.is_empty());
    assert!(Arc::ptr_eq(&result.next_baseline, &baseline));
}

/// 两个单元的程序：libunit 里是 Lib.Api，appunit 里的 App.Main.Run 被编辑
fn two_unit_old() -> SymbolGraph {
    let mut b = SymbolGraphBuilder::new();
    let lib = b.unit("libunit", (1, 0, 0, 0));
    let api = b.type_def(lib, "Lib.Api");
    b.method(api, "Ping", StructuralSignature::method([], void()));
    let app = b.unit("appunit", (1, 0, 0, 0));
    b.reference(app, AssemblyIdentity::new("libunit", (1, 0, 0, 0)));
    let main = b.type_def(app, "App.Main");
    let run = b.method(main, "Run", StructuralSignature::method([], void()));
    b.set_body(run, BodyDescriptor::default());
    b.finish()
}

/// 新快照：libunit 里插入了新类型 Lib.Fresh 和它的方法 Ping；
/// appunit 的 Run 体里引用了它
fn two_unit_new() -> (SymbolGraph, xinhuo::symbols::SymbolRef, xinhuo::symbols::SymbolRef, xinhuo::symbols::SymbolRef) {
    let mut b = SymbolGraphBuilder::new();
    let lib = b.unit("libunit", (1, 0, 0, 0));
    let api = b.type_def(lib, "Lib.Api");
    b.method(api, "Ping", StructuralSignature::method([], void()));
    let fresh = b.type_def(lib, "Lib.Fresh");
    let fresh_ping = b.method(fresh, "Ping", StructuralSignature::method([], void()));
    b.set_body(fresh_ping, BodyDescriptor::default());
    let app = b.unit("appunit", (1, 0, 0, 0));
    b.reference(app, AssemblyIdentity::new("libunit", (1, 0, 0, 0)));
    let main = b.type_def(app, "App.Main");
    let run = b.method(main, "Run", StructuralSignature::method([], void()));
    b.set_body(
        run,
        BodyDescriptor {
            referenced: vec![fresh_ping],
            ..Default::default()
        },
    );
    (b.finish(), fresh, fresh_ping, run)
}

#[test]
fn test_cross_unit_reference_to_inserted_member_rejected_both_directions() {
    let old = two_unit_old();
    let (new, fresh, fresh_ping, run) = two_unit_new();
    let baseline = initial_baseline(&old);

    // libunit 插入 Fresh/Fresh.Ping；appunit 更新 Run 引用它，
    // 但 appunit 自己的编辑集没有补可见性
    let edits = vec![
        SemanticEdit::insert(fresh),
        SemanticEdit::insert(fresh_ping),
        SemanticEdit::update(find_method(&old, "App.Main.Run"), run, None, false),
    ];
    let mut sink = MemorySink::new();
    let result = emit_difference(
        &old,
        &new,
        Arc::clone(&baseline),
        &edits,
        &NullDebugInfoProvider,
        &mut sink,
    );

    assert!(!result.success);
    assert!(result.delta.is_none());
    // 成员与类型两个方向各一条
    let members: Vec<_> = result
        .diagnostics
        .iter()
        .filter(|d| d.code == "E3001")
        .collect();
    let types: Vec<_> = result
        .diagnostics
        .iter()
        .filter(|d| d.code == "E3002")
        .collect();
    assert_eq!(members.len(), 1);
    assert!(members[0].message.contains("Lib.Fresh.Ping"));
    assert_eq!(types.len(), 1);
    assert!(types[0].message.contains("Lib.Fresh"));
    assert!(sink.metadata.is_empty());
}

#[test]
fn test_cross_unit_reference_allowed_when_visibility_is_granted() {
    let old = two_unit_old();

    // 与上面相同，但 appunit 的编辑集里也插入了一个签名
    // 提到 Lib.Fresh 的支撑成员
    let mut b = SymbolGraphBuilder::new();
    let lib = b.unit("libunit", (1, 0, 0, 0));
    let api = b.type_def(lib, "Lib.Api");
    b.method(api, "Ping", StructuralSignature::method([], void()));
    let fresh = b.type_def(lib, "Lib.Fresh");
    let fresh_ping = b.method(fresh, "Ping", StructuralSignature::method([], void()));
    b.set_body(fresh_ping, BodyDescriptor::default());
    let app = b.unit("appunit", (1, 0, 0, 0));
    b.reference(app, AssemblyIdentity::new("libunit", (1, 0, 0, 0)));
    let main = b.type_def(app, "App.Main");
    let run = b.method(main, "Run", StructuralSignature::method([], void()));
    b.set_body(
        run,
        BodyDescriptor {
            referenced: vec![fresh_ping],
            ..Default::default()
        },
    );
    // 支撑字段：类型是 Lib.Fresh，给 appunit 带来可见性
    let bridge = b.field(
        main,
        "fresh",
        TypeRef::named(AssemblyIdentity::new("libunit", (1, 0, 0, 0)), "Lib.Fresh"),
    );
    let new = b.finish();

    let baseline = initial_baseline(&old);
    let edits = vec![
        SemanticEdit::insert(fresh),
        SemanticEdit::insert(fresh_ping),
        SemanticEdit::insert(bridge),
        SemanticEdit::update(find_method(&old, "App.Main.Run"), run, None, false),
    ];
    let mut sink = MemorySink::new();
    let result = emit_difference(
        &old,
        &new,
        Arc::clone(&baseline),
        &edits,
        &NullDebugInfoProvider,
        &mut sink,
    );

    assert!(result.success, "diagnostics: {:?}", result.diagnostics);
    assert!(result.delta.is_some());
}
