//! 令牌单调性：长代链测试
//!
//! 连续派生约 50 代：定义表句柄从不换主，行数从不减少。

use std::sync::Arc;

use proptest::prelude::*;

use xinhuo::baseline::{Baseline, TableKind};
use xinhuo::delta::MemorySink;
use xinhuo::edits::SemanticEdit;
use xinhuo::emit_difference;
use xinhuo::slots::NullDebugInfoProvider;
use xinhuo::symbols::{
    BodyDescriptor, StructuralSignature, SymbolGraph, SymbolGraphBuilder,
};

use super::common::{find_method, initial_baseline, int, void};

/// 第 `gen` 代的程序快照：F 的体随代变化，外加 `extra` 个后续插入的方法
fn snapshot(gen: u8, extra: usize) -> SymbolGraph {
    let mut b = SymbolGraphBuilder::new();
    let unit = b.unit("app", (1, 0, 0, 0));
    let ty = b.type_def(unit, "App.C");
    let f = b.method(ty, "F", StructuralSignature::method([int()], void()));
    b.set_body(
        f,
        BodyDescriptor {
            code: vec![gen],
            ..Default::default()
        },
    );
    for j in 0..extra {
        let m = b.method(
            ty,
            &format!("M{}", j),
            StructuralSignature::method([], void()),
        );
        b.set_body(m, BodyDescriptor::default());
    }
    b.finish()
}

fn assert_counts_non_decreasing(prev: &Baseline, next: &Baseline) {
    for (kind, count) in next.row_counts.iter() {
        assert!(
            count >= prev.row_counts.count(kind),
            "row count shrank for {}",
            kind
        );
    }
}

#[test]
fn test_token_monotonicity_across_fifty_generations() {
    const GENERATIONS: u8 = 50;

    let gen0 = snapshot(0, 0);
    let mut baseline = initial_baseline(&gen0);
    let f_identity = gen0.symbol(find_method(&gen0, "App.C.F")).identity.clone();
    let f_handle = baseline.handle_of(&f_identity).expect("F in baseline");

    // 已插入方法的句柄档案：身份 → 首次领到的句柄
    let mut archived: Vec<(xinhuo::symbols::SymbolIdentity, xinhuo::baseline::Handle)> =
        Vec::new();
    let mut old_graph = gen0;

    for gen in 1..=GENERATIONS {
        // 每 10 代插入一个新方法
        let extra_before = (gen as usize - 1) / 10;
        let extra_now = gen as usize / 10;
        let new_graph = snapshot(gen, extra_now);

        let mut edits = vec![SemanticEdit::update(
            find_method(&old_graph, "App.C.F"),
            find_method(&new_graph, "App.C.F"),
            None,
            false,
        )];
        for j in extra_before..extra_now {
            edits.push(SemanticEdit::insert(find_method(
                &new_graph,
                &format!("App.C.M{}", j),
            )));
        }

        let mut sink = MemorySink::new();
        let result = emit_difference(
            &old_graph,
            &new_graph,
            Arc::clone(&baseline),
            &edits,
            &NullDebugInfoProvider,
            &mut sink,
        );
        assert!(
            result.success,
            "generation {} failed: {:?}",
            gen, result.diagnostics
        );
        let next = result.next_baseline;

        assert_eq!(next.generation, gen as u32);
        assert_counts_non_decreasing(&baseline, &next);

        // F 的句柄终生不变
        assert_eq!(next.handle_of(&f_identity), Some(f_handle));

        // 已归档的句柄从不换主
        for (identity, handle) in &archived {
            assert_eq!(
                next.handle_of(identity),
                Some(*handle),
                "handle reassigned for {} at generation {}",
                identity,
                gen
            );
        }
        // 归档本代插入的方法
        for j in extra_before..extra_now {
            let identity = new_graph
                .symbol(find_method(&new_graph, &format!("App.C.M{}", j)))
                .identity
                .clone();
            let handle = next.handle_of(&identity).expect("inserted method handle");
            archived.push((identity, handle));
        }

        baseline = next;
        old_graph = new_graph;
    }

    assert_eq!(baseline.generation, GENERATIONS as u32);
    // 五个插入的方法都各自保有句柄
    assert_eq!(archived.len(), 5);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// 任意长度的更新序列都保持句柄与行数不变式
    #[test]
    fn prop_update_sequences_preserve_handles(codes in prop::collection::vec(1u8..=255, 1..10)) {
        let gen0 = snapshot(0, 0);
        let mut baseline = initial_baseline(&gen0);
        let f_identity = gen0.symbol(find_method(&gen0, "App.C.F")).identity.clone();
        let f_handle = baseline.handle_of(&f_identity).unwrap();
        let method_rows = baseline.row_counts.count(TableKind::MethodDef);
        let mut old_graph = gen0;

        for code in codes {
            let new_graph = snapshot(code, 0);
            let mut sink = MemorySink::new();
            let result = emit_difference(
                &old_graph,
                &new_graph,
                Arc::clone(&baseline),
                &[SemanticEdit::update(
                    find_method(&old_graph, "App.C.F"),
                    find_method(&new_graph, "App.C.F"),
                    None,
                    false,
                )],
                &NullDebugInfoProvider,
                &mut sink,
            );
            prop_assert!(result.success);
            let next = result.next_baseline;

            prop_assert_eq!(next.handle_of(&f_identity), Some(f_handle));
            // 更新不新增定义行
            prop_assert_eq!(next.row_counts.count(TableKind::MethodDef), method_rows);
            baseline = next;
            old_graph = new_graph;
        }
    }
}
