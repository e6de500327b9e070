//! 解析性检查与重载筛选
//!
//! 候选排除规则：签名里任何一个类型在任一快照中解析不了，
//! 该候选就被静默排除，而不是退回"声明顺序第一个"。
//! 多个候选都完全可解析时，取结构签名逐位相等的那个；
//! 仍然多于一个（真重复）时取基线句柄最小者。

use crate::baseline::Baseline;
use crate::symbols::{StructuralSignature, SymbolGraph, SymbolRef};

/// 签名中的所有类型是否在两个快照中都可解析
///
/// 旧快照缺引用（候选依赖被移除的程序集）与新快照缺引用
/// （编辑后的编译不再提供某程序集）都会排除候选。
pub fn signature_resolvable(
    signature: &StructuralSignature,
    old_graph: &SymbolGraph,
    new_graph: &SymbolGraph,
) -> bool {
    let mut ok = true;
    signature.walk_types(&mut |ty| {
        if !old_graph.resolves_type(ty) || !new_graph.resolves_type(ty) {
            ok = false;
        }
    });
    ok
}

/// 从可解析候选中选出与新签名结构相等的那个
///
/// 返回 `None` 表示没有旧对应物（符号是本代新增）。
pub fn select_candidate(
    old_graph: &SymbolGraph,
    candidates: &[SymbolRef],
    new_signature: &StructuralSignature,
    baseline: &Baseline,
) -> Option<SymbolRef> {
    let mut matched: Vec<SymbolRef> = candidates
        .iter()
        .copied()
        .filter(|&c| old_graph.symbol(c).signature == *new_signature)
        .collect();

    match matched.len() {
        0 => None,
        1 => Some(matched[0]),
        // 真重复：基线句柄最小者胜出，保证跨次运行确定
        _ => {
            matched.sort_by_key(|&c| {
                baseline
                    .handle_of(&old_graph.symbol(c).identity)
                    .map(|h| h.token())
                    .unwrap_or(u32::MAX)
            });
            Some(matched[0])
        }
    }
}
