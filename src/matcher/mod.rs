//! 符号匹配器
//!
//! 把新快照里的符号映射到基线里的对应句柄——按结构身份，
//! 不按对象引用。容器先解析，再比限定名、泛型元数、
//! 结构签名；签名里的类型通过匹配器自身递归解析。
//!
//! 构造完成后全程只读：查询可以从任意多线程并发发起，
//! 不需要外部加锁。备忘表放在 `parking_lot::RwLock` 里，
//! 对外不可见。

pub mod resolve;

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;
use tracing::trace;

use crate::baseline::{Baseline, Handle, ReferenceKey};
use crate::symbols::{
    graph::short_name_of, SymbolGraph, SymbolKind, SymbolRef, TypeRef, UnitId,
};

use resolve::{select_candidate, signature_resolvable};

/// 匹配统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchStats {
    /// 备忘命中次数
    pub hits: usize,
    /// 完整匹配次数
    pub misses: usize,
}

/// 符号匹配器
///
/// 对 (旧快照, 新快照, 基线) 的纯函数视图。
pub struct SymbolMatcher<'a> {
    old: &'a SymbolGraph,
    new: &'a SymbolGraph,
    baseline: &'a Baseline,
    /// 新符号 → 旧句柄 备忘表
    memo: RwLock<HashMap<SymbolRef, Option<Handle>>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl std::fmt::Debug for SymbolMatcher<'_> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("SymbolMatcher")
            .field("old_symbols", &self.old.len())
            .field("new_symbols", &self.new.len())
            .field("generation", &self.baseline.generation)
            .finish()
    }
}

impl<'a> SymbolMatcher<'a> {
    /// 创建匹配器
    pub fn new(old: &'a SymbolGraph, new: &'a SymbolGraph, baseline: &'a Baseline) -> Self {
        Self {
            old,
            new,
            baseline,
            memo: RwLock::new(HashMap::new()),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    /// 把新快照里的定义映射到基线句柄
    ///
    /// `None` 表示"本代新增"，不是错误。
    pub fn map_definition(&self, new_sym: SymbolRef) -> Option<Handle> {
        if let Some(cached) = self.memo.read().get(&new_sym) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return *cached;
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let handle = self
            .find_old_counterpart(new_sym)
            .and_then(|old_sym| self.baseline.handle_of(&self.old.symbol(old_sym).identity));

        self.memo.write().insert(new_sym, handle);
        handle
    }

    /// 把新快照里的类型或成员引用映射到基线句柄
    ///
    /// 图内符号走定义匹配；外部类型查基线的引用行注册表。
    pub fn map_reference(&self, new_sym: SymbolRef) -> Option<Handle> {
        self.map_definition(new_sym)
    }

    /// 外部类型引用 → 基线引用行句柄
    pub fn map_type_reference(&self, ty: &TypeRef) -> Option<Handle> {
        match ty {
            TypeRef::Named {
                assembly,
                qualified_name,
                ..
            } => self.baseline.reference_handle(&ReferenceKey::Type {
                assembly: assembly.clone(),
                qualified_name: qualified_name.clone(),
            }),
            _ => None,
        }
    }

    /// 在旧快照中找新符号的对应物
    pub fn find_old_counterpart(&self, new_sym: SymbolRef) -> Option<SymbolRef> {
        let data = self.new.symbol(new_sym);

        // 容器先行：容器都对不上，成员不可能对上
        let old_container = match data.container {
            Some(c) => Some(self.find_old_counterpart(c)?),
            None => None,
        };
        let old_unit = self.unit_counterpart(data.identity.unit)?;

        let candidates = self.old.candidates(
            old_unit,
            old_container,
            data.identity.kind,
            short_name_of(&data.identity.qualified_name),
            data.identity.generic_arity,
        );

        // 任一签名类型解析不了的候选被静默排除
        let resolvable: Vec<SymbolRef> = candidates
            .into_iter()
            .filter(|&c| {
                signature_resolvable(&self.old.symbol(c).signature, self.old, self.new)
            })
            .collect();

        let chosen = if data.identity.kind == SymbolKind::Type {
            // 类型靠 (容器, 名, 元数) 已唯一
            resolvable.first().copied()
        } else {
            select_candidate(self.old, &resolvable, &data.signature, self.baseline)
        };

        trace!(
            symbol = %data.identity,
            matched = chosen.is_some(),
            "definition match"
        );
        chosen
    }

    /// 匹配统计快照
    pub fn stats(&self) -> MatchStats {
        MatchStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// 旧快照中与该新单元对应的单元
    ///
    /// 单元按程序集简单名对应；找不到说明整个单元是新增的。
    fn unit_counterpart(&self, new_unit: UnitId) -> Option<UnitId> {
        let name = &self.new.unit(new_unit).identity.name;
        self.old
            .units()
            .iter()
            .find(|u| &u.identity.name == name)
            .map(|u| u.id)
    }
}
