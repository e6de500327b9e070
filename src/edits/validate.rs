//! 编辑批次校验
//!
//! 四道检查，全部累积诊断、不提前中止：
//!
//! 1. 结构合法性——Update/Delete 的旧符号必须能在基线中解析；
//!    本批次插入的符号不能同时是另一条编辑的旧符号。
//! 2. 受限类型——编辑体直接或经签名传递触及 interop 内嵌类型
//!    是硬失败，每个违规类型一条诊断。
//! 3. 跨单元可见性——本代插入的符号在对方单元自己的编辑集
//!    补齐可见性之前，不得被另一单元的增量引用。
//! 4. 普通语义错误——只报本批次编辑体内的；同容器里
//!    未触碰成员的错误不阻塞发射。

use std::collections::HashSet;

use indexmap::IndexSet;
use tracing::debug;

use crate::baseline::Baseline;
use crate::matcher::SymbolMatcher;
use crate::symbols::{
    BodyDescriptor, SymbolGraph, SymbolIdentity, SymbolKind, SymbolRef, TypeRef, UnitId,
};
use crate::util::diagnostic::{codes, ErrorCollector};

use super::{SemanticEdit, SemanticEditKind};

/// 编辑批次校验器
#[derive(Debug)]
pub struct EditValidator<'a> {
    old: &'a SymbolGraph,
    new: &'a SymbolGraph,
    baseline: &'a Baseline,
    matcher: &'a SymbolMatcher<'a>,
}

impl<'a> EditValidator<'a> {
    /// 创建校验器
    pub fn new(
        old: &'a SymbolGraph,
        new: &'a SymbolGraph,
        baseline: &'a Baseline,
        matcher: &'a SymbolMatcher<'a>,
    ) -> Self {
        Self {
            old,
            new,
            baseline,
            matcher,
        }
    }

    /// 校验整个批次，诊断进收集器
    pub fn validate(&self, edits: &[SemanticEdit], collector: &mut ErrorCollector) {
        self.check_structure(edits, collector);
        self.check_restricted(edits, collector);
        self.check_visibility(edits, collector);
        self.check_semantic(edits, collector);
        debug!(
            edits = edits.len(),
            errors = collector.error_count(),
            "edit batch validated"
        );
    }

    /// 结构合法性
    fn check_structure(&self, edits: &[SemanticEdit], collector: &mut ErrorCollector) {
        // 本批次插入的符号身份
        let inserted: HashSet<&SymbolIdentity> = edits
            .iter()
            .filter(|e| matches!(e.kind, SemanticEditKind::Insert | SemanticEditKind::Replace))
            .filter_map(|e| e.new_symbol)
            .map(|s| &self.new.symbol(s).identity)
            .collect();

        for edit in edits {
            match edit.kind {
                SemanticEditKind::Insert | SemanticEditKind::Replace => {
                    if edit.new_symbol.is_none() {
                        collector
                            .push(codes::MALFORMED_EDIT.build(&[&edit.kind.to_string(), "new"]));
                    }
                }
                SemanticEditKind::Update => {
                    if edit.old_symbol.is_none() || edit.new_symbol.is_none() {
                        collector.push(
                            codes::MALFORMED_EDIT
                                .build(&[&edit.kind.to_string(), "old or new"]),
                        );
                        continue;
                    }
                    self.check_old_resolves(edit, &inserted, collector);
                }
                SemanticEditKind::Delete => {
                    if edit.old_symbol.is_none() {
                        collector
                            .push(codes::MALFORMED_EDIT.build(&[&edit.kind.to_string(), "old"]));
                        continue;
                    }
                    self.check_old_resolves(edit, &inserted, collector);
                }
            }
        }
    }

    fn check_old_resolves(
        &self,
        edit: &SemanticEdit,
        inserted: &HashSet<&SymbolIdentity>,
        collector: &mut ErrorCollector,
    ) {
        let old_sym = edit.old_symbol.expect("checked by caller");
        let identity = &self.old.symbol(old_sym).identity;

        if inserted.contains(identity) {
            collector.push(codes::INSERTED_SYMBOL_AS_OLD.build(&[&identity.to_string()]));
            return;
        }
        if self.baseline.handle_of(identity).is_none() {
            collector.push(codes::UNRESOLVED_OLD_SYMBOL.build(&[&identity.to_string()]));
        }
    }

    /// 受限类型扫描
    ///
    /// 每个违规类型恰好一条诊断，按首次触及顺序。
    fn check_restricted(&self, edits: &[SemanticEdit], collector: &mut ErrorCollector) {
        let mut offending: IndexSet<String> = IndexSet::new();

        for (sym, body) in self.edited_bodies(edits) {
            // 方法自身签名
            self.scan_signature_types(sym, &mut offending);
            // 体内引用的符号及其签名
            for &referenced in &body.referenced {
                if let Some(ty) = self.restricted_container(referenced) {
                    offending.insert(ty);
                }
                self.scan_signature_types(referenced, &mut offending);
            }
            // 体内直接提到的类型与局部变量类型
            for ty in &body.referenced_types {
                self.scan_type(ty, &mut offending);
            }
            for local in &body.locals {
                self.scan_type(&local.ty, &mut offending);
            }
        }

        for name in offending {
            collector.push(codes::RESTRICTED_TYPE_REFERENCE.build(&[&name]));
        }
    }

    /// 跨单元可见性
    ///
    /// 每个不可见符号恰好一条诊断；成员与其新插入的容器类型
    /// 两个方向都报。
    fn check_visibility(&self, edits: &[SemanticEdit], collector: &mut ErrorCollector) {
        let mut inaccessible: IndexSet<SymbolRef> = IndexSet::new();

        for (sym, body) in self.edited_bodies(edits) {
            let from_unit = self.new.symbol(sym).identity.unit;
            for &referenced in &body.referenced {
                let target = self.new.symbol(referenced);
                if target.identity.unit == from_unit {
                    continue;
                }
                // 基线里已有的符号本来就可见
                if self.matcher.map_definition(referenced).is_some() {
                    continue;
                }
                if self.visibility_granted(edits, from_unit, referenced) {
                    continue;
                }
                inaccessible.insert(referenced);
                // 成员的容器类型若也是本代新插入的，一并报
                if target.identity.kind != SymbolKind::Type {
                    if let Some(container) = target.container {
                        if self.matcher.map_definition(container).is_none() {
                            inaccessible.insert(container);
                        }
                    }
                }
            }
        }

        for sym in inaccessible {
            let identity = &self.new.symbol(sym).identity;
            let code = if identity.kind == SymbolKind::Type {
                codes::INACCESSIBLE_TYPE
            } else {
                codes::INACCESSIBLE_MEMBER
            };
            collector.push(code.build(&[&identity.to_string()]));
        }
    }

    /// 普通语义错误：只看本批次的编辑体
    fn check_semantic(&self, edits: &[SemanticEdit], collector: &mut ErrorCollector) {
        for (sym, body) in self.edited_bodies(edits) {
            let identity = &self.new.symbol(sym).identity;
            for error in &body.semantic_errors {
                collector.push(codes::BODY_SEMANTIC_ERROR.build(&[&identity.to_string(), error]));
            }
        }
    }

    /// 本批次所有带方法体的编辑目标
    fn edited_bodies<'b>(
        &'b self,
        edits: &'b [SemanticEdit],
    ) -> impl Iterator<Item = (SymbolRef, &'b BodyDescriptor)> + 'b {
        edits
            .iter()
            .filter(|e| !matches!(e.kind, SemanticEditKind::Delete))
            .filter_map(|e| e.new_symbol)
            .filter_map(|s| self.new.symbol(s).body.as_ref().map(|b| (s, b)))
    }

    /// 对方单元的编辑集是否补齐了对该符号的可见性
    ///
    /// 判据：引用方单元自己的编辑集里有一条 Insert，其签名提到了
    /// 目标符号的容器类型（目标是类型时即其自身）。
    fn visibility_granted(
        &self,
        edits: &[SemanticEdit],
        from_unit: UnitId,
        target: SymbolRef,
    ) -> bool {
        let target_data = self.new.symbol(target);
        if !target_data.visibility.cross_unit() {
            return false;
        }
        let supporting = match target_data.identity.kind {
            SymbolKind::Type => target,
            _ => match target_data.container {
                Some(c) => c,
                None => return false,
            },
        };
        let supporting_name = &self.new.symbol(supporting).identity.qualified_name;

        edits
            .iter()
            .filter(|e| matches!(e.kind, SemanticEditKind::Insert | SemanticEditKind::Replace))
            .filter_map(|e| e.new_symbol)
            .filter(|&s| self.new.symbol(s).identity.unit == from_unit)
            .any(|s| {
                let mut mentions = false;
                self.new.symbol(s).signature.walk_types(&mut |ty| {
                    if let TypeRef::Named { qualified_name, .. } = ty {
                        if qualified_name == supporting_name {
                            mentions = true;
                        }
                    }
                });
                mentions
            })
    }

    /// 符号（或其容器链上的类型）若受限，返回受限类型名
    fn restricted_container(&self, sym: SymbolRef) -> Option<String> {
        let mut cursor = Some(sym);
        while let Some(s) = cursor {
            let data = self.new.symbol(s);
            if data.identity.kind == SymbolKind::Type && data.is_restricted {
                return Some(data.identity.qualified_name.clone());
            }
            cursor = data.container;
        }
        None
    }

    fn scan_signature_types(&self, sym: SymbolRef, offending: &mut IndexSet<String>) {
        let mut found = Vec::new();
        self.new.symbol(sym).signature.walk_types(&mut |ty| {
            if let TypeRef::Named { qualified_name, .. } = ty {
                found.push(qualified_name.clone());
            }
        });
        for name in found {
            self.check_restricted_name(&name, offending);
        }
    }

    fn scan_type(&self, ty: &TypeRef, offending: &mut IndexSet<String>) {
        let mut found = Vec::new();
        ty.walk(&mut |t| {
            if let TypeRef::Named { qualified_name, .. } = t {
                found.push(qualified_name.clone());
            }
        });
        for name in found {
            self.check_restricted_name(&name, offending);
        }
    }

    fn check_restricted_name(&self, qualified_name: &str, offending: &mut IndexSet<String>) {
        if let Some(ty) = self.new.find_type_by_name(qualified_name) {
            if self.new.symbol(ty).is_restricted {
                offending.insert(qualified_name.to_string());
            }
        }
    }
}
