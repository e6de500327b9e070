//! 语义编辑
//!
//! 两个符号版本之间的一次声明级 Insert/Update/Delete/Replace。
//! 语法映射是注入的纯函数（新节点 → 旧节点），编辑层
//! 不触碰任何具体 AST 表示。

pub mod validate;

use std::sync::Arc;

use crate::symbols::{SymbolRef, SyntaxNodeId};

/// 编辑种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticEditKind {
    /// 新增符号
    Insert,
    /// 更新既有符号
    Update,
    /// 删除既有符号（行不回收，方法体换成缺失成员陷阱）
    Delete,
    /// 整体替换（可重载类型）；行分配与 Insert 相同
    Replace,
}

impl std::fmt::Display for SemanticEditKind {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            SemanticEditKind::Insert => write!(f, "insert"),
            SemanticEditKind::Update => write!(f, "update"),
            SemanticEditKind::Delete => write!(f, "delete"),
            SemanticEditKind::Replace => write!(f, "replace"),
        }
    }
}

/// 语法映射：新声明节点 → 旧声明节点
pub type SyntaxMap = Arc<dyn Fn(SyntaxNodeId) -> Option<SyntaxNodeId> + Send + Sync>;

/// 一条语义编辑
#[derive(Clone)]
pub struct SemanticEdit {
    /// 编辑种类
    pub kind: SemanticEditKind,
    /// 旧快照中的符号（Update/Delete/Replace）
    pub old_symbol: Option<SymbolRef>,
    /// 新快照中的符号（Insert/Update/Replace）
    pub new_symbol: Option<SymbolRef>,
    /// 语法映射（Update 且需要保留局部变量时提供）
    pub syntax_map: Option<SyntaxMap>,
    /// 是否保留局部变量槽位
    pub preserve_locals: bool,
}

impl std::fmt::Debug for SemanticEdit {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("SemanticEdit")
            .field("kind", &self.kind)
            .field("old_symbol", &self.old_symbol)
            .field("new_symbol", &self.new_symbol)
            .field("has_syntax_map", &self.syntax_map.is_some())
            .field("preserve_locals", &self.preserve_locals)
            .finish()
    }
}

impl SemanticEdit {
    /// 新增
    pub fn insert(new_symbol: SymbolRef) -> Self {
        Self {
            kind: SemanticEditKind::Insert,
            old_symbol: None,
            new_symbol: Some(new_symbol),
            syntax_map: None,
            preserve_locals: false,
        }
    }

    /// 更新
    pub fn update(
        old_symbol: SymbolRef,
        new_symbol: SymbolRef,
        syntax_map: Option<SyntaxMap>,
        preserve_locals: bool,
    ) -> Self {
        Self {
            kind: SemanticEditKind::Update,
            old_symbol: Some(old_symbol),
            new_symbol: Some(new_symbol),
            syntax_map,
            preserve_locals,
        }
    }

    /// 删除
    pub fn delete(old_symbol: SymbolRef) -> Self {
        Self {
            kind: SemanticEditKind::Delete,
            old_symbol: Some(old_symbol),
            new_symbol: None,
            syntax_map: None,
            preserve_locals: false,
        }
    }

    /// 整体替换
    pub fn replace(old_symbol: Option<SymbolRef>, new_symbol: SymbolRef) -> Self {
        Self {
            kind: SemanticEditKind::Replace,
            old_symbol,
            new_symbol: Some(new_symbol),
            syntax_map: None,
            preserve_locals: false,
        }
    }
}

pub use validate::EditValidator;
