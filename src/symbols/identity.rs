//! 符号身份
//!
//! 跨快照匹配依赖的稳定限定身份。两个独立编译的快照中，
//! 同一逻辑实体的身份值必须相等，这里只存"结构性事实"：
//! 单元、种类、限定名、泛型元数、签名摘要。

use serde::{Deserialize, Serialize};

/// 编译单元索引
///
/// 一个程序由若干独立编译的单元组成（每个单元对应一个程序集）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl UnitId {
    /// Create a new unit id
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    /// Get the unit index
    pub fn index(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for UnitId {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "unit{}", self.0)
    }
}

/// 程序集身份
///
/// 简单名 + 四段版本号。跨快照比较必须使用完整身份：
/// 基线引用过、但新编译不再提供的程序集，绝不能与同名的
/// 残留引用视为同一个。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssemblyIdentity {
    /// 简单名
    pub name: String,
    /// 版本号 (major, minor, build, revision)
    pub version: (u16, u16, u16, u16),
}

impl AssemblyIdentity {
    /// 创建程序集身份
    pub fn new(name: impl Into<String>, version: (u16, u16, u16, u16)) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }
}

impl std::fmt::Display for AssemblyIdentity {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        let (a, b, c, d) = self.version;
        write!(f, "{}, Version={}.{}.{}.{}", self.name, a, b, c, d)
    }
}

/// 符号种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    Type,
    Method,
    Field,
    Property,
    Event,
}

impl std::fmt::Display for SymbolKind {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            SymbolKind::Type => write!(f, "type"),
            SymbolKind::Method => write!(f, "method"),
            SymbolKind::Field => write!(f, "field"),
            SymbolKind::Property => write!(f, "property"),
            SymbolKind::Event => write!(f, "event"),
        }
    }
}

/// 符号的稳定限定身份
///
/// 重载成员共享限定名，靠 `signature_digest` 区分。
/// 摘要必须由结构化签名确定性地推导（见
/// [`StructuralSignature::digest`](super::signature::StructuralSignature::digest)），
/// 不依赖任何快照内部的对象地址。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolIdentity {
    /// 所属编译单元
    pub unit: UnitId,
    /// 符号种类
    pub kind: SymbolKind,
    /// 完整限定名
    pub qualified_name: String,
    /// 泛型元数
    pub generic_arity: u16,
    /// 结构化签名摘要
    pub signature_digest: u64,
}

impl std::fmt::Display for SymbolIdentity {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        if self.generic_arity > 0 {
            write!(f, "{}`{}", self.qualified_name, self.generic_arity)
        } else {
            write!(f, "{}", self.qualified_name)
        }
    }
}

/// 方法身份
///
/// 局部变量布局表以方法为键；用 newtype 避免与其他符号身份混用。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodIdentity(pub SymbolIdentity);

impl MethodIdentity {
    /// 从符号身份创建（调用方保证 kind 为 Method）
    pub fn new(identity: SymbolIdentity) -> Self {
        debug_assert_eq!(identity.kind, SymbolKind::Method);
        Self(identity)
    }

    /// 访问内部身份
    pub fn identity(&self) -> &SymbolIdentity {
        &self.0
    }
}

impl std::fmt::Display for MethodIdentity {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
