//! 结构化签名
//!
//! 匹配器比较的是"结构"，不是对象引用：参数/返回/字段类型、
//! 泛型元数、可见性修饰。类型引用把程序集身份带在身上，
//! 解析性检查（所属程序集是否在快照的引用集中）才有判断依据。

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::identity::AssemblyIdentity;

/// 内建类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    Void,
    Bool,
    Int32,
    Int64,
    Float64,
    String,
    Object,
}

impl std::fmt::Display for PrimitiveType {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            PrimitiveType::Void => write!(f, "void"),
            PrimitiveType::Bool => write!(f, "bool"),
            PrimitiveType::Int32 => write!(f, "int32"),
            PrimitiveType::Int64 => write!(f, "int64"),
            PrimitiveType::Float64 => write!(f, "float64"),
            PrimitiveType::String => write!(f, "string"),
            PrimitiveType::Object => write!(f, "object"),
        }
    }
}

/// 类型引用
///
/// 签名中出现的类型。`Named` 携带定义方程序集的完整身份，
/// 供匹配器做解析性检查与同名消歧。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeRef {
    /// 内建类型
    Primitive(PrimitiveType),
    /// 具名类型
    Named {
        /// 定义方程序集
        assembly: AssemblyIdentity,
        /// 完整限定名
        qualified_name: String,
        /// 泛型实参
        args: Vec<TypeRef>,
    },
    /// 数组
    Array(Box<TypeRef>),
    /// 按引用传递
    ByRef(Box<TypeRef>),
    /// 泛型形参（按序号）
    GenericParam(u16),
}

impl TypeRef {
    /// 便捷构造：无泛型实参的具名类型
    pub fn named(assembly: AssemblyIdentity, qualified_name: impl Into<String>) -> Self {
        TypeRef::Named {
            assembly,
            qualified_name: qualified_name.into(),
            args: Vec::new(),
        }
    }

    /// 遍历类型及其全部组成类型
    pub fn walk(&self, visit: &mut dyn FnMut(&TypeRef)) {
        visit(self);
        match self {
            TypeRef::Named { args, .. } => {
                for arg in args {
                    arg.walk(visit);
                }
            }
            TypeRef::Array(inner) | TypeRef::ByRef(inner) => inner.walk(visit),
            TypeRef::Primitive(_) | TypeRef::GenericParam(_) => {}
        }
    }

    /// 把自身的确定性字节表示喂给摘要器
    fn feed(&self, digest: &mut Fnv1a) {
        match self {
            TypeRef::Primitive(p) => {
                digest.byte(0x01);
                digest.byte(*p as u8);
            }
            TypeRef::Named {
                assembly,
                qualified_name,
                args,
            } => {
                digest.byte(0x02);
                digest.bytes(assembly.name.as_bytes());
                let (a, b, c, d) = assembly.version;
                for part in [a, b, c, d] {
                    digest.bytes(&part.to_le_bytes());
                }
                digest.bytes(qualified_name.as_bytes());
                digest.byte(args.len() as u8);
                for arg in args {
                    arg.feed(digest);
                }
            }
            TypeRef::Array(inner) => {
                digest.byte(0x03);
                inner.feed(digest);
            }
            TypeRef::ByRef(inner) => {
                digest.byte(0x04);
                inner.feed(digest);
            }
            TypeRef::GenericParam(ordinal) => {
                digest.byte(0x05);
                digest.bytes(&ordinal.to_le_bytes());
            }
        }
    }
}

impl std::fmt::Display for TypeRef {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            TypeRef::Primitive(p) => write!(f, "{}", p),
            TypeRef::Named {
                qualified_name,
                args,
                ..
            } => {
                write!(f, "{}", qualified_name)?;
                if !args.is_empty() {
                    write!(f, "<")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ",")?;
                        }
                        write!(f, "{}", arg)?;
                    }
                    write!(f, ">")?;
                }
                Ok(())
            }
            TypeRef::Array(inner) => write!(f, "{}[]", inner),
            TypeRef::ByRef(inner) => write!(f, "ref {}", inner),
            TypeRef::GenericParam(ordinal) => write!(f, "!{}", ordinal),
        }
    }
}

/// 成员可见性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    Internal,
    Protected,
    Private,
}

impl Visibility {
    /// 是否对其他编译单元可见
    pub fn cross_unit(&self) -> bool {
        matches!(self, Visibility::Public)
    }
}

/// 结构化签名
///
/// 所有符号种类共用一个形状：方法用参数表 + 返回类型，
/// 字段/事件用 `result` 存声明类型，属性把索引参数放进参数表。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructuralSignature {
    /// 参数类型表
    pub params: SmallVec<[TypeRef; 4]>,
    /// 返回/声明类型
    pub result: TypeRef,
}

impl StructuralSignature {
    /// 方法签名
    pub fn method(params: impl IntoIterator<Item = TypeRef>, result: TypeRef) -> Self {
        Self {
            params: params.into_iter().collect(),
            result,
        }
    }

    /// 字段/事件/属性签名（只有声明类型）
    pub fn of_type(result: TypeRef) -> Self {
        Self {
            params: SmallVec::new(),
            result,
        }
    }

    /// 空签名（类型定义自身）
    pub fn empty() -> Self {
        Self::of_type(TypeRef::Primitive(PrimitiveType::Void))
    }

    /// 遍历签名中出现的每个类型（含组成类型）
    pub fn walk_types(&self, visit: &mut dyn FnMut(&TypeRef)) {
        for param in &self.params {
            param.walk(visit);
        }
        self.result.walk(visit);
    }

    /// 确定性结构摘要
    ///
    /// 与快照无关：同一结构在任何进程、任何快照中的摘要相同。
    pub fn digest(&self) -> u64 {
        let mut digest = Fnv1a::new();
        digest.byte(self.params.len() as u8);
        for param in &self.params {
            param.feed(&mut digest);
        }
        self.result.feed(&mut digest);
        digest.finish()
    }
}

impl Default for StructuralSignature {
    fn default() -> Self {
        Self::empty()
    }
}

/// FNV-1a 摘要器
struct Fnv1a(u64);

impl Fnv1a {
    fn new() -> Self {
        Self(0xcbf29ce484222325)
    }

    fn byte(&mut self, b: u8) {
        self.0 ^= b as u64;
        self.0 = self.0.wrapping_mul(0x100000001b3);
    }

    fn bytes(&mut self, data: &[u8]) {
        for &b in data {
            self.byte(b);
        }
    }

    fn finish(&self) -> u64 {
        self.0
    }
}
