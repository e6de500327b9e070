//! 已解析符号图
//!
//! 前端（外部协作方）产出的快照在这里落成一个紧凑的 arena：
//! 符号按声明顺序存放，`SymbolRef` 是 arena 内句柄。
//! 匹配器只通过 [`SymbolView`] 能力接口读取符号，
//! 不与任何具体前端的符号层级绑定。

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use super::identity::{AssemblyIdentity, SymbolIdentity, SymbolKind, UnitId};
use super::signature::{StructuralSignature, TypeRef, Visibility};

/// arena 内符号句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolRef(pub u32);

impl SymbolRef {
    /// Create a new symbol ref
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    /// Get the arena index
    pub fn index(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for SymbolRef {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// 语法节点身份
///
/// 前端提供的稳定声明节点编号，语法映射以它为键。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SyntaxNodeId(pub u32);

impl SyntaxNodeId {
    /// Create a new syntax node id
    pub fn new(index: u32) -> Self {
        Self(index)
    }
}

impl std::fmt::Display for SyntaxNodeId {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// 方法体内的局部变量声明
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalDecl {
    /// 声明节点
    pub syntax: SyntaxNodeId,
    /// 变量名
    pub name: String,
    /// 声明类型
    pub ty: TypeRef,
}

/// 序列点（调试信息）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencePoint {
    /// 指令偏移
    pub il_offset: u32,
    /// 源码行
    pub line: u32,
    /// 源码列
    pub column: u32,
}

/// 匿名记录类型的结构形状
///
/// 有序 (字段名, 字段类型) 元组；字段名区分大小写。
/// 两代之间形状相同即视为同一类型。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnonymousShape {
    /// 有序字段表
    pub fields: Vec<(String, TypeRef)>,
}

impl AnonymousShape {
    /// 创建形状
    pub fn new(fields: impl IntoIterator<Item = (String, TypeRef)>) -> Self {
        Self {
            fields: fields.into_iter().collect(),
        }
    }
}

impl std::fmt::Display for AnonymousShape {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, (name, ty)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", name, ty)?;
        }
        write!(f, "}}")
    }
}

/// 方法体内的闭包捕获容器使用
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosureUse {
    /// 捕获的变量名集合
    pub captured: BTreeSet<String>,
}

impl ClosureUse {
    /// 创建闭包使用记录
    pub fn new(captured: impl IntoIterator<Item = String>) -> Self {
        Self {
            captured: captured.into_iter().collect(),
        }
    }
}

/// 调用点的委托/句柄缓存字段使用
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DelegateCacheUse {
    /// 调用点序号（方法体内）
    pub call_site: u32,
    /// 目标成员限定名
    pub target: String,
}

/// 按需合成的辅助例程种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HelperKind {
    /// 字符串分支构造所需的哈希辅助方法
    StringSwitchHash,
    /// 数组初始化辅助
    ArrayInit,
}

impl std::fmt::Display for HelperKind {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            HelperKind::StringSwitchHash => write!(f, "string-switch-hash"),
            HelperKind::ArrayInit => write!(f, "array-init"),
        }
    }
}

/// 方法体描述
///
/// 本层不做代码生成；`code` 是前端产出的不透明编码指令流，
/// 其余字段是增量计算需要的结构性事实。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BodyDescriptor {
    /// 体内引用的其他符号（同图句柄）
    pub referenced: Vec<SymbolRef>,
    /// 体内引用的外部类型
    pub referenced_types: Vec<TypeRef>,
    /// 源码局部变量声明，按声明顺序
    pub locals: Vec<LocalDecl>,
    /// 编译器引入的单表达式临时变量个数
    pub temporaries: u32,
    /// 体内使用的匿名记录形状
    pub anonymous_shapes: Vec<AnonymousShape>,
    /// 体内使用的闭包容器
    pub closures: Vec<ClosureUse>,
    /// 体内使用的委托缓存字段
    pub delegate_caches: Vec<DelegateCacheUse>,
    /// 体内需要的辅助例程
    pub helpers: Vec<HelperKind>,
    /// 编码后的指令流
    pub code: Vec<u8>,
    /// 序列点
    pub sequence_points: Vec<SequencePoint>,
    /// 所属源文档
    pub document: String,
    /// 体内的普通语义错误（由前端标注）
    pub semantic_errors: Vec<String>,
}

/// 类型/方法的泛型形参声明
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericParamDecl {
    /// 形参名
    pub name: String,
    /// 约束类型表
    pub constraints: Vec<TypeRef>,
}

/// 符号数据
#[derive(Debug, Clone)]
pub struct SymbolData {
    /// 稳定身份
    pub identity: SymbolIdentity,
    /// 容器符号
    pub container: Option<SymbolRef>,
    /// 结构化签名
    pub signature: StructuralSignature,
    /// 可见性
    pub visibility: Visibility,
    /// 是否为受限（interop 内嵌）类型
    pub is_restricted: bool,
    /// 全局声明顺序
    pub declaration_order: u32,
    /// 泛型形参
    pub generic_params: Vec<GenericParamDecl>,
    /// 成员（仅类型符号）
    pub members: Vec<SymbolRef>,
    /// 方法体（仅方法符号）
    pub body: Option<BodyDescriptor>,
}

/// 编译单元数据
#[derive(Debug, Clone)]
pub struct UnitData {
    /// 单元索引
    pub id: UnitId,
    /// 本单元的程序集身份
    pub identity: AssemblyIdentity,
    /// 引用的程序集集合
    pub references: Vec<AssemblyIdentity>,
    /// 顶层符号，按声明顺序
    pub roots: Vec<SymbolRef>,
}

/// 已解析符号图（一个快照）
///
/// 构造完成后只读；匹配器可以从多个线程并发查询。
#[derive(Debug, Default)]
pub struct SymbolGraph {
    units: Vec<UnitData>,
    symbols: Vec<SymbolData>,
    by_identity: HashMap<SymbolIdentity, SymbolRef>,
}

impl SymbolGraph {
    pub(crate) fn from_parts(
        units: Vec<UnitData>,
        symbols: Vec<SymbolData>,
        by_identity: HashMap<SymbolIdentity, SymbolRef>,
    ) -> Self {
        Self {
            units,
            symbols,
            by_identity,
        }
    }

    /// 符号数量
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// 访问符号数据
    pub fn symbol(&self, sym: SymbolRef) -> &SymbolData {
        &self.symbols[sym.0 as usize]
    }

    /// 按身份查找符号
    pub fn find(&self, identity: &SymbolIdentity) -> Option<SymbolRef> {
        self.by_identity.get(identity).copied()
    }

    /// 访问编译单元
    pub fn unit(&self, id: UnitId) -> &UnitData {
        &self.units[id.0 as usize]
    }

    /// 全部编译单元
    pub fn units(&self) -> &[UnitData] {
        &self.units
    }

    /// 全部符号句柄，按声明顺序
    pub fn iter(&self) -> impl Iterator<Item = SymbolRef> + '_ {
        (0..self.symbols.len() as u32).map(SymbolRef)
    }

    /// 某单元的顶层符号
    pub fn unit_roots(&self, id: UnitId) -> &[SymbolRef] {
        &self.unit(id).roots
    }

    /// 在容器下查找候选成员：同种类、同短名、同泛型元数
    ///
    /// 容器为 `None` 时在指定单元的顶层查找。
    pub fn candidates(
        &self,
        unit: UnitId,
        container: Option<SymbolRef>,
        kind: SymbolKind,
        short_name: &str,
        generic_arity: u16,
    ) -> Vec<SymbolRef> {
        let pool: &[SymbolRef] = match container {
            Some(c) => &self.symbol(c).members,
            None => self.unit_roots(unit),
        };
        pool.iter()
            .copied()
            .filter(|&m| {
                let data = self.symbol(m);
                data.identity.kind == kind
                    && data.identity.generic_arity == generic_arity
                    && short_name_of(&data.identity.qualified_name) == short_name
            })
            .collect()
    }

    /// 按限定名查找类型符号（跨全部单元）
    pub fn find_type_by_name(&self, qualified_name: &str) -> Option<SymbolRef> {
        self.iter().find(|&s| {
            let data = self.symbol(s);
            data.identity.kind == SymbolKind::Type
                && data.identity.qualified_name == qualified_name
        })
    }

    /// 程序集身份在本快照中是否可解析
    ///
    /// 可解析 = 是某个单元自身的身份，或出现在某个单元的引用集中。
    /// 按完整身份比较，同名不同版本不算。
    pub fn resolves_assembly(&self, assembly: &AssemblyIdentity) -> bool {
        self.units.iter().any(|unit| {
            unit.identity == *assembly || unit.references.iter().any(|r| r == assembly)
        })
    }

    /// 类型引用在本快照中是否可解析
    pub fn resolves_type(&self, ty: &TypeRef) -> bool {
        let mut ok = true;
        ty.walk(&mut |t| {
            if let TypeRef::Named { assembly, .. } = t {
                if !self.resolves_assembly(assembly) {
                    ok = false;
                }
            }
        });
        ok
    }
}

/// 限定名的最后一段
pub fn short_name_of(qualified_name: &str) -> &str {
    qualified_name.rsplit('.').next().unwrap_or(qualified_name)
}

/// 符号能力接口
///
/// 匹配器只依赖这三个能力，每种实体一个适配器，
/// 保持对前端符号层级的独立。
pub trait SymbolView {
    /// 稳定限定身份
    fn identity(&self) -> &SymbolIdentity;
    /// 结构化签名
    fn signature(&self) -> &StructuralSignature;
    /// 容器符号
    fn container(&self) -> Option<SymbolRef>;
}

macro_rules! symbol_view_adapter {
    ($name:ident, $kind:expr) => {
        /// 能力接口适配器
        pub struct $name<'g> {
            graph: &'g SymbolGraph,
            sym: SymbolRef,
        }

        impl<'g> $name<'g> {
            /// 包装一个符号句柄（调用方保证种类匹配）
            pub fn new(graph: &'g SymbolGraph, sym: SymbolRef) -> Self {
                debug_assert_eq!(graph.symbol(sym).identity.kind, $kind);
                Self { graph, sym }
            }

            /// 底层句柄
            pub fn as_ref(&self) -> SymbolRef {
                self.sym
            }
        }

        impl SymbolView for $name<'_> {
            fn identity(&self) -> &SymbolIdentity {
                &self.graph.symbol(self.sym).identity
            }

            fn signature(&self) -> &StructuralSignature {
                &self.graph.symbol(self.sym).signature
            }

            fn container(&self) -> Option<SymbolRef> {
                self.graph.symbol(self.sym).container
            }
        }
    };
}

symbol_view_adapter!(TypeSymbol, SymbolKind::Type);
symbol_view_adapter!(MethodSymbol, SymbolKind::Method);
symbol_view_adapter!(FieldSymbol, SymbolKind::Field);
symbol_view_adapter!(PropertySymbol, SymbolKind::Property);
symbol_view_adapter!(EventSymbol, SymbolKind::Event);
