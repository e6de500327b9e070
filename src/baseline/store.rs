//! 基线存储
//!
//! 一代的不可变快照：各模块表的行数、符号身份 → 句柄映射、
//! 合成成员注册表、每个方法的局部槽位布局。基线只被派生，
//! 从不被修改；多代可以同时只读共享同一份基线。

use std::collections::{BTreeSet, HashMap, HashSet};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::slots::LocalSlotDescriptor;
use crate::symbols::{
    AnonymousShape, AssemblyIdentity, HelperKind, MethodIdentity, SymbolIdentity,
};

/// 模块表种类
///
/// 判别值是固定的二进制表序号；编辑映射按这个顺序分组。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum TableKind {
    Module = 0x00,
    TypeRef = 0x01,
    TypeDef = 0x02,
    Field = 0x04,
    MethodDef = 0x06,
    Param = 0x08,
    MemberRef = 0x0a,
    Constant = 0x0b,
    CustomAttribute = 0x0c,
    StandAloneSig = 0x11,
    EventMap = 0x12,
    Event = 0x14,
    PropertyMap = 0x15,
    Property = 0x17,
    TypeSpec = 0x1b,
    AssemblyRef = 0x23,
    NestedClass = 0x29,
    GenericParam = 0x2a,
    MethodSpec = 0x2b,
    GenericParamConstraint = 0x2c,
}

impl TableKind {
    /// 全部表种类，按表序号排列
    pub const ALL: [TableKind; 20] = [
        TableKind::Module,
        TableKind::TypeRef,
        TableKind::TypeDef,
        TableKind::Field,
        TableKind::MethodDef,
        TableKind::Param,
        TableKind::MemberRef,
        TableKind::Constant,
        TableKind::CustomAttribute,
        TableKind::StandAloneSig,
        TableKind::EventMap,
        TableKind::Event,
        TableKind::PropertyMap,
        TableKind::Property,
        TableKind::TypeSpec,
        TableKind::AssemblyRef,
        TableKind::NestedClass,
        TableKind::GenericParam,
        TableKind::MethodSpec,
        TableKind::GenericParamConstraint,
    ];

    /// 二进制表序号
    pub fn index(self) -> u8 {
        self as u8
    }
}

impl std::fmt::Display for TableKind {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        let name = match self {
            TableKind::Module => "module",
            TableKind::TypeRef => "type-ref",
            TableKind::TypeDef => "type-def",
            TableKind::Field => "field",
            TableKind::MethodDef => "method-def",
            TableKind::Param => "param",
            TableKind::MemberRef => "member-ref",
            TableKind::Constant => "constant",
            TableKind::CustomAttribute => "custom-attribute",
            TableKind::StandAloneSig => "standalone-sig",
            TableKind::EventMap => "event-map",
            TableKind::Event => "event",
            TableKind::PropertyMap => "property-map",
            TableKind::Property => "property",
            TableKind::TypeSpec => "type-spec",
            TableKind::AssemblyRef => "assembly-ref",
            TableKind::NestedClass => "nested-class",
            TableKind::GenericParam => "generic-param",
            TableKind::MethodSpec => "method-spec",
            TableKind::GenericParamConstraint => "generic-param-constraint",
        };
        write!(f, "{}", name)
    }
}

/// 表内行句柄
///
/// 行号从 1 开始；一个方法身份一旦领到句柄就终生不变。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Handle {
    /// 所属表
    pub table: TableKind,
    /// 1 起始行号
    pub row: u32,
}

impl Handle {
    /// 创建句柄
    pub fn new(table: TableKind, row: u32) -> Self {
        debug_assert!(row >= 1, "row numbers are 1-based");
        Self { table, row }
    }

    /// 组合成 32 位令牌：高 8 位表序号，低 24 位行号
    pub fn token(self) -> u32 {
        ((self.table.index() as u32) << 24) | (self.row & 0x00ff_ffff)
    }
}

impl std::fmt::Display for Handle {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "0x{:08x}", self.token())
    }
}

/// 各表行数
///
/// 固定按表序号迭代；跨代只增不减。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowCounts {
    counts: IndexMap<TableKind, u32>,
}

impl RowCounts {
    /// 全零行数表
    pub fn empty() -> Self {
        let mut counts = IndexMap::with_capacity(TableKind::ALL.len());
        for kind in TableKind::ALL {
            counts.insert(kind, 0);
        }
        Self { counts }
    }

    /// 某表当前行数
    pub fn count(&self, kind: TableKind) -> u32 {
        self.counts[&kind]
    }

    /// 给某表增加 n 行，返回第一条新行的行号
    pub fn add(&mut self, kind: TableKind, n: u32) -> u32 {
        let entry = self.counts.get_mut(&kind).expect("all kinds seeded");
        let first = *entry + 1;
        *entry += n;
        first
    }

    /// 合并另一份增量行数
    pub fn merge(&mut self, added: &IndexMap<TableKind, u32>) {
        for (kind, n) in added {
            *self.counts.get_mut(kind).expect("all kinds seeded") += n;
        }
    }

    /// 按表序号迭代
    pub fn iter(&self) -> impl Iterator<Item = (TableKind, u32)> + '_ {
        self.counts.iter().map(|(k, v)| (*k, *v))
    }
}

impl Default for RowCounts {
    fn default() -> Self {
        Self::empty()
    }
}

/// 引用表行的键
///
/// 基线为"已经提到过的外部符号"记住引用行句柄；
/// 编辑体首次提到的外部符号在增量里领新行。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceKey {
    /// 程序集引用
    Assembly(AssemblyIdentity),
    /// 外部类型引用
    Type {
        /// 定义方程序集
        assembly: AssemblyIdentity,
        /// 完整限定名
        qualified_name: String,
    },
    /// 外部成员引用
    Member {
        /// 定义方程序集
        assembly: AssemblyIdentity,
        /// 成员完整限定名
        qualified_name: String,
        /// 签名摘要
        signature_digest: u64,
    },
}

/// 闭包容器的匹配键
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClosureKey {
    /// 外层方法身份
    pub method: MethodIdentity,
    /// 捕获变量名集合
    pub captured: BTreeSet<String>,
}

/// 委托缓存字段的匹配键
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DelegateCacheKey {
    /// 外层方法身份
    pub method: MethodIdentity,
    /// 目标成员限定名
    pub target: String,
}

/// 一代的不可变基线
///
/// 只能通过 [`GenerationChain`](super::chain::GenerationChain) 派生；
/// 字段对 crate 内只读可见。
#[derive(Debug, Clone)]
pub struct Baseline {
    /// 代序号（初始编译为 0）
    pub generation: u32,
    /// 各表行数
    pub row_counts: RowCounts,
    /// 定义符号身份 → 句柄
    pub symbol_to_handle: HashMap<SymbolIdentity, Handle>,
    /// 引用行 → 句柄
    pub reference_to_handle: HashMap<ReferenceKey, Handle>,
    /// 匿名记录形状 → 容器类型句柄
    pub anonymous_shapes: HashMap<AnonymousShape, Handle>,
    /// 闭包容器注册表
    pub closure_containers: HashMap<ClosureKey, Handle>,
    /// 委托缓存字段注册表
    pub delegate_caches: HashMap<DelegateCacheKey, Handle>,
    /// 按需辅助例程 → 方法句柄
    pub helper_methods: HashMap<HelperKind, Handle>,
    /// 历代合成名集合（含仍可能存活的旧名）
    pub synthesized_names: HashSet<String>,
    /// 下一个合成容器序号（跨代单调）
    pub next_synth_ordinal: u32,
    /// 方法身份 → 局部槽位布局
    pub local_layouts: HashMap<MethodIdentity, Vec<LocalSlotDescriptor>>,
}

impl Baseline {
    /// 空基线（第 0 代的起点，由 `create_initial` 填充）
    pub(crate) fn empty() -> Self {
        Self {
            generation: 0,
            row_counts: RowCounts::empty(),
            symbol_to_handle: HashMap::new(),
            reference_to_handle: HashMap::new(),
            anonymous_shapes: HashMap::new(),
            closure_containers: HashMap::new(),
            delegate_caches: HashMap::new(),
            helper_methods: HashMap::new(),
            synthesized_names: HashSet::new(),
            next_synth_ordinal: 0,
            local_layouts: HashMap::new(),
        }
    }

    /// 查定义符号的句柄
    pub fn handle_of(&self, identity: &SymbolIdentity) -> Option<Handle> {
        self.symbol_to_handle.get(identity).copied()
    }

    /// 查引用行的句柄
    pub fn reference_handle(&self, key: &ReferenceKey) -> Option<Handle> {
        self.reference_to_handle.get(key).copied()
    }

    /// 查方法的上一代槽位布局
    pub fn method_layout(&self, method: &MethodIdentity) -> Option<&[LocalSlotDescriptor]> {
        self.local_layouts.get(method).map(Vec::as_slice)
    }
}
