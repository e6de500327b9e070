//! 增量行集
//!
//! 一代只携带本代新增或变动的行；没动过的行由句柄引用，
//! 从不重发。行负载只存结构性内容，名字在序列化时驻留进堆。

use indexmap::IndexMap;

use crate::baseline::{Handle, TableKind};
use crate::symbols::Visibility;

use super::buffer::DeltaBuffer;
use super::heaps::HeapBuilder;

/// 一条表行的负载
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableRow {
    /// 外部类型引用
    TypeRef {
        /// 所属程序集引用行
        assembly: Handle,
        /// 完整限定名
        name: String,
    },
    /// 类型定义
    TypeDef {
        /// 完整限定名
        name: String,
        /// 可见性
        visibility: Visibility,
    },
    /// 字段定义
    Field {
        /// 所属类型
        parent: Handle,
        /// 字段名
        name: String,
    },
    /// 方法定义
    MethodDef {
        /// 所属类型
        parent: Handle,
        /// 方法名
        name: String,
    },
    /// 参数行
    Param {
        /// 所属方法
        method: Handle,
        /// 参数名
        name: String,
        /// 参数序号（1 起始；0 表示返回值）
        ordinal: u16,
    },
    /// 外部成员引用
    MemberRef {
        /// 所属类型引用
        parent: Handle,
        /// 成员名
        name: String,
    },
    /// 独立签名（局部变量签名 blob）
    StandAloneSig {
        /// blob 堆下标
        blob: u32,
    },
    /// 事件映射（类型首次获得事件时发射一次）
    EventMap {
        /// 所属类型
        parent: Handle,
    },
    /// 事件定义
    Event {
        /// 所属类型
        parent: Handle,
        /// 事件名
        name: String,
    },
    /// 属性映射（类型首次获得属性时发射一次）
    PropertyMap {
        /// 所属类型
        parent: Handle,
    },
    /// 属性定义
    Property {
        /// 所属类型
        parent: Handle,
        /// 属性名
        name: String,
    },
    /// 程序集引用
    AssemblyRef {
        /// 简单名
        name: String,
        /// 版本
        version: (u16, u16, u16, u16),
    },
    /// 嵌套关系
    NestedClass {
        /// 嵌套类型
        nested: Handle,
        /// 外层类型
        enclosing: Handle,
    },
    /// 泛型形参
    GenericParam {
        /// 所属类型/方法
        owner: Handle,
        /// 形参序号
        ordinal: u16,
        /// 形参名
        name: String,
    },
    /// 泛型形参约束
    GenericParamConstraint {
        /// 所属泛型形参行
        owner: Handle,
        /// 约束类型 blob
        constraint_blob: u32,
    },
}

impl TableRow {
    /// 行所属的表
    pub fn table(&self) -> TableKind {
        match self {
            TableRow::TypeRef { .. } => TableKind::TypeRef,
            TableRow::TypeDef { .. } => TableKind::TypeDef,
            TableRow::Field { .. } => TableKind::Field,
            TableRow::MethodDef { .. } => TableKind::MethodDef,
            TableRow::Param { .. } => TableKind::Param,
            TableRow::MemberRef { .. } => TableKind::MemberRef,
            TableRow::StandAloneSig { .. } => TableKind::StandAloneSig,
            TableRow::EventMap { .. } => TableKind::EventMap,
            TableRow::Event { .. } => TableKind::Event,
            TableRow::PropertyMap { .. } => TableKind::PropertyMap,
            TableRow::Property { .. } => TableKind::Property,
            TableRow::AssemblyRef { .. } => TableKind::AssemblyRef,
            TableRow::NestedClass { .. } => TableKind::NestedClass,
            TableRow::GenericParam { .. } => TableKind::GenericParam,
            TableRow::GenericParamConstraint { .. } => TableKind::GenericParamConstraint,
        }
    }

    fn serialize(&self, buf: &mut DeltaBuffer, heaps: &mut HeapBuilder) {
        match self {
            TableRow::TypeRef { assembly, name } => {
                buf.push_u32(assembly.token());
                buf.push_u32(heaps.string(name));
            }
            TableRow::TypeDef { name, visibility } => {
                buf.push_u32(heaps.string(name));
                buf.push_u8(*visibility as u8);
            }
            TableRow::Field { parent, name }
            | TableRow::MethodDef { parent, name }
            | TableRow::Event { parent, name }
            | TableRow::Property { parent, name } => {
                buf.push_u32(parent.token());
                buf.push_u32(heaps.string(name));
            }
            TableRow::Param {
                method,
                name,
                ordinal,
            } => {
                buf.push_u32(method.token());
                buf.push_u32(heaps.string(name));
                buf.push_u16(*ordinal);
            }
            TableRow::MemberRef { parent, name } => {
                buf.push_u32(parent.token());
                buf.push_u32(heaps.string(name));
            }
            TableRow::StandAloneSig { blob } => {
                buf.push_u32(*blob);
            }
            TableRow::EventMap { parent } | TableRow::PropertyMap { parent } => {
                buf.push_u32(parent.token());
            }
            TableRow::AssemblyRef { name, version } => {
                buf.push_u32(heaps.string(name));
                let (a, b, c, d) = *version;
                buf.push_u16(a);
                buf.push_u16(b);
                buf.push_u16(c);
                buf.push_u16(d);
            }
            TableRow::NestedClass { nested, enclosing } => {
                buf.push_u32(nested.token());
                buf.push_u32(enclosing.token());
            }
            TableRow::GenericParam {
                owner,
                ordinal,
                name,
            } => {
                buf.push_u32(owner.token());
                buf.push_u16(*ordinal);
                buf.push_u32(heaps.string(name));
            }
            TableRow::GenericParamConstraint {
                owner,
                constraint_blob,
            } => {
                buf.push_u32(owner.token());
                buf.push_u32(*constraint_blob);
            }
        }
    }
}

/// 一代的增量行集
///
/// 固定按表序号迭代；表内按行号升序。
#[derive(Debug)]
pub struct DeltaTables {
    rows: IndexMap<TableKind, Vec<(u32, TableRow)>>,
}

impl DeltaTables {
    /// 创建空行集
    pub fn new() -> Self {
        let mut rows = IndexMap::with_capacity(TableKind::ALL.len());
        for kind in TableKind::ALL {
            rows.insert(kind, Vec::new());
        }
        Self { rows }
    }

    /// 登记一条行
    pub fn add(&mut self, handle: Handle, row: TableRow) {
        debug_assert_eq!(handle.table, row.table());
        self.rows
            .get_mut(&handle.table)
            .expect("all kinds seeded")
            .push((handle.row, row));
    }

    /// 某表本代的行
    pub fn rows_of(&self, kind: TableKind) -> &[(u32, TableRow)] {
        &self.rows[&kind]
    }

    /// 本代行总数
    pub fn total_rows(&self) -> usize {
        self.rows.values().map(Vec::len).sum()
    }

    /// 是否没有任何行
    pub fn is_empty(&self) -> bool {
        self.total_rows() == 0
    }

    /// 按表序号迭代非空表
    pub fn iter(&self) -> impl Iterator<Item = (TableKind, &[(u32, TableRow)])> + '_ {
        self.rows
            .iter()
            .filter(|(_, rows)| !rows.is_empty())
            .map(|(kind, rows)| (*kind, rows.as_slice()))
    }

    /// 序列化行集（含堆）
    pub fn serialize(&self, heaps: &mut HeapBuilder) -> Vec<u8> {
        let mut buf = DeltaBuffer::new();
        buf.push_u32(self.rows.values().filter(|r| !r.is_empty()).count() as u32);
        for (kind, rows) in self.iter() {
            buf.push_u8(kind.index());
            buf.push_u32(rows.len() as u32);
            for (row_number, row) in rows {
                buf.push_u32(*row_number);
                row.serialize(&mut buf, heaps);
            }
        }
        buf.into_bytes()
    }
}
