//! 编辑日志与编辑映射
//!
//! 两张记账表让消费方能把增量应用到累积镜像上：
//!
//! - **编辑日志**：有序 `{句柄, 操作}` 记录，按发射顺序排列。
//!   父结构行（"类型获得一个方法"）先于它引入的行。
//! - **编辑映射**：本代触及的全部句柄，按表序号分组、
//!   组内按行号升序——消费方的完整补丁集。

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::baseline::{Handle, TableKind};

use super::buffer::DeltaBuffer;

/// 编辑日志操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum EditOperation {
    /// 行本身新增或变动
    Default = 0,
    /// 父类型获得方法
    AddMethod = 1,
    /// 父类型获得字段
    AddField = 2,
    /// 父方法获得参数
    AddParameter = 3,
    /// 父类型获得属性
    AddProperty = 4,
    /// 父类型获得事件
    AddEvent = 5,
}

/// 一条编辑日志记录
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditLogEntry {
    /// 触及的行
    pub handle: Handle,
    /// 操作
    pub operation: EditOperation,
}

/// 编辑日志（发射顺序）
#[derive(Debug, Default)]
pub struct EditLog {
    entries: Vec<EditLogEntry>,
}

impl EditLog {
    /// 创建空日志
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一条记录
    pub fn push(&mut self, handle: Handle, operation: EditOperation) {
        self.entries.push(EditLogEntry { handle, operation });
    }

    /// 全部记录
    pub fn entries(&self) -> &[EditLogEntry] {
        &self.entries
    }

    /// 记录数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 序列化
    pub fn serialize(&self, buf: &mut DeltaBuffer) {
        buf.push_u32(self.entries.len() as u32);
        for entry in &self.entries {
            buf.push_u32(entry.handle.token());
            buf.push_u8(entry.operation as u8);
        }
    }
}

/// 编辑映射
///
/// 由本代触及的句柄构建；重复句柄只出现一次。
#[derive(Debug, Default)]
pub struct EditMap {
    entries: Vec<Handle>,
}

impl EditMap {
    /// 从触及句柄集合构建
    ///
    /// 分组顺序 = 表序号顺序；组内按行号升序。
    pub fn build(touched: impl IntoIterator<Item = Handle>) -> Self {
        let mut grouped: IndexMap<TableKind, Vec<u32>> = IndexMap::new();
        for kind in TableKind::ALL {
            grouped.insert(kind, Vec::new());
        }
        for handle in touched {
            let rows = grouped.get_mut(&handle.table).expect("all kinds seeded");
            if !rows.contains(&handle.row) {
                rows.push(handle.row);
            }
        }
        let mut entries = Vec::new();
        for (kind, mut rows) in grouped {
            rows.sort_unstable();
            entries.extend(rows.into_iter().map(|row| Handle::new(kind, row)));
        }
        Self { entries }
    }

    /// 全部句柄
    pub fn entries(&self) -> &[Handle] {
        &self.entries
    }

    /// 句柄数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 序列化
    pub fn serialize(&self, buf: &mut DeltaBuffer) {
        buf.push_u32(self.entries.len() as u32);
        for handle in &self.entries {
            buf.push_u32(handle.token());
        }
    }
}
