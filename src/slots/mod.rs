//! 局部变量槽位层
//!
//! 被编辑的方法体必须保住调试器可见的局部变量存储身份：
//! 槽位一旦分配，下标终生不变。本模块定义槽位描述符、
//! 上一代布局的提供方契约，以及跨代槽位分配算法。

pub mod allocator;
pub mod provider;

use serde::{Deserialize, Serialize};

use crate::symbols::{SyntaxNodeId, TypeRef};

/// 槽位来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotOrigin {
    /// 源码具名局部变量（记声明节点）
    Named(SyntaxNodeId),
    /// 编译器引入的单表达式临时变量
    Temporary,
    /// 本代不再使用；保留原类型占位，防止后续下标移动
    Unused,
}

/// 局部变量槽位描述符
///
/// 方法体首次编译时创建；`preserve_locals=true` 的更新通过
/// 语法映射把新声明关联回旧槽位重新推导。`Unused` 槽位
/// 永久保留原声明类型。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalSlotDescriptor {
    /// 槽位下标
    pub index: u32,
    /// 声明类型
    pub ty: TypeRef,
    /// 来源
    pub origin: SlotOrigin,
}

impl LocalSlotDescriptor {
    /// 具名槽位
    pub fn named(index: u32, ty: TypeRef, syntax: SyntaxNodeId) -> Self {
        Self {
            index,
            ty,
            origin: SlotOrigin::Named(syntax),
        }
    }

    /// 临时变量槽位
    pub fn temporary(index: u32, ty: TypeRef) -> Self {
        Self {
            index,
            ty,
            origin: SlotOrigin::Temporary,
        }
    }

    /// 占位槽位
    pub fn unused(index: u32, ty: TypeRef) -> Self {
        Self {
            index,
            ty,
            origin: SlotOrigin::Unused,
        }
    }
}

pub use allocator::{LocalSlotAllocator, SlotAllocation, SyntaxMapFn};
pub use provider::{DebugDataError, DebugInfoProvider, NullDebugInfoProvider};
