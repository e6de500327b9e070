//! 上一代调试信息的提供方契约
//!
//! 协作方（宿主的调试信息读取器）按方法身份返回上一代的槽位布局。
//! "数据损坏"是它唯一文档化的可恢复失败，本层把它转成诊断、
//! 只中止当代；其他任何意外故障按原样向外传播。

use thiserror::Error;

use crate::symbols::MethodIdentity;

use super::LocalSlotDescriptor;

/// 调试数据错误（提供方的文档化可恢复失败）
#[derive(Debug, Clone, Error)]
pub enum DebugDataError {
    /// 上一代布局数据无法读取
    #[error("malformed local layout for {method}: {detail}")]
    Malformed {
        /// 方法身份
        method: String,
        /// 细节
        detail: String,
    },
}

/// 调试信息提供方
///
/// `Ok(None)` 表示该方法没有上一代布局（比如新插入的方法）。
pub trait DebugInfoProvider {
    /// 返回方法上一代的槽位布局
    fn local_slots(
        &self,
        method: &MethodIdentity,
    ) -> Result<Option<Vec<LocalSlotDescriptor>>, DebugDataError>;
}

/// 空提供方：没有任何上一代布局
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDebugInfoProvider;

impl DebugInfoProvider for NullDebugInfoProvider {
    fn local_slots(
        &self,
        _method: &MethodIdentity,
    ) -> Result<Option<Vec<LocalSlotDescriptor>>, DebugDataError> {
        Ok(None)
    }
}
