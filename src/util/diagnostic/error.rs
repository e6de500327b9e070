//! 诊断数据结构
//!
//! 提供统一的错误报告机制。
//!
//! # 设计原则
//!
//! - `Diagnostic` 是最终产物，`message` 和 `help` 在构造时已渲染完成
//! - 诊断通过 [`DiagnosticCode`](super::codes::DiagnosticCode) 的快捷方法创建，
//!   保证每条诊断都携带注册表中的错误码

use serde::{Deserialize, Serialize};

/// 诊断严重级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

impl Severity {
    /// 获取严重级别对应的数字值
    pub fn as_u8(&self) -> u8 {
        match self {
            Severity::Error => 4,
            Severity::Warning => 3,
            Severity::Info => 2,
            Severity::Hint => 1,
        }
    }

    /// 检查是否为错误级别
    pub fn is_error(&self) -> bool {
        matches!(self, Severity::Error)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
            Severity::Hint => write!(f, "hint"),
        }
    }
}

/// 诊断信息（message 已渲染完成）
///
/// 通过 `DiagnosticCode` 的构造方法创建，确保错误码都经过注册表。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    /// 严重级别
    pub severity: Severity,
    /// 错误码
    pub code: String,
    /// 完整消息
    pub message: String,
    /// 帮助信息
    pub help: String,
}

impl Diagnostic {
    /// 创建错误诊断
    pub(crate) fn error(
        code: String,
        message: String,
        help: String,
    ) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message,
            help,
        }
    }

    /// 创建警告诊断
    #[allow(dead_code)]
    pub(crate) fn warning(
        code: String,
        message: String,
        help: String,
    ) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message,
            help,
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.code, self.message)
    }
}
