//! 统一诊断系统
//!
//! 提供错误码注册表、诊断数据结构与错误收集器。
//!
//! # 模块结构
//!
//! - [`error`] - 诊断数据结构 (Diagnostic, Severity)
//! - [`codes`] - 错误码注册表
//! - [`collect`] - 错误收集器
//!
//! # 示例
//!
//! ```
//! use xinhuo::util::diagnostic::{codes, ErrorCollector};
//!
//! let mut collector = ErrorCollector::new();
//! collector.push(codes::RESTRICTED_TYPE_REFERENCE.build(&["Interop.Handle"]));
//! assert!(collector.has_errors());
//! ```

pub mod codes;
pub mod collect;
pub mod error;

// 重新导出
pub use codes::{DiagnosticCode, ErrorCategory};
pub use collect::ErrorCollector;
pub use error::{Diagnostic, Severity};

/// 把一组诊断渲染为 JSON（供宿主进程持久化或展示）
pub fn to_json(diagnostics: &[Diagnostic]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(diagnostics)
}
