//! 错误收集器
//!
//! 流水线的错误策略是"累积而非立即中止"：可恢复的失败都先收集，
//! 最后统一决定本代是否产出增量。

use super::error::{Diagnostic, Severity};

/// 错误收集器
///
/// 累积诊断而不提前退出；`has_errors` 决定最终成败。
#[derive(Debug, Default)]
pub struct ErrorCollector {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
}

impl ErrorCollector {
    /// 创建空收集器
    pub fn new() -> Self {
        Self::default()
    }

    /// 收集一条诊断
    pub fn push(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity.is_error() {
            self.error_count += 1;
        }
        self.diagnostics.push(diagnostic);
    }

    /// 收集多条诊断
    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        for diag in diagnostics {
            self.push(diag);
        }
    }

    /// 是否存在错误级别的诊断
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    /// 错误数量
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// 只读访问已收集的诊断
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// 取出全部诊断，消费收集器
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// 按严重级别统计
    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}
