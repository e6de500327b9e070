//! 错误码注册表
//!
//! 所有诊断必须携带注册表中的错误码。分段规则：
//!
//! | 段 | 类别 |
//! |----|------|
//! | E1xxx | 编辑校验（基线解析失败、非法编辑组合） |
//! | E2xxx | 受限类型引用 |
//! | E3xxx | 跨单元可见性 |
//! | E4xxx | 编辑体内的普通语义错误 |
//! | E5xxx | 调试数据（上一代局部变量布局损坏） |
//! | E6xxx | 输出流 I/O |
//! | E8xxx | 内部错误 |

use once_cell::sync::Lazy;

use super::error::Diagnostic;

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// 编辑校验
    Validation,
    /// 受限类型引用
    RestrictedReference,
    /// 跨单元可见性
    CrossUnitVisibility,
    /// 语义错误
    Semantic,
    /// 调试数据
    DebugData,
    /// I/O
    Io,
    /// 内部错误
    Internal,
}

/// 错误码定义（仅元数据，message 由调用方渲染进占位符）
#[derive(Debug, Clone, Copy)]
pub struct DiagnosticCode {
    /// 错误码，如 "E1001"
    pub code: &'static str,
    /// 错误类别
    pub category: ErrorCategory,
    /// 消息模板，支持 {0} 占位符
    pub message_template: &'static str,
    /// 帮助文案
    pub help: &'static str,
}

/// 编辑的 `old_symbol` 在基线中无法解析
pub const UNRESOLVED_OLD_SYMBOL: DiagnosticCode = DiagnosticCode {
    code: "E1001",
    category: ErrorCategory::Validation,
    message_template: "edit references symbol '{0}' that cannot be resolved in the baseline",
    help: "updates and deletes must name a symbol emitted in a previous generation",
};

/// 同批次内插入的符号被用作另一个编辑的 `old_symbol`
pub const INSERTED_SYMBOL_AS_OLD: DiagnosticCode = DiagnosticCode {
    code: "E1002",
    category: ErrorCategory::Validation,
    message_template: "symbol '{0}' is inserted in this batch and cannot be the target of another edit",
    help: "split the batch so the insert lands in an earlier generation",
};

/// 编辑缺少必需的符号端点
pub const MALFORMED_EDIT: DiagnosticCode = DiagnosticCode {
    code: "E1003",
    category: ErrorCategory::Validation,
    message_template: "{0} edit is missing its {1} symbol",
    help: "inserts require a new symbol; updates require both; deletes require an old symbol",
};

/// 编辑体触及受限（interop 内嵌）类型
pub const RESTRICTED_TYPE_REFERENCE: DiagnosticCode = DiagnosticCode {
    code: "E2001",
    category: ErrorCategory::RestrictedReference,
    message_template: "edited body reaches restricted embedded type '{0}'",
    help: "embedded interop types cannot be referenced from a delta",
};

/// 跨单元引用了本代插入、但对方单元尚不可见的成员
pub const INACCESSIBLE_MEMBER: DiagnosticCode = DiagnosticCode {
    code: "E3001",
    category: ErrorCategory::CrossUnitVisibility,
    message_template: "member '{0}' was inserted in another compilation unit and is not visible here",
    help: "the referencing unit's edit batch must also insert the supporting declarations",
};

/// 跨单元引用了本代插入、但对方单元尚不可见的类型
pub const INACCESSIBLE_TYPE: DiagnosticCode = DiagnosticCode {
    code: "E3002",
    category: ErrorCategory::CrossUnitVisibility,
    message_template: "type '{0}' was inserted in another compilation unit and is not visible here",
    help: "the referencing unit's edit batch must also insert the supporting declarations",
};

/// 编辑体内的普通语义错误
pub const BODY_SEMANTIC_ERROR: DiagnosticCode = DiagnosticCode {
    code: "E4001",
    category: ErrorCategory::Semantic,
    message_template: "error in edited body of '{0}': {1}",
    help: "",
};

/// 上一代调试数据损坏
pub const MALFORMED_DEBUG_DATA: DiagnosticCode = DiagnosticCode {
    code: "E5001",
    category: ErrorCategory::DebugData,
    message_template: "previous-generation local layout for '{0}' is malformed: {1}",
    help: "the debug information provider returned unreadable data; this generation was aborted",
};

/// 输出流写入失败
pub const STREAM_WRITE_FAILED: DiagnosticCode = DiagnosticCode {
    code: "E6001",
    category: ErrorCategory::Io,
    message_template: "failed to write the {0} stream: {1}",
    help: "no delta was produced; the baseline is unchanged and the emit can be retried",
};

/// 内部错误
pub const INTERNAL_ERROR: DiagnosticCode = DiagnosticCode {
    code: "E8001",
    category: ErrorCategory::Internal,
    message_template: "internal error: {0}",
    help: "",
};

/// 完整的错误码注册表
static DIAGNOSTIC_CODES: Lazy<Vec<DiagnosticCode>> = Lazy::new(|| {
    vec![
        UNRESOLVED_OLD_SYMBOL,
        INSERTED_SYMBOL_AS_OLD,
        MALFORMED_EDIT,
        RESTRICTED_TYPE_REFERENCE,
        INACCESSIBLE_MEMBER,
        INACCESSIBLE_TYPE,
        BODY_SEMANTIC_ERROR,
        MALFORMED_DEBUG_DATA,
        STREAM_WRITE_FAILED,
        INTERNAL_ERROR,
    ]
});

impl DiagnosticCode {
    /// 根据代码查找错误码定义
    pub fn find(code: &str) -> Option<&'static Self> {
        DIAGNOSTIC_CODES.iter().find(|c| c.code == code)
    }

    /// 获取所有错误码
    pub fn all() -> &'static [Self] {
        &DIAGNOSTIC_CODES
    }

    /// 按类别获取错误码
    pub fn by_category(category: ErrorCategory) -> impl Iterator<Item = &'static Self> {
        DIAGNOSTIC_CODES.iter().filter(move |c| c.category == category)
    }

    /// 渲染占位符并构建诊断
    pub fn build(&self, args: &[&str]) -> Diagnostic {
        let mut message = self.message_template.to_string();
        for (i, arg) in args.iter().enumerate() {
            message = message.replace(&format!("{{{}}}", i), arg);
        }
        Diagnostic::error(self.code.to_string(), message, self.help.to_string())
    }
}
