//! 输出流
//!
//! 三个产物是互相独立的字节流；任何一个写失败都要指明
//! 是哪个流，且不腐蚀其余两个、不推进基线。

use std::io;

/// 输出流种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    /// 模块表增量
    Metadata,
    /// 方法体增量
    Code,
    /// 调试信息增量
    DebugInfo,
}

impl std::fmt::Display for StreamKind {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            StreamKind::Metadata => write!(f, "metadata"),
            StreamKind::Code => write!(f, "code"),
            StreamKind::DebugInfo => write!(f, "debug-info"),
        }
    }
}

/// 二进制写入协作方
///
/// 由宿主实现（文件、内存、网络皆可）；本层只保证
/// 每个流一次完整写入。
pub trait DeltaSink {
    /// 写一个完整的流
    fn write(&mut self, stream: StreamKind, bytes: &[u8]) -> io::Result<()>;
}

/// 内存写入器
#[derive(Debug, Default)]
pub struct MemorySink {
    /// 模块表流
    pub metadata: Vec<u8>,
    /// 方法体流
    pub code: Vec<u8>,
    /// 调试信息流
    pub debug: Vec<u8>,
}

impl MemorySink {
    /// 创建空写入器
    pub fn new() -> Self {
        Self::default()
    }
}

impl DeltaSink for MemorySink {
    fn write(&mut self, stream: StreamKind, bytes: &[u8]) -> io::Result<()> {
        match stream {
            StreamKind::Metadata => self.metadata.extend_from_slice(bytes),
            StreamKind::Code => self.code.extend_from_slice(bytes),
            StreamKind::DebugInfo => self.debug.extend_from_slice(bytes),
        }
        Ok(())
    }
}
