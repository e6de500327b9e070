//! 增量层
//!
//! 一代的最小二进制负载：只含新增/变动行的表集、编辑日志、
//! 编辑映射、方法体流与调试信息流，以及把它们写出去的
//! 输出流契约。

pub mod body;
pub mod buffer;
pub mod debug;
pub mod edit_log;
pub mod encoder;
pub mod heaps;
pub mod sink;
pub mod tables;

pub use body::{EncodedBody, MethodBodyDelta, MISSING_MEMBER_BODY};
pub use buffer::DeltaBuffer;
pub use debug::{DebugInfoDelta, LocalVariableInfo, MethodDebugInfo, ScopeRange};
pub use edit_log::{EditLog, EditLogEntry, EditMap, EditOperation};
pub use encoder::{DeltaEncoder, EncodeError, EncodeOutput};
pub use heaps::HeapBuilder;
pub use sink::{DeltaSink, MemorySink, StreamKind};
pub use tables::{DeltaTables, TableRow};

/// 一代的完整增量产物
///
/// 三个字节流已写入输出流；结构化视图留给宿主检视。
#[derive(Debug)]
pub struct DeltaArtifacts {
    /// 增量行集
    pub tables: DeltaTables,
    /// 编辑日志
    pub edit_log: EditLog,
    /// 编辑映射
    pub edit_map: EditMap,
    /// 方法体增量
    pub bodies: MethodBodyDelta,
    /// 调试信息增量
    pub debug_info: DebugInfoDelta,
}

impl DeltaArtifacts {
    /// 序列化模块表流（行集 + 日志 + 映射 + 堆）
    pub fn metadata_bytes(&self, heaps: &mut HeapBuilder) -> Vec<u8> {
        let mut buf = DeltaBuffer::new();
        let table_bytes = self.tables.serialize(heaps);
        buf.push_sized(&table_bytes);
        self.edit_log.serialize(&mut buf);
        self.edit_map.serialize(&mut buf);
        let mut heap_buf = DeltaBuffer::new();
        heaps.serialize(&mut heap_buf);
        buf.push_sized(&heap_buf.into_bytes());
        buf.into_bytes()
    }
}
