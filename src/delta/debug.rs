//! 调试信息增量
//!
//! 每个插入/更新的方法：序列点、局部变量名与作用域、
//! 所属文档引用，键与方法体增量相同。

use crate::baseline::Handle;
use crate::symbols::SequencePoint;

use super::buffer::DeltaBuffer;

/// 局部变量调试信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVariableInfo {
    /// 槽位下标
    pub slot: u32,
    /// 变量名
    pub name: String,
}

/// 作用域范围（指令偏移区间）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScopeRange {
    /// 起始偏移
    pub start: u32,
    /// 结束偏移
    pub end: u32,
}

/// 一个方法的调试信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDebugInfo {
    /// 方法句柄
    pub method: Handle,
    /// 所属源文档
    pub document: String,
    /// 序列点
    pub sequence_points: Vec<SequencePoint>,
    /// 局部变量
    pub locals: Vec<LocalVariableInfo>,
    /// 方法体作用域
    pub scope: ScopeRange,
}

/// 调试信息增量
#[derive(Debug, Default)]
pub struct DebugInfoDelta {
    methods: Vec<MethodDebugInfo>,
}

impl DebugInfoDelta {
    /// 创建空增量
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一个方法的调试信息
    pub fn push(&mut self, info: MethodDebugInfo) {
        self.methods.push(info);
    }

    /// 全部方法
    pub fn methods(&self) -> &[MethodDebugInfo] {
        &self.methods
    }

    /// 方法数
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// 序列化为调试信息流
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = DeltaBuffer::new();
        buf.push_u32(self.methods.len() as u32);
        for info in &self.methods {
            buf.push_u32(info.method.token());
            buf.push_sized(info.document.as_bytes());
            buf.push_u32(info.sequence_points.len() as u32);
            for sp in &info.sequence_points {
                buf.push_u32(sp.il_offset);
                buf.push_u32(sp.line);
                buf.push_u32(sp.column);
            }
            buf.push_u32(info.locals.len() as u32);
            for local in &info.locals {
                buf.push_u32(local.slot);
                buf.push_sized(local.name.as_bytes());
            }
            buf.push_u32(info.scope.start);
            buf.push_u32(info.scope.end);
        }
        buf.into_bytes()
    }
}
