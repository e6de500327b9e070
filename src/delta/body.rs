//! 方法体增量
//!
//! 每个插入/更新的方法一条编码方法体，以表句柄为键。
//! 被删除的方法不回收行，体换成缺失成员陷阱。

use crate::baseline::Handle;

use super::buffer::DeltaBuffer;

/// 缺失成员陷阱体
///
/// 固定的指令序列：抛出"成员已删除"。
pub const MISSING_MEMBER_BODY: [u8; 4] = [0xfe, 0x7f, 0x00, 0x00];

/// 一条编码方法体
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBody {
    /// 方法句柄
    pub method: Handle,
    /// 局部变量签名行（无局部变量时为 None）
    pub local_sig: Option<Handle>,
    /// 编码后的指令流
    pub code: Vec<u8>,
}

/// 方法体增量
#[derive(Debug, Default)]
pub struct MethodBodyDelta {
    bodies: Vec<EncodedBody>,
}

impl MethodBodyDelta {
    /// 创建空增量
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一条方法体
    pub fn push(&mut self, body: EncodedBody) {
        self.bodies.push(body);
    }

    /// 全部方法体
    pub fn bodies(&self) -> &[EncodedBody] {
        &self.bodies
    }

    /// 方法体条数
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// 序列化为方法体流
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = DeltaBuffer::new();
        buf.push_u32(self.bodies.len() as u32);
        for body in &self.bodies {
            buf.push_u32(body.method.token());
            buf.push_u32(body.local_sig.map(Handle::token).unwrap_or(0));
            buf.push_sized(&body.code);
        }
        buf.into_bytes()
    }
}
