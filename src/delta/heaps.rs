//! 名字/二进制堆
//!
//! 每一代的堆都从保留的 0 号空条目开始；行里的堆下标 0
//! 永远表示"无"。同一代内相同内容只存一份。

use std::collections::HashMap;

use super::buffer::DeltaBuffer;

/// 堆构造器（字符串堆 + blob 堆）
#[derive(Debug)]
pub struct HeapBuilder {
    strings: Vec<String>,
    string_index: HashMap<String, u32>,
    blobs: Vec<Vec<u8>>,
    blob_index: HashMap<Vec<u8>, u32>,
}

impl HeapBuilder {
    /// 创建堆，0 号条目保留为空
    pub fn new() -> Self {
        let mut builder = Self {
            strings: Vec::new(),
            string_index: HashMap::new(),
            blobs: Vec::new(),
            blob_index: HashMap::new(),
        };
        builder.strings.push(String::new());
        builder.string_index.insert(String::new(), 0);
        builder.blobs.push(Vec::new());
        builder.blob_index.insert(Vec::new(), 0);
        builder
    }

    /// 驻留字符串，返回堆下标
    pub fn string(&mut self, value: &str) -> u32 {
        if let Some(&index) = self.string_index.get(value) {
            return index;
        }
        let index = self.strings.len() as u32;
        self.strings.push(value.to_string());
        self.string_index.insert(value.to_string(), index);
        index
    }

    /// 驻留 blob，返回堆下标
    pub fn blob(&mut self, value: &[u8]) -> u32 {
        if let Some(&index) = self.blob_index.get(value) {
            return index;
        }
        let index = self.blobs.len() as u32;
        self.blobs.push(value.to_vec());
        self.blob_index.insert(value.to_vec(), index);
        index
    }

    /// 字符串条目数（含保留条目）
    pub fn string_count(&self) -> usize {
        self.strings.len()
    }

    /// blob 条目数（含保留条目）
    pub fn blob_count(&self) -> usize {
        self.blobs.len()
    }

    /// 序列化两个堆
    pub fn serialize(&self, buf: &mut DeltaBuffer) {
        buf.push_u32(self.strings.len() as u32);
        for s in &self.strings {
            buf.push_sized(s.as_bytes());
        }
        buf.push_u32(self.blobs.len() as u32);
        for b in &self.blobs {
            buf.push_sized(b);
        }
    }
}

impl Default for HeapBuilder {
    fn default() -> Self {
        Self::new()
    }
}
