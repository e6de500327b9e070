//! 集成测试公共构件
//!
//! 搭建小型程序快照的辅助函数。

#![allow(dead_code)]

use std::sync::Arc;

use xinhuo::baseline::{Baseline, GenerationChain};
use xinhuo::slots::NullDebugInfoProvider;
use xinhuo::symbols::{
    PrimitiveType, SymbolGraph, SymbolKind, SymbolRef, TypeRef,
};

pub fn void() -> TypeRef {
    TypeRef::Primitive(PrimitiveType::Void)
}

pub fn int() -> TypeRef {
    TypeRef::Primitive(PrimitiveType::Int32)
}

pub fn text() -> TypeRef {
    TypeRef::Primitive(PrimitiveType::String)
}

pub fn object() -> TypeRef {
    TypeRef::Primitive(PrimitiveType::Object)
}

/// 按限定名找方法符号
pub fn find_method(graph: &SymbolGraph, qualified_name: &str) -> SymbolRef {
    graph
        .iter()
        .find(|&s| {
            let data = graph.symbol(s);
            data.identity.kind == SymbolKind::Method
                && data.identity.qualified_name == qualified_name
        })
        .unwrap_or_else(|| panic!("method {} not found", qualified_name))
}

/// 按限定名找类型符号
pub fn find_type(graph: &SymbolGraph, qualified_name: &str) -> SymbolRef {
    graph
        .find_type_by_name(qualified_name)
        .unwrap_or_else(|| panic!("type {} not found", qualified_name))
}

/// 首次完整编译的基线
pub fn initial_baseline(graph: &SymbolGraph) -> Arc<Baseline> {
    Arc::new(GenerationChain::create_initial(graph, &NullDebugInfoProvider).expect("initial"))
}
