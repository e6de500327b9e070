//! 符号层
//!
//! 增量引擎面向的"已解析符号图"抽象：稳定身份、结构化签名、
//! arena 式快照与能力接口。前端只要能把快照灌进
//! [`SymbolGraphBuilder`]，匹配器就能在两个快照之间工作。

pub mod build;
pub mod graph;
pub mod identity;
pub mod signature;

pub use build::SymbolGraphBuilder;
pub use graph::{
    AnonymousShape, BodyDescriptor, ClosureUse, DelegateCacheUse, EventSymbol, FieldSymbol,
    GenericParamDecl, HelperKind, LocalDecl, MethodSymbol, PropertySymbol, SequencePoint,
    SymbolGraph, SymbolRef, SymbolView, SyntaxNodeId, TypeSymbol, UnitData,
};
pub use identity::{AssemblyIdentity, MethodIdentity, SymbolIdentity, SymbolKind, UnitId};
pub use signature::{PrimitiveType, StructuralSignature, TypeRef, Visibility};
