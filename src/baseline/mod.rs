//! 基线存储与代链
//!
//! 基线是一代结束时的不可变快照；代链负责建立第 0 代
//! 并在每次成功发射后派生下一代。

pub mod chain;
pub mod store;

pub use chain::{BaselineError, BaselineResult, GenerationChain, GenerationSummary};
pub use store::{
    Baseline, ClosureKey, DelegateCacheKey, Handle, ReferenceKey, RowCounts, TableKind,
};
