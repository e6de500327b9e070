//! XinHuo Incremental Recompilation Engine
//!
//! 增量（edit-and-continue）重编译引擎：给定上一代快照的基线、
//! 修订后的符号图和一组符号级编辑，产出可以热应用到运行中
//! 程序的最小二进制增量——变动的模块表行、方法体和调试信息。
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use xinhuo::baseline::GenerationChain;
//! use xinhuo::delta::MemorySink;
//! use xinhuo::edits::SemanticEdit;
//! use xinhuo::slots::NullDebugInfoProvider;
//! use xinhuo::symbols::SymbolGraphBuilder;
//!
//! # fn main() -> xinhuo::Result<()> {
//! let old = SymbolGraphBuilder::new().finish();
//! let new = SymbolGraphBuilder::new().finish();
//! let baseline =
//!     Arc::new(GenerationChain::create_initial(&old, &NullDebugInfoProvider)?);
//! let edits: Vec<SemanticEdit> = Vec::new();
//! let mut sink = MemorySink::new();
//! let result =
//!     xinhuo::emit_difference(&old, &new, baseline, &edits, &NullDebugInfoProvider, &mut sink);
//! assert!(result.success);
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/xinhuo")]
#![warn(rust_2018_idioms)]
#![allow(dead_code)]

// Public modules
pub mod baseline;
pub mod delta;
pub mod edits;
pub mod matcher;
pub mod pipeline;
pub mod slots;
pub mod symbols;
pub mod synth;

// Utility modules
pub mod util;

// Re-exports
pub use anyhow::{Context, Result};
pub use thiserror::Error;

pub use pipeline::{emit_difference, DeltaPipeline, EmitConfig, EmitResult};

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name
pub const NAME: &str = "XinHuo (薪火)";
