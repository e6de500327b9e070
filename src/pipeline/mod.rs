//! 发射流水线
//!
//! 单线程同步管道：校验 → 匹配 → 槽位分配 → 合成匹配 → 编码
//! → 写出 → 推进基线。每代要么完整成功，要么零产出：
//! 可恢复失败只积累诊断并保持基线原样；输出流写失败立即
//! 中止并指明是哪个流；协作方的意外故障原样向外传播。

use std::sync::Arc;

use tracing::{debug, warn};

use crate::baseline::{Baseline, GenerationChain};
use crate::delta::{DeltaArtifacts, DeltaEncoder, DeltaSink, EncodeError, StreamKind};
use crate::edits::{EditValidator, SemanticEdit};
use crate::matcher::SymbolMatcher;
use crate::slots::{DebugDataError, DebugInfoProvider};
use crate::symbols::SymbolGraph;
use crate::synth::SynthesizedMemberCache;
use crate::util::diagnostic::{codes, Diagnostic, ErrorCollector};

/// 发射配置
#[derive(Debug, Clone)]
pub struct EmitConfig {
    /// 是否产出调试信息流
    pub emit_debug_info: bool,
}

impl Default for EmitConfig {
    fn default() -> Self {
        Self {
            emit_debug_info: true,
        }
    }
}

/// 发射结果
///
/// 失败时 `next_baseline` 就是输入基线，可直接重试。
#[derive(Debug)]
pub struct EmitResult {
    /// 是否成功
    pub success: bool,
    /// 诊断列表
    pub diagnostics: Vec<Diagnostic>,
    /// 增量产物（仅成功时）
    pub delta: Option<DeltaArtifacts>,
    /// 下一代基线（失败时等于输入基线）
    pub next_baseline: Arc<Baseline>,
}

/// 增量发射流水线
#[derive(Debug)]
pub struct DeltaPipeline<'a> {
    old: &'a SymbolGraph,
    new: &'a SymbolGraph,
    baseline: Arc<Baseline>,
    config: EmitConfig,
}

impl<'a> DeltaPipeline<'a> {
    /// 创建流水线
    pub fn new(old: &'a SymbolGraph, new: &'a SymbolGraph, baseline: Arc<Baseline>) -> Self {
        Self {
            old,
            new,
            baseline,
            config: EmitConfig::default(),
        }
    }

    /// 使用自定义配置创建流水线
    pub fn with_config(
        old: &'a SymbolGraph,
        new: &'a SymbolGraph,
        baseline: Arc<Baseline>,
        config: EmitConfig,
    ) -> Self {
        Self {
            old,
            new,
            baseline,
            config,
        }
    }

    /// 发射一代增量
    pub fn emit(
        &self,
        edits: &[SemanticEdit],
        provider: &dyn DebugInfoProvider,
        sink: &mut dyn DeltaSink,
    ) -> EmitResult {
        let generation = self.baseline.generation + 1;
        debug!(generation, edits = edits.len(), "emit pipeline started");

        let matcher = SymbolMatcher::new(self.old, self.new, &self.baseline);
        let mut collector = ErrorCollector::new();

        // 校验
        let validator = EditValidator::new(self.old, self.new, &self.baseline, &matcher);
        validator.validate(edits, &mut collector);
        if collector.has_errors() {
            warn!(
                generation,
                errors = collector.error_count(),
                "edit batch rejected"
            );
            return self.failed(collector);
        }

        // 编码（匹配、槽位分配、合成匹配都在这一步内发生）
        let cache = SynthesizedMemberCache::new(&self.baseline);
        let encoder = DeltaEncoder::new(self.old, self.new, &self.baseline, &matcher);
        let output = match encoder.encode(edits, cache, provider) {
            Ok(output) => output,
            Err(EncodeError::DebugData(DebugDataError::Malformed { method, detail })) => {
                collector.push(codes::MALFORMED_DEBUG_DATA.build(&[&method, &detail]));
                return self.failed(collector);
            }
        };

        let mut heaps = output.heaps;
        let artifacts = DeltaArtifacts {
            tables: output.tables,
            edit_log: output.edit_log,
            edit_map: output.edit_map,
            bodies: output.bodies,
            debug_info: output.debug_info,
        };

        // 三个独立字节流；首个写失败立即中止，基线不动
        let metadata = artifacts.metadata_bytes(&mut heaps);
        if let Err(err) = sink.write(StreamKind::Metadata, &metadata) {
            collector.push(
                codes::STREAM_WRITE_FAILED
                    .build(&[&StreamKind::Metadata.to_string(), &err.to_string()]),
            );
            return self.failed(collector);
        }
        let code = artifacts.bodies.serialize();
        if let Err(err) = sink.write(StreamKind::Code, &code) {
            collector.push(
                codes::STREAM_WRITE_FAILED
                    .build(&[&StreamKind::Code.to_string(), &err.to_string()]),
            );
            return self.failed(collector);
        }
        if self.config.emit_debug_info {
            let debug_bytes = artifacts.debug_info.serialize();
            if let Err(err) = sink.write(StreamKind::DebugInfo, &debug_bytes) {
                collector.push(
                    codes::STREAM_WRITE_FAILED
                        .build(&[&StreamKind::DebugInfo.to_string(), &err.to_string()]),
                );
                return self.failed(collector);
            }
        }

        // 只有完整成功才推进基线
        let next = GenerationChain::advance(&self.baseline, &output.summary);
        debug!(generation, "emit pipeline succeeded");
        EmitResult {
            success: true,
            diagnostics: collector.into_diagnostics(),
            delta: Some(artifacts),
            next_baseline: Arc::new(next),
        }
    }

    fn failed(&self, collector: ErrorCollector) -> EmitResult {
        EmitResult {
            success: false,
            diagnostics: collector.into_diagnostics(),
            delta: None,
            next_baseline: Arc::clone(&self.baseline),
        }
    }
}

/// 便捷入口：一次发射
///
/// ```no_run
/// use std::sync::Arc;
/// use xinhuo::baseline::GenerationChain;
/// use xinhuo::delta::MemorySink;
/// use xinhuo::slots::NullDebugInfoProvider;
/// use xinhuo::symbols::SymbolGraphBuilder;
///
/// let old = SymbolGraphBuilder::new().finish();
/// let new = SymbolGraphBuilder::new().finish();
/// let baseline =
///     Arc::new(GenerationChain::create_initial(&old, &NullDebugInfoProvider).unwrap());
/// let mut sink = MemorySink::new();
/// let result =
///     xinhuo::emit_difference(&old, &new, baseline, &[], &NullDebugInfoProvider, &mut sink);
/// assert!(result.success);
/// ```
pub fn emit_difference(
    old: &SymbolGraph,
    new: &SymbolGraph,
    baseline: Arc<Baseline>,
    edits: &[SemanticEdit],
    provider: &dyn DebugInfoProvider,
    sink: &mut dyn DeltaSink,
) -> EmitResult {
    DeltaPipeline::new(old, new, baseline).emit(edits, provider, sink)
}
