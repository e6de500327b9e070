//! 代链管理
//!
//! `create_initial` 把首次完整编译的快照落成第 0 代基线；
//! `advance` 在整条流水线成功后、用当代新增内容派生下一代。
//! `advance` 从不修改输入——失败的一代对基线零影响，可直接重试。

use indexmap::IndexMap;
use thiserror::Error;
use tracing::debug;

use crate::slots::{DebugDataError, DebugInfoProvider, LocalSlotDescriptor};
use crate::symbols::{
    AnonymousShape, HelperKind, MethodIdentity, SymbolGraph, SymbolKind, SymbolRef,
};
use crate::synth::synthesized_name;

use super::store::{
    Baseline, ClosureKey, DelegateCacheKey, Handle, ReferenceKey, TableKind,
};

/// 基线派生错误
#[derive(Debug, Error)]
pub enum BaselineError {
    /// 调试信息提供方返回了损坏数据
    #[error(transparent)]
    MalformedDebugData(#[from] DebugDataError),
}

/// 基线派生结果
pub type BaselineResult<T> = Result<T, BaselineError>;

/// 当代新增内容汇总
///
/// 编码器在产出增量的同时填好这份汇总；只有整条流水线成功时
/// 它才会被 `advance` 合并进下一代基线。
#[derive(Debug, Default)]
pub struct GenerationSummary {
    /// 每表新增行数
    pub added_rows: IndexMap<TableKind, u32>,
    /// 新定义符号领到的句柄
    pub new_symbols: Vec<(crate::symbols::SymbolIdentity, Handle)>,
    /// 新引用行
    pub new_references: Vec<(ReferenceKey, Handle)>,
    /// 新匿名形状容器
    pub new_shapes: Vec<(AnonymousShape, Handle)>,
    /// 新闭包容器
    pub new_closures: Vec<(ClosureKey, Handle)>,
    /// 新委托缓存字段
    pub new_delegate_caches: Vec<(DelegateCacheKey, Handle)>,
    /// 新辅助例程
    pub new_helpers: Vec<(HelperKind, Handle)>,
    /// 新合成名
    pub new_names: Vec<String>,
    /// 更新后的合成序号水位
    pub next_synth_ordinal: u32,
    /// 本代触及方法的新布局
    pub new_layouts: Vec<(MethodIdentity, Vec<LocalSlotDescriptor>)>,
}

/// 代链管理器
#[derive(Debug, Default)]
pub struct GenerationChain;

impl GenerationChain {
    /// 从首次完整编译建立第 0 代基线
    ///
    /// 按声明顺序给每个定义分配句柄；方法的初始槽位布局优先取
    /// 调试信息提供方的数据，缺失时从方法体声明推导。
    pub fn create_initial(
        graph: &SymbolGraph,
        provider: &dyn DebugInfoProvider,
    ) -> BaselineResult<Baseline> {
        let mut baseline = Baseline::empty();

        for unit in graph.units() {
            baseline.row_counts.add(TableKind::Module, 1);
            for reference in &unit.references {
                let row = baseline.row_counts.add(TableKind::AssemblyRef, 1);
                baseline.reference_to_handle.insert(
                    ReferenceKey::Assembly(reference.clone()),
                    Handle::new(TableKind::AssemblyRef, row),
                );
            }
        }

        for sym in graph.iter() {
            Self::assign_definition(graph, sym, &mut baseline, provider)?;
        }

        debug!(
            symbols = baseline.symbol_to_handle.len(),
            "initial baseline created"
        );
        Ok(baseline)
    }

    /// 派生下一代基线
    ///
    /// 扩展行数、合并新句柄与合成注册表、替换触及方法的布局。
    /// 输入基线保持原样。
    pub fn advance(baseline: &Baseline, summary: &GenerationSummary) -> Baseline {
        let mut next = baseline.clone();
        next.generation = baseline.generation + 1;
        next.row_counts.merge(&summary.added_rows);

        for (identity, handle) in &summary.new_symbols {
            debug_assert!(
                !next.symbol_to_handle.contains_key(identity),
                "handle reassigned for {}",
                identity
            );
            next.symbol_to_handle.insert(identity.clone(), *handle);
        }
        for (key, handle) in &summary.new_references {
            next.reference_to_handle.insert(key.clone(), *handle);
        }
        for (shape, handle) in &summary.new_shapes {
            next.anonymous_shapes.insert(shape.clone(), *handle);
        }
        for (key, handle) in &summary.new_closures {
            next.closure_containers.insert(key.clone(), *handle);
        }
        for (key, handle) in &summary.new_delegate_caches {
            next.delegate_caches.insert(key.clone(), *handle);
        }
        for (kind, handle) in &summary.new_helpers {
            next.helper_methods.insert(*kind, *handle);
        }
        for name in &summary.new_names {
            next.synthesized_names.insert(name.clone());
        }
        if summary.next_synth_ordinal > next.next_synth_ordinal {
            next.next_synth_ordinal = summary.next_synth_ordinal;
        }
        for (method, layout) in &summary.new_layouts {
            next.local_layouts.insert(method.clone(), layout.clone());
        }

        debug!(generation = next.generation, "baseline advanced");
        next
    }

    fn assign_definition(
        graph: &SymbolGraph,
        sym: SymbolRef,
        baseline: &mut Baseline,
        provider: &dyn DebugInfoProvider,
    ) -> BaselineResult<()> {
        let data = graph.symbol(sym);
        let identity = &data.identity;

        let handle = match identity.kind {
            SymbolKind::Type => {
                let row = baseline.row_counts.add(TableKind::TypeDef, 1);
                if data.container.is_some() {
                    baseline.row_counts.add(TableKind::NestedClass, 1);
                }
                Handle::new(TableKind::TypeDef, row)
            }
            SymbolKind::Method => {
                let row = baseline.row_counts.add(TableKind::MethodDef, 1);
                baseline
                    .row_counts
                    .add(TableKind::Param, data.signature.params.len() as u32);
                Handle::new(TableKind::MethodDef, row)
            }
            SymbolKind::Field => {
                let row = baseline.row_counts.add(TableKind::Field, 1);
                Handle::new(TableKind::Field, row)
            }
            SymbolKind::Property => {
                // 类型的第一个属性带出 PropertyMap 行
                if Self::is_first_member_of_kind(graph, sym, SymbolKind::Property) {
                    baseline.row_counts.add(TableKind::PropertyMap, 1);
                }
                let row = baseline.row_counts.add(TableKind::Property, 1);
                Handle::new(TableKind::Property, row)
            }
            SymbolKind::Event => {
                if Self::is_first_member_of_kind(graph, sym, SymbolKind::Event) {
                    baseline.row_counts.add(TableKind::EventMap, 1);
                }
                let row = baseline.row_counts.add(TableKind::Event, 1);
                Handle::new(TableKind::Event, row)
            }
        };
        if !data.generic_params.is_empty() {
            baseline
                .row_counts
                .add(TableKind::GenericParam, data.generic_params.len() as u32);
            let constraints: u32 = data
                .generic_params
                .iter()
                .map(|p| p.constraints.len() as u32)
                .sum();
            if constraints > 0 {
                baseline
                    .row_counts
                    .add(TableKind::GenericParamConstraint, constraints);
            }
        }
        baseline.symbol_to_handle.insert(identity.clone(), handle);

        if identity.kind == SymbolKind::Method {
            if let Some(body) = &data.body {
                let method = MethodIdentity::new(identity.clone());
                let layout = match provider.local_slots(&method)? {
                    Some(layout) => layout,
                    None => derive_initial_layout(body),
                };
                baseline.local_layouts.insert(method.clone(), layout);
                Self::register_initial_synthesized(body, &method, baseline);
            }
        }
        Ok(())
    }

    /// 该符号是否是容器里第一个此类成员
    fn is_first_member_of_kind(graph: &SymbolGraph, sym: SymbolRef, kind: SymbolKind) -> bool {
        let container = match graph.symbol(sym).container {
            Some(c) => c,
            None => return true,
        };
        graph
            .symbol(container)
            .members
            .iter()
            .copied()
            .find(|&m| graph.symbol(m).identity.kind == kind)
            == Some(sym)
    }

    /// 初始编译里出现的合成构造也要进注册表，
    /// 后续各代才有可复用的对象。
    fn register_initial_synthesized(
        body: &crate::symbols::BodyDescriptor,
        method: &MethodIdentity,
        baseline: &mut Baseline,
    ) {
        for shape in &body.anonymous_shapes {
            if baseline.anonymous_shapes.contains_key(shape) {
                continue;
            }
            let row = baseline.row_counts.add(TableKind::TypeDef, 1);
            let name = synthesized_name("@Anon", baseline.next_synth_ordinal, 0);
            baseline.next_synth_ordinal += 1;
            baseline.synthesized_names.insert(name);
            baseline
                .anonymous_shapes
                .insert(shape.clone(), Handle::new(TableKind::TypeDef, row));
        }
        for closure in &body.closures {
            let key = ClosureKey {
                method: method.clone(),
                captured: closure.captured.clone(),
            };
            if baseline.closure_containers.contains_key(&key) {
                continue;
            }
            let row = baseline.row_counts.add(TableKind::TypeDef, 1);
            let name = synthesized_name("@Closure", baseline.next_synth_ordinal, 0);
            baseline.next_synth_ordinal += 1;
            baseline.synthesized_names.insert(name);
            baseline
                .closure_containers
                .insert(key, Handle::new(TableKind::TypeDef, row));
        }
        for cache in &body.delegate_caches {
            let key = DelegateCacheKey {
                method: method.clone(),
                target: cache.target.clone(),
            };
            if baseline.delegate_caches.contains_key(&key) {
                continue;
            }
            let row = baseline.row_counts.add(TableKind::Field, 1);
            let name = synthesized_name("@Cache", baseline.next_synth_ordinal, 0);
            baseline.next_synth_ordinal += 1;
            baseline.synthesized_names.insert(name);
            baseline
                .delegate_caches
                .insert(key, Handle::new(TableKind::Field, row));
        }
        for helper in &body.helpers {
            if baseline.helper_methods.contains_key(helper) {
                continue;
            }
            let row = baseline.row_counts.add(TableKind::MethodDef, 1);
            let name = synthesized_name("@Helper", baseline.next_synth_ordinal, 0);
            baseline.next_synth_ordinal += 1;
            baseline.synthesized_names.insert(name);
            baseline
                .helper_methods
                .insert(*helper, Handle::new(TableKind::MethodDef, row));
        }
    }
}

/// 从方法体声明推导初始槽位布局
fn derive_initial_layout(body: &crate::symbols::BodyDescriptor) -> Vec<LocalSlotDescriptor> {
    let mut layout = Vec::with_capacity(body.locals.len() + body.temporaries as usize);
    let mut next = 0u32;
    for decl in &body.locals {
        layout.push(LocalSlotDescriptor::named(next, decl.ty.clone(), decl.syntax));
        next += 1;
    }
    for _ in 0..body.temporaries {
        layout.push(LocalSlotDescriptor::temporary(
            next,
            crate::symbols::TypeRef::Primitive(crate::symbols::PrimitiveType::Object),
        ));
        next += 1;
    }
    layout
}
