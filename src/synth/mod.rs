//! 合成成员缓存
//!
//! 编译器生成的辅助构造——匿名记录类型、闭包捕获容器、
//! 调用点委托缓存字段——要跨代匹配：结构相同的直接复用
//! 上一代的句柄，绝不重复发射类型行。旧容器可能还有存活
//! 实例，所以结构不匹配时总是合成新的带后缀容器，
//! 从不改写旧的。

use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::debug;

use crate::baseline::{Baseline, ClosureKey, DelegateCacheKey, Handle};
use crate::symbols::{AnonymousShape, HelperKind, MethodIdentity};

/// 合成容器名
///
/// 序号跨代单调递增；第 0 代之后带 `#代号` 后缀，
/// 与老代存活实例的名字永不混淆。
pub fn synthesized_name(prefix: &str, ordinal: u32, generation: u32) -> String {
    if generation == 0 {
        format!("{}{}", prefix, ordinal)
    } else {
        format!("{}{}#{}", prefix, ordinal, generation)
    }
}

/// 缓存查询结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthMember {
    /// 上一代已有：按引用复用句柄，零新行
    Existing(Handle),
    /// 本代第一次出现：发射恰好一个新容器
    Fresh {
        /// 分到的唯一容器名
        name: String,
    },
}

impl SynthMember {
    /// 是否复用已有容器
    pub fn is_existing(&self) -> bool {
        matches!(self, SynthMember::Existing(_))
    }
}

/// 缓存统计信息
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// 跨代复用次数
    pub hits: usize,
    /// 新合成次数
    pub misses: usize,
}

/// 本代新合成的容器清单（按请求顺序）
#[derive(Debug, Default)]
pub struct PendingSynthesized {
    /// 新匿名形状容器
    pub shapes: Vec<(AnonymousShape, String)>,
    /// 新闭包容器
    pub closures: Vec<(ClosureKey, String)>,
    /// 新委托缓存字段
    pub delegates: Vec<(DelegateCacheKey, String)>,
    /// 新辅助例程
    pub helpers: Vec<(HelperKind, String)>,
    /// 更新后的序号水位
    pub next_ordinal: u32,
}

#[derive(Debug, Default)]
struct SessionState {
    next_ordinal: u32,
    shapes: IndexMap<AnonymousShape, String>,
    closures: IndexMap<ClosureKey, String>,
    delegates: IndexMap<DelegateCacheKey, String>,
    helpers: IndexMap<HelperKind, String>,
    hits: usize,
    misses: usize,
}

/// 合成成员缓存
///
/// 一个实例服务一代的发射；会话内部状态在锁后面，
/// 匹配分析可以并发探询。
#[derive(Debug)]
pub struct SynthesizedMemberCache<'a> {
    baseline: &'a Baseline,
    /// 正在发射的代
    generation: u32,
    state: RwLock<SessionState>,
}

impl<'a> SynthesizedMemberCache<'a> {
    /// 为下一代创建缓存
    pub fn new(baseline: &'a Baseline) -> Self {
        let state = SessionState {
            next_ordinal: baseline.next_synth_ordinal,
            ..Default::default()
        };
        Self {
            baseline,
            generation: baseline.generation + 1,
            state: RwLock::new(state),
        }
    }

    /// 匿名记录形状 → 容器
    ///
    /// 形状（有序字段元组，名字区分大小写）相同即同一类型，
    /// 即使外层声明在语法上完全不同。
    pub fn anonymous_type(&self, shape: &AnonymousShape) -> SynthMember {
        if let Some(handle) = self.baseline.anonymous_shapes.get(shape) {
            self.state.write().hits += 1;
            return SynthMember::Existing(*handle);
        }
        let mut state = self.state.write();
        if let Some(name) = state.shapes.get(shape) {
            // 本代内已分配，同一形状只合成一次
            return SynthMember::Fresh { name: name.clone() };
        }
        state.misses += 1;
        let name = self.fresh_name("@Anon", &mut state);
        state.shapes.insert(shape.clone(), name.clone());
        debug!(shape = %shape, name = %name, "fresh anonymous container");
        SynthMember::Fresh { name }
    }

    /// 闭包捕获容器
    ///
    /// 按 (外层方法身份, 捕获变量集) 匹配；不匹配就合成新容器，
    /// 旧容器留给仍存活的实例。
    pub fn closure_container(
        &self,
        method: &MethodIdentity,
        captured: &std::collections::BTreeSet<String>,
    ) -> SynthMember {
        let key = ClosureKey {
            method: method.clone(),
            captured: captured.clone(),
        };
        if let Some(handle) = self.baseline.closure_containers.get(&key) {
            self.state.write().hits += 1;
            return SynthMember::Existing(*handle);
        }
        let mut state = self.state.write();
        if let Some(name) = state.closures.get(&key) {
            return SynthMember::Fresh { name: name.clone() };
        }
        state.misses += 1;
        let name = self.fresh_name("@Closure", &mut state);
        state.closures.insert(key, name.clone());
        SynthMember::Fresh { name }
    }

    /// 调用点委托缓存字段
    pub fn delegate_cache(&self, method: &MethodIdentity, target: &str) -> SynthMember {
        let key = DelegateCacheKey {
            method: method.clone(),
            target: target.to_string(),
        };
        if let Some(handle) = self.baseline.delegate_caches.get(&key) {
            self.state.write().hits += 1;
            return SynthMember::Existing(*handle);
        }
        let mut state = self.state.write();
        if let Some(name) = state.delegates.get(&key) {
            return SynthMember::Fresh { name: name.clone() };
        }
        state.misses += 1;
        let name = self.fresh_name("@Cache", &mut state);
        state.delegates.insert(key, name.clone());
        SynthMember::Fresh { name }
    }

    /// 按需辅助例程
    ///
    /// 基线里已有的辅助直接复用；编辑后的方法体不再需要某个
    /// 辅助时，调用方不调用本方法，它就不会进增量。
    pub fn require_helper(&self, kind: HelperKind) -> SynthMember {
        if let Some(handle) = self.baseline.helper_methods.get(&kind) {
            self.state.write().hits += 1;
            return SynthMember::Existing(*handle);
        }
        let mut state = self.state.write();
        if let Some(name) = state.helpers.get(&kind) {
            return SynthMember::Fresh { name: name.clone() };
        }
        state.misses += 1;
        let name = self.fresh_name("@Helper", &mut state);
        state.helpers.insert(kind, name.clone());
        SynthMember::Fresh { name }
    }

    /// 统计快照
    pub fn stats(&self) -> CacheStats {
        let state = self.state.read();
        CacheStats {
            hits: state.hits,
            misses: state.misses,
        }
    }

    /// 取出本代新合成的容器清单，消费缓存
    pub fn into_pending(self) -> PendingSynthesized {
        let state = self.state.into_inner();
        PendingSynthesized {
            shapes: state.shapes.into_iter().collect(),
            closures: state.closures.into_iter().collect(),
            delegates: state.delegates.into_iter().collect(),
            helpers: state.helpers.into_iter().collect(),
            next_ordinal: state.next_ordinal,
        }
    }

    /// 分配一个与历代存活名都不冲突的新名
    fn fresh_name(&self, prefix: &str, state: &mut SessionState) -> String {
        loop {
            let name = synthesized_name(prefix, state.next_ordinal, self.generation);
            state.next_ordinal += 1;
            if !self.baseline.synthesized_names.contains(&name) {
                return name;
            }
        }
    }
}
