//! 增量编码器
//!
//! 按固定结构顺序发射本代触及的全部表行：父结构行（类型）
//! 先于其包含的行（字段/方法/属性/事件），再先于扩展行
//! （参数、泛型形参、约束）。同时产出编辑日志（发射顺序）、
//! 编辑映射（按表分组）、方法体流与调试信息流，以及推进
//! 基线所需的汇总。

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use thiserror::Error;
use tracing::debug;

use crate::baseline::{Baseline, GenerationSummary, Handle, ReferenceKey, RowCounts, TableKind};
use crate::edits::{SemanticEdit, SemanticEditKind};
use crate::matcher::SymbolMatcher;
use crate::slots::{
    allocator::SyntaxMapFn, DebugDataError, DebugInfoProvider, LocalSlotAllocator,
    LocalSlotDescriptor, SlotAllocation, SlotOrigin,
};
use crate::symbols::{
    graph::short_name_of, AssemblyIdentity, BodyDescriptor, HelperKind, MethodIdentity,
    StructuralSignature, SymbolGraph, SymbolKind, SymbolRef, SyntaxNodeId, TypeRef, UnitId,
    Visibility,
};
use crate::synth::{PendingSynthesized, SynthesizedMemberCache};

use super::body::{EncodedBody, MethodBodyDelta, MISSING_MEMBER_BODY};
use super::buffer::DeltaBuffer;
use super::debug::{DebugInfoDelta, LocalVariableInfo, MethodDebugInfo, ScopeRange};
use super::edit_log::{EditLog, EditMap, EditOperation};
use super::heaps::HeapBuilder;
use super::tables::{DeltaTables, TableRow};

/// 编码错误
#[derive(Debug, Error)]
pub enum EncodeError {
    /// 上一代调试数据损坏
    #[error(transparent)]
    DebugData(#[from] DebugDataError),
}

/// 编码产物
#[derive(Debug)]
pub struct EncodeOutput {
    /// 增量行集
    pub tables: DeltaTables,
    /// 编辑日志
    pub edit_log: EditLog,
    /// 编辑映射
    pub edit_map: EditMap,
    /// 方法体增量
    pub bodies: MethodBodyDelta,
    /// 调试信息增量
    pub debug_info: DebugInfoDelta,
    /// 名字/二进制堆
    pub heaps: HeapBuilder,
    /// 推进基线用的汇总
    pub summary: GenerationSummary,
}

/// 增量编码器
///
/// 一个实例服务一代；`encode` 消费它。
pub struct DeltaEncoder<'a> {
    old: &'a SymbolGraph,
    new: &'a SymbolGraph,
    baseline: &'a Baseline,
    matcher: &'a SymbolMatcher<'a>,
    /// 行号游标（基线行数 + 本代已分配）
    counts: RowCounts,
    added: IndexMap<TableKind, u32>,
    tables: DeltaTables,
    log: EditLog,
    touched: Vec<Handle>,
    bodies: MethodBodyDelta,
    debug_info: DebugInfoDelta,
    heaps: HeapBuilder,
    /// 本代插入的定义 → 新句柄
    new_handles: HashMap<SymbolRef, Handle>,
    /// 本代已补发 map 行的 (类型, 表) 组合
    maps_emitted: HashSet<(Handle, TableKind)>,
    summary: GenerationSummary,
    allocator: LocalSlotAllocator,
}

impl std::fmt::Debug for DeltaEncoder<'_> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("DeltaEncoder")
            .field("generation", &(self.baseline.generation + 1))
            .field("rows", &self.tables.total_rows())
            .finish()
    }
}

impl<'a> DeltaEncoder<'a> {
    /// 创建编码器
    pub fn new(
        old: &'a SymbolGraph,
        new: &'a SymbolGraph,
        baseline: &'a Baseline,
        matcher: &'a SymbolMatcher<'a>,
    ) -> Self {
        Self {
            old,
            new,
            baseline,
            matcher,
            counts: baseline.row_counts.clone(),
            added: IndexMap::new(),
            tables: DeltaTables::new(),
            log: EditLog::new(),
            touched: Vec::new(),
            bodies: MethodBodyDelta::new(),
            debug_info: DebugInfoDelta::new(),
            heaps: HeapBuilder::new(),
            new_handles: HashMap::new(),
            maps_emitted: HashSet::new(),
            summary: GenerationSummary::default(),
            allocator: LocalSlotAllocator::new(),
        }
    }

    /// 编码一个已通过校验的编辑批次
    pub fn encode(
        mut self,
        edits: &[SemanticEdit],
        cache: SynthesizedMemberCache<'_>,
        provider: &dyn DebugInfoProvider,
    ) -> Result<EncodeOutput, EncodeError> {
        // 分类
        let mut inserted: Vec<SymbolRef> = Vec::new();
        let mut updates: Vec<&SemanticEdit> = Vec::new();
        let mut deletes: Vec<SymbolRef> = Vec::new();
        for edit in edits {
            match edit.kind {
                SemanticEditKind::Insert | SemanticEditKind::Replace => {
                    inserted.push(edit.new_symbol.expect("validated"));
                }
                SemanticEditKind::Update => updates.push(edit),
                SemanticEditKind::Delete => {
                    deletes.push(edit.old_symbol.expect("validated"));
                }
            }
        }

        // 插入的类型，连同它们声明体内的嵌套类型
        let mut inserted_types: Vec<SymbolRef> = inserted
            .iter()
            .copied()
            .filter(|&s| self.new.symbol(s).identity.kind == SymbolKind::Type)
            .collect();
        let mut queue = inserted_types.clone();
        while let Some(ty) = queue.pop() {
            for &member in &self.new.symbol(ty).members {
                if self.new.symbol(member).identity.kind == SymbolKind::Type {
                    inserted_types.push(member);
                    queue.push(member);
                }
            }
        }
        inserted_types.sort_by_key(|&s| self.new.symbol(s).declaration_order);
        inserted_types.dedup();

        // 插入的成员：显式编辑 + 插入类型自带的成员
        let mut inserted_members: Vec<SymbolRef> = inserted
            .iter()
            .copied()
            .filter(|&s| self.new.symbol(s).identity.kind != SymbolKind::Type)
            .collect();
        for &ty in &inserted_types {
            for &member in &self.new.symbol(ty).members {
                if self.new.symbol(member).identity.kind != SymbolKind::Type {
                    inserted_members.push(member);
                }
            }
        }
        inserted_members.sort_by_key(|&s| self.new.symbol(s).declaration_order);
        inserted_members.dedup();

        // 向缓存申报编辑体需要的合成构造；编辑后不再需要的
        // 辅助不会被申报，也就不会再进增量
        let mut helper_context: HashMap<HelperKind, SymbolRef> = HashMap::new();
        let edited_bodies: Vec<SymbolRef> = inserted_members
            .iter()
            .copied()
            .chain(updates.iter().filter_map(|e| e.new_symbol))
            .collect();
        for sym in &edited_bodies {
            self.demand_synthesized(*sym, &cache, &mut helper_context);
        }

        // 1. 插入的类型：父在前，声明顺序
        for &ty in &inserted_types {
            self.emit_inserted_type(ty);
        }

        // 2. 本代新合成的容器
        let pending = cache.into_pending();
        self.emit_synthesized(&pending, &helper_context);

        // 3. 插入的成员，声明顺序
        for &member in &inserted_members {
            self.emit_inserted_member(member);
        }

        // 4. 更新的方法
        for edit in &updates {
            self.emit_update(edit, provider)?;
        }

        // 5. 删除的方法：行不回收，体换成陷阱
        for old_sym in deletes {
            self.emit_delete(old_sym);
        }

        // 收尾
        self.summary.added_rows = self.added.clone();
        self.summary.next_synth_ordinal = pending.next_ordinal;
        let edit_map = EditMap::build(self.touched.iter().copied());

        debug!(
            rows = self.tables.total_rows(),
            log = self.log.len(),
            map = edit_map.len(),
            bodies = self.bodies.len(),
            "generation encoded"
        );

        Ok(EncodeOutput {
            tables: self.tables,
            edit_log: self.log,
            edit_map,
            bodies: self.bodies,
            debug_info: self.debug_info,
            heaps: self.heaps,
            summary: self.summary,
        })
    }

    /// 分配下一行
    fn alloc(&mut self, kind: TableKind) -> Handle {
        let row = self.counts.add(kind, 1);
        *self.added.entry(kind).or_insert(0) += 1;
        Handle::new(kind, row)
    }

    /// 登记一条行：行集 + Default 日志 + 触及集
    fn put_row(&mut self, handle: Handle, row: TableRow) {
        self.tables.add(handle, row);
        self.log.push(handle, EditOperation::Default);
        self.touched.push(handle);
    }

    /// 申报一个编辑体的合成构造
    fn demand_synthesized(
        &self,
        sym: SymbolRef,
        cache: &SynthesizedMemberCache<'_>,
        helper_context: &mut HashMap<HelperKind, SymbolRef>,
    ) {
        let data = self.new.symbol(sym);
        let body = match &data.body {
            Some(body) => body,
            None => return,
        };
        let method = MethodIdentity::new(data.identity.clone());

        for shape in &body.anonymous_shapes {
            cache.anonymous_type(shape);
        }
        for closure in &body.closures {
            cache.closure_container(&method, &closure.captured);
        }
        for delegate in &body.delegate_caches {
            cache.delegate_cache(&method, &delegate.target);
        }
        for &helper in &body.helpers {
            cache.require_helper(helper);
            if let Some(container) = data.container {
                helper_context.entry(helper).or_insert(container);
            }
        }
    }

    /// 插入的类型：TypeDef 行 + 嵌套关系 + 泛型形参/约束
    fn emit_inserted_type(&mut self, ty: SymbolRef) {
        let data = self.new.symbol(ty).clone();
        let handle = self.alloc(TableKind::TypeDef);
        self.new_handles.insert(ty, handle);
        self.summary
            .new_symbols
            .push((data.identity.clone(), handle));
        self.put_row(
            handle,
            TableRow::TypeDef {
                name: data.identity.qualified_name.clone(),
                visibility: data.visibility,
            },
        );

        if let Some(container) = data.container {
            let enclosing = self.definition_handle(container);
            let nested_handle = self.alloc(TableKind::NestedClass);
            self.put_row(
                nested_handle,
                TableRow::NestedClass {
                    nested: handle,
                    enclosing,
                },
            );
        }
        self.emit_generic_params(handle, ty);
    }

    /// 泛型形参在所属行之后、按序号发射；约束在全部形参之后
    fn emit_generic_params(&mut self, owner: Handle, sym: SymbolRef) {
        let params = self.new.symbol(sym).generic_params.clone();
        let mut param_handles = Vec::with_capacity(params.len());
        for (ordinal, param) in params.iter().enumerate() {
            let handle = self.alloc(TableKind::GenericParam);
            self.put_row(
                handle,
                TableRow::GenericParam {
                    owner,
                    ordinal: ordinal as u16,
                    name: param.name.clone(),
                },
            );
            param_handles.push(handle);
        }
        for (param, &handle) in params.iter().zip(&param_handles) {
            for constraint in &param.constraints {
                let blob = self.type_blob(constraint);
                let row_handle = self.alloc(TableKind::GenericParamConstraint);
                self.put_row(
                    row_handle,
                    TableRow::GenericParamConstraint {
                        owner: handle,
                        constraint_blob: blob,
                    },
                );
            }
        }
    }

    /// 本代新合成的容器：匿名/闭包容器是类型行，
    /// 委托缓存是字段行，辅助例程是方法行
    fn emit_synthesized(
        &mut self,
        pending: &PendingSynthesized,
        helper_context: &HashMap<HelperKind, SymbolRef>,
    ) {
        for (shape, name) in &pending.shapes {
            let handle = self.alloc(TableKind::TypeDef);
            self.put_row(
                handle,
                TableRow::TypeDef {
                    name: name.clone(),
                    visibility: Visibility::Internal,
                },
            );
            self.summary.new_shapes.push((shape.clone(), handle));
            self.summary.new_names.push(name.clone());
        }
        for (key, name) in &pending.closures {
            let handle = self.alloc(TableKind::TypeDef);
            self.put_row(
                handle,
                TableRow::TypeDef {
                    name: name.clone(),
                    visibility: Visibility::Internal,
                },
            );
            self.summary.new_closures.push((key.clone(), handle));
            self.summary.new_names.push(name.clone());
        }
        for (key, name) in &pending.delegates {
            // 缓存字段挂在外层方法的容器类型上
            let parent = self
                .new
                .find(key.method.identity())
                .and_then(|m| self.new.symbol(m).container)
                .map(|c| self.definition_handle(c))
                .unwrap_or_else(|| Handle::new(TableKind::TypeDef, 1));
            let handle = self.alloc(TableKind::Field);
            self.log.push(parent, EditOperation::AddField);
            self.put_row(
                handle,
                TableRow::Field {
                    parent,
                    name: name.clone(),
                },
            );
            self.summary.new_delegate_caches.push((key.clone(), handle));
            self.summary.new_names.push(name.clone());
        }
        for (kind, name) in &pending.helpers {
            let parent = helper_context
                .get(kind)
                .map(|&c| self.definition_handle(c))
                .unwrap_or_else(|| Handle::new(TableKind::TypeDef, 1));
            let handle = self.alloc(TableKind::MethodDef);
            self.log.push(parent, EditOperation::AddMethod);
            self.put_row(
                handle,
                TableRow::MethodDef {
                    parent,
                    name: name.clone(),
                },
            );
            self.summary.new_helpers.push((*kind, handle));
            self.summary.new_names.push(name.clone());
        }
    }

    /// 插入的成员：父 Add* 日志行先行，再是成员行本身
    fn emit_inserted_member(&mut self, member: SymbolRef) {
        let data = self.new.symbol(member).clone();
        let parent = self.definition_handle(data.container.expect("members have containers"));
        let short = short_name_of(&data.identity.qualified_name).to_string();

        // 类型首次获得属性/事件时先补发 map 行
        match data.identity.kind {
            SymbolKind::Property => {
                self.ensure_map_row(parent, data.container, TableKind::PropertyMap)
            }
            SymbolKind::Event => self.ensure_map_row(parent, data.container, TableKind::EventMap),
            _ => {}
        }

        // 体内首次提到的外部符号先领引用行
        if let Some(body) = &data.body {
            self.emit_references(data.identity.unit, body);
        }

        let (kind, add_op, row) = match data.identity.kind {
            SymbolKind::Field => (
                TableKind::Field,
                EditOperation::AddField,
                TableRow::Field {
                    parent,
                    name: short,
                },
            ),
            SymbolKind::Method => (
                TableKind::MethodDef,
                EditOperation::AddMethod,
                TableRow::MethodDef {
                    parent,
                    name: short,
                },
            ),
            SymbolKind::Property => (
                TableKind::Property,
                EditOperation::AddProperty,
                TableRow::Property {
                    parent,
                    name: short,
                },
            ),
            SymbolKind::Event => (
                TableKind::Event,
                EditOperation::AddEvent,
                TableRow::Event {
                    parent,
                    name: short,
                },
            ),
            SymbolKind::Type => unreachable!("types are emitted separately"),
        };

        let handle = self.alloc(kind);
        self.new_handles.insert(member, handle);
        self.summary
            .new_symbols
            .push((data.identity.clone(), handle));
        self.log.push(parent, add_op);
        self.put_row(handle, row);

        if data.identity.kind == SymbolKind::Method {
            self.emit_params(handle, &data.signature);
            self.emit_generic_params(handle, member);
            if let Some(body) = &data.body {
                // 新方法：全新槽位布局
                let allocation = self.allocator.allocate(&[], body, None, false);
                self.finish_method_body(
                    handle,
                    MethodIdentity::new(data.identity.clone()),
                    body,
                    allocation,
                );
            }
        }
    }

    /// 新方法的参数行：AddParameter 父行先行，按序号
    fn emit_params(&mut self, method: Handle, signature: &StructuralSignature) {
        for (i, _param) in signature.params.iter().enumerate() {
            let handle = self.alloc(TableKind::Param);
            self.log.push(method, EditOperation::AddParameter);
            self.put_row(
                handle,
                TableRow::Param {
                    method,
                    name: String::new(),
                    ordinal: (i + 1) as u16,
                },
            );
        }
    }

    /// 更新的方法：重发 MethodDef 行 + 引用行 + 槽位布局 + 方法体
    fn emit_update(
        &mut self,
        edit: &SemanticEdit,
        provider: &dyn DebugInfoProvider,
    ) -> Result<(), EncodeError> {
        let old_sym = edit.old_symbol.expect("validated");
        let new_sym = edit.new_symbol.expect("validated");
        let data = self.new.symbol(new_sym).clone();

        // 身份已在基线中：句柄终生不变
        let handle = self
            .matcher
            .map_definition(new_sym)
            .or_else(|| self.baseline.handle_of(&self.old.symbol(old_sym).identity))
            .expect("validated updates resolve in the baseline");

        if let Some(body) = &data.body {
            self.emit_references(data.identity.unit, body);
        }

        let parent = data
            .container
            .map(|c| self.definition_handle(c))
            .unwrap_or_else(|| Handle::new(TableKind::TypeDef, 1));
        let short = short_name_of(&data.identity.qualified_name).to_string();
        let row = match data.identity.kind {
            SymbolKind::Method => TableRow::MethodDef {
                parent,
                name: short,
            },
            SymbolKind::Field => TableRow::Field {
                parent,
                name: short,
            },
            SymbolKind::Property => TableRow::Property {
                parent,
                name: short,
            },
            SymbolKind::Event => TableRow::Event {
                parent,
                name: short,
            },
            SymbolKind::Type => TableRow::TypeDef {
                name: data.identity.qualified_name.clone(),
                visibility: data.visibility,
            },
        };
        self.put_row(handle, row);

        if data.identity.kind != SymbolKind::Method {
            return Ok(());
        }
        if let Some(body) = &data.body {
            let old_method = MethodIdentity::new(self.old.symbol(old_sym).identity.clone());
            let old_layout: Vec<LocalSlotDescriptor> =
                match self.baseline.method_layout(&old_method) {
                    Some(layout) => layout.to_vec(),
                    None => provider.local_slots(&old_method)?.unwrap_or_default(),
                };
            let allocation = match edit.syntax_map.as_deref() {
                Some(map) => {
                    let f = |node: SyntaxNodeId| map(node);
                    self.allocator.allocate(
                        &old_layout,
                        body,
                        Some(&f as &SyntaxMapFn<'_>),
                        edit.preserve_locals,
                    )
                }
                None => self
                    .allocator
                    .allocate(&old_layout, body, None, edit.preserve_locals),
            };
            self.finish_method_body(handle, old_method, body, allocation);
        }
        Ok(())
    }

    /// 删除的方法：重发行，体换成缺失成员陷阱
    fn emit_delete(&mut self, old_sym: SymbolRef) {
        let identity = self.old.symbol(old_sym).identity.clone();
        let handle = match self.baseline.handle_of(&identity) {
            Some(h) => h,
            // 校验阶段已经报过 E1001
            None => return,
        };
        if identity.kind != SymbolKind::Method {
            return;
        }
        let parent = self
            .old
            .symbol(old_sym)
            .container
            .and_then(|c| self.baseline.handle_of(&self.old.symbol(c).identity))
            .unwrap_or_else(|| Handle::new(TableKind::TypeDef, 1));
        let short = short_name_of(&identity.qualified_name).to_string();
        self.put_row(
            handle,
            TableRow::MethodDef {
                parent,
                name: short,
            },
        );
        self.bodies.push(EncodedBody {
            method: handle,
            local_sig: None,
            code: MISSING_MEMBER_BODY.to_vec(),
        });
    }

    /// 方法体收尾：局部签名行、方法体流、调试信息流、布局汇总
    fn finish_method_body(
        &mut self,
        handle: Handle,
        method: MethodIdentity,
        body: &BodyDescriptor,
        allocation: SlotAllocation,
    ) {
        let local_sig = if allocation.layout.is_empty() {
            None
        } else {
            let blob = self.layout_blob(&allocation.layout);
            let sig_handle = self.alloc(TableKind::StandAloneSig);
            self.put_row(sig_handle, TableRow::StandAloneSig { blob });
            Some(sig_handle)
        };

        self.bodies.push(EncodedBody {
            method: handle,
            local_sig,
            code: body.code.clone(),
        });

        // 调试信息：序列点 + 具名槽位的变量名 + 方法体作用域
        let names: HashMap<SyntaxNodeId, &str> = body
            .locals
            .iter()
            .map(|decl| (decl.syntax, decl.name.as_str()))
            .collect();
        let locals = allocation
            .layout
            .iter()
            .filter_map(|slot| match slot.origin {
                SlotOrigin::Named(node) => names.get(&node).map(|&name| LocalVariableInfo {
                    slot: slot.index,
                    name: name.to_string(),
                }),
                SlotOrigin::Temporary | SlotOrigin::Unused => None,
            })
            .collect();
        self.debug_info.push(MethodDebugInfo {
            method: handle,
            document: body.document.clone(),
            sequence_points: body.sequence_points.clone(),
            locals,
            scope: ScopeRange {
                start: 0,
                end: body.code.len() as u32,
            },
        });

        self.summary.new_layouts.push((method, allocation.layout));
    }

    /// 编辑体首次提到的外部符号领引用行；已有的按句柄复用
    fn emit_references(&mut self, from_unit: UnitId, body: &BodyDescriptor) {
        for ty in &body.referenced_types {
            self.ensure_type_reference(ty);
        }
        for &referenced in &body.referenced {
            let target = self.new.symbol(referenced).clone();
            if target.identity.unit == from_unit {
                continue;
            }
            // 本代插入的跨单元符号由定义行句柄直接引用
            if self.matcher.map_definition(referenced).is_none() {
                continue;
            }
            let type_sym = match target.identity.kind {
                SymbolKind::Type => referenced,
                _ => match target.container {
                    Some(c) => c,
                    None => continue,
                },
            };
            let assembly = self.new.unit(target.identity.unit).identity.clone();
            let type_name = self.new.symbol(type_sym).identity.qualified_name.clone();
            let type_handle =
                self.ensure_type_reference(&TypeRef::named(assembly.clone(), type_name));
            if target.identity.kind == SymbolKind::Type {
                continue;
            }
            let key = ReferenceKey::Member {
                assembly,
                qualified_name: target.identity.qualified_name.clone(),
                signature_digest: target.identity.signature_digest,
            };
            if self.baseline.reference_handle(&key).is_some()
                || self.summary.new_references.iter().any(|(k, _)| *k == key)
            {
                continue;
            }
            let short = short_name_of(&target.identity.qualified_name).to_string();
            let handle = self.alloc(TableKind::MemberRef);
            self.put_row(
                handle,
                TableRow::MemberRef {
                    parent: type_handle,
                    name: short,
                },
            );
            self.summary.new_references.push((key, handle));
        }
    }

    /// 确保外部类型有引用行（连同其程序集引用行）
    fn ensure_type_reference(&mut self, ty: &TypeRef) -> Handle {
        let (assembly, qualified_name) = match ty {
            TypeRef::Named {
                assembly,
                qualified_name,
                ..
            } => (assembly.clone(), qualified_name.clone()),
            // 非具名类型不占引用行
            _ => return Handle::new(TableKind::TypeRef, 1),
        };
        let key = ReferenceKey::Type {
            assembly: assembly.clone(),
            qualified_name: qualified_name.clone(),
        };
        if let Some(handle) = self.baseline.reference_handle(&key) {
            return handle;
        }
        if let Some((_, handle)) = self.summary.new_references.iter().find(|(k, _)| *k == key) {
            return *handle;
        }

        let assembly_handle = self.ensure_assembly_reference(&assembly);
        let handle = self.alloc(TableKind::TypeRef);
        self.put_row(
            handle,
            TableRow::TypeRef {
                assembly: assembly_handle,
                name: qualified_name,
            },
        );
        self.summary.new_references.push((key, handle));
        handle
    }

    /// 确保程序集引用行
    fn ensure_assembly_reference(&mut self, assembly: &AssemblyIdentity) -> Handle {
        let key = ReferenceKey::Assembly(assembly.clone());
        if let Some(handle) = self.baseline.reference_handle(&key) {
            return handle;
        }
        if let Some((_, handle)) = self.summary.new_references.iter().find(|(k, _)| *k == key) {
            return *handle;
        }
        let handle = self.alloc(TableKind::AssemblyRef);
        self.put_row(
            handle,
            TableRow::AssemblyRef {
                name: assembly.name.clone(),
                version: assembly.version,
            },
        );
        self.summary.new_references.push((key, handle));
        handle
    }

    /// 类型首次获得属性/事件时补发 map 行
    fn ensure_map_row(
        &mut self,
        parent: Handle,
        container: Option<SymbolRef>,
        map_kind: TableKind,
    ) {
        if self.maps_emitted.contains(&(parent, map_kind)) {
            return;
        }
        // 基线里已有同类成员的类型，map 行在上一代就存在
        if let Some(container) = container {
            if self.container_had_kind(container, map_kind) {
                return;
            }
        }
        self.maps_emitted.insert((parent, map_kind));
        let handle = self.alloc(map_kind);
        let row = match map_kind {
            TableKind::PropertyMap => TableRow::PropertyMap { parent },
            TableKind::EventMap => TableRow::EventMap { parent },
            _ => unreachable!("only map tables"),
        };
        self.put_row(handle, row);
    }

    /// 旧快照中该容器是否已有对应成员种类
    fn container_had_kind(&self, container: SymbolRef, map_kind: TableKind) -> bool {
        let member_kind = match map_kind {
            TableKind::PropertyMap => SymbolKind::Property,
            TableKind::EventMap => SymbolKind::Event,
            _ => return false,
        };
        match self.matcher.find_old_counterpart(container) {
            Some(old_container) => self
                .old
                .symbol(old_container)
                .members
                .iter()
                .any(|&m| self.old.symbol(m).identity.kind == member_kind),
            None => false,
        }
    }

    /// 定义符号的句柄：基线已有的走匹配器，本代插入的走会话表
    fn definition_handle(&self, sym: SymbolRef) -> Handle {
        if let Some(&handle) = self.new_handles.get(&sym) {
            return handle;
        }
        self.matcher
            .map_definition(sym)
            .expect("container resolves in baseline or was inserted earlier in this batch")
    }

    /// 局部变量布局的签名 blob
    fn layout_blob(&mut self, layout: &[LocalSlotDescriptor]) -> u32 {
        let mut buf = DeltaBuffer::new();
        buf.push_u32(layout.len() as u32);
        for slot in layout {
            let digest = StructuralSignature::of_type(slot.ty.clone()).digest();
            buf.push_bytes(&digest.to_le_bytes());
        }
        let bytes = buf.into_bytes();
        self.heaps.blob(&bytes)
    }

    /// 类型引用的 blob（泛型约束等）
    fn type_blob(&mut self, ty: &TypeRef) -> u32 {
        let digest = StructuralSignature::of_type(ty.clone()).digest();
        self.heaps.blob(&digest.to_le_bytes())
    }
}
