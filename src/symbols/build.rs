//! 符号图构造器
//!
//! 宿主前端（或测试）把解析完的快照灌进来。
//! 构造器负责分配 arena 句柄、维护声明顺序、计算签名摘要。

use std::collections::HashMap;

use super::graph::{BodyDescriptor, GenericParamDecl, SymbolData, SymbolGraph, SymbolRef, UnitData};
use super::identity::{AssemblyIdentity, SymbolIdentity, SymbolKind, UnitId};
use super::signature::{StructuralSignature, TypeRef, Visibility};

/// 符号图构造器
#[derive(Debug, Default)]
pub struct SymbolGraphBuilder {
    units: Vec<UnitData>,
    symbols: Vec<SymbolData>,
    by_identity: HashMap<SymbolIdentity, SymbolRef>,
}

impl SymbolGraphBuilder {
    /// 创建空构造器
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册一个编译单元
    pub fn unit(&mut self, name: impl Into<String>, version: (u16, u16, u16, u16)) -> UnitId {
        let id = UnitId::new(self.units.len() as u32);
        self.units.push(UnitData {
            id,
            identity: AssemblyIdentity::new(name, version),
            references: Vec::new(),
            roots: Vec::new(),
        });
        id
    }

    /// 给单元添加一个程序集引用
    pub fn reference(&mut self, unit: UnitId, assembly: AssemblyIdentity) {
        self.units[unit.0 as usize].references.push(assembly);
    }

    /// 顶层类型定义
    pub fn type_def(&mut self, unit: UnitId, qualified_name: impl Into<String>) -> SymbolRef {
        self.generic_type(unit, qualified_name, 0)
    }

    /// 顶层泛型类型定义
    pub fn generic_type(
        &mut self,
        unit: UnitId,
        qualified_name: impl Into<String>,
        generic_arity: u16,
    ) -> SymbolRef {
        let sym = self.push(
            unit,
            None,
            SymbolKind::Type,
            qualified_name.into(),
            generic_arity,
            StructuralSignature::empty(),
        );
        self.units[unit.0 as usize].roots.push(sym);
        sym
    }

    /// 嵌套类型定义
    pub fn nested_type(&mut self, container: SymbolRef, name: &str) -> SymbolRef {
        let unit = self.symbols[container.0 as usize].identity.unit;
        let qualified = format!(
            "{}.{}",
            self.symbols[container.0 as usize].identity.qualified_name, name
        );
        let sym = self.push(
            unit,
            Some(container),
            SymbolKind::Type,
            qualified,
            0,
            StructuralSignature::empty(),
        );
        self.symbols[container.0 as usize].members.push(sym);
        sym
    }

    /// 方法成员
    pub fn method(
        &mut self,
        container: SymbolRef,
        name: &str,
        signature: StructuralSignature,
    ) -> SymbolRef {
        self.generic_method(container, name, 0, signature)
    }

    /// 泛型方法成员
    pub fn generic_method(
        &mut self,
        container: SymbolRef,
        name: &str,
        generic_arity: u16,
        signature: StructuralSignature,
    ) -> SymbolRef {
        self.member(container, SymbolKind::Method, name, generic_arity, signature)
    }

    /// 字段成员
    pub fn field(&mut self, container: SymbolRef, name: &str, ty: TypeRef) -> SymbolRef {
        self.member(
            container,
            SymbolKind::Field,
            name,
            0,
            StructuralSignature::of_type(ty),
        )
    }

    /// 属性成员
    pub fn property(&mut self, container: SymbolRef, name: &str, ty: TypeRef) -> SymbolRef {
        self.member(
            container,
            SymbolKind::Property,
            name,
            0,
            StructuralSignature::of_type(ty),
        )
    }

    /// 事件成员
    pub fn event(&mut self, container: SymbolRef, name: &str, handler: TypeRef) -> SymbolRef {
        self.member(
            container,
            SymbolKind::Event,
            name,
            0,
            StructuralSignature::of_type(handler),
        )
    }

    /// 设置方法体
    pub fn set_body(&mut self, sym: SymbolRef, body: BodyDescriptor) {
        self.symbols[sym.0 as usize].body = Some(body);
    }

    /// 设置可见性
    pub fn set_visibility(&mut self, sym: SymbolRef, visibility: Visibility) {
        self.symbols[sym.0 as usize].visibility = visibility;
    }

    /// 标记为受限（interop 内嵌）类型
    pub fn set_restricted(&mut self, sym: SymbolRef) {
        self.symbols[sym.0 as usize].is_restricted = true;
    }

    /// 设置泛型形参声明
    pub fn set_generic_params(&mut self, sym: SymbolRef, params: Vec<GenericParamDecl>) {
        self.symbols[sym.0 as usize].generic_params = params;
    }

    /// 完成构造
    pub fn finish(self) -> SymbolGraph {
        SymbolGraph::from_parts(self.units, self.symbols, self.by_identity)
    }

    fn member(
        &mut self,
        container: SymbolRef,
        kind: SymbolKind,
        name: &str,
        generic_arity: u16,
        signature: StructuralSignature,
    ) -> SymbolRef {
        let unit = self.symbols[container.0 as usize].identity.unit;
        let qualified = format!(
            "{}.{}",
            self.symbols[container.0 as usize].identity.qualified_name, name
        );
        let sym = self.push(unit, Some(container), kind, qualified, generic_arity, signature);
        self.symbols[container.0 as usize].members.push(sym);
        sym
    }

    fn push(
        &mut self,
        unit: UnitId,
        container: Option<SymbolRef>,
        kind: SymbolKind,
        qualified_name: String,
        generic_arity: u16,
        signature: StructuralSignature,
    ) -> SymbolRef {
        let identity = SymbolIdentity {
            unit,
            kind,
            qualified_name,
            generic_arity,
            signature_digest: signature.digest(),
        };
        let sym = SymbolRef::new(self.symbols.len() as u32);
        self.by_identity.insert(identity.clone(), sym);
        self.symbols.push(SymbolData {
            identity,
            container,
            signature,
            visibility: Visibility::Public,
            is_restricted: false,
            declaration_order: sym.0,
            generic_params: Vec::new(),
            members: Vec::new(),
            body: None,
        });
        sym
    }
}
