//! 跨代槽位分配
//!
//! 算法（仅作用于 `preserve_locals=true` 的更新）：
//!
//! 1. 按下标遍历旧布局。语法映射能把某个新声明解析回该槽位的
//!    原声明节点、且声明类型未变 ⇒ 槽位保持原下标，标记 `Named`。
//! 2. 类型变了或没有映射命中 ⇒ 标记 `Unused`，**保留原声明类型**，
//!    后续所有更高下标因此不移动。
//! 3. 旧槽位全部归类后，没有旧对应物的新声明从"现有最大下标 + 1"
//!    起依次领取新下标。
//! 4. 编译器引入的单表达式临时变量从不跨代匹配，总是新分配。

use std::collections::HashMap;

use tracing::debug;

use crate::symbols::{BodyDescriptor, SyntaxNodeId};

use super::{LocalSlotDescriptor, SlotOrigin};

/// 语法映射：新声明节点 → 旧声明节点
///
/// 注入的纯函数，分配器不依赖任何具体 AST 表示。
pub type SyntaxMapFn<'a> = dyn Fn(SyntaxNodeId) -> Option<SyntaxNodeId> + 'a;

/// 分配结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotAllocation {
    /// 新一代的完整槽位布局，按下标排列
    pub layout: Vec<LocalSlotDescriptor>,
    /// 新声明节点 → 分到的槽位下标
    pub mapping: HashMap<SyntaxNodeId, u32>,
}

impl SlotAllocation {
    /// 布局中的最大下标 + 1（即槽位总数）
    pub fn slot_count(&self) -> u32 {
        self.layout.len() as u32
    }
}

/// 局部变量槽位分配器
#[derive(Debug, Default)]
pub struct LocalSlotAllocator;

impl LocalSlotAllocator {
    /// 创建分配器
    pub fn new() -> Self {
        Self
    }

    /// 为更新后的方法体分配槽位
    ///
    /// `preserve` 为 false 时完全丢弃旧布局，按声明顺序重新分配。
    pub fn allocate(
        &self,
        old_layout: &[LocalSlotDescriptor],
        body: &BodyDescriptor,
        syntax_map: Option<&SyntaxMapFn<'_>>,
        preserve: bool,
    ) -> SlotAllocation {
        if !preserve {
            return self.allocate_fresh(body);
        }

        let mut layout = Vec::with_capacity(old_layout.len() + body.locals.len());
        let mut mapping = HashMap::new();
        // 已经认领旧槽位的新声明
        let mut claimed = vec![false; body.locals.len()];

        for old_slot in old_layout {
            let taken = match old_slot.origin {
                SlotOrigin::Named(old_node) => {
                    self.claim(old_slot, old_node, body, syntax_map, &mut claimed)
                }
                // 临时变量从不跨代匹配
                SlotOrigin::Temporary => None,
                // 旧占位槽位保持占位
                SlotOrigin::Unused => None,
            };

            match taken {
                Some((decl_index, new_node)) => {
                    claimed[decl_index] = true;
                    mapping.insert(new_node, old_slot.index);
                    layout.push(LocalSlotDescriptor::named(
                        old_slot.index,
                        old_slot.ty.clone(),
                        new_node,
                    ));
                }
                None => {
                    // 原类型永久保留，更高下标不移动
                    layout.push(LocalSlotDescriptor::unused(
                        old_slot.index,
                        old_slot.ty.clone(),
                    ));
                }
            }
        }

        // 新声明追加在现有最大下标之后
        let mut next = old_layout.iter().map(|s| s.index + 1).max().unwrap_or(0);
        for (i, decl) in body.locals.iter().enumerate() {
            if claimed[i] {
                continue;
            }
            mapping.insert(decl.syntax, next);
            layout.push(LocalSlotDescriptor::named(next, decl.ty.clone(), decl.syntax));
            next += 1;
        }

        // 临时变量总是新分配
        for _ in 0..body.temporaries {
            layout.push(LocalSlotDescriptor::temporary(
                next,
                crate::symbols::TypeRef::Primitive(crate::symbols::PrimitiveType::Object),
            ));
            next += 1;
        }

        debug!(
            old = old_layout.len(),
            new = layout.len(),
            "local slot layout preserved"
        );

        SlotAllocation { layout, mapping }
    }

    /// `preserve_locals=false`：全新布局
    fn allocate_fresh(&self, body: &BodyDescriptor) -> SlotAllocation {
        let mut layout = Vec::with_capacity(body.locals.len() + body.temporaries as usize);
        let mut mapping = HashMap::new();
        let mut next = 0u32;

        for decl in &body.locals {
            mapping.insert(decl.syntax, next);
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

        SlotAllocation { layout, mapping }
    }

    /// 找出通过语法映射认领该旧槽位的新声明
    fn claim(
        &self,
        old_slot: &LocalSlotDescriptor,
        old_node: SyntaxNodeId,
        body: &BodyDescriptor,
        syntax_map: Option<&SyntaxMapFn<'_>>,
        claimed: &mut [bool],
    ) -> Option<(usize, SyntaxNodeId)> {
        let map = syntax_map?;
        for (i, decl) in body.locals.iter().enumerate() {
            if claimed[i] {
                continue;
            }
            if map(decl.syntax) == Some(old_node) {
                // 类型变了就放弃槽位，留占位
                if decl.ty == old_slot.ty {
                    return Some((i, decl.syntax));
                }
                return None;
            }
        }
        None
    }
}
