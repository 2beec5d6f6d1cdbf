//! 타입 슬롯 테이블
//!
//! 각 `SlotKind`를 실제 호출 대상(`SlotTarget`)으로 매핑하는 고정 크기 배열입니다.
//! 테이블은 한 번 만들어지면 바뀌지 않고, 타입이 변경되면 새 테이블로 교체됩니다.

use std::collections::HashMap;
use std::ops::Index;
use std::sync::Arc;

use strum::{EnumCount, IntoEnumIterator};

use super::builtins::BuiltinId;
use super::machine::VmResult;
use super::slot::SlotKind;
use super::type_def::{TypeDef, TypeId};
use super::value::Value;

/// 사용자 클래스의 특수 메서드로 채워진 슬롯
///
/// `methods`는 `kind.dunders()`와 같은 순서로, 타입의 MRO를 따라 찾은 메서드입니다.
/// - `None`: 어떤 사용자 네임스페이스에도 없음 → `inherited`에게 위임
/// - `Some(Value::None)`: `__hash__ = None`처럼 명시적으로 막힘
#[derive(Debug)]
pub struct SlotOverride {
    pub owner: TypeId,
    pub kind: SlotKind,
    methods: Vec<Option<Value>>,
    pub inherited: SlotTarget,
}

/// 특수 메서드 이름 하나의 해석 결과
#[derive(Debug)]
pub enum Binding<'a> {
    Method(&'a Value),
    Blocked,
    Inherited,
}

impl SlotOverride {
    pub fn binding(&self, name: &str) -> Binding<'_> {
        let Some(pos) = self.kind.dunders().iter().position(|d| *d == name) else {
            return Binding::Inherited;
        };
        match &self.methods[pos] {
            Some(Value::None) => Binding::Blocked,
            Some(method) => Binding::Method(method),
            None => Binding::Inherited,
        }
    }
}

/// 반사 메서드(`__radd__` ...)를 실제로 제공하는 구현
#[derive(Debug, Clone, Copy)]
pub enum ReflectedImpl<'a> {
    Method(&'a Value),
    Builtin(BuiltinId),
    Missing,
}

#[derive(Debug, Clone, Default)]
pub enum SlotTarget {
    #[default]
    Absent,
    Builtin(BuiltinId),
    UserOverride(Arc<SlotOverride>),
}

impl SlotTarget {
    pub fn is_absent(&self) -> bool {
        matches!(self, SlotTarget::Absent)
    }

    /// 상속 사슬을 따라가 반사 쪽에서 호출될 구현을 찾음
    pub fn reflected_impl(&self) -> ReflectedImpl<'_> {
        let mut target = self;
        loop {
            match target {
                SlotTarget::Absent => return ReflectedImpl::Missing,
                SlotTarget::Builtin(id) => return ReflectedImpl::Builtin(*id),
                SlotTarget::UserOverride(o) => {
                    let Some(name) = o.kind.reflected_dunder() else {
                        return ReflectedImpl::Missing;
                    };
                    match o.binding(name) {
                        Binding::Method(m) => return ReflectedImpl::Method(m),
                        Binding::Blocked => return ReflectedImpl::Missing,
                        Binding::Inherited => target = &o.inherited,
                    }
                }
            }
        }
    }

    /// `base`와 다른 반사 구현을 가지는지 (하위 타입이 `__radd__` 등을 다시 정의했는지)
    pub fn overloads_reflected(&self, base: &SlotTarget) -> bool {
        match (self.reflected_impl(), base.reflected_impl()) {
            (ReflectedImpl::Method(a), ReflectedImpl::Method(b)) => !a.is(b),
            (ReflectedImpl::Builtin(a), ReflectedImpl::Builtin(b)) => a != b,
            (ReflectedImpl::Missing, ReflectedImpl::Missing) => false,
            _ => true,
        }
    }

    /// 같은 구현인지 (종류가 아니라 대상의 동일성)
    ///
    /// `Absent`는 어떤 것과도 같지 않습니다.
    pub fn same_as(&self, other: &SlotTarget) -> bool {
        match (self, other) {
            (SlotTarget::Builtin(a), SlotTarget::Builtin(b)) => a == b,
            (SlotTarget::UserOverride(a), SlotTarget::UserOverride(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl PartialEq for SlotTarget {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other) || (self.is_absent() && other.is_absent())
    }
}

#[derive(Debug, Clone)]
pub struct SlotTable {
    slots: [SlotTarget; SlotKind::COUNT],
}

impl SlotTable {
    pub fn empty() -> Self {
        Self {
            slots: std::array::from_fn(|_| SlotTarget::Absent),
        }
    }

    pub fn get(&self, kind: SlotKind) -> &SlotTarget {
        &self.slots[kind.index()]
    }

    pub fn defined(&self) -> impl Iterator<Item = SlotKind> + '_ {
        SlotKind::iter().filter(|kind| !self.get(*kind).is_absent())
    }
}

impl Index<SlotKind> for SlotTable {
    type Output = SlotTarget;

    fn index(&self, kind: SlotKind) -> &SlotTarget {
        self.get(kind)
    }
}

/// MRO의 한 단계: 타입과 그 타입 네임스페이스의 특수 메서드 바인딩
pub struct TypeLayer {
    pub id: TypeId,
    pub ty: Arc<TypeDef>,
    pub dunders: HashMap<String, Value>,
}

impl TypeLayer {
    fn binds(&self, kind: SlotKind) -> bool {
        kind.dunders().iter().any(|d| self.dunders.contains_key(*d))
    }

    pub fn defines(&self, kind: SlotKind) -> bool {
        self.ty.builtin_slot(kind).is_some() || self.binds(kind)
    }
}

/// 슬롯 테이블 구성
///
/// `layers[0]`은 대상 타입, 나머지는 MRO 순서의 조상입니다.
/// 대상 타입이 정의하지 않은 종류는 MRO에서 처음 정의한 조상의 대상을
/// `inherited_target(조상, 종류)`로 받아 그대로 공유합니다.
pub fn build_slot_table<F>(layers: &[TypeLayer], mut inherited_target: F) -> VmResult<SlotTable>
where
    F: FnMut(TypeId, SlotKind) -> VmResult<SlotTarget>,
{
    let mut table = SlotTable::empty();
    let Some(own) = layers.first() else {
        return Ok(table);
    };

    for kind in SlotKind::iter() {
        let binds = own.binds(kind);
        if !binds && let Some(id) = own.ty.builtin_slot(kind) {
            table.slots[kind.index()] = SlotTarget::Builtin(id);
            continue;
        }

        let inherited = match layers[1..].iter().find(|layer| layer.defines(kind)) {
            Some(definer) => inherited_target(definer.id, kind)?,
            None => SlotTarget::Absent,
        };

        table.slots[kind.index()] = if binds {
            user_override(own.id, kind, layers, inherited)
        } else {
            inherited
        };
    }
    Ok(table)
}

fn user_override(
    owner: TypeId,
    kind: SlotKind,
    layers: &[TypeLayer],
    inherited: SlotTarget,
) -> SlotTarget {
    let methods: Vec<Option<Value>> = kind
        .dunders()
        .iter()
        .map(|name| layers.iter().find_map(|layer| layer.dunders.get(*name).cloned()))
        .collect();

    let usable = methods
        .iter()
        .any(|m| matches!(m, Some(v) if !v.is_none()));
    let all_blocked = methods.iter().all(|m| matches!(m, Some(Value::None)));
    if all_blocked || (!usable && inherited.is_absent()) {
        return SlotTarget::Absent;
    }

    SlotTarget::UserOverride(Arc::new(SlotOverride {
        owner,
        kind,
        methods,
        inherited,
    }))
}
