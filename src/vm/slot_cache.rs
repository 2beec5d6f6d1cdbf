//! 세대 번호 기반 슬롯 캐시
//!
//! 타입마다 마지막으로 만든 `SlotCacheEntry`를 `ArcSwapOption`으로 게시합니다.
//! 읽기는 락 없이 포인터만 로드하고, `generation_seen`이 타입의 현재 세대와
//! 다르면 새로 만들어 교체합니다. 여러 스레드가 동시에 재구성할 수 있으며,
//! 같은 세대의 항목이 이미 게시되어 있으면 그것을 채택합니다.

use std::sync::Arc;

use tracing::debug;

use super::machine::VmResult;
use super::slot::SlotKind;
use super::slot_table::{SlotTable, SlotTarget, TypeLayer, build_slot_table};
use super::type_def::{TypeDef, TypeId, TypeRegistry};

#[derive(Debug)]
pub struct SlotCacheEntry {
    pub type_id: TypeId,
    pub generation_seen: u64,
    /// 이 테이블을 만들 때 사용한 MRO
    pub mro: Arc<Vec<TypeId>>,
    pub table: SlotTable,
}

impl SlotCacheEntry {
    pub fn get(&self, kind: SlotKind) -> &SlotTarget {
        self.table.get(kind)
    }

    /// 이 타입이 `other`의 서브타입인지 (자기 자신 포함)
    pub fn is_subtype_of(&self, other: TypeId) -> bool {
        self.mro.contains(&other)
    }
}

impl TypeRegistry {
    pub fn get_cached_slots(&self, id: TypeId) -> VmResult<Arc<SlotCacheEntry>> {
        let ty = self.require(id)?;
        let current = ty.cache.load_full();
        if let Some(entry) = &current
            && entry.generation_seen == ty.generation()
        {
            return Ok(entry.clone());
        }

        let fresh = Arc::new(self.rebuild_slots(&ty)?);
        let previous = ty.cache.compare_and_swap(&current, Some(fresh.clone()));
        let replaced = match (&*previous, &current) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        if !replaced
            && let Some(other) = &*previous
            && other.generation_seen == fresh.generation_seen
        {
            return Ok(other.clone());
        }
        Ok(fresh)
    }

    fn rebuild_slots(&self, ty: &Arc<TypeDef>) -> VmResult<SlotCacheEntry> {
        let (generation, mro, dunders) = ty.snapshot();

        let mut layers = Vec::with_capacity(mro.len());
        layers.push(TypeLayer {
            id: ty.id,
            ty: ty.clone(),
            dunders,
        });
        for &ancestor in mro.iter().skip(1) {
            let def = self.require(ancestor)?;
            let (_, _, dunders) = def.snapshot();
            layers.push(TypeLayer {
                id: ancestor,
                ty: def,
                dunders,
            });
        }

        let table = build_slot_table(&layers, |definer, kind| {
            Ok(self.get_cached_slots(definer)?.get(kind).clone())
        })?;

        debug!(
            type_id = ty.id,
            type_name = %ty.name,
            generation,
            defined = table.defined().count(),
            "rebuilt slot table"
        );
        Ok(SlotCacheEntry {
            type_id: ty.id,
            generation_seen: generation,
            mro,
            table,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::builtins::BuiltinId;
    use crate::vm::type_def::{TYPE_BOOL, TYPE_INT};
    use crate::vm::utils::make_function;
    use crate::vm::value::Value;
    use std::collections::HashMap;

    fn method() -> Value {
        make_function("m", |_, _| Ok(Value::None))
    }

    #[test]
    fn test_cache_hit_returns_same_entry() {
        let reg = TypeRegistry::new(256);
        let a = reg.get_cached_slots(TYPE_INT).unwrap();
        let b = reg.get_cached_slots(TYPE_INT).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.get(SlotKind::Add), &SlotTarget::Builtin(BuiltinId::IntAdd));
    }

    #[test]
    fn test_bool_inherits_int_slots() {
        let reg = TypeRegistry::new(256);
        let entry = reg.get_cached_slots(TYPE_BOOL).unwrap();
        assert_eq!(entry.get(SlotKind::Add), &SlotTarget::Builtin(BuiltinId::IntAdd));
        assert_eq!(entry.get(SlotKind::And), &SlotTarget::Builtin(BuiltinId::BoolAnd));
        assert!(entry.is_subtype_of(TYPE_INT));
    }

    #[test]
    fn test_sibling_subclasses_share_base_target() {
        let reg = TypeRegistry::new(256);
        let ns = HashMap::from([("__add__".to_string(), method())]);
        let base = reg.create_type("Base", &[], ns).unwrap();
        let left = reg.create_type("Left", &[base], HashMap::new()).unwrap();
        let right = reg.create_type("Right", &[base], HashMap::new()).unwrap();

        let l = reg.get_cached_slots(left).unwrap();
        let r = reg.get_cached_slots(right).unwrap();
        assert!(l.get(SlotKind::Add).same_as(r.get(SlotKind::Add)));
    }

    #[test]
    fn test_mutation_invalidates_entry() {
        let reg = TypeRegistry::new(256);
        let a = reg.create_type("A", &[], HashMap::new()).unwrap();
        let b = reg.create_type("B", &[a], HashMap::new()).unwrap();
        assert!(reg.get_cached_slots(b).unwrap().get(SlotKind::Negative).is_absent());

        reg.set_type_attr(a, "__neg__", method()).unwrap();
        let entry = reg.get_cached_slots(b).unwrap();
        assert!(matches!(entry.get(SlotKind::Negative), SlotTarget::UserOverride(_)));

        reg.del_type_attr(a, "__neg__").unwrap();
        assert!(reg.get_cached_slots(b).unwrap().get(SlotKind::Negative).is_absent());
    }

    #[test]
    fn test_invalidate_forces_rebuild() {
        let reg = TypeRegistry::new(256);
        let a = reg.create_type("A", &[], HashMap::new()).unwrap();
        let first = reg.get_cached_slots(a).unwrap();
        reg.invalidate(a).unwrap();
        let second = reg.get_cached_slots(a).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(second.generation_seen > first.generation_seen);
    }
}
