//! - **TypeDef**: 각 타입의 메타데이터 (이름, 기반 타입, MRO, 네임스페이스, 세대 번호)
//! - **TypeRegistry**: `TypeId`로 인덱싱되는 타입 arena
//! - **TypeFlags**: 타입 속성 플래그
//!
//! 타입 변경(특수 메서드 대입, `__bases__` 재할당)은 타입별 쓰기 락 아래에서
//! `generation`을 올리고, 모든 하위 클래스의 `generation`도 함께 올립니다.
//! 슬롯 캐시는 이 값과 비교해 자신이 낡았는지 판단합니다.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::{ArcSwap, ArcSwapOption};
use parking_lot::{Mutex, RwLock};
use strum::EnumCount;
use tracing::debug;

use super::builtins::{self, BuiltinId};
use super::machine::{VmErrorKind, VmResult, err};
use super::mro::c3_linearize;
use super::slot::{SlotKind, is_slot_dunder};
use super::slot_cache::SlotCacheEntry;
use super::value::{Object, ObjectData, Value};

pub type TypeId = u16;

// ========== Builtin 타입 ID ==========
pub const TYPE_OBJECT: TypeId = 0;
pub const TYPE_TYPE: TypeId = 1;
pub const TYPE_NONE: TypeId = 2;
pub const TYPE_NOT_IMPLEMENTED: TypeId = 3;
pub const TYPE_INT: TypeId = 4;
pub const TYPE_BOOL: TypeId = 5;
pub const TYPE_FLOAT: TypeId = 6;
pub const TYPE_STR: TypeId = 7;
pub const TYPE_TUPLE: TypeId = 8;
pub const TYPE_FUNCTION: TypeId = 9;
pub const TYPE_METHOD: TypeId = 10;
pub const TYPE_PROPERTY: TypeId = 11;
pub const TYPE_ITERATOR: TypeId = 12;

/// 사용자 정의 타입이 시작되는 ID
pub const TYPE_USER_START: TypeId = 13;

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TypeFlags: u32 {
        /// 생성 후 수정할 수 없는 타입 (builtin 타입)
        const IMMUTABLE = 1 << 0;

        /// 상속할 수 있는 타입
        const BASETYPE  = 1 << 1;

        /// 클래스 정의로 만들어진 타입. 인스턴스가 `__dict__`를 가짐
        const HEAPTYPE  = 1 << 2;
    }
}

/// 타입 락이 보호하는 가변 상태
#[derive(Debug, Default)]
pub struct TypeState {
    pub bases: Vec<TypeId>,
    pub namespace: HashMap<String, Value>,
}

pub struct TypeDef {
    pub id: TypeId,
    pub name: String,
    pub flags: TypeFlags,

    /// builtin 구현 슬롯 (생성 시 고정)
    builtin_slots: [Option<BuiltinId>; SlotKind::COUNT],

    pub(crate) state: RwLock<TypeState>,

    /// 락 없이 읽을 수 있도록 따로 게시되는 MRO (자기 자신 포함)
    pub(crate) mro: ArcSwap<Vec<TypeId>>,

    pub(crate) generation: AtomicU64,
    pub(crate) subclasses: RwLock<Vec<TypeId>>,
    pub(crate) cache: ArcSwapOption<SlotCacheEntry>,

    type_value: Value,
}

impl TypeDef {
    pub fn new(id: TypeId, name: impl Into<String>, flags: TypeFlags) -> Self {
        Self {
            id,
            name: name.into(),
            flags,
            builtin_slots: [None; SlotKind::COUNT],
            state: RwLock::new(TypeState::default()),
            mro: ArcSwap::from_pointee(vec![id]),
            generation: AtomicU64::new(0),
            subclasses: RwLock::new(Vec::new()),
            cache: ArcSwapOption::empty(),
            type_value: Value::Object(Arc::new(Object::new(TYPE_TYPE, ObjectData::Type(id)))),
        }
    }

    pub fn with_bases(mut self, bases: &[TypeId]) -> Self {
        self.state.get_mut().bases = bases.to_vec();
        self
    }

    /// builtin 구현 등록. 슬롯 종류는 레지스트리 항목에서 결정됩니다.
    pub fn with_builtins(mut self, ids: &[BuiltinId]) -> Self {
        for &id in ids {
            let entry = builtins::entry(id);
            self.builtin_slots[entry.kind.index()] = Some(id);
        }
        self
    }

    pub fn with_namespace(mut self, namespace: HashMap<String, Value>) -> Self {
        self.state.get_mut().namespace = namespace;
        self
    }

    pub fn builtin_slot(&self, kind: SlotKind) -> Option<BuiltinId> {
        self.builtin_slots[kind.index()]
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn mro(&self) -> Arc<Vec<TypeId>> {
        self.mro.load_full()
    }

    pub fn bases(&self) -> Vec<TypeId> {
        self.state.read().bases.clone()
    }

    /// 이 타입을 나타내는 값 (`type(x)`의 결과). 항상 같은 객체입니다.
    pub fn type_value(&self) -> &Value {
        &self.type_value
    }

    /// 자기 네임스페이스만 조회 (MRO를 따라가지 않음)
    pub fn own_attr(&self, name: &str) -> Option<Value> {
        self.state.read().namespace.get(name).cloned()
    }

    /// 슬롯 재구성에 필요한 `(generation, mro, 특수 메서드 바인딩)`을 한 번의 락으로 읽기
    pub(crate) fn snapshot(&self) -> (u64, Arc<Vec<TypeId>>, HashMap<String, Value>) {
        let state = self.state.read();
        let dunders = state
            .namespace
            .iter()
            .filter(|(name, _)| is_slot_dunder(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        (self.generation(), self.mro.load_full(), dunders)
    }

    fn ensure_mutable(&self, attr: &str) -> VmResult<()> {
        if self.flags.contains(TypeFlags::IMMUTABLE) {
            return Err(err(
                VmErrorKind::TypeError,
                format!(
                    "cannot set '{}' attribute of immutable type '{}'",
                    attr, self.name
                ),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDef")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("flags", &self.flags)
            .field("generation", &self.generation())
            .finish()
    }
}

// ========== 타입 레지스트리 ==========

pub struct TypeRegistry {
    /// 타입 생성 시 통째로 교체되는 arena (copy-on-write)
    types: ArcSwap<Vec<Arc<TypeDef>>>,

    /// 타입 생성과 `__bases__` 변경을 직렬화
    write_lock: Mutex<()>,

    max_mro_depth: usize,
}

impl TypeRegistry {
    pub fn new(max_mro_depth: usize) -> Self {
        let mut types: Vec<Arc<TypeDef>> = Vec::new();
        for def in builtins::builtin_types() {
            debug_assert_eq!(def.id as usize, types.len());
            let bases = def.bases();
            let mut mro = vec![def.id];
            if let Some(base) = bases.first().and_then(|&b| types.get(b as usize)) {
                mro.extend(base.mro.load().iter().copied());
            }
            def.mro.store(Arc::new(mro));
            for &base in &bases {
                if let Some(base) = types.get(base as usize) {
                    base.subclasses.write().push(def.id);
                }
            }
            types.push(Arc::new(def));
        }

        Self {
            types: ArcSwap::from_pointee(types),
            write_lock: Mutex::new(()),
            max_mro_depth,
        }
    }

    pub fn get(&self, id: TypeId) -> Option<Arc<TypeDef>> {
        self.types.load().get(id as usize).cloned()
    }

    pub fn require(&self, id: TypeId) -> VmResult<Arc<TypeDef>> {
        self.get(id)
            .ok_or_else(|| err(VmErrorKind::TypeError, format!("unknown type id {}", id)))
    }

    pub fn len(&self) -> usize {
        self.types.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn name_of(&self, id: TypeId) -> String {
        match self.get(id) {
            Some(ty) => ty.name.clone(),
            None => format!("<type {}>", id),
        }
    }

    /// `a`가 `b`의 서브타입인지 (자기 자신 포함). 게시된 MRO만 읽습니다.
    pub fn is_subtype(&self, a: TypeId, b: TypeId) -> bool {
        a == b || self.get(a).is_some_and(|ty| ty.mro.load().contains(&b))
    }

    /// MRO를 따라 속성 조회
    pub fn lookup(&self, id: TypeId, name: &str) -> Option<Value> {
        let ty = self.get(id)?;
        for &t in ty.mro.load().iter() {
            if let Some(value) = self.get(t)?.own_attr(name) {
                return Some(value);
            }
        }
        None
    }

    // ========== 타입 생성 ==========

    /// 클래스 정의: `class Name(bases...): namespace`
    pub fn create_type(
        &self,
        name: &str,
        bases: &[TypeId],
        mut namespace: HashMap<String, Value>,
    ) -> VmResult<TypeId> {
        let _guard = self.write_lock.lock();

        let bases: Vec<TypeId> = if bases.is_empty() {
            vec![TYPE_OBJECT]
        } else {
            bases.to_vec()
        };
        self.validate_bases(&bases)?;

        let current = self.types.load_full();
        let id = TypeId::try_from(current.len())
            .map_err(|_| err(VmErrorKind::Overflow, "too many types"))?;
        let mro = self.compute_mro(id, &bases, &HashMap::new())?;

        // __eq__만 정의하면 인스턴스는 해시 불가
        if namespace.contains_key("__eq__") && !namespace.contains_key("__hash__") {
            namespace.insert("__hash__".to_string(), Value::None);
        }

        let def = TypeDef::new(id, name, TypeFlags::HEAPTYPE | TypeFlags::BASETYPE)
            .with_bases(&bases)
            .with_namespace(namespace);
        def.mro.store(Arc::new(mro));

        let mut next = Vec::with_capacity(current.len() + 1);
        next.extend(current.iter().cloned());
        next.push(Arc::new(def));
        self.types.store(Arc::new(next));

        for &base in &bases {
            if let Some(base) = self.get(base) {
                base.subclasses.write().push(id);
            }
        }

        debug!(type_id = id, type_name = name, ?bases, "created type");
        Ok(id)
    }

    fn validate_bases(&self, bases: &[TypeId]) -> VmResult<()> {
        let mut seen = HashSet::new();
        for &base in bases {
            let ty = self.require(base)?;
            if !seen.insert(base) {
                return Err(err(
                    VmErrorKind::TypeError,
                    format!("duplicate base class {}", ty.name),
                ));
            }
            if !ty.flags.contains(TypeFlags::BASETYPE) {
                return Err(err(
                    VmErrorKind::TypeError,
                    format!("type '{}' is not an acceptable base type", ty.name),
                ));
            }
        }
        Ok(())
    }

    /// `staged`에 있는 MRO는 아직 게시되지 않은 새 값으로 우선 사용
    fn compute_mro(
        &self,
        id: TypeId,
        bases: &[TypeId],
        staged: &HashMap<TypeId, Arc<Vec<TypeId>>>,
    ) -> VmResult<Vec<TypeId>> {
        let mut base_mros = Vec::with_capacity(bases.len());
        for &base in bases {
            let mro = match staged.get(&base) {
                Some(mro) => mro.clone(),
                None => self.require(base)?.mro(),
            };
            base_mros.push((base, mro));
        }
        let pairs: Vec<(TypeId, &[TypeId])> = base_mros
            .iter()
            .map(|(base, mro)| (*base, mro.as_slice()))
            .collect();

        let mro = c3_linearize(id, &pairs).map_err(|heads| {
            let names: Vec<String> = heads.iter().map(|&t| self.name_of(t)).collect();
            err(
                VmErrorKind::MroConflict,
                format!(
                    "Cannot create a consistent method resolution order (MRO) for bases {}",
                    names.join(", ")
                ),
            )
        })?;

        if mro.len() > self.max_mro_depth {
            return Err(err(
                VmErrorKind::MroConflict,
                format!(
                    "MRO of length {} exceeds the limit of {}",
                    mro.len(),
                    self.max_mro_depth
                ),
            ));
        }
        Ok(mro)
    }

    // ========== 타입 변경 ==========

    pub fn set_type_attr(&self, id: TypeId, name: &str, value: Value) -> VmResult<()> {
        let ty = self.require(id)?;
        ty.ensure_mutable(name)?;

        let dunder = is_slot_dunder(name);
        {
            let mut state = ty.state.write();
            state.namespace.insert(name.to_string(), value);
            if dunder {
                ty.generation.fetch_add(1, Ordering::AcqRel);
            }
        }
        if dunder {
            let bumped = self.bump_descendants(id);
            debug!(type_id = id, attr = name, subclasses = bumped, "special method assigned");
        }
        Ok(())
    }

    pub fn del_type_attr(&self, id: TypeId, name: &str) -> VmResult<()> {
        let ty = self.require(id)?;
        ty.ensure_mutable(name)?;

        let dunder = is_slot_dunder(name);
        {
            let mut state = ty.state.write();
            if state.namespace.remove(name).is_none() {
                return Err(err(
                    VmErrorKind::AttributeMissing {
                        type_name: ty.name.clone(),
                        attr: name.to_string(),
                    },
                    format!("type object '{}' has no attribute '{}'", ty.name, name),
                ));
            }
            if dunder {
                ty.generation.fetch_add(1, Ordering::AcqRel);
            }
        }
        if dunder {
            let bumped = self.bump_descendants(id);
            debug!(type_id = id, attr = name, subclasses = bumped, "special method deleted");
        }
        Ok(())
    }

    /// `C.__bases__ = (...)`
    ///
    /// 자신과 모든 하위 클래스의 MRO를 먼저 계산해 두고, 전부 성공했을 때만 게시합니다.
    pub fn set_bases(&self, id: TypeId, bases: &[TypeId]) -> VmResult<()> {
        let _guard = self.write_lock.lock();

        let ty = self.require(id)?;
        ty.ensure_mutable("__bases__")?;
        if bases.is_empty() {
            return Err(err(
                VmErrorKind::TypeError,
                format!("can only assign non-empty tuple to {}.__bases__, not ()", ty.name),
            ));
        }
        self.validate_bases(bases)?;
        for &base in bases {
            if self.require(base)?.mro.load().contains(&id) {
                return Err(err(
                    VmErrorKind::TypeError,
                    "a __bases__ item causes an inheritance cycle",
                ));
            }
        }

        let descendants = self.descendants(id);
        let affected: HashSet<TypeId> = descendants.iter().copied().chain([id]).collect();

        let mut staged: HashMap<TypeId, Arc<Vec<TypeId>>> = HashMap::new();
        let own = self.compute_mro(id, bases, &staged)?;
        staged.insert(id, Arc::new(own));

        let mut pending = descendants;
        while !pending.is_empty() {
            let before = pending.len();
            let mut rest = Vec::new();
            for sub in pending {
                let sub_bases = self.require(sub)?.bases();
                let ready = sub_bases
                    .iter()
                    .all(|b| !affected.contains(b) || staged.contains_key(b));
                if ready {
                    let mro = self.compute_mro(sub, &sub_bases, &staged)?;
                    staged.insert(sub, Arc::new(mro));
                } else {
                    rest.push(sub);
                }
            }
            if rest.len() == before {
                return Err(err(
                    VmErrorKind::TypeError,
                    "a __bases__ item causes an inheritance cycle",
                ));
            }
            pending = rest;
        }

        // 게시
        for old in ty.bases() {
            if let Some(old) = self.get(old) {
                old.subclasses.write().retain(|&s| s != id);
            }
        }
        for &base in bases {
            self.require(base)?.subclasses.write().push(id);
        }
        for (&t, mro) in &staged {
            let Some(target) = self.get(t) else { continue };
            let mut state = target.state.write();
            if t == id {
                state.bases = bases.to_vec();
            }
            target.mro.store(mro.clone());
            target.generation.fetch_add(1, Ordering::AcqRel);
        }

        debug!(type_id = id, ?bases, recomputed = staged.len(), "bases reassigned");
        Ok(())
    }

    /// 네임스페이스 변경 없이 슬롯 캐시만 무효화
    pub fn invalidate(&self, id: TypeId) -> VmResult<()> {
        let ty = self.require(id)?;
        {
            let _state = ty.state.write();
            ty.generation.fetch_add(1, Ordering::AcqRel);
        }
        let bumped = self.bump_descendants(id);
        debug!(type_id = id, subclasses = bumped, "slot cache invalidated");
        Ok(())
    }

    fn bump_descendants(&self, id: TypeId) -> usize {
        let descendants = self.descendants(id);
        for &sub in &descendants {
            if let Some(ty) = self.get(sub) {
                let _state = ty.state.write();
                ty.generation.fetch_add(1, Ordering::AcqRel);
            }
        }
        descendants.len()
    }

    /// 모든 (간접) 하위 클래스, 너비 우선
    fn descendants(&self, id: TypeId) -> Vec<TypeId> {
        let mut seen = HashSet::new();
        let mut order = Vec::new();
        let mut queue = VecDeque::from([id]);
        while let Some(t) = queue.pop_front() {
            let Some(ty) = self.get(t) else { continue };
            for &sub in ty.subclasses.read().iter() {
                if seen.insert(sub) {
                    order.push(sub);
                    queue.push_back(sub);
                }
            }
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> TypeRegistry {
        TypeRegistry::new(256)
    }

    fn ns(names: &[&str]) -> HashMap<String, Value> {
        names
            .iter()
            .map(|n| (n.to_string(), Value::Int(0)))
            .collect()
    }

    #[test]
    fn test_builtin_types_registered_in_order() {
        let reg = registry();
        assert_eq!(reg.len(), TYPE_USER_START as usize);
        assert_eq!(reg.name_of(TYPE_OBJECT), "object");
        assert_eq!(reg.name_of(TYPE_NOT_IMPLEMENTED), "NotImplementedType");
        assert_eq!(reg.name_of(TYPE_BOOL), "bool");
        assert_eq!(reg.name_of(TYPE_ITERATOR), "iterator");
    }

    #[test]
    fn test_bool_is_int_subtype() {
        let reg = registry();
        let bool_ty = reg.get(TYPE_BOOL).unwrap();
        assert_eq!(*bool_ty.mro(), vec![TYPE_BOOL, TYPE_INT, TYPE_OBJECT]);
        assert!(reg.is_subtype(TYPE_BOOL, TYPE_INT));
        assert!(!reg.is_subtype(TYPE_INT, TYPE_BOOL));
    }

    #[test]
    fn test_create_type_defaults_to_object_base() {
        let reg = registry();
        let id = reg.create_type("A", &[], HashMap::new()).unwrap();
        assert_eq!(id, TYPE_USER_START);
        assert_eq!(*reg.get(id).unwrap().mro(), vec![id, TYPE_OBJECT]);
    }

    #[test]
    fn test_diamond_mro() {
        let reg = registry();
        let a = reg.create_type("A", &[], HashMap::new()).unwrap();
        let b = reg.create_type("B", &[a], HashMap::new()).unwrap();
        let c = reg.create_type("C", &[a], HashMap::new()).unwrap();
        let d = reg.create_type("D", &[b, c], HashMap::new()).unwrap();
        assert_eq!(*reg.get(d).unwrap().mro(), vec![d, b, c, a, TYPE_OBJECT]);
    }

    #[test]
    fn test_mro_conflict_message() {
        let reg = registry();
        let x = reg.create_type("X", &[], HashMap::new()).unwrap();
        let y = reg.create_type("Y", &[], HashMap::new()).unwrap();
        let a = reg.create_type("A", &[x, y], HashMap::new()).unwrap();
        let b = reg.create_type("B", &[y, x], HashMap::new()).unwrap();
        let e = reg.create_type("C", &[a, b], HashMap::new()).unwrap_err();
        assert_eq!(e.kind, VmErrorKind::MroConflict);
        assert_eq!(
            e.message,
            "Cannot create a consistent method resolution order (MRO) for bases X, Y"
        );
        // 실패한 생성은 타입을 남기지 않음
        assert_eq!(reg.len(), TYPE_USER_START as usize + 4);
    }

    #[test]
    fn test_duplicate_base() {
        let reg = registry();
        let a = reg.create_type("A", &[], HashMap::new()).unwrap();
        let e = reg.create_type("B", &[a, a], HashMap::new()).unwrap_err();
        assert_eq!(e.message, "duplicate base class A");
    }

    #[test]
    fn test_builtin_final_types() {
        let reg = registry();
        let e = reg.create_type("B", &[TYPE_BOOL], HashMap::new()).unwrap_err();
        assert_eq!(e.message, "type 'bool' is not an acceptable base type");
        assert!(reg.create_type("MyInt", &[TYPE_INT], HashMap::new()).is_ok());
    }

    #[test]
    fn test_max_mro_depth() {
        let reg = TypeRegistry::new(3);
        let a = reg.create_type("A", &[], HashMap::new()).unwrap();
        let b = reg.create_type("B", &[a], HashMap::new()).unwrap();
        let e = reg.create_type("C", &[b], HashMap::new()).unwrap_err();
        assert_eq!(e.kind, VmErrorKind::MroConflict);
    }

    #[test]
    fn test_eq_without_hash_blocks_hash() {
        let reg = registry();
        let a = reg.create_type("A", &[], ns(&["__eq__"])).unwrap();
        assert_eq!(reg.get(a).unwrap().own_attr("__hash__"), Some(Value::None));
        let b = reg.create_type("B", &[], ns(&["__eq__", "__hash__"])).unwrap();
        assert_eq!(reg.get(b).unwrap().own_attr("__hash__"), Some(Value::Int(0)));
    }

    #[test]
    fn test_immutable_builtin() {
        let reg = registry();
        let e = reg.set_type_attr(TYPE_INT, "__add__", Value::None).unwrap_err();
        assert_eq!(
            e.message,
            "cannot set '__add__' attribute of immutable type 'int'"
        );
    }

    #[test]
    fn test_dunder_write_bumps_subclasses() {
        let reg = registry();
        let a = reg.create_type("A", &[], HashMap::new()).unwrap();
        let b = reg.create_type("B", &[a], HashMap::new()).unwrap();
        let c = reg.create_type("C", &[b], HashMap::new()).unwrap();
        let before: Vec<u64> = [a, b, c].iter().map(|&t| reg.get(t).unwrap().generation()).collect();

        reg.set_type_attr(a, "__neg__", Value::Int(1)).unwrap();
        for (i, &t) in [a, b, c].iter().enumerate() {
            assert!(reg.get(t).unwrap().generation() > before[i]);
        }
    }

    #[test]
    fn test_plain_attribute_write_keeps_generation() {
        let reg = registry();
        let a = reg.create_type("A", &[], HashMap::new()).unwrap();
        let g = reg.get(a).unwrap().generation();
        reg.set_type_attr(a, "counter", Value::Int(1)).unwrap();
        assert_eq!(reg.get(a).unwrap().generation(), g);
        assert_eq!(reg.lookup(a, "counter"), Some(Value::Int(1)));
    }

    #[test]
    fn test_del_missing_attr() {
        let reg = registry();
        let a = reg.create_type("A", &[], HashMap::new()).unwrap();
        let e = reg.del_type_attr(a, "__neg__").unwrap_err();
        assert_eq!(e.message, "type object 'A' has no attribute '__neg__'");
    }

    #[test]
    fn test_lookup_follows_mro() {
        let reg = registry();
        let a = reg.create_type("A", &[], ns(&["x"])).unwrap();
        let b = reg.create_type("B", &[a], HashMap::new()).unwrap();
        assert_eq!(reg.lookup(b, "x"), Some(Value::Int(0)));
        assert_eq!(reg.lookup(b, "y"), None);
    }

    #[test]
    fn test_set_bases_recomputes_descendants() {
        let reg = registry();
        let a = reg.create_type("A", &[], HashMap::new()).unwrap();
        let b = reg.create_type("B", &[], HashMap::new()).unwrap();
        let c = reg.create_type("C", &[a], HashMap::new()).unwrap();
        let d = reg.create_type("D", &[c], HashMap::new()).unwrap();

        reg.set_bases(c, &[b]).unwrap();
        assert_eq!(*reg.get(c).unwrap().mro(), vec![c, b, TYPE_OBJECT]);
        assert_eq!(*reg.get(d).unwrap().mro(), vec![d, c, b, TYPE_OBJECT]);
        assert!(!reg.is_subtype(d, a));
        assert!(reg.is_subtype(d, b));
    }

    #[test]
    fn test_set_bases_rejects_cycle() {
        let reg = registry();
        let a = reg.create_type("A", &[], HashMap::new()).unwrap();
        let b = reg.create_type("B", &[a], HashMap::new()).unwrap();
        let e = reg.set_bases(a, &[b]).unwrap_err();
        assert_eq!(e.message, "a __bases__ item causes an inheritance cycle");
        assert_eq!(*reg.get(a).unwrap().mro(), vec![a, TYPE_OBJECT]);
    }

    #[test]
    fn test_set_bases_empty() {
        let reg = registry();
        let a = reg.create_type("A", &[], HashMap::new()).unwrap();
        let e = reg.set_bases(a, &[]).unwrap_err();
        assert_eq!(e.message, "can only assign non-empty tuple to A.__bases__, not ()");
    }
}
