use std::sync::atomic::Ordering;

use super::super::machine::{Vm, VmErrorKind, VmResult, err};
use super::super::type_def::{TYPE_ITERATOR, TYPE_OBJECT, TypeDef, TypeFlags};
use super::super::value::{ObjectData, Value};
use super::BuiltinId;

/// 시퀀스 스냅샷 위를 도는 이터레이터 타입
pub fn register_type() -> TypeDef {
    TypeDef::new(TYPE_ITERATOR, "iterator", TypeFlags::IMMUTABLE)
        .with_bases(&[TYPE_OBJECT])
        .with_builtins(&[BuiltinId::IteratorIter, BuiltinId::IteratorNext])
}

pub fn iter(_vm: &Vm, it: &Value) -> VmResult<Value> {
    Ok(it.clone())
}

/// 소진되면 `StopIteration`
pub fn next(vm: &Vm, it: &Value) -> VmResult<Value> {
    let Some(ObjectData::SeqIterator { items, position }) = it.as_object().map(|o| &o.data) else {
        return Err(err(
            VmErrorKind::TypeError,
            format!("'{}' object is not an iterator", vm.type_name(it)),
        ));
    };
    let i = position.fetch_add(1, Ordering::AcqRel);
    match items.get(i) {
        Some(v) => Ok(v.clone()),
        None => {
            position.store(items.len(), Ordering::Release);
            Err(err(VmErrorKind::StopIteration, ""))
        }
    }
}
