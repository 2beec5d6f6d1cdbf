//! `object`: 모든 타입의 최상위 기반
//!
//! 일반 속성 조회/대입, 동일성 기반 해시와 비교, 기본 repr을 제공합니다.

use std::sync::Arc;

use super::super::machine::{Vm, VmResult};
use super::super::slot::{CompareOp, SlotKind};
use super::super::type_def::{TYPE_OBJECT, TypeDef, TypeFlags};
use super::super::utils::make_string;
use super::super::value::Value;
use super::BuiltinId;

pub fn register_type() -> TypeDef {
    TypeDef::new(TYPE_OBJECT, "object", TypeFlags::IMMUTABLE | TypeFlags::BASETYPE).with_builtins(&[
        BuiltinId::ObjectGetAttr,
        BuiltinId::ObjectSetAttr,
        BuiltinId::ObjectHash,
        BuiltinId::ObjectRichCompare,
        BuiltinId::ObjectRepr,
    ])
}

/// 일반 속성 조회
///
/// 1. 타입의 data descriptor (`__set__`을 가진 것)
/// 2. 인스턴스 `__dict__`
/// 3. 타입 속성 (non-data descriptor면 바인딩)
pub fn getattr(vm: &Vm, obj: &Value, name: &str) -> VmResult<Value> {
    let owner = obj.type_id();
    let class_attr = vm.types.lookup(owner, name);

    if let Some(descr) = &class_attr
        && vm.is_data_descriptor(descr)?
    {
        return vm.descr_get(descr, Some(obj), owner);
    }

    if let Value::Object(o) = obj
        && let Some(value) = o.get_attr(name)
    {
        return Ok(value);
    }

    match class_attr {
        Some(attr) => vm.descr_get(&attr, Some(obj), owner),
        None => Err(vm.attribute_missing(obj, name)),
    }
}

/// 일반 속성 대입/삭제 (`value`가 `None`이면 삭제)
pub fn setattr(vm: &Vm, obj: &Value, name: &str, value: Option<&Value>) -> VmResult<()> {
    if let Some(descr) = vm.types.lookup(obj.type_id(), name)
        && vm.has_slot(&descr, SlotKind::DescrSet)?
    {
        return vm.descr_set(&descr, obj, value);
    }

    let Value::Object(o) = obj else {
        return Err(vm.attribute_missing(obj, name));
    };
    if o.attributes.is_none() {
        return Err(vm.attribute_missing(obj, name));
    }
    match value {
        Some(value) => {
            o.set_attr(name, value.clone());
            Ok(())
        }
        None => match o.del_attr(name) {
            Some(_) => Ok(()),
            None => Err(vm.attribute_missing(obj, name)),
        },
    }
}

/// 동일성 기반 해시
pub fn hash(_vm: &Vm, obj: &Value) -> VmResult<Value> {
    let h = match obj {
        Value::Object(o) => (Arc::as_ptr(o) as usize >> 4) as i64,
        Value::None => 0x5f3759df,
        Value::NotImplemented => 0x2545f491,
        Value::Int(i) => *i,
        Value::Bool(b) => *b as i64,
        Value::Float(f) => f.to_bits() as i64,
    };
    Ok(Value::Int(h))
}

/// `==`는 동일성, `!=`는 타입의 `__eq__` 결과를 뒤집음, 순서 비교는 미지원
pub fn rich_compare(vm: &Vm, a: &Value, b: &Value, op: CompareOp) -> VmResult<Value> {
    match op {
        CompareOp::Eq => Ok(if a.is(b) {
            Value::Bool(true)
        } else {
            Value::NotImplemented
        }),
        CompareOp::Ne => {
            let target = vm.slot_for(a, SlotKind::RichCompare)?;
            let eq = vm.invoke_compare(&target, CompareOp::Eq, a, b)?;
            if eq.is_not_implemented() {
                return Ok(eq);
            }
            Ok(Value::Bool(!vm.truthy(&eq)?))
        }
        _ => Ok(Value::NotImplemented),
    }
}

pub fn repr(vm: &Vm, obj: &Value) -> VmResult<Value> {
    Ok(make_string(format!("<{} object>", vm.type_name(obj))))
}
