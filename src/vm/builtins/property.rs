//! `property`: getter/setter를 가진 data descriptor

use super::super::machine::{Vm, VmError, VmErrorKind, VmResult, err};
use super::super::type_def::{TYPE_OBJECT, TYPE_PROPERTY, TypeDef, TypeFlags, TypeId};
use super::super::value::{ObjectData, Value};
use super::BuiltinId;

pub fn register_type() -> TypeDef {
    TypeDef::new(TYPE_PROPERTY, "property", TypeFlags::IMMUTABLE)
        .with_bases(&[TYPE_OBJECT])
        .with_builtins(&[BuiltinId::PropertyDescrGet, BuiltinId::PropertyDescrSet])
}

fn accessors<'a>(vm: &Vm, prop: &'a Value) -> VmResult<(Option<&'a Value>, Option<&'a Value>)> {
    match prop.as_object().map(|o| &o.data) {
        Some(ObjectData::Property { fget, fset }) => Ok((fget.as_ref(), fset.as_ref())),
        _ => Err(err(
            VmErrorKind::TypeError,
            format!(
                "descriptor requires a 'property' object but received '{}'",
                vm.type_name(prop)
            ),
        )),
    }
}

fn missing(vm: &Vm, obj: &Value, what: &str) -> VmError {
    let type_name = vm.type_name(obj);
    err(
        VmErrorKind::AttributeMissing {
            type_name: type_name.clone(),
            attr: what.to_string(),
        },
        format!("property of '{}' object has no {}", type_name, what),
    )
}

pub fn descr_get(vm: &Vm, prop: &Value, obj: Option<&Value>, _owner: TypeId) -> VmResult<Value> {
    let (fget, _) = accessors(vm, prop)?;
    let Some(obj) = obj else {
        return Ok(prop.clone());
    };
    match fget {
        Some(getter) => vm.call(getter, std::slice::from_ref(obj)),
        None => Err(missing(vm, obj, "getter")),
    }
}

/// `value`가 `None`이면 삭제 요청
pub fn descr_set(vm: &Vm, prop: &Value, obj: &Value, value: Option<&Value>) -> VmResult<()> {
    let (_, fset) = accessors(vm, prop)?;
    let Some(value) = value else {
        return Err(missing(vm, obj, "deleter"));
    };
    match fset {
        Some(setter) => vm.call(setter, &[obj.clone(), value.clone()]).map(|_| ()),
        None => Err(missing(vm, obj, "setter")),
    }
}
