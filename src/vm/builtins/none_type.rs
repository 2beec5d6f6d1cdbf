use super::super::machine::{Vm, VmResult};
use super::super::type_def::{TYPE_NONE, TYPE_NOT_IMPLEMENTED, TYPE_OBJECT, TypeDef, TypeFlags};
use super::super::utils::make_string;
use super::super::value::Value;
use super::BuiltinId;

pub fn register_type() -> TypeDef {
    TypeDef::new(TYPE_NONE, "NoneType", TypeFlags::IMMUTABLE)
        .with_bases(&[TYPE_OBJECT])
        .with_builtins(&[BuiltinId::NoneBool, BuiltinId::NoneRepr])
}

pub fn register_not_implemented_type() -> TypeDef {
    TypeDef::new(TYPE_NOT_IMPLEMENTED, "NotImplementedType", TypeFlags::IMMUTABLE)
        .with_bases(&[TYPE_OBJECT])
        .with_builtins(&[BuiltinId::NotImplementedRepr])
}

pub fn bool(_v: &Value) -> bool {
    false
}

pub fn repr(_vm: &Vm, _v: &Value) -> VmResult<Value> {
    Ok(make_string("None"))
}

pub fn not_implemented_repr(_vm: &Vm, _v: &Value) -> VmResult<Value> {
    Ok(make_string("NotImplemented"))
}
