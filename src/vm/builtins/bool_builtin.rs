use super::super::machine::{Vm, VmResult};
use super::super::type_def::{TYPE_BOOL, TYPE_INT, TypeDef, TypeFlags};
use super::super::utils::make_string;
use super::super::value::Value;
use super::{BuiltinId, int};

/// bool 타입 정의 등록
///
/// `int`의 서브클래스지만 더 이상 상속할 수 없음
pub fn register_type() -> TypeDef {
    TypeDef::new(TYPE_BOOL, "bool", TypeFlags::IMMUTABLE)
        .with_bases(&[TYPE_INT])
        .with_builtins(&[
            BuiltinId::BoolAnd,
            BuiltinId::BoolXor,
            BuiltinId::BoolOr,
            BuiltinId::BoolRepr,
        ])
}

// ========== 비트 연산 ==========
// 둘 다 bool이면 bool, 아니면 int 규칙

pub fn and(vm: &Vm, a: &Value, b: &Value) -> VmResult<Value> {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => Ok(Value::Bool(*x & *y)),
        _ => int::and(vm, a, b),
    }
}

pub fn xor(vm: &Vm, a: &Value, b: &Value) -> VmResult<Value> {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => Ok(Value::Bool(*x ^ *y)),
        _ => int::xor(vm, a, b),
    }
}

pub fn or(vm: &Vm, a: &Value, b: &Value) -> VmResult<Value> {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => Ok(Value::Bool(*x | *y)),
        _ => int::or(vm, a, b),
    }
}

pub fn repr(vm: &Vm, v: &Value) -> VmResult<Value> {
    match v {
        Value::Bool(true) => Ok(make_string("True")),
        Value::Bool(false) => Ok(make_string("False")),
        _ => int::repr(vm, v),
    }
}
