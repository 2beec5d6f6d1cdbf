//! `function`과 바운드 `method`
//!
//! 클래스 속성으로 저장된 함수는 인스턴스를 통해 조회될 때 `__get__`으로
//! 수신자와 묶여 바운드 메서드가 됩니다.

use super::super::machine::{Vm, VmErrorKind, VmResult, err};
use super::super::type_def::{TYPE_FUNCTION, TYPE_METHOD, TYPE_OBJECT, TypeDef, TypeFlags};
use super::super::utils::{make_bound_method, make_string};
use super::super::value::{ObjectData, Value};
use super::BuiltinId;

pub fn register_type() -> TypeDef {
    TypeDef::new(TYPE_FUNCTION, "function", TypeFlags::IMMUTABLE)
        .with_bases(&[TYPE_OBJECT])
        .with_builtins(&[
            BuiltinId::FunctionDescrGet,
            BuiltinId::FunctionCall,
            BuiltinId::FunctionRepr,
        ])
}

pub fn register_method_type() -> TypeDef {
    TypeDef::new(TYPE_METHOD, "method", TypeFlags::IMMUTABLE)
        .with_bases(&[TYPE_OBJECT])
        .with_builtins(&[BuiltinId::MethodCall, BuiltinId::MethodRepr])
}

/// 클래스에서 꺼내면 함수 그대로, 인스턴스에서 꺼내면 바운드 메서드
pub fn descr_get(func: &Value, obj: Option<&Value>) -> Value {
    match obj {
        None | Some(Value::None) => func.clone(),
        Some(obj) => make_bound_method(func.clone(), obj.clone()),
    }
}

pub fn call(vm: &Vm, callee: &Value, args: &[Value]) -> VmResult<Value> {
    match callee.as_object().map(|o| &o.data) {
        Some(ObjectData::Function(func)) => func.call(vm, args),
        _ => Err(err(
            VmErrorKind::TypeError,
            format!("'{}' object is not a function", vm.type_name(callee)),
        )),
    }
}

pub fn repr(vm: &Vm, v: &Value) -> VmResult<Value> {
    match v.as_object().map(|o| &o.data) {
        Some(ObjectData::Function(func)) => Ok(make_string(format!("<function {}>", func.name))),
        _ => Ok(make_string(format!("<{} object>", vm.type_name(v)))),
    }
}

/// 수신자를 첫 인자로 붙여 원래 함수 호출
pub fn method_call(vm: &Vm, callee: &Value, args: &[Value]) -> VmResult<Value> {
    let Some(ObjectData::BoundMethod { func, receiver }) = callee.as_object().map(|o| &o.data)
    else {
        return Err(err(
            VmErrorKind::TypeError,
            format!("'{}' object is not a bound method", vm.type_name(callee)),
        ));
    };
    let mut full = Vec::with_capacity(args.len() + 1);
    full.push(receiver.clone());
    full.extend_from_slice(args);
    vm.call(func, &full)
}

pub fn method_repr(vm: &Vm, v: &Value) -> VmResult<Value> {
    let Some(ObjectData::BoundMethod { func, receiver }) = v.as_object().map(|o| &o.data) else {
        return Ok(make_string(format!("<{} object>", vm.type_name(v))));
    };
    let name = match func.as_object().map(|o| &o.data) {
        Some(ObjectData::Function(f)) => f.name.clone(),
        _ => "?".to_string(),
    };
    Ok(make_string(format!(
        "<bound method {} of {}>",
        name,
        vm.repr(receiver)?
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::utils::make_function;

    #[test]
    fn test_descr_get_binds_receiver() {
        let vm = Vm::new();
        let f = make_function("first", |_vm, args| Ok(args[0].clone()));
        assert!(descr_get(&f, None).is(&f));

        let bound = descr_get(&f, Some(&Value::Int(7)));
        assert_eq!(bound.type_id(), TYPE_METHOD);
        assert_eq!(vm.call(&bound, &[]).unwrap(), Value::Int(7));
    }

    #[test]
    fn test_function_repr() {
        let vm = Vm::new();
        let f = make_function("area", |_vm, _args| Ok(Value::None));
        assert_eq!(vm.repr(&f).unwrap(), "<function area>");
    }
}
