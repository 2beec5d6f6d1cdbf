//! `type`: 타입 객체의 속성 접근, 인스턴스 생성(`Cls(...)`), repr

use std::sync::Arc;

use super::super::machine::{Vm, VmErrorKind, VmResult, err};
use super::super::type_def::{
    TYPE_BOOL, TYPE_FLOAT, TYPE_INT, TYPE_OBJECT, TYPE_PROPERTY, TYPE_STR, TYPE_TUPLE, TYPE_TYPE,
    TypeDef, TypeFlags, TypeId,
};
use super::super::utils::{as_str, as_type, check_arity, make_property, make_string, make_tuple};
use super::super::value::{Object, ObjectData, Value};
use super::BuiltinId;

pub fn register_type() -> TypeDef {
    TypeDef::new(TYPE_TYPE, "type", TypeFlags::IMMUTABLE)
        .with_bases(&[TYPE_OBJECT])
        .with_builtins(&[
            BuiltinId::TypeGetAttr,
            BuiltinId::TypeSetAttr,
            BuiltinId::TypeCall,
            BuiltinId::TypeRepr,
        ])
}

fn expect_type(vm: &Vm, v: &Value) -> VmResult<TypeId> {
    as_type(v).ok_or_else(|| {
        err(
            VmErrorKind::TypeError,
            format!("descriptor requires a 'type' object but received '{}'", vm.type_name(v)),
        )
    })
}

pub fn getattr(vm: &Vm, cls: &Value, name: &str) -> VmResult<Value> {
    let id = expect_type(vm, cls)?;
    let ty = vm.types.require(id)?;

    match name {
        "__name__" => return Ok(make_string(ty.name.clone())),
        "__mro__" => {
            let mro = ty.mro();
            let items = mro
                .iter()
                .map(|&t| vm.type_object(t))
                .collect::<VmResult<Vec<_>>>()?;
            return Ok(make_tuple(items));
        }
        "__bases__" => {
            let items = ty
                .bases()
                .into_iter()
                .map(|t| vm.type_object(t))
                .collect::<VmResult<Vec<_>>>()?;
            return Ok(make_tuple(items));
        }
        _ => {}
    }

    match vm.types.lookup(id, name) {
        // 클래스에서 꺼낸 함수는 바인딩되지 않은 채로 돌려줌
        Some(attr) => vm.descr_get(&attr, None, id),
        None => Err(err(
            VmErrorKind::AttributeMissing {
                type_name: ty.name.clone(),
                attr: name.to_string(),
            },
            format!("type object '{}' has no attribute '{}'", ty.name, name),
        )),
    }
}

/// `Cls.attr = value` / `del Cls.attr`: 특수 메서드 이름이면 슬롯 캐시가 무효화됨
pub fn setattr(vm: &Vm, cls: &Value, name: &str, value: Option<&Value>) -> VmResult<()> {
    let id = expect_type(vm, cls)?;
    match value {
        Some(value) => vm.set_type_attr(id, name, value.clone()),
        None => vm.del_type_attr(id, name),
    }
}

/// `Cls(*args)`
pub fn call(vm: &Vm, cls: &Value, args: &[Value]) -> VmResult<Value> {
    let id = expect_type(vm, cls)?;
    match id {
        TYPE_TYPE => {
            check_arity("type", args, 1)?;
            vm.type_object(args[0].type_id())
        }
        TYPE_OBJECT => {
            check_arity("object", args, 0)?;
            Ok(Value::Object(Arc::new(Object::new(TYPE_OBJECT, ObjectData::Instance))))
        }
        TYPE_INT => match args {
            [] => Ok(Value::Int(0)),
            [x] => Ok(Value::Int(int_from(vm, x)?)),
            _ => check_arity("int", args, 1).map(|_| Value::None),
        },
        TYPE_FLOAT => match args {
            [] => Ok(Value::Float(0.0)),
            [x] => Ok(Value::Float(float_from(vm, x)?)),
            _ => check_arity("float", args, 1).map(|_| Value::None),
        },
        TYPE_BOOL => match args {
            [] => Ok(Value::Bool(false)),
            [x] => Ok(Value::Bool(vm.truthy(x)?)),
            _ => check_arity("bool", args, 1).map(|_| Value::None),
        },
        TYPE_STR => match args {
            [] => Ok(make_string("")),
            [x] if as_str(x).is_some() => Ok(x.clone()),
            [x] => Ok(make_string(vm.repr(x)?)),
            _ => check_arity("str", args, 1).map(|_| Value::None),
        },
        TYPE_TUPLE => match args {
            [] => Ok(make_tuple(Vec::new())),
            [x] => Ok(make_tuple(vm.collect_iterable(x)?)),
            _ => check_arity("tuple", args, 1).map(|_| Value::None),
        },
        TYPE_PROPERTY => {
            if args.len() > 2 {
                return check_arity("property", args, 2).map(|_| Value::None);
            }
            let arg = |i: usize| args.get(i).filter(|v| !v.is_none()).cloned();
            Ok(make_property(arg(0), arg(1)))
        }
        _ => instantiate(vm, id, args),
    }
}

fn int_from(vm: &Vm, x: &Value) -> VmResult<i64> {
    if let Some(s) = as_str(x) {
        return s.trim().parse::<i64>().map_err(|_| {
            err(
                VmErrorKind::ValueError,
                format!("invalid literal for int() with base 10: '{}'", s),
            )
        });
    }
    vm.int_value(x)
}

fn float_from(vm: &Vm, x: &Value) -> VmResult<f64> {
    if let Some(s) = as_str(x) {
        return s.trim().parse::<f64>().map_err(|_| {
            err(
                VmErrorKind::ValueError,
                format!("could not convert string to float: '{}'", s),
            )
        });
    }
    vm.float_value(x)
}

/// 사용자 클래스 인스턴스 생성 후 `__init__` 호출
fn instantiate(vm: &Vm, id: TypeId, args: &[Value]) -> VmResult<Value> {
    let ty = vm.types.require(id)?;
    if !ty.flags.contains(TypeFlags::HEAPTYPE) {
        return Err(err(
            VmErrorKind::TypeError,
            format!("cannot create '{}' instances", ty.name),
        ));
    }

    let mro = ty.mro();
    let data = if mro.contains(&TYPE_INT) {
        ObjectData::Int(match args.first() {
            Some(x) => int_from(vm, x)?,
            None => 0,
        })
    } else if mro.contains(&TYPE_FLOAT) {
        ObjectData::Float(match args.first() {
            Some(x) => float_from(vm, x)?,
            None => 0.0,
        })
    } else {
        ObjectData::Instance
    };
    let numeric = !matches!(data, ObjectData::Instance);
    let instance = Value::Object(Arc::new(Object::new_with_attrs(id, data)));

    match vm.types.lookup(id, "__init__") {
        Some(init) if !init.is_none() => {
            let result = vm.call_special(&init, &instance, args)?;
            if !result.is_none() {
                return Err(err(
                    VmErrorKind::TypeError,
                    format!(
                        "__init__() should return None, not '{}'",
                        vm.type_name(&result)
                    ),
                ));
            }
        }
        _ if !args.is_empty() && !numeric => {
            return Err(err(
                VmErrorKind::TypeError,
                format!("{}() takes no arguments", ty.name),
            ));
        }
        _ => {}
    }
    Ok(instance)
}

pub fn repr(vm: &Vm, cls: &Value) -> VmResult<Value> {
    let id = expect_type(vm, cls)?;
    Ok(make_string(format!("<class '{}'>", vm.types.name_of(id))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_of_value() {
        let vm = Vm::new();
        let int_cls = vm.type_object(TYPE_INT).unwrap();
        let result = vm.call(&vm.type_object(TYPE_TYPE).unwrap(), &[Value::Int(3)]).unwrap();
        assert!(result.is(&int_cls));
    }

    #[test]
    fn test_builtin_constructors() {
        let vm = Vm::new();
        let int_cls = vm.type_object(TYPE_INT).unwrap();
        assert_eq!(vm.call(&int_cls, &[make_string(" 42 ")]).unwrap(), Value::Int(42));
        assert_eq!(vm.call(&int_cls, &[Value::Float(3.9)]).unwrap(), Value::Int(3));
        let float_cls = vm.type_object(TYPE_FLOAT).unwrap();
        assert_eq!(vm.call(&float_cls, &[Value::Int(2)]).unwrap(), Value::Float(2.0));
        let bool_cls = vm.type_object(TYPE_BOOL).unwrap();
        assert_eq!(vm.call(&bool_cls, &[make_string("")]).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_invalid_int_literal() {
        let vm = Vm::new();
        let int_cls = vm.type_object(TYPE_INT).unwrap();
        let e = vm.call(&int_cls, &[make_string("abc")]).unwrap_err();
        assert_eq!(e.kind, VmErrorKind::ValueError);
        assert!(e.message.contains("abc"));
    }

    #[test]
    fn test_cannot_instantiate_builtin_function_type() {
        let vm = Vm::new();
        let cls = vm.type_object(super::super::super::type_def::TYPE_FUNCTION).unwrap();
        let e = vm.call(&cls, &[]).unwrap_err();
        assert_eq!(e.message, "cannot create 'function' instances");
    }

    #[test]
    fn test_user_class_without_init_rejects_args() {
        let vm = Vm::new();
        let id = vm.new_type("Point", &[], Default::default()).unwrap();
        let cls = vm.type_object(id).unwrap();
        let e = vm.call(&cls, &[Value::Int(1)]).unwrap_err();
        assert_eq!(e.message, "Point() takes no arguments");
    }

    #[test]
    fn test_class_repr_and_name() {
        let vm = Vm::new();
        let cls = vm.type_object(TYPE_INT).unwrap();
        assert_eq!(vm.repr(&cls).unwrap(), "<class 'int'>");
        let name = vm.get_attr(&cls, "__name__").unwrap();
        assert_eq!(name, make_string("int"));
    }
}
