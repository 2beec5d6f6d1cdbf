//! VM 유틸리티 함수
//!
//! 값 생성 헬퍼와 builtin 슬롯들이 공통으로 쓰는 타입 변환 함수들을 제공합니다.

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;

use super::machine::{Vm, VmError, VmErrorKind, VmResult, err};
use super::type_def::{
    TYPE_FUNCTION, TYPE_ITERATOR, TYPE_METHOD, TYPE_PROPERTY, TYPE_STR, TYPE_TUPLE,
};
use super::value::{Function, Object, ObjectData, Value};

// ========== 값 생성 ==========

pub fn make_string(s: impl Into<String>) -> Value {
    Value::Object(Arc::new(Object::new(TYPE_STR, ObjectData::String(s.into()))))
}

pub fn make_tuple(items: Vec<Value>) -> Value {
    Value::Object(Arc::new(Object::new(TYPE_TUPLE, ObjectData::Tuple(items))))
}

/// 네이티브 클로저를 `function` 객체로 감싸기
///
/// ```ignore
/// let add = make_function("__add__", |_vm, args| Ok(Value::Int(42)));
/// ```
pub fn make_function<F>(name: impl Into<String>, body: F) -> Value
where
    F: Fn(&Vm, &[Value]) -> VmResult<Value> + Send + Sync + 'static,
{
    let func = Function {
        name: name.into(),
        body: Arc::new(body),
    };
    Value::Object(Arc::new(Object::new(
        TYPE_FUNCTION,
        ObjectData::Function(func),
    )))
}

pub fn make_bound_method(func: Value, receiver: Value) -> Value {
    Value::Object(Arc::new(Object::new(
        TYPE_METHOD,
        ObjectData::BoundMethod { func, receiver },
    )))
}

pub fn make_property(fget: Option<Value>, fset: Option<Value>) -> Value {
    Value::Object(Arc::new(Object::new(
        TYPE_PROPERTY,
        ObjectData::Property { fget, fset },
    )))
}

pub fn make_iterator(items: Vec<Value>) -> Value {
    Value::Object(Arc::new(Object::new(
        TYPE_ITERATOR,
        ObjectData::SeqIterator {
            items,
            position: AtomicUsize::new(0),
        },
    )))
}

// ========== 값 해석 ==========

/// int 슬롯이 받아들이는 값 (`bool`과 int 서브클래스 포함)
pub fn as_int(v: &Value) -> Option<i64> {
    match v {
        Value::Int(i) => Some(*i),
        Value::Bool(b) => Some(*b as i64),
        Value::Object(obj) => match &obj.data {
            ObjectData::Int(i) => Some(*i),
            _ => None,
        },
        _ => None,
    }
}

/// float 슬롯이 받아들이는 값 (int 계열은 암묵적으로 변환)
pub fn as_float(v: &Value) -> Option<f64> {
    match v {
        Value::Float(f) => Some(*f),
        Value::Object(obj) => match &obj.data {
            ObjectData::Float(f) => Some(*f),
            _ => as_int(v).map(|i| i as f64),
        },
        _ => as_int(v).map(|i| i as f64),
    }
}

pub fn as_str(v: &Value) -> Option<&str> {
    match v {
        Value::Object(obj) => match &obj.data {
            ObjectData::String(s) => Some(s.as_str()),
            _ => None,
        },
        _ => None,
    }
}

pub fn as_tuple(v: &Value) -> Option<&[Value]> {
    match v {
        Value::Object(obj) => match &obj.data {
            ObjectData::Tuple(items) => Some(items.as_slice()),
            _ => None,
        },
        _ => None,
    }
}

pub fn as_type(v: &Value) -> Option<super::type_def::TypeId> {
    match v {
        Value::Object(obj) => match &obj.data {
            ObjectData::Type(id) => Some(*id),
            _ => None,
        },
        _ => None,
    }
}

/// 문자열이 아니면 TypeError
pub fn expect_string<'a>(vm: &Vm, v: &'a Value, what: &str) -> VmResult<&'a str> {
    as_str(v).ok_or_else(|| {
        err(
            VmErrorKind::TypeError,
            format!("{} must be str, not '{}'", what, vm.type_name(v)),
        )
    })
}

/// 시퀀스 인덱스 정규화 (음수 인덱스 지원)
pub fn normalize_index(index: isize, len: usize) -> Option<usize> {
    let len = len as isize;
    let idx = if index < 0 { index + len } else { index };
    (0..len).contains(&idx).then_some(idx as usize)
}

/// `seq * count`의 결과 원소 개수. 주소 공간이나 `max_sequence_bytes`를
/// 넘는 요청은 할당 전에 거절
pub fn repeat_len(
    vm: &Vm,
    len: usize,
    count: usize,
    elem_size: usize,
    what: &str,
) -> VmResult<usize> {
    let too_long = || err(VmErrorKind::Overflow, format!("repeated {} is too long", what));
    let total = len.checked_mul(count).ok_or_else(too_long)?;
    let bytes = total
        .checked_mul(elem_size)
        .filter(|b| *b <= isize::MAX as usize)
        .ok_or_else(too_long)?;
    if bytes > vm.config().max_sequence_bytes {
        return Err(out_of_memory(bytes, what));
    }
    Ok(total)
}

pub fn out_of_memory(bytes: usize, what: &str) -> VmError {
    err(
        VmErrorKind::MemoryError,
        format!("cannot allocate {} bytes for repeated {}", bytes, what),
    )
}

/// 인자 개수 검사
pub fn check_arity(name: &str, args: &[Value], expected: usize) -> VmResult<()> {
    if args.len() != expected {
        return Err(err(
            VmErrorKind::TypeError,
            format!(
                "{}() takes exactly {} argument{} ({} given)",
                name,
                expected,
                if expected == 1 { "" } else { "s" },
                args.len()
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_int_accepts_bool() {
        assert_eq!(as_int(&Value::Bool(true)), Some(1));
        assert_eq!(as_int(&Value::Int(-3)), Some(-3));
        assert_eq!(as_int(&Value::Float(1.0)), None);
    }

    #[test]
    fn test_as_float_widens_int() {
        assert_eq!(as_float(&Value::Int(2)), Some(2.0));
        assert_eq!(as_float(&Value::Float(0.5)), Some(0.5));
        assert_eq!(as_float(&make_string("x")), None);
    }

    #[test]
    fn test_normalize_index() {
        assert_eq!(normalize_index(0, 3), Some(0));
        assert_eq!(normalize_index(-1, 3), Some(2));
        assert_eq!(normalize_index(3, 3), None);
        assert_eq!(normalize_index(-4, 3), None);
    }

    #[test]
    fn test_check_arity_message() {
        let e = check_arity("f", &[Value::Int(1)], 2).unwrap_err();
        assert_eq!(e.message, "f() takes exactly 2 arguments (1 given)");
    }
}
