//! # 설계 원칙
//!
//! 1. **모든 것은 객체다**: 문자열, 튜플, 함수, 클래스 모두 `Object`
//! 2. **타입 테이블 기반**: 각 Object는 `type_id`로 타입 레지스트리를 참조
//! 3. **속성 지연 할당**: 인스턴스 딕셔너리는 필요한 객체만 가짐
//! 4. **스레드 공유**: 여러 스레드가 같은 값을 동시에 디스패치할 수 있도록 `Arc` 사용

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;

use parking_lot::RwLock;

use super::machine::{Vm, VmResult};
use super::type_def::{
    TYPE_BOOL, TYPE_FLOAT, TYPE_INT, TYPE_NONE, TYPE_NOT_IMPLEMENTED, TypeId,
};

#[derive(Debug, Clone)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    None,
    /// 슬롯이 "이 연산은 내가 처리하지 않는다"고 거절할 때 돌려주는 값
    NotImplemented,
    Object(Arc<Object>),
}

impl Value {
    /// 값의 런타임 타입 (부작용 없음)
    pub fn type_id(&self) -> TypeId {
        match self {
            Value::Int(_) => TYPE_INT,
            Value::Float(_) => TYPE_FLOAT,
            Value::Bool(_) => TYPE_BOOL,
            Value::None => TYPE_NONE,
            Value::NotImplemented => TYPE_NOT_IMPLEMENTED,
            Value::Object(obj) => obj.type_id,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn is_not_implemented(&self) -> bool {
        matches!(self, Value::NotImplemented)
    }

    /// Python `is` 연산자
    pub fn is(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::None, Value::None) => true,
            (Value::NotImplemented, Value::NotImplemented) => true,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn as_object(&self) -> Option<&Arc<Object>> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }
}

/// Rust 쪽 구조적 비교 (테스트용)
///
/// 언어 수준의 `==`는 `Vm::rich_compare`를 거칩니다.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::None, Value::None) => true,
            (Value::NotImplemented, Value::NotImplemented) => true,
            (Value::Object(a), Value::Object(b)) => {
                if Arc::ptr_eq(a, b) {
                    return true;
                }
                match (&a.data, &b.data) {
                    (ObjectData::String(x), ObjectData::String(y)) => x == y,
                    (ObjectData::Tuple(x), ObjectData::Tuple(y)) => x == y,
                    (ObjectData::Type(x), ObjectData::Type(y)) => x == y,
                    _ => false,
                }
            }
            _ => false,
        }
    }
}

/// 네이티브 함수 본문
///
/// 사용자 정의 함수(`def __add__(self, other): ...`)도 호스트가 이 형태로 넘겨줍니다.
pub type NativeFn = dyn Fn(&Vm, &[Value]) -> VmResult<Value> + Send + Sync;

#[derive(Clone)]
pub struct Function {
    pub name: String,
    pub body: Arc<NativeFn>,
}

impl Function {
    pub fn call(&self, vm: &Vm, args: &[Value]) -> VmResult<Value> {
        (self.body)(vm, args)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<function {}>", self.name)
    }
}

/// 통일된 런타임 객체
///
/// Python의 PyObject에 해당합니다. 모든 heap-allocated 값은 이 구조체로 표현됩니다.
#[derive(Debug)]
pub struct Object {
    /// 타입 ID (타입 레지스트리의 인덱스)
    pub type_id: TypeId,

    /// 객체의 실제 데이터
    pub data: ObjectData,

    /// 인스턴스 속성 (__dict__)
    pub attributes: Option<RwLock<HashMap<String, Value>>>,
}

impl Object {
    /// 새 객체 생성 (속성 없이)
    pub fn new(type_id: TypeId, data: ObjectData) -> Self {
        Self {
            type_id,
            data,
            attributes: None,
        }
    }

    /// 속성을 가질 수 있는 객체 생성
    pub fn new_with_attrs(type_id: TypeId, data: ObjectData) -> Self {
        Self {
            type_id,
            data,
            attributes: Some(RwLock::new(HashMap::new())),
        }
    }

    pub fn get_attr(&self, name: &str) -> Option<Value> {
        self.attributes
            .as_ref()
            .and_then(|attrs| attrs.read().get(name).cloned())
    }

    /// `__dict__`가 없는 객체면 `false`
    pub fn set_attr(&self, name: impl Into<String>, value: Value) -> bool {
        match &self.attributes {
            Some(attrs) => {
                attrs.write().insert(name.into(), value);
                true
            }
            None => false,
        }
    }

    pub fn del_attr(&self, name: &str) -> Option<Value> {
        self.attributes
            .as_ref()
            .and_then(|attrs| attrs.write().remove(name))
    }
}

#[derive(Debug)]
pub enum ObjectData {
    String(String),

    /// int 서브클래스 인스턴스의 값
    Int(i64),

    /// float 서브클래스 인스턴스의 값
    Float(f64),

    Tuple(Vec<Value>),

    Function(Function),

    /// 인스턴스에 묶인 함수
    BoundMethod { func: Value, receiver: Value },

    Property {
        fget: Option<Value>,
        fset: Option<Value>,
    },

    /// 타입 객체 (`int`, 사용자 클래스 등)
    Type(TypeId),

    /// 사용자 클래스의 일반 인스턴스
    Instance,

    /// 시퀀스 반복자 상태
    SeqIterator {
        items: Vec<Value>,
        position: AtomicUsize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::type_def::{TYPE_OBJECT, TYPE_STR};

    #[test]
    fn test_object_creation() {
        let obj = Object::new(TYPE_STR, ObjectData::String("hello".to_string()));
        assert_eq!(obj.type_id, TYPE_STR);
        assert!(matches!(obj.data, ObjectData::String(_)));
        assert!(obj.attributes.is_none());
    }

    #[test]
    fn test_object_with_attributes() {
        let obj = Object::new_with_attrs(TYPE_OBJECT, ObjectData::Instance);
        assert!(obj.set_attr("name", Value::Int(1)));
        assert_eq!(obj.get_attr("name"), Some(Value::Int(1)));
        assert_eq!(obj.del_attr("name"), Some(Value::Int(1)));
        assert_eq!(obj.get_attr("name"), None);
    }

    #[test]
    fn test_object_without_dict_rejects_attributes() {
        let obj = Object::new(TYPE_STR, ObjectData::String("test".to_string()));
        assert!(!obj.set_attr("key", Value::Int(42)));
        assert!(obj.get_attr("key").is_none());
    }

    #[test]
    fn test_identity() {
        let a = Value::Object(Arc::new(Object::new(TYPE_OBJECT, ObjectData::Instance)));
        let b = Value::Object(Arc::new(Object::new(TYPE_OBJECT, ObjectData::Instance)));
        assert!(a.is(&a.clone()));
        assert!(!a.is(&b));
        assert!(Value::None.is(&Value::None));
        assert!(!Value::Int(1).is(&Value::Bool(true)));
    }

    #[test]
    fn test_runtime_type() {
        assert_eq!(Value::Int(1).type_id(), TYPE_INT);
        assert_eq!(Value::Bool(true).type_id(), TYPE_BOOL);
        assert_eq!(Value::NotImplemented.type_id(), TYPE_NOT_IMPLEMENTED);
    }
}
