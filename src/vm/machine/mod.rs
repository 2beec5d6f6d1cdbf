// machine 모듈 - 슬롯 디스패치 엔진
//
// 연산자 평가 지점이 호출하는 진입점(`resolve_*`), 프로토콜 연산(len, [], hash, iter ...),
// 그리고 해석된 슬롯을 실제 호출로 바꾸는 브리지를 구현합니다.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::config::VmConfig;
use crate::vm::slot::SlotKind;
use crate::vm::slot_cache::SlotCacheEntry;
use crate::vm::slot_table::SlotTarget;
use crate::vm::type_def::{TypeId, TypeRegistry};
use crate::vm::value::{ObjectData, Value};

// 서브모듈
pub mod inline_cache;
mod method_dispatch;
mod operators;
mod protocols;


pub use inline_cache::{BinaryCallSite, CacheKey, CacheState, CachedPlan};
pub use method_dispatch::Side;
pub use operators::{DispatchContext, DispatchPlan, PlanStep};

// ========== 타입 정의 ==========

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VmErrorKind {
    /// 단일 피연산자 프로토콜에 슬롯이 없음 (`-x`, `len(x)`, `hash(x)` ...)
    UnsupportedOperand { op: &'static str, type_name: String },
    /// 이항/삼항/비교에서 어느 슬롯도 결과를 내지 못함
    UnsupportedOperandTypes {
        op: &'static str,
        type_names: Vec<String>,
    },
    AttributeMissing { type_name: String, attr: String },
    TypeError,
    ValueError,
    ZeroDivision,
    Overflow,
    MemoryError,
    IndexError,
    StopIteration,
    MroConflict,
    /// 사용자 코드가 던진 예외 (클래스 이름)
    Raised(String),
}

impl VmErrorKind {
    /// 언어 수준 예외 클래스 이름
    pub fn exception_name(&self) -> &str {
        match self {
            VmErrorKind::UnsupportedOperand { .. }
            | VmErrorKind::UnsupportedOperandTypes { .. }
            | VmErrorKind::TypeError
            | VmErrorKind::MroConflict => "TypeError",
            VmErrorKind::AttributeMissing { .. } => "AttributeError",
            VmErrorKind::ValueError => "ValueError",
            VmErrorKind::ZeroDivision => "ZeroDivisionError",
            VmErrorKind::Overflow => "OverflowError",
            VmErrorKind::MemoryError => "MemoryError",
            VmErrorKind::IndexError => "IndexError",
            VmErrorKind::StopIteration => "StopIteration",
            VmErrorKind::Raised(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}: {}", .kind.exception_name(), .message)]
pub struct VmError {
    pub kind: VmErrorKind,
    pub message: String,
}

pub type VmResult<T> = Result<T, VmError>;

/// 디스패치 엔진
///
/// 타입 레지스트리와 설정만 가지며 `&self`로 동작하므로 여러 스레드에서
/// 공유(`Arc<Vm>`)해 동시에 디스패치할 수 있습니다.
pub struct Vm {
    pub types: TypeRegistry,
    config: VmConfig,
}

// ========== 유틸리티 함수 ==========

/// VmError 생성 헬퍼 함수
pub fn err(kind: VmErrorKind, message: impl Into<String>) -> VmError {
    VmError {
        kind,
        message: message.into(),
    }
}

// ========== VM 구현 ==========

impl Vm {
    pub fn new() -> Self {
        Self::with_config(VmConfig::default())
    }

    pub fn with_config(config: VmConfig) -> Self {
        Self {
            types: TypeRegistry::new(config.max_mro_depth),
            config,
        }
    }

    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    // ========== 타입 ==========

    /// 에러 메시지용 런타임 타입 이름
    pub fn type_name(&self, value: &Value) -> String {
        self.types.name_of(value.type_id())
    }

    /// 타입 객체 (`type(x)`가 돌려주는 값). 같은 타입이면 항상 같은 객체
    pub fn type_object(&self, id: TypeId) -> VmResult<Value> {
        Ok(self.types.require(id)?.type_value().clone())
    }

    pub fn new_type(
        &self,
        name: &str,
        bases: &[TypeId],
        namespace: HashMap<String, Value>,
    ) -> VmResult<TypeId> {
        self.types.create_type(name, bases, namespace)
    }

    /// `Cls()`와 같음
    pub fn new_instance(&self, id: TypeId, args: &[Value]) -> VmResult<Value> {
        let cls = self.type_object(id)?;
        self.call(&cls, args)
    }

    pub fn set_type_attr(&self, id: TypeId, name: &str, value: Value) -> VmResult<()> {
        self.types.set_type_attr(id, name, value)
    }

    pub fn del_type_attr(&self, id: TypeId, name: &str) -> VmResult<()> {
        self.types.del_type_attr(id, name)
    }

    pub fn set_bases(&self, id: TypeId, bases: &[TypeId]) -> VmResult<()> {
        self.types.set_bases(id, bases)
    }

    /// 다음 해석 때 슬롯 테이블을 다시 만들도록 강제
    pub fn invalidate(&self, id: TypeId) -> VmResult<()> {
        self.types.invalidate(id)
    }

    pub fn is_subtype(&self, a: TypeId, b: TypeId) -> bool {
        self.types.is_subtype(a, b)
    }

    // ========== 슬롯 조회 ==========

    pub fn slots_of(&self, id: TypeId) -> VmResult<Arc<SlotCacheEntry>> {
        self.types.get_cached_slots(id)
    }

    pub fn slot_for(&self, value: &Value, kind: SlotKind) -> VmResult<SlotTarget> {
        Ok(self.slots_of(value.type_id())?.get(kind).clone())
    }

    pub fn has_slot(&self, value: &Value, kind: SlotKind) -> VmResult<bool> {
        Ok(!self.slots_of(value.type_id())?.get(kind).is_absent())
    }

    pub fn attribute_missing(&self, value: &Value, attr: &str) -> VmError {
        let type_name = self.type_name(value);
        err(
            VmErrorKind::AttributeMissing {
                type_name: type_name.clone(),
                attr: attr.to_string(),
            },
            format!("'{}' object has no attribute '{}'", type_name, attr),
        )
    }

    // ========== 호출 ==========

    /// 일반 호출 경로: 함수, 바운드 메서드, 그 외 `Call` 슬롯을 가진 모든 객체
    pub fn call(&self, callee: &Value, args: &[Value]) -> VmResult<Value> {
        match callee.as_object().map(|o| &o.data) {
            Some(ObjectData::Function(func)) => return func.call(self, args),
            Some(ObjectData::BoundMethod { func, receiver }) => {
                let mut full = Vec::with_capacity(args.len() + 1);
                full.push(receiver.clone());
                full.extend_from_slice(args);
                return self.call(func, &full);
            }
            _ => {}
        }

        let target = self.slot_for(callee, SlotKind::Call)?;
        if target.is_absent() {
            let type_name = self.type_name(callee);
            return Err(err(
                VmErrorKind::UnsupportedOperand {
                    op: SlotKind::Call.symbol(),
                    type_name: type_name.clone(),
                },
                format!("'{}' object is not callable", type_name),
            ));
        }
        self.invoke_call(&target, callee, args)
    }

    /// 타입에서 찾은 특수 메서드를 `receiver`에 대해 호출
    ///
    /// 함수는 바인딩 없이 수신자를 첫 인자로 붙여 부르고,
    /// 그 외 객체는 descriptor 바인딩을 거친 뒤 호출합니다.
    pub fn call_special(&self, method: &Value, receiver: &Value, args: &[Value]) -> VmResult<Value> {
        if let Some(ObjectData::Function(func)) = method.as_object().map(|o| &o.data) {
            let mut full = Vec::with_capacity(args.len() + 1);
            full.push(receiver.clone());
            full.extend_from_slice(args);
            return func.call(self, &full);
        }
        let bound = self.descr_get(method, Some(receiver), receiver.type_id())?;
        self.call(&bound, args)
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}
