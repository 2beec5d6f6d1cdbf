//! 특수 메서드 슬롯 디스패치 엔진
//!
//! 타입마다 연산자 슬롯 테이블(`nb_add`, `sq_item`, `tp_richcompare` ...)을 만들고,
//! 이항/삼항/비교 연산의 시도 순서를 결정해 builtin 구현 또는 사용자 특수 메서드를 호출합니다.
//!
//! ```ignore
//! use pyhyeon_slots::{SlotKind, Value, Vm};
//!
//! let vm = Vm::new();
//! let r = vm.resolve_binary(SlotKind::Add, &Value::Int(1), &Value::Float(0.5))?;
//! assert_eq!(r, Value::Float(1.5));
//! ```

pub mod config;
pub mod vm;

pub use config::{ConfigError, VmConfig};
pub use vm::{
    BinaryCallSite, CompareOp, SlotKind, SlotTarget, TypeId, Value, Vm, VmError, VmErrorKind,
    VmResult,
};
