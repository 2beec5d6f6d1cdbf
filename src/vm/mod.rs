pub mod builtins; // builtin 타입과 슬롯 구현 레지스트리
pub mod machine; // machine/ 디렉토리: 디스패치 엔진
pub mod mro; // C3 선형화
pub mod slot; // 슬롯 카탈로그
pub mod slot_cache;
pub mod slot_table;
pub mod type_def;
pub mod utils; // 값 생성/해석 헬퍼
pub mod value;

pub use builtins::{BuiltinEntry, BuiltinFn, BuiltinId};
pub use machine::{
    BinaryCallSite, DispatchPlan, Side, Vm, VmError, VmErrorKind, VmResult, err,
};
pub use slot::{CompareOp, Convention, SlotDescriptor, SlotKind};
pub use slot_cache::SlotCacheEntry;
pub use slot_table::{SlotTable, SlotTarget};
pub use type_def::{
    TYPE_BOOL, TYPE_FLOAT, TYPE_FUNCTION, TYPE_INT, TYPE_NONE, TYPE_OBJECT, TYPE_STR,
    TYPE_TUPLE, TYPE_TYPE, TYPE_USER_START, TypeDef, TypeFlags, TypeId, TypeRegistry,
};
pub use value::{Object, ObjectData, Value};
