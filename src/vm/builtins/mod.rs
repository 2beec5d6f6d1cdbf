//! Builtin 슬롯 구현 레지스트리
//!
//! 모든 builtin 구현은 `BuiltinId`로 식별되고, `REGISTRY`에 `(id, 이름, 슬롯 종류, 함수)`로
//! 한 번만 등록됩니다. 레지스트리는 프로세스 시작 시 고정되며 이후 변하지 않습니다.

pub mod bool_builtin;
pub mod float;
pub mod function;
pub mod int;
pub mod iterator;
pub mod none_type;
pub mod object;
pub mod property;
pub mod str_builtin;
pub mod tuple;
pub mod type_builtin;


use std::fmt;

use super::machine::{Vm, VmResult};
use super::slot::{CompareOp, Convention, SlotKind};
use super::type_def::{TypeDef, TypeId};
use super::value::Value;

// ========== 빌트인 구현 ID ==========
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinId {
    // object
    ObjectGetAttr,
    ObjectSetAttr,
    ObjectHash,
    ObjectRichCompare,
    ObjectRepr,
    // type
    TypeGetAttr,
    TypeSetAttr,
    TypeCall,
    TypeRepr,
    // NoneType / NotImplementedType
    NoneBool,
    NoneRepr,
    NotImplementedRepr,
    // int
    IntNegative,
    IntPositive,
    IntAbsolute,
    IntInvert,
    IntIndex,
    IntInt,
    IntFloat,
    IntBool,
    IntAdd,
    IntSubtract,
    IntMultiply,
    IntRemainder,
    IntDivmod,
    IntLshift,
    IntRshift,
    IntAnd,
    IntXor,
    IntOr,
    IntFloorDivide,
    IntTrueDivide,
    IntPower,
    IntRichCompare,
    IntHash,
    IntRepr,
    // bool
    BoolAnd,
    BoolXor,
    BoolOr,
    BoolRepr,
    // float
    FloatNegative,
    FloatPositive,
    FloatAbsolute,
    FloatInt,
    FloatFloat,
    FloatBool,
    FloatAdd,
    FloatSubtract,
    FloatMultiply,
    FloatRemainder,
    FloatDivmod,
    FloatFloorDivide,
    FloatTrueDivide,
    FloatPower,
    FloatRichCompare,
    FloatHash,
    FloatRepr,
    // str
    StrConcat,
    StrRepeat,
    StrLen,
    StrItem,
    StrSubscript,
    StrRichCompare,
    StrHash,
    StrIter,
    StrRepr,
    // tuple
    TupleConcat,
    TupleRepeat,
    TupleLen,
    TupleItem,
    TupleRichCompare,
    TupleHash,
    TupleIter,
    TupleRepr,
    // function / method
    FunctionDescrGet,
    FunctionCall,
    FunctionRepr,
    MethodCall,
    MethodRepr,
    // property
    PropertyDescrGet,
    PropertyDescrSet,
    // iterator
    IteratorIter,
    IteratorNext,
}

/// builtin 구현 함수의 호출 형태
///
/// 앞의 세 가지는 simple 규약(인터프리터 상태 없이 실패하지 않음),
/// 나머지는 full 규약입니다.
#[derive(Clone, Copy)]
pub enum BuiltinFn {
    Inquiry(fn(&Value) -> bool),
    Len(fn(&Value) -> usize),
    DescrGetSimple(fn(&Value, Option<&Value>) -> Value),

    Unary(fn(&Vm, &Value) -> VmResult<Value>),
    Binary(fn(&Vm, &Value, &Value) -> VmResult<Value>),
    Ternary(fn(&Vm, &Value, &Value, &Value) -> VmResult<Value>),
    SizeArg(fn(&Vm, &Value, isize) -> VmResult<Value>),
    Compare(fn(&Vm, &Value, &Value, CompareOp) -> VmResult<Value>),
    GetAttr(fn(&Vm, &Value, &str) -> VmResult<Value>),
    SetAttr(fn(&Vm, &Value, &str, Option<&Value>) -> VmResult<()>),
    DescrGet(fn(&Vm, &Value, Option<&Value>, TypeId) -> VmResult<Value>),
    /// `(수신자, 키, 값)`. 값이 `None`이면 삭제
    Store(fn(&Vm, &Value, &Value, Option<&Value>) -> VmResult<()>),
    Call(fn(&Vm, &Value, &[Value]) -> VmResult<Value>),
}

impl BuiltinFn {
    pub fn convention(&self) -> Convention {
        match self {
            BuiltinFn::Inquiry(_) | BuiltinFn::Len(_) | BuiltinFn::DescrGetSimple(_) => {
                Convention::Simple
            }
            _ => Convention::Full,
        }
    }

    /// 이 함수 형태로 주어진 슬롯 종류를 채울 수 있는지
    pub fn fits(&self, kind: SlotKind) -> bool {
        use SlotKind::*;
        if !kind.descriptor().supports(self.convention()) {
            return false;
        }
        match self {
            BuiltinFn::Inquiry(_) => kind == Bool,
            BuiltinFn::Len(_) => matches!(kind, SqLength | MpLength),
            BuiltinFn::DescrGetSimple(_) | BuiltinFn::DescrGet(_) => kind == DescrGet,
            BuiltinFn::Unary(_) => {
                (kind.is_unary_number() && kind != Bool)
                    || matches!(kind, SqLength | MpLength | Hash | Iter | IterNext | Repr)
            }
            BuiltinFn::Binary(_) => kind.is_binary_number() || matches!(kind, SqConcat | MpSubscript),
            BuiltinFn::Ternary(_) => kind.is_ternary(),
            BuiltinFn::SizeArg(_) => matches!(kind, SqRepeat | SqItem),
            BuiltinFn::Compare(_) => kind == RichCompare,
            BuiltinFn::GetAttr(_) => kind == GetAttr,
            BuiltinFn::SetAttr(_) => kind == SetAttr,
            BuiltinFn::Store(_) => matches!(kind, SqAssItem | MpAssSubscript | DescrSet),
            BuiltinFn::Call(_) => kind == Call,
        }
    }

    fn shape(&self) -> &'static str {
        match self {
            BuiltinFn::Inquiry(_) => "inquiry",
            BuiltinFn::Len(_) => "lenfunc",
            BuiltinFn::DescrGetSimple(_) => "descrgetfunc(simple)",
            BuiltinFn::Unary(_) => "unaryfunc",
            BuiltinFn::Binary(_) => "binaryfunc",
            BuiltinFn::Ternary(_) => "ternaryfunc",
            BuiltinFn::SizeArg(_) => "ssizeargfunc",
            BuiltinFn::Compare(_) => "richcmpfunc",
            BuiltinFn::GetAttr(_) => "getattrofunc",
            BuiltinFn::SetAttr(_) => "setattrofunc",
            BuiltinFn::DescrGet(_) => "descrgetfunc",
            BuiltinFn::Store(_) => "objobjargproc",
            BuiltinFn::Call(_) => "ternaryfunc(call)",
        }
    }
}

impl fmt::Debug for BuiltinFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.shape())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BuiltinEntry {
    pub id: BuiltinId,
    pub name: &'static str,
    pub kind: SlotKind,
    pub func: BuiltinFn,
}

const fn e(id: BuiltinId, name: &'static str, kind: SlotKind, func: BuiltinFn) -> BuiltinEntry {
    BuiltinEntry {
        id,
        name,
        kind,
        func,
    }
}

use self::BuiltinFn as F;
use self::BuiltinId as B;
use super::slot::SlotKind as K;

/// `BuiltinId` 선언 순서와 같은 순서로 등록
static REGISTRY: &[BuiltinEntry] = &[
    // ========== object ==========
    e(B::ObjectGetAttr, "object.__getattribute__", K::GetAttr, F::GetAttr(object::getattr)),
    e(B::ObjectSetAttr, "object.__setattr__", K::SetAttr, F::SetAttr(object::setattr)),
    e(B::ObjectHash, "object.__hash__", K::Hash, F::Unary(object::hash)),
    e(B::ObjectRichCompare, "object.__eq__", K::RichCompare, F::Compare(object::rich_compare)),
    e(B::ObjectRepr, "object.__repr__", K::Repr, F::Unary(object::repr)),
    // ========== type ==========
    e(B::TypeGetAttr, "type.__getattribute__", K::GetAttr, F::GetAttr(type_builtin::getattr)),
    e(B::TypeSetAttr, "type.__setattr__", K::SetAttr, F::SetAttr(type_builtin::setattr)),
    e(B::TypeCall, "type.__call__", K::Call, F::Call(type_builtin::call)),
    e(B::TypeRepr, "type.__repr__", K::Repr, F::Unary(type_builtin::repr)),
    // ========== NoneType ==========
    e(B::NoneBool, "NoneType.__bool__", K::Bool, F::Inquiry(none_type::bool)),
    e(B::NoneRepr, "NoneType.__repr__", K::Repr, F::Unary(none_type::repr)),
    e(B::NotImplementedRepr, "NotImplementedType.__repr__", K::Repr, F::Unary(none_type::not_implemented_repr)),
    // ========== int ==========
    e(B::IntNegative, "int.__neg__", K::Negative, F::Unary(int::negative)),
    e(B::IntPositive, "int.__pos__", K::Positive, F::Unary(int::positive)),
    e(B::IntAbsolute, "int.__abs__", K::Absolute, F::Unary(int::absolute)),
    e(B::IntInvert, "int.__invert__", K::Invert, F::Unary(int::invert)),
    e(B::IntIndex, "int.__index__", K::Index, F::Unary(int::index)),
    e(B::IntInt, "int.__int__", K::Int, F::Unary(int::index)),
    e(B::IntFloat, "int.__float__", K::Float, F::Unary(int::float)),
    e(B::IntBool, "int.__bool__", K::Bool, F::Inquiry(int::bool)),
    e(B::IntAdd, "int.__add__", K::Add, F::Binary(int::add)),
    e(B::IntSubtract, "int.__sub__", K::Subtract, F::Binary(int::subtract)),
    e(B::IntMultiply, "int.__mul__", K::Multiply, F::Binary(int::multiply)),
    e(B::IntRemainder, "int.__mod__", K::Remainder, F::Binary(int::remainder)),
    e(B::IntDivmod, "int.__divmod__", K::Divmod, F::Binary(int::divmod)),
    e(B::IntLshift, "int.__lshift__", K::Lshift, F::Binary(int::lshift)),
    e(B::IntRshift, "int.__rshift__", K::Rshift, F::Binary(int::rshift)),
    e(B::IntAnd, "int.__and__", K::And, F::Binary(int::and)),
    e(B::IntXor, "int.__xor__", K::Xor, F::Binary(int::xor)),
    e(B::IntOr, "int.__or__", K::Or, F::Binary(int::or)),
    e(B::IntFloorDivide, "int.__floordiv__", K::FloorDivide, F::Binary(int::floor_divide)),
    e(B::IntTrueDivide, "int.__truediv__", K::TrueDivide, F::Binary(int::true_divide)),
    e(B::IntPower, "int.__pow__", K::Power, F::Ternary(int::power)),
    e(B::IntRichCompare, "int.__eq__", K::RichCompare, F::Compare(int::rich_compare)),
    e(B::IntHash, "int.__hash__", K::Hash, F::Unary(int::hash)),
    e(B::IntRepr, "int.__repr__", K::Repr, F::Unary(int::repr)),
    // ========== bool ==========
    e(B::BoolAnd, "bool.__and__", K::And, F::Binary(bool_builtin::and)),
    e(B::BoolXor, "bool.__xor__", K::Xor, F::Binary(bool_builtin::xor)),
    e(B::BoolOr, "bool.__or__", K::Or, F::Binary(bool_builtin::or)),
    e(B::BoolRepr, "bool.__repr__", K::Repr, F::Unary(bool_builtin::repr)),
    // ========== float ==========
    e(B::FloatNegative, "float.__neg__", K::Negative, F::Unary(float::negative)),
    e(B::FloatPositive, "float.__pos__", K::Positive, F::Unary(float::positive)),
    e(B::FloatAbsolute, "float.__abs__", K::Absolute, F::Unary(float::absolute)),
    e(B::FloatInt, "float.__int__", K::Int, F::Unary(float::int)),
    e(B::FloatFloat, "float.__float__", K::Float, F::Unary(float::float)),
    e(B::FloatBool, "float.__bool__", K::Bool, F::Inquiry(float::bool)),
    e(B::FloatAdd, "float.__add__", K::Add, F::Binary(float::add)),
    e(B::FloatSubtract, "float.__sub__", K::Subtract, F::Binary(float::subtract)),
    e(B::FloatMultiply, "float.__mul__", K::Multiply, F::Binary(float::multiply)),
    e(B::FloatRemainder, "float.__mod__", K::Remainder, F::Binary(float::remainder)),
    e(B::FloatDivmod, "float.__divmod__", K::Divmod, F::Binary(float::divmod)),
    e(B::FloatFloorDivide, "float.__floordiv__", K::FloorDivide, F::Binary(float::floor_divide)),
    e(B::FloatTrueDivide, "float.__truediv__", K::TrueDivide, F::Binary(float::true_divide)),
    e(B::FloatPower, "float.__pow__", K::Power, F::Ternary(float::power)),
    e(B::FloatRichCompare, "float.__eq__", K::RichCompare, F::Compare(float::rich_compare)),
    e(B::FloatHash, "float.__hash__", K::Hash, F::Unary(float::hash)),
    e(B::FloatRepr, "float.__repr__", K::Repr, F::Unary(float::repr)),
    // ========== str ==========
    e(B::StrConcat, "str.__add__", K::SqConcat, F::Binary(str_builtin::concat)),
    e(B::StrRepeat, "str.__mul__", K::SqRepeat, F::SizeArg(str_builtin::repeat)),
    e(B::StrLen, "str.__len__", K::SqLength, F::Len(str_builtin::len)),
    e(B::StrItem, "str.__getitem__(int)", K::SqItem, F::SizeArg(str_builtin::item)),
    e(B::StrSubscript, "str.__getitem__", K::MpSubscript, F::Binary(str_builtin::subscript)),
    e(B::StrRichCompare, "str.__eq__", K::RichCompare, F::Compare(str_builtin::rich_compare)),
    e(B::StrHash, "str.__hash__", K::Hash, F::Unary(str_builtin::hash)),
    e(B::StrIter, "str.__iter__", K::Iter, F::Unary(str_builtin::iter)),
    e(B::StrRepr, "str.__repr__", K::Repr, F::Unary(str_builtin::repr)),
    // ========== tuple ==========
    e(B::TupleConcat, "tuple.__add__", K::SqConcat, F::Binary(tuple::concat)),
    e(B::TupleRepeat, "tuple.__mul__", K::SqRepeat, F::SizeArg(tuple::repeat)),
    e(B::TupleLen, "tuple.__len__", K::SqLength, F::Unary(tuple::len)),
    e(B::TupleItem, "tuple.__getitem__", K::SqItem, F::SizeArg(tuple::item)),
    e(B::TupleRichCompare, "tuple.__eq__", K::RichCompare, F::Compare(tuple::rich_compare)),
    e(B::TupleHash, "tuple.__hash__", K::Hash, F::Unary(tuple::hash)),
    e(B::TupleIter, "tuple.__iter__", K::Iter, F::Unary(tuple::iter)),
    e(B::TupleRepr, "tuple.__repr__", K::Repr, F::Unary(tuple::repr)),
    // ========== function / method ==========
    e(B::FunctionDescrGet, "function.__get__", K::DescrGet, F::DescrGetSimple(function::descr_get)),
    e(B::FunctionCall, "function.__call__", K::Call, F::Call(function::call)),
    e(B::FunctionRepr, "function.__repr__", K::Repr, F::Unary(function::repr)),
    e(B::MethodCall, "method.__call__", K::Call, F::Call(function::method_call)),
    e(B::MethodRepr, "method.__repr__", K::Repr, F::Unary(function::method_repr)),
    // ========== property ==========
    e(B::PropertyDescrGet, "property.__get__", K::DescrGet, F::DescrGet(property::descr_get)),
    e(B::PropertyDescrSet, "property.__set__", K::DescrSet, F::Store(property::descr_set)),
    // ========== iterator ==========
    e(B::IteratorIter, "iterator.__iter__", K::Iter, F::Unary(iterator::iter)),
    e(B::IteratorNext, "iterator.__next__", K::IterNext, F::Unary(iterator::next)),
];

pub fn all() -> &'static [BuiltinEntry] {
    REGISTRY
}

pub fn entry(id: BuiltinId) -> &'static BuiltinEntry {
    &REGISTRY[id as usize]
}

pub fn lookup(name: &str) -> Option<&'static BuiltinEntry> {
    REGISTRY.iter().find(|b| b.name == name)
}

/// builtin 타입 정의들 (`TypeId` 순서)
pub fn builtin_types() -> Vec<TypeDef> {
    vec![
        object::register_type(),
        type_builtin::register_type(),
        none_type::register_type(),
        none_type::register_not_implemented_type(),
        int::register_type(),
        bool_builtin::register_type(),
        float::register_type(),
        str_builtin::register_type(),
        tuple::register_type(),
        function::register_type(),
        function::register_method_type(),
        property::register_type(),
        iterator::register_type(),
    ]
}
