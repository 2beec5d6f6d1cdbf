//! 슬롯 카탈로그
//!
//! - **SlotKind**: 타입 프로토콜 연산의 닫힌 집합 (`nb_*`, `sq_*`, `mp_*`, `tp_*`)
//! - **SlotDescriptor**: 종류별 인자 개수와 호출 규약(simple / full) 메타데이터
//! - **CompareOp**: rich comparison 연산자와 반사(reflected) 연산자
//!
//! 새로운 슬롯 종류는 런타임 등록이 아니라 이 파일의 수정으로만 추가됩니다.

use strum::{EnumCount, EnumIter, IntoEnumIterator, IntoStaticStr};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumCount, EnumIter, IntoStaticStr,
)]
pub enum SlotKind {
    // ========== Number: 단항 ==========
    Negative,
    Positive,
    Absolute,
    Invert,
    Index,
    Int,
    Float,
    Bool,
    // ========== Number: 이항 ==========
    Add,
    Subtract,
    Multiply,
    Remainder,
    Divmod,
    Lshift,
    Rshift,
    And,
    Xor,
    Or,
    FloorDivide,
    TrueDivide,
    MatrixMultiply,
    // ========== Number: 삼항 ==========
    Power,
    // ========== Sequence ==========
    SqLength,
    SqConcat,
    SqRepeat,
    SqItem,
    SqAssItem,
    // ========== Mapping ==========
    MpLength,
    MpSubscript,
    MpAssSubscript,
    // ========== Type ==========
    GetAttr,
    SetAttr,
    DescrGet,
    DescrSet,
    Hash,
    RichCompare,
    Iter,
    IterNext,
    Call,
    Repr,
}

/// 슬롯 구현의 호출 규약
///
/// `Simple`은 인터프리터 상태 없이 호출되고 실패하지 않는 형태,
/// `Full`은 `Vm`을 받고 `VmResult`를 반환하는 형태입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convention {
    Simple,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotDescriptor {
    pub kind: SlotKind,
    pub arity: u8,
    /// 두 가지 호출 규약을 모두 허용하는 종류
    pub complex: bool,
}

impl SlotDescriptor {
    pub fn supports(&self, convention: Convention) -> bool {
        match convention {
            // nb_bool은 simple 형태만 존재
            Convention::Full => self.kind != SlotKind::Bool,
            Convention::Simple => self.complex || self.kind == SlotKind::Bool,
        }
    }
}

/// 길이 조회 시 시도하는 순서 (sequence 먼저)
pub const LENGTH_ORDER: [SlotKind; 2] = [SlotKind::SqLength, SlotKind::MpLength];

/// 구독(`x[k]`) 조회 순서 (mapping 먼저, 정수 인덱스 sequence는 나중)
pub const SUBSCRIPT_ORDER: [SlotKind; 2] = [SlotKind::MpSubscript, SlotKind::SqItem];

/// 항목 대입/삭제 조회 순서
pub const ASSIGN_ORDER: [SlotKind; 2] = [SlotKind::MpAssSubscript, SlotKind::SqAssItem];

impl SlotKind {
    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        self.into()
    }

    pub const fn arity(self) -> u8 {
        use SlotKind::*;
        match self {
            Negative | Positive | Absolute | Invert | Index | Int | Float | Bool => 1,
            SqLength | MpLength | Hash | Iter | IterNext | Repr => 1,
            Add | Subtract | Multiply | Remainder | Divmod | Lshift | Rshift | And | Xor | Or
            | FloorDivide | TrueDivide | MatrixMultiply => 2,
            SqConcat | SqRepeat | SqItem | MpSubscript | GetAttr | Call => 2,
            Power | SqAssItem | MpAssSubscript | SetAttr | DescrGet | DescrSet | RichCompare => 3,
        }
    }

    pub const fn is_complex(self) -> bool {
        matches!(self, SlotKind::SqLength | SlotKind::MpLength | SlotKind::DescrGet)
    }

    pub const fn descriptor(self) -> SlotDescriptor {
        SlotDescriptor {
            kind: self,
            arity: self.arity(),
            complex: self.is_complex(),
        }
    }

    /// 반사 연산을 가지는 이항 number 슬롯인지 (`Power` 제외)
    pub const fn is_binary_number(self) -> bool {
        use SlotKind::*;
        matches!(
            self,
            Add | Subtract
                | Multiply
                | Remainder
                | Divmod
                | Lshift
                | Rshift
                | And
                | Xor
                | Or
                | FloorDivide
                | TrueDivide
                | MatrixMultiply
        )
    }

    pub const fn is_ternary(self) -> bool {
        matches!(self, SlotKind::Power)
    }

    /// 두 피연산자 디스패치 대상 (`Power` 포함)
    pub const fn is_binary(self) -> bool {
        self.is_binary_number() || self.is_ternary()
    }

    pub const fn is_number(self) -> bool {
        self.is_binary() || self.is_unary_number()
    }

    pub const fn is_unary_number(self) -> bool {
        use SlotKind::*;
        matches!(
            self,
            Negative | Positive | Absolute | Invert | Index | Int | Float | Bool
        )
    }

    /// 에러 메시지에 쓰이는 연산자 표기
    pub fn symbol(self) -> &'static str {
        use SlotKind::*;
        match self {
            Negative => "unary -",
            Positive => "unary +",
            Absolute => "abs()",
            Invert => "unary ~",
            Index => "index",
            Int => "int()",
            Float => "float()",
            Bool => "bool()",
            Add => "+",
            Subtract => "-",
            Multiply => "*",
            Remainder => "%",
            Divmod => "divmod()",
            Lshift => "<<",
            Rshift => ">>",
            And => "&",
            Xor => "^",
            Or => "|",
            FloorDivide => "//",
            TrueDivide => "/",
            MatrixMultiply => "@",
            Power => "** or pow()",
            SqLength | MpLength => "len()",
            SqConcat => "+",
            SqRepeat => "*",
            SqItem | MpSubscript => "[]",
            SqAssItem | MpAssSubscript => "[]=",
            GetAttr => "getattr()",
            SetAttr => "setattr()",
            DescrGet => "__get__",
            DescrSet => "__set__",
            Hash => "hash()",
            RichCompare => "comparison",
            Iter => "iter()",
            IterNext => "next()",
            Call => "call",
            Repr => "repr()",
        }
    }

    pub fn inplace_symbol(self) -> Option<&'static str> {
        use SlotKind::*;
        Some(match self {
            Add => "+=",
            Subtract => "-=",
            Multiply => "*=",
            Remainder => "%=",
            Lshift => "<<=",
            Rshift => ">>=",
            And => "&=",
            Xor => "^=",
            Or => "|=",
            FloorDivide => "//=",
            TrueDivide => "/=",
            MatrixMultiply => "@=",
            Power => "**=",
            _ => return None,
        })
    }

    /// 사용자 타입에서 이 슬롯을 채우는 특수 메서드 이름들
    ///
    /// 이항/삼항 number 슬롯은 `[정방향, 반사]` 순서이고,
    /// 대입 계열은 `[대입, 삭제]` 순서입니다.
    pub fn dunders(self) -> &'static [&'static str] {
        use SlotKind::*;
        match self {
            Negative => &["__neg__"],
            Positive => &["__pos__"],
            Absolute => &["__abs__"],
            Invert => &["__invert__"],
            Index => &["__index__"],
            Int => &["__int__"],
            Float => &["__float__"],
            Bool => &["__bool__"],
            Add => &["__add__", "__radd__"],
            Subtract => &["__sub__", "__rsub__"],
            Multiply => &["__mul__", "__rmul__"],
            Remainder => &["__mod__", "__rmod__"],
            Divmod => &["__divmod__", "__rdivmod__"],
            Lshift => &["__lshift__", "__rlshift__"],
            Rshift => &["__rshift__", "__rrshift__"],
            And => &["__and__", "__rand__"],
            Xor => &["__xor__", "__rxor__"],
            Or => &["__or__", "__ror__"],
            FloorDivide => &["__floordiv__", "__rfloordiv__"],
            TrueDivide => &["__truediv__", "__rtruediv__"],
            MatrixMultiply => &["__matmul__", "__rmatmul__"],
            Power => &["__pow__", "__rpow__"],
            SqLength | MpLength => &["__len__"],
            // sq_concat / sq_repeat / sq_item / sq_ass_item은 builtin 전용
            SqConcat | SqRepeat | SqItem | SqAssItem => &[],
            MpSubscript => &["__getitem__"],
            MpAssSubscript => &["__setitem__", "__delitem__"],
            GetAttr => &["__getattribute__", "__getattr__"],
            SetAttr => &["__setattr__", "__delattr__"],
            DescrGet => &["__get__"],
            DescrSet => &["__set__", "__delete__"],
            Hash => &["__hash__"],
            RichCompare => &["__lt__", "__le__", "__eq__", "__ne__", "__gt__", "__ge__"],
            Iter => &["__iter__"],
            IterNext => &["__next__"],
            Call => &["__call__"],
            Repr => &["__repr__"],
        }
    }

    pub fn forward_dunder(self) -> Option<&'static str> {
        self.dunders().first().copied()
    }

    pub fn reflected_dunder(self) -> Option<&'static str> {
        if self.is_binary_number() || self.is_ternary() {
            self.dunders().get(1).copied()
        } else {
            None
        }
    }

    pub fn inplace_dunder(self) -> Option<&'static str> {
        use SlotKind::*;
        Some(match self {
            Add => "__iadd__",
            Subtract => "__isub__",
            Multiply => "__imul__",
            Remainder => "__imod__",
            Lshift => "__ilshift__",
            Rshift => "__irshift__",
            And => "__iand__",
            Xor => "__ixor__",
            Or => "__ior__",
            FloorDivide => "__ifloordiv__",
            TrueDivide => "__itruediv__",
            MatrixMultiply => "__imatmul__",
            Power => "__ipow__",
            _ => return None,
        })
    }

    /// number 슬롯이 모두 거절했을 때 시도하는 sequence 슬롯
    pub const fn sequence_fallback(self) -> Option<SlotKind> {
        match self {
            SlotKind::Add => Some(SlotKind::SqConcat),
            SlotKind::Multiply => Some(SlotKind::SqRepeat),
            _ => None,
        }
    }
}

/// 주어진 특수 메서드 이름이 채우는 슬롯 종류들
pub fn kinds_for_dunder(name: &str) -> impl Iterator<Item = SlotKind> + '_ {
    SlotKind::iter().filter(move |kind| kind.dunders().contains(&name))
}

/// 타입 네임스페이스에 쓰면 슬롯 테이블을 무효화해야 하는 이름인지
pub fn is_slot_dunder(name: &str) -> bool {
    kinds_for_dunder(name).next().is_some()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum CompareOp {
    Lt,
    Le,
    Eq,
    Ne,
    Gt,
    Ge,
}

impl CompareOp {
    /// 피연산자를 뒤바꿨을 때 사용하는 연산자
    pub const fn reflected(self) -> Self {
        match self {
            CompareOp::Lt => CompareOp::Gt,
            CompareOp::Le => CompareOp::Ge,
            CompareOp::Eq => CompareOp::Eq,
            CompareOp::Ne => CompareOp::Ne,
            CompareOp::Gt => CompareOp::Lt,
            CompareOp::Ge => CompareOp::Le,
        }
    }

    pub const fn dunder(self) -> &'static str {
        match self {
            CompareOp::Lt => "__lt__",
            CompareOp::Le => "__le__",
            CompareOp::Eq => "__eq__",
            CompareOp::Ne => "__ne__",
            CompareOp::Gt => "__gt__",
            CompareOp::Ge => "__ge__",
        }
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }

    pub fn matches(self, ordering: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::*;
        match self {
            CompareOp::Lt => ordering == Less,
            CompareOp::Le => ordering != Greater,
            CompareOp::Eq => ordering == Equal,
            CompareOp::Ne => ordering != Equal,
            CompareOp::Gt => ordering == Greater,
            CompareOp::Ge => ordering != Less,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_kind_index_is_dense() {
        for (i, kind) in SlotKind::iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
        assert_eq!(SlotKind::iter().count(), SlotKind::COUNT);
    }

    #[test]
    fn test_arity() {
        assert_eq!(SlotKind::Negative.arity(), 1);
        assert_eq!(SlotKind::Add.arity(), 2);
        assert_eq!(SlotKind::Power.arity(), 3);
        assert_eq!(SlotKind::DescrGet.arity(), 3);
        assert_eq!(SlotKind::SqLength.arity(), 1);
    }

    #[test]
    fn test_complex_kinds() {
        let complex: Vec<SlotKind> = SlotKind::iter().filter(|k| k.is_complex()).collect();
        assert_eq!(
            complex,
            vec![SlotKind::SqLength, SlotKind::MpLength, SlotKind::DescrGet]
        );
        assert!(SlotKind::Bool.descriptor().supports(Convention::Simple));
        assert!(!SlotKind::Bool.descriptor().supports(Convention::Full));
        assert!(SlotKind::SqLength.descriptor().supports(Convention::Simple));
        assert!(SlotKind::SqLength.descriptor().supports(Convention::Full));
        assert!(!SlotKind::Add.descriptor().supports(Convention::Simple));
    }

    #[test]
    fn test_binary_dunders_are_forward_then_reflected() {
        for kind in SlotKind::iter().filter(|k| k.is_binary_number()) {
            let forward = kind.forward_dunder().unwrap();
            let reflected = kind.reflected_dunder().unwrap();
            assert_eq!(reflected, forward.replacen("__", "__r", 1));
        }
        assert_eq!(SlotKind::Power.reflected_dunder(), Some("__rpow__"));
        assert_eq!(SlotKind::Hash.reflected_dunder(), None);
    }

    #[test]
    fn test_len_fills_both_length_slots() {
        let kinds: Vec<SlotKind> = kinds_for_dunder("__len__").collect();
        assert_eq!(kinds, vec![SlotKind::SqLength, SlotKind::MpLength]);
        assert!(is_slot_dunder("__radd__"));
        assert!(!is_slot_dunder("__init__"));
        assert!(!is_slot_dunder("__iadd__"));
    }

    #[test]
    fn test_sequence_fallback() {
        assert_eq!(SlotKind::Add.sequence_fallback(), Some(SlotKind::SqConcat));
        assert_eq!(SlotKind::Multiply.sequence_fallback(), Some(SlotKind::SqRepeat));
        assert_eq!(SlotKind::Subtract.sequence_fallback(), None);
    }

    #[test]
    fn test_compare_op_reflection() {
        for op in CompareOp::iter() {
            assert_eq!(op.reflected().reflected(), op);
        }
        assert_eq!(CompareOp::Lt.reflected(), CompareOp::Gt);
        assert_eq!(CompareOp::Eq.reflected(), CompareOp::Eq);
        assert!(CompareOp::Le.matches(std::cmp::Ordering::Equal));
        assert!(!CompareOp::Lt.matches(std::cmp::Ordering::Equal));
    }
}
