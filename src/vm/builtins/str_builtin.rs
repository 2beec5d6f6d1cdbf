//! `str` 시퀀스 슬롯
//!
//! 문자 단위(유니코드 스칼라 값) 인덱싱을 사용합니다.

use super::super::machine::{Vm, VmErrorKind, VmResult, err};
use super::super::slot::{CompareOp, SlotKind};
use super::super::type_def::{TYPE_OBJECT, TYPE_STR, TypeDef, TypeFlags};
use super::super::utils::{
    as_str, expect_string, make_iterator, make_string, normalize_index, out_of_memory, repeat_len,
};
use super::super::value::Value;
use super::BuiltinId;

pub fn register_type() -> TypeDef {
    TypeDef::new(TYPE_STR, "str", TypeFlags::IMMUTABLE)
        .with_bases(&[TYPE_OBJECT])
        .with_builtins(&[
            BuiltinId::StrConcat,
            BuiltinId::StrRepeat,
            BuiltinId::StrLen,
            BuiltinId::StrItem,
            BuiltinId::StrSubscript,
            BuiltinId::StrRichCompare,
            BuiltinId::StrHash,
            BuiltinId::StrIter,
            BuiltinId::StrRepr,
        ])
}

/// `str + x`: 오른쪽도 문자열이어야 함
pub fn concat(vm: &Vm, a: &Value, b: &Value) -> VmResult<Value> {
    let left = expect_string(vm, a, "descriptor '__add__' argument")?;
    match as_str(b) {
        Some(right) => {
            let mut s = String::with_capacity(left.len() + right.len());
            s.push_str(left);
            s.push_str(right);
            Ok(make_string(s))
        }
        None => Err(err(
            VmErrorKind::TypeError,
            format!(
                "can only concatenate str (not \"{}\") to str",
                vm.type_name(b)
            ),
        )),
    }
}

/// `str * n` (음수는 빈 문자열)
pub fn repeat(vm: &Vm, a: &Value, count: isize) -> VmResult<Value> {
    let s = expect_string(vm, a, "descriptor '__mul__' argument")?;
    if count <= 0 {
        return Ok(make_string(String::new()));
    }
    let total = repeat_len(vm, s.len(), count as usize, 1, "string")?;
    let mut out = String::new();
    out.try_reserve_exact(total)
        .map_err(|_| out_of_memory(total, "string"))?;
    for _ in 0..count {
        out.push_str(s);
    }
    Ok(make_string(out))
}

pub fn len(v: &Value) -> usize {
    as_str(v).map_or(0, |s| s.chars().count())
}

/// `s[i]` (정수 인덱스, 음수 허용)
pub fn item(vm: &Vm, v: &Value, index: isize) -> VmResult<Value> {
    let s = expect_string(vm, v, "descriptor '__getitem__' argument")?;
    let len = s.chars().count();
    normalize_index(index, len)
        .and_then(|i| s.chars().nth(i))
        .map(|c| make_string(c.to_string()))
        .ok_or_else(|| err(VmErrorKind::IndexError, "string index out of range"))
}

/// `s[key]` 매핑 형태 진입점: 키를 `__index__`로 정수화한 뒤 `item`
pub fn subscript(vm: &Vm, v: &Value, key: &Value) -> VmResult<Value> {
    if !vm.has_slot(key, SlotKind::Index)? {
        return Err(err(
            VmErrorKind::TypeError,
            format!("string indices must be integers, not '{}'", vm.type_name(key)),
        ));
    }
    let index = vm.index(key)?;
    let index = isize::try_from(index).map_err(|_| {
        err(
            VmErrorKind::IndexError,
            "cannot fit 'int' into an index-sized integer",
        )
    })?;
    item(vm, v, index)
}

pub fn rich_compare(_vm: &Vm, a: &Value, b: &Value, op: CompareOp) -> VmResult<Value> {
    match (as_str(a), as_str(b)) {
        (Some(x), Some(y)) => Ok(Value::Bool(op.matches(x.cmp(y)))),
        _ => Ok(Value::NotImplemented),
    }
}

/// FNV-1a
pub fn hash(vm: &Vm, v: &Value) -> VmResult<Value> {
    let s = expect_string(vm, v, "descriptor '__hash__' argument")?;
    Ok(Value::Int(fnv1a(s.as_bytes())))
}

pub(crate) fn fnv1a(bytes: &[u8]) -> i64 {
    let mut h: u64 = 0xcbf2_9ce4_8422_2325;
    for b in bytes {
        h ^= *b as u64;
        h = h.wrapping_mul(0x0000_0100_0000_01b3);
    }
    h as i64
}

pub fn iter(vm: &Vm, v: &Value) -> VmResult<Value> {
    let s = expect_string(vm, v, "descriptor '__iter__' argument")?;
    Ok(make_iterator(
        s.chars().map(|c| make_string(c.to_string())).collect(),
    ))
}

pub fn repr(vm: &Vm, v: &Value) -> VmResult<Value> {
    let s = expect_string(vm, v, "descriptor '__repr__' argument")?;
    let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    Ok(make_string(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_len_counts_chars() {
        assert_eq!(len(&make_string("héllo")), 5);
    }

    #[test]
    fn test_item_negative_index() {
        let vm = Vm::new();
        let s = make_string("abc");
        assert_eq!(item(&vm, &s, -1).unwrap(), make_string("c"));
        let e = item(&vm, &s, 3).unwrap_err();
        assert_eq!(e.kind, VmErrorKind::IndexError);
        assert_eq!(e.message, "string index out of range");
    }

    #[test]
    fn test_concat_rejects_int() {
        let vm = Vm::new();
        let e = concat(&vm, &make_string("a"), &Value::Int(1)).unwrap_err();
        assert_eq!(e.message, "can only concatenate str (not \"int\") to str");
    }

    #[test]
    fn test_repr_quotes() {
        let vm = Vm::new();
        assert_eq!(repr(&vm, &make_string("hi")).unwrap(), make_string("'hi'"));
        assert_eq!(repr(&vm, &make_string("it's")).unwrap(), make_string("\"it's\""));
    }

    #[test]
    fn test_hash_is_stable() {
        assert_eq!(fnv1a(b"abc"), fnv1a(b"abc"));
        assert_ne!(fnv1a(b"abc"), fnv1a(b"abd"));
    }
}
