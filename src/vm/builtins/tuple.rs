//! `tuple` 시퀀스 슬롯
//!
//! 매핑 형태의 `__getitem__`이 없으므로 `t[i]`는 항상 `SqItem` 폴백을 탑니다.
//! 길이 슬롯은 full 규약으로 등록되어 있어 호출 경로가 `str`과 다릅니다.

use super::super::machine::{Vm, VmErrorKind, VmResult, err};
use super::super::slot::CompareOp;
use super::super::type_def::{TYPE_OBJECT, TYPE_TUPLE, TypeDef, TypeFlags};
use super::super::utils::{
    as_tuple, make_iterator, make_string, make_tuple, normalize_index, out_of_memory, repeat_len,
};
use super::super::value::Value;
use super::BuiltinId;

pub fn register_type() -> TypeDef {
    TypeDef::new(TYPE_TUPLE, "tuple", TypeFlags::IMMUTABLE)
        .with_bases(&[TYPE_OBJECT])
        .with_builtins(&[
            BuiltinId::TupleConcat,
            BuiltinId::TupleRepeat,
            BuiltinId::TupleLen,
            BuiltinId::TupleItem,
            BuiltinId::TupleRichCompare,
            BuiltinId::TupleHash,
            BuiltinId::TupleIter,
            BuiltinId::TupleRepr,
        ])
}

fn expect_tuple<'a>(vm: &Vm, v: &'a Value, slot: &str) -> VmResult<&'a [Value]> {
    as_tuple(v).ok_or_else(|| {
        err(
            VmErrorKind::TypeError,
            format!(
                "descriptor '{}' requires a 'tuple' object but received '{}'",
                slot,
                vm.type_name(v)
            ),
        )
    })
}

pub fn concat(vm: &Vm, a: &Value, b: &Value) -> VmResult<Value> {
    let left = expect_tuple(vm, a, "__add__")?;
    let Some(right) = as_tuple(b) else {
        return Err(err(
            VmErrorKind::TypeError,
            format!(
                "can only concatenate tuple (not \"{}\") to tuple",
                vm.type_name(b)
            ),
        ));
    };
    let mut items = Vec::with_capacity(left.len() + right.len());
    items.extend_from_slice(left);
    items.extend_from_slice(right);
    Ok(make_tuple(items))
}

pub fn repeat(vm: &Vm, a: &Value, count: isize) -> VmResult<Value> {
    let items = expect_tuple(vm, a, "__mul__")?;
    if count <= 0 || items.is_empty() {
        return Ok(make_tuple(Vec::new()));
    }
    let total = repeat_len(vm, items.len(), count as usize, size_of::<Value>(), "tuple")?;
    let mut out = Vec::new();
    out.try_reserve_exact(total)
        .map_err(|_| out_of_memory(total * size_of::<Value>(), "tuple"))?;
    for _ in 0..count {
        out.extend_from_slice(items);
    }
    Ok(make_tuple(out))
}

pub fn len(vm: &Vm, v: &Value) -> VmResult<Value> {
    Ok(Value::Int(expect_tuple(vm, v, "__len__")?.len() as i64))
}

pub fn item(vm: &Vm, v: &Value, index: isize) -> VmResult<Value> {
    let items = expect_tuple(vm, v, "__getitem__")?;
    normalize_index(index, items.len())
        .map(|i| items[i].clone())
        .ok_or_else(|| err(VmErrorKind::IndexError, "tuple index out of range"))
}

/// 사전식 비교: 첫 번째로 다른 원소에서 결정, 모두 같으면 길이로 결정
pub fn rich_compare(vm: &Vm, a: &Value, b: &Value, op: CompareOp) -> VmResult<Value> {
    let (Some(xs), Some(ys)) = (as_tuple(a), as_tuple(b)) else {
        return Ok(Value::NotImplemented);
    };

    let mut i = 0;
    while i < xs.len() && i < ys.len() {
        if !vm.rich_compare_bool(&xs[i], &ys[i], CompareOp::Eq)? {
            break;
        }
        i += 1;
    }

    if i >= xs.len() || i >= ys.len() {
        return Ok(Value::Bool(op.matches(xs.len().cmp(&ys.len()))));
    }

    match op {
        CompareOp::Eq => Ok(Value::Bool(false)),
        CompareOp::Ne => Ok(Value::Bool(true)),
        _ => vm.rich_compare(&xs[i], &ys[i], op),
    }
}

/// 원소 해시들을 섞음 (xxHash 계열 상수)
pub fn hash(vm: &Vm, v: &Value) -> VmResult<Value> {
    const PRIME_1: u64 = 11_400_714_785_074_694_791;
    const PRIME_2: u64 = 14_029_467_366_897_019_727;
    const PRIME_5: u64 = 2_870_177_450_012_600_261;

    let items = expect_tuple(vm, v, "__hash__")?;
    let mut acc = PRIME_5;
    for item in items {
        let lane = vm.hash(item)? as u64;
        acc = acc.wrapping_add(lane.wrapping_mul(PRIME_2));
        acc = acc.rotate_left(31);
        acc = acc.wrapping_mul(PRIME_1);
    }
    acc = acc.wrapping_add(items.len() as u64 ^ (PRIME_5 ^ 3_527_539));
    let h = acc as i64;
    Ok(Value::Int(if h == -1 { 1_546_275_796 } else { h }))
}

pub fn iter(vm: &Vm, v: &Value) -> VmResult<Value> {
    Ok(make_iterator(expect_tuple(vm, v, "__iter__")?.to_vec()))
}

pub fn repr(vm: &Vm, v: &Value) -> VmResult<Value> {
    let items = expect_tuple(vm, v, "__repr__")?;
    let parts = items
        .iter()
        .map(|item| vm.repr(item))
        .collect::<VmResult<Vec<_>>>()?;
    let body = match parts.len() {
        1 => format!("{},", parts[0]),
        _ => parts.join(", "),
    };
    Ok(make_string(format!("({})", body)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_item_repr() {
        let vm = Vm::new();
        let t = make_tuple(vec![Value::Int(1)]);
        assert_eq!(vm.repr(&t).unwrap(), "(1,)");
        let t = make_tuple(vec![Value::Int(1), make_string("a")]);
        assert_eq!(vm.repr(&t).unwrap(), "(1, 'a')");
    }

    #[test]
    fn test_lexicographic_order() {
        let vm = Vm::new();
        let a = make_tuple(vec![Value::Int(1), Value::Int(2)]);
        let b = make_tuple(vec![Value::Int(1), Value::Int(3)]);
        let c = make_tuple(vec![Value::Int(1)]);
        assert_eq!(rich_compare(&vm, &a, &b, CompareOp::Lt).unwrap(), Value::Bool(true));
        assert_eq!(rich_compare(&vm, &c, &a, CompareOp::Lt).unwrap(), Value::Bool(true));
        assert_eq!(rich_compare(&vm, &a, &a, CompareOp::Eq).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_index_out_of_range() {
        let vm = Vm::new();
        let t = make_tuple(vec![Value::Int(1)]);
        assert_eq!(item(&vm, &t, -1).unwrap(), Value::Int(1));
        let e = item(&vm, &t, 1).unwrap_err();
        assert_eq!(e.message, "tuple index out of range");
    }

    #[test]
    fn test_equal_tuples_hash_equal() {
        let vm = Vm::new();
        let a = make_tuple(vec![Value::Int(1), make_string("x")]);
        let b = make_tuple(vec![Value::Int(1), make_string("x")]);
        assert_eq!(hash(&vm, &a).unwrap(), hash(&vm, &b).unwrap());
    }
}
