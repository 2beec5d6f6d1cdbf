//! `int` 슬롯 구현
//!
//! 두 피연산자가 모두 int 계열(`int`, `bool`, int 서브클래스)일 때만 계산하고,
//! 그 외에는 `NotImplemented`를 돌려 상대 피연산자의 반사 슬롯에 기회를 줍니다.
//! `1 + 2.5`가 `float`의 슬롯에서 계산되는 것도 이 규칙 덕분입니다.

use super::super::machine::{Vm, VmError, VmErrorKind, VmResult, err};
use super::super::slot::CompareOp;
use super::super::type_def::{TYPE_INT, TYPE_OBJECT, TypeDef, TypeFlags};
use super::super::utils::{as_int, make_string, make_tuple};
use super::super::value::Value;
use super::BuiltinId;

pub fn register_type() -> TypeDef {
    TypeDef::new(TYPE_INT, "int", TypeFlags::IMMUTABLE | TypeFlags::BASETYPE)
        .with_bases(&[TYPE_OBJECT])
        .with_builtins(&[
            BuiltinId::IntNegative,
            BuiltinId::IntPositive,
            BuiltinId::IntAbsolute,
            BuiltinId::IntInvert,
            BuiltinId::IntIndex,
            BuiltinId::IntInt,
            BuiltinId::IntFloat,
            BuiltinId::IntBool,
            BuiltinId::IntAdd,
            BuiltinId::IntSubtract,
            BuiltinId::IntMultiply,
            BuiltinId::IntRemainder,
            BuiltinId::IntDivmod,
            BuiltinId::IntLshift,
            BuiltinId::IntRshift,
            BuiltinId::IntAnd,
            BuiltinId::IntXor,
            BuiltinId::IntOr,
            BuiltinId::IntFloorDivide,
            BuiltinId::IntTrueDivide,
            BuiltinId::IntPower,
            BuiltinId::IntRichCompare,
            BuiltinId::IntHash,
            BuiltinId::IntRepr,
        ])
}

// ========== 헬퍼 ==========

fn expect_int(vm: &Vm, v: &Value, slot: &str) -> VmResult<i64> {
    as_int(v).ok_or_else(|| {
        err(
            VmErrorKind::TypeError,
            format!(
                "descriptor '{}' requires a 'int' object but received '{}'",
                slot,
                vm.type_name(v)
            ),
        )
    })
}

fn overflow(op: &str) -> VmError {
    err(
        VmErrorKind::Overflow,
        format!("integer overflow in {}", op),
    )
}

/// 두 피연산자가 모두 int 계열이면 `f` 적용, 아니면 `NotImplemented`
fn with_ints(
    a: &Value,
    b: &Value,
    f: impl FnOnce(i64, i64) -> VmResult<Value>,
) -> VmResult<Value> {
    match (as_int(a), as_int(b)) {
        (Some(x), Some(y)) => f(x, y),
        _ => Ok(Value::NotImplemented),
    }
}

/// 나머지는 제수와 같은 부호
pub(crate) fn py_mod(x: i64, y: i64) -> i64 {
    let r = x.wrapping_rem(y);
    if r != 0 && ((r < 0) != (y < 0)) { r + y } else { r }
}

/// 내림 나눗셈 (`y != 0` 가정)
fn py_floor_div(x: i64, y: i64) -> Option<i64> {
    let q = x.checked_div(y)?;
    if x % y != 0 && ((x < 0) != (y < 0)) {
        q.checked_sub(1)
    } else {
        Some(q)
    }
}

// ========== 단항 ==========

pub fn negative(vm: &Vm, v: &Value) -> VmResult<Value> {
    let x = expect_int(vm, v, "__neg__")?;
    x.checked_neg().map(Value::Int).ok_or_else(|| overflow("-"))
}

pub fn positive(vm: &Vm, v: &Value) -> VmResult<Value> {
    Ok(Value::Int(expect_int(vm, v, "__pos__")?))
}

pub fn absolute(vm: &Vm, v: &Value) -> VmResult<Value> {
    let x = expect_int(vm, v, "__abs__")?;
    x.checked_abs().map(Value::Int).ok_or_else(|| overflow("abs()"))
}

pub fn invert(vm: &Vm, v: &Value) -> VmResult<Value> {
    Ok(Value::Int(!expect_int(vm, v, "__invert__")?))
}

/// `__index__` / `__int__`: 항상 정확한 `int`를 돌려줌 (bool, 서브클래스 → int)
pub fn index(vm: &Vm, v: &Value) -> VmResult<Value> {
    Ok(Value::Int(expect_int(vm, v, "__index__")?))
}

pub fn float(vm: &Vm, v: &Value) -> VmResult<Value> {
    Ok(Value::Float(expect_int(vm, v, "__float__")? as f64))
}

pub fn bool(v: &Value) -> bool {
    as_int(v).is_some_and(|x| x != 0)
}

// ========== 이항 ==========

pub fn add(_vm: &Vm, a: &Value, b: &Value) -> VmResult<Value> {
    with_ints(a, b, |x, y| x.checked_add(y).map(Value::Int).ok_or_else(|| overflow("+")))
}

pub fn subtract(_vm: &Vm, a: &Value, b: &Value) -> VmResult<Value> {
    with_ints(a, b, |x, y| x.checked_sub(y).map(Value::Int).ok_or_else(|| overflow("-")))
}

pub fn multiply(_vm: &Vm, a: &Value, b: &Value) -> VmResult<Value> {
    with_ints(a, b, |x, y| x.checked_mul(y).map(Value::Int).ok_or_else(|| overflow("*")))
}

pub fn remainder(_vm: &Vm, a: &Value, b: &Value) -> VmResult<Value> {
    with_ints(a, b, |x, y| {
        if y == 0 {
            return Err(err(VmErrorKind::ZeroDivision, "integer modulo by zero"));
        }
        Ok(Value::Int(py_mod(x, y)))
    })
}

pub fn floor_divide(_vm: &Vm, a: &Value, b: &Value) -> VmResult<Value> {
    with_ints(a, b, |x, y| {
        if y == 0 {
            return Err(err(
                VmErrorKind::ZeroDivision,
                "integer division or modulo by zero",
            ));
        }
        py_floor_div(x, y).map(Value::Int).ok_or_else(|| overflow("//"))
    })
}

pub fn divmod(_vm: &Vm, a: &Value, b: &Value) -> VmResult<Value> {
    with_ints(a, b, |x, y| {
        if y == 0 {
            return Err(err(
                VmErrorKind::ZeroDivision,
                "integer division or modulo by zero",
            ));
        }
        let q = py_floor_div(x, y).ok_or_else(|| overflow("divmod()"))?;
        Ok(make_tuple(vec![Value::Int(q), Value::Int(py_mod(x, y))]))
    })
}

pub fn true_divide(_vm: &Vm, a: &Value, b: &Value) -> VmResult<Value> {
    with_ints(a, b, |x, y| {
        if y == 0 {
            return Err(err(VmErrorKind::ZeroDivision, "division by zero"));
        }
        Ok(Value::Float(x as f64 / y as f64))
    })
}

pub fn lshift(_vm: &Vm, a: &Value, b: &Value) -> VmResult<Value> {
    with_ints(a, b, |x, y| {
        if y < 0 {
            return Err(err(VmErrorKind::ValueError, "negative shift count"));
        }
        if x == 0 {
            return Ok(Value::Int(0));
        }
        let shifted = u32::try_from(y)
            .ok()
            .and_then(|s| x.checked_shl(s))
            .filter(|r| r >> y == x);
        shifted.map(Value::Int).ok_or_else(|| overflow("<<"))
    })
}

pub fn rshift(_vm: &Vm, a: &Value, b: &Value) -> VmResult<Value> {
    with_ints(a, b, |x, y| {
        if y < 0 {
            return Err(err(VmErrorKind::ValueError, "negative shift count"));
        }
        Ok(Value::Int(if y >= 64 {
            if x < 0 { -1 } else { 0 }
        } else {
            x >> y
        }))
    })
}

pub fn and(_vm: &Vm, a: &Value, b: &Value) -> VmResult<Value> {
    with_ints(a, b, |x, y| Ok(Value::Int(x & y)))
}

pub fn xor(_vm: &Vm, a: &Value, b: &Value) -> VmResult<Value> {
    with_ints(a, b, |x, y| Ok(Value::Int(x ^ y)))
}

pub fn or(_vm: &Vm, a: &Value, b: &Value) -> VmResult<Value> {
    with_ints(a, b, |x, y| Ok(Value::Int(x | y)))
}

// ========== 삼항 ==========

/// `pow(a, b[, m])`. `m`이 `None`이면 두 인자 형태
pub fn power(_vm: &Vm, a: &Value, b: &Value, m: &Value) -> VmResult<Value> {
    let (Some(base), Some(exp)) = (as_int(a), as_int(b)) else {
        return Ok(Value::NotImplemented);
    };

    if m.is_none() {
        if exp < 0 {
            if base == 0 {
                return Err(err(
                    VmErrorKind::ZeroDivision,
                    "0.0 cannot be raised to a negative power",
                ));
            }
            return Ok(Value::Float((base as f64).powf(exp as f64)));
        }
        return int_pow(base, exp).map(Value::Int).ok_or_else(|| overflow("**"));
    }

    let Some(modulus) = as_int(m) else {
        return Ok(Value::NotImplemented);
    };
    if modulus == 0 {
        return Err(err(VmErrorKind::ValueError, "pow() 3rd argument cannot be 0"));
    }
    if exp < 0 {
        return Err(err(
            VmErrorKind::ValueError,
            "pow() 2nd argument cannot be negative when 3rd argument specified",
        ));
    }
    Ok(Value::Int(mod_pow(base, exp, modulus)))
}

fn int_pow(base: i64, exp: i64) -> Option<i64> {
    match base {
        0 => Some(if exp == 0 { 1 } else { 0 }),
        1 => Some(1),
        -1 => Some(if exp % 2 == 0 { 1 } else { -1 }),
        _ => u32::try_from(exp).ok().and_then(|e| base.checked_pow(e)),
    }
}

fn mod_pow(base: i64, mut exp: i64, modulus: i64) -> i64 {
    let m = modulus as i128;
    let mut result: i128 = 1;
    let mut b = (base as i128).rem_euclid(m.abs());
    while exp > 0 {
        if exp & 1 == 1 {
            result = (result * b).rem_euclid(m.abs());
        }
        b = (b * b).rem_euclid(m.abs());
        exp >>= 1;
    }
    let r = (result % m.abs()) as i64;
    py_mod(r, modulus)
}

// ========== 비교 / 해시 / repr ==========

pub fn rich_compare(_vm: &Vm, a: &Value, b: &Value, op: CompareOp) -> VmResult<Value> {
    with_ints(a, b, |x, y| Ok(Value::Bool(op.matches(x.cmp(&y)))))
}

pub fn hash(vm: &Vm, v: &Value) -> VmResult<Value> {
    Ok(Value::Int(expect_int(vm, v, "__hash__")?))
}

pub fn repr(vm: &Vm, v: &Value) -> VmResult<Value> {
    Ok(make_string(expect_int(vm, v, "__repr__")?.to_string()))
}
