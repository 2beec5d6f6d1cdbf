use super::super::machine::{Vm, VmErrorKind, VmResult, err};
use super::super::slot::CompareOp;
use super::super::type_def::{TYPE_FLOAT, TYPE_OBJECT, TypeDef, TypeFlags};
use super::super::utils::{as_float, make_string, make_tuple};
use super::super::value::{ObjectData, Value};
use super::BuiltinId;

pub fn register_type() -> TypeDef {
    TypeDef::new(TYPE_FLOAT, "float", TypeFlags::IMMUTABLE | TypeFlags::BASETYPE)
        .with_bases(&[TYPE_OBJECT])
        .with_builtins(&[
            BuiltinId::FloatNegative,
            BuiltinId::FloatPositive,
            BuiltinId::FloatAbsolute,
            BuiltinId::FloatInt,
            BuiltinId::FloatFloat,
            BuiltinId::FloatBool,
            BuiltinId::FloatAdd,
            BuiltinId::FloatSubtract,
            BuiltinId::FloatMultiply,
            BuiltinId::FloatRemainder,
            BuiltinId::FloatDivmod,
            BuiltinId::FloatFloorDivide,
            BuiltinId::FloatTrueDivide,
            BuiltinId::FloatPower,
            BuiltinId::FloatRichCompare,
            BuiltinId::FloatHash,
            BuiltinId::FloatRepr,
        ])
}

/// 수신자 자체가 float인지 (float 서브클래스 포함)
fn own_float(v: &Value) -> Option<f64> {
    match v {
        Value::Float(f) => Some(*f),
        Value::Object(obj) => match &obj.data {
            ObjectData::Float(f) => Some(*f),
            _ => None,
        },
        _ => None,
    }
}

fn expect_float(vm: &Vm, v: &Value, slot: &str) -> VmResult<f64> {
    own_float(v).ok_or_else(|| {
        err(
            VmErrorKind::TypeError,
            format!(
                "descriptor '{}' requires a 'float' object but received '{}'",
                slot,
                vm.type_name(v)
            ),
        )
    })
}

/// 한쪽이라도 float/int 계열이 아니면 `NotImplemented`
fn with_floats(
    a: &Value,
    b: &Value,
    f: impl FnOnce(f64, f64) -> VmResult<Value>,
) -> VmResult<Value> {
    match (as_float(a), as_float(b)) {
        (Some(x), Some(y)) => f(x, y),
        _ => Ok(Value::NotImplemented),
    }
}

fn py_fmod(x: f64, y: f64) -> f64 {
    let r = x % y;
    if r != 0.0 && ((r < 0.0) != (y < 0.0)) { r + y } else { r }
}

// ========== 단항 ==========

pub fn negative(vm: &Vm, v: &Value) -> VmResult<Value> {
    Ok(Value::Float(-expect_float(vm, v, "__neg__")?))
}

pub fn positive(vm: &Vm, v: &Value) -> VmResult<Value> {
    Ok(Value::Float(expect_float(vm, v, "__pos__")?))
}

pub fn absolute(vm: &Vm, v: &Value) -> VmResult<Value> {
    Ok(Value::Float(expect_float(vm, v, "__abs__")?.abs()))
}

pub fn int(vm: &Vm, v: &Value) -> VmResult<Value> {
    let f = expect_float(vm, v, "__int__")?;
    if f.is_nan() {
        return Err(err(
            VmErrorKind::ValueError,
            "cannot convert float NaN to integer",
        ));
    }
    if f.is_infinite() {
        return Err(err(
            VmErrorKind::Overflow,
            "cannot convert float infinity to integer",
        ));
    }
    let t = f.trunc();
    if t < i64::MIN as f64 || t >= i64::MAX as f64 {
        return Err(err(VmErrorKind::Overflow, "int too large to convert"));
    }
    Ok(Value::Int(t as i64))
}

pub fn float(vm: &Vm, v: &Value) -> VmResult<Value> {
    Ok(Value::Float(expect_float(vm, v, "__float__")?))
}

pub fn bool(v: &Value) -> bool {
    own_float(v).is_some_and(|f| f != 0.0)
}

// ========== 이항 ==========

pub fn add(_vm: &Vm, a: &Value, b: &Value) -> VmResult<Value> {
    with_floats(a, b, |x, y| Ok(Value::Float(x + y)))
}

pub fn subtract(_vm: &Vm, a: &Value, b: &Value) -> VmResult<Value> {
    with_floats(a, b, |x, y| Ok(Value::Float(x - y)))
}

pub fn multiply(_vm: &Vm, a: &Value, b: &Value) -> VmResult<Value> {
    with_floats(a, b, |x, y| Ok(Value::Float(x * y)))
}

pub fn true_divide(_vm: &Vm, a: &Value, b: &Value) -> VmResult<Value> {
    with_floats(a, b, |x, y| {
        if y == 0.0 {
            return Err(err(VmErrorKind::ZeroDivision, "float division by zero"));
        }
        Ok(Value::Float(x / y))
    })
}

pub fn floor_divide(_vm: &Vm, a: &Value, b: &Value) -> VmResult<Value> {
    with_floats(a, b, |x, y| {
        if y == 0.0 {
            return Err(err(VmErrorKind::ZeroDivision, "float floor division by zero"));
        }
        Ok(Value::Float((x / y).floor()))
    })
}

pub fn remainder(_vm: &Vm, a: &Value, b: &Value) -> VmResult<Value> {
    with_floats(a, b, |x, y| {
        if y == 0.0 {
            return Err(err(VmErrorKind::ZeroDivision, "float modulo"));
        }
        Ok(Value::Float(py_fmod(x, y)))
    })
}

pub fn divmod(_vm: &Vm, a: &Value, b: &Value) -> VmResult<Value> {
    with_floats(a, b, |x, y| {
        if y == 0.0 {
            return Err(err(VmErrorKind::ZeroDivision, "float divmod()"));
        }
        Ok(make_tuple(vec![
            Value::Float((x / y).floor()),
            Value::Float(py_fmod(x, y)),
        ]))
    })
}

// ========== 삼항 ==========

pub fn power(_vm: &Vm, a: &Value, b: &Value, m: &Value) -> VmResult<Value> {
    if !m.is_none() {
        return Err(err(
            VmErrorKind::TypeError,
            "pow() 3rd argument not allowed unless all arguments are integers",
        ));
    }
    with_floats(a, b, |x, y| {
        if x == 0.0 && y < 0.0 {
            return Err(err(
                VmErrorKind::ZeroDivision,
                "0.0 cannot be raised to a negative power",
            ));
        }
        Ok(Value::Float(x.powf(y)))
    })
}

// ========== 비교 / 해시 / repr ==========

pub fn rich_compare(_vm: &Vm, a: &Value, b: &Value, op: CompareOp) -> VmResult<Value> {
    with_floats(a, b, |x, y| {
        Ok(Value::Bool(match x.partial_cmp(&y) {
            Some(ord) => op.matches(ord),
            // NaN은 `!=`만 참
            None => op == CompareOp::Ne,
        }))
    })
}

/// 정수값과 같은 float은 int와 같은 해시
pub fn hash(vm: &Vm, v: &Value) -> VmResult<Value> {
    let f = expect_float(vm, v, "__hash__")?;
    if f.fract() == 0.0 && f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        return Ok(Value::Int(f as i64));
    }
    Ok(Value::Int(f.to_bits() as i64))
}

pub fn repr(vm: &Vm, v: &Value) -> VmResult<Value> {
    let f = expect_float(vm, v, "__repr__")?;
    Ok(make_string(format_float(f)))
}

pub(crate) fn format_float(f: f64) -> String {
    if f.is_nan() {
        "nan".to_string()
    } else if f.is_infinite() {
        if f > 0.0 { "inf" } else { "-inf" }.to_string()
    } else if f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{:.1}", f)
    } else {
        format!("{}", f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(1.0), "1.0");
        assert_eq!(format_float(2.5), "2.5");
        assert_eq!(format_float(f64::NAN), "nan");
        assert_eq!(format_float(f64::NEG_INFINITY), "-inf");
    }

    #[test]
    fn test_python_float_modulo() {
        assert_eq!(py_fmod(-7.0, 3.0), 2.0);
        assert_eq!(py_fmod(7.0, -3.0), -2.0);
    }
}
