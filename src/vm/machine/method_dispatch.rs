//! 슬롯 호출 브리지
//!
//! 해석된 `SlotTarget`을 실제 호출로 바꿉니다.
//!
//! - `Builtin(id)`: 레지스트리의 네이티브 구현을 호출 형태에 맞춰 호출
//!   (simple 규약 구현은 여기서 full 결과로 감쌈)
//! - `UserOverride`: 해당 특수 메서드를 일반 호출 경로로 호출.
//!   메서드가 없으면 상속받은 대상에게 위임, `None`으로 막혀 있으면 `NotImplemented`
//!
//! `NotImplemented`는 그대로 돌려주며, 구현이 던진 에러는 변환하지 않고 전파합니다.

use super::super::builtins::{self, BuiltinEntry, BuiltinFn};
use super::super::slot::{CompareOp, SlotKind};
use super::super::slot_table::{Binding, SlotOverride, SlotTarget};
use super::super::type_def::TypeId;
use super::super::utils::{as_int, make_string};
use super::{Vm, VmError, VmErrorKind, VmResult, err};
use crate::vm::value::Value;

/// 사용자 정의 슬롯이 어느 특수 메서드를 부를지 결정하는 피연산자 위치
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// 왼쪽 피연산자의 정방향 메서드: `v.__add__(w)`
    Left,
    /// 오른쪽 피연산자의 반사 메서드: `w.__radd__(v)`
    Right,
    /// 세 번째 피연산자 타입의 정방향 메서드: `__pow__(v, w, z)`
    Third,
}

fn shape_mismatch(entry: &BuiltinEntry, kind: SlotKind) -> VmError {
    err(
        VmErrorKind::TypeError,
        format!(
            "builtin '{}' ({:?}) cannot be invoked as slot {}",
            entry.name,
            entry.func,
            kind.name()
        ),
    )
}

impl Vm {
    // ========== 단항 ==========

    /// 인자 없는 슬롯 호출 (`__neg__`, `__iter__`, `__repr__` ...)
    pub fn invoke_unary(&self, target: &SlotTarget, v: &Value) -> VmResult<Value> {
        match target {
            SlotTarget::Absent => Ok(Value::NotImplemented),
            SlotTarget::Builtin(id) => {
                let entry = builtins::entry(*id);
                match entry.func {
                    BuiltinFn::Unary(f) => f(self, v),
                    BuiltinFn::Inquiry(f) => Ok(Value::Bool(f(v))),
                    BuiltinFn::Len(f) => Ok(Value::Int(f(v) as i64)),
                    _ => Err(shape_mismatch(entry, entry.kind)),
                }
            }
            SlotTarget::UserOverride(o) => {
                let Some(name) = o.kind.forward_dunder() else {
                    return Ok(Value::NotImplemented);
                };
                match o.binding(name) {
                    Binding::Method(m) => self.call_special(m, v, &[]),
                    Binding::Blocked => Ok(Value::NotImplemented),
                    Binding::Inherited => self.invoke_unary(&o.inherited, v),
                }
            }
        }
    }

    // ========== 이항 / 삼항 ==========

    pub fn invoke_binary(
        &self,
        target: &SlotTarget,
        side: Side,
        v: &Value,
        w: &Value,
    ) -> VmResult<Value> {
        self.invoke_ternary(target, side, v, w, &Value::None)
    }

    /// `z`가 `None`이면 두 인자 형태
    pub fn invoke_ternary(
        &self,
        target: &SlotTarget,
        side: Side,
        v: &Value,
        w: &Value,
        z: &Value,
    ) -> VmResult<Value> {
        match target {
            SlotTarget::Absent => Ok(Value::NotImplemented),
            SlotTarget::Builtin(id) => {
                let entry = builtins::entry(*id);
                match entry.func {
                    BuiltinFn::Ternary(f) => f(self, v, w, z),
                    BuiltinFn::Binary(f) if z.is_none() => f(self, v, w),
                    _ => Err(shape_mismatch(entry, entry.kind)),
                }
            }
            SlotTarget::UserOverride(o) => self.invoke_override(o, side, v, w, z, false),
        }
    }

    /// `delegated`: 하위 타입의 슬롯이 상속된 구현으로 넘긴 호출.
    /// 공유 슬롯의 반사 시도는 가장 바깥 호출에서만 한 번 합니다.
    fn invoke_override(
        &self,
        o: &SlotOverride,
        side: Side,
        v: &Value,
        w: &Value,
        z: &Value,
        delegated: bool,
    ) -> VmResult<Value> {
        let (name, receiver, other) = match side {
            Side::Left | Side::Third => (o.kind.forward_dunder(), v, w),
            // 세 인자 pow는 반사 메서드를 쓰지 않음
            Side::Right if !z.is_none() => return Ok(Value::NotImplemented),
            Side::Right => (o.kind.reflected_dunder(), w, v),
        };
        let Some(name) = name else {
            return Ok(Value::NotImplemented);
        };

        let result = match o.binding(name) {
            Binding::Method(m) => {
                let args = if z.is_none() {
                    vec![other.clone()]
                } else {
                    vec![other.clone(), z.clone()]
                };
                self.call_special(m, receiver, &args)?
            }
            Binding::Blocked => Value::NotImplemented,
            Binding::Inherited => match &o.inherited {
                SlotTarget::UserOverride(parent) => {
                    self.invoke_override(parent, side, v, w, z, true)?
                }
                inherited => self.invoke_ternary(inherited, side, v, w, z)?,
            },
        };

        if result.is_not_implemented() && side == Side::Left && z.is_none() && !delegated {
            return self.shared_reflected(o, v, w);
        }
        Ok(result)
    }

    /// 다른 타입의 두 피연산자가 같은 사용자 슬롯을 공유할 때,
    /// 디스패치는 그 슬롯을 한 번만 부르므로 반사 메서드는 여기서 시도
    fn shared_reflected(&self, o: &SlotOverride, v: &Value, w: &Value) -> VmResult<Value> {
        if v.type_id() == w.type_id() || !o.kind.is_binary() {
            return Ok(Value::NotImplemented);
        }
        let shared = match self.slot_for(w, o.kind)? {
            SlotTarget::UserOverride(other) => std::ptr::eq(&*other, o),
            _ => false,
        };
        let Some(reflected) = o.kind.reflected_dunder() else {
            return Ok(Value::NotImplemented);
        };
        match o.binding(reflected) {
            Binding::Method(m) if shared => self.call_special(m, w, &[v.clone()]),
            _ => Ok(Value::NotImplemented),
        }
    }

    // ========== 비교 ==========

    /// `a <op> b`를 `a`의 타입 슬롯으로 계산. 반사는 호출자가 피연산자를 바꿔 부름
    pub fn invoke_compare(
        &self,
        target: &SlotTarget,
        op: CompareOp,
        a: &Value,
        b: &Value,
    ) -> VmResult<Value> {
        match target {
            SlotTarget::Absent => Ok(Value::NotImplemented),
            SlotTarget::Builtin(id) => {
                let entry = builtins::entry(*id);
                match entry.func {
                    BuiltinFn::Compare(f) => f(self, a, b, op),
                    _ => Err(shape_mismatch(entry, SlotKind::RichCompare)),
                }
            }
            SlotTarget::UserOverride(o) => match o.binding(op.dunder()) {
                Binding::Method(m) => self.call_special(m, a, std::slice::from_ref(b)),
                Binding::Blocked => Ok(Value::NotImplemented),
                Binding::Inherited => self.invoke_compare(&o.inherited, op, a, b),
            },
        }
    }

    // ========== 결과 강제 변환이 필요한 슬롯 ==========

    /// `__len__`: 음이 아닌 int여야 함
    pub fn invoke_len(&self, target: &SlotTarget, v: &Value) -> VmResult<usize> {
        let raw = match target {
            SlotTarget::Builtin(id) => {
                let entry = builtins::entry(*id);
                match entry.func {
                    BuiltinFn::Len(f) => return Ok(f(v)),
                    BuiltinFn::Unary(f) => f(self, v)?,
                    _ => return Err(shape_mismatch(entry, entry.kind)),
                }
            }
            SlotTarget::UserOverride(o) => match o.binding("__len__") {
                Binding::Method(m) => self.call_special(m, v, &[])?,
                Binding::Inherited => return self.invoke_len(&o.inherited, v),
                Binding::Blocked => return Err(self.no_len(v)),
            },
            SlotTarget::Absent => return Err(self.no_len(v)),
        };

        let Some(n) = as_int(&raw) else {
            return Err(err(
                VmErrorKind::TypeError,
                format!(
                    "'{}' object cannot be interpreted as an integer",
                    self.type_name(&raw)
                ),
            ));
        };
        usize::try_from(n)
            .map_err(|_| err(VmErrorKind::ValueError, "__len__() should return >= 0"))
    }

    pub(super) fn no_len(&self, v: &Value) -> VmError {
        let type_name = self.type_name(v);
        err(
            VmErrorKind::UnsupportedOperand {
                op: SlotKind::SqLength.symbol(),
                type_name: type_name.clone(),
            },
            format!("object of type '{}' has no len()", type_name),
        )
    }

    /// `__bool__`: bool이어야 함
    pub fn invoke_inquiry(&self, target: &SlotTarget, v: &Value) -> VmResult<bool> {
        if let SlotTarget::Builtin(id) = target
            && let BuiltinFn::Inquiry(f) = builtins::entry(*id).func
        {
            return Ok(f(v));
        }
        match self.invoke_unary(target, v)? {
            Value::Bool(b) => Ok(b),
            other => Err(err(
                VmErrorKind::TypeError,
                format!(
                    "__bool__ should return bool, returned {}",
                    self.type_name(&other)
                ),
            )),
        }
    }

    /// `__hash__`: int여야 하며 -1은 -2로 바뀜
    pub fn invoke_hash(&self, target: &SlotTarget, v: &Value) -> VmResult<i64> {
        let raw = self.invoke_unary(target, v)?;
        match as_int(&raw) {
            Some(-1) => Ok(-2),
            Some(h) => Ok(h),
            None => Err(err(
                VmErrorKind::TypeError,
                "__hash__ method should return an integer",
            )),
        }
    }

    /// sequence 슬롯 (`sq_item`, `sq_repeat`)
    pub fn invoke_size_arg(&self, target: &SlotTarget, v: &Value, n: isize) -> VmResult<Value> {
        match target {
            SlotTarget::Builtin(id) => {
                let entry = builtins::entry(*id);
                match entry.func {
                    BuiltinFn::SizeArg(f) => f(self, v, n),
                    _ => Err(shape_mismatch(entry, entry.kind)),
                }
            }
            SlotTarget::UserOverride(o) => self.invoke_size_arg(&o.inherited, v, n),
            SlotTarget::Absent => Ok(Value::NotImplemented),
        }
    }

    /// 대입/삭제 슬롯 (`__setitem__`/`__delitem__`, `__set__`/`__delete__`)
    ///
    /// 처리했으면 `true`, 슬롯이 없거나 해당 방향이 막혀 있으면 `false`
    pub fn invoke_store(
        &self,
        target: &SlotTarget,
        receiver: &Value,
        key: &Value,
        value: Option<&Value>,
    ) -> VmResult<bool> {
        match target {
            SlotTarget::Absent => Ok(false),
            SlotTarget::Builtin(id) => {
                let entry = builtins::entry(*id);
                match entry.func {
                    BuiltinFn::Store(f) => f(self, receiver, key, value).map(|_| true),
                    _ => Err(shape_mismatch(entry, entry.kind)),
                }
            }
            SlotTarget::UserOverride(o) => {
                let names = o.kind.dunders();
                let name = match value {
                    Some(_) => names.first(),
                    None => names.get(1),
                };
                let Some(name) = name else {
                    return Ok(false);
                };
                match o.binding(name) {
                    Binding::Method(m) => {
                        let args = match value {
                            Some(value) => vec![key.clone(), value.clone()],
                            None => vec![key.clone()],
                        };
                        self.call_special(m, receiver, &args).map(|_| true)
                    }
                    Binding::Blocked => Ok(false),
                    Binding::Inherited => self.invoke_store(&o.inherited, receiver, key, value),
                }
            }
        }
    }

    // ========== 속성 / descriptor / 호출 ==========

    /// `__getattribute__` 후 `AttributeMissing`이면 `__getattr__` 훅
    pub fn invoke_getattr(&self, target: &SlotTarget, obj: &Value, name: &str) -> VmResult<Value> {
        match target {
            SlotTarget::Absent => Err(self.attribute_missing(obj, name)),
            SlotTarget::Builtin(id) => {
                let entry = builtins::entry(*id);
                match entry.func {
                    BuiltinFn::GetAttr(f) => f(self, obj, name),
                    _ => Err(shape_mismatch(entry, SlotKind::GetAttr)),
                }
            }
            SlotTarget::UserOverride(o) => {
                let primary = match o.binding("__getattribute__") {
                    Binding::Method(m) => self.call_special(m, obj, &[make_string(name)]),
                    Binding::Inherited | Binding::Blocked => {
                        self.invoke_getattr(&o.inherited, obj, name)
                    }
                };
                match primary {
                    Err(e) if matches!(e.kind, VmErrorKind::AttributeMissing { .. }) => {
                        match o.binding("__getattr__") {
                            Binding::Method(hook) => {
                                self.call_special(hook, obj, &[make_string(name)])
                            }
                            _ => Err(e),
                        }
                    }
                    other => other,
                }
            }
        }
    }

    /// `value`가 `None`이면 삭제
    pub fn invoke_setattr(
        &self,
        target: &SlotTarget,
        obj: &Value,
        name: &str,
        value: Option<&Value>,
    ) -> VmResult<()> {
        match target {
            SlotTarget::Absent => Err(err(
                VmErrorKind::TypeError,
                format!(
                    "'{}' object has no attributes (assign to .{})",
                    self.type_name(obj),
                    name
                ),
            )),
            SlotTarget::Builtin(id) => {
                let entry = builtins::entry(*id);
                match entry.func {
                    BuiltinFn::SetAttr(f) => f(self, obj, name, value),
                    _ => Err(shape_mismatch(entry, SlotKind::SetAttr)),
                }
            }
            SlotTarget::UserOverride(o) => {
                let dunder = if value.is_some() { "__setattr__" } else { "__delattr__" };
                match o.binding(dunder) {
                    Binding::Method(m) => {
                        let mut args = vec![make_string(name)];
                        args.extend(value.cloned());
                        self.call_special(m, obj, &args).map(|_| ())
                    }
                    Binding::Inherited => self.invoke_setattr(&o.inherited, obj, name, value),
                    Binding::Blocked => Err(err(
                        VmErrorKind::TypeError,
                        format!(
                            "'{}' object attribute '{}' is read-only",
                            self.type_name(obj),
                            name
                        ),
                    )),
                }
            }
        }
    }

    /// `__get__(obj, owner)`. 슬롯이 없으면 descriptor 자신
    pub fn invoke_descr_get(
        &self,
        target: &SlotTarget,
        descr: &Value,
        obj: Option<&Value>,
        owner: TypeId,
    ) -> VmResult<Value> {
        match target {
            SlotTarget::Absent => Ok(descr.clone()),
            SlotTarget::Builtin(id) => {
                let entry = builtins::entry(*id);
                match entry.func {
                    BuiltinFn::DescrGetSimple(f) => Ok(f(descr, obj)),
                    BuiltinFn::DescrGet(f) => f(self, descr, obj, owner),
                    _ => Err(shape_mismatch(entry, SlotKind::DescrGet)),
                }
            }
            SlotTarget::UserOverride(o) => match o.binding("__get__") {
                Binding::Method(m) => {
                    let instance = obj.cloned().unwrap_or(Value::None);
                    self.call_special(m, descr, &[instance, self.type_object(owner)?])
                }
                Binding::Inherited => self.invoke_descr_get(&o.inherited, descr, obj, owner),
                Binding::Blocked => Ok(descr.clone()),
            },
        }
    }

    pub fn invoke_call(&self, target: &SlotTarget, callee: &Value, args: &[Value]) -> VmResult<Value> {
        let not_callable = || {
            let type_name = self.type_name(callee);
            err(
                VmErrorKind::UnsupportedOperand {
                    op: SlotKind::Call.symbol(),
                    type_name: type_name.clone(),
                },
                format!("'{}' object is not callable", type_name),
            )
        };
        match target {
            SlotTarget::Absent => Err(not_callable()),
            SlotTarget::Builtin(id) => {
                let entry = builtins::entry(*id);
                match entry.func {
                    BuiltinFn::Call(f) => f(self, callee, args),
                    _ => Err(shape_mismatch(entry, SlotKind::Call)),
                }
            }
            SlotTarget::UserOverride(o) => match o.binding("__call__") {
                Binding::Method(m) => self.call_special(m, callee, args),
                Binding::Inherited => self.invoke_call(&o.inherited, callee, args),
                Binding::Blocked => Err(not_callable()),
            },
        }
    }
}
