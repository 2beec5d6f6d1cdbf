//! 단일 피연산자 프로토콜: len, [], hash, bool, index, iter, 속성, descriptor

use super::super::slot::{ASSIGN_ORDER, LENGTH_ORDER, SUBSCRIPT_ORDER, SlotKind};
use super::super::type_def::{TYPE_TUPLE, TypeId};
use super::super::utils::{as_float, as_int, as_str, as_tuple};
use super::method_dispatch::Side;
use super::{Vm, VmError, VmErrorKind, VmResult, err};
use crate::vm::value::{ObjectData, Value};

impl Vm {
    fn unsupported(&self, op: &'static str, v: &Value, message: String) -> VmError {
        err(
            VmErrorKind::UnsupportedOperand {
                op,
                type_name: self.type_name(v),
            },
            message,
        )
    }

    // ========== 컨테이너 ==========

    /// `len(v)`: sequence 길이 슬롯, 그다음 mapping 길이 슬롯
    pub fn length(&self, v: &Value) -> VmResult<usize> {
        let slots = self.slots_of(v.type_id())?;
        for kind in LENGTH_ORDER {
            let target = slots.get(kind);
            if !target.is_absent() {
                return self.invoke_len(target, v);
            }
        }
        Err(self.no_len(v))
    }

    /// `v[key]`: mapping 슬롯 우선, 없으면 키를 정수화해 sequence 슬롯
    pub fn get_item(&self, v: &Value, key: &Value) -> VmResult<Value> {
        let slots = self.slots_of(v.type_id())?;
        for kind in SUBSCRIPT_ORDER {
            let target = slots.get(kind);
            if target.is_absent() {
                continue;
            }
            return match kind {
                SlotKind::SqItem => {
                    let index = self.sequence_index(v, key)?;
                    self.invoke_size_arg(target, v, index)
                }
                _ => self.invoke_binary(target, Side::Left, v, key),
            };
        }
        let type_name = self.type_name(v);
        Err(self.unsupported(
            SlotKind::MpSubscript.symbol(),
            v,
            format!("'{}' object is not subscriptable", type_name),
        ))
    }

    pub fn set_item(&self, v: &Value, key: &Value, value: &Value) -> VmResult<()> {
        if self.store_item(v, key, Some(value))? {
            return Ok(());
        }
        let type_name = self.type_name(v);
        Err(self.unsupported(
            SlotKind::MpAssSubscript.symbol(),
            v,
            format!("'{}' object does not support item assignment", type_name),
        ))
    }

    pub fn del_item(&self, v: &Value, key: &Value) -> VmResult<()> {
        if self.store_item(v, key, None)? {
            return Ok(());
        }
        let type_name = self.type_name(v);
        Err(self.unsupported(
            SlotKind::MpAssSubscript.symbol(),
            v,
            format!("'{}' object doesn't support item deletion", type_name),
        ))
    }

    fn store_item(&self, v: &Value, key: &Value, value: Option<&Value>) -> VmResult<bool> {
        let slots = self.slots_of(v.type_id())?;
        for kind in ASSIGN_ORDER {
            let target = slots.get(kind);
            if target.is_absent() {
                continue;
            }
            let handled = match kind {
                SlotKind::SqAssItem => {
                    let index = self.sequence_index(v, key)?;
                    self.invoke_store(target, v, &Value::Int(index as i64), value)?
                }
                _ => self.invoke_store(target, v, key, value)?,
            };
            if handled {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn sequence_index(&self, v: &Value, key: &Value) -> VmResult<isize> {
        if !self.has_slot(key, SlotKind::Index)? {
            return Err(err(
                VmErrorKind::TypeError,
                format!(
                    "{} indices must be integers, not '{}'",
                    self.type_name(v),
                    self.type_name(key)
                ),
            ));
        }
        let index = self.index(key)?;
        isize::try_from(index).map_err(|_| {
            err(
                VmErrorKind::IndexError,
                "cannot fit 'int' into an index-sized integer",
            )
        })
    }

    // ========== 변환 ==========

    pub fn hash(&self, v: &Value) -> VmResult<i64> {
        let target = self.slot_for(v, SlotKind::Hash)?;
        if target.is_absent() {
            let type_name = self.type_name(v);
            return Err(self.unsupported(
                SlotKind::Hash.symbol(),
                v,
                format!("unhashable type: '{}'", type_name),
            ));
        }
        self.invoke_hash(&target, v)
    }

    /// 진리값: `__bool__`, 없으면 `__len__`, 둘 다 없으면 참
    pub fn truthy(&self, v: &Value) -> VmResult<bool> {
        match v {
            Value::Bool(b) => return Ok(*b),
            Value::None => return Ok(false),
            Value::Int(i) => return Ok(*i != 0),
            _ => {}
        }
        let slots = self.slots_of(v.type_id())?;
        let target = slots.get(SlotKind::Bool);
        if !target.is_absent() {
            return self.invoke_inquiry(target, v);
        }
        for kind in LENGTH_ORDER {
            let target = slots.get(kind);
            if !target.is_absent() {
                return Ok(self.invoke_len(target, v)? != 0);
            }
        }
        Ok(true)
    }

    /// `operator.index(v)`: 정확한 int가 나와야 함
    pub fn index(&self, v: &Value) -> VmResult<i64> {
        if let Value::Int(i) = v {
            return Ok(*i);
        }
        let target = self.slot_for(v, SlotKind::Index)?;
        if target.is_absent() {
            return Err(err(
                VmErrorKind::TypeError,
                format!(
                    "'{}' object cannot be interpreted as an integer",
                    self.type_name(v)
                ),
            ));
        }
        let result = self.invoke_unary(&target, v)?;
        as_int(&result).ok_or_else(|| {
            err(
                VmErrorKind::TypeError,
                format!("__index__ returned non-int (type {})", self.type_name(&result)),
            )
        })
    }

    /// `int(v)`: `__int__`, 없으면 `__index__`
    pub fn int_value(&self, v: &Value) -> VmResult<i64> {
        if let Value::Int(i) = v {
            return Ok(*i);
        }
        let target = self.slot_for(v, SlotKind::Int)?;
        if target.is_absent() {
            if self.has_slot(v, SlotKind::Index)? {
                return self.index(v);
            }
            return Err(err(
                VmErrorKind::TypeError,
                format!(
                    "int() argument must be a string, a bytes-like object or a real number, not '{}'",
                    self.type_name(v)
                ),
            ));
        }
        let result = self.invoke_unary(&target, v)?;
        as_int(&result).ok_or_else(|| {
            err(
                VmErrorKind::TypeError,
                format!("__int__ returned non-int (type {})", self.type_name(&result)),
            )
        })
    }

    /// `float(v)`: `__float__`, 없으면 `__index__`
    pub fn float_value(&self, v: &Value) -> VmResult<f64> {
        if let Value::Float(f) = v {
            return Ok(*f);
        }
        let target = self.slot_for(v, SlotKind::Float)?;
        if target.is_absent() {
            if self.has_slot(v, SlotKind::Index)? {
                return Ok(self.index(v)? as f64);
            }
            return Err(err(
                VmErrorKind::TypeError,
                format!("must be real number, not {}", self.type_name(v)),
            ));
        }
        let result = self.invoke_unary(&target, v)?;
        let is_float = match &result {
            Value::Float(_) => true,
            Value::Object(obj) => matches!(obj.data, ObjectData::Float(_)),
            _ => false,
        };
        match as_float(&result) {
            Some(f) if is_float => Ok(f),
            _ => Err(err(
                VmErrorKind::TypeError,
                format!(
                    "{}.__float__ returned non-float (type {})",
                    self.type_name(v),
                    self.type_name(&result)
                ),
            )),
        }
    }

    pub fn repr(&self, v: &Value) -> VmResult<String> {
        let target = self.slot_for(v, SlotKind::Repr)?;
        let result = self.invoke_unary(&target, v)?;
        match as_str(&result) {
            Some(s) => Ok(s.to_string()),
            None => Err(err(
                VmErrorKind::TypeError,
                format!(
                    "__repr__ returned non-string (type {})",
                    self.type_name(&result)
                ),
            )),
        }
    }

    // ========== 반복 ==========

    pub fn iter(&self, v: &Value) -> VmResult<Value> {
        let target = self.slot_for(v, SlotKind::Iter)?;
        if target.is_absent() {
            let type_name = self.type_name(v);
            return Err(self.unsupported(
                SlotKind::Iter.symbol(),
                v,
                format!("'{}' object is not iterable", type_name),
            ));
        }
        let it = self.invoke_unary(&target, v)?;
        if !self.has_slot(&it, SlotKind::IterNext)? {
            return Err(err(
                VmErrorKind::TypeError,
                format!(
                    "iter() returned non-iterator of type '{}'",
                    self.type_name(&it)
                ),
            ));
        }
        Ok(it)
    }

    /// 다음 원소. 소진되면 `None`
    pub fn next(&self, it: &Value) -> VmResult<Option<Value>> {
        let target = self.slot_for(it, SlotKind::IterNext)?;
        if target.is_absent() {
            return Err(err(
                VmErrorKind::TypeError,
                format!("'{}' object is not an iterator", self.type_name(it)),
            ));
        }
        match self.invoke_unary(&target, it) {
            Ok(v) => Ok(Some(v)),
            Err(e) if e.kind == VmErrorKind::StopIteration => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn collect_iterable(&self, v: &Value) -> VmResult<Vec<Value>> {
        if v.type_id() == TYPE_TUPLE
            && let Some(items) = as_tuple(v)
        {
            return Ok(items.to_vec());
        }
        let it = self.iter(v)?;
        let mut items = Vec::new();
        while let Some(item) = self.next(&it)? {
            items.push(item);
        }
        Ok(items)
    }

    // ========== 속성 ==========

    pub fn get_attr(&self, v: &Value, name: &str) -> VmResult<Value> {
        let target = self.slot_for(v, SlotKind::GetAttr)?;
        self.invoke_getattr(&target, v, name)
    }

    pub fn set_attr(&self, v: &Value, name: &str, value: Value) -> VmResult<()> {
        let target = self.slot_for(v, SlotKind::SetAttr)?;
        self.invoke_setattr(&target, v, name, Some(&value))
    }

    pub fn del_attr(&self, v: &Value, name: &str) -> VmResult<()> {
        let target = self.slot_for(v, SlotKind::SetAttr)?;
        self.invoke_setattr(&target, v, name, None)
    }

    // ========== descriptor ==========

    /// `descr.__get__(obj, owner)`. `__get__`이 없으면 descriptor 자신
    pub fn descr_get(&self, descr: &Value, obj: Option<&Value>, owner: TypeId) -> VmResult<Value> {
        let target = self.slot_for(descr, SlotKind::DescrGet)?;
        if target.is_absent() {
            return Ok(descr.clone());
        }
        self.invoke_descr_get(&target, descr, obj, owner)
    }

    /// `descr.__set__(obj, value)` / `descr.__delete__(obj)`
    pub fn descr_set(&self, descr: &Value, obj: &Value, value: Option<&Value>) -> VmResult<()> {
        let target = self.slot_for(descr, SlotKind::DescrSet)?;
        if self.invoke_store(&target, descr, obj, value)? {
            return Ok(());
        }
        let attr = if value.is_some() { "__set__" } else { "__delete__" };
        Err(self.attribute_missing(descr, attr))
    }

    /// `__set__`(또는 `__delete__`)을 가진 descriptor인지
    pub fn is_data_descriptor(&self, v: &Value) -> VmResult<bool> {
        self.has_slot(v, SlotKind::DescrSet)
    }
}
