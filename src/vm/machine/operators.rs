//! 연산자 해석 알고리즘
//!
//! CPython의 `binary_op1` / `ternary_op` / `do_richcompare` 순서를 그대로 따릅니다.
//!
//! # 이항 연산 순서
//!
//! 1. 두 피연산자가 같은 타입이면 왼쪽 슬롯만 시도
//! 2. 두 슬롯이 같은 대상(공통 조상에서 상속)이면 오른쪽은 생략
//! 3. 오른쪽이 왼쪽의 진 서브타입이면 오른쪽을 먼저 시도
//! 4. 왼쪽 시도
//! 5. 3에서 시도하지 않았다면 오른쪽 시도
//! 6. 모두 없거나 `NotImplemented`면 `UnsupportedOperandTypes`

use std::sync::Arc;

use smallvec::SmallVec;
use tracing::trace;

use super::super::builtins;
use super::super::slot::{CompareOp, SlotKind};
use super::super::slot_cache::SlotCacheEntry;
use super::super::slot_table::SlotTarget;
use super::inline_cache::{BinaryCallSite, CacheKey};
use super::method_dispatch::Side;
use super::{Vm, VmError, VmErrorKind, VmResult, err};
use crate::vm::value::Value;

// ========== 디스패치 계획 ==========

#[derive(Debug, Clone)]
pub struct PlanStep {
    pub target: SlotTarget,
    pub side: Side,
}

/// 시도할 슬롯들의 순서. 피연산자 타입 쌍(과 세대)에만 의존하므로 인라인 캐시에 저장됨
#[derive(Debug, Clone, Default)]
pub struct DispatchPlan {
    pub steps: SmallVec<[PlanStep; 3]>,
}

impl DispatchPlan {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    fn push(&mut self, target: &SlotTarget, side: Side) {
        self.steps.push(PlanStep {
            target: target.clone(),
            side,
        });
    }
}

/// 호출 한 번 동안만 쓰이는 피연산자와 해석된 슬롯 테이블
pub struct DispatchContext<'a> {
    pub kind: SlotKind,
    pub v: &'a Value,
    pub w: &'a Value,
    /// 세 번째 피연산자 (`None`이 아닐 때만)
    pub z: Option<&'a Value>,
    pub left: Arc<SlotCacheEntry>,
    pub right: Arc<SlotCacheEntry>,
    pub third: Option<Arc<SlotCacheEntry>>,
}

impl<'a> DispatchContext<'a> {
    pub fn new(vm: &Vm, kind: SlotKind, v: &'a Value, w: &'a Value, z: &'a Value) -> VmResult<Self> {
        let z = (!z.is_none()).then_some(z);
        Ok(Self {
            kind,
            v,
            w,
            z,
            left: vm.slots_of(v.type_id())?,
            right: vm.slots_of(w.type_id())?,
            third: match z {
                Some(z) => Some(vm.slots_of(z.type_id())?),
                None => None,
            },
        })
    }

    pub fn plan(&self) -> DispatchPlan {
        let mut plan = binary_plan(self.kind, &self.left, &self.right);
        if let Some(third) = &self.third {
            let sz = third.get(self.kind);
            let sv = self.left.get(self.kind);
            let sw = self.right.get(self.kind);
            if !sz.is_absent() && !sz.same_as(sv) && !sz.same_as(sw) {
                plan.push(sz, Side::Third);
            }
        }
        plan
    }
}

/// 두 피연산자 타입의 슬롯으로 시도 순서 결정
pub fn binary_plan(kind: SlotKind, left: &SlotCacheEntry, right: &SlotCacheEntry) -> DispatchPlan {
    let mut plan = DispatchPlan::default();
    let sv = left.get(kind);

    if left.type_id == right.type_id {
        if !sv.is_absent() {
            plan.push(sv, Side::Left);
        }
        return plan;
    }

    let sw = right.get(kind);
    let sw = (!sw.is_absent() && !sw.same_as(sv)).then_some(sw);

    let mut right_done = false;
    if let Some(sw) = sw
        && right.is_subtype_of(left.type_id)
        && reflected_first(sv, sw)
    {
        plan.push(sw, Side::Right);
        right_done = true;
    }
    if !sv.is_absent() {
        plan.push(sv, Side::Left);
    }
    if !right_done && let Some(sw) = sw {
        plan.push(sw, Side::Right);
    }
    plan
}

/// 하위 타입 오른쪽 피연산자를 먼저 시도할지.
/// 둘 다 사용자 슬롯이면 반사 메서드를 다시 정의한 경우에만 앞세움
fn reflected_first(sv: &SlotTarget, sw: &SlotTarget) -> bool {
    match (sv, sw) {
        (SlotTarget::UserOverride(_), SlotTarget::UserOverride(_)) => sw.overloads_reflected(sv),
        _ => true,
    }
}

fn describe(target: &SlotTarget) -> String {
    match target {
        SlotTarget::Absent => "absent".to_string(),
        SlotTarget::Builtin(id) => builtins::entry(*id).name.to_string(),
        SlotTarget::UserOverride(o) => format!("user:{}:{}", o.owner, o.kind.name()),
    }
}

impl Vm {
    /// 계획대로 시도. 모두 거절하면 `None`
    pub(super) fn run_plan(
        &self,
        kind: SlotKind,
        plan: &DispatchPlan,
        v: &Value,
        w: &Value,
        z: &Value,
    ) -> VmResult<Option<Value>> {
        for step in &plan.steps {
            let result = self.invoke_ternary(&step.target, step.side, v, w, z)?;
            if self.config().trace_dispatch {
                trace!(
                    kind = kind.name(),
                    side = ?step.side,
                    target = %describe(&step.target),
                    declined = result.is_not_implemented(),
                    "slot tried"
                );
            }
            if !result.is_not_implemented() {
                return Ok(Some(result));
            }
        }
        Ok(None)
    }

    // ========== 단항 ==========

    pub fn resolve_unary(&self, kind: SlotKind, v: &Value) -> VmResult<Value> {
        if kind.arity() != 1 {
            return Err(err(
                VmErrorKind::TypeError,
                format!("slot {} is not a unary operation", kind.name()),
            ));
        }
        let target = self.slot_for(v, kind)?;
        if target.is_absent() {
            let type_name = self.type_name(v);
            return Err(err(
                VmErrorKind::UnsupportedOperand {
                    op: kind.symbol(),
                    type_name: type_name.clone(),
                },
                format!("bad operand type for {}: '{}'", kind.symbol(), type_name),
            ));
        }
        if self.config().trace_dispatch {
            trace!(kind = kind.name(), target = %describe(&target), "unary slot");
        }
        self.invoke_unary(&target, v)
    }

    // ========== 이항 ==========

    pub fn resolve_binary(&self, kind: SlotKind, v: &Value, w: &Value) -> VmResult<Value> {
        if kind.is_ternary() {
            return self.resolve_ternary(kind, v, w, &Value::None);
        }
        if !kind.is_binary_number() {
            return Err(err(
                VmErrorKind::TypeError,
                format!("slot {} is not a binary operation", kind.name()),
            ));
        }
        if let Some(result) = int_fast_path(kind, v, w) {
            return Ok(result);
        }

        let ctx = DispatchContext::new(self, kind, v, w, &Value::None)?;
        let plan = ctx.plan();
        if let Some(result) = self.run_plan(kind, &plan, v, w, &Value::None)? {
            return Ok(result);
        }
        self.binary_fallback(kind, v, w, &ctx.left, &ctx.right)
    }

    /// 인라인 캐시를 거치는 이항 연산
    ///
    /// 캐시 키는 두 타입과 각자의 세대이므로, 타입이 바뀌면 자동으로 미스가 납니다.
    pub fn resolve_binary_cached(
        &self,
        site: &BinaryCallSite,
        v: &Value,
        w: &Value,
    ) -> VmResult<Value> {
        let kind = site.kind();
        let capacity = self.config().inline_cache_capacity;
        if capacity == 0 || site.is_megamorphic() || !kind.is_binary() {
            return self.resolve_binary(kind, v, w);
        }
        if let Some(result) = int_fast_path(kind, v, w) {
            return Ok(result);
        }

        let left_ty = self.types.require(v.type_id())?;
        let right_ty = self.types.require(w.type_id())?;
        let probe = CacheKey {
            left: left_ty.id,
            right: right_ty.id,
            left_generation: left_ty.generation(),
            right_generation: right_ty.generation(),
        };

        let plan = match site.lookup(&probe) {
            Some(plan) => plan,
            None => {
                let left = self.slots_of(probe.left)?;
                let right = self.slots_of(probe.right)?;
                let plan = binary_plan(kind, &left, &right);
                let key = CacheKey {
                    left: left.type_id,
                    right: right.type_id,
                    left_generation: left.generation_seen,
                    right_generation: right.generation_seen,
                };
                site.record(key, plan.clone(), capacity);
                plan
            }
        };

        if let Some(result) = self.run_plan(kind, &plan, v, w, &Value::None)? {
            return Ok(result);
        }
        let left = self.slots_of(v.type_id())?;
        let right = self.slots_of(w.type_id())?;
        self.binary_fallback(kind, v, w, &left, &right)
    }

    /// number 슬롯이 모두 거절한 뒤: sequence 슬롯 폴백, 그것도 없으면 에러
    fn binary_fallback(
        &self,
        kind: SlotKind,
        v: &Value,
        w: &Value,
        left: &SlotCacheEntry,
        right: &SlotCacheEntry,
    ) -> VmResult<Value> {
        match kind.sequence_fallback() {
            // 연결은 왼쪽 피연산자만
            Some(SlotKind::SqConcat) => {
                let concat = left.get(SlotKind::SqConcat);
                if !concat.is_absent() {
                    return self.invoke_binary(concat, Side::Left, v, w);
                }
            }
            Some(SlotKind::SqRepeat) => {
                let repeat = left.get(SlotKind::SqRepeat);
                if !repeat.is_absent() {
                    return self.sequence_repeat(repeat, v, w);
                }
                let repeat = right.get(SlotKind::SqRepeat);
                if !repeat.is_absent() {
                    return self.sequence_repeat(repeat, w, v);
                }
            }
            _ => {}
        }
        Err(self.unsupported_operands(kind.symbol(), &[v, w]))
    }

    fn sequence_repeat(&self, target: &SlotTarget, seq: &Value, count: &Value) -> VmResult<Value> {
        if !self.has_slot(count, SlotKind::Index)? {
            return Err(err(
                VmErrorKind::TypeError,
                format!(
                    "can't multiply sequence by non-int of type '{}'",
                    self.type_name(count)
                ),
            ));
        }
        let n = self.index(count)?;
        let n = isize::try_from(n).map_err(|_| {
            err(
                VmErrorKind::Overflow,
                "cannot fit 'int' into an index-sized integer",
            )
        })?;
        self.invoke_size_arg(target, seq, n)
    }

    pub(super) fn unsupported_operands(&self, op: &'static str, operands: &[&Value]) -> VmError {
        let type_names: Vec<String> = operands.iter().map(|v| self.type_name(v)).collect();
        let quoted: Vec<String> = type_names.iter().map(|n| format!("'{}'", n)).collect();
        let listed = match quoted.as_slice() {
            [a, b] => format!("{} and {}", a, b),
            many => many.join(", "),
        };
        err(
            VmErrorKind::UnsupportedOperandTypes { op, type_names },
            format!("unsupported operand type(s) for {}: {}", op, listed),
        )
    }

    // ========== 삼항 ==========

    /// `pow(v, w, z)`. `z`가 `None`이면 두 인자 형태
    pub fn resolve_ternary(&self, kind: SlotKind, v: &Value, w: &Value, z: &Value) -> VmResult<Value> {
        if !kind.is_ternary() {
            return Err(err(
                VmErrorKind::TypeError,
                format!("slot {} is not a ternary operation", kind.name()),
            ));
        }
        let ctx = DispatchContext::new(self, kind, v, w, z)?;
        let plan = ctx.plan();
        if let Some(result) = self.run_plan(kind, &plan, v, w, z)? {
            return Ok(result);
        }
        Err(match ctx.z {
            Some(z) => self.unsupported_operands(kind.symbol(), &[v, w, z]),
            None => self.unsupported_operands(kind.symbol(), &[v, w]),
        })
    }

    // ========== 복합 대입 ==========

    /// `v op= w`: 왼쪽 타입의 `__iadd__` 계열을 먼저, 없거나 거절하면 일반 이항 연산
    pub fn resolve_inplace(&self, kind: SlotKind, v: &Value, w: &Value) -> VmResult<Value> {
        let Some(symbol) = kind.inplace_symbol() else {
            return Err(err(
                VmErrorKind::TypeError,
                format!("slot {} has no in-place form", kind.name()),
            ));
        };

        if let Some(name) = kind.inplace_dunder()
            && let Some(method) = self.types.lookup(v.type_id(), name)
            && !method.is_none()
        {
            let result = self.call_special(&method, v, std::slice::from_ref(w))?;
            if !result.is_not_implemented() {
                return Ok(result);
            }
        }

        self.resolve_binary(kind, v, w).map_err(|e| {
            let relabel = matches!(
                &e.kind,
                VmErrorKind::UnsupportedOperandTypes { op, .. } if *op == kind.symbol()
            );
            if relabel {
                self.unsupported_operands(symbol, &[v, w])
            } else {
                e
            }
        })
    }

    // ========== 비교 ==========

    /// CPython `do_richcompare`
    pub fn rich_compare(&self, v: &Value, w: &Value, op: CompareOp) -> VmResult<Value> {
        let left = self.slots_of(v.type_id())?;
        let right = self.slots_of(w.type_id())?;
        let sv = left.get(SlotKind::RichCompare);
        let sw = right.get(SlotKind::RichCompare);

        let mut checked_reverse = false;
        if left.type_id != right.type_id && right.is_subtype_of(left.type_id) && !sw.is_absent() {
            checked_reverse = true;
            let result = self.invoke_compare(sw, op.reflected(), w, v)?;
            if !result.is_not_implemented() {
                return Ok(result);
            }
        }
        if !sv.is_absent() {
            let result = self.invoke_compare(sv, op, v, w)?;
            if !result.is_not_implemented() {
                return Ok(result);
            }
        }
        if !checked_reverse && !sw.is_absent() {
            let result = self.invoke_compare(sw, op.reflected(), w, v)?;
            if !result.is_not_implemented() {
                return Ok(result);
            }
        }

        match op {
            CompareOp::Eq => Ok(Value::Bool(v.is(w))),
            CompareOp::Ne => Ok(Value::Bool(!v.is(w))),
            _ => {
                let type_names = vec![self.type_name(v), self.type_name(w)];
                let message = format!(
                    "'{}' not supported between instances of '{}' and '{}'",
                    op.symbol(),
                    type_names[0],
                    type_names[1]
                );
                Err(err(
                    VmErrorKind::UnsupportedOperandTypes {
                        op: op.symbol(),
                        type_names,
                    },
                    message,
                ))
            }
        }
    }

    /// 동일한 객체면 비교 없이 `==` 참, `!=` 거짓
    pub fn rich_compare_bool(&self, v: &Value, w: &Value, op: CompareOp) -> VmResult<bool> {
        if v.is(w) {
            match op {
                CompareOp::Eq => return Ok(true),
                CompareOp::Ne => return Ok(false),
                _ => {}
            }
        }
        let result = self.rich_compare(v, w, op)?;
        self.truthy(&result)
    }
}

/// 두 피연산자가 모두 정확한 `int`일 때 덧셈/뺄셈/곱셈은 슬롯을 거치지 않음.
/// 오버플로면 슬롯 경로로 넘겨 같은 에러를 받음
fn int_fast_path(kind: SlotKind, v: &Value, w: &Value) -> Option<Value> {
    let (Value::Int(a), Value::Int(b)) = (v, w) else {
        return None;
    };
    match kind {
        SlotKind::Add => a.checked_add(*b),
        SlotKind::Subtract => a.checked_sub(*b),
        SlotKind::Multiply => a.checked_mul(*b),
        _ => None,
    }
    .map(Value::Int)
}
