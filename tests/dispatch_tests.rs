use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use pyhyeon_slots::vm::utils::{make_function, make_string};
use pyhyeon_slots::vm::{TYPE_INT, TypeId};
use pyhyeon_slots::{BinaryCallSite, SlotKind, Value, Vm, VmConfig, VmErrorKind};

/// 디스패치 엔진 통합 테스트: 연산자 해석 순서와 캐시 일관성을
/// 공개 API만으로 확인합니다.

fn new_class(vm: &Vm, name: &str, bases: &[TypeId], methods: Vec<(&str, Value)>) -> TypeId {
    let namespace: HashMap<String, Value> = methods
        .into_iter()
        .map(|(n, v)| (n.to_string(), v))
        .collect();
    vm.new_type(name, bases, namespace).unwrap()
}

fn tracked(name: &str, calls: &Arc<AtomicUsize>, result: Value) -> Value {
    let calls = calls.clone();
    make_function(name, move |_, _| {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(result.clone())
    })
}

fn constant(name: &str, result: Value) -> Value {
    make_function(name, move |_, _| Ok(result.clone()))
}

#[test]
fn test_same_type_operands_call_slot_once() {
    let vm = Vm::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let t = new_class(
        &vm,
        "T",
        &[],
        vec![("__mul__", tracked("__mul__", &calls, Value::Int(1)))],
    );
    let a = vm.new_instance(t, &[]).unwrap();
    let b = vm.new_instance(t, &[]).unwrap();

    assert_eq!(vm.resolve_binary(SlotKind::Multiply, &a, &b).unwrap(), Value::Int(1));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_subclass_slot_is_tried_before_base() {
    let vm = Vm::new();
    let order = Arc::new(std::sync::Mutex::new(Vec::new()));
    let log = |tag: &'static str| {
        let order = order.clone();
        make_function(tag, move |_, _| {
            order.lock().unwrap().push(tag);
            Ok(Value::NotImplemented)
        })
    };
    let base = new_class(&vm, "Base", &[], vec![("__and__", log("Base.__and__"))]);
    let sub = new_class(&vm, "Sub", &[base], vec![("__rand__", log("Sub.__rand__"))]);

    let e = vm
        .resolve_binary(
            SlotKind::And,
            &vm.new_instance(base, &[]).unwrap(),
            &vm.new_instance(sub, &[]).unwrap(),
        )
        .unwrap_err();
    assert_eq!(e.message, "unsupported operand type(s) for &: 'Base' and 'Sub'");
    assert_eq!(*order.lock().unwrap(), vec!["Sub.__rand__", "Base.__and__"]);
}

#[test]
fn test_subclass_result_wins() {
    let vm = Vm::new();
    let base = new_class(&vm, "Base", &[], vec![("__or__", constant("__or__", make_string("base")))]);
    let sub = new_class(&vm, "Sub", &[base], vec![("__ror__", constant("__ror__", make_string("sub")))]);
    let r = vm
        .resolve_binary(
            SlotKind::Or,
            &vm.new_instance(base, &[]).unwrap(),
            &vm.new_instance(sub, &[]).unwrap(),
        )
        .unwrap();
    assert_eq!(r, make_string("sub"));
}

#[test]
fn test_reflected_value_used_when_left_declines() {
    let vm = Vm::new();
    let base = new_class(
        &vm,
        "Base",
        &[],
        vec![("__truediv__", constant("__truediv__", Value::NotImplemented))],
    );
    let other = new_class(
        &vm,
        "Other",
        &[],
        vec![("__rtruediv__", constant("__rtruediv__", Value::Float(0.5)))],
    );
    let r = vm
        .resolve_binary(
            SlotKind::TrueDivide,
            &vm.new_instance(base, &[]).unwrap(),
            &vm.new_instance(other, &[]).unwrap(),
        )
        .unwrap();
    assert_eq!(r, Value::Float(0.5));
}

#[test]
fn test_total_failure_names_both_types() {
    let vm = Vm::new();
    let x = new_class(&vm, "X", &[], vec![]);
    let y = new_class(&vm, "Y", &[], vec![]);
    let e = vm
        .resolve_binary(
            SlotKind::Remainder,
            &vm.new_instance(x, &[]).unwrap(),
            &vm.new_instance(y, &[]).unwrap(),
        )
        .unwrap_err();
    assert_eq!(
        e.kind,
        VmErrorKind::UnsupportedOperandTypes {
            op: "%",
            type_names: vec!["X".to_string(), "Y".to_string()],
        }
    );
}

#[test]
fn test_inherited_slot_invoked_once_for_sibling_types() {
    let vm = Vm::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let base = new_class(
        &vm,
        "Base",
        &[],
        vec![("__xor__", tracked("__xor__", &calls, Value::NotImplemented))],
    );
    let left = new_class(&vm, "Left", &[base], vec![]);
    let right = new_class(&vm, "Right", &[base], vec![]);

    let e = vm
        .resolve_binary(
            SlotKind::Xor,
            &vm.new_instance(left, &[]).unwrap(),
            &vm.new_instance(right, &[]).unwrap(),
        )
        .unwrap_err();
    assert!(matches!(e.kind, VmErrorKind::UnsupportedOperandTypes { .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_ternary_modulus_type_participates() {
    let vm = Vm::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let modulus = new_class(
        &vm,
        "Modulus",
        &[],
        vec![("__pow__", tracked("__pow__", &calls, Value::Int(7)))],
    );
    let plain = new_class(&vm, "Plain", &[], vec![]);
    let r = vm
        .resolve_ternary(
            SlotKind::Power,
            &vm.new_instance(plain, &[]).unwrap(),
            &vm.new_instance(plain, &[]).unwrap(),
            &vm.new_instance(modulus, &[]).unwrap(),
        )
        .unwrap();
    assert_eq!(r, Value::Int(7));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_ternary_modulus_slot_not_repeated() {
    let vm = Vm::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let base = new_class(
        &vm,
        "Base",
        &[],
        vec![("__pow__", tracked("__pow__", &calls, Value::NotImplemented))],
    );
    let sub = new_class(&vm, "Sub", &[base], vec![]);
    let v = vm.new_instance(base, &[]).unwrap();
    let z = vm.new_instance(sub, &[]).unwrap();

    let e = vm
        .resolve_ternary(SlotKind::Power, &v, &Value::Int(2), &z)
        .unwrap_err();
    assert_eq!(
        e.message,
        "unsupported operand type(s) for ** or pow(): 'Base', 'int', 'Sub'"
    );
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_int_plus_unrelated_type_fails() {
    let vm = Vm::new();
    let _big_int = new_class(
        &vm,
        "BigInt",
        &[],
        vec![("__add__", constant("__add__", make_string("big")))],
    );
    let non_numeric = new_class(&vm, "NonNumeric", &[], vec![]);
    let e = vm
        .resolve_binary(
            SlotKind::Add,
            &Value::Int(1),
            &vm.new_instance(non_numeric, &[]).unwrap(),
        )
        .unwrap_err();
    assert_eq!(
        e.kind,
        VmErrorKind::UnsupportedOperandTypes {
            op: "+",
            type_names: vec!["int".to_string(), "NonNumeric".to_string()],
        }
    );
    assert_eq!(
        e.to_string(),
        "TypeError: unsupported operand type(s) for +: 'int' and 'NonNumeric'"
    );
}

#[test]
fn test_user_exception_propagates_unchanged() {
    let vm = Vm::new();
    let t = new_class(
        &vm,
        "T",
        &[],
        vec![(
            "__add__",
            make_function("__add__", |_, _| {
                Err(pyhyeon_slots::vm::err(
                    VmErrorKind::Raised("KeyError".to_string()),
                    "'boom'",
                ))
            }),
        )],
    );
    let x = vm.new_instance(t, &[]).unwrap();
    let e = vm.resolve_binary(SlotKind::Add, &x, &Value::Int(1)).unwrap_err();
    assert_eq!(e.kind, VmErrorKind::Raised("KeyError".to_string()));
    assert_eq!(e.to_string(), "KeyError: 'boom'");
}

#[test]
fn test_invalidate_then_resolve_sees_new_namespace() {
    let vm = Vm::new();
    let t = new_class(&vm, "T", &[], vec![("__neg__", constant("__neg__", Value::Int(1)))]);
    let sub = new_class(&vm, "Sub", &[t], vec![]);
    let x = vm.new_instance(sub, &[]).unwrap();
    assert_eq!(vm.resolve_unary(SlotKind::Negative, &x).unwrap(), Value::Int(1));

    vm.set_type_attr(t, "__neg__", constant("__neg__", Value::Int(2))).unwrap();
    vm.invalidate(t).unwrap();
    assert_eq!(vm.resolve_unary(SlotKind::Negative, &x).unwrap(), Value::Int(2));
}

#[test]
fn test_concurrent_readers_never_go_backwards() {
    const WRITES: i64 = 50;
    let vm = Arc::new(Vm::new());
    let t = new_class(&vm, "T", &[], vec![("__neg__", constant("__neg__", Value::Int(0)))]);
    let x = vm.new_instance(t, &[]).unwrap();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let vm = vm.clone();
            let x = x.clone();
            thread::spawn(move || {
                let mut last = 0;
                for _ in 0..500 {
                    let Value::Int(seen) = vm.resolve_unary(SlotKind::Negative, &x).unwrap() else {
                        panic!("unexpected result");
                    };
                    assert!(seen >= last, "stale slot table: {} after {}", seen, last);
                    assert!((0..=WRITES).contains(&seen));
                    last = seen;
                }
            })
        })
        .collect();

    for i in 1..=WRITES {
        vm.set_type_attr(t, "__neg__", constant("__neg__", Value::Int(i)))
            .unwrap();
    }
    for r in readers {
        r.join().unwrap();
    }
    assert_eq!(
        vm.resolve_unary(SlotKind::Negative, &x).unwrap(),
        Value::Int(WRITES)
    );
}

#[test]
fn test_shared_call_site_across_threads() {
    let vm = Arc::new(Vm::with_config(VmConfig {
        inline_cache_capacity: 2,
        ..VmConfig::default()
    }));
    let site = Arc::new(BinaryCallSite::new(SlotKind::Add));
    let my_int = new_class(&vm, "MyInt", &[TYPE_INT], vec![]);

    let workers: Vec<_> = (0..4)
        .map(|n| {
            let vm = vm.clone();
            let site = site.clone();
            thread::spawn(move || {
                let value = vm.new_instance(my_int, &[Value::Int(n)]).unwrap();
                for _ in 0..100 {
                    let r = vm
                        .resolve_binary_cached(&site, &value, &Value::Float(0.5))
                        .unwrap();
                    assert_eq!(r, Value::Float(n as f64 + 0.5));
                    let r = vm.resolve_binary_cached(&site, &value, &Value::Int(1)).unwrap();
                    assert_eq!(r, Value::Int(n + 1));
                }
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap();
    }
    assert_eq!(site.len(), 2);
    assert!(!site.is_megamorphic());
}
