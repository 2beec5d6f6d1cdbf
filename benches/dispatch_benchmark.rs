use pyhyeon_slots::vm::TYPE_INT;
use pyhyeon_slots::vm::utils::make_function;
use pyhyeon_slots::{BinaryCallSite, SlotKind, Value, Vm};
use std::collections::HashMap;
use std::time::Instant;

const ITERATIONS: usize = 200_000;

fn main() {
    println!("=== Pyhyeon Slot Dispatch Benchmark ===\n");
    println!("Test: {} binary additions per scenario\n", ITERATIONS);

    let vm = Vm::new();

    // 사용자 클래스: __add__ / __radd__ 재정의
    let mut namespace = HashMap::new();
    namespace.insert(
        "__add__".to_string(),
        make_function("__add__", |_, _| Ok(Value::Int(1))),
    );
    namespace.insert(
        "__radd__".to_string(),
        make_function("__radd__", |_, _| Ok(Value::Int(2))),
    );
    let vector = match vm.new_type("Vector", &[], namespace) {
        Ok(id) => id,
        Err(e) => {
            eprintln!("Type creation error: {}", e);
            return;
        }
    };
    let my_int = match vm.new_type("MyInt", &[TYPE_INT], HashMap::new()) {
        Ok(id) => id,
        Err(e) => {
            eprintln!("Type creation error: {}", e);
            return;
        }
    };
    let (Ok(v), Ok(seven)) = (
        vm.new_instance(vector, &[]),
        vm.new_instance(my_int, &[Value::Int(7)]),
    ) else {
        eprintln!("Instance creation error");
        return;
    };

    let scenarios: Vec<(&str, Value, Value)> = vec![
        ("int + int", Value::Int(3), Value::Int(4)),
        ("int + float", Value::Int(3), Value::Float(0.5)),
        ("MyInt + int", seven.clone(), Value::Int(1)),
        ("Vector + Vector", v.clone(), v.clone()),
        ("int + Vector", Value::Int(1), v.clone()),
    ];

    for (label, left, right) in &scenarios {
        let start = Instant::now();
        for _ in 0..ITERATIONS {
            if let Err(e) = vm.resolve_binary(SlotKind::Add, left, right) {
                eprintln!("Runtime error: {}", e);
                return;
            }
        }
        let uncached = start.elapsed();

        let site = BinaryCallSite::new(SlotKind::Add);
        let start = Instant::now();
        for _ in 0..ITERATIONS {
            if let Err(e) = vm.resolve_binary_cached(&site, left, right) {
                eprintln!("Runtime error: {}", e);
                return;
            }
        }
        let cached = start.elapsed();

        println!("{}", label);
        println!(
            "  resolve_binary:        {:.2}ms ({:.1}ns/op)",
            uncached.as_secs_f64() * 1000.0,
            uncached.as_secs_f64() * 1e9 / ITERATIONS as f64
        );
        println!(
            "  resolve_binary_cached: {:.2}ms ({:.1}ns/op)",
            cached.as_secs_f64() * 1000.0,
            cached.as_secs_f64() * 1e9 / ITERATIONS as f64
        );
        println!("  speedup: {:.2}x\n", uncached.as_secs_f64() / cached.as_secs_f64());
    }

    // 타입 변경 후 재해석 비용
    let start = Instant::now();
    for i in 0..1000 {
        let result = Value::Int(i);
        let method = make_function("__add__", move |_, _| Ok(result.clone()));
        if let Err(e) = vm.set_type_attr(vector, "__add__", method) {
            eprintln!("Runtime error: {}", e);
            return;
        }
        if let Err(e) = vm.resolve_binary(SlotKind::Add, &v, &v) {
            eprintln!("Runtime error: {}", e);
            return;
        }
    }
    let elapsed = start.elapsed();
    println!("=== Invalidation ===");
    println!(
        "1000 attribute writes + re-resolution: {:.2}ms",
        elapsed.as_secs_f64() * 1000.0
    );
}
