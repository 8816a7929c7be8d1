//! End-to-end behavior of scripts in the ambient scope

use scriptvm::{
    compile_function, create_context, create_script, is_context, measure_memory, run_in_context,
    run_in_new_context, run_in_this_context, AmbientScope, CompileFunctionOptions,
    ContextOptions, MeasureMemoryOptions, RunOptions, Script, ScriptOptions, ScriptValue,
    VmError, VmOperation,
};
use serde_json::json;

fn run(code: &str) -> ScriptValue {
    run_in_this_context(code, RunOptions::default()).expect("script should run")
}

#[test]
fn test_script_returns_last_expression() {
    let script = create_script("const e2e_a = 2; const e2e_b = 3; e2e_a * e2e_b", ScriptOptions::default());
    assert_eq!(
        script.run_in_this_context(RunOptions::default()).unwrap(),
        ScriptValue::Number(6.0)
    );
}

#[test]
fn test_shorthand_equals_script() {
    for code in ["'abc'.toUpperCase()", "typeof undefined", "[1, 2].length", "void 0"] {
        let via_script = create_script(code, ScriptOptions::default())
            .run_in_this_context(RunOptions::default())
            .unwrap();
        assert_eq!(run(code), via_script, "mismatch for {}", code);
    }
}

#[test]
fn test_globals_visible_afterwards() {
    run("var e2e_var = 'v'; function e2e_fn(x) { return x + 1; } let e2e_let = 5;");
    assert_eq!(run("e2e_var"), ScriptValue::String("v".to_string()));
    assert_eq!(run("e2e_fn(e2e_let)"), ScriptValue::Number(6.0));
    assert_eq!(run("globalThis.e2e_var"), ScriptValue::String("v".to_string()));

    let globals = AmbientScope::global().unwrap().user_globals().unwrap();
    assert_eq!(globals["e2e_var"], json!("v"));
}

#[test]
fn test_script_sees_existing_globals() {
    run("var e2e_counter = 1;");
    let increment = Script::new("++e2e_counter", ScriptOptions::default());
    increment.run_in_this_context(RunOptions::default()).unwrap();
    increment.run_in_this_context(RunOptions::default()).unwrap();
    assert_eq!(run("e2e_counter"), ScriptValue::Number(3.0));
}

#[test]
fn test_numeric_source_is_coerced() {
    let script = Script::new(5, ScriptOptions::default());
    assert_eq!(script.code(), "5");
    assert_eq!(
        script.run_in_this_context(RunOptions::default()).unwrap(),
        ScriptValue::Number(5.0)
    );
}

#[test]
fn test_thrown_errors_propagate() {
    let err = run_in_this_context("null.e2e_property", RunOptions::default()).unwrap_err();
    match err {
        VmError::Thrown(thrown) => {
            assert_eq!(thrown.name.as_deref(), Some("TypeError"));
            assert!(!thrown.message.is_empty());
        }
        other => panic!("expected thrown error, got {:?}", other),
    }

    let err = run_in_this_context("throw {code: 7}", RunOptions::default()).unwrap_err();
    let thrown = err.thrown().expect("thrown object");
    assert_eq!(thrown.value, ScriptValue::Object(json!({"code": 7})));
}

#[test]
fn test_undefined_reference_is_an_error() {
    let err = run_in_this_context("e2e_totally_undefined_xyz", RunOptions::default()).unwrap_err();
    assert_eq!(
        err.thrown().and_then(|t| t.name.as_deref()),
        Some("ReferenceError")
    );
}

#[test]
fn test_every_stub_names_its_operation_without_side_effects() {
    let code = "globalThis.e2e_stub_touched = true";
    let script = Script::new(code, ScriptOptions::default());
    let context = json!({"a": 1});

    let results: Vec<(VmOperation, VmError)> = vec![
        (
            VmOperation::CreateContext,
            create_context(&context, ContextOptions::default()).unwrap_err(),
        ),
        (
            VmOperation::RunInContext,
            run_in_context(code, &context, RunOptions::default()).unwrap_err(),
        ),
        (
            VmOperation::RunInNewContext,
            run_in_new_context(code, Some(&context), RunOptions::default()).unwrap_err(),
        ),
        (VmOperation::IsContext, is_context(&context).unwrap_err()),
        (
            VmOperation::CompileFunction,
            compile_function(code, &[], CompileFunctionOptions::default()).unwrap_err(),
        ),
        (
            VmOperation::MeasureMemory,
            measure_memory(MeasureMemoryOptions::default()).unwrap_err(),
        ),
        (
            VmOperation::ScriptRunInContext,
            script
                .run_in_context(&context, RunOptions::default())
                .unwrap_err(),
        ),
        (
            VmOperation::ScriptRunInNewContext,
            script
                .run_in_new_context(None, RunOptions::default())
                .unwrap_err(),
        ),
        (
            VmOperation::ScriptCreateCachedData,
            script.create_cached_data().unwrap_err(),
        ),
    ];

    assert_eq!(results.len(), VmOperation::ALL.len());
    for (expected, err) in results {
        assert!(
            matches!(err, VmError::NotImplemented { operation } if operation == expected),
            "{} gave {:?}",
            expected,
            err
        );
    }

    assert_eq!(
        run("typeof e2e_stub_touched"),
        ScriptValue::String("undefined".to_string())
    );
}

#[test]
fn test_concurrent_callers_share_one_scope() {
    run("var e2e_shared = 0;");
    let handles: Vec<_> = (0..8)
        .map(|_| {
            std::thread::spawn(|| {
                for _ in 0..25 {
                    run_in_this_context("e2e_shared += 1", RunOptions::default()).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(run("e2e_shared"), ScriptValue::Number(200.0));
}
