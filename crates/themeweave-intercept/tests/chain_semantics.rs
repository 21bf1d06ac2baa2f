//! Chain execution semantics for before/around/after advice.

use std::sync::Arc;

use futures::executor::block_on;
use parking_lot::Mutex;
use serde_json::{json, Value};

use themeweave_intercept::{CallError, Callable, Export, InterceptionRegistry, Invocation};

type CallLog = Arc<Mutex<Vec<Vec<Value>>>>;

/// Callable that records its args and then delegates to `f`.
fn recording<F>(log: &CallLog, f: F) -> Callable
where
    F: Fn(&Invocation) -> Value + Send + Sync + 'static,
{
    let log = Arc::clone(log);
    Callable::sync(move |inv| {
        log.lock().push(inv.args.clone());
        Ok(f(&inv))
    })
}

fn suffix_all(inv: &Invocation, suffix: &str) -> Value {
    Value::Array(
        inv.args
            .iter()
            .map(|a| json!(format!("{}{}", a.as_str().unwrap_or_default(), suffix)))
            .collect(),
    )
}

#[test]
fn test_before_chain_threads_arguments_and_ignores_null() {
    let registry = InterceptionRegistry::new();
    let first: CallLog = Default::default();
    let second: CallLog = Default::default();
    let third: CallLog = Default::default();
    let original_log: CallLog = Default::default();

    registry
        .add_advice("Test::beforeChain", "Advice1", "before", recording(&first, |inv| suffix_all(inv, "_mod1")), 10)
        .unwrap();
    registry
        .add_advice("Test::beforeChain", "Advice2", "before", recording(&second, |_| Value::Null), 20)
        .unwrap();
    registry
        .add_advice("Test::beforeChain", "Advice3", "before", recording(&third, |inv| suffix_all(inv, "_mod3")), 30)
        .unwrap();

    let original = recording(&original_log, |inv| {
        json!(format!(
            "Original: {}, {}",
            inv.arg_str(0).unwrap_or_default(),
            inv.arg_str(1).unwrap_or_default()
        ))
    });

    let result = block_on(registry.execute(
        "Test::beforeChain",
        &original,
        json!({}),
        vec![json!("A"), json!("B")],
    ))
    .unwrap();

    assert_eq!(first.lock()[0], vec![json!("A"), json!("B")]);
    assert_eq!(second.lock()[0], vec![json!("A_mod1"), json!("B_mod1")]);
    assert_eq!(third.lock()[0], vec![json!("A_mod1"), json!("B_mod1")]);
    assert_eq!(original_log.lock()[0], vec![json!("A_mod1_mod3"), json!("B_mod1_mod3")]);
    assert_eq!(result, json!("Original: A_mod1_mod3, B_mod1_mod3"));
}

#[test]
fn test_around_chain_first_registered_is_outermost() {
    let registry = InterceptionRegistry::new();
    let original_log: CallLog = Default::default();

    let outer = Callable::asynchronous(|inv: Invocation| async move {
        let arg = format!("{}_outerIn", inv.arg_str(0).unwrap_or_default());
        let inner = inv.proceed()?.call(vec![json!(arg)]).await?;
        Ok::<Value, CallError>(json!(format!("Outer({})", inner.as_str().unwrap_or_default())))
    });
    let inner = Callable::asynchronous(|inv: Invocation| async move {
        let arg = format!("{}_innerIn", inv.arg_str(0).unwrap_or_default());
        let result = inv.proceed()?.call(vec![json!(arg)]).await?;
        Ok::<Value, CallError>(json!(format!("Inner({})", result.as_str().unwrap_or_default())))
    });

    registry.add_advice("Test::aroundChain", "Outer", "around", outer, 10).unwrap();
    registry.add_advice("Test::aroundChain", "Inner", "around", inner, 20).unwrap();

    let original = recording(&original_log, |inv| {
        json!(format!("Original({})", inv.arg_str(0).unwrap_or_default()))
    });

    let result = block_on(registry.execute("Test::aroundChain", &original, json!({}), vec![json!("Start")])).unwrap();

    assert_eq!(original_log.lock()[0], vec![json!("Start_outerIn_innerIn")]);
    assert_eq!(result, json!("Outer(Inner(Original(Start_outerIn_innerIn)))"));
}

#[test]
fn test_around_continuation_counts_levels_ahead() {
    let registry = InterceptionRegistry::new();

    let depth_tag = |name: &'static str| {
        Callable::sync(move |inv| {
            let proceed = inv.proceed()?;
            let inner = proceed.call_sync(inv.args.clone())?;
            Ok(json!(format!(
                "{}[{}]({})",
                name,
                proceed.remaining(),
                inner.as_str().unwrap_or_default()
            )))
        })
    };
    registry.add_advice("Test::levels", "A", "around", depth_tag("A"), 10).unwrap();
    registry.add_advice("Test::levels", "B", "around", depth_tag("B"), 20).unwrap();
    registry.add_advice("Test::levels", "C", "around", depth_tag("C"), 30).unwrap();

    let original = Callable::sync(|_| Ok(json!("x")));
    let result = registry.execute_sync("Test::levels", &original, json!({}), vec![]).unwrap();

    assert_eq!(result, json!("A[2](B[1](C[0](x)))"));
}

#[test]
fn test_around_can_short_circuit() {
    let registry = InterceptionRegistry::new();
    let original_log: CallLog = Default::default();

    registry
        .add_advice("Test::cached", "Cache", "around", Callable::sync(|_| Ok(json!("cached"))), 10)
        .unwrap();

    let original = recording(&original_log, |_| json!("fresh"));
    let result = registry.execute_sync("Test::cached", &original, Value::Null, vec![]).unwrap();

    assert_eq!(result, json!("cached"));
    assert!(original_log.lock().is_empty());
}

#[test]
fn test_after_chain_sees_previous_result() {
    let registry = InterceptionRegistry::new();
    let first: CallLog = Default::default();
    let second: CallLog = Default::default();

    let append = |suffix: &'static str| {
        move |inv: &Invocation| json!(format!("{}{}", inv.arg_str(0).unwrap_or_default(), suffix))
    };
    registry
        .add_advice("Test::afterChain", "After1", "after", recording(&first, append("_After1")), 10)
        .unwrap();
    registry
        .add_advice("Test::afterChain", "After2", "after", recording(&second, append("_After2")), 20)
        .unwrap();

    let original = Callable::sync(|_| Ok(json!("Original")));
    let result = block_on(registry.execute("Test::afterChain", &original, json!({}), vec![])).unwrap();

    assert_eq!(first.lock()[0], vec![json!("Original")]);
    assert_eq!(second.lock()[0], vec![json!("Original_After1")]);
    assert_eq!(result, json!("Original_After1_After2"));
}

#[test]
fn test_after_receives_pre_before_arguments() {
    let registry = InterceptionRegistry::new();
    let after_log: CallLog = Default::default();

    registry
        .add_advice("Test::args", "Rewrite", "before", Callable::sync(|_| Ok(json!(["rewritten"]))), 10)
        .unwrap();
    registry
        .add_advice("Test::args", "Observe", "after", recording(&after_log, |inv| inv.arg(0).clone()), 10)
        .unwrap();

    let original = Callable::sync(|inv| Ok(inv.arg(0).clone()));
    let result = registry
        .execute_sync("Test::args", &original, Value::Null, vec![json!("given")])
        .unwrap();

    assert_eq!(result, json!("rewritten"));
    assert_eq!(after_log.lock()[0], vec![json!("rewritten"), json!("given")]);
}

#[test]
fn test_full_chain_order() {
    let registry = InterceptionRegistry::new();
    registry
        .add_advice(
            "Test::fullChain",
            "Before",
            "before",
            Callable::sync(|inv| Ok(json!([format!("{}_Before", inv.arg_str(0).unwrap_or_default())]))),
            10,
        )
        .unwrap();
    registry
        .add_advice(
            "Test::fullChain",
            "Around",
            "around",
            Callable::sync(|inv| {
                let arg = format!("{}_AroundIn", inv.arg_str(0).unwrap_or_default());
                let res = inv.proceed()?.call_sync(vec![json!(arg)])?;
                Ok(json!(format!("Around({})", res.as_str().unwrap_or_default())))
            }),
            20,
        )
        .unwrap();
    registry
        .add_advice(
            "Test::fullChain",
            "After",
            "after",
            Callable::sync(|inv| Ok(json!(format!("{}_After", inv.arg_str(0).unwrap_or_default())))),
            30,
        )
        .unwrap();

    let original = Callable::sync(|inv| Ok(json!(format!("Original({})", inv.arg_str(0).unwrap_or_default()))));

    let sync_result = registry
        .execute_sync("Test::fullChain", &original, Value::Null, vec![json!("Start")])
        .unwrap();
    let async_result =
        block_on(registry.execute("Test::fullChain", &original, Value::Null, vec![json!("Start")])).unwrap();

    assert_eq!(sync_result, json!("Around(Original(Start_Before_AroundIn))_After"));
    assert_eq!(async_result, sync_result);
}

#[test]
fn test_sync_chain_rejects_async_advice() {
    let registry = InterceptionRegistry::new();
    registry
        .add_advice("Test::mixed", "Slow", "before", Callable::asynchronous(|_| async { Ok(Value::Null) }), 10)
        .unwrap();

    let original = Callable::sync(|_| Ok(json!("ok")));
    let err = registry
        .execute_sync("Test::mixed", &original, Value::Null, vec![])
        .unwrap_err();
    assert_eq!(err, CallError::AsyncInSyncChain);

    let ok = block_on(registry.execute("Test::mixed", &original, Value::Null, vec![])).unwrap();
    assert_eq!(ok, json!("ok"));
}

#[test]
fn test_handler_error_propagates() {
    let registry = InterceptionRegistry::new();
    registry
        .add_advice("Test::fail", "Boom", "before", Callable::sync(|_| Err(CallError::handler("boom"))), 10)
        .unwrap();

    let original = Callable::sync(|_| Ok(json!("unreachable")));
    let err = registry.execute_sync("Test::fail", &original, Value::Null, vec![]).unwrap_err();
    assert_eq!(err.to_string(), "boom");
}

#[test]
fn test_wrapper_routes_functions_and_passes_values() {
    let registry = Arc::new(InterceptionRegistry::new());
    registry
        .add_advice(
            "Vendor_Module::js/util::greet",
            "Shout",
            "after",
            Callable::sync(|inv| Ok(json!(inv.arg_str(0).unwrap_or_default().to_uppercase()))),
            10,
        )
        .unwrap();

    let exports = vec![
        (
            "greet".to_string(),
            Export::Function(Callable::sync(|inv| {
                let greeting = inv.this["greeting"].as_str().unwrap_or("hi").to_string();
                Ok(json!(format!("{} {}", greeting, inv.arg_str(0).unwrap_or_default())))
            })),
        ),
        ("greeting".to_string(), Export::Value(json!("hello"))),
        (
            "plain".to_string(),
            Export::Function(Callable::sync(|_| Ok(json!("untouched")))),
        ),
    ];

    let wrapper = registry.wrap(exports, "Vendor_Module::js/util");

    assert_eq!(wrapper.export_names().collect::<Vec<_>>(), vec!["greet", "greeting", "plain"]);
    assert_eq!(wrapper.get("greeting").and_then(Export::as_value), Some(&json!("hello")));
    assert_eq!(
        wrapper.get("greet").and_then(Export::as_callable).and_then(Callable::method_key),
        Some("Vendor_Module::js/util::greet")
    );

    assert_eq!(wrapper.call_sync("greet", vec![json!("bob")]).unwrap(), json!("HELLO BOB"));
    assert_eq!(block_on(wrapper.call("greet", vec![json!("amy")])).unwrap(), json!("HELLO AMY"));
    assert_eq!(wrapper.call_sync("plain", vec![]).unwrap(), json!("untouched"));
    assert_eq!(
        wrapper.call_sync("greeting", vec![]).unwrap_err(),
        CallError::NotCallable("greeting".to_string())
    );
    assert_eq!(
        wrapper.call_sync("missing", vec![]).unwrap_err(),
        CallError::UnknownExport("missing".to_string())
    );
}
