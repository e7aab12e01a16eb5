mod common;

use common::{fail, init_logger, Calls, Ctx};
use err_dispatch::{
    diag::MemorySink, error::TaggedError, Dispatcher, DispatcherBuilder, HandlerResult, Outcome,
    Route,
};
use futures::future::join_all;
use serde_json::json;
use std::{io, sync::Arc, time::Duration};
use tokio::sync::mpsc;

/// Builder whose handlers record `<handler>:<error message>:<ctx id>:<ctx route>` into `calls`.
/// The flags make the matching handler fail with `"<handler> failed"`.
fn recording_builder(
    calls: &Calls,
    primary_fails: bool,
    fallback_fails: bool,
    internal_fails: bool,
) -> DispatcherBuilder<Ctx> {
    let primary_calls = calls.clone();
    let fallback_calls = calls.clone();
    let internal_calls = calls.clone();

    Dispatcher::<Ctx>::builder()
        .primary(move |err: TaggedError, ctx: &Ctx| {
            primary_calls.push(format!("primary:{}:{}:{}", err.message(), ctx.0, ctx.1));
            async move {
                tokio::time::sleep(Duration::from_millis(2)).await;
                if primary_fails {
                    fail("primary failed")
                } else {
                    anyhow::Ok(())
                }
            }
        })
        .fallback(move |err: anyhow::Error, ctx: &Ctx| {
            fallback_calls.push(format!("fallback:{err}:{}:{}", ctx.0, ctx.1));
            async move {
                if fallback_fails {
                    fail("fallback failed")
                } else {
                    anyhow::Ok(())
                }
            }
        })
        .internal(move |err: anyhow::Error, ctx: &Ctx| {
            internal_calls.push(format!("internal:{err}:{}:{}", ctx.0, ctx.1));
            async move {
                if internal_fails {
                    fail("internal failed")
                } else {
                    anyhow::Ok(())
                }
            }
        })
}

#[tokio::test]
async fn tagged_error_goes_to_primary_with_metadata() {
    init_logger();
    let captured = Arc::new(std::sync::Mutex::new(None));
    let captured_in = captured.clone();

    let dispatcher = Dispatcher::<Ctx>::builder()
        .primary(move |err: TaggedError, _ctx: &Ctx| {
            *captured_in.lock().unwrap() = Some((err.message().to_owned(), err.get("code").cloned()));
            async move { anyhow::Ok(()) }
        })
        .fallback(|_err: anyhow::Error, _ctx: &Ctx| async move { fail("fallback must not run") })
        .build()
        .unwrap();

    let err = TaggedError::with_sources("bad input", [json!({"code": 400})]);
    dispatcher.validate(err, &(1, "/users")).await;

    let captured = captured.lock().unwrap().take();
    assert_eq!(captured, Some(("bad input".to_owned(), Some(json!(400)))));
}

#[tokio::test]
async fn generic_error_goes_to_fallback_with_context() {
    init_logger();
    let calls = Calls::default();
    let dispatcher = recording_builder(&calls, false, false, false).build().unwrap();

    let outcome = dispatcher
        .dispatch(anyhow::Error::new(io::Error::other("boom")), &(7, "/orders"))
        .await;

    assert_eq!(outcome, Outcome::Handled(Route::Fallback));
    assert_eq!(calls.snapshot(), vec!["fallback:boom:7:/orders"]);
    assert_eq!(calls.count("primary"), 0);
}

#[tokio::test]
async fn exactly_one_of_primary_or_fallback_runs() {
    let calls = Calls::default();
    let dispatcher = recording_builder(&calls, false, false, false).build().unwrap();

    dispatcher.validate(TaggedError::new("a"), &(1, "x")).await;
    dispatcher.validate(anyhow::anyhow!("b"), &(2, "y")).await;
    dispatcher
        .validate(anyhow::Error::new(TaggedError::new("c")), &(3, "z"))
        .await;

    assert_eq!(
        calls.snapshot(),
        vec!["primary:a:1:x", "fallback:b:2:y", "primary:c:3:z"]
    );
}

#[tokio::test]
async fn primary_failure_redirects_once_to_internal() {
    init_logger();
    let calls = Calls::default();
    let dispatcher = recording_builder(&calls, true, false, false).build().unwrap();

    let outcome = dispatcher.dispatch(TaggedError::new("x"), &(5, "/pay")).await;

    assert_eq!(outcome, Outcome::Redirected(Route::Primary));
    assert_eq!(
        calls.snapshot(),
        vec!["primary:x:5:/pay", "internal:primary failed:5:/pay"]
    );
}

#[tokio::test]
async fn fallback_failure_redirects_once_to_internal() {
    let calls = Calls::default();
    let dispatcher = recording_builder(&calls, false, true, false).build().unwrap();

    let outcome = dispatcher.dispatch(anyhow::anyhow!("y"), &(6, "/ship")).await;

    assert_eq!(outcome, Outcome::Redirected(Route::Fallback));
    assert_eq!(calls.count("internal:fallback failed:6:/ship"), 1);
}

#[tokio::test]
async fn internal_failure_is_reported_not_retried() {
    init_logger();
    let calls = Calls::default();
    let sink = Arc::new(MemorySink::new());
    let dispatcher = recording_builder(&calls, true, false, true)
        .sink(sink.clone())
        .build()
        .unwrap();

    let outcome = dispatcher.dispatch(TaggedError::new("x"), &(9, "/")).await;

    assert_eq!(outcome, Outcome::DiagnosticOnly(Route::Primary));
    assert_eq!(calls.count("internal"), 1);
    assert_eq!(
        sink.lines(),
        vec!["internal handler failed while handling primary handler failure: internal failed"]
    );
}

#[tokio::test]
async fn panicking_handler_is_redirected() {
    let calls = Calls::default();
    let internal_calls = calls.clone();

    let dispatcher = Dispatcher::<Ctx>::builder()
        .primary(|err: TaggedError, _ctx: &Ctx| async move {
            if err.message() == "explode" {
                panic!("kaboom");
            }
            anyhow::Ok(())
        })
        .fallback(|_err: anyhow::Error, _ctx: &Ctx| async move { anyhow::Ok(()) })
        .internal(move |err: anyhow::Error, _ctx: &Ctx| {
            internal_calls.push(format!("internal:{err}"));
            async move { anyhow::Ok(()) }
        })
        .build()
        .unwrap();

    let outcome = dispatcher.dispatch(TaggedError::new("explode"), &(0, "")).await;

    assert_eq!(outcome, Outcome::Redirected(Route::Primary));
    assert_eq!(calls.snapshot(), vec!["internal:handler panicked: kaboom"]);
}

#[tokio::test]
async fn concurrent_calls_do_not_interfere() {
    let calls = Calls::default();
    let dispatcher = recording_builder(&calls, true, false, false).build().unwrap();
    let ctxs: Vec<Ctx> = (0..16).map(|i| (i, "/bulk")).collect();

    let outcomes = join_all(ctxs.iter().map(|ctx| {
        let err = TaggedError::new(format!("req{}", ctx.0));
        dispatcher.dispatch(err, ctx)
    }))
    .await;

    assert!(outcomes
        .iter()
        .all(|outcome| *outcome == Outcome::Redirected(Route::Primary)));
    assert_eq!(calls.count("primary"), 16);
    assert_eq!(calls.count("internal"), 16);
    for ctx in &ctxs {
        let expected = format!("internal:primary failed:{}:/bulk", ctx.0);
        assert_eq!(calls.count(&expected), 1);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn spawned_validation_completes_without_caller() {
    let (tx, mut rx) = mpsc::unbounded_channel();

    let dispatcher = Arc::new(
        Dispatcher::<Ctx>::builder()
            .primary(move |err: TaggedError, ctx: &Ctx| {
                let tx = tx.clone();
                let id = ctx.0;
                async move {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    tx.send(format!("{}:{id}", err.message()))
                        .map_err(anyhow::Error::new)
                }
            })
            .fallback(|_err: anyhow::Error, _ctx: &Ctx| async move { anyhow::Ok(()) })
            .build()
            .unwrap(),
    );

    // The join handle is dropped right away.
    drop(dispatcher.spawn_validate(TaggedError::new("late"), (42, "/async")));

    let received = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap();
    assert_eq!(received, Some("late:42".to_owned()));

    let outcome = dispatcher
        .spawn_validate(anyhow::anyhow!("other"), (43, "/async"))
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Handled(Route::Fallback));
}

async fn log_only(_err: anyhow::Error, _ctx: &Ctx) -> HandlerResult {
    Ok(())
}

#[tokio::test]
async fn with_internal_uses_supplied_handler() {
    let calls = Calls::default();
    let internal_calls = calls.clone();
    let dispatcher = Dispatcher::<Ctx>::with_internal(
        |_err: TaggedError, _ctx: &Ctx| async move { fail("primary failed") },
        log_only,
        move |err: anyhow::Error, _ctx: &Ctx| {
            internal_calls.push(format!("internal:{err}"));
            async move { anyhow::Ok(()) }
        },
    );

    dispatcher.validate(TaggedError::new("x"), &(1, "")).await;
    assert_eq!(calls.snapshot(), vec!["internal:primary failed"]);
}
