use err_dispatch::{
    diag::MemorySink,
    error::{StdBoxError, TaggedError},
    Dispatcher, HandlerResult,
};
use serde_json::json;
use std::{io, sync::Arc};

/// Stand-in for a response object handed to the handlers.
#[derive(Debug)]
struct Response {
    request_id: u32,
}

async fn respond_with_app_error(err: TaggedError, resp: &Response) -> HandlerResult {
    let body = serde_json::to_string(&err)?;
    println!("[{}] 4xx {body}", resp.request_id);
    if err.get("code") == Some(&json!(418)) {
        anyhow::bail!("cannot brew coffee for request {}", resp.request_id);
    }
    Ok(())
}

async fn respond_with_500(err: anyhow::Error, resp: &Response) -> HandlerResult {
    println!("[{}] 500 {err}", resp.request_id);
    Ok(())
}

async fn strict_internal(err: anyhow::Error, resp: &Response) -> HandlerResult {
    anyhow::bail!("request {} lost: {err}", resp.request_id)
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let dispatcher: Dispatcher<Response> = Dispatcher::new(respond_with_app_error, respond_with_500);

    println!("===== application error");
    let err = TaggedError::with_sources("bad input", [json!({"code": 400, "field": "name"})]);
    dispatcher.validate(err, &Response { request_id: 1 }).await;

    println!();
    println!("===== generic error");
    let err = StdBoxError::new(io::Error::other("database unreachable"));
    dispatcher.validate(err, &Response { request_id: 2 }).await;

    println!();
    println!("===== primary handler fails, default internal handler logs it");
    let err = TaggedError::new("teapot").with_field("code", 418);
    let outcome = dispatcher.dispatch(err, &Response { request_id: 3 }).await;
    println!("outcome: {outcome:?}");

    println!();
    println!("===== internal handler fails too");
    let sink = Arc::new(MemorySink::new());
    let strict = Dispatcher::<Response>::builder()
        .primary(respond_with_app_error)
        .fallback(respond_with_500)
        .internal(strict_internal)
        .sink(sink.clone())
        .build()
        .expect("all handlers supplied");
    let err = TaggedError::new("teapot").with_field("code", 418);
    let outcome = strict.dispatch(err, &Response { request_id: 4 }).await;
    println!("outcome: {outcome:?}");
    for line in sink.lines() {
        println!("diagnostic: {line}");
    }
}
