#![allow(dead_code)]

use err_dispatch::HandlerResult;
use std::sync::{Arc, Mutex};

/// Context forwarded to handlers in tests: a request id and a route name.
pub type Ctx = (u32, &'static str);

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Shared record of handler invocations, in call order.
#[derive(Clone, Default)]
pub struct Calls(Arc<Mutex<Vec<String>>>);

impl Calls {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.snapshot()
            .iter()
            .filter(|entry| entry.starts_with(prefix))
            .count()
    }
}

pub fn fail(msg: &str) -> HandlerResult {
    Err(anyhow::Error::msg(msg.to_owned()))
}
