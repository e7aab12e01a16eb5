//! Routes caught errors to user-supplied async handlers.
//!
//! A [`Dispatcher`] sends application errors ([`error::TaggedError`]) to a primary handler and every
//! other error to a fallback handler. If that handler fails, an internal handler gets the failure once;
//! if the internal handler fails too, the failure is only written to a [`diag::DiagnosticSink`].

mod async_borrow_fn;
pub use async_borrow_fn::*;

pub mod config;
pub mod diag;
pub mod error;

mod dispatcher;
pub use dispatcher::*;

mod no_debug;
pub use no_debug::*;
