use crate::{
    box_async_borrow_fn_2b2,
    config::DiagnosticCfg,
    diag::{DiagnosticSink, LogSink},
    error::{error_recursive_msg, panic_message, Caught, ConfigError, TaggedError},
    AsyncBorrowFn2b2, BoxAsyncBorrowFn2b2, NoDebug,
};
use futures::FutureExt;
use log::{debug, trace, Level};
use std::{
    fmt::{Debug, Display},
    panic::AssertUnwindSafe,
    sync::Arc,
};
use tokio::task::JoinHandle;

//===========================
// region:      --- Handler types

pub type HandlerResult = anyhow::Result<()>;

/// Handler for application errors.
pub type PrimaryHandler<C> = BoxAsyncBorrowFn2b2<TaggedError, C, HandlerResult>;

/// Handler for generic errors, also the shape of the internal handler.
pub type ErrorHandler<C> = BoxAsyncBorrowFn2b2<anyhow::Error, C, HandlerResult>;

/// Handler that ran first for a given call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Primary,
    Fallback,
}

impl Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primary => f.write_str("primary"),
            Self::Fallback => f.write_str("fallback"),
        }
    }
}

/// Terminal state of a single dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The routed handler succeeded.
    Handled(Route),
    /// The routed handler failed and the internal handler took over.
    Redirected(Route),
    /// The internal handler failed too; only a diagnostic was written.
    DiagnosticOnly(Route),
}

impl Outcome {
    pub fn route(&self) -> Route {
        match self {
            Self::Handled(route) | Self::Redirected(route) | Self::DiagnosticOnly(route) => *route,
        }
    }
}

// endregion:   --- Handler types

//===========================
// region:      --- Dispatcher

/// Routes a caught error to the primary handler (application errors) or the fallback handler
/// (everything else). A failure of either is handed once to the internal handler; a failure of the
/// internal handler is only reported to the diagnostic sink.
///
/// The context `C` is opaque and passed by reference, unchanged, to whichever handler runs. Use a
/// tuple to forward several values.
pub struct Dispatcher<C = ()> {
    primary: NoDebug<PrimaryHandler<C>>,
    fallback: NoDebug<ErrorHandler<C>>,
    internal: NoDebug<ErrorHandler<C>>,
    sink: NoDebug<Arc<dyn DiagnosticSink>>,
    cfg: DiagnosticCfg,
}

impl<C> Debug for Dispatcher<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("primary", &self.primary)
            .field("fallback", &self.fallback)
            .field("internal", &self.internal)
            .field("sink", &self.sink)
            .field("cfg", &self.cfg)
            .finish()
    }
}

impl<C: 'static> Dispatcher<C> {
    /// Dispatcher with the built-in internal handler, writing through the `log` facade.
    pub fn new(
        primary: impl for<'a> AsyncBorrowFn2b2<'a, TaggedError, C, HandlerResult> + 'static,
        fallback: impl for<'a> AsyncBorrowFn2b2<'a, anyhow::Error, C, HandlerResult> + 'static,
    ) -> Self {
        let cfg = DiagnosticCfg::default();
        let sink: Arc<dyn DiagnosticSink> = Arc::new(LogSink::new(cfg.target.clone()));
        let internal = default_internal_handler(sink.clone(), cfg.full_chain);
        Self::from_parts(
            box_async_borrow_fn_2b2(primary),
            box_async_borrow_fn_2b2(fallback),
            internal,
            sink,
            cfg,
        )
    }

    pub fn with_internal(
        primary: impl for<'a> AsyncBorrowFn2b2<'a, TaggedError, C, HandlerResult> + 'static,
        fallback: impl for<'a> AsyncBorrowFn2b2<'a, anyhow::Error, C, HandlerResult> + 'static,
        internal: impl for<'a> AsyncBorrowFn2b2<'a, anyhow::Error, C, HandlerResult> + 'static,
    ) -> Self {
        let cfg = DiagnosticCfg::default();
        let sink: Arc<dyn DiagnosticSink> = Arc::new(LogSink::new(cfg.target.clone()));
        Self::from_parts(
            box_async_borrow_fn_2b2(primary),
            box_async_borrow_fn_2b2(fallback),
            box_async_borrow_fn_2b2(internal),
            sink,
            cfg,
        )
    }

    pub fn builder() -> DispatcherBuilder<C> {
        DispatcherBuilder::new()
    }

    fn from_parts(
        primary: PrimaryHandler<C>,
        fallback: ErrorHandler<C>,
        internal: ErrorHandler<C>,
        sink: Arc<dyn DiagnosticSink>,
        cfg: DiagnosticCfg,
    ) -> Self {
        Self {
            primary: primary.into(),
            fallback: fallback.into(),
            internal: internal.into(),
            sink: sink.into(),
            cfg,
        }
    }

    pub fn cfg(&self) -> &DiagnosticCfg {
        &self.cfg
    }

    /// Hands `error` to the matching handler and waits for it. Never fails and never panics because of
    /// a handler: failures are redirected or reported as diagnostics.
    pub async fn validate(&self, error: impl Into<Caught>, ctx: &C) {
        self.dispatch(error, ctx).await;
    }

    /// Same as [`Self::validate`], returning the terminal state of the call.
    pub async fn dispatch(&self, error: impl Into<Caught>, ctx: &C) -> Outcome {
        let caught: Caught = error.into();
        let (route, handled) = match caught {
            Caught::Tagged(err) => {
                debug!("routing application error to primary handler: {err}");
                (Route::Primary, invoke_guarded(self.primary.value(), err, ctx).await)
            }
            Caught::Generic(err) => {
                debug!("routing generic error to fallback handler: {err}");
                (
                    Route::Fallback,
                    invoke_guarded(self.fallback.value(), err, ctx).await,
                )
            }
        };

        let Err(failure) = handled else {
            trace!("{route} handler completed");
            return Outcome::Handled(route);
        };

        // At most one redirection per call; the internal handler's own failure stops here.
        debug!("{route} handler failed, redirecting to internal handler: {failure}");
        match invoke_guarded(self.internal.value(), failure, ctx).await {
            Ok(()) => Outcome::Redirected(route),
            Err(secondary) => {
                self.report_secondary(route, &secondary);
                Outcome::DiagnosticOnly(route)
            }
        }
    }

    fn report_secondary(&self, route: Route, err: &anyhow::Error) {
        let msg = if self.cfg.full_chain {
            error_recursive_msg(&**err)
        } else {
            err.to_string()
        };
        self.sink.emit(
            Level::Error,
            &format!("internal handler failed while handling {route} handler failure: {msg}"),
        );
    }
}

impl<C> Dispatcher<C>
where
    C: Send + Sync + 'static,
{
    /// Runs [`Self::dispatch`] on the tokio runtime, so handling completes even if the caller stops
    /// waiting. Dropping the returned handle detaches the task.
    pub fn spawn_validate(self: &Arc<Self>, error: impl Into<Caught>, ctx: C) -> JoinHandle<Outcome> {
        let dispatcher = Arc::clone(self);
        let caught: Caught = error.into();
        tokio::spawn(async move { dispatcher.dispatch(caught, &ctx).await })
    }
}

/// Calls `handler`, turning a panic raised while creating or polling its future into a failure.
async fn invoke_guarded<E, C>(
    handler: &BoxAsyncBorrowFn2b2<E, C, HandlerResult>,
    err: E,
    ctx: &C,
) -> HandlerResult {
    let invocation = async move { handler(err, ctx).await };
    match AssertUnwindSafe(invocation).catch_unwind().await {
        Ok(res) => res,
        Err(payload) => Err(anyhow::anyhow!(
            "handler panicked: {}",
            panic_message(payload.as_ref())
        )),
    }
}

fn default_internal_handler<C: 'static>(
    sink: Arc<dyn DiagnosticSink>,
    full_chain: bool,
) -> ErrorHandler<C> {
    box_async_borrow_fn_2b2(move |err: anyhow::Error, _ctx: &C| {
        sink.emit(Level::Error, &format!("unhandled error: {err}"));
        if let Some(cause) = err.chain().nth(1) {
            let cause_msg = if full_chain {
                error_recursive_msg(cause)
            } else {
                cause.to_string()
            };
            sink.emit(Level::Error, &format!("caused by: {cause_msg}"));
        }
        futures::future::ready(HandlerResult::Ok(()))
    })
}

// endregion:   --- Dispatcher

//===========================
// region:      --- DispatcherBuilder

/// Assembles a [`Dispatcher`] piecewise. [`Self::build`] fails if the primary or fallback handler is
/// missing; the internal handler and sink fall back to the built-in ones.
pub struct DispatcherBuilder<C = ()> {
    primary: Option<PrimaryHandler<C>>,
    fallback: Option<ErrorHandler<C>>,
    internal: Option<ErrorHandler<C>>,
    sink: Option<Arc<dyn DiagnosticSink>>,
    cfg: DiagnosticCfg,
}

impl<C: 'static> DispatcherBuilder<C> {
    pub fn new() -> Self {
        Self {
            primary: None,
            fallback: None,
            internal: None,
            sink: None,
            cfg: DiagnosticCfg::default(),
        }
    }

    pub fn primary(
        mut self,
        handler: impl for<'a> AsyncBorrowFn2b2<'a, TaggedError, C, HandlerResult> + 'static,
    ) -> Self {
        self.primary = Some(box_async_borrow_fn_2b2(handler));
        self
    }

    pub fn fallback(
        mut self,
        handler: impl for<'a> AsyncBorrowFn2b2<'a, anyhow::Error, C, HandlerResult> + 'static,
    ) -> Self {
        self.fallback = Some(box_async_borrow_fn_2b2(handler));
        self
    }

    pub fn internal(
        mut self,
        handler: impl for<'a> AsyncBorrowFn2b2<'a, anyhow::Error, C, HandlerResult> + 'static,
    ) -> Self {
        self.internal = Some(box_async_borrow_fn_2b2(handler));
        self
    }

    pub fn sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn cfg(mut self, cfg: DiagnosticCfg) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn build(self) -> Result<Dispatcher<C>, ConfigError> {
        let primary = self
            .primary
            .ok_or(ConfigError::MissingHandler("primary"))?;
        let fallback = self
            .fallback
            .ok_or(ConfigError::MissingHandler("fallback"))?;
        let sink: Arc<dyn DiagnosticSink> = match self.sink {
            Some(sink) => sink,
            None => Arc::new(LogSink::new(self.cfg.target.clone())),
        };
        let internal = match self.internal {
            Some(internal) => internal,
            None => default_internal_handler(sink.clone(), self.cfg.full_chain),
        };
        Ok(Dispatcher::from_parts(
            primary, fallback, internal, sink, self.cfg,
        ))
    }
}

impl<C: 'static> Default for DispatcherBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

// endregion:   --- DispatcherBuilder
