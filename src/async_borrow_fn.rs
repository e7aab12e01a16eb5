//! The trait defined here was adapted from https://github.com/rust-lang/rust/issues/113495#issuecomment-1627640952;
//! Enhanced by https://github.com/rust-lang/rust/issues/113495#issuecomment-1728150795.
//!
//! It lets plain `async fn`s whose last argument is a reference be accepted where a higher-ranked
//! closure returning a future is expected.

use futures::future::BoxFuture;
use std::future::Future;

/// Represents an async function with 2 arguments; the first is not a reference, the last is a reference.
pub trait AsyncBorrowFn2b2<'a, A1, A2: ?Sized + 'a, Out>:
    Fn(A1, &'a A2) -> Self::Fut + Send + Sync
{
    type Fut: Future<Output = Out> + Send + 'a;
}

impl<'a, A1, A2, Out, F, Fut> AsyncBorrowFn2b2<'a, A1, A2, Out> for F
where
    A2: ?Sized + 'a,
    F: Fn(A1, &'a A2) -> Fut + Send + Sync + 'a,
    Fut: Future<Output = Out> + Send + 'a,
{
    type Fut = Fut;
}

/// Type-erased [`AsyncBorrowFn2b2`], as stored by the dispatcher.
pub type BoxAsyncBorrowFn2b2<A1, A2, Out> =
    Box<dyn for<'a> Fn(A1, &'a A2) -> BoxFuture<'a, Out> + Send + Sync>;

/// Wraps `f` so that the returned closure yields a box-pinned future.
pub fn async_borrow_fn_2b2_boxpin<A1, A2, Out>(
    f: impl for<'a> AsyncBorrowFn2b2<'a, A1, A2, Out> + 'static,
) -> impl for<'a> Fn(A1, &'a A2) -> BoxFuture<'a, Out> + Send + Sync + 'static
where
    A1: 'static,
    A2: 'static,
    Out: 'static,
{
    move |a1, a2| {
        let fut = f(a1, a2);
        Box::pin(fut)
    }
}

/// Boxes `f` into a [`BoxAsyncBorrowFn2b2`].
pub fn box_async_borrow_fn_2b2<A1, A2, Out>(
    f: impl for<'a> AsyncBorrowFn2b2<'a, A1, A2, Out> + 'static,
) -> BoxAsyncBorrowFn2b2<A1, A2, Out>
where
    A1: 'static,
    A2: 'static,
    Out: 'static,
{
    Box::new(async_borrow_fn_2b2_boxpin(f))
}
