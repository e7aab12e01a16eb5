//! Generic wrapper to disable Debug for the wrapped type.
//! Based on https://github.com/rust-lang/rust/issues/37009#issuecomment-2209496680.

use std::{fmt::Debug, ops::Deref};

/// Generic wrapper to disable Debug for the wrapped type, e.g. boxed handler closures.
pub struct NoDebug<T>(pub T);

impl<T> NoDebug<T> {
    pub fn value(&self) -> &T {
        &self.0
    }
}

impl<T> Debug for NoDebug<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("skipped").finish()
    }
}

impl<T> From<T> for NoDebug<T> {
    fn from(value: T) -> Self {
        Self(value)
    }
}

impl<T> Deref for NoDebug<T> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
