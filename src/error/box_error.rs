use super::error_recursive_msg;
use serde::Serialize;
use std::{
    error::Error as StdError,
    fmt::{Debug, Display},
};

/// Boxed, type-erased error that stays [`StdError`] (unlike `Box<dyn StdError>` itself) and serializes
/// as the recursive message of its chain.
pub struct StdBoxError(Box<dyn StdError + Send + Sync + 'static>);

impl StdBoxError {
    pub fn new(inner: impl StdError + Send + Sync + 'static) -> Self {
        Self(Box::new(inner))
    }

    pub fn as_dyn_std_error(&self) -> &(dyn StdError + 'static) {
        self.0.as_ref()
    }

    pub fn is<T: StdError + 'static>(&self) -> bool {
        self.0.is::<T>()
    }

    pub fn downcast_ref<T: StdError + 'static>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    pub fn into_inner(self) -> Box<dyn StdError + Send + Sync + 'static> {
        self.0
    }
}

impl From<Box<dyn StdError + Send + Sync + 'static>> for StdBoxError {
    fn from(value: Box<dyn StdError + Send + Sync + 'static>) -> Self {
        Self(value)
    }
}

impl Debug for StdBoxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for StdBoxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl StdError for StdBoxError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

impl Serialize for StdBoxError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut text = String::new();
        text.push_str("recursive_msg(");
        text.push_str(&error_recursive_msg(self));
        text.push(')');
        serializer.serialize_str(&text)
    }
}
