use super::{StdBoxError, TaggedError};
use std::{
    error::Error as StdError,
    fmt::{Debug, Display},
};

/// A caught failure, classified as either an application error or anything else.
///
/// Conversions from type-erased errors perform the classification at runtime: a [`TaggedError`]
/// hidden inside an [`anyhow::Error`] or a boxed error still ends up as [`Caught::Tagged`].
#[derive(Debug)]
pub enum Caught {
    Tagged(TaggedError),
    Generic(anyhow::Error),
}

impl Caught {
    pub fn new(err: impl StdError + Send + Sync + 'static) -> Self {
        anyhow::Error::new(err).into()
    }

    pub fn is_tagged(&self) -> bool {
        matches!(self, Self::Tagged(_))
    }

    pub fn as_dyn_std_error(&self) -> &(dyn StdError + 'static) {
        match self {
            Self::Tagged(err) => err,
            Self::Generic(err) => &**err,
        }
    }
}

impl Display for Caught {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tagged(err) => Display::fmt(err, f),
            Self::Generic(err) => Display::fmt(err, f),
        }
    }
}

impl From<TaggedError> for Caught {
    fn from(value: TaggedError) -> Self {
        Self::Tagged(value)
    }
}

impl From<anyhow::Error> for Caught {
    fn from(value: anyhow::Error) -> Self {
        match value.downcast::<TaggedError>() {
            Ok(tagged) => Self::Tagged(tagged),
            Err(other) => Self::Generic(other),
        }
    }
}

impl From<Box<dyn StdError + Send + Sync + 'static>> for Caught {
    fn from(value: Box<dyn StdError + Send + Sync + 'static>) -> Self {
        match value.downcast::<TaggedError>() {
            Ok(tagged) => Self::Tagged(*tagged),
            Err(other) => Self::Generic(anyhow::Error::new(StdBoxError::from(other))),
        }
    }
}

impl From<StdBoxError> for Caught {
    fn from(value: StdBoxError) -> Self {
        value.into_inner().into()
    }
}
