use super::StdBoxError;
use serde::{ser::SerializeStruct, Serialize};
use serde_json::{Map, Value};
use std::{
    error::Error as StdError,
    fmt::{Debug, Display},
};

//===========================
// region:      --- KindId

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy, Hash)]
pub struct KindId(pub &'static str);

impl Display for KindId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// Kind marker carried by every [`TaggedError`].
pub static TAGGED_KIND: KindId = KindId("TAGGED_ERROR");

// endregion:   --- KindId

//===========================
// region:      --- TaggedError

/// Application-defined error: a message plus arbitrary metadata merged from an ordered list of sources.
///
/// Metadata sources are JSON values. Every entry of an object source is copied into the metadata map,
/// sources being applied in order so that the last source wins on key collisions. Sources that are not
/// objects have no fields and contribute nothing. Metadata never replaces the message or the kind.
#[derive(Debug)]
pub struct TaggedError {
    message: String,
    metadata: Map<String, Value>,
    source: Option<StdBoxError>,
}

impl TaggedError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            metadata: Map::new(),
            source: None,
        }
    }

    pub fn with_sources<I>(message: impl Into<String>, sources: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        sources
            .into_iter()
            .fold(Self::new(message), |err, source| err.with(source))
    }

    /// Merges one more metadata source.
    pub fn with(mut self, source: Value) -> Self {
        if let Value::Object(fields) = source {
            for (key, value) in fields {
                self.metadata.insert(key, value);
            }
        }
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Serializes `source` and merges the result as a metadata source.
    pub fn try_with_serialized<T: Serialize + ?Sized>(
        self,
        source: &T,
    ) -> Result<Self, serde_json::Error> {
        let value = serde_json::to_value(source)?;
        Ok(self.with(value))
    }

    pub fn with_source(mut self, cause: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(StdBoxError::new(cause));
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &'static KindId {
        &TAGGED_KIND
    }

    pub fn has_kind(&self, kind: &KindId) -> bool {
        self.kind() == kind
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }
}

impl Display for TaggedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for TaggedError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_ref().map(|src| src.as_dyn_std_error())
    }
}

impl Serialize for TaggedError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let len = if self.source.is_some() { 4 } else { 3 };
        let mut state = serializer.serialize_struct("TaggedError", len)?;
        state.serialize_field("kind", self.kind())?;
        state.serialize_field("message", &self.message)?;
        state.serialize_field("metadata", &self.metadata)?;
        if let Some(source) = &self.source {
            state.serialize_field("source", source)?;
        }
        state.end()
    }
}

// endregion:   --- TaggedError
