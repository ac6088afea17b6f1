//! Request errors and failure-body flattening.
//!
//! ERROR HANDLING
//! ==============
//! The server answers failures with plain text, a string, a list of strings,
//! or a field map nested to any depth. Whatever the shape, the UI shows one
//! flat line, so bodies are decoded into [`ErrorPayload`] and flattened before
//! they leave the request layer.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

use std::fmt;

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};

/// Message used when a failed response carries nothing readable.
pub const GENERIC_FAILURE_MESSAGE: &str = "Request failed";

const SEPARATOR: &str = " | ";

/// Failure of a single API request.
///
/// `Display` is the user-facing message.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// No response was obtained (network down, DNS, CORS, ...).
    #[error("network request failed: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// A success body did not match the expected shape.
    #[error("response parse failed: {0}")]
    Decode(String),

    /// The request body could not be serialized.
    #[error("request encode failed: {0}")]
    Encode(String),
}

impl ApiError {
    /// Build a [`ApiError::Status`] from a raw failure body.
    pub fn from_status(status: u16, raw_body: &str) -> Self {
        Self::Status { status, message: describe_failure(raw_body) }
    }
}

/// Turn a raw failure body into one display string.
///
/// Empty bodies and JSON that flattens to nothing yield
/// [`GENERIC_FAILURE_MESSAGE`]; non-JSON text is returned verbatim.
pub fn describe_failure(raw: &str) -> String {
    if raw.is_empty() {
        return GENERIC_FAILURE_MESSAGE.to_owned();
    }
    match serde_json::from_str::<ErrorPayload>(raw) {
        Ok(payload) => {
            let flattened = payload.flatten();
            if flattened.is_empty() { GENERIC_FAILURE_MESSAGE.to_owned() } else { flattened }
        }
        Err(_) => raw.to_owned(),
    }
}

/// Decoded failure body.
///
/// Field maps keep the order the server wrote them in, which is also the
/// order they are reported in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorPayload {
    Absent,
    Text(String),
    Sequence(Vec<ErrorPayload>),
    Fields(Vec<(String, ErrorPayload)>),
}

impl ErrorPayload {
    /// Collapse the payload into a single `" | "`-joined line.
    ///
    /// Field entries render as `field: message`, or just `field` when the
    /// value flattens to nothing. Empty strings and nulls contribute nothing.
    pub fn flatten(&self) -> String {
        match self {
            Self::Absent => String::new(),
            Self::Text(text) => text.clone(),
            Self::Sequence(items) => items
                .iter()
                .map(Self::flatten)
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(SEPARATOR),
            Self::Fields(entries) => entries
                .iter()
                .map(|(field, value)| {
                    let message = value.flatten();
                    if message.is_empty() { field.clone() } else { format!("{field}: {message}") }
                })
                .collect::<Vec<_>>()
                .join(SEPARATOR),
        }
    }
}

impl<'de> Deserialize<'de> for ErrorPayload {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(PayloadVisitor)
    }
}

struct PayloadVisitor;

impl<'de> Visitor<'de> for PayloadVisitor {
    type Value = ErrorPayload;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an error message, list, or field map")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(ErrorPayload::Absent)
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(ErrorPayload::Absent)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        ErrorPayload::deserialize(deserializer)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(ErrorPayload::Text(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(ErrorPayload::Text(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(ErrorPayload::Text(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(ErrorPayload::Text(v.to_string()))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(ErrorPayload::Text(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(ErrorPayload::Text(v))
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element::<ErrorPayload>()? {
            items.push(item);
        }
        Ok(ErrorPayload::Sequence(items))
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entries = Vec::new();
        while let Some((field, value)) = map.next_entry::<String, ErrorPayload>()? {
            entries.push((field, value));
        }
        Ok(ErrorPayload::Fields(entries))
    }
}
