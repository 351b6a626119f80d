//! IETF BCP 47 language code wrapper.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Opaque BCP 47 language tag string (`en-US`).
///
/// No validation happens here; well-formedness is the locale parser's job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageCode(String);

impl LanguageCode {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn value(&self) -> &str {
        &self.0
    }
}

impl From<String> for LanguageCode {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for LanguageCode {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl AsRef<str> for LanguageCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for LanguageCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
