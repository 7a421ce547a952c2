//! Language models the backend can answer with.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Model identifier sent with every question.
///
/// The wire id is what the backend expects in the `model` field; the label is
/// what the model picker shows. Deserializing accepts whatever
/// [`FromStr`] accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum ModelId {
    #[default]
    #[serde(rename = "llama3")]
    Llama3,
    #[serde(rename = "gemma")]
    Gemma,
    #[serde(rename = "deepseek-r1")]
    DeepseekR1,
}

impl ModelId {
    /// Every selectable model, in picker order.
    pub const ALL: [ModelId; 3] = [ModelId::Llama3, ModelId::Gemma, ModelId::DeepseekR1];

    /// Identifier used in the `ask` payload.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ModelId::Llama3 => "llama3",
            ModelId::Gemma => "gemma",
            ModelId::DeepseekR1 => "deepseek-r1",
        }
    }

    /// Human-readable name for the picker.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ModelId::Llama3 => "llama3",
            ModelId::Gemma => "gemma3",
            ModelId::DeepseekR1 => "deepseek-r1",
        }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no known model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown model: {0}")]
pub struct UnknownModel(pub String);

impl FromStr for ModelId {
    type Err = UnknownModel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ModelId::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownModel(wanted.to_string()))
    }
}

impl TryFrom<String> for ModelId {
    type Error = UnknownModel;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
