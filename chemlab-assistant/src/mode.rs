//! Strict and creative answering modes.
//!
//! Parsed case-insensitively from the UI and the JSON API; serialised in
//! lower case.
//!
//! ```
//! use chemlab_assistant::AssistantMode;
//!
//! assert_eq!(" Creative ".parse::<AssistantMode>(), Ok(AssistantMode::Creative));
//! assert_eq!(AssistantMode::default().to_string(), "strict");
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How far an answer may stray from the retrieved context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssistantMode {
    /// Answer only from retrieved context; refuse otherwise.
    #[default]
    Strict,
    /// Combine retrieved context with general knowledge, labelling inference.
    Creative,
}

impl AssistantMode {
    /// Every mode, strict first.
    pub const ALL: [AssistantMode; 2] = [AssistantMode::Strict, AssistantMode::Creative];

    /// The lower-case wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            AssistantMode::Strict => "strict",
            AssistantMode::Creative => "creative",
        }
    }
}

impl fmt::Display for AssistantMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssistantMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(AssistantMode::Strict),
            "creative" => Ok(AssistantMode::Creative),
            other => Err(format!("unknown assistant mode '{other}' (expected strict or creative)")),
        }
    }
}
