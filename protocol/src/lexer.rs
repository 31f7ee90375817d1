use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// Canonical name of a lexer known to the external highlighter.
///
/// Values are produced by lexer resolution; holding a `LexerId` does not by itself
/// guarantee the highlighter still ships that lexer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LexerId(String);

impl LexerId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// PHP sources without an opening tag need the highlighter's inline-start mode.
    pub fn is_php(&self) -> bool {
        self.0 == "php"
    }
}

impl fmt::Display for LexerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LexerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
