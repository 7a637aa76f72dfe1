//! Supported source languages

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::Error;

/// Language of a code execution request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Python 3
    Python,
    /// JavaScript (Node)
    JavaScript,
    /// TypeScript
    TypeScript,
    /// C#
    CSharp,
    /// Bash / POSIX shell
    Bash,
    /// Rust
    Rust,
}

impl Language {
    /// All languages, in declaration order
    pub const ALL: [Language; 6] = [
        Language::Python,
        Language::JavaScript,
        Language::TypeScript,
        Language::CSharp,
        Language::Bash,
        Language::Rust,
    ];

    /// Stable string tag (matches the serde representation)
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
            Self::CSharp => "csharp",
            Self::Bash => "bash",
            Self::Rust => "rust",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "python" | "py" => Ok(Self::Python),
            "javascript" | "js" | "node" => Ok(Self::JavaScript),
            "typescript" | "ts" => Ok(Self::TypeScript),
            "csharp" | "c#" | "cs" => Ok(Self::CSharp),
            "bash" | "sh" | "shell" => Ok(Self::Bash),
            "rust" | "rs" => Ok(Self::Rust),
            other => Err(Error::UnsupportedLanguage(other.to_string())),
        }
    }
}
