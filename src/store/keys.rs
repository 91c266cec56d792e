//! Well-known storage keys

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Keys the pipeline stages share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtifactKey {
    #[serde(rename = "concatenatedFiles")]
    ConcatenatedFiles,
    #[serde(rename = "additionalFiles")]
    AdditionalFiles,
    #[serde(rename = "jiraTickets")]
    TicketMetadata,
}

impl ArtifactKey {
    pub const ALL: [ArtifactKey; 3] = [
        ArtifactKey::ConcatenatedFiles,
        ArtifactKey::AdditionalFiles,
        ArtifactKey::TicketMetadata,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKey::ConcatenatedFiles => "concatenatedFiles",
            ArtifactKey::AdditionalFiles => "additionalFiles",
            ArtifactKey::TicketMetadata => "jiraTickets",
        }
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ArtifactKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| format!("unknown artifact key: {}", s))
    }
}

impl AsRef<str> for ArtifactKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
