//! Ring levels and quality grades of the CSO taxonomy.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PathError;

/// Top-level category of a secret path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ring {
    Meta,
    Infra,
    Platform,
    Product,
    App,
    Artifact,
}

impl Ring {
    pub const ALL: [Ring; 6] = [
        Ring::Meta,
        Ring::Infra,
        Ring::Platform,
        Ring::Product,
        Ring::App,
        Ring::Artifact,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Ring::Meta => "meta",
            Ring::Infra => "infra",
            Ring::Platform => "platform",
            Ring::Product => "product",
            Ring::App => "app",
            Ring::Artifact => "artifact",
        }
    }

    /// Minimum number of segments after the ring prefix.
    ///
    /// Positional fields plus at least one key segment, except for the
    /// meta ring (key only, two segments) and the artifact ring (type
    /// plus a free-form id).
    pub fn min_segments(&self) -> usize {
        match self {
            Ring::Meta => 2,
            Ring::Infra => 5,
            Ring::Platform => 5,
            Ring::Product => 4,
            Ring::App => 6,
            Ring::Artifact => 2,
        }
    }
}

impl fmt::Display for Ring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Ring {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "meta" => Ok(Ring::Meta),
            "infra" => Ok(Ring::Infra),
            "platform" => Ok(Ring::Platform),
            "product" => Ok(Ring::Product),
            "app" => Ok(Ring::App),
            "artifact" => Ok(Ring::Artifact),
            other => Err(PathError::UnknownRing(other.to_string())),
        }
    }
}

/// Stage quality of a platform or application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Production,
    Staging,
    Qa,
    Dev,
}

impl Quality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Production => "production",
            Quality::Staging => "staging",
            Quality::Qa => "qa",
            Quality::Dev => "dev",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "production" => Ok(Quality::Production),
            "staging" => Ok(Quality::Staging),
            "qa" => Ok(Quality::Qa),
            "dev" => Ok(Quality::Dev),
            other => Err(format!("unknown quality {other:?}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_round_trips_through_str() {
        for ring in Ring::ALL {
            assert_eq!(ring.as_str().parse::<Ring>().unwrap(), ring);
        }
    }

    #[test]
    fn unknown_ring_is_rejected() {
        let err = "cloud".parse::<Ring>().unwrap_err();
        assert!(matches!(err, PathError::UnknownRing(_)));
    }

    #[test]
    fn quality_grades() {
        assert_eq!("dev".parse::<Quality>().unwrap(), Quality::Dev);
        assert!("prod".parse::<Quality>().is_err());
    }
}
