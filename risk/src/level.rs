use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete risk level derived from a fused score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum RiskLevel {
    #[default]
    Safe,
    Suspicious,
    Scam,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Safe => "safe",
            RiskLevel::Suspicious => "suspicious",
            RiskLevel::Scam => "scam",
        }
    }

    /// Parses a level. Unknown strings are `Safe`.
    pub fn from_str(s: &str) -> Self {
        match s {
            "scam" => RiskLevel::Scam,
            "suspicious" => RiskLevel::Suspicious,
            _ => RiskLevel::Safe,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for RiskLevel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RiskLevel {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(RiskLevel::from_str(&s))
    }
}
