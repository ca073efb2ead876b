use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse compute budget assigned to a task.
///
/// Serialized as an upper-case string. Tiers the host does not know are kept
/// verbatim in [`Compute::Custom`]; rejecting them is the host's job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Compute {
    Low,
    Medium,
    High,
    Custom(String),
}

impl Compute {
    pub fn as_str(&self) -> &str {
        match self {
            Compute::Low => "LOW",
            Compute::Medium => "MEDIUM",
            Compute::High => "HIGH",
            Compute::Custom(raw) => raw,
        }
    }

    /// Returns `true` for the three tiers the host documents.
    pub fn is_known(&self) -> bool {
        !matches!(self, Compute::Custom(_))
    }
}

impl Default for Compute {
    fn default() -> Self {
        Compute::Medium
    }
}

impl From<&str> for Compute {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            return Compute::Medium;
        }
        let norm = s.to_uppercase();
        match norm.as_str() {
            "LOW" => Compute::Low,
            "MEDIUM" => Compute::Medium,
            "HIGH" => Compute::High,
            _ => Compute::Custom(norm),
        }
    }
}

impl From<String> for Compute {
    fn from(s: String) -> Self {
        Compute::from(s.as_str())
    }
}

impl From<Compute> for String {
    fn from(c: Compute) -> Self {
        match c {
            Compute::Custom(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Compute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_tiers_case_insensitively() {
        assert_eq!(Compute::from("low"), Compute::Low);
        assert_eq!(Compute::from("Medium"), Compute::Medium);
        assert_eq!(Compute::from("HIGH"), Compute::High);
    }

    #[test]
    fn empty_input_defaults_to_medium() {
        assert_eq!(Compute::from(""), Compute::Medium);
        assert_eq!(Compute::default(), Compute::Medium);
    }

    #[test]
    fn unknown_tier_is_upper_cased_and_kept() {
        let c = Compute::from("extreme");
        assert_eq!(c, Compute::Custom("EXTREME".into()));
        assert!(!c.is_known());
        assert_eq!(c.to_string(), "EXTREME");
    }

    #[test]
    fn serializes_as_upper_case_string() {
        let json = serde_json::to_string(&Compute::High).unwrap();
        assert_eq!(json, r#""HIGH""#);

        let back: Compute = serde_json::from_str(r#""low""#).unwrap();
        assert_eq!(back, Compute::Low);
    }
}
