use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The two practices sharing this service, or `Both` for shared patients and content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClinicType {
    Homeopathy,
    LeanLife,
    Both,
}

impl ClinicType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClinicType::Homeopathy => "homeopathy",
            ClinicType::LeanLife => "leanlife",
            ClinicType::Both => "both",
        }
    }

    /// Name shown to patients in notifications and on login.
    pub fn display_name(&self) -> &'static str {
        match self {
            ClinicType::Homeopathy => "Homeopathy Clinic",
            ClinicType::LeanLife => "LeanLife Nutrition",
            ClinicType::Both => "Homeopathy Clinic & LeanLife Nutrition",
        }
    }

    /// True for a single practice. Bookings and logins happen at one of these.
    pub fn is_concrete(&self) -> bool {
        !matches!(self, ClinicType::Both)
    }

    /// Stored clinic types visible from this clinic: itself and `both`.
    pub fn visible_scopes(&self) -> Vec<ClinicType> {
        match self {
            ClinicType::Both => vec![ClinicType::Both],
            concrete => vec![*concrete, ClinicType::Both],
        }
    }
}

impl fmt::Display for ClinicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClinicType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "homeopathy" => Ok(ClinicType::Homeopathy),
            "leanlife" => Ok(ClinicType::LeanLife),
            "both" => Ok(ClinicType::Both),
            other => Err(format!("Unknown clinic type: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ClinicType::LeanLife).unwrap(), "\"leanlife\"");
        let parsed: ClinicType = serde_json::from_str("\"homeopathy\"").unwrap();
        assert_eq!(parsed, ClinicType::Homeopathy);
    }

    #[test]
    fn concrete_clinic_sees_shared_scope() {
        assert_eq!(
            ClinicType::LeanLife.visible_scopes(),
            vec![ClinicType::LeanLife, ClinicType::Both]
        );
        assert!(!ClinicType::Both.is_concrete());
    }
}
