//! Shared primitive types used across the crate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::RiskError;

/// A stable customer identifier.
pub type CustomerId = String;

/// A stable agent identifier.
pub type AgentId = String;

/// A stable complaint identifier.
pub type ComplaintId = String;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Urgency {
    Low,
    Medium,
    High,
}

impl Urgency {
    /// Reporting order: most urgent first.
    pub const ALL: [Urgency; 3] = [Urgency::High, Urgency::Medium, Urgency::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low    => "Low",
            Self::Medium => "Medium",
            Self::High   => "High",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Urgency {
    type Err = RiskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low"    => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high"   => Ok(Self::High),
            _ => Err(RiskError::InvalidValue { field: "urgency", value: s.to_string() }),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ResolutionStatus {
    Open,
    Pending,
    Closed,
}

impl ResolutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open    => "Open",
            Self::Pending => "Pending",
            Self::Closed  => "Closed",
        }
    }

    /// Open and Pending complaints both count as unresolved.
    pub fn is_unresolved(&self) -> bool {
        !matches!(self, Self::Closed)
    }
}

impl fmt::Display for ResolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResolutionStatus {
    type Err = RiskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open"    => Ok(Self::Open),
            "pending" => Ok(Self::Pending),
            "closed"  => Ok(Self::Closed),
            _ => Err(RiskError::InvalidValue { field: "resolution_status", value: s.to_string() }),
        }
    }
}
