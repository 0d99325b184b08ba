//! Status enums for domain entities.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Payment status.
///
/// A payment row starts `pending` when an attempt is opened and becomes
/// `completed` once the provider (or a direct record) settles it. There is
/// no failure state: failed attempts simply never complete, and the order
/// stays unpaid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
}

impl PaymentStatus {
    /// Stable string form used in the database.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a [`PaymentStatus`] from its string form.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown payment status: {0}")]
pub struct ParsePaymentStatusError(String);

impl FromStr for PaymentStatus {
    type Err = ParsePaymentStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            other => Err(ParsePaymentStatusError(other.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_str() {
        for status in [PaymentStatus::Pending, PaymentStatus::Completed] {
            assert_eq!(status.as_str().parse::<PaymentStatus>(), Ok(status));
        }
    }

    #[test]
    fn test_unknown_status_rejected() {
        assert!("refunded".parse::<PaymentStatus>().is_err());
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&PaymentStatus::Completed).expect("serialize");
        assert_eq!(json, "\"completed\"");
    }
}
