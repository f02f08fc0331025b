//! Registry Entries

use chrono::{DateTime, Utc};
use ethers::types::Address;
use serde::Serialize;

/// Contract artifact of the shared fee registry
pub const REGISTRY_ARTIFACT: &str = "FeeReceiver";

/// One token as recorded by the registry contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryEntry {
    /// Creation time, seconds since the Unix epoch
    pub created_at: u64,
    pub address: Address,
    pub creator: Address,
    pub enabled: bool,
}

impl RegistryEntry {
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.created_at)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}

/// Outcome of a registry membership scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verification {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<RegistryEntry>,
}

impl Verification {
    pub fn found(entry: RegistryEntry) -> Self {
        Self {
            found: true,
            entry: Some(entry),
        }
    }

    pub fn not_found() -> Self {
        Self {
            found: false,
            entry: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_created_at_utc() {
        let entry = RegistryEntry {
            created_at: 1_700_000_000,
            address: Address::from_low_u64_be(1),
            creator: Address::from_low_u64_be(2),
            enabled: true,
        };
        let ts = entry.created_at_utc().unwrap();
        assert_eq!(ts.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_verification_constructors() {
        assert!(!Verification::not_found().found);
        assert!(Verification::not_found().entry.is_none());

        let entry = RegistryEntry {
            created_at: 0,
            address: Address::zero(),
            creator: Address::zero(),
            enabled: false,
        };
        let v = Verification::found(entry.clone());
        assert!(v.found);
        assert_eq!(v.entry, Some(entry));
    }
}
