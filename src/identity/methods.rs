//! # Method Relationships
//!
//! Every runtime pallet a DID can act on requires one verification
//! relationship from the DID's key.
//!
//! | Namespace | Relationship |
//! |-----------|--------------|
//! | `attestation` | assertionMethod |
//! | `ctype` | assertionMethod |
//! | `publicCredentials` | assertionMethod |
//! | `delegation` | capabilityDelegation |
//! | `did` | authentication |
//! | `didLookup` | authentication |
//! | `web3Names` | authentication |
//! | `dipProvider` | authentication |
//!
//! The table is static and read-only. Lookups are case-sensitive.

use serde::{Deserialize, Serialize};

/// Role a DID key must hold to sign for an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VerificationRelationship {
    /// Act as the DID subject
    Authentication,
    /// Issue attestations and credentials
    AssertionMethod,
    /// Hand out delegated authority
    CapabilityDelegation,
}

impl VerificationRelationship {
    /// All relationships in declaration order
    pub const ALL: [VerificationRelationship; 3] = [
        VerificationRelationship::Authentication,
        VerificationRelationship::AssertionMethod,
        VerificationRelationship::CapabilityDelegation,
    ];

    /// Name used in DID key URIs and JSON
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationRelationship::Authentication => "authentication",
            VerificationRelationship::AssertionMethod => "assertionMethod",
            VerificationRelationship::CapabilityDelegation => "capabilityDelegation",
        }
    }

    /// Fragment appended to a DID to name the key, e.g. `#authentication`
    pub fn fragment(&self) -> String {
        format!("#{}", self.as_str())
    }
}

impl std::fmt::Display for VerificationRelationship {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Namespace to relationship table
pub const METHOD_RELATIONSHIPS: &[(&str, VerificationRelationship)] = &[
    ("attestation", VerificationRelationship::AssertionMethod),
    ("ctype", VerificationRelationship::AssertionMethod),
    ("publicCredentials", VerificationRelationship::AssertionMethod),
    ("delegation", VerificationRelationship::CapabilityDelegation),
    ("did", VerificationRelationship::Authentication),
    ("didLookup", VerificationRelationship::Authentication),
    ("web3Names", VerificationRelationship::Authentication),
    ("dipProvider", VerificationRelationship::Authentication),
];

/// Relationship required by a runtime-method namespace
///
/// Returns `None` for namespaces outside the table.
pub fn relationship_for_namespace(namespace: &str) -> Option<VerificationRelationship> {
    METHOD_RELATIONSHIPS
        .iter()
        .find(|(name, _)| *name == namespace)
        .map(|(_, relationship)| *relationship)
}

// ============================================================================
// TESTS
// ============================================================================
