//! Grant requests and permission identifiers.
//!
//! A grant gives a subject one or more permissions within the caller's
//! context. Granting `CredentialsManage` delegates the right to grant further
//! permissions, so the delegate's own grants must wait until that grant has
//! completed.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use clearance_core::SubjectIdentifier;

use crate::error::{PermsError, Result};

/// Minimum description length accepted by the remote service.
pub const MIN_DESCRIPTION_LEN: usize = 5;

/// Maximum description length accepted by the remote service.
pub const MAX_DESCRIPTION_LEN: usize = 256;

/// A permission that can be granted to a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PermissionType {
    InvoiceRead,
    InvoiceWrite,
    Introspection,
    CredentialsRead,
    /// Allows the holder to grant and revoke permissions for others.
    CredentialsManage,
    SubunitManage,
    EnforcementOperations,
}

impl PermissionType {
    /// True for permissions that let the holder grant further permissions.
    pub fn is_delegating(self) -> bool {
        matches!(self, PermissionType::CredentialsManage)
    }
}

/// Name of a natural person, sent when the subject is identified by a
/// certificate fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonDetails {
    pub first_name: String,
    pub last_name: String,
}

impl PersonDetails {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }
}

/// Identifier of an active permission, as listed by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionId(String);

impl PermissionId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PermissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A request to grant permissions to a subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantRequest {
    /// Who receives the permissions.
    pub subject: SubjectIdentifier,
    /// What is granted.
    pub permissions: Vec<PermissionType>,
    /// Free-text description stored with the grant.
    pub description: String,
    /// Required by the service for fingerprint subjects.
    pub subject_details: Option<PersonDetails>,
}

impl GrantRequest {
    /// Start a request with no permissions.
    pub fn new(subject: SubjectIdentifier, description: impl Into<String>) -> Self {
        Self {
            subject,
            permissions: Vec::new(),
            description: description.into(),
            subject_details: None,
        }
    }

    /// Add one permission.
    pub fn with_permission(mut self, permission: PermissionType) -> Self {
        self.permissions.push(permission);
        self
    }

    /// Add several permissions.
    pub fn with_permissions(mut self, permissions: impl IntoIterator<Item = PermissionType>) -> Self {
        self.permissions.extend(permissions);
        self
    }

    /// Attach the subject's name.
    pub fn with_subject_details(mut self, details: PersonDetails) -> Self {
        self.subject_details = Some(details);
        self
    }

    /// True if the request delegates permission management.
    pub fn is_delegating(&self) -> bool {
        self.permissions.iter().any(|p| p.is_delegating())
    }

    /// Check the request before it is sent.
    pub fn validate(&self) -> Result<()> {
        if self.permissions.is_empty() {
            return Err(PermsError::InvalidGrant("no permissions requested".into()));
        }

        let mut seen = HashSet::new();
        for permission in &self.permissions {
            if !seen.insert(permission) {
                return Err(PermsError::InvalidGrant(format!(
                    "duplicate permission: {permission:?}"
                )));
            }
        }

        let len = self.description.chars().count();
        if !(MIN_DESCRIPTION_LEN..=MAX_DESCRIPTION_LEN).contains(&len) {
            return Err(PermsError::InvalidGrant(format!(
                "description must be {MIN_DESCRIPTION_LEN}..={MAX_DESCRIPTION_LEN} characters, got {len}"
            )));
        }

        self.subject
            .validate()
            .map_err(|e| PermsError::InvalidGrant(format!("subject {}: {e}", self.subject)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> GrantRequest {
        GrantRequest::new(SubjectIdentifier::nip("5260250274"), "Accounting office")
            .with_permissions([PermissionType::InvoiceRead, PermissionType::InvoiceWrite])
    }

    #[test]
    fn test_valid_request() {
        assert!(valid().validate().is_ok());
        assert!(!valid().is_delegating());
    }

    #[test]
    fn test_empty_permissions_rejected() {
        let request = GrantRequest::new(SubjectIdentifier::nip("5260250274"), "Accounting office");
        assert!(matches!(request.validate(), Err(PermsError::InvalidGrant(_))));
    }

    #[test]
    fn test_duplicate_permissions_rejected() {
        let request = valid().with_permission(PermissionType::InvoiceRead);
        assert!(matches!(request.validate(), Err(PermsError::InvalidGrant(_))));
    }

    #[test]
    fn test_description_bounds() {
        let mut request = valid();
        request.description = "abcd".into();
        assert!(request.validate().is_err());

        request.description = "abcde".into();
        assert!(request.validate().is_ok());

        request.description = "x".repeat(MAX_DESCRIPTION_LEN);
        assert!(request.validate().is_ok());

        request.description = "x".repeat(MAX_DESCRIPTION_LEN + 1);
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_invalid_subject_rejected() {
        let request = GrantRequest::new(SubjectIdentifier::nip("5260250275"), "Accounting office")
            .with_permission(PermissionType::InvoiceRead);
        let err = request.validate().unwrap_err();
        assert!(err.to_string().contains("NIP:5260250275"));
    }

    #[test]
    fn test_delegating() {
        let request = valid().with_permission(PermissionType::CredentialsManage);
        assert!(request.is_delegating());
    }

    #[test]
    fn test_fingerprint_subject_with_details() {
        let request = GrantRequest::new(SubjectIdentifier::fingerprint("ab".repeat(32)), "Person grant")
            .with_permission(PermissionType::InvoiceRead)
            .with_subject_details(PersonDetails::new("Jan", "Kowalski"));
        assert!(request.validate().is_ok());

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["subject_details"]["last_name"], "Kowalski");
    }
}
