//! Subject identifiers.
//!
//! The remote service identifies taxpayers, persons, certificates and
//! internal sub-units by different identifier types. They are modelled as one
//! tagged value instead of one type per pairing.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::IdentifierError;

const NIP_WEIGHTS: [u32; 9] = [6, 5, 7, 2, 3, 4, 5, 6, 7];
const PESEL_WEIGHTS: [u32; 10] = [1, 3, 7, 9, 1, 3, 7, 9, 1, 3];

/// Kind of subject identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentifierKind {
    /// Tax identification number (10 digits).
    Nip,
    /// Personal identification number (11 digits).
    Pesel,
    /// SHA-256 fingerprint of a certificate (64 hex characters).
    Fingerprint,
    /// Internal sub-unit identifier: `<NIP>-<5 digits>`.
    InternalId,
}

impl IdentifierKind {
    fn label(self) -> &'static str {
        match self {
            IdentifierKind::Nip => "NIP",
            IdentifierKind::Pesel => "PESEL",
            IdentifierKind::Fingerprint => "fingerprint",
            IdentifierKind::InternalId => "internal id",
        }
    }
}

/// A subject identifier: a kind and its textual value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectIdentifier {
    pub kind: IdentifierKind,
    pub value: String,
}

impl SubjectIdentifier {
    /// Create an identifier without validating it.
    pub fn new(kind: IdentifierKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    pub fn nip(value: impl Into<String>) -> Self {
        Self::new(IdentifierKind::Nip, value)
    }

    pub fn pesel(value: impl Into<String>) -> Self {
        Self::new(IdentifierKind::Pesel, value)
    }

    pub fn fingerprint(value: impl Into<String>) -> Self {
        Self::new(IdentifierKind::Fingerprint, value)
    }

    pub fn internal_id(value: impl Into<String>) -> Self {
        Self::new(IdentifierKind::InternalId, value)
    }

    /// Check the value against the format rules of its kind.
    pub fn validate(&self) -> Result<(), IdentifierError> {
        match self.kind {
            IdentifierKind::Nip => validate_nip(&self.value),
            IdentifierKind::Pesel => validate_pesel(&self.value),
            IdentifierKind::Fingerprint => validate_fingerprint(&self.value),
            IdentifierKind::InternalId => validate_internal_id(&self.value),
        }
    }
}

impl fmt::Display for SubjectIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.label(), self.value)
    }
}

fn digits(kind: IdentifierKind, value: &str, expected: usize) -> Result<Vec<u32>, IdentifierError> {
    if value.len() != expected {
        return Err(IdentifierError::InvalidLength {
            kind: kind.label(),
            expected,
            got: value.len(),
        });
    }
    value
        .chars()
        .map(|c| c.to_digit(10))
        .collect::<Option<Vec<_>>>()
        .ok_or(IdentifierError::InvalidCharacters { kind: kind.label() })
}

/// Compute the NIP check digit for the first nine digits.
///
/// Returns `None` when the weighted sum gives 10, which no valid NIP has.
pub fn nip_check_digit(first_nine: &[u32]) -> Option<u32> {
    let sum: u32 = first_nine
        .iter()
        .zip(NIP_WEIGHTS.iter())
        .map(|(d, w)| d * w)
        .sum();
    match sum % 11 {
        10 => None,
        check => Some(check),
    }
}

/// Compute the PESEL check digit for the first ten digits.
pub fn pesel_check_digit(first_ten: &[u32]) -> u32 {
    let sum: u32 = first_ten
        .iter()
        .zip(PESEL_WEIGHTS.iter())
        .map(|(d, w)| d * w)
        .sum();
    (10 - sum % 10) % 10
}

fn validate_nip(value: &str) -> Result<(), IdentifierError> {
    let kind = IdentifierKind::Nip;
    let d = digits(kind, value, 10)?;
    match nip_check_digit(&d[..9]) {
        Some(check) if check == d[9] => Ok(()),
        _ => Err(IdentifierError::ChecksumMismatch { kind: kind.label() }),
    }
}

fn validate_pesel(value: &str) -> Result<(), IdentifierError> {
    let kind = IdentifierKind::Pesel;
    let d = digits(kind, value, 11)?;
    if pesel_check_digit(&d[..10]) == d[10] {
        Ok(())
    } else {
        Err(IdentifierError::ChecksumMismatch { kind: kind.label() })
    }
}

fn validate_fingerprint(value: &str) -> Result<(), IdentifierError> {
    let kind = IdentifierKind::Fingerprint;
    if value.len() != 64 {
        return Err(IdentifierError::InvalidLength {
            kind: kind.label(),
            expected: 64,
            got: value.len(),
        });
    }
    if !value.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(IdentifierError::InvalidCharacters { kind: kind.label() });
    }
    Ok(())
}

fn validate_internal_id(value: &str) -> Result<(), IdentifierError> {
    let kind = IdentifierKind::InternalId;
    let (nip, suffix) = value.split_once('-').ok_or_else(|| IdentifierError::Malformed {
        kind: kind.label(),
        reason: "expected <NIP>-<5 digits>".into(),
    })?;
    validate_nip(nip)?;
    digits(kind, suffix, 5)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_nip() {
        assert!(SubjectIdentifier::nip("5260250274").validate().is_ok());
    }

    #[test]
    fn test_nip_checksum_mismatch() {
        assert_eq!(
            SubjectIdentifier::nip("5260250275").validate(),
            Err(IdentifierError::ChecksumMismatch { kind: "NIP" })
        );
    }

    #[test]
    fn test_nip_wrong_length_and_characters() {
        assert!(matches!(
            SubjectIdentifier::nip("526025027").validate(),
            Err(IdentifierError::InvalidLength { expected: 10, got: 9, .. })
        ));
        assert!(matches!(
            SubjectIdentifier::nip("52602502A4").validate(),
            Err(IdentifierError::InvalidCharacters { .. })
        ));
    }

    #[test]
    fn test_valid_pesel() {
        assert!(SubjectIdentifier::pesel("44051401359").validate().is_ok());
        assert!(SubjectIdentifier::pesel("44051401358").validate().is_err());
    }

    #[test]
    fn test_fingerprint() {
        let ok = "a".repeat(64);
        assert!(SubjectIdentifier::fingerprint(ok).validate().is_ok());
        assert!(SubjectIdentifier::fingerprint("z".repeat(64)).validate().is_err());
        assert!(SubjectIdentifier::fingerprint("abc").validate().is_err());
    }

    #[test]
    fn test_internal_id() {
        assert!(SubjectIdentifier::internal_id("5260250274-00001").validate().is_ok());
        assert!(SubjectIdentifier::internal_id("5260250274").validate().is_err());
        assert!(SubjectIdentifier::internal_id("5260250274-001").validate().is_err());
        assert!(SubjectIdentifier::internal_id("5260250275-00001").validate().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(SubjectIdentifier::nip("5260250274").to_string(), "NIP:5260250274");
    }
}
