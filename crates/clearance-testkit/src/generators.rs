//! Proptest generators for property-based testing.

use proptest::prelude::*;
use std::time::Duration;

use clearance_core::identifier::{nip_check_digit, pesel_check_digit};
use clearance_core::{EncryptionContext, SubjectIdentifier, IV_LEN, KEY_LEN};
use clearance_track::{OperationStatus, PollingPolicy};

fn render(digits: &[u32]) -> String {
    digits.iter().map(|d| char::from(b'0' + *d as u8)).collect()
}

/// Generate payload bytes of specified max length.
pub fn payload(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate an encryption context from random key material.
pub fn context() -> impl Strategy<Value = EncryptionContext> {
    (any::<[u8; KEY_LEN]>(), any::<[u8; IV_LEN]>())
        .prop_map(|(key, iv)| EncryptionContext::from_parts(key, iv))
}

/// Generate a NIP with a valid check digit.
pub fn valid_nip() -> impl Strategy<Value = String> {
    prop::array::uniform9(0u32..10).prop_filter_map("NIP check digit would be 10", |first| {
        nip_check_digit(&first).map(|check| {
            let mut digits = first.to_vec();
            digits.push(check);
            render(&digits)
        })
    })
}

/// Generate a PESEL with a valid check digit.
pub fn valid_pesel() -> impl Strategy<Value = String> {
    prop::array::uniform10(0u32..10).prop_map(|first| {
        let mut digits = first.to_vec();
        digits.push(pesel_check_digit(&first));
        render(&digits)
    })
}

/// Generate a valid NIP subject identifier.
pub fn nip_subject() -> impl Strategy<Value = SubjectIdentifier> {
    valid_nip().prop_map(SubjectIdentifier::nip)
}

/// Generate a non-terminal status code (anything but 200, below 300).
pub fn pending_code() -> impl Strategy<Value = i32> {
    prop_oneof![100i32..200, 201i32..300]
}

/// Generate a failure status code.
pub fn failure_code() -> impl Strategy<Value = i32> {
    300i32..600
}

/// Generate an operation status with the given code strategy.
pub fn status_with(code: impl Strategy<Value = i32>) -> impl Strategy<Value = OperationStatus> {
    code.prop_map(|code| OperationStatus::new(code, format!("status {code}")))
}

/// Generate a polling policy with a non-zero interval.
pub fn polling_policy() -> impl Strategy<Value = PollingPolicy> {
    (0u64..120_000, 1u64..5_000).prop_map(|(max_wait_ms, interval_ms)| {
        PollingPolicy::new(
            Duration::from_millis(max_wait_ms),
            Duration::from_millis(interval_ms),
        )
    })
}
