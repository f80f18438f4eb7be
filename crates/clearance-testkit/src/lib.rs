//! # Clearance Testkit
//!
//! Testing utilities for the clearance client.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Known-answer vectors**: AES-256-CBC and SHA-256 outputs for fixed inputs
//! - **Generators**: Proptest strategies for payloads, identifiers, statuses, policies
//! - **Fixtures**: In-memory endpoints and sample documents
//!
//! ## Known-Answer Vectors
//!
//! ```rust
//! use clearance_core::{CryptoCodec, EncryptionContext};
//! use clearance_testkit::vectors::cipher_vectors;
//!
//! let codec = CryptoCodec::new();
//! for vector in cipher_vectors() {
//!     let ctx = EncryptionContext::from_slices(&vector.key(), &vector.iv()).unwrap();
//!     assert_eq!(codec.encrypt(vector.plaintext, &ctx).unwrap(), vector.ciphertext());
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use clearance_testkit::generators::valid_nip;
//!
//! proptest! {
//!     #[test]
//!     fn nip_validates(nip in valid_nip()) {
//!         prop_assert!(SubjectIdentifier::nip(nip).validate().is_ok());
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{fast_policy, grant_request, sample_batch, sample_invoice, TestFixture, SELLER_NIP};
