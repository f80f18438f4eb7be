//! # Clearance Core
//!
//! Pure primitives for the clearance client: session cryptography, content
//! metadata, and the identifiers shared by every other crate.
//!
//! This crate performs no I/O. Everything here is CPU-bound and safe to call
//! concurrently with disjoint inputs.
//!
//! ## Key Types
//!
//! - [`CryptoCodec`] - AES-256-CBC encryption and SHA-256 metadata
//! - [`EncryptionContext`] - Per-session key and IV, owned by one session
//! - [`ContentMetadata`] - Size and hash of plaintext or ciphertext
//! - [`ReferenceNumber`] - Opaque identifier issued by the remote service
//! - [`SubjectIdentifier`] - Tagged NIP / PESEL / fingerprint / internal id
//! - [`TransportError`] - Failure reported by a remote collaborator
//!
//! ## Usage
//!
//! ```rust
//! use clearance_core::CryptoCodec;
//!
//! let codec = CryptoCodec::new();
//! let ctx = codec.generate_context().unwrap();
//!
//! let document = b"<Faktura/>";
//! let encrypted = codec.encrypt(document, &ctx).unwrap();
//!
//! let plain_meta = codec.metadata_of(document);
//! let cipher_meta = codec.metadata_of(&encrypted);
//! assert_eq!(plain_meta.size_bytes, document.len() as u64);
//! assert_eq!(cipher_meta.size_bytes, encrypted.len() as u64);
//! ```

pub mod crypto;
pub mod error;
pub mod identifier;
pub mod types;

pub use crypto::{ContentMetadata, CryptoCodec, EncryptionContext, Sha256Digest, IV_LEN, KEY_LEN};
pub use error::{CryptoError, IdentifierError, Result, TransportError};
pub use identifier::{IdentifierKind, SubjectIdentifier};
pub use types::{FormCode, ReferenceNumber};
