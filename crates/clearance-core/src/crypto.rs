//! Session cryptography: AES-256-CBC payload encryption and SHA-256 content
//! metadata.
//!
//! Every submission session owns exactly one [`EncryptionContext`]. Items
//! submitted through the session are encrypted with it, and both the
//! plaintext and the ciphertext are described by a [`ContentMetadata`]
//! (size + SHA-256) that the remote service uses to verify integrity.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::{engine::general_purpose::STANDARD, Engine};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CryptoError, Result};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Symmetric key length in bytes (AES-256).
pub const KEY_LEN: usize = 32;

/// Initialization vector length in bytes (one AES block).
pub const IV_LEN: usize = 16;

/// A 32-byte SHA-256 digest. Serializes as standard base64.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sha256Digest(pub [u8; 32]);

impl Sha256Digest {
    /// Compute the SHA-256 digest of the given data.
    pub fn hash(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Standard base64, the form the remote service expects.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    /// Parse from standard base64.
    pub fn from_base64(s: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(s)
            .map_err(|e| CryptoError::Operation(format!("invalid base64 digest: {e}")))?;
        let arr: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| CryptoError::Operation(format!("digest must be 32 bytes, got {}", bytes.len())))?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for Sha256Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sha256({})", &self.to_hex()[..16])
    }
}

impl Serialize for Sha256Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for Sha256Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Self::from_base64(&encoded).map_err(serde::de::Error::custom)
    }
}

impl AsRef<[u8]> for Sha256Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Sha256Digest {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// Size and hash of a piece of content.
///
/// Always computed from the bytes at hand; never carried over after the
/// content changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentMetadata {
    /// Length of the content in bytes.
    pub size_bytes: u64,
    /// SHA-256 of the content.
    pub content_hash: Sha256Digest,
}

impl ContentMetadata {
    /// Hash in base64, as transmitted to the remote service.
    pub fn hash_base64(&self) -> String {
        self.content_hash.to_base64()
    }

    /// Hash in hex, for logs.
    pub fn hash_hex(&self) -> String {
        self.content_hash.to_hex()
    }
}

/// Symmetric key and IV for one submission session.
///
/// Not `Clone`: a context is moved into the single session that uses it and
/// its key material is wiped when that session is dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct EncryptionContext {
    key: [u8; KEY_LEN],
    iv: [u8; IV_LEN],
}

impl EncryptionContext {
    /// Build a context from fixed-size key material.
    pub const fn from_parts(key: [u8; KEY_LEN], iv: [u8; IV_LEN]) -> Self {
        Self { key, iv }
    }

    /// Build a context from untrusted slices, checking their lengths.
    pub fn from_slices(key: &[u8], iv: &[u8]) -> Result<Self> {
        let key: [u8; KEY_LEN] = key.try_into().map_err(|_| {
            CryptoError::Operation(format!("key must be {KEY_LEN} bytes, got {}", key.len()))
        })?;
        let iv: [u8; IV_LEN] = iv.try_into().map_err(|_| {
            CryptoError::Operation(format!("iv must be {IV_LEN} bytes, got {}", iv.len()))
        })?;
        Ok(Self { key, iv })
    }

    /// The symmetric key. Exposed so a transport can wrap it for the remote
    /// service; never log it.
    pub fn key(&self) -> &[u8; KEY_LEN] {
        &self.key
    }

    /// The initialization vector.
    pub fn iv(&self) -> &[u8; IV_LEN] {
        &self.iv
    }

    /// IV in base64, as sent alongside the wrapped key when opening a session.
    pub fn iv_base64(&self) -> String {
        STANDARD.encode(self.iv)
    }
}

impl fmt::Debug for EncryptionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionContext")
            .field("key", &"<redacted>")
            .field("iv", &"<redacted>")
            .finish()
    }
}

/// Stateless codec for session encryption and content metadata.
///
/// Safe to share between tasks; every call works on its own inputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct CryptoCodec;

impl CryptoCodec {
    /// Create a codec.
    pub const fn new() -> Self {
        Self
    }

    /// Generate a fresh random key and IV from the operating system's
    /// randomness source.
    pub fn generate_context(&self) -> Result<EncryptionContext> {
        let mut key = [0u8; KEY_LEN];
        let mut iv = [0u8; IV_LEN];
        OsRng
            .try_fill_bytes(&mut key)
            .map_err(|e| CryptoError::Init(e.to_string()))?;
        OsRng
            .try_fill_bytes(&mut iv)
            .map_err(|e| CryptoError::Init(e.to_string()))?;

        let ctx = EncryptionContext::from_parts(key, iv);
        key.zeroize();
        Ok(ctx)
    }

    /// Encrypt with AES-256-CBC and PKCS#7 padding.
    ///
    /// Deterministic for a given (plaintext, context).
    pub fn encrypt(&self, plaintext: &[u8], ctx: &EncryptionContext) -> Result<Vec<u8>> {
        Self::encrypt_raw(plaintext, &ctx.key, &ctx.iv)
    }

    /// Decrypt data produced by [`CryptoCodec::encrypt`].
    pub fn decrypt(&self, ciphertext: &[u8], ctx: &EncryptionContext) -> Result<Vec<u8>> {
        Self::decrypt_raw(ciphertext, &ctx.key, &ctx.iv)
    }

    /// Encrypt with caller-provided key material of unchecked length.
    pub fn encrypt_raw(plaintext: &[u8], key: &[u8], iv: &[u8]) -> Result<Vec<u8>> {
        let cipher = Aes256CbcEnc::new_from_slices(key, iv)
            .map_err(|e| CryptoError::Operation(e.to_string()))?;
        Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
    }

    /// Decrypt with caller-provided key material of unchecked length.
    pub fn decrypt_raw(ciphertext: &[u8], key: &[u8], iv: &[u8]) -> Result<Vec<u8>> {
        let cipher = Aes256CbcDec::new_from_slices(key, iv)
            .map_err(|e| CryptoError::Operation(e.to_string()))?;
        cipher
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|e| CryptoError::Operation(e.to_string()))
    }

    /// Size and SHA-256 of the content.
    pub fn metadata_of(&self, content: &[u8]) -> ContentMetadata {
        ContentMetadata {
            size_bytes: content.len() as u64,
            content_hash: Sha256Digest::hash(content),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fixed_context() -> EncryptionContext {
        EncryptionContext::from_parts([0x42; KEY_LEN], [0x07; IV_LEN])
    }

    #[test]
    fn test_encrypt_decrypt() {
        let codec = CryptoCodec::new();
        let ctx = codec.generate_context().unwrap();
        let plaintext = b"<Faktura>hello</Faktura>";

        let ciphertext = codec.encrypt(plaintext, &ctx).unwrap();
        assert_ne!(ciphertext.as_slice(), plaintext.as_slice());
        assert_eq!(ciphertext.len() % 16, 0);

        let decrypted = codec.decrypt(&ciphertext, &ctx).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_encrypt_is_deterministic() {
        let codec = CryptoCodec::new();
        let ctx = fixed_context();

        let a = codec.encrypt(b"same input", &ctx).unwrap();
        let b = codec.encrypt(b"same input", &ctx).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_plaintext_is_one_padding_block() {
        let codec = CryptoCodec::new();
        let ciphertext = codec.encrypt(b"", &fixed_context()).unwrap();
        assert_eq!(ciphertext.len(), 16);
    }

    #[test]
    fn test_decrypt_wrong_key_fails_or_differs() {
        let codec = CryptoCodec::new();
        let ctx1 = fixed_context();
        let ctx2 = EncryptionContext::from_parts([0x43; KEY_LEN], [0x07; IV_LEN]);

        let ciphertext = codec.encrypt(b"secret invoice", &ctx1).unwrap();

        // CBC has no authentication: a wrong key either trips the padding
        // check or yields garbage.
        match codec.decrypt(&ciphertext, &ctx2) {
            Ok(garbage) => assert_ne!(garbage, b"secret invoice"),
            Err(CryptoError::Operation(_)) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_key_length_rejected() {
        let err = CryptoCodec::encrypt_raw(b"data", &[0u8; 16], &[0u8; IV_LEN]).unwrap_err();
        assert!(matches!(err, CryptoError::Operation(_)));

        let err = CryptoCodec::encrypt_raw(b"data", &[0u8; KEY_LEN], &[0u8; 12]).unwrap_err();
        assert!(matches!(err, CryptoError::Operation(_)));
    }

    #[test]
    fn test_context_from_slices_checks_lengths() {
        assert!(EncryptionContext::from_slices(&[1u8; KEY_LEN], &[2u8; IV_LEN]).is_ok());
        assert!(matches!(
            EncryptionContext::from_slices(&[1u8; 31], &[2u8; IV_LEN]),
            Err(CryptoError::Operation(_))
        ));
        assert!(matches!(
            EncryptionContext::from_slices(&[1u8; KEY_LEN], &[2u8; 17]),
            Err(CryptoError::Operation(_))
        ));
    }

    #[test]
    fn test_truncated_ciphertext_rejected() {
        let codec = CryptoCodec::new();
        let ctx = fixed_context();
        let mut ciphertext = codec.encrypt(b"0123456789abcdef-more", &ctx).unwrap();
        ciphertext.truncate(ciphertext.len() - 3);

        assert!(matches!(
            codec.decrypt(&ciphertext, &ctx),
            Err(CryptoError::Operation(_))
        ));
    }

    #[test]
    fn test_generated_contexts_differ() {
        let codec = CryptoCodec::new();
        let a = codec.generate_context().unwrap();
        let b = codec.generate_context().unwrap();

        assert_ne!(a.key(), b.key());
        assert_ne!(a.iv(), b.iv());
    }

    #[test]
    fn test_debug_redacts_key_material() {
        let ctx = fixed_context();
        let debug = format!("{:?}", ctx);
        assert!(debug.contains("redacted"));
        assert!(!debug.contains("42"));
    }

    #[test]
    fn test_metadata_known_hash() {
        let meta = CryptoCodec::new().metadata_of(b"hello");
        assert_eq!(meta.size_bytes, 5);
        assert_eq!(
            meta.hash_hex(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(
            meta.hash_base64(),
            "LPJNul+wow4m6DsqxbninhsWHlwfp0JecwQzYpOLmCQ="
        );
    }

    #[test]
    fn test_digest_base64_roundtrip() {
        let digest = Sha256Digest::hash(b"invoice");
        let recovered = Sha256Digest::from_base64(&digest.to_base64()).unwrap();
        assert_eq!(digest, recovered);

        assert!(Sha256Digest::from_base64("AAAA").is_err());
        assert!(Sha256Digest::from_base64("not base64!").is_err());
    }

    #[test]
    fn test_metadata_serializes_hash_as_base64() {
        let meta = CryptoCodec::new().metadata_of(b"hello");
        let json = serde_json::to_value(meta).unwrap();
        assert_eq!(json["size_bytes"], 5);
        assert_eq!(json["content_hash"], "LPJNul+wow4m6DsqxbninhsWHlwfp0JecwQzYpOLmCQ=");

        let back: ContentMetadata = serde_json::from_value(json).unwrap();
        assert_eq!(back, meta);
    }

    proptest! {
        #[test]
        fn prop_roundtrip(plaintext in prop::collection::vec(any::<u8>(), 0..2048),
                          key in any::<[u8; 32]>(),
                          iv in any::<[u8; 16]>()) {
            let codec = CryptoCodec::new();
            let ctx = EncryptionContext::from_parts(key, iv);
            let ciphertext = codec.encrypt(&plaintext, &ctx).unwrap();
            prop_assert_eq!(codec.decrypt(&ciphertext, &ctx).unwrap(), plaintext);
        }

        #[test]
        fn prop_metadata_idempotent(content in prop::collection::vec(any::<u8>(), 0..4096)) {
            let codec = CryptoCodec::new();
            let first = codec.metadata_of(&content);
            let second = codec.metadata_of(&content);
            prop_assert_eq!(first.size_bytes, content.len() as u64);
            prop_assert_eq!(first, second);
        }
    }
}
