//! Known-answer vectors for AES-256-CBC (PKCS#7) and SHA-256.
//!
//! Outputs were produced with an independent implementation and must be
//! reproduced bit for bit.

/// One AES-256-CBC known answer.
#[derive(Debug, Clone)]
pub struct CipherVector {
    pub name: &'static str,
    pub key_hex: &'static str,
    pub iv_hex: &'static str,
    pub plaintext: &'static [u8],
    pub ciphertext_hex: &'static str,
}

impl CipherVector {
    pub fn key(&self) -> Vec<u8> {
        decode(self.key_hex)
    }

    pub fn iv(&self) -> Vec<u8> {
        decode(self.iv_hex)
    }

    pub fn ciphertext(&self) -> Vec<u8> {
        decode(self.ciphertext_hex)
    }
}

/// One SHA-256 known answer.
#[derive(Debug, Clone)]
pub struct HashVector {
    pub name: &'static str,
    pub input: &'static [u8],
    pub sha256_hex: &'static str,
    pub sha256_base64: &'static str,
}

fn decode(hex_str: &str) -> Vec<u8> {
    hex::decode(hex_str).unwrap_or_else(|e| panic!("bad vector hex {hex_str}: {e}"))
}

/// All AES-256-CBC vectors.
pub fn cipher_vectors() -> Vec<CipherVector> {
    vec![
        CipherVector {
            name: "full_padding_block",
            key_hex: "0001020304050607080900010203040506070809000102030405060708090001",
            iv_hex: "000102030405060708090a0b0c0d0e0f",
            plaintext: b"hello, clearance",
            ciphertext_hex: "ff3df7b0874046b12959e732cc3de50f353dd9b8bed9a73881faad7878d631ef",
        },
        CipherVector {
            name: "empty_plaintext",
            key_hex: "0001020304050607080900010203040506070809000102030405060708090001",
            iv_hex: "000102030405060708090a0b0c0d0e0f",
            plaintext: b"",
            ciphertext_hex: "89628f8b38a44834a2cf4563169ed3cc",
        },
        CipherVector {
            name: "short_document",
            key_hex: "4242424242424242424242424242424242424242424242424242424242424242",
            iv_hex: "07070707070707070707070707070707",
            plaintext: b"<Faktura/>",
            ciphertext_hex: "5065ce32b19c02037d62981a535e2e52",
        },
        CipherVector {
            name: "zero_key_two_blocks",
            key_hex: "0000000000000000000000000000000000000000000000000000000000000000",
            iv_hex: "00000000000000000000000000000000",
            plaintext: b"0123456789abcdef0123456789abcdef",
            ciphertext_hex: "b8c3331ada9c9e93b35ce601c0340dadf27206187c6322e050a9351f0ef9340d9b4ffde45407432f7022c19af13ba1b1",
        },
    ]
}

/// All SHA-256 vectors.
pub fn hash_vectors() -> Vec<HashVector> {
    vec![
        HashVector {
            name: "empty",
            input: b"",
            sha256_hex: "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
            sha256_base64: "47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=",
        },
        HashVector {
            name: "hello",
            input: b"hello",
            sha256_hex: "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824",
            sha256_base64: "LPJNul+wow4m6DsqxbninhsWHlwfp0JecwQzYpOLmCQ=",
        },
        HashVector {
            name: "short_document",
            input: b"<Faktura/>",
            sha256_hex: "5d60306e3f75f1218268394c9ea193369465df6232902d2298938be8a298c85b",
            sha256_base64: "XWAwbj918SGCaDlMnqGTNpRl32IykC0imJOL6KKYyFs=",
        },
    ]
}
