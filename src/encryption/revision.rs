/// Revision of the standard security handler (`/R`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EncryptionRevision {
    /// RC4, 40-bit key. Deprecated in PDF 2.0.
    R2,
    /// RC4, 40 to 128-bit key. Deprecated in PDF 2.0.
    R3,
    /// Crypt filters with RC4 or AES-128. Deprecated in PDF 2.0.
    R4,
    /// AES-256 with a single SHA-256 password hash (Adobe extension level 3). Deprecated.
    R5,
    /// AES-256 with the hardened password hash of PDF 2.0.
    R6,
}

impl EncryptionRevision {
    pub fn from_number(number: i64) -> Option<Self> {
        match number {
            2 => Some(Self::R2),
            3 => Some(Self::R3),
            4 => Some(Self::R4),
            5 => Some(Self::R5),
            6 => Some(Self::R6),
            _ => None,
        }
    }

    pub fn number(self) -> i64 {
        match self {
            Self::R2 => 2,
            Self::R3 => 3,
            Self::R4 => 4,
            Self::R5 => 5,
            Self::R6 => 6,
        }
    }

    /// The `/V` value written together with this revision.
    pub fn version(self) -> i64 {
        match self {
            Self::R2 => 1,
            Self::R3 => 2,
            Self::R4 => 4,
            Self::R5 | Self::R6 => 5,
        }
    }

    /// Default file encryption key length in bytes.
    pub fn key_length(self) -> usize {
        match self {
            Self::R2 => 5,
            Self::R3 | Self::R4 => 16,
            Self::R5 | Self::R6 => 32,
        }
    }

    /// Whether the revision belongs to the SHA-256/AES-256 family.
    pub fn is_aes256(self) -> bool {
        matches!(self, Self::R5 | Self::R6)
    }

    /// Whether crypt filters (`/CF`, `/StmF`, `/StrF`) are part of the dictionary.
    pub fn uses_crypt_filters(self) -> bool {
        self >= Self::R4
    }
}

/// Cipher applied to strings and streams.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CipherKind {
    /// RC4 (`/CFM /V2`).
    Rc4,
    /// AES-128 in CBC mode (`/CFM /AESV2`).
    AesV2,
    /// AES-256 in CBC mode (`/CFM /AESV3`).
    AesV3,
}

impl CipherKind {
    /// The `/CFM` name of the crypt filter method.
    pub fn method(self) -> &'static [u8] {
        match self {
            Self::Rc4 => b"V2",
            Self::AesV2 => b"AESV2",
            Self::AesV3 => b"AESV3",
        }
    }

    pub fn from_method(method: &[u8]) -> Option<Self> {
        match method {
            b"V2" => Some(Self::Rc4),
            b"AESV2" => Some(Self::AesV2),
            b"AESV3" => Some(Self::AesV3),
            _ => None,
        }
    }
}

/// Cipher parameters chosen for a new encryption dictionary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CipherSettings {
    pub revision: EncryptionRevision,
    pub cipher: CipherKind,
    /// File encryption key length in bytes.
    pub key_length: usize,
    pub encrypt_metadata: bool,
    /// Encrypt embedded file streams only, leaving strings and other streams in clear text.
    pub embedded_files_only: bool,
}

impl CipherSettings {
    /// The `/V` value.
    pub fn version(&self) -> i64 {
        self.revision.version()
    }

    pub fn uses_crypt_filters(&self) -> bool {
        self.revision.uses_crypt_filters()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revision_numbers_round_trip() {
        for number in 2..=6 {
            assert_eq!(EncryptionRevision::from_number(number).unwrap().number(), number);
        }
        assert_eq!(EncryptionRevision::from_number(1), None);
        assert_eq!(EncryptionRevision::from_number(7), None);
    }

    #[test]
    fn versions_and_key_lengths() {
        assert_eq!(EncryptionRevision::R2.version(), 1);
        assert_eq!(EncryptionRevision::R4.version(), 4);
        assert_eq!(EncryptionRevision::R6.version(), 5);
        assert_eq!(EncryptionRevision::R2.key_length(), 5);
        assert_eq!(EncryptionRevision::R6.key_length(), 32);
        assert!(EncryptionRevision::R4.uses_crypt_filters());
        assert!(!EncryptionRevision::R3.uses_crypt_filters());
    }

    #[test]
    fn cipher_methods() {
        assert_eq!(CipherKind::from_method(b"AESV2"), Some(CipherKind::AesV2));
        assert_eq!(CipherKind::from_method(b"None"), None);
        assert_eq!(CipherKind::AesV3.method(), b"AESV3");
    }
}
