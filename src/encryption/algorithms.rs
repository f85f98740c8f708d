use aes::cipher::{BlockDecryptMut as _, BlockEncryptMut as _, KeyInit as _, KeyIvInit as _};
use crate::{Error, Result};
use md5::{Digest as _, Md5};
use sha2::{Sha256, Sha384, Sha512};
use std::sync::Arc;
use super::password::{pad_password, PAD_BYTES, MAX_PASSWORD_LEN};
use super::provider::{note_md5_usage, CryptoProvider};
use super::rc4::Rc4;
use super::revision::EncryptionRevision;

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256EcbEnc = ecb::Encryptor<aes::Aes256>;

type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;
type Aes256EcbDec = ecb::Decryptor<aes::Aes256>;

/// Key derivation and password validation of the standard security handler.
///
/// Holds the values of the encryption dictionary that enter the key derivation. When writing,
/// the `compute_*` functions fill them in one after another; when reading, they are taken from
/// the parsed dictionary and the `authenticate_*` functions check a password against them.
#[derive(Clone, Debug)]
pub struct KeyDerivation {
    pub(crate) revision: EncryptionRevision,
    /// File encryption key length in bytes.
    pub(crate) key_length: usize,
    pub(crate) encrypt_metadata: bool,
    /// The `/P` value.
    pub(crate) permissions: i32,
    /// First element of the trailer's `/ID` array.
    pub(crate) file_id: Vec<u8>,
    pub(crate) owner_value: Vec<u8>,
    pub(crate) owner_encrypted: Vec<u8>,
    pub(crate) user_value: Vec<u8>,
    pub(crate) user_encrypted: Vec<u8>,
    pub(crate) permission_encrypted: Vec<u8>,
    provider: Arc<dyn CryptoProvider>,
}

impl KeyDerivation {
    pub fn new(revision: EncryptionRevision, key_length: usize, provider: Arc<dyn CryptoProvider>) -> Self {
        Self {
            revision,
            key_length,
            encrypt_metadata: true,
            permissions: 0,
            file_id: Vec::new(),
            owner_value: Vec::new(),
            owner_encrypted: Vec::new(),
            user_value: Vec::new(),
            user_encrypted: Vec::new(),
            permission_encrypted: Vec::new(),
            provider,
        }
    }

    /// Number of bytes of the MD5-derived RC4 key (revision 4 and earlier).
    fn md5_key_length(&self) -> Result<usize> {
        let n = match self.revision {
            EncryptionRevision::R2 => 5,
            _ => self.key_length,
        };

        // The maximum supported key length is 16 bytes (128 bits) due to the use of MD5.
        if !(5..=16).contains(&n) {
            return Err(Error::Malformed {
                field: "Length",
                reason: "is not between 40 and 128 bits",
            });
        }

        Ok(n)
    }

    /// Compute a file encryption key in order to encrypt/decrypt a document (revision 4 and
    /// earlier).
    ///
    /// This implements Algorithm 2 as described in ISO 32000-2:2020 (PDF 2.0).
    pub(crate) fn compute_file_encryption_key_r4(&self, password: &[u8]) -> Result<Vec<u8>> {
        note_md5_usage(self.provider.as_ref());

        let n = self.md5_key_length()?;

        // Initialize the MD5 hash function and pass the padded password as input.
        let mut hasher = Md5::new();
        hasher.update(pad_password(password));

        // Pass the value of the encryption dictionary's O entry to the MD5 hash function.
        hasher.update(&self.owner_value);

        // Convert the integer value of the P entry to a 32-bit unsigned binary number and pass
        // these bytes to the MD5 hash function, low-order byte first.
        hasher.update((self.permissions as u32).to_le_bytes());

        // Pass the first element of the file's file identifier array.
        hasher.update(&self.file_id);

        // (Security handlers of revision 4 or greater) If document metadata is not being encrypted,
        // pass 4 bytes with the value 0xFFFFFFFF to the MD5 hash function.
        if self.revision >= EncryptionRevision::R4 && !self.encrypt_metadata {
            hasher.update(b"\xff\xff\xff\xff");
        }

        let mut hash = hasher.finalize();

        // (Security handlers of revision 3 or greater) Do the following 50 times: take the output
        // from the previous MD5 hash and pass the first n bytes of the output as input into a new
        // MD5 hash.
        if self.revision >= EncryptionRevision::R3 {
            for _ in 0..50 {
                hash = Md5::digest(&hash[..n]);
            }
        }

        Ok(hash[..n].to_vec())
    }

    /// The RC4 key protecting the `/O` entry, derived from the owner password.
    fn owner_rc4_key(&self, owner_password: &[u8]) -> Result<Vec<u8>> {
        let n = self.md5_key_length()?;

        let mut hash = Md5::digest(pad_password(owner_password));

        // (Security handlers of revision 3 or greater) Do the following 50 times: take the output
        // from the previous MD5 hash and pass it as input into a new MD5 hash.
        if self.revision >= EncryptionRevision::R3 {
            for _ in 0..50 {
                hash = Md5::digest(hash);
            }
        }

        Ok(hash[..n].to_vec())
    }

    /// Compute the encryption dictionary's O-entry value (revision 4 and earlier).
    ///
    /// This implements Algorithm 3 as described in ISO 32000-2:2020 (PDF 2.0).
    pub(crate) fn compute_hashed_owner_password_r4(&self, owner_password: &[u8], user_password: &[u8]) -> Result<Vec<u8>> {
        note_md5_usage(self.provider.as_ref());

        let key = self.owner_rc4_key(owner_password)?;

        // Encrypt the padded user password with an RC4 encryption function keyed by the owner key.
        let mut result = Rc4::new(&key).process(pad_password(user_password));

        // (Security handlers of revision 3 or greater) Do the following 19 times: re-encrypt with a
        // key obtained by XOR-ing each byte of the owner key with the iteration counter (1 to 19).
        if self.revision >= EncryptionRevision::R3 {
            let mut round_key = vec![0u8; key.len()];

            for i in 1..=19 {
                for (in_byte, out_byte) in key.iter().zip(round_key.iter_mut()) {
                    *out_byte = in_byte ^ i;
                }

                result = Rc4::new(&round_key).process(&result);
            }
        }

        Ok(result)
    }

    /// Compute the encryption dictionary's U-entry value (revision 4 and earlier).
    ///
    /// This implements Algorithm 4 (revision 2) and Algorithm 5 (revision 3 or 4) as described
    /// in ISO 32000-2:2020 (PDF 2.0). Returns the U value and the file encryption key.
    pub(crate) fn compute_hashed_user_password_r4(&self, user_password: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
        let file_encryption_key = self.compute_file_encryption_key_r4(user_password)?;

        if self.revision == EncryptionRevision::R2 {
            // Encrypt the 32-byte padding string using an RC4 encryption function with the file
            // encryption key.
            let result = Rc4::new(&file_encryption_key).process(PAD_BYTES);
            return Ok((result, file_encryption_key));
        }

        // Initialize the MD5 hash function, pass the 32-byte padding string and the first element
        // of the file identifier array, and finish the hash.
        let mut hasher = Md5::new();
        hasher.update(PAD_BYTES);
        hasher.update(&self.file_id);
        let hash = hasher.finalize();

        // Encrypt the 16-byte result of the hash with the file encryption key, then 19 more times
        // with the key XOR-ed with the iteration counter.
        let mut result = Rc4::new(&file_encryption_key).process(hash);
        let mut round_key = vec![0u8; file_encryption_key.len()];

        for i in 1..=19 {
            for (in_byte, out_byte) in file_encryption_key.iter().zip(round_key.iter_mut()) {
                *out_byte = in_byte ^ i;
            }

            result = Rc4::new(&round_key).process(&result);
        }

        // Append 16 bytes of arbitrary padding to store a 32-byte value.
        result.resize(32, 0);
        self.provider.fill_random(&mut result[16..]);

        Ok((result, file_encryption_key))
    }

    /// Authenticate the user password (revision 4 and earlier).
    ///
    /// This implements Algorithm 6 as described in ISO 32000-2:2020 (PDF 2.0). Returns the file
    /// encryption key when the password is correct.
    fn authenticate_user_password_r4(&self, user_password: &[u8]) -> Result<Vec<u8>> {
        let (hashed_user_password, file_encryption_key) = self.compute_hashed_user_password_r4(user_password)?;

        // Compare on the first 16 bytes in the case of security handlers of revision 3 or greater.
        let len = match self.revision {
            EncryptionRevision::R2 => 32,
            _ => 16,
        };

        if self.user_value.len() < len {
            return Err(Error::Malformed {
                field: "U",
                reason: "is shorter than 32 bytes",
            });
        }

        if hashed_user_password[..len] != self.user_value[..len] {
            return Err(Error::BadPassword);
        }

        Ok(file_encryption_key)
    }

    /// Recover the user password from the `/O` entry with the owner password.
    fn decrypt_owner_value_r4(&self, owner_password: &[u8]) -> Result<Vec<u8>> {
        let key = self.owner_rc4_key(owner_password)?;
        let mut result = self.owner_value.clone();

        // (Security handlers of revision 3 or greater) Undo the 19 extra rounds, from 19 to 1.
        if self.revision >= EncryptionRevision::R3 {
            let mut round_key = vec![0u8; key.len()];

            for i in (1..=19).rev() {
                for (in_byte, out_byte) in key.iter().zip(round_key.iter_mut()) {
                    *out_byte = in_byte ^ i;
                }

                result = Rc4::new(&round_key).process(&result);
            }
        }

        Ok(Rc4::new(&key).process(&result))
    }

    /// Authenticate the owner password (revision 4 and earlier).
    ///
    /// This implements Algorithm 7 as described in ISO 32000-2:2020 (PDF 2.0). The decrypted `/O`
    /// entry purports to be the user password, which is then checked with Algorithm 6.
    fn authenticate_owner_password_r4(&self, owner_password: &[u8]) -> Result<Vec<u8>> {
        note_md5_usage(self.provider.as_ref());

        let user_password = self.decrypt_owner_value_r4(owner_password)?;
        self.authenticate_user_password_r4(&user_password)
    }

    /// Compute a hash (revision 5 and later).
    ///
    /// This implements Algorithm 2.B as described in ISO 32000-2:2020 (PDF 2.0); revision 5 stops
    /// after the initial SHA-256.
    pub(crate) fn compute_hash(&self, password: &[u8], salt: &[u8], user_key: Option<&[u8]>) -> Vec<u8> {
        let password = &password[..password.len().min(MAX_PASSWORD_LEN)];

        // Take the SHA-256 hash of the original input to the algorithm and name the resulting 32
        // bytes, K.
        let mut hasher = Sha256::new();
        hasher.update(password);
        hasher.update(salt);
        if let Some(user_key) = user_key {
            hasher.update(user_key);
        }

        let mut k = hasher.finalize().to_vec();

        if self.revision == EncryptionRevision::R5 {
            return k;
        }

        let user_key = user_key.unwrap_or_default();
        let mut k1 = Vec::with_capacity(64 * (password.len() + 64 + user_key.len()));

        // Perform the following steps at least 64 times, until the value of the last byte in E is
        // less than or equal to (round number) - 32.
        for round in 1u32.. {
            // K1 is 64 repetitions of K0 = password ++ K ++ user key.
            k1.clear();

            for _ in 0..64 {
                k1.extend_from_slice(password);
                k1.extend_from_slice(&k);
                k1.extend_from_slice(user_key);
            }

            // Encrypt K1 with AES-128 (CBC, no padding) using the first 16 bytes of K as the key and
            // the second 16 bytes of K as the initialization vector. K1 is a multiple of 64 bytes.
            let mut encryptor = Aes128CbcEnc::new(k[..16].into(), k[16..32].into());

            for block in k1.chunks_exact_mut(16) {
                encryptor.encrypt_block_mut(block.into());
            }

            let e = &k1;

            // The first 16 bytes of E as a big-endian integer modulo 3 select the next hash. Since
            // 256 is congruent to 1 modulo 3, the sum of the bytes has the same remainder.
            k = match e[..16].iter().map(|v| *v as u32).sum::<u32>() % 3 {
                0 => Sha256::digest(e).to_vec(),
                1 => Sha384::digest(e).to_vec(),
                _ => Sha512::digest(e).to_vec(),
            };

            let last = e.last().copied().unwrap_or(0) as u32;

            if round >= 64 && last <= round - 32 {
                break;
            }
        }

        k.truncate(32);
        k
    }

    fn aes256_cbc_no_padding(key: &[u8], data: &[u8], encrypt: bool) -> Vec<u8> {
        let iv = [0u8; 16];
        let mut output = data.to_vec();

        if encrypt {
            let mut encryptor = Aes256CbcEnc::new(key.into(), &iv.into());
            for block in output.chunks_exact_mut(16) {
                encryptor.encrypt_block_mut(block.into());
            }
        } else {
            let mut decryptor = Aes256CbcDec::new(key.into(), &iv.into());
            for block in output.chunks_exact_mut(16) {
                decryptor.decrypt_block_mut(block.into());
            }
        }

        output
    }

    /// Compute the encryption dictionary's U and UE values (revision 5 and later).
    ///
    /// This implements Algorithm 8 as described in ISO 32000-2:2020 (PDF 2.0).
    pub(crate) fn compute_hashed_user_password_r6(&self, file_encryption_key: &[u8], user_password: &[u8]) -> (Vec<u8>, Vec<u8>) {
        // 16 random bytes: the user validation salt followed by the user key salt.
        let mut user_value = [0u8; 48];
        self.provider.fill_random(&mut user_value[32..]);

        let hashed_user_password = self.compute_hash(user_password, &user_value[32..40], None);
        user_value[..32].copy_from_slice(&hashed_user_password);

        // The hash of the password and the user key salt encrypts the file encryption key using
        // AES-256 in CBC mode with no padding and an initialization vector of zero.
        let key = self.compute_hash(user_password, &user_value[40..48], None);
        let user_encrypted = Self::aes256_cbc_no_padding(&key, file_encryption_key, true);

        (user_value.to_vec(), user_encrypted)
    }

    /// Compute the encryption dictionary's O and OE values (revision 5 and later).
    ///
    /// This implements Algorithm 9 as described in ISO 32000-2:2020 (PDF 2.0). The U value must
    /// already be computed.
    pub(crate) fn compute_hashed_owner_password_r6(&self, file_encryption_key: &[u8], owner_password: &[u8]) -> (Vec<u8>, Vec<u8>) {
        let mut owner_value = [0u8; 48];
        self.provider.fill_random(&mut owner_value[32..]);

        let hashed_owner_password = self.compute_hash(owner_password, &owner_value[32..40], Some(&self.user_value));
        owner_value[..32].copy_from_slice(&hashed_owner_password);

        let key = self.compute_hash(owner_password, &owner_value[40..48], Some(&self.user_value));
        let owner_encrypted = Self::aes256_cbc_no_padding(&key, file_encryption_key, true);

        (owner_value.to_vec(), owner_encrypted)
    }

    /// Compute the encryption dictionary's Perms value (revision 5 and later).
    ///
    /// This implements Algorithm 10 as described in ISO 32000-2:2020 (PDF 2.0).
    pub(crate) fn compute_permissions(&self, file_encryption_key: &[u8]) -> Vec<u8> {
        let mut bytes = [0u8; 16];

        // Bytes 0-7: the permissions extended to 64 bits, low order byte first.
        bytes[..8].copy_from_slice(&(self.permissions as i64).to_le_bytes());

        // Byte 8: "T" or "F" according to the EncryptMetadata boolean.
        bytes[8] = if self.encrypt_metadata { b'T' } else { b'F' };

        // Bytes 9-11: "a", "d", "b".
        bytes[9..12].copy_from_slice(b"adb");

        // Bytes 12-15: random data, ignored.
        self.provider.fill_random(&mut bytes[12..]);

        // Encrypt the block using AES-256 in ECB mode with the file encryption key.
        let mut encryptor = Aes256EcbEnc::new(file_encryption_key.into());
        encryptor.encrypt_block_mut((&mut bytes[..]).into());

        bytes.to_vec()
    }

    /// Authenticate the user password and recover the file encryption key (revision 5 and
    /// later).
    ///
    /// This implements Algorithm 11 and the user branch of Algorithm 2.A as described in
    /// ISO 32000-2:2020 (PDF 2.0).
    fn authenticate_user_password_r6(&self, user_password: &[u8]) -> Result<Vec<u8>> {
        self.check_r6_lengths()?;

        if self.compute_hash(user_password, &self.user_value[32..40], None) != self.user_value[..32] {
            return Err(Error::BadPassword);
        }

        let key = self.compute_hash(user_password, &self.user_value[40..48], None);
        let file_encryption_key = Self::aes256_cbc_no_padding(&key, &self.user_encrypted[..32], false);

        self.validate_permissions(&file_encryption_key)?;
        Ok(file_encryption_key)
    }

    /// Authenticate the owner password and recover the file encryption key (revision 5 and
    /// later).
    ///
    /// This implements Algorithm 12 and the owner branch of Algorithm 2.A as described in
    /// ISO 32000-2:2020 (PDF 2.0).
    fn authenticate_owner_password_r6(&self, owner_password: &[u8]) -> Result<Vec<u8>> {
        self.check_r6_lengths()?;

        let user_value = Some(&self.user_value[..48]);

        if self.compute_hash(owner_password, &self.owner_value[32..40], user_value) != self.owner_value[..32] {
            return Err(Error::BadPassword);
        }

        let key = self.compute_hash(owner_password, &self.owner_value[40..48], user_value);
        let file_encryption_key = Self::aes256_cbc_no_padding(&key, &self.owner_encrypted[..32], false);

        self.validate_permissions(&file_encryption_key)?;
        Ok(file_encryption_key)
    }

    fn check_r6_lengths(&self) -> Result<()> {
        let fields: [(&'static str, &[u8], usize); 5] = [
            ("O", self.owner_value.as_slice(), 48),
            ("U", self.user_value.as_slice(), 48),
            ("OE", self.owner_encrypted.as_slice(), 32),
            ("UE", self.user_encrypted.as_slice(), 32),
            ("Perms", self.permission_encrypted.as_slice(), 16),
        ];

        for (field, value, len) in fields {
            if value.len() < len {
                return Err(Error::Malformed {
                    field,
                    reason: "is too short",
                });
            }
        }

        Ok(())
    }

    /// Validate the permissions (revision 5 and later).
    ///
    /// This implements Algorithm 13 as described in ISO 32000-2:2020 (PDF 2.0).
    pub(crate) fn validate_permissions(&self, file_encryption_key: &[u8]) -> Result<()> {
        if self.permission_encrypted.len() != 16 || file_encryption_key.len() != 32 {
            return Err(Error::Malformed {
                field: "Perms",
                reason: "cannot be decrypted with the file encryption key",
            });
        }

        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&self.permission_encrypted);

        let mut decryptor = Aes256EcbDec::new(file_encryption_key.into());
        decryptor.decrypt_block_mut((&mut bytes[..]).into());

        if &bytes[9..12] != b"adb" {
            return Err(Error::Malformed {
                field: "Perms",
                reason: "cannot be decrypted with the file encryption key",
            });
        }

        // Bytes 0-3 of the decrypted Perms entry, treated as a little-endian integer, are the user
        // permissions. They shall match the value in the P key.
        if bytes[..4] != self.permissions.to_le_bytes() {
            return Err(Error::Malformed {
                field: "Perms",
                reason: "does not match /P",
            });
        }

        if bytes[8] != if self.encrypt_metadata { b'T' } else { b'F' } {
            return Err(Error::Malformed {
                field: "Perms",
                reason: "does not match /EncryptMetadata",
            });
        }

        Ok(())
    }

    /// Authenticate the user password and return the file encryption key.
    pub fn authenticate_user_password(&self, user_password: &[u8]) -> Result<Vec<u8>> {
        match self.revision {
            EncryptionRevision::R2 | EncryptionRevision::R3 | EncryptionRevision::R4 => {
                self.authenticate_user_password_r4(user_password)
            }
            EncryptionRevision::R5 | EncryptionRevision::R6 => self.authenticate_user_password_r6(user_password),
        }
    }

    /// Authenticate the owner password and return the file encryption key.
    pub fn authenticate_owner_password(&self, owner_password: &[u8]) -> Result<Vec<u8>> {
        match self.revision {
            EncryptionRevision::R2 | EncryptionRevision::R3 | EncryptionRevision::R4 => {
                self.authenticate_owner_password_r4(owner_password)
            }
            EncryptionRevision::R5 | EncryptionRevision::R6 => self.authenticate_owner_password_r6(owner_password),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encryption::provider::DefaultCryptoProvider;
    use crate::encryption::provider::tests::CountingProvider;
    use sha2::Digest as _;

    const FILE_ID: &[u8] = b"\x01\x02\x03\x04\x05\x06\x07\x08\x09\x0a\x0b\x0c\x0d\x0e\x0f\x10";

    fn r4_family(revision: EncryptionRevision, key_length: usize) -> KeyDerivation {
        let mut algorithm = KeyDerivation::new(revision, key_length, Arc::new(DefaultCryptoProvider));
        algorithm.permissions = -3904;
        algorithm.file_id = FILE_ID.to_vec();

        algorithm.owner_value = algorithm.compute_hashed_owner_password_r4(b"owner", b"user").unwrap();
        algorithm.user_value = algorithm.compute_hashed_user_password_r4(b"user").unwrap().0;
        algorithm
    }

    fn r6_family(revision: EncryptionRevision) -> (KeyDerivation, [u8; 32]) {
        let mut algorithm = KeyDerivation::new(revision, 32, Arc::new(CountingProvider::default()));
        algorithm.permissions = -3904;

        let file_encryption_key = [0x42u8; 32];

        let (user_value, user_encrypted) = algorithm.compute_hashed_user_password_r6(&file_encryption_key, b"user");
        algorithm.user_value = user_value;
        algorithm.user_encrypted = user_encrypted;

        let (owner_value, owner_encrypted) = algorithm.compute_hashed_owner_password_r6(&file_encryption_key, b"owner");
        algorithm.owner_value = owner_value;
        algorithm.owner_encrypted = owner_encrypted;

        algorithm.permission_encrypted = algorithm.compute_permissions(&file_encryption_key);
        (algorithm, file_encryption_key)
    }

    #[test]
    fn authenticate_password_r2_to_r4() {
        for (revision, key_length) in [
            (EncryptionRevision::R2, 5),
            (EncryptionRevision::R3, 5),
            (EncryptionRevision::R3, 16),
            (EncryptionRevision::R4, 16),
        ] {
            let algorithm = r4_family(revision, key_length);

            let user_key = algorithm.authenticate_user_password(b"user").unwrap();
            let owner_key = algorithm.authenticate_owner_password(b"owner").unwrap();
            assert_eq!(user_key.len(), key_length);
            assert_eq!(user_key, owner_key);

            // Swapped passwords do not authenticate.
            assert!(matches!(algorithm.authenticate_user_password(b"owner"), Err(Error::BadPassword)));
            assert!(matches!(algorithm.authenticate_owner_password(b"user"), Err(Error::BadPassword)));
        }
    }

    #[test]
    fn owner_value_reveals_padded_user_password() {
        let algorithm = r4_family(EncryptionRevision::R3, 16);
        assert_eq!(algorithm.decrypt_owner_value_r4(b"owner").unwrap(), pad_password(b"user"));
    }

    #[test]
    fn metadata_flag_changes_r4_key() {
        let mut algorithm = r4_family(EncryptionRevision::R4, 16);
        let with_metadata = algorithm.compute_file_encryption_key_r4(b"user").unwrap();

        algorithm.encrypt_metadata = false;
        let without_metadata = algorithm.compute_file_encryption_key_r4(b"user").unwrap();

        assert_ne!(with_metadata, without_metadata);
    }

    #[test]
    fn oversized_key_length_is_malformed() {
        let algorithm = KeyDerivation::new(EncryptionRevision::R3, 32, Arc::new(DefaultCryptoProvider));
        assert!(matches!(
            algorithm.compute_file_encryption_key_r4(b""),
            Err(Error::Malformed { field: "Length", .. })
        ));
    }

    #[test]
    fn authenticate_password_r5_and_r6() {
        for revision in [EncryptionRevision::R5, EncryptionRevision::R6] {
            let (algorithm, file_encryption_key) = r6_family(revision);

            assert_eq!(algorithm.authenticate_user_password(b"user").unwrap(), file_encryption_key);
            assert_eq!(algorithm.authenticate_owner_password(b"owner").unwrap(), file_encryption_key);

            assert!(matches!(algorithm.authenticate_user_password(b"owner"), Err(Error::BadPassword)));
            assert!(matches!(algorithm.authenticate_owner_password(b"user"), Err(Error::BadPassword)));
        }
    }

    #[test]
    fn tampered_permissions_are_detected() {
        let (mut algorithm, file_encryption_key) = r6_family(EncryptionRevision::R6);
        assert!(algorithm.validate_permissions(&file_encryption_key).is_ok());

        algorithm.permissions = -4;
        assert!(matches!(
            algorithm.validate_permissions(&file_encryption_key),
            Err(Error::Malformed { field: "Perms", .. })
        ));
    }

    #[test]
    fn r5_hash_is_plain_sha256() {
        let algorithm = KeyDerivation::new(EncryptionRevision::R5, 32, Arc::new(DefaultCryptoProvider));
        let expected = Sha256::digest(b"usersaltsalt").to_vec();
        assert_eq!(algorithm.compute_hash(b"user", b"saltsalt", None), expected);
    }
}
