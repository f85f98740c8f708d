use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use crate::{Error, ObjectId, Result};
use md5::{Digest as _, Md5};
use std::sync::Arc;
use super::provider::CryptoProvider;
use super::rc4::Rc4;
use super::revision::CipherKind;

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;

type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Cipher applied to the strings and streams of a document.
pub trait CryptFilter: std::fmt::Debug + Send + Sync {
    /// The `/CFM` name of the filter.
    fn method(&self) -> &[u8];
    /// Derive the key for one object from the file encryption key.
    fn compute_key(&self, key: &[u8], obj_id: ObjectId) -> Result<Vec<u8>>;
    fn encrypt(&self, key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>>;
    fn decrypt(&self, key: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>>;
}

#[derive(Clone, Copy, Debug)]
pub struct IdentityCryptFilter;

impl CryptFilter for IdentityCryptFilter {
    fn method(&self) -> &[u8] {
        b"Identity"
    }

    fn compute_key(&self, key: &[u8], _obj_id: ObjectId) -> Result<Vec<u8>> {
        Ok(key.to_vec())
    }

    fn encrypt(&self, _key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        Ok(plaintext.to_vec())
    }

    fn decrypt(&self, _key: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        Ok(ciphertext.to_vec())
    }
}

/// Algorithm 1 of ISO 32000-2: the object key of RC4 and AES-128 filters.
///
/// The n-byte file key is extended with the low-order 3 bytes of the object number and the
/// low-order 2 bytes of the generation number, low-order byte first, and "sAlT" for AES. The
/// first n + 5 bytes of the MD5 digest, up to 16, form the object key.
fn md5_object_key(key: &[u8], obj_id: ObjectId, salt: bool) -> Result<Vec<u8>> {
    if key.is_empty() || key.len() > 16 {
        return Err(Error::Decryption("invalid file encryption key length"));
    }

    let mut hasher = Md5::new();
    hasher.update(key);
    hasher.update(&obj_id.0.to_le_bytes()[..3]);
    hasher.update(obj_id.1.to_le_bytes());

    if salt {
        hasher.update(b"sAlT");
    }

    let key_len = std::cmp::min(key.len() + 5, 16);
    Ok(hasher.finalize()[..key_len].to_vec())
}

#[derive(Clone, Copy, Debug)]
pub struct Rc4CryptFilter;

impl CryptFilter for Rc4CryptFilter {
    fn method(&self) -> &[u8] {
        b"V2"
    }

    fn compute_key(&self, key: &[u8], obj_id: ObjectId) -> Result<Vec<u8>> {
        md5_object_key(key, obj_id, false)
    }

    fn encrypt(&self, key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        if key.is_empty() {
            return Err(Error::Encryption("empty RC4 key"));
        }

        Ok(Rc4::new(key).process(plaintext))
    }

    fn decrypt(&self, key: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        if key.is_empty() {
            return Err(Error::Decryption("empty RC4 key"));
        }

        Ok(Rc4::new(key).process(ciphertext))
    }
}

/// AES-CBC with a random IV prepended to the ciphertext and PKCS#7 padding.
///
/// For an original message length of M, the pad consists of 16 - (M mod 16) bytes whose value
/// is also 16 - (M mod 16), so an empty message still produces one block after the IV.
pub(crate) fn aes_cbc_encrypt(provider: &dyn CryptoProvider, key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let mut iv = [0u8; 16];
    provider.fill_random(&mut iv);

    let padded_len = (plaintext.len() + 16) / 16 * 16;

    let mut ciphertext = Vec::with_capacity(16 + padded_len);
    ciphertext.extend_from_slice(&iv);
    ciphertext.extend_from_slice(plaintext);
    ciphertext.resize(16 + padded_len, 0);

    let buffer = &mut ciphertext[16..];
    let padded = match key.len() {
        16 => Aes128CbcEnc::new(key.into(), &iv.into())
            .encrypt_padded_mut::<Pkcs7>(buffer, plaintext.len())
            .map(|_| ()),
        32 => Aes256CbcEnc::new(key.into(), &iv.into())
            .encrypt_padded_mut::<Pkcs7>(buffer, plaintext.len())
            .map(|_| ()),
        _ => return Err(Error::Encryption("invalid AES key length")),
    };

    // Padding errors should not occur when encrypting, but avoid causing a panic.
    padded.map_err(|_| Error::Encryption("padding failed"))?;

    Ok(ciphertext)
}

pub(crate) fn aes_cbc_decrypt(key: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
    if key.len() != 16 && key.len() != 32 {
        return Err(Error::Decryption("invalid AES key length"));
    }

    if ciphertext.len() % 16 != 0 {
        return Err(Error::Decryption("ciphertext length is not a multiple of 16"));
    }

    // There is nothing to decrypt if the ciphertext is empty or only contains the IV.
    if ciphertext.len() <= 16 {
        return Ok(vec![]);
    }

    let mut iv = [0x00u8; 16];
    iv.copy_from_slice(&ciphertext[..16]);

    let mut data = ciphertext[16..].to_vec();

    let plaintext_len = match key.len() {
        16 => Aes128CbcDec::new(key.into(), &iv.into())
            .decrypt_padded_mut::<Pkcs7>(&mut data)
            .map(|plaintext| plaintext.len()),
        _ => Aes256CbcDec::new(key.into(), &iv.into())
            .decrypt_padded_mut::<Pkcs7>(&mut data)
            .map(|plaintext| plaintext.len()),
    }
    .map_err(|_| Error::Decryption("invalid padding"))?;

    data.truncate(plaintext_len);
    Ok(data)
}

#[derive(Clone, Debug)]
pub struct Aes128CryptFilter {
    provider: Arc<dyn CryptoProvider>,
}

impl Aes128CryptFilter {
    pub fn new(provider: Arc<dyn CryptoProvider>) -> Self {
        Self { provider }
    }
}

impl CryptFilter for Aes128CryptFilter {
    fn method(&self) -> &[u8] {
        b"AESV2"
    }

    fn compute_key(&self, key: &[u8], obj_id: ObjectId) -> Result<Vec<u8>> {
        md5_object_key(key, obj_id, true)
    }

    fn encrypt(&self, key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        if key.len() != 16 {
            return Err(Error::Encryption("invalid AES-128 key length"));
        }

        aes_cbc_encrypt(self.provider.as_ref(), key, plaintext)
    }

    fn decrypt(&self, key: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        if key.len() != 16 {
            return Err(Error::Decryption("invalid AES-128 key length"));
        }

        aes_cbc_decrypt(key, ciphertext)
    }
}

#[derive(Clone, Debug)]
pub struct Aes256CryptFilter {
    provider: Arc<dyn CryptoProvider>,
}

impl Aes256CryptFilter {
    pub fn new(provider: Arc<dyn CryptoProvider>) -> Self {
        Self { provider }
    }
}

impl CryptFilter for Aes256CryptFilter {
    fn method(&self) -> &[u8] {
        b"AESV3"
    }

    fn compute_key(&self, key: &[u8], _obj_id: ObjectId) -> Result<Vec<u8>> {
        // Use the 32-byte file encryption key for the AES-256 symmetric key algorithm.
        Ok(key.to_vec())
    }

    fn encrypt(&self, key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        if key.len() != 32 {
            return Err(Error::Encryption("invalid AES-256 key length"));
        }

        aes_cbc_encrypt(self.provider.as_ref(), key, plaintext)
    }

    fn decrypt(&self, key: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        if key.len() != 32 {
            return Err(Error::Decryption("invalid AES-256 key length"));
        }

        aes_cbc_decrypt(key, ciphertext)
    }
}

/// The filter implementing `cipher`; `None` stands for the `Identity` filter.
pub fn crypt_filter_for(cipher: Option<CipherKind>, provider: &Arc<dyn CryptoProvider>) -> Arc<dyn CryptFilter> {
    match cipher {
        None => Arc::new(IdentityCryptFilter),
        Some(CipherKind::Rc4) => Arc::new(Rc4CryptFilter),
        Some(CipherKind::AesV2) => Arc::new(Aes128CryptFilter::new(provider.clone())),
        Some(CipherKind::AesV3) => Arc::new(Aes256CryptFilter::new(provider.clone())),
    }
}
