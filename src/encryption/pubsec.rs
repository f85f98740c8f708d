use crate::{Error, Result};
use log::debug;
use sha1::Sha1;
use sha2::{Digest as _, Sha256};
use std::sync::Arc;
use zeroize::Zeroizing;
use super::dictionary::{EncryptionDictionary, SecurityHandlerKind, DEFAULT_CRYPT_FILTER, PKCS7_S4, PKCS7_S5};
use super::envelope::{self, RecipientIdentity};
use super::permissions::Permissions;
use super::provider::CryptoProvider;
use super::revision::{CipherSettings, EncryptionRevision};
use super::{AccessLevel, FileEncryptionKey};

const SEED_LEN: usize = 20;

/// A certificate allowed to open the document, with the permissions granted to its owner.
#[derive(Clone, Debug, PartialEq)]
pub struct Recipient {
    /// DER encoded X.509 certificate.
    pub certificate: Vec<u8>,
    pub permissions: Permissions,
}

impl Recipient {
    pub fn new(certificate: Vec<u8>, permissions: Permissions) -> Self {
        Self { certificate, permissions }
    }
}

/// The certificate based security handler (`/Adobe.PubSec`).
///
/// Each recipient gets an enveloped copy of a random seed and its permissions; the file key is
/// a digest of the seed and all recipient envelopes. Only RSA key transport is supported, and
/// FIPS-only providers refuse the handler entirely.
#[derive(Clone, Debug)]
pub struct PublicKeySecurityHandler {
    dictionary: EncryptionDictionary,
    file_key: FileEncryptionKey,
    permissions: Permissions,
}

impl PublicKeySecurityHandler {
    pub fn write_setup(recipients: &[Recipient], settings: &CipherSettings, provider: Arc<dyn CryptoProvider>) -> Result<Self> {
        if provider.is_fips() {
            return Err(Error::UnsupportedInFipsMode);
        }

        // Every certificate is checked before anything is encrypted.
        let keys = recipients
            .iter()
            .map(|recipient| {
                let certificate = envelope::parse_certificate(&recipient.certificate)?;
                let public_key = envelope::rsa_public_key(&certificate)?;
                Ok((certificate, public_key, recipient.permissions))
            })
            .collect::<Result<Vec<_>>>()?;

        if keys.is_empty() {
            return Err(Error::CertificateNotProvided);
        }

        let mut seed = Zeroizing::new([0u8; SEED_LEN]);
        provider.fill_random(&mut seed[..]);

        let blobs = keys
            .iter()
            .map(|(certificate, public_key, permissions)| {
                let mut content = Zeroizing::new(seed.to_vec());
                content.extend_from_slice(&recipient_permissions(*permissions, settings.revision).to_be_bytes());
                envelope::seal(&content, certificate, public_key, provider.as_ref())
            })
            .collect::<Result<Vec<_>>>()?;

        let file_key = compute_file_key(&seed[..], &blobs, settings.key_length, settings.encrypt_metadata, settings.version());

        let mut dictionary =
            EncryptionDictionary::with_settings(SecurityHandlerKind::PublicKey, settings, DEFAULT_CRYPT_FILTER);

        if settings.uses_crypt_filters() {
            dictionary.sub_filter = Some(PKCS7_S5.to_vec());

            if let Some(entry) = dictionary.crypt_filters.get_mut(DEFAULT_CRYPT_FILTER) {
                entry.recipients = blobs;
                if !settings.encrypt_metadata {
                    entry.encrypt_metadata = Some(false);
                }
            }
        } else {
            dictionary.sub_filter = Some(PKCS7_S4.to_vec());
            dictionary.recipients = blobs;
        }

        Ok(Self {
            dictionary,
            file_key,
            permissions: Permissions::all(),
        })
    }

    /// Unlocks `dictionary` with a certificate and its private key (DER, PKCS#8 or PKCS#1).
    pub fn read_validate(
        dictionary: &EncryptionDictionary,
        certificate: Option<&[u8]>,
        private_key: Option<&[u8]>,
        provider: Arc<dyn CryptoProvider>,
    ) -> Result<Self> {
        if provider.is_fips() {
            return Err(Error::UnsupportedInFipsMode);
        }

        let certificate = certificate.ok_or(Error::CertificateNotProvided)?;
        let private_key = private_key.ok_or(Error::BadCertificateAndKey)?;

        let certificate = envelope::parse_certificate(certificate)?;
        let private_key = envelope::parse_private_key(private_key)?;

        // A certificate without an RSA key cannot match the RSA private key.
        let public_key = match envelope::rsa_public_key(&certificate) {
            Ok(public_key) => public_key,
            Err(Error::UnsupportedAlgorithm(oid)) => {
                debug!("reader certificate has a non-RSA key ({oid})");
                return Err(Error::BadCertificateAndKey);
            }
            Err(err) => return Err(err),
        };

        if public_key != private_key.to_public_key() {
            return Err(Error::BadCertificateAndKey);
        }

        let identity = RecipientIdentity::of(&certificate);
        let recipients = dictionary.all_recipients();

        let mut content = None;

        for blob in recipients {
            match envelope::open(blob, &identity, &private_key) {
                Ok(Some(opened)) => {
                    content = Some(Zeroizing::new(opened));
                    break;
                }
                Ok(None) => continue,
                Err(Error::Envelope(err)) => {
                    debug!("skipping an unreadable recipient envelope: {err}");
                    continue;
                }
                Err(err) => return Err(err),
            }
        }

        let content = content.ok_or(Error::BadCertificateAndKey)?;

        if content.len() < SEED_LEN + 4 {
            return Err(Error::BadCertificateAndKey);
        }

        let mut permission_bytes = [0u8; 4];
        permission_bytes.copy_from_slice(&content[SEED_LEN..SEED_LEN + 4]);
        let permissions = Permissions::from_p_value(u32::from_be_bytes(permission_bytes) as i64, dictionary.revision);

        let file_key = compute_file_key(
            &content[..SEED_LEN],
            recipients,
            dictionary.key_length,
            dictionary.encrypt_metadata,
            dictionary.version,
        );

        debug!("public key security handler unlocked with permissions {permissions:?}");

        Ok(Self {
            dictionary: dictionary.clone(),
            file_key,
            permissions,
        })
    }

    pub fn dictionary(&self) -> &EncryptionDictionary {
        &self.dictionary
    }

    pub fn file_key(&self) -> &[u8] {
        &self.file_key
    }

    pub fn access(&self) -> AccessLevel {
        AccessLevel::Recipient
    }

    pub fn permissions(&self) -> Permissions {
        self.permissions
    }

    pub fn into_parts(self) -> (EncryptionDictionary, FileEncryptionKey, AccessLevel, Permissions) {
        (self.dictionary, self.file_key, AccessLevel::Recipient, self.permissions)
    }
}

/// The permissions record of a recipient envelope: the `/P` layout with the reserved bits set.
fn recipient_permissions(permissions: Permissions, revision: EncryptionRevision) -> u32 {
    permissions.p_value(revision) as u32
}

/// SHA-1 (SHA-256 for AES-256) of the seed, every recipient envelope and, when metadata is left
/// in clear text with crypt filters, four 0xFF bytes, truncated to the key length.
fn compute_file_key(seed: &[u8], recipients: &[Vec<u8>], key_length: usize, encrypt_metadata: bool, version: i64) -> FileEncryptionKey {
    let skip_metadata = !encrypt_metadata && version >= 4;

    let mut digest = if key_length == 32 {
        let mut hasher = Sha256::new();
        hasher.update(seed);
        recipients.iter().for_each(|blob| hasher.update(blob));
        if skip_metadata {
            hasher.update(b"\xff\xff\xff\xff");
        }
        hasher.finalize().to_vec()
    } else {
        let mut hasher = Sha1::new();
        hasher.update(seed);
        recipients.iter().for_each(|blob| hasher.update(blob));
        if skip_metadata {
            hasher.update(b"\xff\xff\xff\xff");
        }
        hasher.finalize().to_vec()
    };

    digest.truncate(key_length);
    Zeroizing::new(digest)
}
