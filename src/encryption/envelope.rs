//! PKCS#7 enveloped data carrying the seed and permissions of one public-key recipient
//! (RFC 5652 section 6, key transport recipients only).

use aes::{Aes128, Aes256};
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockCipher, BlockDecryptMut, InnerIvInit, KeyInit};
use crate::{Error, Result};
use der::asn1::{ObjectIdentifier, OctetString};
use der::{Any, Choice, Decode, Encode, Reader, Sequence, SliceReader, Tag, Tagged};
use des::TdesEde3;
use rc2::Rc2;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::AlgorithmIdentifierOwned;
use x509_cert::Certificate;
use super::crypt_filters::aes_cbc_encrypt;
use super::provider::{CryptoProvider, ProviderRng};

pub(crate) const ID_DATA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.7.1");
pub(crate) const ID_ENVELOPED_DATA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.7.3");
pub(crate) const RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
pub(crate) const AES128_CBC: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.1.2");
pub(crate) const AES256_CBC: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.1.42");
pub(crate) const DES_EDE3_CBC: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.3.7");
pub(crate) const RC2_CBC: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.3.2");
const SUBJECT_KEY_IDENTIFIER: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.14");

/// ```text
/// ContentInfo ::= SEQUENCE {
///   contentType ContentType,
///   content [0] EXPLICIT ANY DEFINED BY contentType }
/// ```
#[derive(Clone, Debug, Sequence)]
struct ContentInfo {
    content_type: ObjectIdentifier,
    #[asn1(context_specific = "0", tag_mode = "EXPLICIT")]
    content: Any,
}

/// ```text
/// EnvelopedData ::= SEQUENCE {
///   version CMSVersion,
///   recipientInfos RecipientInfos,
///   encryptedContentInfo EncryptedContentInfo }
/// ```
///
/// `recipientInfos` is a SET OF CHOICE; it is kept as raw DER and walked on demand so recipient
/// kinds other than key transport are skipped instead of failing the whole envelope.
#[derive(Clone, Debug, Sequence)]
struct EnvelopedData {
    version: u8,
    recipient_infos: Any,
    encrypted_content_info: EncryptedContentInfo,
}

#[derive(Clone, Debug, Sequence)]
struct EncryptedContentInfo {
    content_type: ObjectIdentifier,
    content_encryption_algorithm: AlgorithmIdentifierOwned,
    #[asn1(context_specific = "0", tag_mode = "IMPLICIT", optional = "true")]
    encrypted_content: Option<OctetString>,
}

/// ```text
/// RC2-CBCParameter ::= SEQUENCE {
///   rc2ParameterVersion INTEGER OPTIONAL,
///   iv OCTET STRING (SIZE(8)) }
/// ```
#[derive(Clone, Debug, Sequence)]
struct Rc2CbcParameter {
    #[asn1(optional = "true")]
    version: Option<u32>,
    iv: OctetString,
}

#[derive(Clone, Debug, Sequence)]
struct KeyTransRecipientInfo {
    version: u8,
    recipient: RecipientIdentifier,
    key_encryption_algorithm: AlgorithmIdentifierOwned,
    encrypted_key: OctetString,
}

#[derive(Clone, Debug, Choice)]
enum RecipientIdentifier {
    IssuerAndSerialNumber(IssuerAndSerialNumber),
    #[asn1(context_specific = "0", tag_mode = "IMPLICIT")]
    SubjectKeyIdentifier(OctetString),
}

#[derive(Clone, Debug, Sequence)]
struct IssuerAndSerialNumber {
    issuer: Name,
    serial_number: SerialNumber,
}

/// How a certificate is named inside a recipient info.
#[derive(Clone, Debug)]
pub(crate) struct RecipientIdentity {
    issuer: Name,
    serial_number: SerialNumber,
    subject_key_identifier: Option<Vec<u8>>,
}

impl RecipientIdentity {
    pub(crate) fn of(certificate: &Certificate) -> Self {
        let tbs = &certificate.tbs_certificate;

        let subject_key_identifier = tbs
            .extensions
            .iter()
            .flatten()
            .find(|extension| extension.extn_id == SUBJECT_KEY_IDENTIFIER)
            .and_then(|extension| OctetString::from_der(extension.extn_value.as_bytes()).ok())
            .map(|identifier| identifier.as_bytes().to_vec());

        Self {
            issuer: tbs.issuer.clone(),
            serial_number: tbs.serial_number.clone(),
            subject_key_identifier,
        }
    }

    fn matches(&self, recipient: &RecipientIdentifier) -> bool {
        match recipient {
            RecipientIdentifier::IssuerAndSerialNumber(id) => {
                id.issuer == self.issuer && id.serial_number == self.serial_number
            }
            RecipientIdentifier::SubjectKeyIdentifier(identifier) => {
                self.subject_key_identifier.as_deref() == Some(identifier.as_bytes())
            }
        }
    }
}

pub(crate) fn parse_certificate(der: &[u8]) -> Result<Certificate> {
    Certificate::from_der(der).map_err(|err| Error::Certificate(err.to_string()))
}

/// The RSA key of a recipient certificate. Any other key algorithm is refused with its OID.
pub(crate) fn rsa_public_key(certificate: &Certificate) -> Result<RsaPublicKey> {
    let spki = &certificate.tbs_certificate.subject_public_key_info;

    if spki.algorithm.oid != RSA_ENCRYPTION {
        return Err(Error::UnsupportedAlgorithm(spki.algorithm.oid.to_string()));
    }

    RsaPublicKey::from_public_key_der(&spki.to_der()?).map_err(|err| Error::Certificate(err.to_string()))
}

/// Parses a PKCS#8 or PKCS#1 DER private key.
pub(crate) fn parse_private_key(der: &[u8]) -> Result<RsaPrivateKey> {
    match RsaPrivateKey::from_pkcs8_der(der) {
        Ok(key) => Ok(key),
        Err(_) => RsaPrivateKey::from_pkcs1_der(der).map_err(|err| Error::Certificate(err.to_string())),
    }
}

/// Encrypts `content` for the owner of `certificate`.
///
/// The content is encrypted with AES-128-CBC under a random content key, which is RSA
/// (PKCS#1 v1.5) encrypted with the recipient's public key.
pub(crate) fn seal(
    content: &[u8],
    certificate: &Certificate,
    public_key: &RsaPublicKey,
    provider: &dyn CryptoProvider,
) -> Result<Vec<u8>> {
    let mut content_key = zeroize::Zeroizing::new([0u8; 16]);
    provider.fill_random(&mut content_key[..]);

    let framed = aes_cbc_encrypt(provider, &content_key[..], content)?;
    let (iv, ciphertext) = framed.split_at(16);

    let encrypted_key = public_key.encrypt(&mut ProviderRng(provider), Pkcs1v15Encrypt, &content_key[..])?;

    let algorithm = AlgorithmIdentifierOwned {
        oid: AES128_CBC,
        parameters: Some(Any::new(Tag::OctetString, iv.to_vec())?),
    };

    enveloped_data(certificate, encrypted_key, algorithm, ciphertext.to_vec())
}

/// Wraps an encrypted content and its key, encrypted for the owner of `certificate`, in a
/// `ContentInfo`.
fn enveloped_data(
    certificate: &Certificate,
    encrypted_key: Vec<u8>,
    content_encryption_algorithm: AlgorithmIdentifierOwned,
    ciphertext: Vec<u8>,
) -> Result<Vec<u8>> {
    let identity = RecipientIdentity::of(certificate);
    let recipient_info = KeyTransRecipientInfo {
        version: 0,
        recipient: RecipientIdentifier::IssuerAndSerialNumber(IssuerAndSerialNumber {
            issuer: identity.issuer,
            serial_number: identity.serial_number,
        }),
        key_encryption_algorithm: AlgorithmIdentifierOwned {
            oid: RSA_ENCRYPTION,
            parameters: Some(Any::new(Tag::Null, Vec::<u8>::new())?),
        },
        encrypted_key: OctetString::new(encrypted_key)?,
    };

    let enveloped = EnvelopedData {
        version: 0,
        recipient_infos: Any::new(Tag::Set, recipient_info.to_der()?)?,
        encrypted_content_info: EncryptedContentInfo {
            content_type: ID_DATA,
            content_encryption_algorithm,
            encrypted_content: Some(OctetString::new(ciphertext)?),
        },
    };

    let content_info = ContentInfo {
        content_type: ID_ENVELOPED_DATA,
        content: Any::from_der(&enveloped.to_der()?)?,
    };

    Ok(content_info.to_der()?)
}

/// Decrypts the content of `blob` if one of its recipients is `identity`.
///
/// Returns `Ok(None)` when the envelope is not addressed to `identity`, and
/// [`Error::BadCertificateAndKey`] when it is but `private_key` cannot unwrap it.
pub(crate) fn open(blob: &[u8], identity: &RecipientIdentity, private_key: &RsaPrivateKey) -> Result<Option<Vec<u8>>> {
    let content_info = ContentInfo::from_der(blob)?;

    if content_info.content_type != ID_ENVELOPED_DATA {
        return Ok(None);
    }

    let enveloped = EnvelopedData::from_der(&content_info.content.to_der()?)?;

    let Some(recipient) = key_transport_recipients(&enveloped.recipient_infos)?
        .into_iter()
        .find(|recipient| identity.matches(&recipient.recipient))
    else {
        return Ok(None);
    };

    let content_key = private_key
        .decrypt(Pkcs1v15Encrypt, recipient.encrypted_key.as_bytes())
        .map(zeroize::Zeroizing::new)
        .map_err(|_| Error::BadCertificateAndKey)?;

    let info = &enveloped.encrypted_content_info;
    let (cipher, iv) = ContentCipher::from_algorithm(&info.content_encryption_algorithm)?;
    let ciphertext = info.encrypted_content.as_ref().map(OctetString::as_bytes).unwrap_or_default();

    let content = cipher.decrypt(&content_key, &iv, ciphertext)?;
    Ok(Some(content))
}

/// Content encryption algorithms accepted when opening an envelope. Sealing always uses AES-128.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ContentCipher {
    Aes128,
    Aes256,
    DesEde3,
    /// RC2 with its effective key length in bits.
    Rc2(usize),
}

impl ContentCipher {
    /// Identifies the cipher and extracts the IV from the algorithm parameters.
    fn from_algorithm(algorithm: &AlgorithmIdentifierOwned) -> Result<(Self, Vec<u8>)> {
        let cipher = match algorithm.oid {
            oid if oid == AES128_CBC => Self::Aes128,
            oid if oid == AES256_CBC => Self::Aes256,
            oid if oid == DES_EDE3_CBC => Self::DesEde3,
            oid if oid == RC2_CBC => {
                let parameters = algorithm
                    .parameters
                    .as_ref()
                    .ok_or(Error::Decryption("missing RC2 parameters"))?;
                let parameters = Rc2CbcParameter::from_der(&parameters.to_der()?)?;
                let cipher = Self::Rc2(rc2_effective_key_bits(parameters.version)?);

                return cipher.with_iv(parameters.iv.as_bytes());
            }
            oid => return Err(Error::UnsupportedAlgorithm(oid.to_string())),
        };

        let iv = algorithm
            .parameters
            .as_ref()
            .filter(|parameters| parameters.tag() == Tag::OctetString)
            .ok_or(Error::Decryption("missing content encryption IV"))?;

        cipher.with_iv(iv.value())
    }

    fn with_iv(self, iv: &[u8]) -> Result<(Self, Vec<u8>)> {
        if iv.len() != self.block_size() {
            return Err(Error::Decryption("invalid content encryption IV"));
        }

        Ok((self, iv.to_vec()))
    }

    fn block_size(self) -> usize {
        match self {
            Self::Aes128 | Self::Aes256 => 16,
            Self::DesEde3 | Self::Rc2(_) => 8,
        }
    }

    /// Decrypts and unpads `ciphertext`. A content key of the wrong size or bad padding means
    /// the key was not unwrapped with the right private key.
    fn decrypt(self, key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::Aes128 => cbc_decrypt(Aes128::new_from_slice(key).map_err(|_| Error::BadCertificateAndKey)?, iv, ciphertext),
            Self::Aes256 => cbc_decrypt(Aes256::new_from_slice(key).map_err(|_| Error::BadCertificateAndKey)?, iv, ciphertext),
            Self::DesEde3 => {
                cbc_decrypt(TdesEde3::new_from_slice(key).map_err(|_| Error::BadCertificateAndKey)?, iv, ciphertext)
            }
            Self::Rc2(bits) => {
                if key.is_empty() || key.len() > 128 {
                    return Err(Error::BadCertificateAndKey);
                }

                cbc_decrypt(Rc2::new_with_eff_key_len(key, bits), iv, ciphertext)
            }
        }
    }
}

/// Effective key bits of an RC2 key (RFC 2268 section 6): versions 160, 120 and 58 stand for
/// 40, 64 and 128 bits, versions of 256 and above are the bit count itself.
fn rc2_effective_key_bits(version: Option<u32>) -> Result<usize> {
    match version {
        None => Ok(32),
        Some(160) => Ok(40),
        Some(120) => Ok(64),
        Some(58) => Ok(128),
        Some(version @ 256..=1024) => Ok(version as usize),
        Some(_) => Err(Error::Decryption("unknown RC2 parameter version")),
    }
}

fn cbc_decrypt<C: BlockCipher + BlockDecryptMut>(cipher: C, iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
    let decryptor = cbc::Decryptor::<C>::inner_iv_slice_init(cipher, iv)
        .map_err(|_| Error::Decryption("invalid content encryption IV"))?;

    let mut data = ciphertext.to_vec();
    let plaintext_len = decryptor
        .decrypt_padded_mut::<Pkcs7>(&mut data)
        .map_err(|_| Error::BadCertificateAndKey)?
        .len();

    data.truncate(plaintext_len);
    Ok(data)
}

fn key_transport_recipients(recipient_infos: &Any) -> Result<Vec<KeyTransRecipientInfo>> {
    let mut reader = SliceReader::new(recipient_infos.value())?;
    let mut recipients = Vec::new();

    while !reader.is_finished() {
        let item = Any::decode(&mut reader)?;

        // Key agreement, KEK and password recipients are context-tagged.
        if item.tag() == Tag::Sequence {
            recipients.push(KeyTransRecipientInfo::from_der(&item.to_der()?)?);
        }
    }

    Ok(recipients)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encryption::provider::DefaultCryptoProvider;
    use cbc::cipher::BlockEncryptMut;

    const ALICE_CERT: &[u8] = include_bytes!("../../tests/fixtures/alice.cer");
    const ALICE_KEY: &[u8] = include_bytes!("../../tests/fixtures/alice.pk8");
    const BOB_CERT: &[u8] = include_bytes!("../../tests/fixtures/bob.cer");
    const BOB_KEY: &[u8] = include_bytes!("../../tests/fixtures/bob.pk8");
    const ECDSA_CERT: &[u8] = include_bytes!("../../tests/fixtures/ecdsa.cer");

    #[test]
    fn seal_and_open() {
        let alice = parse_certificate(ALICE_CERT).unwrap();
        let bob = parse_certificate(BOB_CERT).unwrap();

        let blob = seal(b"seed and permissions", &alice, &rsa_public_key(&alice).unwrap(), &DefaultCryptoProvider).unwrap();

        let alice_key = parse_private_key(ALICE_KEY).unwrap();
        let content = open(&blob, &RecipientIdentity::of(&alice), &alice_key).unwrap();
        assert_eq!(content.as_deref(), Some(&b"seed and permissions"[..]));

        // Bob is not a recipient.
        let bob_key = parse_private_key(BOB_KEY).unwrap();
        assert!(open(&blob, &RecipientIdentity::of(&bob), &bob_key).unwrap().is_none());

        // Alice's certificate with Bob's key.
        assert!(matches!(
            open(&blob, &RecipientIdentity::of(&alice), &bob_key),
            Err(Error::BadCertificateAndKey)
        ));
    }

    fn cbc_encrypt<C: BlockCipher + BlockEncryptMut>(cipher: C, iv: &[u8], plaintext: &[u8]) -> Vec<u8> {
        let block = C::block_size();
        let mut buffer = plaintext.to_vec();
        buffer.resize((plaintext.len() / block + 1) * block, 0);

        cbc::Encryptor::<C>::inner_iv_slice_init(cipher, iv)
            .unwrap()
            .encrypt_padded_mut::<Pkcs7>(&mut buffer, plaintext.len())
            .unwrap();
        buffer
    }

    fn wrap_key(certificate: &Certificate, key: &[u8]) -> Vec<u8> {
        let public_key = rsa_public_key(certificate).unwrap();
        public_key.encrypt(&mut ProviderRng(&DefaultCryptoProvider), Pkcs1v15Encrypt, key).unwrap()
    }

    #[test]
    fn triple_des_and_rc2_envelopes_are_opened() {
        let alice = parse_certificate(ALICE_CERT).unwrap();
        let alice_key = parse_private_key(ALICE_KEY).unwrap();
        let identity = RecipientIdentity::of(&alice);
        let content = b"seed and permissions";
        let iv = [0x5a_u8; 8];

        let key: Vec<u8> = (1..=24).collect();
        let ciphertext = cbc_encrypt(TdesEde3::new_from_slice(&key).unwrap(), &iv, content);
        let algorithm = AlgorithmIdentifierOwned {
            oid: DES_EDE3_CBC,
            parameters: Some(Any::new(Tag::OctetString, iv.to_vec()).unwrap()),
        };
        let blob = enveloped_data(&alice, wrap_key(&alice, &key), algorithm, ciphertext).unwrap();
        assert_eq!(open(&blob, &identity, &alice_key).unwrap().as_deref(), Some(&content[..]));

        // 40-bit RC2 is written with parameter version 160.
        let key = [0x42_u8; 5];
        let ciphertext = cbc_encrypt(Rc2::new_with_eff_key_len(&key, 40), &iv, content);
        let parameters = Rc2CbcParameter {
            version: Some(160),
            iv: OctetString::new(iv.to_vec()).unwrap(),
        };
        let algorithm = AlgorithmIdentifierOwned {
            oid: RC2_CBC,
            parameters: Some(Any::from_der(&parameters.to_der().unwrap()).unwrap()),
        };
        let blob = enveloped_data(&alice, wrap_key(&alice, &key), algorithm, ciphertext).unwrap();
        assert_eq!(open(&blob, &identity, &alice_key).unwrap().as_deref(), Some(&content[..]));
    }

    #[test]
    fn unknown_content_cipher_is_refused() {
        let alice = parse_certificate(ALICE_CERT).unwrap();
        let alice_key = parse_private_key(ALICE_KEY).unwrap();

        // DES-CBC with a single 56-bit key.
        let algorithm = AlgorithmIdentifierOwned {
            oid: ObjectIdentifier::new_unwrap("1.3.14.3.2.7"),
            parameters: Some(Any::new(Tag::OctetString, vec![0u8; 8]).unwrap()),
        };
        let blob = enveloped_data(&alice, wrap_key(&alice, &[0u8; 8]), algorithm, vec![0u8; 16]).unwrap();

        let err = open(&blob, &RecipientIdentity::of(&alice), &alice_key).unwrap_err();
        assert!(matches!(&err, Error::UnsupportedAlgorithm(oid) if oid == "1.3.14.3.2.7"));
    }

    #[test]
    fn rc2_parameter_versions() {
        assert_eq!(rc2_effective_key_bits(None).unwrap(), 32);
        assert_eq!(rc2_effective_key_bits(Some(160)).unwrap(), 40);
        assert_eq!(rc2_effective_key_bits(Some(120)).unwrap(), 64);
        assert_eq!(rc2_effective_key_bits(Some(58)).unwrap(), 128);
        assert_eq!(rc2_effective_key_bits(Some(512)).unwrap(), 512);
        assert!(rc2_effective_key_bits(Some(7)).is_err());
    }

    #[test]
    fn non_rsa_certificate_is_refused() {
        let certificate = parse_certificate(ECDSA_CERT).unwrap();
        let err = rsa_public_key(&certificate).unwrap_err();
        assert_eq!(err.to_string(), "algorithm 1.2.840.10045.2.1 is not supported");
    }

    #[test]
    fn garbage_is_not_a_certificate() {
        assert!(matches!(parse_certificate(b"not a certificate"), Err(Error::Certificate(_))));
        assert!(matches!(parse_private_key(b"not a key"), Err(Error::Certificate(_))));
    }
}
