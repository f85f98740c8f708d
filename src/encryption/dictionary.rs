use crate::{Dictionary, Error, Object, Result, StringFormat};
use log::debug;
use std::collections::BTreeMap;
use std::sync::Arc;
use super::crypt_filters::{crypt_filter_for, CryptFilter};
use super::provider::CryptoProvider;
use super::revision::{CipherKind, CipherSettings, EncryptionRevision};

pub const STANDARD_FILTER: &[u8] = b"Standard";
pub const PUBLIC_KEY_FILTER: &[u8] = b"Adobe.PubSec";

/// SubFilter of public-key encryption without crypt filters (`/V` 1 or 2).
pub const PKCS7_S4: &[u8] = b"adbe.pkcs7.s4";
/// SubFilter of public-key encryption with crypt filters (`/V` 4 or 5).
pub const PKCS7_S5: &[u8] = b"adbe.pkcs7.s5";

pub const STANDARD_CRYPT_FILTER: &[u8] = b"StdCF";
pub const DEFAULT_CRYPT_FILTER: &[u8] = b"DefaultCryptFilter";
pub const IDENTITY: &[u8] = b"Identity";

/// The security handler named by `/Filter`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SecurityHandlerKind {
    /// The password based `/Standard` handler.
    Standard,
    /// The certificate based `/Adobe.PubSec` handler.
    PublicKey,
}

impl SecurityHandlerKind {
    pub fn name(self) -> &'static [u8] {
        match self {
            Self::Standard => STANDARD_FILTER,
            Self::PublicKey => PUBLIC_KEY_FILTER,
        }
    }
}

/// One entry of the `/CF` dictionary.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CryptFilterEntry {
    /// `/CFM`; `None` is the `/None` method, i.e. the application decrypts the data itself.
    pub method: Option<CipherKind>,
    /// `/AuthEvent`: `DocOpen` or `EFOpen`.
    pub auth_event: Option<Vec<u8>>,
    /// `/Length` as written by the producer.
    pub length: Option<i64>,
    /// `/Recipients` of public-key crypt filters.
    pub recipients: Vec<Vec<u8>>,
    /// `/EncryptMetadata` of public-key crypt filters.
    pub encrypt_metadata: Option<bool>,
}

/// Typed form of the `/Encrypt` dictionary.
#[derive(Clone, Debug, PartialEq)]
pub struct EncryptionDictionary {
    pub filter: SecurityHandlerKind,
    pub sub_filter: Option<Vec<u8>>,
    /// `/V`.
    pub version: i64,
    /// `/R`, or the revision implied by `/V` for public-key handlers that omit it.
    pub revision: EncryptionRevision,
    /// File encryption key length in bytes.
    pub key_length: usize,
    pub owner_value: Vec<u8>,
    pub user_value: Vec<u8>,
    pub owner_encrypted: Vec<u8>,
    pub user_encrypted: Vec<u8>,
    pub permission_encrypted: Vec<u8>,
    /// `/P`, zero for public-key handlers where the permissions live in the recipient blobs.
    pub permissions: i32,
    pub encrypt_metadata: bool,
    pub crypt_filters: BTreeMap<Vec<u8>, CryptFilterEntry>,
    pub stream_filter: Option<Vec<u8>>,
    pub string_filter: Option<Vec<u8>>,
    pub embedded_file_filter: Option<Vec<u8>>,
    /// Top-level `/Recipients` (`/V` 1 or 2).
    pub recipients: Vec<Vec<u8>>,
}

impl EncryptionDictionary {
    /// An empty dictionary for the given handler and revision, with the default `/V` and key
    /// length of the revision.
    pub fn new(filter: SecurityHandlerKind, revision: EncryptionRevision) -> Self {
        Self {
            filter,
            sub_filter: None,
            version: revision.version(),
            revision,
            key_length: revision.key_length(),
            owner_value: Vec::new(),
            user_value: Vec::new(),
            owner_encrypted: Vec::new(),
            user_encrypted: Vec::new(),
            permission_encrypted: Vec::new(),
            permissions: 0,
            encrypt_metadata: true,
            crypt_filters: BTreeMap::new(),
            stream_filter: None,
            string_filter: None,
            embedded_file_filter: None,
            recipients: Vec::new(),
        }
    }

    /// A dictionary carrying `settings`. From `/V` 4 on a single crypt filter named `filter_name`
    /// holds the cipher; with embedded-files-only it applies to `/EFF` alone and strings and
    /// streams stay in clear text.
    pub fn with_settings(filter: SecurityHandlerKind, settings: &CipherSettings, filter_name: &[u8]) -> Self {
        let mut encryption = Self::new(filter, settings.revision);
        encryption.version = settings.version();
        encryption.key_length = settings.key_length;
        encryption.encrypt_metadata = settings.encrypt_metadata;

        if settings.uses_crypt_filters() {
            let auth_event: &[u8] = if settings.embedded_files_only { b"EFOpen" } else { b"DocOpen" };

            encryption.crypt_filters.insert(
                filter_name.to_vec(),
                CryptFilterEntry {
                    method: Some(settings.cipher),
                    auth_event: Some(auth_event.to_vec()),
                    length: Some(settings.key_length as i64),
                    ..CryptFilterEntry::default()
                },
            );

            if settings.embedded_files_only {
                encryption.stream_filter = Some(IDENTITY.to_vec());
                encryption.string_filter = Some(IDENTITY.to_vec());
                encryption.embedded_file_filter = Some(filter_name.to_vec());
            } else {
                encryption.stream_filter = Some(filter_name.to_vec());
                encryption.string_filter = Some(filter_name.to_vec());
            }
        }

        encryption
    }

    /// Recipient blobs protecting the file key: the top-level `/Recipients`, or those of the
    /// crypt filter used for streams.
    pub fn all_recipients(&self) -> &[Vec<u8>] {
        if !self.recipients.is_empty() {
            return &self.recipients;
        }

        self.stream_filter
            .as_ref()
            .and_then(|name| self.crypt_filters.get(name))
            .or_else(|| self.crypt_filters.values().find(|entry| !entry.recipients.is_empty()))
            .map(|entry| entry.recipients.as_slice())
            .unwrap_or_default()
    }

    /// Instantiates the named crypt filters. Before `/V` 4 every string and stream uses RC4,
    /// registered under [`STANDARD_CRYPT_FILTER`].
    pub fn crypt_filters(&self, provider: &Arc<dyn CryptoProvider>) -> BTreeMap<Vec<u8>, Arc<dyn CryptFilter>> {
        let mut filters = BTreeMap::new();

        filters.insert(IDENTITY.to_vec(), crypt_filter_for(None, provider));

        if self.version < 4 {
            filters.insert(STANDARD_CRYPT_FILTER.to_vec(), crypt_filter_for(Some(CipherKind::Rc4), provider));
            return filters;
        }

        for (name, entry) in &self.crypt_filters {
            filters.insert(name.clone(), crypt_filter_for(entry.method, provider));
        }

        filters
    }

    /// Name of the filter applied to streams, resolving the defaults of the `/V` value.
    pub fn stream_filter_name(&self) -> &[u8] {
        match (&self.stream_filter, self.version) {
            (_, v) if v < 4 => STANDARD_CRYPT_FILTER,
            (Some(name), _) => name.as_slice(),
            (None, _) => IDENTITY,
        }
    }

    /// Name of the filter applied to strings, resolving the defaults of the `/V` value.
    pub fn string_filter_name(&self) -> &[u8] {
        match (&self.string_filter, self.version) {
            (_, v) if v < 4 => STANDARD_CRYPT_FILTER,
            (Some(name), _) => name.as_slice(),
            (None, _) => IDENTITY,
        }
    }

    /// Name of the filter applied to embedded file streams; `/EFF` defaults to `/StmF`.
    pub fn embedded_file_filter_name(&self) -> &[u8] {
        match (&self.embedded_file_filter, self.version) {
            (Some(name), v) if v >= 4 => name.as_slice(),
            _ => self.stream_filter_name(),
        }
    }

    pub fn to_dictionary(&self) -> Dictionary {
        let mut dict = Dictionary::new();

        dict.set("Filter", Object::Name(self.filter.name().to_vec()));

        if let Some(sub_filter) = &self.sub_filter {
            dict.set("SubFilter", Object::Name(sub_filter.clone()));
        }

        dict.set("V", self.version);
        dict.set("R", self.revision.number());
        dict.set("Length", (self.key_length * 8) as i64);

        if self.filter == SecurityHandlerKind::Standard {
            dict.set("O", Object::string_hex(self.owner_value.clone()));
            dict.set("U", Object::string_hex(self.user_value.clone()));

            if self.revision.is_aes256() {
                dict.set("OE", Object::string_hex(self.owner_encrypted.clone()));
                dict.set("UE", Object::string_hex(self.user_encrypted.clone()));
                dict.set("Perms", Object::string_hex(self.permission_encrypted.clone()));
            }

            dict.set("P", self.permissions);
        }

        if !self.encrypt_metadata {
            dict.set("EncryptMetadata", false);
        }

        if !self.crypt_filters.is_empty() {
            let filters = self
                .crypt_filters
                .iter()
                .map(|(name, entry)| (name.clone(), Object::Dictionary(entry.to_dictionary())))
                .collect::<Dictionary>();
            dict.set("CF", filters);
        }

        for (key, name) in [
            ("StmF", &self.stream_filter),
            ("StrF", &self.string_filter),
            ("EFF", &self.embedded_file_filter),
        ] {
            if let Some(name) = name {
                dict.set(key, Object::Name(name.clone()));
            }
        }

        if !self.recipients.is_empty() {
            dict.set("Recipients", recipients_array(&self.recipients));
        }

        dict
    }
}

impl CryptFilterEntry {
    pub fn to_dictionary(&self) -> Dictionary {
        let mut dict = Dictionary::new();

        dict.set("Type", "CryptFilter");
        dict.set("CFM", Object::Name(self.method.map(CipherKind::method).unwrap_or(&b"None"[..]).to_vec()));

        if let Some(auth_event) = &self.auth_event {
            dict.set("AuthEvent", Object::Name(auth_event.clone()));
        }

        if let Some(length) = self.length {
            dict.set("Length", length);
        }

        if !self.recipients.is_empty() {
            dict.set("Recipients", recipients_array(&self.recipients));
        }

        if let Some(encrypt_metadata) = self.encrypt_metadata {
            dict.set("EncryptMetadata", encrypt_metadata);
        }

        dict
    }
}

fn recipients_array(recipients: &[Vec<u8>]) -> Object {
    Object::Array(
        recipients
            .iter()
            .map(|blob| Object::String(blob.clone(), StringFormat::Hexadecimal))
            .collect(),
    )
}

fn parse_recipients(object: &Object) -> Result<Vec<Vec<u8>>> {
    let malformed = Error::Malformed {
        field: "Recipients",
        reason: "is not an array of strings",
    };

    match object {
        Object::String(blob, _) => Ok(vec![blob.clone()]),
        Object::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(<[u8]>::to_vec))
            .collect::<Result<Vec<_>>>()
            .map_err(|_| malformed),
        _ => Err(malformed),
    }
}

fn optional_string(dict: &Dictionary, key: &'static str) -> Result<Vec<u8>> {
    match dict.get(key.as_bytes()) {
        Ok(object) => object.as_str().map(<[u8]>::to_vec).map_err(|_| Error::Malformed {
            field: key,
            reason: "is not a string",
        }),
        Err(_) => Ok(Vec::new()),
    }
}

fn optional_name(dict: &Dictionary, key: &'static str) -> Result<Option<Vec<u8>>> {
    match dict.get(key.as_bytes()) {
        Ok(object) => object.as_name().map(|name| Some(name.to_vec())).map_err(|_| Error::Malformed {
            field: key,
            reason: "is not a name",
        }),
        Err(_) => Ok(None),
    }
}

fn required_string(dict: &Dictionary, key: &'static str, min_len: usize) -> Result<Vec<u8>> {
    if !dict.has(key.as_bytes()) {
        return Err(Error::Malformed {
            field: key,
            reason: "is missing",
        });
    }

    let value = optional_string(dict, key)?;

    if value.len() < min_len {
        return Err(Error::Malformed {
            field: key,
            reason: "is too short",
        });
    }

    Ok(value)
}

impl TryFrom<&Dictionary> for CryptFilterEntry {
    type Error = Error;

    fn try_from(dict: &Dictionary) -> Result<Self> {
        let method = match optional_name(dict, "CFM")? {
            None => None,
            Some(name) if name == b"None" => None,
            Some(name) => Some(CipherKind::from_method(&name).ok_or(Error::Malformed {
                field: "CFM",
                reason: "names an unknown crypt filter method",
            })?),
        };

        let length = match dict.get(b"Length") {
            Ok(object) => Some(object.as_i64().map_err(|_| Error::Malformed {
                field: "Length",
                reason: "is not an integer",
            })?),
            Err(_) => None,
        };

        let recipients = match dict.get(b"Recipients") {
            Ok(object) => parse_recipients(object)?,
            Err(_) => Vec::new(),
        };

        let encrypt_metadata = dict.get(b"EncryptMetadata").and_then(Object::as_bool).ok();

        Ok(Self {
            method,
            auth_event: optional_name(dict, "AuthEvent")?,
            length,
            recipients,
            encrypt_metadata,
        })
    }
}

/// Key length in bytes for `/V` and `/Length` (in bits).
fn key_length(version: i64, length: Option<i64>) -> Result<usize> {
    let invalid = Error::Malformed {
        field: "Length",
        reason: "is not valid for /V",
    };

    match (version, length) {
        (1, _) => Ok(5),
        (2 | 3, None) => Ok(5),
        (2 | 3, Some(bits)) if (40..=128).contains(&bits) && bits % 8 == 0 => Ok(bits as usize / 8),
        (4, None | Some(128)) => Ok(16),
        (5, None | Some(256)) => Ok(32),
        _ => Err(invalid),
    }
}

impl TryFrom<&Dictionary> for EncryptionDictionary {
    type Error = Error;

    fn try_from(dict: &Dictionary) -> Result<Self> {
        let filter_name = optional_name(dict, "Filter")?.ok_or(Error::Malformed {
            field: "Filter",
            reason: "is missing",
        })?;

        let filter = match filter_name.as_slice() {
            STANDARD_FILTER => SecurityHandlerKind::Standard,
            PUBLIC_KEY_FILTER => SecurityHandlerKind::PublicKey,
            name => return Err(Error::UnsupportedSecurityHandler(String::from_utf8_lossy(name).into_owned())),
        };

        let version = dict.get(b"V").and_then(Object::as_i64).map_err(|_| Error::Malformed {
            field: "V",
            reason: "is missing",
        })?;

        if !matches!(version, 1 | 2 | 4 | 5) {
            return Err(Error::Malformed {
                field: "V",
                reason: "is not a supported algorithm version",
            });
        }

        let revision = match dict.get(b"R").and_then(Object::as_i64) {
            Ok(number) => EncryptionRevision::from_number(number).ok_or(Error::Malformed {
                field: "R",
                reason: "is not a supported revision",
            })?,
            Err(_) if filter == SecurityHandlerKind::PublicKey => match version {
                1 => EncryptionRevision::R2,
                2 => EncryptionRevision::R3,
                4 => EncryptionRevision::R4,
                _ => EncryptionRevision::R6,
            },
            Err(_) => {
                return Err(Error::Malformed {
                    field: "R",
                    reason: "is missing",
                });
            }
        };

        let length = dict.get(b"Length").and_then(Object::as_i64).ok();
        let key_length = key_length(version, length)?;

        let mut crypt_filters = BTreeMap::new();

        if let Ok(filters) = dict.get(b"CF") {
            let filters = filters.as_dict().map_err(|_| Error::Malformed {
                field: "CF",
                reason: "is not a dictionary",
            })?;

            for (name, entry) in filters {
                let entry = entry.as_dict().map_err(|_| Error::Malformed {
                    field: "CF",
                    reason: "contains an entry that is not a dictionary",
                })?;
                crypt_filters.insert(name.clone(), CryptFilterEntry::try_from(entry)?);
            }
        }

        let mut encryption = Self::new(filter, revision);
        encryption.version = version;
        encryption.key_length = key_length;
        encryption.sub_filter = optional_name(dict, "SubFilter")?;
        encryption.crypt_filters = crypt_filters;
        encryption.stream_filter = optional_name(dict, "StmF")?;
        encryption.string_filter = optional_name(dict, "StrF")?;
        encryption.embedded_file_filter = optional_name(dict, "EFF")?;

        // Public-key crypt filters may carry the flag themselves.
        let filter_encrypt_metadata = encryption
            .stream_filter
            .as_ref()
            .and_then(|name| encryption.crypt_filters.get(name))
            .and_then(|entry| entry.encrypt_metadata);

        encryption.encrypt_metadata = match dict.get(b"EncryptMetadata").and_then(Object::as_bool) {
            Ok(value) => value,
            Err(_) => filter_encrypt_metadata.unwrap_or_else(|| {
                debug!("/EncryptMetadata is missing; defaulting to true");
                true
            }),
        };

        if version >= 4 {
            for (field, name) in [
                ("StmF", &encryption.stream_filter),
                ("StrF", &encryption.string_filter),
                ("EFF", &encryption.embedded_file_filter),
            ] {
                if let Some(name) = name {
                    if name != IDENTITY && !encryption.crypt_filters.contains_key(name) {
                        return Err(Error::Malformed {
                            field,
                            reason: "names an undefined crypt filter",
                        });
                    }
                }
            }
        }

        match filter {
            SecurityHandlerKind::Standard => {
                let (hash_len, encrypted_len) = if revision.is_aes256() { (48, 32) } else { (32, 0) };

                encryption.owner_value = required_string(dict, "O", hash_len)?;
                encryption.user_value = required_string(dict, "U", hash_len)?;

                if revision.is_aes256() {
                    encryption.owner_encrypted = required_string(dict, "OE", encrypted_len)?;
                    encryption.user_encrypted = required_string(dict, "UE", encrypted_len)?;
                    encryption.permission_encrypted = required_string(dict, "Perms", 16)?;
                }

                encryption.permissions = dict.get(b"P").and_then(Object::as_i64).map_err(|_| Error::Malformed {
                    field: "P",
                    reason: "is missing",
                })? as i32;
            }
            SecurityHandlerKind::PublicKey => {
                if let Ok(recipients) = dict.get(b"Recipients") {
                    encryption.recipients = parse_recipients(recipients)?;
                }

                if encryption.all_recipients().is_empty() {
                    return Err(Error::Malformed {
                        field: "Recipients",
                        reason: "is missing",
                    });
                }
            }
        }

        Ok(encryption)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary;

    fn standard_r6() -> Dictionary {
        dictionary! {
            "Filter" => "Standard",
            "V" => 5,
            "R" => 6,
            "Length" => 256,
            "O" => Object::string_hex(vec![1u8; 48]),
            "U" => Object::string_hex(vec![2u8; 48]),
            "OE" => Object::string_hex(vec![3u8; 32]),
            "UE" => Object::string_hex(vec![4u8; 32]),
            "Perms" => Object::string_hex(vec![5u8; 16]),
            "P" => -3904,
            "CF" => dictionary! {
                "StdCF" => dictionary! {
                    "CFM" => "AESV3",
                    "AuthEvent" => "DocOpen",
                    "Length" => 32,
                },
            },
            "StmF" => "StdCF",
            "StrF" => "StdCF",
        }
    }

    #[test]
    fn parse_and_write_back() {
        let dict = standard_r6();
        let encryption = EncryptionDictionary::try_from(&dict).unwrap();

        assert_eq!(encryption.revision, EncryptionRevision::R6);
        assert_eq!(encryption.key_length, 32);
        assert_eq!(encryption.permissions, -3904);
        assert!(encryption.encrypt_metadata);
        assert_eq!(encryption.crypt_filters[&b"StdCF".to_vec()].method, Some(CipherKind::AesV3));
        assert_eq!(encryption.stream_filter_name(), b"StdCF");
        assert_eq!(encryption.embedded_file_filter_name(), b"StdCF");

        let written = encryption.to_dictionary();
        assert_eq!(EncryptionDictionary::try_from(&written).unwrap(), encryption);
    }

    #[test]
    fn unknown_filter_is_unsupported() {
        let mut dict = standard_r6();
        dict.set("Filter", "FooBar");

        let err = EncryptionDictionary::try_from(&dict).unwrap_err();
        assert_eq!(err.to_string(), "unsupported security handler: /FooBar");
    }

    #[test]
    fn structural_problems_name_the_field() {
        let mut dict = standard_r6();
        dict.set("OE", Object::string_hex(vec![3u8; 16]));
        assert!(matches!(
            EncryptionDictionary::try_from(&dict),
            Err(Error::Malformed { field: "OE", .. })
        ));

        let mut dict = standard_r6();
        dict.remove(b"V");
        assert!(matches!(
            EncryptionDictionary::try_from(&dict),
            Err(Error::Malformed { field: "V", .. })
        ));

        let mut dict = standard_r6();
        dict.set("Length", 128);
        assert!(matches!(
            EncryptionDictionary::try_from(&dict),
            Err(Error::Malformed { field: "Length", .. })
        ));

        let mut dict = standard_r6();
        dict.set("CF", dictionary! { "StdCF" => dictionary! { "CFM" => "Bogus" } });
        assert!(matches!(
            EncryptionDictionary::try_from(&dict),
            Err(Error::Malformed { field: "CFM", .. })
        ));

        let mut dict = standard_r6();
        dict.set("StmF", "Missing");
        assert!(matches!(
            EncryptionDictionary::try_from(&dict),
            Err(Error::Malformed { field: "StmF", .. })
        ));
    }

    #[test]
    fn embedded_files_only_layout() {
        let settings = CipherSettings {
            revision: EncryptionRevision::R4,
            cipher: CipherKind::AesV2,
            key_length: 16,
            encrypt_metadata: false,
            embedded_files_only: true,
        };

        let encryption = EncryptionDictionary::with_settings(SecurityHandlerKind::Standard, &settings, STANDARD_CRYPT_FILTER);
        let dict = encryption.to_dictionary();

        assert_eq!(dict.get(b"StmF").unwrap().as_name().unwrap(), IDENTITY);
        assert_eq!(dict.get(b"StrF").unwrap().as_name().unwrap(), IDENTITY);
        assert_eq!(dict.get(b"EFF").unwrap().as_name().unwrap(), STANDARD_CRYPT_FILTER);
        assert!(!dict.get(b"EncryptMetadata").unwrap().as_bool().unwrap());

        let filter = dict.get(b"CF").unwrap().as_dict().unwrap().get(b"StdCF").unwrap().as_dict().unwrap();
        assert_eq!(filter.get(b"CFM").unwrap().as_name().unwrap(), b"AESV2");
        assert_eq!(filter.get(b"AuthEvent").unwrap().as_name().unwrap(), b"EFOpen");

        assert_eq!(encryption.embedded_file_filter_name(), STANDARD_CRYPT_FILTER);
        assert_eq!(encryption.stream_filter_name(), IDENTITY);
    }

    #[test]
    fn rc4_defaults() {
        let dict = dictionary! {
            "Filter" => "Standard",
            "V" => 2,
            "R" => 3,
            "Length" => 128,
            "O" => Object::string_literal(vec![1u8; 32]),
            "U" => Object::string_literal(vec![2u8; 32]),
            "P" => -4,
            "EncryptMetadata" => false,
        };

        let encryption = EncryptionDictionary::try_from(&dict).unwrap();
        assert_eq!(encryption.key_length, 16);
        assert!(!encryption.encrypt_metadata);
        assert_eq!(encryption.stream_filter_name(), STANDARD_CRYPT_FILTER);

        let filters = encryption.crypt_filters(&crate::encryption::default_provider());
        assert_eq!(filters[&STANDARD_CRYPT_FILTER.to_vec()].method(), b"V2");
    }

    #[test]
    fn public_key_recipients_inside_crypt_filter() {
        let dict = dictionary! {
            "Filter" => "Adobe.PubSec",
            "SubFilter" => "adbe.pkcs7.s5",
            "V" => 4,
            "CF" => dictionary! {
                "DefaultCryptFilter" => dictionary! {
                    "CFM" => "AESV2",
                    "Recipients" => vec![Object::string_hex(vec![0x30u8, 0x00])],
                },
            },
            "StmF" => "DefaultCryptFilter",
            "StrF" => "DefaultCryptFilter",
        };

        let encryption = EncryptionDictionary::try_from(&dict).unwrap();
        assert_eq!(encryption.filter, SecurityHandlerKind::PublicKey);
        assert_eq!(encryption.revision, EncryptionRevision::R4);
        assert_eq!(encryption.all_recipients(), &[vec![0x30u8, 0x00]]);

        let mut dict = dict;
        dict.remove(b"CF");
        dict.remove(b"StmF");
        dict.remove(b"StrF");
        assert!(matches!(
            EncryptionDictionary::try_from(&dict),
            Err(Error::Malformed { field: "Recipients", .. })
        ));
    }
}
