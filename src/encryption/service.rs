use crate::config::{EncryptionAlgorithm, EncryptionProperties, PdfVersion, ReaderProperties, WriterCredentials, WriterProperties};
use crate::{Document, Error, Object, ObjectId, Result, StringFormat};
use log::{debug, warn};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use super::crypt_filters::{CryptFilter, IdentityCryptFilter};
use super::dictionary::{EncryptionDictionary, SecurityHandlerKind, IDENTITY};
use super::permissions::Permissions;
use super::provider::CryptoProvider;
use super::pubsec::PublicKeySecurityHandler;
use super::revision::{CipherKind, CipherSettings, EncryptionRevision};
use super::standard::StandardSecurityHandler;
use super::{AccessLevel, FileEncryptionKey};

/// How a document that was opened from an existing file is written back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveMode {
    /// Incremental update. The source encryption always carries over.
    Append,
    /// Full rewrite of an existing document.
    Stamp { preserve_encryption: bool },
}

impl SaveMode {
    fn preserves_encryption(self) -> bool {
        match self {
            SaveMode::Append => true,
            SaveMode::Stamp { preserve_encryption } => preserve_encryption,
        }
    }
}

/// The unlocked encryption of a document: its dictionary, file key and crypt filters.
#[derive(Clone)]
pub struct EncryptionState {
    dictionary: EncryptionDictionary,
    file_key: FileEncryptionKey,
    crypt_filters: BTreeMap<Vec<u8>, Arc<dyn CryptFilter>>,
    access: AccessLevel,
    permissions: Permissions,
    unethical_reading: bool,
}

impl EncryptionState {
    fn new(
        (dictionary, file_key, access, permissions): (EncryptionDictionary, FileEncryptionKey, AccessLevel, Permissions),
        provider: &Arc<dyn CryptoProvider>,
    ) -> Self {
        let crypt_filters = dictionary.crypt_filters(provider);

        Self {
            dictionary,
            file_key,
            crypt_filters,
            access,
            permissions,
            unethical_reading: false,
        }
    }

    pub fn dictionary(&self) -> &EncryptionDictionary {
        &self.dictionary
    }

    pub fn permissions(&self) -> Permissions {
        self.permissions
    }

    pub fn unlocked_as(&self) -> AccessLevel {
        self.access
    }

    /// Owner access, or a recipient granted every permission.
    pub fn is_opened_with_full_permission(&self) -> bool {
        match self.access {
            AccessLevel::Owner => true,
            AccessLevel::User => false,
            AccessLevel::Recipient => self.permissions.is_all(),
        }
    }

    fn filter(&self, name: &[u8]) -> Arc<dyn CryptFilter> {
        match self.crypt_filters.get(name) {
            Some(filter) => filter.clone(),
            None => Arc::new(IdentityCryptFilter),
        }
    }

    fn string_filter(&self) -> Arc<dyn CryptFilter> {
        self.filter(self.dictionary.string_filter_name())
    }

    fn stream_filter(&self, dict: &crate::Dictionary) -> Arc<dyn CryptFilter> {
        if dict.type_is(b"EmbeddedFile") {
            self.filter(self.dictionary.embedded_file_filter_name())
        } else {
            self.filter(self.dictionary.stream_filter_name())
        }
    }
}

impl fmt::Debug for EncryptionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionState")
            .field("dictionary", &self.dictionary)
            .field("crypt_filters", &self.crypt_filters.keys().map(|name| String::from_utf8_lossy(name)).collect::<Vec<_>>())
            .field("access", &self.access)
            .field("permissions", &self.permissions)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Copy)]
enum Direction {
    Encrypt,
    Decrypt,
}

/// Applies document encryption when a document is opened and when it is saved.
#[derive(Clone, Debug)]
pub struct DocumentEncryptionService {
    provider: Arc<dyn CryptoProvider>,
}

impl DocumentEncryptionService {
    pub fn new(provider: Arc<dyn CryptoProvider>) -> Self {
        Self { provider }
    }

    /// Unlocks an encrypted document and decrypts all its strings and streams in place.
    ///
    /// Returns `None` for a document without `/Encrypt`. On success the `/Encrypt` entry is
    /// removed from the trailer; on failure the document is left untouched.
    pub fn open(&self, document: &mut Document, properties: &ReaderProperties) -> Result<Option<EncryptionState>> {
        if !document.is_encrypted() {
            return Ok(None);
        }

        let dictionary = EncryptionDictionary::try_from(document.get_encrypted()?)?;
        let encrypt_id = document.trailer.get(b"Encrypt").and_then(Object::as_reference).ok();

        let parts = match dictionary.filter {
            SecurityHandlerKind::Standard => {
                let password = properties.password.as_deref().unwrap_or_default();
                let file_id = document.file_id().unwrap_or_default();
                StandardSecurityHandler::read_validate(&dictionary, file_id, password, self.provider.clone())?
                    .into_parts()
            }
            SecurityHandlerKind::PublicKey => PublicKeySecurityHandler::read_validate(
                &dictionary,
                properties.certificate.as_deref(),
                properties.private_key.as_deref(),
                self.provider.clone(),
            )?
            .into_parts(),
        };

        let mut state = EncryptionState::new(parts, &self.provider);
        state.unethical_reading = properties.unethical_reading;

        debug!("document unlocked as {:?}", state.access);

        // Decrypt into a copy so that a corrupt object leaves the document as it was.
        let mut objects = document.objects.clone();
        for (&id, object) in objects.iter_mut() {
            if Some(id) == encrypt_id {
                continue;
            }
            transform_object(&state, id, object, Direction::Decrypt)?;
        }
        document.objects = objects;

        if let Some(id) = encrypt_id {
            document.objects.remove(&id);
        }
        document.trailer.remove(b"Encrypt");

        Ok(Some(state))
    }

    /// Encrypts `document` for writing.
    ///
    /// New encryption settings always win and discard the source encryption. Without them, the
    /// source encryption is reused as is when `mode` preserves it; otherwise the document is
    /// written in clear text and `None` is returned.
    pub fn save(
        &self,
        document: &mut Document,
        properties: &WriterProperties,
        source: Option<&EncryptionState>,
        mode: SaveMode,
    ) -> Result<Option<EncryptionState>> {
        if let Some(source) = source {
            if !source.is_opened_with_full_permission() && !source.unethical_reading {
                return Err(Error::NotOpenedWithOwnerPassword);
            }
        }

        let mut version = properties
            .pdf_version
            .or_else(|| document.pdf_version().map(PdfVersion::from))
            .unwrap_or(PdfVersion::PDF_1_7);

        let state = match (&properties.encryption, source) {
            (Some(encryption), _) => {
                if encryption.embedded_files_only && version < PdfVersion::PDF_1_6 {
                    debug!("embedded file encryption requires PDF 1.6");
                    version = PdfVersion::PDF_1_6;
                }
                Some(self.write_setup(document, encryption, version)?)
            }
            (None, Some(source)) if mode.preserves_encryption() => Some(source.clone()),
            (None, Some(_)) => {
                debug!("writing the document without its source encryption");
                None
            }
            (None, None) => None,
        };

        document.version = version.to_string();

        if let Ok(id) = document.trailer.get(b"Encrypt").and_then(Object::as_reference) {
            document.objects.remove(&id);
        }
        document.trailer.remove(b"Encrypt");

        let Some(state) = state else {
            return Ok(None);
        };

        let mut objects = document.objects.clone();
        for (&id, object) in objects.iter_mut() {
            transform_object(&state, id, object, Direction::Encrypt)?;
        }
        document.objects = objects;

        let encrypt_id = document.add_object(state.dictionary.to_dictionary());
        document.trailer.set("Encrypt", encrypt_id);

        Ok(Some(state))
    }

    fn write_setup(&self, document: &mut Document, encryption: &EncryptionProperties, version: PdfVersion) -> Result<EncryptionState> {
        let settings = cipher_settings(encryption, version);
        let file_id = ensure_file_id(document, self.provider.as_ref());

        let parts = match &encryption.credentials {
            WriterCredentials::Password { user, owner } => StandardSecurityHandler::write_setup(
                user,
                owner,
                encryption.permissions,
                &settings,
                &file_id,
                self.provider.clone(),
            )?
            .into_parts(),
            WriterCredentials::Certificates(recipients) => {
                PublicKeySecurityHandler::write_setup(recipients, &settings, self.provider.clone())?.into_parts()
            }
        };

        Ok(EncryptionState::new(parts, &self.provider))
    }
}

/// Maps the requested algorithm and target version to the revision and cipher written.
fn cipher_settings(encryption: &EncryptionProperties, version: PdfVersion) -> CipherSettings {
    let mut algorithm = encryption.algorithm;

    if version.is_pdf2() && algorithm != EncryptionAlgorithm::Aes256 {
        warn!("{algorithm:?} is deprecated in PDF {version}; using AES-256 instead");
        algorithm = EncryptionAlgorithm::Aes256;
    }

    let mut encrypt_metadata = encryption.encrypt_metadata;
    let mut embedded_files_only = encryption.embedded_files_only;

    let (revision, cipher) = match algorithm {
        EncryptionAlgorithm::Rc4_40 => {
            if !encrypt_metadata || embedded_files_only {
                warn!("40-bit RC4 always encrypts metadata and every stream; ignoring the requested exclusions");
                encrypt_metadata = true;
                embedded_files_only = false;
            }
            warn!("40-bit RC4 encryption is deprecated");
            (EncryptionRevision::R2, CipherKind::Rc4)
        }
        EncryptionAlgorithm::Rc4_128 => {
            warn!("128-bit RC4 encryption is deprecated");
            if !encrypt_metadata || embedded_files_only {
                (EncryptionRevision::R4, CipherKind::Rc4)
            } else {
                (EncryptionRevision::R3, CipherKind::Rc4)
            }
        }
        EncryptionAlgorithm::Aes128 => (EncryptionRevision::R4, CipherKind::AesV2),
        EncryptionAlgorithm::Aes256 if version.is_pdf2() => (EncryptionRevision::R6, CipherKind::AesV3),
        EncryptionAlgorithm::Aes256 => {
            warn!("AES-256 revision 5 is deprecated; PDF 2.0 documents use revision 6");
            (EncryptionRevision::R5, CipherKind::AesV3)
        }
    };

    CipherSettings {
        revision,
        cipher,
        key_length: revision.key_length(),
        encrypt_metadata,
        embedded_files_only,
    }
}

/// Returns the first `/ID` element, generating a random identifier when the trailer has none.
fn ensure_file_id(document: &mut Document, provider: &dyn CryptoProvider) -> Vec<u8> {
    if let Some(id) = document.file_id() {
        return id.to_vec();
    }

    let mut id = vec![0u8; 16];
    provider.fill_random(&mut id);
    debug!("generated a file identifier for encryption");

    document.trailer.set(
        "ID",
        vec![
            Object::String(id.clone(), StringFormat::Hexadecimal),
            Object::String(id.clone(), StringFormat::Hexadecimal),
        ],
    );

    id
}

/// Encrypts or decrypts every string and stream of one indirect object.
fn transform_object(state: &EncryptionState, obj_id: ObjectId, obj: &mut Object, direction: Direction) -> Result<()> {
    // The cross-reference stream shall not be encrypted and strings appearing in the
    // cross-reference stream dictionary shall not be encrypted.
    if obj.as_stream().map(|stream| stream.dict.type_is(b"XRef")).unwrap_or(false) {
        return Ok(());
    }

    // With /EncryptMetadata false only the metadata stream content stays in clear text.
    let clear_content = !state.dictionary.encrypt_metadata
        && obj.as_stream().map(|stream| stream.dict.type_is(b"Metadata")).unwrap_or(false);

    // A stream may name its own crypt filter with a Crypt filter and a DecodeParms /Name
    // entry; Identity is used when the name is missing.
    let override_crypt_filter = obj
        .as_stream()
        .ok()
        .filter(|stream| stream.filters().contains(&&b"Crypt"[..]))
        .map(|stream| {
            stream
                .dict
                .get(b"DecodeParms")
                .and_then(Object::as_dict)
                .and_then(|params| params.get(b"Name"))
                .and_then(Object::as_name)
                .map(|name| state.filter(name))
                .unwrap_or_else(|_| state.filter(IDENTITY))
        });

    let (crypt_filter, content) = match obj {
        // Strings nested in arrays and dictionaries belong to the same indirect object.
        Object::Array(objects) => {
            for obj in objects {
                transform_object(state, obj_id, obj, direction)?;
            }

            return Ok(());
        }
        Object::Dictionary(objects) => {
            for (_, obj) in objects.iter_mut() {
                transform_object(state, obj_id, obj, direction)?;
            }

            return Ok(());
        }
        Object::String(content, _) => (state.string_filter(), &*content),
        Object::Stream(stream) => {
            // Strings of the stream dictionary use the string filter.
            for (_, value) in stream.dict.iter_mut() {
                transform_object(state, obj_id, value, direction)?;
            }

            if clear_content {
                return Ok(());
            }

            (override_crypt_filter.unwrap_or_else(|| state.stream_filter(&stream.dict)), &stream.content)
        }
        _ => {
            return Ok(());
        }
    };

    let key = crypt_filter.compute_key(&state.file_key, obj_id)?;

    let transformed = match direction {
        Direction::Encrypt => crypt_filter.encrypt(&key, content)?,
        Direction::Decrypt => crypt_filter.decrypt(&key, content)?,
    };

    match obj {
        Object::Stream(stream) => stream.set_content(transformed),
        Object::String(content, _) => *content = transformed,
        _ => {}
    }

    Ok(())
}
