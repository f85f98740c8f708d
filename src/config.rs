use crate::encryption::{Permissions, Recipient};
use std::fmt;

/// Version of the PDF file format written to the header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PdfVersion {
    pub major: u8,
    pub minor: u8,
}

impl PdfVersion {
    pub const PDF_1_4: PdfVersion = PdfVersion::new(1, 4);
    pub const PDF_1_5: PdfVersion = PdfVersion::new(1, 5);
    pub const PDF_1_6: PdfVersion = PdfVersion::new(1, 6);
    pub const PDF_1_7: PdfVersion = PdfVersion::new(1, 7);
    pub const PDF_2_0: PdfVersion = PdfVersion::new(2, 0);

    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    pub fn is_pdf2(self) -> bool {
        self >= Self::PDF_2_0
    }
}

impl From<(u8, u8)> for PdfVersion {
    fn from((major, minor): (u8, u8)) -> Self {
        Self::new(major, minor)
    }
}

impl fmt::Display for PdfVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Encryption algorithm requested by the writer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EncryptionAlgorithm {
    /// RC4 with a 40-bit key.
    Rc4_40,
    /// RC4 with a 128-bit key.
    Rc4_128,
    /// AES-128 in CBC mode.
    Aes128,
    /// AES-256 in CBC mode.
    Aes256,
}

/// Who may open the encrypted document.
#[derive(Clone, PartialEq)]
pub enum WriterCredentials {
    /// Standard security handler. An empty owner password is replaced by a random one.
    Password { user: Vec<u8>, owner: Vec<u8> },
    /// Public-key security handler, one entry per certificate.
    Certificates(Vec<Recipient>),
}

impl fmt::Debug for WriterCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Password { .. } => f.write_str("Password { .. }"),
            Self::Certificates(recipients) => f.debug_tuple("Certificates").field(&recipients.len()).finish(),
        }
    }
}

/// Encryption requested for a document being written.
#[derive(Clone, Debug, PartialEq)]
pub struct EncryptionProperties {
    pub algorithm: EncryptionAlgorithm,
    pub credentials: WriterCredentials,
    /// Permissions granted to the user password. Recipients carry their own.
    pub permissions: Permissions,
    pub encrypt_metadata: bool,
    pub embedded_files_only: bool,
}

/// Options for writing a document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WriterProperties {
    /// New encryption settings. When absent, an encrypted source keeps its encryption only if
    /// the save mode preserves it.
    pub encryption: Option<EncryptionProperties>,
    /// Target version; the document's own version when absent.
    pub pdf_version: Option<PdfVersion>,
}

impl WriterProperties {
    /// Create a builder for WriterProperties
    pub fn builder() -> WriterPropertiesBuilder {
        WriterPropertiesBuilder::default()
    }
}

/// Builder for WriterProperties
#[derive(Default)]
pub struct WriterPropertiesBuilder {
    algorithm: Option<EncryptionAlgorithm>,
    credentials: Option<WriterCredentials>,
    permissions: Option<Permissions>,
    keep_metadata_in_clear: bool,
    embedded_files_only: bool,
    pdf_version: Option<PdfVersion>,
}

impl WriterPropertiesBuilder {
    /// Encrypt with the standard security handler.
    pub fn standard_encryption(
        mut self,
        user_password: impl Into<Vec<u8>>,
        owner_password: impl Into<Vec<u8>>,
        permissions: Permissions,
        algorithm: EncryptionAlgorithm,
    ) -> Self {
        self.credentials = Some(WriterCredentials::Password {
            user: user_password.into(),
            owner: owner_password.into(),
        });
        self.permissions = Some(permissions);
        self.algorithm = Some(algorithm);
        self
    }

    /// Encrypt with the public-key security handler.
    pub fn public_key_encryption(mut self, recipients: Vec<Recipient>, algorithm: EncryptionAlgorithm) -> Self {
        self.credentials = Some(WriterCredentials::Certificates(recipients));
        self.algorithm = Some(algorithm);
        self
    }

    /// Whether the XMP metadata stream is encrypted (the default).
    pub fn encrypt_metadata(mut self, value: bool) -> Self {
        self.keep_metadata_in_clear = !value;
        self
    }

    /// Only encrypt embedded file streams.
    pub fn embedded_files_only(mut self, value: bool) -> Self {
        self.embedded_files_only = value;
        self
    }

    /// Set the version of the written document
    pub fn pdf_version(mut self, version: PdfVersion) -> Self {
        self.pdf_version = Some(version);
        self
    }

    /// Build the WriterProperties
    pub fn build(self) -> WriterProperties {
        let encryption = self.credentials.map(|credentials| EncryptionProperties {
            algorithm: self.algorithm.unwrap_or(EncryptionAlgorithm::Aes256),
            credentials,
            permissions: self.permissions.unwrap_or_default(),
            encrypt_metadata: !self.keep_metadata_in_clear,
            embedded_files_only: self.embedded_files_only,
        });

        WriterProperties {
            encryption,
            pdf_version: self.pdf_version,
        }
    }
}

/// Credentials and policy for opening a document.
#[derive(Clone, Default, PartialEq)]
pub struct ReaderProperties {
    pub password: Option<Vec<u8>>,
    /// DER encoded X.509 certificate.
    pub certificate: Option<Vec<u8>>,
    /// DER encoded PKCS#8 or PKCS#1 RSA private key.
    pub private_key: Option<Vec<u8>>,
    /// Allow modifying a document opened without owner access.
    pub unethical_reading: bool,
}

impl ReaderProperties {
    /// Create a builder for ReaderProperties
    pub fn builder() -> ReaderPropertiesBuilder {
        ReaderPropertiesBuilder::default()
    }
}

impl fmt::Debug for ReaderProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaderProperties")
            .field("password", &self.password.as_ref().map(|_| ".."))
            .field("certificate", &self.certificate.as_ref().map(Vec::len))
            .field("private_key", &self.private_key.as_ref().map(|_| ".."))
            .field("unethical_reading", &self.unethical_reading)
            .finish()
    }
}

/// Builder for ReaderProperties
#[derive(Default)]
pub struct ReaderPropertiesBuilder {
    properties: ReaderProperties,
}

impl ReaderPropertiesBuilder {
    /// Password for the standard security handler, user or owner.
    pub fn password(mut self, password: impl Into<Vec<u8>>) -> Self {
        self.properties.password = Some(password.into());
        self
    }

    /// Certificate and private key for the public-key security handler.
    pub fn public_key_security(mut self, certificate: impl Into<Vec<u8>>, private_key: impl Into<Vec<u8>>) -> Self {
        self.properties.certificate = Some(certificate.into());
        self.properties.private_key = Some(private_key.into());
        self
    }

    pub fn unethical_reading(mut self, value: bool) -> Self {
        self.properties.unethical_reading = value;
        self
    }

    /// Build the ReaderProperties
    pub fn build(self) -> ReaderProperties {
        self.properties
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_defaults() {
        let properties = WriterProperties::builder().build();
        assert!(properties.encryption.is_none());
        assert!(properties.pdf_version.is_none());

        let properties = WriterProperties::builder()
            .standard_encryption("user", "owner", Permissions::PRINTABLE, EncryptionAlgorithm::Aes128)
            .build();
        let encryption = properties.encryption.unwrap();
        assert!(encryption.encrypt_metadata);
        assert!(!encryption.embedded_files_only);
        assert_eq!(encryption.permissions, Permissions::PRINTABLE);
    }

    #[test]
    fn passwords_are_not_printed() {
        let properties = WriterProperties::builder()
            .standard_encryption("secret-user", "secret-owner", Permissions::all(), EncryptionAlgorithm::Aes256)
            .build();
        assert!(!format!("{properties:?}").contains("secret"));

        let properties = ReaderProperties::builder().password("secret").build();
        assert!(!format!("{properties:?}").contains("secret"));
    }

    #[test]
    fn version_ordering() {
        assert!(PdfVersion::PDF_2_0.is_pdf2());
        assert!(!PdfVersion::PDF_1_7.is_pdf2());
        assert_eq!(PdfVersion::from((1, 6)), PdfVersion::PDF_1_6);
        assert_eq!(PdfVersion::PDF_2_0.to_string(), "2.0");
    }
}
