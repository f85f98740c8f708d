use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Fixed message texts of the credential and capability errors.
pub mod messages {
    pub const BAD_USER_PASSWORD: &str = "bad user password: the password is missing or incorrect";
    pub const BAD_CERTIFICATE_AND_KEY: &str = "bad certificate and key";
    pub const CERTIFICATE_NOT_PROVIDED: &str =
        "certificate is not provided: the document is encrypted with a public key certificate";
    pub const UNSUPPORTED_IN_FIPS_MODE: &str = "public key encryption is not supported in FIPS mode";
    pub const NOT_OPENED_WITH_OWNER_PASSWORD: &str = "the document is not opened with the owner password";
}

#[derive(Debug, Error)]
pub enum Error {
    /// An Object has the wrong type, e.g. the Object is an Array where a Name would be expected.
    #[error("object has wrong type; expected type {expected} but found type {found}")]
    ObjectType {
        expected: &'static str,
        found: &'static str,
    },
    /// Dictionary key was not found.
    #[error("missing required dictionary key \"{0}\"")]
    DictKey(String),

    /// Neither the user nor the owner password matched. The caller may retry with another
    /// password; no content has been decrypted.
    #[error("{}", messages::BAD_USER_PASSWORD)]
    BadPassword,
    /// The certificate does not match any recipient, or the private key cannot unwrap the
    /// recipient's key.
    #[error("{}", messages::BAD_CERTIFICATE_AND_KEY)]
    BadCertificateAndKey,
    /// The document uses the public-key security handler but no certificate was supplied.
    #[error("{}", messages::CERTIFICATE_NOT_PROVIDED)]
    CertificateNotProvided,
    /// The `/Filter` of the encryption dictionary names an unknown security handler.
    #[error("unsupported security handler: /{0}")]
    UnsupportedSecurityHandler(String),
    /// A recipient certificate carries a key that cannot be used for key transport. The
    /// parameter is the certificate's key algorithm OID.
    #[error("algorithm {0} is not supported")]
    UnsupportedAlgorithm(String),
    /// Public-key encryption was requested from a FIPS-only crypto provider.
    #[error("{}", messages::UNSUPPORTED_IN_FIPS_MODE)]
    UnsupportedInFipsMode,
    /// A structurally invalid `/Encrypt` entry.
    #[error("malformed encryption dictionary: /{field} {reason}")]
    Malformed {
        field: &'static str,
        reason: &'static str,
    },
    /// Modifying an encrypted document requires owner-level access.
    #[error("{}", messages::NOT_OPENED_WITH_OWNER_PASSWORD)]
    NotOpenedWithOwnerPassword,

    /// Error when decrypting a string or stream.
    #[error("decryption error: {0}")]
    Decryption(&'static str),
    /// Error when encrypting a string or stream.
    #[error("encryption error: {0}")]
    Encryption(&'static str),
    /// The password could not be prepared with SASLprep.
    #[error("password preparation failed: {0}")]
    PasswordPreparation(#[from] stringprep::Error),
    /// The certificate or private key could not be parsed.
    #[error("invalid certificate or key: {0}")]
    Certificate(String),
    /// Encoding or decoding a recipient envelope failed.
    #[error("invalid recipient envelope: {0}")]
    Envelope(#[from] der::Error),
    /// The RSA primitive failed while wrapping a key.
    #[error("RSA operation failed: {0}")]
    Rsa(#[from] rsa::Error),
}

impl Error {
    /// Whether retrying with different credentials may succeed.
    pub fn is_bad_credentials(&self) -> bool {
        matches!(
            self,
            Error::BadPassword | Error::BadCertificateAndKey | Error::CertificateNotProvided
        )
    }
}
