//! PDF encryption: the standard and public-key security handlers, the crypt filters they
//! select and the service applying them to a whole document.

mod algorithms;
mod crypt_filters;
mod dictionary;
mod envelope;
mod password;
mod permissions;
mod provider;
mod pubsec;
mod rc4;
mod revision;
mod service;
mod standard;

pub use algorithms::KeyDerivation;
pub use crypt_filters::{crypt_filter_for, Aes128CryptFilter, Aes256CryptFilter, CryptFilter, IdentityCryptFilter, Rc4CryptFilter};
pub use dictionary::{CryptFilterEntry, EncryptionDictionary, SecurityHandlerKind};
pub use password::{pad_password, prepare_password, prepare_password_lossy, MAX_PASSWORD_LEN};
pub use permissions::Permissions;
pub use provider::{default_provider, CryptoProvider, DefaultCryptoProvider, FipsCryptoProvider};
pub use pubsec::{PublicKeySecurityHandler, Recipient};
pub use rc4::Rc4;
pub use revision::{CipherKind, CipherSettings, EncryptionRevision};
pub use service::{DocumentEncryptionService, EncryptionState, SaveMode};
pub use standard::StandardSecurityHandler;

/// The file encryption key of an open document. Zeroed when dropped.
pub type FileEncryptionKey = zeroize::Zeroizing<Vec<u8>>;

/// Which credential unlocked a document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessLevel {
    /// The owner password: every permission is granted.
    Owner,
    /// The user password: the `/P` permissions apply.
    User,
    /// A public-key recipient: the permissions of its envelope apply.
    Recipient,
}
