mod object;
pub use object::{Dictionary, Object, ObjectId, Stream, StringFormat};

mod document;
pub use document::Document;

mod config;
pub use config::{
    EncryptionAlgorithm, EncryptionProperties, PdfVersion, ReaderProperties, ReaderPropertiesBuilder,
    WriterCredentials, WriterProperties, WriterPropertiesBuilder,
};

pub mod encryption;
pub use encryption::{
    AccessLevel, CryptoProvider, DocumentEncryptionService, EncryptionState, Permissions, Recipient, SaveMode,
};

pub mod error;
pub use error::{Error, Result};
