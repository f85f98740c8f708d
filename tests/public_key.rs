use pdfcrypt::encryption::{FipsCryptoProvider, default_provider};
use pdfcrypt::error::messages;
use pdfcrypt::{
    AccessLevel, DocumentEncryptionService, EncryptionAlgorithm, Error, Permissions, ReaderProperties, Recipient,
    SaveMode, WriterProperties,
};
use std::sync::Arc;

mod utils;
use utils::{ALICE_CERT, ALICE_KEY, BOB_CERT, BOB_KEY, ECDSA_CERT, init_logger, one_page_document, shown_text};

const TEXT: &str = "Content encrypted by iText";
const FRESH: SaveMode = SaveMode::Stamp { preserve_encryption: false };

fn service() -> DocumentEncryptionService {
    DocumentEncryptionService::new(default_provider())
}

fn for_recipients(recipients: Vec<Recipient>, algorithm: EncryptionAlgorithm) -> WriterProperties {
    WriterProperties::builder().public_key_encryption(recipients, algorithm).build()
}

#[test]
fn recipients_open_with_their_own_key() {
    init_logger();

    for algorithm in [
        EncryptionAlgorithm::Rc4_128,
        EncryptionAlgorithm::Aes128,
        EncryptionAlgorithm::Aes256,
    ] {
        let (mut doc, content_id) = one_page_document("1.7", TEXT);
        let recipients = vec![
            Recipient::new(ALICE_CERT.to_vec(), Permissions::PRINTABLE),
            Recipient::new(BOB_CERT.to_vec(), Permissions::all()),
        ];
        service().save(&mut doc, &for_recipients(recipients, algorithm), None, FRESH).unwrap();

        let encrypt = doc.get_encrypted().unwrap();
        assert_eq!(encrypt.get(b"Filter").unwrap().as_name().unwrap(), b"Adobe.PubSec");

        let mut opened = doc.clone();
        let reader = ReaderProperties::builder().public_key_security(ALICE_CERT, ALICE_KEY).build();
        let state = service().open(&mut opened, &reader).unwrap().unwrap();
        assert_eq!(state.unlocked_as(), AccessLevel::Recipient);
        assert_eq!(state.permissions(), Permissions::PRINTABLE);
        assert!(!state.is_opened_with_full_permission());
        assert_eq!(shown_text(&opened, content_id), TEXT, "{algorithm:?}");

        let mut opened = doc.clone();
        let reader = ReaderProperties::builder().public_key_security(BOB_CERT, BOB_KEY).build();
        let state = service().open(&mut opened, &reader).unwrap().unwrap();
        assert!(state.is_opened_with_full_permission());
        assert_eq!(shown_text(&opened, content_id), TEXT, "{algorithm:?}");
    }
}

#[test]
fn non_matching_key_is_rejected() {
    let (mut doc, _) = one_page_document("1.7", TEXT);
    let recipients = vec![Recipient::new(ALICE_CERT.to_vec(), Permissions::all())];
    service().save(&mut doc, &for_recipients(recipients, EncryptionAlgorithm::Aes128), None, FRESH).unwrap();

    let reader = ReaderProperties::builder().public_key_security(BOB_CERT, BOB_KEY).build();
    let err = service().open(&mut doc, &reader).unwrap_err();
    assert_eq!(err.to_string(), messages::BAD_CERTIFICATE_AND_KEY);
    assert!(err.is_bad_credentials());

    let reader = ReaderProperties::builder().public_key_security(ALICE_CERT, BOB_KEY).build();
    let err = service().open(&mut doc, &reader).unwrap_err();
    assert_eq!(err.to_string(), messages::BAD_CERTIFICATE_AND_KEY);

    // An ECDSA certificate can never hold the recipient's key.
    let reader = ReaderProperties::builder().public_key_security(ECDSA_CERT, ALICE_KEY).build();
    let err = service().open(&mut doc, &reader).unwrap_err();
    assert_eq!(err.to_string(), messages::BAD_CERTIFICATE_AND_KEY);

    let err = service().open(&mut doc, &ReaderProperties::default()).unwrap_err();
    assert_eq!(err.to_string(), messages::CERTIFICATE_NOT_PROVIDED);
    assert!(doc.is_encrypted());
}

#[test]
fn ecdsa_certificate_is_refused() {
    let (mut doc, _) = one_page_document("1.7", TEXT);
    let properties = for_recipients(
        vec![Recipient::new(ECDSA_CERT.to_vec(), Permissions::all())],
        EncryptionAlgorithm::Aes256,
    );

    let err = service().save(&mut doc, &properties, None, FRESH).unwrap_err();
    assert!(matches!(&err, Error::UnsupportedAlgorithm(oid) if oid == "1.2.840.10045.2.1"));
    assert_eq!(err.to_string(), "algorithm 1.2.840.10045.2.1 is not supported");
    assert!(!doc.is_encrypted());
}

#[test]
fn fips_provider_refuses_public_key_encryption() {
    let fips = DocumentEncryptionService::new(Arc::new(FipsCryptoProvider));

    // The FIPS restriction wins over the unsupported ECDSA key.
    let (mut doc, _) = one_page_document("1.7", TEXT);
    let properties = for_recipients(
        vec![Recipient::new(ECDSA_CERT.to_vec(), Permissions::all())],
        EncryptionAlgorithm::Aes256,
    );
    let err = fips.save(&mut doc, &properties, None, FRESH).unwrap_err();
    assert_eq!(err.to_string(), messages::UNSUPPORTED_IN_FIPS_MODE);

    // Reading is refused as well.
    let recipients = vec![Recipient::new(ALICE_CERT.to_vec(), Permissions::all())];
    service().save(&mut doc, &for_recipients(recipients, EncryptionAlgorithm::Aes128), None, FRESH).unwrap();

    let reader = ReaderProperties::builder().public_key_security(ALICE_CERT, ALICE_KEY).build();
    let err = fips.open(&mut doc, &reader).unwrap_err();
    assert!(matches!(err, Error::UnsupportedInFipsMode));

    // Password based encryption still works, with a warning about MD5.
    let (mut doc, content_id) = one_page_document("1.7", TEXT);
    let properties = WriterProperties::builder()
        .standard_encryption("user", "owner", Permissions::all(), EncryptionAlgorithm::Aes128)
        .build();
    fips.save(&mut doc, &properties, None, FRESH).unwrap();
    fips.open(&mut doc, &ReaderProperties::builder().password("user").build()).unwrap();
    assert_eq!(shown_text(&doc, content_id), TEXT);
}
