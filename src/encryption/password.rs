use crate::Result;
use log::warn;

/// Maximum length in bytes of a revision 5/6 password.
pub const MAX_PASSWORD_LEN: usize = 127;

// If the password string is less than 32 bytes long, pad it by appending the required number of
// additional bytes from the beginning of the following padding string.
pub(crate) const PAD_BYTES: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01, 0x08, 0x2E, 0x2E, 0x00,
    0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53, 0x69, 0x7A,
];

/// Pad or truncate a password to exactly 32 bytes (revision 4 and earlier).
///
/// If the password is n bytes long, the first 32 - n bytes of the padding string are appended.
/// An empty password becomes the padding string itself.
pub fn pad_password(password: &[u8]) -> [u8; 32] {
    let len = password.len().min(32);

    let mut padded = [0u8; 32];
    padded[..len].copy_from_slice(&password[..len]);
    padded[len..].copy_from_slice(&PAD_BYTES[..32 - len]);
    padded
}

/// Prepare a password for revision 6 key derivation.
///
/// The UTF-8 password string shall be generated from Unicode input by processing the input
/// with the SASLprep (Internet RFC 4013) profile of stringprep (Internet RFC 3454) using the
/// Normalize and BiDi options, and then converting to a UTF-8 representation. The result is
/// truncated to 127 bytes.
///
/// Code points that are both "commonly mapped to nothing" (RFC 3454 B.1) and non-ASCII spaces
/// (C.1.2), such as U+200B ZERO WIDTH SPACE, are removed rather than turned into a space.
pub fn prepare_password(password: &str) -> Result<Vec<u8>> {
    let stripped: String = password
        .chars()
        .filter(|&c| !stringprep::tables::commonly_mapped_to_nothing(c))
        .collect();

    let prepared = stringprep::saslprep(&stripped)?;
    Ok(truncate(prepared.as_bytes()).to_vec())
}

/// Prepare a password, falling back to the raw bytes when SASLprep rejects it.
///
/// Passwords which are not valid UTF-8 or which contain prohibited, unassigned or badly
/// ordered bidirectional characters are used as given (truncated to 127 bytes), which is what
/// writers without a stringprep implementation produce.
pub fn prepare_password_lossy(password: &[u8]) -> Vec<u8> {
    let prepared = std::str::from_utf8(password)
        .map_err(|_| "not valid UTF-8".to_string())
        .and_then(|password| prepare_password(password).map_err(|err| err.to_string()));

    match prepared {
        Ok(prepared) => prepared,
        Err(reason) => {
            warn!("password cannot be prepared with SASLprep ({reason}); using the raw bytes");
            truncate(password).to_vec()
        }
    }
}

/// Candidate byte strings to try when authenticating a revision 5/6 password.
///
/// The prepared form comes first; the raw bytes follow if they differ.
pub(crate) fn password_candidates(password: &[u8]) -> Vec<Vec<u8>> {
    let prepared = prepare_password_lossy(password);
    let raw = truncate(password);

    if prepared.as_slice() == raw {
        vec![prepared]
    } else {
        vec![prepared, raw.to_vec()]
    }
}

fn truncate(password: &[u8]) -> &[u8] {
    &password[..password.len().min(MAX_PASSWORD_LEN)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pad_short_and_long() {
        assert_eq!(pad_password(b""), PAD_BYTES);

        let padded = pad_password(b"user");
        assert_eq!(&padded[..4], b"user");
        assert_eq!(&padded[4..], &PAD_BYTES[..28]);

        let long = [b'x'; 40];
        assert_eq!(pad_password(&long), [b'x'; 32]);
    }

    #[test]
    fn prepared_password_is_truncated() {
        let password = "a".repeat(200);
        assert_eq!(prepare_password(&password).unwrap().len(), MAX_PASSWORD_LEN);
    }

    #[test]
    fn zero_width_space_maps_to_nothing() {
        assert_eq!(prepare_password("\u{200B}x").unwrap(), b"x");
        assert_eq!(prepare_password("a\u{200B}b\u{2060}c").unwrap(), b"abc");
        // A real space of C.1.2 is still mapped to U+0020.
        assert_eq!(prepare_password("a\u{3000}b").unwrap(), b"a b");
    }

    #[test]
    fn prohibited_character_is_rejected() {
        // U+0007 BELL is a prohibited ASCII control character.
        assert!(prepare_password("\u{0007}").is_err());
        // A string mixing left-to-right and right-to-left characters violates the bidi rule.
        assert!(prepare_password("\u{0627}1").is_err());
    }

    #[test]
    fn lossy_preparation_falls_back_to_raw_bytes() {
        assert_eq!(prepare_password_lossy(b"\x07bell"), b"\x07bell");
        assert_eq!(prepare_password_lossy(&[0xff, 0xfe]), vec![0xff, 0xfe]);
        assert_eq!(prepare_password_lossy("I\u{00AD}X".as_bytes()), b"IX");
    }

    #[test]
    fn candidates_include_raw_form_once() {
        assert_eq!(password_candidates(b"user"), vec![b"user".to_vec()]);
        assert_eq!(
            password_candidates("\u{00AA}".as_bytes()),
            vec![b"a".to_vec(), "\u{00AA}".as_bytes().to_vec()]
        );
    }
}
