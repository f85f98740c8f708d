use bitflags::bitflags;
use super::revision::EncryptionRevision;

bitflags! {
    /// User access permissions stored in the `/P` entry. Bits are numbered from 1 in ISO 32000, so
    /// bit 3 of the standard is `1 << 2` here.
    #[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
    pub struct Permissions: u32 {
        /// (Security handlers of revision 2) Print the document.
        /// (Security handlers of revision 3 or greater) Print the document (possibly not at the
        /// highest quality level, depending on whether [`Permissions::PRINTABLE_IN_HIGH_QUALITY`]
        /// is also set).
        const PRINTABLE = 1 << 2;

        /// Modify the contents of the document by operations other than those controlled by
        /// [`Permissions::ANNOTABLE`], [`Permissions::FILLABLE`] and [`Permissions::ASSEMBLABLE`].
        const MODIFIABLE = 1 << 3;

        /// Copy or otherwise extract text and graphics from the document.
        const COPYABLE = 1 << 4;

        /// Add or modify text annotations, fill in interactive form fields, and if
        /// [`Permissions::MODIFIABLE`] is also set, create or modify interactive form fields
        /// (including signature fields).
        const ANNOTABLE = 1 << 5;

        /// Fill in existing interactive fields (including signature fields), even if
        /// [`Permissions::ANNOTABLE`] is clear.
        const FILLABLE = 1 << 8;

        /// Copy or otherwise extract text and graphics from the document for the purpose of
        /// providing this content to assistive technology.
        ///
        /// Deprecated since PDF 2.0: must always be set for backward compatibility with PDF
        /// viewers following earlier specifications.
        const COPYABLE_FOR_ACCESSIBILITY = 1 << 9;

        /// (Security handlers of revision 3 or greater) Assemble the document (insert, rotate, or
        /// delete pages and create document outline items or thumbnail images), even if
        /// [`Permissions::MODIFIABLE`] is not set.
        const ASSEMBLABLE = 1 << 10;

        /// (Security handlers of revision 3 or greater) Print the document to a representation
        /// from which a faithful copy of the PDF content could be generated. When this bit is
        /// clear (and [`Permissions::PRINTABLE`] is set), printing shall be limited to a
        /// low-level representation of the appearance, possibly of degraded quality.
        const PRINTABLE_IN_HIGH_QUALITY = 1 << 11;
    }
}

// Bits 7-32: reserved, must be 1 for revision 2.
const RESERVED_R2: u32 = 0xffff_ffc0;
// Bits 7-8 and 13-32: reserved, must be 1 for revision 3 or greater.
const RESERVED_R3: u32 = 0xffff_f0c0;

impl Permissions {
    /// The `/P` value for the given revision.
    ///
    /// Bits 1-2 are always 0. Revision 2 only knows bits 3-6; the reserved bits are set to 1.
    pub fn p_value(&self, revision: EncryptionRevision) -> i32 {
        let bits = match revision {
            EncryptionRevision::R2 => (self.bits() & 0x3c) | RESERVED_R2,
            _ => self.bits() | RESERVED_R3,
        };

        bits as i32
    }

    /// Interprets a `/P` value written for `revision`, ignoring reserved bits.
    ///
    /// Revision 2 sets bits 7-32 to 1, so only bits 3-6 carry permissions there.
    pub fn from_p_value(p: i64, revision: EncryptionRevision) -> Self {
        let bits = match revision {
            EncryptionRevision::R2 => p as u32 & 0x3c,
            _ => p as u32,
        };

        Self::from_bits_truncate(bits)
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Self::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_bits_are_forced() {
        assert_eq!(Permissions::empty().p_value(EncryptionRevision::R3), 0xffff_f0c0_u32 as i32);
        assert_eq!(Permissions::empty().p_value(EncryptionRevision::R2), -64);

        // The revision 3 bits do not exist in revision 2.
        assert_eq!(Permissions::all().p_value(EncryptionRevision::R2), -4);
        assert_eq!(Permissions::all().p_value(EncryptionRevision::R6), -4);

        assert_eq!(
            (Permissions::PRINTABLE | Permissions::COPYABLE_FOR_ACCESSIBILITY).p_value(EncryptionRevision::R4),
            -3388
        );
    }

    #[test]
    fn p_value_is_parsed_back() {
        let permissions = Permissions::PRINTABLE | Permissions::FILLABLE;
        let p = permissions.p_value(EncryptionRevision::R6);
        assert_eq!(Permissions::from_p_value(p as i64, EncryptionRevision::R6), permissions);
        assert_eq!(Permissions::from_p_value(-3904, EncryptionRevision::R3), Permissions::empty());
    }

    #[test]
    fn revision_2_reserved_bits_grant_nothing() {
        let cleared = Permissions::empty().p_value(EncryptionRevision::R2);
        assert_eq!(cleared, -64);
        assert_eq!(Permissions::from_p_value(cleared as i64, EncryptionRevision::R2), Permissions::empty());

        // Bits 9-12 are reserved in revision 2 and always set.
        let p = (Permissions::PRINTABLE | Permissions::COPYABLE).p_value(EncryptionRevision::R2);
        assert_eq!(
            Permissions::from_p_value(p as i64, EncryptionRevision::R2),
            Permissions::PRINTABLE | Permissions::COPYABLE
        );

        // The same value read as revision 3 would grant them.
        assert!(Permissions::from_p_value(p as i64, EncryptionRevision::R3).contains(Permissions::FILLABLE));
    }
}
