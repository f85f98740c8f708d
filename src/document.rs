use crate::{Dictionary, Error, Object, ObjectId, Result};
use std::collections::BTreeMap;

/// In-memory PDF document: the objects and trailer the encryption engine works on.
///
/// Parsing and serializing the file itself is left to the caller.
#[derive(Debug, Clone, Default)]
pub struct Document {
    /// The version of the PDF specification to which the file conforms.
    pub version: String,

    /// The trailer gives the location of the cross-reference table and of certain special objects.
    pub trailer: Dictionary,

    /// The objects that make up the document contained in the file.
    pub objects: BTreeMap<ObjectId, Object>,

    /// maximum object id
    pub max_id: u32,
}

impl Document {
    pub fn new() -> Document {
        Document::with_version("1.7")
    }

    pub fn with_version<S: Into<String>>(version: S) -> Document {
        Document {
            version: version.into(),
            trailer: Dictionary::new(),
            objects: BTreeMap::new(),
            max_id: 0,
        }
    }

    pub fn new_object_id(&mut self) -> ObjectId {
        self.max_id += 1;
        (self.max_id, 0)
    }

    pub fn add_object<T: Into<Object>>(&mut self, object: T) -> ObjectId {
        let id = self.new_object_id();
        self.objects.insert(id, object.into());
        id
    }

    pub fn set_object<T: Into<Object>>(&mut self, id: ObjectId, object: T) {
        self.max_id = self.max_id.max(id.0);
        self.objects.insert(id, object.into());
    }

    pub fn get_object(&self, id: ObjectId) -> Result<&Object> {
        self.objects.get(&id).ok_or_else(|| Error::DictKey(format!("{} {} R", id.0, id.1)))
    }

    pub fn get_object_mut(&mut self, id: ObjectId) -> Result<&mut Object> {
        self.objects
            .get_mut(&id)
            .ok_or_else(|| Error::DictKey(format!("{} {} R", id.0, id.1)))
    }

    /// Follow a reference one level to the object it points to.
    pub fn dereference<'a>(&'a self, object: &'a Object) -> Result<&'a Object> {
        match object {
            Object::Reference(id) => self.get_object(*id),
            _ => Ok(object),
        }
    }

    /// Whether the trailer points to an encryption dictionary.
    pub fn is_encrypted(&self) -> bool {
        self.trailer.has(b"Encrypt")
    }

    /// Returns the `/Encrypt` dictionary, resolving an indirect reference.
    pub fn get_encrypted(&self) -> Result<&Dictionary> {
        self.dereference(self.trailer.get(b"Encrypt")?)?.as_dict()
    }

    /// Returns the first element of the file identifier array.
    pub fn file_id(&self) -> Option<&[u8]> {
        self.trailer
            .get(b"ID")
            .and_then(Object::as_array)
            .ok()?
            .first()?
            .as_str()
            .ok()
    }

    /// Parses the major and minor number of `version`, e.g. `"1.7"` or `"2.0"`.
    pub fn pdf_version(&self) -> Option<(u8, u8)> {
        let (major, minor) = self.version.split_once('.')?;
        Some((major.trim().parse().ok()?, minor.trim().parse().ok()?))
    }
}
