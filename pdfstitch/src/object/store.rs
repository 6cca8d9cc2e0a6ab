use crate::error::{PdfStitchError, Result};
use crate::object::{IndirectObject, ObjectBody, ObjectNumber, Value};

/// Append-only owner of a document's indirect objects.
///
/// Numbers are handed out monotonically starting at 1 and are never reused
/// or removed, so a number returned to a caller stays valid for the
/// lifetime of the store. Objects are kept in a `Vec` indexed by
/// `number - 1`, which also makes ascending-number iteration free.
#[derive(Debug, Clone, Default)]
pub struct ObjectStore {
    objects: Vec<IndirectObject>,
}

impl ObjectStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `body` under the next unused object number and return it.
    pub fn register(&mut self, body: impl Into<ObjectBody>) -> ObjectNumber {
        let number = self.next_number();
        self.objects.push(IndirectObject {
            number,
            generation: 0,
            body: body.into(),
        });
        number
    }

    /// Register a `null` placeholder to be patched later with [`replace`](Self::replace).
    pub fn reserve(&mut self) -> ObjectNumber {
        self.register(ObjectBody::Primitive(Value::Null))
    }

    /// Number the next [`register`](Self::register) call will return.
    pub fn next_number(&self) -> ObjectNumber {
        self.objects.len() as ObjectNumber + 1
    }

    /// Body of a registered object.
    pub fn get(&self, number: ObjectNumber) -> Result<&ObjectBody> {
        self.slot(number).map(|object| &object.body)
    }

    /// Overwrite the body of an already registered object.
    pub fn replace(&mut self, number: ObjectNumber, body: impl Into<ObjectBody>) -> Result<()> {
        let index = self.index_of(number)?;
        self.objects[index].body = body.into();
        Ok(())
    }

    /// Number of registered objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether nothing has been registered yet.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Iterate objects in ascending number order.
    pub fn iter(&self) -> impl Iterator<Item = &IndirectObject> {
        self.objects.iter()
    }

    fn slot(&self, number: ObjectNumber) -> Result<&IndirectObject> {
        let index = self.index_of(number)?;
        Ok(&self.objects[index])
    }

    fn index_of(&self, number: ObjectNumber) -> Result<usize> {
        let index = (number as usize)
            .checked_sub(1)
            .filter(|index| *index < self.objects.len())
            .ok_or(PdfStitchError::ObjectNotFound { number })?;
        Ok(index)
    }
}
