//! In-memory PDF object model.
//!
//! [`Value`] is the recursive direct-object type, [`ObjectBody`] is what an
//! indirect object holds, and [`ObjectStore`] owns every indirect object of
//! a document under its assigned number.

mod store;

pub use store::ObjectStore;

use indexmap::IndexMap;
use std::fmt;

/// Number of an indirect object. Object 0 is the xref free-list head and is
/// never assigned.
pub type ObjectNumber = u32;

/// A PDF name, stored without the leading slash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(Vec<u8>);

impl Name {
    /// Create a name from raw bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Raw bytes of the name.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl From<&[u8]> for Name {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", String::from_utf8_lossy(&self.0))
    }
}

/// How a string was written in the source, kept so copied strings round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StringFormat {
    /// `(...)`
    #[default]
    Literal,
    /// `<...>`
    Hex,
}

/// A direct PDF value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `null`
    Null,
    /// `true` / `false`
    Bool(bool),
    /// Integer number.
    Integer(i64),
    /// Real number.
    Real(f64),
    /// Byte string.
    String(Vec<u8>, StringFormat),
    /// Name object.
    Name(Name),
    /// Ordered array.
    Array(Vec<Value>),
    /// Dictionary.
    Dictionary(Dictionary),
    /// Indirect reference; the generation is always 0 in this engine.
    Reference(ObjectNumber),
}

impl Value {
    /// Shorthand for a name value.
    pub fn name(name: &str) -> Self {
        Self::Name(Name::from(name))
    }

    /// Shorthand for a literal string value.
    pub fn string(bytes: impl Into<Vec<u8>>) -> Self {
        Self::String(bytes.into(), StringFormat::Literal)
    }

    /// Referenced object number, if this is a reference.
    pub fn as_reference(&self) -> Option<ObjectNumber> {
        match self {
            Self::Reference(number) => Some(*number),
            _ => None,
        }
    }

    /// Integer value, if this is an integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric value of an integer or real.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(n) => Some(*n as f64),
            Self::Real(r) => Some(*r),
            _ => None,
        }
    }

    /// Name bytes, if this is a name.
    pub fn as_name(&self) -> Option<&[u8]> {
        match self {
            Self::Name(name) => Some(name.as_bytes()),
            _ => None,
        }
    }

    /// Borrow as a dictionary.
    pub fn as_dict(&self) -> Option<&Dictionary> {
        match self {
            Self::Dictionary(dict) => Some(dict),
            _ => None,
        }
    }

    /// Borrow as an array.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(r: f64) -> Self {
        Self::Real(r)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Name> for Value {
    fn from(name: Name) -> Self {
        Self::Name(name)
    }
}

impl From<Dictionary> for Value {
    fn from(dict: Dictionary) -> Self {
        Self::Dictionary(dict)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::Array(items)
    }
}

/// Insertion-ordered PDF dictionary.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dictionary(IndexMap<Name, Value>);

impl Dictionary {
    /// Create an empty dictionary.
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Look up a key.
    pub fn get(&self, key: &[u8]) -> Option<&Value> {
        self.0.get(key)
    }

    /// Look up a key mutably.
    pub fn get_mut(&mut self, key: &[u8]) -> Option<&mut Value> {
        self.0.get_mut(key)
    }

    /// Insert or overwrite a key, keeping the original position of an existing key.
    pub fn set(&mut self, key: impl Into<Name>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Remove a key, preserving the order of the remaining entries.
    pub fn remove(&mut self, key: &[u8]) -> Option<Value> {
        self.0.shift_remove(key)
    }

    /// Whether the key is present.
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.0.contains_key(key)
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Name, &Value)> {
        self.0.iter()
    }

    /// Iterate values mutably in insertion order.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut Value> {
        self.0.values_mut()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the dictionary has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `/Type` equals the given name.
    pub fn has_type(&self, type_name: &[u8]) -> bool {
        self.get(b"Type").and_then(Value::as_name) == Some(type_name)
    }

    /// Reference stored under `key`, if any.
    pub fn get_reference(&self, key: &[u8]) -> Option<ObjectNumber> {
        self.get(key).and_then(Value::as_reference)
    }
}

impl std::borrow::Borrow<[u8]> for Name {
    fn borrow(&self) -> &[u8] {
        &self.0
    }
}

impl FromIterator<(Name, Value)> for Dictionary {
    fn from_iter<I: IntoIterator<Item = (Name, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Build a [`Dictionary`] from `"Key" => value` pairs.
#[macro_export]
macro_rules! dictionary {
    () => {
        $crate::object::Dictionary::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut dict = $crate::object::Dictionary::new();
        $(dict.set($key, $value);)+
        dict
    }};
}

/// A stream: dictionary plus raw (still encoded) payload.
///
/// `/Length` always equals `content.len()`; every constructor and mutator
/// keeps that in sync.
#[derive(Debug, Clone, PartialEq)]
pub struct Stream {
    dict: Dictionary,
    content: Vec<u8>,
}

impl Stream {
    /// Create a stream, overwriting any `/Length` in `dict` with the payload length.
    pub fn new(mut dict: Dictionary, content: Vec<u8>) -> Self {
        dict.set("Length", content.len() as i64);
        Self { dict, content }
    }

    /// Stream dictionary.
    pub fn dict(&self) -> &Dictionary {
        &self.dict
    }

    /// Raw payload bytes.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Mutate the dictionary. `/Length` is restored afterwards.
    pub fn update_dict(&mut self, f: impl FnOnce(&mut Dictionary)) {
        f(&mut self.dict);
        self.dict.set("Length", self.content.len() as i64);
    }

    /// Split into dictionary and payload.
    pub fn into_parts(self) -> (Dictionary, Vec<u8>) {
        (self.dict, self.content)
    }
}

/// Body of an indirect object.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectBody {
    /// Dictionary object.
    Dictionary(Dictionary),
    /// Array object.
    Array(Vec<Value>),
    /// Stream object.
    Stream(Stream),
    /// An indirect object whose whole value is a reference.
    Reference(ObjectNumber),
    /// Scalar indirect object (number, string, name, bool or null).
    Primitive(Value),
}

impl ObjectBody {
    /// Borrow the dictionary of a dictionary or stream object.
    pub fn as_dict(&self) -> Option<&Dictionary> {
        match self {
            Self::Dictionary(dict) => Some(dict),
            Self::Stream(stream) => Some(stream.dict()),
            _ => None,
        }
    }

    /// Borrow as a stream.
    pub fn as_stream(&self) -> Option<&Stream> {
        match self {
            Self::Stream(stream) => Some(stream),
            _ => None,
        }
    }

    /// Convert a non-stream body back into a direct value.
    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Dictionary(dict) => Some(Value::Dictionary(dict)),
            Self::Array(items) => Some(Value::Array(items)),
            Self::Reference(number) => Some(Value::Reference(number)),
            Self::Primitive(value) => Some(value),
            Self::Stream(_) => None,
        }
    }
}

impl From<Value> for ObjectBody {
    fn from(value: Value) -> Self {
        match value {
            Value::Dictionary(dict) => Self::Dictionary(dict),
            Value::Array(items) => Self::Array(items),
            Value::Reference(number) => Self::Reference(number),
            other => Self::Primitive(other),
        }
    }
}

impl From<Dictionary> for ObjectBody {
    fn from(dict: Dictionary) -> Self {
        Self::Dictionary(dict)
    }
}

impl From<Stream> for ObjectBody {
    fn from(stream: Stream) -> Self {
        Self::Stream(stream)
    }
}

/// An object registered in an [`ObjectStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct IndirectObject {
    /// Assigned object number.
    pub number: ObjectNumber,
    /// Generation number; always 0.
    pub generation: u16,
    /// Object content.
    pub body: ObjectBody,
}
