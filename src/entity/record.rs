// ============================================================================
// spark-entities - Record
// A dynamic, JSON-shaped entity for collections without a Rust struct
// ============================================================================

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::id::{Id, Identified};
use super::model::Entity;

/// An entity made of named JSON fields.
///
/// Merging (partial or whole) overwrites field by field; fields the incoming
/// value does not carry are kept. The id is the `id` field when it holds a
/// string or an integer.
///
/// ```
/// use spark_entities::{Identified, Id, Record};
///
/// let record = Record::new().with("id", 7).with("name", "Ada");
/// assert_eq!(record.id(), Some(Id::from(7)));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Builder-style field insert.
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.0.insert(field.to_string(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn insert(&mut self, field: &str, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.to_string(), value.into())
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Read a field as an id (string or integer).
    pub fn id_field(&self, field: &str) -> Option<Id> {
        match self.0.get(field)? {
            Value::String(s) => Some(Id::from(s)),
            Value::Number(n) => n.as_i64().map(Id::from),
            _ => None,
        }
    }

    fn merged(&self, changes: &Record) -> Record {
        let mut fields = self.0.clone();
        fields.extend(changes.0.iter().map(|(k, v)| (k.clone(), v.clone())));
        Record(fields)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

impl TryFrom<Value> for Record {
    type Error = serde_json::Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        serde_json::from_value(value)
    }
}

impl Identified for Record {
    fn id(&self) -> Option<Id> {
        self.id_field("id")
    }
}

impl Entity for Record {
    type Changes = Record;

    fn apply(&self, changes: &Record) -> Self {
        self.merged(changes)
    }

    fn overlay(&self, incoming: &Rc<Self>) -> Rc<Self> {
        Rc::new(self.merged(incoming))
    }
}

// =============================================================================
// TESTS
// =============================================================================
