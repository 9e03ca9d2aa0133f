// ============================================================================
// spark-entities - Data Service
// The transport seam between a data store and a backend
// ============================================================================

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entity::id::Id;
use crate::entity::model::Entity;
use crate::error::DataError;

/// Query parameters passed to `DataService::get`, ordered by name.
pub type QueryParams = BTreeMap<String, QueryValue>;

/// A single query parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    List(Vec<QueryValue>),
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::String(value.to_owned())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::String(value)
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        QueryValue::Bool(value)
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        QueryValue::Number(value.into())
    }
}

impl From<i32> for QueryValue {
    fn from(value: i32) -> Self {
        QueryValue::Number(value.into())
    }
}

impl<T: Into<QueryValue>> From<Vec<T>> for QueryValue {
    fn from(values: Vec<T>) -> Self {
        QueryValue::List(values.into_iter().map(Into::into).collect())
    }
}

/// What a load request returned.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadResponse<E> {
    /// A list of entities; the default handler replaces the collection.
    Entities(Vec<E>),
    /// Anything else, such as a paginated envelope. Needs a `load_success`
    /// override to be useful.
    Other(serde_json::Value),
}

impl<E: for<'de> Deserialize<'de>> LoadResponse<E> {
    /// Decode a response body: a JSON array becomes `Entities`, anything else
    /// is kept as `Other`.
    pub fn from_json(value: serde_json::Value) -> Result<Self, DataError> {
        match value {
            serde_json::Value::Array(_) => Ok(LoadResponse::Entities(serde_json::from_value(value)?)),
            other => Ok(LoadResponse::Other(other)),
        }
    }
}

/// What a delete request returned.
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteResponse<E> {
    Entity(E),
    Id(Id),
    Empty,
}

/// Backend access for a `DataStore`.
///
/// Calls are synchronous; an implementation backed by a network client blocks
/// or answers from a local cache. Errors are handed to the store's error
/// effects rather than returned to the caller.
pub trait DataService<E: Entity> {
    fn get(&self, params: Option<&QueryParams>) -> Result<LoadResponse<E>, DataError>;

    fn get_by_id(&self, id: &Id) -> Result<E, DataError>;

    fn create(&self, entity: &E::Changes) -> Result<E, DataError>;

    fn update(&self, id: &Id, changes: &E::Changes) -> Result<E, DataError>;

    fn delete(&self, id: &Id) -> Result<DeleteResponse<E>, DataError>;
}

// =============================================================================
// TESTS
// =============================================================================
