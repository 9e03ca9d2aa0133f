// ============================================================================
// spark-entities - Entity Ids
// Id values and the identity resolver
// ============================================================================

use std::fmt;
use std::num::TryFromIntError;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::model::Entity;

/// Key the undefined id is stored under.
pub const UNDEFINED_ID: &str = "undefined";

// =============================================================================
// ID
// =============================================================================

/// Unique key of an entity inside a collection: a number or a string.
///
/// `Id::Num(1)` and `Id::Str("1")` are different keys.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    Num(i64),
    Str(String),
}

impl Id {
    /// The id an entity resolves to when its resolver finds nothing.
    pub fn undefined() -> Self {
        Id::Str(UNDEFINED_ID.to_string())
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Id::Str(s) if s == UNDEFINED_ID)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Id::Str(s) => Some(s),
            Id::Num(_) => None,
        }
    }

    pub fn as_num(&self) -> Option<i64> {
        match self {
            Id::Num(n) => Some(*n),
            Id::Str(_) => None,
        }
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Num(n) => write!(f, "{n}"),
            Id::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Id {
    fn from(value: &str) -> Self {
        Id::Str(value.to_string())
    }
}

impl From<String> for Id {
    fn from(value: String) -> Self {
        Id::Str(value)
    }
}

impl From<&String> for Id {
    fn from(value: &String) -> Self {
        Id::Str(value.clone())
    }
}

impl From<i64> for Id {
    fn from(value: i64) -> Self {
        Id::Num(value)
    }
}

impl From<i32> for Id {
    fn from(value: i32) -> Self {
        Id::Num(i64::from(value))
    }
}

impl From<u32> for Id {
    fn from(value: u32) -> Self {
        Id::Num(i64::from(value))
    }
}

/// Fails for values that do not fit an `i64`.
impl TryFrom<usize> for Id {
    type Error = TryFromIntError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        i64::try_from(value).map(Id::Num)
    }
}

// =============================================================================
// IDENTIFIED - the default `id` field convention
// =============================================================================

/// Entities that expose an `id` field.
///
/// Implementing this enables the default resolver, so adapters and stores can
/// be built without supplying one.
pub trait Identified {
    fn id(&self) -> Option<Id>;
}

// =============================================================================
// SELECT ID
// =============================================================================

/// Resolves the id of an entity.
///
/// Wraps a closure returning `Option<Id>`; `None` means "undefined". The label
/// names the resolver in diagnostics and defaults to the closure's type name.
///
/// # Example
///
/// ```
/// use spark_entities::{Entity, Id, SelectId};
///
/// #[derive(Debug)]
/// struct Musician {
///     key: String,
/// }
///
/// impl Entity for Musician {
///     type Changes = ();
///     fn apply(&self, _: &()) -> Self {
///         Musician { key: self.key.clone() }
///     }
/// }
///
/// let select_id = SelectId::new(|m: &Musician| Some(Id::from(m.key.as_str())));
/// let id = select_id.resolve(&Musician { key: "7".into() });
/// assert_eq!(id, Id::from("7"));
/// ```
pub struct SelectId<E> {
    resolve: Rc<dyn Fn(&E) -> Option<Id>>,
    label: Rc<str>,
}

impl<E: Entity> SelectId<E> {
    pub fn new<F>(resolve: F) -> Self
    where
        F: Fn(&E) -> Option<Id> + 'static,
    {
        Self {
            resolve: Rc::new(resolve),
            label: Rc::from(std::any::type_name::<F>()),
        }
    }

    /// Same as `new`, with an explicit label for diagnostics.
    pub fn labeled<F>(label: &str, resolve: F) -> Self
    where
        F: Fn(&E) -> Option<Id> + 'static,
    {
        Self {
            resolve: Rc::new(resolve),
            label: Rc::from(label),
        }
    }

    /// The resolver that reads `Identified::id`.
    pub fn default_for() -> Self
    where
        E: Identified,
    {
        Self::labeled("Identified::id", |entity: &E| entity.id())
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Raw resolver output, `None` when the id is undefined.
    pub fn try_resolve(&self, entity: &E) -> Option<Id> {
        (self.resolve)(entity)
    }

    /// Resolve the id, falling back to the undefined id.
    pub fn resolve(&self, entity: &E) -> Id {
        select_id_value(entity, self)
    }
}

impl<E> Clone for SelectId<E> {
    fn clone(&self) -> Self {
        Self {
            resolve: self.resolve.clone(),
            label: self.label.clone(),
        }
    }
}

impl<E> fmt::Debug for SelectId<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectId").field("label", &self.label).finish()
    }
}

/// Resolve an entity id, warning about undefined ids in debug builds.
///
/// The entity is accepted either way and ends up stored under `"undefined"`.
pub fn select_id_value<E: Entity>(entity: &E, select_id: &SelectId<E>) -> Id {
    match select_id.try_resolve(entity) {
        Some(id) => id,
        None => {
            if cfg!(debug_assertions) {
                tracing::warn!(
                    entity = ?entity,
                    select_id = select_id.label(),
                    "the select_id implementation returned no id for this entity; \
                     you should probably provide your own select_id"
                );
            }
            Id::undefined()
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
