// ============================================================================
// spark-entities - Entity Model
// The entity trait, update descriptors and the mutation result protocol
// ============================================================================

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use super::id::Id;

// =============================================================================
// ENTITY
// =============================================================================

/// A record stored in an entity collection.
///
/// Entities are immutable values: updates build a new entity from the stored
/// one. `Changes` is the partial form accepted by `update_one`/`update_many`.
///
/// # Example
///
/// ```
/// use spark_entities::Entity;
///
/// #[derive(Debug, Clone)]
/// struct Product {
///     id: u32,
///     name: String,
/// }
///
/// #[derive(Debug, Default)]
/// struct ProductChanges {
///     name: Option<String>,
/// }
///
/// impl Entity for Product {
///     type Changes = ProductChanges;
///
///     fn apply(&self, changes: &ProductChanges) -> Self {
///         Product {
///             id: self.id,
///             name: changes.name.clone().unwrap_or_else(|| self.name.clone()),
///         }
///     }
/// }
/// ```
pub trait Entity: fmt::Debug + Sized + 'static {
    /// Partial changes that can be merged onto an entity.
    type Changes;

    /// Merge partial changes onto a copy of this entity.
    fn apply(&self, changes: &Self::Changes) -> Self;

    /// Merge a whole entity onto this one.
    ///
    /// Used when an existing entity is upserted or mapped. The default keeps
    /// the incoming entity as is; record-like types override it to keep fields
    /// the incoming value does not carry.
    fn overlay(&self, incoming: &Rc<Self>) -> Rc<Self> {
        Rc::clone(incoming)
    }
}

// =============================================================================
// UPDATE DESCRIPTORS
// =============================================================================

/// Changes carried by an `Update`.
pub enum Changes<E: Entity> {
    /// Merge partial changes via `Entity::apply`.
    Partial(E::Changes),
    /// Merge a whole entity via `Entity::overlay`.
    Whole(Rc<E>),
}

impl<E: Entity> Changes<E> {
    /// Produce the merged entity.
    pub fn merge_onto(&self, original: &Rc<E>) -> Rc<E> {
        match self {
            Changes::Partial(changes) => Rc::new(original.apply(changes)),
            Changes::Whole(incoming) => original.overlay(incoming),
        }
    }
}

impl<E> fmt::Debug for Changes<E>
where
    E: Entity,
    E::Changes: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Changes::Partial(changes) => f.debug_tuple("Partial").field(changes).finish(),
            Changes::Whole(entity) => f.debug_tuple("Whole").field(entity).finish(),
        }
    }
}

/// A request to merge changes onto the entity stored at `id`.
///
/// If the merged entity resolves to a different id, the entity moves to the
/// new key.
pub struct Update<E: Entity> {
    pub id: Id,
    pub changes: Changes<E>,
}

impl<E: Entity> Update<E> {
    pub fn new(id: impl Into<Id>, changes: E::Changes) -> Self {
        Self {
            id: id.into(),
            changes: Changes::Partial(changes),
        }
    }

    /// An update whose changes are a whole entity.
    pub fn whole(id: impl Into<Id>, entity: impl Into<Rc<E>>) -> Self {
        Self {
            id: id.into(),
            changes: Changes::Whole(entity.into()),
        }
    }
}

impl<E> fmt::Debug for Update<E>
where
    E: Entity,
    E::Changes: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Update")
            .field("id", &self.id)
            .field("changes", &self.changes)
            .finish()
    }
}

// =============================================================================
// CALLER-SUPPLIED FUNCTIONS
// =============================================================================

/// Total order over entities kept by the sorted adapter.
pub type SortComparer<E> = Rc<dyn Fn(&E, &E) -> Ordering>;

/// Maps an entity. Returning the same `Rc` means "unchanged".
pub type EntityMap<'a, E> = dyn Fn(&Rc<E>) -> Rc<E> + 'a;

/// Selects entities by predicate.
pub type Predicate<'a, E> = dyn Fn(&E) -> bool + 'a;

/// Wrap a comparator closure as a `SortComparer`.
pub fn sort_comparer<E, F>(compare: F) -> SortComparer<E>
where
    F: Fn(&E, &E) -> Ordering + 'static,
{
    Rc::new(compare)
}

// =============================================================================
// MUTATION RESULT
// =============================================================================

/// Which parts of a collection a structural mutation changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MutationResult {
    /// Nothing changed; the original collection is returned.
    None,
    /// The entity dictionary changed, `ids` did not.
    EntitiesOnly,
    /// Both the dictionary and `ids` changed.
    Both,
}

impl MutationResult {
    fn rank(self) -> u8 {
        match self {
            MutationResult::None => 0,
            MutationResult::EntitiesOnly => 1,
            MutationResult::Both => 2,
        }
    }

    /// The stronger of two results.
    pub fn combine(self, other: MutationResult) -> MutationResult {
        if other.rank() > self.rank() { other } else { self }
    }

    /// Fold a sequence of results with `combine`.
    pub fn combine_all(results: impl IntoIterator<Item = MutationResult>) -> MutationResult {
        results
            .into_iter()
            .fold(MutationResult::None, MutationResult::combine)
    }

    pub fn changed(self) -> bool {
        self != MutationResult::None
    }

    pub fn ids_changed(self) -> bool {
        self == MutationResult::Both
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine_prefers_both() {
        assert_eq!(
            MutationResult::EntitiesOnly.combine(MutationResult::Both),
            MutationResult::Both
        );
        assert_eq!(
            MutationResult::Both.combine(MutationResult::None),
            MutationResult::Both
        );
        assert_eq!(
            MutationResult::None.combine(MutationResult::EntitiesOnly),
            MutationResult::EntitiesOnly
        );
    }

    #[test]
    fn combine_all_of_nothing_is_none() {
        assert_eq!(MutationResult::combine_all([]), MutationResult::None);
        assert_eq!(
            MutationResult::combine_all([
                MutationResult::None,
                MutationResult::EntitiesOnly,
                MutationResult::None,
            ]),
            MutationResult::EntitiesOnly
        );
    }

    #[test]
    fn flags() {
        assert!(!MutationResult::None.changed());
        assert!(MutationResult::EntitiesOnly.changed());
        assert!(!MutationResult::EntitiesOnly.ids_changed());
        assert!(MutationResult::Both.ids_changed());
    }
}
