// ============================================================================
// spark-entities - Data Effects
// Overrides for the request lifecycle of a data store
// ============================================================================
//
// Each data store operation has three hooks:
//
//   *_start    runs after the pending flag is raised, before the request
//   *_success  replaces the default updater
//   *_error    handles a failed request; falls back to `error`
//
// Hooks receive the entity store so they can write to it directly.
// ============================================================================

use std::fmt;

use crate::entity::id::Id;
use crate::entity::model::Entity;
use crate::error::DataError;
use crate::store::entity_store::EntityStore;

use super::service::{DeleteResponse, LoadResponse, QueryParams};

pub(crate) type ErrorHook<S, E> = Box<dyn Fn(&EntityStore<S, E>, &DataError)>;
type IdHook<S, E> = Box<dyn Fn(&EntityStore<S, E>, &Id)>;
type EntityHook<S, E> = Box<dyn Fn(&EntityStore<S, E>, E)>;
type ChangesHook<S, E> = Box<dyn Fn(&EntityStore<S, E>, &<E as Entity>::Changes)>;

/// Overridden lifecycle hooks of a `DataStore`.
///
/// ```
/// use spark_entities::data::DataEffects;
/// use spark_entities::{DataState, Record};
///
/// let effects = DataEffects::<DataState<Record>, Record>::new()
///     .load_start(|_, params| tracing::info!(?params, "loading"))
///     .error(|_, err| tracing::error!(%err, "request failed"));
/// assert!(effects.is_overridden("load_start"));
/// assert!(!effects.is_overridden("load_success"));
/// ```
pub struct DataEffects<S, E: Entity> {
    pub(crate) load_start: Option<Box<dyn Fn(&EntityStore<S, E>, Option<&QueryParams>)>>,
    pub(crate) load_success: Option<Box<dyn Fn(&EntityStore<S, E>, LoadResponse<E>)>>,
    pub(crate) load_error: Option<ErrorHook<S, E>>,

    pub(crate) load_by_id_start: Option<IdHook<S, E>>,
    pub(crate) load_by_id_success: Option<EntityHook<S, E>>,
    pub(crate) load_by_id_error: Option<ErrorHook<S, E>>,

    pub(crate) create_start: Option<ChangesHook<S, E>>,
    pub(crate) create_success: Option<EntityHook<S, E>>,
    pub(crate) create_error: Option<ErrorHook<S, E>>,

    pub(crate) update_start: Option<Box<dyn Fn(&EntityStore<S, E>, &Id, &E::Changes)>>,
    pub(crate) update_success: Option<EntityHook<S, E>>,
    pub(crate) update_error: Option<ErrorHook<S, E>>,

    pub(crate) delete_start: Option<IdHook<S, E>>,
    pub(crate) delete_success: Option<Box<dyn Fn(&EntityStore<S, E>, DeleteResponse<E>)>>,
    pub(crate) delete_error: Option<ErrorHook<S, E>>,

    pub(crate) error: Option<ErrorHook<S, E>>,
}

impl<S, E: Entity> DataEffects<S, E> {
    /// No overrides: every operation uses its default behavior.
    pub fn new() -> Self {
        Self {
            load_start: None,
            load_success: None,
            load_error: None,
            load_by_id_start: None,
            load_by_id_success: None,
            load_by_id_error: None,
            create_start: None,
            create_success: None,
            create_error: None,
            update_start: None,
            update_success: None,
            update_error: None,
            delete_start: None,
            delete_success: None,
            delete_error: None,
            error: None,
        }
    }

    // =========================================================================
    // LOAD
    // =========================================================================

    pub fn load_start(mut self, f: impl Fn(&EntityStore<S, E>, Option<&QueryParams>) + 'static) -> Self {
        self.load_start = Some(Box::new(f));
        self
    }

    /// Replaces the default `set_all`. Also the only way to handle a load
    /// response that is not a list.
    pub fn load_success(mut self, f: impl Fn(&EntityStore<S, E>, LoadResponse<E>) + 'static) -> Self {
        self.load_success = Some(Box::new(f));
        self
    }

    pub fn load_error(mut self, f: impl Fn(&EntityStore<S, E>, &DataError) + 'static) -> Self {
        self.load_error = Some(Box::new(f));
        self
    }

    // =========================================================================
    // LOAD BY ID
    // =========================================================================

    pub fn load_by_id_start(mut self, f: impl Fn(&EntityStore<S, E>, &Id) + 'static) -> Self {
        self.load_by_id_start = Some(Box::new(f));
        self
    }

    pub fn load_by_id_success(mut self, f: impl Fn(&EntityStore<S, E>, E) + 'static) -> Self {
        self.load_by_id_success = Some(Box::new(f));
        self
    }

    pub fn load_by_id_error(mut self, f: impl Fn(&EntityStore<S, E>, &DataError) + 'static) -> Self {
        self.load_by_id_error = Some(Box::new(f));
        self
    }

    // =========================================================================
    // CREATE
    // =========================================================================

    pub fn create_start(mut self, f: impl Fn(&EntityStore<S, E>, &E::Changes) + 'static) -> Self {
        self.create_start = Some(Box::new(f));
        self
    }

    pub fn create_success(mut self, f: impl Fn(&EntityStore<S, E>, E) + 'static) -> Self {
        self.create_success = Some(Box::new(f));
        self
    }

    pub fn create_error(mut self, f: impl Fn(&EntityStore<S, E>, &DataError) + 'static) -> Self {
        self.create_error = Some(Box::new(f));
        self
    }

    // =========================================================================
    // UPDATE
    // =========================================================================

    pub fn update_start(mut self, f: impl Fn(&EntityStore<S, E>, &Id, &E::Changes) + 'static) -> Self {
        self.update_start = Some(Box::new(f));
        self
    }

    pub fn update_success(mut self, f: impl Fn(&EntityStore<S, E>, E) + 'static) -> Self {
        self.update_success = Some(Box::new(f));
        self
    }

    pub fn update_error(mut self, f: impl Fn(&EntityStore<S, E>, &DataError) + 'static) -> Self {
        self.update_error = Some(Box::new(f));
        self
    }

    // =========================================================================
    // DELETE
    // =========================================================================

    pub fn delete_start(mut self, f: impl Fn(&EntityStore<S, E>, &Id) + 'static) -> Self {
        self.delete_start = Some(Box::new(f));
        self
    }

    pub fn delete_success(mut self, f: impl Fn(&EntityStore<S, E>, DeleteResponse<E>) + 'static) -> Self {
        self.delete_success = Some(Box::new(f));
        self
    }

    pub fn delete_error(mut self, f: impl Fn(&EntityStore<S, E>, &DataError) + 'static) -> Self {
        self.delete_error = Some(Box::new(f));
        self
    }

    /// Handles failures of every operation without its own `*_error` hook.
    pub fn error(mut self, f: impl Fn(&EntityStore<S, E>, &DataError) + 'static) -> Self {
        self.error = Some(Box::new(f));
        self
    }

    // =========================================================================
    // INSPECTION
    // =========================================================================

    /// Names of the hooks that are set, in lifecycle order.
    pub fn overridden(&self) -> Vec<&'static str> {
        let hooks = [
            ("load_start", self.load_start.is_some()),
            ("load_success", self.load_success.is_some()),
            ("load_error", self.load_error.is_some()),
            ("load_by_id_start", self.load_by_id_start.is_some()),
            ("load_by_id_success", self.load_by_id_success.is_some()),
            ("load_by_id_error", self.load_by_id_error.is_some()),
            ("create_start", self.create_start.is_some()),
            ("create_success", self.create_success.is_some()),
            ("create_error", self.create_error.is_some()),
            ("update_start", self.update_start.is_some()),
            ("update_success", self.update_success.is_some()),
            ("update_error", self.update_error.is_some()),
            ("delete_start", self.delete_start.is_some()),
            ("delete_success", self.delete_success.is_some()),
            ("delete_error", self.delete_error.is_some()),
            ("error", self.error.is_some()),
        ];
        hooks
            .into_iter()
            .filter_map(|(name, set)| set.then_some(name))
            .collect()
    }

    pub fn is_overridden(&self, hook: &str) -> bool {
        self.overridden().contains(&hook)
    }

    /// Route a failed request to `specific`, then to `error`, then to the log.
    pub(crate) fn report(
        &self,
        store: &EntityStore<S, E>,
        operation: &'static str,
        specific: Option<&ErrorHook<S, E>>,
        err: &DataError,
    ) {
        match specific.or(self.error.as_ref()) {
            Some(hook) => hook(store, err),
            None => tracing::warn!(
                operation,
                error = %err,
                "data request failed and no error effect is registered"
            ),
        }
    }
}

impl<S, E: Entity> Default for DataEffects<S, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, E: Entity> fmt::Debug for DataEffects<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataEffects")
            .field("overridden", &self.overridden())
            .finish()
    }
}
