// ============================================================================
// spark-entities - Data Store
// Entity store backed by a data service, with pending-request tracking
// ============================================================================
//
// Every operation follows the same lifecycle:
//
//   1. raise the pending flag          (load: on/off, others: request count)
//   2. run the *_start hook
//   3. call the data service
//   4. lower the pending flag
//   5. run *_success or the default updater, or route the error
//
// Service failures never reach the caller; they go to the error hooks. The
// only error returned is `StoreError::NotInitialized`.
// ============================================================================

use std::cell::Cell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use crate::entity::adapter::EntityAdapter;
use crate::entity::id::{Id, Identified, SelectId};
use crate::entity::model::{Entity, Update};
use crate::entity::state::HasEntityState;
use crate::error::{DataError, StoreError};
use crate::primitives::selector::Selector;
use crate::store::config::EntityStoreConfig;
use crate::store::entity_store::EntityStore;
use crate::store::updaters::EntityUpdaters;

use super::effects::{DataEffects, ErrorHook};
use super::service::{DataService, LoadResponse, QueryParams};
use super::state::{HasPendingStatuses, PendingStatuses};

// =============================================================================
// CONFIG
// =============================================================================

/// Options for `DataStore::new`.
pub struct DataStoreConfig<S, E: Entity> {
    pub store: EntityStoreConfig<S, E>,
    pub data_service: Rc<dyn DataService<E>>,
    pub effects: DataEffects<S, E>,
}

impl<S, E: Entity + Identified> DataStoreConfig<S, E> {
    pub fn new(data_service: impl DataService<E> + 'static) -> Self {
        Self::with_store_config(EntityStoreConfig::new(), data_service)
    }
}

impl<S, E: Entity> DataStoreConfig<S, E> {
    pub fn with_store_config(store: EntityStoreConfig<S, E>, data_service: impl DataService<E> + 'static) -> Self {
        Self {
            store,
            data_service: Rc::new(data_service),
            effects: DataEffects::new(),
        }
    }

    pub fn with_initial_state(mut self, state: S) -> Self {
        self.store = self.store.with_initial_state(state);
        self
    }

    pub fn with_select_id(mut self, select_id: SelectId<E>) -> Self {
        self.store = self.store.with_select_id(select_id);
        self
    }

    pub fn with_sort_comparer<F>(mut self, compare: F) -> Self
    where
        F: Fn(&E, &E) -> Ordering + 'static,
    {
        self.store = self.store.with_sort_comparer(compare);
        self
    }

    pub fn with_effects(mut self, effects: DataEffects<S, E>) -> Self {
        self.effects = effects;
        self
    }
}

// =============================================================================
// REQUEST TRACKING
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Request {
    Load,
    LoadById,
    Create,
    Update,
    Delete,
}

impl Request {
    fn name(self) -> &'static str {
        match self {
            Request::Load => "load",
            Request::LoadById => "load_by_id",
            Request::Create => "create",
            Request::Update => "update",
            Request::Delete => "delete",
        }
    }

    fn flag(self, pending: &mut PendingStatuses) -> &mut bool {
        match self {
            Request::Load => &mut pending.is_load_pending,
            Request::LoadById => &mut pending.is_load_by_id_pending,
            Request::Create => &mut pending.is_create_pending,
            Request::Update => &mut pending.is_update_pending,
            Request::Delete => &mut pending.is_delete_pending,
        }
    }
}

/// In-flight request counts. Load is tracked as a plain flag.
#[derive(Debug, Default)]
struct RequestCounts {
    load_by_id: Cell<usize>,
    create: Cell<usize>,
    update: Cell<usize>,
    delete: Cell<usize>,
}

impl RequestCounts {
    /// Apply `delta` and return whether the flag should be up.
    fn track(&self, request: Request, started: bool) -> bool {
        let counter = match request {
            Request::Load => return started,
            Request::LoadById => &self.load_by_id,
            Request::Create => &self.create,
            Request::Update => &self.update,
            Request::Delete => &self.delete,
        };
        let count = if started {
            counter.get() + 1
        } else {
            counter.get().saturating_sub(1)
        };
        counter.set(count);
        count > 0
    }
}

// =============================================================================
// DATA STORE
// =============================================================================

/// An `EntityStore` whose collection is loaded from and written through a
/// `DataService`.
pub struct DataStore<S, E: Entity> {
    store: EntityStore<S, E>,
    service: Rc<dyn DataService<E>>,
    effects: Rc<DataEffects<S, E>>,
    requests: Rc<RequestCounts>,

    is_load_pending: Selector<bool>,
    is_load_by_id_pending: Selector<bool>,
    is_create_pending: Selector<bool>,
    is_update_pending: Selector<bool>,
    is_delete_pending: Selector<bool>,
    is_pending: Selector<bool>,
}

impl<S, E> DataStore<S, E>
where
    S: HasEntityState<E> + HasPendingStatuses + Clone + 'static,
    E: Entity,
{
    pub fn new(config: DataStoreConfig<S, E>) -> Self {
        let DataStoreConfig {
            store,
            data_service,
            effects,
        } = config;
        let store = EntityStore::new(store);

        tracing::debug!(effects = ?effects.overridden(), "data store created");

        Self {
            is_load_pending: store.select(|s: &S| s.pending_statuses().is_load_pending),
            is_load_by_id_pending: store.select(|s: &S| s.pending_statuses().is_load_by_id_pending),
            is_create_pending: store.select(|s: &S| s.pending_statuses().is_create_pending),
            is_update_pending: store.select(|s: &S| s.pending_statuses().is_update_pending),
            is_delete_pending: store.select(|s: &S| s.pending_statuses().is_delete_pending),
            is_pending: store.select(|s: &S| s.pending_statuses().any()),
            store,
            service: data_service,
            effects: Rc::new(effects),
            requests: Rc::new(RequestCounts::default()),
        }
    }

    /// The underlying entity store and its selectors.
    pub fn store(&self) -> &EntityStore<S, E> {
        &self.store
    }

    // =========================================================================
    // OPERATIONS
    // =========================================================================

    /// Fetch the collection. A list response replaces every entity.
    pub fn load(&self, params: Option<&QueryParams>) -> Result<(), StoreError> {
        self.begin(Request::Load)?;
        if let Some(hook) = &self.effects.load_start {
            hook(&self.store, params);
        }

        let response = self.service.get(params);
        self.end(Request::Load)?;

        match response {
            Ok(response) => match &self.effects.load_success {
                Some(hook) => hook(&self.store, response),
                None => match response {
                    LoadResponse::Entities(entities) => self.store.set_all(entities)?,
                    LoadResponse::Other(_) => tracing::error!(
                        "load request did not return a list of entities; \
                         register a load_success effect to handle this response"
                    ),
                },
            },
            Err(err) => self.fail(Request::Load, self.effects.load_error.as_ref(), &err),
        }
        Ok(())
    }

    /// Fetch one entity and insert or replace it.
    pub fn load_by_id(&self, id: impl Into<Id>) -> Result<(), StoreError> {
        let id = id.into();
        self.begin(Request::LoadById)?;
        if let Some(hook) = &self.effects.load_by_id_start {
            hook(&self.store, &id);
        }

        let response = self.service.get_by_id(&id);
        self.end(Request::LoadById)?;

        match response {
            Ok(entity) => match &self.effects.load_by_id_success {
                Some(hook) => hook(&self.store, entity),
                None => self.store.set_one(entity)?,
            },
            Err(err) => self.fail(Request::LoadById, self.effects.load_by_id_error.as_ref(), &err),
        }
        Ok(())
    }

    /// Create an entity from `entity` and add what the service returns.
    pub fn create(&self, entity: E::Changes) -> Result<(), StoreError> {
        self.begin(Request::Create)?;
        if let Some(hook) = &self.effects.create_start {
            hook(&self.store, &entity);
        }

        let response = self.service.create(&entity);
        self.end(Request::Create)?;

        match response {
            Ok(created) => match &self.effects.create_success {
                Some(hook) => hook(&self.store, created),
                None => self.store.add_one(created)?,
            },
            Err(err) => self.fail(Request::Create, self.effects.create_error.as_ref(), &err),
        }
        Ok(())
    }

    /// Send `changes` for `id` and merge the entity the service returns.
    pub fn update(&self, id: impl Into<Id>, changes: E::Changes) -> Result<(), StoreError> {
        let id = id.into();
        self.begin(Request::Update)?;
        if let Some(hook) = &self.effects.update_start {
            hook(&self.store, &id, &changes);
        }

        let response = self.service.update(&id, &changes);
        self.end(Request::Update)?;

        match response {
            Ok(updated) => match &self.effects.update_success {
                Some(hook) => hook(&self.store, updated),
                None => self.store.update_one(Update::whole(id, updated))?,
            },
            Err(err) => self.fail(Request::Update, self.effects.update_error.as_ref(), &err),
        }
        Ok(())
    }

    /// Delete `id` remotely, then locally whatever the response says.
    pub fn delete(&self, id: impl Into<Id>) -> Result<(), StoreError> {
        let id = id.into();
        self.begin(Request::Delete)?;
        if let Some(hook) = &self.effects.delete_start {
            hook(&self.store, &id);
        }

        let response = self.service.delete(&id);
        self.end(Request::Delete)?;

        match response {
            Ok(response) => match &self.effects.delete_success {
                Some(hook) => hook(&self.store, response),
                None => self.store.remove_one(id)?,
            },
            Err(err) => self.fail(Request::Delete, self.effects.delete_error.as_ref(), &err),
        }
        Ok(())
    }

    // =========================================================================
    // PENDING SELECTORS
    // =========================================================================

    pub fn is_load_pending(&self) -> Selector<bool> {
        self.is_load_pending.clone()
    }

    pub fn is_load_by_id_pending(&self) -> Selector<bool> {
        self.is_load_by_id_pending.clone()
    }

    pub fn is_create_pending(&self) -> Selector<bool> {
        self.is_create_pending.clone()
    }

    pub fn is_update_pending(&self) -> Selector<bool> {
        self.is_update_pending.clone()
    }

    pub fn is_delete_pending(&self) -> Selector<bool> {
        self.is_delete_pending.clone()
    }

    /// True while any request is in flight.
    pub fn is_pending(&self) -> Selector<bool> {
        self.is_pending.clone()
    }

    // =========================================================================
    // LIFECYCLE HELPERS
    // =========================================================================

    fn begin(&self, request: Request) -> Result<(), StoreError> {
        if !self.store.is_initialized() {
            return Err(StoreError::NotInitialized);
        }
        tracing::debug!(operation = request.name(), "data request started");
        self.set_pending(request, true)
    }

    fn end(&self, request: Request) -> Result<(), StoreError> {
        tracing::debug!(operation = request.name(), "data request finished");
        self.set_pending(request, false)
    }

    fn set_pending(&self, request: Request, started: bool) -> Result<(), StoreError> {
        let raised = self.requests.track(request, started);
        self.store
            .patch_state(|state| *request.flag(state.pending_statuses_mut()) = raised)
    }

    fn fail(
        &self,
        request: Request,
        hook: Option<&ErrorHook<S, E>>,
        err: &DataError,
    ) {
        self.effects.report(&self.store, request.name(), hook, err);
    }
}

impl<S, E> EntityUpdaters<S, E> for DataStore<S, E>
where
    S: HasEntityState<E> + HasPendingStatuses + Clone + 'static,
    E: Entity,
{
    fn apply_entity_op<F>(&self, op: F) -> Result<(), StoreError>
    where
        F: FnOnce(&EntityAdapter<E>, S) -> S,
    {
        self.store.apply_entity_op(op)
    }
}

impl<S, E: Entity> Clone for DataStore<S, E> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            service: self.service.clone(),
            effects: self.effects.clone(),
            requests: self.requests.clone(),
            is_load_pending: self.is_load_pending.clone(),
            is_load_by_id_pending: self.is_load_by_id_pending.clone(),
            is_create_pending: self.is_create_pending.clone(),
            is_update_pending: self.is_update_pending.clone(),
            is_delete_pending: self.is_delete_pending.clone(),
            is_pending: self.is_pending.clone(),
        }
    }
}

impl<S: fmt::Debug, E: Entity> fmt::Debug for DataStore<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataStore")
            .field("store", &self.store)
            .field("effects", &self.effects)
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_is_a_plain_flag() {
        let counts = RequestCounts::default();
        assert!(counts.track(Request::Load, true));
        assert!(counts.track(Request::Load, true));
        assert!(!counts.track(Request::Load, false));
    }

    #[test]
    fn counted_requests_stay_pending_until_all_finish() {
        let counts = RequestCounts::default();
        assert!(counts.track(Request::Create, true));
        assert!(counts.track(Request::Create, true));
        assert!(counts.track(Request::Create, false));
        assert!(!counts.track(Request::Create, false));
        assert!(!counts.track(Request::Create, false));
        assert_eq!(counts.create.get(), 0);
    }

    #[test]
    fn flags_map_to_their_field() {
        let mut pending = PendingStatuses::default();
        *Request::Delete.flag(&mut pending) = true;
        assert!(pending.is_delete_pending);
        assert!(!pending.is_update_pending);
        assert_eq!(Request::LoadById.name(), "load_by_id");
    }
}
