use serde_json::json;
use spark_entities::{
    DataEffects, DataError, DataService, DataState, DataStore, DataStoreConfig, DeleteResponse,
    EntityState, EntityUpdaters, HasEntityState, HasPendingStatuses, Id, Identified,
    LoadResponse, PendingStatuses, QueryParams, QueryValue, Record, StoreError,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

// =============================================================================
// IN-MEMORY BACKEND
// =============================================================================

#[derive(Default)]
struct BackendInner {
    rows: RefCell<Vec<Record>>,
    next_id: Cell<i64>,
    failing: Cell<bool>,
    calls: RefCell<Vec<String>>,
}

#[derive(Clone, Default)]
struct Backend {
    inner: Rc<BackendInner>,
}

impl Backend {
    fn with_rows(rows: Vec<Record>) -> Self {
        let backend = Backend::default();
        backend.inner.next_id.set(rows.len() as i64 + 1);
        *backend.inner.rows.borrow_mut() = rows;
        backend
    }

    fn fail(&self, failing: bool) {
        self.inner.failing.set(failing);
    }

    fn calls(&self) -> Vec<String> {
        self.inner.calls.borrow().clone()
    }

    fn record(&self, call: &str) -> Result<(), DataError> {
        self.inner.calls.borrow_mut().push(call.to_string());
        if self.inner.failing.get() {
            Err(DataError::Request(format!("{call} unavailable")))
        } else {
            Ok(())
        }
    }

    fn find(&self, id: &Id) -> Option<Record> {
        self.inner
            .rows
            .borrow()
            .iter()
            .find(|r| r.id().as_ref() == Some(id))
            .cloned()
    }
}

impl DataService<Record> for Backend {
    fn get(&self, params: Option<&QueryParams>) -> Result<LoadResponse<Record>, DataError> {
        self.record("get")?;
        if let Some(QueryValue::Bool(true)) = params.and_then(|p| p.get("envelope")) {
            return Ok(LoadResponse::Other(json!({ "items": self.inner.rows.borrow().len() })));
        }
        Ok(LoadResponse::Entities(self.inner.rows.borrow().clone()))
    }

    fn get_by_id(&self, id: &Id) -> Result<Record, DataError> {
        self.record("get_by_id")?;
        self.find(id).ok_or_else(|| DataError::NotFound(id.clone()))
    }

    fn create(&self, entity: &Record) -> Result<Record, DataError> {
        self.record("create")?;
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        let created = entity.clone().with("id", id);
        self.inner.rows.borrow_mut().push(created.clone());
        Ok(created)
    }

    fn update(&self, id: &Id, changes: &Record) -> Result<Record, DataError> {
        self.record("update")?;
        let mut rows = self.inner.rows.borrow_mut();
        let row = rows
            .iter_mut()
            .find(|r| r.id().as_ref() == Some(id))
            .ok_or_else(|| DataError::NotFound(id.clone()))?;
        for (field, value) in changes.fields() {
            row.insert(field, value.clone());
        }
        Ok(row.clone())
    }

    fn delete(&self, id: &Id) -> Result<DeleteResponse<Record>, DataError> {
        self.record("delete")?;
        self.inner.rows.borrow_mut().retain(|r| r.id().as_ref() != Some(id));
        Ok(DeleteResponse::Id(id.clone()))
    }
}

type People = DataState<Record>;

fn person(id: i64, name: &str) -> Record {
    Record::new().with("id", id).with("name", name)
}

fn name_of(store: &DataStore<People, Record>, id: i64) -> Option<String> {
    let state = store.store().get()?;
    let entity = state.entities.get(&Id::from(id))?;
    entity.get("name")?.as_str().map(str::to_owned)
}

fn data_store(backend: &Backend) -> DataStore<People, Record> {
    DataStore::new(DataStoreConfig::new(backend.clone()).with_initial_state(DataState::initial()))
}

// =============================================================================
// DEFAULT LIFECYCLE
// =============================================================================

#[test]
fn test_load_replaces_collection() {
    let backend = Backend::with_rows(vec![person(1, "Ada"), person(2, "Grace")]);
    let store = data_store(&backend);
    store.add_one(person(9, "stale")).unwrap();

    store.load(None).unwrap();

    assert_eq!(store.store().total().get(), Some(2));
    assert_eq!(name_of(&store, 2).as_deref(), Some("Grace"));
    assert_eq!(name_of(&store, 9), None);
}

#[test]
fn test_load_raises_flag_during_request() {
    let backend = Backend::with_rows(vec![person(1, "Ada")]);
    let seen = Rc::new(Cell::new(None));
    let store = DataStore::new(
        DataStoreConfig::new(backend.clone())
            .with_initial_state(People::initial())
            .with_effects(DataEffects::<People, Record>::new().load_start({
                let seen = seen.clone();
                move |store, _| seen.set(store.get().map(|s| s.pending.is_load_pending))
            })),
    );

    let log = Rc::new(RefCell::new(Vec::new()));
    let _sub = store.is_pending().subscribe({
        let log = log.clone();
        move |pending: &bool| log.borrow_mut().push(*pending)
    });

    store.load(None).unwrap();

    assert_eq!(seen.get(), Some(true));
    assert_eq!(*log.borrow(), vec![false, true, false]);
    assert_eq!(store.is_load_pending().get(), Some(false));
}

#[test]
fn test_non_list_load_leaves_collection() {
    let backend = Backend::with_rows(vec![person(1, "Ada")]);
    let store = data_store(&backend);
    store.add_one(person(5, "kept")).unwrap();

    let mut params = QueryParams::new();
    params.insert("envelope".into(), true.into());
    store.load(Some(&params)).unwrap();

    assert_eq!(name_of(&store, 5).as_deref(), Some("kept"));
    assert_eq!(store.store().total().get(), Some(1));
}

#[test]
fn test_load_by_id_sets_one() {
    let backend = Backend::with_rows(vec![person(1, "Ada"), person(2, "Grace")]);
    let store = data_store(&backend);
    store.add_one(person(2, "old")).unwrap();

    store.load_by_id(2).unwrap();

    assert_eq!(name_of(&store, 2).as_deref(), Some("Grace"));
    assert_eq!(store.store().total().get(), Some(1));
}

#[test]
fn test_create_adds_returned_entity() {
    let backend = Backend::with_rows(vec![]);
    let store = data_store(&backend);

    store.create(Record::new().with("name", "Linus")).unwrap();

    assert_eq!(name_of(&store, 1).as_deref(), Some("Linus"));
    assert_eq!(store.is_create_pending().get(), Some(false));
}

#[test]
fn test_update_merges_returned_entity() {
    let backend = Backend::with_rows(vec![person(1, "Ada").with("role", "analyst")]);
    let store = data_store(&backend);
    store.load(None).unwrap();

    store.update(1, Record::new().with("name", "Ada L.")).unwrap();

    let state = store.store().get().unwrap();
    let ada = state.entities.get(&Id::from(1)).unwrap();
    assert_eq!(ada.get("name"), Some(&json!("Ada L.")));
    assert_eq!(ada.get("role"), Some(&json!("analyst")));
}

#[test]
fn test_delete_removes_locally() {
    let backend = Backend::with_rows(vec![person(1, "Ada"), person(2, "Grace")]);
    let store = data_store(&backend);
    store.load(None).unwrap();

    store.delete(1).unwrap();

    assert_eq!(store.store().ids().get().unwrap().to_vec(), vec![Id::from(2)]);
    assert_eq!(backend.calls(), vec!["get", "delete"]);
}

// =============================================================================
// ERRORS
// =============================================================================

#[test]
fn test_specific_error_hook_wins() {
    let backend = Backend::with_rows(vec![person(1, "Ada")]);
    backend.fail(true);
    let log = Rc::new(RefCell::new(Vec::new()));

    let store = DataStore::new(
        DataStoreConfig::new(backend.clone())
            .with_initial_state(People::initial())
            .with_effects(
                DataEffects::<People, Record>::new()
                    .delete_error({
                        let log = log.clone();
                        move |_, err| log.borrow_mut().push(format!("delete: {err}"))
                    })
                    .error({
                        let log = log.clone();
                        move |_, err| log.borrow_mut().push(format!("any: {err}"))
                    }),
            ),
    );

    store.delete(1).unwrap();
    store.load_by_id(1).unwrap();

    assert_eq!(
        *log.borrow(),
        vec![
            "delete: request failed: delete unavailable".to_string(),
            "any: request failed: get_by_id unavailable".to_string(),
        ]
    );
    assert_eq!(store.is_pending().get(), Some(false));
}

#[test]
fn test_unhandled_error_is_not_returned() {
    let backend = Backend::with_rows(vec![]);
    let store = data_store(&backend);

    store.update(42, Record::new().with("name", "nobody")).unwrap();

    assert_eq!(store.store().total().get(), Some(0));
    assert_eq!(store.is_update_pending().get(), Some(false));
}

#[test]
fn test_uninitialized_store_skips_request() {
    let backend = Backend::with_rows(vec![person(1, "Ada")]);
    let store: DataStore<People, Record> =
        DataStore::new(DataStoreConfig::new(backend.clone()));

    assert_eq!(store.load(None), Err(StoreError::NotInitialized));
    assert_eq!(store.is_pending().get(), None);
    assert!(backend.calls().is_empty());
}

// =============================================================================
// OVERRIDES
// =============================================================================

#[test]
fn test_load_success_override_handles_envelopes() {
    let backend = Backend::with_rows(vec![person(1, "Ada"), person(2, "Grace")]);
    let counted = Rc::new(Cell::new(0));

    let store = DataStore::new(
        DataStoreConfig::new(backend.clone())
            .with_initial_state(People::initial())
            .with_effects(DataEffects::<People, Record>::new().load_success({
                let counted = counted.clone();
                move |_, response| {
                    if let LoadResponse::Other(body) = response {
                        counted.set(body["items"].as_u64().unwrap_or_default());
                    }
                }
            })),
    );

    let mut params = QueryParams::new();
    params.insert("envelope".into(), true.into());
    store.load(Some(&params)).unwrap();

    assert_eq!(counted.get(), 2);
    assert_eq!(store.store().total().get(), Some(0));
}

#[test]
fn test_success_hook_can_write_to_store() {
    let backend = Backend::with_rows(vec![]);
    let store = DataStore::new(
        DataStoreConfig::new(backend.clone())
            .with_initial_state(People::initial())
            .with_effects(DataEffects::<People, Record>::new().create_success(|store, created: Record| {
                store.add_one(created.with("local", true)).unwrap();
            })),
    );

    store.create(Record::new().with("name", "Ken")).unwrap();

    let state = store.store().get().unwrap();
    assert_eq!(state.entities.get(&Id::from(1)).unwrap().get("local"), Some(&json!(true)));
}

// =============================================================================
// CUSTOM STATE
// =============================================================================

#[derive(Clone, Default)]
struct Directory {
    people: EntityState<Record>,
    pending: PendingStatuses,
    query: Option<String>,
}

impl HasEntityState<Record> for Directory {
    fn entity_state(&self) -> &EntityState<Record> {
        &self.people
    }

    fn entity_state_mut(&mut self) -> &mut EntityState<Record> {
        &mut self.people
    }
}

impl HasPendingStatuses for Directory {
    fn pending_statuses(&self) -> &PendingStatuses {
        &self.pending
    }

    fn pending_statuses_mut(&mut self) -> &mut PendingStatuses {
        &mut self.pending
    }
}

#[test]
fn test_custom_state_keeps_extra_fields() {
    let backend = Backend::with_rows(vec![person(1, "Ada")]);
    let store = DataStore::new(
        DataStoreConfig::new(backend.clone()).with_initial_state(Directory {
            query: Some("ada".into()),
            ..Directory::default()
        }),
    );

    store.load(None).unwrap();
    store
        .store()
        .patched(|d: &mut Directory| d.query = None)
        .add_one(person(2, "Grace"))
        .unwrap();

    let state = store.store().get().unwrap();
    assert_eq!(state.people.total(), 2);
    assert_eq!(state.query, None);
    assert!(!state.pending.any());
}
