//! Direct-stream backend: every field is a replay-one subject folded into
//! the store by its own reducer.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use phoneinput_flux::{Sink, StatePath, StateStore, Store, StreamStore, Subject};
use tracing::debug;

use crate::config::PhoneInputConfig;
use crate::country_code::CountryCode;
use crate::error::PhoneInputError;
use crate::error_display::{ErrorDisplay, ErrorSubjects, StreamErrorDisplay, register_error_reducer};
use crate::field::{Field, FieldPaths};
use crate::model::Model;
use crate::provider::CountryCodeProvider;

/// The five subjects of one widget instance, each seeded with `None`.
#[derive(Debug, Clone)]
pub struct FieldSubjects {
    all_codes: Subject<Option<Vec<CountryCode>>>,
    selectable: Subject<Option<Vec<CountryCode>>>,
    extension: Subject<Option<CountryCode>>,
    number: Subject<Option<String>>,
    ext_search: Subject<Option<String>>,
}

impl FieldSubjects {
    fn new() -> Self {
        Self {
            all_codes: Subject::replay(None),
            selectable: Subject::replay(None),
            extension: Subject::replay(None),
            number: Subject::replay(None),
            ext_search: Subject::replay(None),
        }
    }
}

/// Backend-global registry of instance subjects, keyed by instance id.
#[derive(Debug, Default)]
pub struct StreamActions {
    instances: Mutex<HashMap<String, Arc<FieldSubjects>>>,
}

impl StreamActions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subjects(&self, id: &str) -> Option<Arc<FieldSubjects>> {
        self.instances
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    pub fn instance_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .instances
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    /// Returns the instance's subjects and whether they were just created.
    fn get_or_create(&self, id: &str) -> (Arc<FieldSubjects>, bool) {
        let mut instances = self.instances.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = instances.get(id) {
            return (Arc::clone(existing), false);
        }
        let created = Arc::new(FieldSubjects::new());
        instances.insert(id.to_string(), Arc::clone(&created));
        (created, true)
    }
}

/// Create the subjects of instance `paths` and wire one reducer per field.
///
/// Registering the same id twice wires nothing new.
pub fn register_stream_reducers(
    store: &StreamStore,
    actions: &StreamActions,
    id: &str,
    paths: &FieldPaths,
) -> Arc<FieldSubjects> {
    let (subjects, created) = actions.get_or_create(id);
    if !created {
        return subjects;
    }

    register_field(store, &subjects.all_codes, paths.path(Field::AllCodes));
    register_field(store, &subjects.selectable, paths.path(Field::SelectableCodes));
    register_field(store, &subjects.extension, paths.path(Field::Extension));
    register_field(store, &subjects.number, paths.path(Field::Number));
    register_field(store, &subjects.ext_search, paths.path(Field::ExtensionQuery));
    debug!(id, substate = %paths.substate(), "stream reducers registered");

    subjects
}

fn register_field<T>(store: &StreamStore, subject: &Subject<Option<T>>, path: &StatePath)
where
    T: std::any::Any + Clone + Send + Sync,
{
    let path = path.clone();
    store.register(subject, move |state, value| state.updating(&path, value.clone()));
}

// ============================================================================
// Provider / Model
// ============================================================================

/// Shared wiring for stream-backed models.
///
/// Reducers are wired when an instance is registered, never per model, so
/// models sharing a provider and an id share their subjects.
pub struct StreamProvider {
    store: Arc<StreamStore>,
    actions: Arc<StreamActions>,
    errors: ErrorSubjects,
    error_path: StatePath,
    country_codes: Arc<dyn CountryCodeProvider>,
    config: PhoneInputConfig,
}

impl StreamProvider {
    /// A provider with its own store and the single-instance (`""`) widget
    /// registered.
    pub fn new(
        country_codes: Arc<dyn CountryCodeProvider>,
        config: PhoneInputConfig,
    ) -> Result<Self, PhoneInputError> {
        let state_store = Arc::new(StateStore::with_separator(config.separator));
        let store = Arc::new(StreamStore::with_store(state_store));
        let provider = Self::with_store(store, country_codes, config)?;
        provider.register_instance("")?;
        Ok(provider)
    }

    /// Wire the error reducer onto an existing store. No instance is
    /// registered.
    pub fn with_store(
        store: Arc<StreamStore>,
        country_codes: Arc<dyn CountryCodeProvider>,
        config: PhoneInputConfig,
    ) -> Result<Self, PhoneInputError> {
        let error_path = config.resolve_error_path()?;
        let errors = ErrorSubjects::new();
        register_error_reducer(&store, &errors, error_path.clone());
        Ok(Self {
            store,
            actions: Arc::new(StreamActions::new()),
            errors,
            error_path,
            country_codes,
            config,
        })
    }

    pub fn register_instance(&self, id: &str) -> Result<(), PhoneInputError> {
        let paths = FieldPaths::new(&self.config, id)?;
        register_stream_reducers(&self.store, &self.actions, id, &paths);
        Ok(())
    }

    pub fn store(&self) -> &Arc<StreamStore> {
        &self.store
    }

    pub fn actions(&self) -> &Arc<StreamActions> {
        &self.actions
    }

    pub fn config(&self) -> &PhoneInputConfig {
        &self.config
    }

    pub fn model(&self, id: &str) -> Result<StreamModel, PhoneInputError> {
        StreamModel::new(self, id)
    }
}

pub struct StreamModel {
    id: String,
    paths: FieldPaths,
    store: Arc<StreamStore>,
    actions: Arc<StreamActions>,
    country_codes: Arc<dyn CountryCodeProvider>,
    error_display: StreamErrorDisplay,
}

impl StreamModel {
    /// Models for ids that were never registered construct fine, but every
    /// trigger reports `SinkUninitialized`.
    pub fn new(provider: &StreamProvider, id: &str) -> Result<Self, PhoneInputError> {
        Ok(Self {
            id: id.to_string(),
            paths: FieldPaths::new(&provider.config, id)?,
            store: Arc::clone(&provider.store),
            actions: Arc::clone(&provider.actions),
            country_codes: Arc::clone(&provider.country_codes),
            error_display: StreamErrorDisplay::new(
                Arc::clone(&provider.store),
                provider.errors.clone(),
                provider.error_path.clone(),
            ),
        })
    }

    fn sink<T, F>(&self, field: Field, pick: F) -> Result<Sink<T>, PhoneInputError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce(&FieldSubjects) -> &Subject<T>,
    {
        self.actions
            .subjects(&self.id)
            .map(|subjects| pick(subjects.as_ref()).sink())
            .ok_or(PhoneInputError::SinkUninitialized(field))
    }
}

impl Model for StreamModel {
    fn id(&self) -> &str {
        &self.id
    }

    fn paths(&self) -> &FieldPaths {
        &self.paths
    }

    fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    fn country_codes(&self) -> &dyn CountryCodeProvider {
        self.country_codes.as_ref()
    }

    fn error_display(&self) -> &dyn ErrorDisplay {
        &self.error_display
    }

    fn all_codes_trigger(&self) -> Result<Sink<Option<Vec<CountryCode>>>, PhoneInputError> {
        self.sink(Field::AllCodes, |s| &s.all_codes)
    }

    fn selectable_codes_trigger(&self) -> Result<Sink<Option<Vec<CountryCode>>>, PhoneInputError> {
        self.sink(Field::SelectableCodes, |s| &s.selectable)
    }

    fn extension_trigger(&self) -> Result<Sink<Option<CountryCode>>, PhoneInputError> {
        self.sink(Field::Extension, |s| &s.extension)
    }

    fn number_trigger(&self) -> Result<Sink<Option<String>>, PhoneInputError> {
        self.sink(Field::Number, |s| &s.number)
    }

    fn ext_search_trigger(&self) -> Result<Sink<Option<String>>, PhoneInputError> {
        self.sink(Field::ExtensionQuery, |s| &s.ext_search)
    }
}
