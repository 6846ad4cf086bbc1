//! Dispatch backend: every write becomes a `PhoneInputAction` reduced into
//! the shared store.

use std::fmt::Debug;
use std::sync::Arc;

use phoneinput_flux::{DispatchStore, Sink, State, StatePath, StateStore, Store};

use crate::config::PhoneInputConfig;
use crate::country_code::CountryCode;
use crate::error::PhoneInputError;
use crate::error_display::{DispatchErrorDisplay, EmbedsErrorAction, ErrorAction, ErrorDisplay, error_reducer};
use crate::field::{Field, FieldPaths};
use crate::model::Model;
use crate::provider::CountryCodeProvider;

/// Stable action names.
///
/// Only used for logging: reducers match on `PhoneInputAction` variants,
/// never on these strings.
pub mod action_name {
    pub const UPDATE_ALL_COUNTRY_CODES: &str = "UPDATE_ALL_COUNTRY_CODES";
    pub const UPDATE_SELECTABLE_CODES: &str = "UPDATE_SELECTABLE_CODES";
    pub const UPDATE_EXTENSION: &str = "UPDATE_EXTENSION";
    pub const UPDATE_NUMBER: &str = "UPDATE_NUMBER";
    pub const UPDATE_EXTENSION_SEARCH: &str = "UPDATE_EXTENSION_SEARCH";
}

/// Writes to one widget field. `None` payloads clear the field.
#[derive(Debug, Clone, PartialEq)]
pub enum PhoneInputAction {
    UpdateAllCountryCodes {
        path: StatePath,
        codes: Option<Vec<CountryCode>>,
    },
    UpdateSelectableCodes {
        path: StatePath,
        codes: Option<Vec<CountryCode>>,
    },
    UpdateExtension {
        path: StatePath,
        code: Option<CountryCode>,
    },
    UpdateNumber {
        path: StatePath,
        number: Option<String>,
    },
    UpdateExtensionSearch {
        path: StatePath,
        query: Option<String>,
    },
}

impl PhoneInputAction {
    pub fn name(&self) -> &'static str {
        match self {
            PhoneInputAction::UpdateAllCountryCodes { .. } => action_name::UPDATE_ALL_COUNTRY_CODES,
            PhoneInputAction::UpdateSelectableCodes { .. } => action_name::UPDATE_SELECTABLE_CODES,
            PhoneInputAction::UpdateExtension { .. } => action_name::UPDATE_EXTENSION,
            PhoneInputAction::UpdateNumber { .. } => action_name::UPDATE_NUMBER,
            PhoneInputAction::UpdateExtensionSearch { .. } => action_name::UPDATE_EXTENSION_SEARCH,
        }
    }

    pub fn path(&self) -> &StatePath {
        match self {
            PhoneInputAction::UpdateAllCountryCodes { path, .. }
            | PhoneInputAction::UpdateSelectableCodes { path, .. }
            | PhoneInputAction::UpdateExtension { path, .. }
            | PhoneInputAction::UpdateNumber { path, .. }
            | PhoneInputAction::UpdateExtensionSearch { path, .. } => path,
        }
    }

    pub fn field(&self) -> Field {
        match self {
            PhoneInputAction::UpdateAllCountryCodes { .. } => Field::AllCodes,
            PhoneInputAction::UpdateSelectableCodes { .. } => Field::SelectableCodes,
            PhoneInputAction::UpdateExtension { .. } => Field::Extension,
            PhoneInputAction::UpdateNumber { .. } => Field::Number,
            PhoneInputAction::UpdateExtensionSearch { .. } => Field::ExtensionQuery,
        }
    }
}

/// Host actions that may carry a `PhoneInputAction`.
pub trait EmbedsPhoneInput {
    fn phone_input(&self) -> Option<&PhoneInputAction>;
}

impl EmbedsPhoneInput for PhoneInputAction {
    fn phone_input(&self) -> Option<&PhoneInputAction> {
        Some(self)
    }
}

/// Applies the payload at the action's path.
pub fn phone_input_reducer(state: &State, action: &PhoneInputAction) -> State {
    match action {
        PhoneInputAction::UpdateAllCountryCodes { path, codes }
        | PhoneInputAction::UpdateSelectableCodes { path, codes } => {
            state.updating(path, codes.clone())
        }
        PhoneInputAction::UpdateExtension { path, code } => state.updating(path, code.clone()),
        PhoneInputAction::UpdateNumber { path, number } => state.updating(path, number.clone()),
        PhoneInputAction::UpdateExtensionSearch { path, query } => state.updating(path, query.clone()),
    }
}

/// Reduces widget and error actions; everything else passes through.
///
/// Hosts with their own actions call this from their combined reducer.
pub fn reducer<A>(state: &State, action: &A) -> State
where
    A: EmbedsPhoneInput + EmbedsErrorAction,
{
    if let Some(action) = action.phone_input() {
        phone_input_reducer(state, action)
    } else if let Some(action) = action.error_action() {
        error_reducer(state, action)
    } else {
        state.clone()
    }
}

/// Action type for a store that only hosts this widget.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetAction {
    PhoneInput(PhoneInputAction),
    Error(ErrorAction),
}

impl From<PhoneInputAction> for WidgetAction {
    fn from(action: PhoneInputAction) -> Self {
        WidgetAction::PhoneInput(action)
    }
}

impl From<ErrorAction> for WidgetAction {
    fn from(action: ErrorAction) -> Self {
        WidgetAction::Error(action)
    }
}

impl EmbedsPhoneInput for WidgetAction {
    fn phone_input(&self) -> Option<&PhoneInputAction> {
        match self {
            WidgetAction::PhoneInput(action) => Some(action),
            WidgetAction::Error(_) => None,
        }
    }
}

impl EmbedsErrorAction for WidgetAction {
    fn error_action(&self) -> Option<&ErrorAction> {
        match self {
            WidgetAction::Error(action) => Some(action),
            WidgetAction::PhoneInput(_) => None,
        }
    }
}

// ============================================================================
// Provider / Model
// ============================================================================

/// Everything a dispatch-backed model needs: the store, the country-code
/// source and the path configuration.
pub struct DispatchProvider<A> {
    store: DispatchStore<A>,
    country_codes: Arc<dyn CountryCodeProvider>,
    config: PhoneInputConfig,
    error_path: StatePath,
}

impl<A> DispatchProvider<A>
where
    A: From<PhoneInputAction> + From<ErrorAction> + Debug + Send + Sync + 'static,
{
    pub fn new(
        store: DispatchStore<A>,
        country_codes: Arc<dyn CountryCodeProvider>,
        config: PhoneInputConfig,
    ) -> Result<Self, PhoneInputError> {
        let error_path = config.resolve_error_path()?;
        Ok(Self {
            store,
            country_codes,
            config,
            error_path,
        })
    }

    pub fn store(&self) -> &DispatchStore<A> {
        &self.store
    }

    pub fn config(&self) -> &PhoneInputConfig {
        &self.config
    }

    pub fn model(&self, id: &str) -> Result<DispatchModel<A>, PhoneInputError> {
        DispatchModel::new(self, id)
    }
}

impl DispatchProvider<WidgetAction> {
    /// A provider with its own store reducing only widget actions.
    pub fn standalone(
        country_codes: Arc<dyn CountryCodeProvider>,
        config: PhoneInputConfig,
    ) -> Result<Self, PhoneInputError> {
        let state_store = Arc::new(StateStore::with_separator(config.separator));
        let store = DispatchStore::with_store(state_store, reducer::<WidgetAction>);
        Self::new(store, country_codes, config)
    }
}

pub struct DispatchModel<A> {
    id: String,
    paths: FieldPaths,
    store: DispatchStore<A>,
    country_codes: Arc<dyn CountryCodeProvider>,
    error_display: DispatchErrorDisplay<A>,
    all_codes: Sink<Option<Vec<CountryCode>>>,
    selectable: Sink<Option<Vec<CountryCode>>>,
    extension: Sink<Option<CountryCode>>,
    number: Sink<Option<String>>,
    ext_search: Sink<Option<String>>,
}

impl<A> DispatchModel<A>
where
    A: From<PhoneInputAction> + From<ErrorAction> + Debug + Send + Sync + 'static,
{
    /// Sinks are built once here, so every trigger call hands out the same
    /// dispatching sink.
    pub fn new(provider: &DispatchProvider<A>, id: &str) -> Result<Self, PhoneInputError> {
        let paths = FieldPaths::new(&provider.config, id)?;
        let actions = provider.store.action_sink();

        let all_codes = field_sink(&actions, paths.path(Field::AllCodes), |path, codes| {
            PhoneInputAction::UpdateAllCountryCodes { path, codes }
        });
        let selectable = field_sink(&actions, paths.path(Field::SelectableCodes), |path, codes| {
            PhoneInputAction::UpdateSelectableCodes { path, codes }
        });
        let extension = field_sink(&actions, paths.path(Field::Extension), |path, code| {
            PhoneInputAction::UpdateExtension { path, code }
        });
        let number = field_sink(&actions, paths.path(Field::Number), |path, number| {
            PhoneInputAction::UpdateNumber { path, number }
        });
        let ext_search = field_sink(&actions, paths.path(Field::ExtensionQuery), |path, query| {
            PhoneInputAction::UpdateExtensionSearch { path, query }
        });

        Ok(Self {
            id: id.to_string(),
            paths,
            store: provider.store.clone(),
            country_codes: Arc::clone(&provider.country_codes),
            error_display: DispatchErrorDisplay::new(
                provider.store.clone(),
                provider.error_path.clone(),
            ),
            all_codes,
            selectable,
            extension,
            number,
            ext_search,
        })
    }
}

fn field_sink<A, T, F>(actions: &Sink<A>, path: &StatePath, build: F) -> Sink<T>
where
    A: From<PhoneInputAction> + 'static,
    T: 'static,
    F: Fn(StatePath, T) -> PhoneInputAction + Send + Sync + 'static,
{
    let path = path.clone();
    actions.contramap(move |value| A::from(build(path.clone(), value)))
}

impl<A> Model for DispatchModel<A>
where
    A: From<PhoneInputAction> + From<ErrorAction> + Debug + Send + Sync + 'static,
{
    fn id(&self) -> &str {
        &self.id
    }

    fn paths(&self) -> &FieldPaths {
        &self.paths
    }

    fn store(&self) -> &dyn Store {
        &self.store
    }

    fn country_codes(&self) -> &dyn CountryCodeProvider {
        self.country_codes.as_ref()
    }

    fn error_display(&self) -> &dyn ErrorDisplay {
        &self.error_display
    }

    fn all_codes_trigger(&self) -> Result<Sink<Option<Vec<CountryCode>>>, PhoneInputError> {
        Ok(self.all_codes.clone())
    }

    fn selectable_codes_trigger(&self) -> Result<Sink<Option<Vec<CountryCode>>>, PhoneInputError> {
        Ok(self.selectable.clone())
    }

    fn extension_trigger(&self) -> Result<Sink<Option<CountryCode>>, PhoneInputError> {
        Ok(self.extension.clone())
    }

    fn number_trigger(&self) -> Result<Sink<Option<String>>, PhoneInputError> {
        Ok(self.number.clone())
    }

    fn ext_search_trigger(&self) -> Result<Sink<Option<String>>, PhoneInputError> {
        Ok(self.ext_search.clone())
    }
}
