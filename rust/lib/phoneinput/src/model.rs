use std::sync::Arc;

use phoneinput_flux::{Sink, State, StateError, StatePath, Store, ValueStream};

use crate::country_code::{self, CountryCode};
use crate::error::PhoneInputError;
use crate::error_display::ErrorDisplay;
use crate::field::{Field, FieldPaths};
use crate::provider::{BoxFuture, CountryCodeProvider, FetchResult};

/// Typed stream over one field path of the live store.
pub type FieldStream<T> = ValueStream<T>;

/// Typed access to one widget instance's state.
///
/// Reads (streams and `*_for_state` projections) are shared by every backend.
/// Writes are backend specific: each trigger hands out the sink that reaches
/// the store through that backend, or `SinkUninitialized` when it was never
/// wired.
pub trait Model: Send + Sync {
    /// Instance id; empty for the single-instance widget.
    fn id(&self) -> &str;

    fn paths(&self) -> &FieldPaths;

    fn store(&self) -> &dyn Store;

    fn country_codes(&self) -> &dyn CountryCodeProvider;

    fn error_display(&self) -> &dyn ErrorDisplay;

    fn all_codes_trigger(&self) -> Result<Sink<Option<Vec<CountryCode>>>, PhoneInputError>;

    fn selectable_codes_trigger(&self) -> Result<Sink<Option<Vec<CountryCode>>>, PhoneInputError>;

    fn extension_trigger(&self) -> Result<Sink<Option<CountryCode>>, PhoneInputError>;

    fn number_trigger(&self) -> Result<Sink<Option<String>>, PhoneInputError>;

    fn ext_search_trigger(&self) -> Result<Sink<Option<String>>, PhoneInputError>;

    fn operation_error_trigger(&self) -> Sink<Option<PhoneInputError>> {
        self.error_display().trigger()
    }

    fn operation_error_stream(&self) -> FieldStream<PhoneInputError> {
        self.error_display().stream()
    }

    fn fetch_codes(&self, prev: Result<(), PhoneInputError>) -> BoxFuture<FetchResult> {
        self.country_codes().fetch_codes(prev)
    }

    fn substate_path(&self) -> &StatePath {
        self.paths().substate()
    }

    // ------------------------------------------------------------------
    // Streams
    // ------------------------------------------------------------------

    fn all_codes_stream(&self) -> FieldStream<Vec<CountryCode>> {
        field_stream(self.store(), self.paths(), Field::AllCodes)
    }

    fn selectable_codes_stream(&self) -> FieldStream<Vec<CountryCode>> {
        field_stream(self.store(), self.paths(), Field::SelectableCodes)
    }

    fn extension_stream(&self) -> FieldStream<CountryCode> {
        field_stream(self.store(), self.paths(), Field::Extension)
    }

    fn number_stream(&self) -> FieldStream<String> {
        field_stream(self.store(), self.paths(), Field::Number)
    }

    fn ext_search_stream(&self) -> FieldStream<String> {
        field_stream(self.store(), self.paths(), Field::ExtensionQuery)
    }

    // ------------------------------------------------------------------
    // Projections over an instance substate
    // ------------------------------------------------------------------

    /// The instance substate of a full snapshot: field keys at the top level.
    fn substate(&self, state: &State) -> State {
        state.substate(self.substate_path())
    }

    fn all_codes_for_state(&self, substate: &State) -> Result<Vec<CountryCode>, StateError> {
        substate.typed_at(Field::AllCodes.key())
    }

    fn selectable_codes_for_state(&self, substate: &State) -> Result<Vec<CountryCode>, StateError> {
        substate.typed_at(Field::SelectableCodes.key())
    }

    fn extension_for_state(&self, substate: &State) -> Result<CountryCode, StateError> {
        substate.typed_at(Field::Extension.key())
    }

    fn number_for_state(&self, substate: &State) -> Result<String, StateError> {
        substate.string_at(Field::Number.key())
    }

    fn extension_query_for_state(&self, substate: &State) -> Result<String, StateError> {
        substate.string_at(Field::ExtensionQuery.key())
    }

    fn filter_codes(&self, codes: &[CountryCode], query: &str) -> Vec<CountryCode> {
        country_code::filter_codes(codes, query)
    }
}

fn field_stream<T>(store: &dyn Store, paths: &FieldPaths, field: Field) -> FieldStream<T>
where
    T: std::any::Any + Clone + Send + Sync,
{
    ValueStream::new(Arc::clone(store.state_store()), paths.path(field).clone())
}
