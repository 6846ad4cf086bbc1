//! Operation-error channel shared with the rest of the host application.
//!
//! The widget never renders its own errors. Failures are written to one
//! configurable path (`error.operation` by default) holding an
//! `Option<PhoneInputError>`, through whichever flavor matches the store
//! backend.

use std::fmt::Debug;
use std::sync::Arc;

use phoneinput_flux::{DispatchStore, Sink, State, StatePath, Store, StreamStore, Subject, ValueStream};

use crate::error::PhoneInputError;
use crate::model::FieldStream;

/// Stable action name, for logs.
pub const DISPLAY_ERROR: &str = "DISPLAY_ERROR";

#[derive(Debug, Clone, PartialEq)]
pub enum ErrorAction {
    /// Store `error` at `path`; `None` clears it.
    Display {
        path: StatePath,
        error: Option<PhoneInputError>,
    },
}

impl ErrorAction {
    pub fn name(&self) -> &'static str {
        match self {
            ErrorAction::Display { .. } => DISPLAY_ERROR,
        }
    }
}

/// Host actions that may carry an `ErrorAction`.
pub trait EmbedsErrorAction {
    fn error_action(&self) -> Option<&ErrorAction>;
}

impl EmbedsErrorAction for ErrorAction {
    fn error_action(&self) -> Option<&ErrorAction> {
        Some(self)
    }
}

pub fn error_reducer(state: &State, action: &ErrorAction) -> State {
    match action {
        ErrorAction::Display { path, error } => state.updating(path, error.clone()),
    }
}

/// Write and read access to the operation-error value.
pub trait ErrorDisplay: Send + Sync {
    fn error_path(&self) -> &StatePath;

    fn trigger(&self) -> Sink<Option<PhoneInputError>>;

    /// Emits `NotFound` while no error is stored.
    fn stream(&self) -> FieldStream<PhoneInputError>;
}

// ============================================================================
// Dispatch flavor
// ============================================================================

pub struct DispatchErrorDisplay<A> {
    store: DispatchStore<A>,
    path: StatePath,
}

impl<A> DispatchErrorDisplay<A>
where
    A: From<ErrorAction> + Debug + Send + Sync + 'static,
{
    pub fn new(store: DispatchStore<A>, path: StatePath) -> Self {
        Self { store, path }
    }
}

impl<A> ErrorDisplay for DispatchErrorDisplay<A>
where
    A: From<ErrorAction> + Debug + Send + Sync + 'static,
{
    fn error_path(&self) -> &StatePath {
        &self.path
    }

    fn trigger(&self) -> Sink<Option<PhoneInputError>> {
        let path = self.path.clone();
        self.store.action_sink().contramap(move |error| {
            A::from(ErrorAction::Display {
                path: path.clone(),
                error,
            })
        })
    }

    fn stream(&self) -> FieldStream<PhoneInputError> {
        ValueStream::new(Arc::clone(self.store.state_store()), self.path.clone())
    }
}

// ============================================================================
// Stream flavor
// ============================================================================

/// The replay-one subject feeding the error path.
#[derive(Debug, Clone)]
pub struct ErrorSubjects {
    error: Subject<Option<PhoneInputError>>,
}

impl ErrorSubjects {
    pub fn new() -> Self {
        Self {
            error: Subject::replay(None),
        }
    }

    pub fn sink(&self) -> Sink<Option<PhoneInputError>> {
        self.error.sink()
    }
}

impl Default for ErrorSubjects {
    fn default() -> Self {
        Self::new()
    }
}

pub fn register_error_reducer(store: &StreamStore, subjects: &ErrorSubjects, path: StatePath) {
    store.register(&subjects.error, move |state, error| {
        state.updating(&path, error.clone())
    });
}

pub struct StreamErrorDisplay {
    store: Arc<StreamStore>,
    subjects: ErrorSubjects,
    path: StatePath,
}

impl StreamErrorDisplay {
    /// The reducer for `subjects` must already be registered on `store`.
    pub fn new(store: Arc<StreamStore>, subjects: ErrorSubjects, path: StatePath) -> Self {
        Self {
            store,
            subjects,
            path,
        }
    }
}

impl ErrorDisplay for StreamErrorDisplay {
    fn error_path(&self) -> &StatePath {
        &self.path
    }

    fn trigger(&self) -> Sink<Option<PhoneInputError>> {
        self.subjects.sink()
    }

    fn stream(&self) -> FieldStream<PhoneInputError> {
        ValueStream::new(Arc::clone(self.store.state_store()), self.path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phoneinput_flux::StateError;
    use std::sync::Mutex;

    fn error_path() -> StatePath {
        StatePath::parse("error.operation").unwrap()
    }

    fn fetch_error() -> PhoneInputError {
        PhoneInputError::Fetch("Network unreachable".to_string())
    }

    fn assert_round_trip(display: &dyn ErrorDisplay) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_c = seen.clone();
        let _sub = display
            .stream()
            .subscribe(move |value| seen_c.lock().unwrap().push(value));

        display.trigger().send(Some(fetch_error()));
        display.trigger().send(None);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0], Err(StateError::NotFound("error.operation".to_string())));
        assert_eq!(seen[1], Ok(fetch_error()));
        assert!(seen[2].is_err());
    }

    #[test]
    fn reducer_stores_and_clears() {
        let action = ErrorAction::Display {
            path: error_path(),
            error: Some(fetch_error()),
        };
        assert_eq!(action.name(), DISPLAY_ERROR);

        let state = error_reducer(&State::new(), &action);
        assert_eq!(state.typed_at::<PhoneInputError>("error.operation").unwrap(), fetch_error());

        let cleared = error_reducer(
            &state,
            &ErrorAction::Display {
                path: error_path(),
                error: None,
            },
        );
        assert!(!cleared.contains("error.operation"));
    }

    #[test]
    fn dispatch_flavor_round_trip() {
        let store = DispatchStore::new(error_reducer);
        let display = DispatchErrorDisplay::new(store, error_path());
        assert_eq!(display.error_path().as_str(), "error.operation");
        assert_round_trip(&display);
    }

    #[test]
    fn stream_flavor_round_trip() {
        let store = Arc::new(StreamStore::new());
        let subjects = ErrorSubjects::new();
        register_error_reducer(&store, &subjects, error_path());
        let display = StreamErrorDisplay::new(store, subjects, error_path());
        assert_round_trip(&display);
    }
}
