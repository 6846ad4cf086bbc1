use std::fmt::Debug;
use std::sync::Arc;

use tracing::trace;

use crate::state::State;
use crate::store::{StateStore, Store};
use crate::subject::Sink;

/// The combined reducer of a dispatch store.
///
/// Must return the input state untouched (an `Arc` clone) for actions it does
/// not handle, so that subscribers see no change.
pub type Reducer<A> = Arc<dyn Fn(&State, &A) -> State + Send + Sync>;

/// Store backend where every write is an action run through one reducer.
///
/// # Examples
///
/// ```ignore
/// let store = DispatchStore::new(|state: &State, action: &AppAction| match action {
///     AppAction::PhoneInput(a) => phone_input_reducer(state, a),
///     _ => state.clone(),
/// });
/// store.dispatch(AppAction::Reset);
/// ```
pub struct DispatchStore<A> {
    store: Arc<StateStore>,
    reducer: Reducer<A>,
}

impl<A> Clone for DispatchStore<A> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            reducer: Arc::clone(&self.reducer),
        }
    }
}

impl<A: Debug + Send + Sync + 'static> DispatchStore<A> {
    pub fn new<F>(reducer: F) -> Self
    where
        F: Fn(&State, &A) -> State + Send + Sync + 'static,
    {
        Self::with_store(Arc::new(StateStore::new()), reducer)
    }

    /// Dispatch onto an existing state store.
    pub fn with_store<F>(store: Arc<StateStore>, reducer: F) -> Self
    where
        F: Fn(&State, &A) -> State + Send + Sync + 'static,
    {
        Self {
            store,
            reducer: Arc::new(reducer),
        }
    }

    /// Reduce one action into the store. Subscribers are notified before
    /// this returns.
    pub fn dispatch(&self, action: A) {
        trace!(?action, "dispatch");
        let reducer = Arc::clone(&self.reducer);
        self.store.reduce(move |state| reducer(state, &action));
    }

    /// A sink that dispatches every value it receives.
    pub fn action_sink(&self) -> Sink<A> {
        let this = self.clone();
        Sink::new(move |action| this.dispatch(action))
    }
}

impl<A: Send + Sync + 'static> Store for DispatchStore<A> {
    fn state_store(&self) -> &Arc<StateStore> {
        &self.store
    }
}
