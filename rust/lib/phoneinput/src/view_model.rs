use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use phoneinput_flux::{Sink, State, StateError, StatePath, Subject, Subscription, SubscriptionBag};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::country_code::{self, CountryCode};
use crate::error::PhoneInputError;
use crate::model::{FieldStream, Model};

type CodesSink = Sink<Option<Vec<CountryCode>>>;

/// Reactive pipeline of one mounted widget.
///
/// `initialize` on mount:
/// - fetches the country codes once, on the ambient tokio runtime;
/// - keeps `selectable` equal to `filter_codes(all codes, query)`,
///   recomputed whenever the query or the code list changes;
/// - turns a selected code into an extension write plus a query reset.
///
/// `deinitialize` on unmount (or drop) releases every subscription and
/// aborts the fetch; nothing is written afterwards.
pub struct ViewModel {
    model: Arc<dyn Model>,
    selection: Subject<CountryCode>,
    lifecycle: Mutex<Lifecycle>,
}

#[derive(Default)]
struct Lifecycle {
    subscriptions: SubscriptionBag,
    fetch: Option<JoinHandle<()>>,
    active: Option<Arc<AtomicBool>>,
}

impl ViewModel {
    pub fn new(model: Arc<dyn Model>) -> Self {
        Self {
            model,
            selection: Subject::new(),
            lifecycle: Mutex::new(Lifecycle::default()),
        }
    }

    pub fn id(&self) -> &str {
        self.model.id()
    }

    pub fn model(&self) -> &Arc<dyn Model> {
        &self.model
    }

    pub fn is_initialized(&self) -> bool {
        self.lifecycle().active.is_some()
    }

    /// Start the pipeline. Never fails: wiring and fetch errors are sent to
    /// the operation-error channel. A second call while initialized is a
    /// no-op.
    pub fn initialize(&self) {
        let active = Arc::new(AtomicBool::new(true));
        {
            let mut lifecycle = self.lifecycle();
            if lifecycle.active.is_some() {
                debug!(id = self.id(), "already initialized");
                return;
            }
            lifecycle.active = Some(Arc::clone(&active));
        }
        debug!(id = self.id(), "initializing");

        let errors = self.model.operation_error_trigger();
        let mut subscriptions = SubscriptionBag::new();
        let all_codes = match self.wire(&mut subscriptions) {
            Ok(sink) => Some(sink),
            Err(err) => {
                warn!(id = self.id(), error = %err, "wiring failed");
                errors.send(Some(err));
                None
            }
        };
        let fetch = self.spawn_fetch(all_codes, errors, Arc::clone(&active));

        let mut lifecycle = self.lifecycle();
        if active.load(Ordering::SeqCst) {
            lifecycle.subscriptions.append(&mut subscriptions);
            lifecycle.fetch = fetch;
        } else {
            // Deinitialized while wiring.
            drop(lifecycle);
            if let Some(fetch) = fetch {
                fetch.abort();
            }
            subscriptions.dispose();
        }
    }

    /// Release every subscription and abort the in-flight fetch.
    pub fn deinitialize(&self) {
        let mut lifecycle = self.lifecycle();
        let Some(active) = lifecycle.active.take() else {
            return;
        };
        active.store(false, Ordering::SeqCst);
        if let Some(fetch) = lifecycle.fetch.take() {
            fetch.abort();
        }
        let mut subscriptions = std::mem::take(&mut lifecycle.subscriptions);
        drop(lifecycle);

        subscriptions.dispose();
        debug!(id = self.id(), "deinitialized");
    }

    fn wire(&self, subscriptions: &mut SubscriptionBag) -> Result<CodesSink, PhoneInputError> {
        let all_codes = self.model.all_codes_trigger()?;
        let selectable = self.model.selectable_codes_trigger()?;
        let extension = self.model.extension_trigger()?;
        let ext_search = self.model.ext_search_trigger()?;

        let refilter = selectable_refilter(Arc::downgrade(&self.model), selectable);
        let on_query = Arc::clone(&refilter);
        subscriptions.push(self.model.ext_search_stream().subscribe(move |_| on_query()));
        subscriptions.push(self.model.all_codes_stream().subscribe(move |_| refilter()));

        subscriptions.push(
            self.selection
                .subscribe(move |code| extension.send(Some(code.clone()))),
        );
        subscriptions.push(
            self.selection
                .subscribe(move |_| ext_search.send(Some(String::new()))),
        );

        Ok(all_codes)
    }

    fn spawn_fetch(
        &self,
        all_codes: Option<CodesSink>,
        errors: Sink<Option<PhoneInputError>>,
        active: Arc<AtomicBool>,
    ) -> Option<JoinHandle<()>> {
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(err) => {
                warn!(id = self.id(), error = %err, "no runtime for country code fetch");
                errors.send(Some(PhoneInputError::Runtime(err.to_string())));
                return None;
            }
        };

        let fetch = self.model.fetch_codes(Ok(()));
        let id = self.id().to_string();
        Some(runtime.spawn(async move {
            let result = fetch.await;
            if !active.load(Ordering::SeqCst) {
                debug!(id, "fetch finished after deinitialize, dropped");
                return;
            }
            match result {
                Ok(codes) => {
                    debug!(id, count = codes.len(), "country codes fetched");
                    if let Some(all_codes) = all_codes {
                        all_codes.send(Some(codes));
                    }
                }
                Err(err) => {
                    warn!(id, error = %err, "country code fetch failed");
                    errors.send(Some(err));
                }
            }
        }))
    }

    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn report(&self, err: PhoneInputError) {
        warn!(id = self.id(), error = %err, "trigger unavailable");
        self.model.operation_error_trigger().send(Some(err));
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// The widget substate of a full store snapshot.
    pub fn substate(&self, state: &State) -> State {
        self.model.substate(state)
    }

    /// The selected extension as `+<calling code>`.
    pub fn extension_for_state(&self, substate: &State) -> Result<String, StateError> {
        self.model
            .extension_for_state(substate)
            .map(|cc| format!("+{}", cc.calling_code))
    }

    pub fn number_for_state(&self, substate: &State) -> Result<String, StateError> {
        self.model.number_for_state(substate)
    }

    pub fn extension_query_for_state(&self, substate: &State) -> Result<String, StateError> {
        self.model.extension_query_for_state(substate)
    }

    pub fn selectable_codes_for_state(&self, substate: &State) -> Result<Vec<CountryCode>, StateError> {
        self.model.selectable_codes_for_state(substate)
    }

    pub fn format_country_code(&self, cc: &CountryCode) -> String {
        country_code::format_country_code(cc)
    }

    pub fn operation_error_trigger(&self) -> Sink<Option<PhoneInputError>> {
        self.model.operation_error_trigger()
    }

    pub fn operation_error_stream(&self) -> FieldStream<PhoneInputError> {
        self.model.operation_error_stream()
    }

    /// Committed snapshots of the widget substate.
    pub fn state_stream(&self) -> SubstateStream {
        SubstateStream {
            rx: self.model.store().state_stream(),
            prefix: self.model.substate_path().clone(),
        }
    }

    /// Call `observer` with the widget substate after every change below it.
    pub fn observe_state<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&State) + Send + Sync + 'static,
    {
        let prefix = self.model.substate_path().clone();
        self.model
            .store()
            .state_store()
            .observe(&prefix.subtree_pattern(), move |_, state| {
                observer(&state.substate(&prefix))
            })
    }

    // ------------------------------------------------------------------
    // Input handlers
    // ------------------------------------------------------------------

    pub fn trigger_number_input(&self, value: Option<String>) {
        match self.model.number_trigger() {
            Ok(sink) => sink.send(value),
            Err(err) => self.report(err),
        }
    }

    pub fn trigger_extension_query_input(&self, value: Option<String>) {
        match self.model.ext_search_trigger() {
            Ok(sink) => sink.send(value),
            Err(err) => self.report(err),
        }
    }

    /// Ignored unless initialized.
    pub fn trigger_selected_country_code(&self, code: CountryCode) {
        self.selection.next(code);
    }
}

impl Drop for ViewModel {
    fn drop(&mut self) {
        self.deinitialize();
    }
}

/// Recompute `selectable` from the current snapshot, writing only when the
/// result differs from what is stored.
fn selectable_refilter(model: Weak<dyn Model>, selectable: CodesSink) -> Arc<dyn Fn() + Send + Sync> {
    Arc::new(move || {
        let Some(model) = model.upgrade() else {
            return;
        };
        let substate = model.substate(&model.store().snapshot());
        let Ok(all_codes) = model.all_codes_for_state(&substate) else {
            return;
        };
        let query = model.extension_query_for_state(&substate).unwrap_or_default();
        let filtered = model.filter_codes(&all_codes, &query);
        match model.selectable_codes_for_state(&substate) {
            Ok(current) if current == filtered => {}
            _ => selectable.send(Some(filtered)),
        }
    })
}

/// Async view of committed widget substates.
pub struct SubstateStream {
    rx: watch::Receiver<State>,
    prefix: StatePath,
}

impl SubstateStream {
    pub fn current(&self) -> State {
        self.rx.borrow().substate(&self.prefix)
    }

    /// Wait for the next committed snapshot. `None` once the store is gone.
    pub async fn next(&mut self) -> Option<State> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().substate(&self.prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PhoneInputConfig;
    use crate::dispatch::DispatchProvider;
    use crate::field::Field;
    use crate::provider::{FnCountryCodes, StaticCountryCodes};
    use crate::stream::StreamProvider;
    use phoneinput_flux::Store;
    use std::time::Duration;

    fn codes() -> Vec<CountryCode> {
        vec![
            CountryCode::new("Germany", "DE", "49"),
            CountryCode::new("Ghana", "GH", "233"),
            CountryCode::new("Japan", "JP", "81"),
        ]
    }

    fn dispatch_view_model(id: &str) -> ViewModel {
        let provider = DispatchProvider::standalone(
            Arc::new(StaticCountryCodes::new(codes())),
            PhoneInputConfig::default(),
        )
        .unwrap();
        ViewModel::new(Arc::new(provider.model(id).unwrap()))
    }

    async fn eventually<F: Fn() -> bool>(check: F) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while !check() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    fn substate(vm: &ViewModel) -> State {
        vm.substate(&vm.model().store().snapshot())
    }

    // ========================================================================
    // Initialization
    // ========================================================================

    #[tokio::test]
    async fn initialize_fetches_and_fills_selectable() {
        let vm = dispatch_view_model("");
        vm.initialize();
        assert!(vm.is_initialized());

        eventually(|| vm.selectable_codes_for_state(&substate(&vm)).is_ok()).await;
        let state = substate(&vm);
        assert_eq!(vm.model().all_codes_for_state(&state).unwrap(), codes());
        assert_eq!(vm.selectable_codes_for_state(&state).unwrap(), codes());
    }

    #[tokio::test]
    async fn query_change_refilters() {
        let vm = dispatch_view_model("");
        vm.initialize();
        eventually(|| vm.selectable_codes_for_state(&substate(&vm)).is_ok()).await;

        vm.trigger_extension_query_input(Some("gh".to_string()));
        let state = substate(&vm);
        assert_eq!(vm.extension_query_for_state(&state).unwrap(), "gh");
        assert_eq!(
            vm.selectable_codes_for_state(&state).unwrap(),
            vec![CountryCode::new("Ghana", "GH", "233")]
        );
    }

    #[tokio::test]
    async fn query_and_selectable_are_published_together() {
        let vm = dispatch_view_model("");
        vm.initialize();
        eventually(|| vm.selectable_codes_for_state(&substate(&vm)).is_ok()).await;

        let mut states = vm.state_stream();
        vm.trigger_extension_query_input(Some("jap".to_string()));

        let published = states.next().await.unwrap();
        assert_eq!(vm.extension_query_for_state(&published).unwrap(), "jap");
        assert_eq!(
            vm.selectable_codes_for_state(&published).unwrap(),
            vec![CountryCode::new("Japan", "JP", "81")]
        );
    }

    #[tokio::test]
    async fn selection_sets_extension_and_clears_query() {
        let vm = dispatch_view_model("");
        vm.initialize();
        eventually(|| vm.selectable_codes_for_state(&substate(&vm)).is_ok()).await;

        vm.trigger_extension_query_input(Some("ger".to_string()));
        vm.trigger_selected_country_code(CountryCode::new("Germany", "DE", "49"));

        let state = substate(&vm);
        assert_eq!(vm.extension_for_state(&state).unwrap(), "+49");
        assert_eq!(vm.extension_query_for_state(&state).unwrap(), "");
        assert_eq!(vm.selectable_codes_for_state(&state).unwrap(), codes());
    }

    #[tokio::test]
    async fn second_initialize_is_noop() {
        let vm = dispatch_view_model("");
        vm.initialize();
        vm.initialize();
        eventually(|| vm.selectable_codes_for_state(&substate(&vm)).is_ok()).await;

        let seen = Arc::new(Mutex::new(0usize));
        let seen_c = seen.clone();
        let _sub = vm.model().extension_stream().subscribe(move |value| {
            if value.is_ok() {
                *seen_c.lock().unwrap() += 1;
            }
        });
        vm.trigger_selected_country_code(CountryCode::new("Japan", "JP", "81"));
        assert_eq!(*seen.lock().unwrap(), 1);
    }

    // ========================================================================
    // Errors
    // ========================================================================

    #[tokio::test]
    async fn fetch_failure_goes_to_error_channel() {
        let provider = DispatchProvider::standalone(
            Arc::new(FnCountryCodes::new(|| async {
                Err::<Vec<CountryCode>, _>(PhoneInputError::Fetch("Network unreachable".to_string()))
            })),
            PhoneInputConfig::default(),
        )
        .unwrap();
        let vm = ViewModel::new(Arc::new(provider.model("").unwrap()));
        vm.initialize();

        eventually(|| vm.operation_error_stream().current().is_ok()).await;
        assert_eq!(
            vm.operation_error_stream().current().unwrap().to_string(),
            "Network unreachable"
        );
        assert!(vm.model().all_codes_for_state(&substate(&vm)).is_err());
    }

    #[test]
    fn initialize_without_runtime_reports_error() {
        let vm = dispatch_view_model("");
        vm.initialize();
        assert!(matches!(
            vm.operation_error_stream().current(),
            Ok(PhoneInputError::Runtime(_))
        ));
    }

    #[tokio::test]
    async fn unwired_stream_instance_reports_uninitialized_sink() {
        let provider = StreamProvider::new(
            Arc::new(StaticCountryCodes::new(codes())),
            PhoneInputConfig::default(),
        )
        .unwrap();
        let vm = ViewModel::new(Arc::new(provider.model("never-registered").unwrap()));
        vm.initialize();

        assert_eq!(
            vm.operation_error_stream().current(),
            Ok(PhoneInputError::SinkUninitialized(Field::AllCodes))
        );

        vm.trigger_number_input(Some("1".to_string()));
        assert_eq!(
            vm.operation_error_stream().current(),
            Ok(PhoneInputError::SinkUninitialized(Field::Number))
        );
    }

    // ========================================================================
    // Teardown
    // ========================================================================

    #[tokio::test]
    async fn deinitialize_stops_pipeline() {
        let vm = dispatch_view_model("");
        vm.initialize();
        eventually(|| vm.selectable_codes_for_state(&substate(&vm)).is_ok()).await;

        assert!(vm.model().store().state_store().handler_count() > 0);
        vm.deinitialize();
        assert!(!vm.is_initialized());
        assert_eq!(vm.model().store().state_store().handler_count(), 0);

        vm.trigger_selected_country_code(CountryCode::new("Japan", "JP", "81"));
        vm.trigger_extension_query_input(Some("ger".to_string()));

        let state = substate(&vm);
        assert!(vm.extension_for_state(&state).is_err());
        // Query still written directly, but no longer refiltered.
        assert_eq!(vm.extension_query_for_state(&state).unwrap(), "ger");
        assert_eq!(vm.selectable_codes_for_state(&state).unwrap(), codes());
    }

    #[tokio::test]
    async fn late_fetch_result_is_ignored() {
        let (release, gate) = tokio::sync::oneshot::channel::<()>();
        let gate = Arc::new(Mutex::new(Some(gate)));
        let provider = DispatchProvider::standalone(
            Arc::new(FnCountryCodes::new(move || {
                let gate = gate.lock().unwrap().take();
                async move {
                    if let Some(gate) = gate {
                        let _ = gate.await;
                    }
                    Ok(codes())
                }
            })),
            PhoneInputConfig::default(),
        )
        .unwrap();
        let vm = ViewModel::new(Arc::new(provider.model("").unwrap()));
        vm.initialize();
        vm.deinitialize();
        let _ = release.send(());

        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(provider.store().snapshot().is_empty());
    }

    #[tokio::test]
    async fn observe_state_sees_substate() {
        let vm = dispatch_view_model("a");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_c = seen.clone();
        let _sub = vm.observe_state(move |substate| {
            if let Ok(number) = substate.string_at("number") {
                seen_c.lock().unwrap().push(number);
            }
        });

        vm.trigger_number_input(Some("12".to_string()));
        assert_eq!(*seen.lock().unwrap(), vec!["12".to_string()]);
        assert_eq!(vm.state_stream().current().string_at("number").unwrap(), "12");
    }

    #[test]
    fn format_for_display() {
        let vm = dispatch_view_model("");
        assert_eq!(
            vm.format_country_code(&CountryCode::new("Japan", "JP", "81")),
            "Japan (JP), 81"
        );
    }
}
