/// Both write backends over one shared state store.

use std::sync::{Arc, Mutex};

use phoneinput_flux::*;

#[derive(Debug)]
enum Action {
    SetQuery(String),
}

fn query_path() -> StatePath {
    StatePath::parse("search.query").unwrap()
}

fn results_path() -> StatePath {
    StatePath::parse("search.results").unwrap()
}

#[tokio::test]
async fn backends_share_one_state() {
    let shared = Arc::new(StateStore::new());
    let dispatch = DispatchStore::with_store(Arc::clone(&shared), |state: &State, action: &Action| {
        match action {
            Action::SetQuery(query) => state.updating(&query_path(), Some(query.clone())),
        }
    });
    let streams = StreamStore::with_store(Arc::clone(&shared));
    let counter = Subject::replay(0u32);
    streams.register(&counter, |state, n| {
        state.updating(&StatePath::parse("search.count").unwrap(), Some(*n))
    });

    dispatch.dispatch(Action::SetQuery("ger".to_string()));
    counter.next(3);

    let snapshot = streams.snapshot();
    assert_eq!(snapshot.string_at("search.query").unwrap(), "ger");
    assert_eq!(snapshot.typed_at::<u32>("search.count").unwrap(), 3);
    assert!(dispatch.snapshot().ptr_eq(&snapshot));
}

#[tokio::test]
async fn derived_write_commits_with_its_cause() {
    let store = Arc::new(StateStore::new());
    let writer = Arc::downgrade(&store);
    let _derive = store.observe(query_path().as_str(), move |path, state| {
        let Some(store) = writer.upgrade() else { return };
        let query = state.string_at(path).unwrap_or_default();
        store.set(&results_path(), query.len());
    });

    let mut snapshots = store.state_stream();
    store.set(&query_path(), "japan".to_string());

    snapshots.changed().await.unwrap();
    let published = snapshots.borrow_and_update().clone();
    assert_eq!(published.string_at("search.query").unwrap(), "japan");
    assert_eq!(published.typed_at::<usize>("search.results").unwrap(), 5);
    assert!(!snapshots.has_changed().unwrap());
}

#[test]
fn wildcard_subscribers_see_every_instance() {
    let store = Arc::new(StateStore::new());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_c = seen.clone();
    let sub = store.observe("phoneinput.+.number", move |path, _| {
        seen_c.lock().unwrap().push(path.to_string());
    });

    store.set(&StatePath::parse("phoneinput.a.number").unwrap(), "1".to_string());
    store.set(&StatePath::parse("phoneinput.b.number").unwrap(), "2".to_string());
    store.set(&StatePath::parse("phoneinput.a.extSearch").unwrap(), "x".to_string());
    sub.unsubscribe();
    store.set(&StatePath::parse("phoneinput.c.number").unwrap(), "3".to_string());

    assert_eq!(
        *seen.lock().unwrap(),
        vec!["phoneinput.a.number".to_string(), "phoneinput.b.number".to_string()]
    );
}

#[test]
fn value_stream_tracks_one_path() {
    let store = Arc::new(StateStore::new());
    let stream: ValueStream<String> = ValueStream::new(Arc::clone(&store), query_path());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_c = seen.clone();
    let _sub = stream.subscribe(move |value| seen_c.lock().unwrap().push(value.ok()));

    store.set(&query_path(), "a".to_string());
    store.set(&results_path(), 1usize);
    store.clear(&query_path());

    assert_eq!(*seen.lock().unwrap(), vec![None, Some("a".to_string()), None]);
}
