//! Flux: path-addressed state store with reactive primitives.
//!
//! A Redux-like state container: one immutable `State` tree, replaced by pure
//! reducers, observed through trie-matched subscriptions and a snapshot
//! stream. Two write backends sit on top of the same `StateStore`:
//!
//! - `DispatchStore<A>`: writes are actions run through one combined reducer.
//! - `StreamStore`: writes are values pushed on `Subject`s, each folded in
//!   by its own reducer.
//!
//! # Path Addressing
//!
//! State lives in a flat namespace of separator-joined paths (`.` by
//! default): `phoneinput.number`, `phoneinput.checkout.extSearch`,
//! `error.operation`. `State::substate(prefix)` cuts a subtree out with the
//! prefix stripped.
//!
//! # Trie Pattern Matching
//!
//! Subscriptions use MQTT-style wildcards:
//! - Exact: `phoneinput.number`
//! - Single-level: `phoneinput.+.number` matches every instance's number
//! - Multi-level: `phoneinput.checkout.#` matches the whole instance subtree
//! - All: `#`
//!
//! # Cascades
//!
//! Subscribers run synchronously with no lock held and may write again. The
//! snapshot stream is published once per outermost write, so a derived value
//! written in reaction to a change is never observed apart from its cause.
//!
//! # Example
//!
//! ```ignore
//! use phoneinput_flux::{StateStore, StatePath};
//!
//! let store = Arc::new(StateStore::new());
//! let query = StatePath::parse("phoneinput.extSearch")?;
//!
//! let _sub = store.observe(query.as_str(), |path, state| {
//!     println!("{} = {:?}", path, state.string_at(path));
//! });
//! store.set(&query, "ger".to_string());
//! ```

pub mod dispatch;
pub mod error;
pub mod path;
pub mod state;
pub mod store;
pub mod stream;
pub mod subject;
pub mod subscription;
pub mod trie;
pub mod value;
pub mod value_stream;

// Re-export primary types at crate root.
pub use dispatch::{DispatchStore, Reducer};
pub use error::StateError;
pub use path::{DEFAULT_SEPARATOR, StatePath};
pub use state::State;
pub use store::{ChangeHandler, StateStore, Store};
pub use stream::StreamStore;
pub use subject::{Sink, Subject};
pub use subscription::{Subscription, SubscriptionBag};
pub use value::{StateValue, SubscriptionId};
pub use value_stream::ValueStream;
