//! Phone number input widget with a searchable country-code picker.
//!
//! The widget keeps five fields per instance in a shared flux store:
//!
//! | key          | value                                    |
//! |--------------|------------------------------------------|
//! | `allCodes`   | every country code, fetched once         |
//! | `selectable` | `allCodes` filtered by `extSearch`       |
//! | `extension`  | the selected `CountryCode`               |
//! | `number`     | the typed phone number                   |
//! | `extSearch`  | the picker's search query                |
//!
//! Fields live under `<root>` for the single-instance widget (id `""`) and
//! under `<root>.<id>` otherwise, so several widgets share one store without
//! interfering. Failures go to one shared operation-error path instead of
//! being rendered by the widget.
//!
//! # Layers
//!
//! - `Model`: typed reads over the instance paths and backend-specific write
//!   triggers. Two backends exist: `DispatchModel` (actions through a
//!   combined reducer) and `StreamModel` (one subject per field).
//! - `ViewModel`: the reactive pipeline. Fetches the codes, keeps
//!   `selectable` in sync with the query and turns a selection into an
//!   extension write plus a query reset.
//! - `PhoneInputProps`: the render-ready projection of one snapshot.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use phoneinput::{DispatchProvider, PhoneInputConfig, PhoneInputProps, StaticCountryCodes, ViewModel};
//!
//! let provider = DispatchProvider::standalone(
//!     Arc::new(StaticCountryCodes::from_json(CODES_JSON)?),
//!     PhoneInputConfig::default(),
//! )?;
//! let view_model = ViewModel::new(Arc::new(provider.model("checkout")?));
//! view_model.initialize();
//!
//! view_model.trigger_extension_query_input(Some("jap".into()));
//! let props = PhoneInputProps::from_view_model(&view_model, &provider.store().snapshot());
//! ```

pub mod config;
pub mod country_code;
pub mod dispatch;
pub mod error;
pub mod error_display;
pub mod field;
pub mod model;
pub mod provider;
pub mod stream;
pub mod view;
pub mod view_model;

pub use config::PhoneInputConfig;
pub use country_code::{CountryCode, filter_codes, format_country_code};
pub use dispatch::{
    DispatchModel, DispatchProvider, EmbedsPhoneInput, PhoneInputAction, WidgetAction, action_name,
    phone_input_reducer, reducer,
};
pub use error::PhoneInputError;
pub use error_display::{
    DISPLAY_ERROR, DispatchErrorDisplay, EmbedsErrorAction, ErrorAction, ErrorDisplay, ErrorSubjects,
    StreamErrorDisplay, error_reducer, register_error_reducer,
};
pub use field::{Field, FieldPaths};
pub use model::{FieldStream, Model};
pub use provider::{BoxFuture, CountryCodeProvider, FetchResult, FnCountryCodes, StaticCountryCodes};
pub use stream::{FieldSubjects, StreamActions, StreamModel, StreamProvider, register_stream_reducers};
pub use view::{CountryCodeItem, PhoneInputProps};
pub use view_model::{SubstateStream, ViewModel};
