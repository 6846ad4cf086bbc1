use phoneinput_flux::State;
use serde::Serialize;

use crate::country_code::CountryCode;
use crate::view_model::ViewModel;

/// Render-ready props of one widget. Absent fields render empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneInputProps {
    pub id: String,
    /// `+<calling code>`, or empty before a selection.
    pub extension: String,
    pub number: String,
    pub extension_query: String,
    pub items: Vec<CountryCodeItem>,
}

/// One row of the selectable list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountryCodeItem {
    pub code: CountryCode,
    pub label: String,
}

impl PhoneInputProps {
    /// `state` is a full store snapshot.
    pub fn from_view_model(view_model: &ViewModel, state: &State) -> Self {
        let substate = view_model.substate(state);
        let items = view_model
            .selectable_codes_for_state(&substate)
            .unwrap_or_default()
            .into_iter()
            .map(|code| CountryCodeItem {
                label: view_model.format_country_code(&code),
                code,
            })
            .collect();

        Self {
            id: view_model.id().to_string(),
            extension: view_model.extension_for_state(&substate).unwrap_or_default(),
            number: view_model.number_for_state(&substate).unwrap_or_default(),
            extension_query: view_model.extension_query_for_state(&substate).unwrap_or_default(),
            items,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
