use serde::{Deserialize, Serialize};

/// A country calling code entry, identified by `code`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryCode {
    pub name: String,
    pub code: String,
    pub calling_code: String,
}

impl CountryCode {
    pub fn new(
        name: impl Into<String>,
        code: impl Into<String>,
        calling_code: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
            calling_code: calling_code.into(),
        }
    }

    /// True if name, code or calling code contains the already-lowercased
    /// query.
    fn matches_lowercase(&self, query: &str) -> bool {
        self.name.to_lowercase().contains(query)
            || self.code.to_lowercase().contains(query)
            || self.calling_code.to_lowercase().contains(query)
    }
}

/// Codes whose name, code or calling code contains `query`, ignoring case.
///
/// Order is preserved. An empty query keeps everything.
pub fn filter_codes(codes: &[CountryCode], query: &str) -> Vec<CountryCode> {
    let query = query.to_lowercase();
    codes
        .iter()
        .filter(|cc| cc.matches_lowercase(&query))
        .cloned()
        .collect()
}

/// `"<name> (<code>), <calling code>"`.
pub fn format_country_code(cc: &CountryCode) -> String {
    format!("{} ({}), {}", cc.name, cc.code, cc.calling_code)
}
