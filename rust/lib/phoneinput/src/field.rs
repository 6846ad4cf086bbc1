use std::fmt;

use phoneinput_flux::{StateError, StatePath};

use crate::config::PhoneInputConfig;

/// The five values a widget instance keeps in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    /// Every fetched country code.
    AllCodes,
    /// `AllCodes` filtered by the current query.
    SelectableCodes,
    /// The selected country code.
    Extension,
    /// The typed phone number.
    Number,
    /// The extension search query.
    ExtensionQuery,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::AllCodes,
        Field::SelectableCodes,
        Field::Extension,
        Field::Number,
        Field::ExtensionQuery,
    ];

    /// Key of the field inside the instance substate.
    pub fn key(self) -> &'static str {
        match self {
            Field::AllCodes => "allCodes",
            Field::SelectableCodes => "selectable",
            Field::Extension => "extension",
            Field::Number => "number",
            Field::ExtensionQuery => "extSearch",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Resolved paths of one widget instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPaths {
    substate: StatePath,
    fields: [StatePath; 5],
}

impl FieldPaths {
    pub fn new(config: &PhoneInputConfig, id: &str) -> Result<Self, StateError> {
        let substate = config.resolve_substate_path(id)?;
        let fields = [
            substate.child(Field::AllCodes.key())?,
            substate.child(Field::SelectableCodes.key())?,
            substate.child(Field::Extension.key())?,
            substate.child(Field::Number.key())?,
            substate.child(Field::ExtensionQuery.key())?,
        ];
        Ok(Self { substate, fields })
    }

    pub fn substate(&self) -> &StatePath {
        &self.substate
    }

    pub fn path(&self, field: Field) -> &StatePath {
        &self.fields[field.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &StatePath)> {
        Field::ALL.into_iter().map(|field| (field, self.path(field)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_instance_paths() {
        let paths = FieldPaths::new(&PhoneInputConfig::default(), "").unwrap();
        assert_eq!(paths.substate().as_str(), "phoneinput");
        assert_eq!(paths.path(Field::AllCodes).as_str(), "phoneinput.allCodes");
        assert_eq!(paths.path(Field::SelectableCodes).as_str(), "phoneinput.selectable");
        assert_eq!(paths.path(Field::Extension).as_str(), "phoneinput.extension");
        assert_eq!(paths.path(Field::Number).as_str(), "phoneinput.number");
        assert_eq!(paths.path(Field::ExtensionQuery).as_str(), "phoneinput.extSearch");
    }

    #[test]
    fn named_instance_paths() {
        let paths = FieldPaths::new(&PhoneInputConfig::default(), "checkout").unwrap();
        assert_eq!(paths.substate().as_str(), "phoneinput.checkout");
        assert_eq!(paths.path(Field::Number).as_str(), "phoneinput.checkout.number");
    }

    #[test]
    fn every_field_path_is_a_child_of_the_substate() {
        let paths = FieldPaths::new(&PhoneInputConfig::default(), "a").unwrap();
        for (field, path) in paths.iter() {
            assert_eq!(path.strip_prefix(paths.substate()), Some(field.key()));
        }
    }

    #[test]
    fn custom_root_and_separator() {
        let config = PhoneInputConfig {
            root: "forms/phone".to_string(),
            separator: '/',
            ..PhoneInputConfig::default()
        };
        let paths = FieldPaths::new(&config, "x").unwrap();
        assert_eq!(paths.path(Field::ExtensionQuery).as_str(), "forms/phone/x/extSearch");
    }

    #[test]
    fn malformed_id_is_rejected() {
        let err = FieldPaths::new(&PhoneInputConfig::default(), "a.b").unwrap_err();
        assert!(matches!(err, StateError::MalformedPath(_)));
    }
}
