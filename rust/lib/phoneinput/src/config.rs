use phoneinput_flux::{DEFAULT_SEPARATOR, StateError, StatePath};
use tracing::warn;

/// Where the widget keeps its state inside the shared store.
///
/// Hosts embedding several features in one store pick the root and the
/// error path so they do not collide with their own paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneInputConfig {
    /// First segment(s) of every widget path.
    pub root: String,

    /// Separator between path segments.
    pub separator: char,

    /// Path of the shared operation-error value, written with `separator`.
    pub error_path: String,
}

impl Default for PhoneInputConfig {
    fn default() -> Self {
        Self {
            root: "phoneinput".to_string(),
            separator: DEFAULT_SEPARATOR,
            error_path: "error.operation".to_string(),
        }
    }
}

impl PhoneInputConfig {
    /// Parse configuration from command-line style arguments.
    ///
    /// Supported flags:
    /// - `--phoneinput-root=NAME`
    /// - `--substate-separator=CHAR`
    /// - `--error-path=PATH`
    ///
    /// Unknown arguments are ignored.
    pub fn from_args(args: &[String]) -> Self {
        let mut config = PhoneInputConfig::default();

        for arg in args {
            if let Some(val) = arg.strip_prefix("--phoneinput-root=") {
                config.root = val.to_string();
            } else if let Some(val) = arg.strip_prefix("--substate-separator=") {
                let mut chars = val.chars();
                match (chars.next(), chars.next()) {
                    (Some(sep), None) => config.separator = sep,
                    _ => warn!(value = val, "ignoring separator, expected one character"),
                }
            } else if let Some(val) = arg.strip_prefix("--error-path=") {
                config.error_path = val.to_string();
            }
        }

        config
    }

    /// Substate path of one widget instance: `root` for the empty id,
    /// `root<sep>id` otherwise.
    pub fn resolve_substate_path(&self, id: &str) -> Result<StatePath, StateError> {
        let root = StatePath::parse_with(&self.root, self.separator)?;
        if id.is_empty() {
            Ok(root)
        } else {
            root.child(id)
        }
    }

    pub fn resolve_error_path(&self) -> Result<StatePath, StateError> {
        StatePath::parse_with(&self.error_path, self.separator)
    }
}
