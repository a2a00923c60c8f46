use documented::{Documented, DocumentedFields};
use serde::{Deserialize, Serialize};

/// Terminal output settings
#[derive(Clone, Debug, Default, Deserialize, Serialize, Documented, DocumentedFields)]
pub struct DisplaySettings {
    /// Show live progress while repositories are cloned or pulled
    /// Default: true
    pub progress: Option<bool>,

    /// Show unicode icons/symbols in output
    /// Default: true
    pub icons: Option<bool>,

    /// Show a spinner for each repository being mirrored
    /// Default: true
    pub spinners: Option<bool>,
}

impl DisplaySettings {
    pub fn progress(&self) -> bool {
        self.progress.unwrap_or(true)
    }

    pub fn icons(&self) -> bool {
        self.icons.unwrap_or(true)
    }

    pub fn spinners(&self) -> bool {
        self.spinners.unwrap_or(true)
    }
}
