use serde::Deserialize;
use serde::Serialize;

use crate::PYGMENTS_STYLE_MODULE;

/// HTML handed back to the host, plus the stylesheet modules it must register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedFragment {
    pub html: String,
    #[serde(default)]
    pub style_modules: Vec<String>,
}

impl RenderedFragment {
    /// A fragment that needs the Pygments stylesheet.
    pub fn with_pygments_styles(html: String) -> Self {
        Self {
            html,
            style_modules: vec![PYGMENTS_STYLE_MODULE.to_string()],
        }
    }
}
