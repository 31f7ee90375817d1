use serde::Deserialize;
use serde::Serialize;

/// Options a document author attaches to a highlight tag.
///
/// Mirrors the documented tag attributes: `lang`, `line`, `highlight`, `start`, `enclose`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderArgs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    /// Presence of the `line` attribute enables line numbers; its value is ignored.
    #[serde(default)]
    pub line: bool,
    /// Line-range spec such as `3,5-10,22`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enclose: Option<String>,
}

impl RenderArgs {
    /// Builds arguments from raw tag attributes. Unknown attributes are ignored.
    pub fn from_attributes<I, K, V>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut args = Self::default();
        for (name, value) in attributes {
            match name.as_ref() {
                "lang" => args.lang = Some(value.into()),
                "line" => args.line = true,
                "highlight" => args.highlight = Some(value.into()),
                "start" => args.start = Some(value.into()),
                "enclose" => args.enclose = Some(value.into()),
                _ => {}
            }
        }
        args
    }

    /// `enclose="span"` selects inline rendering; any other value keeps block mode.
    pub fn is_inline(&self) -> bool {
        self.enclose.as_deref() == Some("span")
    }
}
