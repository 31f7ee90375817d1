use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use syntaxhighlight_core::write_atomic;
use toml_edit::DocumentMut;
use toml_edit::Item as TomlItem;
use toml_edit::value;

use crate::path_utils::expand_tilde;

/// Values read from `config.toml`. Absent keys stay `None` so CLI flags and built-in
/// defaults can fill them in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HighlightConfig {
    /// Command line used to run the highlighter, split with shell-word rules.
    pub pygmentize: Option<String>,
    pub timeout_secs: Option<u64>,
    pub use_tidy: Option<bool>,
    pub cache_dir: Option<PathBuf>,
    pub lexer_list: Option<PathBuf>,
    /// Extra content-model to lexer mappings, merged over the built-in ones.
    pub content_models: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn new_default() -> anyhow::Result<Self> {
        let Some(home) = dirs::home_dir() else {
            anyhow::bail!("cannot determine home directory for config path");
        };
        Ok(Self::new(default_config_path(&home)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the config file. A missing file yields the empty config.
    pub fn load(&self) -> anyhow::Result<HighlightConfig> {
        let Some(content) = read_document_string(&self.path)? else {
            return Ok(HighlightConfig::default());
        };
        let doc = content
            .parse::<DocumentMut>()
            .with_context(|| format!("parse {}", self.path.display()))?;

        Ok(HighlightConfig {
            pygmentize: read_string(&doc, "pygmentize"),
            timeout_secs: doc
                .get("timeout_secs")
                .and_then(TomlItem::as_integer)
                .and_then(|secs| u64::try_from(secs).ok()),
            use_tidy: doc.get("use_tidy").and_then(TomlItem::as_bool),
            cache_dir: read_string(&doc, "cache_dir").map(|p| expand_tilde(Path::new(&p))),
            lexer_list: read_string(&doc, "lexer_list").map(|p| expand_tilde(Path::new(&p))),
            content_models: read_content_models(&doc),
        })
    }

    /// Points `lexer_list` at `path`, keeping the rest of the file (comments included).
    pub fn set_lexer_list(&self, path: &Path) -> anyhow::Result<()> {
        let content = read_document_string(&self.path)?.unwrap_or_default();
        let mut doc = content
            .parse::<DocumentMut>()
            .with_context(|| format!("parse {}", self.path.display()))?;
        doc["lexer_list"] = value(path.display().to_string());
        write_atomic(&self.path, doc.to_string().as_bytes())
            .with_context(|| format!("write {}", self.path.display()))
    }
}

pub fn default_config_path(home: &Path) -> PathBuf {
    default_data_dir(home).join("config.toml")
}

pub fn default_data_dir(home: &Path) -> PathBuf {
    home.join(".syntaxhighlight")
}

fn read_string(doc: &DocumentMut, key: &str) -> Option<String> {
    doc.get(key)
        .and_then(TomlItem::as_str)
        .map(str::to_string)
}

fn read_content_models(doc: &DocumentMut) -> BTreeMap<String, String> {
    let Some(table) = doc.get("content_models").and_then(TomlItem::as_table_like) else {
        return BTreeMap::new();
    };
    table
        .iter()
        .filter_map(|(model, lexer)| Some((model.to_string(), lexer.as_str()?.to_string())))
        .collect()
}

fn read_document_string(path: &Path) -> anyhow::Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(anyhow::Error::new(err).context("read config.toml")),
    }
}
