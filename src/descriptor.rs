use serde_yaml::Value;

use crate::error::HarvestError;
use crate::fetch::Fetcher;
use crate::formats::CatalogItem;
use crate::host;

/// A `_toc.yml` in the jupyter-book grammar: a `root` file and either
/// `parts` (each with a `caption` and `chapters`) or a flat `chapters` list.
/// Nodes stay loosely typed; the merge decides what each one is.
#[derive(Debug, Clone, PartialEq)]
pub struct RawToc {
    source: String,
    root: String,
    body: Value,
}

impl RawToc {
    /// Parses descriptor text. `source` names the descriptor in errors.
    pub fn from_yaml(source: &str, text: &str) -> Result<Self, HarvestError> {
        let value: Value =
            serde_yaml::from_str(text).map_err(|err| malformed(source, err.to_string()))?;
        if !value.is_mapping() {
            return Err(malformed(source, "top level is not a mapping"));
        }
        let root = str_field(&value, "root")
            .ok_or_else(|| malformed(source, "missing `root` file"))?
            .to_owned();

        match value.get("parts") {
            Some(parts) if !parts.is_sequence() => {
                return Err(malformed(source, "`parts` is not a list"));
            }
            Some(_) => {}
            None if !value.get("chapters").is_some_and(Value::is_sequence) => {
                return Err(malformed(source, "missing `parts` or `chapters` list"));
            }
            None => {}
        }

        Ok(Self {
            source: source.to_owned(),
            root,
            body: value,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Root document, relative to the descriptor's directory.
    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn parts(&self) -> Option<&[Value]> {
        self.body
            .get("parts")
            .and_then(Value::as_sequence)
            .map(Vec::as_slice)
    }

    pub fn chapters(&self) -> &[Value] {
        children(&self.body, "chapters")
    }
}

pub(crate) fn malformed(source: &str, reason: impl Into<String>) -> HarvestError {
    HarvestError::MalformedDescriptor {
        url: source.to_owned(),
        reason: reason.into(),
    }
}

/// Downloads and parses the descriptor pinned at the book's revision.
pub async fn toc_from_code(
    fetcher: &dyn Fetcher,
    item: &CatalogItem,
) -> Result<RawToc, HarvestError> {
    let url = host::raw_url(&item.code_url, &item.release, &item.toc_path)?;
    let text = fetcher.get_text(&url).await?;
    RawToc::from_yaml(&url, &text)
}

pub fn children<'a>(node: &'a Value, key: &str) -> &'a [Value] {
    node.get(key)
        .and_then(Value::as_sequence)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

pub fn str_field<'a>(node: &'a Value, key: &str) -> Option<&'a str> {
    node.get(key).and_then(Value::as_str)
}

/// Compact single-line rendering of a node for error messages.
pub fn describe(node: &Value) -> String {
    serde_json::to_string(node).unwrap_or_else(|_| format!("{node:?}"))
}
