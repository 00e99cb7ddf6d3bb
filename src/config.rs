use serde::Deserialize;

use crate::error::HarvestError;
use crate::fetch::Fetcher;
use crate::formats::{CatalogItem, Config};
use crate::host;

pub const CONFIG_FILE: &str = "_config.yml";

/// Title left in books created from the TeachBooks template.
pub const DEFAULT_PLACEHOLDER_TITLE: &str = "Template";

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    title: Option<String>,
    author: Option<String>,
    logo: Option<String>,
    sphinx: Option<SphinxSection>,
}

#[derive(Debug, Default, Deserialize)]
struct SphinxSection {
    config: Option<SphinxConfig>,
}

#[derive(Debug, Default, Deserialize)]
struct SphinxConfig {
    html_theme_options: Option<ThemeOptions>,
    #[serde(default)]
    html_static_path: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ThemeOptions {
    logo: Option<ThemeLogo>,
}

#[derive(Debug, Default, Deserialize)]
struct ThemeLogo {
    image_light: Option<String>,
}

pub async fn config_from_code(
    fetcher: &dyn Fetcher,
    item: &CatalogItem,
) -> Result<Config, HarvestError> {
    let url = host::raw_url(
        &item.code_url,
        &item.release,
        &host::beside(&item.toc_path, CONFIG_FILE),
    )?;
    let text = fetcher.get_text(&url).await?;
    resolve_config(item, &url, &text)
}

/// Resolves a fetched config. `source` names the file in errors.
pub fn resolve_config(
    item: &CatalogItem,
    source: &str,
    text: &str,
) -> Result<Config, HarvestError> {
    let malformed = |reason: String| HarvestError::MalformedConfig {
        url: source.to_owned(),
        reason,
    };

    let file: ConfigFile = serde_yaml::from_str(text).map_err(|err| malformed(err.to_string()))?;

    let logo_path = match file.logo.as_deref() {
        Some(logo) => host::beside(&item.toc_path, logo),
        None => {
            let sphinx = file
                .sphinx
                .as_ref()
                .and_then(|s| s.config.as_ref())
                .ok_or_else(|| malformed("missing `logo` and `sphinx.config`".to_owned()))?;
            let image = sphinx
                .html_theme_options
                .as_ref()
                .and_then(|o| o.logo.as_ref())
                .and_then(|l| l.image_light.as_deref())
                .ok_or_else(|| {
                    let key = "sphinx.config.html_theme_options.logo.image_light";
                    malformed(format!("missing `{key}`"))
                })?;
            let static_dir = sphinx
                .html_static_path
                .first()
                .ok_or_else(|| malformed("missing `sphinx.config.html_static_path`".to_owned()))?;
            let static_dir = host::beside(&item.toc_path, static_dir.trim_end_matches('/'));
            format!("{static_dir}/{image}")
        }
    };
    let logo = host::raw_url(&item.code_url, &item.release, &logo_path)?;

    let title = file
        .title
        .ok_or_else(|| malformed("missing `title`".to_owned()))?;
    let author = file
        .author
        .ok_or_else(|| malformed("missing `author`".to_owned()))?;

    Ok(Config { title, logo, author })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitlePolicy {
    Keep,
    /// Replace a title equal to the placeholder with the repository name.
    ReplacePlaceholder(String),
}

impl Default for TitlePolicy {
    fn default() -> Self {
        Self::ReplacePlaceholder(DEFAULT_PLACEHOLDER_TITLE.to_owned())
    }
}

impl TitlePolicy {
    #[must_use]
    pub fn apply(&self, mut config: Config, repository_name: &str) -> Config {
        if let Self::ReplacePlaceholder(placeholder) = self
            && config.title == *placeholder
        {
            config.title = repository_name.to_owned();
        }
        config
    }
}
