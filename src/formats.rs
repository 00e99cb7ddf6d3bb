use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub html_url: String,
    pub code_url: String,
    pub release: String,
    pub toc_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub title: String,
    pub logo: String,
    pub author: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    pub title: String,
    pub html_url: Option<String>,
    pub external_url: Option<String>,
    pub children: Vec<TocEntry>,
}

impl TocEntry {
    pub fn content(
        title: impl Into<String>,
        html_url: impl Into<String>,
        external_url: Option<String>,
    ) -> Self {
        Self {
            title: title.into(),
            html_url: Some(html_url.into()),
            external_url,
            children: Vec::new(),
        }
    }

    pub fn group(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            html_url: None,
            external_url: None,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_group(&self) -> bool {
        self.html_url.is_none() && self.external_url.is_none()
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(TocEntry::node_count).sum::<usize>()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItemWithToc {
    #[serde(flatten)]
    pub item: CatalogItem,
    #[serde(flatten)]
    pub config: Config,
    pub toc: TocEntry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavLink {
    pub path: String,
    pub title: String,
}

impl NavLink {
    pub fn new(path: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            title: title.into(),
        }
    }
}

pub type NavIndex = Vec<NavLink>;
