use std::fmt;

/// Failures of the acquisition, resolution and merge steps for one book.
#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    #[error("unsupported source host (only GitHub and GitLab): {code_url}")]
    UnsupportedHost { code_url: String },

    /// A descriptor file has no matching entry in the live navigation.
    #[error("title not found for '{file}' (looked up as '{lookup}')")]
    TitleNotFound { file: String, lookup: String },

    #[error("unsupported content entry: {0}")]
    UnsupportedContentKind(UnsupportedContent),

    #[error("malformed toc descriptor {url}: {reason}")]
    MalformedDescriptor { url: String, reason: String },

    #[error("malformed book config {url}: {reason}")]
    MalformedConfig { url: String, reason: String },

    #[error("no navigation container (#bd-docs-nav or .bd-docs-nav) in {url}")]
    NavNotFound { url: String },

    #[error("GET {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("GET {url}: unexpected status {status}")]
    HttpStatus { url: String, status: u16 },
}

/// Why a descriptor node could not be turned into a [`crate::formats::TocEntry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnsupportedContent {
    /// Content pulled in from a third-party repository.
    External(String),
    /// A node that declares neither a file, a url+title pair nor an external.
    Unknown(String),
}

impl fmt::Display for UnsupportedContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::External(url) => write!(f, "external content is not supported ({url})"),
            Self::Unknown(entry) => write!(f, "unknown type of content entry: {entry}"),
        }
    }
}

impl HarvestError {
    #[must_use]
    pub fn is_title_not_found(&self) -> bool {
        matches!(self, Self::TitleNotFound { .. })
    }
}
