use std::borrow::Cow;

use crate::error::HarvestError;

pub const FLOATING_BRANCH: &str = "main";

pub const DEFAULT_DOC_EXTENSION: &str = "md";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceHost {
    GitHub,
    GitLab { subgroup: bool },
}

impl SourceHost {
    pub fn detect(code_url: &str) -> Result<Self, HarvestError> {
        let code_url = trim_root(code_url);
        if code_url.contains("github.com") {
            return Ok(Self::GitHub);
        }
        if code_url.contains("gitlab") {
            // scheme `//` + host + group + project is four slashes; any more is a subgroup
            let subgroup = code_url.matches('/').count() > 4;
            return Ok(Self::GitLab { subgroup });
        }
        Err(HarvestError::UnsupportedHost {
            code_url: code_url.to_owned(),
        })
    }

    /// Segment inserted between the project URL and `blob`/`raw`.
    fn project_separator(self) -> &'static str {
        match self {
            Self::GitLab { subgroup: false } => "/-",
            Self::GitHub | Self::GitLab { subgroup: true } => "",
        }
    }
}

pub fn browse_url(code_url: &str, revision: &str, path: &str) -> Result<String, HarvestError> {
    let host = SourceHost::detect(code_url)?;
    let root = trim_root(code_url);
    let path = with_default_extension(path);
    let sep = host.project_separator();
    Ok(format!("{root}{sep}/blob/{revision}/{path}"))
}

pub fn raw_url(code_url: &str, revision: &str, path: &str) -> Result<String, HarvestError> {
    let host = SourceHost::detect(code_url)?;
    let root = trim_root(code_url);
    let path = with_default_extension(path);
    let url = match host {
        SourceHost::GitHub if revision == FLOATING_BRANCH => {
            format!("{root}/raw/refs/heads/{FLOATING_BRANCH}/{path}")
        }
        SourceHost::GitHub => format!("{root}/raw/refs/tags/{revision}/{path}"),
        SourceHost::GitLab { .. } => {
            let sep = host.project_separator();
            format!("{root}{sep}/raw/{revision}/{path}")
        }
    };
    Ok(url)
}

/// Appends `.md` to paths whose last segment has no extension.
pub fn with_default_extension(path: &str) -> Cow<'_, str> {
    if extension(path).is_some() {
        Cow::Borrowed(path)
    } else {
        Cow::Owned(format!("{path}.{DEFAULT_DOC_EXTENSION}"))
    }
}

/// Extension of the last path segment, ignoring leading dots (`.nojekyll`).
pub fn extension(path: &str) -> Option<&str> {
    let name = file_name(path);
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => Some(&name[idx + 1..]),
        _ => None,
    }
}

pub fn with_extension(path: &str, new_extension: &str) -> String {
    match extension(path) {
        Some(ext) => {
            let stem = &path[..path.len() - ext.len() - 1];
            format!("{stem}.{new_extension}")
        }
        None => format!("{path}.{new_extension}"),
    }
}

/// Resolves `relative` against the directory that holds `toc_path`.
pub fn beside(toc_path: &str, relative: &str) -> String {
    let relative = relative.trim_start_matches("./");
    match toc_path.rfind('/') {
        Some(idx) => format!("{}/{relative}", &toc_path[..idx]),
        None => relative.to_owned(),
    }
}

pub fn repository_name(code_url: &str) -> &str {
    file_name(trim_root(code_url))
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn trim_root(code_url: &str) -> &str {
    code_url.trim_end_matches('/')
}
