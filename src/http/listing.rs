//! HTML directory listings for directories without an `index.html`.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use axum::extract::State;
use axum::http::Uri;
use axum::response::Html;
use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::error::AppError;

/// One entry of a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    pub is_dir: bool,
}

/// Map a decoded URL path onto the served root.
///
/// Only plain path segments are accepted; `..`, absolute segments, and drive
/// prefixes reject the whole path.
pub fn resolve_under_root(root: &Path, url_path: &str) -> Option<PathBuf> {
    let mut resolved = root.to_path_buf();

    for segment in url_path.split('/').filter(|s| !s.is_empty()) {
        if segment.contains('\\') {
            return None;
        }
        for component in Path::new(segment).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }
    }

    Some(resolved)
}

/// Render a listing page. `display_path` is the decoded request path.
pub fn render_listing(display_path: &str, entries: &[ListingEntry]) -> String {
    let title = format!("Directory listing for {}", encode_text(display_path));

    let items: String = entries
        .iter()
        .map(|entry| {
            let suffix = if entry.is_dir { "/" } else { "" };
            let href = format!("{}{}", urlencoding::encode(&entry.name), suffix);
            format!(
                "<li><a href=\"{}\">{}{}</a></li>\n",
                encode_double_quoted_attribute(&href),
                encode_text(&entry.name),
                suffix
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
</head>
<body>
<h1>{title}</h1>
<hr>
<ul>
{items}</ul>
<hr>
</body>
</html>
"#
    )
}

async fn read_entries(dir: &Path) -> Result<Vec<ListingEntry>, AppError> {
    let mut read_dir = tokio::fs::read_dir(dir).await?;
    let mut entries = Vec::new();

    while let Some(entry) = read_dir.next_entry().await? {
        let is_dir = match entry.file_type().await {
            Ok(file_type) if file_type.is_symlink() => tokio::fs::metadata(entry.path())
                .await
                .map(|m| m.is_dir())
                .unwrap_or(false),
            Ok(file_type) => file_type.is_dir(),
            Err(_) => false,
        };
        entries.push(ListingEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir,
        });
    }

    entries.sort_by_key(|entry| entry.name.to_lowercase());
    Ok(entries)
}

/// Fallback handler behind the static file service.
///
/// Reached for anything the file service could not answer. Directories
/// requested with a trailing slash get a listing; everything else is a 404.
pub async fn directory_listing(
    State(root): State<Arc<PathBuf>>,
    uri: Uri,
) -> Result<Html<String>, AppError> {
    let raw_path = uri.path();
    if !raw_path.ends_with('/') {
        return Err(AppError::NotFound);
    }

    let decoded = urlencoding::decode(raw_path).map_err(|_| AppError::NotFound)?;
    let dir = resolve_under_root(&root, &decoded).ok_or(AppError::NotFound)?;

    let metadata = tokio::fs::metadata(&dir).await?;
    if !metadata.is_dir() {
        return Err(AppError::NotFound);
    }

    let entries = read_entries(&dir).await?;
    tracing::debug!(dir = %dir.display(), entries = entries.len(), "Rendered directory listing");

    Ok(Html(render_listing(&decoded, &entries)))
}
