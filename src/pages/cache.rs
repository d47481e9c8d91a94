//! Cache artifact addressing and file I/O.
//!
//! # Path Derivation
//! ```text
//! ""  or "/a/b/"       → <root>/a/b/index.html          (nested folders)
//! "/en/about"          → <root>/en_about.html
//! "/en/about.html"     → <root>/en_about.html
//! "/en/a_b.html"       → <root>/en_a%5Fb.html
//! "/index.html"        → <root>/%69ndex.html
//! ```
//! Flat names escape `%` and `_` before `/` becomes `_`, so distinct paths
//! never share an artifact. A flat name that would shadow the root
//! `index.html` has its first byte percent-encoded. `/x` and `/x.html` name
//! the same page on purpose.

use std::io;
use std::path::{Path, PathBuf};

use crate::http::request::ends_with_html;

const DIRECTORY_INDEX: &str = "index.html";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CachePathError {
    #[error("path segment '{0}' is not allowed in a cache key")]
    ForbiddenSegment(String),
}

/// The on-disk page cache rooted at one directory.
#[derive(Debug, Clone)]
pub struct PageCache {
    root: PathBuf,
}

impl PageCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Artifact path for a request path.
    pub fn cache_file_path(&self, request_path: &str) -> Result<PathBuf, CachePathError> {
        let trimmed = request_path.trim_matches('/');
        let segments: Vec<&str> = trimmed.split('/').filter(|s| !s.is_empty()).collect();
        for segment in &segments {
            if *segment == "." || *segment == ".." || segment.contains('\\') || segment.contains('\0') {
                return Err(CachePathError::ForbiddenSegment(segment.to_string()));
            }
        }

        if request_path.is_empty() || request_path.ends_with('/') {
            let mut path = self.root.clone();
            path.extend(&segments);
            path.push(DIRECTORY_INDEX);
            return Ok(path);
        }

        let mut file_name = flatten(&segments);
        if !ends_with_html(trimmed) {
            file_name.push_str(".html");
        }
        if file_name.eq_ignore_ascii_case(DIRECTORY_INDEX) {
            let first = format!("%{:02X}", file_name.as_bytes()[0]);
            file_name.replace_range(..1, &first);
        }
        Ok(self.root.join(file_name))
    }

    /// Read an artifact as raw bytes. A missing file is `Ok(None)`.
    pub async fn read(&self, file: &Path) -> io::Result<Option<Vec<u8>>> {
        match tokio::fs::read(file).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Persist an artifact, creating parent directories.
    ///
    /// Content goes to a unique temp file first and is renamed into place.
    pub async fn write(&self, file: &Path, content: &[u8]) -> io::Result<()> {
        let parent = file.parent().unwrap_or(&self.root);
        tokio::fs::create_dir_all(parent).await?;

        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let temp = parent.join(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4().simple()));

        tokio::fs::write(&temp, content).await?;
        if let Err(e) = tokio::fs::rename(&temp, file).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e);
        }
        Ok(())
    }
}

fn flatten(segments: &[&str]) -> String {
    let mut out = String::new();
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            out.push('_');
        }
        for c in segment.chars() {
            match c {
                '%' => out.push_str("%25"),
                '_' => out.push_str("%5F"),
                c => out.push(c),
            }
        }
    }
    out
}
