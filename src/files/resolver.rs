use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};

use bytes::Bytes;

use crate::http::response::StatusCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveError {
    /// The normalized path would leave the document root.
    PathTraversal,
    /// Nothing readable at the path, or a directory without an index file.
    NotFound,
}

impl ResolveError {
    pub fn response_status(&self) -> StatusCode {
        match self {
            ResolveError::PathTraversal => StatusCode::BadRequest,
            ResolveError::NotFound => StatusCode::NotFound,
        }
    }
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::PathTraversal => f.write_str("path escapes the document root"),
            ResolveError::NotFound => f.write_str("file not found"),
        }
    }
}

impl std::error::Error for ResolveError {}

/// A file below the document root that a request maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    pub path: PathBuf,
    pub size: u64,
    /// Always false: directories resolve to their index file or fail.
    pub is_dir: bool,
}

impl ResolvedFile {
    /// Final path component, used for Content-Type inference.
    pub fn name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }
}

/// Maps request paths onto files under a document root.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
    index_file: String,
}

impl PathResolver {
    pub fn new(root: impl Into<PathBuf>, index_file: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            index_file: index_file.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Turns a raw request path into a path relative to the root.
    ///
    /// Query and fragment are dropped, `.` and empty segments vanish and `..`
    /// removes the previous segment. Popping past the root is
    /// `PathTraversal`. No filesystem access happens here.
    pub fn normalize(&self, raw: &str) -> Result<PathBuf, ResolveError> {
        let path = raw.split(['?', '#']).next().unwrap_or_default();

        if path == "/" {
            return Ok(PathBuf::from(&self.index_file));
        }

        let path = path.strip_prefix('/').unwrap_or(path);
        let mut segments: Vec<&str> = Vec::new();

        for segment in path.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop().ok_or(ResolveError::PathTraversal)?;
                }
                other => {
                    // Backslashes and drive prefixes are separators or roots
                    // on some platforms; only plain names may pass.
                    let mut components = Path::new(other).components();
                    match (components.next(), components.next()) {
                        (Some(Component::Normal(_)), None) if !other.contains('\\') => {
                            segments.push(other)
                        }
                        _ => return Err(ResolveError::PathTraversal),
                    }
                }
            }
        }

        Ok(segments.iter().collect())
    }

    /// Resolves a raw request path to an existing regular file.
    pub async fn resolve(&self, raw: &str) -> Result<ResolvedFile, ResolveError> {
        let mut path = self.root.join(self.normalize(raw)?);

        let mut meta = tokio::fs::metadata(&path)
            .await
            .map_err(|_| ResolveError::NotFound)?;

        if meta.is_dir() {
            path.push(&self.index_file);
            meta = tokio::fs::metadata(&path)
                .await
                .map_err(|_| ResolveError::NotFound)?;

            if meta.is_dir() {
                return Err(ResolveError::NotFound);
            }
        }

        tracing::trace!(path = %path.display(), size = meta.len(), "Resolved request path");

        Ok(ResolvedFile {
            path,
            size: meta.len(),
            is_dir: false,
        })
    }

    /// Reads the whole file into memory.
    pub async fn read(&self, file: &ResolvedFile) -> io::Result<Bytes> {
        tokio::fs::read(&file.path).await.map(Bytes::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> PathResolver {
        PathResolver::new("/srv/www", "index.html")
    }

    #[test]
    fn normalize_collapses_dot_segments() {
        let cases = [
            ("/", Some("index.html")),
            ("/a.html", Some("a.html")),
            ("a.html", Some("a.html")),
            ("/docs/", Some("docs")),
            ("//docs///guide.html", Some("docs/guide.html")),
            ("/docs/./guide.html", Some("docs/guide.html")),
            ("/docs/../a.html", Some("a.html")),
            ("/a/b/c/../../d.js", Some("a/d.js")),
            ("/docs/..", Some("")),
            ("/a.html?v=2#top", Some("a.html")),
            ("/..", None),
            ("/../etc/passwd", None),
            ("/docs/../../secret", None),
            ("/a/b/../../../c", None),
            ("/a\\..\\..\\secret", None),
        ];

        for (raw, expected) in cases {
            assert_eq!(
                resolver().normalize(raw).ok(),
                expected.map(PathBuf::from),
                "normalizing {raw:?}"
            );
        }
    }
}
