//! Validates every path the core touches against the project root.
//!
//! Pure and deterministic: no caching, no filesystem state beyond the
//! existence/kind checks a caller explicitly asks for.

use std::path::{Path, PathBuf};

/// What a caller expects to find at a validated path.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidateOptions {
    pub allow_nonexistent: bool,
    pub require_dir: bool,
    pub require_file: bool,
    pub follow_symlinks: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Valid { abs: PathBuf, rel: PathBuf },
    Invalid { reason: String },
    OutsideProject,
}

#[derive(Debug, Clone)]
pub struct PathGuard {
    root: PathBuf,
}

impl PathGuard {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full validation including filesystem existence/kind checks.
    pub fn validate(&self, candidate: impl AsRef<str>, opts: ValidateOptions) -> Validation {
        let candidate = candidate.as_ref();
        match self.validate_sync(candidate) {
            Validation::Valid { abs, rel } => {
                if !opts.allow_nonexistent && !abs.exists() {
                    return Validation::Invalid {
                        reason: format!("path does not exist: {}", rel.display()),
                    };
                }
                if abs.exists() {
                    let metadata = if opts.follow_symlinks {
                        std::fs::metadata(&abs)
                    } else {
                        std::fs::symlink_metadata(&abs)
                    };
                    if let Ok(metadata) = metadata {
                        if opts.require_dir && !metadata.is_dir() {
                            return Validation::Invalid {
                                reason: format!("expected a directory: {}", rel.display()),
                            };
                        }
                        if opts.require_file && !metadata.is_file() {
                            return Validation::Invalid {
                                reason: format!("expected a file: {}", rel.display()),
                            };
                        }
                    }
                }
                Validation::Valid { abs, rel }
            }
            other => other,
        }
    }

    /// Syntactic-only validation: traversal and containment checks, no I/O.
    pub fn validate_sync(&self, candidate: &str) -> Validation {
        let trimmed = candidate.trim();
        if trimmed.is_empty() {
            return Validation::Invalid {
                reason: "path is empty".to_string(),
            };
        }

        if trimmed.starts_with('~') {
            return Validation::Invalid {
                reason: "path must not start with '~'".to_string(),
            };
        }

        let normalized = trimmed.replace('\\', "/");
        if normalized.split('/').any(|segment| segment == "..") {
            return Validation::Invalid {
                reason: "path traversal ('..') is not allowed".to_string(),
            };
        }

        let candidate_path = Path::new(&normalized);
        let abs = if candidate_path.is_absolute() {
            candidate_path.to_path_buf()
        } else {
            self.root.join(candidate_path)
        };
        let abs = lexically_normalize(&abs);
        let root = lexically_normalize(&self.root);

        let root_with_sep = {
            let mut s = root.as_os_str().to_os_string();
            if !s.to_string_lossy().ends_with('/') {
                s.push("/");
            }
            PathBuf::from(s)
        };

        if abs != root && !abs.starts_with(&root_with_sep) {
            return Validation::OutsideProject;
        }

        let rel = abs.strip_prefix(&root).unwrap_or(&abs).to_path_buf();
        Validation::Valid { abs, rel }
    }

    /// Resolve or produce a descriptive error, for call sites that don't need
    /// to branch on the three-way [`Validation`] result.
    pub fn resolve(
        &self,
        candidate: impl AsRef<str>,
        opts: ValidateOptions,
    ) -> Result<(PathBuf, PathBuf), String> {
        match self.validate(candidate, opts) {
            Validation::Valid { abs, rel } => Ok((abs, rel)),
            Validation::Invalid { reason } => Err(reason),
            Validation::OutsideProject => Err("path escapes the project root".to_string()),
        }
    }
}

/// Normalizes `.` and redundant separators without touching the filesystem.
/// `..` segments were already rejected by the caller, so this never needs to
/// pop a component.
fn lexically_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            std::path::Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}
