use std::path::{Component, Path, PathBuf};

use crate::error::AppError;

/// Result of validating a flat filename.
#[derive(Debug)]
pub enum FilenameError {
    /// Filename is empty or whitespace-only.
    Empty,
    /// Filename contains path separators (`/` or `\`).
    ContainsPathSeparator,
    /// Filename is `..`.
    PathTraversal,
    /// Filename contains null bytes.
    NullByte,
    /// Filename contains control characters (CR, LF, etc.).
    ControlCharacter,
}

impl FilenameError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "Filename cannot be empty",
            Self::ContainsPathSeparator => "Invalid filename: path separators are not allowed",
            Self::PathTraversal => "Invalid filename: '..' is not allowed",
            Self::NullByte => "Invalid filename: null bytes are not allowed",
            Self::ControlCharacter => "Invalid filename: control characters are not allowed",
        }
    }
}

/// Validates a flat filename (no directory components allowed).
pub fn validate_flat_filename(filename: &str) -> Result<&str, FilenameError> {
    if filename.trim().is_empty() {
        return Err(FilenameError::Empty);
    }

    if filename.contains('\0') {
        return Err(FilenameError::NullByte);
    }

    // Reject ASCII control characters to prevent
    // HTTP header injection (e.g. CRLF in Content-Disposition).
    if filename.chars().any(|c| c.is_ascii_control()) {
        return Err(FilenameError::ControlCharacter);
    }

    if filename.contains('/') || filename.contains('\\') {
        return Err(FilenameError::ContainsPathSeparator);
    }

    if filename == ".." || filename == "." {
        return Err(FilenameError::PathTraversal);
    }

    Ok(filename)
}

/// A course file located inside the course directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseFilePath {
    /// Path relative to the course root, with `/` separators.
    pub relative: String,
    pub dir_name: PathBuf,
    pub file_name: String,
}

impl CourseFilePath {
    pub fn full_path(&self) -> PathBuf {
        self.dir_name.join(&self.file_name)
    }
}

/// Resolve `relative` against `course_root`, refusing anything that could
/// land outside the course directory.
pub fn resolve_course_path(course_root: &Path, relative: &str) -> Result<CourseFilePath, AppError> {
    if relative.contains('\0') {
        return Err(AppError::Validation("Path must not contain null bytes".into()));
    }

    let mut segments = Vec::new();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(segment) => {
                let segment = segment
                    .to_str()
                    .ok_or_else(|| AppError::Validation("Path must be valid UTF-8".into()))?;
                segments.push(segment);
            }
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(AppError::Validation(format!(
                    "Invalid path: {relative} is outside the course directory"
                )));
            }
        }
    }

    let Some((file_name, dirs)) = segments.split_last() else {
        return Err(AppError::Validation("Path cannot be empty".into()));
    };

    let mut dir_name = course_root.to_path_buf();
    for dir in dirs {
        dir_name.push(dir);
    }

    Ok(CourseFilePath {
        relative: segments.join("/"),
        dir_name,
        file_name: (*file_name).to_string(),
    })
}
