//! ActionPath - 名前空間付きのアクションパス
//!
//! `"Namespace.Another.Action"` のような区切り文字つきの文字列を
//! セグメント列に分解して保持します。

use std::fmt;

use thiserror::Error;

/// Separator used when none is configured.
pub const DEFAULT_SEPARATOR: &str = ".";

/// PathError is returned when a string cannot be turned into an ActionPath.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("action path is empty")]
    Empty,

    #[error("action path '{path}' has an empty segment at position {index}")]
    EmptySegment { path: String, index: usize },

    #[error("path separator must not be empty")]
    EmptySeparator,
}

/// A parsed, separator-delimited action path.
///
/// # Invariants
/// - at least one segment
/// - no segment is empty
/// - segments are compared case-sensitively
///
/// The separator is kept only for display; two paths with the same segments
/// address the same node regardless of the separator they were parsed with.
#[derive(Debug, Clone)]
pub struct ActionPath {
    segments: Vec<String>,
    separator: String,
}

impl ActionPath {
    /// `raw` を `separator` で分割してパース。空セグメントはエラー
    pub fn parse(raw: &str, separator: &str) -> Result<Self, PathError> {
        if separator.is_empty() {
            return Err(PathError::EmptySeparator);
        }
        if raw.is_empty() {
            return Err(PathError::Empty);
        }

        let mut segments = Vec::new();
        for (index, segment) in raw.split(separator).enumerate() {
            if segment.is_empty() {
                return Err(PathError::EmptySegment {
                    path: raw.to_string(),
                    index,
                });
            }
            segments.push(segment.to_string());
        }

        Ok(Self {
            segments,
            separator: separator.to_string(),
        })
    }

    /// Build a path directly from segments (used when grafting subtrees).
    pub fn from_segments<I, S>(segments: I, separator: &str) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if separator.is_empty() {
            return Err(PathError::EmptySeparator);
        }
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(PathError::Empty);
        }
        if let Some(index) = segments.iter().position(String::is_empty) {
            return Err(PathError::EmptySegment {
                path: segments.join(separator),
                index,
            });
        }
        Ok(Self {
            segments,
            separator: separator.to_string(),
        })
    }

    /// パース済みのセグメント列
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Returns `prefix` followed by this path's segments.
    pub fn prefixed(&self, prefix: &ActionPath) -> ActionPath {
        let mut segments = prefix.segments.clone();
        segments.extend(self.segments.iter().cloned());
        ActionPath {
            segments,
            separator: self.separator.clone(),
        }
    }
}

impl PartialEq for ActionPath {
    fn eq(&self, other: &Self) -> bool {
        self.segments == other.segments
    }
}

impl Eq for ActionPath {}

impl fmt::Display for ActionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join(&self.separator))
    }
}
