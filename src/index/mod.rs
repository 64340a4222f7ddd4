//! Semantic index over course material.
//!
//! The index has two halves: a *catalog* of course titles used for fuzzy
//! course-name resolution, and a *content* index of lesson chunks used for
//! passage retrieval. Retrieval tools only see the [`SemanticIndex`] trait.

mod sqlite;
#[cfg(test)]
pub(crate) mod stub;

pub use sqlite::SqliteIndex;

use crate::course::{Course, CourseChunk};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Restriction applied to a content search.
///
/// At most two dimensions; when both are present they combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    pub course_title: Option<String>,
    pub lesson_number: Option<i64>,
}

impl SearchFilter {
    pub fn new(course_title: Option<String>, lesson_number: Option<i64>) -> Self {
        Self {
            course_title,
            lesson_number,
        }
    }

    /// A filter that matches everything.
    pub fn unrestricted() -> Self {
        Self::default()
    }

    pub fn is_unrestricted(&self) -> bool {
        self.course_title.is_none() && self.lesson_number.is_none()
    }

    /// Build the filter expression, or `None` for an unrestricted search.
    pub fn expression(&self) -> Option<FilterExpr> {
        match (&self.course_title, self.lesson_number) {
            (None, None) => None,
            (Some(title), None) => Some(FilterExpr::CourseTitle(title.clone())),
            (None, Some(lesson)) => Some(FilterExpr::LessonNumber(lesson)),
            (Some(title), Some(lesson)) => Some(FilterExpr::And(vec![
                FilterExpr::CourseTitle(title.clone()),
                FilterExpr::LessonNumber(lesson),
            ])),
        }
    }
}

/// A filter expression over chunk metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterExpr {
    CourseTitle(String),
    LessonNumber(i64),
    And(Vec<FilterExpr>),
}

impl FilterExpr {
    /// Whether a chunk with the given metadata satisfies the expression.
    pub fn matches(&self, metadata: &ChunkMetadata) -> bool {
        match self {
            FilterExpr::CourseTitle(title) => metadata.course_title.as_deref() == Some(title),
            FilterExpr::LessonNumber(lesson) => metadata.lesson_number == Some(*lesson),
            FilterExpr::And(parts) => parts.iter().all(|p| p.matches(metadata)),
        }
    }
}

/// Metadata stored alongside each content chunk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub course_title: Option<String>,
    pub lesson_number: Option<i64>,
    pub chunk_index: Option<usize>,
}

impl From<&CourseChunk> for ChunkMetadata {
    fn from(chunk: &CourseChunk) -> Self {
        Self {
            course_title: Some(chunk.course_title.clone()),
            lesson_number: chunk.lesson_number,
            chunk_index: Some(chunk.chunk_index),
        }
    }
}

/// Ranked result of a content search.
///
/// `documents`, `metadata` and `distances` always have equal length; when
/// `error` is set all three are empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOutcome {
    pub documents: Vec<String>,
    pub metadata: Vec<ChunkMetadata>,
    pub distances: Vec<f32>,
    pub error: Option<String>,
}

impl SearchOutcome {
    /// Build an outcome from ranked `(document, metadata, distance)` hits.
    pub fn from_hits(hits: impl IntoIterator<Item = (String, ChunkMetadata, f32)>) -> Self {
        let mut outcome = Self::default();
        for (document, metadata, distance) in hits {
            outcome.documents.push(document);
            outcome.metadata.push(metadata);
            outcome.distances.push(distance);
        }
        outcome
    }

    /// An outcome carrying an index-layer failure.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Iterate over `(document, metadata)` pairs in rank order.
    pub fn hits(&self) -> impl Iterator<Item = (&str, &ChunkMetadata)> {
        self.documents
            .iter()
            .map(String::as_str)
            .zip(self.metadata.iter())
    }
}

/// Trait for semantic index implementations.
#[async_trait]
pub trait SemanticIndex: Send + Sync {
    /// Search the content index. Index-layer failures are reported in
    /// [`SearchOutcome::error`] rather than as `Err`.
    async fn search(&self, query: &str, filter: &SearchFilter) -> SearchOutcome;

    /// Resolve a fuzzy course name to the nearest catalog title.
    async fn resolve_title(&self, fuzzy: &str) -> Result<Option<String>>;

    /// Look up the link of a lesson.
    async fn lesson_link(&self, course_title: &str, lesson_number: i64) -> Result<Option<String>>;

    /// Fetch a course record by exact title.
    async fn course_outline(&self, course_title: &str) -> Result<Option<Course>>;

    /// Add or replace a course in the catalog.
    async fn add_course(&self, course: &Course) -> Result<()>;

    /// Embed and store content chunks.
    async fn add_chunks(&self, chunks: &[CourseChunk]) -> Result<usize>;

    /// Titles of all catalogued courses.
    async fn course_titles(&self) -> Result<Vec<String>>;

    /// Number of catalogued courses.
    async fn course_count(&self) -> Result<usize> {
        Ok(self.course_titles().await?.len())
    }

    /// Remove every course and chunk.
    async fn clear(&self) -> Result<()>;
}
