//! Scriptable in-process index for tool and facade tests.

use super::{SearchFilter, SearchOutcome, SemanticIndex};
use crate::course::{Course, CourseChunk};
use crate::error::{LecternError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
pub(crate) struct StubIndex {
    resolutions: HashMap<String, String>,
    outcome: SearchOutcome,
    links: HashMap<(String, i64), String>,
    courses: Vec<Course>,
    failing_resolution: bool,
    pub(crate) searches: Mutex<Vec<(String, SearchFilter)>>,
    pub(crate) resolutions_requested: Mutex<Vec<String>>,
    pub(crate) link_lookups: Mutex<Vec<(String, i64)>>,
}

impl StubIndex {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Resolve `fuzzy` to `title`.
    pub(crate) fn with_resolution(mut self, fuzzy: &str, title: &str) -> Self {
        self.resolutions.insert(fuzzy.to_string(), title.to_string());
        self
    }

    /// Return `outcome` from every search.
    pub(crate) fn with_outcome(mut self, outcome: SearchOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    pub(crate) fn with_link(mut self, course: &str, lesson: i64, link: &str) -> Self {
        self.links.insert((course.to_string(), lesson), link.to_string());
        self
    }

    /// Catalogue `course`; its exact title resolves to itself.
    pub(crate) fn with_course(mut self, course: Course) -> Self {
        self.resolutions.insert(course.title.clone(), course.title.clone());
        self.courses.push(course);
        self
    }

    /// Make every title resolution fail with an index error.
    pub(crate) fn failing_resolution(mut self) -> Self {
        self.failing_resolution = true;
        self
    }

    pub(crate) fn search_count(&self) -> usize {
        self.searches.lock().unwrap().len()
    }
}

#[async_trait]
impl SemanticIndex for StubIndex {
    async fn search(&self, query: &str, filter: &SearchFilter) -> SearchOutcome {
        self.searches
            .lock()
            .unwrap()
            .push((query.to_string(), filter.clone()));
        self.outcome.clone()
    }

    async fn resolve_title(&self, fuzzy: &str) -> Result<Option<String>> {
        self.resolutions_requested
            .lock()
            .unwrap()
            .push(fuzzy.to_string());
        if self.failing_resolution {
            return Err(LecternError::Index("catalog unavailable".to_string()));
        }
        Ok(self.resolutions.get(fuzzy).cloned())
    }

    async fn lesson_link(&self, course_title: &str, lesson_number: i64) -> Result<Option<String>> {
        self.link_lookups
            .lock()
            .unwrap()
            .push((course_title.to_string(), lesson_number));
        Ok(self
            .links
            .get(&(course_title.to_string(), lesson_number))
            .cloned())
    }

    async fn course_outline(&self, course_title: &str) -> Result<Option<Course>> {
        Ok(self.courses.iter().find(|c| c.title == course_title).cloned())
    }

    async fn add_course(&self, _course: &Course) -> Result<()> {
        Ok(())
    }

    async fn add_chunks(&self, chunks: &[CourseChunk]) -> Result<usize> {
        Ok(chunks.len())
    }

    async fn course_titles(&self) -> Result<Vec<String>> {
        Ok(self.courses.iter().map(|c| c.title.clone()).collect())
    }

    async fn clear(&self) -> Result<()> {
        Ok(())
    }
}
