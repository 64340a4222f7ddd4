//! Course records produced by ingestion and served by the index.

use serde::{Deserialize, Serialize};

/// Placeholder title used when chunk metadata carries no course title.
pub const UNKNOWN_COURSE: &str = "unknown";

/// A single lesson within a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    /// Lesson number as written in the source document.
    pub number: i64,
    /// Lesson title.
    pub title: String,
    /// Link to the lesson, if the document provides one.
    pub link: Option<String>,
}

/// A course with its ordered lessons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    /// Course title. Unique within the index.
    pub title: String,
    /// Link to the course page.
    pub link: Option<String>,
    /// Course instructor.
    pub instructor: Option<String>,
    /// Lessons in document order.
    pub lessons: Vec<Lesson>,
}

impl Course {
    /// Create a course with no lessons.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: None,
            instructor: None,
            lessons: Vec::new(),
        }
    }

    /// Find a lesson by number.
    pub fn lesson(&self, number: i64) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.number == number)
    }

    /// Render the outline block returned to the reasoning engine.
    pub fn format_outline(&self) -> String {
        let mut out = format!("Course: {}\n", self.title);
        out.push_str(&format!(
            "Link: {}\n",
            self.link.as_deref().unwrap_or("not available")
        ));
        out.push_str(&format!(
            "Instructor: {}\n",
            self.instructor.as_deref().unwrap_or("not available")
        ));

        if self.lessons.is_empty() {
            out.push_str("\nNo lessons listed.");
            return out;
        }

        out.push_str(&format!("\nLessons ({}):", self.lessons.len()));
        for lesson in &self.lessons {
            out.push_str(&format!("\n{}: {}", lesson.number, lesson.title));
        }
        out
    }
}

/// A chunk of lesson text ready to be embedded and indexed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseChunk {
    /// Title of the course the chunk belongs to.
    pub course_title: String,
    /// Lesson the chunk belongs to, if the document had lesson markers.
    pub lesson_number: Option<i64>,
    /// Position of the chunk within the course.
    pub chunk_index: usize,
    /// Chunk text.
    pub content: String,
}
