// src/models/course.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;

/// Represents the 'courses' table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,

    /// Unique title; also the key the spreadsheet import merges on.
    pub title: String,

    pub description: String,

    /// Read by the dashboard's top-courses ranking. Nothing increments it
    /// yet; the trigger point needs a product decision.
    pub enrollment_count: i64,

    pub created_at: Option<chrono::NaiveDateTime>,
}

/// Represents the 'lessons' table. `ordinal` is the unlock order within the
/// course, contiguous from 1.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Lesson {
    pub id: i64,
    pub course_id: i64,
    pub ordinal: i64,
    pub title: String,
    pub duration_label: String,

    /// Opaque playable-media reference (a video-hosting id). May be empty
    /// when the imported link could not be parsed.
    pub video_ref: String,

    /// Generation input; withheld from catalog DTOs.
    pub transcript: String,
}

/// Catalog list entry.
#[derive(Debug, FromRow, Serialize)]
pub struct CourseSummary {
    pub title: String,
    pub description: String,
    pub lesson_count: i64,
    pub enrollment_count: i64,
}

/// DTO for a lesson in the course detail view (no transcript).
#[derive(Debug, Serialize)]
pub struct LessonView {
    pub id: i64,
    pub ordinal: i64,
    pub title: String,
    pub duration_label: String,
    pub video_ref: String,
}

impl From<Lesson> for LessonView {
    fn from(lesson: Lesson) -> Self {
        Self {
            id: lesson.id,
            ordinal: lesson.ordinal,
            title: lesson.title,
            duration_label: lesson.duration_label,
            video_ref: lesson.video_ref,
        }
    }
}

/// Course detail. An unknown title yields this with an empty lesson list
/// rather than an error.
#[derive(Debug, Serialize)]
pub struct CourseDetail {
    pub title: String,
    pub description: String,
    pub lessons: Vec<LessonView>,
}

/// Dashboard ranking entry.
#[derive(Debug, FromRow, Serialize)]
pub struct TopCourse {
    pub title: String,
    pub enrollment_count: i64,
}
