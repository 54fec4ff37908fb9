// src/handlers/course.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::course::{Course, CourseDetail, CourseSummary, Lesson},
};

/// Lists the course catalog with lesson counts.
pub async fn list_courses(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let courses = sqlx::query_as::<_, CourseSummary>(
        r#"
        SELECT
            c.title,
            c.description,
            (SELECT COUNT(*) FROM lessons l WHERE l.course_id = c.id) AS lesson_count,
            c.enrollment_count
        FROM courses c
        ORDER BY c.title
        "#,
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(courses))
}

/// Retrieves one course with its lessons in unlock order.
///
/// An unknown title is not an error: the learner gets an empty-lesson
/// placeholder and the UI simply has nothing to play.
pub async fn get_course(
    State(pool): State<SqlitePool>,
    Path(title): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let Some(course) = find_course(&pool, &title).await? else {
        return Ok(Json(CourseDetail {
            title,
            description: String::new(),
            lessons: Vec::new(),
        }));
    };

    let lessons = course_lessons(&pool, course.id).await?;

    Ok(Json(CourseDetail {
        title: course.title,
        description: course.description,
        lessons: lessons.into_iter().map(Into::into).collect(),
    }))
}

/// Looks a course up by its title key.
pub(crate) async fn find_course(
    pool: &SqlitePool,
    title: &str,
) -> Result<Option<Course>, AppError> {
    let course = sqlx::query_as::<_, Course>(
        "SELECT id, title, description, enrollment_count, created_at FROM courses WHERE title = ?",
    )
    .bind(title)
    .fetch_optional(pool)
    .await?;

    Ok(course)
}

/// Fetches a course's lessons ordered by ordinal.
pub(crate) async fn course_lessons(
    pool: &SqlitePool,
    course_id: i64,
) -> Result<Vec<Lesson>, AppError> {
    let lessons = sqlx::query_as::<_, Lesson>(
        r#"
        SELECT id, course_id, ordinal, title, duration_label, video_ref, transcript
        FROM lessons
        WHERE course_id = ?
        ORDER BY ordinal
        "#,
    )
    .bind(course_id)
    .fetch_all(pool)
    .await?;

    Ok(lessons)
}
