// src/handlers/content.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    handlers::course::find_course,
    handlers::progress::load_or_init,
    models::{
        content::{ContentView, GeneratedContent},
        course::{Course, Lesson},
    },
    progression::ProgressionError,
    state::AppState,
    utils::jwt::Claims,
};

/// Returns the lesson's cached generated content, 404 if none exists yet.
pub async fn get_content(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Path((title, lesson_id)): Path<(String, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let (_, lesson) = resolve_lesson(&state.pool, &title, lesson_id).await?;

    let content = load_cached(&state.pool, lesson.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Content has not been generated yet".to_string()))?;

    Ok(Json(ContentView::from(content)))
}

/// Generates (or returns the cached) summary and quiz for a lesson.
///
/// The lesson's in-flight lock is held across cache-check, model call and
/// store: a concurrent duplicate request waits here and then finds the
/// cached copy instead of triggering a second model call. A failed call
/// stores nothing, so the learner can simply retry.
pub async fn generate_content(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((title, lesson_id)): Path<(String, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let (course, lesson) = resolve_lesson(&state.pool, &title, lesson_id).await?;

    // Locked lessons allow no content interaction; enforce it server-side
    // rather than trusting the caller's UI state.
    let (progress, _) = load_or_init(&state.pool, user_id, &course).await?;
    if !progress.is_unlocked(lesson.id) {
        return Err(ProgressionError::LessonLocked(lesson.id).into());
    }

    let _guard = state.generator.lock_lesson(lesson.id).await;

    if let Some(cached) = load_cached(&state.pool, lesson.id).await? {
        return Ok(Json(ContentView::from(cached)));
    }

    let content = state
        .generator
        .generate(&lesson.title, &lesson.transcript)
        .await?;

    let quiz_json = serde_json::to_string(&content.quiz)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    // Keyed by lesson id: a completion landing after the learner navigated
    // away still updates the right lesson.
    sqlx::query(
        r#"
        INSERT INTO lesson_contents (lesson_id, summary, quiz)
        VALUES (?, ?, ?)
        ON CONFLICT (lesson_id) DO UPDATE SET
            summary = excluded.summary,
            quiz = excluded.quiz,
            generated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(lesson.id)
    .bind(&content.summary)
    .bind(&quiz_json)
    .execute(&state.pool)
    .await?;

    Ok(Json(ContentView::from(content)))
}

/// Resolves a lesson within a course by title, rejecting ids that belong
/// to other courses.
async fn resolve_lesson(
    pool: &SqlitePool,
    course_title: &str,
    lesson_id: i64,
) -> Result<(Course, Lesson), AppError> {
    let course = find_course(pool, course_title)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Course '{}' not found", course_title)))?;

    let lesson = sqlx::query_as::<_, Lesson>(
        r#"
        SELECT id, course_id, ordinal, title, duration_label, video_ref, transcript
        FROM lessons
        WHERE id = ? AND course_id = ?
        "#,
    )
    .bind(lesson_id)
    .bind(course.id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Lesson {} not found", lesson_id)))?;

    Ok((course, lesson))
}

async fn load_cached(
    pool: &SqlitePool,
    lesson_id: i64,
) -> Result<Option<GeneratedContent>, AppError> {
    let row = sqlx::query_as::<_, (String, String)>(
        "SELECT summary, quiz FROM lesson_contents WHERE lesson_id = ?",
    )
    .bind(lesson_id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some((summary, quiz_json)) => {
            let quiz = serde_json::from_str(&quiz_json)
                .map_err(|e| AppError::InternalServerError(format!("corrupt cached quiz: {}", e)))?;
            Ok(Some(GeneratedContent { summary, quiz }))
        }
        None => Ok(None),
    }
}
