// src/handlers/progress.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    handlers::course::{course_lessons, find_course},
    models::{
        content::QuizQuestion,
        course::Course,
        progress::{ProgressRow, ProgressView, SelectLessonRequest, SubmitQuizRequest, state_columns},
    },
    progression::ProgressionState,
    state::AppState,
    utils::jwt::Claims,
};

/// Returns the caller's progression state for a course, initializing and
/// persisting it on first sight. For an unknown course there is nothing to
/// unlock; an empty state is returned and nothing is stored.
pub async fn get_progress(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(title): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let Some(course) = find_course(&state.pool, &title).await? else {
        return Ok(Json(ProgressView::new(title, ProgressionState::for_outline(&[]))));
    };

    let _guard = state.session_locks.acquire((user_id, course.id)).await;
    let (progress, _) = load_or_init(&state.pool, user_id, &course).await?;

    Ok(Json(ProgressView::new(course.title, progress)))
}

/// Switches the caller's selected lesson. The lock invariant is enforced
/// here regardless of what the UI disabled: a locked id is rejected with
/// no state change.
pub async fn select_lesson(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(title): Path<String>,
    Json(payload): Json<SelectLessonRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let course = find_course(&state.pool, &title)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Course '{}' not found", title)))?;

    let _guard = state.session_locks.acquire((user_id, course.id)).await;
    let (mut progress, _) = load_or_init(&state.pool, user_id, &course).await?;

    progress.select_lesson(payload.lesson_id)?;
    store(&state.pool, user_id, course.id, &progress).await?;

    Ok(Json(ProgressView::new(course.title, progress)))
}

/// Scores a quiz submission against the lesson's stored quiz and applies
/// the unlock rule, persisting the updated state.
pub async fn submit_quiz(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(title): Path<String>,
    Json(payload): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let course = find_course(&state.pool, &title)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Course '{}' not found", title)))?;

    let _guard = state.session_locks.acquire((user_id, course.id)).await;
    let (mut progress, outline) = load_or_init(&state.pool, user_id, &course).await?;

    let quiz = stored_quiz(&state.pool, payload.lesson_id).await?;
    let outcome = progress.submit_quiz(&outline, payload.lesson_id, &quiz, &payload.answers)?;
    store(&state.pool, user_id, course.id, &progress).await?;

    tracing::info!(
        "User {} scored {:.1} on lesson {} of '{}'",
        user_id,
        outcome.score,
        payload.lesson_id,
        course.title
    );

    Ok(Json(json!({
        "score": outcome.score,
        "correct_count": outcome.correct_count,
        "total_questions": outcome.total_questions,
        "passed": outcome.passed,
        "unlocked_lesson_id": outcome.unlocked_lesson_id,
        "message": if outcome.passed {
            "Congratulations! You passed."
        } else {
            "You need at least 75% to pass. Please try again."
        }
    })))
}

/// Loads the stored state for (user, course) or initializes it from the
/// course outline. Stored state is reconciled against the outline in case
/// the catalog changed underneath it. Returns the state and the outline.
pub(crate) async fn load_or_init(
    pool: &SqlitePool,
    user_id: i64,
    course: &Course,
) -> Result<(ProgressionState, Vec<i64>), AppError> {
    let outline: Vec<i64> = course_lessons(pool, course.id)
        .await?
        .iter()
        .map(|lesson| lesson.id)
        .collect();

    let row = sqlx::query_as::<_, ProgressRow>(
        r#"
        SELECT user_id, course_id, current_lesson_id, unlocked, scores
        FROM course_progress
        WHERE user_id = ? AND course_id = ?
        "#,
    )
    .bind(user_id)
    .bind(course.id)
    .fetch_optional(pool)
    .await?;

    let state = match row {
        Some(row) => {
            let mut state = row.into_state().map_err(|e| {
                AppError::InternalServerError(format!("corrupt progress row: {}", e))
            })?;
            state.reconcile(&outline);
            state
        }
        None => {
            let state = ProgressionState::for_outline(&outline);
            store(pool, user_id, course.id, &state).await?;
            state
        }
    };

    Ok((state, outline))
}

/// Writes the state back; every transition is a durable write.
async fn store(
    pool: &SqlitePool,
    user_id: i64,
    course_id: i64,
    state: &ProgressionState,
) -> Result<(), AppError> {
    let (unlocked, scores) = state_columns(state)
        .map_err(|e| AppError::InternalServerError(format!("unserializable progress: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO course_progress (user_id, course_id, current_lesson_id, unlocked, scores, updated_at)
        VALUES (?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
        ON CONFLICT (user_id, course_id) DO UPDATE SET
            current_lesson_id = excluded.current_lesson_id,
            unlocked = excluded.unlocked,
            scores = excluded.scores,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(user_id)
    .bind(course_id)
    .bind(state.current_lesson_id)
    .bind(unlocked)
    .bind(scores)
    .execute(pool)
    .await?;

    Ok(())
}

/// The lesson's cached quiz, empty if content was never generated.
/// The engine turns empty into an explicit `NoQuizAvailable` rejection.
async fn stored_quiz(pool: &SqlitePool, lesson_id: i64) -> Result<Vec<QuizQuestion>, AppError> {
    let quiz_json = sqlx::query_scalar::<_, String>(
        "SELECT quiz FROM lesson_contents WHERE lesson_id = ?",
    )
    .bind(lesson_id)
    .fetch_optional(pool)
    .await?;

    match quiz_json {
        Some(json) => serde_json::from_str(&json)
            .map_err(|e| AppError::InternalServerError(format!("corrupt cached quiz: {}", e))),
        None => Ok(Vec::new()),
    }
}
