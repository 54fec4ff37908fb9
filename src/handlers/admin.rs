// src/handlers/admin.rs

use axum::{Json, extract::Multipart, extract::State, response::IntoResponse};
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    config::TOP_COURSES_LIMIT,
    error::AppError,
    importer::{self, ImportedCourse},
    models::course::TopCourse,
};

/// Imports a course catalog spreadsheet.
/// Admin only.
///
/// Rows are grouped by Main Topic; every grouped course is written in a
/// single transaction. Courses already in the catalog are updated in place
/// (description refreshed, lesson list replaced); courses absent from the
/// sheet are left untouched, so the import never shrinks the catalog.
pub async fn import_courses(
    State(pool): State<SqlitePool>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut file_bytes = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid upload: {}", e)))?
    {
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid upload: {}", e)))?;
        if file_bytes.is_none() && !bytes.is_empty() {
            file_bytes = Some(bytes);
        }
    }

    let file_bytes =
        file_bytes.ok_or_else(|| AppError::BadRequest("No file uploaded".to_string()))?;

    let rows = importer::parse_workbook(&file_bytes)?;
    let courses = importer::group_rows(rows);

    store_courses(&pool, &courses).await?;

    tracing::info!("Imported {} courses from spreadsheet", courses.len());

    Ok(Json(json!({
        "courses_imported": courses.len(),
        "message": format!("Successfully uploaded {} courses.", courses.len())
    })))
}

async fn store_courses(pool: &SqlitePool, courses: &[ImportedCourse]) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    for course in courses {
        sqlx::query(
            r#"
            INSERT INTO courses (title, description)
            VALUES (?, ?)
            ON CONFLICT (title) DO UPDATE SET description = excluded.description
            "#,
        )
        .bind(&course.title)
        .bind(&course.description)
        .execute(&mut *tx)
        .await?;

        let course_id = sqlx::query_scalar::<_, i64>("SELECT id FROM courses WHERE title = ?")
            .bind(&course.title)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM lessons WHERE course_id = ?")
            .bind(course_id)
            .execute(&mut *tx)
            .await?;

        for lesson in &course.lessons {
            sqlx::query(
                r#"
                INSERT INTO lessons (course_id, ordinal, title, duration_label, video_ref, transcript)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(course_id)
            .bind(lesson.ordinal)
            .bind(&lesson.title)
            .bind(&lesson.duration_label)
            .bind(&lesson.video_ref)
            .bind(&lesson.transcript)
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;
    Ok(())
}

/// Platform usage statistics for the dashboard.
/// Admin only.
///
/// `top_courses` ranks by the stored enrollment counter. No code path
/// increments that counter yet; the ranking is real, the numbers are not.
pub async fn dashboard_stats(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let user_count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
        .fetch_one(&pool)
        .await?;

    let course_count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM courses")
        .fetch_one(&pool)
        .await?;

    let top_courses = sqlx::query_as::<_, TopCourse>(
        r#"
        SELECT title, enrollment_count
        FROM courses
        ORDER BY enrollment_count DESC, title ASC
        LIMIT ?
        "#,
    )
    .bind(TOP_COURSES_LIMIT)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch top courses: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(json!({
        "user_count": user_count,
        "course_count": course_count,
        "top_courses": top_courses
    })))
}
