// src/models/progress.rs

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::progression::ProgressionState;

/// Represents a 'course_progress' row. The unlocked set and score map are
/// stored as JSON text and mapped explicitly to and from the engine state.
#[derive(Debug, FromRow)]
pub struct ProgressRow {
    pub user_id: i64,
    pub course_id: i64,
    pub current_lesson_id: Option<i64>,
    pub unlocked: String,
    pub scores: String,
}

impl ProgressRow {
    pub fn into_state(self) -> Result<ProgressionState, serde_json::Error> {
        Ok(ProgressionState {
            current_lesson_id: self.current_lesson_id,
            unlocked: serde_json::from_str(&self.unlocked)?,
            scores: serde_json::from_str(&self.scores)?,
        })
    }
}

/// JSON column images of a `ProgressionState`, for writing a row back.
pub fn state_columns(state: &ProgressionState) -> Result<(String, String), serde_json::Error> {
    Ok((
        serde_json::to_string(&state.unlocked)?,
        serde_json::to_string(&state.scores)?,
    ))
}

/// Client view of progression state for one course.
#[derive(Debug, Serialize)]
pub struct ProgressView {
    pub course_title: String,
    pub current_lesson_id: Option<i64>,
    pub unlocked: Vec<i64>,
    pub scores: std::collections::BTreeMap<i64, f64>,
}

impl ProgressView {
    pub fn new(course_title: String, state: ProgressionState) -> Self {
        Self {
            course_title,
            current_lesson_id: state.current_lesson_id,
            unlocked: state.unlocked.into_iter().collect(),
            scores: state.scores,
        }
    }
}

/// DTO for switching the selected lesson.
#[derive(Debug, Deserialize)]
pub struct SelectLessonRequest {
    pub lesson_id: i64,
}

/// DTO for submitting a quiz attempt.
#[derive(Debug, Deserialize)]
pub struct SubmitQuizRequest {
    pub lesson_id: i64,

    /// User's answers map.
    /// Key: question prompt
    /// Value: the selected option string
    pub answers: HashMap<String, String>,
}
