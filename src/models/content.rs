// src/models/content.rs

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::config::{QUIZ_OPTION_COUNT, QUIZ_QUESTION_COUNT};

/// One multiple-choice question as produced by the generator.
/// `correct_answer` must equal exactly one of `options` by string value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    #[serde(rename = "correctAnswer")]
    pub correct_answer: String,
}

/// Generated lesson material: a narrative summary plus a fixed-size quiz.
/// This is the wire shape of the model response and the stored cache shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneratedContent {
    pub summary: String,
    pub quiz: Vec<QuizQuestion>,
}

impl GeneratedContent {
    /// Structural contract gate. The scoring engine assumes a well-formed
    /// quiz, so any violation here must fail the generation as a whole
    /// rather than leak downstream.
    pub fn validate(&self) -> Result<(), String> {
        if self.summary.trim().is_empty() {
            return Err("summary is empty".to_string());
        }
        if self.quiz.len() != QUIZ_QUESTION_COUNT {
            return Err(format!(
                "expected {} questions, got {}",
                QUIZ_QUESTION_COUNT,
                self.quiz.len()
            ));
        }
        for (i, q) in self.quiz.iter().enumerate() {
            if q.question.trim().is_empty() {
                return Err(format!("question {} has no prompt", i + 1));
            }
            if q.options.len() != QUIZ_OPTION_COUNT {
                return Err(format!(
                    "question {} has {} options, expected {}",
                    i + 1,
                    q.options.len(),
                    QUIZ_OPTION_COUNT
                ));
            }
            let distinct: HashSet<&str> = q.options.iter().map(String::as_str).collect();
            if distinct.len() != q.options.len() {
                return Err(format!("question {} has duplicate options", i + 1));
            }
            if !q.options.contains(&q.correct_answer) {
                return Err(format!(
                    "question {} correct answer is not among its options",
                    i + 1
                ));
            }
        }
        Ok(())
    }
}

/// DTO for sending a question to the client (excludes the correct answer;
/// scoring happens server-side against the stored quiz).
#[derive(Debug, Serialize)]
pub struct PublicQuizQuestion {
    pub question: String,
    pub options: Vec<String>,
}

/// Client view of generated lesson content.
#[derive(Debug, Serialize)]
pub struct ContentView {
    pub summary: String,
    pub quiz: Vec<PublicQuizQuestion>,
}

impl From<GeneratedContent> for ContentView {
    fn from(content: GeneratedContent) -> Self {
        Self {
            summary: content.summary,
            quiz: content
                .quiz
                .into_iter()
                .map(|q| PublicQuizQuestion {
                    question: q.question,
                    options: q.options,
                })
                .collect(),
        }
    }
}
