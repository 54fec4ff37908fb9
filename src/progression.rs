// src/progression.rs

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::PASS_THRESHOLD;
use crate::models::content::QuizQuestion;

/// Expected gating rejections. None of these mutate state.
#[derive(Debug, PartialEq, Eq)]
pub enum ProgressionError {
    LessonLocked(i64),
    UnknownLesson(i64),
    NoQuizAvailable(i64),
}

impl fmt::Display for ProgressionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressionError::LessonLocked(id) => write!(f, "lesson {} is locked", id),
            ProgressionError::UnknownLesson(id) => write!(f, "unknown lesson {}", id),
            ProgressionError::NoQuizAvailable(id) => write!(f, "no quiz for lesson {}", id),
        }
    }
}

impl std::error::Error for ProgressionError {}

/// Result of a scored quiz submission.
#[derive(Debug, Serialize)]
pub struct QuizOutcome {
    pub score: f64,
    pub correct_count: usize,
    pub total_questions: usize,
    pub passed: bool,
    /// The successor lesson made available by this submission, if any.
    pub unlocked_lesson_id: Option<i64>,
}

/// Per-learner, per-course progression state: which lessons are open, which
/// one is selected, and the latest score per attempted lesson.
///
/// The lesson order itself is not stored here; callers pass the course
/// outline (ordered lesson ids) into the operations that need it. BTree
/// collections keep the serialized form stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionState {
    pub current_lesson_id: Option<i64>,
    pub unlocked: BTreeSet<i64>,
    pub scores: BTreeMap<i64, f64>,
}

impl ProgressionState {
    /// Initial state for a course outline: the first lesson is unlocked and
    /// selected. An empty outline (missing course) yields an empty state.
    pub fn for_outline(outline: &[i64]) -> Self {
        let mut unlocked = BTreeSet::new();
        if let Some(&first) = outline.first() {
            unlocked.insert(first);
        }
        Self {
            current_lesson_id: outline.first().copied(),
            unlocked,
            scores: BTreeMap::new(),
        }
    }

    pub fn is_unlocked(&self, lesson_id: i64) -> bool {
        self.unlocked.contains(&lesson_id)
    }

    /// Repairs stored state against the current outline after catalog edits:
    /// drops ids that no longer exist, re-asserts the first-lesson invariant
    /// and falls back the selection to the first lesson if it went stale.
    pub fn reconcile(&mut self, outline: &[i64]) {
        let known: BTreeSet<i64> = outline.iter().copied().collect();
        self.unlocked.retain(|id| known.contains(id));
        self.scores.retain(|id, _| known.contains(id));

        if let Some(&first) = outline.first() {
            self.unlocked.insert(first);
        }

        let current_ok = self
            .current_lesson_id
            .is_some_and(|id| self.unlocked.contains(&id));
        if !current_ok {
            self.current_lesson_id = outline.first().copied();
        }
    }

    /// Switches the selected lesson. Locked lessons are rejected with no
    /// state change; the caller may have hidden the affordance, but the
    /// invariant is enforced here regardless.
    pub fn select_lesson(&mut self, lesson_id: i64) -> Result<(), ProgressionError> {
        if !self.unlocked.contains(&lesson_id) {
            return Err(ProgressionError::LessonLocked(lesson_id));
        }
        self.current_lesson_id = Some(lesson_id);
        Ok(())
    }

    /// Scores a quiz submission and applies the unlock rule.
    ///
    /// Every question counts in the denominator; an unanswered prompt can
    /// never match the correct option, so it scores as wrong. The latest
    /// score overwrites any previous attempt. At or above `PASS_THRESHOLD`
    /// the immediate successor in the outline is unlocked; unlocking is
    /// idempotent and never reverts, and passing the final lesson simply
    /// records the score.
    pub fn submit_quiz(
        &mut self,
        outline: &[i64],
        lesson_id: i64,
        quiz: &[QuizQuestion],
        answers: &HashMap<String, String>,
    ) -> Result<QuizOutcome, ProgressionError> {
        let position = outline
            .iter()
            .position(|&id| id == lesson_id)
            .ok_or(ProgressionError::UnknownLesson(lesson_id))?;

        if !self.unlocked.contains(&lesson_id) {
            return Err(ProgressionError::LessonLocked(lesson_id));
        }

        if quiz.is_empty() {
            return Err(ProgressionError::NoQuizAvailable(lesson_id));
        }

        let correct_count = quiz
            .iter()
            .filter(|q| {
                answers
                    .get(&q.question)
                    .is_some_and(|picked| *picked == q.correct_answer)
            })
            .count();

        let total_questions = quiz.len();
        let score = (correct_count as f64 / total_questions as f64) * 100.0;
        self.scores.insert(lesson_id, score);

        let passed = score >= PASS_THRESHOLD;
        let mut unlocked_lesson_id = None;
        if passed {
            if let Some(&next) = outline.get(position + 1) {
                self.unlocked.insert(next);
                unlocked_lesson_id = Some(next);
            }
        }

        Ok(QuizOutcome {
            score,
            correct_count,
            total_questions,
            passed,
            unlocked_lesson_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiz() -> Vec<QuizQuestion> {
        (1..=4)
            .map(|i| QuizQuestion {
                question: format!("Q{}", i),
                options: vec![
                    "A".to_string(),
                    "B".to_string(),
                    "C".to_string(),
                    "D".to_string(),
                ],
                correct_answer: "A".to_string(),
            })
            .collect()
    }

    fn answers(correct: usize) -> HashMap<String, String> {
        (1..=4)
            .map(|i| {
                let picked = if i <= correct { "A" } else { "B" };
                (format!("Q{}", i), picked.to_string())
            })
            .collect()
    }

    const OUTLINE: [i64; 3] = [10, 20, 30];

    #[test]
    fn initial_state_unlocks_first_lesson() {
        let state = ProgressionState::for_outline(&OUTLINE);
        assert_eq!(state.current_lesson_id, Some(10));
        assert_eq!(state.unlocked.iter().copied().collect::<Vec<_>>(), [10]);
        assert!(state.scores.is_empty());
    }

    #[test]
    fn empty_outline_yields_empty_state() {
        let state = ProgressionState::for_outline(&[]);
        assert_eq!(state.current_lesson_id, None);
        assert!(state.unlocked.is_empty());
    }

    #[test]
    fn perfect_score_unlocks_next() {
        let mut state = ProgressionState::for_outline(&OUTLINE);
        let outcome = state.submit_quiz(&OUTLINE, 10, &quiz(), &answers(4)).unwrap();
        assert_eq!(outcome.score, 100.0);
        assert!(outcome.passed);
        assert_eq!(outcome.unlocked_lesson_id, Some(20));
        assert!(state.is_unlocked(20));
        assert!(!state.is_unlocked(30));
    }

    #[test]
    fn threshold_is_inclusive_at_three_of_four() {
        let mut state = ProgressionState::for_outline(&OUTLINE);
        let outcome = state.submit_quiz(&OUTLINE, 10, &quiz(), &answers(3)).unwrap();
        assert_eq!(outcome.score, 75.0);
        assert!(outcome.passed);
        assert!(state.is_unlocked(20));
    }

    #[test]
    fn two_of_four_does_not_unlock() {
        let mut state = ProgressionState::for_outline(&OUTLINE);
        let outcome = state.submit_quiz(&OUTLINE, 10, &quiz(), &answers(2)).unwrap();
        assert_eq!(outcome.score, 50.0);
        assert!(!outcome.passed);
        assert_eq!(outcome.unlocked_lesson_id, None);
        assert!(!state.is_unlocked(20));
        assert_eq!(state.scores.get(&10), Some(&50.0));
    }

    #[test]
    fn unanswered_question_counts_as_wrong() {
        let mut state = ProgressionState::for_outline(&OUTLINE);
        // 3 correct answers, Q4 left out entirely: 75%, not 100%.
        let mut partial = answers(3);
        partial.remove("Q4");
        let outcome = state.submit_quiz(&OUTLINE, 10, &quiz(), &partial).unwrap();
        assert_eq!(outcome.total_questions, 4);
        assert_eq!(outcome.score, 75.0);
    }

    #[test]
    fn reattempt_overwrites_score_but_never_relocks() {
        let mut state = ProgressionState::for_outline(&OUTLINE);
        state.submit_quiz(&OUTLINE, 10, &quiz(), &answers(4)).unwrap();
        assert!(state.is_unlocked(20));

        let outcome = state.submit_quiz(&OUTLINE, 10, &quiz(), &answers(1)).unwrap();
        assert_eq!(outcome.score, 25.0);
        assert_eq!(state.scores.get(&10), Some(&25.0));
        // Unlock is monotonic.
        assert!(state.is_unlocked(20));
    }

    #[test]
    fn unlock_is_idempotent() {
        let mut state = ProgressionState::for_outline(&OUTLINE);
        state.submit_quiz(&OUTLINE, 10, &quiz(), &answers(4)).unwrap();
        let before = state.unlocked.clone();
        state.submit_quiz(&OUTLINE, 10, &quiz(), &answers(4)).unwrap();
        assert_eq!(state.unlocked, before);
    }

    #[test]
    fn passing_the_last_lesson_is_a_quiet_noop_unlock() {
        let mut state = ProgressionState::for_outline(&OUTLINE);
        state.unlocked.extend([20, 30]);
        let outcome = state.submit_quiz(&OUTLINE, 30, &quiz(), &answers(4)).unwrap();
        assert!(outcome.passed);
        assert_eq!(outcome.unlocked_lesson_id, None);
        assert_eq!(state.unlocked.len(), 3);
    }

    #[test]
    fn locked_selection_is_rejected_without_change() {
        let mut state = ProgressionState::for_outline(&OUTLINE);
        let err = state.select_lesson(30).unwrap_err();
        assert_eq!(err, ProgressionError::LessonLocked(30));
        assert_eq!(state.current_lesson_id, Some(10));
    }

    #[test]
    fn locked_submission_is_rejected() {
        let mut state = ProgressionState::for_outline(&OUTLINE);
        let err = state
            .submit_quiz(&OUTLINE, 20, &quiz(), &answers(4))
            .unwrap_err();
        assert_eq!(err, ProgressionError::LessonLocked(20));
        assert!(state.scores.is_empty());
    }

    #[test]
    fn submission_without_quiz_is_rejected() {
        let mut state = ProgressionState::for_outline(&OUTLINE);
        let err = state.submit_quiz(&OUTLINE, 10, &[], &answers(4)).unwrap_err();
        assert_eq!(err, ProgressionError::NoQuizAvailable(10));
    }

    #[test]
    fn reconcile_drops_stale_ids_and_restores_invariants() {
        let mut state = ProgressionState::for_outline(&OUTLINE);
        state.unlocked.extend([20, 30]);
        state.current_lesson_id = Some(30);
        state.scores.insert(30, 100.0);

        // Lesson 30 was removed from the catalog.
        let new_outline = [10, 20];
        state.reconcile(&new_outline);

        assert!(!state.is_unlocked(30));
        assert!(state.is_unlocked(10));
        assert_eq!(state.current_lesson_id, Some(10));
        assert!(!state.scores.contains_key(&30));
    }
}
