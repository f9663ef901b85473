use std::collections::HashMap;

use sqlx::PgPool;

use crate::dto::lesson_dto::{AttemptView, SubmitTestRequest};
use crate::error::{Error, Result};
use crate::models::lesson::{AnswerOption, Question};
use crate::models::progress::LessonProgress;
use crate::models::test_attempt::TestAttempt;
use crate::services::lesson_service;

pub const PASSING_PERCENTAGE: f64 = 70.0;
pub const POINTS_PER_CORRECT: i32 = 10;

#[derive(Clone)]
pub struct TestService {
    pool: PgPool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradeOutcome {
    pub total_questions: i32,
    pub correct_answers: i32,
    pub score: i32,
    pub percentage: f64,
    pub passed: bool,
}

#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub lesson: crate::models::lesson::Lesson,
    pub attempt: TestAttempt,
    pub progress: LessonProgress,
    pub is_first_attempt: bool,
}

/// Grades a submission against the lesson's questions. Every question must
/// have an answer; an answer only counts when the chosen option belongs to
/// the question and is flagged correct.
pub fn grade_submission(
    questions: &[(Question, Vec<AnswerOption>)],
    answers: &HashMap<String, i64>,
) -> Result<GradeOutcome> {
    if questions.is_empty() {
        return Err(Error::Validation("Lesson has no questions".to_string()));
    }
    if answers.len() != questions.len() {
        return Err(Error::Validation(
            "All questions must be answered".to_string(),
        ));
    }

    let mut correct = 0;
    for (question, options) in questions {
        let chosen = answers
            .get(&question.id.to_string())
            .ok_or_else(|| Error::Validation("All questions must be answered".to_string()))?;
        if let Some(option) = options.iter().find(|o| o.id == *chosen) {
            if option.is_correct {
                correct += 1;
            }
        }
    }

    let total = questions.len() as i32;
    let percentage = f64::from(correct) / f64::from(total) * 100.0;
    Ok(GradeOutcome {
        total_questions: total,
        correct_answers: correct,
        score: correct * POINTS_PER_CORRECT,
        percentage,
        passed: percentage >= PASSING_PERCENTAGE,
    })
}

impl TestService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Records one submission: grade, insert the immutable attempt, fold the
    /// result into the (user, lesson) progress row.
    pub async fn submit_test(&self, user_id: i64, req: &SubmitTestRequest) -> Result<SubmitOutcome> {
        let lesson_svc = lesson_service::LessonService::new(self.pool.clone());
        let lesson = lesson_svc.find_active_lesson(req.lesson_id).await?;

        lesson_service::ensure_lesson_accessible(&self.pool, user_id, &lesson).await?;

        let questions = lesson_service::load_lesson_questions(&self.pool, lesson.id).await?;
        let grade = grade_submission(&questions, &req.answers)?;

        let attempt = sqlx::query_as::<_, TestAttempt>(
            r#"
            INSERT INTO test_attempts
                (user_id, lesson_id, score, percentage, total_questions, correct_answers, is_passed)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(lesson.id)
        .bind(grade.score)
        .bind(grade.percentage)
        .bind(grade.total_questions)
        .bind(grade.correct_answers)
        .bind(grade.passed)
        .fetch_one(&self.pool)
        .await?;

        let progress = self.fold_progress(user_id, lesson.id, &grade, &attempt).await?;
        let is_first_attempt = progress.attempts_count == 1;

        Ok(SubmitOutcome {
            lesson,
            attempt,
            progress,
            is_first_attempt,
        })
    }

    /// Atomic upsert of the progress row. A single INSERT .. ON CONFLICT
    /// statement so concurrent submissions for the same (user, lesson) pair
    /// cannot lose an update: best_score never decreases and the completion
    /// latch never reopens.
    async fn fold_progress(
        &self,
        user_id: i64,
        lesson_id: i64,
        grade: &GradeOutcome,
        attempt: &TestAttempt,
    ) -> Result<LessonProgress> {
        let progress = sqlx::query_as::<_, LessonProgress>(
            r#"
            INSERT INTO lesson_progress
                (user_id, lesson_id, best_score, best_percentage, attempts_count,
                 is_completed, completed_at, last_attempt_at)
            VALUES ($1, $2, $3, $4, 1, $5, CASE WHEN $5 THEN $6 ELSE NULL END, $6)
            ON CONFLICT (user_id, lesson_id) DO UPDATE SET
                attempts_count  = lesson_progress.attempts_count + 1,
                best_percentage = CASE WHEN EXCLUDED.best_score > lesson_progress.best_score
                                       THEN EXCLUDED.best_percentage
                                       ELSE lesson_progress.best_percentage END,
                best_score      = GREATEST(lesson_progress.best_score, EXCLUDED.best_score),
                is_completed    = lesson_progress.is_completed OR EXCLUDED.is_completed,
                completed_at    = CASE WHEN NOT lesson_progress.is_completed AND EXCLUDED.is_completed
                                       THEN EXCLUDED.last_attempt_at
                                       ELSE lesson_progress.completed_at END,
                last_attempt_at = EXCLUDED.last_attempt_at
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(lesson_id)
        .bind(grade.score)
        .bind(grade.percentage)
        .bind(grade.passed)
        .bind(attempt.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(progress)
    }

    /// Attempts made by one user, newest first, optionally for one lesson.
    pub async fn attempts_by_user(
        &self,
        user_id: i64,
        lesson_id: Option<i64>,
    ) -> Result<Vec<AttemptView>> {
        let rows = sqlx::query_as::<_, AttemptView>(
            r#"
            SELECT a.id, a.user_id, u.username,
                   CASE WHEN u.first_name <> '' AND u.last_name <> ''
                        THEN u.first_name || ' ' || u.last_name
                        ELSE u.username END AS full_name,
                   a.lesson_id, l.title AS lesson_title,
                   a.score, a.percentage, a.total_questions, a.correct_answers,
                   a.is_passed, a.created_at
            FROM test_attempts a
            JOIN users u ON u.id = a.user_id
            JOIN lessons l ON l.id = a.lesson_id
            WHERE a.user_id = $1 AND ($2::BIGINT IS NULL OR a.lesson_id = $2)
            ORDER BY a.created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(lesson_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Attempts on one lesson, newest first, optionally for one user.
    pub async fn attempts_by_lesson(
        &self,
        lesson_id: i64,
        user_id: Option<i64>,
    ) -> Result<Vec<AttemptView>> {
        let rows = sqlx::query_as::<_, AttemptView>(
            r#"
            SELECT a.id, a.user_id, u.username,
                   CASE WHEN u.first_name <> '' AND u.last_name <> ''
                        THEN u.first_name || ' ' || u.last_name
                        ELSE u.username END AS full_name,
                   a.lesson_id, l.title AS lesson_title,
                   a.score, a.percentage, a.total_questions, a.correct_answers,
                   a.is_passed, a.created_at
            FROM test_attempts a
            JOIN users u ON u.id = a.user_id
            JOIN lessons l ON l.id = a.lesson_id
            WHERE a.lesson_id = $1 AND ($2::BIGINT IS NULL OR a.user_id = $2)
            ORDER BY a.created_at DESC
            "#,
        )
        .bind(lesson_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn question(id: i64, correct_option: i64, option_ids: &[i64]) -> (Question, Vec<AnswerOption>) {
        let q = Question {
            id,
            lesson_id: 1,
            text: format!("q{id}"),
            order: id as i32,
            created_at: Utc::now(),
        };
        let options = option_ids
            .iter()
            .enumerate()
            .map(|(i, &oid)| AnswerOption {
                id: oid,
                question_id: id,
                text: format!("o{oid}"),
                is_correct: oid == correct_option,
                order: i as i32 + 1,
            })
            .collect();
        (q, options)
    }

    fn answers(pairs: &[(i64, i64)]) -> HashMap<String, i64> {
        pairs
            .iter()
            .map(|(q, o)| (q.to_string(), *o))
            .collect()
    }

    #[test]
    fn all_correct_scores_full_marks() {
        let quiz = vec![
            question(1, 11, &[10, 11, 12, 13]),
            question(2, 22, &[20, 21, 22, 23]),
            question(3, 31, &[30, 31, 32, 33]),
            question(4, 40, &[40, 41, 42, 43]),
            question(5, 53, &[50, 51, 52, 53]),
        ];
        let grade = grade_submission(
            &quiz,
            &answers(&[(1, 11), (2, 22), (3, 31), (4, 40), (5, 53)]),
        )
        .expect("grade");
        assert_eq!(
            grade,
            GradeOutcome {
                total_questions: 5,
                correct_answers: 5,
                score: 50,
                percentage: 100.0,
                passed: true,
            }
        );
    }

    #[test]
    fn percentage_is_exact_ratio() {
        let quiz = vec![
            question(1, 11, &[10, 11]),
            question(2, 21, &[20, 21]),
            question(3, 31, &[30, 31]),
        ];
        // one of three correct
        let grade =
            grade_submission(&quiz, &answers(&[(1, 11), (2, 20), (3, 30)])).expect("grade");
        assert_eq!(grade.correct_answers, 1);
        assert_eq!(grade.percentage, 1.0 / 3.0 * 100.0);
        assert!(!grade.passed);
        assert_eq!(grade.score, 10);
    }

    #[test]
    fn pass_threshold_is_seventy_percent() {
        let quiz: Vec<_> = (1..=10)
            .map(|i| question(i, i * 10 + 1, &[i * 10, i * 10 + 1]))
            .collect();
        // exactly 7/10
        let mut picks: Vec<(i64, i64)> = (1..=7).map(|i| (i, i * 10 + 1)).collect();
        picks.extend((8..=10).map(|i| (i, i * 10)));
        let grade = grade_submission(&quiz, &answers(&picks)).expect("grade");
        assert_eq!(grade.percentage, 70.0);
        assert!(grade.passed);

        // 6/10 fails
        let mut picks: Vec<(i64, i64)> = (1..=6).map(|i| (i, i * 10 + 1)).collect();
        picks.extend((7..=10).map(|i| (i, i * 10)));
        let grade = grade_submission(&quiz, &answers(&picks)).expect("grade");
        assert_eq!(grade.percentage, 60.0);
        assert!(!grade.passed);
    }

    #[test]
    fn missing_answer_is_rejected() {
        let quiz = vec![question(1, 11, &[10, 11]), question(2, 21, &[20, 21])];
        let err = grade_submission(&quiz, &answers(&[(1, 11)])).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        // same count but wrong question key
        let err = grade_submission(&quiz, &answers(&[(1, 11), (9, 21)])).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn option_from_another_question_does_not_count() {
        let quiz = vec![question(1, 11, &[10, 11]), question(2, 21, &[20, 21])];
        // 21 is correct for question 2, not question 1
        let grade = grade_submission(&quiz, &answers(&[(1, 21), (2, 21)])).expect("grade");
        assert_eq!(grade.correct_answers, 1);
    }

    #[test]
    fn empty_quiz_is_rejected() {
        let err = grade_submission(&[], &HashMap::new()).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
