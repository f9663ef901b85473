use std::collections::HashMap;

use sqlx::PgPool;

use crate::dto::lesson_dto::{
    AnswerOptionView, LessonDetail, LessonSummary, ProgressByLessonRow, ProgressRow,
    ProgressSummary, QuestionView,
};
use crate::error::{Error, Result};
use crate::models::lesson::{AnswerOption, Lesson, Question};
use crate::models::progress::LessonProgress;

#[derive(Clone)]
pub struct LessonService {
    pool: PgPool,
}

/// Gate rule shared by the read path and the submission path: the first
/// lesson is always open, any later lesson requires the previous one to be
/// completed. `previous` is None when no previous active lesson exists.
pub fn gate_open(order: i32, previous_completed: Option<bool>) -> bool {
    order <= 1 || previous_completed.unwrap_or(true)
}

/// Resolves the gate against the store and rejects with the previous lesson's
/// title when it is still locked.
pub async fn ensure_lesson_accessible(pool: &PgPool, user_id: i64, lesson: &Lesson) -> Result<()> {
    if lesson.order <= 1 {
        return Ok(());
    }

    let previous: Option<(String, bool)> = sqlx::query_as(
        r#"
        SELECT l.title, COALESCE(p.is_completed, FALSE)
        FROM lessons l
        LEFT JOIN lesson_progress p ON p.lesson_id = l.id AND p.user_id = $1
        WHERE l."order" = $2 AND l.is_active = TRUE
        "#,
    )
    .bind(user_id)
    .bind(lesson.order - 1)
    .fetch_optional(pool)
    .await?;

    let completed = previous.as_ref().map(|(_, completed)| *completed);
    if gate_open(lesson.order, completed) {
        return Ok(());
    }

    let title = previous.map(|(title, _)| title).unwrap_or_default();
    Err(Error::Forbidden(format!(
        "Complete the previous lesson '{}' with a score of at least 70% first",
        title
    )))
}

/// Loads a lesson's questions with their options, both in display order.
pub async fn load_lesson_questions(
    pool: &PgPool,
    lesson_id: i64,
) -> Result<Vec<(Question, Vec<AnswerOption>)>> {
    let questions = sqlx::query_as::<_, Question>(
        r#"SELECT * FROM questions WHERE lesson_id = $1 ORDER BY "order", id"#,
    )
    .bind(lesson_id)
    .fetch_all(pool)
    .await?;

    let ids: Vec<i64> = questions.iter().map(|q| q.id).collect();
    let options = sqlx::query_as::<_, AnswerOption>(
        r#"SELECT * FROM answer_options WHERE question_id = ANY($1) ORDER BY "order", id"#,
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let mut by_question: HashMap<i64, Vec<AnswerOption>> = HashMap::new();
    for option in options {
        by_question.entry(option.question_id).or_default().push(option);
    }

    Ok(questions
        .into_iter()
        .map(|q| {
            let opts = by_question.remove(&q.id).unwrap_or_default();
            (q, opts)
        })
        .collect())
}

fn question_view(question: Question, options: Vec<AnswerOption>, show_answers: bool) -> QuestionView {
    QuestionView {
        id: question.id,
        text: question.text,
        order: question.order,
        answer_options: options
            .into_iter()
            .map(|o| AnswerOptionView {
                id: o.id,
                text: o.text,
                order: o.order,
                is_correct: show_answers.then_some(o.is_correct),
            })
            .collect(),
    }
}

impl LessonService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_active_lesson(&self, lesson_id: i64) -> Result<Lesson> {
        sqlx::query_as::<_, Lesson>(
            "SELECT * FROM lessons WHERE id = $1 AND is_active = TRUE",
        )
        .bind(lesson_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Lesson not found or inactive".to_string()))
    }

    /// Ordered active lessons; attaches the caller's progress when a student
    /// id is given.
    pub async fn list_lessons(&self, user_id: Option<i64>) -> Result<Vec<LessonSummary>> {
        let lessons = sqlx::query_as::<_, Lesson>(
            r#"SELECT * FROM lessons WHERE is_active = TRUE ORDER BY "order""#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut progress_map: HashMap<i64, LessonProgress> = HashMap::new();
        if let Some(user_id) = user_id {
            let rows = sqlx::query_as::<_, LessonProgress>(
                "SELECT * FROM lesson_progress WHERE user_id = $1",
            )
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
            progress_map = rows.into_iter().map(|p| (p.lesson_id, p)).collect();
        }

        Ok(lessons
            .into_iter()
            .map(|lesson| LessonSummary {
                progress: progress_map
                    .get(&lesson.id)
                    .map(ProgressSummary::from_model),
                id: lesson.id,
                title: lesson.title,
                description: lesson.description,
                order: lesson.order,
            })
            .collect())
    }

    /// Lesson with questions. Students must pass the gate; option correctness
    /// is exposed to teachers only.
    pub async fn get_lesson(
        &self,
        lesson_id: i64,
        user_id: i64,
        is_teacher: bool,
    ) -> Result<LessonDetail> {
        let lesson = self.find_active_lesson(lesson_id).await?;

        if !is_teacher {
            ensure_lesson_accessible(&self.pool, user_id, &lesson).await?;
        }

        let questions = load_lesson_questions(&self.pool, lesson_id).await?;

        let progress = if is_teacher {
            None
        } else {
            let row = self.find_progress(user_id, lesson_id).await?;
            Some(
                row.as_ref()
                    .map(ProgressSummary::from_model)
                    .unwrap_or_else(ProgressSummary::empty),
            )
        };

        Ok(LessonDetail {
            id: lesson.id,
            title: lesson.title,
            description: lesson.description,
            order: lesson.order,
            is_active: lesson.is_active,
            questions: questions
                .into_iter()
                .map(|(q, opts)| question_view(q, opts, is_teacher))
                .collect(),
            created_at: lesson.created_at,
            progress,
            is_accessible: true,
        })
    }

    pub async fn lesson_questions(
        &self,
        lesson_id: i64,
        is_teacher: bool,
    ) -> Result<Vec<QuestionView>> {
        let questions = load_lesson_questions(&self.pool, lesson_id).await?;
        Ok(questions
            .into_iter()
            .map(|(q, opts)| question_view(q, opts, is_teacher))
            .collect())
    }

    pub async fn find_progress(
        &self,
        user_id: i64,
        lesson_id: i64,
    ) -> Result<Option<LessonProgress>> {
        let row = sqlx::query_as::<_, LessonProgress>(
            "SELECT * FROM lesson_progress WHERE user_id = $1 AND lesson_id = $2",
        )
        .bind(user_id)
        .bind(lesson_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Student's progress rows with lesson context, ordered by lesson id.
    pub async fn user_progress(&self, user_id: i64) -> Result<Vec<ProgressRow>> {
        let rows = sqlx::query_as::<_, ProgressRow>(
            r#"
            SELECT p.lesson_id, l.title AS lesson_title, l."order" AS lesson_order,
                   p.best_percentage, p.best_score, p.attempts_count,
                   p.is_completed, p.completed_at, p.last_attempt_at
            FROM lesson_progress p
            JOIN lessons l ON l.id = p.lesson_id
            WHERE p.user_id = $1
            ORDER BY p.lesson_id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// All progress rows for one lesson (teacher view), most recent first.
    pub async fn progress_by_lesson(&self, lesson_id: i64) -> Result<Vec<ProgressByLessonRow>> {
        let rows = sqlx::query_as::<_, ProgressByLessonRow>(
            r#"
            SELECT p.id, p.user_id, u.username,
                   CASE WHEN u.first_name <> '' AND u.last_name <> ''
                        THEN u.first_name || ' ' || u.last_name
                        ELSE u.username END AS full_name,
                   p.lesson_id, l.title AS lesson_title,
                   p.best_score, p.best_percentage, p.attempts_count,
                   p.is_completed, p.completed_at, p.last_attempt_at
            FROM lesson_progress p
            JOIN users u ON u.id = p.user_id
            JOIN lessons l ON l.id = p.lesson_id
            WHERE p.lesson_id = $1
            ORDER BY p.last_attempt_at DESC
            "#,
        )
        .bind(lesson_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
