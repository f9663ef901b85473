use crate::error::Result;
use sqlx::PgPool;
use tracing::info;

struct SeedQuestion {
    text: &'static str,
    // (option text, is_correct), in display order
    options: [(&'static str, bool); 4],
}

struct SeedLesson {
    title: &'static str,
    description: &'static str,
    questions: &'static [SeedQuestion],
}

/// Inserts the default lesson catalog on an empty database. Does nothing if
/// any lesson already exists, so redeploys never duplicate content.
pub async fn seed_default_lessons(pool: &PgPool) -> Result<()> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lessons")
        .fetch_one(pool)
        .await?;
    if count > 0 {
        return Ok(());
    }

    let mut tx = pool.begin().await?;
    for (idx, lesson) in DEFAULT_LESSONS.iter().enumerate() {
        let lesson_id: i64 = sqlx::query_scalar(
            r#"INSERT INTO lessons (title, description, "order", is_active)
               VALUES ($1, $2, $3, TRUE) RETURNING id"#,
        )
        .bind(lesson.title)
        .bind(lesson.description)
        .bind(idx as i32 + 1)
        .fetch_one(&mut *tx)
        .await?;

        for (q_idx, question) in lesson.questions.iter().enumerate() {
            let question_id: i64 = sqlx::query_scalar(
                r#"INSERT INTO questions (lesson_id, text, "order")
                   VALUES ($1, $2, $3) RETURNING id"#,
            )
            .bind(lesson_id)
            .bind(question.text)
            .bind(q_idx as i32 + 1)
            .fetch_one(&mut *tx)
            .await?;

            for (o_idx, (text, is_correct)) in question.options.iter().enumerate() {
                sqlx::query(
                    r#"INSERT INTO answer_options (question_id, text, is_correct, "order")
                       VALUES ($1, $2, $3, $4)"#,
                )
                .bind(question_id)
                .bind(text)
                .bind(is_correct)
                .bind(o_idx as i32 + 1)
                .execute(&mut *tx)
                .await?;
            }
        }
    }
    tx.commit().await?;

    info!("Seeded {} default lessons", DEFAULT_LESSONS.len());
    Ok(())
}

static DEFAULT_LESSONS: &[SeedLesson] = &[
    SeedLesson {
        title: "Nouns: Countable and Uncountable",
        description: "Исчисляемые и неисчисляемые существительные",
        questions: &[
            SeedQuestion {
                text: "Какое существительное является исчисляемым?",
                options: [
                    ("water", false),
                    ("book", true),
                    ("money", false),
                    ("sugar", false),
                ],
            },
            SeedQuestion {
                text: "Выберите правильный вариант: How ___ apples do you need?",
                options: [
                    ("much", false),
                    ("many", true),
                    ("little", false),
                    ("less", false),
                ],
            },
            SeedQuestion {
                text: "Выберите правильный вариант: There is ___ milk in the fridge.",
                options: [
                    ("many", false),
                    ("few", false),
                    ("much", true),
                    ("a few", false),
                ],
            },
            SeedQuestion {
                text: "Какое существительное является неисчисляемым?",
                options: [
                    ("chair", false),
                    ("information", true),
                    ("dog", false),
                    ("apple", false),
                ],
            },
            SeedQuestion {
                text: "Выберите правильный вариант: I need ___ advice.",
                options: [
                    ("an", false),
                    ("a", false),
                    ("some", true),
                    ("many", false),
                ],
            },
        ],
    },
    SeedLesson {
        title: "Present Simple",
        description: "Простое настоящее время",
        questions: &[
            SeedQuestion {
                text: "Выберите правильный вариант: She ___ to school every day.",
                options: [
                    ("go", false),
                    ("goes", true),
                    ("going", false),
                    ("gone", false),
                ],
            },
            SeedQuestion {
                text: "Выберите правильный вариант: ___ they play football on Sundays?",
                options: [
                    ("Does", false),
                    ("Is", false),
                    ("Do", true),
                    ("Are", false),
                ],
            },
            SeedQuestion {
                text: "Выберите правильный вариант: He ___ like coffee.",
                options: [
                    ("don't", false),
                    ("doesn't", true),
                    ("isn't", false),
                    ("hasn't", false),
                ],
            },
            SeedQuestion {
                text: "Выберите правильный вариант: I usually ___ up at 7 o'clock.",
                options: [
                    ("wakes", false),
                    ("waking", false),
                    ("wake", true),
                    ("woke", false),
                ],
            },
            SeedQuestion {
                text: "Выберите правильный вариант: The shop ___ at 9 a.m.",
                options: [
                    ("open", false),
                    ("opens", true),
                    ("opening", false),
                    ("is open", false),
                ],
            },
        ],
    },
    SeedLesson {
        title: "Articles: a, an, the",
        description: "Артикли в английском языке",
        questions: &[
            SeedQuestion {
                text: "Выберите правильный вариант: I saw ___ elephant at the zoo.",
                options: [
                    ("a", false),
                    ("an", true),
                    ("the", false),
                    ("—", false),
                ],
            },
            SeedQuestion {
                text: "Выберите правильный вариант: ___ sun rises in the east.",
                options: [
                    ("A", false),
                    ("An", false),
                    ("The", true),
                    ("—", false),
                ],
            },
            SeedQuestion {
                text: "Выберите правильный вариант: She is ___ doctor.",
                options: [
                    ("a", true),
                    ("an", false),
                    ("the", false),
                    ("—", false),
                ],
            },
            SeedQuestion {
                text: "Выберите правильный вариант: We had ___ lunch at noon.",
                options: [
                    ("a", false),
                    ("an", false),
                    ("the", false),
                    ("—", true),
                ],
            },
            SeedQuestion {
                text: "Выберите правильный вариант: This is ___ best day of my life!",
                options: [
                    ("a", false),
                    ("an", false),
                    ("the", true),
                    ("—", false),
                ],
            },
        ],
    },
    SeedLesson {
        title: "Plural Nouns",
        description: "Множественное число существительных",
        questions: &[
            SeedQuestion {
                text: "Выберите множественное число: child",
                options: [
                    ("childs", false),
                    ("children", true),
                    ("childes", false),
                    ("child", false),
                ],
            },
            SeedQuestion {
                text: "Выберите множественное число: box",
                options: [
                    ("boxs", false),
                    ("boxies", false),
                    ("boxes", true),
                    ("box", false),
                ],
            },
            SeedQuestion {
                text: "Выберите множественное число: mouse",
                options: [
                    ("mouses", false),
                    ("mice", true),
                    ("mousees", false),
                    ("meese", false),
                ],
            },
            SeedQuestion {
                text: "Выберите множественное число: foot",
                options: [
                    ("foots", false),
                    ("feets", false),
                    ("feet", true),
                    ("footes", false),
                ],
            },
            SeedQuestion {
                text: "Выберите множественное число: sheep",
                options: [
                    ("sheeps", false),
                    ("sheep", true),
                    ("shoop", false),
                    ("sheepes", false),
                ],
            },
        ],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_seed_question_has_exactly_one_correct_option() {
        for lesson in DEFAULT_LESSONS {
            assert!(!lesson.questions.is_empty(), "{} has no questions", lesson.title);
            for question in lesson.questions {
                let correct = question.options.iter().filter(|(_, ok)| *ok).count();
                assert_eq!(correct, 1, "bad option set in: {}", question.text);
            }
        }
    }
}
