use sqlx::PgPool;

use crate::dto::leaderboard_dto::LeaderboardEntry;
use crate::error::{Error, Result};
use crate::models::user::{class_display_for, ROLE_STUDENT};
use crate::utils::validation::normalize_level_letter;

#[derive(Clone)]
pub struct LeaderboardService {
    pool: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct StandingRow {
    user_id: i64,
    username: String,
    first_name: String,
    last_name: String,
    level: Option<i32>,
    level_letter: String,
    total_points: i64,
    completed_lessons: i64,
    average_percentage: f64,
}

/// Sorts standings by points, ties by average percentage, and assigns dense
/// 1-based positions. Equal sort keys still get distinct consecutive ranks.
pub fn rank_entries(mut entries: Vec<LeaderboardEntry>) -> Vec<LeaderboardEntry> {
    entries.sort_by(|a, b| {
        b.total_points.cmp(&a.total_points).then(
            b.average_percentage
                .partial_cmp(&a.average_percentage)
                .unwrap_or(std::cmp::Ordering::Equal),
        )
    });
    for (i, entry) in entries.iter_mut().enumerate() {
        entry.rank = i as i32 + 1;
    }
    entries
}

impl LeaderboardService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Students default to their own class; explicit valid query filters
    /// replace the scoped values outright.
    pub async fn leaderboard(
        &self,
        user_id: i64,
        role: &str,
        level_filter: Option<&str>,
        letter_filter: Option<&str>,
    ) -> Result<Vec<LeaderboardEntry>> {
        let caller: Option<(Option<i32>, String, String)> = sqlx::query_as(
            "SELECT level, level_letter, role FROM users WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        let Some((caller_level, caller_letter, _)) = caller else {
            return Err(Error::NotFound("User not found".to_string()));
        };

        let mut level: Option<i32> = None;
        let mut letter: Option<String> = None;
        if role == ROLE_STUDENT && caller_level.is_some() {
            level = caller_level;
            if !caller_letter.is_empty() {
                letter = Some(caller_letter);
            }
        }

        if let Some(raw) = level_filter {
            if let Ok(parsed) = raw.parse::<i32>() {
                if (1..=11).contains(&parsed) {
                    level = Some(parsed);
                }
            }
        }
        if let Some(raw) = letter_filter {
            if let Some(normalized) = normalize_level_letter(raw) {
                letter = Some(normalized);
            }
        }

        let rows = sqlx::query_as::<_, StandingRow>(
            r#"
            SELECT u.id AS user_id, u.username, u.first_name, u.last_name,
                   u.level, u.level_letter,
                   COALESCE(SUM(p.best_score), 0)::BIGINT AS total_points,
                   COUNT(*) FILTER (WHERE p.is_completed) AS completed_lessons,
                   COALESCE(AVG(p.best_percentage) FILTER (WHERE p.is_completed), 0)
                       AS average_percentage
            FROM users u
            LEFT JOIN lesson_progress p ON p.user_id = u.id
            WHERE u.role = 'student' AND u.deleted_at IS NULL
              AND ($1::INT IS NULL OR u.level = $1)
              AND ($2::TEXT IS NULL OR u.level_letter ILIKE $2)
            GROUP BY u.id
            "#,
        )
        .bind(level)
        .bind(letter)
        .fetch_all(&self.pool)
        .await?;

        let entries = rows
            .into_iter()
            .map(|row| LeaderboardEntry {
                user_id: row.user_id,
                full_name: if !row.first_name.is_empty() && !row.last_name.is_empty() {
                    format!("{} {}", row.first_name, row.last_name)
                } else {
                    row.username.clone()
                },
                class_display: class_display_for(row.level, &row.level_letter),
                username: row.username,
                total_points: row.total_points,
                completed_lessons: row.completed_lessons,
                average_percentage: row.average_percentage,
                rank: 0,
            })
            .collect();

        Ok(rank_entries(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(user_id: i64, points: i64, avg: f64) -> LeaderboardEntry {
        LeaderboardEntry {
            user_id,
            username: format!("u{user_id}"),
            full_name: format!("User {user_id}"),
            class_display: "7-А".into(),
            total_points: points,
            completed_lessons: 0,
            average_percentage: avg,
            rank: 0,
        }
    }

    #[test]
    fn sorts_by_points_then_average() {
        let ranked = rank_entries(vec![
            entry(1, 100, 80.0),
            entry(2, 250, 70.0),
            entry(3, 100, 95.0),
        ]);
        let order: Vec<i64> = ranked.iter().map(|e| e.user_id).collect();
        assert_eq!(order, vec![2, 3, 1]);
    }

    #[test]
    fn ranks_are_dense_one_based_even_for_ties() {
        let ranked = rank_entries(vec![
            entry(1, 100, 80.0),
            entry(2, 100, 80.0),
            entry(3, 100, 80.0),
        ]);
        let ranks: Vec<i32> = ranked.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[test]
    fn empty_input_ranks_to_empty() {
        assert!(rank_entries(vec![]).is_empty());
    }
}
