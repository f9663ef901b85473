use std::collections::HashMap;

use sqlx::PgPool;

use crate::dto::game_dto::{
    ClassGameStatsRow, GameLeaderboardEntry, GameStatsRow, RecentGameResult,
    SubmitGameResultRequest, UserGameSummary,
};
use crate::error::Result;
use crate::models::game_result::GameResult;

const DEFAULT_LEADERBOARD_LIMIT: i64 = 10;
const DEFAULT_RECENT_LIMIT: i64 = 20;

/// Mini-game results are append-only; every stat below is derived at read
/// time by grouped aggregation.
#[derive(Clone)]
pub struct GameService {
    pool: PgPool,
}

impl GameService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn submit_result(
        &self,
        user_id: i64,
        req: &SubmitGameResultRequest,
    ) -> Result<GameResult> {
        let percentage = f64::from(req.correct_count) / f64::from(req.total_count) * 100.0;

        let result = sqlx::query_as::<_, GameResult>(
            r#"
            INSERT INTO game_results
                (user_id, game_type, level, score, max_score, percentage,
                 time_spent, correct_count, total_count)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&req.game_type)
        .bind(req.level)
        .bind(req.score)
        .bind(req.max_score)
        .bind(percentage)
        .bind(req.time_spent)
        .bind(req.correct_count)
        .bind(req.total_count)
        .fetch_one(&self.pool)
        .await?;
        Ok(result)
    }

    pub async fn user_results(
        &self,
        user_id: i64,
        game_type: Option<&str>,
        level: Option<i32>,
    ) -> Result<Vec<GameResult>> {
        let rows = sqlx::query_as::<_, GameResult>(
            r#"
            SELECT * FROM game_results
            WHERE user_id = $1
              AND ($2::TEXT IS NULL OR game_type = $2)
              AND ($3::INT IS NULL OR level = $3)
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(game_type)
        .bind(level)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn user_stats(&self, user_id: i64) -> Result<Vec<GameStatsRow>> {
        let rows = sqlx::query_as::<_, GameStatsRow>(
            r#"
            SELECT game_type, level,
                   COUNT(*) AS total_attempts,
                   MAX(score) AS best_score,
                   MAX(percentage) AS best_percentage,
                   AVG(score)::DOUBLE PRECISION AS avg_score,
                   AVG(percentage) AS avg_percentage,
                   AVG(time_spent)::DOUBLE PRECISION AS avg_time,
                   MAX(created_at) AS last_played
            FROM game_results
            WHERE user_id = $1
            GROUP BY game_type, level
            ORDER BY game_type, level
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn user_summary(&self, user_id: i64) -> Result<UserGameSummary> {
        let (total_games, total_time, avg_percentage): (i64, i64, f64) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COALESCE(SUM(time_spent), 0)::BIGINT,
                   COALESCE(AVG(percentage), 0)
            FROM game_results WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let per_game: Vec<(String, i64)> = sqlx::query_as(
            "SELECT game_type, COUNT(*) FROM game_results WHERE user_id = $1 GROUP BY game_type",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        let games_played: HashMap<String, i64> = per_game.into_iter().collect();

        // distinct (game, level) pairs cleared with >= 70%
        let levels_completed: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM (
                SELECT DISTINCT game_type, level
                FROM game_results
                WHERE user_id = $1 AND percentage >= 70
            ) cleared
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(UserGameSummary {
            total_games,
            total_time,
            avg_percentage,
            games_played,
            levels_completed,
        })
    }

    /// Best run for (user, game, level); ties broken by lower time spent.
    pub async fn best_result(
        &self,
        user_id: i64,
        game_type: &str,
        level: i32,
    ) -> Result<Option<GameResult>> {
        let row = sqlx::query_as::<_, GameResult>(
            r#"
            SELECT * FROM game_results
            WHERE user_id = $1 AND game_type = $2 AND level = $3
            ORDER BY percentage DESC, time_spent ASC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(game_type)
        .bind(level)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Per-student game totals for a class; favorite game is the
    /// highest-count type (first returned wins ties).
    pub async fn class_stats(
        &self,
        level: Option<i32>,
        level_letter: Option<&str>,
    ) -> Result<Vec<ClassGameStatsRow>> {
        let mut rows = sqlx::query_as::<_, ClassGameStatsRow>(
            r#"
            SELECT u.id AS student_id,
                   CASE WHEN u.first_name <> '' AND u.last_name <> ''
                        THEN u.first_name || ' ' || u.last_name
                        ELSE u.username END AS student_name,
                   COUNT(g.id) AS total_games,
                   AVG(g.percentage) AS avg_percentage,
                   COALESCE(SUM(g.time_spent), 0)::BIGINT AS total_time,
                   MAX(g.created_at) AS last_activity
            FROM game_results g
            JOIN users u ON u.id = g.user_id
            WHERE u.role = 'student' AND u.deleted_at IS NULL
              AND ($1::INT IS NULL OR u.level = $1)
              AND ($2::TEXT IS NULL OR u.level_letter ILIKE $2)
            GROUP BY u.id, u.username, u.first_name, u.last_name
            ORDER BY avg_percentage DESC
            "#,
        )
        .bind(level)
        .bind(level_letter)
        .fetch_all(&self.pool)
        .await?;

        for row in &mut rows {
            let favorite: Option<String> = sqlx::query_scalar(
                r#"
                SELECT game_type FROM game_results
                WHERE user_id = $1
                GROUP BY game_type
                ORDER BY COUNT(*) DESC
                LIMIT 1
                "#,
            )
            .bind(row.student_id)
            .fetch_optional(&self.pool)
            .await?;
            row.favorite_game = favorite.unwrap_or_default();
        }

        Ok(rows)
    }

    /// Each user's single best run for (game, level), best percentage first,
    /// ties broken by lower time spent.
    pub async fn leaderboard(
        &self,
        game_type: &str,
        level: i32,
        limit: i64,
    ) -> Result<Vec<GameLeaderboardEntry>> {
        let limit = if limit <= 0 {
            DEFAULT_LEADERBOARD_LIMIT
        } else {
            limit
        };
        let rows = sqlx::query_as::<_, GameLeaderboardEntry>(
            r#"
            SELECT * FROM (
                SELECT DISTINCT ON (g.user_id)
                       g.user_id, u.username,
                       CASE WHEN u.first_name <> '' AND u.last_name <> ''
                            THEN u.first_name || ' ' || u.last_name
                            ELSE u.username END AS full_name,
                       g.score, g.max_score, g.percentage, g.time_spent, g.created_at
                FROM game_results g
                JOIN users u ON u.id = g.user_id
                WHERE g.game_type = $1 AND g.level = $2 AND u.deleted_at IS NULL
                ORDER BY g.user_id, g.percentage DESC, g.time_spent ASC
            ) best
            ORDER BY best.percentage DESC, best.time_spent ASC
            LIMIT $3
            "#,
        )
        .bind(game_type)
        .bind(level)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn recent_results(
        &self,
        limit: i64,
        level: Option<i32>,
        level_letter: Option<&str>,
    ) -> Result<Vec<RecentGameResult>> {
        let limit = if limit <= 0 { DEFAULT_RECENT_LIMIT } else { limit };
        let rows = sqlx::query_as::<_, RecentGameResult>(
            r#"
            SELECT g.id, g.user_id, u.username,
                   CASE WHEN u.first_name <> '' AND u.last_name <> ''
                        THEN u.first_name || ' ' || u.last_name
                        ELSE u.username END AS full_name,
                   g.game_type, g.level, g.score, g.max_score, g.percentage,
                   g.time_spent, g.created_at
            FROM game_results g
            JOIN users u ON u.id = g.user_id
            WHERE u.role = 'student' AND u.deleted_at IS NULL
              AND ($1::INT IS NULL OR u.level = $1)
              AND ($2::TEXT IS NULL OR u.level_letter ILIKE $2)
            ORDER BY g.created_at DESC
            LIMIT $3
            "#,
        )
        .bind(level)
        .bind(level_letter)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
