use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Extension,
};
use chrono::Utc;
use serde::Deserialize;

use crate::middleware::auth::AuthUser;
use crate::routes::require_teacher;
use crate::services::export_service::{ExportService, StudentExportRow};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>,
    pub level: Option<String>,
    pub level_letter: Option<String>,
}

/// Teacher export of per-student aggregates. CSV by default (with a UTF-8
/// BOM), `format=xlsx` for a styled workbook.
#[axum::debug_handler]
pub async fn export_stats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<ExportQuery>,
) -> crate::error::Result<Response> {
    require_teacher(&auth)?;

    let students = state
        .user_service
        .get_students(query.level.as_deref(), query.level_letter.as_deref())
        .await?;

    let mut rows = Vec::with_capacity(students.len());
    for student in &students {
        // A student whose stats cannot be computed is skipped, not fatal.
        match state.user_service.user_stats(student.id).await {
            Ok(stats) => rows.push(StudentExportRow {
                id: student.id,
                first_name: student.first_name.clone(),
                last_name: student.last_name.clone(),
                class_label: student.class_display(),
                total_points: stats.total_points,
                completed_lessons: stats.completed_lessons,
                average_percentage: stats.average_percentage,
                total_attempts: stats.total_attempts,
            }),
            Err(e) => {
                tracing::warn!(error = ?e, student_id = student.id, "skipping student in export");
            }
        }
    }

    let date = Utc::now().format("%Y%m%d");
    let format = query.format.as_deref().unwrap_or("csv");

    let (body, content_type, filename) = if format == "xlsx" {
        (
            ExportService::students_xlsx(&rows)?,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            format!("students_stats_{}.xlsx", date),
        )
    } else {
        (
            ExportService::students_csv(&rows),
            "text/csv; charset=utf-8",
            format!("students_stats_{}.csv", date),
        )
    };

    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", filename),
            ),
            (
                header::ACCESS_CONTROL_EXPOSE_HEADERS,
                "Content-Disposition".to_string(),
            ),
        ],
        body,
    )
        .into_response())
}
