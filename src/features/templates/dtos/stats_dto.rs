use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Query params for project statistics
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ProjectStatsQuery {
    /// Look-back window in days
    #[serde(default = "default_days")]
    #[param(minimum = 1, maximum = 365)]
    pub days: i64,
}

fn default_days() -> i64 {
    30
}

impl ProjectStatsQuery {
    pub fn window_days(&self) -> i64 {
        self.days.clamp(1, 365)
    }
}

/// A template ranked by submission volume within the window
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct TopTemplateDto {
    pub id: Uuid,
    pub name: String,
    pub submissions: i64,
}

/// Submission count for one calendar day
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct DailySubmissionsDto {
    pub date: NaiveDate,
    pub count: i64,
}

/// Response DTO for the project dashboard
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProjectStatsDto {
    pub project_id: String,
    /// Window the counts cover, in days
    pub period_days: i64,
    /// Active templates in the project
    pub total_templates: i64,
    /// Submissions received within the window
    pub total_submissions: i64,
    pub avg_submissions_per_day: f64,
    /// Busiest templates within the window, at most ten
    pub top_templates: Vec<TopTemplateDto>,
    /// Per-day submission counts; days without submissions are omitted
    pub daily_submissions: Vec<DailySubmissionsDto>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_clamps_to_a_year() {
        let query = ProjectStatsQuery { days: 9999 };
        assert_eq!(query.window_days(), 365);

        let query = ProjectStatsQuery { days: 0 };
        assert_eq!(query.window_days(), 1);
    }
}
