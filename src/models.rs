use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub email: String,
    pub full_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Course {
    pub name: String,
    pub title: String,
    pub short_introduction: String,
    pub image: Option<String>,
    pub tags: Vec<String>,
    pub published: bool,
    pub owner: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Enrollment {
    pub id: Uuid,
    pub member: String,
    pub course: String,
    pub progress: Option<f64>,
    pub current_lesson: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonStatus {
    NotStarted,
    InProgress,
    Complete,
}

impl std::fmt::Display for LessonStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not_started"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Complete => write!(f, "complete"),
        }
    }
}

impl std::str::FromStr for LessonStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(Self::NotStarted),
            "in_progress" => Ok(Self::InProgress),
            "complete" => Ok(Self::Complete),
            other => Err(format!("unknown lesson status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressRecord {
    pub member: String,
    pub lesson: String,
    pub status: LessonStatus,
    pub time_spent: i64,
    pub modified_at: DateTime<Utc>,
}

/// One enrolled course as it appears on the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct CourseProgress {
    pub name: String,
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub progress: f64,
    pub current_lesson: Option<String>,
    pub enrolled_at: DateTime<Utc>,
    pub instructor: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_courses: usize,
    pub completed: usize,
    pub in_progress: usize,
}

/// Derived per request; holds no identity beyond the request that built it.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub user: String,
    pub statistics: DashboardStats,
    pub courses: Vec<CourseProgress>,
    pub recent_activity: Vec<ProgressRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredCandidate {
    pub name: String,
    pub title: String,
    pub short_introduction: String,
    pub image: Option<String>,
    pub tags: Vec<String>,
    pub recommendation_score: i32,
    pub reason: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrollOutcome {
    pub success: bool,
    pub message: &'static str,
    pub enrollment_id: Option<Uuid>,
}
