use anyhow::Context;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{Course, Enrollment, ProgressRecord, User};

/// Which course column an equality predicate applies to. Keeping this closed
/// keeps caller-supplied filters out of the SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseField {
    Name,
    Title,
    Owner,
}

impl CourseField {
    fn column(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Title => "title",
            Self::Owner => "owner",
        }
    }
}

/// Validated course query: a conjunction of typed predicates, built once at
/// the request boundary. `contains` is the one disjunctive piece (title OR
/// description). Results are always ordered by course name.
#[derive(Debug, Clone, Default)]
pub struct CourseFilter {
    pub published_only: bool,
    pub among: Vec<String>,
    pub exclude: Vec<String>,
    pub equals: Vec<(CourseField, String)>,
    pub contains: Option<String>,
    pub limit: Option<usize>,
}

impl CourseFilter {
    pub fn published() -> Self {
        Self {
            published_only: true,
            ..Self::default()
        }
    }

    pub fn among(mut self, names: Vec<String>) -> Self {
        self.among = names;
        self
    }

    pub fn excluding(mut self, names: Vec<String>) -> Self {
        self.exclude = names;
        self
    }

    pub fn equals(mut self, field: CourseField, value: impl Into<String>) -> Self {
        self.equals.push((field, value.into()));
        self
    }

    pub fn containing(mut self, needle: impl Into<String>) -> Self {
        self.contains = Some(needle.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Narrow boundary over the external LMS record store. All core logic goes
/// through this trait so it can run against [`memory::MemoryStore`] in tests.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn enrollments_for(&self, member: &str) -> Result<Vec<Enrollment>, StoreError>;

    async fn courses(&self, filter: &CourseFilter) -> Result<Vec<Course>, StoreError>;

    async fn get_course(&self, name: &str) -> Result<Course, StoreError>;

    async fn get_user(&self, email: &str) -> Result<User, StoreError>;

    async fn recent_progress(
        &self,
        member: &str,
        limit: i64,
    ) -> Result<Vec<ProgressRecord>, StoreError>;

    async fn enrollment_exists(&self, member: &str, course: &str) -> Result<bool, StoreError>;

    async fn insert_enrollment(&self, member: &str, course: &str) -> Result<Uuid, StoreError>;
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn course_from_row(row: &PgRow) -> Course {
    let tags: Option<Vec<String>> = row.get("tags");
    Course {
        name: row.get("name"),
        title: row.get("title"),
        short_introduction: row.get("short_introduction"),
        image: row.get("image"),
        tags: tags.unwrap_or_default(),
        published: row.get("published"),
        owner: row.get("owner"),
    }
}

fn progress_from_row(row: &PgRow) -> Result<ProgressRecord, StoreError> {
    let status: String = row.get("status");
    Ok(ProgressRecord {
        member: row.get("member"),
        lesson: row.get("lesson"),
        status: status.parse().map_err(StoreError::Backend)?,
        time_spent: row.get("time_spent"),
        modified_at: row.get("modified_at"),
    })
}

#[async_trait]
impl RecordStore for PgStore {
    async fn enrollments_for(&self, member: &str) -> Result<Vec<Enrollment>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, member, course, progress, current_lesson, created_at \
             FROM course_insights.enrollments \
             WHERE member = $1 \
             ORDER BY created_at",
        )
        .bind(member)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| Enrollment {
                id: row.get("id"),
                member: row.get("member"),
                course: row.get("course"),
                progress: row.get("progress"),
                current_lesson: row.get("current_lesson"),
                created_at: row.get("created_at"),
            })
            .collect())
    }

    async fn courses(&self, filter: &CourseFilter) -> Result<Vec<Course>, StoreError> {
        let mut sql = String::from(
            "SELECT name, title, short_introduction, image, tags, published, owner \
             FROM course_insights.courses",
        );

        let mut clauses: Vec<String> = Vec::new();
        let mut next = 1;

        if filter.published_only {
            clauses.push("published = TRUE".to_string());
        }
        if !filter.among.is_empty() {
            clauses.push(format!("name = ANY(${next})"));
            next += 1;
        }
        if !filter.exclude.is_empty() {
            clauses.push(format!("name <> ALL(${next})"));
            next += 1;
        }
        for (field, _) in &filter.equals {
            clauses.push(format!("{} = ${next}", field.column()));
            next += 1;
        }
        if filter.contains.is_some() {
            clauses.push(format!(
                "(title ILIKE ${next} OR short_introduction ILIKE ${})",
                next + 1
            ));
        }

        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY name");
        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        debug!(clauses = clauses.len(), "querying courses");

        let mut query = sqlx::query(&sql);
        if !filter.among.is_empty() {
            query = query.bind(&filter.among);
        }
        if !filter.exclude.is_empty() {
            query = query.bind(&filter.exclude);
        }
        for (_, value) in &filter.equals {
            query = query.bind(value);
        }
        let pattern = filter.contains.as_ref().map(|needle| format!("%{needle}%"));
        if let Some(pattern) = &pattern {
            query = query.bind(pattern).bind(pattern);
        }

        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.iter().map(course_from_row).collect())
    }

    async fn get_course(&self, name: &str) -> Result<Course, StoreError> {
        let row = sqlx::query(
            "SELECT name, title, short_introduction, image, tags, published, owner \
             FROM course_insights.courses \
             WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref()
            .map(course_from_row)
            .ok_or_else(|| StoreError::not_found("course", name))
    }

    async fn get_user(&self, email: &str) -> Result<User, StoreError> {
        let row = sqlx::query(
            "SELECT email, full_name FROM course_insights.users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| User {
            email: row.get("email"),
            full_name: row.get("full_name"),
        })
        .ok_or_else(|| StoreError::not_found("user", email))
    }

    async fn recent_progress(
        &self,
        member: &str,
        limit: i64,
    ) -> Result<Vec<ProgressRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT member, lesson, status, time_spent, modified_at \
             FROM course_insights.progress_records \
             WHERE member = $1 \
             ORDER BY modified_at DESC \
             LIMIT $2",
        )
        .bind(member)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(progress_from_row).collect()
    }

    async fn enrollment_exists(&self, member: &str, course: &str) -> Result<bool, StoreError> {
        let row = sqlx::query(
            "SELECT EXISTS( \
                SELECT 1 FROM course_insights.enrollments \
                WHERE member = $1 AND course = $2 \
             ) AS present",
        )
        .bind(member)
        .bind(course)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("present"))
    }

    async fn insert_enrollment(&self, member: &str, course: &str) -> Result<Uuid, StoreError> {
        // The schema carries no uniqueness constraint on (member, course), so
        // concurrent enrolls for the same pair can both reach this insert.
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO course_insights.enrollments (id, member, course, created_at) \
             VALUES ($1, $2, $3, NOW())",
        )
        .bind(id)
        .bind(member)
        .bind(course)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }
}

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let users = vec![
        ("maya.iyer@example.edu", "Maya Iyer"),
        ("tom.okafor@example.edu", "Tom Okafor"),
        ("lena.fischer@example.edu", "Lena Fischer"),
    ];

    for (email, full_name) in users {
        sqlx::query(
            r#"
            INSERT INTO course_insights.users (email, full_name)
            VALUES ($1, $2)
            ON CONFLICT (email) DO UPDATE
            SET full_name = EXCLUDED.full_name
            "#,
        )
        .bind(email)
        .bind(full_name)
        .execute(pool)
        .await?;
    }

    let courses: Vec<(&str, &str, &str, Option<Vec<&str>>, bool, &str)> = vec![
        (
            "python-basics",
            "Python Basics",
            "Core Python syntax and tooling for newcomers",
            Some(vec!["programming", "python"]),
            true,
            "priya.raman@example.edu",
        ),
        (
            "data-analysis",
            "Practical Data Analysis",
            "Working with tabular data, from cleaning to charts",
            Some(vec!["data"]),
            true,
            "priya.raman@example.edu",
        ),
        (
            "web-dev-101",
            "Web Development 101",
            "HTML, CSS and a first dynamic page",
            None,
            true,
            "carl.jensen@example.edu",
        ),
        (
            "ml-foundations",
            "Machine Learning Foundations",
            "Classical models and evaluation, python throughout",
            Some(vec!["data", "machine-learning"]),
            true,
            "priya.raman@example.edu",
        ),
        (
            "staff-onboarding",
            "Staff Onboarding",
            "Internal instructor onboarding track",
            None,
            false,
            "carl.jensen@example.edu",
        ),
    ];

    for (name, title, intro, tags, published, owner) in courses {
        sqlx::query(
            r#"
            INSERT INTO course_insights.courses
            (name, title, short_introduction, image, tags, published, owner)
            VALUES ($1, $2, $3, NULL, $4, $5, $6)
            ON CONFLICT (name) DO UPDATE
            SET title = EXCLUDED.title,
                short_introduction = EXCLUDED.short_introduction,
                tags = EXCLUDED.tags,
                published = EXCLUDED.published,
                owner = EXCLUDED.owner
            "#,
        )
        .bind(name)
        .bind(title)
        .bind(intro)
        .bind(tags.map(|t| t.iter().map(|s| s.to_string()).collect::<Vec<_>>()))
        .bind(published)
        .bind(owner)
        .execute(pool)
        .await?;
    }

    let enrollments = vec![
        (
            "maya.iyer@example.edu",
            "python-basics",
            Some(100.0_f64),
            Some("python-basics-l12"),
            Utc.with_ymd_and_hms(2026, 5, 4, 9, 30, 0),
        ),
        (
            "maya.iyer@example.edu",
            "data-analysis",
            Some(40.0),
            Some("data-analysis-l03"),
            Utc.with_ymd_and_hms(2026, 6, 12, 14, 0, 0),
        ),
        (
            "tom.okafor@example.edu",
            "python-basics",
            Some(10.0),
            Some("python-basics-l02"),
            Utc.with_ymd_and_hms(2026, 7, 1, 8, 15, 0),
        ),
    ];

    for (member, course, progress, current_lesson, created_at) in enrollments {
        let created_at = created_at.single().context("invalid seed timestamp")?;
        let exists: bool = sqlx::query(
            "SELECT EXISTS( \
                SELECT 1 FROM course_insights.enrollments \
                WHERE member = $1 AND course = $2 \
             ) AS present",
        )
        .bind(member)
        .bind(course)
        .fetch_one(pool)
        .await?
        .get("present");

        if exists {
            continue;
        }

        sqlx::query(
            r#"
            INSERT INTO course_insights.enrollments
            (id, member, course, progress, current_lesson, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(member)
        .bind(course)
        .bind(progress)
        .bind(current_lesson)
        .bind(created_at)
        .execute(pool)
        .await?;
    }

    let progress_records = vec![
        (
            "maya.iyer@example.edu",
            "data-analysis-l03",
            "in_progress",
            1260_i64,
            Utc.with_ymd_and_hms(2026, 7, 28, 19, 5, 0),
        ),
        (
            "maya.iyer@example.edu",
            "data-analysis-l02",
            "complete",
            2400,
            Utc.with_ymd_and_hms(2026, 7, 25, 18, 40, 0),
        ),
        (
            "maya.iyer@example.edu",
            "python-basics-l12",
            "complete",
            1800,
            Utc.with_ymd_and_hms(2026, 7, 2, 21, 10, 0),
        ),
        (
            "tom.okafor@example.edu",
            "python-basics-l02",
            "in_progress",
            600,
            Utc.with_ymd_and_hms(2026, 7, 30, 7, 55, 0),
        ),
    ];

    for (member, lesson, status, time_spent, modified_at) in progress_records {
        let modified_at = modified_at.single().context("invalid seed timestamp")?;
        sqlx::query(
            r#"
            INSERT INTO course_insights.progress_records
            (id, member, lesson, status, time_spent, modified_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(member)
        .bind(lesson)
        .bind(status)
        .bind(time_spent)
        .bind(modified_at)
        .execute(pool)
        .await?;
    }

    Ok(())
}

pub async fn import_courses_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        name: String,
        title: String,
        short_introduction: String,
        image: Option<String>,
        // semicolon-separated labels
        tags: Option<String>,
        published: bool,
        owner: String,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let tags: Option<Vec<String>> = row.tags.as_ref().map(|raw| {
            raw.split(';')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(str::to_string)
                .collect()
        });

        let result = sqlx::query(
            r#"
            INSERT INTO course_insights.courses
            (name, title, short_introduction, image, tags, published, owner)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(&row.name)
        .bind(&row.title)
        .bind(&row.short_introduction)
        .bind(&row.image)
        .bind(&tags)
        .bind(row.published)
        .bind(&row.owner)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}
