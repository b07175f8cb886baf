use crate::error::StoreError;
use crate::models::{Course, EnrollOutcome};
use crate::store::{CourseField, CourseFilter, RecordStore};

/// Search results are capped at this many courses.
pub const SEARCH_LIMIT: usize = 20;

/// Published courses whose title or description contains `query`
/// (case-insensitive), further narrowed by the caller's equality filters.
/// An empty query returns nothing without touching the store.
pub async fn search_courses(
    store: &dyn RecordStore,
    query: &str,
    filters: &[(CourseField, String)],
) -> Result<Vec<Course>, StoreError> {
    if query.is_empty() {
        return Ok(Vec::new());
    }

    let mut filter = CourseFilter::published()
        .containing(query)
        .limit(SEARCH_LIMIT);
    for (field, value) in filters {
        filter = filter.equals(*field, value.clone());
    }

    store.courses(&filter).await
}

/// Create an enrollment for (member, course) unless one already exists.
pub async fn enroll(
    store: &dyn RecordStore,
    member: &str,
    course_name: &str,
) -> Result<EnrollOutcome, StoreError> {
    if member.trim().is_empty() {
        return Err(StoreError::Validation("member must not be blank".into()));
    }
    if course_name.trim().is_empty() {
        return Err(StoreError::Validation("course must not be blank".into()));
    }

    // Resolve the course first so a bogus name surfaces as NotFound instead
    // of a dangling enrollment row.
    store.get_course(course_name).await?;

    if store.enrollment_exists(member, course_name).await? {
        return Ok(EnrollOutcome {
            success: false,
            message: "Already enrolled in this course",
            enrollment_id: None,
        });
    }

    // Check-then-insert: with no store-side uniqueness on (member, course),
    // two concurrent enrolls for the same pair can both pass the check above.
    // Repeated sequential calls stay idempotent through that check.
    let id = store.insert_enrollment(member, course_name).await?;

    Ok(EnrollOutcome {
        success: true,
        message: "Successfully enrolled in course",
        enrollment_id: Some(id),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Course;
    use crate::store::memory::MemoryStore;

    fn course(name: &str, title: &str, intro: &str, published: bool) -> Course {
        Course {
            name: name.to_string(),
            title: title.to_string(),
            short_introduction: intro.to_string(),
            image: None,
            tags: Vec::new(),
            published,
            owner: "instructor@example.edu".to_string(),
        }
    }

    #[tokio::test]
    async fn empty_query_returns_nothing() {
        let store = MemoryStore::new().with_course_record(course(
            "python-basics",
            "Python Basics",
            "Core Python syntax",
            true,
        ));

        let found = search_courses(&store, "", &[]).await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn search_matches_title_or_description_case_insensitively() {
        let store = MemoryStore::new()
            .with_course_record(course(
                "python-basics",
                "Python Basics",
                "Core syntax",
                true,
            ))
            .with_course_record(course(
                "data-analysis",
                "Practical Data Analysis",
                "Cleaning data with python scripts",
                true,
            ))
            .with_course_record(course(
                "web-dev-101",
                "Web Development 101",
                "HTML and CSS",
                true,
            ))
            .with_course_record(course(
                "python-secrets",
                "Python Secrets",
                "Unreleased draft",
                false,
            ));

        let found = search_courses(&store, "PyThOn", &[]).await.unwrap();
        let names: Vec<&str> = found.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["data-analysis", "python-basics"]);
    }

    #[tokio::test]
    async fn search_results_are_capped() {
        let mut store = MemoryStore::new();
        for i in 0..25 {
            store = store.with_course_record(course(
                &format!("rust-{i:02}"),
                &format!("Rust Track {i}"),
                "Systems programming",
                true,
            ));
        }

        let found = search_courses(&store, "rust", &[]).await.unwrap();
        assert_eq!(found.len(), SEARCH_LIMIT);
    }

    #[tokio::test]
    async fn equality_filters_narrow_the_search() {
        let mut dana = course("intro-a", "Intro to Data", "numbers", true);
        dana.owner = "dana@example.edu".to_string();
        let store = MemoryStore::new()
            .with_course_record(dana)
            .with_course_record(course("intro-b", "Intro to Data II", "numbers", true));

        let filters = vec![(CourseField::Owner, "dana@example.edu".to_string())];
        let found = search_courses(&store, "data", &filters).await.unwrap();
        let names: Vec<&str> = found.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["intro-a"]);
    }

    #[tokio::test]
    async fn enroll_then_duplicate_enroll() {
        let store = MemoryStore::new().with_course("python-basics", &[], true);

        let first = enroll(&store, "maya@example.edu", "python-basics")
            .await
            .unwrap();
        assert!(first.success);
        assert_eq!(first.message, "Successfully enrolled in course");
        assert!(first.enrollment_id.is_some());

        let second = enroll(&store, "maya@example.edu", "python-basics")
            .await
            .unwrap();
        assert!(!second.success);
        assert_eq!(second.message, "Already enrolled in this course");
        assert!(second.enrollment_id.is_none());
        assert_eq!(store.enrollment_count("maya@example.edu", "python-basics"), 1);
    }

    #[tokio::test]
    async fn enroll_in_unknown_course_is_not_found() {
        let store = MemoryStore::new();
        let err = enroll(&store, "maya@example.edu", "no-such-course")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn blank_arguments_are_rejected_before_store_access() {
        let store = MemoryStore::new();
        let err = enroll(&store, "  ", "python-basics").await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));

        let err = enroll(&store, "maya@example.edu", "").await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }
}
