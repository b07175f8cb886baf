use crate::error::StoreError;
use crate::models::{Course, ScoredCandidate};
use crate::store::{CourseFilter, RecordStore};

/// Cap on the candidate pool handed to the scorer. A sampling policy, not a
/// correctness bound: candidates are the first N eligible courses in store
/// order, not the globally best N.
pub const DEFAULT_POOL_SIZE: usize = 10;

/// How many ranked recommendations a request returns.
pub const DEFAULT_LIMIT: usize = 5;

const BASE_SCORE: i32 = 50;
const TAG_BOOST: i32 = 20;

const REASONS: [&str; 4] = [
    "Popular in your field",
    "Complements your current courses",
    "Trending this week",
    "Recommended by instructors",
];

pub async fn enrolled_course_names(
    store: &dyn RecordStore,
    member: &str,
) -> Result<Vec<String>, StoreError> {
    let enrollments = store.enrollments_for(member).await?;
    Ok(enrollments.into_iter().map(|e| e.course).collect())
}

/// Published courses the member is not enrolled in, capped at `pool_size`.
pub async fn eligible_courses(
    store: &dyn RecordStore,
    enrolled: &[String],
    pool_size: usize,
) -> Result<Vec<Course>, StoreError> {
    let filter = CourseFilter::published()
        .excluding(enrolled.to_vec())
        .limit(pool_size);
    store.courses(&filter).await
}

/// Placeholder scoring model: a flat baseline plus a flat boost for any
/// tagged course. The enrolled set is accepted for a future tag-affinity
/// signal but is not read yet, and every candidate gets the first canned
/// reason.
pub fn score_course(course: &Course, _enrolled: &[String]) -> (i32, &'static str) {
    let mut score = BASE_SCORE;
    if !course.tags.is_empty() {
        score += TAG_BOOST;
    }
    (score, REASONS[0])
}

/// Order by score descending and keep the top `limit`. Equal scores keep
/// their candidate-pool order; fewer candidates than `limit` all survive.
pub fn rank(mut candidates: Vec<ScoredCandidate>, limit: usize) -> Vec<ScoredCandidate> {
    candidates.sort_by(|a, b| b.recommendation_score.cmp(&a.recommendation_score));
    candidates.truncate(limit);
    candidates
}

pub async fn get_recommendations(
    store: &dyn RecordStore,
    member: &str,
    pool_size: usize,
    limit: usize,
) -> Result<Vec<ScoredCandidate>, StoreError> {
    let enrolled = enrolled_course_names(store, member).await?;
    let pool = eligible_courses(store, &enrolled, pool_size).await?;

    let scored = pool
        .into_iter()
        .map(|course| {
            let (score, reason) = score_course(&course, &enrolled);
            ScoredCandidate {
                name: course.name,
                title: course.title,
                short_introduction: course.short_introduction,
                image: course.image,
                tags: course.tags,
                recommendation_score: score,
                reason,
            }
        })
        .collect();

    Ok(rank(scored, limit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    fn sample_course(name: &str, tags: &[&str]) -> Course {
        Course {
            name: name.to_string(),
            title: format!("{name} title"),
            short_introduction: format!("About {name}"),
            image: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            published: true,
            owner: "instructor@example.edu".to_string(),
        }
    }

    fn candidate(name: &str, score: i32) -> ScoredCandidate {
        ScoredCandidate {
            name: name.to_string(),
            title: format!("{name} title"),
            short_introduction: String::new(),
            image: None,
            tags: Vec::new(),
            recommendation_score: score,
            reason: REASONS[0],
        }
    }

    #[test]
    fn tagged_courses_get_the_boost() {
        let (score, reason) = score_course(&sample_course("c1", &["x"]), &[]);
        assert_eq!(score, 70);
        assert_eq!(reason, "Popular in your field");

        let (score, reason) = score_course(&sample_course("c2", &[]), &[]);
        assert_eq!(score, 50);
        assert_eq!(reason, "Popular in your field");
    }

    #[test]
    fn enrollment_history_does_not_change_the_score() {
        let course = sample_course("c1", &["x"]);
        let enrolled = vec!["c9".to_string(), "c8".to_string()];
        assert_eq!(score_course(&course, &enrolled), score_course(&course, &[]));
    }

    #[test]
    fn rank_orders_descending_and_truncates() {
        let ranked = rank(
            vec![
                candidate("low", 50),
                candidate("high", 70),
                candidate("mid", 60),
            ],
            2,
        );
        let names: Vec<&str> = ranked.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["high", "mid"]);
    }

    #[test]
    fn rank_keeps_input_order_on_ties() {
        let ranked = rank(
            vec![
                candidate("first", 50),
                candidate("second", 50),
                candidate("third", 50),
            ],
            5,
        );
        let names: Vec<&str> = ranked.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn rank_returns_everything_when_short_of_limit() {
        let ranked = rank(vec![candidate("only", 70)], 5);
        assert_eq!(ranked.len(), 1);
        assert!(rank(Vec::new(), 5).is_empty());
    }

    #[tokio::test]
    async fn recommendations_exclude_enrolled_and_unpublished() {
        let store = MemoryStore::new()
            .with_course("a-enrolled", &["x"], true)
            .with_course("b-open", &["x"], true)
            .with_course("c-plain", &[], true)
            .with_course("d-draft", &["x"], false)
            .with_enrollment("maya@example.edu", "a-enrolled", Some(40.0));

        let recs = get_recommendations(&store, "maya@example.edu", DEFAULT_POOL_SIZE, DEFAULT_LIMIT)
            .await
            .unwrap();

        let names: Vec<&str> = recs.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["b-open", "c-plain"]);
        assert_eq!(recs[0].recommendation_score, 70);
        assert_eq!(recs[1].recommendation_score, 50);
    }

    #[tokio::test]
    async fn recommendations_are_capped_at_the_limit() {
        let mut store = MemoryStore::new();
        for i in 0..8 {
            store = store.with_course(&format!("course-{i}"), &[], true);
        }

        let recs = get_recommendations(&store, "new@example.edu", DEFAULT_POOL_SIZE, DEFAULT_LIMIT)
            .await
            .unwrap();
        assert_eq!(recs.len(), DEFAULT_LIMIT);
    }

    #[tokio::test]
    async fn pool_size_bounds_the_candidates_before_ranking() {
        let mut store = MemoryStore::new();
        for i in 0..6 {
            store = store.with_course(&format!("course-{i}"), &[], true);
        }

        let enrolled: Vec<String> = Vec::new();
        let pool = eligible_courses(&store, &enrolled, 3).await.unwrap();
        assert_eq!(pool.len(), 3);
    }

    #[tokio::test]
    async fn empty_candidate_pool_yields_no_recommendations() {
        let store = MemoryStore::new()
            .with_course("only", &[], true)
            .with_enrollment("maya@example.edu", "only", None);

        let recs = get_recommendations(&store, "maya@example.edu", DEFAULT_POOL_SIZE, DEFAULT_LIMIT)
            .await
            .unwrap();
        assert!(recs.is_empty());
    }
}
