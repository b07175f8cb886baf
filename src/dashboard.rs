use std::collections::HashMap;

use tracing::warn;

use crate::error::StoreError;
use crate::models::{Course, CourseProgress, DashboardStats, DashboardView};
use crate::store::{CourseFilter, RecordStore};

/// The dashboard shows at most this many recent progress entries.
pub const RECENT_ACTIVITY_LIMIT: i64 = 5;

/// Join a member's enrollments with their course records and recent progress
/// feed into one derived view. Read-only; computed fresh per request.
pub async fn get_dashboard(
    store: &dyn RecordStore,
    member: &str,
) -> Result<DashboardView, StoreError> {
    let enrollments = store.enrollments_for(member).await?;

    let courses = if enrollments.is_empty() {
        Vec::new()
    } else {
        let names: Vec<String> = enrollments.iter().map(|e| e.course.clone()).collect();
        store.courses(&CourseFilter::default().among(names)).await?
    };
    let by_name: HashMap<&str, &Course> =
        courses.iter().map(|c| (c.name.as_str(), c)).collect();

    let mut cards = Vec::with_capacity(enrollments.len());
    for enrollment in &enrollments {
        // An enrollment pointing at a missing course is store inconsistency;
        // the dashboard skips it rather than failing the whole request.
        let Some(course) = by_name.get(enrollment.course.as_str()) else {
            warn!(
                member,
                course = %enrollment.course,
                "skipping enrollment with no matching course"
            );
            continue;
        };

        cards.push(CourseProgress {
            name: course.name.clone(),
            title: course.title.clone(),
            description: course.short_introduction.clone(),
            image: course.image.clone(),
            progress: enrollment.progress.unwrap_or(0.0),
            current_lesson: enrollment.current_lesson.clone(),
            enrolled_at: enrollment.created_at,
            instructor: course.owner.clone(),
        });
    }

    let completed = cards.iter().filter(|c| c.progress >= 100.0).count();
    let statistics = DashboardStats {
        total_courses: cards.len(),
        completed,
        in_progress: cards.len() - completed,
    };

    let recent_activity = store.recent_progress(member, RECENT_ACTIVITY_LIMIT).await?;

    Ok(DashboardView {
        user: member.to_string(),
        statistics,
        courses: cards,
        recent_activity,
    })
}
