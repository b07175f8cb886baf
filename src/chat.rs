use crate::models::User;

/// Ordered keyword table for the learning-assistant widget. The prompt is
/// lowercased and scanned top to bottom; the first matching keyword wins.
const REPLIES: [(&str, &str); 5] = [
    (
        "recommend",
        "Try the recommendations view - it ranks published courses you haven't joined yet.",
    ),
    (
        "progress",
        "Your dashboard shows per-course progress and your five most recent lesson updates.",
    ),
    (
        "enroll",
        "Pick a course from search or recommendations and enroll from its page - you'll only be added once.",
    ),
    (
        "course",
        "You can review your enrolled courses on the dashboard, or search the catalog by topic.",
    ),
    (
        "hello",
        "Hello! Ask me about your courses, your progress, or what to learn next.",
    ),
];

const FALLBACK: &str =
    "I can help you with your courses, answer questions, and guide your learning journey.";

pub fn reply(prompt: &str) -> &'static str {
    let prompt = prompt.to_lowercase();
    REPLIES
        .iter()
        .find(|(keyword, _)| prompt.contains(keyword))
        .map(|(_, reply)| *reply)
        .unwrap_or(FALLBACK)
}

pub fn greeting(user: &User) -> String {
    format!("Hello {}!", user.full_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use crate::store::RecordStore;

    #[test]
    fn keywords_match_case_insensitively() {
        assert_eq!(reply("Can you RECOMMEND something?"), REPLIES[0].1);
        assert_eq!(reply("how is my progress"), REPLIES[1].1);
    }

    #[test]
    fn first_listed_keyword_wins() {
        // Mentions both "recommend" and "course"; the table order decides.
        assert_eq!(reply("recommend me a course"), REPLIES[0].1);
    }

    #[test]
    fn unknown_prompts_fall_back() {
        assert_eq!(reply("what is the weather"), FALLBACK);
    }

    #[tokio::test]
    async fn greeting_uses_the_stored_full_name() {
        let store = MemoryStore::new().with_user("maya.iyer@example.edu", "Maya Iyer");
        let user = store.get_user("maya.iyer@example.edu").await.unwrap();
        assert_eq!(greeting(&user), "Hello Maya Iyer!");
    }

    #[tokio::test]
    async fn unknown_member_greeting_is_not_found() {
        let store = MemoryStore::new();
        let err = store.get_user("ghost@example.edu").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
