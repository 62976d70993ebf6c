//! Prompt construction for the LLM relevance evaluation

/// System instruction framing the LLM as a strict binary classifier
#[must_use]
pub fn relevance_system_prompt() -> String {
    "You are a relevance evaluator for search results. Your job is to determine if the provided posts are relevant to the user's query.\n\
     Respond with ONLY one word:\n\
     - \"RELEVANT\" if at least one post directly relates to or could answer the query\n\
     - \"NOT_RELEVANT\" if none of the posts are related to the query"
        .to_string()
}

/// User message: the query plus a numbered list of candidate posts with
/// their author names
#[must_use]
pub fn relevance_user_prompt(query: &str, entries: &[(String, String)]) -> String {
    let context = entries
        .iter()
        .enumerate()
        .map(|(i, (author, content))| format!("[{}] Post by {author}: \"{content}\"", i + 1))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!("Query: \"{query}\"\n\nPosts:\n{context}\n\nAre these posts relevant?")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_demands_single_word() {
        let prompt = relevance_system_prompt();
        assert!(prompt.contains("RELEVANT"));
        assert!(prompt.contains("NOT_RELEVANT"));
        assert!(prompt.contains("ONLY one word"));
    }

    #[test]
    fn test_user_prompt_numbers_posts_with_authors() {
        let entries = vec![
            ("Ada".to_string(), "first post".to_string()),
            ("Bob".to_string(), "second post".to_string()),
        ];
        let prompt = relevance_user_prompt("rust tips", &entries);

        assert!(prompt.contains("Query: \"rust tips\""));
        assert!(prompt.contains("[1] Post by Ada: \"first post\""));
        assert!(prompt.contains("[2] Post by Bob: \"second post\""));
    }
}
