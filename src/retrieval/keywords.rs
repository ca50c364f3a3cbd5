//! Hebrew keyword extraction and lexical relevance scoring.

/// Function words and domain boilerplate that carry no search signal.
const STOP_WORDS: &[&str] = &[
    "של",
    "את",
    "עם",
    "על",
    "אל",
    "מה",
    "איך",
    "כיצד",
    "האם",
    "זה",
    "זו",
    "זאת",
    "מענה",
    "קשור",
    "שייך",
    "לשאלה",
    "למשתמש",
    "מענים",
    "תקציבים",
    "תקציב",
    "חיפוש",
    "רלוונטי",
    "רלוונטיות",
    "מילת מפתח",
    "מילות מפתח",
    "מילות עזר",
    "מילת עזר",
];

/// Splits a query into content-bearing keywords: punctuation stripped,
/// tokens longer than two characters, stop words removed.
pub fn extract_keywords(query: &str) -> Vec<String> {
    let cleaned: String = query
        .chars()
        .map(|c| {
            if c == '_' || c.is_alphanumeric() {
                c
            } else {
                ' '
            }
        })
        .collect();
    cleaned
        .split_whitespace()
        .filter(|token| token.chars().count() > 2)
        .filter(|token| !STOP_WORDS.contains(token))
        .map(str::to_string)
        .collect()
}

/// Lexical relevance of a chunk to the query, in [0, 1].
///
/// Full-query containment scores highest; otherwise the share of exact
/// keyword hits plus a smaller credit for prefix matches, which covers
/// Hebrew inflections like plural suffixes.
pub fn relevance_score(content: &str, query: &str, keywords: &[String]) -> f32 {
    let content_lower = content.to_lowercase();
    let query_lower = query.to_lowercase();

    let mut score = 0.0_f32;
    if !query_lower.is_empty() && content_lower.contains(&query_lower) {
        score += 1.0;
    }
    if !keywords.is_empty() {
        let mut exact = 0usize;
        let mut partial = 0usize;
        for keyword in keywords {
            let keyword_lower = keyword.to_lowercase();
            if content_lower.contains(&keyword_lower) {
                exact += 1;
            } else if keyword_lower.chars().count() > 3 {
                let prefix: String = keyword_lower.chars().take(3).collect();
                if content_lower.contains(&prefix) {
                    partial += 1;
                }
            }
        }
        score += 0.8 * exact as f32 / keywords.len() as f32;
        score += 0.3 * partial as f32 / keywords.len() as f32;
    }
    score.min(1.0)
}
