//! Static keyword lookup: complaint text to sentiment and theme.

use crate::config::SentimentKeyword;

/// Keywords whose text appears in `text` (case-insensitive substring match),
/// in table order.
pub fn matched_keywords<'a>(keywords: &'a [SentimentKeyword], text: &str) -> Vec<&'a SentimentKeyword> {
    let haystack = text.to_lowercase();
    keywords
        .iter()
        .filter(|kw| !kw.keyword.is_empty() && haystack.contains(&kw.keyword.to_lowercase()))
        .collect()
}

/// Mean sentiment over the matched keywords, or None when nothing matches.
pub fn average_sentiment(keywords: &[SentimentKeyword], text: &str) -> Option<f64> {
    let matched = matched_keywords(keywords, text);
    if matched.is_empty() {
        return None;
    }
    let total: f64 = matched.iter().map(|kw| kw.sentiment).sum();
    Some(total / matched.len() as f64)
}

/// Distinct themes mentioned in `text`, sorted.
pub fn themes(keywords: &[SentimentKeyword], text: &str) -> Vec<String> {
    let mut themes: Vec<String> = matched_keywords(keywords, text)
        .into_iter()
        .map(|kw| kw.theme.clone())
        .collect();
    themes.sort();
    themes.dedup();
    themes
}
