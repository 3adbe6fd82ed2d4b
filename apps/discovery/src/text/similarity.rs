use std::collections::HashSet;

use crate::text::keywords::extract_keywords;

/// Jaccard coefficient over two token collections.
///
/// Case-insensitive; tokens of two characters or fewer are ignored. Returns 0.0
/// when either side has no usable tokens.
pub fn jaccard<A, B>(a: A, b: B) -> f64
where
    A: IntoIterator,
    A::Item: AsRef<str>,
    B: IntoIterator,
    B::Item: AsRef<str>,
{
    let left = token_set(a);
    let right = token_set(b);

    if left.is_empty() || right.is_empty() {
        return 0.0;
    }

    let intersection = left.intersection(&right).count();
    let union = left.union(&right).count();
    intersection as f64 / union as f64
}

/// Jaccard over the extracted keywords of two free-text fields.
pub fn text_similarity(a: &str, b: &str) -> f64 {
    jaccard(extract_keywords(a), extract_keywords(b))
}

fn token_set<I>(tokens: I) -> HashSet<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    tokens
        .into_iter()
        .map(|t| t.as_ref().trim().to_lowercase())
        .filter(|t| t.chars().count() > 2)
        .collect()
}
