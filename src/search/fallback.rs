use crate::memes::Meme;

/// Filter `dataset` by a case-insensitive substring of `query`.
///
/// A meme matches when its description, its category or any of its tags
/// contains the query. When nothing matches the whole dataset comes back,
/// so the user always has something to look at.
pub fn fallback_matches(query: &str, dataset: &[Meme]) -> Vec<Meme> {
    let needle = query.trim().to_lowercase();

    let matched = dataset
        .iter()
        .filter(|meme| {
            let contains = |s: &str| s.to_lowercase().contains(&needle);

            meme.description.as_deref().is_some_and(contains)
                || meme.tags.iter().any(|tag| contains(tag.as_str()))
                || meme.category.as_deref().is_some_and(contains)
        })
        .cloned()
        .collect::<Vec<_>>();

    if matched.is_empty() {
        dataset.to_vec()
    } else {
        matched
    }
}
