use crate::error::NotFoundReason;
use crate::models::SearchResultItem;

/// Picks the first candidate whose display name equals `title`, ignoring case.
///
/// Candidates are scanned in upstream order; there is no scoring. An empty list
/// and a list without a match are reported as different reasons.
pub fn resolve<'a>(
    candidates: &'a [SearchResultItem],
    title: &str,
) -> Result<&'a SearchResultItem, NotFoundReason> {
    if candidates.is_empty() {
        return Err(NotFoundReason::NoResults);
    }
    candidates
        .iter()
        .find(|c| titles_match(&c.display_name, title))
        .ok_or(NotFoundReason::NoExactMatch)
}

pub fn titles_match(candidate: &str, wanted: &str) -> bool {
    candidate.to_lowercase() == wanted.to_lowercase()
}
