use futures::future::try_join_all;
use serde_json::Value;
use tracing::debug;

use crate::error::UpstreamError;
use crate::models::{cast_member_id, DetailRecord};
use crate::tmdb::TmdbApi;

/// Attaches the full person record as `details` to the first `limit` cast members.
///
/// All person lookups run concurrently and the record is only changed once every
/// one of them has succeeded; any failure leaves the whole call failed. Entries
/// past `limit`, the crew and every other field are left as they were.
pub async fn enrich_cast(
    tmdb: &dyn TmdbApi,
    mut detail: DetailRecord,
    limit: usize,
) -> Result<DetailRecord, UpstreamError> {
    let ids = head_ids(&detail, limit)?;
    if ids.is_empty() {
        return Ok(detail);
    }
    debug!(
        operation = detail.operation(),
        count = ids.len(),
        "Fetching cast person details"
    );

    let people = try_join_all(ids.iter().map(|id| tmdb.person(*id))).await?;

    let cast = detail.cast_mut()?;
    for (member, person) in cast.iter_mut().zip(people) {
        if let Value::Object(fields) = member {
            fields.insert("details".to_string(), person);
        }
    }
    Ok(detail)
}

/// Ids of the cast members eligible for enrichment, in cast order.
fn head_ids(detail: &DetailRecord, limit: usize) -> Result<Vec<i64>, UpstreamError> {
    detail
        .cast()?
        .iter()
        .take(limit)
        .enumerate()
        .map(|(idx, member)| {
            cast_member_id(member).ok_or_else(|| {
                UpstreamError::shape(
                    detail.operation(),
                    format!("credits.cast[{idx}] has no integer `id`"),
                )
            })
        })
        .collect()
}
