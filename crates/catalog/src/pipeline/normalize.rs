//! Unwrapping list payloads from response envelopes.
//!
//! An absent envelope (still loading, or the fetch failed) and an envelope
//! without a payload both mean "no data yet". Neither is an error here;
//! fetch failures travel separately as [`CatalogError`](crate::CatalogError).

use deal_core::DealResponse;

/// Borrow the list payload, or an empty slice when there is none.
#[must_use]
pub fn payload_or_empty<T>(envelope: Option<&DealResponse<Vec<T>>>) -> &[T] {
    envelope
        .and_then(|response| response.payload.as_deref())
        .unwrap_or_default()
}

/// Take ownership of the list payload, or an empty `Vec` when there is none.
#[must_use]
pub fn into_payload<T>(envelope: Option<DealResponse<Vec<T>>>) -> Vec<T> {
    envelope
        .and_then(|response| response.payload)
        .unwrap_or_default()
}
