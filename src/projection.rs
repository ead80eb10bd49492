//! Read-only filtered, paginated views over request collections
//!
//! Pure with respect to its inputs: borrows the collection, never mutates or
//! caches, and recomputes on every call. List screens feed it whatever set
//! the persistence layer handed them.
use chrono::NaiveDate;

use crate::request::{CdtRequest, RequestState};

/// Conjunctive filter; every populated field must match.
#[derive(Debug, Clone, Default)]
pub struct RequestFilter {
    pub state: Option<RequestState>,
    /// Inclusive amount bounds.
    pub amount_min: Option<u64>,
    pub amount_max: Option<u64>,
    /// Inclusive bounds on the creation date, compared at day granularity.
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    /// Substring match against the request id or the owner id.
    pub query: Option<String>,
}

impl RequestFilter {
    pub fn matches(&self, request: &CdtRequest) -> bool {
        if let Some(state) = self.state
            && request.state() != state
        {
            return false;
        }
        if let Some(min) = self.amount_min
            && request.amount() < min
        {
            return false;
        }
        if let Some(max) = self.amount_max
            && request.amount() > max
        {
            return false;
        }
        let day = request.created_at().day();
        if let Some(from) = self.date_from
            && day < from
        {
            return false;
        }
        if let Some(to) = self.date_to
            && day > to
        {
            return false;
        }
        if let Some(query) = self.query.as_deref()
            && !request.id().contains(query)
            && !request.owner_id().contains(query)
        {
            return false;
        }
        true
    }
}

/// One page of a filtered view. `total` counts every match before pagination
/// so callers can tell whether a next page exists.
#[derive(Debug)]
pub struct Page<'a> {
    pub items: Vec<&'a CdtRequest>,
    pub total: usize,
}

/// Filter `requests`, keep their order, and slice out the 1-based `page` of
/// size `limit`. A page past the end yields an empty `items` with the real
/// `total`.
pub fn project<'a>(
    requests: &'a [CdtRequest],
    filter: &RequestFilter,
    page: usize,
    limit: usize,
) -> Page<'a> {
    let matched: Vec<&CdtRequest> = requests.iter().filter(|r| filter.matches(r)).collect();
    let total = matched.len();

    // page and limit arrive from the transport layer; don't let a huge pair
    // overflow the start offset
    let start = (page.max(1) - 1).saturating_mul(limit);
    let items = matched.into_iter().skip(start).take(limit).collect();

    Page { items, total }
}
