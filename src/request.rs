//! Core CDT request entity, lifecycle states and audit history
use chrono::{DateTime, NaiveDate, TimeZone, Utc};

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    #[n(0)]
    Draft,
    #[n(1)]
    PendingReview,
    #[n(2)]
    Approved,
    #[n(3)]
    Rejected,
    #[n(4)]
    Cancelled,
}

impl RequestState {
    /// Terminal states have no outgoing transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RequestState::Approved | RequestState::Rejected | RequestState::Cancelled
        )
    }
}

impl std::fmt::Display for RequestState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RequestState::Draft => "Draft",
            RequestState::PendingReview => "PendingReview",
            RequestState::Approved => "Approved",
            RequestState::Rejected => "Rejected",
            RequestState::Cancelled => "Cancelled",
        };
        f.write_str(name)
    }
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    #[n(0)]
    Customer,
    #[n(1)]
    Agent,
    #[n(2)]
    System,
}

/// The authenticated identity issuing a command. Authentication itself is the
/// caller's problem; the engine only checks role and ownership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub role: Role,
}

impl Actor {
    pub fn customer(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::Customer,
        }
    }
    pub fn agent(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::Agent,
        }
    }
    pub fn system() -> Self {
        Self {
            id: "system".into(),
            role: Role::System,
        }
    }
}

/// One audit record per applied transition.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    #[n(0)]
    pub timestamp: TimeStamp<Utc>,
    #[n(1)]
    pub actor_id: String,
    #[n(2)]
    pub actor_role: Role,
    #[n(3)]
    pub action: String,
    #[n(4)]
    pub detail: Option<String>,
}

/// Append-only ledger attached to a request. The lifecycle engine is the only
/// writer; there is no API to mutate or remove an entry once appended.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Default, PartialEq, Eq)]
pub struct History(#[n(0)] Vec<HistoryEntry>);

impl History {
    pub(crate) fn append(&mut self, entry: HistoryEntry) {
        self.0.push(entry);
    }
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.0
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn last(&self) -> Option<&HistoryEntry> {
        self.0.last()
    }
}

/// A customer's request to open a certificate of deposit.
///
/// Fields are crate-private so every mutation goes through the lifecycle
/// engine; callers read through the accessors.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq)]
pub struct CdtRequest {
    #[n(0)]
    pub(crate) id: String,
    #[n(1)]
    pub(crate) owner_id: String,
    #[n(2)]
    pub(crate) amount: u64,
    #[n(3)]
    pub(crate) term_months: u32,
    #[n(4)]
    pub(crate) interest_rate: Option<f64>,
    #[n(5)]
    pub(crate) state: RequestState,
    #[n(6)]
    pub(crate) rejection_reason: Option<String>,
    #[n(7)]
    pub(crate) created_at: TimeStamp<Utc>,
    #[n(8)]
    pub(crate) updated_at: TimeStamp<Utc>,
    #[n(9)]
    pub(crate) history: History,
}

impl CdtRequest {
    pub fn id(&self) -> &str {
        &self.id
    }
    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }
    pub fn amount(&self) -> u64 {
        self.amount
    }
    pub fn term_months(&self) -> u32 {
        self.term_months
    }
    pub fn interest_rate(&self) -> Option<f64> {
        self.interest_rate
    }
    pub fn state(&self) -> RequestState {
        self.state
    }
    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }
    pub fn created_at(&self) -> &TimeStamp<Utc> {
        &self.created_at
    }
    pub fn updated_at(&self) -> &TimeStamp<Utc> {
        &self.updated_at
    }
    pub fn history(&self) -> &History {
        &self.history
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct TimeStamp<T: TimeZone>(DateTime<T>);

// DateTime is ordered for every TimeZone, so don't let a derive demand
// T: Ord.
impl<T: TimeZone + Eq> PartialOrd for TimeStamp<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: TimeZone + Eq> Ord for TimeStamp<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl TimeStamp<Utc> {
    pub fn now() -> Self {
        Self(Utc::now())
    }
    /// Fixed-date constructor for test fixtures.
    ///
    /// Panics if the arguments do not name a real calendar date/time.
    pub fn new_with(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Self {
        Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
            .unwrap()
            .into()
    }
    pub fn to_datetime_utc(&self) -> DateTime<Utc> {
        self.0
    }
    /// Calendar day, used for day-granularity filter comparisons.
    pub fn day(&self) -> NaiveDate {
        self.0.date_naive()
    }
}

impl<T: TimeZone> From<DateTime<T>> for TimeStamp<T> {
    fn from(value: DateTime<T>) -> Self {
        TimeStamp(value)
    }
}

impl<C> minicbor::Encode<C> for TimeStamp<Utc> {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        if let Some(nsec) = self.0.timestamp_nanos_opt() {
            return e.i64(nsec)?.ok();
        }

        Err(minicbor::encode::Error::message(
            "failed to encode timestamp. timestamp_nanos_opt returned None",
        ))
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TimeStamp<Utc> {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let nsecs = d.i64()?;

        Ok(TimeStamp(DateTime::from_timestamp_nanos(nsecs)))
    }
}
