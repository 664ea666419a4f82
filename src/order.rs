//! Core order (dream request) document and status types
use chrono::{DateTime, TimeZone, Utc};
use std::fmt;
use std::str::FromStr;

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, Eq, PartialEq)]
pub enum OrderKind {
    /// Machine-generated interpretation, no human assignment phase
    #[n(0)]
    Ai,
    #[n(1)]
    Human,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, Eq, Ord, PartialEq, PartialOrd)]
pub enum Currency {
    #[n(0)]
    USD,
    #[n(1)]
    GBP,
    #[n(2)]
    EUR,
}

/// Closed lifecycle state. Legacy status strings are translated at the
/// `Display`/`FromStr` boundary, never inside the state machine.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, Eq, PartialEq)]
pub enum OrderStatus {
    #[n(0)]
    New,
    #[n(1)]
    Assigned,
    #[n(2)]
    InProgress,
    #[n(3)]
    Completed,
    #[n(4)]
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "new",
            OrderStatus::Assigned => "assigned",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug)]
#[error("unknown order status: {0}")]
pub struct ParseStatusError(String);

impl FromStr for OrderStatus {
    type Err = ParseStatusError;

    // accepts the legacy aliases still present in old documents
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" | "pending" => Ok(OrderStatus::New),
            "assigned" | "accepted" => Ok(OrderStatus::Assigned),
            "in_progress" | "active" => Ok(OrderStatus::InProgress),
            "completed" | "done" | "resolved" => Ok(OrderStatus::Completed),
            "cancelled" | "canceled" => Ok(OrderStatus::Cancelled),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, Eq, PartialEq)]
pub enum PaymentStatus {
    /// Paid from the user's credit balance at creation
    #[n(0)]
    Paid,
    /// Covered by the daily free tier
    #[n(1)]
    Waived,
}

/// Optional demographic/situational fields used to tailor the
/// interpretation. Free-form, not validated beyond presence.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Default, Eq, PartialEq)]
pub struct DreamContext {
    #[n(0)]
    pub mood: Option<String>,
    #[n(1)]
    pub life_area: Option<String>,
    #[n(2)]
    pub recurring: bool,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Eq, PartialEq)]
pub struct Rating {
    #[n(0)]
    pub score: u8, // 1..=5, checked at the service boundary
    #[n(1)]
    pub feedback: Option<String>,
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub struct TimeStamp<T: TimeZone>(DateTime<T>);

impl TimeStamp<Utc> {
    pub fn new() -> Self {
        Self(Utc::now())
    }
    pub fn new_with(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Self {
        Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
            .unwrap()
            .into()
    }
    pub fn to_datetime_utc(&self) -> DateTime<Utc> {
        self.0
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

// Key in the store is "order/" + id. The dream hash and idempotency key are
// kept denormalized here and also written as their own unique keys.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq)]
pub struct Order {
    #[n(0)]
    pub id: String, // uuid7, bech32 "order_" prefix
    #[n(1)]
    pub kind: OrderKind,
    #[n(2)]
    pub user_id: String,
    #[n(3)]
    pub user_email: String,
    #[n(4)]
    pub interpreter_id: Option<String>,
    #[n(5)]
    pub interpreter_user_id: Option<String>,
    #[n(6)]
    pub interpreter_name: Option<String>,
    #[n(7)]
    pub dream_text: String, // immutable once created
    #[n(8)]
    pub dream_hash: String,
    #[n(9)]
    pub context: Option<DreamContext>,
    #[n(10)]
    pub price: u64, // cents, interpreter rate at request time
    #[n(11)]
    pub locked_price: u64, // frozen copy, never recalculated
    #[n(12)]
    pub currency: Currency,
    #[n(13)]
    pub status: OrderStatus,
    #[n(14)]
    pub clarification_question: Option<String>,
    #[n(15)]
    pub clarification_answer: Option<String>,
    #[n(16)]
    pub interpretation_text: Option<String>,
    #[n(17)]
    pub payment_status: PaymentStatus,
    #[n(18)]
    pub payment_locked_amount: u64,
    #[n(19)]
    pub platform_commission: Option<u64>, // set once at completion
    #[n(20)]
    pub interpreter_earning: Option<u64>, // set once at completion
    #[n(21)]
    pub idempotency_key: String,
    #[n(22)]
    pub rating: Option<Rating>,
    #[n(23)]
    pub created_at: TimeStamp<Utc>,
    #[n(24)]
    pub assigned_at: Option<TimeStamp<Utc>>,
    #[n(25)]
    pub started_at: Option<TimeStamp<Utc>>,
    #[n(26)]
    pub completed_at: Option<TimeStamp<Utc>>,
    #[n(27)]
    pub cancelled_at: Option<TimeStamp<Utc>>,
    #[n(28)]
    pub clarification_requested_at: Option<TimeStamp<Utc>>,
    #[n(29)]
    pub clarification_answered_at: Option<TimeStamp<Utc>>,
    #[n(30)]
    pub rated_at: Option<TimeStamp<Utc>>,
}

impl Order {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
    pub fn has_clarification(&self) -> bool {
        self.clarification_question.is_some()
    }
}
