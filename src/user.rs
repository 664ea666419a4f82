//! User and interpreter profile documents
use crate::order::{Currency, TimeStamp};
use chrono::Utc;

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, Eq, PartialEq)]
pub enum Plan {
    #[n(0)]
    Free,
    #[n(1)]
    Pro,
    #[n(2)]
    Premium,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, Eq, PartialEq)]
pub enum Role {
    #[n(0)]
    User,
    #[n(1)]
    Interpreter,
    #[n(2)]
    Admin,
}

/// Created lazily on first authenticated contact. Credits and plan are
/// mutated only by the billing path; the order engine only decrements on
/// consumption and bumps `last_free_dream_at`.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq)]
pub struct User {
    #[n(0)]
    pub id: String, // bech32 "user_" prefix
    #[n(1)]
    pub email: String,
    #[n(2)]
    pub credits: u64,
    #[n(3)]
    pub plan: Plan,
    #[n(4)]
    pub role: Role,
    #[n(5)]
    pub last_free_dream_at: Option<TimeStamp<Utc>>,
    #[n(6)]
    pub created_at: TimeStamp<Utc>,
}

impl User {
    pub fn new(id: String, email: String) -> Self {
        Self {
            id,
            email,
            credits: 0,
            plan: Plan::Free,
            role: Role::User,
            last_free_dream_at: None,
            created_at: TimeStamp::new(),
        }
    }
}

/// Interpreter profile. `rate` is the live price snapshotted into an order's
/// locked price at creation. The aggregate counters are best-effort and can
/// be rebuilt from completed orders, see `OrderService::reconcile_interpreter`.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq)]
pub struct InterpreterProfile {
    #[n(0)]
    pub id: String, // bech32 "intr_" prefix
    #[n(1)]
    pub user_id: String,
    #[n(2)]
    pub display_name: String,
    #[n(3)]
    pub rate: u64, // cents per interpretation
    #[n(4)]
    pub currency: Currency,
    #[n(5)]
    pub completed_count: u64,
    #[n(6)]
    pub pending_earnings: u64,
}

impl InterpreterProfile {
    pub fn new(id: String, user_id: String, display_name: String, rate: u64) -> Self {
        Self {
            id,
            user_id,
            display_name,
            rate,
            currency: Currency::USD,
            completed_count: 0,
            pending_earnings: 0,
        }
    }
}
