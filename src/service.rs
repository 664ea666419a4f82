//! Service layer API for the order lifecycle
//!
//! Every operation is a short-lived request-handling unit; there is no
//! in-process lock manager. Creation runs inside one sled transaction with
//! the fingerprint and idempotency keys acting as unique indexes and the
//! funding check re-run against the in-transaction user document, so the
//! store itself arbitrates both concurrent duplicates and concurrent
//! spending of the free slot or a credit.

use crate::error::{OrderError, ValidationError};
use crate::fingerprint;
use crate::gate;
use crate::notify::{LogNotifier, Notifier};
use crate::order::{
    DreamContext, Order, OrderKind, OrderStatus, PaymentStatus, Rating, TimeStamp,
};
use crate::pricing;
use crate::user::{InterpreterProfile, Role, User};
use crate::utils;
use chrono::Utc;
use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::IVec;
use std::sync::Arc;

pub struct ServiceConfig {
    pub commission_rate_bps: u64,
    /// Price locked into AI orders, cents
    pub ai_order_price: u64,
    pub min_dream_len: usize,
    pub min_interpretation_len: usize,
    pub min_clarification_answer_len: usize,
    pub allow_insecure_identity: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            commission_rate_bps: pricing::DEFAULT_COMMISSION_RATE_BPS,
            ai_order_price: 500,
            min_dream_len: 25,
            min_interpretation_len: 50,
            min_clarification_answer_len: 20,
            allow_insecure_identity: false,
        }
    }
}

/// How the requester funds the order
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum PayWith {
    DailyFree,
    Credits,
}

#[derive(Debug)]
pub struct SubmitOrder {
    pub user_id: String,
    pub user_email: String,
    pub dream_text: String,
    pub kind: OrderKind,
    pub interpreter_id: Option<String>,
    pub context: Option<DreamContext>,
    pub pay_with: PayWith,
    /// Explicit key for bridged flows (e.g. booking-to-order); derived from
    /// the content when absent
    pub idempotency_key: Option<String>,
}

#[derive(Debug)]
pub struct SubmitOutcome {
    pub order: Order,
    /// True when an identical submission already existed; `order` is then
    /// the pre-existing document
    pub is_duplicate: bool,
}

// why the creation transaction refused to commit
enum CreateAbort {
    // a unique constraint detected a duplicate, carrying the existing id
    Fingerprint(String),
    IdempotencyKey(String),
    // the in-transaction funding re-check denied the request
    Funding(OrderError),
    Codec(String),
}

fn order_key(id: &str) -> Vec<u8> {
    format!("order/{id}").into_bytes()
}

fn fp_key(user_id: &str, dream_hash: &str) -> Vec<u8> {
    format!("fp/{user_id}/{dream_hash}").into_bytes()
}

fn idem_key(key: &str) -> Vec<u8> {
    format!("idem/{key}").into_bytes()
}

fn user_key(id: &str) -> Vec<u8> {
    format!("user/{id}").into_bytes()
}

fn interpreter_key(id: &str) -> Vec<u8> {
    format!("intr/{id}").into_bytes()
}

pub struct OrderService {
    instance: Arc<sled::Db>,
    config: ServiceConfig,
    notifier: Box<dyn Notifier>,
}

impl OrderService {
    pub fn new(instance: Arc<sled::Db>) -> Self {
        Self::with_config(instance, ServiceConfig::default())
    }

    pub fn with_config(instance: Arc<sled::Db>, config: ServiceConfig) -> Self {
        Self {
            instance,
            config,
            notifier: Box::new(LogNotifier),
        }
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Submit a new dream for interpretation. At-most-once per
    /// (user, content): a resubmission of identical content returns the
    /// existing order with `is_duplicate` set instead of erroring.
    pub fn submit_order(&self, request: SubmitOrder) -> anyhow::Result<SubmitOutcome> {
        let normalized = fingerprint::normalize(&request.dream_text);
        let len = normalized.chars().count();
        if len < self.config.min_dream_len {
            return Err(ValidationError::DreamTextTooShort {
                len,
                min: self.config.min_dream_len,
            }
            .into());
        }

        let dream_hash = fingerprint::dream_hash(&request.user_id, &request.dream_text);
        let idempotency_key = match request.idempotency_key {
            Some(key) => key,
            None => fingerprint::idempotency_key(
                &request.user_id,
                request.interpreter_id.as_deref(),
                &request.dream_text,
            )?,
        };

        // fast path: a replay of an already-submitted request returns the
        // existing order before funding is even consulted, so retries are
        // idempotent and never double-charge
        let fpk = fp_key(&request.user_id, &dream_hash);
        let idk = idem_key(&idempotency_key);
        if let Some(existing) = self.instance.get(fpk.as_slice())? {
            let id = String::from_utf8_lossy(&existing).into_owned();
            return self.duplicate_outcome(&id, "content fingerprint");
        }
        if let Some(existing) = self.instance.get(idk.as_slice())? {
            let id = String::from_utf8_lossy(&existing).into_owned();
            return self.duplicate_outcome(&id, "idempotency key");
        }

        // read-only lookup; the transaction below creates the user document
        // on first contact, so the submission path never writes user/ keys
        // outside the transaction
        let user = match self.instance.get(user_key(&request.user_id))? {
            Some(raw) => minicbor::decode::<User>(raw.as_ref())?,
            None => User::new(request.user_id.clone(), request.user_email.clone()),
        };

        // snapshot the interpreter's current rate, this becomes the locked
        // price and later rate changes never touch this order again
        let (price, currency, interpreter) = match request.kind {
            OrderKind::Human => {
                let interpreter_id = request
                    .interpreter_id
                    .clone()
                    .ok_or(ValidationError::MissingInterpreter)?;
                let profile = self.load_interpreter(&interpreter_id)?;
                let currency = profile.currency;
                (profile.rate, currency, Some(profile))
            }
            OrderKind::Ai => (
                self.config.ai_order_price,
                crate::order::Currency::USD,
                None,
            ),
        };

        let now = TimeStamp::new();
        let pay_with = request.pay_with;

        // fast-path funding check against the document just read; the
        // transaction below re-reads the user and re-checks, which is what
        // actually holds under concurrency
        let payment_status = match pay_with {
            PayWith::DailyFree => {
                Self::check_daily_free(&user, &now)?;
                PaymentStatus::Waived
            }
            PayWith::Credits => {
                if user.credits == 0 {
                    return Err(OrderError::InsufficientCredits.into());
                }
                PaymentStatus::Paid
            }
        };

        let order = Order {
            id: utils::new_order_id()?,
            kind: request.kind,
            user_id: request.user_id,
            user_email: request.user_email,
            interpreter_id: interpreter.as_ref().map(|p| p.id.clone()),
            interpreter_user_id: interpreter.as_ref().map(|p| p.user_id.clone()),
            interpreter_name: interpreter.as_ref().map(|p| p.display_name.clone()),
            dream_text: request.dream_text,
            dream_hash,
            context: request.context,
            price,
            locked_price: price,
            currency,
            status: OrderStatus::New,
            clarification_question: None,
            clarification_answer: None,
            interpretation_text: None,
            payment_status,
            payment_locked_amount: match payment_status {
                PaymentStatus::Paid => price,
                PaymentStatus::Waived => 0,
            },
            platform_commission: None,
            interpreter_earning: None,
            idempotency_key,
            rating: None,
            created_at: now.clone(),
            assigned_at: None,
            started_at: None,
            completed_at: None,
            cancelled_at: None,
            clarification_requested_at: None,
            clarification_answered_at: None,
            rated_at: None,
        };

        let order_cbor = minicbor::to_vec(&order)?;

        let ordk = order_key(&order.id);
        let usrk = user_key(&order.user_id);

        // both unique keys are checked, the funding check re-run against the
        // in-transaction user document, and every write applied in one
        // transaction. the commit is serialized against the user key it
        // read, so concurrent distinct submissions cannot both spend the
        // same free slot or credit, and a concurrent identical submission
        // loses cleanly on a unique key
        let result: Result<(), TransactionError<CreateAbort>> =
            self.instance.transaction(|tx| {
                if let Some(existing) = tx.get(fpk.as_slice())? {
                    return Err(ConflictableTransactionError::Abort(CreateAbort::Fingerprint(
                        String::from_utf8_lossy(&existing).into_owned(),
                    )));
                }
                if let Some(existing) = tx.get(idk.as_slice())? {
                    return Err(ConflictableTransactionError::Abort(
                        CreateAbort::IdempotencyKey(
                            String::from_utf8_lossy(&existing).into_owned(),
                        ),
                    ));
                }

                let mut user: User = match tx.get(usrk.as_slice())? {
                    Some(raw) => minicbor::decode(raw.as_ref()).map_err(|e| {
                        ConflictableTransactionError::Abort(CreateAbort::Codec(e.to_string()))
                    })?,
                    None => User::new(order.user_id.clone(), order.user_email.clone()),
                };

                match pay_with {
                    PayWith::DailyFree => {
                        if let Err(e) = Self::check_daily_free(&user, &now) {
                            return Err(ConflictableTransactionError::Abort(
                                CreateAbort::Funding(e),
                            ));
                        }
                        user.last_free_dream_at = Some(now.clone());
                    }
                    PayWith::Credits => {
                        if user.credits == 0 {
                            return Err(ConflictableTransactionError::Abort(
                                CreateAbort::Funding(OrderError::InsufficientCredits),
                            ));
                        }
                        user.credits -= 1;
                    }
                }

                let user_cbor = minicbor::to_vec(&user).map_err(|e| {
                    ConflictableTransactionError::Abort(CreateAbort::Codec(e.to_string()))
                })?;

                tx.insert(fpk.as_slice(), order.id.as_bytes())?;
                tx.insert(idk.as_slice(), order.id.as_bytes())?;
                tx.insert(ordk.as_slice(), order_cbor.clone())?;
                tx.insert(usrk.as_slice(), user_cbor)?;
                Ok(())
            });

        match result {
            Ok(()) => {
                if let Err(e) = self.notifier.order_created(&order) {
                    tracing::warn!(order_id = %order.id, error = %e, "creation notification failed");
                }
                Ok(SubmitOutcome {
                    order,
                    is_duplicate: false,
                })
            }
            Err(TransactionError::Abort(abort)) => match abort {
                // lost a concurrent race on one of the unique keys
                CreateAbort::Fingerprint(id) => self.duplicate_outcome(&id, "content fingerprint"),
                CreateAbort::IdempotencyKey(id) => self.duplicate_outcome(&id, "idempotency key"),
                CreateAbort::Funding(e) => Err(e.into()),
                CreateAbort::Codec(msg) => {
                    Err(anyhow::anyhow!("user document codec failure: {msg}"))
                }
            },
            Err(TransactionError::Storage(e)) => Err(e.into()),
        }
    }

    fn check_daily_free(user: &User, now: &TimeStamp<Utc>) -> Result<(), OrderError> {
        let gate = gate::free_gate(user.last_free_dream_at.as_ref(), now);
        if !gate.is_daily_free_available {
            let next_free_at = gate
                .next_free_at
                .map(|t| t.to_datetime_utc().to_rfc3339())
                .unwrap_or_default();
            return Err(OrderError::DailyFreeLimitReached { next_free_at });
        }
        Ok(())
    }

    fn duplicate_outcome(
        &self,
        existing_id: &str,
        constraint: &str,
    ) -> anyhow::Result<SubmitOutcome> {
        tracing::info!(order_id = %existing_id, constraint, "duplicate submission, returning existing order");
        let existing = self.get_order(existing_id)?;
        Ok(SubmitOutcome {
            order: existing,
            is_duplicate: true,
        })
    }

    /// Assign an interpreter to a new order
    pub fn assign_interpreter(
        &self,
        order_id: &str,
        interpreter_id: &str,
    ) -> anyhow::Result<Order> {
        let mut order = self.get_order(order_id)?;

        // only human orders have an assignment phase
        if order.kind != OrderKind::Human || order.status != OrderStatus::New {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                action: "assign",
            }
            .into());
        }
        if order.assigned_at.is_some() {
            return Err(OrderError::AlreadyAssigned.into());
        }
        // the target recorded at creation wins
        if let Some(target) = &order.interpreter_id {
            if target != interpreter_id {
                return Err(OrderError::NotAssignedInterpreter.into());
            }
        }

        let profile = self.load_interpreter(interpreter_id)?;
        order.interpreter_id = Some(profile.id.clone());
        order.interpreter_user_id = Some(profile.user_id.clone());
        order.interpreter_name = Some(profile.display_name.clone());
        order.status = OrderStatus::Assigned;
        order.assigned_at = Some(TimeStamp::new());

        self.save_order(&order)?;
        Ok(order)
    }

    /// Interpreter starts working the order
    pub fn start_order(&self, order_id: &str, interpreter_id: &str) -> anyhow::Result<Order> {
        let mut order = self.get_order(order_id)?;

        if !matches!(order.status, OrderStatus::New | OrderStatus::Assigned) {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                action: "start",
            }
            .into());
        }
        let expected = order
            .interpreter_id
            .as_deref()
            .ok_or(OrderError::NotAssignedInterpreter)?;
        if expected != interpreter_id {
            return Err(OrderError::NotAssignedInterpreter.into());
        }

        order.status = OrderStatus::InProgress;
        order.started_at = Some(TimeStamp::new());

        self.save_order(&order)?;
        Ok(order)
    }

    /// Interpreter submits the finished interpretation, completing the order
    /// and settling commission and earning from the locked price
    pub fn submit_interpretation(
        &self,
        order_id: &str,
        interpreter_id: &str,
        text: &str,
    ) -> anyhow::Result<Order> {
        let (raw, order) = self.load_order_raw(order_id)?;

        if order.kind != OrderKind::Human {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                action: "submit interpretation",
            }
            .into());
        }
        if order.status == OrderStatus::Completed {
            return Err(OrderError::AlreadyCompleted.into());
        }
        if order.status != OrderStatus::InProgress {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                action: "submit interpretation",
            }
            .into());
        }
        let expected = order
            .interpreter_id
            .as_deref()
            .ok_or(OrderError::NotAssignedInterpreter)?;
        if expected != interpreter_id {
            return Err(OrderError::NotAssignedInterpreter.into());
        }

        self.apply_completion(raw, order, text)
    }

    /// Complete an AI order. AI orders have no assignment phase and go
    /// straight from new to completed.
    pub fn complete_ai_order(&self, order_id: &str, text: &str) -> anyhow::Result<Order> {
        let (raw, order) = self.load_order_raw(order_id)?;

        if order.kind != OrderKind::Ai {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                action: "complete ai order",
            }
            .into());
        }
        if order.status == OrderStatus::Completed {
            return Err(OrderError::AlreadyCompleted.into());
        }
        if order.status != OrderStatus::New {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                action: "complete ai order",
            }
            .into());
        }

        self.apply_completion(raw, order, text)
    }

    fn apply_completion(&self, raw: IVec, mut order: Order, text: &str) -> anyhow::Result<Order> {
        let len = fingerprint::normalize(text).chars().count();
        if len < self.config.min_interpretation_len {
            return Err(ValidationError::InterpretationTooShort {
                len,
                min: self.config.min_interpretation_len,
            }
            .into());
        }

        // settled once, from the locked price, never from the live rate
        let settlement = pricing::settle(order.locked_price, self.config.commission_rate_bps);

        order.status = OrderStatus::Completed;
        order.interpretation_text = Some(text.to_string());
        order.completed_at = Some(TimeStamp::new());
        order.platform_commission = Some(settlement.platform_commission);
        order.interpreter_earning = Some(settlement.interpreter_earning);

        let new_cbor = minicbor::to_vec(&order)?;

        // terminal write is compare-and-swap against the exact bytes read,
        // the loser of a concurrent submit gets already-completed
        match self
            .instance
            .compare_and_swap(order_key(&order.id), Some(raw), Some(new_cbor))?
        {
            Ok(()) => {}
            Err(cas) => {
                let current = cas
                    .current
                    .ok_or_else(|| OrderError::OrderNotFound(order.id.clone()))?;
                let current: Order = minicbor::decode(current.as_ref())?;
                if current.status == OrderStatus::Completed {
                    return Err(OrderError::AlreadyCompleted.into());
                }
                return Err(anyhow::anyhow!(
                    "order {} changed concurrently, re-fetch and retry",
                    order.id
                ));
            }
        }

        tracing::info!(
            order_id = %order.id,
            locked_price = order.locked_price,
            commission = settlement.platform_commission,
            earning = settlement.interpreter_earning,
            "order settled"
        );

        // best-effort counter bump; reconcile_interpreter rebuilds these
        // from completed orders when the increment is lost
        if let Some(interpreter_id) = order.interpreter_id.clone() {
            if let Err(e) =
                self.bump_interpreter_counters(&interpreter_id, settlement.interpreter_earning)
            {
                tracing::warn!(
                    order_id = %order.id,
                    interpreter_id = %interpreter_id,
                    error = %e,
                    "interpreter counter update failed, run reconciliation"
                );
            }
        }

        if let Err(e) = self.notifier.order_completed(&order) {
            tracing::warn!(order_id = %order.id, error = %e, "completion notification failed");
        }

        Ok(order)
    }

    /// Administrative cancellation. Out-of-band only, there is no automatic
    /// timeout loop. The actor must hold the admin role.
    pub fn cancel_order(&self, order_id: &str, actor_user_id: &str) -> anyhow::Result<Order> {
        let actor = self.get_user(actor_user_id)?;
        if actor.role != Role::Admin {
            return Err(OrderError::NotAdmin.into());
        }

        let mut order = self.get_order(order_id)?;

        if order.is_terminal() {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                action: "cancel",
            }
            .into());
        }

        order.status = OrderStatus::Cancelled;
        order.cancelled_at = Some(TimeStamp::new());

        self.save_order(&order)?;
        tracing::info!(order_id = %order.id, actor = %actor.id, "order cancelled");
        Ok(order)
    }

    /// Requester asks the one allowed post-completion question
    pub fn request_clarification(
        &self,
        order_id: &str,
        user_id: &str,
        question: &str,
    ) -> anyhow::Result<Order> {
        let mut order = self.get_order(order_id)?;

        if order.status != OrderStatus::Completed {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                action: "request clarification",
            }
            .into());
        }
        if order.user_id != user_id {
            return Err(OrderError::NotRequester.into());
        }
        // one round ever, answered or not
        if order.has_clarification() {
            return Err(OrderError::ClarificationAlreadyRequested.into());
        }

        order.clarification_question = Some(question.to_string());
        order.clarification_requested_at = Some(TimeStamp::new());

        self.save_order(&order)?;
        Ok(order)
    }

    /// Interpreter answers the pending clarification question
    pub fn answer_clarification(
        &self,
        order_id: &str,
        interpreter_id: &str,
        answer: &str,
    ) -> anyhow::Result<Order> {
        let mut order = self.get_order(order_id)?;

        let expected = order
            .interpreter_id
            .as_deref()
            .ok_or(OrderError::NotAssignedInterpreter)?;
        if expected != interpreter_id {
            return Err(OrderError::NotAssignedInterpreter.into());
        }
        if order.clarification_question.is_none() {
            return Err(OrderError::NoPendingClarification.into());
        }
        if order.clarification_answer.is_some() {
            return Err(OrderError::ClarificationAlreadyAnswered.into());
        }

        let len = fingerprint::normalize(answer).chars().count();
        if len < self.config.min_clarification_answer_len {
            return Err(ValidationError::ClarificationAnswerTooShort {
                len,
                min: self.config.min_clarification_answer_len,
            }
            .into());
        }

        order.clarification_answer = Some(answer.to_string());
        order.clarification_answered_at = Some(TimeStamp::new());

        self.save_order(&order)?;
        Ok(order)
    }

    /// Requester rates a completed order, once
    pub fn rate_order(
        &self,
        order_id: &str,
        user_id: &str,
        score: u8,
        feedback: Option<String>,
    ) -> anyhow::Result<Order> {
        let mut order = self.get_order(order_id)?;

        if order.status != OrderStatus::Completed {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                action: "rate",
            }
            .into());
        }
        if order.user_id != user_id {
            return Err(OrderError::NotRequester.into());
        }
        if order.rating.is_some() {
            return Err(OrderError::AlreadyRated.into());
        }
        if !(1..=5).contains(&score) {
            return Err(ValidationError::RatingOutOfRange(score).into());
        }

        order.rating = Some(Rating { score, feedback });
        order.rated_at = Some(TimeStamp::new());

        self.save_order(&order)?;
        Ok(order)
    }

    // ----- reads and collaborator documents -----

    pub fn get_order(&self, order_id: &str) -> anyhow::Result<Order> {
        let (_, order) = self.load_order_raw(order_id)?;
        Ok(order)
    }

    fn load_order_raw(&self, order_id: &str) -> anyhow::Result<(IVec, Order)> {
        let raw = self
            .instance
            .get(order_key(order_id))?
            .ok_or_else(|| OrderError::OrderNotFound(order_id.to_string()))?;
        let order: Order = minicbor::decode(raw.as_ref())?;
        Ok((raw, order))
    }

    fn save_order(&self, order: &Order) -> anyhow::Result<()> {
        self.instance
            .insert(order_key(&order.id), minicbor::to_vec(order)?)?;
        Ok(())
    }

    pub fn list_user_orders(&self, user_id: &str) -> anyhow::Result<Vec<Order>> {
        self.scan_orders(|order| order.user_id == user_id)
    }

    pub fn list_interpreter_orders(&self, interpreter_id: &str) -> anyhow::Result<Vec<Order>> {
        self.scan_orders(|order| order.interpreter_id.as_deref() == Some(interpreter_id))
    }

    fn scan_orders(&self, keep: impl Fn(&Order) -> bool) -> anyhow::Result<Vec<Order>> {
        let mut orders = vec![];
        for item in self.instance.scan_prefix(b"order/") {
            let (_, value) = item?;
            let order: Order = minicbor::decode(value.as_ref())?;
            if keep(&order) {
                orders.push(order);
            }
        }
        Ok(orders)
    }

    /// Load the user document, creating it lazily on first contact. The
    /// create is insert-if-absent, so it cannot overwrite a concurrent
    /// update to an existing document.
    pub fn ensure_user(&self, user_id: &str, email: &str) -> anyhow::Result<User> {
        if let Some(raw) = self.instance.get(user_key(user_id))? {
            return Ok(minicbor::decode(raw.as_ref())?);
        }
        let user = User::new(user_id.to_string(), email.to_string());
        match self.instance.compare_and_swap(
            user_key(user_id),
            None as Option<&[u8]>,
            Some(minicbor::to_vec(&user)?),
        )? {
            Ok(()) => Ok(user),
            // lost the creation race, the stored document wins
            Err(cas) => {
                let raw = cas
                    .current
                    .ok_or_else(|| OrderError::UserNotFound(user_id.to_string()))?;
                Ok(minicbor::decode(raw.as_ref())?)
            }
        }
    }

    pub fn get_user(&self, user_id: &str) -> anyhow::Result<User> {
        let raw = self
            .instance
            .get(user_key(user_id))?
            .ok_or_else(|| OrderError::UserNotFound(user_id.to_string()))?;
        Ok(minicbor::decode(raw.as_ref())?)
    }

    fn save_user(&self, user: &User) -> anyhow::Result<()> {
        self.instance
            .insert(user_key(&user.id), minicbor::to_vec(user)?)?;
        Ok(())
    }

    /// Billing-path entry point, the order engine itself never adds credits
    pub fn grant_credits(&self, user_id: &str, amount: u64) -> anyhow::Result<User> {
        let mut user = self.get_user(user_id)?;
        user.credits = user.credits.saturating_add(amount);
        self.save_user(&user)?;
        Ok(user)
    }

    /// Provisioning-path entry point; `cancel_order` consults this role
    pub fn set_user_role(&self, user_id: &str, role: Role) -> anyhow::Result<User> {
        let mut user = self.get_user(user_id)?;
        user.role = role;
        self.save_user(&user)?;
        Ok(user)
    }

    pub fn upsert_interpreter(&self, profile: &InterpreterProfile) -> anyhow::Result<()> {
        self.instance
            .insert(interpreter_key(&profile.id), minicbor::to_vec(profile)?)?;
        Ok(())
    }

    pub fn get_interpreter(&self, interpreter_id: &str) -> anyhow::Result<InterpreterProfile> {
        self.load_interpreter(interpreter_id)
    }

    /// Change the interpreter's live rate. In-flight orders keep their
    /// locked price.
    pub fn set_interpreter_rate(&self, interpreter_id: &str, rate: u64) -> anyhow::Result<()> {
        let mut profile = self.load_interpreter(interpreter_id)?;
        profile.rate = rate;
        self.upsert_interpreter(&profile)
    }

    fn load_interpreter(&self, interpreter_id: &str) -> anyhow::Result<InterpreterProfile> {
        let raw = self
            .instance
            .get(interpreter_key(interpreter_id))?
            .ok_or_else(|| OrderError::InterpreterNotFound(interpreter_id.to_string()))?;
        Ok(minicbor::decode(raw.as_ref())?)
    }

    fn bump_interpreter_counters(&self, interpreter_id: &str, earning: u64) -> anyhow::Result<()> {
        let mut profile = self.load_interpreter(interpreter_id)?;
        profile.completed_count += 1;
        profile.pending_earnings = profile.pending_earnings.saturating_add(earning);
        self.upsert_interpreter(&profile)
    }

    /// Rebuild the interpreter's aggregate counters from completed orders.
    /// The counters are a best-effort cache; this scan is the source of
    /// truth.
    pub fn reconcile_interpreter(
        &self,
        interpreter_id: &str,
    ) -> anyhow::Result<InterpreterProfile> {
        let mut profile = self.load_interpreter(interpreter_id)?;

        let mut completed_count = 0u64;
        let mut pending_earnings = 0u64;
        for order in self.list_interpreter_orders(interpreter_id)? {
            if order.status == OrderStatus::Completed {
                completed_count += 1;
                pending_earnings =
                    pending_earnings.saturating_add(order.interpreter_earning.unwrap_or_default());
            }
        }

        profile.completed_count = completed_count;
        profile.pending_earnings = pending_earnings;
        self.upsert_interpreter(&profile)?;
        Ok(profile)
    }
}
