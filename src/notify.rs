//! Notification dispatch seam (email/SMS collaborator)
//!
//! Dispatch is fire-and-forget: a failing notifier is logged and swallowed,
//! it never rolls back or fails the order mutation that triggered it.

use crate::order::Order;

pub trait Notifier: Send + Sync {
    fn order_created(&self, order: &Order) -> anyhow::Result<()>;
    fn order_completed(&self, order: &Order) -> anyhow::Result<()>;
}

/// Default dispatcher, logs instead of sending
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn order_created(&self, order: &Order) -> anyhow::Result<()> {
        tracing::info!(order_id = %order.id, user = %order.user_email, "order created");
        Ok(())
    }

    fn order_completed(&self, order: &Order) -> anyhow::Result<()> {
        tracing::info!(order_id = %order.id, user = %order.user_email, "order completed");
        Ok(())
    }
}

/// Silent dispatcher for tests
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn order_created(&self, _order: &Order) -> anyhow::Result<()> {
        Ok(())
    }

    fn order_completed(&self, _order: &Order) -> anyhow::Result<()> {
        Ok(())
    }
}
