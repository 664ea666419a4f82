//! End-to-end walkthrough of the order lifecycle against a throwaway db.
//!
//! Run with: cargo run --example lifecycle

use dream_orders::order::OrderKind;
use dream_orders::service::{OrderService, PayWith, SubmitOrder};
use dream_orders::user::InterpreterProfile;
use dream_orders::utils;
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let temp_dir = tempfile::tempdir()?;
    let db = Arc::new(sled::open(temp_dir.path().join("lifecycle.db"))?);
    let service = OrderService::new(db);

    let user_id = utils::new_user_id()?;
    let interpreter_id = utils::new_interpreter_id()?;
    let interpreter_user_id = utils::new_user_id()?;

    service.upsert_interpreter(&InterpreterProfile::new(
        interpreter_id.clone(),
        interpreter_user_id,
        "Madame Selene".to_string(),
        3000,
    ))?;

    let outcome = service.submit_order(SubmitOrder {
        user_id: user_id.clone(),
        user_email: "dreamer@example.com".to_string(),
        dream_text: "I was flying over a city made of glass and could not land anywhere."
            .to_string(),
        kind: OrderKind::Human,
        interpreter_id: Some(interpreter_id.clone()),
        context: None,
        pay_with: PayWith::DailyFree,
        idempotency_key: None,
    })?;
    println!(
        "created order {} (duplicate: {})",
        outcome.order.id, outcome.is_duplicate
    );

    let order = service.assign_interpreter(&outcome.order.id, &interpreter_id)?;
    println!("assigned, status {}", order.status);

    let order = service.start_order(&order.id, &interpreter_id)?;
    println!("started, status {}", order.status);

    let order = service.submit_interpretation(
        &order.id,
        &interpreter_id,
        "Glass cities stand for ambitions you can see through but not yet touch; the \
         missing landing place is the decision you keep postponing.",
    )?;
    println!(
        "completed, commission {:?}, earning {:?}",
        order.platform_commission, order.interpreter_earning
    );

    let order = service.rate_order(&order.id, &user_id, 5, Some("spot on".to_string()))?;
    println!("rated {:?}", order.rating);

    let profile = service.reconcile_interpreter(&interpreter_id)?;
    println!(
        "interpreter completed {} orders, pending earnings {}",
        profile.completed_count, profile.pending_earnings
    );

    Ok(())
}
