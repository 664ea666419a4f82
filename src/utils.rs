//! Utility functions for id generation

use bech32::Bech32m;
use uuid7::uuid7;

// construct a unique prefixed id then encode using bech32
pub fn new_prefixed_id(hrp: &str) -> anyhow::Result<String> {
    let hrp = bech32::Hrp::parse(hrp)?;
    let encode = bech32::encode::<Bech32m>(hrp, uuid7().as_bytes())?;
    Ok(encode)
}

/// Id for an order document
pub fn new_order_id() -> anyhow::Result<String> {
    new_prefixed_id("order_")
}

/// Id for a user document
pub fn new_user_id() -> anyhow::Result<String> {
    new_prefixed_id("user_")
}

/// Id for an interpreter profile
pub fn new_interpreter_id() -> anyhow::Result<String> {
    new_prefixed_id("intr_")
}
