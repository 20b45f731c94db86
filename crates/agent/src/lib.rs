//! Conversation agent for the pizzeria ordering service.
//!
//! This crate is the "brain" of forno - the bounded loop that:
//! - Sends the session's turn history to a chat model
//! - Executes the tool calls the model requests (menu lookups)
//! - Enforces reply guardrails mechanically instead of trusting the prompt
//! - Serializes concurrent requests per session
//!
//! # Architecture
//!
//! One request flows through a constrained cycle:
//! 1. **Respond** (`runtime`) - model produces an assistant turn
//! 2. **Invoke tools** (`tools`) - pending tool calls resolve against the registry
//! 3. Repeat until a plain answer arrives or `MAX_TOOL_ROUNDS` is hit
//! 4. **Guardrails** (`guardrails`) - verbatim-listing and cart-tag post-conditions
//!
//! # Safety Principle
//!
//! The model never mutates state. The cart is mutated by the deterministic
//! intent extractor (`intent`), and the `:::ADD:...:::` tag is emitted as a
//! serialization of that cart, not trusted from generation.

pub mod guardrails;
pub mod intent;
pub mod llm;
pub mod runtime;
pub mod session;
pub mod tools;
