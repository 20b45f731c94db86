//! Mechanical post-conditions on the model's final reply.
//!
//! The policy prompt asks the model to reproduce menu listings and emit cart
//! tags, but prompt compliance is not a guarantee. This layer verifies both
//! post-conditions and repairs the reply when the model drifted.

use std::sync::Arc;

use forno_core::cart::Cart;
use forno_db::MenuRepository;
use tracing::{debug, warn};

use crate::intent::{IntentExtractor, OrderIntent};
use crate::tools::render_listing;

pub struct ReplyGuardrails {
    menu: Arc<dyn MenuRepository>,
    extractor: IntentExtractor,
}

impl ReplyGuardrails {
    pub fn new(menu: Arc<dyn MenuRepository>) -> Self {
        Self { menu, extractor: IntentExtractor::new() }
    }

    /// Adjusts the final reply for one round: restores an omitted menu listing
    /// and serializes cart mutations into `:::ADD:...:::` tags. `listing_shown`
    /// is true when the listing tool ran during the round.
    pub async fn finalize(
        &self,
        user_text: &str,
        mut reply: String,
        listing_shown: bool,
        cart: &mut Cart,
    ) -> String {
        let items = match self.menu.list_all().await {
            Ok(items) => items,
            Err(error) => {
                // Degraded store: nothing to verify against, pass the reply through.
                warn!(
                    event_name = "agent.guardrails.store_unavailable",
                    error = %error,
                    "skipping reply guardrails, menu store unreachable"
                );
                return reply;
            }
        };

        if listing_shown {
            let omitted =
                items.iter().any(|item| !reply.contains(item.name.as_str()));
            if omitted && !items.is_empty() {
                debug!(
                    event_name = "agent.guardrails.listing_restored",
                    "model summarized the listing, appending it verbatim"
                );
                if !reply.is_empty() {
                    reply.push_str("\n\n");
                }
                reply.push_str(&render_listing(&items));
            }
        }

        let names: Vec<String> = items.iter().map(|item| item.name.clone()).collect();
        if let OrderIntent::AddItems(mentioned) = self.extractor.extract(user_text, &names) {
            for name in mentioned {
                let Some(item) = items.iter().find(|item| item.name == name) else {
                    continue;
                };
                let tag = cart.add(&item.name, item.price_cents).tag();
                if !reply.contains(&tag) {
                    if !reply.is_empty() {
                        reply.push(' ');
                    }
                    reply.push_str(&tag);
                }
            }
        }

        reply
    }
}
