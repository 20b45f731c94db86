use std::collections::HashMap;
use std::sync::Arc;

use forno_core::cart::Cart;
use forno_core::conversation::Conversation;
use tokio::sync::{Mutex, RwLock};

/// Session id the reference client uses when it sends none.
pub const DEFAULT_SESSION_ID: &str = "1";

/// Everything the agent mutates for one session.
#[derive(Debug, Default)]
pub struct SessionState {
    pub conversation: Conversation,
    pub cart: Cart,
}

/// Keyed, in-process session map.
///
/// Each session sits behind its own async mutex; the endpoint holds that lock
/// for the whole agent run, so concurrent requests for the same session id
/// serialize instead of racing on the history. Distinct ids proceed in
/// parallel. No durability across restarts.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<Mutex<SessionState>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_create(&self, session_id: &str) -> Arc<Mutex<SessionState>> {
        if let Some(session) = self.sessions.read().await.get(session_id) {
            return session.clone();
        }

        let mut sessions = self.sessions.write().await;
        sessions.entry(session_id.to_string()).or_default().clone()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
