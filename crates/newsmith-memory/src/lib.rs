// SPDX-FileCopyrightText: 2026 Newsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation memory gateway.
//!
//! [`ConversationGateway`] mediates all access to the persisted per-user
//! dialogue state. Reads are non-fatal (a missing or unreadable context
//! yields a fresh one); the single write-back after a successful workflow
//! is the serialization point for conversation state.

use std::sync::Arc;

use chrono::Utc;
use newsmith_core::{
    CallOptions, ConversationContext, MemoryStore, NewsmithError, UserPreferences,
};
use tracing::{debug, warn};

/// Gateway over the [`MemoryStore`] port for conversation state.
pub struct ConversationGateway {
    store: Arc<dyn MemoryStore>,
}

impl ConversationGateway {
    pub fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self { store }
    }

    /// Loads the user's conversation, or constructs an empty one when it is
    /// absent or the read fails. Always refreshes `last_active` and the
    /// user preferences from the current request.
    pub async fn load_or_init(
        &self,
        user_id: &str,
        preferences: &UserPreferences,
        opts: &CallOptions,
    ) -> ConversationContext {
        let mut context = match self.store.load_conversation(user_id, opts).await {
            Ok(Some(context)) => {
                debug!(
                    user_id,
                    exchanges = context.exchanges.len(),
                    topics = context.current_topics.len(),
                    "loaded conversation context"
                );
                context
            }
            Ok(None) => {
                debug!(user_id, "no conversation context, initializing fresh");
                ConversationContext::new(user_id, preferences.clone())
            }
            Err(err) => {
                warn!(user_id, error = %err, "conversation load failed, initializing fresh");
                ConversationContext::new(user_id, preferences.clone())
            }
        };

        context.user_preferences = preferences.clone();
        context.last_active = Utc::now();
        context
    }

    /// Writes the merged conversation back. Refreshes `updated_at`; every
    /// other field round-trips unchanged, so saving a just-loaded context
    /// is a no-op modulo that timestamp.
    pub async fn commit(
        &self,
        context: &ConversationContext,
        opts: &CallOptions,
    ) -> Result<(), NewsmithError> {
        let mut context = context.clone();
        context.updated_at = Utc::now();
        self.store.save_conversation(&context, opts).await
    }

    /// Deletes the user's conversation.
    pub async fn clear(&self, user_id: &str, opts: &CallOptions) -> Result<(), NewsmithError> {
        self.store.clear_conversation(user_id, opts).await
    }

    /// Monitoring snapshot of a user's conversation.
    pub async fn stats(
        &self,
        user_id: &str,
        opts: &CallOptions,
    ) -> Result<serde_json::Value, NewsmithError> {
        match self.store.load_conversation(user_id, opts).await? {
            Some(context) => Ok(serde_json::json!({
                "exists": true,
                "user_id": user_id,
                "total_exchanges": context.total_exchanges,
                "message_count": context.message_count,
                "session_start": context.session_start.to_rfc3339(),
                "last_active": context.last_active.to_rfc3339(),
            })),
            None => Ok(serde_json::json!({
                "exists": false,
                "user_id": user_id,
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use newsmith_core::{Intent, WorkflowContext};
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeStore {
        conversations: Mutex<HashMap<String, ConversationContext>>,
        fail_loads: bool,
    }

    #[async_trait]
    impl MemoryStore for FakeStore {
        async fn load_conversation(
            &self,
            user_id: &str,
            _opts: &CallOptions,
        ) -> Result<Option<ConversationContext>, NewsmithError> {
            if self.fail_loads {
                return Err(NewsmithError::external("STORE_ERROR", "read failed"));
            }
            Ok(self.conversations.lock().unwrap().get(user_id).cloned())
        }

        async fn save_conversation(
            &self,
            context: &ConversationContext,
            _opts: &CallOptions,
        ) -> Result<(), NewsmithError> {
            self.conversations
                .lock()
                .unwrap()
                .insert(context.user_id.clone(), context.clone());
            Ok(())
        }

        async fn clear_conversation(
            &self,
            user_id: &str,
            _opts: &CallOptions,
        ) -> Result<(), NewsmithError> {
            self.conversations.lock().unwrap().remove(user_id);
            Ok(())
        }

        async fn save_workflow_state(
            &self,
            _context: &WorkflowContext,
            _opts: &CallOptions,
        ) -> Result<(), NewsmithError> {
            Ok(())
        }

        async fn load_workflow_state(
            &self,
            _workflow_id: &str,
            _opts: &CallOptions,
        ) -> Result<Option<WorkflowContext>, NewsmithError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn missing_context_yields_fresh_one() {
        let gateway = ConversationGateway::new(Arc::new(FakeStore::default()));
        let prefs = UserPreferences {
            news_personality: "calm-anchor".to_string(),
            ..Default::default()
        };
        let context = gateway
            .load_or_init("user-1", &prefs, &CallOptions::unbounded())
            .await;
        assert_eq!(context.user_id, "user-1");
        assert!(context.exchanges.is_empty());
        assert_eq!(context.user_preferences.news_personality, "calm-anchor");
    }

    #[tokio::test]
    async fn read_error_yields_fresh_context() {
        let gateway = ConversationGateway::new(Arc::new(FakeStore {
            fail_loads: true,
            ..Default::default()
        }));
        let context = gateway
            .load_or_init("user-1", &UserPreferences::default(), &CallOptions::unbounded())
            .await;
        assert!(context.exchanges.is_empty());
    }

    #[tokio::test]
    async fn loaded_context_refreshes_preferences_and_activity() {
        let store = Arc::new(FakeStore::default());
        let old_prefs = UserPreferences {
            news_personality: "calm-anchor".to_string(),
            ..Default::default()
        };
        let mut existing = ConversationContext::new("user-1", old_prefs);
        existing.add_exchange("q", "r", Intent::Chitchat, &[], &[], &[], 0);
        let before_active = existing.last_active;
        store
            .save_conversation(&existing, &CallOptions::unbounded())
            .await
            .unwrap();

        let new_prefs = UserPreferences {
            news_personality: "ai-analyst".to_string(),
            ..Default::default()
        };
        let gateway = ConversationGateway::new(store);
        let context = gateway
            .load_or_init("user-1", &new_prefs, &CallOptions::unbounded())
            .await;
        assert_eq!(context.exchanges.len(), 1);
        assert_eq!(context.user_preferences.news_personality, "ai-analyst");
        assert!(context.last_active >= before_active);
    }

    #[tokio::test]
    async fn commit_round_trip_preserves_everything_but_updated_at() {
        let store = Arc::new(FakeStore::default());
        let gateway = ConversationGateway::new(store.clone());
        let opts = CallOptions::unbounded();

        let mut context = ConversationContext::new("user-1", UserPreferences::default());
        context.add_exchange("q1", "r1", Intent::NewNewsQuery, &[], &[], &[], 10);
        gateway.commit(&context, &opts).await.unwrap();

        let loaded = store
            .load_conversation("user-1", &opts)
            .await
            .unwrap()
            .unwrap();
        gateway.commit(&loaded, &opts).await.unwrap();
        let reloaded = store
            .load_conversation("user-1", &opts)
            .await
            .unwrap()
            .unwrap();

        let mut a = loaded.clone();
        let mut b = reloaded.clone();
        a.updated_at = b.updated_at;
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn clear_removes_conversation() {
        let store = Arc::new(FakeStore::default());
        let gateway = ConversationGateway::new(store.clone());
        let opts = CallOptions::unbounded();
        let context = ConversationContext::new("user-1", UserPreferences::default());
        gateway.commit(&context, &opts).await.unwrap();
        gateway.clear("user-1", &opts).await.unwrap();
        assert!(store
            .load_conversation("user-1", &opts)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn stats_reports_existence() {
        let gateway = ConversationGateway::new(Arc::new(FakeStore::default()));
        let opts = CallOptions::unbounded();
        let stats = gateway.stats("ghost", &opts).await.unwrap();
        assert_eq!(stats["exists"], false);
    }
}
