//! Handler types and dependencies

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use teloxide::types::{ChatId, MessageId, UserId};
use tokio::time::Instant;

use crate::core::config;
use crate::download::pipeline::DeliveryPipeline;
use crate::download::send::Transport;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Clone)]
struct KeyboardLink {
    url: String,
    created_at: Instant,
}

/// Links the bot has seen, in memory only.
///
/// Each Video/Audio keyboard is bound to the link it was shown for, keyed by
/// the keyboard message, so a press under an older message still fetches
/// that message's link. Callback data only carries the mode because Telegram
/// caps it at 64 bytes. `/audio` uses the user's most recent link.
#[derive(Debug)]
pub struct LinkStore {
    last: DashMap<UserId, String>,
    keyboards: DashMap<(ChatId, MessageId), KeyboardLink>,
    prune_at: usize,
    ttl: Duration,
}

impl Default for LinkStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkStore {
    pub fn new() -> Self {
        Self::with_limits(config::telegram::KEYBOARD_LINK_PRUNE_AT, config::telegram::keyboard_link_ttl())
    }

    /// Once more than `prune_at` keyboards are stored, entries older than
    /// `ttl` are dropped on the next insert.
    pub fn with_limits(prune_at: usize, ttl: Duration) -> Self {
        Self {
            last: DashMap::new(),
            keyboards: DashMap::new(),
            prune_at,
            ttl,
        }
    }

    pub fn remember_last(&self, user_id: UserId, url: impl Into<String>) {
        self.last.insert(user_id, url.into());
    }

    pub fn last(&self, user_id: UserId) -> Option<String> {
        self.last.get(&user_id).map(|entry| entry.value().clone())
    }

    /// Binds `url` to the keyboard sent as `message_id` in `chat_id`
    pub fn attach(&self, chat_id: ChatId, message_id: MessageId, url: impl Into<String>) {
        let now = Instant::now();
        if self.keyboards.len() >= self.prune_at {
            let before = self.keyboards.len();
            self.keyboards
                .retain(|_, link| now.saturating_duration_since(link.created_at) <= self.ttl);
            log::debug!("Pruned {} keyboard link(s)", before - self.keyboards.len());
        }
        self.keyboards.insert(
            (chat_id, message_id),
            KeyboardLink {
                url: url.into(),
                created_at: now,
            },
        );
    }

    pub fn for_keyboard(&self, chat_id: ChatId, message_id: MessageId) -> Option<String> {
        self.keyboards
            .get(&(chat_id, message_id))
            .map(|entry| entry.value().url.clone())
    }

    pub fn keyboard_count(&self) -> usize {
        self.keyboards.len()
    }
}

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub pipeline: Arc<DeliveryPipeline>,
    pub transport: Arc<dyn Transport>,
    pub links: Arc<LinkStore>,
}

impl HandlerDeps {
    pub fn new(pipeline: Arc<DeliveryPipeline>, transport: Arc<dyn Transport>) -> Self {
        Self {
            pipeline,
            transport,
            links: Arc::new(LinkStore::new()),
        }
    }

    pub fn is_authorized(&self, user_id: UserId) -> bool {
        self.pipeline.access().is_authorized(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_link_is_overwritten() {
        let store = LinkStore::new();
        store.remember_last(UserId(1), "https://vm.tiktok.com/a/");
        store.remember_last(UserId(1), "https://vm.tiktok.com/b/");
        store.remember_last(UserId(2), "https://vm.tiktok.com/c/");

        assert_eq!(store.last(UserId(1)).as_deref(), Some("https://vm.tiktok.com/b/"));
        assert_eq!(store.last(UserId(3)), None);
    }

    #[tokio::test]
    async fn test_keyboard_keeps_its_own_link() {
        let store = LinkStore::new();
        store.attach(ChatId(1), MessageId(10), "https://vm.tiktok.com/AAA/");
        store.attach(ChatId(1), MessageId(11), "https://vm.tiktok.com/BBB/");

        assert_eq!(
            store.for_keyboard(ChatId(1), MessageId(10)).as_deref(),
            Some("https://vm.tiktok.com/AAA/")
        );
        assert_eq!(
            store.for_keyboard(ChatId(1), MessageId(11)).as_deref(),
            Some("https://vm.tiktok.com/BBB/")
        );
        assert_eq!(store.for_keyboard(ChatId(2), MessageId(10)), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_keyboards_are_pruned_when_full() {
        let store = LinkStore::with_limits(2, Duration::from_secs(60));
        store.attach(ChatId(1), MessageId(1), "https://vm.tiktok.com/old/");
        tokio::time::advance(Duration::from_secs(120)).await;
        store.attach(ChatId(1), MessageId(2), "https://vm.tiktok.com/mid/");
        assert_eq!(store.keyboard_count(), 2);

        store.attach(ChatId(1), MessageId(3), "https://vm.tiktok.com/new/");

        assert_eq!(store.keyboard_count(), 2);
        assert_eq!(store.for_keyboard(ChatId(1), MessageId(1)), None);
        assert!(store.for_keyboard(ChatId(1), MessageId(2)).is_some());
    }
}
