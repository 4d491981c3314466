//! Integration tests for core modules (rate limiter, access guard, validation, config)
//!
//! Run with: cargo test --test core_modules_test

use std::collections::HashSet;
use std::sync::Arc;
use teloxide::types::UserId;
use tokio::time::{Duration, Instant};

// ============================================================================
// Rate Limiter Tests
// ============================================================================

mod rate_limiter_tests {
    use super::*;
    use ttdl::core::rate_limiter::RateLimiter;

    #[tokio::test(start_paused = true)]
    async fn test_limit_per_window() {
        let limiter = RateLimiter::new(5);
        let user = UserId(42);
        let start = Instant::now();

        let allowed = (0..8).filter(|_| limiter.allow(user, start)).count();
        assert_eq!(allowed, 5);

        // still inside the window
        assert!(!limiter.allow(user, start + Duration::from_secs(59)));
        assert!(limiter.remaining(user, start + Duration::from_secs(59)).is_some());

        // window elapsed
        assert!(limiter.allow(user, start + Duration::from_secs(61)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_limit_denies_everything() {
        let limiter = RateLimiter::new(0);
        assert!(!limiter.allow_now(UserId(1)));
        tokio::time::advance(Duration::from_secs(120)).await;
        assert!(!limiter.allow_now(UserId(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_task_purges_idle_users() {
        let limiter = Arc::new(RateLimiter::with_window(3, Duration::from_secs(60)));
        limiter.allow_now(UserId(1));
        limiter.allow_now(UserId(2));
        assert_eq!(limiter.tracked_users(), 2);

        let handle = Arc::clone(&limiter).spawn_cleanup_task(Duration::from_secs(300));
        tokio::time::sleep(Duration::from_secs(301)).await;

        assert_eq!(limiter.tracked_users(), 0);
        handle.abort();
    }

    #[tokio::test]
    async fn test_concurrent_users_do_not_interfere() {
        let limiter = Arc::new(RateLimiter::new(3));
        let mut handles = Vec::new();
        for user in 0..16u64 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move {
                (0..5).filter(|_| limiter.allow_now(UserId(user))).count()
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap(), 3);
        }
    }
}

// ============================================================================
// Access Guard Tests
// ============================================================================

mod access_tests {
    use super::*;
    use ttdl::core::access::{is_authorized, AccessGuard};

    #[test]
    fn test_empty_list_is_open() {
        assert!(is_authorized(UserId(1), &HashSet::new()));
        assert!(AccessGuard::open().is_open());
    }

    #[test]
    fn test_membership() {
        let admins: HashSet<UserId> = [UserId(10), UserId(20)].into_iter().collect();
        let guard = AccessGuard::new(admins);
        assert!(guard.is_authorized(UserId(10)));
        assert!(!guard.is_authorized(UserId(11)));
        assert_eq!(guard.admin_count(), 2);
    }
}

// ============================================================================
// Validation Tests
// ============================================================================

mod validation_tests {
    use ttdl::core::validation::{extract_tiktok_url, validate_tiktok_url, ValidationError};

    #[test]
    fn test_accepts_share_and_canonical_links() {
        for link in [
            "https://vm.tiktok.com/ZMabc123/",
            "https://vt.tiktok.com/ZSxyz/",
            "https://www.tiktok.com/@some.user/video/7301234567890123456?lang=en",
            "http://m.tiktok.com/v/7301234567890123456.html",
        ] {
            assert!(validate_tiktok_url(link).is_ok(), "{link}");
        }
    }

    #[test]
    fn test_rejects_other_hosts() {
        assert!(matches!(
            validate_tiktok_url("https://www.youtube.com/watch?v=x"),
            Err(ValidationError::NotTikTok(_))
        ));
        assert!(validate_tiktok_url("https://tiktok.com.evil.example/video").is_err());
    }

    #[test]
    fn test_extracts_link_from_chatter() {
        let text = "lol check https://www.tiktok.com/@dancer/video/7301234567890123456 and tell me";
        assert_eq!(
            extract_tiktok_url(text),
            Some("https://www.tiktok.com/@dancer/video/7301234567890123456")
        );
    }
}

// ============================================================================
// Config Tests
// ============================================================================

mod config_tests {
    use super::*;
    use ttdl::core::config::{BotConfig, ConfigError};

    #[test]
    fn test_admin_ids_and_limits() {
        let config = BotConfig::from_lookup(|key| match key {
            "BOT_TOKEN" => Some("123:abc".to_string()),
            "ADMIN_IDS" => Some("1, 2 3".to_string()),
            "COMPRESS_MAX_MB" => Some("10".to_string()),
            _ => None,
        })
        .unwrap();

        let expected: HashSet<UserId> = [UserId(1), UserId(2), UserId(3)].into_iter().collect();
        assert_eq!(config.admin_ids, expected);
        assert_eq!(config.compress_max_bytes(), 10 * 1024 * 1024);
    }

    #[test]
    fn test_webhook_mode_needs_url() {
        let err = BotConfig::from_lookup(|key| match key {
            "BOT_TOKEN" => Some("t".to_string()),
            "USE_WEBHOOK" => Some("true".to_string()),
            _ => None,
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingWebhookUrl));
    }
}
