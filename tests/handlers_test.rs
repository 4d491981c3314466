//! Front-end behaviour: commands, links and the Video/Audio buttons
//!
//! Run with: cargo test --test handlers_test

mod mocks;

use mocks::{PipelineBed, ScriptedExtractionTool, MB};
use pretty_assertions::assert_eq;
use teloxide::types::{ChatId, MessageId, UserId};
use ttdl::core::messages;
use ttdl::download::{DeliveryOutcome, MediaFormat};
use ttdl::telegram::{handle_command, handle_format_choice, handle_text, Command};

const FIRST: &str = "https://vm.tiktok.com/AAA/";
const SECOND: &str = "https://vm.tiktok.com/BBB/";

const USER: UserId = UserId(1);
const CHAT: ChatId = ChatId(1);
const GROUP: ChatId = ChatId(-100500);

fn bed() -> PipelineBed {
    PipelineBed::builder(ScriptedExtractionTool::new().no_watermark_size(5 * MB)).build()
}

// ============================================================================
// Format buttons
// ============================================================================

mod button_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_button_under_older_link_downloads_that_link() {
        let bed = bed();
        let deps = bed.handler_deps();

        handle_text(&deps, USER, CHAT, true, FIRST).await.unwrap();
        handle_text(&deps, USER, CHAT, true, SECOND).await.unwrap();
        let choices = bed.transport.choices();
        assert_eq!(choices.len(), 2);
        assert_eq!(choices[0].text, messages::CHOOSE_FORMAT);

        let outcome = handle_format_choice(&deps, USER, CHAT, choices[0].message_id, "dl")
            .await
            .unwrap();

        assert_eq!(outcome, Some(DeliveryOutcome::Delivered { compressed: false }));
        assert_eq!(bed.extractor.urls(), vec![FIRST.to_string()]);
        assert_eq!(bed.extractor.formats(), vec![MediaFormat::Video]);
    }

    #[tokio::test]
    async fn test_audio_button_sends_audio() {
        let bed = bed();
        let deps = bed.handler_deps();

        handle_text(&deps, USER, CHAT, true, &format!("look {} lol", SECOND))
            .await
            .unwrap();
        let keyboard = bed.transport.choices()[0].message_id;
        let outcome = handle_format_choice(&deps, USER, CHAT, keyboard, "au").await.unwrap();

        assert!(outcome.is_some_and(|o| o.is_delivered()));
        assert_eq!(bed.extractor.urls(), vec![SECOND.to_string()]);
        assert_eq!(bed.extractor.formats(), vec![MediaFormat::Audio]);
        assert_eq!(bed.transport.media()[0].format, MediaFormat::Audio);
    }

    #[tokio::test]
    async fn test_unknown_keyboard_asks_for_the_link_again() {
        let bed = bed();
        let deps = bed.handler_deps();

        let outcome = handle_format_choice(&deps, USER, CHAT, MessageId(42), "dl").await.unwrap();

        assert_eq!(outcome, None);
        assert_eq!(bed.transport.texts(), vec![messages::LINK_EXPIRED.to_string()]);
        assert!(bed.extractor.urls().is_empty());
    }

    #[tokio::test]
    async fn test_keyboard_from_another_chat_is_not_reused() {
        let bed = bed();
        let deps = bed.handler_deps();

        handle_text(&deps, USER, CHAT, true, FIRST).await.unwrap();
        let keyboard = bed.transport.choices()[0].message_id;
        let outcome = handle_format_choice(&deps, USER, GROUP, keyboard, "dl").await.unwrap();

        assert_eq!(outcome, None);
        assert_eq!(bed.transport.texts_for(GROUP), vec![messages::LINK_EXPIRED.to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_callback_data_is_ignored() {
        let bed = bed();
        let deps = bed.handler_deps();

        handle_text(&deps, USER, CHAT, true, FIRST).await.unwrap();
        let keyboard = bed.transport.choices()[0].message_id;
        let outcome = handle_format_choice(&deps, USER, CHAT, keyboard, "history:repeat")
            .await
            .unwrap();

        assert_eq!(outcome, None);
        assert!(bed.transport.texts().is_empty());
        assert!(bed.extractor.urls().is_empty());
    }
}

// ============================================================================
// Commands
// ============================================================================

mod command_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_start_and_help_reply() {
        let bed = bed();
        let deps = bed.handler_deps();

        handle_command(&deps, USER, CHAT, Command::Start).await.unwrap();
        handle_command(&deps, USER, CHAT, Command::Help).await.unwrap();

        assert_eq!(
            bed.transport.texts(),
            vec![messages::START_TEXT.to_string(), messages::HELP_TEXT.to_string()]
        );
    }

    #[tokio::test]
    async fn test_audio_without_link_asks_for_one() {
        let bed = bed();
        let deps = bed.handler_deps();

        handle_command(&deps, USER, CHAT, Command::Audio).await.unwrap();

        assert_eq!(bed.transport.texts(), vec![messages::NO_LAST_LINK.to_string()]);
        assert!(bed.extractor.urls().is_empty());
        assert!(bed.transport.media().is_empty());
    }

    #[tokio::test]
    async fn test_audio_uses_most_recent_link() {
        let bed = bed();
        let deps = bed.handler_deps();

        handle_text(&deps, USER, CHAT, true, FIRST).await.unwrap();
        handle_text(&deps, USER, CHAT, true, SECOND).await.unwrap();
        handle_command(&deps, USER, CHAT, Command::Audio).await.unwrap();

        assert_eq!(bed.extractor.urls(), vec![SECOND.to_string()]);
        assert_eq!(bed.extractor.formats(), vec![MediaFormat::Audio]);
        assert_eq!(bed.transport.media().len(), 1);
    }
}

// ============================================================================
// Plain messages
// ============================================================================

mod message_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_group_without_link_stays_silent() {
        let bed = bed();
        let deps = bed.handler_deps();

        handle_text(&deps, USER, GROUP, false, "good morning everyone").await.unwrap();

        assert!(bed.transport.texts().is_empty());
        assert!(bed.transport.choices().is_empty());
    }

    #[tokio::test]
    async fn test_group_link_gets_keyboard() {
        let bed = bed();
        let deps = bed.handler_deps();

        handle_text(&deps, USER, GROUP, false, FIRST).await.unwrap();

        let choices = bed.transport.choices();
        assert_eq!(choices.len(), 1);
        assert_eq!(choices[0].chat_id, GROUP);
        assert_eq!(deps.links.for_keyboard(GROUP, choices[0].message_id).as_deref(), Some(FIRST));
    }

    #[tokio::test]
    async fn test_private_chat_without_link_is_told_so() {
        let bed = bed();
        let deps = bed.handler_deps();

        handle_text(&deps, USER, CHAT, true, "https://example.com/video").await.unwrap();

        assert_eq!(bed.transport.texts(), vec![messages::INVALID_LINK.to_string()]);
        assert!(bed.transport.choices().is_empty());
    }
}

// ============================================================================
// Admin-only mode
// ============================================================================

mod access_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn locked_bed() -> PipelineBed {
        PipelineBed::builder(ScriptedExtractionTool::new().no_watermark_size(5 * MB))
            .admins(&[99])
            .build()
    }

    #[tokio::test]
    async fn test_unauthorized_user_is_denied_everywhere() {
        let bed = locked_bed();
        let deps = bed.handler_deps();

        handle_command(&deps, USER, CHAT, Command::Start).await.unwrap();
        handle_command(&deps, USER, CHAT, Command::Help).await.unwrap();
        handle_command(&deps, USER, CHAT, Command::Audio).await.unwrap();
        handle_text(&deps, USER, CHAT, true, FIRST).await.unwrap();

        assert_eq!(bed.transport.texts(), vec![messages::ACCESS_DENIED.to_string(); 4]);
        assert!(bed.transport.choices().is_empty());
        assert!(bed.extractor.urls().is_empty());
        assert_eq!(deps.links.last(USER), None);
    }

    #[tokio::test]
    async fn test_unauthorized_group_chatter_stays_silent() {
        let bed = locked_bed();
        let deps = bed.handler_deps();

        handle_text(&deps, USER, GROUP, false, "hello").await.unwrap();

        assert!(bed.transport.texts().is_empty());
    }

    #[tokio::test]
    async fn test_admin_is_served() {
        let bed = locked_bed();
        let deps = bed.handler_deps();
        let admin = UserId(99);

        handle_text(&deps, admin, CHAT, true, FIRST).await.unwrap();
        let keyboard = bed.transport.choices()[0].message_id;
        let outcome = handle_format_choice(&deps, admin, CHAT, keyboard, "dl").await.unwrap();

        assert!(outcome.is_some_and(|o| o.is_delivered()));
        assert!(bed.transport.texts().is_empty());
    }

    #[tokio::test]
    async fn test_other_user_pressing_admin_keyboard_is_denied() {
        let bed = locked_bed();
        let deps = bed.handler_deps();

        handle_text(&deps, UserId(99), CHAT, true, FIRST).await.unwrap();
        let keyboard = bed.transport.choices()[0].message_id;
        let outcome = handle_format_choice(&deps, USER, CHAT, keyboard, "dl").await.unwrap();

        assert_eq!(outcome, Some(DeliveryOutcome::Denied));
        assert_eq!(bed.transport.texts(), vec![messages::ACCESS_DENIED.to_string()]);
        assert!(bed.extractor.urls().is_empty());
    }
}
