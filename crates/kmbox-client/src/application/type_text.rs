//! TypeText use case: turns a string into ordered keyboard commands.
//!
//! The device keeps only the latest keyboard state it received, so typing is
//! a strict sequence of "hold this key" commands.  Two identical key-down
//! reports in a row look like one long press to the target, so a repeated
//! character is preceded by an explicit "all keys up".
//!
//! The whole string is checked against the US-layout table before anything
//! is sent; an unsupported character means no command goes out at all.

use std::time::Duration;

use kmbox_core::keymap::text::{lookup, KeyStroke};
use kmbox_core::protocol::messages::{CommandCode, KeyboardAction};
use tracing::{debug, warn};

use crate::application::dispatch::{CommandDispatcher, Nonce};
use crate::error::ClientError;

/// Pause after each key-down used by callers that have no preference.
pub const DEFAULT_KEY_DELAY: Duration = Duration::from_millis(80);

/// One keyboard command in a typing plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStep {
    Press(KeyStroke),
    ReleaseAll,
}

/// Builds the command sequence that types `text`.
///
/// # Errors
///
/// Returns [`ClientError::UnsupportedCharacter`] for the first character with
/// no key mapping.
pub fn plan_keystrokes(text: &str) -> Result<Vec<KeyStep>, ClientError> {
    let mut steps = Vec::with_capacity(text.len() + 1);
    let mut previous = None;

    for (index, character) in text.chars().enumerate() {
        let stroke = lookup(character).ok_or(ClientError::UnsupportedCharacter { character, index })?;
        if previous == Some(character) {
            steps.push(KeyStep::ReleaseAll);
        }
        steps.push(KeyStep::Press(stroke));
        previous = Some(character);
    }
    steps.push(KeyStep::ReleaseAll);
    Ok(steps)
}

/// Sends one keyboard-state command.
pub(crate) async fn send_keyboard(
    dispatcher: &CommandDispatcher,
    action: &KeyboardAction,
) -> Result<bool, ClientError> {
    dispatcher
        .execute_with(CommandCode::KeyboardAll, Nonce::Random, action)
        .await
}

/// Types `text`, pausing `delay` after every key-down.
///
/// Returns `Ok(false)` as soon as the device rejects a key-down.  Release
/// commands are not checked.
///
/// # Errors
///
/// Returns [`ClientError::UnsupportedCharacter`] before sending anything if
/// the text cannot be typed, or any dispatcher error.
pub async fn type_text(
    dispatcher: &CommandDispatcher,
    text: &str,
    delay: Duration,
) -> Result<bool, ClientError> {
    let steps = plan_keystrokes(text)?;
    debug!(chars = text.chars().count(), commands = steps.len(), "typing text");

    for step in steps {
        match step {
            KeyStep::Press(stroke) => {
                let action = KeyboardAction::single(stroke.key, stroke.modifiers);
                if !send_keyboard(dispatcher, &action).await? {
                    warn!(key = ?stroke.key, "device rejected key press; typing aborted");
                    return Ok(false);
                }
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
            KeyStep::ReleaseAll => {
                send_keyboard(dispatcher, &KeyboardAction::release_all()).await?;
            }
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::network::mock::{RecordingTransport, ReplyMode};
    use kmbox_core::protocol::codec::decode;
    use kmbox_core::protocol::messages::{KeyboardModifiers, HEADER_SIZE};
    use kmbox_core::{DeviceId, HidKeyCode};
    use std::sync::Arc;

    fn press(key: HidKeyCode, modifiers: KeyboardModifiers) -> KeyStep {
        KeyStep::Press(KeyStroke { key, modifiers })
    }

    fn dispatcher(transport: Arc<RecordingTransport>) -> CommandDispatcher {
        CommandDispatcher::new(transport, DeviceId::parse("417F0CD3").expect("uuid"), None)
    }

    fn sent_actions(transport: &RecordingTransport) -> Vec<KeyboardAction> {
        transport
            .requests()
            .iter()
            .map(|d| decode::<KeyboardAction>(&d[HEADER_SIZE..]).expect("keyboard payload"))
            .collect()
    }

    #[test]
    fn test_repeated_character_gets_release_between_presses() {
        let shift = KeyboardModifiers::LEFT_SHIFT;

        let steps = plan_keystrokes("AA").expect("plan");

        assert_eq!(
            steps,
            vec![
                press(HidKeyCode::KeyA, shift),
                KeyStep::ReleaseAll,
                press(HidKeyCode::KeyA, shift),
                KeyStep::ReleaseAll,
            ]
        );
    }

    #[test]
    fn test_distinct_characters_need_no_intermediate_release() {
        let shift = KeyboardModifiers::LEFT_SHIFT;

        let steps = plan_keystrokes("AB").expect("plan");

        assert_eq!(
            steps,
            vec![
                press(HidKeyCode::KeyA, shift),
                press(HidKeyCode::KeyB, shift),
                KeyStep::ReleaseAll,
            ]
        );
        assert!(steps.len() < plan_keystrokes("AA").expect("plan").len());
    }

    #[test]
    fn test_empty_text_only_releases() {
        assert_eq!(plan_keystrokes("").expect("plan"), vec![KeyStep::ReleaseAll]);
    }

    #[test]
    fn test_unsupported_character_reports_position() {
        let result = plan_keystrokes("ok é");

        assert!(matches!(
            result,
            Err(ClientError::UnsupportedCharacter { character: 'é', index: 3 })
        ));
    }

    #[tokio::test]
    async fn test_type_text_sends_planned_commands_in_order() {
        // Arrange
        let transport = Arc::new(RecordingTransport::new());
        let dispatcher = dispatcher(Arc::clone(&transport));

        // Act
        let typed = type_text(&dispatcher, "hi!", Duration::ZERO).await.expect("type");

        // Assert
        assert!(typed);
        let actions = sent_actions(&transport);
        assert_eq!(actions.len(), 4);
        assert_eq!(actions[0].keys[0], HidKeyCode::KeyH.as_u8());
        assert_eq!(actions[1].keys[0], HidKeyCode::KeyI.as_u8());
        assert_eq!(actions[2].keys[0], HidKeyCode::Digit1.as_u8());
        assert!(actions[2].modifiers.shift());
        assert_eq!(actions[3], KeyboardAction::release_all());
        assert!(transport
            .headers()
            .iter()
            .all(|h| h.command_code() == Some(CommandCode::KeyboardAll)));
    }

    #[tokio::test]
    async fn test_type_text_with_unsupported_character_sends_nothing() {
        let transport = Arc::new(RecordingTransport::new());
        let dispatcher = dispatcher(Arc::clone(&transport));

        let result = type_text(&dispatcher, "abc€", Duration::ZERO).await;

        assert!(matches!(result, Err(ClientError::UnsupportedCharacter { .. })));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_type_text_stops_at_first_rejected_press() {
        // Arrange – the second command is rejected
        let transport = Arc::new(RecordingTransport::with_mode(ReplyMode::RejectAfter(1)));
        let dispatcher = dispatcher(Arc::clone(&transport));

        // Act
        let typed = type_text(&dispatcher, "abcd", Duration::ZERO).await.expect("type");

        // Assert
        assert!(!typed);
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_type_text_waits_after_each_press() {
        let transport = Arc::new(RecordingTransport::new());
        let dispatcher = dispatcher(transport);
        let started = tokio::time::Instant::now();

        type_text(&dispatcher, "abc", Duration::from_millis(100))
            .await
            .expect("type");

        assert!(started.elapsed() >= Duration::from_millis(300));
    }
}
