//! `KmBoxClient`: the public face of the crate.
//!
//! Wires a [`CommandDispatcher`] to a UDP socket and exposes one method per
//! device command.  Every command method returns `Ok(true)` when the device
//! acknowledged it and `Ok(false)` when the reply did not match.

use std::net::IpAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use kmbox_core::domain::validate_config_address;
use kmbox_core::protocol::messages::{
    CommandCode, KeyboardAction, KeyboardModifiers, MouseAction, MouseButtons, MouseMasks,
    SetConfigPayload, KEY_SLOT_COUNT,
};
use kmbox_core::protocol::nonce;
use kmbox_core::{DeviceId, HidKeyCode};
use tracing::info;

use crate::application::dispatch::{CommandDispatcher, CommandTransport, Nonce};
use crate::application::{type_text, upload_image};
use crate::error::ClientError;
use crate::infrastructure::network::monitor::{ListenerState, ListenerStatus, ReportListener};
use crate::infrastructure::network::UdpTransport;
use crate::infrastructure::storage::config::ClientConfig;

/// Client for one KMBox-Net device.
pub struct KmBoxClient {
    config: ClientConfig,
    dispatcher: Arc<CommandDispatcher>,
    active_listener: Mutex<Option<Arc<ListenerStatus>>>,
}

impl KmBoxClient {
    /// Validates `config` and opens a UDP socket whose default peer is the device.
    ///
    /// No datagram is sent; call [`KmBoxClient::connect`] for the handshake.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] for an invalid config, or a socket error.
    pub async fn new(config: ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;
        let transport = UdpTransport::connect(config.remote_addr()).await?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Builds a client on top of an existing transport.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] for an invalid config.
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn CommandTransport>,
    ) -> Result<Self, ClientError> {
        let device_id = config.validate()?;
        let dispatcher = CommandDispatcher::new(transport, device_id, config.response_timeout());
        Ok(Self {
            config,
            dispatcher: Arc::new(dispatcher),
            active_listener: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn device_id(&self) -> DeviceId {
        self.dispatcher.device_id()
    }

    /// The dispatcher, for sending commands this facade does not wrap.
    pub fn dispatcher(&self) -> &CommandDispatcher {
        &self.dispatcher
    }

    // ── Session ───────────────────────────────────────────────────────────────

    /// Sends the connect handshake.
    pub async fn connect(&self) -> Result<bool, ClientError> {
        let accepted = self.dispatcher.execute(CommandCode::Connect, Nonce::Random).await?;
        info!(device = %self.device_id(), addr = %self.config.remote_addr(), accepted, "connect handshake");
        Ok(accepted)
    }

    /// Reboots the device.
    pub async fn reboot(&self) -> Result<bool, ClientError> {
        self.dispatcher.execute(CommandCode::Reboot, Nonce::Random).await
    }

    /// Moves the device to a new address and port.
    ///
    /// The device only accepts addresses in `192.168.2.0/24`; anything else
    /// is rejected locally with [`ClientError::ConfigAddress`].
    pub async fn set_config(&self, addr: IpAddr, port: u16) -> Result<bool, ClientError> {
        let addr = validate_config_address(addr)?;
        self.dispatcher
            .execute_with(
                CommandCode::SetConfig,
                Nonce::Value(nonce::config_address(addr)),
                &SetConfigPayload { port },
            )
            .await
    }

    /// Uploads a 128×160 RGB565 frame to the LCD.
    pub async fn set_image(&self, frame: &[u8]) -> Result<bool, ClientError> {
        upload_image::upload_image(&self.dispatcher, frame).await
    }

    // ── Mouse ─────────────────────────────────────────────────────────────────

    /// Moves the cursor by (`x`, `y`) instantly.
    pub async fn mouse_move(&self, x: i32, y: i32) -> Result<bool, ClientError> {
        self.send_raw_mouse(CommandCode::MouseMove, &MouseAction::movement(x, y))
            .await
    }

    /// Moves the cursor by (`x`, `y`) over `duration_ms`, letting the device interpolate.
    pub async fn mouse_move_auto(&self, x: i32, y: i32, duration_ms: u32) -> Result<bool, ClientError> {
        self.dispatcher
            .execute_with(
                CommandCode::MouseAutoMove,
                Nonce::Value(duration_ms),
                &MouseAction::movement(x, y),
            )
            .await
    }

    /// Moves the cursor by (`x`, `y`) along a cubic Bézier curve with control
    /// points (`x1`, `y1`) and (`x2`, `y2`).
    #[allow(clippy::too_many_arguments)]
    pub async fn mouse_move_bezier(
        &self,
        x: i32,
        y: i32,
        duration_ms: u32,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
    ) -> Result<bool, ClientError> {
        let mut action = MouseAction::movement(x, y);
        action.points[..4].copy_from_slice(&[x1, y1, x2, y2]);
        self.dispatcher
            .execute_with(CommandCode::BezierMove, Nonce::Value(duration_ms), &action)
            .await
    }

    /// Sets the held mouse buttons to exactly `buttons`.
    pub async fn mouse_click(&self, buttons: MouseButtons) -> Result<bool, ClientError> {
        // the firmware reads the button mask, not the command code, so one code serves all
        let action = MouseAction {
            buttons,
            ..MouseAction::default()
        };
        self.send_raw_mouse(CommandCode::MouseLeft, &action).await
    }

    pub async fn mouse_left_click(&self) -> Result<bool, ClientError> {
        self.mouse_click(MouseButtons::LEFT).await
    }

    pub async fn mouse_right_click(&self) -> Result<bool, ClientError> {
        self.mouse_click(MouseButtons::RIGHT).await
    }

    pub async fn mouse_middle_click(&self) -> Result<bool, ClientError> {
        self.mouse_click(MouseButtons::MIDDLE).await
    }

    /// Releases every mouse button.
    pub async fn all_mouse_buttons_up(&self) -> Result<bool, ClientError> {
        self.mouse_click(MouseButtons::NONE).await
    }

    /// Scrolls the wheel; positive values scroll up.
    pub async fn mouse_wheel(&self, delta: i32) -> Result<bool, ClientError> {
        let action = MouseAction {
            wheel: delta,
            ..MouseAction::default()
        };
        self.send_raw_mouse(CommandCode::MouseWheel, &action).await
    }

    /// Sends an arbitrary mouse payload under `command`.
    pub async fn send_raw_mouse(
        &self,
        command: CommandCode,
        action: &MouseAction,
    ) -> Result<bool, ClientError> {
        self.dispatcher.execute_with(command, Nonce::Random, action).await
    }

    // ── Keyboard ──────────────────────────────────────────────────────────────

    /// Holds `key` with `modifiers`, releasing anything else.
    pub async fn keyboard_button_down(
        &self,
        key: HidKeyCode,
        modifiers: KeyboardModifiers,
    ) -> Result<bool, ClientError> {
        self.send_raw_keyboard(CommandCode::KeyboardAll, &KeyboardAction::single(key, modifiers))
            .await
    }

    /// Holds up to ten keys at once.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::TooManyKeys`] for more than ten keys.
    pub async fn keyboard_keys_down(
        &self,
        keys: &[HidKeyCode],
        modifiers: KeyboardModifiers,
    ) -> Result<bool, ClientError> {
        let action = KeyboardAction::chord(keys, modifiers).ok_or(ClientError::TooManyKeys {
            count: keys.len(),
            max: KEY_SLOT_COUNT,
        })?;
        self.send_raw_keyboard(CommandCode::KeyboardAll, &action).await
    }

    /// Releases every key and modifier.
    pub async fn all_keyboard_buttons_up(&self) -> Result<bool, ClientError> {
        self.send_raw_keyboard(CommandCode::KeyboardAll, &KeyboardAction::release_all())
            .await
    }

    /// Types `text` on a US layout, pausing `delay` after each key press.
    ///
    /// See [`type_text::DEFAULT_KEY_DELAY`] for a sensible delay.
    pub async fn type_text(&self, text: &str, delay: Duration) -> Result<bool, ClientError> {
        type_text::type_text(&self.dispatcher, text, delay).await
    }

    /// Sends an arbitrary keyboard payload under `command`.
    pub async fn send_raw_keyboard(
        &self,
        command: CommandCode,
        action: &KeyboardAction,
    ) -> Result<bool, ClientError> {
        self.dispatcher.execute_with(command, Nonce::Random, action).await
    }

    // ── Masking ───────────────────────────────────────────────────────────────

    /// Suppresses the selected inputs of the physical mouse.
    pub async fn mask_mouse_input(&self, masks: MouseMasks) -> Result<bool, ClientError> {
        self.dispatcher
            .execute(CommandCode::Mask, Nonce::Value(masks.0))
            .await
    }

    /// Suppresses one key of the physical keyboard.
    pub async fn mask_keyboard_button(&self, key: HidKeyCode) -> Result<bool, ClientError> {
        self.dispatcher
            .execute(CommandCode::Mask, Nonce::Value(nonce::keyboard_mask(key)))
            .await
    }

    /// Lifts every mouse and keyboard mask.
    pub async fn unmask_all_input(&self) -> Result<bool, ClientError> {
        self.dispatcher
            .execute(CommandCode::UnmaskAll, Nonce::Value(0))
            .await
    }

    // ── Monitoring ────────────────────────────────────────────────────────────

    /// Creates the listener for physical input reports.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::ListenerActive`] if a previous listener has not
    /// been stopped or dropped.
    pub fn create_report_listener(&self) -> Result<ReportListener, ClientError> {
        let mut slot = self
            .active_listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(status) = slot.as_ref() {
            if status.get() != ListenerState::Stopped {
                return Err(ClientError::ListenerActive);
            }
        }

        let status = Arc::new(ListenerStatus::new());
        *slot = Some(Arc::clone(&status));
        Ok(ReportListener::new(
            Arc::clone(&self.dispatcher),
            self.config.monitor_bind_socket(),
            status,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::network::mock::RecordingTransport;
    use kmbox_core::protocol::codec::decode;
    use kmbox_core::protocol::messages::{CommandHeader, HEADER_SIZE};
    use std::net::{Ipv4Addr, Ipv6Addr};

    fn client() -> (KmBoxClient, Arc<RecordingTransport>) {
        let transport = Arc::new(RecordingTransport::new());
        let config = ClientConfig::new(Ipv4Addr::LOCALHOST, 8888, "417F0CD3")
            .with_monitor_bind_addr(Ipv4Addr::LOCALHOST);
        let client = KmBoxClient::with_transport(config, Arc::clone(&transport) as Arc<dyn CommandTransport>)
            .expect("valid config");
        (client, transport)
    }

    fn last_header(transport: &RecordingTransport) -> CommandHeader {
        *transport.headers().last().expect("a request was sent")
    }

    fn last_payload<T: kmbox_core::WireFormat>(transport: &RecordingTransport) -> T {
        let requests = transport.requests();
        let datagram = requests.last().expect("a request was sent");
        decode(&datagram[HEADER_SIZE..]).expect("payload")
    }

    #[test]
    fn test_with_transport_rejects_bad_uuid() {
        let config = ClientConfig::new(Ipv4Addr::LOCALHOST, 8888, "417F0CD");

        let result = KmBoxClient::with_transport(config, Arc::new(RecordingTransport::new()));

        assert!(matches!(result, Err(ClientError::Config(_))));
    }

    #[tokio::test]
    async fn test_connect_sends_handshake_with_device_id() {
        let (client, transport) = client();

        assert!(client.connect().await.expect("connect"));

        let header = last_header(&transport);
        assert_eq!(header.command_code(), Some(CommandCode::Connect));
        assert_eq!(header.device_id, 0x417F_0CD3);
    }

    #[tokio::test]
    async fn test_mouse_move_auto_puts_duration_in_nonce() {
        let (client, transport) = client();

        client.mouse_move_auto(200, -200, 1000).await.expect("move");

        let header = last_header(&transport);
        let action: MouseAction = last_payload(&transport);
        assert_eq!(header.command_code(), Some(CommandCode::MouseAutoMove));
        assert_eq!(header.nonce, 1000);
        assert_eq!((action.x, action.y), (200, -200));
    }

    #[tokio::test]
    async fn test_mouse_move_bezier_fills_control_points() {
        let (client, transport) = client();

        client
            .mouse_move_bezier(300, 300, 2000, 400, 401, 500, 501)
            .await
            .expect("move");

        let header = last_header(&transport);
        let action: MouseAction = last_payload(&transport);
        assert_eq!(header.command_code(), Some(CommandCode::BezierMove));
        assert_eq!(header.nonce, 2000);
        assert_eq!(&action.points[..4], &[400, 401, 500, 501]);
        assert!(action.points[4..].iter().all(|&p| p == 0));
    }

    #[tokio::test]
    async fn test_clicks_share_one_command_code() {
        // Arrange
        let (client, transport) = client();

        // Act
        client.mouse_right_click().await.expect("click");
        let right: MouseAction = last_payload(&transport);
        client.all_mouse_buttons_up().await.expect("release");
        let released: MouseAction = last_payload(&transport);

        // Assert
        assert!(transport
            .headers()
            .iter()
            .all(|h| h.command_code() == Some(CommandCode::MouseLeft)));
        assert_eq!(right.buttons, MouseButtons::RIGHT);
        assert_eq!(released.buttons, MouseButtons::NONE);
    }

    #[tokio::test]
    async fn test_mouse_wheel_sets_wheel_only() {
        let (client, transport) = client();

        client.mouse_wheel(-100).await.expect("wheel");

        let action: MouseAction = last_payload(&transport);
        assert_eq!(last_header(&transport).command_code(), Some(CommandCode::MouseWheel));
        assert_eq!(action.wheel, -100);
        assert_eq!((action.x, action.y), (0, 0));
    }

    #[tokio::test]
    async fn test_keyboard_keys_down_rejects_eleven_keys_locally() {
        let (client, transport) = client();
        let keys = [HidKeyCode::KeyA; 11];

        let result = client.keyboard_keys_down(&keys, KeyboardModifiers::NONE).await;

        assert!(matches!(result, Err(ClientError::TooManyKeys { count: 11, max: 10 })));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_keyboard_keys_down_fills_slots_in_order() {
        let (client, transport) = client();

        client
            .keyboard_keys_down(
                &[HidKeyCode::ControlLeft, HidKeyCode::KeyC],
                KeyboardModifiers::LEFT_CTRL,
            )
            .await
            .expect("keys");

        let action: KeyboardAction = last_payload(&transport);
        assert_eq!(action.keys[0], HidKeyCode::ControlLeft.as_u8());
        assert_eq!(action.keys[1], HidKeyCode::KeyC.as_u8());
        assert_eq!(action.modifiers, KeyboardModifiers::LEFT_CTRL);
    }

    #[tokio::test]
    async fn test_set_config_packs_address_and_port() {
        // Arrange
        let (client, transport) = client();

        // Act
        let accepted = client
            .set_config(IpAddr::V4(Ipv4Addr::new(192, 168, 2, 130)), 8888)
            .await
            .expect("set config");

        // Assert
        assert!(accepted);
        let header = last_header(&transport);
        assert_eq!(header.command_code(), Some(CommandCode::SetConfig));
        assert_eq!(header.nonce, u32::from_le_bytes([192, 168, 2, 130]));
        let datagram = transport.requests().pop().expect("request");
        assert_eq!(&datagram[HEADER_SIZE..], &[0x22, 0xB8]);
    }

    #[tokio::test]
    async fn test_set_config_rejects_foreign_addresses_without_sending() {
        let (client, transport) = client();

        let outside = client
            .set_config(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)), 8888)
            .await;
        let v6 = client.set_config(IpAddr::V6(Ipv6Addr::LOCALHOST), 8888).await;

        assert!(matches!(outside, Err(ClientError::ConfigAddress(_))));
        assert!(matches!(v6, Err(ClientError::ConfigAddress(_))));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_masks_travel_in_nonce() {
        let (client, transport) = client();

        client
            .mask_mouse_input(MouseMasks::LEFT | MouseMasks::WHEEL)
            .await
            .expect("mask");
        client.mask_keyboard_button(HidKeyCode::KeyF).await.expect("mask");
        client.unmask_all_input().await.expect("unmask");

        let headers = transport.headers();
        assert_eq!(headers[0].command_code(), Some(CommandCode::Mask));
        assert_eq!(headers[0].nonce, 0x81);
        assert_eq!(headers[1].nonce, 0x0900);
        assert_eq!(headers[2].command_code(), Some(CommandCode::UnmaskAll));
        assert_eq!(headers[2].nonce, 0);
    }

    #[tokio::test]
    async fn test_second_listener_is_refused_until_first_stops() {
        // Arrange
        let (client, _) = client();
        let mut first = client.create_report_listener().expect("first listener");

        // Act / Assert
        assert!(matches!(client.create_report_listener(), Err(ClientError::ListenerActive)));
        first.stop().await;
        assert!(client.create_report_listener().is_ok());
    }

    #[tokio::test]
    async fn test_dropping_listener_frees_the_slot() {
        let (client, _) = client();
        let listener = client.create_report_listener().expect("listener");

        drop(listener);

        assert!(client.create_report_listener().is_ok());
    }
}
