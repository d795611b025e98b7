//! UploadImage use case: draws a full frame on the device LCD.
//!
//! The 40 960-byte frame goes out as 40 show-picture commands in line order.
//! Each line must be acknowledged before the next is sent; the first rejected
//! line ends the upload.

use kmbox_core::protocol::messages::CommandCode;
use kmbox_core::ScreenImage;
use tracing::{debug, warn};

use crate::application::dispatch::{CommandDispatcher, Nonce};
use crate::error::ClientError;

/// Uploads `frame` (RGB565, 128×160) to the LCD.
///
/// Returns `Ok(false)` if the device rejects any line.
///
/// # Errors
///
/// Returns [`ClientError::ImageSize`] before sending anything if `frame` is not
/// exactly 40 960 bytes, or any dispatcher error.
pub async fn upload_image(dispatcher: &CommandDispatcher, frame: &[u8]) -> Result<bool, ClientError> {
    let image = ScreenImage::new(frame)?;

    for (line_nonce, line) in image.lines() {
        let accepted = dispatcher
            .execute_with(CommandCode::ShowPicture, Nonce::Value(line_nonce), &line)
            .await?;
        if !accepted {
            warn!(line = line_nonce / 4, "device rejected image line; upload aborted");
            return Ok(false);
        }
    }
    debug!("image upload complete");
    Ok(true)
}
