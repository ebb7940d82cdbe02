//! The chat-transport seam.
//!
//! The registration driver only ever talks to this trait; the real Telegram
//! client lives in `telegram.rs` and tests substitute a scripted mock.

use async_trait::async_trait;

/// One size variant of a profile photo.
#[derive(Debug, Clone)]
pub struct PhotoSize {
    pub file_id: String,
    pub width: u32,
    pub height: u32,
}

/// What the transport knows about the sender of a message.
#[derive(Debug, Clone)]
pub struct Profile {
    /// The platform's stable id for this participant.
    pub chat_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// An inbound message delivered to the registration driver.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub from: Profile,
    pub text: String,
}

#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_message(&self, chat_id: i64, text: &str) -> anyhow::Result<()>;

    /// The participant's profile photos: outer list newest-first, inner list
    /// of size variants with the largest last.
    async fn profile_photos(&self, user_id: i64) -> anyhow::Result<Vec<Vec<PhotoSize>>>;

    /// Fetch a file's bytes by id. Also returns the remote filename, which
    /// feeds into the on-disk photo name.
    async fn download_file(&self, file_id: &str) -> anyhow::Result<(String, Vec<u8>)>;
}
