//! Telegram Bot API transport.
//!
//! Covers exactly what registration needs: sendMessage, getUserProfilePhotos,
//! getFile plus the file-download endpoint, and a getUpdates long-polling
//! loop feeding the registrar.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, warn};

use crate::registration::Registrar;
use crate::transport::{ChatTransport, IncomingMessage, PhotoSize, Profile};

const POLL_TIMEOUT_SECS: u64 = 25;

pub struct Telegram {
    http: reqwest::Client,
    token: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    from: Option<User>,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct User {
    id: i64,
    username: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserProfilePhotos {
    photos: Vec<Vec<TgPhotoSize>>,
}

#[derive(Debug, Deserialize)]
struct TgPhotoSize {
    file_id: String,
    width: u32,
    height: u32,
}

#[derive(Debug, Deserialize)]
struct File {
    file_path: Option<String>,
}

impl Telegram {
    pub fn new(token: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            token,
        }
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        body: serde_json::Value,
    ) -> Result<T> {
        let url = format!("https://api.telegram.org/bot{}/{}", self.token, method);
        let resp: ApiResponse<T> = self
            .http
            .post(&url)
            .json(&body)
            .timeout(Duration::from_secs(POLL_TIMEOUT_SECS + 30))
            .send()
            .await?
            .json()
            .await?;

        if !resp.ok {
            bail!(
                "telegram {} failed: {}",
                method,
                resp.description.unwrap_or_else(|| "no description".into())
            );
        }
        resp.result
            .ok_or_else(|| anyhow!("telegram {} returned no result", method))
    }

    async fn get_updates(&self, offset: i64) -> Result<Vec<Update>> {
        self.call(
            "getUpdates",
            json!({
                "offset": offset,
                "timeout": POLL_TIMEOUT_SECS,
                "allowed_updates": ["message"],
            }),
        )
        .await
    }
}

#[async_trait]
impl ChatTransport for Telegram {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        let _: serde_json::Value = self
            .call("sendMessage", json!({ "chat_id": chat_id, "text": text }))
            .await?;
        Ok(())
    }

    async fn profile_photos(&self, user_id: i64) -> Result<Vec<Vec<PhotoSize>>> {
        let photos: UserProfilePhotos = self
            .call("getUserProfilePhotos", json!({ "user_id": user_id }))
            .await?;
        Ok(photos
            .photos
            .into_iter()
            .map(|set| {
                set.into_iter()
                    .map(|p| PhotoSize {
                        file_id: p.file_id,
                        width: p.width,
                        height: p.height,
                    })
                    .collect()
            })
            .collect())
    }

    async fn download_file(&self, file_id: &str) -> Result<(String, Vec<u8>)> {
        let file: File = self.call("getFile", json!({ "file_id": file_id })).await?;
        let file_path = file
            .file_path
            .ok_or_else(|| anyhow!("telegram getFile returned no file_path"))?;

        let url = format!(
            "https://api.telegram.org/file/bot{}/{}",
            self.token, file_path
        );
        let resp = self.http.get(&url).send().await?.error_for_status()?;
        let bytes = resp.bytes().await?.to_vec();

        let filename = file_path
            .rsplit('/')
            .next()
            .unwrap_or(file_path.as_str())
            .to_string();
        Ok((filename, bytes))
    }
}

/// Long-poll getUpdates forever, handing each text message to the registrar.
/// A failed handler is logged and polling continues with the next update; a
/// failed poll backs the loop off for a few seconds.
pub async fn run_polling(transport: Arc<Telegram>, registrar: Arc<Registrar>) {
    let mut offset = 0i64;
    loop {
        let updates = match transport.get_updates(offset).await {
            Ok(updates) => updates,
            Err(err) => {
                warn!(error = %err, "getUpdates failed, backing off");
                tokio::time::sleep(Duration::from_secs(5)).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);

            let Some(message) = update.message else { continue };
            let (Some(from), Some(text)) = (message.from, message.text) else {
                continue;
            };

            let msg = IncomingMessage {
                from: Profile {
                    chat_id: from.id,
                    username: from.username,
                    first_name: from.first_name,
                    last_name: from.last_name,
                },
                text,
            };

            debug!(chat_id = msg.from.chat_id, "handling inbound message");
            if let Err(err) = registrar.handle(transport.as_ref(), &msg).await {
                error!(chat_id = msg.from.chat_id, error = %err, "registration handler failed");
            }
        }
    }
}
