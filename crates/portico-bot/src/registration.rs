//! The registration driver: glues the pure state machine to the conversation
//! store, the chat transport, the photo store, and the account table.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use portico_db::models::NewAccount;
use portico_db::{Database, StoreError};

use crate::photos::PhotoStore;
use crate::state::{self, Effect, Reply};
use crate::store::ConversationStore;
use crate::transport::{ChatTransport, IncomingMessage, Profile};

pub struct Registrar {
    db: Arc<Database>,
    store: Arc<dyn ConversationStore>,
    photos: PhotoStore,
}

impl Registrar {
    pub fn new(db: Arc<Database>, store: Arc<dyn ConversationStore>, photos: PhotoStore) -> Self {
        Self { db, store, photos }
    }

    /// Process one inbound message for its sender's conversation.
    ///
    /// The step transition is committed to the store before any effect runs,
    /// so a failing account creation still leaves the conversation cleared;
    /// the next `/register` starts fresh. Errors propagate to the polling
    /// loop, which logs them and moves on.
    pub async fn handle(
        &self,
        transport: &dyn ChatTransport,
        msg: &IncomingMessage,
    ) -> Result<()> {
        let chat_id = msg.from.chat_id;
        let (next, effects) = state::advance(self.store.get(chat_id), &msg.text);
        match next {
            Some(step) => self.store.set(chat_id, step),
            None => self.store.clear(chat_id),
        }

        for effect in effects {
            match effect {
                Effect::Reply(reply) => {
                    transport.send_message(chat_id, reply.text()).await?;
                }
                Effect::CreateAccount { email, password } => {
                    match self.create_account(transport, &msg.from, &email, &password).await {
                        Ok(id) => {
                            info!(chat_id, account_id = id, "registered new account");
                            transport
                                .send_message(chat_id, Reply::Registered.text())
                                .await?;
                        }
                        Err(err) => {
                            // The coarse "already registered" reply covers
                            // every duplicate cause; other failures stay
                            // silent on the chat side.
                            if matches!(
                                err.downcast_ref::<StoreError>(),
                                Some(StoreError::Duplicate)
                            ) {
                                transport
                                    .send_message(chat_id, Reply::AlreadyRegistered.text())
                                    .await?;
                            }
                            return Err(err);
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// The account-creation sub-procedure. Photo retrieval is deliberately
    /// separate from the insert so a duplicate-key failure never re-downloads
    /// anything and each half can be tested on its own.
    async fn create_account(
        &self,
        transport: &dyn ChatTransport,
        profile: &Profile,
        email: &str,
        password: &str,
    ) -> Result<i64> {
        let image = self.photos.save_profile_photo(transport, profile.chat_id).await?;
        let password_hash = portico_credentials::hash_password(password)?;

        let account = NewAccount {
            chat_id: profile.chat_id,
            email: email.to_string(),
            password_hash,
            username: profile
                .username
                .clone()
                .unwrap_or_else(|| profile.chat_id.to_string()),
            first_name: profile.first_name.clone().unwrap_or_default(),
            last_name: profile.last_name.clone().unwrap_or_default(),
            image,
        };

        let id = self.db.create_account(&account)?;
        Ok(id)
    }
}
