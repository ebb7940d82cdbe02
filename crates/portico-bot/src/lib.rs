//! Chat-bot registration for Portico.
//!
//! Inbound chat messages drive a two-step conversation per participant
//! (email, then password); completion downloads the participant's profile
//! photo and inserts the account row that the web side authenticates
//! against.

pub mod photos;
pub mod registration;
pub mod state;
pub mod store;
pub mod telegram;
pub mod transport;

pub use photos::PhotoStore;
pub use registration::Registrar;
pub use store::{ConversationStore, MemoryStore};
pub use telegram::{Telegram, run_polling};
