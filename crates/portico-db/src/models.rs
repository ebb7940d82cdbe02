/// Database row types — these map directly to SQLite rows.
/// The web and bot crates consume these instead of defining their own copies.

#[derive(Debug, Clone)]
pub struct AccountRow {
    pub id: i64,
    pub chat_id: i64,
    pub email: String,
    /// Argon2id PHC string, never the plaintext.
    pub password: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub image: Option<String>,
    pub created_at: String,
}

/// Everything needed to insert a new account. The internal id is assigned
/// by the database.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub chat_id: i64,
    pub email: String,
    pub password_hash: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub image: Option<String>,
}
