use rusqlite::{Connection, OptionalExtension};

use crate::models::{AccountRow, NewAccount};
use crate::{Database, Result, StoreError};

const ACCOUNT_COLUMNS: &str =
    "id, chat_id, email, password, username, first_name, last_name, image, created_at";

impl Database {
    /// Insert a new account and return its generated id.
    ///
    /// Accounts are write-once: there is no update path, only `delete_account`.
    /// A collision on any of the unique columns (chat_id, email, username)
    /// surfaces as `StoreError::Duplicate`.
    pub fn create_account(&self, account: &NewAccount) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO accounts (chat_id, email, password, username, first_name, last_name, image)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    account.chat_id,
                    account.email,
                    account.password_hash,
                    account.username,
                    account.first_name,
                    account.last_name,
                    account.image,
                ],
            )
            .map_err(map_constraint)?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn find_by_email(&self, email: &str) -> Result<Option<AccountRow>> {
        self.with_conn(|conn| query_account(conn, "email = ?1", &[&email]))
    }

    pub fn find_by_username(&self, username: &str) -> Result<Option<AccountRow>> {
        self.with_conn(|conn| query_account(conn, "username = ?1", &[&username]))
    }

    pub fn find_by_id(&self, id: i64) -> Result<Option<AccountRow>> {
        self.with_conn(|conn| query_account(conn, "id = ?1", &[&id]))
    }

    /// Remove an account row. Returns true when a row was actually deleted.
    pub fn delete_account(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM accounts WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }
}

fn map_constraint(err: rusqlite::Error) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            StoreError::Duplicate
        }
        _ => StoreError::Sqlite(err),
    }
}

fn query_account(
    conn: &Connection,
    filter: &str,
    params: &[&dyn rusqlite::types::ToSql],
) -> Result<Option<AccountRow>> {
    let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE {filter}");
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row(params, |row| {
            Ok(AccountRow {
                id: row.get(0)?,
                chat_id: row.get(1)?,
                email: row.get(2)?,
                password: row.get(3)?,
                username: row.get(4)?,
                first_name: row.get(5)?,
                last_name: row.get(6)?,
                image: row.get(7)?,
                created_at: row.get(8)?,
            })
        })
        .optional()?;

    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(chat_id: i64, email: &str, username: &str) -> NewAccount {
        NewAccount {
            chat_id,
            email: email.to_string(),
            password_hash: "$argon2id$fake".to_string(),
            username: username.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            image: None,
        }
    }

    #[test]
    fn create_and_find() {
        let db = Database::open_in_memory().unwrap();
        let id = db.create_account(&sample(555, "foo@bar.com", "foo")).unwrap();

        let by_email = db.find_by_email("foo@bar.com").unwrap().unwrap();
        assert_eq!(by_email.id, id);
        assert_eq!(by_email.chat_id, 555);
        assert_eq!(by_email.username, "foo");

        let by_username = db.find_by_username("foo").unwrap().unwrap();
        assert_eq!(by_username.id, id);

        let by_id = db.find_by_id(id).unwrap().unwrap();
        assert_eq!(by_id.email, "foo@bar.com");

        assert!(db.find_by_email("nobody@bar.com").unwrap().is_none());
    }

    #[test]
    fn duplicate_chat_id_rejected_even_with_fresh_email() {
        let db = Database::open_in_memory().unwrap();
        db.create_account(&sample(555, "foo@bar.com", "foo")).unwrap();

        let err = db
            .create_account(&sample(555, "other@bar.com", "other"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate));

        // No partial row left behind.
        assert!(db.find_by_email("other@bar.com").unwrap().is_none());
    }

    #[test]
    fn duplicate_email_and_username_rejected() {
        let db = Database::open_in_memory().unwrap();
        db.create_account(&sample(1, "foo@bar.com", "foo")).unwrap();

        let err = db.create_account(&sample(2, "foo@bar.com", "bar")).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate));

        let err = db.create_account(&sample(3, "baz@bar.com", "foo")).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate));
    }

    #[test]
    fn delete_account_reports_removal() {
        let db = Database::open_in_memory().unwrap();
        let id = db.create_account(&sample(9, "a@b.c", "a")).unwrap();

        assert!(db.delete_account(id).unwrap());
        assert!(db.find_by_id(id).unwrap().is_none());
        assert!(!db.delete_account(id).unwrap());
    }
}
