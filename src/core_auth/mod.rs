//! Flat-file account store and credential checking.
//!
//! The account file holds one `login password` pair per line, whitespace
//! separated, no comments. It is loaded once at startup and shared
//! read-only across sessions.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AccountsError {
    #[error("cannot read accounts file {path}: {source}")]
    Unreadable {
        path: String,
        source: std::io::Error,
    },

    #[error("accounts file bad format: expected `<login> <password>` at line {line}")]
    MalformedRecord { line: usize },
}

/// Outcome of checking one credential pair against the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    Accepted,
    UnknownUser,
    BadPassword,
}

#[derive(Debug, Default)]
pub struct AccountStore {
    accounts: HashMap<String, String>,
}

impl AccountStore {
    pub fn load(path: &Path) -> Result<Self, AccountsError> {
        let text = fs::read_to_string(path).map_err(|source| AccountsError::Unreadable {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, AccountsError> {
        let mut accounts = HashMap::new();
        for (idx, line) in text.lines().enumerate() {
            let mut fields = line.split_whitespace();
            match (fields.next(), fields.next(), fields.next()) {
                (Some(login), Some(password), None) => {
                    accounts.insert(login.to_string(), password.to_string());
                }
                _ => return Err(AccountsError::MalformedRecord { line: idx + 1 }),
            }
        }
        Ok(AccountStore { accounts })
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn contains(&self, username: &str) -> bool {
        self.accounts.contains_key(username)
    }

    /// Pure credential check; throttling lives with the session.
    pub fn authenticate(&self, username: &str, password: &str) -> AuthOutcome {
        match self.accounts.get(username) {
            None => AuthOutcome::UnknownUser,
            Some(stored) if stored == password => AuthOutcome::Accepted,
            Some(_) => AuthOutcome::BadPassword,
        }
    }
}
