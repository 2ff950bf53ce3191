use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // never print the raw token
        write!(f, "Token(****)")
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("auth token is missing")]
    MissingToken,
    #[error("auth token is not a valid header value")]
    InvalidToken,
}
