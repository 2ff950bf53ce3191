use crate::{auth, message};

pub mod client;
pub mod context;
pub mod model;
pub mod service;
pub mod typing;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("outbound queue is full")]
    OutboxFull,
    #[error("channel is closed")]
    Closed,

    #[error(transparent)]
    _Auth(#[from] auth::Error),

    #[error(transparent)]
    _Message(#[from] message::Error),

    #[error(transparent)]
    _Ws(#[from] tokio_tungstenite::tungstenite::Error),
}
