pub mod model;
pub mod repository;
pub mod service;

pub type Result<T> = std::result::Result<T, Error>;

pub const CAPACITY: usize = 50;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    _Io(#[from] std::io::Error),

    #[error(transparent)]
    _ParseJson(#[from] serde_json::Error),
}
