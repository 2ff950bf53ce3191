pub mod model;
pub mod repository;
pub mod service;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub enum Error {
    _Reqwest(#[from] reqwest::Error),
    _Url(#[from] url::ParseError),
}
