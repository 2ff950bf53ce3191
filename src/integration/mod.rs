use std::env;
use std::fs::File;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use dotenv::dotenv;
use log::LevelFilter;
use simplelog::{ColorChoice, CombinedLogger, TermLogger, TerminalMode, WriteLogger};
use url::Url;

use crate::auth;

pub type Result<T> = std::result::Result<T, Error>;

const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api";
const DEFAULT_WS_URL: &str = "ws://127.0.0.1:8000/ws";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
const DEFAULT_NOTIFICATIONS_FILE: &str = "notifications.json";

#[derive(Clone)]
pub struct Config {
    pub api_url: Url,
    pub ws_url: Url,
    pub token: Option<auth::Token>,
    pub poll_interval: Duration,
    pub notifications_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        dotenv().ok();

        let rust_log = env::var("RUST_LOG").unwrap_or("info".into());
        let level = LevelFilter::from_str(&rust_log).unwrap_or(LevelFilter::Info);
        let log_file = env::var("SERVICE_NAME")
            .map(|pkg| format!("{pkg}.log"))
            .unwrap_or("agency_chat.log".into());

        CombinedLogger::init(vec![
            TermLogger::new(
                level,
                simplelog::Config::default(),
                TerminalMode::Mixed,
                ColorChoice::Auto,
            ),
            WriteLogger::new(
                level,
                simplelog::Config::default(),
                File::create(log_file).expect("Failed to create log file"),
            ),
        ])
        .expect("Failed to initialize logger");

        let api_url = env::var("API_URL")
            .map(|u| Url::parse(&u).expect("invalid API_URL"))
            .unwrap_or_else(|_| Url::parse(DEFAULT_API_URL).expect("default api url"));

        let ws_url = env::var("WS_URL")
            .map(|u| Url::parse(&u).expect("invalid WS_URL"))
            .unwrap_or_else(|_| Url::parse(DEFAULT_WS_URL).expect("default ws url"));

        let token = env::var("AUTH_TOKEN").ok().map(auth::Token::new);

        let poll_interval = env::var("POLL_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS));

        let notifications_file = env::var("NOTIFICATIONS_FILE")
            .map(PathBuf::from)
            .unwrap_or(PathBuf::from(DEFAULT_NOTIFICATIONS_FILE));

        Self {
            api_url,
            ws_url,
            token,
            poll_interval,
            notifications_file,
        }
    }
}

// Timeouts stay on transport defaults; the source app configures none either.
pub fn init_http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder().build().map_err(Error::from)
}

#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub enum Error {
    _Reqwest(#[from] reqwest::Error),
    _Url(#[from] url::ParseError),
}
