pub mod auth;
pub mod conversation;
pub mod event;
pub mod integration;
pub mod message;
pub mod notification;
pub mod state;
