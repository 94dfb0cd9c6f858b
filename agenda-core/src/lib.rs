//! Client library for the meeting agenda.
//!
//! - `calendar`: visible days, fetch window and navigation
//! - `session` and `gateway`: bearer-token session and the HTTP API
//! - `repository`: the cached, filtered meeting list for the visible window
//! - `resolve`: backend records to display meetings and back
//! - `admin`: user account management

pub mod admin;
pub mod calendar;
pub mod config;
pub mod constants;
pub mod error;
pub mod filter;
pub mod gateway;
pub mod location;
pub mod meeting;
pub mod repository;
pub mod resolve;
pub mod session;
pub mod user;
pub mod wire;

pub use error::{AgendaError, AgendaResult};
