//! Telegram front-end for the Jaadui Pitara story and activity services.

pub mod api;
pub mod callback;
pub mod config;
pub mod dispatch;
pub mod handlers;
pub mod i18n;
pub mod polling;
pub mod session;
pub mod telegram;
pub mod telemetry;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;
pub mod webhook;
