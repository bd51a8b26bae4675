//! Real-time chat relay that translates every message into each
//! recipient's language before delivery.

pub mod config;
pub mod i18n;
pub mod provider;
pub mod relay;
pub mod server;
pub mod translation;
