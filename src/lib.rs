//! WhatsApp gateway: a small HTTP façade over a WhatsApp messaging client.
//!
//! Outbound: HTTP request → handler → messaging client.
//! Inbound: messaging client event → adapter → downstream webhook.
//!
//! The protocol itself lives in a bridge sidecar; see [`whatsapp`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod adapter;
pub mod api;
pub mod config;
pub mod logging;
pub mod qr;
pub mod webhook;
pub mod whatsapp;
