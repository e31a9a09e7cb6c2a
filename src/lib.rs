//! `skypeshell`: a terminal viewer for exported Skype chat history.
//!
//! This crate provides the core library for loading a `messages.json`
//! export, paging through conversations, searching every message with
//! filters and a result cache, exporting single conversations, and
//! computing archive statistics.

pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod parser;
pub mod search;
pub mod stats;
pub mod view;
