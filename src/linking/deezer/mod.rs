//! Deezer API integration
//!
//! Streaming catalog: tracks are found by ISRC or by an advanced search.
//! Candidates carry the Deezer track id, a deep link, the ISRC when known,
//! the catalog rank (used to break score ties) and BPM.
//!
//! API docs: https://developers.deezer.com/api

pub mod dto;
mod adapter;
mod client;

pub use adapter::{search_query, to_candidate};
pub use client::{DEFAULT_BASE_URL, DeezerClient};
