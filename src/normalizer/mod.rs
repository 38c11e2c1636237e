pub mod derive;

use feed_rs::parser;

use crate::app::{AppError, Result};
use crate::domain::RemoteFeed;

/// Adapter over `feed-rs`: raw RSS 0.9x/1.0/2.0, Atom or JSON Feed bytes in,
/// structured [`RemoteFeed`] out. Entity mapping lives on the domain types.
#[derive(Clone)]
pub struct Normalizer;

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, body: &[u8]) -> Result<RemoteFeed> {
        parser::parse(body).map_err(|e| AppError::FeedParse(e.to_string()))
    }
}
