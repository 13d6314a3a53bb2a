use log::{error, info};

use crate::client::transport::Transport;
use crate::client::{endpoint, ClientError};
use crate::data::{decode_star_payload, DecodePolicy, StarPayload};
use crate::StarRecord;

/// Fetches the stars surrounding a named planet from the backend.
#[derive(Debug, Clone)]
pub struct StarClient<T> {
    transport: T,
    base_url: String,
    policy: DecodePolicy,
}

impl<T: Transport> StarClient<T> {
    pub fn new(transport: T, base_url: impl Into<String>, policy: DecodePolicy) -> Self {
        StarClient {
            transport,
            base_url: base_url.into(),
            policy,
        }
    }

    /// Star records for `planet_name`, defaults applied.
    pub async fn fetch_stars(&self, planet_name: &str) -> Result<Vec<StarRecord>, ClientError> {
        self.fetch_payload(planet_name).await.map(|p| p.stars)
    }

    /// Full payload, including the host planet entries.
    ///
    /// Blank names are rejected before any request is issued.
    pub async fn fetch_payload(&self, planet_name: &str) -> Result<StarPayload, ClientError> {
        let planet = planet_name.trim();
        if planet.is_empty() {
            return Err(ClientError::EmptyInput);
        }
        let result = self.request(planet).await;
        match &result {
            Ok(payload) => info!("fetched {} stars for {planet}", payload.stars.len()),
            Err(e) => error!("error fetching star data for {planet}: {e}"),
        }
        result
    }

    async fn request(&self, planet: &str) -> Result<StarPayload, ClientError> {
        let url = endpoint(&self.base_url, &["fetch-stars", planet])?;
        let reply = self.transport.get(&url).await?.error_for_status()?;
        Ok(decode_star_payload(&reply.body, &self.policy)?)
    }
}
