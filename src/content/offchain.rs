use std::time::Duration;

use url::Url;

use super::JettonMetadata;

const IPFS_SCHEME: &str = "ipfs://";

pub struct OffchainFetcher {
    client: reqwest::Client,
    ipfs_gateway: String,
}

impl OffchainFetcher {
    pub fn new(ipfs_gateway: &Url, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::Network)?;

        Ok(Self {
            client,
            ipfs_gateway: ipfs_gateway.to_string(),
        })
    }

    /// Replaces `ipfs://` with the configured http gateway
    pub fn resolve_uri(&self, uri: &str) -> String {
        uri.replacen(IPFS_SCHEME, &self.ipfs_gateway, 1)
    }

    /// Fetches metadata json. Failures are logged and never retried.
    pub async fn fetch(&self, uri: &str) -> Option<JettonMetadata> {
        match self.try_fetch(uri).await {
            Ok(metadata) => Some(metadata),
            Err(e @ (FetchError::Json(_) | FetchError::NotAnObject)) => {
                tracing::warn!(uri, "invalid metadata json: {e}");
                None
            }
            Err(e) => {
                tracing::warn!(uri, "failed to fetch metadata: {e}");
                None
            }
        }
    }

    async fn try_fetch(&self, uri: &str) -> Result<JettonMetadata, FetchError> {
        let response = self
            .client
            .get(uri)
            .send()
            .await
            .map_err(FetchError::Network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(FetchError::Network)?;
        let value = serde_json::from_slice::<serde_json::Value>(&body)?;
        tracing::debug!(uri, "fetched metadata json");

        JettonMetadata::from_json(&value).ok_or(FetchError::NotAnObject)
    }
}

/// Matches `(^|/)ipfs[.:]`
pub fn is_ipfs_uri(uri: &str) -> bool {
    let bytes = uri.as_bytes();
    uri.match_indices("ipfs").any(|(i, _)| {
        let starts = i == 0 || bytes[i - 1] == b'/';
        let ends = matches!(bytes.get(i + 4), Some(b'.' | b':'));
        starts && ends
    })
}

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),
    #[error("unexpected status code: {0}")]
    Status(u16),
    #[error("invalid json")]
    Json(#[from] serde_json::Error),
    #[error("metadata is not an object")]
    NotAnObject,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{
        build_offchain_metadata, read_metadata, MetadataKey, PersistenceType,
    };

    const UNREACHABLE_GATEWAY: &str = "http://127.0.0.1:1/ipfs/";

    fn offline_fetcher() -> OffchainFetcher {
        OffchainFetcher::new(
            &Url::parse(UNREACHABLE_GATEWAY).unwrap(),
            Duration::from_secs(2),
        )
        .unwrap()
    }

    #[test]
    fn ipfs_uri_pattern() {
        assert!(is_ipfs_uri("ipfs://QmHash"));
        assert!(is_ipfs_uri("https://ipfs.io/ipfs/QmHash"));
        assert!(is_ipfs_uri("https://cloudflare-ipfs.com/ipfs.json"));
        assert!(!is_ipfs_uri("https://example.com/ipfs/QmHash"));
        assert!(!is_ipfs_uri("https://myipfs.com/meta.json"));
        assert!(!is_ipfs_uri("https://example.com/meta.json"));
    }

    #[test]
    fn ipfs_scheme_is_rewritten() {
        let fetcher = OffchainFetcher::new(
            &Url::parse("https://ipfs.io/ipfs/").unwrap(),
            Duration::from_secs(1),
        )
        .unwrap();

        assert_eq!(
            fetcher.resolve_uri("ipfs://QmHash/meta.json"),
            "https://ipfs.io/ipfs/QmHash/meta.json"
        );
        assert_eq!(
            fetcher.resolve_uri("https://example.com/meta.json"),
            "https://example.com/meta.json"
        );
    }

    #[test]
    fn json_projection() {
        let value = serde_json::json!({
            "name": "Token",
            "decimals": 9,
            "image": "https://example.com/logo.png",
            "attributes": [],
            "symbol": null,
        });

        let metadata = JettonMetadata::from_json(&value).unwrap();
        assert_eq!(metadata.get(MetadataKey::Name), Some("Token"));
        assert_eq!(metadata.get(MetadataKey::Decimals), Some("9"));
        assert_eq!(metadata.get(MetadataKey::Symbol), None);
        assert_eq!(metadata.len(), 3);

        assert!(JettonMetadata::from_json(&serde_json::json!("text")).is_none());
    }

    #[tokio::test]
    async fn unreachable_private_domain_yields_no_metadata() {
        let cell = build_offchain_metadata("http://127.0.0.1:1/meta.json").unwrap();

        let content = read_metadata(&cell, &offline_fetcher()).await.unwrap();
        assert_eq!(content.persistence_type, PersistenceType::OffchainPrivateDomain);
        assert!(content.metadata.is_none());
        assert_eq!(
            content.content_uri.as_deref(),
            Some("http://127.0.0.1:1/meta.json")
        );
    }

    #[tokio::test]
    async fn unreachable_ipfs_yields_no_metadata() {
        let cell = build_offchain_metadata("ipfs://QmHash/meta.json").unwrap();

        let content = read_metadata(&cell, &offline_fetcher()).await.unwrap();
        assert_eq!(content.persistence_type, PersistenceType::OffchainIpfs);
        assert!(content.metadata.is_none());
        assert_eq!(
            content.content_uri.as_deref(),
            Some("http://127.0.0.1:1/ipfs/QmHash/meta.json")
        );
    }
}
