//! Content-addressed locators returned by the pinning service.

use serde::{Deserialize, Serialize};

const IPFS_SCHEME: &str = "ipfs://";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    cid: String,
}

impl Locator {
    pub fn new(cid: impl Into<String>) -> Self {
        Self {
            cid: cid.into().trim().to_string(),
        }
    }

    /// Parse an `ipfs://<cid>` URI.
    pub fn from_uri(uri: &str) -> Option<Self> {
        uri.strip_prefix(IPFS_SCHEME)
            .filter(|cid| !cid.trim().is_empty())
            .map(Self::new)
    }

    pub fn cid(&self) -> &str {
        &self.cid
    }

    /// `ipfs://<cid>`, the form embedded in metadata documents.
    pub fn uri(&self) -> String {
        format!("{IPFS_SCHEME}{}", self.cid)
    }

    /// HTTP URL through a public gateway: plain concatenation of host path and cid.
    pub fn gateway_url(&self, gateway: &str) -> String {
        if gateway.ends_with('/') {
            format!("{gateway}{}", self.cid)
        } else {
            format!("{gateway}/{}", self.cid)
        }
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{IPFS_SCHEME}{}", self.cid)
    }
}
