//! # HTTP Client
//!
//! Typed access to a running zkvote service. Non-2xx answers are decoded
//! from the service's `{ "error": { "code", "message" } }` body.

use std::time::Duration;

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;
use zkvote_api::error::ErrorBody;
use zkvote_api::routes::ballots::{BallotView, PoolView};
use zkvote_api::routes::voters::IDEMPOTENCY_HEADER;
use zkvote_ballot::BallotSpec;
use zkvote_core::{CredentialDigest, VoterHandle};
use zkvote_crypto::VoterSecret;
use zkvote_orchestrator::VoteReceipt;
use zkvote_registry::RegistrationResult;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("request to {endpoint} failed: {source}")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} answered {status}: {code}: {message}")]
    Api {
        endpoint: String,
        status: u16,
        code: String,
        message: String,
    },

    #[error("could not decode the response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("this command needs an admin token (--admin-token or ZKVOTE_ADMIN_TOKEN)")]
    MissingAdminToken,
}

impl ClientError {
    /// The service's error code, when the service answered.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => Some(code),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct ZkvoteClient {
    http: reqwest::Client,
    base_url: String,
    admin_token: Option<String>,
}

impl std::fmt::Debug for ZkvoteClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZkvoteClient")
            .field("base_url", &self.base_url)
            .field("admin_token", &self.admin_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl ZkvoteClient {
    pub fn new(base_url: &str, admin_token: Option<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| ClientError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            admin_token,
        })
    }

    fn admin_header(&self) -> Result<String, ClientError> {
        self.admin_token
            .as_ref()
            .map(|t| format!("Bearer {t}"))
            .ok_or(ClientError::MissingAdminToken)
    }

    pub async fn register(
        &self,
        identity: &str,
        public_key: &str,
        idempotency_key: Option<&str>,
    ) -> Result<RegistrationResult, ClientError> {
        let endpoint = "POST /v1/voters";
        let mut request = self
            .http
            .post(format!("{}/v1/voters", self.base_url))
            .json(&json!({ "identity": identity, "public_key": public_key }));
        if let Some(key) = idempotency_key {
            request = request.header(IDEMPOTENCY_HEADER, key);
        }
        let resp = request.send().await.map_err(|e| ClientError::Http {
            endpoint: endpoint.into(),
            source: e,
        })?;
        decode(endpoint, resp).await
    }

    pub async fn create_ballot(&self, spec: &BallotSpec) -> Result<BallotView, ClientError> {
        let endpoint = "POST /v1/ballots";
        let auth = self.admin_header()?;
        let resp = self
            .http
            .post(format!("{}/v1/ballots", self.base_url))
            .header(reqwest::header::AUTHORIZATION, auth)
            .json(spec)
            .send()
            .await
            .map_err(|e| ClientError::Http {
                endpoint: endpoint.into(),
                source: e,
            })?;
        decode(endpoint, resp).await
    }

    pub async fn ballot(&self, id: u64) -> Result<BallotView, ClientError> {
        self.get(&format!("/v1/ballots/{id}")).await
    }

    pub async fn pool(&self, id: u64) -> Result<PoolView, ClientError> {
        self.get(&format!("/v1/ballots/{id}/pool")).await
    }

    /// Cast a vote with a freshly generated blinding secret.
    pub async fn cast_vote(
        &self,
        ballot_id: u64,
        voter_handle: &VoterHandle,
        credential_digest: &CredentialDigest,
        option: &str,
    ) -> Result<VoteReceipt, ClientError> {
        let endpoint = format!("POST /v1/ballots/{ballot_id}/votes");
        let secret = VoterSecret::generate().to_hex();
        let resp = self
            .http
            .post(format!("{}/v1/ballots/{ballot_id}/votes", self.base_url))
            .json(&json!({
                "voter_handle": voter_handle,
                "credential_digest": credential_digest,
                "option": option,
                "voter_secret": secret.as_str(),
            }))
            .send()
            .await
            .map_err(|e| ClientError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;
        decode(&endpoint, resp).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let endpoint = format!("GET {path}");
        let resp = self
            .http
            .get(format!("{}{path}", self.base_url))
            .send()
            .await
            .map_err(|e| ClientError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;
        decode(&endpoint, resp).await
    }
}

async fn decode<T: DeserializeOwned>(endpoint: &str, resp: Response) -> Result<T, ClientError> {
    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        let (code, message) = match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => (body.error.code, body.error.message),
            Err(_) => (fallback_code(status).to_string(), text),
        };
        return Err(ClientError::Api {
            endpoint: endpoint.into(),
            status: status.as_u16(),
            code,
            message,
        });
    }
    resp.json().await.map_err(|e| ClientError::Decode {
        endpoint: endpoint.into(),
        source: e,
    })
}

fn fallback_code(status: StatusCode) -> &'static str {
    match status {
        StatusCode::NOT_FOUND => "NOT_FOUND",
        StatusCode::BAD_REQUEST => "BAD_REQUEST",
        _ => "UNEXPECTED_RESPONSE",
    }
}
