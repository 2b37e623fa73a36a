//! HTTP client for the backend, used by the chat front end.

use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::routes::{
    AuthResponse, CredentialsRequest, ExplainRequest, ExplainResponse, GrantResponse,
    ProblemRequest, PurchaseRequest, PurchaseResponse, UserRequest,
};
use crate::tutor::{GeneratedProblem, LearningContext};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    /// Non-2xx answer. `message` is the server's `{"message"}` when present.
    #[error("{message} ({status})")]
    Api { status: u16, message: String },
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
        }
    }
}

#[derive(Deserialize)]
struct MessageBody {
    message: String,
}

pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(150)).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "POST");

        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let text = response.text().await.unwrap_or_default();
        Err(ClientError::Api {
            status: status.as_u16(),
            message: server_message(status, &text),
        })
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<AuthResponse, ClientError> {
        self.post("/api/users/register", &credentials(username, password)).await
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<AuthResponse, ClientError> {
        self.post("/api/users/login", &credentials(username, password)).await
    }

    pub async fn update_progress(&self, user_id: u64) -> Result<GrantResponse, ClientError> {
        let body = UserRequest {
            user_id: Some(user_id),
        };
        self.post("/api/user/update-progress", &body).await
    }

    pub async fn easter_egg(&self, user_id: u64) -> Result<GrantResponse, ClientError> {
        let body = UserRequest {
            user_id: Some(user_id),
        };
        self.post("/api/user/easter-egg", &body).await
    }

    pub async fn buy(
        &self,
        user_id: u64,
        item_name: &str,
        item_cost: u64,
    ) -> Result<PurchaseResponse, ClientError> {
        let body = PurchaseRequest {
            user_id: Some(user_id),
            item_name: Some(item_name.to_string()),
            item_cost: Some(item_cost),
        };
        self.post("/api/shop/buy", &body).await
    }

    pub async fn explain(
        &self,
        question: &str,
        context: &LearningContext,
    ) -> Result<String, ClientError> {
        let body = ExplainRequest {
            question: Some(question.to_string()),
            context: Some(context.clone()),
        };
        let res: ExplainResponse = self.post("/api/explain", &body).await?;
        Ok(res.explanation)
    }

    pub async fn generate_problem(
        &self,
        context: &LearningContext,
    ) -> Result<GeneratedProblem, ClientError> {
        let body = ProblemRequest {
            context: Some(context.clone()),
        };
        self.post("/api/generate-problem", &body).await
    }
}

fn credentials(username: &str, password: &str) -> CredentialsRequest {
    CredentialsRequest {
        username: username.to_string(),
        password: password.to_string(),
    }
}

fn server_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<MessageBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        })
}
