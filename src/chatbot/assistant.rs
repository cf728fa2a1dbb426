//! HTTP client for the chat-completion services.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::chatbot::gateways::{AssistantGateway, GatewayError, Persona};

pub struct Client {
    http: reqwest::Client,
    advisor_url: String,
    gandalf_url: String,
}

#[derive(Serialize)]
struct ApiRequest<'a> {
    message: &'a str,
    model: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse {
    reply: Option<String>,
}

impl Client {
    pub fn new(advisor_url: String, gandalf_url: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http: reqwest::Client::builder().timeout(timeout).build()?,
            advisor_url,
            gandalf_url,
        })
    }

    fn url(&self, persona: Persona) -> &str {
        match persona {
            Persona::Advisor => &self.advisor_url,
            Persona::Gandalf => &self.gandalf_url,
        }
    }
}

#[async_trait]
impl AssistantGateway for Client {
    async fn ask(&self, persona: Persona, question: &str, model: &str) -> Result<String, GatewayError> {
        let request = ApiRequest {
            message: question,
            model,
        };

        let response = self
            .http
            .post(self.url(persona))
            .json(&request)
            .send()
            .await
            .map_err(|e| GatewayError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api(format!("{status}: {body}")));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))?;

        api_response
            .reply
            .filter(|r| !r.trim().is_empty())
            .ok_or(GatewayError::Empty)
    }
}
