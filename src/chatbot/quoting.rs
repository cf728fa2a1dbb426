//! HTTP client for the quoting service.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::chatbot::gateways::{
    AgentAssignment, BeneficiaryRequest, DocumentLink, GatewayError, QuoteRequest, QuotingGateway,
};

/// Placeholder for the quotation id in URL templates.
const ID_PLACEHOLDER: &str = "{id}";

/// Endpoints of the quoting service.
#[derive(Debug, Clone)]
pub struct QuotingEndpoints {
    pub quote_url: String,
    pub beneficiary_url: String,
    pub assign_url: String,
    /// Triggers rendering; contains `{id}`.
    pub render_url: String,
    /// Where the rendered document is served; contains `{id}`.
    pub document_url: String,
}

pub struct HttpQuotingGateway {
    http: reqwest::Client,
    endpoints: QuotingEndpoints,
}

impl HttpQuotingGateway {
    pub fn new(endpoints: QuotingEndpoints, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http: reqwest::Client::builder().timeout(timeout).build()?,
            endpoints,
        })
    }

    /// Post a form and read the `id` of the created record.
    async fn post_form(&self, url: &str, form: &[(&str, String)]) -> Result<String, GatewayError> {
        let response = self
            .http
            .post(url)
            .form(form)
            .send()
            .await
            .map_err(|e| GatewayError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api(format!("{status}: {body}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Http(e.to_string()))?;
        parse_id(&body)
    }
}

/// `id` field of a JSON reply, as a string. A missing id reads as empty.
fn parse_id(body: &str) -> Result<String, GatewayError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| GatewayError::Parse(e.to_string()))?;
    Ok(match value.get("id") {
        Some(serde_json::Value::String(id)) => id.trim().to_string(),
        Some(serde_json::Value::Number(id)) => id.to_string(),
        _ => String::new(),
    })
}

fn quote_form(request: &QuoteRequest) -> Vec<(&'static str, String)> {
    let mut form = vec![
        ("telefono", request.phone.clone()),
        ("fecha", request.birth_date.clone()),
        ("nombre", request.name.clone()),
        ("email", request.email.clone()),
        ("sexo", request.sex.clone()),
        ("plan", request.plan.clone()),
    ];
    for (key, amount) in ["monto", "monto2", "monto3"].into_iter().zip(&request.amounts) {
        form.push((key, amount.clone()));
    }
    if request.replace_beneficiaries {
        form.push(("bdelete", "SI".to_string()));
    }
    form
}

fn with_id(template: &str, id: &str) -> String {
    template.replace(ID_PLACEHOLDER, id)
}

#[async_trait]
impl QuotingGateway for HttpQuotingGateway {
    async fn quote(&self, request: &QuoteRequest) -> Result<String, GatewayError> {
        debug!("Requesting {} quote for {}", request.plan, request.phone);
        self.post_form(&self.endpoints.quote_url, &quote_form(request)).await
    }

    async fn add_beneficiary(&self, request: &BeneficiaryRequest) -> Result<String, GatewayError> {
        let form = [
            ("btoken", request.owner.clone()),
            ("bfecha", request.birth_date.clone()),
            ("bparentesco", request.relationship.clone()),
            ("correlativo", request.ordinal.to_string()),
        ];
        self.post_form(&self.endpoints.beneficiary_url, &form).await
    }

    async fn assign_to_agent(&self, request: &AgentAssignment) -> Result<String, GatewayError> {
        let form = [
            ("telefono", request.phone.clone()),
            ("nombre", request.name.clone()),
            ("poliza", request.policy.clone()),
        ];
        self.post_form(&self.endpoints.assign_url, &form).await
    }

    async fn render_quote(&self, quotation_id: &str) -> Result<DocumentLink, GatewayError> {
        let response = self
            .http
            .get(with_id(&self.endpoints.render_url, quotation_id))
            .send()
            .await
            .map_err(|e| GatewayError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GatewayError::Api(format!("render returned {}", response.status())));
        }

        Ok(DocumentLink {
            url: with_id(&self.endpoints.document_url, quotation_id),
            filename: format!("Cotizacion_{quotation_id}.pdf"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(amounts: &[&str], replace: bool) -> QuoteRequest {
        QuoteRequest {
            phone: "5491100".to_string(),
            birth_date: "1990-08-15".to_string(),
            name: "Ana Perez".to_string(),
            email: "ana@example.com".to_string(),
            sex: "f".to_string(),
            plan: "Amplio".to_string(),
            amounts: amounts.iter().map(|a| a.to_string()).collect(),
            replace_beneficiaries: replace,
        }
    }

    #[test]
    fn test_parse_id_string_or_number() {
        assert_eq!(parse_id(r#"{"id": "Q-17"}"#).unwrap(), "Q-17");
        assert_eq!(parse_id(r#"{"id": 42}"#).unwrap(), "42");
        assert_eq!(parse_id(r#"{"error": "x"}"#).unwrap(), "");
        assert!(matches!(parse_id("<html>"), Err(GatewayError::Parse(_))));
    }

    #[test]
    fn test_primary_quote_form() {
        let form = quote_form(&request(&["100000", "200000"], false));
        let keys: Vec<_> = form.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            keys,
            ["telefono", "fecha", "nombre", "email", "sexo", "plan", "monto", "monto2"]
        );
    }

    #[test]
    fn test_alternate_quote_form_replaces_beneficiaries() {
        let form = quote_form(&request(&["50000", "30000", "20000"], true));
        assert!(form.contains(&("monto3", "20000".to_string())));
        assert_eq!(form.last(), Some(&("bdelete", "SI".to_string())));
    }

    #[test]
    fn test_url_templates() {
        assert_eq!(
            with_id("https://pdf.example.com/pdfgen/{id}.pdf", "77"),
            "https://pdf.example.com/pdfgen/77.pdf"
        );
    }
}
