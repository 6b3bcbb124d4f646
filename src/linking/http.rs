//! Shared HTTP plumbing for the provider clients.

use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::domain::ProviderError;

/// Default user agent. MusicBrainz asks for an application name, version
/// and contact; [`user_agent`] appends a configured contact.
pub const USER_AGENT: &str = concat!("MusicLinker/", env!("CARGO_PKG_VERSION"));

/// User agent with an optional contact (URL or e-mail) appended.
pub fn user_agent(contact: Option<&str>) -> String {
    match contact.map(str::trim).filter(|c| !c.is_empty()) {
        Some(contact) => format!("{USER_AGENT} ( {contact} )"),
        None => USER_AGENT.to_string(),
    }
}

/// Build the HTTP client shared by all adapters.
///
/// Accepts gzip responses and bounds every request by `timeout`, on top
/// of the engine's own per-query timeout.
pub fn build_client(user_agent: &str, timeout: Duration) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .gzip(true)
        .user_agent(user_agent)
        .timeout(timeout)
        .build()
        .map_err(|e| ProviderError::Network(e.to_string()))
}

/// Error body shape used by the MusicBrainz family of services
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Send `request` and decode a JSON body.
///
/// 404 is "nothing there" (`Ok(None)`), 429 and 503 are rate limiting,
/// any other non-success status is an [`ProviderError::Http`].
pub async fn get_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<Option<T>, ProviderError> {
    let response = request.send().await.map_err(|e| {
        if e.is_timeout() {
            ProviderError::Network("request timed out".to_string())
        } else {
            ProviderError::Network(e.to_string())
        }
    })?;

    let status = response.status();

    if status == reqwest::StatusCode::NOT_FOUND {
        return Ok(None);
    }

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS
        || status == reqwest::StatusCode::SERVICE_UNAVAILABLE
    {
        return Err(ProviderError::RateLimited);
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ErrorBody>(&body) {
            Ok(error) => error.error,
            Err(_) if !body.trim().is_empty() => body.chars().take(200).collect(),
            Err(_) => status.canonical_reason().unwrap_or("Unknown").to_string(),
        };
        return Err(ProviderError::Http {
            status: status.as_u16(),
            message,
        });
    }

    response
        .json::<T>()
        .await
        .map(Some)
        .map_err(|e| ProviderError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Deserialize, PartialEq)]
    struct Payload {
        value: u32,
    }

    fn client() -> reqwest::Client {
        build_client(USER_AGENT, Duration::from_secs(5)).unwrap()
    }

    async fn serve(status: u16, body: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/thing"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body.to_string()))
            .mount(&server)
            .await;
        server
    }

    #[test]
    fn test_user_agent_contact() {
        assert!(USER_AGENT.starts_with("MusicLinker/"));
        assert_eq!(user_agent(Some("  ")), USER_AGENT);
        assert!(user_agent(Some("me@example.com")).ends_with("( me@example.com )"));
    }

    #[tokio::test]
    async fn test_success_decodes_body() {
        let server = serve(200, r#"{"value": 7}"#).await;
        let result: Option<Payload> = get_json(client().get(format!("{}/thing", server.uri())))
            .await
            .unwrap();
        assert_eq!(result, Some(Payload { value: 7 }));
    }

    #[tokio::test]
    async fn test_not_found_is_none() {
        let server = serve(404, "").await;
        let result: Option<Payload> = get_json(client().get(format!("{}/thing", server.uri())))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_service_unavailable_is_rate_limited() {
        let server = serve(503, "").await;
        let result = get_json::<Payload>(client().get(format!("{}/thing", server.uri()))).await;
        assert!(matches!(result, Err(ProviderError::RateLimited)));
    }

    #[tokio::test]
    async fn test_error_body_message() {
        let server = serve(400, r#"{"error": "Invalid mbid."}"#).await;
        let result = get_json::<Payload>(client().get(format!("{}/thing", server.uri()))).await;
        match result {
            Err(ProviderError::Http { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "Invalid mbid.");
            }
            other => panic!("Expected Http error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let server = serve(200, "not json").await;
        let result = get_json::<Payload>(client().get(format!("{}/thing", server.uri()))).await;
        assert!(matches!(result, Err(ProviderError::Parse(_))));
    }
}
