use super::{Endpoint, Transport};
use crate::error::ReplicaError;
use crate::{Result, TesseraError};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Url, header};
use std::time::Duration;

const GET_PATH: &str = "/internal/v1/get";

/// Posts encoded requests to `http(s)://host:port/internal/v1/get`.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(connect_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|error| TesseraError::Http(error.to_string()))?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn request_url(&self, endpoint: &Endpoint) -> std::result::Result<Url, ReplicaError> {
        let scheme = if endpoint.secure { "https" } else { "http" };
        Url::parse(&format!(
            "{}://{}:{}{}",
            scheme, endpoint.hostname, endpoint.port, GET_PATH
        ))
        .map_err(|error| ReplicaError::Transport(error.to_string()))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        endpoint: &Endpoint,
        request: Bytes,
    ) -> std::result::Result<Bytes, ReplicaError> {
        let url = self.request_url(endpoint)?;
        let response = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(request)
            .send()
            .await
            .map_err(|error| ReplicaError::Transport(error.to_string()))?;

        if !response.status().is_success() {
            return Err(ReplicaError::Transport(format!(
                "get request failed: endpoint={} status={}",
                endpoint,
                response.status()
            )));
        }

        response
            .bytes()
            .await
            .map_err(|error| ReplicaError::Transport(error.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn endpoint_for(server: &MockServer) -> Endpoint {
        let address = server.address();
        Endpoint {
            hostname: address.ip().to_string(),
            port: address.port(),
            secure: false,
        }
    }

    #[tokio::test]
    async fn posts_request_and_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GET_PATH))
            .and(body_string("ping"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"pong".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let transport = HttpTransport::new(Duration::from_secs(1)).unwrap();
        let body = transport
            .send(&endpoint_for(&server), Bytes::from_static(b"ping"))
            .await
            .unwrap();
        assert_eq!(body, Bytes::from_static(b"pong"));
    }

    #[tokio::test]
    async fn non_success_status_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GET_PATH))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(Duration::from_secs(1)).unwrap();
        let error = transport
            .send(&endpoint_for(&server), Bytes::from_static(b"ping"))
            .await
            .unwrap_err();
        assert!(matches!(error, ReplicaError::Transport(_)));
    }

    #[tokio::test]
    async fn connection_refused_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let transport = HttpTransport::new(Duration::from_secs(1)).unwrap();
        let endpoint = Endpoint {
            hostname: "127.0.0.1".to_string(),
            port,
            secure: false,
        };
        let error = transport
            .send(&endpoint, Bytes::from_static(b"ping"))
            .await
            .unwrap_err();
        assert!(matches!(error, ReplicaError::Transport(_)));
    }
}
