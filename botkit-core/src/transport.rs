use std::time::Duration;

use async_trait::async_trait;
use http_body_util::{BodyExt, Full};
use hyper::{
    Method, Request,
    body::Bytes,
    header::{ACCEPT, CONTENT_LENGTH, CONTENT_TYPE, USER_AGENT},
    http::HeaderValue,
};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{Client as HyperClient, connect::HttpConnector},
    rt::TokioExecutor,
};
use log::{debug, trace};

use crate::{
    error::TransportError,
    request::{ActivationRequest, ActivationResponse},
};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Sends license requests to the licensing endpoint.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ActivationRequest) -> Result<ActivationResponse, TransportError>;
}

/// Posts the request as a urlencoded form and reads back the JSON envelope.
#[derive(Clone)]
pub struct HttpTransport {
    client: HyperClient<HttpsConnector<HttpConnector>, Full<Bytes>>,
    endpoint: String,
    timeout: Duration,
}

impl HttpTransport {
    #[must_use]
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let connector = HttpsConnectorBuilder::new().with_webpki_roots().https_or_http().enable_http1().build();
        let client = HyperClient::builder(TokioExecutor::new()).build(connector);

        Self { client, endpoint: endpoint.into(), timeout }
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post(&self, body: String) -> Result<ActivationResponse, TransportError> {
        let req = Request::builder()
            .uri(&self.endpoint)
            .method(Method::POST)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/x-www-form-urlencoded"))
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .header(USER_AGENT, HeaderValue::from_static(concat!("botkit-core/", env!("CARGO_PKG_VERSION"))))
            .header(CONTENT_LENGTH, body.len())
            .body(Full::from(Bytes::from(body)))
            .map_err(|e| TransportError::BuildingRequest(Box::new(e)))?;

        let res = self.client.request(req).await.map_err(|e| TransportError::Sending(Box::new(e)))?;
        let status = res.status();

        let bytes = res.into_body().collect().await.map_err(|e| TransportError::ChunkingResponse(Box::new(e)))?.to_bytes();
        trace!("License endpoint replied {status}: {}", String::from_utf8_lossy(&bytes));

        if !status.is_success() {
            return Err(TransportError::Status(status));
        }

        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ActivationRequest) -> Result<ActivationResponse, TransportError> {
        let body = serde_urlencoded::to_string(request.form()).map_err(|e| TransportError::BuildingRequest(Box::new(e)))?;
        debug!("POST {} license_action={} request={}", self.endpoint, request.action(), request.id());

        tokio::time::timeout(self.timeout, self.post(body)).await.map_err(|_| TransportError::Timeout)?
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::{TcpListener, TcpStream},
        sync::oneshot,
    };

    use super::*;
    use crate::request::ActivationAction;

    /// Reads one request off the stream and returns its body.
    async fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];

        let head_end = loop {
            let n = stream.read(&mut chunk).await.unwrap();
            assert!(n > 0, "client closed before sending headers");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buf[..head_end]).to_ascii_lowercase();
        let length: usize = head.lines().find_map(|l| l.strip_prefix("content-length:")).map_or(0, |v| v.trim().parse().unwrap());

        while buf.len() < head_end + length {
            let n = stream.read(&mut chunk).await.unwrap();
            assert!(n > 0, "client closed mid body");
            buf.extend_from_slice(&chunk[..n]);
        }

        String::from_utf8(buf[head_end..head_end + length].to_vec()).unwrap()
    }

    /// Answers exactly one request with `status` and `body`, handing the request body back.
    async fn serve_once(status: &'static str, body: &'static str) -> (SocketAddr, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let form = read_request(&mut stream).await;
            let _ = tx.send(form);

            let reply = format!("HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}", body.len());
            stream.write_all(reply.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
        });

        (addr, rx)
    }

    fn transport(addr: SocketAddr, timeout: Duration) -> HttpTransport {
        HttpTransport::new(format!("http://{addr}/wp-admin/admin-ajax.php"), timeout)
    }

    fn activate() -> ActivationRequest {
        ActivationRequest::new(ActivationAction::Activate, "n0nce").license_key("KEY 1/2")
    }

    #[tokio::test]
    async fn posts_urlencoded_form() {
        let (addr, form) = serve_once("200 OK", r#"{"success":true,"data":{"status_display":{"status":"valid","class":"valid","message":"License active"}}}"#).await;

        let response = transport(addr, DEFAULT_TIMEOUT).send(&activate()).await.unwrap();

        assert_eq!(form.await.unwrap(), "action=license_action&nonce=n0nce&license_action=activate&license_key=KEY+1%2F2");
        assert!(response.success);
        assert_eq!(response.data.and_then(|d| d.status_display).map(|s| s.status).as_deref(), Some("valid"));
    }

    #[tokio::test]
    async fn bare_string_rejection_is_a_reply() {
        let (addr, _form) = serve_once("200 OK", r#"{"success":false,"data":"Invalid nonce"}"#).await;

        let response = transport(addr, DEFAULT_TIMEOUT).send(&activate()).await.unwrap();

        assert!(!response.success);
        assert_eq!(response.data.and_then(|d| d.message).as_deref(), Some("Invalid nonce"));
    }

    #[tokio::test]
    async fn server_error_is_status() {
        let (addr, _form) = serve_once("500 Internal Server Error", "").await;

        let err = transport(addr, DEFAULT_TIMEOUT).send(&activate()).await.unwrap_err();

        assert!(matches!(err, TransportError::Status(s) if s == hyper::StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[tokio::test]
    async fn non_json_reply_is_deserialize() {
        let (addr, _form) = serve_once("200 OK", "<html>critical error</html>").await;

        let err = transport(addr, DEFAULT_TIMEOUT).send(&activate()).await.unwrap_err();

        assert!(matches!(err, TransportError::Deserialize(_)));
    }

    #[tokio::test]
    async fn silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let _ = read_request(&mut stream).await;
            // hold the connection open without answering
            std::future::pending::<()>().await;
        });

        let err = transport(addr, Duration::from_millis(100)).send(&activate()).await.unwrap_err();

        assert!(matches!(err, TransportError::Timeout));
        server.abort();
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_sending() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = transport(addr, DEFAULT_TIMEOUT).send(&activate()).await.unwrap_err();

        assert!(matches!(err, TransportError::Sending(_)));
    }
}
