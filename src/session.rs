use crate::error::LogwatchError;
use log::{debug, warn};
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::watch;

/// Process-wide holder of the session credential.
///
/// Any caller may read it; any fetch that is rejected clears it. Dependents
/// learn about the change through `subscribe`.
#[derive(Debug)]
pub struct SessionStore {
    credential: watch::Sender<Option<String>>,
}

impl SessionStore {
    pub fn new(token: impl Into<String>) -> Self {
        let (credential, _) = watch::channel(Some(token.into()));
        Self { credential }
    }

    pub fn credential(&self) -> Option<String> {
        self.credential.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential.borrow().is_some()
    }

    /// Clears the credential. Returns `false` if it was already gone.
    pub fn invalidate(&self) -> bool {
        self.credential.send_if_modified(|credential| credential.take().is_some())
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.credential.subscribe()
    }
}

/// HTTP client that signs every request with the current credential.
#[derive(Debug, Clone)]
pub struct SessionClient {
    client: reqwest::Client,
    api_base: String,
    session: Arc<SessionStore>,
}

impl SessionClient {
    pub fn new(api_base: impl Into<String>, session: Arc<SessionStore>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.into(),
            session,
        }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// `GET`s `path` below the API base and decodes the JSON body.
    ///
    /// A `401` clears the shared credential and yields
    /// `SessionInvalidated`; other failures leave the session untouched.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, LogwatchError> {
        let token = self
            .session
            .credential()
            .ok_or(LogwatchError::SessionInvalidated)?;
        let url = self.url(path);

        debug!("GET {}", url);
        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, token)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            if self.session.invalidate() {
                warn!("Session rejected by {}, credential cleared", url);
            }
            return Err(LogwatchError::SessionInvalidated);
        }

        if !status.is_success() {
            return Err(LogwatchError::StatusError(status));
        }

        Ok(response.json::<T>().await?)
    }
}

#[cfg(test)]
pub(crate) mod test_server {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::sync::oneshot;

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap_or(0);
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        String::from_utf8_lossy(&request).into_owned()
    }

    async fn respond(mut socket: TcpStream, status: &str, body: &str) {
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
    }

    async fn answer(mut socket: TcpStream, status: &str, body: &str) -> String {
        let request = read_request(&mut socket).await;
        respond(socket, status, body).await;
        request
    }

    /// Answers exactly one HTTP request with `status` and a JSON `body`.
    /// Resolves the returned receiver with the raw request text.
    pub async fn serve_once(status: &'static str, body: &'static str) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (request_tx, request_rx) = oneshot::channel();

        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let request = answer(socket, status, body).await;
            let _ = request_tx.send(request);
        });

        (format!("http://{}/api", addr), request_rx)
    }

    /// Answers one request, but only after `release` fires. `received`
    /// resolves once the request headers have arrived.
    pub async fn serve_held(
        status: &'static str,
        body: &'static str,
    ) -> (String, oneshot::Receiver<()>, oneshot::Sender<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (received_tx, received_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_request(&mut socket).await;
            let _ = received_tx.send(());
            let _ = release_rx.await;
            respond(socket, status, body).await;
        });

        (format!("http://{}/api", addr), received_rx, release_tx)
    }

    /// Answers every request on every path with the same `status` and `body`.
    pub async fn serve_forever(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                tokio::spawn(answer(socket, status, body));
            }
        });

        format!("http://{}/api", addr)
    }
}
