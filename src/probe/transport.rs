//! HTTP transport and sleeping, the two side effects of a probe

use reqwest::blocking::{Client, ClientBuilder};
use reqwest::Url;
use std::time::Duration;

/// What the prober looks at in a response. The body is never read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    pub status: u16,
    /// URL of the final request, after redirects
    pub final_url: Url,
    /// Whether the connection negotiated TLS
    pub tls: bool,
}

impl ProbeResponse {
    /// Secure if TLS was negotiated or the final request went to `https`.
    pub fn is_secure(&self) -> bool {
        self.tls || self.final_url.scheme() == "https"
    }
}

/// A request that produced no response (DNS, connect, TLS, I/O).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

pub trait Transport {
    fn get(&self, url: &Url) -> Result<ProbeResponse, TransportError>;
}

pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Blocks the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// [`Transport`] over a blocking reqwest client.
///
/// Redirects are followed and the client's default timeout applies; the
/// prober sets no timeout of its own.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> crate::error::Result<Self> {
        Self::from_builder(
            Client::builder()
                .user_agent(concat!("infracheck/", env!("CARGO_PKG_VERSION")))
                .tls_info(true),
        )
    }

    pub fn from_builder(builder: ClientBuilder) -> crate::error::Result<Self> {
        let client = builder.build().map_err(crate::error::Error::HttpClient)?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &Url) -> Result<ProbeResponse, TransportError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| TransportError(error_chain(&e)))?;

        let tls = response
            .extensions()
            .get::<reqwest::tls::TlsInfo>()
            .is_some();

        // Dropping the response closes it without reading the body
        Ok(ProbeResponse {
            status: response.status().as_u16(),
            final_url: response.url().clone(),
            tls,
        })
    }
}

/// reqwest's top-level message rarely says what failed; include the causes.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
