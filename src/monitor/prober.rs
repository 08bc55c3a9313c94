//! SSRF-guarded HTTP probing and result classification.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Url};
use thiserror::Error;

use crate::db::enums::CheckStatus;

/// Error text recorded when a probe target resolves to an internal address.
const BLOCKED_TARGET_MESSAGE: &str = "不允许访问内网地址";

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("{BLOCKED_TARGET_MESSAGE}")]
    BlockedTarget,
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

/// Classified result of one probe. `response_time` is present only when an
/// HTTP exchange completed, including non-200 responses.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeOutcome {
    pub status: CheckStatus,
    pub response_time: Option<f64>,
    pub error: Option<String>,
}

impl ProbeOutcome {
    pub fn up(response_time: f64) -> Self {
        Self {
            status: CheckStatus::Up,
            response_time: Some(response_time),
            error: None,
        }
    }

    pub fn down(response_time: Option<f64>, error: String) -> Self {
        Self {
            status: CheckStatus::Down,
            response_time,
            error: Some(error),
        }
    }
}

/// Probing seam used by the scheduler; production uses [`HttpProber`].
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, url: &str, timeout_secs: u64) -> ProbeOutcome;
}

pub struct HttpProber {
    client: Client,
}

impl HttpProber {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Default for HttpProber {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Probe for HttpProber {
    async fn probe(&self, url: &str, timeout_secs: u64) -> ProbeOutcome {
        match guard_url(url) {
            Ok(_) => fetch(&self.client, url, timeout_secs).await,
            Err(e) => ProbeOutcome::down(None, e.to_string()),
        }
    }
}

/// Parses the target URL and rejects internal hosts before any network I/O.
pub fn guard_url(url: &str) -> Result<Url, ProbeError> {
    let parsed = Url::parse(url).map_err(|e| ProbeError::InvalidUrl(e.to_string()))?;
    match parsed.host_str() {
        Some(host) if is_private_host(host) => Err(ProbeError::BlockedTarget),
        Some(_) => Ok(parsed),
        None => Err(ProbeError::InvalidUrl("missing host".to_owned())),
    }
}

/// Hostname-string matching, deliberately not full CIDR parsing: `localhost`,
/// the loopback address, `10.0.0.0/8`, `172.16.0.0/12` and `192.168.0.0/16`.
pub fn is_private_host(host: &str) -> bool {
    if host == "localhost" || host == "127.0.0.1" {
        return true;
    }
    if host.starts_with("10.") || host.starts_with("192.168.") {
        return true;
    }
    if let Some(rest) = host.strip_prefix("172.") {
        if let Some((second, _)) = rest.split_once('.') {
            if let Ok(octet) = second.parse::<u8>() {
                return (16..=31).contains(&octet);
            }
        }
    }
    false
}

/// Issues the timed GET and classifies the response. Status 200 is `up`;
/// any other status is `down` with an `HTTP <code>` error but still carries
/// the measured response time; a transport failure carries neither.
pub(crate) async fn fetch(client: &Client, url: &str, timeout_secs: u64) -> ProbeOutcome {
    let started = Instant::now();
    let result = client
        .get(url)
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .send()
        .await;

    match result {
        Ok(response) => {
            let elapsed = started.elapsed().as_secs_f64();
            let code = response.status().as_u16();
            if code == 200 {
                ProbeOutcome::up(elapsed)
            } else {
                ProbeOutcome::down(Some(elapsed), format!("HTTP {code}"))
            }
        }
        Err(e) => ProbeOutcome::down(None, e.to_string()),
    }
}
