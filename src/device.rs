//! Talking to the ESP8266 board over plain HTTP.

use std::{fmt, time::Duration};

use reqwest::Url;
use thiserror::Error;

use crate::debug;

/// mDNS name the board announces on the local network.
pub const DEVICE_HOST: &str = "esp8266.local";

#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("could not build http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("invalid device url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("could not connect to device: {0}")]
    Connection(#[source] reqwest::Error),

    #[error("device timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    #[error("device answered with HTTP {0}")]
    Status(u16),

    #[error("device request failed: {0}")]
    Request(#[source] reqwest::Error),
}

impl From<reqwest::Error> for DeviceError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            Self::Status(status.as_u16())
        } else if err.is_timeout() {
            Self::Timeout(err)
        } else if err.is_connect() {
            Self::Connection(err)
        } else {
            Self::Request(err)
        }
    }
}

/// One command for one module on the board, e.g. `led_0?cmd=turn_on`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRequest {
    module: String,
    command: String,
    action: Option<String>,
}

impl DeviceRequest {
    pub fn new(module: impl Into<String>, command: impl Into<String>, action: Option<&str>) -> Self {
        Self {
            module: module.into(),
            command: command.into(),
            action: action.filter(|a| !a.is_empty()).map(Into::into),
        }
    }

    /// The module name as the board expects it in the path.
    pub fn device_module(&self) -> String {
        self.module.replace(' ', "_")
    }

    pub fn path(&self) -> String {
        let mut path = format!("{}?cmd={}", self.device_module(), self.command);

        if let Some(action) = &self.action {
            path.push('_');
            path.push_str(action);
        }

        path
    }
}

impl fmt::Display for DeviceRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

pub trait DeviceClient {
    /// Sends one request. The response body is ignored.
    fn send(&self, request: &DeviceRequest) -> Result<(), DeviceError>;
}

/// Blocking HTTP client without timeout or retries. The board lives on the
/// local network, so system proxies are bypassed.
pub struct HttpDeviceClient {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpDeviceClient {
    /// Client for the board at [`DEVICE_HOST`].
    pub fn board() -> Result<Self, DeviceError> {
        Self::new(format!("http://{DEVICE_HOST}"))
    }

    pub fn new(base_url: impl Into<String>) -> Result<Self, DeviceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(None::<Duration>)
            .no_proxy()
            .build()
            .map_err(DeviceError::Client)?;

        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    pub fn url_for(&self, request: &DeviceRequest) -> Result<Url, DeviceError> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), request.path());

        Url::parse(&url).map_err(|e| DeviceError::InvalidUrl {
            url,
            reason: e.to_string(),
        })
    }
}

impl DeviceClient for HttpDeviceClient {
    fn send(&self, request: &DeviceRequest) -> Result<(), DeviceError> {
        let url = self.url_for(request)?;
        debug!("GET {url}");

        self.client.get(url).send()?.error_for_status()?;

        Ok(())
    }
}
