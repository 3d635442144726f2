//! Configuration for vendor client construction.

use derive_getters::Getters;
use maestro_error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default ceiling timeout for one generation call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// How a request reaches the vendor.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// Route through a trusted intermediary supplied by the host application
    #[display("proxy")]
    Proxy,
    /// Call the vendor endpoint directly
    #[display("direct")]
    Direct,
}

/// Which chat-completion protocol the target speaks.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    /// OpenAI-style `/chat/completions` protocol
    #[display("openai-compatible")]
    #[serde(rename = "openai")]
    OpenAiCompatible,
    /// Claude-style `/messages` protocol
    #[display("claude")]
    Claude,
}

impl Vendor {
    /// Wire name used in the proxy request envelope.
    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::OpenAiCompatible => "openai",
            Self::Claude => "claude",
        }
    }
}

/// Configuration for one vendor client.
///
/// # Examples
///
/// ```
/// use maestro_models::{ClientConfig, Transport, Vendor};
///
/// let config = ClientConfig::new(Transport::Direct, Vendor::Claude, "claude-sonnet-4-20250514")
///     .with_endpoint("https://api.anthropic.com/v1")
///     .with_credential("sk-ant-...");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct ClientConfig {
    /// Transport selection
    transport: Transport,
    /// Vendor protocol selection
    vendor: Vendor,
    /// Model identifier
    model: String,
    /// Sampling temperature
    temperature: Option<f32>,
    /// Maximum tokens to generate
    max_tokens: Option<u32>,
    /// Proxy base URL (proxy transport only)
    proxy_url: Option<String>,
    /// Vendor endpoint; forwarded as an override when proxied
    endpoint: Option<String>,
    /// Caller-supplied API key; forwarded as an override when proxied
    credential: Option<String>,
    /// Ceiling timeout for one call
    request_timeout: Duration,
    /// Whether to request an incremental event stream
    stream: bool,
}

impl ClientConfig {
    /// Create a new configuration with defaults for the optional fields.
    pub fn new(transport: Transport, vendor: Vendor, model: impl Into<String>) -> Self {
        Self {
            transport,
            vendor,
            model: model.into(),
            temperature: None,
            max_tokens: None,
            proxy_url: None,
            endpoint: None,
            credential: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            stream: false,
        }
    }

    /// Create config from environment variables.
    ///
    /// Reads:
    /// - `MAESTRO_TRANSPORT` ("proxy" or "direct", default: "direct")
    /// - `MAESTRO_VENDOR` ("openai" or "claude", default: "openai")
    /// - `MAESTRO_MODEL` (required)
    /// - `MAESTRO_PROXY_URL` (required for proxy transport)
    /// - `MAESTRO_ENDPOINT` (required for direct transport)
    /// - `MAESTRO_API_KEY` (optional)
    pub fn from_env() -> Result<Self, ConfigError> {
        let transport = match std::env::var("MAESTRO_TRANSPORT").as_deref() {
            Ok("proxy") => Transport::Proxy,
            Ok("direct") | Err(_) => Transport::Direct,
            Ok(other) => {
                return Err(ConfigError::new(format!(
                    "MAESTRO_TRANSPORT must be 'proxy' or 'direct', got '{}'",
                    other
                )));
            }
        };
        let vendor = match std::env::var("MAESTRO_VENDOR").as_deref() {
            Ok("openai") | Err(_) => Vendor::OpenAiCompatible,
            Ok("claude") => Vendor::Claude,
            Ok(other) => {
                return Err(ConfigError::new(format!(
                    "MAESTRO_VENDOR must be 'openai' or 'claude', got '{}'",
                    other
                )));
            }
        };
        let model = std::env::var("MAESTRO_MODEL")
            .map_err(|_| ConfigError::new("MAESTRO_MODEL not set"))?;

        let mut config = Self::new(transport, vendor, model);
        config.proxy_url = std::env::var("MAESTRO_PROXY_URL").ok();
        config.endpoint = std::env::var("MAESTRO_ENDPOINT").ok();
        config.credential = std::env::var("MAESTRO_API_KEY").ok();
        config.validate()?;
        Ok(config)
    }

    /// Replace the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum token count.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the proxy base URL.
    pub fn with_proxy_url(mut self, proxy_url: impl Into<String>) -> Self {
        self.proxy_url = Some(proxy_url.into());
        self
    }

    /// Set the vendor endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the API key.
    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    /// Set the per-call ceiling timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Request streaming responses.
    pub fn with_streaming(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// Check the transport/vendor/endpoint combination before any network call.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the model is empty, when the direct
    /// transport is missing its endpoint or credential, or when the proxy
    /// transport is missing its proxy URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::new("model must not be empty"));
        }
        match self.transport {
            Transport::Direct => {
                if self.endpoint.as_deref().is_none_or(|e| e.trim().is_empty()) {
                    return Err(ConfigError::new(format!(
                        "direct transport to {} requires an endpoint",
                        self.vendor
                    )));
                }
                if self
                    .credential
                    .as_deref()
                    .is_none_or(|c| c.trim().is_empty())
                {
                    return Err(ConfigError::new(format!(
                        "direct transport to {} requires a credential",
                        self.vendor
                    )));
                }
            }
            Transport::Proxy => {
                if self
                    .proxy_url
                    .as_deref()
                    .is_none_or(|u| u.trim().is_empty())
                {
                    return Err(ConfigError::new("proxy transport requires a proxy URL"));
                }
            }
        }
        Ok(())
    }
}
