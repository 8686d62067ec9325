use std::env;

use crate::constants::Brand;
use crate::error::GatewayError;

/// Which processor environment a credential pair belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Test,
    Live,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Test => "test",
            Mode::Live => "live",
        }
    }
}

/// The credential pair active for one attempt or one notification.
#[derive(Clone)]
pub struct Credentials {
    pub merchant_id: String,
    pub secret_key: String,
    pub mode: Mode,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("merchant_id", &self.merchant_id)
            .field("secret_key", &"[REDACTED]")
            .field("mode", &self.mode.as_str())
            .finish()
    }
}

/// Merchant-facing gateway settings.
///
/// Owned by the host platform's settings storage; the core receives a loaded
/// copy per invocation and never mutates it mid-attempt. Credentials must be
/// re-read for every attempt so a sandbox/production toggle takes effect
/// immediately — notifications in particular may arrive after the toggle.
#[derive(Clone)]
pub struct GatewayConfig {
    pub brand: Brand,
    pub enabled: bool,
    pub title: String,
    pub description: String,
    pub disclaimer: Option<String>,
    pub test_mode: bool,
    pub test_merchant_id: String,
    pub test_secret_key: String,
    pub live_merchant_id: String,
    pub live_secret_key: String,
    pub enable_three_ds: bool,
    /// Where the processor sends the shopper after checkout.
    pub return_url: String,
    /// Webhook URL for asynchronous notifications.
    pub notify_url: String,
    /// Storefront URL reported with each request.
    pub trade_url: String,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("brand", &self.brand)
            .field("enabled", &self.enabled)
            .field("title", &self.title)
            .field("test_mode", &self.test_mode)
            .field("test_merchant_id", &self.test_merchant_id)
            .field("test_secret_key", &"[REDACTED]")
            .field("live_merchant_id", &self.live_merchant_id)
            .field("live_secret_key", &"[REDACTED]")
            .field("enable_three_ds", &self.enable_three_ds)
            .field("return_url", &self.return_url)
            .field("notify_url", &self.notify_url)
            .field("trade_url", &self.trade_url)
            .finish()
    }
}

impl GatewayConfig {
    /// Select the credential pair for the current mode.
    ///
    /// An empty secret key is a hard precondition failure: nothing may be
    /// signed or verified without it, and the caller must abort before any
    /// network traffic.
    pub fn active_credentials(&self) -> Result<Credentials, GatewayError> {
        let (merchant_id, secret_key, mode) = if self.test_mode {
            (&self.test_merchant_id, &self.test_secret_key, Mode::Test)
        } else {
            (&self.live_merchant_id, &self.live_secret_key, Mode::Live)
        };

        if secret_key.is_empty() {
            return Err(GatewayError::Config(format!(
                "{} secret key is not configured",
                mode.as_str()
            )));
        }

        Ok(Credentials {
            merchant_id: merchant_id.clone(),
            secret_key: secret_key.clone(),
            mode,
        })
    }

    /// Load settings from the environment (used by the notification server).
    pub fn from_env() -> Result<Self, ConfigError> {
        let brand = match env::var("COMETPAY_BRAND") {
            Ok(name) => Brand::from_str_loose(&name).ok_or(ConfigError::InvalidBrand(name))?,
            Err(_) => Brand::default(),
        };

        let test_mode = env_flag("COMETPAY_TEST_MODE", true);
        let enable_three_ds = env_flag("COMETPAY_ENABLE_3DS", false);

        let config = Self {
            brand,
            enabled: env_flag("COMETPAY_ENABLED", true),
            title: env::var("COMETPAY_TITLE")
                .unwrap_or_else(|_| brand.display_name().to_string()),
            description: env::var("COMETPAY_DESCRIPTION")
                .unwrap_or_else(|_| "Pay securely using your credit card.".to_string()),
            disclaimer: env::var("COMETPAY_DISCLAIMER").ok().filter(|s| !s.is_empty()),
            test_mode,
            test_merchant_id: env::var("COMETPAY_TEST_MERCHANT_ID").unwrap_or_default(),
            test_secret_key: env::var("COMETPAY_TEST_SECRET_KEY").unwrap_or_default(),
            live_merchant_id: env::var("COMETPAY_LIVE_MERCHANT_ID").unwrap_or_default(),
            live_secret_key: env::var("COMETPAY_LIVE_SECRET_KEY").unwrap_or_default(),
            enable_three_ds,
            return_url: env::var("COMETPAY_RETURN_URL").unwrap_or_default(),
            notify_url: env::var("COMETPAY_NOTIFY_URL").unwrap_or_default(),
            trade_url: env::var("COMETPAY_TRADE_URL").unwrap_or_default(),
        };

        if config.active_credentials().is_err() {
            let var = if test_mode {
                "COMETPAY_TEST_SECRET_KEY"
            } else {
                "COMETPAY_LIVE_SECRET_KEY"
            };
            return Err(ConfigError::MissingRequired(var));
        }

        Ok(config)
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .map(|v| matches!(v.as_str(), "true" | "1" | "yes"))
        .unwrap_or(default)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingRequired(&'static str),

    #[error("unknown brand: {0}")]
    InvalidBrand(String),
}

#[cfg(test)]
pub(crate) fn test_config(secret: &str) -> GatewayConfig {
    GatewayConfig {
        brand: Brand::Comet,
        enabled: true,
        title: "Credit Card".to_string(),
        description: "Pay securely using your credit card.".to_string(),
        disclaimer: None,
        test_mode: true,
        test_merchant_id: "M1001".to_string(),
        test_secret_key: secret.to_string(),
        live_merchant_id: String::new(),
        live_secret_key: String::new(),
        enable_three_ds: false,
        return_url: "https://shop.example/checkout/thanks".to_string(),
        notify_url: "https://shop.example/comet-notify".to_string(),
        trade_url: "https://shop.example/".to_string(),
    }
}
