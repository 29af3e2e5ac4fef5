use glow_common::{helpers::parse_boolean_flag, Secret};
use log::*;

pub const DEFAULT_PAYNL_API_URL: &str = "https://rest-api.pay.nl/v13/Transaction/start/json";
pub const DEFAULT_PAYNL_STATUS_URL: &str = "https://rest-api.pay.nl/v14/Transaction/status/json";
pub const DEFAULT_PAYCONIQ_API_URL: &str = "https://api.payconiq.com";
pub const DEFAULT_PAYCONIQ_TEST_API_URL: &str = "https://api.ext.payconiq.com";
pub const DEFAULT_SITE_DOMAIN: &str = "weglow.world";

#[derive(Debug, Clone, Default)]
pub struct PayNlConfig {
    /// The transaction start endpoint
    pub api_url: String,
    /// The transaction status endpoint
    pub status_url: String,
    /// `{token_code}:{api_token}`, sent as HTTP basic credentials
    pub token: Secret<String>,
    /// Where Pay.nl sends its exchange calls
    pub exchange_url: String,
    pub test_mode: bool,
}

impl PayNlConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_url = std::env::var("GLOW_PAYNL_API_URL").unwrap_or_else(|_| {
            info!("🪛️ GLOW_PAYNL_API_URL not set, using {DEFAULT_PAYNL_API_URL}");
            DEFAULT_PAYNL_API_URL.to_string()
        });
        let status_url = std::env::var("GLOW_PAYNL_STATUS_URL").unwrap_or_else(|_| {
            info!("🪛️ GLOW_PAYNL_STATUS_URL not set, using {DEFAULT_PAYNL_STATUS_URL}");
            DEFAULT_PAYNL_STATUS_URL.to_string()
        });
        let token = Secret::new(std::env::var("GLOW_PAYNL_TOKEN").unwrap_or_else(|_| {
            warn!("🪛️ GLOW_PAYNL_TOKEN not set. Pay.nl requests will be refused.");
            String::default()
        }));
        let exchange_url = std::env::var("GLOW_PAYNL_EXCHANGE_URL").unwrap_or_else(|_| {
            warn!("🪛️ GLOW_PAYNL_EXCHANGE_URL not set, using (probably useless) default");
            "http://localhost:8360/webhook/paynl".to_string()
        });
        let test_mode = parse_boolean_flag(std::env::var("GLOW_PAYNL_TEST_MODE").ok(), false);
        if test_mode {
            warn!("🪛️ Pay.nl transactions are created in TEST mode");
        }
        Self { api_url, status_url, token, exchange_url, test_mode }
    }

    /// Splits the configured token into the basic-auth username and password. A token without a colon is sent as the
    /// username with no password.
    pub fn credentials(&self) -> Option<(String, Option<String>)> {
        let token = self.token.reveal();
        if token.is_empty() {
            return None;
        }
        match token.split_once(':') {
            Some((user, pass)) => Some((user.to_string(), Some(pass.to_string()))),
            None => Some((token.clone(), None)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PayconiqConfig {
    pub api_url: String,
    /// Where Payconiq posts its payment callbacks
    pub callback_url: String,
    /// Test mode switches to the Payconiq external test environment.
    pub test_mode: bool,
}

impl PayconiqConfig {
    pub fn new_from_env_or_default() -> Self {
        let test_mode = parse_boolean_flag(std::env::var("GLOW_PAYCONIQ_TEST_MODE").ok(), false);
        let default_url = if test_mode { DEFAULT_PAYCONIQ_TEST_API_URL } else { DEFAULT_PAYCONIQ_API_URL };
        let api_url = std::env::var("GLOW_PAYCONIQ_API_URL").unwrap_or_else(|_| {
            info!("🪛️ GLOW_PAYCONIQ_API_URL not set, using {default_url}");
            default_url.to_string()
        });
        let callback_url = std::env::var("GLOW_PAYCONIQ_CALLBACK_URL").unwrap_or_else(|_| {
            warn!("🪛️ GLOW_PAYCONIQ_CALLBACK_URL not set, using (probably useless) default");
            "http://localhost:8360/webhook/payconiq".to_string()
        });
        if test_mode {
            warn!("🪛️ Payconiq payments are created against the TEST environment");
        }
        Self { api_url: api_url.trim_end_matches('/').to_string(), callback_url, test_mode }
    }
}

/// Everything the provider clients need, plus the front-end domain used to build the donor's return URL.
#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
    pub paynl: PayNlConfig,
    pub payconiq: PayconiqConfig,
    pub site_domain: String,
}

impl ProviderConfig {
    pub fn new_from_env_or_default() -> Self {
        let site_domain = std::env::var("GLOW_SITE_DOMAIN").unwrap_or_else(|_| {
            info!("🪛️ GLOW_SITE_DOMAIN not set, using {DEFAULT_SITE_DOMAIN}");
            DEFAULT_SITE_DOMAIN.to_string()
        });
        Self {
            paynl: PayNlConfig::new_from_env_or_default(),
            payconiq: PayconiqConfig::new_from_env_or_default(),
            site_domain,
        }
    }

    /// The page the donor lands on after paying. A campaign's custom URL wins over `https://{campaign}.{site_domain}`.
    pub fn success_url(&self, campaign_id: &str, custom_url: Option<&str>) -> String {
        let base = match custom_url.map(|u| u.trim().trim_end_matches('/')).filter(|u| !u.is_empty()) {
            Some(url) => url.to_string(),
            None => format!("https://{campaign_id}.{}", self.site_domain),
        };
        format!("{base}/success")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn success_urls() {
        let config = ProviderConfig { site_domain: "weglow.world".into(), ..Default::default() };
        assert_eq!(config.success_url("gent", None), "https://gent.weglow.world/success");
        assert_eq!(config.success_url("gent", Some("https://kaarsjes.be//")), "https://kaarsjes.be/success");
        assert_eq!(config.success_url("gent", Some("  ")), "https://gent.weglow.world/success");
    }

    #[test]
    fn paynl_credentials() {
        let mut config = PayNlConfig::default();
        assert!(config.credentials().is_none());
        config.token = Secret::new("AT-1234-5678:abcdef".to_string());
        assert_eq!(config.credentials(), Some(("AT-1234-5678".to_string(), Some("abcdef".to_string()))));
        config.token = Secret::new("abcdef".to_string());
        assert_eq!(config.credentials(), Some(("abcdef".to_string(), None)));
    }
}
