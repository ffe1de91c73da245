use crate::errors::ConfigError;
use crate::reconciler::MatchPolicy;

/// Recipient used when `CONTACT_EMAIL` is not set.
pub const DEFAULT_CONTACT_EMAIL: &str = "john@sogos.io";
pub const DEFAULT_MAILGUN_API_BASE: &str = "https://api.mailgun.net";
pub const DEFAULT_FROM_NAME: &str = "Website Contact";
pub const DEFAULT_PORT: u16 = 8080;

/// Twenty CRM settings. Present only when both URL and key are configured.
#[derive(Debug, Clone)]
pub struct CrmConfig {
    pub api_url: String,
    pub api_key: String,
    /// Base URL for deep links shown to staff.
    pub public_url: String,
}

/// Mailgun settings. Present only when both key and domain are configured.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub api_key: String,
    pub domain: String,
    pub api_base: String,
    pub from_name: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub crm: Option<CrmConfig>,
    pub mail: Option<MailConfig>,
    pub contact_email: String,
    pub match_policy: MatchPolicy,
}

impl Config {
    /// Loads configuration from the process environment (and `.env`, if any).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable source.
    ///
    /// Blank values count as unset. A half-configured integration is disabled
    /// rather than rejected; only malformed values are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let port = match var("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::InvalidPort(raw.clone()))?,
            None => DEFAULT_PORT,
        };

        let crm = match (var("TWENTY_API_URL"), var("TWENTY_API_KEY")) {
            (Some(api_url), Some(api_key)) => {
                let api_url = validate_http_url("TWENTY_API_URL", api_url)?;
                let public_url = match var("TWENTY_PUBLIC_URL") {
                    Some(url) => validate_http_url("TWENTY_PUBLIC_URL", url)?,
                    None => api_url.clone(),
                };
                Some(CrmConfig {
                    api_url,
                    api_key,
                    public_url,
                })
            }
            _ => None,
        };

        let mail = match (var("MAILGUN_API_KEY"), var("MAILGUN_DOMAIN")) {
            (Some(api_key), Some(domain)) => Some(MailConfig {
                api_key,
                domain,
                api_base: match var("MAILGUN_API_BASE") {
                    Some(url) => validate_http_url("MAILGUN_API_BASE", url)?,
                    None => DEFAULT_MAILGUN_API_BASE.to_string(),
                },
                from_name: var("MAIL_FROM_NAME").unwrap_or_else(|| DEFAULT_FROM_NAME.to_string()),
            }),
            _ => None,
        };

        let match_policy = match var("CRM_MATCH_POLICY") {
            Some(raw) => raw.parse()?,
            None => MatchPolicy::default(),
        };

        let config = Self {
            port,
            crm,
            mail,
            contact_email: var("CONTACT_EMAIL")
                .unwrap_or_else(|| DEFAULT_CONTACT_EMAIL.to_string()),
            match_policy,
        };

        // Log what is enabled, never the keys
        match &config.crm {
            Some(crm) => tracing::debug!("Twenty API URL: {}", crm.api_url),
            None => tracing::warn!("Twenty CRM not configured, leads will not be recorded"),
        }
        match &config.mail {
            Some(mail) => tracing::debug!("Mailgun domain: {} via {}", mail.domain, mail.api_base),
            None => tracing::warn!("Mailgun not configured, contact submissions will fail"),
        }
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }

    /// URL used for CRM deep links, if the CRM is configured.
    pub fn crm_public_url(&self) -> Option<&str> {
        self.crm.as_ref().map(|crm| crm.public_url.as_str())
    }
}

fn validate_http_url(var: &'static str, value: String) -> Result<String, ConfigError> {
    match url::Url::parse(&value) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {
            Ok(value.trim_end_matches('/').to_string())
        }
        _ => Err(ConfigError::InvalidUrl { var, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_with_empty_environment() {
        let config = load(&[]).unwrap();
        assert_eq!(config.port, 8080);
        assert!(config.crm.is_none());
        assert!(config.mail.is_none());
        assert_eq!(config.contact_email, DEFAULT_CONTACT_EMAIL);
        assert_eq!(config.match_policy, MatchPolicy::FirstResult);
    }

    #[test]
    fn full_configuration() {
        let config = load(&[
            ("PORT", "9000"),
            ("TWENTY_API_URL", "https://crm.example.com/"),
            ("TWENTY_API_KEY", "secret"),
            ("MAILGUN_API_KEY", "mg-key"),
            ("MAILGUN_DOMAIN", "mg.example.com"),
            ("CONTACT_EMAIL", "sales@example.com"),
            ("CRM_MATCH_POLICY", "exact-first"),
        ])
        .unwrap();

        assert_eq!(config.port, 9000);
        let crm = config.crm.as_ref().unwrap();
        assert_eq!(crm.api_url, "https://crm.example.com");
        assert_eq!(crm.public_url, "https://crm.example.com");
        let mail = config.mail.as_ref().unwrap();
        assert_eq!(mail.api_base, DEFAULT_MAILGUN_API_BASE);
        assert_eq!(mail.from_name, DEFAULT_FROM_NAME);
        assert_eq!(config.contact_email, "sales@example.com");
        assert_eq!(config.match_policy, MatchPolicy::ExactFirst);
        assert_eq!(config.crm_public_url(), Some("https://crm.example.com"));
    }

    #[test]
    fn half_configured_integrations_are_disabled() {
        let config = load(&[
            ("TWENTY_API_URL", "https://crm.example.com"),
            ("MAILGUN_API_KEY", "mg-key"),
            ("MAILGUN_DOMAIN", "   "),
        ])
        .unwrap();
        assert!(config.crm.is_none());
        assert!(config.mail.is_none());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            load(&[("PORT", "http")]),
            Err(ConfigError::InvalidPort(_))
        ));
        assert!(matches!(
            load(&[("TWENTY_API_URL", "crm.example.com"), ("TWENTY_API_KEY", "k")]),
            Err(ConfigError::InvalidUrl { var: "TWENTY_API_URL", .. })
        ));
        assert!(matches!(
            load(&[("CRM_MATCH_POLICY", "fuzzy")]),
            Err(ConfigError::InvalidMatchPolicy(_))
        ));
    }
}
