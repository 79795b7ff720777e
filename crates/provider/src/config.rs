use std::time::Duration;

/// Placeholder substituted with the provider campaign id in path templates.
pub const CAMPAIGN_ID_PLACEHOLDER: &str = "{campaignId}";

const DEFAULT_ZONES_PATH: &str = "/campaigns/{campaignId}/zones/exclude";
const DEFAULT_CAMPAIGNS_PATH: &str = "/campaigns";
const DEFAULT_PROVIDER_NAME: &str = "adnetwork";
const DEFAULT_SNAPSHOT_PATH: &str = "/report/campaigns";
const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Ad network connection settings.
///
/// A missing base URL or token is not an error at load time: the client
/// reports itself unconfigured and every call returns
/// `GatewayError::Unconfigured`.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// API root, without trailing slash.
    pub base_url: Option<String>,
    /// Bearer token.
    pub token: Option<String>,
    /// Excluded-zones resource, relative to `base_url`, containing
    /// [`CAMPAIGN_ID_PLACEHOLDER`].
    pub zones_path: String,
    /// Campaign listing resource, relative to `base_url`.
    pub campaigns_path: String,
    /// Optional JSON path tried first when extracting zone ids.
    pub zones_json_path: Option<String>,
    /// Tag stamped on ledger records.
    pub name: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl ProviderConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                                 |
    /// |---------------------------|-----------------------------------------|
    /// | `PROVIDER_BASE_URL`       | unset (unconfigured)                    |
    /// | `PROVIDER_TOKEN`          | unset (unconfigured)                    |
    /// | `PROVIDER_ZONES_PATH`     | `/campaigns/{campaignId}/zones/exclude` |
    /// | `PROVIDER_CAMPAIGNS_PATH` | `/campaigns`                            |
    /// | `PROVIDER_ZONES_JSON_PATH`| unset                                   |
    /// | `PROVIDER_NAME`           | `adnetwork`                             |
    /// | `PROVIDER_TIMEOUT_SECS`   | `5`                                     |
    pub fn from_env() -> Self {
        Self {
            base_url: non_blank_env("PROVIDER_BASE_URL").map(trim_base_url),
            token: non_blank_env("PROVIDER_TOKEN"),
            zones_path: non_blank_env("PROVIDER_ZONES_PATH")
                .unwrap_or_else(|| DEFAULT_ZONES_PATH.into()),
            campaigns_path: non_blank_env("PROVIDER_CAMPAIGNS_PATH")
                .unwrap_or_else(|| DEFAULT_CAMPAIGNS_PATH.into()),
            zones_json_path: non_blank_env("PROVIDER_ZONES_JSON_PATH"),
            name: non_blank_env("PROVIDER_NAME").unwrap_or_else(|| DEFAULT_PROVIDER_NAME.into()),
            timeout: timeout_env("PROVIDER_TIMEOUT_SECS"),
        }
    }

    /// Settings pointing at `base_url` with `token`; everything else default.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: Some(trim_base_url(base_url.into())),
            token: Some(token.into()),
            ..Self::unconfigured()
        }
    }

    /// Settings with no credentials.
    pub fn unconfigured() -> Self {
        Self {
            base_url: None,
            token: None,
            zones_path: DEFAULT_ZONES_PATH.into(),
            campaigns_path: DEFAULT_CAMPAIGNS_PATH.into(),
            zones_json_path: None,
            name: DEFAULT_PROVIDER_NAME.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.base_url.is_some() && self.token.is_some()
    }

    /// Names of the missing settings, for the unconfigured diagnostic.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.base_url.is_none() {
            missing.push("PROVIDER_BASE_URL");
        }
        if self.token.is_none() {
            missing.push("PROVIDER_TOKEN");
        }
        missing
    }

    /// Absolute URL of the excluded-zones resource for one campaign.
    pub fn zones_url(&self, base_url: &str, provider_campaign_id: &str) -> String {
        let path = self
            .zones_path
            .replace(CAMPAIGN_ID_PLACEHOLDER, provider_campaign_id);
        join_url(base_url, &path)
    }

    pub fn campaigns_url(&self, base_url: &str) -> String {
        join_url(base_url, &self.campaigns_path)
    }
}

/// Reporting service connection settings.
#[derive(Debug, Clone)]
pub struct ReportingConfig {
    pub base_url: Option<String>,
    pub token: Option<String>,
    /// Campaign snapshot resource, relative to `base_url`.
    pub snapshot_path: String,
    pub timeout: Duration,
}

impl ReportingConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default             |
    /// |--------------------------|---------------------|
    /// | `REPORTING_BASE_URL`     | unset (unconfigured)|
    /// | `REPORTING_TOKEN`        | unset (optional)    |
    /// | `REPORTING_SNAPSHOT_PATH`| `/report/campaigns` |
    /// | `REPORTING_TIMEOUT_SECS` | `5`                 |
    pub fn from_env() -> Self {
        Self {
            base_url: non_blank_env("REPORTING_BASE_URL").map(trim_base_url),
            token: non_blank_env("REPORTING_TOKEN"),
            snapshot_path: non_blank_env("REPORTING_SNAPSHOT_PATH")
                .unwrap_or_else(|| DEFAULT_SNAPSHOT_PATH.into()),
            timeout: timeout_env("REPORTING_TIMEOUT_SECS"),
        }
    }

    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(trim_base_url(base_url.into())),
            token: None,
            snapshot_path: DEFAULT_SNAPSHOT_PATH.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }
}

fn non_blank_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn timeout_env(key: &str) -> Duration {
    let secs = match non_blank_env(key) {
        Some(raw) => raw.parse::<u64>().ok().filter(|s| *s > 0).unwrap_or_else(|| {
            tracing::warn!(key, value = %raw, "Invalid timeout, using default");
            DEFAULT_TIMEOUT_SECS
        }),
        None => DEFAULT_TIMEOUT_SECS,
    };
    Duration::from_secs(secs)
}

fn trim_base_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

fn join_url(base_url: &str, path: &str) -> String {
    if path.starts_with('/') {
        format!("{base_url}{path}")
    } else {
        format!("{base_url}/{path}")
    }
}
