use std::time::Duration;

/// Default message for the re-engagement sweep. `{first_name}` is
/// replaced with the contact's first name.
pub const DEFAULT_REENGAGE_MESSAGE: &str =
    "Hi {first_name}! It's been a while. Is there anything we can help you with today?";

/// Job runner configuration.
#[derive(Debug, Clone)]
pub struct JobsConfig {
    /// Page-scoped ids of admins who receive alerts and the digest.
    pub admin_psids: Vec<String>,
    pub sla_minutes: i64,
    pub reengage_after_days: i64,
    pub reengage_message: String,
    pub nurture_interval: Duration,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            admin_psids: Vec::new(),
            sla_minutes: 30,
            reengage_after_days: 7,
            reengage_message: DEFAULT_REENGAGE_MESSAGE.to_string(),
            nurture_interval: Duration::from_secs(3600),
        }
    }
}

impl JobsConfig {
    /// Load from environment variables.
    ///
    /// | Env var                  | Default                       |
    /// |--------------------------|-------------------------------|
    /// | `ADMIN_PSIDS`            | empty (comma-separated list)  |
    /// | `SLA_MINUTES`            | `30`                          |
    /// | `REENGAGE_AFTER_DAYS`    | `7`                           |
    /// | `REENGAGE_MESSAGE`       | [`DEFAULT_REENGAGE_MESSAGE`]  |
    /// | `NURTURE_INTERVAL_SECS`  | `3600`                        |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let admin_psids = std::env::var("ADMIN_PSIDS")
            .map(|v| parse_list(&v))
            .unwrap_or_default();

        let sla_minutes: i64 = std::env::var("SLA_MINUTES")
            .unwrap_or_else(|_| defaults.sla_minutes.to_string())
            .parse()
            .expect("SLA_MINUTES must be a valid i64");

        let reengage_after_days: i64 = std::env::var("REENGAGE_AFTER_DAYS")
            .unwrap_or_else(|_| defaults.reengage_after_days.to_string())
            .parse()
            .expect("REENGAGE_AFTER_DAYS must be a valid i64");

        let reengage_message =
            std::env::var("REENGAGE_MESSAGE").unwrap_or(defaults.reengage_message);

        let nurture_secs: u64 = std::env::var("NURTURE_INTERVAL_SECS")
            .unwrap_or_else(|_| defaults.nurture_interval.as_secs().to_string())
            .parse()
            .expect("NURTURE_INTERVAL_SECS must be a valid u64");

        Self {
            admin_psids,
            sla_minutes,
            reengage_after_days,
            reengage_message,
            nurture_interval: Duration::from_secs(nurture_secs),
        }
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
