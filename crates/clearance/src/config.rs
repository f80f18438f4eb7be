//! Client configuration.
//!
//! Defaults match the service's documented processing times. Values can be
//! overridden from a JSON document or from `CLEARANCE_*` environment
//! variables.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use clearance_core::FormCode;
use clearance_track::PollingPolicy;

use crate::error::{ClientError, Result};

pub const ITEM_MAX_WAIT_SECS: &str = "CLEARANCE_ITEM_MAX_WAIT_SECS";
pub const ITEM_POLL_INTERVAL_MS: &str = "CLEARANCE_ITEM_POLL_INTERVAL_MS";
pub const SESSION_MAX_WAIT_SECS: &str = "CLEARANCE_SESSION_MAX_WAIT_SECS";
pub const SESSION_POLL_INTERVAL_MS: &str = "CLEARANCE_SESSION_POLL_INTERVAL_MS";
pub const GRANT_MAX_WAIT_SECS: &str = "CLEARANCE_GRANT_MAX_WAIT_SECS";
pub const REVOKE_MAX_WAIT_SECS: &str = "CLEARANCE_REVOKE_MAX_WAIT_SECS";
pub const PERMISSION_POLL_INTERVAL_MS: &str = "CLEARANCE_PERMISSION_POLL_INTERVAL_MS";

/// Configuration for the [`ClearanceClient`](crate::ClearanceClient).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Waiting for one document to be accepted and stored.
    pub item_polling: PollingPolicy,
    /// Waiting for a closed session to be processed.
    pub session_polling: PollingPolicy,
    /// Waiting for a permission grant.
    pub grant_polling: PollingPolicy,
    /// Waiting for a permission revocation.
    pub revoke_polling: PollingPolicy,
    /// Form code used by `open_session`.
    pub form_code: FormCode,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            item_polling: PollingPolicy::from_secs_and_millis(60, 2_000),
            session_polling: PollingPolicy::from_secs_and_millis(120, 2_000),
            grant_polling: PollingPolicy::from_secs_and_millis(15, 1_000),
            revoke_polling: PollingPolicy::from_secs_and_millis(30, 1_000),
            form_code: FormCode::fa3(),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `CLEARANCE_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        let read = |key: &str| -> Result<Option<u64>> {
            lookup(key)
                .map(|raw| {
                    raw.trim()
                        .parse::<u64>()
                        .map_err(|e| ClientError::Config(format!("{key}={raw:?}: {e}")))
                })
                .transpose()
        };

        if let Some(secs) = read(ITEM_MAX_WAIT_SECS)? {
            config.item_polling.max_wait = Duration::from_secs(secs);
        }
        if let Some(ms) = read(ITEM_POLL_INTERVAL_MS)? {
            config.item_polling.poll_interval = Duration::from_millis(ms);
        }
        if let Some(secs) = read(SESSION_MAX_WAIT_SECS)? {
            config.session_polling.max_wait = Duration::from_secs(secs);
        }
        if let Some(ms) = read(SESSION_POLL_INTERVAL_MS)? {
            config.session_polling.poll_interval = Duration::from_millis(ms);
        }
        if let Some(secs) = read(GRANT_MAX_WAIT_SECS)? {
            config.grant_polling.max_wait = Duration::from_secs(secs);
        }
        if let Some(secs) = read(REVOKE_MAX_WAIT_SECS)? {
            config.revoke_polling.max_wait = Duration::from_secs(secs);
        }
        if let Some(ms) = read(PERMISSION_POLL_INTERVAL_MS)? {
            config.grant_polling.poll_interval = Duration::from_millis(ms);
            config.revoke_polling.poll_interval = Duration::from_millis(ms);
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON document. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ClientError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every polling policy.
    pub fn validate(&self) -> Result<()> {
        for (name, policy) in [
            ("item_polling", &self.item_polling),
            ("session_polling", &self.session_polling),
            ("grant_polling", &self.grant_polling),
            ("revoke_polling", &self.revoke_polling),
        ] {
            policy
                .validate()
                .map_err(|e| ClientError::Config(format!("{name}: {e}")))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.item_polling.max_wait, Duration::from_secs(60));
        assert_eq!(config.item_polling.poll_interval, Duration::from_secs(2));
        assert_eq!(config.session_polling.max_wait, Duration::from_secs(120));
        assert_eq!(config.grant_polling.max_wait, Duration::from_secs(15));
        assert_eq!(config.revoke_polling.max_wait, Duration::from_secs(30));
        assert_eq!(config.revoke_polling.poll_interval, Duration::from_secs(1));
        assert_eq!(config.form_code, FormCode::fa3());
    }

    #[test]
    fn test_lookup_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ITEM_MAX_WAIT_SECS, "90"),
            (PERMISSION_POLL_INTERVAL_MS, " 500 "),
        ]))
        .unwrap();

        assert_eq!(config.item_polling.max_wait, Duration::from_secs(90));
        assert_eq!(config.item_polling.poll_interval, Duration::from_secs(2));
        assert_eq!(config.grant_polling.poll_interval, Duration::from_millis(500));
        assert_eq!(config.revoke_polling.poll_interval, Duration::from_millis(500));
    }

    #[test]
    fn test_malformed_value_is_config_error() {
        let err = ClientConfig::from_lookup(lookup(&[(SESSION_MAX_WAIT_SECS, "soon")])).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
        assert!(err.to_string().contains(SESSION_MAX_WAIT_SECS));
    }

    #[test]
    fn test_zero_interval_is_config_error() {
        let err = ClientConfig::from_lookup(lookup(&[(ITEM_POLL_INTERVAL_MS, "0")])).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn test_from_json_partial() {
        let config = ClientConfig::from_json(
            r#"{
                "grant_polling": { "max_wait_ms": 5000, "poll_interval_ms": 250 },
                "form_code": { "systemCode": "FA (2)", "schemaVersion": "1-0E", "value": "FA" }
            }"#,
        )
        .unwrap();

        assert_eq!(config.grant_polling, PollingPolicy::from_secs_and_millis(5, 250));
        assert_eq!(config.form_code.system_code, "FA (2)");
        assert_eq!(config.item_polling, ClientConfig::default().item_polling);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            ClientConfig::from_json("{ not json"),
            Err(ClientError::Config(_))
        ));
    }
}
