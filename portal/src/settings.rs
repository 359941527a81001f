//! Portal configuration loaded via OrthoConfig.
//!
//! Values come from `PORTAL_*` environment variables or the OrthoConfig
//! configuration file. Remote storage settings are passed through unchecked;
//! validation happens when the remote backend is built.

use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::RemoteStorageConfig;

const DEFAULT_DATA_DIR: &str = "portal-data";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Configuration values for the portal CLI.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "PORTAL")]
pub struct PortalSettings {
    /// Directory holding the persisted slots.
    pub data_dir: Option<PathBuf>,
    /// Remote storage service URL.
    pub storage_url: Option<String>,
    /// Remote storage anonymous key.
    pub storage_anon_key: Option<String>,
    /// Remote storage bucket.
    pub storage_bucket: Option<String>,
    /// Store attachments inline when a remote upload fails.
    #[ortho_config(default = true)]
    pub remote_fallback: bool,
    /// Timeout applied to each remote storage request.
    pub request_timeout_secs: Option<u64>,
}

impl PortalSettings {
    /// Configured data directory, falling back to `portal-data`.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
    }

    /// Remote storage settings awaiting validation.
    pub fn remote_config(&self) -> RemoteStorageConfig {
        RemoteStorageConfig {
            endpoint: self.storage_url.clone(),
            anon_key: self.storage_anon_key.clone(),
            bucket: self.storage_bucket.clone(),
        }
    }

    /// Per-request timeout for remote storage calls.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
                .max(1),
        )
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for portal configuration parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    use crate::domain::DEFAULT_BUCKET;

    fn load_from_empty_args() -> PortalSettings {
        PortalSettings::load_from_iter([OsString::from("portal")]).expect("config should load")
    }

    #[rstest]
    fn default_values_are_used_when_missing() {
        let _guard = lock_env([
            ("PORTAL_DATA_DIR", None::<String>),
            ("PORTAL_STORAGE_URL", None::<String>),
            ("PORTAL_STORAGE_ANON_KEY", None::<String>),
            ("PORTAL_STORAGE_BUCKET", None::<String>),
            ("PORTAL_REMOTE_FALLBACK", None::<String>),
            ("PORTAL_REQUEST_TIMEOUT_SECS", None::<String>),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(settings.data_dir(), PathBuf::from(DEFAULT_DATA_DIR));
        assert!(settings.remote_fallback);
        assert_eq!(
            settings.request_timeout(),
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
        );
        assert!(settings.remote_config().validate().is_err());
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("PORTAL_DATA_DIR", Some("/tmp/portal".to_owned())),
            (
                "PORTAL_STORAGE_URL",
                Some("https://demo.supabase.co".to_owned()),
            ),
            ("PORTAL_STORAGE_ANON_KEY", Some("anon".to_owned())),
            ("PORTAL_STORAGE_BUCKET", None::<String>),
            ("PORTAL_REMOTE_FALLBACK", Some("false".to_owned())),
            ("PORTAL_REQUEST_TIMEOUT_SECS", Some("5".to_owned())),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(settings.data_dir(), PathBuf::from("/tmp/portal"));
        assert!(!settings.remote_fallback);
        assert_eq!(settings.request_timeout(), Duration::from_secs(5));
        let remote = settings.remote_config().validate().expect("valid remote config");
        assert_eq!(remote.bucket(), DEFAULT_BUCKET);
    }

    #[rstest]
    fn placeholder_credentials_are_rejected() {
        let _guard = lock_env([
            ("PORTAL_DATA_DIR", None::<String>),
            (
                "PORTAL_STORAGE_URL",
                Some("https://your-project-url.supabase.co".to_owned()),
            ),
            ("PORTAL_STORAGE_ANON_KEY", Some("your-anon-key".to_owned())),
            ("PORTAL_STORAGE_BUCKET", None::<String>),
            ("PORTAL_REMOTE_FALLBACK", None::<String>),
            ("PORTAL_REQUEST_TIMEOUT_SECS", None::<String>),
        ]);

        let settings = load_from_empty_args();
        assert!(settings.remote_config().validate().is_err());
    }
}
