use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::{
    config::ValidatorConfig,
    header::{self, HeaderInfo},
    http::init_http_client,
    playlist::{self, PlaylistInfo},
    timing,
};

/// Full diagnostic report for one stream URL
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    /// The URL exactly as it was submitted
    pub url: String,
    /// Seconds until the first bytes arrived, `0` when never measured, infinite when measuring failed
    pub load_time: f64,
    pub is_valid: bool,
    pub info: ValidationInfo,
}

/// Diagnostics of whichever stage decided the outcome
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ValidationInfo {
    Header(HeaderInfo),
    Playlist(PlaylistInfo),
    Fault { error: String },
}

impl ValidationResult {
    /// A result for a validation that could not run to completion
    #[must_use]
    pub fn fault(url: impl Into<String>, error: impl ToString) -> Self {
        Self {
            url: url.into(),
            load_time: 0.0,
            is_valid: false,
            info: ValidationInfo::Fault {
                error: error.to_string(),
            },
        }
    }
}

/// Runs the header, playlist and load time checks against stream URLs
///
/// Holds no per-validation state; one instance can serve any number of
/// concurrent validations.
#[derive(Debug, Clone)]
pub struct ChannelValidator {
    client: reqwest::Client,
    config: ValidatorConfig,
}

impl ChannelValidator {
    /// # Errors
    /// Errors when the HTTP client cannot be built
    pub fn new(config: ValidatorConfig) -> reqwest::Result<Self> {
        Ok(Self {
            client: init_http_client(&config)?,
            config,
        })
    }

    #[must_use]
    pub const fn with_client(client: reqwest::Client, config: ValidatorConfig) -> Self {
        Self { client, config }
    }

    #[must_use]
    pub const fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Validates a stream URL
    ///
    /// Never fails: every problem, including a panic inside the pipeline, is
    /// reported through the returned [`ValidationResult`].
    #[instrument(skip(self))]
    pub async fn validate(&self, url: &str) -> ValidationResult {
        let this = self.clone();
        let submitted = url.to_string();

        match tokio::spawn(async move { this.run(&submitted).await }).await {
            Ok(result) => result,
            Err(e) => {
                warn!("Validation task failed: {e}");
                ValidationResult::fault(url, e)
            }
        }
    }

    async fn run(&self, submitted: &str) -> ValidationResult {
        let url = submitted.trim();

        let header_info = header::inspect(&self.client, url).await;
        if !header_info.is_valid() {
            info!("Header check failed, skipping playlist checks");
            return ValidationResult {
                url: submitted.to_string(),
                load_time: 0.0,
                is_valid: false,
                info: ValidationInfo::Header(header_info),
            };
        }

        let playlist_info = playlist::resolve(&self.client, url, &self.config).await;
        let PlaylistInfo::Playable(mut report) = playlist_info else {
            return ValidationResult {
                url: submitted.to_string(),
                load_time: 0.0,
                is_valid: false,
                info: ValidationInfo::Playlist(playlist_info),
            };
        };

        let load_time = timing::measure(&self.client, url).await;
        report.load_time = Some(load_time);

        ValidationResult {
            url: submitted.to_string(),
            load_time,
            is_valid: load_time.is_finite(),
            info: ValidationInfo::Playlist(PlaylistInfo::Playable(report)),
        }
    }
}
