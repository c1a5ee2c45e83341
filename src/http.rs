use reqwest::{
    header::{HeaderMap, HeaderValue},
    redirect,
};

use crate::config::ValidatorConfig;

/// Redirect chains longer than this are treated as a transport failure
const MAX_REDIRECTS: usize = 10;

/// Builds the HTTP client shared by every stage of a validation
///
/// Every request made through it is bounded by [`ValidatorConfig::timeout`]
/// and follows redirects.
///
/// # Errors
/// Errors when the TLS backend cannot be initialized
pub fn init_http_client(config: &ValidatorConfig) -> reqwest::Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        "User-Agent",
        HeaderValue::from_static(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION"),
            " (+",
            env!("CARGO_PKG_REPOSITORY"),
            ")"
        )),
    );

    reqwest::Client::builder()
        .default_headers(headers)
        .redirect(redirect::Policy::limited(MAX_REDIRECTS))
        .connect_timeout(config.timeout)
        .timeout(config.timeout)
        .build()
}
