use reqwest::header::{
    ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE, HeaderMap, HeaderName, SERVER,
};
use serde::Serialize;
use tracing::{debug, instrument};

/// MIME type HLS playlists are supposed to be served with
pub const HLS_MIME_TYPE: &str = "application/vnd.apple.mpegurl";

/// Outcome of probing a stream URL's response headers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum HeaderInfo {
    Inspected(HeaderReport),
    Failed(ProbeFailure),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderReport {
    pub url: String,
    pub valid: bool,
    pub status: u16,
    pub content_type: String,
    pub server: String,
    pub cors: Option<String>,
    pub valid_content_type: bool,
    pub valid_cors: bool,
}

/// The probe never produced a usable response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeFailure {
    pub url: String,
    pub valid: bool,
    pub error: String,
}

impl HeaderInfo {
    fn failed(url: &str, error: impl ToString) -> Self {
        Self::Failed(ProbeFailure {
            url: url.to_string(),
            valid: false,
            error: error.to_string(),
        })
    }

    #[must_use]
    pub const fn is_valid(&self) -> bool {
        match self {
            Self::Inspected(report) => report.valid,
            Self::Failed(_) => false,
        }
    }
}

/// Whether a response looks like it carries an HLS playlist
///
/// Servers regularly mislabel playlists, so a `.m3u8` URL is accepted regardless
/// of the advertised content type.
#[must_use]
pub fn is_playlist_content_type(content_type: &str, url: &str) -> bool {
    content_type.to_lowercase().contains(HLS_MIME_TYPE) || url.contains(".m3u8")
}

fn header_str(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
}

/// Issues a HEAD request against `url` and judges its response headers
///
/// Transport failures and non-2xx answers are reported as [`HeaderInfo::Failed`].
/// A missing CORS header is reported but does not invalidate the stream.
#[instrument(skip(client))]
pub async fn inspect(client: &reqwest::Client, url: &str) -> HeaderInfo {
    let url = url.trim();

    let res = match client.head(url).send().await {
        Ok(res) => res,
        Err(e) => {
            debug!("Header probe failed: {e}");
            return HeaderInfo::failed(url, e);
        }
    };

    let status = res.status();
    if !status.is_success() {
        debug!("Header probe answered with {status}");
        return HeaderInfo::failed(url, format!("HTTP status {status}"));
    }

    let headers = res.headers();
    let content_type = header_str(headers, CONTENT_TYPE)
        .unwrap_or_default()
        .to_lowercase();
    let server = header_str(headers, SERVER).unwrap_or_default();
    let cors = header_str(headers, ACCESS_CONTROL_ALLOW_ORIGIN);

    let valid_content_type = is_playlist_content_type(&content_type, url);
    let valid_cors = cors.is_some();

    HeaderInfo::Inspected(HeaderReport {
        url: url.to_string(),
        valid: valid_content_type,
        status: status.as_u16(),
        content_type,
        server,
        cors,
        valid_content_type,
        valid_cors,
    })
}
