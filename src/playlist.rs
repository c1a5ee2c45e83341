use m3u8_rs::{MasterPlaylist, MediaPlaylist, Playlist, VariantStream};
use reqwest::{StatusCode, Url};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::{config::ValidatorConfig, error::ResolveError};

/// Amount of leading segments probed for reachability, regardless of playlist length
pub const PROBE_SEGMENTS: usize = 2;

/// Outcome of resolving and probing a playlist
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PlaylistInfo {
    Playable(PlaylistReport),
    Rejected(PlaylistRejection),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaylistReport {
    /// The media playlist that was actually checked (a variant URL when resolved through a master)
    pub url: String,
    pub valid: bool,
    pub version: Option<usize>,
    pub bandwidth: Option<u64>,
    pub codecs: Option<String>,
    /// Sum of every segment's duration, in seconds
    pub duration: f64,
    pub segments_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_time: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaylistRejection {
    pub url: String,
    pub valid: bool,
    pub reason: String,
}

impl PlaylistInfo {
    #[must_use]
    pub fn rejected(url: &str, reason: &ResolveError) -> Self {
        Self::Rejected(PlaylistRejection {
            url: url.to_string(),
            valid: false,
            reason: reason.to_string(),
        })
    }

    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Playable(_))
    }
}

/// What a single fetched document told us to do next
enum Step {
    Follow { url: String, variant: VariantStream },
    Done(PlaylistReport),
}

/// Resolves `url` down to a media playlist and checks it is playable
///
/// Master playlists are followed through their first variant, at most
/// [`ValidatorConfig::max_variant_hops`] times. The leading [`PROBE_SEGMENTS`]
/// segments must answer a HEAD request with `200 OK`. Every failure is folded
/// into [`PlaylistInfo::Rejected`].
#[instrument(skip(client, config))]
pub async fn resolve(
    client: &reqwest::Client,
    url: &str,
    config: &ValidatorConfig,
) -> PlaylistInfo {
    let mut current = url.trim().to_string();
    let mut variant: Option<VariantStream> = None;
    let mut hops = 0;

    loop {
        match check_playlist(client, &current, variant.as_ref()).await {
            Ok(Step::Done(report)) => return PlaylistInfo::Playable(report),
            Ok(Step::Follow { url, variant: next }) => {
                if hops == config.max_variant_hops {
                    return PlaylistInfo::rejected(
                        &current,
                        &ResolveError::TooManyHops(config.max_variant_hops),
                    );
                }
                info!("Following master playlist variant: {url}");
                hops += 1;
                current = url;
                variant = Some(next);
            }
            Err(e) => {
                debug!("Playlist rejected: {e}");
                return PlaylistInfo::rejected(&current, &e);
            }
        }
    }
}

async fn check_playlist(
    client: &reqwest::Client,
    url: &str,
    via: Option<&VariantStream>,
) -> Result<Step, ResolveError> {
    let res = client.get(url).send().await?.error_for_status()?;
    let base = res.url().clone();
    let body = res.bytes().await?;

    let playlist = m3u8_rs::parse_playlist_res(&body).map_err(|_| ResolveError::Parse)?;

    let media = match playlist {
        Playlist::MasterPlaylist(master) => {
            let variant = first_variant(&master).ok_or(ResolveError::NoVariants)?;
            let url = variant_url(url, &variant.uri)?;
            return Ok(Step::Follow {
                url,
                variant: variant.clone(),
            });
        }
        Playlist::MediaPlaylist(media) => media,
    };

    if media.segments.is_empty() {
        return Err(ResolveError::NoSegments);
    }

    for segment in media.segments.iter().take(PROBE_SEGMENTS) {
        let segment_url = base
            .join(&segment.uri)
            .map_err(|e| ResolveError::InvalidUrl(e.to_string()))?;
        probe_segment(client, segment_url).await?;
    }

    Ok(Step::Done(summarize(url, &media, via)))
}

#[instrument(skip(client))]
async fn probe_segment(client: &reqwest::Client, url: Url) -> Result<(), ResolveError> {
    let res = client.head(url.clone()).send().await?;
    if res.status() != StatusCode::OK {
        return Err(ResolveError::InvalidSegment {
            url: url.to_string(),
            status: res.status().as_u16(),
        });
    }

    Ok(())
}

/// First playable variant of a master playlist, skipping I-frame only streams
#[must_use]
pub fn first_variant(master: &MasterPlaylist) -> Option<&VariantStream> {
    master.variants.iter().find(|v| !v.is_i_frame)
}

/// Joins a variant URI onto the directory holding `playlist_url`
///
/// # Errors
/// Errors when the resulting URL is not a valid absolute URL
pub fn variant_url(playlist_url: &str, uri: &str) -> Result<String, ResolveError> {
    let directory = playlist_url
        .rfind('/')
        .map_or(playlist_url, |i| &playlist_url[..=i]);

    Url::parse(directory)
        .and_then(|base| base.join(uri))
        .map(String::from)
        .map_err(|e| ResolveError::InvalidUrl(e.to_string()))
}

/// Widens an `f32` parsed from `#EXTINF` without the binary noise of `f64::from`
///
/// `6.006_f32` widens to `6.006` rather than `6.0060000419616699`.
#[must_use]
pub fn decimal_f64(value: f32) -> f64 {
    value
        .to_string()
        .parse()
        .unwrap_or_else(|_| f64::from(value))
}

/// Extracts the reported metadata out of a playable media playlist
///
/// `via` is the master playlist entry this media playlist was reached through,
/// if any. Its stream info is the only source of bandwidth and codecs.
#[must_use]
pub fn summarize(url: &str, media: &MediaPlaylist, via: Option<&VariantStream>) -> PlaylistReport {
    let duration = media
        .segments
        .iter()
        .map(|s| decimal_f64(s.duration))
        .sum::<f64>();

    PlaylistReport {
        url: url.to_string(),
        valid: true,
        version: media.version,
        bandwidth: via.map(|v| v.bandwidth),
        codecs: via.and_then(|v| v.codecs.clone()),
        duration,
        segments_count: media.segments.len(),
        load_time: None,
    }
}
