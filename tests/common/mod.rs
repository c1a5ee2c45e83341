//! In-process HTTP server serving canned playlists and segments

#![allow(dead_code)]

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    Router,
    body::{Body, Bytes},
    extract::State,
    http::{
        Method, StatusCode, Uri,
        header::{CONTENT_TYPE, LOCATION},
    },
    response::{IntoResponse, Response},
};
use m3u8_validator::{ChannelValidator, ValidatorConfig};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

pub const HLS: &str = "application/vnd.apple.mpegurl";
pub const TS: &str = "video/mp2t";

#[derive(Debug, Clone)]
pub struct Reply {
    status: StatusCode,
    content_type: &'static str,
    body: String,
    delay: Duration,
    location: Option<&'static str>,
    /// Pause between the first body byte and the rest of the body
    trickle: Option<Duration>,
}

impl Reply {
    pub fn ok(content_type: &'static str, body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            content_type,
            body: body.into(),
            delay: Duration::ZERO,
            location: None,
            trickle: None,
        }
    }

    pub fn playlist(body: impl Into<String>) -> Self {
        Self::ok(HLS, body)
    }

    pub fn segment() -> Self {
        Self::ok(TS, "G".repeat(2048))
    }

    pub fn status(status: StatusCode) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: status.to_string(),
            delay: Duration::ZERO,
            location: None,
            trickle: None,
        }
    }

    pub fn redirect(location: &'static str) -> Self {
        Self {
            location: Some(location),
            ..Self::status(StatusCode::FOUND)
        }
    }

    /// Sends one byte of `body`, then the remainder after `pause`
    pub fn trickle(mut self, pause: Duration) -> Self {
        self.trickle = Some(pause);
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Replies are picked by how often the same method hit the path so far;
/// the last reply repeats once the list is exhausted
struct Fixtures {
    routes: HashMap<String, Vec<Reply>>,
    hits: Mutex<HashMap<(Method, String), usize>>,
}

pub struct FixtureServer {
    addr: SocketAddr,
    fixtures: Arc<Fixtures>,
}

impl FixtureServer {
    pub async fn start(routes: impl IntoIterator<Item = (String, Vec<Reply>)>) -> Self {
        let fixtures = Arc::new(Fixtures {
            routes: routes.into_iter().collect(),
            hits: Mutex::default(),
        });

        let app = Router::new()
            .fallback(serve_fixture)
            .with_state(fixtures.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        Self { addr, fixtures }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub fn hits(&self, method: &Method, path: &str) -> usize {
        self.fixtures
            .hits
            .lock()
            .unwrap()
            .get(&(method.clone(), path.to_string()))
            .copied()
            .unwrap_or(0)
    }
}

async fn serve_fixture(State(fixtures): State<Arc<Fixtures>>, method: Method, uri: Uri) -> Response {
    let path = uri.path().to_string();
    let nth = {
        let mut hits = fixtures.hits.lock().unwrap();
        let count = hits.entry((method, path.clone())).or_insert(0);
        *count += 1;
        *count - 1
    };

    let Some(replies) = fixtures.routes.get(&path) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let reply = &replies[nth.min(replies.len() - 1)];

    if !reply.delay.is_zero() {
        tokio::time::sleep(reply.delay).await;
    }

    let body = match reply.trickle {
        Some(pause) => trickled_body(reply.body.clone(), pause),
        None => Body::from(reply.body.clone()),
    };

    let mut res = (reply.status, [(CONTENT_TYPE, reply.content_type)], body).into_response();
    if let Some(location) = reply.location {
        res.headers_mut()
            .insert(LOCATION, location.parse().unwrap());
    }
    res
}

fn trickled_body(body: String, pause: Duration) -> Body {
    let (tx, rx) = mpsc::channel::<Result<Bytes, std::io::Error>>(2);
    tokio::spawn(async move {
        let mut rest = Bytes::from(body);
        let head = rest.split_to(rest.len().min(1));
        if tx.send(Ok(head)).await.is_err() {
            return;
        }
        tokio::time::sleep(pause).await;
        if !rest.is_empty() {
            tx.send(Ok(rest)).await.ok();
        }
    });

    Body::from_stream(ReceiverStream::new(rx))
}

pub fn route(path: &str, reply: Reply) -> (String, Vec<Reply>) {
    (path.to_string(), vec![reply])
}

/// Replies in order to successive requests of the same method
pub fn route_seq(path: &str, replies: Vec<Reply>) -> (String, Vec<Reply>) {
    (path.to_string(), replies)
}

/// Media playlist listing `count` segments named `seg<i>.ts`, 10 seconds each
pub fn media_playlist(count: usize) -> String {
    let mut text = String::from("#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:10\n");
    for i in 0..count {
        text.push_str(&format!("#EXTINF:10.0,\nseg{i}.ts\n"));
    }
    text.push_str("#EXT-X-ENDLIST\n");
    text
}

pub fn master_playlist(variant_uri: &str) -> String {
    format!(
        "#EXTM3U\n#EXT-X-STREAM-INF:BANDWIDTH=800000,CODECS=\"avc1.4d401e,mp4a.40.2\"\n{variant_uri}\n"
    )
}

/// Routes serving `count` reachable segments under `dir`
pub fn segments(dir: &str, count: usize) -> Vec<(String, Vec<Reply>)> {
    (0..count)
        .map(|i| (format!("{dir}/seg{i}.ts"), vec![Reply::segment()]))
        .collect()
}

pub fn validator() -> ChannelValidator {
    ChannelValidator::new(ValidatorConfig::default().with_timeout(Duration::from_secs(2))).unwrap()
}
