//! Server-sent event streaming.
//!
//! A stream carries `data` frames with JSON payloads and at most one
//! terminal `error` frame shaped `{code, msg, biz_extra}`. Frames are written
//! through an [`EventPublisher`]; the response body ends when every
//! publisher is dropped.

use std::collections::BTreeMap;
use std::convert::Infallible;

use actix_web::HttpResponse;
use actix_web::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use actix_web::web::Bytes;
use futures_util::stream;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::warn;

use crate::domain::{COMMON_INTERNAL_ERROR, Error, UNKNOWN_ERROR_MESSAGE};
use crate::middleware::EVENT_STREAM_MEDIA;

/// Frames buffered between a publisher and the response body.
const FRAME_BUFFER: usize = 16;

/// Event name of payload frames.
pub const DATA_EVENT: &str = "data";
/// Event name of the terminal failure frame.
pub const ERROR_EVENT: &str = "error";

#[derive(Debug, Serialize)]
struct ErrorPayload<'a> {
    code: i32,
    msg: &'a str,
    biz_extra: BTreeMap<String, String>,
}

fn frame(event: &str, json: &str) -> Bytes {
    Bytes::from(format!("event: {event}\ndata: {json}\n\n"))
}

/// Encode `data` as a `data` frame.
///
/// # Errors
///
/// Returns the encoder error when `data` cannot be serialized.
pub fn data_frame<T: Serialize + ?Sized>(data: &T) -> Result<Bytes, serde_json::Error> {
    serde_json::to_string(data).map(|json| frame(DATA_EVENT, &json))
}

/// Encode `err` as the terminal `error` frame.
///
/// Errors without a code are reported as an internal error.
#[must_use]
pub fn error_frame(err: &(dyn std::error::Error + 'static)) -> Bytes {
    let payload = match err.downcast_ref::<Error>() {
        Some(coded) => ErrorPayload {
            code: coded.code(),
            msg: coded.message(),
            biz_extra: coded.to_wire().extra,
        },
        None => ErrorPayload {
            code: COMMON_INTERNAL_ERROR,
            msg: UNKNOWN_ERROR_MESSAGE,
            biz_extra: BTreeMap::new(),
        },
    };
    let json = serde_json::to_string(&payload).unwrap_or_else(|encode_err| {
        warn!(error = %encode_err, "failed to encode error frame");
        format!(r#"{{"code":{COMMON_INTERNAL_ERROR},"msg":"{UNKNOWN_ERROR_MESSAGE}","biz_extra":{{}}}}"#)
    });
    frame(ERROR_EVENT, &json)
}

/// Writing half of an event stream.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    frames: mpsc::Sender<Bytes>,
}

impl EventPublisher {
    /// Publish one `data` frame. Returns `false` once the client is gone.
    pub async fn publish_data<T: Serialize + ?Sized>(&self, data: &T) -> bool {
        match data_frame(data) {
            Ok(bytes) => self.send(bytes).await,
            Err(err) => {
                warn!(error = %err, "dropping unserializable event");
                !self.frames.is_closed()
            }
        }
    }

    /// Publish the terminal `error` frame.
    pub async fn publish_error(&self, err: &(dyn std::error::Error + 'static)) -> bool {
        self.send(error_frame(err)).await
    }

    async fn send(&self, bytes: Bytes) -> bool {
        if self.frames.send(bytes).await.is_err() {
            warn!("event stream client disconnected");
            return false;
        }
        true
    }
}

/// Open an event stream, returning its publisher and the streaming response.
#[must_use]
pub fn event_stream() -> (EventPublisher, HttpResponse) {
    let (tx, rx) = mpsc::channel::<Bytes>(FRAME_BUFFER);
    let body = stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|bytes| (Ok::<_, Infallible>(bytes), rx))
    });
    let response = HttpResponse::Ok()
        .insert_header((CONTENT_TYPE, EVENT_STREAM_MEDIA))
        .insert_header((CACHE_CONTROL, "no-cache"))
        .streaming(body);
    (EventPublisher { frames: tx }, response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{COMMON_NO_PERMISSION, EXTRA_AFFECT_STABILITY};
    use actix_web::body::to_bytes;
    use rstest::rstest;
    use serde_json::{Value, json};

    fn parse(frame: &[u8]) -> (String, Value) {
        let text = std::str::from_utf8(frame).expect("utf8");
        assert!(text.ends_with("\n\n"), "frame must end with a blank line");
        let mut lines = text.trim_end().lines();
        let event = lines
            .next()
            .and_then(|line| line.strip_prefix("event: "))
            .expect("event line");
        let data = lines
            .next()
            .and_then(|line| line.strip_prefix("data: "))
            .expect("data line");
        (event.to_owned(), serde_json::from_str(data).expect("json"))
    }

    #[rstest]
    fn data_frames_carry_single_line_json() {
        let bytes = data_frame(&json!({"space_id": "9007199254740993", "name": "a\nb"}))
            .expect("encode");
        let (event, data) = parse(&bytes);
        assert_eq!(event, DATA_EVENT);
        assert_eq!(data["space_id"], "9007199254740993");
        assert_eq!(data["name"], "a\nb");
    }

    #[rstest]
    fn coded_errors_keep_code_and_extras() {
        let err = Error::no_permission("nope").with_extra("space_id", "7");
        let (event, data) = parse(&error_frame(&err));
        assert_eq!(event, ERROR_EVENT);
        assert_eq!(data["code"], COMMON_NO_PERMISSION);
        assert_eq!(data["msg"], err.message());
        assert!(data["biz_extra"].get(EXTRA_AFFECT_STABILITY).is_some());
    }

    #[rstest]
    fn uncoded_errors_become_internal() {
        let err = std::io::Error::other("disk on fire");
        let (_, data) = parse(&error_frame(&err));
        assert_eq!(data["code"], COMMON_INTERNAL_ERROR);
        assert_eq!(data["msg"], UNKNOWN_ERROR_MESSAGE);
    }

    #[actix_web::test]
    async fn stream_ends_after_publishers_drop() {
        let (publisher, response) = event_stream();
        assert_eq!(
            response.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok()),
            Some(EVENT_STREAM_MEDIA)
        );
        let writer = actix_web::rt::spawn(async move {
            assert!(publisher.publish_data(&json!({"n": 1})).await);
            let failure = std::io::Error::other("listing failed");
            assert!(publisher.publish_error(&failure).await);
        });
        let body = to_bytes(response.into_body()).await.expect("body");
        writer.await.expect("writer");
        let text = std::str::from_utf8(&body).expect("utf8");
        let frames: Vec<&str> = text.split_inclusive("\n\n").collect();
        assert_eq!(frames.len(), 2);
        assert_eq!(parse(frames[0].as_bytes()).0, DATA_EVENT);
        let (event, data) = parse(frames[1].as_bytes());
        assert_eq!(event, ERROR_EVENT);
        assert_eq!(data["code"], COMMON_INTERNAL_ERROR);
    }
}
