//! Response body helpers shared by the access log and the envelope adapter.

use actix_web::Error;
use actix_web::body::{BoxBody, MessageBody, to_bytes};
use actix_web::dev::ServiceResponse;
use actix_web::error::ErrorInternalServerError;
use actix_web::http::header::{CONTENT_TYPE, HeaderMap};
use actix_web::web::Bytes;
use serde::Deserialize;

/// Media types whose bodies are complete JSON documents.
const JSON_MEDIA: &str = "application/json";
/// Media type of server-sent event streams.
pub(crate) const EVENT_STREAM_MEDIA: &str = "text/event-stream";

fn media_type(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(str::trim)
}

/// Whether the headers describe a buffered JSON document.
pub(crate) fn is_json(headers: &HeaderMap) -> bool {
    media_type(headers).is_some_and(|media| media.eq_ignore_ascii_case(JSON_MEDIA))
}

/// Whether the headers describe an event stream.
pub(crate) fn is_event_stream(headers: &HeaderMap) -> bool {
    media_type(headers).is_some_and(|media| media.eq_ignore_ascii_case(EVENT_STREAM_MEDIA))
}

/// Read a JSON response body into memory and put it back.
///
/// Non-JSON responses are boxed untouched and yield `None`.
pub(crate) async fn buffer_json<B>(
    res: ServiceResponse<B>,
) -> Result<(ServiceResponse<BoxBody>, Option<Bytes>), Error>
where
    B: MessageBody + 'static,
{
    if !is_json(res.headers()) {
        return Ok((res.map_into_boxed_body(), None));
    }
    let (req, res) = res.into_parts();
    let (head, body) = res.into_parts();
    let bytes = to_bytes(body).await.map_err(|err| {
        let err: Box<dyn std::error::Error> = err.into();
        ErrorInternalServerError(err.to_string())
    })?;
    let res = head.set_body(BoxBody::new(bytes.clone()));
    Ok((ServiceResponse::new(req, res), Some(bytes)))
}

#[derive(Deserialize)]
struct EnvelopeCode {
    #[serde(default)]
    code: i64,
}

/// Top-level `code` of an envelope, or 0 when absent or unparsable.
pub(crate) fn envelope_code(body: &[u8]) -> i64 {
    serde_json::from_slice::<EnvelopeCode>(body).map_or(0, |envelope| envelope.code)
}
