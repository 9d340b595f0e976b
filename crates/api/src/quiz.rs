use engine::Snapshot;
use http_body_util::{BodyExt, Full};
use hyper::{
    body::{Bytes, Incoming},
    header::{HeaderValue, CONTENT_TYPE},
    HeaderMap, Response, StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::{gate::Decision, util, Internal};

/// One of the gate's three render-time outcomes, as the client sees it.
#[derive(Serialize)]
#[serde(tag = "view", rename_all = "camelCase")]
enum ViewBody {
    SignIn,
    Quiz {
        quiz: Snapshot,
    },
    #[serde(rename_all = "camelCase")]
    QuizWithIdentity {
        email: Box<str>,
        quiz: Snapshot,
    },
}

pub(crate) fn json_response<T: Serialize>(value: &T) -> Result<Response<Full<Bytes>>, StatusCode> {
    let bytes = serde_json::to_vec(value).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    let mut res = Response::new(Full::from(bytes));
    assert!(res.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static("application/json")).is_none());
    Ok(res)
}

pub(crate) fn view(inner: &Internal, headers: &HeaderMap) -> Result<Response<Full<Bytes>>, StatusCode> {
    let session = match util::session::extract_session(headers) {
        Ok(sid) => inner.sessions.get(&sid),
        Err(_) => None,
    };
    let session = session.as_ref().map(|entry| entry.value());
    let body = match inner.gate.decide(session) {
        Decision::SignIn => ViewBody::SignIn,
        Decision::Quiz => ViewBody::Quiz { quiz: inner.engine.snapshot() },
        Decision::QuizWithIdentity(email) => ViewBody::QuizWithIdentity { email, quiz: inner.engine.snapshot() },
    };
    json_response(&body)
}

pub(crate) fn snapshot(inner: &Internal) -> Result<Response<Full<Bytes>>, StatusCode> {
    json_response(&inner.engine.snapshot())
}

#[derive(Deserialize)]
struct SubmitBody {
    answer: String,
}

pub(crate) async fn submit(inner: &Internal, body: Incoming) -> Result<Response<Full<Bytes>>, StatusCode> {
    let bytes = body.collect().await.map_err(|_| StatusCode::BAD_REQUEST)?.to_bytes();
    let SubmitBody { answer } = serde_json::from_slice(&bytes).map_err(|_| StatusCode::BAD_REQUEST)?;
    match inner.engine.submit_answer(&answer) {
        Ok(_) => snapshot(inner),
        Err(engine::Error::RevealInProgress | engine::Error::Completed) => Err(StatusCode::CONFLICT),
        Err(engine::Error::EmptyStore) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

#[derive(Deserialize)]
struct JumpBody {
    /// One-based question number, as displayed.
    question: usize,
}

/// Out-of-range jumps are silently ignored: the response is simply the
/// unchanged snapshot.
pub(crate) async fn jump(inner: &Internal, body: Incoming) -> Result<Response<Full<Bytes>>, StatusCode> {
    let bytes = body.collect().await.map_err(|_| StatusCode::BAD_REQUEST)?.to_bytes();
    let JumpBody { question } = serde_json::from_slice(&bytes).map_err(|_| StatusCode::BAD_REQUEST)?;
    inner.engine.jump_to(question);
    snapshot(inner)
}
