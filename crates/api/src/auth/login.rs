use dashmap::mapref::entry::Entry::Vacant;
use http_body_util::Full;
use hyper::{
    body::Bytes,
    header::{HeaderValue, LOCATION, SET_COOKIE},
    Response, StatusCode,
};
use model::user::Session;

use crate::{util, Internal};

/// Issues a fresh pending session and redirects to the consent page.
pub(crate) fn try_respond(inner: &Internal) -> Result<Response<Full<Bytes>>, StatusCode> {
    let auth = inner.auth.as_ref().ok_or(StatusCode::NOT_FOUND)?;

    let nonce: u64 = rand::random();
    let sid: u64 = loop {
        let candidate = rand::random();
        if let Vacant(entry) = inner.sessions.entry(candidate) {
            entry.insert(Session::Pending { nonce });
            break candidate;
        }
    };

    let hash = util::session::hash_session_salted_with_nonce(sid, nonce).finalize();
    let state = hex::encode(hash.as_bytes());
    let uri = auth.redirect.generate_consent_page_uri(&state);
    log::info!("redirecting session {sid:016x} to the consent page");

    let cookie = format!("sid={sid:016x}; HttpOnly; SameSite=Lax; Path=/");
    let mut res = Response::new(Full::default());
    *res.status_mut() = StatusCode::FOUND;
    let headers = res.headers_mut();
    let location = HeaderValue::from_str(&uri).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    let cookie = HeaderValue::from_str(&cookie).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    assert!(!headers.append(LOCATION, location));
    assert!(!headers.append(SET_COOKIE, cookie));
    Ok(res)
}
