use http_body_util::{BodyExt, Full};
use hyper::{
    body::Bytes,
    header::{HeaderValue, AUTHORIZATION, LOCATION},
    HeaderMap, Request, Response, StatusCode,
};
use model::{
    oauth::TokenResponse,
    user::{Identity, Session},
};

use crate::{util, Internal};

/// Completes the authorization-code flow: validates the `state` hash
/// against the pending session, exchanges the code for a token, asks the
/// provider who the user is, and upgrades the session.
pub(crate) async fn try_respond(
    inner: &Internal,
    query: &str,
    headers: &HeaderMap,
) -> Result<Response<Full<Bytes>>, StatusCode> {
    let auth = inner.auth.as_ref().ok_or(StatusCode::NOT_FOUND)?;
    let sid = util::session::extract_session(headers)?;

    let nonce = inner
        .sessions
        .get(&sid)
        .ok_or(StatusCode::UNAUTHORIZED)?
        .as_nonce()
        .ok_or(StatusCode::FORBIDDEN)?;

    // Hash the salted session ID
    let hash = util::session::hash_session_salted_with_nonce(sid, nonce).finalize();

    // Parse the `state` parameter as raw bytes
    let (req, state) = auth.exchanger.generate_token_request(query).ok_or(StatusCode::BAD_REQUEST)?;
    let mut state_buf = [0; 32];
    hex::decode_to_slice(state, &mut state_buf).map_err(|_| StatusCode::BAD_REQUEST)?;

    // Validate whether the hash of the session matches
    if hash.as_bytes().ne(&state_buf) {
        log::error!("OAuth state does not match with hash");
        return Err(StatusCode::BAD_REQUEST);
    }

    let response = inner.http.request(req).await.map_err(|_| StatusCode::BAD_GATEWAY)?;
    let bytes = response.into_body().collect().await.map_err(|_| StatusCode::BAD_GATEWAY)?.to_bytes();
    let TokenResponse { access, .. } =
        serde_json::from_slice(&bytes).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    log::info!("received OAuth token from the identity provider");

    let mut req = Request::new(Full::default());
    *req.uri_mut() = auth.identity_url.clone();
    let bearer = HeaderValue::from_str(&access).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    assert!(!req.headers_mut().append(AUTHORIZATION, bearer));

    let response = inner.http.request(req).await.map_err(|_| StatusCode::BAD_GATEWAY)?;
    let bytes = response.into_body().collect().await.map_err(|_| StatusCode::BAD_GATEWAY)?.to_bytes();
    let Identity { email } = serde_json::from_slice(&bytes).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    log::info!("signed in {email}");

    inner.sessions.insert(sid, Session::Valid { email, access, paid: false });

    let mut res = Response::new(Full::default());
    *res.status_mut() = StatusCode::FOUND;
    assert!(!res.headers_mut().append(LOCATION, HeaderValue::from_static("/")));
    Ok(res)
}
