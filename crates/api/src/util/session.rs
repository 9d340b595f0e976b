use hyper::{HeaderMap, StatusCode};

/// Extracts the session ID from the `sid` cookie.
pub fn extract_session(headers: &HeaderMap) -> Result<u64, StatusCode> {
    let raw = headers
        .get("Cookie")
        .ok_or(StatusCode::UNAUTHORIZED)?
        .as_bytes()
        .split(|&byte| byte == b';')
        .map(|section| section.strip_prefix(b" ").unwrap_or(section))
        .filter_map(|section| {
            let mid = section.iter().copied().position(|byte| byte == b'=')?;
            let (left, right) = section.split_at(mid);
            Some((left, &right[1..]))
        })
        .find_map(|(key, session)| (key == b"sid").then_some(session))
        .ok_or(StatusCode::UNAUTHORIZED)?;
    let text = core::str::from_utf8(raw).map_err(|_| StatusCode::BAD_REQUEST)?;
    u64::from_str_radix(text, 16).map_err(|_| StatusCode::BAD_REQUEST)
}

/// First creates a "salted session" by appending the session ID with a
/// nonce. The result is then hashed with the Blake3 hashing algorithm.
/// This function returns the resulting [`Hasher`](blake3::Hasher); see the
/// linked documentation for retrieving the digest.
pub fn hash_session_salted_with_nonce(session: u64, nonce: u64) -> blake3::Hasher {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&session.to_be_bytes()).update(&nonce.to_be_bytes());
    hasher
}
