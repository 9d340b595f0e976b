use http_body_util::{BodyExt, Full};
use hyper::{
    body::Bytes,
    header::{HeaderValue, AUTHORIZATION},
    HeaderMap, Request, Response, StatusCode, Uri,
};
use serde::{Deserialize, Serialize};

use crate::{quiz, util, Internal};

/// Where to ask about payments. As with auth, the vendor is configuration:
/// any API listing a customer's payments by email works.
pub struct PaymentConfig {
    /// Payment-list endpoint; the customer email is appended as a query
    /// parameter.
    pub endpoint: Box<str>,
    /// Secret API key, sent as a bearer token.
    pub secret: Box<str>,
}

pub(crate) struct Payments {
    lookup_prefix: Box<str>,
    secret: Box<str>,
}

impl From<PaymentConfig> for Payments {
    fn from(config: PaymentConfig) -> Self {
        let lookup_prefix = format!("{}?email=", config.endpoint).into_boxed_str();
        Self { lookup_prefix, secret: config.secret }
    }
}

#[derive(Deserialize)]
struct PaymentList {
    data: Vec<PaymentRecord>,
}

#[derive(Deserialize)]
struct PaymentRecord {
    status: Box<str>,
    /// Amount in cents.
    amount: u32,
}

fn meets_minimum(list: &PaymentList, minimum: u32) -> bool {
    list.data.iter().any(|payment| payment.status.as_ref() == "succeeded" && payment.amount >= minimum)
}

impl Payments {
    fn lookup_request(&self, email: &str) -> Result<Request<Full<Bytes>>, StatusCode> {
        let uri: Uri =
            format!("{}{email}", self.lookup_prefix).parse().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        let bearer = format!("Bearer {}", self.secret);
        let mut req = Request::new(Full::default());
        *req.uri_mut() = uri;
        let bearer = HeaderValue::from_str(&bearer).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        assert!(!req.headers_mut().append(AUTHORIZATION, bearer));
        Ok(req)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Verdict<'a> {
    has_paid: bool,
    email: &'a str,
}

/// Checks whether the signed-in user has a qualifying payment, caching a
/// positive verdict on the session.
pub(crate) async fn try_respond(inner: &Internal, headers: &HeaderMap) -> Result<Response<Full<Bytes>>, StatusCode> {
    let payments = inner.payment.as_ref().ok_or(StatusCode::NOT_FOUND)?;
    let sid = util::session::extract_session(headers)?;

    let (email, cached) = {
        let session = inner.sessions.get(&sid).ok_or(StatusCode::UNAUTHORIZED)?;
        let email = session.as_email().ok_or(StatusCode::UNAUTHORIZED)?;
        (Box::<str>::from(email), session.has_paid())
    };
    if cached {
        return quiz::json_response(&Verdict { has_paid: true, email: &email });
    }

    let req = payments.lookup_request(&email)?;
    let response = inner.http.request(req).await.map_err(|_| StatusCode::BAD_GATEWAY)?;
    let bytes = response.into_body().collect().await.map_err(|_| StatusCode::BAD_GATEWAY)?.to_bytes();
    let list: PaymentList = serde_json::from_slice(&bytes).map_err(|_| StatusCode::BAD_GATEWAY)?;

    let has_paid = meets_minimum(&list, inner.gate.minimum_payment_amount_cents);
    if has_paid {
        if let Some(mut session) = inner.sessions.get_mut(&sid) {
            if let model::user::Session::Valid { paid, .. } = &mut *session {
                *paid = true;
            }
        }
    } else {
        log::info!("no qualifying payment found for {email}");
    }
    quiz::json_response(&Verdict { has_paid, email: &email })
}
