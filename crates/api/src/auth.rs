pub(crate) mod callback;
pub(crate) mod login;

use http_body_util::Full;
use hyper::{
    body::Bytes,
    header::{HeaderValue, CONTENT_TYPE},
    Method, Request, Uri,
};

/// Where to find the identity provider. The vendor is deliberately
/// unspecified: any authorization-code OAuth provider with an
/// email-bearing user-info endpoint fits.
pub struct AuthConfig {
    pub client_id: Box<str>,
    pub client_secret: Box<str>,
    /// Consent-page URL, without query parameters.
    pub authorize_url: Box<str>,
    pub token_url: Uri,
    /// User-info endpoint answering to the access token.
    pub identity_url: Uri,
    pub redirect_url: Box<str>,
}

pub(crate) struct Auth {
    pub redirect: Redirect,
    pub exchanger: CodeExchanger,
    pub identity_url: Uri,
}

impl From<AuthConfig> for Auth {
    fn from(config: AuthConfig) -> Self {
        let redirect = Redirect::new(&config.authorize_url, &config.client_id, &config.redirect_url);
        let exchanger =
            CodeExchanger::new(&config.client_id, &config.client_secret, &config.redirect_url, config.token_url);
        Self { redirect, exchanger, identity_url: config.identity_url }
    }
}

pub(crate) struct Redirect(Box<str>);

impl Redirect {
    fn new(authorize_url: &str, id: &str, redirect_uri: &str) -> Self {
        let form = format!(
            "{authorize_url}?response_type=code&scope=openid%20email&client_id={id}&redirect_uri={redirect_uri}&state="
        );
        Self(form.into_boxed_str())
    }

    pub fn generate_consent_page_uri(&self, state: &str) -> Box<str> {
        let uri = self.0.clone().into_string() + state;
        uri.into_boxed_str()
    }
}

fn parse_code_and_state(query: &str) -> Option<(&str, &str)> {
    let mut code = None;
    let mut state = None;

    for chunk in query.split('&') {
        let (key, value) = match chunk.split_once('=') {
            Some(pair) => pair,
            _ => continue,
        };
        let target = match key {
            "code" => &mut code,
            "state" => &mut state,
            _ => continue,
        };
        *target = Some(value);
    }

    code.zip(state)
}

pub(crate) struct CodeExchanger {
    form: Box<str>,
    token_url: Uri,
}

impl CodeExchanger {
    fn new(id: &str, secret: &str, redirect_uri: &str, token_url: Uri) -> Self {
        let form = format!(
            "grant_type=authorization_code&client_id={id}&client_secret={secret}&redirect_uri={redirect_uri}&code="
        );
        Self { form: form.into_boxed_str(), token_url }
    }

    fn generate_token_request<'q>(&self, query: &'q str) -> Option<(Request<Full<Bytes>>, &'q str)> {
        let (code, state) = parse_code_and_state(query)?;
        let full = self.form.clone().into_string() + code;

        let mut req = Request::new(Full::from(full.into_bytes()));
        *req.method_mut() = Method::POST;
        *req.uri_mut() = self.token_url.clone();
        assert!(!req
            .headers_mut()
            .append(CONTENT_TYPE, HeaderValue::from_static("application/x-www-form-urlencoded")));

        Some((req, state))
    }
}
