mod auth;
mod gate;
mod payment;
mod quiz;
mod util;

pub use auth::AuthConfig;
pub use gate::{Decision, GateConfig};
pub use payment::PaymentConfig;

use std::sync::Arc;

use dashmap::DashMap;
use engine::QuizEngine;
use http_body_util::Full;
use hyper::{
    body::{Bytes, Incoming},
    HeaderMap, Method, Request, Response, StatusCode,
};
use model::user::Session;

type HttpConnector = hyper_util::client::legacy::connect::HttpConnector;
pub(crate) type HttpsClient =
    hyper_util::client::legacy::Client<hyper_rustls::HttpsConnector<HttpConnector>, Full<Bytes>>;
pub(crate) type SessionRegistry = DashMap<u64, Session>;

pub(crate) struct Internal {
    /// The single authority over the quiz session.
    pub engine: QuizEngine,
    pub gate: GateConfig,
    /// Absent when the identity check is disabled; the auth routes then 404.
    pub auth: Option<auth::Auth>,
    /// Absent when the payment check is disabled.
    pub payment: Option<payment::Payments>,
    /// Container for all pending and signed-in browser sessions.
    pub sessions: SessionRegistry,
    /// Outbound HTTPS to the identity and payment providers.
    pub http: HttpsClient,
}

#[derive(Clone)]
pub struct App {
    inner: Arc<Internal>,
}

impl App {
    pub fn new(
        engine: QuizEngine,
        gate: GateConfig,
        auth: Option<AuthConfig>,
        payment: Option<PaymentConfig>,
    ) -> std::io::Result<Self> {
        let connector =
            hyper_rustls::HttpsConnectorBuilder::new().with_native_roots()?.https_only().enable_http1().build();
        let http = hyper_util::client::legacy::Client::builder(hyper_util::rt::TokioExecutor::new()).build(connector);
        Ok(Self {
            inner: Arc::new(Internal {
                engine,
                gate,
                auth: auth.map(auth::Auth::from),
                payment: payment.map(payment::Payments::from),
                sessions: DashMap::new(),
                http,
            }),
        })
    }

    /// Routes a request, absorbing handler errors into bare status codes.
    pub async fn respond(&self, req: Request<Incoming>) -> Response<Full<Bytes>> {
        let method = req.method().clone();
        let path = req.uri().path().to_owned();
        match self.try_respond(req).await {
            Ok(res) => res,
            Err(code) => {
                log::debug!("{method} {path} -> {code}");
                let mut res = Response::new(Full::default());
                *res.status_mut() = code;
                res
            }
        }
    }

    async fn try_respond(&self, req: Request<Incoming>) -> Result<Response<Full<Bytes>>, StatusCode> {
        let (parts, body) = req.into_parts();
        let inner = &*self.inner;
        match (&parts.method, parts.uri.path()) {
            (&Method::GET, "/api/quiz") => quiz::view(inner, &parts.headers),
            (&Method::POST, "/api/quiz/answer") => {
                self.authorize(&parts.headers)?;
                quiz::submit(inner, body).await
            }
            (&Method::POST, "/api/quiz/advance") => {
                self.authorize(&parts.headers)?;
                inner.engine.advance();
                quiz::snapshot(inner)
            }
            (&Method::POST, "/api/quiz/jump") => {
                self.authorize(&parts.headers)?;
                quiz::jump(inner, body).await
            }
            (&Method::POST, "/api/quiz/random") => {
                self.authorize(&parts.headers)?;
                inner.engine.jump_random();
                quiz::snapshot(inner)
            }
            (&Method::POST, "/api/quiz/reset") => {
                self.authorize(&parts.headers)?;
                inner.engine.reset();
                quiz::snapshot(inner)
            }
            (&Method::GET, "/auth/login") => auth::login::try_respond(inner),
            (&Method::GET, "/auth/callback") => {
                let query = parts.uri.query().unwrap_or_default().to_owned();
                auth::callback::try_respond(inner, &query, &parts.headers).await
            }
            (&Method::POST, "/api/verify-payment") => payment::try_respond(inner, &parts.headers).await,
            (
                _,
                "/api/quiz" | "/api/quiz/answer" | "/api/quiz/advance" | "/api/quiz/jump" | "/api/quiz/random"
                | "/api/quiz/reset" | "/auth/login" | "/auth/callback" | "/api/verify-payment",
            ) => Err(StatusCode::METHOD_NOT_ALLOWED),
            _ => Err(StatusCode::NOT_FOUND),
        }
    }

    /// Mutating quiz operations pass only when the gate allows rendering.
    fn authorize(&self, headers: &HeaderMap) -> Result<(), StatusCode> {
        let session = match util::session::extract_session(headers) {
            Ok(sid) => self.inner.sessions.get(&sid),
            Err(_) => None,
        };
        let session = session.as_ref().map(|entry| entry.value());
        if self.inner.gate.decide(session).allows() {
            Ok(())
        } else {
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}
