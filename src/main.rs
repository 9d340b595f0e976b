use std::{env, fs::File, io::BufReader, net::Ipv4Addr};

use api::{App, AuthConfig, GateConfig, PaymentConfig};
use engine::{QuizEngine, RevealTiming};
use hyper::{server::conn::http1, service};
use hyper_util::rt::TokioIo;
use model::quiz::Question;
use store::SessionStore;
use tokio::{net::TcpListener, runtime::Runtime, signal};

fn flag(key: &str) -> bool {
    env::var(key).map_or(false, |value| value == "1" || value.eq_ignore_ascii_case("true"))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    // Parse environment variables
    let port: u16 = env::var("PORT")?.parse()?;
    let quiz_path = env::var("QUIZ_DATA")?;
    let state_dir = env::var("STATE_DIR")?;

    let auth_enabled = flag("AUTH_ENABLED");
    let payment_enabled = flag("PAYMENT_ENABLED");
    let minimum_payment_amount_cents = match env::var("MIN_PAYMENT_CENTS") {
        Ok(cents) => cents.parse()?,
        _ => 499,
    };
    let gate = GateConfig { auth_enabled, payment_enabled, minimum_payment_amount_cents };

    // The payment check leans on the signed-in identity, so the auth
    // configuration is required whenever either check is on.
    let auth = if auth_enabled || payment_enabled {
        Some(AuthConfig {
            client_id: env::var("OAUTH_CLIENT_ID")?.into_boxed_str(),
            client_secret: env::var("OAUTH_CLIENT_SECRET")?.into_boxed_str(),
            authorize_url: env::var("OAUTH_AUTHORIZE_URL")?.into_boxed_str(),
            token_url: env::var("OAUTH_TOKEN_URL")?.parse()?,
            identity_url: env::var("OAUTH_IDENTITY_URL")?.parse()?,
            redirect_url: env::var("OAUTH_REDIRECT_URL")?.into_boxed_str(),
        })
    } else {
        None
    };
    let payment = if payment_enabled {
        Some(PaymentConfig {
            endpoint: env::var("PAYMENT_API_URL")?.into_boxed_str(),
            secret: env::var("PAYMENT_API_SECRET")?.into_boxed_str(),
        })
    } else {
        None
    };

    // Load the question store once for the whole session
    let file = File::open(&quiz_path)?;
    let questions: Vec<Question> = serde_json::from_reader(BufReader::new(file))?;
    anyhow::ensure!(!questions.is_empty(), "question store {quiz_path} is empty");
    log::info!("loaded {} questions from {quiz_path}", questions.len());

    let runtime = Runtime::new()?;
    runtime.block_on(async {
        let store = SessionStore::new(state_dir.as_ref());
        let engine = QuizEngine::new(questions, RevealTiming::default(), store).await?;
        let app = App::new(engine, gate, auth, payment)?;

        let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).await?;
        log::info!("listening on port {port}");

        loop {
            let stream = tokio::select! {
                accepted = listener.accept() => accepted?.0,
                result = signal::ctrl_c() => {
                    result?;
                    log::info!("shutting down");
                    break;
                }
            };
            let io = TokioIo::new(stream);
            let outer = app.clone();
            tokio::spawn(async move {
                let service = service::service_fn(move |req| {
                    let app = outer.clone();
                    async move { Ok::<_, core::convert::Infallible>(app.respond(req).await) }
                });
                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    log::error!("connection error: {err}");
                }
            });
        }
        anyhow::Ok(())
    })?;
    Ok(())
}
