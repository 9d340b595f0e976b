use model::user::Session;

/// Configuration recognized by the access gate. A disabled check is
/// treated as automatically satisfied.
#[derive(Clone, Copy, Debug)]
pub struct GateConfig {
    pub auth_enabled: bool,
    pub payment_enabled: bool,
    /// Smallest successful payment (in cents) that satisfies the payment
    /// check.
    pub minimum_payment_amount_cents: u32,
}

/// The three mutually exclusive render-time outcomes.
#[derive(Debug, PartialEq, Eq)]
pub enum Decision {
    /// The gate denies the quiz; prompt the user to sign in (and pay).
    SignIn,
    /// The quiz renders anonymously; there is no identity to show.
    Quiz,
    /// The quiz renders with the signed-in user's identity strip.
    QuizWithIdentity(Box<str>),
}

impl Decision {
    pub const fn allows(&self) -> bool {
        !matches!(self, Self::SignIn)
    }
}

impl GateConfig {
    /// Applies the two independently toggleable checks to the session.
    pub fn decide(&self, session: Option<&Session>) -> Decision {
        let email = session.and_then(Session::as_email);
        if self.auth_enabled && email.is_none() {
            return Decision::SignIn;
        }
        if self.payment_enabled && !session.is_some_and(Session::has_paid) {
            return Decision::SignIn;
        }
        match email {
            Some(email) => Decision::QuizWithIdentity(email.into()),
            None => Decision::Quiz,
        }
    }
}
