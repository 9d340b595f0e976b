use alloc::boxed::Box;
use serde::Deserialize;

/// One browser's authentication session, keyed by the `sid` cookie.
pub enum Session {
    /// A session currently in the consent page. Once the callback is
    /// triggered, the nonce will be used to verify the `state` query
    /// parameter. This should mitigate most instances of Cross-Site
    /// Request Forgery.
    Pending {
        /// One-time salt to be used for hashing the session.
        nonce: u64,
    },
    /// At this point, the OAuth callback parameters have been validated
    /// and the provider has told us who the user is.
    Valid {
        /// Email address reported by the provider's identity endpoint.
        email: Box<str>,
        /// Access token prefixed by its token type (typically `Bearer`),
        /// ready to be used as an `Authorization` header value.
        access: Box<str>,
        /// Whether a qualifying payment has been verified for this user.
        paid: bool,
    },
}

impl Session {
    pub const fn as_nonce(&self) -> Option<u64> {
        if let Self::Pending { nonce } = *self {
            Some(nonce)
        } else {
            None
        }
    }

    pub fn as_email(&self) -> Option<&str> {
        if let Self::Valid { email, .. } = self {
            Some(email)
        } else {
            None
        }
    }

    pub const fn has_paid(&self) -> bool {
        matches!(self, Self::Valid { paid: true, .. })
    }
}

/// Identity payload from the provider's user-info endpoint. Extra fields
/// are ignored; only the email matters to the gate.
#[derive(Deserialize)]
pub struct Identity {
    pub email: Box<str>,
}
