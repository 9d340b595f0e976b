use alloc::{
    boxed::Box,
    fmt::{self, Formatter},
};
use core::num::NonZeroU64;
use serde::{
    de::{IgnoredAny, MapAccess, Visitor},
    Deserialize, Deserializer,
};

pub struct TokenResponse {
    /// Access token prefixed with the token type (typically `Bearer`).
    pub access: Box<str>,
    /// Refresh token, if the provider issues one.
    pub refresh: Option<Box<str>>,
    /// Number of seconds until expiration.
    pub expires: NonZeroU64,
}

struct TokenVisitor;

#[derive(Deserialize)]
#[serde(untagged)]
enum StrOrNum<'txt> {
    Str(&'txt str),
    Num(NonZeroU64),
}

impl<'de> Visitor<'de> for TokenVisitor {
    type Value = TokenResponse;

    fn expecting(&self, formatter: &mut Formatter) -> fmt::Result {
        formatter.write_str("a valid token response")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        use serde::de::{Error, Unexpected};

        let mut access = None::<Box<str>>;
        let mut refresh = None::<Box<str>>;
        let mut expires = None::<NonZeroU64>;
        let mut bearer = false;

        while let Some(key) = map.next_key::<&str>()? {
            match key {
                "access_token" if access.is_some() => return Err(A::Error::duplicate_field("access_token")),
                "refresh_token" if refresh.is_some() => return Err(A::Error::duplicate_field("refresh_token")),
                "expires_in" if expires.is_some() => return Err(A::Error::duplicate_field("expires_in")),
                "token_type" if bearer => return Err(A::Error::duplicate_field("token_type")),
                "access_token" => {
                    let token: &str = map.next_value()?;
                    let text = alloc::format!("Bearer {token}");
                    access = Some(text.into_boxed_str());
                }
                "refresh_token" => refresh = Some(map.next_value::<&str>()?.into()),
                "expires_in" => {
                    expires = Some(match map.next_value()? {
                        StrOrNum::Num(num) => num,
                        StrOrNum::Str(val) => {
                            let unexp = Unexpected::Str(val);
                            return Err(A::Error::invalid_type(unexp, &"number"));
                        }
                    })
                }
                "token_type" => match map.next_value::<&str>()? {
                    "Bearer" => bearer = true,
                    val => {
                        let unexp = Unexpected::Str(val);
                        return Err(A::Error::invalid_value(unexp, &"Bearer"));
                    }
                },
                // Providers send `scope`, `id_token`, and friends; skip them.
                _ => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }

        if !bearer {
            return Err(A::Error::missing_field("token_type"));
        }

        Ok(Self::Value {
            access: access.ok_or_else(|| A::Error::missing_field("access_token"))?,
            refresh,
            expires: expires.ok_or_else(|| A::Error::missing_field("expires_in"))?,
        })
    }
}

impl<'de> Deserialize<'de> for TokenResponse {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(TokenVisitor)
    }
}
