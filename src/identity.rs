//! Bearer credential resolution seam
//!
//! Production resolvers live in the web layer behind [`IdentityResolver`],
//! constructed once per process and reused across requests. The crate only
//! ships the non-production fallback.

use crate::error::IdentityError;

pub trait IdentityResolver: Send + Sync {
    /// Resolve a bearer credential to a stable user id.
    fn resolve(&self, bearer: &str) -> Result<String, IdentityError>;
}

/// Development-only resolver. The bearer IS a bech32 `user_` id and is
/// accepted after an unverified decode. Must never be enabled where the
/// system is reachable by untrusted clients; construction is refused unless
/// the insecure switch is set explicitly.
pub struct DevIdentityResolver {
    _private: (),
}

impl DevIdentityResolver {
    pub fn new(allow_insecure_identity: bool) -> Result<Self, IdentityError> {
        if !allow_insecure_identity {
            return Err(IdentityError::InsecureResolverDisabled);
        }
        Ok(Self { _private: () })
    }
}

impl IdentityResolver for DevIdentityResolver {
    fn resolve(&self, bearer: &str) -> Result<String, IdentityError> {
        let token = bearer
            .strip_prefix("Bearer ")
            .unwrap_or(bearer)
            .trim();
        if token.is_empty() {
            return Err(IdentityError::MissingBearer);
        }

        // unverified decode, checks shape only
        let (hrp, _) = bech32::decode(token).map_err(|_| IdentityError::InvalidBearer)?;
        let expected = bech32::Hrp::parse("user_").map_err(|_| IdentityError::InvalidBearer)?;
        if hrp != expected {
            return Err(IdentityError::InvalidBearer);
        }

        Ok(token.to_string())
    }
}
