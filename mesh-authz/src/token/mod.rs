//! bearer token encoding
//!
//! A token is `base64(IV || AES-CFB(plaintext))` where the plaintext reads
//! `<nonce>::<kind>/<principal id>`:
//!
//! - the nonce is 8 lowercase hex characters drawn at random, so two tokens
//!   issued for the same principal differ
//! - the kind is [`USER_KIND`](crate::model::USER_KIND) or
//!   [`GROUP_KIND`](crate::model::GROUP_KIND)
//!
//! Decoding fails closed: any malformed input yields
//! [`error::Auth::TokenInvalid`], never a partial result.
use crate::crypto::{self, Salt};
use crate::error;
use crate::model::{Principal, GROUP_KIND, USER_KIND};
use rand_core::{CryptoRng, RngCore};

const NONCE_SEPARATOR: &str = "::";
const KIND_SEPARATOR: &str = "/";
const NONCE_LEN: usize = 4;

/// content of a decoded token
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedToken {
    pub nonce: String,
    pub principal: Principal,
}

/// seals and opens tokens with the configured salt
#[derive(Clone, Debug)]
pub struct TokenCodec {
    salt: Salt,
}

impl TokenCodec {
    pub fn new(salt: Salt) -> Self {
        TokenCodec { salt }
    }

    /// issues a new token for `principal`
    pub fn encode(&self, principal: &Principal) -> Result<String, error::Auth> {
        self.encode_with_rng(principal, &mut rand::rngs::OsRng)
    }

    pub fn encode_with_rng<T: RngCore + CryptoRng>(
        &self,
        principal: &Principal,
        rng: &mut T,
    ) -> Result<String, error::Auth> {
        let id = principal.id();
        if id.is_empty() {
            return Err(error::Auth::InvalidPrincipal(
                "user id and group id cannot both be empty".to_string(),
            ));
        }
        // the id must survive the split in `decode`
        if id.contains(KIND_SEPARATOR) || id.contains(NONCE_SEPARATOR) {
            return Err(error::Auth::InvalidPrincipal(format!(
                "principal id {:?} contains a reserved separator",
                id
            )));
        }

        let mut nonce = [0u8; NONCE_LEN];
        rng.fill_bytes(&mut nonce);

        let plaintext = format!(
            "{}{}{}{}{}",
            hex::encode(nonce),
            NONCE_SEPARATOR,
            principal.kind(),
            KIND_SEPARATOR,
            id
        );

        let sealed = crypto::encrypt(&self.salt, plaintext.as_bytes(), rng)?;
        Ok(base64::encode(sealed))
    }

    /// opens a token and extracts the principal it was issued for
    pub fn decode(&self, token: &str) -> Result<DecodedToken, error::Auth> {
        let sealed = base64::decode(token).map_err(error::Format::from)?;
        let plaintext = crypto::decrypt(&self.salt, &sealed)?;
        let plaintext = String::from_utf8(plaintext).map_err(|_| error::Format::NotUtf8)?;

        let parts: Vec<&str> = plaintext.split(NONCE_SEPARATOR).collect();
        if parts.len() != 2 {
            return Err(error::Format::MissingNonceSeparator.into());
        }

        let principal: Vec<&str> = parts[1].split(KIND_SEPARATOR).collect();
        if principal.len() != 2 {
            return Err(error::Format::MissingKindSeparator.into());
        }

        let (kind, id) = (principal[0], principal[1]);
        if id.is_empty() {
            return Err(error::Format::EmptyPrincipalId.into());
        }

        let principal = match kind {
            USER_KIND => Principal::User(id.to_string()),
            GROUP_KIND => Principal::Group(id.to_string()),
            other => return Err(error::Format::UnknownKind(other.to_string()).into()),
        };

        Ok(DecodedToken {
            nonce: parts[0].to_string(),
            principal,
        })
    }
}
