//! Shared access signature (SAS) generation.
//!
//! A token binds a resource URL, an expiry instant and a policy name with an
//! HMAC-SHA256 keyed by the policy's access key:
//!
//! ```text
//! sr  = form_urlencode(resource)
//! se  = unix_seconds(now + 300s), rounded to the nearest second
//! sig = form_urlencode(base64(HMAC-SHA256(key, sr + "\n" + se)))
//!
//! Authorization: SharedAccessSignature sig=<sig>&se=<se>&skn=<key name>&sr=<sr>
//! ```
//!
//! Tokens are short-lived and must be generated per request. [`sign_at`] takes
//! the clock reading explicitly so that signing stays a pure function.
//!
//! # Examples
//!
//! ```
//! use servicebus_http::auth::{sign_at, Credentials, SasToken};
//! use std::time::{Duration, UNIX_EPOCH};
//!
//! let creds: Credentials = "Endpoint=sb://contoso.servicebus.windows.net/;\
//!     SharedAccessKeyName=send;SharedAccessKey=secret"
//!     .parse()
//!     .unwrap();
//!
//! let now = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
//! let token = sign_at(&creds, creds.endpoint().as_str(), now).unwrap();
//! assert_eq!(token.expiry(), 1_700_000_300);
//!
//! let header = token.to_string();
//! assert!(header.starts_with("SharedAccessSignature sig="));
//!
//! let parsed: SasToken = header.parse().unwrap();
//! assert!(parsed.verify(b"secret", now));
//! ```

use crate::auth::Credentials;
use crate::error::{Result, ServiceBusError};
use crate::protocol::constants::{SAS_SCHEME, TOKEN_TTL_SECS};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use url::form_urlencoded;

type HmacSha256 = Hmac<Sha256>;

/// A generated shared access signature.
///
/// `Display` renders the `Authorization` header value; `FromStr` parses one.
#[derive(Clone, PartialEq, Eq)]
pub struct SasToken {
    signature: String,
    expiry: u64,
    key_name: String,
    resource: String,
}

impl SasToken {
    /// Base64 HMAC digest, not percent-encoded.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Expiry as seconds since the Unix epoch.
    pub fn expiry(&self) -> u64 {
        self.expiry
    }

    /// Name of the access policy that signed the token.
    pub fn key_name(&self) -> &str {
        &self.key_name
    }

    /// Resource URL the token is scoped to, not percent-encoded.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Check the signature against `access_key` and reject expired tokens.
    ///
    /// The digest comparison is constant-time.
    pub fn verify(&self, access_key: &[u8], now: SystemTime) -> bool {
        let Ok(now) = now.duration_since(UNIX_EPOCH) else {
            return false;
        };
        if self.expiry <= now.as_secs() {
            return false;
        }
        let Ok(expected) = STANDARD.decode(&self.signature) else {
            return false;
        };
        let Ok(mut mac) = HmacSha256::new_from_slice(access_key) else {
            return false;
        };
        mac.update(string_to_sign(&encode(&self.resource), self.expiry).as_bytes());
        mac.verify_slice(&expected).is_ok()
    }
}

impl fmt::Display for SasToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} sig={}&se={}&skn={}&sr={}",
            SAS_SCHEME,
            encode(&self.signature),
            self.expiry,
            self.key_name,
            encode(&self.resource)
        )
    }
}

// The digest is a bearer credential for its lifetime.
impl fmt::Debug for SasToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SasToken")
            .field("signature", &"[REDACTED]")
            .field("expiry", &self.expiry)
            .field("key_name", &self.key_name)
            .field("resource", &self.resource)
            .finish()
    }
}

impl FromStr for SasToken {
    type Err = ServiceBusError;

    fn from_str(s: &str) -> Result<Self> {
        let fields = s
            .trim()
            .strip_prefix(SAS_SCHEME)
            .map(str::trim_start)
            .ok_or_else(|| ServiceBusError::Signature(format!("missing {SAS_SCHEME} scheme")))?;

        let mut signature = None;
        let mut expiry = None;
        let mut key_name = None;
        let mut resource = None;

        for (name, value) in form_urlencoded::parse(fields.as_bytes()) {
            match name.as_ref() {
                "sig" => signature = Some(value.into_owned()),
                "se" => {
                    expiry = Some(value.parse::<u64>().map_err(|_| {
                        ServiceBusError::Signature(format!("invalid expiry '{value}'"))
                    })?)
                }
                "skn" => key_name = Some(value.into_owned()),
                "sr" => resource = Some(value.into_owned()),
                _ => {}
            }
        }

        let field = |name: &str| ServiceBusError::Signature(format!("token is missing '{name}'"));
        Ok(SasToken {
            signature: signature.ok_or_else(|| field("sig"))?,
            expiry: expiry.ok_or_else(|| field("se"))?,
            key_name: key_name.ok_or_else(|| field("skn"))?,
            resource: resource.ok_or_else(|| field("sr"))?,
        })
    }
}

/// Sign `resource` with the current system time.
///
/// # Errors
///
/// See [`sign_at`].
pub fn sign(credentials: &Credentials, resource: &str) -> Result<SasToken> {
    sign_at(credentials, resource, SystemTime::now())
}

/// Sign `resource` as if the current time were `now`.
///
/// The token expires [`TOKEN_TTL_SECS`] seconds after `now`, rounded to the
/// nearest whole second.
///
/// # Errors
///
/// Returns [`ServiceBusError::Signature`] if `now` precedes the Unix epoch.
pub fn sign_at(credentials: &Credentials, resource: &str, now: SystemTime) -> Result<SasToken> {
    let expiry = expiry_at(now)?;
    let mut mac = HmacSha256::new_from_slice(credentials.access_key())
        .map_err(|e| ServiceBusError::Signature(e.to_string()))?;
    mac.update(string_to_sign(&encode(resource), expiry).as_bytes());
    let signature = STANDARD.encode(mac.finalize().into_bytes());

    Ok(SasToken {
        signature,
        expiry,
        key_name: credentials.key_name().to_string(),
        resource: resource.to_string(),
    })
}

fn expiry_at(now: SystemTime) -> Result<u64> {
    let deadline = now
        .duration_since(UNIX_EPOCH)
        .map_err(|e| ServiceBusError::Signature(format!("system clock before Unix epoch: {e}")))?
        + Duration::from_secs(TOKEN_TTL_SECS);
    let round_up = u64::from(deadline.subsec_nanos() >= 500_000_000);
    Ok(deadline.as_secs() + round_up)
}

fn string_to_sign(encoded_resource: &str, expiry: u64) -> String {
    format!("{encoded_resource}\n{expiry}")
}

fn encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
