//! Rate limiting value types.

use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

/// Bucket shared by every request whose source address is unknown
pub const UNIDENTIFIED_CLIENT: &str = "unidentified";

/// Category of endpoint a quota applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EndpointClass {
    General,
    Login,
    Registration,
    PasswordReset,
    EmailSend,
}

impl EndpointClass {
    pub const ALL: [EndpointClass; 5] = [
        EndpointClass::General,
        EndpointClass::Login,
        EndpointClass::Registration,
        EndpointClass::PasswordReset,
        EndpointClass::EmailSend,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointClass::General => "general",
            EndpointClass::Login => "login",
            EndpointClass::Registration => "registration",
            EndpointClass::PasswordReset => "password-reset",
            EndpointClass::EmailSend => "email-send",
        }
    }
}

impl fmt::Display for EndpointClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies the client a rate-limit window is kept for
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientKey(String);

impl ClientKey {
    pub fn from_ip(ip: IpAddr) -> Self {
        Self(ip.to_string())
    }

    /// Parses an address as reported by the transport or a proxy header.
    ///
    /// Anything missing or unparseable collapses into [`UNIDENTIFIED_CLIENT`],
    /// so such requests share one strict bucket instead of escaping the limiter.
    pub fn parse(raw: Option<&str>) -> Self {
        raw.map(str::trim)
            .and_then(parse_address)
            .map(Self::from_ip)
            .unwrap_or_else(Self::unidentified)
    }

    pub fn unidentified() -> Self {
        Self(UNIDENTIFIED_CLIENT.to_string())
    }

    pub fn is_unidentified(&self) -> bool {
        self.0 == UNIDENTIFIED_CLIENT
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Accepts a bare address or `address:port` / `[v6]:port`
fn parse_address(raw: &str) -> Option<IpAddr> {
    if let Ok(ip) = raw.parse::<IpAddr>() {
        return Some(ip);
    }
    raw.parse::<std::net::SocketAddr>().ok().map(|addr| addr.ip())
}

/// Admission granted by the rate limiter.
///
/// For classes that skip successful requests the ticket is handed back via
/// `RateLimiter::release` once the response is known to be a success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitTicket {
    pub class: EndpointClass,
    /// Counter key, `None` when limiting is disabled
    pub key: Option<String>,
    /// Window the request was counted in
    pub window: u64,
    pub limit: u32,
    pub remaining: u32,
    /// Seconds until the current window resets
    pub reset_after_seconds: u64,
    pub release_on_success: bool,
}

impl RateLimitTicket {
    /// Ticket for a request that was not counted
    pub fn unmetered(class: EndpointClass, limit: u32) -> Self {
        Self {
            class,
            key: None,
            window: 0,
            limit,
            remaining: limit,
            reset_after_seconds: 0,
            release_on_success: false,
        }
    }
}
