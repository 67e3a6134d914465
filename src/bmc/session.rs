// Login response parsing: validates the BMC's reply and pulls out the session token.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::{LOGIN_SUCCESS_STATUS, SESSION_COOKIE_NAME};
use crate::error::{LaunchError, Result};

static STATUS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"HAPI_STATUS:(\d+)").expect("status pattern"));

static SESSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"'SESSION_COOKIE' : '([^'\n]*)'").expect("session pattern"));

const CONTEXT: &str = "Could not get session cookie";

/// Session token issued by the BMC for this run.
#[derive(Clone, PartialEq, Eq)]
pub struct Session(String);

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn token(&self) -> &str {
        &self.0
    }

    /// Value for the `Cookie` header of authenticated requests.
    pub fn cookie_header(&self) -> String {
        format!("{}={}", SESSION_COOKIE_NAME, self.0)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Session(<redacted>)")
    }
}

/// Parse the body returned by the login endpoint.
///
/// The body must carry exactly one `HAPI_STATUS:<n>` token whose value is the
/// success sentinel, and exactly one `'SESSION_COOKIE' : '<token>'` field.
pub fn parse_login_response(body: &str) -> Result<Session> {
    let statuses: Vec<&str> = STATUS_PATTERN
        .captures_iter(body)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();
    let sessions: Vec<&str> = SESSION_PATTERN
        .captures_iter(body)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();

    if statuses.is_empty() || sessions.is_empty() {
        return Err(LaunchError::protocol(
            CONTEXT,
            "Unable to find required elements on page",
        ));
    }

    if statuses.len() != 1 {
        return Err(LaunchError::protocol(
            CONTEXT,
            format!("Wrong number of status codes ({})", statuses.len()),
        ));
    }

    // Digits only, so the parse can fail solely on overflow.
    let status: u32 = statuses[0].parse().map_err(|_| {
        LaunchError::protocol(CONTEXT, format!("Unreadable HAPI_STATUS code: {}", statuses[0]))
    })?;
    if status != LOGIN_SUCCESS_STATUS {
        return Err(LaunchError::AuthRejected { status });
    }

    if sessions.len() != 1 {
        return Err(LaunchError::protocol(
            CONTEXT,
            format!("Wrong number of session cookies ({})", sessions.len()),
        ));
    }

    Ok(Session::new(sessions[0]))
}
