// ================
// common/src/lib.rs
// ================
//! Common types shared between the `PassGuard` decision engine and its hosts.
//! This module defines the request-context and wire types the gate and the
//! HTTP handlers exchange.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unix timestamp in whole seconds. Zero means "unset".
pub type UnixSeconds = i64;

/// Opaque user identity. The engine never interprets it; it is only a key
/// into the timestamp store.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        UserId(s.to_string())
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        UserId(s)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How the current request was made.
///
/// Only full interactive page navigations are ever redirected; anything
/// programmatic (AJAX, REST, background jobs) must never be bounced to the
/// profile page mid-call.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RequestClass {
    /// A full page navigation by a person in a browser.
    InteractivePage,
    /// AJAX, REST, or any other headless/asynchronous call.
    BackgroundOrProgrammatic,
}

/// Everything the gate needs to know about the request being decided.
///
/// Hosts build one of these per request (the bundled axum middleware does it
/// from headers and extensions) and hand it to the gate; the gate itself
/// never touches the request pipeline.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Authenticated user, or `None` for anonymous requests.
    pub user: Option<UserId>,
    /// Logical route identity, e.g. `/profile`.
    pub route: String,
    /// Interactive page load vs. programmatic call.
    pub class: RequestClass,
    /// Whether the force-change redirect marker is present in the query
    /// string of the current request.
    pub marker_present: bool,
}

impl RequestContext {
    /// Context for an anonymous request.
    pub fn anonymous(route: impl Into<String>, class: RequestClass) -> Self {
        Self {
            user: None,
            route: route.into(),
            class,
            marker_present: false,
        }
    }

    /// Context for an authenticated request without the redirect marker.
    pub fn authenticated(user: UserId, route: impl Into<String>, class: RequestClass) -> Self {
        Self {
            user: Some(user),
            route: route.into(),
            class,
            marker_present: false,
        }
    }

    /// Same context with the redirect marker set.
    #[must_use]
    pub fn with_marker(mut self) -> Self {
        self.marker_present = true;
        self
    }
}

/// A single failed password-strength rule.
///
/// A candidate may violate several rules at once; evaluation reports all of
/// them together rather than stopping at the first.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Violation {
    /// Fewer characters (Unicode scalar values, not bytes) than the minimum.
    TooShort,
    /// No uppercase letter in any script.
    MissingUppercase,
    /// No ASCII decimal digit.
    MissingDigit,
    /// Every character is an ASCII letter or digit.
    MissingSpecial,
}

impl Violation {
    /// Stable machine-readable code, used in error payloads.
    pub fn code(self) -> &'static str {
        match self {
            Violation::TooShort => "password_too_short",
            Violation::MissingUppercase => "password_no_uppercase",
            Violation::MissingDigit => "password_no_number",
            Violation::MissingSpecial => "password_no_special",
        }
    }

    /// User-facing message. `min_length` fills the length requirement in.
    pub fn message(self, min_length: usize) -> String {
        match self {
            Violation::TooShort => {
                format!("Password must be at least {min_length} characters.")
            }
            Violation::MissingUppercase => {
                "Password must include at least one uppercase letter.".to_string()
            }
            Violation::MissingDigit => {
                "Password must include at least one number.".to_string()
            }
            Violation::MissingSpecial => {
                "Password must include at least one special character.".to_string()
            }
        }
    }
}

/// Body of a change-password request.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ChangePasswordRequest {
    pub password: String,
}

/// Body of a rotation-status response.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RotationStatus {
    pub rotation_required: bool,
}

/// Body of a profile-view response: whether the force-change prompt should
/// be rendered on this particular page load.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PromptDecision {
    pub show_prompt: bool,
}

/// Body of the re-arm form response: the one-time anti-forgery token the
/// client must echo back in the POST.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RearmForm {
    pub nonce: String,
}
