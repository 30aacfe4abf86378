//! Route table and the authentication guard in front of it.
//!
//! The guard is a pure function of the session snapshot; it keeps no state
//! of its own and can be re-evaluated on every session change.

use std::fmt;

use crate::session::{Session, SessionStatus};

/// Entry point unauthenticated users are sent to.
pub const LOGIN_PATH: &str = "/login";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Signup,
    Dashboard,
    PatientDetails { patient_id: String },
    GlobalContext,
    Notifications,
    Profile,
}

impl Route {
    /// Parse an absolute location path. Query strings, fragments and a
    /// trailing slash are ignored; relative and unknown paths are `None`.
    #[must_use]
    pub fn parse(path: &str) -> Option<Self> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.strip_prefix('/')?.trim_end_matches('/');
        let segments: Vec<&str> = if trimmed.is_empty() { Vec::new() } else { trimmed.split('/').collect() };
        match segments.as_slice() {
            [] => Some(Self::Dashboard),
            ["login"] => Some(Self::Login),
            ["signup"] => Some(Self::Signup),
            ["patient", id] if !id.is_empty() => Some(Self::PatientDetails { patient_id: (*id).to_owned() }),
            ["global-context"] => Some(Self::GlobalContext),
            ["notifications"] => Some(Self::Notifications),
            ["profile"] => Some(Self::Profile),
            _ => None,
        }
    }

    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Login => LOGIN_PATH.to_owned(),
            Self::Signup => "/signup".to_owned(),
            Self::Dashboard => "/".to_owned(),
            Self::PatientDetails { patient_id } => format!("/patient/{patient_id}"),
            Self::GlobalContext => "/global-context".to_owned(),
            Self::Notifications => "/notifications".to_owned(),
            Self::Profile => "/profile".to_owned(),
        }
    }

    #[must_use]
    pub fn is_protected(&self) -> bool {
        !matches!(self, Self::Login | Self::Signup)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session undecided: show a neutral loading state, do not navigate.
    Loading,
    Allow,
    Redirect { to: &'static str },
}

/// Decision for an authenticated-only view.
#[must_use]
pub fn guard(session: &Session) -> GuardDecision {
    match session.status() {
        SessionStatus::Verifying => GuardDecision::Loading,
        SessionStatus::Authenticated => GuardDecision::Allow,
        SessionStatus::Unauthenticated => GuardDecision::Redirect { to: LOGIN_PATH },
    }
}

/// Decision for any route: public routes are always allowed.
#[must_use]
pub fn resolve(route: &Route, session: &Session) -> GuardDecision {
    if route.is_protected() { guard(session) } else { GuardDecision::Allow }
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
