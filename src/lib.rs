//! # careconnect
//!
//! Client core for the CareConnect medical-practice dashboard.
//!
//! The session manager (`session`) is the one stateful piece: it persists
//! the bearer token and profile snapshot (`storage`), reconciles them with
//! the backend's Account API (`api`), and publishes every change to the
//! route guard (`guard`) and page views. The remaining modules are the typed
//! REST services and the network-free view state the dashboard pages use.

pub mod api;
pub mod config;
pub mod guard;
pub mod session;
pub mod state;
pub mod storage;

pub use api::{AccountApi, ApiClient, ApiError, AuthedClient};
pub use config::Config;
pub use guard::{GuardDecision, Route};
pub use session::{AuthOutcome, Session, SessionStatus, SessionStore, VerifyOutcome};
pub use storage::{FileStorage, MemoryStorage, SessionStorage};
