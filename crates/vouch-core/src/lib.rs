//! Vouch Core — Fundamental types, errors, and constants for the
//! Vouch DID and credential status registries.

pub mod clock;
pub mod config;
pub mod credential_state;
pub mod error;
pub mod events;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use credential_state::{CredentialStateMachine, CredentialStatus};
pub use error::{CoreError, ErrorKind, StateError};
pub use events::{AuditEvent, AuditEventKind, EventBus};
pub use types::{Did, Timestamp, NEVER_EXPIRES};
