//! Session/message synchronization engine.
//!
//! - [`SessionDirectory`]: the user's persisted conversations
//! - [`ActiveTimeline`]: messages of the conversation on screen
//! - [`RevealAnimator`]: incremental disclosure of assistant replies
//! - [`ReconciliationEngine`]: owns the active identity and routes sends,
//!   echoes and session switches

pub mod directory;
pub mod engine;
pub mod error;
pub mod handle;
pub mod input;
pub mod reveal;
pub mod tasks;
pub mod timeline;

pub use directory::{DeleteConfirmation, RefreshOutcome, RefreshTicket, SessionDirectory};
pub use engine::ReconciliationEngine;
pub use error::{DirectoryError, EngineError};
pub use handle::EngineHandle;
pub use input::{Command, EngineInput, RemoteOp};
pub use reveal::RevealAnimator;
pub use tasks::TaskSpawner;
pub use timeline::ActiveTimeline;
