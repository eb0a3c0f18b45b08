pub mod config;
pub mod error;
pub mod message;
pub mod render;
pub mod session;
pub mod transcript;
pub mod transport;

// Re-export main types for convenience
pub use config::{Config, PayloadMode};
pub use error::{ConfigError, TransportError};
pub use message::{Message, Role};
pub use render::{project, LogEntry, Renderer};
pub use session::{run_turn, Diagnostic, PendingTurn, Rejected, Session, TurnId, TurnOutcome, TurnState};
pub use transcript::Transcript;
pub use transport::{ChatTransport, HttpTransport};
