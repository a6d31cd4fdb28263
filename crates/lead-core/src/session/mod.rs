mod context;
mod types;

pub use context::{CompetitorAnalysis, SessionContext};
pub use types::{Exchange, Message, Role, Session, SessionSummary, SessionType};
