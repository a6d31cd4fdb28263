pub mod error;
pub mod prompts;
pub mod session;
pub mod storage;
pub mod suggestions;

pub use error::{StoreError, StoreResult};
pub use prompts::{ChatPrompt, LengthBucket};
pub use session::{
    CompetitorAnalysis, Exchange, Message, Role, Session, SessionContext, SessionSummary,
    SessionType,
};
pub use storage::{SessionFilter, SessionStore, SqliteSessionStore};
pub use suggestions::{PhraseSuggestionExtractor, SuggestionExtractor, MAX_SUGGESTIONS};
