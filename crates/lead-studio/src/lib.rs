pub mod connection;
pub mod diff;
pub mod document;
pub mod error;
pub mod github;
pub mod patch;
pub mod service;

pub use connection::{Connection, ConnectionSummary};
pub use diff::{line_diff, DiffKind, DiffLine, LineDiff};
pub use document::{ContentDocument, ContentFile, EditableField, FieldType};
pub use error::{StudioError, StudioResult};
pub use github::{CommitResult, EntryKind, FileCommit, GitHost, GitHubClient, RemoteFile, TreeEntry};
pub use patch::{FieldPatch, PatchOperation};
pub use service::{ApplyOutcome, ApplyRequest, Preview, PreviewRequest, StudioService};
