//! Obsidian Local REST API client
//!
//! [`NoteApi`] is the seam the MCP server depends on. Both the plain
//! [`ObsidianClient`] (bound to one base URL) and the self-healing wrapper
//! implement it, so tools never know which one they are talking to.

use async_trait::async_trait;

pub mod error;
pub mod rest;
pub mod types;

pub use error::{ApiError, ApiResult};
pub use rest::{encode_path, ObsidianClient};
pub use types::{Note, NoteJson, NoteMetadata, NoteStat, ServerStatus};

/// Operations the MCP surface needs from the note store
#[async_trait]
pub trait NoteApi: Send + Sync {
    /// Read a note's content and metadata
    async fn read_note(&self, path: &str) -> ApiResult<Note>;

    /// Search notes with a plain-text query
    async fn search_notes(&self, query: &str) -> ApiResult<Vec<Note>>;

    /// Create or replace a note
    async fn write_note(&self, path: &str, content: &str) -> ApiResult<()>;

    /// Fetch the raw note document (content, frontmatter, stat, tags)
    async fn get_metadata(&self, path: &str) -> ApiResult<NoteJson>;

    /// Fetch server information; doubles as the liveness call
    async fn get_server_info(&self) -> ApiResult<ServerStatus>;
}
