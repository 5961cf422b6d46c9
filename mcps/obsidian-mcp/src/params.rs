//! Parameter types for Obsidian MCP tools

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GetNoteContentParams {
    #[serde(rename = "filePath")]
    #[schemars(description = "Vault-relative path of the note, e.g. 'Projects/Plan.md'")]
    pub file_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchParams {
    #[schemars(description = "The search query string")]
    pub query: String,
}
