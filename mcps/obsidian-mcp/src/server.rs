//! MCP Server implementation for Obsidian notes
//!
//! Thin pass-throughs from MCP tools and the `obsidian://{name}` resource
//! template to a [`NoteApi`]. The server does not care whether the API is a
//! plain client or the self-healing one.

use std::sync::Arc;

use percent_encoding::percent_decode_str;
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        AnnotateAble, CallToolResult, Content, Implementation, ListResourceTemplatesResult,
        PaginatedRequestParams, RawResourceTemplate, ReadResourceRequestParams,
        ReadResourceResult, ResourceContents, ServerCapabilities, ServerInfo,
    },
    service::RequestContext,
    tool, tool_handler, tool_router, ErrorData as McpError, RoleServer, ServerHandler,
};
use serde::Serialize;

use crate::client::{Note, NoteApi};
use crate::error::{McpResult, ResultExt};
use crate::params::{GetNoteContentParams, SearchParams};

const RESOURCE_SCHEME: &str = "obsidian://";
const RESOURCE_TEMPLATE: &str = "obsidian://{name}";
const MARKDOWN_MIME: &str = "text/markdown";

/// The main Obsidian MCP Server
#[derive(Clone)]
pub struct ObsidianMcpServer {
    api: Arc<dyn NoteApi>,
    tool_router: ToolRouter<Self>,
}

/// Summary metadata appended to `get_note_content` output
#[derive(Debug, Serialize)]
struct NoteSummary<'a> {
    tags: &'a [String],
    size: u64,
}

fn note_summary(note: &Note) -> NoteSummary<'_> {
    let metadata = note.metadata.as_ref();
    NoteSummary {
        tags: metadata.map(|m| m.tags.as_slice()).unwrap_or(&[]),
        size: metadata
            .and_then(|m| m.stat.as_ref())
            .map(|s| s.size)
            .unwrap_or(0),
    }
}

fn paths_result(notes: &[Note]) -> CallToolResult {
    CallToolResult::success(notes.iter().map(|n| Content::text(n.path.clone())).collect())
}

/// Decode the note path from an `obsidian://<encoded path>` URI
fn note_path_from_uri(uri: &str) -> McpResult<String> {
    let encoded = uri
        .strip_prefix(RESOURCE_SCHEME)
        .filter(|rest| !rest.is_empty())
        .ok_or_else(|| {
            McpError::invalid_params(format!("expected {}, got '{}'", RESOURCE_TEMPLATE, uri), None)
        })?;

    percent_decode_str(encoded)
        .decode_utf8()
        .map(|path| path.into_owned())
        .map_err(|e| McpError::invalid_params(format!("invalid resource name: {}", e), None))
}

// ============================================================================
// Tool Router Implementation
// ============================================================================

#[tool_router]
impl ObsidianMcpServer {
    pub fn new(api: Arc<dyn NoteApi>) -> Self {
        Self {
            api,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Get content of the obsidian note by file path")]
    async fn get_note_content(
        &self,
        Parameters(params): Parameters<GetNoteContentParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(path = %params.file_path, "get_note_content");

        let note = self.api.read_note(&params.file_path).await.to_mcp_err()?;
        let summary = serde_json::to_string(&note_summary(&note)).to_mcp_err()?;

        Ok(CallToolResult::success(vec![
            Content::text(params.file_path.clone()),
            Content::text(format!("Resource template name: {}", params.file_path)),
            Content::text(note.content.clone()),
            Content::text(summary),
        ]))
    }

    #[tool(description = "Search for notes using a query string")]
    async fn obsidian_search(
        &self,
        Parameters(params): Parameters<SearchParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(query = %params.query, "obsidian_search");

        let notes = self.api.search_notes(&params.query).await.to_mcp_err()?;
        Ok(paths_result(&notes))
    }

    // TODO: switch to a vector-backed search once the REST API exposes one;
    // until then this is the same plain-text search as obsidian_search
    #[tool(description = "Search for notes using a query string")]
    async fn obsidian_semantic_search(
        &self,
        Parameters(params): Parameters<SearchParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(query = %params.query, "obsidian_semantic_search");

        let notes = self.api.search_notes(&params.query).await.to_mcp_err()?;
        Ok(paths_result(&notes))
    }
}

impl ObsidianMcpServer {
    /// Resolve an `obsidian://{name}` URI to the note's markdown
    pub async fn read_note_resource(&self, uri: &str) -> McpResult<ReadResourceResult> {
        let path = note_path_from_uri(uri)?;
        tracing::info!(uri, path = %path, "Resource requested");

        let note = self.api.read_note(&path).await.to_mcp_err()?;

        Ok(ReadResourceResult {
            contents: vec![ResourceContents::TextResourceContents {
                uri: uri.to_string(),
                mime_type: Some(MARKDOWN_MIME.to_string()),
                text: note.content,
                meta: None,
            }],
        })
    }

    fn resource_templates() -> ListResourceTemplatesResult {
        ListResourceTemplatesResult::with_all_items(vec![RawResourceTemplate {
            uri_template: RESOURCE_TEMPLATE.to_string(),
            name: "obsidian".to_string(),
            title: Some("Obsidian note".to_string()),
            description: Some(
                "Markdown content of a vault note; {name} is the URL-encoded vault path."
                    .to_string(),
            ),
            mime_type: Some(MARKDOWN_MIME.to_string()),
            icons: None,
        }
        .no_annotation()])
    }
}

// ============================================================================
// Server Handler Implementation
// ============================================================================

#[tool_handler]
impl ServerHandler for ObsidianMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Obsidian MCP Server - read and search notes in an Obsidian vault through \
                 the Local REST API plugin. Use obsidian_search to find note paths, then \
                 get_note_content (or the obsidian://{name} resource) to read them."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    async fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourceTemplatesResult, McpError> {
        Ok(Self::resource_templates())
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        self.read_note_resource(&request.uri).await
    }
}
