//! Types exchanged with the Obsidian Local REST API
//!
//! Field names follow the wire format of the plugin; unknown or missing
//! fields are tolerated since plugin versions differ in what they return.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A note as seen by MCP tools
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Vault-relative path of the note
    pub path: String,
    /// Markdown content (or joined search contexts for search hits)
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<NoteMetadata>,
}

/// Metadata attached to a [`Note`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoteMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frontmatter: Option<Map<String, Value>>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stat: Option<NoteStat>,
    /// Relevance score, only set for search hits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// File statistics reported by the vault
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NoteStat {
    #[serde(default)]
    pub ctime: u64,
    #[serde(default)]
    pub mtime: u64,
    #[serde(default)]
    pub size: u64,
}

/// Raw `application/vnd.olrapi.note+json` document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoteJson {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub frontmatter: Map<String, Value>,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub stat: NoteStat,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl From<NoteJson> for Note {
    fn from(json: NoteJson) -> Self {
        Note {
            path: json.path,
            content: json.content,
            metadata: Some(NoteMetadata {
                frontmatter: Some(json.frontmatter),
                tags: json.tags,
                stat: Some(json.stat),
                score: None,
            }),
        }
    }
}

/// Response of `GET /` on the REST API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest: Option<PluginManifest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub versions: Option<Versions>,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub authenticated: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginManifest {
    pub id: String,
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub min_app_version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub author_url: String,
    #[serde(default)]
    pub is_desktop_only: bool,
    #[serde(default)]
    pub dir: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Versions {
    #[serde(default)]
    pub obsidian: String,
    #[serde(rename = "self", default)]
    pub plugin: String,
}

/// One hit of `POST /search/simple/`
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SimpleSearchHit {
    pub filename: String,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub matches: Vec<SearchMatch>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SearchMatch {
    /// Absent or `null` when the plugin has no snippet for the match
    #[serde(default)]
    pub context: Option<String>,
}

impl From<SimpleSearchHit> for Note {
    fn from(hit: SimpleSearchHit) -> Self {
        let content = hit
            .matches
            .into_iter()
            .map(|m| m.context.unwrap_or_default())
            .collect::<Vec<_>>()
            .join("\n\n");

        Note {
            path: hit.filename,
            content,
            metadata: Some(NoteMetadata {
                score: hit.score,
                ..Default::default()
            }),
        }
    }
}

/// Error body returned by the REST API on non-2xx responses
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ErrorBody {
    pub error_code: Option<i64>,
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_hit_joins_contexts() {
        let hit: SimpleSearchHit = serde_json::from_value(serde_json::json!({
            "filename": "Daily/2024-01-01.md",
            "score": 1.5,
            "matches": [
                {"match": {"start": 0, "end": 4}, "context": "first"},
                {"match": {"start": 9, "end": 12}, "context": "second"}
            ]
        }))
        .unwrap();

        let note = Note::from(hit);
        assert_eq!(note.path, "Daily/2024-01-01.md");
        assert_eq!(note.content, "first\n\nsecond");
        assert_eq!(note.metadata.unwrap().score, Some(1.5));
    }

    #[test]
    fn test_search_hit_tolerates_null_context() {
        let hit: SimpleSearchHit = serde_json::from_value(serde_json::json!({
            "filename": "Inbox/idea.md",
            "matches": [
                {"match": {"start": 0, "end": 4}, "context": null},
                {"match": {"start": 5, "end": 9}},
                {"match": {"start": 9, "end": 12}, "context": "kept"}
            ]
        }))
        .unwrap();

        let note = Note::from(hit);
        assert_eq!(note.content, "\n\n\n\nkept");
        assert_eq!(note.metadata.unwrap().score, None);
    }

    #[test]
    fn test_server_status_tolerates_partial_body() {
        let status: ServerStatus = serde_json::from_value(serde_json::json!({
            "status": "OK",
            "versions": {"obsidian": "1.8.10", "self": "3.1.0"},
            "service": "Obsidian Local REST API",
            "authenticated": true
        }))
        .unwrap();

        assert!(status.authenticated);
        assert!(status.manifest.is_none());
        assert_eq!(status.versions.unwrap().plugin, "3.1.0");
    }
}
