use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single natural (non-ad) search result.
///
/// Provider fields (`link`, `title`, `snippet`, `position`, ...) are kept
/// exactly as received, nulls included, and read through accessors.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct OrganicResult {
    /// Markdown extracted from the result page. Only set by enrichment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl OrganicResult {
    pub fn new(link: impl Into<String>, title: impl Into<String>, snippet: Option<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("link".to_string(), Value::String(link.into()));
        fields.insert("title".to_string(), Value::String(title.into()));
        if let Some(snippet) = snippet {
            fields.insert("snippet".to_string(), Value::String(snippet));
        }
        OrganicResult {
            text_content: None,
            fields,
        }
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// The result URL; the key used to match a result with its fetched page.
    pub fn link(&self) -> Option<&str> {
        self.str_field("link")
    }

    pub fn title(&self) -> Option<&str> {
        self.str_field("title")
    }

    pub fn snippet(&self) -> Option<&str> {
        self.str_field("snippet")
    }
}

/// The search provider's response as parsed off the wire.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct SearchResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_box: Option<Value>,
    #[serde(default)]
    pub organic_results: Vec<OrganicResult>,
    /// search_metadata, search_parameters, pagination, ...
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SearchResponse {
    /// Drops every top-level field except the answer box and organic results.
    pub fn trim(self) -> SearchOutput {
        SearchOutput {
            answer_box: self.answer_box,
            organic_results: self.organic_results,
        }
    }
}

/// What the tool hands back to its caller.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SearchOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_box: Option<Value>,
    pub organic_results: Vec<OrganicResult>,
}
