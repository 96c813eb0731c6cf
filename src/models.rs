// Shared data model: analysis categories, request/response payloads, file tree nodes
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Analysis dimension requested from the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Bug,
    Style,
    Performance,
    Security,
}

impl Category {
    /// All categories in tab order
    pub const ALL: [Category; 4] = [
        Category::Bug,
        Category::Style,
        Category::Performance,
        Category::Security,
    ];

    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "bug" | "bugs" => Ok(Category::Bug),
            "style" => Ok(Category::Style),
            "performance" | "perf" => Ok(Category::Performance),
            "security" | "sec" => Ok(Category::Security),
            _ => Err(anyhow!(
                "Unknown category: {}. Supported: bug, style, performance, security",
                s
            )),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Category::Bug => "bug",
            Category::Style => "style",
            Category::Performance => "performance",
            Category::Security => "security",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Category::Bug => "Bug Analysis",
            Category::Style => "Style Analysis",
            Category::Performance => "Performance Analysis",
            Category::Security => "Security Analysis",
        }
    }

    /// Position of this category's tab
    pub fn index(&self) -> usize {
        match self {
            Category::Bug => 0,
            Category::Style => 1,
            Category::Performance => 2,
            Category::Security => 3,
        }
    }

    /// Path segment appended to `/analyze/`
    pub fn endpoint(&self) -> &'static str {
        self.name()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Values offered by the language selector
pub const LANGUAGES: &[&str] = &[
    "Python",
    "JavaScript",
    "TypeScript",
    "Java",
    "C++",
    "C#",
    "Go",
    "Ruby",
    "PHP",
];

/// Spell a user-typed language the way the selector does (`python` -> `Python`)
pub fn canonical_language(input: &str) -> String {
    let input = input.trim();
    LANGUAGES
        .iter()
        .find(|l| l.eq_ignore_ascii_case(input))
        .map(|l| l.to_string())
        .unwrap_or_else(|| input.to_string())
}

/// User input for one analysis action
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub code: String,
    pub language: String,
    pub team_conventions: Option<String>,
    pub context: Option<String>,
}

impl AnalysisRequest {
    pub fn new(code: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            language: language.into(),
            team_conventions: None,
            context: None,
        }
    }

    pub fn with_team_conventions(mut self, conventions: Option<String>) -> Self {
        self.team_conventions = conventions.filter(|c| !c.trim().is_empty());
        self
    }

    pub fn with_context(mut self, context: Option<String>) -> Self {
        self.context = context.filter(|c| !c.trim().is_empty());
        self
    }

    /// JSON body for a category. Team conventions only travel with style requests,
    /// free-text context only with performance requests.
    pub fn body_for(&self, category: Category) -> AnalyzeBody<'_> {
        AnalyzeBody {
            code: &self.code,
            language: &self.language,
            team_conventions: match category {
                Category::Style => self.team_conventions.as_deref(),
                _ => None,
            },
            context: match category {
                Category::Performance => self.context.as_deref(),
                _ => None,
            },
        }
    }
}

/// Wire form of an analysis request
#[derive(Debug, Serialize)]
pub struct AnalyzeBody<'a> {
    pub code: &'a str,
    pub language: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_conventions: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<&'a str>,
}

/// Successful service reply
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeResponse {
    pub result: String,
}

/// Error reply (`{"error": "..."}`)
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Structured view of one raw analysis string
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedResult {
    pub summary: String,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
}

impl FormattedResult {
    pub fn is_empty(&self) -> bool {
        self.summary.is_empty() && self.issues.is_empty() && self.recommendations.is_empty()
    }
}

/// One file picked from a folder upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// `/`-delimited path, starting with the uploaded folder's name
    pub relative_path: String,
    pub content: String,
}

impl UploadedFile {
    pub fn new(relative_path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            relative_path: relative_path.into(),
            content: content.into(),
        }
    }
}

/// Project explorer tree element
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FileNode {
    Directory {
        name: String,
        path: String,
        children: Vec<FileNode>,
    },
    File {
        name: String,
        path: String,
        #[serde(skip_serializing)]
        content: String,
        language: String,
    },
}

impl FileNode {
    pub fn name(&self) -> &str {
        match self {
            FileNode::Directory { name, .. } | FileNode::File { name, .. } => name,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            FileNode::Directory { path, .. } | FileNode::File { path, .. } => path,
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, FileNode::Directory { .. })
    }

    pub fn children(&self) -> &[FileNode] {
        match self {
            FileNode::Directory { children, .. } => children,
            FileNode::File { .. } => &[],
        }
    }

    /// Number of file leaves under this node
    pub fn file_count(&self) -> usize {
        match self {
            FileNode::File { .. } => 1,
            FileNode::Directory { children, .. } => children.iter().map(|c| c.file_count()).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parsing() {
        assert_eq!(Category::from_str("BUG").unwrap(), Category::Bug);
        assert_eq!(Category::from_str("perf").unwrap(), Category::Performance);
        assert!(Category::from_str("lint").is_err());
    }

    #[test]
    fn test_category_indexes_follow_tab_order() {
        for (i, category) in Category::ALL.iter().enumerate() {
            assert_eq!(category.index(), i);
        }
    }

    #[test]
    fn test_body_carries_category_specific_fields() {
        let request = AnalysisRequest::new("fn main() {}", "Rust")
            .with_team_conventions(Some("snake_case".to_string()))
            .with_context(Some("hot loop".to_string()));

        let style = serde_json::to_value(request.body_for(Category::Style)).unwrap();
        assert_eq!(style["team_conventions"], "snake_case");
        assert!(style.get("context").is_none());

        let perf = serde_json::to_value(request.body_for(Category::Performance)).unwrap();
        assert_eq!(perf["context"], "hot loop");
        assert!(perf.get("team_conventions").is_none());

        let bug = serde_json::to_value(request.body_for(Category::Bug)).unwrap();
        assert_eq!(bug["code"], "fn main() {}");
        assert_eq!(bug["language"], "Rust");
        assert!(bug.get("team_conventions").is_none());
        assert!(bug.get("context").is_none());
    }

    #[test]
    fn test_canonical_language() {
        assert_eq!(canonical_language("python"), "Python");
        assert_eq!(canonical_language(" c# "), "C#");
        assert_eq!(canonical_language("Elixir"), "Elixir");
    }

    #[test]
    fn test_blank_optional_fields_are_dropped() {
        let request = AnalysisRequest::new("x", "Go").with_team_conventions(Some("  ".into()));
        assert_eq!(request.team_conventions, None);
    }
}
