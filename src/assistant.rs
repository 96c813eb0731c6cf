// Code assistant - Suggestions and context-aware review shown next to the analysis tabs
//
// The service has no endpoint for these yet, so the provider returns a fixed set
// once the code is long enough to be worth reviewing.
use crate::models::Category;
use serde::Serialize;

/// Code shorter than this gets no suggestions
pub const MIN_CODE_LENGTH: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Refactor,
    Completion,
    Optimization,
}

impl SuggestionKind {
    pub fn name(&self) -> &'static str {
        match self {
            SuggestionKind::Refactor => "refactor",
            SuggestionKind::Completion => "completion",
            SuggestionKind::Optimization => "optimization",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub id: u32,
    pub kind: SuggestionKind,
    pub title: String,
    pub description: String,
}

/// One context-aware review note, tagged with the category it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Review {
    pub id: u32,
    pub category: Category,
    pub title: String,
    pub description: String,
}

fn worth_reviewing(code: &str) -> bool {
    code.chars().count() > MIN_CODE_LENGTH
}

/// Intelligent suggestions for the current code
pub fn suggestions(code: &str, _language: &str) -> Vec<Suggestion> {
    if !worth_reviewing(code) {
        return Vec::new();
    }
    vec![
        Suggestion {
            id: 1,
            kind: SuggestionKind::Refactor,
            title: "Extract Method".to_string(),
            description: "Consider extracting this logic into a separate method for better reusability.".to_string(),
        },
        Suggestion {
            id: 2,
            kind: SuggestionKind::Completion,
            title: "Add Error Handling".to_string(),
            description: "Add try-catch block to handle potential errors in async operations.".to_string(),
        },
        Suggestion {
            id: 3,
            kind: SuggestionKind::Optimization,
            title: "Use Memoization".to_string(),
            description: "Consider using useMemo for expensive calculations.".to_string(),
        },
    ]
}

/// Review notes that take the surrounding project into account
pub fn context_review(code: &str, _language: &str, _project_context: Option<&str>) -> Vec<Review> {
    if !worth_reviewing(code) {
        return Vec::new();
    }
    vec![
        Review {
            id: 1,
            category: Category::Security,
            title: "Potential XSS Vulnerability".to_string(),
            description: "User input should be sanitized before rendering to prevent XSS attacks.".to_string(),
        },
        Review {
            id: 2,
            category: Category::Performance,
            title: "Optimize State Updates".to_string(),
            description: "Consider using useCallback for memoizing the event handler.".to_string(),
        },
        Review {
            id: 3,
            category: Category::Style,
            title: "Code Organization".to_string(),
            description: "Move utility functions to a separate file for better maintainability.".to_string(),
        },
    ]
}

/// Suggestions given in earlier sessions
pub fn previous_suggestions() -> Vec<String> {
    vec![
        "Consider using TypeScript for better type safety".to_string(),
        "Add unit tests for critical functions".to_string(),
        "Implement error boundaries for better error handling".to_string(),
    ]
}
