// Analysis requester - Fans requests out per category and joins the answers
use crate::api::{AnalysisBackend, ApiError};
use crate::models::{AnalysisRequest, Category};
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{error, info};

/// Raw results keyed by category
#[derive(Debug, Clone)]
pub struct AnalysisBatch {
    pub results: BTreeMap<Category, String>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl AnalysisBatch {
    pub fn get(&self, category: Category) -> Option<&str> {
        self.results.get(&category).map(String::as_str)
    }
}

/// Failure of one category, carrying which request broke the batch
#[derive(Debug, thiserror::Error)]
#[error("{category} analysis failed: {source}")]
pub struct AnalysisFailure {
    pub category: Category,
    #[source]
    pub source: ApiError,
}

/// Request a single category
pub async fn analyze_one<B: AnalysisBackend>(
    backend: &B,
    category: Category,
    request: &AnalysisRequest,
) -> Result<String, AnalysisFailure> {
    info!("Requesting {} analysis", category);
    backend
        .analyze(category, request)
        .await
        .map_err(|source| {
            error!("Analysis error ({}): {}", category, source);
            AnalysisFailure { category, source }
        })
}

/// Request every given category concurrently.
///
/// All-or-nothing: the batch is returned only when every request succeeded.
/// The first failure rejects the whole batch and no partial results escape.
pub async fn analyze_all<B: AnalysisBackend>(
    backend: &B,
    categories: &[Category],
    request: &AnalysisRequest,
) -> Result<AnalysisBatch, AnalysisFailure> {
    let start = Instant::now();
    info!("Requesting {} analyses concurrently", categories.len());

    let requests = categories.iter().map(|&category| async move {
        analyze_one(backend, category, request)
            .await
            .map(|raw| (category, raw))
    });
    let answers = try_join_all(requests).await?;

    Ok(AnalysisBatch {
        results: answers.into_iter().collect(),
        completed_at: Utc::now(),
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Answers every category after a per-category delay, failing the listed ones
    struct FakeBackend {
        failing: HashSet<Category>,
        calls: Mutex<Vec<Category>>,
    }

    impl FakeBackend {
        fn healthy() -> Self {
            Self {
                failing: HashSet::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing(category: Category) -> Self {
            Self {
                failing: [category].into_iter().collect(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl AnalysisBackend for FakeBackend {
        async fn analyze(
            &self,
            category: Category,
            request: &AnalysisRequest,
        ) -> Result<String, ApiError> {
            self.calls.lock().unwrap().push(category);
            // Reverse completion order relative to request order
            let delay = 40 - 10 * category.index() as u64;
            tokio::time::sleep(Duration::from_millis(delay)).await;
            if self.failing.contains(&category) {
                return Err(ApiError::Server {
                    status: 500,
                    message: format!("{} agent down", category),
                });
            }
            Ok(format!("Summary: {} review of {}", category, request.language))
        }
    }

    fn request() -> AnalysisRequest {
        AnalysisRequest::new("let x = 1;", "JavaScript")
    }

    #[tokio::test]
    async fn test_all_categories_populated_on_success() {
        let backend = FakeBackend::healthy();
        let batch = analyze_all(&backend, &Category::ALL, &request()).await.unwrap();

        assert_eq!(batch.results.len(), 4);
        for category in Category::ALL {
            assert_eq!(
                batch.get(category),
                Some(format!("Summary: {} review of JavaScript", category).as_str())
            );
        }
        assert_eq!(backend.calls.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_one_rejection_rejects_whole_batch() {
        let backend = FakeBackend::failing(Category::Performance);
        let failure = analyze_all(&backend, &Category::ALL, &request())
            .await
            .unwrap_err();

        // No partial merge: the caller only ever sees the failure
        assert_eq!(failure.category, Category::Performance);
        assert!(failure.source.is_server_error());
        assert_eq!(
            failure.to_string(),
            "performance analysis failed: Server error (500): performance agent down"
        );
    }

    #[tokio::test]
    async fn test_requests_run_concurrently() {
        let backend = FakeBackend::healthy();
        let start = Instant::now();
        analyze_all(&backend, &Category::ALL, &request()).await.unwrap();
        // Sequential would take 40 + 30 + 20 + 10 ms
        assert!(start.elapsed() < Duration::from_millis(95));
    }

    #[tokio::test]
    async fn test_single_category() {
        let backend = FakeBackend::healthy();
        let raw = analyze_one(&backend, Category::Security, &request()).await.unwrap();
        assert_eq!(raw, "Summary: security review of JavaScript");

        let backend = FakeBackend::failing(Category::Bug);
        let failure = analyze_one(&backend, Category::Bug, &request()).await.unwrap_err();
        assert_eq!(failure.category, Category::Bug);
    }

    #[tokio::test]
    async fn test_empty_category_list() {
        let backend = FakeBackend::healthy();
        let batch = analyze_all(&backend, &[], &request()).await.unwrap();
        assert!(batch.results.is_empty());
    }
}
