// UI state container - every change goes through `AppState::update`
use crate::assistant::{self, Review, Suggestion};
use crate::file_tree::{display_language, flatten};
use crate::formatter::format_analysis_result;
use crate::models::{AnalysisRequest, Category, FileNode, FormattedResult};
use crate::requester::AnalysisBatch;
use chrono::Local;
use std::collections::BTreeMap;

/// Tabs in display order: one per category, then suggestions and the explorer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Analysis(Category),
    Suggestions,
    Explorer,
}

pub const TABS: [Tab; 6] = [
    Tab::Analysis(Category::Bug),
    Tab::Analysis(Category::Style),
    Tab::Analysis(Category::Performance),
    Tab::Analysis(Category::Security),
    Tab::Suggestions,
    Tab::Explorer,
];

impl Tab {
    pub fn title(&self) -> &'static str {
        match self {
            Tab::Analysis(Category::Bug) => "Bugs",
            Tab::Analysis(Category::Style) => "Style",
            Tab::Analysis(Category::Performance) => "Performance",
            Tab::Analysis(Category::Security) => "Security",
            Tab::Suggestions => "Suggestions",
            Tab::Explorer => "Explorer",
        }
    }
}

/// What an in-flight job is computing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    One(Category),
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pending {
    pub id: u64,
    pub job: Job,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Info(String),
    Error(String),
}

impl Status {
    pub fn text(&self) -> &str {
        match self {
            Status::Info(s) | Status::Error(s) => s,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Status::Error(_))
    }
}

#[derive(Debug)]
pub enum Message {
    NextTab,
    PrevTab,
    SelectTab(usize),
    RowDown,
    RowUp,
    /// Enter on the current tab
    Activate,
    AnalyzeAll,
    Cancel,
    TreeLoaded(Vec<FileNode>),
    TreeFailed(String),
    AnalysisSucceeded {
        id: u64,
        category: Category,
        raw: String,
    },
    BatchSucceeded {
        id: u64,
        batch: AnalysisBatch,
    },
    AnalysisFailed {
        id: u64,
        error: String,
    },
}

/// Side effect the UI loop has to run after an update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Analyze {
        pending: Pending,
        request: AnalysisRequest,
    },
    /// Abort the job with this id
    Abort(u64),
}

#[derive(Debug)]
pub struct AppState {
    pub input: AnalysisRequest,
    pub results: BTreeMap<Category, String>,
    pub pending: Option<Pending>,
    pub selected_tab: usize,
    pub selected_row: usize,
    pub status: Status,
    pub tree: Vec<FileNode>,
    pub selected_file: Option<String>,
    pub applied_suggestions: Vec<u32>,
    next_job_id: u64,
}

impl AppState {
    pub fn new(input: AnalysisRequest) -> Self {
        Self {
            input,
            results: BTreeMap::new(),
            pending: None,
            selected_tab: 0,
            selected_row: 0,
            status: Status::Info(
                "Enter: analyze tab | a: analyze all | c: cancel | q: quit".to_string(),
            ),
            tree: Vec::new(),
            selected_file: None,
            applied_suggestions: Vec::new(),
            next_job_id: 0,
        }
    }

    pub fn tab(&self) -> Tab {
        TABS[self.selected_tab % TABS.len()]
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Analysis buttons are disabled while loading or without code
    pub fn can_analyze(&self) -> bool {
        !self.is_loading() && !self.input.code.trim().is_empty()
    }

    pub fn formatted(&self, category: Category) -> Option<FormattedResult> {
        format_analysis_result(self.results.get(&category).map(String::as_str))
    }

    pub fn suggestions(&self) -> Vec<Suggestion> {
        assistant::suggestions(&self.input.code, &self.input.language)
    }

    pub fn reviews(&self) -> Vec<Review> {
        assistant::context_review(
            &self.input.code,
            &self.input.language,
            self.input.context.as_deref(),
        )
    }

    pub fn explorer_rows(&self) -> Vec<(usize, &FileNode)> {
        flatten(&self.tree)
    }

    fn row_count(&self) -> usize {
        match self.tab() {
            Tab::Explorer => self.explorer_rows().len(),
            Tab::Suggestions => self.suggestions().len(),
            Tab::Analysis(_) => 0,
        }
    }

    pub fn update(&mut self, message: Message) -> Option<Effect> {
        match message {
            Message::NextTab => {
                self.selected_tab = (self.selected_tab + 1) % TABS.len();
                self.selected_row = 0;
                None
            }
            Message::PrevTab => {
                self.selected_tab = (self.selected_tab + TABS.len() - 1) % TABS.len();
                self.selected_row = 0;
                None
            }
            Message::SelectTab(index) => {
                if index < TABS.len() {
                    self.selected_tab = index;
                    self.selected_row = 0;
                }
                None
            }
            Message::RowDown => {
                let rows = self.row_count();
                if rows > 0 {
                    self.selected_row = (self.selected_row + 1) % rows;
                }
                None
            }
            Message::RowUp => {
                let rows = self.row_count();
                if rows > 0 {
                    self.selected_row = (self.selected_row + rows - 1) % rows;
                }
                None
            }
            Message::Activate => match self.tab() {
                Tab::Analysis(category) => self.start(Job::One(category)),
                Tab::Suggestions => {
                    self.apply_selected_suggestion();
                    None
                }
                Tab::Explorer => {
                    self.open_selected_file();
                    None
                }
            },
            Message::AnalyzeAll => self.start(Job::All),
            Message::Cancel => {
                let pending = self.pending.take()?;
                self.status = Status::Info("Analysis cancelled".to_string());
                Some(Effect::Abort(pending.id))
            }
            Message::TreeLoaded(tree) => {
                let files: usize = tree.iter().map(|n| n.file_count()).sum();
                self.tree = tree;
                self.status = Status::Info(format!("Loaded {} files into the explorer", files));
                None
            }
            Message::TreeFailed(error) => {
                self.status = Status::Error(format!("Folder upload failed: {}", error));
                None
            }
            Message::AnalysisSucceeded { id, category, raw } => {
                if self.finish(id) {
                    self.results.insert(category, raw);
                    self.selected_tab = category.index();
                    self.selected_row = 0;
                    self.status = Status::Info(format!("{} complete", category.title()));
                }
                None
            }
            Message::BatchSucceeded { id, batch } => {
                if self.finish(id) {
                    let count = batch.results.len();
                    self.results.extend(batch.results);
                    self.status = Status::Info(format!(
                        "{} analyses complete in {:.1}s (at {})",
                        count,
                        batch.duration_ms as f64 / 1000.0,
                        batch.completed_at.with_timezone(&Local).format("%H:%M:%S")
                    ));
                }
                None
            }
            Message::AnalysisFailed { id, error } => {
                if self.finish(id) {
                    self.status = Status::Error(error);
                }
                None
            }
        }
    }

    fn start(&mut self, job: Job) -> Option<Effect> {
        if self.is_loading() {
            return None;
        }
        if self.input.code.trim().is_empty() {
            self.status = Status::Error("No code to analyze".to_string());
            return None;
        }
        self.next_job_id += 1;
        let pending = Pending {
            id: self.next_job_id,
            job,
        };
        self.pending = Some(pending);
        self.status = Status::Info(match job {
            Job::One(category) => format!("Running {}...", category.title()),
            Job::All => "Running all analyses...".to_string(),
        });
        Some(Effect::Analyze {
            pending,
            request: self.input.clone(),
        })
    }

    /// Clear the pending job if `id` is the one in flight; stale answers are ignored
    fn finish(&mut self, id: u64) -> bool {
        match self.pending {
            Some(pending) if pending.id == id => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    fn apply_selected_suggestion(&mut self) {
        let Some(suggestion) = self.suggestions().into_iter().nth(self.selected_row) else {
            return;
        };
        if !self.applied_suggestions.contains(&suggestion.id) {
            self.applied_suggestions.push(suggestion.id);
            self.status = Status::Info(format!("Applied: {}", suggestion.title));
        }
    }

    fn open_selected_file(&mut self) {
        let selected = self
            .explorer_rows()
            .get(self.selected_row)
            .map(|(_, node)| (*node).clone());
        if let Some(FileNode::File {
            path,
            content,
            language,
            ..
        }) = selected
        {
            self.input.code = content;
            self.input.language = display_language(&language).to_string();
            self.status = Status::Info(format!("Loaded {}", path));
            self.selected_file = Some(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_tree::build_file_tree;
    use crate::models::UploadedFile;
    use chrono::Utc;

    fn state_with_code() -> AppState {
        AppState::new(AnalysisRequest::new("fn main() { println!(\"hi\"); }", "Rust"))
    }

    fn started_id(effect: Option<Effect>) -> u64 {
        match effect {
            Some(Effect::Analyze { pending, .. }) => pending.id,
            other => panic!("expected analyze effect, got {:?}", other),
        }
    }

    #[test]
    fn test_single_analysis_selects_its_tab() {
        let mut state = state_with_code();
        state.update(Message::SelectTab(2));
        let id = started_id(state.update(Message::Activate));
        assert!(state.is_loading());
        assert!(!state.can_analyze());

        state.update(Message::SelectTab(0));
        state.update(Message::AnalysisSucceeded {
            id,
            category: Category::Performance,
            raw: "Summary: fast enough".to_string(),
        });

        assert!(!state.is_loading());
        assert_eq!(state.tab(), Tab::Analysis(Category::Performance));
        assert_eq!(
            state.formatted(Category::Performance).unwrap().summary,
            "fast enough"
        );
    }

    #[test]
    fn test_no_second_job_while_loading() {
        let mut state = state_with_code();
        started_id(state.update(Message::AnalyzeAll));
        assert_eq!(state.update(Message::Activate), None);
        assert_eq!(state.update(Message::AnalyzeAll), None);
    }

    #[test]
    fn test_empty_code_is_refused() {
        let mut state = AppState::new(AnalysisRequest::new("  ", "Go"));
        assert_eq!(state.update(Message::AnalyzeAll), None);
        assert!(state.status.is_error());
        assert!(!state.is_loading());
    }

    #[test]
    fn test_batch_merges_only_on_success() {
        let mut state = state_with_code();
        let id = started_id(state.update(Message::AnalyzeAll));
        state.update(Message::AnalysisFailed {
            id,
            error: "security analysis failed: Network error".to_string(),
        });
        assert!(state.results.is_empty());
        assert!(state.status.is_error());
        assert!(!state.is_loading());

        let id = started_id(state.update(Message::AnalyzeAll));
        let batch = AnalysisBatch {
            results: Category::ALL
                .iter()
                .map(|c| (*c, format!("Issue: {} finding", c)))
                .collect(),
            completed_at: Utc::now(),
            duration_ms: 1200,
        };
        state.update(Message::BatchSucceeded { id, batch });
        assert_eq!(state.results.len(), 4);
        assert!(state.status.text().starts_with("4 analyses complete in 1.2s (at "));
        assert_eq!(
            state.formatted(Category::Bug).unwrap().issues,
            vec!["bug finding"]
        );
    }

    #[test]
    fn test_cancel_discards_late_answer() {
        let mut state = state_with_code();
        let id = started_id(state.update(Message::Activate));
        assert_eq!(state.update(Message::Cancel), Some(Effect::Abort(id)));
        assert_eq!(state.update(Message::Cancel), None);

        state.update(Message::AnalysisSucceeded {
            id,
            category: Category::Bug,
            raw: "late".to_string(),
        });
        assert!(state.results.is_empty());
    }

    #[test]
    fn test_tab_navigation_wraps() {
        let mut state = state_with_code();
        state.update(Message::PrevTab);
        assert_eq!(state.tab(), Tab::Explorer);
        state.update(Message::NextTab);
        assert_eq!(state.tab(), Tab::Analysis(Category::Bug));
        state.update(Message::SelectTab(42));
        assert_eq!(state.selected_tab, 0);
    }

    #[test]
    fn test_explorer_selection_feeds_input() {
        let mut state = state_with_code();
        state.update(Message::TreeLoaded(build_file_tree(vec![
            UploadedFile::new("proj/app.py", "print('x')"),
            UploadedFile::new("proj/web/index.ts", "export {}"),
        ])));
        state.update(Message::SelectTab(5));

        // rows: proj, proj/app.py, proj/web, proj/web/index.ts
        state.update(Message::RowDown);
        state.update(Message::Activate);
        assert_eq!(state.input.code, "print('x')");
        assert_eq!(state.input.language, "Python");
        assert_eq!(state.selected_file.as_deref(), Some("proj/app.py"));

        // Directories are not opened
        state.update(Message::RowDown);
        state.update(Message::Activate);
        assert_eq!(state.selected_file.as_deref(), Some("proj/app.py"));

        state.update(Message::RowDown);
        state.update(Message::Activate);
        assert_eq!(state.input.language, "TypeScript");

        state.update(Message::RowDown);
        assert_eq!(state.selected_row, 0);
    }

    #[test]
    fn test_failed_folder_load_sets_error() {
        let mut state = state_with_code();
        state.update(Message::TreeFailed("Not a directory: /nope".to_string()));
        assert!(state.status.is_error());
        assert_eq!(state.status.text(), "Folder upload failed: Not a directory: /nope");
        assert!(state.tree.is_empty());
    }

    #[test]
    fn test_applying_suggestion_is_recorded_once() {
        let mut state = state_with_code();
        state.update(Message::SelectTab(4));
        state.update(Message::RowDown);
        state.update(Message::Activate);
        state.update(Message::Activate);
        assert_eq!(state.applied_suggestions, vec![2]);
    }
}
