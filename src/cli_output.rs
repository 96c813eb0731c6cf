// CLI output - Mode-aware printing of analyses and project trees
use crate::assistant::{Review, Suggestion};
use crate::models::{Category, FileNode, FormattedResult};
use colored::{Color, Colorize};
use serde::Serialize;
use std::io::{self, IsTerminal};

/// Output mode for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with colors and emojis
    Human,
    /// Machine-readable JSON output
    Json,
    /// Plain text without colors (for pipes/logs)
    Plain,
}

impl OutputMode {
    /// Auto-detect output mode based on environment
    pub fn auto() -> Self {
        if std::env::var("COGNITIA_JSON").is_ok() {
            // JSON mode requested via env var
            Self::Json
        } else if !io::stdout().is_terminal() {
            // Output is piped/redirected, use plain text
            Self::Plain
        } else {
            Self::Human
        }
    }

    pub fn from_flag(flag: Option<&str>) -> anyhow::Result<Self> {
        match flag.map(|f| f.to_lowercase()) {
            None => Ok(Self::auto()),
            Some(f) => match f.as_str() {
                "human" => Ok(Self::Human),
                "json" => Ok(Self::Json),
                "plain" | "text" => Ok(Self::Plain),
                _ => Err(anyhow::anyhow!(
                    "Unknown format: {}. Supported: human, plain, json",
                    f
                )),
            },
        }
    }
}

/// Presentation of a category: glyph and accent colour
pub fn category_style(category: Category) -> (&'static str, Color) {
    match category {
        Category::Bug => ("🐞", Color::Red),
        Category::Style => ("🎨", Color::Blue),
        Category::Performance => ("⚡", Color::Yellow),
        Category::Security => ("🔒", Color::Red),
    }
}

/// Colour of the numbered issue chips
pub fn issue_color(category: Category) -> Color {
    match category {
        Category::Security => Color::Red,
        _ => Color::Yellow,
    }
}

#[derive(Serialize)]
struct JsonResult<'a> {
    category: Category,
    #[serde(flatten)]
    result: &'a FormattedResult,
}

/// CLI output writer with mode awareness
pub struct OutputWriter {
    mode: OutputMode,
}

impl OutputWriter {
    pub fn new(mode: OutputMode) -> Self {
        Self { mode }
    }

    /// Print a section header
    pub fn section(&self, title: &str) {
        match self.mode {
            OutputMode::Human => {
                println!();
                println!("{}", title.cyan().bold());
                println!("{}", "═".repeat(title.chars().count()).cyan());
            }
            OutputMode::Plain => {
                println!();
                println!("{}", title);
                println!("{}", "=".repeat(title.chars().count()));
            }
            OutputMode::Json => {
                // In JSON mode, sections are part of structured output
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Human => println!("  {} {}", "✓".green(), message),
            OutputMode::Plain => println!("  [OK] {}", message),
            OutputMode::Json => {}
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Human => eprintln!("  {} {}", "✗".red(), message),
            OutputMode::Plain => eprintln!("  [ERROR] {}", message),
            OutputMode::Json => self.emit(&serde_json::json!({ "error": message })),
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        match self.mode {
            OutputMode::Human => eprintln!("  {} {}", "⚠".yellow(), message),
            OutputMode::Plain => eprintln!("  [WARN] {}", message),
            OutputMode::Json => {}
        }
    }

    /// Print one formatted analysis
    pub fn formatted_result(&self, category: Category, result: Option<&FormattedResult>) {
        match self.mode {
            OutputMode::Json => {
                let empty = FormattedResult::default();
                self.emit(&JsonResult {
                    category,
                    result: result.unwrap_or(&empty),
                });
            }
            OutputMode::Plain => print!("{}", render_result_plain(category, result)),
            OutputMode::Human => print_result_human(category, result),
        }
    }

    /// Print a raw, unformatted analysis
    pub fn raw_result(&self, category: Category, raw: &str) {
        match self.mode {
            OutputMode::Json => self.emit(&serde_json::json!({
                "category": category,
                "raw": raw,
            })),
            _ => {
                self.section(category.title());
                println!("{}", raw);
            }
        }
    }

    /// Print the explorer tree
    pub fn file_tree(&self, roots: &[FileNode]) {
        match self.mode {
            OutputMode::Json => self.emit(&roots),
            OutputMode::Plain => {
                for line in tree_lines(roots) {
                    println!("{}", line);
                }
            }
            OutputMode::Human => {
                for (line, node) in tree_lines(roots).iter().zip(crate::file_tree::flatten(roots)) {
                    match node.1 {
                        FileNode::Directory { .. } => println!("{}", line.blue().bold()),
                        FileNode::File { language, .. } => {
                            println!("{} {}", line, format!("({})", language).bright_black())
                        }
                    }
                }
            }
        }
    }

    /// Print assistant suggestions and context review
    pub fn assistant(&self, suggestions: &[Suggestion], reviews: &[Review], previous: &[String]) {
        if self.mode == OutputMode::Json {
            self.emit(&serde_json::json!({
                "suggestions": suggestions,
                "reviews": reviews,
                "previous_suggestions": previous,
            }));
            return;
        }

        self.section("Intelligent Suggestions");
        if suggestions.is_empty() {
            self.warning("Code is too short for suggestions");
        }
        for s in suggestions {
            match self.mode {
                OutputMode::Human => println!(
                    "  {} {} {}\n      {}",
                    "💡".yellow(),
                    s.title.bold(),
                    format!("[{}]", s.kind.name()).bright_black(),
                    s.description
                ),
                _ => println!("  - {} [{}]: {}", s.title, s.kind.name(), s.description),
            }
        }

        self.section("Context Review");
        for r in reviews {
            let (glyph, color) = category_style(r.category);
            match self.mode {
                OutputMode::Human => println!(
                    "  {} {}\n      {}",
                    glyph,
                    r.title.color(color).bold(),
                    r.description
                ),
                _ => println!("  - {} [{}]: {}", r.title, r.category, r.description),
            }
        }

        self.section("Previous Suggestions");
        for p in previous {
            println!("  - {}", p);
        }
    }

    /// Print a key-value table
    pub fn table(&self, rows: &[(&str, String)]) {
        match self.mode {
            OutputMode::Human => {
                use comfy_table::presets::UTF8_FULL;
                use comfy_table::Table;

                let mut table = Table::new();
                table.load_preset(UTF8_FULL).set_header(vec!["Key", "Value"]);
                for (key, value) in rows {
                    table.add_row(vec![key.to_string(), value.clone()]);
                }
                println!("{table}");
            }
            OutputMode::Plain => {
                let max_key_len = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
                for (key, value) in rows {
                    println!("  {:width$} : {}", key, value, width = max_key_len);
                }
            }
            OutputMode::Json => {
                let map: serde_json::Map<String, serde_json::Value> = rows
                    .iter()
                    .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.clone())))
                    .collect();
                self.emit(&map);
            }
        }
    }

    fn emit<T: Serialize + ?Sized>(&self, value: &T) {
        if let Ok(json) = serde_json::to_string_pretty(value) {
            println!("{}", json);
        }
    }

    pub fn is_human(&self) -> bool {
        matches!(self.mode, OutputMode::Human)
    }
}

fn print_result_human(category: Category, result: Option<&FormattedResult>) {
    let (glyph, color) = category_style(category);
    println!();
    println!("{} {}", glyph, category.title().color(color).bold());
    println!("{}", "─".repeat(60).bright_black());

    let Some(result) = result.filter(|r| !r.is_empty()) else {
        println!("  {}", "No results".bright_black());
        return;
    };

    if !result.summary.is_empty() {
        println!("{}", "Analysis Summary".color(color).bold());
        println!("  {}", result.summary);
    }
    if !result.issues.is_empty() {
        println!();
        println!("{}", "Issues Found".red().bold());
        for (i, issue) in result.issues.iter().enumerate() {
            println!(
                "  {} {}",
                format!("[{}]", i + 1).color(issue_color(category)).bold(),
                issue
            );
        }
    }
    if !result.recommendations.is_empty() {
        println!();
        println!("{}", "Recommendations".green().bold());
        for (i, rec) in result.recommendations.iter().enumerate() {
            println!("  {} {}", format!("[{}]", i + 1).green().bold(), rec);
        }
    }
}

/// Plain rendering of one analysis
pub fn render_result_plain(category: Category, result: Option<&FormattedResult>) -> String {
    let mut out = String::new();
    out.push_str(&format!("\n{}\n{}\n", category.title(), "=".repeat(category.title().len())));

    let Some(result) = result.filter(|r| !r.is_empty()) else {
        out.push_str("No results\n");
        return out;
    };

    if !result.summary.is_empty() {
        out.push_str(&format!("Summary: {}\n", result.summary));
    }
    if !result.issues.is_empty() {
        out.push_str("Issues:\n");
        for (i, issue) in result.issues.iter().enumerate() {
            out.push_str(&format!("  {}. {}\n", i + 1, issue));
        }
    }
    if !result.recommendations.is_empty() {
        out.push_str("Recommendations:\n");
        for (i, rec) in result.recommendations.iter().enumerate() {
            out.push_str(&format!("  {}. {}\n", i + 1, rec));
        }
    }
    out
}

/// One line per node with box-drawing guides, in `flatten` order
pub fn tree_lines(roots: &[FileNode]) -> Vec<String> {
    fn walk(nodes: &[FileNode], prefix: &str, out: &mut Vec<String>) {
        for (i, node) in nodes.iter().enumerate() {
            let last = i + 1 == nodes.len();
            let branch = if last { "└── " } else { "├── " };
            let name = if node.is_dir() {
                format!("{}/", node.name())
            } else {
                node.name().to_string()
            };
            out.push(format!("{}{}{}", prefix, branch, name));
            let child_prefix = format!("{}{}", prefix, if last { "    " } else { "│   " });
            walk(node.children(), &child_prefix, out);
        }
    }

    let mut out = Vec::new();
    walk(roots, "", &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_tree::build_file_tree;
    use crate::models::UploadedFile;

    #[test]
    fn test_format_flag() {
        assert_eq!(OutputMode::from_flag(Some("JSON")).unwrap(), OutputMode::Json);
        assert_eq!(OutputMode::from_flag(Some("text")).unwrap(), OutputMode::Plain);
        assert!(OutputMode::from_flag(Some("xml")).is_err());
    }

    #[test]
    fn test_auto_mode() {
        let mode = OutputMode::auto();
        // Will be Plain when running in cargo test (no TTY)
        assert!(matches!(
            mode,
            OutputMode::Plain | OutputMode::Human | OutputMode::Json
        ));
    }

    #[test]
    fn test_plain_result_rendering() {
        let result = FormattedResult {
            summary: "Mostly fine".to_string(),
            issues: vec!["Unchecked unwrap".to_string(), "Shadowed var".to_string()],
            recommendations: vec!["Use ?".to_string()],
        };
        let text = render_result_plain(Category::Bug, Some(&result));
        assert!(text.contains("Bug Analysis"));
        assert!(text.contains("Summary: Mostly fine"));
        assert!(text.contains("  1. Unchecked unwrap\n  2. Shadowed var\n"));
        assert!(text.contains("Recommendations:\n  1. Use ?\n"));

        let empty = render_result_plain(Category::Style, None);
        assert!(empty.contains("No results"));
    }

    #[test]
    fn test_tree_lines() {
        let tree = build_file_tree(vec![
            UploadedFile::new("app/src/main.py", ""),
            UploadedFile::new("app/src/util.py", ""),
            UploadedFile::new("app/README.md", ""),
        ]);
        assert_eq!(
            tree_lines(&tree),
            vec![
                "└── app/",
                "    ├── src/",
                "    │   ├── main.py",
                "    │   └── util.py",
                "    └── README.md",
            ]
        );
    }

    #[test]
    fn test_category_colors() {
        assert_eq!(issue_color(Category::Security), Color::Red);
        assert_eq!(issue_color(Category::Style), Color::Yellow);
        assert_eq!(category_style(Category::Performance).1, Color::Yellow);
    }
}
