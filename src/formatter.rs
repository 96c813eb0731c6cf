// Result formatter - Turns a freeform LLM analysis into summary / issues / recommendations
use crate::models::FormattedResult;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref HEADER: Regex = Regex::new(r"(?m)^[ \t]*#+[ \t]*").unwrap();
    static ref BULLET: Regex = Regex::new(r"(?m)^[ \t]*[-*+][ \t]+").unwrap();
    static ref BLOCKQUOTE: Regex = Regex::new(r"(?m)^[ \t]*>+[ \t]*").unwrap();
    static ref BOLD: Regex = Regex::new(r"\*\*(.*?)\*\*").unwrap();
    static ref ITALIC: Regex = Regex::new(r"\*(.*?)\*").unwrap();
    static ref INLINE_CODE: Regex = Regex::new(r"`(.*?)`").unwrap();
    static ref SUMMARY_LABEL: Regex = Regex::new(r"(?i)summary:|overview:").unwrap();
    static ref ISSUE_LABEL: Regex = Regex::new(r"(?i)issue:|problem:").unwrap();
    static ref RECOMMENDATION_LABEL: Regex = Regex::new(r"(?i)recommendation:|suggestion:").unwrap();
}

/// Section a line of analysis text belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Summary,
    Issues,
    Recommendations,
}

/// Keyword rule: a line containing any keyword opens `section`
struct SectionRule {
    keywords: &'static [&'static str],
    label: &'static Regex,
    section: Section,
}

/// Evaluated top to bottom; the first match wins, so a line mentioning both
/// "issue" and "recommend" opens an issue.
fn section_rules() -> [SectionRule; 3] {
    [
        SectionRule {
            keywords: &["summary", "overview"],
            label: &SUMMARY_LABEL,
            section: Section::Summary,
        },
        SectionRule {
            keywords: &["issue", "problem"],
            label: &ISSUE_LABEL,
            section: Section::Issues,
        },
        SectionRule {
            keywords: &["recommend", "suggestion"],
            label: &RECOMMENDATION_LABEL,
            section: Section::Recommendations,
        },
    ]
}

/// Classify a cleaned line. Returns the section it opens and the line with its label removed.
pub fn classify_line(line: &str) -> Option<(Section, String)> {
    let lower = line.to_lowercase();
    section_rules()
        .into_iter()
        .find(|rule| rule.keywords.iter().any(|k| lower.contains(k)))
        .map(|rule| (rule.section, rule.label.replace(line, "").trim().to_string()))
}

/// Strip markdown decoration: header, bullet and blockquote markers at line starts,
/// then bold, italic and inline code markers.
///
/// Passes repeat until nothing changes, so `clean_markdown(clean_markdown(x)) == clean_markdown(x)`.
/// Every pass that changes the text makes it shorter, which bounds the loop.
pub fn clean_markdown(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = clean_once(&current);
        if next == current {
            return next;
        }
        current = next;
    }
}

fn clean_once(text: &str) -> String {
    let text = HEADER.replace_all(text, "");
    let text = BULLET.replace_all(&text, "");
    let text = BLOCKQUOTE.replace_all(&text, "");
    let text = BOLD.replace_all(&text, "$1");
    let text = ITALIC.replace_all(&text, "$1");
    let text = INLINE_CODE.replace_all(&text, "$1");
    text.trim().to_string()
}

/// Accumulates lines into the section opened by the last keyword line
#[derive(Default)]
struct SectionParser {
    current: Option<Section>,
    buffer: String,
    result: FormattedResult,
}

impl SectionParser {
    fn feed(&mut self, line: &str) {
        match classify_line(line) {
            Some((section, seed)) => {
                self.flush();
                self.current = Some(section);
                self.buffer = seed;
            }
            None => {
                if !self.buffer.is_empty() {
                    self.buffer.push(' ');
                }
                self.buffer.push_str(line);
            }
        }
    }

    /// Text seen before the first keyword line has no section and is dropped here.
    fn flush(&mut self) {
        let content = std::mem::take(&mut self.buffer);
        let content = content.trim();
        if content.is_empty() {
            return;
        }
        match self.current {
            Some(Section::Summary) => self.result.summary = content.to_string(),
            Some(Section::Issues) => self.result.issues.push(content.to_string()),
            Some(Section::Recommendations) => {
                self.result.recommendations.push(content.to_string())
            }
            None => {}
        }
    }

    fn finish(mut self) -> FormattedResult {
        self.flush();
        self.result
    }
}

/// Format a raw analysis string for display.
///
/// Returns `None` for absent input and for input that is blank once cleaned. When no section keyword appears
/// anywhere, the whole cleaned input becomes the summary.
pub fn format_analysis_result(raw: Option<&str>) -> Option<FormattedResult> {
    let raw = raw?;
    if raw.trim().is_empty() {
        return None;
    }

    let mut parser = SectionParser::default();
    for line in raw.lines() {
        let cleaned = clean_markdown(line.trim());
        if cleaned.is_empty() {
            continue;
        }
        parser.feed(&cleaned);
    }

    let mut result = parser.finish();
    if result.is_empty() {
        result.summary = clean_markdown(raw);
    }

    result.summary = clean_markdown(&result.summary);
    result.issues = result.issues.iter().map(|s| clean_markdown(s)).collect();
    result.recommendations = result
        .recommendations
        .iter()
        .map(|s| clean_markdown(s))
        .collect();

    // Decoration-only input cleans down to nothing
    if result.is_empty() {
        return None;
    }
    Some(result)
}
