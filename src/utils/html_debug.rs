// src/utils/html_debug.rs
use crate::patterns::{self, PatternKind};
use crate::utils::error::AppError;
use std::fs;
use std::ops::Range;
use std::path::Path;

fn css_class(kind: PatternKind) -> &'static str {
    match kind {
        PatternKind::OrganizationalUnit => "hl-org",
        PatternKind::AppropriationCategory => "hl-category",
        PatternKind::FiscalYear => "hl-fy",
        PatternKind::BudgetActivity => "hl-activity",
        PatternKind::ProgramElement => "hl-pe",
        PatternKind::MonetaryAmount => "hl-amount",
        PatternKind::Explanation => "hl-explanation",
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders `text` as HTML with each highlight wrapped in a span.
/// Highlights must be sorted by start; one that overlaps an earlier one is skipped.
pub fn render_debug_html(text: &str, highlights: &[(Range<usize>, PatternKind)]) -> String {
    let mut html = String::from("<!DOCTYPE html>\n<html>\n<head>\n<style>\n");
    html.push_str("body { font-family: monospace; white-space: pre-wrap; }\n");
    html.push_str(".hl-org { background-color: #FFFF00; }\n");
    html.push_str(".hl-category { background-color: #FFA500; }\n");
    html.push_str(".hl-fy { background-color: #90EE90; }\n");
    html.push_str(".hl-activity { background-color: #ADD8E6; }\n");
    html.push_str(".hl-pe { background-color: #DDA0DD; }\n");
    html.push_str(".hl-amount { background-color: #FFC0CB; }\n");
    html.push_str(".hl-explanation { background-color: #E0E0E0; }\n");
    html.push_str("</style>\n</head>\n<body>\n");

    let mut last_pos = 0;
    for (range, kind) in highlights {
        if range.start < last_pos || range.end > text.len() {
            continue;
        }
        html.push_str(&escape(&text[last_pos..range.start]));
        html.push_str(&format!(
            "<span class=\"{}\" title=\"{}: {}-{}\">",
            css_class(*kind), kind.name(), range.start, range.end
        ));
        html.push_str(&escape(&text[range.clone()]));
        html.push_str("</span>");
        last_pos = range.end;
    }
    html.push_str(&escape(&text[last_pos..]));
    html.push_str("\n</body>\n</html>\n");
    html
}

/// Writes an annotated copy of a document's text with every recognizer match highlighted.
pub fn create_debug_html(text: &str, path: &Path) -> Result<(), AppError> {
    let highlights = patterns::annotate(text);
    fs::write(path, render_debug_html(text, &highlights))?;
    tracing::info!("Saved debug HTML ({} highlights) to {}", highlights.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlaps_first_start_wins() {
        let text = "abcdef";
        let html = render_debug_html(
            text,
            &[(0..3, PatternKind::FiscalYear), (2..5, PatternKind::MonetaryAmount), (4..6, PatternKind::ProgramElement)],
        );
        assert!(html.contains("<span class=\"hl-fy\" title=\"fiscal-year: 0-3\">abc</span>"));
        assert!(!html.contains("amount: 2-5"));
        assert!(html.contains("d<span class=\"hl-pe\" title=\"program-element: 4-6\">ef</span>"));
    }

    #[test]
    fn test_text_is_escaped() {
        let html = render_debug_html("R&D <b>", &[]);
        assert!(html.contains("R&amp;D &lt;b&gt;"));
    }

    #[test]
    fn test_create_debug_html_writes_matches() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.html");
        create_debug_html("ARMY INCREASE\nProgram 0603001A +21", &path).unwrap();
        let html = fs::read_to_string(&path).unwrap();
        assert!(html.contains("hl-org"));
        assert!(html.contains("hl-pe"));
    }
}
