// src/patterns/mod.rs
//! Recognizers for the fields of budget documents.
//!
//! Every function here is pure: the same text always yields the same matches,
//! offsets are byte offsets into the text passed in, and text with nothing to
//! recognize yields an empty result rather than an error.

use crate::models::{Branch, Category, Direction};
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

/// Bumped whenever a recognizer changes what it accepts.
pub const PATTERN_LIBRARY_VERSION: u32 = 3;

// --- Regex Patterns (Lazy Static) ---

// Service name followed by a direction keyword: "ARMY INCREASE", "Air Force DECREASE".
static ORG_UNIT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(ARMY|NAVY|AIR\s+FORCE|DEFENSE-WIDE|MARINE\s+CORPS|COAST\s+GUARD)\s+(INCREASE|DECREASE)\b")
        .expect("Failed to compile ORG_UNIT_RE")
});

static BRANCH_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(ARMY|NAVY|AIR\s+FORCE|DEFENSE-WIDE|MARINE(?:\s+CORPS|S)?|COAST\s+GUARD)\b")
        .expect("Failed to compile BRANCH_NAME_RE")
});

static DEPARTMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bDEPARTMENT\s+OF\s+THE\s+(ARMY|NAVY|AIR\s+FORCE)\b|\b(DEFENSE-WIDE)\b")
        .expect("Failed to compile DEPARTMENT_RE")
});

// Specific categories are listed before the generic "Procurement" so the
// generic pattern only claims text none of them matched.
static CATEGORY_RES: Lazy<Vec<(Category, Regex)>> = Lazy::new(|| {
    [
        (Category::OperationAndMaintenance, r"(?i)\bOperations?\s+(?:and|&)\s+Maintenance\b"),
        (Category::MilitaryPersonnel, r"(?i)\bMilitary\s+Personnel\b"),
        (Category::WeaponsProcurement, r"(?i)\bWeapons?\s+Procurement\b"),
        (Category::MissileProcurement, r"(?i)\bMissiles?\s+Procurement\b"),
        (Category::Rdte, r"(?i)\bRDT\s*&?\s*E\b|\bResearch\b[^\n]{0,40}?\bDevelopment\b"),
        (Category::Procurement, r"(?i)\bProcurement\b"),
    ]
    .iter()
    .filter_map(|(category, pat)| Regex::new(pat).ok().map(|re| (*category, re)))
    .collect()
});

static FY_PREFIXED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:FY|Fiscal\s+Year)\s*'?(\d{4}|\d{2})\b(?:\s*[/-]\s*'?(\d{4}|\d{2})\b)?")
        .expect("Failed to compile FY_PREFIXED_RE")
});

// Bare "05/05" pairs as printed after an appropriation title.
static FY_PAIR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{4}|\d{2})/(\d{4}|\d{2})\b").expect("Failed to compile FY_PAIR_RE")
});

static ACTIVITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bBudget\s+Activity\s+(\d{1,2})\s*[:.\-]?[ \t]*([^\n]*)")
        .expect("Failed to compile ACTIVITY_RE")
});

static TRAILING_AMOUNT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\s:\-]*[+\-]?\$?\d{1,3}(?:,\d{3})*(?:\.\d+)?\s*$")
        .expect("Failed to compile TRAILING_AMOUNT_RE")
});

static PROGRAM_ELEMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{7}[A-Z])\b").expect("Failed to compile PROGRAM_ELEMENT_RE")
});

static AMOUNT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[+\-]?\$?\b(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?\b(?:\s*(?:thousand|million|billion)\b)?-?")
        .expect("Failed to compile AMOUNT_RE")
});

static EXPLANATION_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bExplanation\s*:[ \t]*").expect("Failed to compile EXPLANATION_LABEL_RE")
});

// Lines that open a new block and therefore end an explanation.
static SECTION_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(?:ARMY|NAVY|AIR\s+FORCE|DEFENSE-WIDE|MARINE\s+CORPS|COAST\s+GUARD|Budget\s+Activity|Explanation|Operations?\s+and\s+Maintenance|Military\s+Personnel|(?:Weapons?|Missiles?|Other)\s+Procurement|Procurement|Research)\b",
    )
    .expect("Failed to compile SECTION_LABEL_RE")
});

// Leading text followed by at least one comma-grouped number.
static DATA_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*((?:\d{7}[A-Z]\s+)?[A-Za-z][^\n]*?)\s+[+\-]?\$?\d{1,3}(?:,\d{3})+\b")
        .expect("Failed to compile DATA_LINE_RE")
});

// --- Match Types ---

/// Anything a recognizer returns: it knows where it sits in the text.
pub trait Spanned {
    fn span(&self) -> Range<usize>;

    fn overlaps(&self, other: &Range<usize>) -> bool {
        let own = self.span();
        own.start < other.end && other.start < own.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgUnitMatch {
    pub start: usize,
    pub end: usize,
    pub branch: Branch,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryMatch {
    pub start: usize,
    pub end: usize,
    pub category: Category,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiscalYearMatch {
    pub start: usize,
    pub end: usize,
    pub start_year: u16,
    pub end_year: u16,
    pub prefixed: bool, // Introduced by "FY" / "Fiscal Year" rather than a bare pair
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityMatch {
    pub start: usize,
    pub end: usize,
    pub number: u32,
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramElementMatch {
    pub start: usize,
    pub end: usize,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmountMatch {
    pub start: usize,
    pub end: usize,
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplanationMatch {
    pub start: usize,
    pub end: usize,
    pub text: String, // Whitespace-collapsed body, label excluded
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLineMatch {
    pub label: String,
    pub numbers_start: usize, // Offset within the line where the first grouped number begins
}

macro_rules! impl_spanned {
    ($($ty:ty),*) => {
        $(impl Spanned for $ty {
            fn span(&self) -> Range<usize> {
                self.start..self.end
            }
        })*
    };
}

impl_spanned!(OrgUnitMatch, CategoryMatch, FiscalYearMatch, ActivityMatch, ProgramElementMatch, AmountMatch, ExplanationMatch);

// --- Recognizers ---

pub fn organizational_units(text: &str) -> Vec<OrgUnitMatch> {
    ORG_UNIT_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let branch = Branch::from_name(caps.get(1)?.as_str())?;
            let direction = if caps.get(2)?.as_str().eq_ignore_ascii_case("decrease") {
                Direction::Decrease
            } else {
                Direction::Increase
            };
            Some(OrgUnitMatch { start: whole.start(), end: whole.end(), branch, direction })
        })
        .collect()
}

/// First service name mentioned anywhere in `text`, without requiring a direction keyword.
pub fn branch_mention(text: &str) -> Option<Branch> {
    BRANCH_NAME_RE
        .captures_iter(text)
        .find_map(|caps| caps.get(1).and_then(|m| Branch::from_name(m.as_str())))
}

/// Department header on a single line ("DEPARTMENT OF THE NAVY", "DEFENSE-WIDE").
pub fn department_header(line: &str) -> Option<Branch> {
    let caps = DEPARTMENT_RE.captures(line)?;
    let name = caps.get(1).or_else(|| caps.get(2))?;
    Branch::from_name(name.as_str())
}

/// Lines that open a new baseline section: department headers and category titles.
pub fn is_baseline_header(line: &str) -> bool {
    department_header(line).is_some() || !appropriation_categories(line).is_empty()
}

/// All category mentions in document order, normalized to the closed category set.
pub fn appropriation_categories(text: &str) -> Vec<CategoryMatch> {
    let mut found: Vec<CategoryMatch> = Vec::new();
    for (category, re) in CATEGORY_RES.iter() {
        for m in re.find_iter(text) {
            let span = m.start()..m.end();
            if found.iter().any(|existing| existing.overlaps(&span)) {
                continue;
            }
            found.push(CategoryMatch { start: m.start(), end: m.end(), category: *category });
        }
    }
    found.sort_by_key(|m| m.start);
    found
}

/// Two-digit years of 90 and above are 19xx, everything else 20xx.
/// Four-digit years pass through; anything else is not a year.
pub fn normalize_year(raw: &str) -> Option<u16> {
    let raw = raw.trim().trim_start_matches('\'');
    if !raw.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let value: u16 = raw.parse().ok()?;
    match raw.len() {
        2 if value >= 90 => Some(1900 + value),
        2 => Some(2000 + value),
        4 => Some(value),
        _ => None,
    }
}

/// Prefixed ("FY 2005", "Fiscal Year 05-06") and bare ("05/05") year expressions, in order.
/// A bare pair inside a prefixed expression is not reported twice.
pub fn fiscal_years(text: &str) -> Vec<FiscalYearMatch> {
    let mut found: Vec<FiscalYearMatch> = Vec::new();
    for caps in FY_PREFIXED_RE.captures_iter(text) {
        let (Some(whole), Some(first)) = (caps.get(0), caps.get(1)) else { continue };
        let Some(start_year) = normalize_year(first.as_str()) else { continue };
        let end_year = caps.get(2).and_then(|m| normalize_year(m.as_str())).unwrap_or(start_year);
        found.push(FiscalYearMatch { start: whole.start(), end: whole.end(), start_year, end_year, prefixed: true });
    }
    for caps in FY_PAIR_RE.captures_iter(text) {
        let (Some(whole), Some(first), Some(second)) = (caps.get(0), caps.get(1), caps.get(2)) else { continue };
        let span = whole.start()..whole.end();
        if found.iter().any(|existing| existing.overlaps(&span)) {
            continue;
        }
        let (Some(start_year), Some(end_year)) = (normalize_year(first.as_str()), normalize_year(second.as_str())) else {
            continue;
        };
        found.push(FiscalYearMatch { start: whole.start(), end: whole.end(), start_year, end_year, prefixed: false });
    }
    found.sort_by_key(|m| m.start);
    found
}

pub fn budget_activity_headers(text: &str) -> Vec<ActivityMatch> {
    ACTIVITY_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let number = caps.get(1)?.as_str().parse().ok()?;
            let raw_title = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
            let title = TRAILING_AMOUNT_RE.replace(raw_title.trim(), "").trim().to_string();
            Some(ActivityMatch {
                start: whole.start(),
                end: whole.end(),
                number,
                title: (!title.is_empty()).then_some(title),
            })
        })
        .collect()
}

pub fn program_element_codes(text: &str) -> Vec<ProgramElementMatch> {
    PROGRAM_ELEMENT_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let m = caps.get(1)?;
            Some(ProgramElementMatch { start: m.start(), end: m.end(), code: m.as_str().to_string() })
        })
        .collect()
}

/// Signed, optionally comma-grouped numbers with an optional scale word.
/// A trailing minus is kept only when it is not a range or year separator ("05-06").
pub fn monetary_amounts(text: &str) -> Vec<AmountMatch> {
    AMOUNT_RE
        .find_iter(text)
        .map(|m| {
            let mut end = m.end();
            if m.as_str().ends_with('-') && text[end..].starts_with(|c: char| c.is_ascii_digit()) {
                end -= 1;
            }
            AmountMatch { start: m.start(), end, raw: text[m.start()..end].to_string() }
        })
        .collect()
}

/// Labeled explanation paragraphs. A block runs until a blank line, a line
/// opening another block, or the end of `text`.
pub fn explanation_blocks(text: &str) -> Vec<ExplanationMatch> {
    let mut blocks = Vec::new();
    let mut search_from = 0;
    while let Some(label) = EXPLANATION_LABEL_RE.find_at(text, search_from) {
        let body_start = label.end();
        let mut body_end = body_start;
        let mut lines = Vec::new();
        let mut cursor = body_start;
        let mut first = true;
        while cursor <= text.len() {
            let line_end = text[cursor..].find('\n').map(|i| cursor + i).unwrap_or(text.len());
            let line = &text[cursor..line_end];
            let opens_block = !first && SECTION_LABEL_RE.is_match(line);
            if line.trim().is_empty() {
                // The body may start on the line after the label.
                if !(first && lines.is_empty() && line_end < text.len()) {
                    break;
                }
            } else if opens_block {
                break;
            } else {
                lines.push(line.trim());
                body_end = line_end;
            }
            first = false;
            if line_end >= text.len() {
                break;
            }
            cursor = line_end + 1;
        }
        if !lines.is_empty() {
            blocks.push(ExplanationMatch {
                start: label.start(),
                end: body_end,
                text: crate::utils::text::collapse_whitespace(&lines.join(" ")),
            });
        }
        search_from = body_end.max(body_start);
        if search_from >= text.len() {
            break;
        }
    }
    blocks
}

/// A baseline data line: leading text, then one or more comma-grouped numbers.
pub fn data_line(line: &str) -> Option<DataLineMatch> {
    let caps = DATA_LINE_RE.captures(line)?;
    let label = caps.get(1)?;
    Some(DataLineMatch { label: label.as_str().trim().to_string(), numbers_start: label.end() })
}

// --- Annotation ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PatternKind {
    OrganizationalUnit,
    AppropriationCategory,
    FiscalYear,
    BudgetActivity,
    ProgramElement,
    MonetaryAmount,
    Explanation,
}

impl PatternKind {
    pub fn name(&self) -> &'static str {
        match self {
            PatternKind::OrganizationalUnit => "org-unit",
            PatternKind::AppropriationCategory => "category",
            PatternKind::FiscalYear => "fiscal-year",
            PatternKind::BudgetActivity => "budget-activity",
            PatternKind::ProgramElement => "program-element",
            PatternKind::MonetaryAmount => "amount",
            PatternKind::Explanation => "explanation",
        }
    }
}

/// Every recognizer's matches over `text`, sorted by start offset then kind.
pub fn annotate(text: &str) -> Vec<(Range<usize>, PatternKind)> {
    let mut spans: Vec<(Range<usize>, PatternKind)> = Vec::new();
    spans.extend(organizational_units(text).iter().map(|m| (m.span(), PatternKind::OrganizationalUnit)));
    spans.extend(appropriation_categories(text).iter().map(|m| (m.span(), PatternKind::AppropriationCategory)));
    spans.extend(fiscal_years(text).iter().map(|m| (m.span(), PatternKind::FiscalYear)));
    spans.extend(budget_activity_headers(text).iter().map(|m| (m.span(), PatternKind::BudgetActivity)));
    spans.extend(program_element_codes(text).iter().map(|m| (m.span(), PatternKind::ProgramElement)));
    spans.extend(monetary_amounts(text).iter().map(|m| (m.span(), PatternKind::MonetaryAmount)));
    spans.extend(explanation_blocks(text).iter().map(|m| (m.span(), PatternKind::Explanation)));
    spans.sort_by(|a, b| a.0.start.cmp(&b.0.start).then(a.1.cmp(&b.1)));
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_org_units_carry_branch_and_direction() {
        let text = "ARMY INCREASE\nfoo\nAir  Force decrease\nNAVY\nMarine Corps INCREASE";
        let units = organizational_units(text);
        assert_eq!(units.len(), 3);
        assert_eq!((units[0].branch, units[0].direction), (Branch::Army, Direction::Increase));
        assert_eq!((units[1].branch, units[1].direction), (Branch::AirForce, Direction::Decrease));
        assert_eq!(units[2].branch, Branch::MarineCorps);
        assert_eq!(&text[units[0].start..units[0].end], "ARMY INCREASE");
    }

    #[test]
    fn test_categories_normalize_and_prefer_specific() {
        let text = "Weapons Procurement, Navy\nResearch, Development, Test and Evaluation\nOther Procurement, Army\nRDT&E";
        let cats: Vec<Category> = appropriation_categories(text).iter().map(|m| m.category).collect();
        assert_eq!(
            cats,
            vec![Category::WeaponsProcurement, Category::Rdte, Category::Procurement, Category::Rdte]
        );
    }

    #[test]
    fn test_year_century_rule() {
        assert_eq!(normalize_year("99"), Some(1999));
        assert_eq!(normalize_year("90"), Some(1990));
        assert_eq!(normalize_year("89"), Some(2089));
        assert_eq!(normalize_year("07"), Some(2007));
        assert_eq!(normalize_year("1995"), Some(1995));
        assert_eq!(normalize_year("195"), None);
        assert_eq!(normalize_year("ab"), None);
    }

    #[test]
    fn test_fiscal_year_expressions() {
        let years = fiscal_years("FY 2005 request; Fiscal Year 98-99; Army, 05/06 +21");
        assert_eq!(years.len(), 3);
        assert_eq!((years[0].start_year, years[0].end_year, years[0].prefixed), (2005, 2005, true));
        assert_eq!((years[1].start_year, years[1].end_year), (1998, 1999));
        assert_eq!((years[2].start_year, years[2].end_year, years[2].prefixed), (2005, 2006, false));
    }

    #[test]
    fn test_prefixed_pair_is_not_repeated_as_bare_pair() {
        let years = fiscal_years("FY05/06");
        assert_eq!(years.len(), 1);
        assert!(years[0].prefixed);
        assert_eq!(years[0].end_year, 2006);
    }

    #[test]
    fn test_budget_activity_title_drops_trailing_amount() {
        let acts = budget_activity_headers("Budget Activity 1: Operating Forces +21\nBudget Activity 04 - Admin");
        assert_eq!(acts.len(), 2);
        assert_eq!(acts[0].number, 1);
        assert_eq!(acts[0].title.as_deref(), Some("Operating Forces"));
        assert_eq!(acts[1].number, 4);
        assert_eq!(acts[1].title.as_deref(), Some("Admin"));
    }

    #[test]
    fn test_program_element_codes() {
        let codes = program_element_codes("PE 0603001A and 0604201N, not 060300A or 0603001AB");
        let codes: Vec<&str> = codes.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["0603001A", "0604201N"]);
    }

    #[test]
    fn test_amounts_with_signs_scales_and_separators() {
        let raws: Vec<String> = monetary_amounts("+21 and -1,500 then $2.5 million, 3,000- and 05-06")
            .into_iter()
            .map(|m| m.raw)
            .collect();
        assert_eq!(raws, vec!["+21", "-1,500", "$2.5 million", "3,000-", "05", "06"], "a year range is not a negative");
    }

    #[test]
    fn test_trailing_minus_before_space_stays_negative() {
        let amounts = monetary_amounts("cut 1,200- in FY");
        assert_eq!(amounts.len(), 1);
        assert_eq!(amounts[0].raw, "1,200-");
        assert_eq!(crate::extractors::normalize_amount(&amounts[0].raw), Some(-1200.0));
    }

    #[test]
    fn test_amounts_skip_digits_glued_to_letters() {
        assert!(monetary_amounts("0603001A").is_empty());
    }

    #[test]
    fn test_explanation_block_stops_at_next_label() {
        let text = "Explanation: Transfer for\n  readiness needs.\nBudget Activity 2: Mobilization\nExplanation: Second.";
        let blocks = explanation_blocks(text);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].text, "Transfer for readiness needs.");
        assert_eq!(blocks[1].text, "Second.");
    }

    #[test]
    fn test_explanation_block_may_start_on_next_line() {
        let blocks = explanation_blocks("Explanation:\nFunds realigned.\n\nTrailing text");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text, "Funds realigned.");
    }

    #[test]
    fn test_data_line_requires_grouped_number() {
        let line = data_line("Tactical Wheeled Vehicles   1,234,567  1,300,000").unwrap();
        assert_eq!(line.label, "Tactical Wheeled Vehicles");
        assert!(data_line("Page 12").is_none());
        assert!(data_line("1,234,567 without label").is_none());
        assert_eq!(data_line("0603001A Missile Defense 45,000").unwrap().label, "0603001A Missile Defense");
    }

    #[test]
    fn test_department_headers() {
        assert_eq!(department_header("DEPARTMENT OF THE AIR FORCE"), Some(Branch::AirForce));
        assert_eq!(department_header("  Defense-Wide  "), Some(Branch::DefenseWide));
        assert_eq!(department_header("Operation and Maintenance"), None);
    }

    #[test]
    fn test_recognizers_are_empty_on_unmatched_input() {
        let text = "nothing to see here";
        assert!(organizational_units(text).is_empty());
        assert!(appropriation_categories(text).is_empty());
        assert!(fiscal_years(text).is_empty());
        assert!(budget_activity_headers(text).is_empty());
        assert!(explanation_blocks(text).is_empty());
        assert!(annotate("").is_empty());
    }
}
