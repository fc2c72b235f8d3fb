use std::sync::OnceLock;

use regex::Regex;

use crate::types::{TollCategory, VehicleId};

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(re_date, r"\d{1,2} de \w+");
re!(re_amount, r"R\$\s*(\d+(?:[.,]\d+)?)");
re!(re_identifier, r"\b(\d{3})\s*-?\s*([A-Z0-9]{7})\b");

// ── Fragments ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentKind {
    /// "D de MÊS" text exactly as matched.
    Date(String),
    /// Raw numeric text following "R$", separator untouched.
    Amount(String),
    Category(TollCategory),
    Identifier(VehicleId),
}

/// A classified piece of one OCR line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Zero-based index of the source line.
    pub line: usize,
    pub kind: FragmentKind,
}

/// Every fragment of a document, ordered by line index.
///
/// One line may contribute several fragments of different kinds; the
/// per-kind views below each stay in line order.
#[derive(Debug, Clone, Default)]
pub struct FragmentArena {
    fragments: Vec<Fragment>,
}

impl FragmentArena {
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn dates(&self) -> impl Iterator<Item = (usize, &str)> + '_ {
        self.fragments.iter().filter_map(|f| match &f.kind {
            FragmentKind::Date(d) => Some((f.line, d.as_str())),
            _ => None,
        })
    }

    pub fn amounts(&self) -> impl Iterator<Item = (usize, &str)> + '_ {
        self.fragments.iter().filter_map(|f| match &f.kind {
            FragmentKind::Amount(a) => Some((f.line, a.as_str())),
            _ => None,
        })
    }

    pub fn categories(&self) -> impl Iterator<Item = (usize, TollCategory)> + '_ {
        self.fragments.iter().filter_map(|f| match f.kind {
            FragmentKind::Category(c) => Some((f.line, c)),
            _ => None,
        })
    }

    pub fn identifiers(&self) -> impl Iterator<Item = (usize, &VehicleId)> + '_ {
        self.fragments.iter().filter_map(|f| match &f.kind {
            FragmentKind::Identifier(v) => Some((f.line, v)),
            _ => None,
        })
    }

    /// Fragments on lines up to and including `line`, nearest last.
    pub(crate) fn up_to(&self, line: usize) -> &[Fragment] {
        let end = self.fragments.partition_point(|f| f.line <= line);
        &self.fragments[..end]
    }

    fn push(&mut self, line: usize, kind: FragmentKind) {
        debug_assert!(self.fragments.last().map_or(true, |f| f.line <= line));
        self.fragments.push(Fragment { line, kind });
    }
}

/// Scan OCR text line by line and tag each non-blank line with whatever
/// fragments it carries. Each pattern is tried independently and only its
/// first match on a line is kept.
pub fn classify(text: &str) -> FragmentArena {
    let mut arena = FragmentArena::default();

    for (line, content) in text.lines().enumerate() {
        if content.trim().is_empty() {
            continue;
        }

        if let Some(m) = re_date().find(content) {
            arena.push(line, FragmentKind::Date(m.as_str().to_string()));
        }
        if let Some(category) = TollCategory::find_in(content) {
            arena.push(line, FragmentKind::Category(category));
        }
        if let Some(c) = re_amount().captures(content) {
            arena.push(line, FragmentKind::Amount(c[1].to_string()));
        }
        if let Some(c) = re_identifier().captures(content) {
            arena.push(
                line,
                FragmentKind::Identifier(VehicleId {
                    code: c[1].to_string(),
                    plate: c[2].to_string(),
                }),
            );
        }
    }

    arena
}
