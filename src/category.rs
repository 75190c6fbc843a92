//! Category vocabulary and the precedence chain used to resolve a record's
//! category from the loosely populated fields of the source rows.
//!
//! The chain is an ordered table of [`CategoryRule`]s. Rules are evaluated top
//! down and the first one that yields a category wins; when none does the record
//! lands in [`OTHER`].

use serde::{Deserialize, Serialize};

pub const DIRECT_FOUNDATION_AID: &str = "Direct Foundation Aid";
pub const STUDENT_OPERATIONS_AND_MEALS: &str = "Student Operations & Meals";
pub const FORMAL_EDUCATION: &str = "Formal Education";
pub const BOARDING_EDUCATION: &str = "Boarding Education";
pub const FOUNDATION_OPERATIONS: &str = "Foundation Operations";
pub const OTHER: &str = "Other";

/// The four categories a finance-ledger entry may carry verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CanonicalCategory {
    DirectFoundationAid,
    StudentOperationsAndMeals,
    FormalEducation,
    BoardingEducation,
}

impl CanonicalCategory {
    pub const ALL: [CanonicalCategory; 4] = [
        CanonicalCategory::DirectFoundationAid,
        CanonicalCategory::StudentOperationsAndMeals,
        CanonicalCategory::FormalEducation,
        CanonicalCategory::BoardingEducation,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CanonicalCategory::DirectFoundationAid => DIRECT_FOUNDATION_AID,
            CanonicalCategory::StudentOperationsAndMeals => STUDENT_OPERATIONS_AND_MEALS,
            CanonicalCategory::FormalEducation => FORMAL_EDUCATION,
            CanonicalCategory::BoardingEducation => BOARDING_EDUCATION,
        }
    }

    /// Exact match against the canonical labels. Leading/trailing whitespace is
    /// ignored, case is not.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL.into_iter().find(|c| c.label() == label)
    }

    pub fn from_allocation_tag(tag: &str) -> Option<Self> {
        match tag.trim() {
            "formal" => Some(CanonicalCategory::FormalEducation),
            "boarding" => Some(CanonicalCategory::BoardingEducation),
            "dormitory-consumption" => Some(CanonicalCategory::StudentOperationsAndMeals),
            "direct-aid" => Some(CanonicalCategory::DirectFoundationAid),
            _ => None,
        }
    }
}

/// Everything the precedence chain may look at, borrowed from a raw row.
/// Each source fills in the fields it has.
#[derive(Debug, Clone, Copy, Default)]
pub struct CategoryHints<'a> {
    pub financial_category: Option<&'a str>,
    pub allocation_target: Option<&'a str>,
    pub operational_category: Option<&'a str>,
    pub item_category: Option<&'a str>,
}

pub struct CategoryRule {
    pub name: &'static str,
    resolve: fn(&CategoryHints<'_>) -> Option<String>,
}

impl CategoryRule {
    pub fn apply(&self, hints: &CategoryHints<'_>) -> Option<String> {
        (self.resolve)(hints)
    }
}

impl std::fmt::Debug for CategoryRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CategoryRule").field("name", &self.name).finish()
    }
}

fn explicit_financial_category(hints: &CategoryHints<'_>) -> Option<String> {
    hints
        .financial_category
        .and_then(CanonicalCategory::from_label)
        .map(|c| c.label().to_string())
}

fn allocation_target(hints: &CategoryHints<'_>) -> Option<String> {
    hints
        .allocation_target
        .and_then(CanonicalCategory::from_allocation_tag)
        .map(|c| c.label().to_string())
}

fn foundation_operations(hints: &CategoryHints<'_>) -> Option<String> {
    hints
        .operational_category
        .filter(|c| is_foundation_operations(c))
        .map(|_| FOUNDATION_OPERATIONS.to_string())
}

fn item_category(hints: &CategoryHints<'_>) -> Option<String> {
    hints
        .item_category
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}

/// Ordered by trust: explicit ledger category, derived allocation tag,
/// operational tag, then the inventory item's own category.
pub const CATEGORY_RULES: [CategoryRule; 4] = [
    CategoryRule {
        name: "explicit-financial-category",
        resolve: explicit_financial_category,
    },
    CategoryRule {
        name: "allocation-target",
        resolve: allocation_target,
    },
    CategoryRule {
        name: "foundation-operations",
        resolve: foundation_operations,
    },
    CategoryRule {
        name: "item-category",
        resolve: item_category,
    },
];

pub fn resolve_category(hints: &CategoryHints<'_>) -> String {
    CATEGORY_RULES
        .iter()
        .find_map(|rule| rule.apply(hints))
        .unwrap_or_else(|| OTHER.to_string())
}

pub fn is_foundation_operations(category: &str) -> bool {
    category.trim() == FOUNDATION_OPERATIONS
}
