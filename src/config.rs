use crate::category::{
    BOARDING_EDUCATION, DIRECT_FOUNDATION_AID, FORMAL_EDUCATION, FOUNDATION_OPERATIONS, OTHER,
    STUDENT_OPERATIONS_AND_MEALS,
};
use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

pub const DEFAULT_TOP_LIMIT: usize = 10;
pub const DEFAULT_GOODS_UNIT: &str = "unit";
pub const DEFAULT_TOTAL_TOLERANCE: f64 = 0.01;

/// How a goods distribution is priced when monetary totals are computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoodsValuation {
    /// Goods carry no monetary equivalent; they only count as transactions.
    #[default]
    Zero,
    /// Quantity multiplied by the per-unit value recorded on the inventory
    /// item. Rows without a unit value are worth zero.
    UnitValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadlineCategory {
    pub name: String,
    pub color: String,
}

impl HeadlineCategory {
    pub fn new(name: &str, color: &str) -> Self {
        Self {
            name: name.to_string(),
            color: color.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Categories shown individually in the distribution view, in display
    /// order. Everything else collapses into "Other".
    pub headline_categories: Vec<HeadlineCategory>,
    pub other_color: String,
    pub default_top_limit: usize,
    pub default_goods_unit: String,
    pub goods_valuation: GoodsValuation,
    /// Allowed drift between category totals and the grand total.
    pub total_tolerance: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            headline_categories: vec![
                HeadlineCategory::new(DIRECT_FOUNDATION_AID, "#3b82f6"),
                HeadlineCategory::new(STUDENT_OPERATIONS_AND_MEALS, "#10b981"),
                HeadlineCategory::new(FORMAL_EDUCATION, "#f59e0b"),
                HeadlineCategory::new(BOARDING_EDUCATION, "#8b5cf6"),
                HeadlineCategory::new(FOUNDATION_OPERATIONS, "#ef4444"),
            ],
            other_color: "#9ca3af".to_string(),
            default_top_limit: DEFAULT_TOP_LIMIT,
            default_goods_unit: DEFAULT_GOODS_UNIT.to_string(),
            goods_valuation: GoodsValuation::Zero,
            total_tolerance: DEFAULT_TOTAL_TOLERANCE,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.headline_categories.is_empty() {
            return Err(LedgerError::InvalidConfig(
                "at least one headline category is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for headline in &self.headline_categories {
            let name = headline.name.trim();
            if name.is_empty() {
                return Err(LedgerError::InvalidConfig(
                    "headline category names must not be blank".to_string(),
                ));
            }
            if name == OTHER {
                return Err(LedgerError::InvalidConfig(format!(
                    "'{}' is the overflow bucket and cannot be a headline category",
                    OTHER
                )));
            }
            if !seen.insert(name) {
                return Err(LedgerError::InvalidConfig(format!(
                    "headline category '{}' is listed twice",
                    name
                )));
            }
        }

        if self.default_goods_unit.trim().is_empty() {
            return Err(LedgerError::InvalidConfig(
                "default goods unit must not be blank".to_string(),
            ));
        }

        if !self.total_tolerance.is_finite() || self.total_tolerance < 0.0 {
            return Err(LedgerError::InvalidConfig(format!(
                "total tolerance {} must be a non-negative number",
                self.total_tolerance
            )));
        }

        Ok(())
    }
}
