//! Quality predicates over enriched videos.
//!
//! Evaluation is pure and never short-circuits: every failing predicate
//! contributes one clause, in predicate order.

use crate::model::RawItem;
use serde::Serialize;
use std::fmt;

/// Thresholds a video and its channel must meet.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCriteria {
    pub target_category: String,
    pub target_owner_region: String,
    pub min_owner_followers: u64,
    pub min_owner_reach: u64,
    pub min_engagement_rate: f64,
}

/// The independent checks, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    OwnerCountry,
    Category,
    OwnerScale,
    Engagement,
}

impl Predicate {
    pub const ALL: [Predicate; 4] = [
        Predicate::OwnerCountry,
        Predicate::Category,
        Predicate::OwnerScale,
        Predicate::Engagement,
    ];
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OwnerCountry => write!(f, "owner_country"),
            Self::Category => write!(f, "category"),
            Self::OwnerScale => write!(f, "owner_scale"),
            Self::Engagement => write!(f, "engagement"),
        }
    }
}

/// Outcome of evaluating every predicate against one item.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterVerdict {
    pub passed: bool,
    pub reasons: Vec<String>,
    pub failed: Vec<Predicate>,
}

impl FilterVerdict {
    /// All reasons as one `"; "`-joined clause list.
    pub fn reason_text(&self) -> String {
        self.reasons.join("; ")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QualityFilter {
    criteria: FilterCriteria,
}

impl QualityFilter {
    pub fn new(criteria: FilterCriteria) -> Self {
        Self { criteria }
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn evaluate(&self, item: &RawItem) -> FilterVerdict {
        let mut reasons = Vec::new();
        let mut failed = Vec::new();

        for predicate in Predicate::ALL {
            if let Some(reason) = self.check(predicate, item) {
                reasons.push(reason);
                failed.push(predicate);
            }
        }

        FilterVerdict {
            passed: reasons.is_empty(),
            reasons,
            failed,
        }
    }

    /// Returns the failure clause for `predicate`, or `None` if it holds.
    fn check(&self, predicate: Predicate, item: &RawItem) -> Option<String> {
        let criteria = &self.criteria;
        match predicate {
            Predicate::OwnerCountry => {
                let country = item.channel.country.trim();
                let target = criteria.target_owner_region.trim();
                if country.is_empty() {
                    Some(format!("channel country unknown (expected {})", target))
                } else if !country.eq_ignore_ascii_case(target) {
                    Some(format!("channel country {} is not {}", country, target))
                } else {
                    None
                }
            }
            Predicate::Category => {
                let category = item.category_id.trim();
                let target = criteria.target_category.trim();
                if category.is_empty() {
                    Some(format!("category unknown (expected {})", target))
                } else if category != target {
                    Some(format!("category {} is not {}", category, target))
                } else {
                    None
                }
            }
            Predicate::OwnerScale => {
                let subscribers = item.channel.subscriber_count;
                let views = item.channel.channel_view_count;
                if subscribers >= criteria.min_owner_followers || views >= criteria.min_owner_reach
                {
                    None
                } else {
                    Some(format!(
                        "channel too small: {} subscribers < {} and {} channel views < {}",
                        subscribers, criteria.min_owner_followers, views, criteria.min_owner_reach
                    ))
                }
            }
            Predicate::Engagement => {
                if item.engagement_rate >= criteria.min_engagement_rate {
                    None
                } else {
                    Some(format!(
                        "engagement rate {}% below {}%",
                        item.engagement_rate, criteria.min_engagement_rate
                    ))
                }
            }
        }
    }
}
