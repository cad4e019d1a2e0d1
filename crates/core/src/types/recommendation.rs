//! Product recommendations served by the catalog.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use super::product::Product;

/// How a recommendation list was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendationKind {
    /// Derived from the user's own activity and preferred categories.
    Personalized,
    /// Marketplace-wide bestsellers.
    Popular,
    #[serde(other)]
    Other,
}

/// A recommendation widget's payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    #[serde(default, deserialize_with = "null_as_default")]
    pub recommended_products: Vec<Product>,
    /// Category name to interaction count.
    #[serde(default, deserialize_with = "null_as_default")]
    pub preferred_categories: BTreeMap<String, u32>,
    #[serde(rename = "recommendationType")]
    pub kind: RecommendationKind,
    #[serde(default)]
    pub total_recommendations: u32,
}

impl Recommendation {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recommended_products.is_empty()
    }

    #[must_use]
    pub fn is_personalized(&self) -> bool {
        self.kind == RecommendationKind::Personalized
    }

    /// The category with the highest count. Ties go to the name that sorts
    /// first.
    #[must_use]
    pub fn top_category(&self) -> Option<&str> {
        let mut top: Option<(&str, u32)> = None;
        for (name, &count) in &self.preferred_categories {
            if top.is_none_or(|(_, best)| count > best) {
                top = Some((name, count));
            }
        }
        top.map(|(name, _)| name)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
