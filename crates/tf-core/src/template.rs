//! Static catalog of entity templates used to prefill the creation form.

use crate::model::{EntityDraft, EntityType, Financials};
use crate::zone::ZoneId;
use serde::Serialize;

/// A reusable starting point for a new entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityTemplate {
    pub id: &'static str,
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: EntityType,
    pub category: ZoneId,
    pub description: &'static str,
    pub financials: Option<Financials>,
    pub details: Option<&'static str>,
    pub search_tags: &'static [&'static str],
}

impl EntityTemplate {
    /// A creation draft prefilled from this template, placed in its category.
    pub fn to_draft(&self) -> EntityDraft {
        EntityDraft {
            zone: Some(self.category),
            financials: self.financials,
            details: self.details.map(str::to_string),
            ..EntityDraft::new(self.name, self.kind)
        }
    }

    fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
            || self
                .search_tags
                .iter()
                .any(|tag| tag.to_lowercase().contains(needle))
    }
}

const TEMPLATES: &[EntityTemplate] = &[
    EntityTemplate {
        id: "consulting-s-corp",
        name: "Consulting S-Corp",
        kind: EntityType::SCorp,
        category: ZoneId::Operations,
        description: "Active service business taxed as an S-corporation",
        financials: Some(Financials::new(Some(250_000.0), None)),
        details: Some("Pays a reasonable salary and distributes the remainder"),
        search_tags: &["s-corp", "consulting", "salary", "payroll"],
    },
    EntityTemplate {
        id: "ecommerce-business",
        name: "E-commerce Business",
        kind: EntityType::Business,
        category: ZoneId::Operations,
        description: "Online retail operation selling physical goods",
        financials: Some(Financials::new(Some(180_000.0), None)),
        details: None,
        search_tags: &["retail", "online", "store"],
    },
    EntityTemplate {
        id: "real-estate-llc",
        name: "Real Estate Holding LLC",
        kind: EntityType::Llc,
        category: ZoneId::Assets,
        description: "Single-purpose LLC that holds rental property",
        financials: Some(Financials::new(None, Some(450_000.0))),
        details: Some("Keep one property per LLC to isolate liability"),
        search_tags: &["llc", "rental", "real estate", "liability"],
    },
    EntityTemplate {
        id: "rental-property",
        name: "Rental Property",
        kind: EntityType::Property,
        category: ZoneId::Assets,
        description: "Income-producing residential property",
        financials: Some(Financials::new(Some(36_000.0), Some(400_000.0))),
        details: None,
        search_tags: &["house", "rental", "real estate"],
    },
    EntityTemplate {
        id: "brokerage-account",
        name: "Brokerage Account",
        kind: EntityType::Investment,
        category: ZoneId::Assets,
        description: "Taxable investment portfolio",
        financials: Some(Financials::new(None, Some(120_000.0))),
        details: None,
        search_tags: &["stocks", "portfolio", "investment"],
    },
    EntityTemplate {
        id: "revocable-living-trust",
        name: "Revocable Living Trust",
        kind: EntityType::Trust,
        category: ZoneId::Foundation,
        description: "Foundation trust that owns the LLCs and avoids probate",
        financials: None,
        details: Some("Grantor keeps control during life; successor trustee takes over"),
        search_tags: &["trust", "estate", "probate", "foundation"],
    },
];

/// Every template, in catalog order.
pub fn catalog() -> &'static [EntityTemplate] {
    TEMPLATES
}

pub fn find(id: &str) -> Option<&'static EntityTemplate> {
    TEMPLATES.iter().find(|t| t.id == id)
}

/// Templates matching `query` (case-insensitive, over name, description,
/// and tags), optionally restricted to one category. An empty query matches
/// everything.
pub fn search(query: &str, category: Option<ZoneId>) -> Vec<&'static EntityTemplate> {
    let needle = query.trim().to_lowercase();
    TEMPLATES
        .iter()
        .filter(|t| category.is_none_or(|c| t.category == c))
        .filter(|t| t.matches(&needle))
        .collect()
}
