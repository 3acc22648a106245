//! Entity form validation.
//!
//! Raw field text from the creation/edit form is checked before any store
//! call. Errors are reported per field so the form can show them inline.

use crate::error::ValidationError;
use crate::model::{EntityDraft, EntityPatch, EntityType, Financials};
use crate::template::EntityTemplate;
use serde::{Deserialize, Serialize};

/// Field-level form errors. Empty means the form is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors {
    pub name: Option<ValidationError>,
    #[serde(rename = "type")]
    pub kind: Option<ValidationError>,
    pub revenue: Option<ValidationError>,
    pub value: Option<ValidationError>,
}

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.kind.is_none() && self.revenue.is_none() && self.value.is_none()
    }

    /// The first error in field order.
    pub fn first(&self) -> Option<&ValidationError> {
        self.name
            .as_ref()
            .or(self.kind.as_ref())
            .or(self.revenue.as_ref())
            .or(self.value.as_ref())
    }
}

/// Raw text state of the entity form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityForm {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub revenue: String,
    pub value: String,
}

impl EntityForm {
    /// A blank form defaulting to an S-corp, as the creation dialog opens.
    pub fn blank() -> Self {
        Self {
            kind: EntityType::SCorp.as_str().to_string(),
            ..Self::default()
        }
    }

    /// Prefill from a template.
    pub fn from_template(template: &EntityTemplate) -> Self {
        let financials = template.financials.unwrap_or_default();
        Self {
            name: template.name.to_string(),
            kind: template.kind.as_str().to_string(),
            revenue: format_number(financials.revenue),
            value: format_number(financials.value),
        }
    }

    /// Validate every field, returning a draft or all field errors.
    pub fn validate(&self) -> Result<EntityDraft, FieldErrors> {
        let mut errors = FieldErrors::default();

        let name = self.name.trim();
        if name.is_empty() {
            errors.name = Some(ValidationError::EmptyName);
        }

        let kind = match self.kind.trim() {
            "" => {
                errors.kind = Some(ValidationError::MissingType);
                None
            }
            raw => match raw.parse::<EntityType>() {
                Ok(kind) => Some(kind),
                Err(err) => {
                    errors.kind = Some(err);
                    None
                }
            },
        };

        let revenue = parse_amount("revenue", &self.revenue).unwrap_or_else(|err| {
            errors.revenue = Some(err);
            None
        });
        let value = parse_amount("value", &self.value).unwrap_or_else(|err| {
            errors.value = Some(err);
            None
        });

        match kind {
            Some(kind) if errors.is_empty() => {
                Ok(EntityDraft::new(name, kind).with_financials(revenue, value))
            }
            _ => Err(errors),
        }
    }

    /// Validate and turn the form into a patch for an existing entity.
    pub fn validate_patch(&self) -> Result<EntityPatch, FieldErrors> {
        let draft = self.validate()?;
        Ok(EntityPatch {
            name: Some(draft.name),
            kind: Some(draft.kind),
            financials: Some(draft.financials.unwrap_or(Financials::new(None, None))),
            ..EntityPatch::default()
        })
    }
}

fn parse_amount(field: &'static str, raw: &str) -> Result<Option<f64>, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let cleaned: String = trimmed.chars().filter(|c| !matches!(c, ',' | '$')).collect();
    match cleaned.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(Some(n)),
        _ => Err(ValidationError::InvalidNumber {
            field,
            value: raw.to_string(),
        }),
    }
}

fn format_number(n: Option<f64>) -> String {
    n.map(|n| n.to_string()).unwrap_or_default()
}
