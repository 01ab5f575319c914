use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use crate::error::ConfigError;
use crate::parser::coerce::{Coercion, ValueKind};
use crate::parser::locator::Locator;

/// A logical field of one entity type.
pub trait FieldId: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static {
    fn name(self) -> &'static str;

    /// The value kind the record attribute for this field holds.
    fn accepts(self) -> ValueKind;
}

#[derive(Debug, Clone)]
pub struct FieldSpec<F> {
    pub field: F,
    pub locator: Locator,
    pub coercion: Coercion,
}

/// Validated extraction table for one entity type: the fields a carrier
/// populates, in declaration order, each with its locator and coercion.
#[derive(Debug, Clone)]
pub struct FieldSchema<F: FieldId> {
    used: Vec<FieldSpec<F>>,
    required: Vec<F>,
}

impl<F: FieldId> FieldSchema<F> {
    pub fn builder() -> SchemaBuilder<F> {
        SchemaBuilder::default()
    }

    pub fn fields(&self) -> &[FieldSpec<F>] {
        &self.used
    }

    pub fn uses(&self, field: F) -> bool {
        self.used.iter().any(|spec| spec.field == field)
    }

    pub fn is_required(&self, field: F) -> bool {
        self.required.contains(&field)
    }
}

/// Collects locator and coercion tables separately, then checks they
/// cover every used field.
pub struct SchemaBuilder<F> {
    locators: HashMap<F, Locator>,
    coercions: HashMap<F, Coercion>,
    used: Vec<F>,
    required: Vec<F>,
    error: Option<ConfigError>,
}

impl<F> Default for SchemaBuilder<F> {
    fn default() -> Self {
        SchemaBuilder {
            locators: HashMap::new(),
            coercions: HashMap::new(),
            used: Vec::new(),
            required: Vec::new(),
            error: None,
        }
    }
}

impl<F: FieldId> SchemaBuilder<F> {
    pub fn locate(mut self, field: F, expr: &str, index: usize) -> Self {
        match Locator::new(expr, index) {
            Ok(locator) => {
                self.locators.insert(field, locator);
            }
            Err(e) => {
                self.error.get_or_insert(e);
            }
        }
        self
    }

    pub fn coerce(mut self, field: F, coercion: Coercion) -> Self {
        self.coercions.insert(field, coercion);
        self
    }

    /// Locate and coerce in one call.
    pub fn field(self, field: F, expr: &str, index: usize, coercion: Coercion) -> Self {
        self.locate(field, expr, index).coerce(field, coercion)
    }

    pub fn uses(mut self, fields: impl IntoIterator<Item = F>) -> Self {
        for field in fields {
            if !self.used.contains(&field) {
                self.used.push(field);
            }
        }
        self
    }

    pub fn requires(mut self, fields: impl IntoIterator<Item = F>) -> Self {
        self.required.extend(fields);
        self
    }

    pub fn build(mut self) -> Result<FieldSchema<F>, ConfigError> {
        if let Some(e) = self.error {
            return Err(e);
        }

        let mut used = Vec::with_capacity(self.used.len());
        for field in self.used {
            let locator = self
                .locators
                .remove(&field)
                .ok_or_else(|| ConfigError::MissingLocator {
                    field: field.name().to_string(),
                })?;
            let coercion = *self
                .coercions
                .get(&field)
                .ok_or_else(|| ConfigError::MissingCoercion {
                    field: field.name().to_string(),
                })?;
            if coercion.produces() != field.accepts() {
                return Err(ConfigError::CoercionMismatch {
                    field: field.name().to_string(),
                    expected: field.accepts().name(),
                    coercion: coercion.name(),
                });
            }
            used.push(FieldSpec {
                field,
                locator,
                coercion,
            });
        }

        if let Some(field) = self
            .required
            .iter()
            .find(|f| !used.iter().any(|spec| spec.field == **f))
        {
            return Err(ConfigError::RequiredNotUsed {
                field: field.name().to_string(),
            });
        }

        Ok(FieldSchema {
            used,
            required: self.required,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::CustomerField;

    #[test]
    fn keeps_declared_order() {
        let schema = FieldSchema::builder()
            .field(CustomerField::Name, "dd.name", 0, Coercion::Text)
            .field(CustomerField::Id, "dd.id", 0, Coercion::Text)
            .uses([CustomerField::Id, CustomerField::Name])
            .build()
            .unwrap();
        let order: Vec<_> = schema.fields().iter().map(|s| s.field).collect();
        assert_eq!(order, vec![CustomerField::Id, CustomerField::Name]);
        assert!(!schema.uses(CustomerField::Email));
    }

    #[test]
    fn used_field_needs_locator() {
        let err = FieldSchema::builder()
            .coerce(CustomerField::Email, Coercion::Text)
            .uses([CustomerField::Email])
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingLocator { field } if field == "Email"));
    }

    #[test]
    fn used_field_needs_coercion() {
        let err = FieldSchema::builder()
            .locate(CustomerField::Email, "dd.email", 0)
            .uses([CustomerField::Email])
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingCoercion { field } if field == "Email"));
    }

    #[test]
    fn coercion_must_fit_attribute() {
        let err = FieldSchema::builder()
            .field(CustomerField::Ssn, "dd.ssn", 0, Coercion::UsDate)
            .uses([CustomerField::Ssn])
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::CoercionMismatch { expected: "integer", .. }));
    }

    #[test]
    fn required_must_be_used() {
        let err = FieldSchema::builder()
            .field(CustomerField::Id, "dd.id", 0, Coercion::Text)
            .uses([CustomerField::Id])
            .requires([CustomerField::Email])
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::RequiredNotUsed { .. }));
    }

    #[test]
    fn selector_errors_surface_at_build() {
        let err = FieldSchema::builder()
            .field(CustomerField::Id, "dd[[", 0, Coercion::Text)
            .uses([CustomerField::Id])
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSelector { .. }));
    }
}
