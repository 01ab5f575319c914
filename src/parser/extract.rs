use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use scraper::ElementRef;
use tracing::{debug, warn};

use crate::error::ExtractionError;
use crate::parser::coerce::{Status, Value};
use crate::parser::schema::{FieldId, FieldSchema};

/// Typed values pulled from one node, keyed by field. Fields that were
/// not found or failed coercion are simply missing.
#[derive(Debug, Clone)]
pub struct FieldValues<F> {
    values: HashMap<F, Value>,
}

impl<F: FieldId> FieldValues<F> {
    pub fn get(&self, field: F) -> Option<&Value> {
        self.values.get(&field)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn text(&mut self, field: F) -> Option<String> {
        match self.values.remove(&field)? {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn integer(&mut self, field: F) -> Option<i64> {
        match self.values.remove(&field)? {
            Value::Integer(n) => Some(n),
            _ => None,
        }
    }

    pub fn decimal(&mut self, field: F) -> Option<Decimal> {
        match self.values.remove(&field)? {
            Value::Decimal(d) => Some(d),
            _ => None,
        }
    }

    pub fn date(&mut self, field: F) -> Option<NaiveDate> {
        match self.values.remove(&field)? {
            Value::Date(d) => Some(d),
            _ => None,
        }
    }

    pub fn status(&mut self, field: F) -> Option<Status> {
        match self.values.remove(&field)? {
            Value::Status(s) => Some(s),
            _ => None,
        }
    }

    /// Text for a field the record cannot exist without.
    pub fn key(&mut self, field: F) -> Result<String, ExtractionError> {
        self.text(field).ok_or_else(|| ExtractionError::MissingRequired {
            field: field.name().to_string(),
        })
    }
}

/// A record type built by name from extracted values.
pub trait Entity: Sized {
    type Field: FieldId;

    fn from_values(values: FieldValues<Self::Field>) -> Result<Self, ExtractionError>;
}

/// Apply `schema` to `node`. Field-level failures drop the field unless
/// the schema lists it as required.
pub fn extract_values<F: FieldId>(
    node: ElementRef<'_>,
    schema: &FieldSchema<F>,
) -> Result<FieldValues<F>, ExtractionError> {
    let mut values = HashMap::with_capacity(schema.fields().len());

    for spec in schema.fields() {
        let name = spec.field.name();
        let required = schema.is_required(spec.field);

        let outcome = spec
            .locator
            .resolve(node, name)
            .and_then(|raw| raw.map(|raw| spec.coercion.apply(name, &raw)).transpose());

        match outcome {
            Ok(Some(value)) => {
                debug!(field = name, ?value, "extracted");
                values.insert(spec.field, value);
            }
            Ok(None) if required => {
                return Err(ExtractionError::MissingRequired {
                    field: name.to_string(),
                })
            }
            Ok(None) => debug!(field = name, "no text, field absent"),
            Err(e) if required => return Err(e),
            Err(e) => warn!("{}; field absent", e),
        }
    }

    Ok(FieldValues { values })
}

pub fn extract<E: Entity>(
    node: ElementRef<'_>,
    schema: &FieldSchema<E::Field>,
) -> Result<E, ExtractionError> {
    E::from_values(extract_values(node, schema)?)
}

#[cfg(test)]
mod tests {
    use scraper::Html;

    use super::*;
    use crate::parser::coerce::Coercion;
    use crate::records::{Customer, CustomerField};

    const PAGE: &str = r#"
        <html><body>
          <dd class="value-id">f02dkl4e</dd>
          <dd class="value-name">Jane Doe</dd>
          <dd class="value-ssn">not a number</dd>
        </body></html>
    "#;

    fn schema() -> crate::parser::schema::SchemaBuilder<CustomerField> {
        FieldSchema::builder()
            .field(CustomerField::Name, "dd.value-name", 0, Coercion::Text)
            .field(CustomerField::Id, "dd.value-id", 0, Coercion::Text)
            .field(CustomerField::Email, "dd.value-email", 0, Coercion::Text)
            .field(CustomerField::Ssn, "dd.value-ssn", 0, Coercion::Integer)
    }

    #[test]
    fn builds_customer_by_name() {
        let schema = schema()
            .uses([CustomerField::Name, CustomerField::Id])
            .build()
            .unwrap();
        let html = Html::parse_document(PAGE);
        let customer: Customer = extract(html.root_element(), &schema).unwrap();
        assert_eq!(customer.id, "f02dkl4e");
        assert_eq!(customer.name.as_deref(), Some("Jane Doe"));
        assert_eq!(customer.email, None);
    }

    #[test]
    fn failing_fields_become_absent() {
        let schema = schema()
            .uses([
                CustomerField::Id,
                CustomerField::Email,
                CustomerField::Ssn,
                CustomerField::Name,
            ])
            .build()
            .unwrap();
        let html = Html::parse_document(PAGE);
        let values = extract_values(html.root_element(), &schema).unwrap();
        assert_eq!(values.len(), 2);
        assert!(values.get(CustomerField::Email).is_none());
        assert!(values.get(CustomerField::Ssn).is_none());
    }

    #[test]
    fn required_field_failure_fails_record() {
        let schema = schema()
            .uses([CustomerField::Id, CustomerField::Ssn])
            .requires([CustomerField::Ssn])
            .build()
            .unwrap();
        let html = Html::parse_document(PAGE);
        let err = extract::<Customer>(html.root_element(), &schema).unwrap_err();
        assert!(matches!(err, ExtractionError::TypeCoercionFailure { .. }));
    }

    #[test]
    fn missing_natural_key_fails_record() {
        let schema = schema().uses([CustomerField::Name]).build().unwrap();
        let html = Html::parse_document(PAGE);
        let err = extract::<Customer>(html.root_element(), &schema).unwrap_err();
        assert_eq!(
            err,
            ExtractionError::MissingRequired {
                field: "Id".into()
            }
        );
    }
}
