use crate::carrier::{CarrierAdapter, NextLinkRule, Pagination, PolicyListing};
use crate::error::ConfigError;
use crate::parser::{Coercion, FieldSchema};
use crate::records::{AgentField, CustomerField, PolicyField, PolicyKind};

pub const SYSTEM_NAME: &str = "PLACEHOLDER_CARRIER";
const SOURCE: &str =
    "https://scraping-interview.onrender.com/placeholder_carrier/f02dkl4e/policies/1";

const CUSTOMER_BODY: &str = ".customer-details > .card-body";

/// Placeholder Carrier: labelled cards for agent and customer, policies in
/// a table split over pages linked from the table footer.
pub fn adapter() -> Result<CarrierAdapter, ConfigError> {
    let agent = FieldSchema::builder()
        .field(AgentField::Name, &labelled("name"), 0, Coercion::Text)
        .field(AgentField::ProducerCode, &labelled("producerCode"), 0, Coercion::Text)
        .field(AgentField::AgencyName, &labelled("agencyName"), 0, Coercion::Text)
        .field(AgentField::AgencyCode, &labelled("agencyCode"), 0, Coercion::Text)
        .uses([
            AgentField::Name,
            AgentField::ProducerCode,
            AgentField::AgencyName,
            AgentField::AgencyCode,
        ])
        .build()?;

    let customer = FieldSchema::builder()
        .field(CustomerField::Name, &labelled("name"), 1, Coercion::Text)
        .field(CustomerField::Id, ".customer-details span", 1, Coercion::Text)
        .field(CustomerField::Email, &format!("{CUSTOMER_BODY} ::text"), 0, Coercion::Text)
        .field(
            CustomerField::Address,
            &format!("substring({CUSTOMER_BODY} > div:nth-of-type(4) ::text, 10)"),
            0,
            Coercion::Text,
        )
        .field(
            CustomerField::Ssn,
            &format!(r#"{CUSTOMER_BODY} > div[style="display:none"] ::deep-text"#),
            1,
            Coercion::Integer,
        )
        .uses([
            CustomerField::Name,
            CustomerField::Id,
            CustomerField::Email,
            CustomerField::Address,
            CustomerField::Ssn,
        ])
        .build()?;

    let columns = [
        (PolicyField::Id, Coercion::Text),
        (PolicyField::Premium, Coercion::LabeledDecimal),
        (PolicyField::Status, Coercion::Status),
        (PolicyField::EffectiveDate, Coercion::UsDate),
        (PolicyField::TerminationDate, Coercion::UsDate),
        (PolicyField::LastPaymentDate, Coercion::UsDate),
        (PolicyField::CommissionRate, Coercion::LabeledDecimal),
        (PolicyField::NumberOfInsured, Coercion::Integer),
    ];
    let policy = columns
        .iter()
        .enumerate()
        .fold(FieldSchema::builder(), |schema, (column, (field, coercion))| {
            schema.field(*field, "td", column, *coercion)
        })
        .uses(columns.map(|(field, _)| field))
        .requires([PolicyField::Premium, PolicyField::Status])
        .build()?;

    let next = NextLinkRule::new(r#"tfoot a:contains("Next") @href"#, Some('='))?;
    let policies = PolicyListing::new(
        "table.policies > tbody > tr",
        PolicyKind::Commissioned,
        policy,
        Pagination::NextLink(next),
    )?;

    CarrierAdapter::new("Placeholder Carrier", SYSTEM_NAME, SOURCE, customer, agent, policies)
}

fn labelled(label_for: &str) -> String {
    format!(r#"label[for="{label_for}"] ~ span"#)
}
