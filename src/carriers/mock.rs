use crate::carrier::{CarrierAdapter, Pagination, PolicyListing};
use crate::error::ConfigError;
use crate::parser::{Coercion, FieldSchema};
use crate::records::{AgentField, CustomerField, PolicyField, PolicyKind};

pub const SYSTEM_NAME: &str = "MOCK_INDEMNITY";
const SOURCE: &str = "https://scraping-interview.onrender.com/mock_indemnity/a0dfjw9a";

/// Mock Indemnity: plain pages, one customer per page, every policy on
/// that same page. Agent and customer share the `name` holder, agent first.
pub fn adapter() -> Result<CarrierAdapter, ConfigError> {
    let agent = FieldSchema::builder()
        .field(AgentField::Name, &holder("name"), 0, Coercion::Text)
        .field(AgentField::ProducerCode, &holder("producerCode"), 0, Coercion::Text)
        .field(AgentField::AgencyName, &holder("agencyName"), 0, Coercion::Text)
        .field(AgentField::AgencyCode, &holder("agencyCode"), 0, Coercion::Text)
        .uses([
            AgentField::Name,
            AgentField::ProducerCode,
            AgentField::AgencyName,
            AgentField::AgencyCode,
        ])
        .build()?;

    let customer = FieldSchema::builder()
        .field(CustomerField::Name, &holder("name"), 1, Coercion::Text)
        .field(CustomerField::Id, &holder("id"), 0, Coercion::Text)
        .field(CustomerField::Email, &holder("email"), 0, Coercion::Text)
        .field(CustomerField::Address, &holder("address"), 0, Coercion::Text)
        .uses([
            CustomerField::Name,
            CustomerField::Id,
            CustomerField::Email,
            CustomerField::Address,
        ])
        .build()?;

    let policy = FieldSchema::builder()
        .field(PolicyField::Id, r#"div[for="id"]"#, 0, Coercion::Text)
        .field(PolicyField::Premium, r#"div[for="premium"]"#, 0, Coercion::Decimal)
        .field(PolicyField::Status, r#"div[for="status"]"#, 0, Coercion::Status)
        .field(PolicyField::EffectiveDate, r#"div[for="effectiveDate"]"#, 0, Coercion::UsDate)
        .field(PolicyField::TerminationDate, r#"div[for="terminationDate"]"#, 0, Coercion::UsDate)
        .field(PolicyField::LastPaymentDate, r#"div[for="lastPaymentDate"]"#, 0, Coercion::UsDate)
        .uses([
            PolicyField::Id,
            PolicyField::Premium,
            PolicyField::Status,
            PolicyField::EffectiveDate,
            PolicyField::TerminationDate,
            PolicyField::LastPaymentDate,
        ])
        .build()?;

    let policies = PolicyListing::new(
        "tr.policy-info-row",
        PolicyKind::Standard,
        policy,
        Pagination::SinglePage,
    )?;

    CarrierAdapter::new("Mock Indemnity", SYSTEM_NAME, SOURCE, customer, agent, policies)
}

fn holder(value_for: &str) -> String {
    format!(r#"dd.value-{value_for}.value-holder[data-value-for="{value_for}"]"#)
}
