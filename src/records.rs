use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::ExtractionError;
use crate::parser::{Entity, FieldId, FieldValues, Status, ValueKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CustomerField {
    Name,
    Id,
    Email,
    Address,
    Ssn,
}

impl FieldId for CustomerField {
    fn name(self) -> &'static str {
        match self {
            CustomerField::Name => "Name",
            CustomerField::Id => "Id",
            CustomerField::Email => "Email",
            CustomerField::Address => "Address",
            CustomerField::Ssn => "SSN",
        }
    }

    fn accepts(self) -> ValueKind {
        match self {
            CustomerField::Ssn => ValueKind::Integer,
            _ => ValueKind::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentField {
    Name,
    ProducerCode,
    AgencyName,
    AgencyCode,
}

impl FieldId for AgentField {
    fn name(self) -> &'static str {
        match self {
            AgentField::Name => "Name",
            AgentField::ProducerCode => "ProducerCode",
            AgentField::AgencyName => "AgencyName",
            AgentField::AgencyCode => "AgencyCode",
        }
    }

    fn accepts(self) -> ValueKind {
        ValueKind::Text
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyField {
    Id,
    Premium,
    Status,
    EffectiveDate,
    TerminationDate,
    LastPaymentDate,
    CommissionRate,
    NumberOfInsured,
}

impl FieldId for PolicyField {
    fn name(self) -> &'static str {
        match self {
            PolicyField::Id => "Id",
            PolicyField::Premium => "Premium",
            PolicyField::Status => "Status",
            PolicyField::EffectiveDate => "EffectiveDate",
            PolicyField::TerminationDate => "TerminationDate",
            PolicyField::LastPaymentDate => "LastPaymentDate",
            PolicyField::CommissionRate => "CommissionRate",
            PolicyField::NumberOfInsured => "NumberOfInsured",
        }
    }

    fn accepts(self) -> ValueKind {
        match self {
            PolicyField::Id => ValueKind::Text,
            PolicyField::Premium | PolicyField::CommissionRate => ValueKind::Decimal,
            PolicyField::Status => ValueKind::Status,
            PolicyField::EffectiveDate
            | PolicyField::TerminationDate
            | PolicyField::LastPaymentDate => ValueKind::Date,
            PolicyField::NumberOfInsured => ValueKind::Integer,
        }
    }
}

/// Which policy shape a carrier produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolicyKind {
    #[default]
    Standard,
    /// Adds commission rate and number of insured.
    Commissioned,
}

impl PolicyKind {
    pub fn name(self) -> &'static str {
        match self {
            PolicyKind::Standard => "standard",
            PolicyKind::Commissioned => "commissioned",
        }
    }

    pub fn accepts(self, field: PolicyField) -> bool {
        match field {
            PolicyField::CommissionRate | PolicyField::NumberOfInsured => {
                self == PolicyKind::Commissioned
            }
            _ => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agent {
    pub producer_code: String,
    pub name: Option<String>,
    pub agency_name: Option<String>,
    pub agency_code: Option<String>,
}

impl Entity for Agent {
    type Field = AgentField;

    fn from_values(mut v: FieldValues<AgentField>) -> Result<Self, ExtractionError> {
        Ok(Agent {
            producer_code: v.key(AgentField::ProducerCode)?,
            name: v.text(AgentField::Name),
            agency_name: v.text(AgentField::AgencyName),
            agency_code: v.text(AgentField::AgencyCode),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    pub id: String,
    pub kind: PolicyKind,
    pub premium: Option<Decimal>,
    pub status: Option<Status>,
    pub effective_date: Option<NaiveDate>,
    pub termination_date: Option<NaiveDate>,
    pub last_payment_date: Option<NaiveDate>,
    pub commission_rate: Option<Decimal>,
    pub number_of_insured: Option<i64>,
}

impl Entity for Policy {
    type Field = PolicyField;

    fn from_values(mut v: FieldValues<PolicyField>) -> Result<Self, ExtractionError> {
        Ok(Policy {
            id: v.key(PolicyField::Id)?,
            kind: PolicyKind::default(),
            premium: v.decimal(PolicyField::Premium),
            status: v.status(PolicyField::Status),
            effective_date: v.date(PolicyField::EffectiveDate),
            termination_date: v.date(PolicyField::TerminationDate),
            last_payment_date: v.date(PolicyField::LastPaymentDate),
            commission_rate: v.decimal(PolicyField::CommissionRate),
            number_of_insured: v.integer(PolicyField::NumberOfInsured),
        })
    }
}

/// A customer with its relations attached after extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub ssn: Option<i64>,
    pub agent: Option<Agent>,
    pub policies: BTreeMap<String, Policy>,
}

impl Customer {
    /// Attach the agent and policies. Later policies replace earlier ones
    /// with the same id.
    pub fn with_relations(
        self,
        agent: Option<Agent>,
        policies: impl IntoIterator<Item = Policy>,
    ) -> Self {
        Customer {
            agent,
            policies: policies.into_iter().map(|p| (p.id.clone(), p)).collect(),
            ..self
        }
    }
}

impl Entity for Customer {
    type Field = CustomerField;

    fn from_values(mut v: FieldValues<CustomerField>) -> Result<Self, ExtractionError> {
        Ok(Customer {
            id: v.key(CustomerField::Id)?,
            name: v.text(CustomerField::Name),
            email: v.text(CustomerField::Email),
            address: v.text(CustomerField::Address),
            ssn: v.integer(CustomerField::Ssn),
            agent: None,
            policies: BTreeMap::new(),
        })
    }
}

/// Any record the store can hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Customer(Customer),
    Agent(Agent),
    Policy(Policy),
}

impl Record {
    /// The natural key this record is stored under.
    pub fn key(&self) -> &str {
        match self {
            Record::Customer(c) => &c.id,
            Record::Agent(a) => &a.producer_code,
            Record::Policy(p) => &p.id,
        }
    }

    pub fn as_customer(&self) -> Option<&Customer> {
        match self {
            Record::Customer(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_policy(&self) -> Option<&Policy> {
        match self {
            Record::Policy(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_agent(&self) -> Option<&Agent> {
        match self {
            Record::Agent(a) => Some(a),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(id: &str, premium: i64) -> Policy {
        Policy {
            id: id.into(),
            kind: PolicyKind::Standard,
            premium: Some(Decimal::new(premium, 0)),
            status: Some(Status::Active),
            effective_date: None,
            termination_date: None,
            last_payment_date: None,
            commission_rate: None,
            number_of_insured: None,
        }
    }

    #[test]
    fn relations_key_policies_by_id() {
        let customer = Customer {
            id: "c1".into(),
            name: None,
            email: None,
            address: None,
            ssn: None,
            agent: None,
            policies: BTreeMap::new(),
        }
        .with_relations(None, [policy("p1", 1), policy("p2", 2), policy("p1", 3)]);

        assert_eq!(customer.policies.len(), 2);
        assert_eq!(customer.policies["p1"].premium, Some(Decimal::new(3, 0)));
    }

    #[test]
    fn kinds_gate_commission_fields() {
        assert!(!PolicyKind::Standard.accepts(PolicyField::CommissionRate));
        assert!(PolicyKind::Commissioned.accepts(PolicyField::NumberOfInsured));
        assert!(PolicyKind::Standard.accepts(PolicyField::Premium));
    }
}
