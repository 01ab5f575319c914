//! JSON shaping of extracted records.
//!
//! Decimals become floats only here, and dates become ISO week tuples
//! `[iso_year, iso_week, weekday]` with Monday = 1.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::aggregate::AggregateStore;
use crate::records::{Agent, Customer, Policy, Record};

pub type IsoCalendar = (i32, u32, u32);

pub fn iso_calendar(date: NaiveDate) -> IsoCalendar {
    let week = date.iso_week();
    (week.year(), week.week(), date.weekday().number_from_monday())
}

fn float(value: Option<Decimal>) -> Option<f64> {
    value.and_then(|d| d.to_f64())
}

#[derive(Debug, Serialize)]
pub struct AgentJson<'a> {
    pub name: Option<&'a str>,
    pub producer_code: &'a str,
    pub agency_name: Option<&'a str>,
    pub agency_code: Option<&'a str>,
}

impl<'a> From<&'a Agent> for AgentJson<'a> {
    fn from(agent: &'a Agent) -> Self {
        AgentJson {
            name: agent.name.as_deref(),
            producer_code: &agent.producer_code,
            agency_name: agent.agency_name.as_deref(),
            agency_code: agent.agency_code.as_deref(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PolicyJson<'a> {
    pub id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub premium: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<IsoCalendar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub termination_date: Option<IsoCalendar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_payment_date: Option<IsoCalendar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commission_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_insured: Option<i64>,
}

impl<'a> From<&'a Policy> for PolicyJson<'a> {
    fn from(policy: &'a Policy) -> Self {
        PolicyJson {
            id: &policy.id,
            premium: float(policy.premium),
            status: policy.status.map(|s| s.name()),
            effective_date: policy.effective_date.map(iso_calendar),
            termination_date: policy.termination_date.map(iso_calendar),
            last_payment_date: policy.last_payment_date.map(iso_calendar),
            commission_rate: float(policy.commission_rate),
            number_of_insured: policy.number_of_insured,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CustomerJson<'a> {
    pub name: Option<&'a str>,
    pub id: &'a str,
    pub email: Option<&'a str>,
    pub address: Option<&'a str>,
    pub ssn: Option<i64>,
    pub agent: Option<AgentJson<'a>>,
    pub policies: BTreeMap<&'a str, PolicyJson<'a>>,
}

impl<'a> From<&'a Customer> for CustomerJson<'a> {
    fn from(customer: &'a Customer) -> Self {
        CustomerJson {
            name: customer.name.as_deref(),
            id: &customer.id,
            email: customer.email.as_deref(),
            address: customer.address.as_deref(),
            ssn: customer.ssn,
            agent: customer.agent.as_ref().map(AgentJson::from),
            policies: customer
                .policies
                .iter()
                .map(|(id, policy)| (id.as_str(), PolicyJson::from(policy)))
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecordJson<'a> {
    Customer(CustomerJson<'a>),
    Agent(AgentJson<'a>),
    Policy(PolicyJson<'a>),
}

impl<'a> From<&'a Record> for RecordJson<'a> {
    fn from(record: &'a Record) -> Self {
        match record {
            Record::Customer(c) => RecordJson::Customer(c.into()),
            Record::Agent(a) => RecordJson::Agent(a.into()),
            Record::Policy(p) => RecordJson::Policy(p.into()),
        }
    }
}

pub fn customer_to_json(customer: &Customer) -> serde_json::Result<serde_json::Value> {
    serde_json::to_value(CustomerJson::from(customer))
}

/// `{ system_name: { natural_key: record } }`, each record tagged with its
/// `type`.
pub fn store_to_json(store: &AggregateStore) -> serde_json::Result<serde_json::Value> {
    let shaped: BTreeMap<&str, BTreeMap<&str, RecordJson<'_>>> = store
        .iter()
        .map(|(system_name, records)| {
            let records = records
                .iter()
                .map(|(key, record)| (key.as_str(), RecordJson::from(record)))
                .collect();
            (system_name, records)
        })
        .collect();
    serde_json::to_value(shaped)
}
