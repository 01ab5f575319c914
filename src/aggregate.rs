use std::collections::BTreeMap;
use std::ops::Index;

use tracing::{error, info, warn};

use crate::carrier::CarrierAdapter;
use crate::document::Fetch;
use crate::error::ScrapeError;
use crate::records::{Customer, Policy, Record};

/// Records by system name, then by natural key. Customer ids, producer
/// codes and policy ids share one key space per carrier; the last write
/// under a key wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateStore {
    carriers: BTreeMap<String, BTreeMap<String, Record>>,
}

impl AggregateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `record` under its natural key, returning what it replaced.
    pub fn insert(&mut self, system_name: &str, record: Record) -> Option<Record> {
        let key = record.key().to_string();
        self.carriers
            .entry(system_name.to_string())
            .or_default()
            .insert(key, record)
    }

    /// Move every record of `other` into `self`; `other` wins collisions.
    pub fn merge(&mut self, other: AggregateStore) {
        for (system_name, records) in other.carriers {
            self.carriers.entry(system_name).or_default().extend(records);
        }
    }

    pub fn carrier(&self, system_name: &str) -> Option<&BTreeMap<String, Record>> {
        self.carriers.get(system_name)
    }

    pub fn get(&self, system_name: &str, key: &str) -> Option<&Record> {
        self.carrier(system_name)?.get(key)
    }

    pub fn customer(&self, system_name: &str, id: &str) -> Option<&Customer> {
        self.get(system_name, id)?.as_customer()
    }

    pub fn system_names(&self) -> impl Iterator<Item = &str> {
        self.carriers.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeMap<String, Record>)> {
        self.carriers.iter().map(|(name, records)| (name.as_str(), records))
    }

    /// Number of records across all carriers.
    pub fn len(&self) -> usize {
        self.carriers.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Index<&str> for AggregateStore {
    type Output = BTreeMap<String, Record>;

    fn index(&self, system_name: &str) -> &Self::Output {
        match self.carrier(system_name) {
            Some(records) => records,
            None => panic!("no records for carrier {system_name}"),
        }
    }
}

#[derive(Debug)]
pub struct AdapterFailure {
    pub system_name: String,
    pub error: ScrapeError,
}

/// Outcome of one scrape pass. Failed carriers contribute nothing to the
/// store.
#[derive(Debug, Default)]
pub struct RunReport {
    pub store: AggregateStore,
    pub failures: Vec<AdapterFailure>,
}

impl RunReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    fn absorb(&mut self, adapter: &CarrierAdapter, outcome: Result<AggregateStore, ScrapeError>) {
        match outcome {
            Ok(staged) => self.store.merge(staged),
            Err(e) => {
                error!(carrier = %adapter.system_name, "scrape failed: {}", e);
                self.failures.push(AdapterFailure {
                    system_name: adapter.system_name.clone(),
                    error: e,
                });
            }
        }
    }
}

/// Runs carrier adapters and links what they extract.
pub struct Aggregator<'f, F: ?Sized> {
    fetcher: &'f F,
}

impl<'f, F: Fetch + ?Sized> Aggregator<'f, F> {
    pub fn new(fetcher: &'f F) -> Self {
        Aggregator { fetcher }
    }

    /// Scrape one carrier into a store of its own.
    pub fn scrape(&self, adapter: &CarrierAdapter) -> Result<AggregateStore, ScrapeError> {
        info!(carrier = %adapter.system_name, source = %adapter.source, "scraping");
        let page = adapter.fetch_source(self.fetcher)?;

        let customer = adapter.customer(&page)?;
        let agent = adapter.agent(&page)?;

        let policies = adapter
            .extract_many(page, self.fetcher)
            .collect::<Result<Vec<Policy>, _>>()?;

        let mut staged = AggregateStore::new();
        let system_name = adapter.system_name.as_str();
        let customer = customer.with_relations(Some(agent.clone()), policies.iter().cloned());
        info!(
            carrier = system_name,
            customer = %customer.id,
            policies = policies.len(),
            "scraped"
        );

        staged.insert(system_name, Record::Customer(customer));
        staged.insert(system_name, Record::Agent(agent));
        for policy in policies {
            if let Some(previous) = staged.insert(system_name, Record::Policy(policy)) {
                warn!(carrier = system_name, key = previous.key(), "duplicate key replaced");
            }
        }
        Ok(staged)
    }

    /// Scrape each adapter in order. A failing adapter is reported and
    /// skipped; the rest still run.
    pub fn run_all(&self, adapters: &[CarrierAdapter]) -> RunReport {
        let mut report = RunReport::default();
        for adapter in adapters {
            let outcome = self.scrape(adapter);
            report.absorb(adapter, outcome);
        }
        report
    }
}

#[cfg(feature = "rayon")]
impl<'f, F: Fetch + Sync + ?Sized> Aggregator<'f, F> {
    /// Like [`Aggregator::run_all`], with adapters scraped concurrently.
    /// Stores are merged in adapter order, so the result matches a
    /// sequential run.
    pub fn run_all_parallel(&self, adapters: &[CarrierAdapter]) -> RunReport {
        use rayon::prelude::*;

        let outcomes: Vec<_> = adapters.par_iter().map(|a| self.scrape(a)).collect();

        let mut report = RunReport::default();
        for (adapter, outcome) in adapters.iter().zip(outcomes) {
            report.absorb(adapter, outcome);
        }
        report
    }
}
