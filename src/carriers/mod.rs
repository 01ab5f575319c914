pub mod mock;
pub mod placeholder;

use crate::carrier::CarrierAdapter;
use crate::error::ConfigError;

/// Every carrier compiled into this build, validated.
pub fn builtin_carriers() -> Result<Vec<CarrierAdapter>, ConfigError> {
    Ok(vec![mock::adapter()?, placeholder::adapter()?])
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use url::Url;

    use super::*;
    use crate::aggregate::Aggregator;
    use crate::document::{DocumentTree, Fetch};
    use crate::error::TransportError;
    use crate::parser::Status;
    use crate::records::PolicyKind;

    /// Maps carrier URLs to files under `tests/fixtures`.
    struct Fixtures {
        calls: RefCell<Vec<String>>,
    }

    impl Fixtures {
        fn new() -> Self {
            Fixtures {
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl Fetch for Fixtures {
        fn fetch(&self, uri: &Url) -> Result<DocumentTree, TransportError> {
            self.calls.borrow_mut().push(uri.to_string());
            let fixture = match uri.path() {
                "/mock_indemnity/a0dfjw9a" => "mock_indemnity",
                "/placeholder_carrier/f02dkl4e/policies/1" => "placeholder_policies_1",
                "/placeholder_carrier/f02dkl4e/policies/2" => "placeholder_policies_2",
                "/placeholder_carrier/f02dkl4e/policies/3" => "placeholder_policies_3",
                _ => {
                    return Err(TransportError::NotFound {
                        uri: uri.to_string(),
                    })
                }
            };
            let html = std::fs::read_to_string(format!("tests/fixtures/{}.html", fixture))
                .map_err(|_| TransportError::NotFound {
                    uri: uri.to_string(),
                })?;
            Ok(DocumentTree::parse(uri.clone(), &html))
        }
    }

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn builtin_carriers_validate() {
        let carriers = builtin_carriers().unwrap();
        let names: Vec<&str> = carriers.iter().map(|c| c.system_name.as_str()).collect();
        assert_eq!(names, vec!["MOCK_INDEMNITY", "PLACEHOLDER_CARRIER"]);
    }

    #[test]
    fn mock_indemnity_page() {
        let fixtures = Fixtures::new();
        let report = Aggregator::new(&fixtures).run_all(&[mock::adapter().unwrap()]);
        assert!(report.is_complete());

        let customer = report.store.customer(mock::SYSTEM_NAME, "a0dfjw9a").unwrap();
        assert_eq!(customer.name.as_deref(), Some("John Roe"));
        assert_eq!(customer.email.as_deref(), Some("john.roe@example.com"));
        assert_eq!(customer.address.as_deref(), Some("7 Elm Street, Portland"));
        assert_eq!(customer.ssn, None);

        let agent = customer.agent.as_ref().unwrap();
        assert_eq!(agent.name.as_deref(), Some("Sally Broker"));
        assert_eq!(agent.producer_code, "MI-30021");
        assert_eq!(agent.agency_code.as_deref(), Some("NW-7"));

        assert_eq!(customer.policies.len(), 3);
        let first = &customer.policies["MI-POL-001"];
        assert_eq!(first.kind, PolicyKind::Standard);
        assert_eq!(first.premium, Some(Decimal::new(120050, 2)));
        assert_eq!(first.status, Some(Status::Active));
        assert_eq!(first.effective_date, date(2021, 1, 15));
        assert_eq!(first.last_payment_date, date(2021, 6, 1));

        // Unparsable cells leave the field empty rather than dropping the policy.
        assert_eq!(customer.policies["MI-POL-002"].last_payment_date, None);
        assert_eq!(customer.policies["MI-POL-002"].effective_date, date(2020, 12, 1));
        assert_eq!(customer.policies["MI-POL-003"].status, None);

        assert_eq!(fixtures.calls.borrow().len(), 1);
    }

    #[test]
    fn placeholder_walks_all_pages() {
        let fixtures = Fixtures::new();
        let report = Aggregator::new(&fixtures).run_all(&[placeholder::adapter().unwrap()]);
        assert!(report.is_complete(), "{:?}", report.failures);
        assert_eq!(fixtures.calls.borrow().len(), 3);

        let customer = report.store.customer(placeholder::SYSTEM_NAME, "f02dkl4e").unwrap();
        assert_eq!(customer.name.as_deref(), Some("Jane Doe"));
        assert_eq!(customer.email.as_deref(), Some("jane.doe@example.com"));
        assert_eq!(customer.address.as_deref(), Some("42 Harbor Rd, Springfield"));
        assert_eq!(customer.ssn, Some(123456789));
        assert_eq!(customer.agent.as_ref().unwrap().producer_code, "PH-118");
        assert_eq!(customer.agent.as_ref().unwrap().name.as_deref(), Some("Priya Patel"));

        let ids: Vec<&str> = customer.policies.keys().map(String::as_str).collect();
        assert_eq!(ids, vec!["PH-1001", "PH-1002", "PH-1003"]);

        let renewed = report
            .store
            .get(placeholder::SYSTEM_NAME, "PH-1001")
            .and_then(|r| r.as_policy())
            .unwrap();
        assert_eq!(renewed.status, Some(Status::ClaimRejected));
        assert_eq!(renewed.premium, Some(Decimal::new(157500, 2)));
        assert_eq!(renewed.number_of_insured, Some(4));

        let third = &customer.policies["PH-1003"];
        assert_eq!(third.kind, PolicyKind::Commissioned);
        assert_eq!(third.commission_rate, Some(Decimal::new(725, 2)));
        assert_eq!(third.status, Some(Status::PendingCancelation));
        assert_eq!(third.last_payment_date, date(2021, 5, 9));
    }

    #[test]
    fn both_carriers_in_one_run() {
        let fixtures = Fixtures::new();
        let report = Aggregator::new(&fixtures).run_all(&builtin_carriers().unwrap());
        assert!(report.is_complete());
        assert!(report.store[mock::SYSTEM_NAME].contains_key("a0dfjw9a"));
        assert!(report.store[placeholder::SYSTEM_NAME].contains_key("f02dkl4e"));
        assert!(report.store.get(mock::SYSTEM_NAME, "f02dkl4e").is_none());
    }
}
