use scraper::{ElementRef, Selector};
use url::Url;

use crate::document::{DocumentTree, Fetch};
use crate::error::{ConfigError, ExtractionError, PaginationError, TransportError};
use crate::parser::{extract, Entity, FieldId, FieldSchema, Selection, SelectorExpr};
use crate::records::{Agent, AgentField, Customer, CustomerField, PolicyField, PolicyKind};
use crate::walker::PolicyWalker;

/// How to find the next page of a policy list, e.g. an href like
/// `?page='/policies/2'` read with delimiter `=`.
#[derive(Debug, Clone)]
pub struct NextLinkRule {
    link: SelectorExpr,
    delimiter: Option<char>,
}

impl NextLinkRule {
    pub fn new(link: &str, delimiter: Option<char>) -> Result<Self, ConfigError> {
        Ok(NextLinkRule {
            link: SelectorExpr::parse(link)?,
            delimiter,
        })
    }

    /// The absolute address of the page after `page`, if it links one.
    pub fn next_page(
        &self,
        page: ElementRef<'_>,
        host: &Url,
    ) -> Result<Option<Url>, PaginationError> {
        let href = match self.link.select(page) {
            Selection::Scalar(s) => s,
            Selection::Nodes(matches) => match matches.into_iter().next() {
                Some(s) => s,
                None => return Ok(None),
            },
        };
        let href = href.trim();
        if href.is_empty() {
            return Ok(None);
        }

        let target = match self.delimiter {
            Some(delimiter) => {
                let malformed = || PaginationError::MalformedLink {
                    href: href.to_string(),
                    delimiter,
                };
                let segment = href.split(delimiter).nth(1).ok_or_else(malformed)?;
                let target = segment.trim().trim_matches(|c: char| c == '\'' || c == '"');
                if target.is_empty() {
                    return Err(malformed());
                }
                target
            }
            None => href,
        };

        host.join(target)
            .map(Some)
            .map_err(|source| PaginationError::InvalidUrl {
                href: href.to_string(),
                base: host.to_string(),
                source,
            })
    }
}

#[derive(Debug, Clone)]
pub enum Pagination {
    /// Every policy is on the first page.
    SinglePage,
    NextLink(NextLinkRule),
}

/// Where a carrier's policies live and how to read them.
#[derive(Debug, Clone)]
pub struct PolicyListing {
    pub(crate) container: Selector,
    pub(crate) kind: PolicyKind,
    pub(crate) schema: FieldSchema<PolicyField>,
    pub(crate) pagination: Pagination,
}

impl PolicyListing {
    pub fn new(
        container: &str,
        kind: PolicyKind,
        schema: FieldSchema<PolicyField>,
        pagination: Pagination,
    ) -> Result<Self, ConfigError> {
        let selector = Selector::parse(container).map_err(|e| ConfigError::InvalidSelector {
            expr: container.to_string(),
            reason: e.to_string(),
        })?;

        if let Some(spec) = schema.fields().iter().find(|s| !kind.accepts(s.field)) {
            return Err(ConfigError::FieldNotInKind {
                field: spec.field.name().to_string(),
                kind: kind.name(),
            });
        }

        Ok(PolicyListing {
            container: selector,
            kind,
            schema,
            pagination,
        })
    }
}

/// Static configuration for one data provider.
#[derive(Debug, Clone)]
pub struct CarrierAdapter {
    pub name: String,
    pub system_name: String,
    pub source: Url,
    /// Base for relative pagination links.
    pub host: Url,
    pub customer: FieldSchema<CustomerField>,
    pub agent: FieldSchema<AgentField>,
    pub policies: PolicyListing,
}

impl CarrierAdapter {
    pub fn new(
        name: &str,
        system_name: &str,
        source: &str,
        customer: FieldSchema<CustomerField>,
        agent: FieldSchema<AgentField>,
        policies: PolicyListing,
    ) -> Result<Self, ConfigError> {
        let source = parse_uri(source)?;
        let host = parse_uri(&format!("{}/", source.origin().ascii_serialization()))?;
        Ok(CarrierAdapter {
            name: name.to_string(),
            system_name: system_name.to_string(),
            source,
            host,
            customer,
            agent,
            policies,
        })
    }

    pub fn fetch_source<F: Fetch + ?Sized>(
        &self,
        fetcher: &F,
    ) -> Result<DocumentTree, TransportError> {
        fetcher.fetch(&self.source)
    }

    /// Extract an entity that appears once per page.
    pub fn extract_unique<E: Entity>(
        &self,
        page: &DocumentTree,
        schema: &FieldSchema<E::Field>,
    ) -> Result<E, ExtractionError> {
        extract(page.root(), schema)
    }

    pub fn customer(&self, page: &DocumentTree) -> Result<Customer, ExtractionError> {
        self.extract_unique(page, &self.customer)
    }

    pub fn agent(&self, page: &DocumentTree) -> Result<Agent, ExtractionError> {
        self.extract_unique(page, &self.agent)
    }

    /// Lazily walk every policy, starting at `first` and following the
    /// carrier's pagination.
    pub fn extract_many<'a, F: Fetch + ?Sized>(
        &'a self,
        first: DocumentTree,
        fetcher: &'a F,
    ) -> PolicyWalker<'a, F> {
        PolicyWalker::new(&self.policies, &self.host, fetcher, first)
    }
}

fn parse_uri(uri: &str) -> Result<Url, ConfigError> {
    Url::parse(uri).map_err(|source| ConfigError::InvalidUri {
        uri: uri.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use scraper::Html;

    use super::*;
    use crate::parser::Coercion;

    fn host() -> Url {
        Url::parse("https://carrier.example/").unwrap()
    }

    fn next_of(html: &str) -> Result<Option<Url>, PaginationError> {
        let rule = NextLinkRule::new(r#"tfoot a:contains("Next") @href"#, Some('=')).unwrap();
        let doc = Html::parse_document(html);
        rule.next_page(doc.root_element(), &host())
    }

    #[test]
    fn relative_next_link_joins_host() {
        let html = r#"<table><tfoot><tr><td><a href="?page='/c/f02/policies/2'">Next</a></td></tr></tfoot></table>"#;
        assert_eq!(
            next_of(html).unwrap().unwrap().as_str(),
            "https://carrier.example/c/f02/policies/2"
        );
    }

    #[test]
    fn absolute_next_link_is_kept() {
        let html = r#"<table><tfoot><tr><td><a href="?p=https://other.example/x">Next</a></td></tr></tfoot></table>"#;
        assert_eq!(next_of(html).unwrap().unwrap().as_str(), "https://other.example/x");
    }

    #[test]
    fn no_link_ends_walk() {
        let html = r#"<table><tfoot><tr><td><a href="?page='1'">Prev</a></td></tr></tfoot></table>"#;
        assert_eq!(next_of(html).unwrap(), None);
    }

    #[test]
    fn missing_delimiter_is_malformed() {
        let html = r#"<table><tfoot><tr><td><a href="/policies/2">Next</a></td></tr></tfoot></table>"#;
        assert!(matches!(
            next_of(html),
            Err(PaginationError::MalformedLink { delimiter: '=', .. })
        ));
    }

    #[test]
    fn listing_rejects_fields_outside_kind() {
        let schema = FieldSchema::builder()
            .field(PolicyField::Id, "td", 0, Coercion::Text)
            .field(PolicyField::CommissionRate, "td", 1, Coercion::LabeledDecimal)
            .uses([PolicyField::Id, PolicyField::CommissionRate])
            .build()
            .unwrap();
        let err = PolicyListing::new("tr", PolicyKind::Standard, schema, Pagination::SinglePage)
            .unwrap_err();
        assert!(matches!(err, ConfigError::FieldNotInKind { kind: "standard", .. }));
    }

    #[test]
    fn host_defaults_to_source_origin() {
        let schema_c = FieldSchema::builder()
            .field(CustomerField::Id, "dd", 0, Coercion::Text)
            .uses([CustomerField::Id])
            .build()
            .unwrap();
        let schema_a = FieldSchema::builder()
            .field(AgentField::ProducerCode, "dd", 0, Coercion::Text)
            .uses([AgentField::ProducerCode])
            .build()
            .unwrap();
        let schema_p = FieldSchema::builder()
            .field(PolicyField::Id, "td", 0, Coercion::Text)
            .uses([PolicyField::Id])
            .build()
            .unwrap();
        let listing =
            PolicyListing::new("tr", PolicyKind::Standard, schema_p, Pagination::SinglePage).unwrap();
        let adapter = CarrierAdapter::new(
            "X",
            "CARRIER_X",
            "https://carrier.example/a/b?c=1",
            schema_c,
            schema_a,
            listing,
        )
        .unwrap();
        assert_eq!(adapter.host.as_str(), "https://carrier.example/");
    }
}
