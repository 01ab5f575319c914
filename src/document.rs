use std::time::Duration;

use scraper::{ElementRef, Html};
use tracing::debug;
use url::Url;

use crate::error::TransportError;

/// One parsed page. Read-only once built.
pub struct DocumentTree {
    uri: Url,
    html: Html,
}

impl DocumentTree {
    pub fn parse(uri: Url, source: &str) -> Self {
        DocumentTree {
            uri,
            html: Html::parse_document(source),
        }
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    /// The `<html>` element; selectors resolve against its descendants.
    pub fn root(&self) -> ElementRef<'_> {
        self.html.root_element()
    }
}

impl std::fmt::Debug for DocumentTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentTree").field("uri", &self.uri.as_str()).finish()
    }
}

/// Resolves an address into a parsed page.
pub trait Fetch {
    fn fetch(&self, uri: &Url) -> Result<DocumentTree, TransportError>;
}

impl<F> Fetch for F
where
    F: Fn(&Url) -> Result<DocumentTree, TransportError>,
{
    fn fetch(&self, uri: &Url) -> Result<DocumentTree, TransportError> {
        self(uri)
    }
}

/// Blocking HTTP fetcher. Bodies are decoded as UTF-8 unless the server
/// declares another charset.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent.to_string())
            .timeout(timeout)
            .build()?;
        Ok(HttpFetcher { client })
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, uri: &Url) -> Result<DocumentTree, TransportError> {
        let request_error = |source| TransportError::Request {
            uri: uri.to_string(),
            source,
        };

        debug!("GET {}", uri);
        let response = self
            .client
            .get(uri.as_str())
            .send()
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                uri: uri.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text_with_charset("utf-8").map_err(request_error)?;
        Ok(DocumentTree::parse(uri.clone(), &body))
    }
}
