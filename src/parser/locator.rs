use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};

use crate::error::{ConfigError, ExtractionError};

static SUBSTRING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^substring\((.+),\s*(\d+)\s*\)$").unwrap());
static ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?)\s*@([A-Za-z_][-A-Za-z0-9_:.]*)$").unwrap());
static CONTAINS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^(.*):contains\("([^"]*)"\)$"#).unwrap());

/// What a selector pulls out of a document node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Already a single string; any index is ignored.
    Scalar(String),
    /// Ordered candidates in document order.
    Nodes(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Output {
    Text,
    OwnText,
    DeepText,
    Attr(String),
}

#[derive(Debug, Clone)]
struct NodeQuery {
    selector: Selector,
    contains: Option<String>,
    output: Output,
}

#[derive(Debug, Clone)]
enum ExprKind {
    Nodes(NodeQuery),
    Substring { inner: NodeQuery, start: usize },
}

/// A compiled selector expression: a CSS selector plus what to read from
/// each match.
///
/// ```text
/// dd.value-holder[data-value-for="id"]        trimmed element text
/// div.card-body ::text                        direct child text nodes
/// div.card-body ::deep-text                   all descendant text nodes
/// tfoot a:contains("Next") @href              attribute of filtered matches
/// substring(div.card-body > div ::text, 10)   scalar, from char 10 (1-based)
/// ```
#[derive(Debug, Clone)]
pub struct SelectorExpr {
    kind: ExprKind,
}

impl SelectorExpr {
    pub fn parse(expr: &str) -> Result<Self, ConfigError> {
        let trimmed = expr.trim();
        let kind = match SUBSTRING_RE.captures(trimmed) {
            Some(caps) => {
                let start = caps[2].parse::<usize>().map_err(|e| invalid(expr, e))?;
                ExprKind::Substring {
                    inner: NodeQuery::parse(expr, caps[1].trim())?,
                    start,
                }
            }
            None => ExprKind::Nodes(NodeQuery::parse(expr, trimmed)?),
        };
        Ok(SelectorExpr { kind })
    }

    pub fn select(&self, node: ElementRef<'_>) -> Selection {
        match &self.kind {
            ExprKind::Nodes(query) => Selection::Nodes(query.candidates(node)),
            ExprKind::Substring { inner, start } => {
                let first = inner.candidates(node).into_iter().next().unwrap_or_default();
                Selection::Scalar(first.chars().skip(start.saturating_sub(1)).collect())
            }
        }
    }
}

impl NodeQuery {
    fn parse(source: &str, expr: &str) -> Result<Self, ConfigError> {
        let (rest, output) = if let Some(rest) = expr.strip_suffix("::deep-text") {
            (rest.trim_end(), Output::DeepText)
        } else if let Some(rest) = expr.strip_suffix("::text") {
            (rest.trim_end(), Output::OwnText)
        } else if let Some(caps) = ATTR_RE.captures(expr) {
            let css = caps.get(1).map_or("", |m| m.as_str());
            (css, Output::Attr(caps[2].to_string()))
        } else {
            (expr, Output::Text)
        };

        let (css, contains) = match CONTAINS_RE.captures(rest) {
            Some(caps) => {
                let css = caps.get(1).map_or("", |m| m.as_str());
                (css, Some(caps[2].to_string()))
            }
            None => (rest, None),
        };

        if css.trim().is_empty() {
            return Err(invalid(source, "empty CSS selector"));
        }
        let selector = Selector::parse(css.trim()).map_err(|e| invalid(source, e))?;

        Ok(NodeQuery {
            selector,
            contains,
            output,
        })
    }

    fn candidates(&self, node: ElementRef<'_>) -> Vec<String> {
        let mut out = Vec::new();
        for el in node.select(&self.selector) {
            if let Some(needle) = &self.contains {
                if !el.text().collect::<String>().contains(needle.as_str()) {
                    continue;
                }
            }
            match &self.output {
                Output::Text => out.push(el.text().collect::<String>().trim().to_string()),
                Output::OwnText => out.extend(
                    el.children()
                        .filter_map(|child| child.value().as_text())
                        .map(|t| t.trim())
                        .filter(|t| !t.is_empty())
                        .map(String::from),
                ),
                Output::DeepText => out.extend(
                    el.text()
                        .map(str::trim)
                        .filter(|t| !t.is_empty())
                        .map(String::from),
                ),
                Output::Attr(name) => {
                    if let Some(value) = el.value().attr(name) {
                        out.push(value.to_string());
                    }
                }
            }
        }
        out
    }
}

fn invalid(expr: &str, reason: impl std::fmt::Display) -> ConfigError {
    ConfigError::InvalidSelector {
        expr: expr.to_string(),
        reason: reason.to_string(),
    }
}

/// A selector plus which of its matches to use.
#[derive(Debug, Clone)]
pub struct Locator {
    pub expr: SelectorExpr,
    pub index: usize,
}

impl Locator {
    pub fn new(expr: &str, index: usize) -> Result<Self, ConfigError> {
        Ok(Locator {
            expr: SelectorExpr::parse(expr)?,
            index,
        })
    }

    /// Resolve to raw text. `Ok(None)` means the selector produced no text.
    pub fn resolve(
        &self,
        node: ElementRef<'_>,
        field: &str,
    ) -> Result<Option<String>, ExtractionError> {
        match self.expr.select(node) {
            Selection::Scalar(text) if text.is_empty() => Ok(None),
            Selection::Scalar(text) => Ok(Some(text)),
            Selection::Nodes(mut matches) => {
                if self.index >= matches.len() {
                    return Err(ExtractionError::IndexOutOfBounds {
                        field: field.to_string(),
                        index: self.index,
                        len: matches.len(),
                    });
                }
                let text = matches.swap_remove(self.index);
                Ok(if text.is_empty() { None } else { Some(text) })
            }
        }
    }
}
