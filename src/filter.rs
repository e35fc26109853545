//! Search filter strings. Only the present filter `(attr=*)` is built; every
//! other well-formed item is reported as [`FilterError::Unsupported`].

use crate::codec::{self, Element};
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser as PestParser;

#[derive(PestParser)]
#[grammar = "filter.pest"]
struct FilterParser;

/// Context tag of the `present` choice in `Filter`.
pub const PRESENT_TAG: u32 = 7;

#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Unsupported filter item: {0}")]
    Unsupported(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Present(String),
}

impl Filter {
    pub fn present(attribute: impl Into<String>) -> Self {
        Filter::Present(attribute.into())
    }

    pub fn attribute(&self) -> &str {
        match self {
            Filter::Present(attr) => attr,
        }
    }

    /// `[7]` primitive with the attribute description as content.
    pub fn to_element(&self) -> Element {
        match self {
            Filter::Present(attr) => codec::context_primitive(PRESENT_TAG, attr.as_bytes()),
        }
    }
}

impl std::str::FromStr for Filter {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

pub fn parse(source: &str) -> Result<Filter, FilterError> {
    let mut pairs = FilterParser::parse(Rule::filter, source.trim()).map_err(|e| FilterError::Parse(e.to_string()))?;
    let filter = pairs.next().ok_or_else(|| FilterError::Parse("empty input".to_string()))?;
    let item = filter
        .into_inner()
        .find(|p| p.as_rule() != Rule::EOI)
        .ok_or_else(|| FilterError::Parse("missing filter item".to_string()))?;
    build_item(item)
}

fn build_item(pair: Pair<Rule>) -> Result<Filter, FilterError> {
    match pair.as_rule() {
        Rule::present => {
            let attr = pair
                .into_inner()
                .find(|p| p.as_rule() == Rule::attr)
                .ok_or_else(|| FilterError::Parse("present filter without attribute".to_string()))?;
            Ok(Filter::Present(attr.as_str().to_string()))
        }
        _ => Err(FilterError::Unsupported(pair.as_str().to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn present_filter() {
        assert_eq!(parse("(objectClass=*)").expect("parse"), Filter::present("objectClass"));
        assert_eq!(parse("(2.5.4.3=*)").expect("parse"), Filter::present("2.5.4.3"));
        assert_eq!(parse("(cn;binary=*)").expect("parse"), Filter::present("cn;binary"));
    }

    #[test]
    fn present_encoding() {
        assert_eq!(
            Filter::present("objectClass").to_element().encode(),
            [&[0x87, 0x0B][..], b"objectClass"].concat()
        );
    }

    #[test]
    fn other_items_are_unsupported() {
        assert!(matches!(parse("(cn=admin)"), Err(FilterError::Unsupported(_))));
        assert!(matches!(parse("(cn=*adm*)"), Err(FilterError::Unsupported(_))));
        assert!(matches!(parse("(&(cn=*)(sn=*))"), Err(FilterError::Unsupported(_))));
    }

    #[test]
    fn malformed_strings_fail_to_parse() {
        assert!(matches!(parse("cn=*"), Err(FilterError::Parse(_))));
        assert!(matches!(parse("()"), Err(FilterError::Parse(_))));
        assert!(matches!(parse(""), Err(FilterError::Parse(_))));
    }
}
