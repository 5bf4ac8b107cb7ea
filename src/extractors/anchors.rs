//! Declarative element lookup.
//!
//! The site marks its widgets with a mix of CSS classes, ids and AngularJS
//! binding attributes (`ng-if="data.energy==null"`). Instead of scattering
//! those literals through the extractors, each field is described by an
//! [`AnchorSpec`]: an optional tag name plus an ordered list of
//! `(attribute, predicate)` pairs that must all hold.

use scraper::ElementRef;

/// Condition on a single attribute value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrPredicate {
    /// Attribute is present, any value
    Present,
    /// Attribute value equals the string exactly
    Equals(String),
    /// Attribute is present and not blank
    NonEmpty,
    /// Whitespace-separated token list contains this exact token
    Token(String),
    /// Some token of the whitespace-separated list contains this substring
    TokenContains(String),
    /// Attribute value starts with this prefix
    Prefix(String),
}

impl AttrPredicate {
    fn holds(&self, value: Option<&str>) -> bool {
        let Some(value) = value else {
            return false;
        };
        match self {
            AttrPredicate::Present => true,
            AttrPredicate::Equals(expected) => value == expected,
            AttrPredicate::NonEmpty => !value.trim().is_empty(),
            AttrPredicate::Token(token) => value.split_whitespace().any(|t| t == token),
            AttrPredicate::TokenContains(part) => {
                value.split_whitespace().any(|t| t.contains(part.as_str()))
            }
            AttrPredicate::Prefix(prefix) => value.starts_with(prefix.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnchorSpec {
    tag: Option<String>,
    attributes: Vec<(String, AttrPredicate)>,
}

impl AnchorSpec {
    /// Matches any element with this tag name.
    pub fn tag(name: impl Into<String>) -> Self {
        Self {
            tag: Some(name.into()),
            attributes: Vec::new(),
        }
    }

    pub fn attr(mut self, name: impl Into<String>, predicate: AttrPredicate) -> Self {
        self.attributes.push((name.into(), predicate));
        self
    }

    pub fn attr_eq(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attr(name, AttrPredicate::Equals(value.into()))
    }

    pub fn class(self, token: impl Into<String>) -> Self {
        self.attr("class", AttrPredicate::Token(token.into()))
    }

    pub fn class_containing(self, part: impl Into<String>) -> Self {
        self.attr("class", AttrPredicate::TokenContains(part.into()))
    }

    pub fn matches(&self, element: &ElementRef) -> bool {
        let value = element.value();
        if let Some(tag) = &self.tag {
            if !value.name().eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        self.attributes
            .iter()
            .all(|(name, predicate)| predicate.holds(value.attr(name)))
    }

    /// First matching element under `root` (including `root`) in document order.
    pub fn find_first<'a>(&self, root: ElementRef<'a>) -> Option<ElementRef<'a>> {
        self.find_all(root).next()
    }

    /// Every matching element under `root` (including `root`) in document order.
    pub fn find_all<'a: 's, 's>(
        &'s self,
        root: ElementRef<'a>,
    ) -> impl Iterator<Item = ElementRef<'a>> + 's {
        root.descendants()
            .filter_map(ElementRef::wrap)
            .filter(move |element| self.matches(element))
    }
}

/// Nearest ancestor element (excluding `element`) with the given tag.
pub fn enclosing<'a>(element: ElementRef<'a>, tag: &str) -> Option<ElementRef<'a>> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| ancestor.value().name().eq_ignore_ascii_case(tag))
}
