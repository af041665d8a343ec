//! Browser capability used by the extraction pipeline.
//!
//! The pipeline never talks to a concrete browser. It sees three traits:
//!
//! - [`Scope`]: anything that can be searched for descendants (a page or an
//!   element).
//! - [`Element`]: a handle to one node, able to report its text and attributes.
//! - [`Session`]: a page that can navigate and wait, plus explicit teardown.
//!
//! A [`Launcher`] hands out a fresh [`Session`] for each scrape attempt. The
//! production launcher lives in [`chrome`].
//!
//! # Lookups
//!
//! Selector strategies are built from [`Lookup`] values: a [`Locator`] saying
//! *where* to look and a [`LookupKind`] saying *what* to read once found.

pub mod chrome;

use crate::error::BrowserError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Where to look for an element.
///
/// In YAML a locator is a one-key map such as `{ class: volanta }`; fields
/// holding one carry `serde_yaml::with::singleton_map` for that shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locator {
    /// One or more space-separated class names; all must be present.
    Class(String),
    /// A raw CSS selector.
    Css(String),
    /// A tag name.
    Tag(String),
}

impl Locator {
    pub fn class(name: &str) -> Self {
        Locator::Class(name.to_string())
    }

    pub fn css(selector: &str) -> Self {
        Locator::Css(selector.to_string())
    }

    pub fn tag(name: &str) -> Self {
        Locator::Tag(name.to_string())
    }

    /// Render the locator as a CSS selector.
    ///
    /// `Class("volanta fuente_roboto_slab")` becomes
    /// `.volanta.fuente_roboto_slab`.
    pub fn to_css(&self) -> String {
        match self {
            Locator::Class(names) => names
                .split_whitespace()
                .map(|n| format!(".{n}"))
                .collect::<String>(),
            Locator::Css(selector) => selector.clone(),
            Locator::Tag(tag) => tag.clone(),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Class(names) => write!(f, "class={names}"),
            Locator::Css(selector) => write!(f, "css={selector}"),
            Locator::Tag(tag) => write!(f, "tag={tag}"),
        }
    }
}

/// What to read from a matched element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupKind {
    /// Trimmed visible text.
    #[default]
    Text,
    /// The `src` attribute (resolved URL where the backend supports it).
    AttributeSource,
}

/// One entry of a selector strategy list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lookup {
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub locator: Locator,
    #[serde(default)]
    pub kind: LookupKind,
}

impl Lookup {
    pub fn text(locator: Locator) -> Self {
        Self {
            locator,
            kind: LookupKind::Text,
        }
    }

    pub fn source(locator: Locator) -> Self {
        Self {
            locator,
            kind: LookupKind::AttributeSource,
        }
    }
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            LookupKind::Text => write!(f, "{}", self.locator),
            LookupKind::AttributeSource => write!(f, "{}@src", self.locator),
        }
    }
}

/// Something whose descendants can be searched.
pub trait Scope {
    type Element: Element;

    /// First descendant matching `locator`, or [`BrowserError::NotFound`].
    async fn find(&self, locator: &Locator) -> Result<Self::Element, BrowserError>;

    /// Every descendant matching `locator`, in document order.
    async fn find_all(&self, locator: &Locator) -> Result<Vec<Self::Element>, BrowserError>;
}

/// A handle to a single node of a loaded page.
pub trait Element: Scope<Element = Self> + Sized {
    /// Rendered text of the node, untrimmed.
    async fn text(&self) -> Result<String, BrowserError>;

    /// Attribute value, `None` when the attribute is absent or empty.
    async fn attribute(&self, name: &str) -> Result<Option<String>, BrowserError>;
}

/// One isolated browser page, exclusively owned by a scrape attempt.
pub trait Session: Scope {
    /// Navigate and wait for the load to finish (bounded by the page-load timeout).
    async fn goto(&mut self, url: &str) -> Result<(), BrowserError>;

    /// Wait until an element matching `locator` is present.
    async fn wait_for(&self, locator: &Locator, timeout: Duration) -> Result<(), BrowserError>;

    /// Tear the session down and release the browser process.
    async fn close(self) -> Result<(), BrowserError>;
}

/// Factory of fresh sessions.
pub trait Launcher {
    type Session: Session;

    async fn launch(&self) -> Result<Self::Session, BrowserError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_locator_to_css() {
        assert_eq!(Locator::class("volanta").to_css(), ".volanta");
        assert_eq!(
            Locator::class("volanta_noticia fuente_roboto_slab").to_css(),
            ".volanta_noticia.fuente_roboto_slab"
        );
    }

    #[test]
    fn test_css_and_tag_pass_through() {
        assert_eq!(
            Locator::css(".titulo_de_noticia .volanta_noticia").to_css(),
            ".titulo_de_noticia .volanta_noticia"
        );
        assert_eq!(Locator::tag("img").to_css(), "img");
    }

    #[test]
    fn test_lookup_yaml_defaults_to_text() {
        let lookup: Lookup = serde_yaml::from_str("locator: { class: volanta }").unwrap();
        assert_eq!(lookup, Lookup::text(Locator::class("volanta")));

        let image: Lookup =
            serde_yaml::from_str("locator: { tag: img }\nkind: attribute_source").unwrap();
        assert_eq!(image.kind, LookupKind::AttributeSource);
        assert_eq!(image.to_string(), "tag=img@src");
    }

    #[test]
    fn test_lookup_yaml_round_trips_as_map() {
        let lookup = Lookup::text(Locator::css(".titulo .volanta"));
        let yaml = serde_yaml::to_string(&lookup).unwrap();
        assert!(!yaml.contains('!'), "locator serialized as a tag: {yaml}");
        assert_eq!(serde_yaml::from_str::<Lookup>(&yaml).unwrap(), lookup);
    }
}
