//! In-memory browser used by the unit tests.
//!
//! Pages are plain HTML strings parsed with `scraper`, so the real CSS
//! selectors from [`crate::config::SelectorConfig`] run against them. Faults
//! are injected per URL (navigation), per selector (stale lookups, optionally
//! only under one element) and per launch. Every launch, navigation, lookup and close is recorded.

use crate::browser::{Element, Launcher, Locator, Scope, Session};
use crate::error::BrowserError;
use scraper::{ElementRef, Html, Selector};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;
use std::time::Duration;

pub const LISTING_URL: &str = "https://news.example.com/international/";

type Events = Rc<RefCell<Vec<String>>>;

/// What one browser launch sees.
#[derive(Debug, Clone, Default)]
pub struct FakeSite {
    pages: HashMap<String, String>,
    nav_faults: HashMap<String, BrowserError>,
    stale: HashSet<String>,
    stale_within: Vec<(String, String)>,
    launch_error: Option<BrowserError>,
}

impl FakeSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    pub fn nav_fault(mut self, url: &str, err: BrowserError) -> Self {
        self.nav_faults.insert(url.to_string(), err);
        self
    }

    /// Lookups with this CSS selector fail as if the handle went stale.
    pub fn stale(mut self, css: &str) -> Self {
        self.stale.insert(css.to_string());
        self
    }

    /// Lookups with `css` fail only when searched under an element matching
    /// `scope_css`.
    pub fn stale_within(mut self, css: &str, scope_css: &str) -> Self {
        self.stale_within
            .push((css.to_string(), scope_css.to_string()));
        self
    }

    pub fn launch_fails(err: BrowserError) -> Self {
        Self {
            launch_error: Some(err),
            ..Self::default()
        }
    }
}

/// Hands out one [`FakeSite`] per launch; the last one repeats.
#[derive(Debug)]
pub struct FakeLauncher {
    sites: RefCell<VecDeque<FakeSite>>,
    last: RefCell<Option<FakeSite>>,
    pub events: Events,
    pub launches: Cell<u32>,
    pub closes: Rc<Cell<u32>>,
}

impl FakeLauncher {
    pub fn new(sites: Vec<FakeSite>) -> Self {
        Self {
            sites: RefCell::new(sites.into()),
            last: RefCell::new(None),
            events: Rc::new(RefCell::new(Vec::new())),
            launches: Cell::new(0),
            closes: Rc::new(Cell::new(0)),
        }
    }

    pub fn single(site: FakeSite) -> Self {
        Self::new(vec![site])
    }

    /// Recorded events starting with `prefix`.
    pub fn events_with(&self, prefix: &str) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .cloned()
            .collect()
    }

    /// Open a session directly, already pointed at `url`.
    pub async fn session_at(&self, url: &str) -> FakeSession {
        let mut session = self.launch().await.expect("fake launch");
        session.goto(url).await.expect("fake navigation");
        session
    }
}

impl Launcher for FakeLauncher {
    type Session = FakeSession;

    async fn launch(&self) -> Result<FakeSession, BrowserError> {
        self.launches.set(self.launches.get() + 1);
        self.events.borrow_mut().push("launch".to_string());

        let site = match self.sites.borrow_mut().pop_front() {
            Some(site) => {
                *self.last.borrow_mut() = Some(site.clone());
                site
            }
            None => self.last.borrow().clone().unwrap_or_default(),
        };
        if let Some(err) = &site.launch_error {
            return Err(err.clone());
        }
        Ok(FakeSession {
            site: Rc::new(site),
            doc: None,
            events: Rc::clone(&self.events),
            closes: Rc::clone(&self.closes),
        })
    }
}

#[derive(Debug)]
pub struct FakeSession {
    site: Rc<FakeSite>,
    doc: Option<Rc<Html>>,
    events: Events,
    closes: Rc<Cell<u32>>,
}

impl FakeSession {
    fn doc(&self) -> Result<Rc<Html>, BrowserError> {
        self.doc
            .clone()
            .ok_or_else(|| BrowserError::Session("no page loaded".to_string()))
    }
}

impl Scope for FakeSession {
    type Element = FakeElement;

    async fn find(&self, locator: &Locator) -> Result<FakeElement, BrowserError> {
        let doc = self.doc()?;
        let found = select(&doc, None, locator, &self.site, &self.events)?;
        first(found, &doc, locator, &self.site, &self.events)
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<FakeElement>, BrowserError> {
        let doc = self.doc()?;
        let found = select(&doc, None, locator, &self.site, &self.events)?;
        Ok(wrap_all(found, &doc, &self.site, &self.events))
    }
}

impl Session for FakeSession {
    async fn goto(&mut self, url: &str) -> Result<(), BrowserError> {
        self.events.borrow_mut().push(format!("goto {url}"));
        if let Some(err) = self.site.nav_faults.get(url) {
            return Err(err.clone());
        }
        match self.site.pages.get(url) {
            Some(html) => {
                self.doc = Some(Rc::new(Html::parse_document(html)));
                Ok(())
            }
            None => Err(BrowserError::Session(format!(
                "net::ERR_NAME_NOT_RESOLVED at {url}"
            ))),
        }
    }

    async fn wait_for(&self, locator: &Locator, timeout: Duration) -> Result<(), BrowserError> {
        let doc = self.doc()?;
        self.events
            .borrow_mut()
            .push(format!("wait {}", locator.to_css()));
        let selector = parse(locator)?;
        if doc.select(&selector).next().is_some() {
            Ok(())
        } else {
            Err(BrowserError::WaitTimeout {
                locator: locator.to_string(),
                timeout,
            })
        }
    }

    async fn close(self) -> Result<(), BrowserError> {
        self.events.borrow_mut().push("close".to_string());
        self.closes.set(self.closes.get() + 1);
        Ok(())
    }
}

/// A node of a fake page, addressed by its position in document order.
#[derive(Debug, Clone)]
pub struct FakeElement {
    doc: Rc<Html>,
    index: usize,
    site: Rc<FakeSite>,
    events: Events,
}

impl FakeElement {
    fn node(&self) -> ElementRef<'_> {
        all_elements(&self.doc)
            .nth(self.index)
            .expect("element index within document")
    }
}

impl Scope for FakeElement {
    type Element = FakeElement;

    async fn find(&self, locator: &Locator) -> Result<FakeElement, BrowserError> {
        let found = select(&self.doc, Some(self.index), locator, &self.site, &self.events)?;
        first(found, &self.doc, locator, &self.site, &self.events)
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<FakeElement>, BrowserError> {
        let found = select(&self.doc, Some(self.index), locator, &self.site, &self.events)?;
        Ok(wrap_all(found, &self.doc, &self.site, &self.events))
    }
}

impl Element for FakeElement {
    async fn text(&self) -> Result<String, BrowserError> {
        Ok(self.node().text().collect())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>, BrowserError> {
        Ok(self
            .node()
            .value()
            .attr(name)
            .filter(|value| !value.is_empty())
            .map(String::from))
    }
}

fn all_elements(doc: &Html) -> impl Iterator<Item = ElementRef<'_>> {
    doc.root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
}

fn parse(locator: &Locator) -> Result<Selector, BrowserError> {
    Selector::parse(&locator.to_css())
        .map_err(|e| BrowserError::Session(format!("invalid selector {locator}: {e:?}")))
}

/// Document-order indexes of the matches, searching under `scope` (or the whole page).
fn select(
    doc: &Html,
    scope: Option<usize>,
    locator: &Locator,
    site: &FakeSite,
    events: &Events,
) -> Result<Vec<usize>, BrowserError> {
    let css = locator.to_css();
    events.borrow_mut().push(format!("find {css}"));
    if site.stale.contains(&css) {
        return Err(BrowserError::Session(format!(
            "stale element reference while looking up {locator}"
        )));
    }

    let selector = parse(locator)?;
    let all: Vec<ElementRef<'_>> = all_elements(doc).collect();
    if let Some(index) = scope {
        for (stale_css, scope_css) in &site.stale_within {
            let scope_selector = parse(&Locator::css(scope_css))?;
            if *stale_css == css && scope_selector.matches(&all[index]) {
                return Err(BrowserError::Session(format!(
                    "stale element reference while looking up {locator} in {scope_css}"
                )));
            }
        }
    }
    let matches: Vec<ElementRef<'_>> = match scope {
        Some(index) => all[index].select(&selector).collect(),
        None => doc.select(&selector).collect(),
    };
    Ok(matches
        .into_iter()
        .filter_map(|m| all.iter().position(|e| *e == m))
        .collect())
}

fn first(
    found: Vec<usize>,
    doc: &Rc<Html>,
    locator: &Locator,
    site: &Rc<FakeSite>,
    events: &Events,
) -> Result<FakeElement, BrowserError> {
    wrap_all(found, doc, site, events)
        .into_iter()
        .next()
        .ok_or_else(|| BrowserError::NotFound {
            locator: locator.to_string(),
        })
}

fn wrap_all(
    found: Vec<usize>,
    doc: &Rc<Html>,
    site: &Rc<FakeSite>,
    events: &Events,
) -> Vec<FakeElement> {
    found
        .into_iter()
        .map(|index| FakeElement {
            doc: Rc::clone(doc),
            index,
            site: Rc::clone(site),
            events: Rc::clone(events),
        })
        .collect()
}

/// One listing item in the target site's markup.
pub fn listing_item(title: &str, href: &str, kicker_html: &str, img: Option<&str>) -> String {
    let img = img
        .map(|src| format!(r#"<img src="{src}">"#))
        .unwrap_or_default();
    format!(
        r#"<div class="contenedor_dato_modulo">
  {kicker_html}
  <h2 class="titulo"><a href="{href}">{title}</a></h2>
  {img}
</div>"#
    )
}

/// A listing page wrapping the given items.
pub fn listing_page(items: &[String]) -> String {
    format!(
        "<html><body><main>{}</main></body></html>",
        items.join("\n")
    )
}

/// An article page with the content-ready marker and the given kicker markup.
pub fn detail_page(kicker_html: &str) -> String {
    format!(
        r#"<html><body>{kicker_html}<div class="contenido_noticia"><p>Body</p></div></body></html>"#
    )
}
