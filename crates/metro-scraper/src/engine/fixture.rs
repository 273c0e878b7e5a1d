//! In-memory engine that replays saved HTML instead of driving a browser.
//!
//! A [`FixtureSite`] is an ordered list of listing *stages*: stage 0 is the
//! page as first rendered, and clicking any element marked
//! `data-fixture-action="next-stage"` swaps in the next one, which is how a
//! "load more" button appends cards. Selectors can be given an artificial
//! render delay; matching elements and everything inside them stay invisible
//! to [`Page::locate_all`] and only show up in a timed lookup whose bound
//! covers the delay.
//!
//! Documents are parsed with `scraper`, so locators are real CSS.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use scraper::{ElementRef, Html, Selector};

use super::{Element, Engine, LaunchOptions, Locator, Page};
use crate::error::InteractionError;

/// Attribute value that advances the fixture to its next stage when clicked.
pub const NEXT_STAGE_ACTION: &str = "next-stage";

/// The scripted content and behaviour of a fixture run.
#[derive(Debug, Clone, Default)]
pub struct FixtureSite {
    stages: Vec<String>,
    render_delays: Vec<(String, Duration)>,
    click_failures: Vec<(String, InteractionError)>,
    read_failures: Vec<(String, InteractionError)>,
    navigation_failure: Option<InteractionError>,
    launch_failure: Option<String>,
}

impl FixtureSite {
    /// A site whose listing goes through `stages` in order.
    #[must_use]
    pub fn new<I, S>(stages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            stages: stages.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Elements matching `css` only render `delay` after a lookup starts.
    #[must_use]
    pub fn with_render_delay(mut self, css: impl Into<String>, delay: Duration) -> Self {
        self.render_delays.push((css.into(), delay));
        self
    }

    /// Clicking an element matching `css` fails with `err`.
    #[must_use]
    pub fn with_click_failure(mut self, css: impl Into<String>, err: InteractionError) -> Self {
        self.click_failures.push((css.into(), err));
        self
    }

    /// Reading text or attributes of an element matching `css` fails with
    /// `err`.
    #[must_use]
    pub fn with_read_failure(mut self, css: impl Into<String>, err: InteractionError) -> Self {
        self.read_failures.push((css.into(), err));
        self
    }

    /// Every navigation fails with `err` (the page keeps its content).
    #[must_use]
    pub fn with_navigation_failure(mut self, err: InteractionError) -> Self {
        self.navigation_failure = Some(err);
        self
    }

    /// The engine refuses to start.
    #[must_use]
    pub fn with_launch_failure(mut self, message: impl Into<String>) -> Self {
        self.launch_failure = Some(message.into());
        self
    }
}

struct FixtureState {
    documents: Vec<Rc<Html>>,
    delays: Vec<(Selector, Duration)>,
    click_failures: Vec<(Selector, InteractionError)>,
    read_failures: Vec<(Selector, InteractionError)>,
    navigation_failure: Option<InteractionError>,
    launch_failure: Option<String>,
    stage: Cell<usize>,
    launched: Cell<bool>,
    closed: Cell<bool>,
    navigations: RefCell<Vec<String>>,
    clicks: RefCell<Vec<String>>,
}

impl FixtureState {
    fn current(&self) -> Rc<Html> {
        Rc::clone(&self.documents[self.stage.get()])
    }

    /// Render delay of `element`: the longest delay of any selector matching
    /// it or one of its ancestors.
    fn delay_of(&self, element: ElementRef<'_>) -> Option<Duration> {
        let lineage: Vec<ElementRef<'_>> = std::iter::once(element)
            .chain(element.ancestors().filter_map(ElementRef::wrap))
            .collect();
        self.delays
            .iter()
            .filter(|(selector, _)| lineage.iter().any(|el| selector.matches(el)))
            .map(|(_, delay)| *delay)
            .max()
    }

    fn click_failure(&self, element: ElementRef<'_>) -> Option<InteractionError> {
        injected(&self.click_failures, element)
    }

    fn read_failure(&self, element: ElementRef<'_>) -> Option<InteractionError> {
        injected(&self.read_failures, element)
    }

    fn advance(&self) {
        let next = self.stage.get() + 1;
        if next < self.documents.len() {
            self.stage.set(next);
        }
    }
}

/// Read-only view of what happened during a fixture run.
#[derive(Clone)]
pub struct FixtureProbe {
    state: Rc<FixtureState>,
}

impl FixtureProbe {
    #[must_use]
    pub fn launched(&self) -> bool {
        self.state.launched.get()
    }

    #[must_use]
    pub fn closed(&self) -> bool {
        self.state.closed.get()
    }

    /// Index of the stage currently rendered.
    #[must_use]
    pub fn stage(&self) -> usize {
        self.state.stage.get()
    }

    #[must_use]
    pub fn navigations(&self) -> Vec<String> {
        self.state.navigations.borrow().clone()
    }

    /// Short descriptions of every clicked element, in click order.
    #[must_use]
    pub fn clicks(&self) -> Vec<String> {
        self.state.clicks.borrow().clone()
    }
}

pub struct FixtureEngine {
    state: Rc<FixtureState>,
}

impl FixtureEngine {
    /// Parses every stage of `site` up front.
    ///
    /// A site without stages behaves like a blank page. Delay and failure
    /// selectors that fail to parse are ignored with a warning.
    #[must_use]
    pub fn new(site: FixtureSite) -> Self {
        let mut documents: Vec<Rc<Html>> = site
            .stages
            .iter()
            .map(|html| Rc::new(Html::parse_document(html)))
            .collect();
        if documents.is_empty() {
            documents.push(Rc::new(Html::parse_document("<html><body></body></html>")));
        }

        let delays = parse_selectors(&site.render_delays);
        let click_failures = parse_selectors(&site.click_failures);
        let read_failures = parse_selectors(&site.read_failures);

        Self {
            state: Rc::new(FixtureState {
                documents,
                delays,
                click_failures,
                read_failures,
                navigation_failure: site.navigation_failure,
                launch_failure: site.launch_failure,
                stage: Cell::new(0),
                launched: Cell::new(false),
                closed: Cell::new(false),
                navigations: RefCell::new(Vec::new()),
                clicks: RefCell::new(Vec::new()),
            }),
        }
    }

    #[must_use]
    pub fn probe(&self) -> FixtureProbe {
        FixtureProbe {
            state: Rc::clone(&self.state),
        }
    }
}

impl Engine for FixtureEngine {
    type Page = FixturePage;

    async fn open(&mut self, options: &LaunchOptions) -> Result<FixturePage, InteractionError> {
        if let Some(message) = &self.state.launch_failure {
            return Err(InteractionError::engine("browser launch", message));
        }
        tracing::debug!(
            headless = options.headless,
            width = options.viewport.width,
            height = options.viewport.height,
            "fixture engine opened"
        );
        self.state.launched.set(true);
        Ok(FixturePage {
            state: Rc::clone(&self.state),
        })
    }

    async fn close(&mut self) -> Result<(), InteractionError> {
        if self.state.launched.get() {
            self.state.closed.set(true);
        }
        Ok(())
    }
}

pub struct FixturePage {
    state: Rc<FixtureState>,
}

impl Page for FixturePage {
    type Element = FixtureElement;

    async fn navigate(&self, url: &str, _timeout: Duration) -> Result<(), InteractionError> {
        self.state.navigations.borrow_mut().push(url.to_string());
        match &self.state.navigation_failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn locate(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<FixtureElement, InteractionError> {
        let doc = self.state.current();
        let found = candidates(&self.state, &doc, None, locator)?;
        await_first(&self.state, doc, found, locator, timeout).await
    }

    async fn locate_all(&self, locator: &Locator) -> Result<Vec<FixtureElement>, InteractionError> {
        let doc = self.state.current();
        let found = candidates(&self.state, &doc, None, locator)?;
        Ok(found
            .into_iter()
            .filter(|c| c.delay.is_none())
            .map(|c| FixtureElement {
                state: Rc::clone(&self.state),
                doc: Rc::clone(&doc),
                ordinal: c.ordinal,
            })
            .collect())
    }

    async fn wait_stable(&self, _timeout: Duration) -> Result<(), InteractionError> {
        Ok(())
    }
}

/// An element inside one stage's document. Handles to an earlier stage keep
/// pointing at that stage after the page advances.
pub struct FixtureElement {
    state: Rc<FixtureState>,
    doc: Rc<Html>,
    ordinal: usize,
}

impl FixtureElement {
    fn element_ref(&self) -> Result<ElementRef<'_>, InteractionError> {
        all_elements(&self.doc)
            .nth(self.ordinal)
            .ok_or_else(|| InteractionError::engine("fixture element", "detached from document"))
    }
}

impl Element for FixtureElement {
    async fn locate(&self, locator: &Locator, timeout: Duration) -> Result<Self, InteractionError> {
        let scope = self.element_ref()?;
        let found = candidates(&self.state, &self.doc, Some(scope), locator)?;
        await_first(&self.state, Rc::clone(&self.doc), found, locator, timeout).await
    }

    async fn click(&self) -> Result<(), InteractionError> {
        let element = self.element_ref()?;
        self.state.clicks.borrow_mut().push(describe(element));
        if let Some(err) = self.state.click_failure(element) {
            return Err(err);
        }
        if element.value().attr("data-fixture-action") == Some(NEXT_STAGE_ACTION) {
            self.state.advance();
        }
        Ok(())
    }

    async fn text(&self) -> Result<String, InteractionError> {
        let element = self.element_ref()?;
        if let Some(err) = self.state.read_failure(element) {
            return Err(err);
        }
        Ok(element.text().collect::<String>().trim().to_string())
    }

    async fn attribute(&self, name: &str) -> Result<String, InteractionError> {
        let element = self.element_ref()?;
        if let Some(err) = self.state.read_failure(element) {
            return Err(err);
        }
        element
            .value()
            .attr(name)
            .map(str::to_string)
            .ok_or_else(|| {
                InteractionError::not_found(format!("attribute {name} on {}", describe(element)))
            })
    }
}

struct Candidate {
    ordinal: usize,
    delay: Option<Duration>,
}

/// Matches of `locator` in document order, within `scope` when given.
fn candidates(
    state: &FixtureState,
    doc: &Html,
    scope: Option<ElementRef<'_>>,
    locator: &Locator,
) -> Result<Vec<Candidate>, InteractionError> {
    let selector = Selector::parse(&locator.css)
        .map_err(|e| InteractionError::engine(locator.to_string(), e))?;

    let matches: Vec<ElementRef<'_>> = match scope {
        Some(scope) => scope.select(&selector).collect(),
        None => doc.select(&selector).collect(),
    };

    Ok(matches
        .into_iter()
        .filter(|el| locator.text_matches(&el.text().collect::<String>()))
        .filter_map(|el| {
            let ordinal = all_elements(doc).position(|other| other == el)?;
            Some(Candidate {
                ordinal,
                delay: state.delay_of(el),
            })
        })
        .collect())
}

/// Resolves a timed lookup: an immediately rendered match wins, a delayed one
/// is returned once its delay passes if that fits in `timeout`, otherwise the
/// lookup waits out `timeout` and fails.
async fn await_first(
    state: &Rc<FixtureState>,
    doc: Rc<Html>,
    found: Vec<Candidate>,
    locator: &Locator,
    timeout: Duration,
) -> Result<FixtureElement, InteractionError> {
    let ready = found.iter().find(|c| c.delay.is_none());
    let delayed = found
        .iter()
        .filter_map(|c| c.delay.map(|d| (c, d)))
        .filter(|(_, d)| *d <= timeout)
        .min_by_key(|(_, d)| *d);

    let chosen = match (ready, delayed) {
        (Some(c), _) => c,
        (None, Some((c, delay))) => {
            tokio::time::sleep(delay).await;
            c
        }
        (None, None) => {
            tokio::time::sleep(timeout).await;
            return Err(InteractionError::timeout(locator.to_string(), timeout));
        }
    };

    Ok(FixtureElement {
        state: Rc::clone(state),
        ordinal: chosen.ordinal,
        doc,
    })
}

/// Parses the selector half of each pair, dropping unparsable ones with a
/// warning.
fn parse_selectors<T: Clone>(entries: &[(String, T)]) -> Vec<(Selector, T)> {
    entries
        .iter()
        .filter_map(|(css, value)| match Selector::parse(css) {
            Ok(selector) => Some((selector, value.clone())),
            Err(e) => {
                tracing::warn!(css, error = %e, "ignoring unparsable fixture selector");
                None
            }
        })
        .collect()
}

/// The first injected failure whose selector matches `element` itself.
fn injected(
    failures: &[(Selector, InteractionError)],
    element: ElementRef<'_>,
) -> Option<InteractionError> {
    failures
        .iter()
        .find(|(selector, _)| selector.matches(&element))
        .map(|(_, err)| err.clone())
}

fn all_elements(doc: &Html) -> impl Iterator<Item = ElementRef<'_>> {
    doc.root_element().descendants().filter_map(ElementRef::wrap)
}

fn describe(element: ElementRef<'_>) -> String {
    let value = element.value();
    let mut out = value.name().to_string();
    if let Some(id) = value.id() {
        out.push('#');
        out.push_str(id);
    }
    for class in value.classes() {
        out.push('.');
        out.push_str(class);
    }
    out
}
