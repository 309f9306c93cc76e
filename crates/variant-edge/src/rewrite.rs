//! Declarative, streaming HTML rewriting.
//!
//! A [`RuleSet`] maps element selectors to typed [`RewriteAction`]s. A
//! [`StreamingRewriter`] backend turns the rule set into a single forward
//! pass over the document: chunks go in, rewritten bytes come out, and
//! content that no rule matches is passed through untouched.

use std::borrow::Cow;
use std::sync::Arc;

use bytes::Bytes;
use lol_html::html_content::{ContentType, Element};
use lol_html::{ElementContentHandlers, HtmlRewriter, Selector, Settings};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::types::TransformError;

/// Default display name written into `title` and `h1#title`.
pub const DISPLAY_NAME: &str = "Gerardo Paredes";
/// Default tagline written into `p#description`.
pub const TAGLINE: &str = "Cloudflare workers are pretty awesome!";
/// Default link text written into `a#url`.
pub const LINK_TEXT: &str = "Checkout my Portfolio :D !";
/// Default `href` written into `a#url`.
pub const PORTFOLIO_URL: &str = "http://gerardo-paredes.com";

/// Content the standard rule table writes into a variant page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branding {
    pub display_name: String,
    pub tagline: String,
    pub link_text: String,
    pub link_href: String,
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            display_name: DISPLAY_NAME.to_string(),
            tagline: TAGLINE.to_string(),
            link_text: LINK_TEXT.to_string(),
            link_href: PORTFOLIO_URL.to_string(),
        }
    }
}

/// What to do with an element matched by a selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RewriteAction {
    /// Replace the inner content with escaped text.
    SetText { text: String },
    /// Replace the inner content and overwrite one attribute.
    SetTextAndAttribute {
        text: String,
        attribute: String,
        value: String,
    },
}

impl RewriteAction {
    pub fn set_text(text: impl Into<String>) -> Self {
        RewriteAction::SetText { text: text.into() }
    }

    pub fn set_text_and_attribute(
        text: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        RewriteAction::SetTextAndAttribute {
            text: text.into(),
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Apply the action to a matched element.
    pub fn apply(&self, element: &mut dyn ElementHandle) -> Result<(), TransformError> {
        tracing::trace!(tag = %element.tag_name(), "rewriting element");
        match self {
            RewriteAction::SetText { text } => {
                element.set_inner_text(text);
                Ok(())
            }
            RewriteAction::SetTextAndAttribute {
                text,
                attribute,
                value,
            } => {
                element.set_inner_text(text);
                element.set_attribute(attribute, value)
            }
        }
    }
}

/// One selector bound to one action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteRule {
    pub selector: String,
    pub action: RewriteAction,
}

/// Ordered selector → action table, fixed once the transformer is built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    rules: Vec<RewriteRule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `action` for every element matching `selector`.
    pub fn on(mut self, selector: impl Into<String>, action: RewriteAction) -> Self {
        self.rules.push(RewriteRule {
            selector: selector.into(),
            action,
        });
        self
    }

    /// The standard variant-page rules filled with `branding`.
    pub fn branded(branding: &Branding) -> Self {
        Self::new()
            .on("title", RewriteAction::set_text(&branding.display_name))
            .on("h1#title", RewriteAction::set_text(&branding.display_name))
            .on("p#description", RewriteAction::set_text(&branding.tagline))
            .on(
                "a#url",
                RewriteAction::set_text_and_attribute(
                    &branding.link_text,
                    "href",
                    &branding.link_href,
                ),
            )
    }

    pub fn rules(&self) -> &[RewriteRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Mutable view of a matched element, handed to a [`RewriteAction`].
pub trait ElementHandle {
    fn tag_name(&self) -> String;
    fn set_inner_text(&mut self, text: &str);
    fn set_attribute(&mut self, name: &str, value: &str) -> Result<(), TransformError>;
}

/// An open single-pass rewriting session.
pub trait RewriteSession {
    fn write(&mut self, chunk: &[u8]) -> Result<(), TransformError>;
    fn end(self: Box<Self>) -> Result<(), TransformError>;
}

/// Output sink a session writes rewritten bytes to.
pub type Sink<'a> = Box<dyn FnMut(&[u8]) + 'a>;

/// Pluggable streaming rewriter backend.
pub trait StreamingRewriter: Send + Sync {
    /// Reject rule sets whose selectors this backend cannot match.
    fn validate(&self, rules: &RuleSet) -> Result<(), TransformError>;

    /// Start a forward pass over a new document.
    fn session<'a>(
        &self,
        rules: &'a RuleSet,
        sink: Sink<'a>,
    ) -> Result<Box<dyn RewriteSession + 'a>, TransformError>;
}

/// Backend built on `lol_html`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LolHtmlRewriter;

fn parse_selector(selector: &str) -> Result<Selector, TransformError> {
    selector
        .parse::<Selector>()
        .map_err(|e| TransformError::Selector {
            selector: selector.to_string(),
            reason: e.to_string(),
        })
}

struct LolElement<'e, 'r, 't>(&'e mut Element<'r, 't>);

impl ElementHandle for LolElement<'_, '_, '_> {
    fn tag_name(&self) -> String {
        self.0.tag_name()
    }

    fn set_inner_text(&mut self, text: &str) {
        self.0.set_inner_content(text, ContentType::Text);
    }

    fn set_attribute(&mut self, name: &str, value: &str) -> Result<(), TransformError> {
        self.0
            .set_attribute(name, value)
            .map_err(|e| TransformError::Rewrite(format!("attribute '{name}': {e}")))
    }
}

struct LolSession<'a> {
    rewriter: HtmlRewriter<'a, Sink<'a>>,
}

impl RewriteSession for LolSession<'_> {
    fn write(&mut self, chunk: &[u8]) -> Result<(), TransformError> {
        self.rewriter
            .write(chunk)
            .map_err(|e| TransformError::Rewrite(e.to_string()))
    }

    fn end(self: Box<Self>) -> Result<(), TransformError> {
        self.rewriter
            .end()
            .map_err(|e| TransformError::Rewrite(e.to_string()))
    }
}

impl StreamingRewriter for LolHtmlRewriter {
    fn validate(&self, rules: &RuleSet) -> Result<(), TransformError> {
        for rule in rules.rules() {
            parse_selector(&rule.selector)?;
        }
        Ok(())
    }

    fn session<'a>(
        &self,
        rules: &'a RuleSet,
        sink: Sink<'a>,
    ) -> Result<Box<dyn RewriteSession + 'a>, TransformError> {
        let mut handlers = Vec::with_capacity(rules.len());
        for rule in rules.rules() {
            let selector = parse_selector(&rule.selector)?;
            let action = &rule.action;
            handlers.push((
                Cow::Owned(selector),
                ElementContentHandlers::default().element(move |el| {
                    action.apply(&mut LolElement(el))?;
                    Ok(())
                }),
            ));
        }

        let rewriter = HtmlRewriter::new(
            Settings {
                element_content_handlers: handlers,
                ..Settings::default()
            },
            sink,
        );

        Ok(Box::new(LolSession { rewriter }))
    }
}

/// Applies a fixed rule set to streamed documents.
#[derive(Clone)]
pub struct MarkupTransformer {
    rules: Arc<RuleSet>,
    backend: Arc<dyn StreamingRewriter>,
}

impl std::fmt::Debug for MarkupTransformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkupTransformer")
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

impl MarkupTransformer {
    /// Build a transformer, validating every selector against the backend.
    pub fn new(rules: RuleSet, backend: Arc<dyn StreamingRewriter>) -> Result<Self, TransformError> {
        backend.validate(&rules)?;
        Ok(Self {
            rules: Arc::new(rules),
            backend,
        })
    }

    /// Standard rule table with `branding`, on the `lol_html` backend.
    pub fn branded(branding: &Branding) -> Result<Self, TransformError> {
        Self::new(RuleSet::branded(branding), Arc::new(LolHtmlRewriter))
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Rewrite a document delivered as a sequence of chunks.
    pub fn transform_chunks<I, C>(&self, chunks: I) -> Result<Vec<u8>, TransformError>
    where
        I: IntoIterator<Item = C>,
        C: AsRef<[u8]>,
    {
        let mut output = Vec::new();
        {
            let mut session = self
                .backend
                .session(&self.rules, Box::new(|c: &[u8]| output.extend_from_slice(c)))?;
            for chunk in chunks {
                session.write(chunk.as_ref())?;
            }
            session.end()?;
        }
        Ok(output)
    }

    /// Rewrite a complete in-memory document.
    pub fn transform_str(&self, html: &str) -> Result<String, TransformError> {
        let bytes = self.transform_chunks([html.as_bytes()])?;
        String::from_utf8(bytes).map_err(|e| TransformError::Rewrite(e.to_string()))
    }

    /// Rewrite chunks as they arrive on `rx` until the sender is dropped.
    ///
    /// Blocks the calling thread; run it under `spawn_blocking`.
    pub fn transform_receiver(&self, mut rx: mpsc::Receiver<Bytes>) -> Result<Vec<u8>, TransformError> {
        let mut output = Vec::new();
        {
            let mut session = self
                .backend
                .session(&self.rules, Box::new(|c: &[u8]| output.extend_from_slice(c)))?;
            while let Some(chunk) = rx.blocking_recv() {
                session.write(&chunk)?;
            }
            session.end()?;
        }
        Ok(output)
    }
}
