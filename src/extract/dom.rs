//! Document access shared by the field rules
//!
//! Every rule receives a [`Page`] and returns `Some(value)` only when its
//! sanity gates pass, so rules compose into ordered fallback chains with
//! [`first_match`].

use crate::extract::text::collapse_whitespace;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

/// Read-only view of one parsed page
pub struct Page<'a> {
    pub doc: &'a Html,

    /// Source URL as submitted
    pub url: &'a str,

    /// Concatenated text of `<body>`, newlines preserved
    pub body_text: String,

    /// Cleaned page title, filled in once metadata has been read
    pub meta_title: String,
}

impl<'a> Page<'a> {
    pub fn new(doc: &'a Html, url: &'a str) -> Self {
        let body_text = select_first(doc, "body")
            .map(|body| body.text().collect::<String>())
            .unwrap_or_default();

        Self {
            doc,
            url,
            body_text,
            meta_title: String::new(),
        }
    }

    /// Selects every element matching `css`, in document order
    pub fn select(&self, css: &str) -> Vec<ElementRef<'a>> {
        select_all(self.doc, css)
    }

    /// Selects the first element matching `css`
    pub fn first(&self, css: &str) -> Option<ElementRef<'a>> {
        select_first(self.doc, css)
    }

    /// Trimmed text of every element matching `css`, concatenated
    pub fn text_of(&self, css: &str) -> String {
        self.select(css)
            .into_iter()
            .map(element_text)
            .collect::<String>()
            .trim()
            .to_string()
    }

    /// Value of attribute `attr` on the first element matching `css`
    pub fn attr_of(&self, css: &str, attr: &str) -> Option<String> {
        self.first(css)
            .and_then(|el| el.value().attr(attr))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

/// A field rule: a pure function from the page to a value, if it applies
pub type Rule<T> = fn(&Page<'_>) -> Option<T>;

/// Evaluates `rules` in order and returns the first value produced
pub fn first_match<T>(page: &Page<'_>, rules: &[Rule<T>]) -> Option<T> {
    rules.iter().find_map(|rule| rule(page))
}

/// Selects every element matching `css` under the document root
pub fn select_all<'a>(doc: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => doc.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

pub fn select_first<'a>(doc: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    doc.select(&selector).next()
}

/// Selects every descendant of `element` matching `css`
pub fn select_within<'a>(element: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => element.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

/// Raw text content of an element, untrimmed
pub fn raw_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}

/// Trimmed text content of an element
pub fn element_text(element: ElementRef<'_>) -> String {
    raw_text(element).trim().to_string()
}

/// Text content of `element`, skipping anything inside descendants matching `excluded`
pub fn text_excluding(element: ElementRef<'_>, excluded: &str) -> String {
    let Ok(selector) = Selector::parse(excluded) else {
        return raw_text(element);
    };

    let mut out = String::new();
    for node in element.descendants() {
        if let Node::Text(text) = node.value() {
            let hidden = node
                .ancestors()
                .take_while(|ancestor| ancestor.id() != element.id())
                .filter_map(ElementRef::wrap)
                .any(|ancestor| selector.matches(&ancestor));
            if !hidden {
                out.push_str(text);
            }
        }
    }
    out
}

/// Next sibling that is an element
pub fn next_element(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.next_siblings().find_map(ElementRef::wrap)
}

pub fn parent_element(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.parent().and_then(ElementRef::wrap)
}

/// Drops every element that sits inside another element of the same list
pub fn outermost(elements: Vec<ElementRef<'_>>) -> Vec<ElementRef<'_>> {
    let ids: Vec<_> = elements.iter().map(|el| el.id()).collect();
    elements
        .into_iter()
        .filter(|el| !el.ancestors().any(|ancestor| ids.contains(&ancestor.id())))
        .collect()
}

/// Trimmed texts of the `li`/`p` items under `element` longer than 3 characters
pub fn list_items(element: ElementRef<'_>) -> Vec<String> {
    select_within(element, "li, p")
        .into_iter()
        .map(element_text)
        .filter(|t| t.chars().count() > 3)
        .collect()
}

/// Whitespace-collapsed text of an element
pub fn flat_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&raw_text(element))
}
