//! Read-only comparison of a bound virtual tree against the backend.
//!
//! Every mismatch is logged under `vdom.integrity` and the walk continues, so
//! one call reports all differences.

use crate::adapter::{InspectionAdapter, NodeType};
use crate::tree::{ElementData, NodeId, VKind, VTree};
use crate::types::Value;
use core_types::NodeRef;
use std::collections::BTreeSet;
use url::Url;

#[derive(Clone, Debug)]
pub struct IntegrityOptions {
    /// Base for `href`/`src` values the backend reports as absolute URLs.
    pub origin: Option<Url>,
    /// Props compared by their leading decimal number.
    pub numeric_attributes: Vec<String>,
    /// Props holding a URL.
    pub url_attributes: Vec<String>,
}

impl Default for IntegrityOptions {
    fn default() -> Self {
        Self {
            origin: None,
            numeric_attributes: vec!["height".to_string(), "width".to_string()],
            url_attributes: vec!["href".to_string(), "src".to_string()],
        }
    }
}

impl IntegrityOptions {
    pub fn with_origin(mut self, origin: Url) -> Self {
        self.origin = Some(origin);
        self
    }
}

/// Deep-compares the tree under `root` with the backend nodes it is bound to.
pub fn integrity_check<I: InspectionAdapter + ?Sized>(
    tree: &VTree,
    root: Option<NodeId>,
    inspection: &I,
    options: &IntegrityOptions,
) -> bool {
    let Some(root) = root else {
        return true;
    };
    let check = Check {
        tree,
        inspection,
        options,
    };
    let ok = check.node(root);
    if ok {
        log::debug!(target: "vdom.integrity", "tree under {root:?} matches the backend");
    }
    ok
}

struct Check<'a, I: ?Sized> {
    tree: &'a VTree,
    inspection: &'a I,
    options: &'a IntegrityOptions,
}

impl<I: InspectionAdapter + ?Sized> Check<'_, I> {
    fn node(&self, id: NodeId) -> bool {
        let Some(node) = self.tree.get(id) else {
            log::warn!(target: "vdom.integrity", "{id:?} is not a live node");
            return false;
        };
        if let VKind::Component(component) = &node.kind {
            return match component.child {
                Some(child) => self.node(child),
                None => {
                    log::warn!(target: "vdom.integrity", "component {id:?} is not mounted");
                    false
                }
            };
        }
        let Some(backend) = node.backend else {
            log::warn!(target: "vdom.integrity", "{id:?} has no backend node");
            return false;
        };
        match &node.kind {
            VKind::Text(text) => self.text(text, backend),
            VKind::Element(el) => self.element(el, backend),
            VKind::Component(_) => true,
        }
    }

    fn text(&self, text: &str, backend: NodeRef) -> bool {
        if self.inspection.node_type(backend) != Some(NodeType::Text) {
            log::warn!(target: "vdom.integrity", "{backend:?} is not a text node");
            return false;
        }
        let actual = self.inspection.get_text_content(backend);
        if actual.as_deref() != Some(text) {
            log::warn!(
                target: "vdom.integrity",
                "text differs: expected {text:?}, found {actual:?}"
            );
            return false;
        }
        true
    }

    fn element(&self, el: &ElementData, backend: NodeRef) -> bool {
        let mut ok = true;
        let tag = self.inspection.get_tag(backend);
        if !tag.as_deref().is_some_and(|t| t.eq_ignore_ascii_case(&el.tag)) {
            log::warn!(
                target: "vdom.integrity",
                "tags differ: expected <{}>, found {tag:?}",
                el.tag
            );
            ok = false;
        }

        let backend_children = self.inspection.children(backend);
        if backend_children.len() != el.children.len() {
            log::warn!(
                target: "vdom.integrity",
                "<{}> has {} children, backend has {}",
                el.tag,
                el.children.len(),
                backend_children.len()
            );
            ok = false;
        }

        for (name, value) in &el.props {
            ok &= self.prop(backend, name, value);
        }
        if !el.props.contains_key("class") && !el.props.contains_key("className") {
            ok &= self.classes(el, backend);
        }
        for (name, value) in &el.style {
            ok &= self.style(backend, name, value);
        }

        for &child in &el.children {
            ok &= self.node(child);
        }
        ok
    }

    fn prop(&self, backend: NodeRef, name: &str, value: &Value) -> bool {
        let attribute = match name {
            "className" => "class",
            other => other,
        };
        let actual = self.inspection.get_attribute(backend, attribute);
        let matches = match (value, actual.as_deref()) {
            (Value::Bool(flag), actual) => actual.is_some() == *flag,
            (_, None) => false,
            (value, Some(actual)) => {
                let expected = value.to_attribute();
                if self.options.url_attributes.iter().any(|n| n == name) {
                    url_equivalent(&expected, actual, self.options.origin.as_ref())
                } else if self.options.numeric_attributes.iter().any(|n| n == name) {
                    match (parse_float(&expected), parse_float(actual)) {
                        (Some(a), Some(b)) => a == b,
                        _ => false,
                    }
                } else {
                    expected == actual
                }
            }
        };
        if !matches {
            log::warn!(
                target: "vdom.integrity",
                "property {name} differs: expected {value:?}, found {actual:?}"
            );
        }
        matches
    }

    fn classes(&self, el: &ElementData, backend: NodeRef) -> bool {
        let actual = self.inspection.get_attribute(backend, "class");
        let actual: BTreeSet<&str> = actual
            .as_deref()
            .unwrap_or_default()
            .split_ascii_whitespace()
            .collect();
        let expected: BTreeSet<&str> = el.classes.iter().map(|c| &**c).collect();
        if actual != expected {
            log::warn!(
                target: "vdom.integrity",
                "class set differs: expected {expected:?}, found {actual:?}"
            );
            return false;
        }
        true
    }

    fn style(&self, backend: NodeRef, name: &str, value: &str) -> bool {
        let actual = self.inspection.get_inline_style(backend, name);
        let matches = match actual.as_deref() {
            None => false,
            Some(actual) if is_color_property(name) => {
                match (parse_color(value), parse_color(actual)) {
                    (Some(a), Some(b)) => a == b,
                    _ => value == actual,
                }
            }
            Some(actual) => value == actual,
        };
        if !matches {
            log::warn!(
                target: "vdom.integrity",
                "style {name} differs: expected {value:?}, found {actual:?}"
            );
        }
        matches
    }
}

fn is_color_property(name: &str) -> bool {
    name == "color" || name.ends_with("-color")
}

/// Leading decimal number of `input`, ignoring leading whitespace and any
/// trailing unit (`"10px"` is 10).
pub(crate) fn parse_float(input: &str) -> Option<f64> {
    let s = input.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let digits_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    if bytes.get(end) == Some(&b'.') {
        end += 1;
        while bytes.get(end).is_some_and(u8::is_ascii_digit) {
            end += 1;
        }
    }
    if end == digits_start || &s[digits_start..end] == "." {
        return None;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_digits = exp;
        while bytes.get(exp).is_some_and(u8::is_ascii_digit) {
            exp += 1;
        }
        if exp > exp_digits {
            end = exp;
        }
    }
    s[..end].parse().ok()
}

/// Whether the backend's `actual` URL is `declared` as written, with a trailing
/// slash, or resolved against `origin`.
pub(crate) fn url_equivalent(declared: &str, actual: &str, origin: Option<&Url>) -> bool {
    if actual == declared || actual.strip_suffix('/') == Some(declared) {
        return true;
    }
    let Some(absolute) = origin.and_then(|origin| origin.join(declared).ok()) else {
        return false;
    };
    let absolute = absolute.as_str();
    actual == absolute
        || actual.strip_suffix('/') == Some(absolute)
        || absolute.strip_suffix('/') == Some(actual)
}

/// Normalises `#rgb`, `#rrggbb`, `#rrrgggbbb` and `rgb(..)`/`rgba(..)` to
/// channel values.
pub(crate) fn parse_color(input: &str) -> Option<Vec<f64>> {
    let input = input.trim();
    if let Some(hex) = input.strip_prefix('#') {
        let width = match hex.len() {
            3 => 1,
            6 => 2,
            9 => 3,
            _ => return None,
        };
        let factor = [17.0, 1.0, 0.062272][width - 1];
        return (0..3)
            .map(|i| {
                let digits = hex.get(i * width..(i + 1) * width)?;
                let channel = u32::from_str_radix(digits, 16).ok()?;
                Some((f64::from(channel) * factor).round())
            })
            .collect();
    }
    let open = memchr::memchr(b'(', input.as_bytes())?;
    let close = memchr::memchr(b')', input.as_bytes())?;
    if close < open {
        return None;
    }
    input[open + 1..close]
        .split(',')
        .map(|part| part.trim().parse::<f64>().ok())
        .collect()
}
