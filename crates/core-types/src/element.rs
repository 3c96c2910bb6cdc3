use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::run::UnknownVariant;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Link,
    Button,
    Input,
    Select,
    Textarea,
}

impl ElementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Link => "link",
            ElementType::Button => "button",
            ElementType::Input => "input",
            ElementType::Select => "select",
            ElementType::Textarea => "textarea",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "link" | "a" => Ok(ElementType::Link),
            "button" => Ok(ElementType::Button),
            "input" => Ok(ElementType::Input),
            "select" => Ok(ElementType::Select),
            "textarea" => Ok(ElementType::Textarea),
            _ => Err(UnknownVariant {
                kind: "element type",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Tag and class list of one DOM ancestor, nearest first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AncestorDescriptor {
    pub tag: String,
    #[serde(default)]
    pub classes: Vec<String>,
}

/// Candidate for interaction discovered during one extraction cycle.
///
/// `x`/`y` are the viewport coordinates of the interaction point as measured
/// at discovery time; the action is performed there without re-querying the
/// document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractiveElement {
    pub index: i64,
    #[serde(rename = "type")]
    pub element_type: ElementType,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub rect: ElementRect,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ancestors: Vec<AncestorDescriptor>,
}

impl InteractiveElement {
    pub fn new(index: i64, element_type: ElementType, text: impl Into<String>) -> Self {
        Self {
            index,
            element_type,
            text: text.into(),
            href: None,
            x: 0.0,
            y: 0.0,
            rect: ElementRect::default(),
            tag: None,
            classes: Vec::new(),
            ancestors: Vec::new(),
        }
    }

    pub fn link(index: i64, text: impl Into<String>, href: impl Into<String>) -> Self {
        let mut element = Self::new(index, ElementType::Link, text);
        element.href = Some(href.into());
        element
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn is_link(&self) -> bool {
        self.element_type == ElementType::Link
    }
}

/// Response of the extraction capability for the active document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionReport {
    pub success: bool,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub elements: Vec<InteractiveElement>,
    #[serde(default)]
    pub console_errors: Vec<String>,
    #[serde(default)]
    pub network_errors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_deserializes_from_extractor_payload() {
        let payload = serde_json::json!({
            "index": 2,
            "type": "link",
            "text": "About",
            "href": "/about",
            "x": 40.5,
            "y": 12.0,
            "rect": {"x": 10.0, "y": 4.0, "width": 61.0, "height": 16.0},
            "classes": ["nav-link"],
            "ancestors": [{"tag": "nav", "classes": ["top"]}]
        });
        let element: InteractiveElement = serde_json::from_value(payload).unwrap();
        assert_eq!(element.element_type, ElementType::Link);
        assert_eq!(element.href.as_deref(), Some("/about"));
        assert_eq!(element.rect.width, 61.0);
        assert_eq!(element.ancestors[0].tag, "nav");
        assert!(element.tag.is_none());
    }

    #[test]
    fn report_defaults_missing_error_lists() {
        let report: ExtractionReport = serde_json::from_str(
            r#"{"success": true, "url": "https://a.test/", "title": "A", "elements": []}"#,
        )
        .unwrap();
        assert!(report.success);
        assert!(report.console_errors.is_empty());
        assert!(report.network_errors.is_empty());
    }

    #[test]
    fn element_type_parses_tag_alias() {
        assert_eq!("A".parse::<ElementType>(), Ok(ElementType::Link));
        assert!("div".parse::<ElementType>().is_err());
    }
}
