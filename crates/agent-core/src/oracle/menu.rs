//! Textual menu of candidates sent to the oracle.

use webprobe_core_types::InteractiveElement;

/// One element offered to the oracle, annotated with its visited state.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub element: InteractiveElement,
    pub visited: bool,
}

impl Candidate {
    pub fn new(element: InteractiveElement, visited: bool) -> Self {
        Self { element, visited }
    }
}

/// Render one candidate as `<index>. [<type>] "<text>"`, followed by
/// ` -> <href>` for links and ` [VISITED]` for visited keys.
pub fn format_candidate(candidate: &Candidate) -> String {
    let element = &candidate.element;
    let mut line = format!(
        "{}. [{}] \"{}\"",
        element.index, element.element_type, element.text
    );
    if element.is_link() {
        if let Some(href) = element.href.as_deref() {
            line.push_str(" -> ");
            line.push_str(href);
        }
    }
    if candidate.visited {
        line.push_str(" [VISITED]");
    }
    line
}

/// Full menu, one candidate per line in extraction order.
pub fn format_menu(candidates: &[Candidate]) -> String {
    candidates
        .iter()
        .map(format_candidate)
        .collect::<Vec<_>>()
        .join("\n")
}
