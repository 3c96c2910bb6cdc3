//! Content-derived identity for interactive elements.
//!
//! The identity key is what the explorer uses to decide whether an element
//! was already acted upon. It only depends on the element type, its visible
//! text and (for links) the normalised target, so the same affordance keeps
//! its key across reloads, reorderings and layout shifts.
//!
//! The style fingerprint is a secondary, structural signature. It never takes
//! part in the visited decision and only helps group elements whose content
//! key is ambiguous (icon-only buttons and the like) in diagnostics.

use std::collections::BTreeMap;

use url::Url;
use webprobe_core_types::{AncestorDescriptor, InteractiveElement};

/// Maximum number of ancestors folded into a style fingerprint.
pub const MAX_FINGERPRINT_ANCESTORS: usize = 3;

/// Reduce a link target to a comparable form.
///
/// Hierarchical absolute URLs collapse to their path; anything else (relative
/// paths, fragments, `mailto:` style targets) is kept as written. A single
/// trailing slash is stripped in both cases.
pub fn normalize_link_target(href: &str) -> String {
    let trimmed = href.trim();
    let target = match Url::parse(trimmed) {
        Ok(parsed) if !parsed.cannot_be_a_base() => parsed.path().to_string(),
        _ => trimmed.to_string(),
    };
    strip_trailing_slash(&target).to_string()
}

/// Normalise a page URL to origin + path + query.
///
/// The fragment and a trailing slash on the path are dropped. Inputs that do
/// not parse as URLs are returned trimmed, without a trailing slash.
pub fn normalize_page_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let Ok(parsed) = Url::parse(trimmed) else {
        return strip_trailing_slash(trimmed).to_string();
    };
    if parsed.cannot_be_a_base() {
        let mut without_fragment = parsed;
        without_fragment.set_fragment(None);
        return without_fragment.to_string();
    }

    let mut normalized = parsed.origin().ascii_serialization();
    normalized.push_str(strip_trailing_slash(parsed.path()));
    if let Some(query) = parsed.query() {
        normalized.push('?');
        normalized.push_str(query);
    }
    normalized
}

/// Stable key identifying the real-world affordance behind an element.
pub fn identity_key(element: &InteractiveElement) -> String {
    let kind = element.element_type.as_str();
    if element.is_link() {
        let href = element.href.as_deref().unwrap_or_default();
        format!("{kind}:{}|{}", element.text, normalize_link_target(href))
    } else {
        format!("{kind}:{}", element.text)
    }
}

/// Structural signature: `tag|ancestor>ancestor>ancestor|own.sorted.classes`.
pub fn style_fingerprint(element: &InteractiveElement, ancestry: &[AncestorDescriptor]) -> String {
    let tag = element
        .tag
        .as_deref()
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| element.element_type.as_str().to_string());

    let ancestors = ancestry
        .iter()
        .take(MAX_FINGERPRINT_ANCESTORS)
        .map(describe_ancestor)
        .collect::<Vec<_>>()
        .join(">");

    let mut classes: Vec<&str> = element
        .classes
        .iter()
        .map(|class| class.trim())
        .filter(|class| !class.is_empty())
        .collect();
    classes.sort_unstable();
    classes.dedup();

    format!("{tag}|{ancestors}|{}", classes.join("."))
}

/// Group elements whose visible text is empty by their style fingerprint.
///
/// Returns fingerprint -> element indices, in extraction order within each
/// group. Elements with text are left out since their content key already
/// tells them apart.
pub fn group_by_fingerprint(elements: &[InteractiveElement]) -> BTreeMap<String, Vec<i64>> {
    let mut groups: BTreeMap<String, Vec<i64>> = BTreeMap::new();
    for element in elements.iter().filter(|el| el.text.trim().is_empty()) {
        let fingerprint = style_fingerprint(element, &element.ancestors);
        groups.entry(fingerprint).or_default().push(element.index);
    }
    groups
}

fn describe_ancestor(ancestor: &AncestorDescriptor) -> String {
    let mut out = ancestor.tag.to_ascii_lowercase();
    for class in ancestor.classes.iter().filter(|c| !c.trim().is_empty()) {
        out.push('.');
        out.push_str(class.trim());
    }
    out
}

fn strip_trailing_slash(value: &str) -> &str {
    value.strip_suffix('/').unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use webprobe_core_types::ElementType;

    #[test]
    fn absolute_link_targets_ignore_trailing_slash() {
        assert_eq!(
            normalize_link_target("https://x.com/a/"),
            normalize_link_target("https://x.com/a")
        );
        assert_eq!(normalize_link_target("https://x.com/a?q=1"), "/a");
    }

    #[test]
    fn relative_link_targets_only_lose_trailing_slash() {
        assert_eq!(normalize_link_target("/a/"), normalize_link_target("/a"));
        assert_eq!(normalize_link_target("docs/"), "docs");
        assert_eq!(normalize_link_target("#top"), "#top");
    }

    #[test]
    fn opaque_targets_are_kept_verbatim() {
        assert_eq!(
            normalize_link_target("mailto:team@example.com"),
            "mailto:team@example.com"
        );
    }

    #[test]
    fn page_url_drops_fragment_and_trailing_slash() {
        assert_eq!(
            normalize_page_url("https://Example.com/shop/?page=2#reviews"),
            "https://example.com/shop?page=2"
        );
        assert_eq!(normalize_page_url("https://example.com/"), "https://example.com");
        assert_eq!(
            normalize_page_url("http://example.com:8080/a/#x"),
            "http://example.com:8080/a"
        );
    }

    #[test]
    fn identity_key_ignores_position_and_index() {
        let a = InteractiveElement::link(0, "About", "/about").at(10.0, 10.0);
        let mut b = InteractiveElement::link(7, "About", "https://site.test/about/").at(300.0, 42.0);
        b.ancestors.push(AncestorDescriptor {
            tag: "footer".into(),
            classes: vec![],
        });
        assert_eq!(identity_key(&a), identity_key(&b));
        assert_eq!(identity_key(&a), "link:About|/about");
    }

    #[test]
    fn identity_key_for_non_links_uses_type_and_text() {
        let button = InteractiveElement::new(3, ElementType::Button, "Save");
        assert_eq!(identity_key(&button), "button:Save");
        let input = InteractiveElement::new(4, ElementType::Input, "Save");
        assert_ne!(identity_key(&button), identity_key(&input));
    }

    #[test]
    fn duplicate_links_collapse_to_one_key() {
        let elements = vec![
            InteractiveElement::link(0, "Home", "/"),
            InteractiveElement::link(1, "About", "/about"),
            InteractiveElement::link(2, "Home", "/"),
        ];
        let keys: HashSet<String> = elements.iter().map(identity_key).collect();
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn fingerprint_sorts_own_classes_and_caps_ancestry() {
        let mut element = InteractiveElement::new(0, ElementType::Button, "");
        element.tag = Some("BUTTON".into());
        element.classes = vec!["primary".into(), "btn".into(), "btn".into()];
        let ancestry = vec![
            AncestorDescriptor { tag: "div".into(), classes: vec!["toolbar".into()] },
            AncestorDescriptor { tag: "header".into(), classes: vec![] },
            AncestorDescriptor { tag: "body".into(), classes: vec!["dark".into()] },
            AncestorDescriptor { tag: "html".into(), classes: vec![] },
        ];
        assert_eq!(
            style_fingerprint(&element, &ancestry),
            "button|div.toolbar>header>body.dark|btn.primary"
        );
    }

    #[test]
    fn ambiguous_elements_are_grouped_by_fingerprint() {
        let mut icon_a = InteractiveElement::new(0, ElementType::Button, "");
        icon_a.classes = vec!["icon".into()];
        let mut icon_b = InteractiveElement::new(2, ElementType::Button, " ");
        icon_b.classes = vec!["icon".into()];
        let labelled = InteractiveElement::new(1, ElementType::Button, "Close");

        let groups = group_by_fingerprint(&[icon_a, labelled, icon_b]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups.get("button||icon"), Some(&vec![0, 2]));
    }
}
