//! Namespace-agnostic lookups over a parsed XML tree.
//!
//! Roster exports mix prefixed and unprefixed element names, so every
//! lookup here matches on the local name only.

use roxmltree::Node;

/// Local name of an element, without any namespace prefix.
pub(crate) fn local_name<'a>(node: Node<'a, '_>) -> &'a str {
    node.tag_name().name()
}

/// Returns true when `node` is an element whose local name is one of `names`.
pub(crate) fn is_named(node: Node<'_, '_>, names: &[&str]) -> bool {
    node.is_element() && names.contains(&local_name(node))
}

/// First direct child element named `name`.
pub(crate) fn child<'a, 'i>(node: Node<'a, 'i>, name: &str) -> Option<Node<'a, 'i>> {
    node.children().find(|c| is_named(*c, &[name]))
}

/// Trimmed text of the first direct child named `name`; `None` when the
/// child is absent or blank.
pub(crate) fn child_text<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    child(node, name)
        .and_then(|c| c.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
}

/// Text of the first of `names` present as a direct child.
pub(crate) fn first_child_text<'a>(node: Node<'a, '_>, names: &[&str]) -> Option<&'a str> {
    names.iter().find_map(|name| child_text(node, name))
}

/// Trimmed, non-blank attribute value.
pub(crate) fn attribute<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.attribute(name)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Descendant elements (excluding `node` itself) whose local name is one of
/// `names`, in document order.
pub(crate) fn descendants_named<'a, 'i: 'a>(
    node: Node<'a, 'i>,
    names: &'a [&'a str],
) -> impl Iterator<Item = Node<'a, 'i>> + 'a {
    node.descendants().skip(1).filter(move |d| is_named(*d, names))
}

#[cfg(test)]
mod tests {
    use super::*;
    use roxmltree::Document;

    const XML: &str = r#"<rfs:Root xmlns:rfs="urn:test">
        <rfs:Item Id=" 7 "><rfs:Name> first </rfs:Name><rfs:Empty>  </rfs:Empty></rfs:Item>
        <Item><Name>second</Name></Item>
    </rfs:Root>"#;

    #[test]
    fn test_lookups_ignore_prefixes() {
        let doc = Document::parse(XML).unwrap();
        let root = doc.root_element();
        assert_eq!(local_name(root), "Root");

        let items: Vec<_> = descendants_named(root, &["Item"]).collect();
        assert_eq!(items.len(), 2);
        assert_eq!(child_text(items[0], "Name"), Some("first"));
        assert_eq!(child_text(items[1], "Name"), Some("second"));
        assert_eq!(attribute(items[0], "Id"), Some("7"));
    }

    #[test]
    fn test_blank_text_is_missing() {
        let doc = Document::parse(XML).unwrap();
        let first = descendants_named(doc.root_element(), &["Item"]).next().unwrap();
        assert_eq!(child_text(first, "Empty"), None);
        assert_eq!(first_child_text(first, &["Empty", "Name"]), Some("first"));
    }

    #[test]
    fn test_descendants_exclude_self() {
        let doc = Document::parse(XML).unwrap();
        assert_eq!(descendants_named(doc.root_element(), &["Root"]).count(), 0);
    }
}
