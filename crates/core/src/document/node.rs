#![allow(missing_docs)]

/// One element of a roster document.
///
/// Every element carries a pre-order `id` unique within its document, so the
/// walker can track which profiles it has already consumed without holding
/// references into the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    id: usize,
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
    text: String,
}

/// An element found by [`Element::find_grouped`], together with the element
/// owning its container (e.g. the selection owning a `profiles` block).
#[derive(Debug, Clone, Copy)]
pub struct Located<'a> {
    pub owner: &'a Element,
    pub element: &'a Element,
}

impl Element {
    pub(crate) fn new(id: usize, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            text: String::new(),
        }
    }

    pub(crate) fn push_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.push((key.into(), value.into()));
    }

    pub(crate) fn push_child(&mut self, child: Element) {
        self.children.push(child);
    }

    pub(crate) fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attribute value, treating an empty value as absent.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
            .filter(|value| !value.is_empty())
    }

    /// Whether the `type` attribute equals `kind`.
    pub fn is_type(&self, kind: &str) -> bool {
        self.attr("type") == Some(kind)
    }

    /// Concatenated text content directly inside this element.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter()
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |child| child.name == name)
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Immediate `container > item` children, e.g. a selection's own
    /// `selections > selection` entries.
    pub fn grouped<'a>(
        &'a self,
        container: &'a str,
        item: &'a str,
    ) -> impl Iterator<Item = &'a Element> {
        self.children_named(container)
            .flat_map(move |group| group.children_named(item))
    }

    /// Every `container > item` element below this one, in document order.
    pub fn find_grouped<'a>(&'a self, container: &str, item: &str) -> Vec<Located<'a>> {
        let mut found = Vec::new();
        collect_grouped(self, None, container, item, &mut found);
        found
    }

    /// Whether any `container > item` element below this one satisfies `predicate`.
    pub fn any_grouped(
        &self,
        container: &str,
        item: &str,
        predicate: impl Fn(&Element) -> bool,
    ) -> bool {
        self.find_grouped(container, item)
            .iter()
            .any(|located| predicate(located.element))
    }

    /// First descendant element with the given tag name, in document order.
    pub fn find_first(&self, name: &str) -> Option<&Element> {
        for child in &self.children {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.find_first(name) {
                return Some(found);
            }
        }
        None
    }
}

fn collect_grouped<'a>(
    element: &'a Element,
    parent: Option<&'a Element>,
    container: &str,
    item: &str,
    found: &mut Vec<Located<'a>>,
) {
    for child in &element.children {
        if element.name == container && child.name == item {
            if let Some(owner) = parent {
                found.push(Located {
                    owner,
                    element: child,
                });
            }
        }
        collect_grouped(child, Some(element), container, item, found);
    }
}
