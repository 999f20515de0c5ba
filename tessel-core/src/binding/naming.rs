//! Property names.
//!
//! A declared property has two spellings. In markup it is a kebab-case
//! marker with a double-dash prefix, `data--todo-items`, used both as an
//! attribute name and as the tag of content consumers. In a data context it
//! is the camelCase logical name, `todoItems`.

use std::fmt;

/// Prefix shared by every directive marker and directive reference.
pub const MARKER_PREFIX: &str = "data--";

/// A declared property, in both spellings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyName {
    name: String,
    kebab: String,
}

impl PropertyName {
    /// Build from a logical camelCase name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kebab: camel_to_kebab(name),
        }
    }

    /// Parse a `data--<kebab>` marker. Returns `None` for anything else.
    pub fn from_marker(marker: &str) -> Option<Self> {
        let kebab = marker.trim().strip_prefix(MARKER_PREFIX)?;
        if kebab.is_empty() {
            return None;
        }
        let kebab = kebab.to_ascii_lowercase();
        Some(Self {
            name: kebab_to_camel(&kebab),
            kebab,
        })
    }

    /// The logical name used in data contexts.
    pub fn as_str(&self) -> &str {
        &self.name
    }

    pub fn kebab(&self) -> &str {
        &self.kebab
    }

    /// The markup form, `data--<kebab>`.
    pub fn marker(&self) -> String {
        format!("{MARKER_PREFIX}{}", self.kebab)
    }
}

impl fmt::Display for PropertyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// `todo-items` to `todoItems`.
pub fn kebab_to_camel(kebab: &str) -> String {
    let mut out = String::with_capacity(kebab.len());
    let mut upper = false;
    for ch in kebab.chars() {
        if ch == '-' {
            upper = !out.is_empty();
        } else if upper {
            out.push(ch.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// `todoItems` to `todo-items`.
pub fn camel_to_kebab(camel: &str) -> String {
    let mut out = String::with_capacity(camel.len() + 4);
    for ch in camel.chars() {
        if ch.is_ascii_uppercase() {
            if !out.is_empty() {
                out.push('-');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_round_trip() {
        let name = PropertyName::from_marker("data--todo-items").unwrap();
        assert_eq!(name.as_str(), "todoItems");
        assert_eq!(name.kebab(), "todo-items");
        assert_eq!(name.marker(), "data--todo-items");
        assert_eq!(PropertyName::new("todoItems"), name);
    }

    #[test]
    fn rejects_non_markers() {
        assert!(PropertyName::from_marker("data-todo").is_none());
        assert!(PropertyName::from_marker("todo").is_none());
        assert!(PropertyName::from_marker("data--").is_none());
    }

    #[test]
    fn case_conversion() {
        assert_eq!(kebab_to_camel("label"), "label");
        assert_eq!(kebab_to_camel("is-done-now"), "isDoneNow");
        assert_eq!(camel_to_kebab("isDoneNow"), "is-done-now");
        assert_eq!(camel_to_kebab("Label"), "label");
    }
}
