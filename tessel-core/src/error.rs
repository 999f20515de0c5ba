//! Error types.
//!
//! Every error describes a static authoring mistake in a template or in the
//! data wiring. They are raised synchronously while defining components,
//! instantiating them or dispatching props, never during reactive
//! propagation.

/// Errors surfaced to the host.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The template identifier is not a multi-segment name.
    #[error("template id '{0}' must be a multi-part identifier separated by '-', e.g. my-button, ui-list")]
    InvalidTemplateName(String),

    /// No `<template id="..">` exists for the identifier.
    #[error("the <template id=\"{0}\"> was not found")]
    TemplateNotFound(String),

    /// No instantiated element matches the identifier.
    #[error("custom element <{template} id=\"{id}\"> cannot be found")]
    InstanceNotFound { template: String, id: String },

    /// A `when`, `each`, `key` or `index` value lacks the `data--` prefix.
    #[error("invalid attribute value <{element} {attribute}=\"{value}\">, expected the value to begin with 'data--'")]
    InvalidDirective {
        element: String,
        attribute: String,
        value: String,
    },

    /// A `whence` gate resolved to something other than a boolean.
    #[error("cannot use <{element} whence> since '{property}' is not of type 'boolean'")]
    GateNotBoolean { element: String, property: String },

    /// The engine configuration could not be parsed.
    #[error("invalid engine configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_markup() {
        let err = Error::InvalidDirective {
            element: "data--todos".into(),
            attribute: "each".into(),
            value: "todo".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid attribute value <data--todos each=\"todo\">, expected the value to begin with 'data--'"
        );

        let err = Error::InstanceNotFound {
            template: "todo-list".into(),
            id: "main".into(),
        };
        assert_eq!(
            err.to_string(),
            "custom element <todo-list id=\"main\"> cannot be found"
        );
    }
}
