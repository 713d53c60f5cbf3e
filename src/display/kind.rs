//! Endpoint kinds and the default-property table.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::display::DisplayEndpoint;
use crate::error::{MapperError, MapperResult};

/// Capability tag of a display endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EndpointKind {
    /// Check box, toggle button ("checked").
    ToggleControl,
    /// Combo box ("selected-index").
    SingleChoiceList,
    /// Line edit ("text").
    SingleLineText,
    /// Spin box, slider ("value").
    NumericEntry,
    /// Plain text edit ("plain-text").
    MultiLineText,
    /// Any other element; needs a registration or an explicit property name.
    Other(String),
}

impl EndpointKind {
    /// Tag string, e.g. `"numeric-entry"`.
    pub fn tag(&self) -> &str {
        match self {
            EndpointKind::ToggleControl => "toggle-control",
            EndpointKind::SingleChoiceList => "single-choice-list",
            EndpointKind::SingleLineText => "single-line-text",
            EndpointKind::NumericEntry => "numeric-entry",
            EndpointKind::MultiLineText => "multi-line-text",
            EndpointKind::Other(tag) => tag,
        }
    }
}

impl fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl From<&str> for EndpointKind {
    fn from(tag: &str) -> Self {
        match tag {
            "toggle-control" => EndpointKind::ToggleControl,
            "single-choice-list" => EndpointKind::SingleChoiceList,
            "single-line-text" => EndpointKind::SingleLineText,
            "numeric-entry" => EndpointKind::NumericEntry,
            "multi-line-text" => EndpointKind::MultiLineText,
            other => EndpointKind::Other(other.to_string()),
        }
    }
}

impl FromStr for EndpointKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(EndpointKind::from(s))
    }
}

/// Maps endpoint kinds to the property bound when none is named.
#[derive(Debug, Clone)]
pub struct EndpointKindTable {
    defaults: HashMap<EndpointKind, String>,
}

impl Default for EndpointKindTable {
    fn default() -> Self {
        let defaults = [
            (EndpointKind::ToggleControl, "checked"),
            (EndpointKind::SingleChoiceList, "selected-index"),
            (EndpointKind::SingleLineText, "text"),
            (EndpointKind::NumericEntry, "value"),
            (EndpointKind::MultiLineText, "plain-text"),
        ]
        .into_iter()
        .map(|(kind, property)| (kind, property.to_string()))
        .collect();

        Self { defaults }
    }
}

impl EndpointKindTable {
    /// Table with no entries at all.
    pub fn empty() -> Self {
        Self {
            defaults: HashMap::new(),
        }
    }

    /// Register (or replace) the default property of a kind.
    pub fn register(&mut self, kind: EndpointKind, property: impl Into<String>) {
        self.defaults.insert(kind, property.into());
    }

    /// Default property of a kind, if registered.
    pub fn default_property(&self, kind: &EndpointKind) -> Option<&str> {
        self.defaults.get(kind).map(String::as_str)
    }

    /// Number of registered kinds.
    pub fn len(&self) -> usize {
        self.defaults.len()
    }

    /// Whether no kinds are registered.
    pub fn is_empty(&self) -> bool {
        self.defaults.is_empty()
    }

    /// Property name to bind on `endpoint`.
    ///
    /// A non-empty explicit name always wins; otherwise the kind's default is
    /// used, and an unregistered kind is a [`MapperError::Resolution`].
    pub fn resolve(&self, endpoint: &dyn DisplayEndpoint, explicit: Option<&str>) -> MapperResult<String> {
        if let Some(name) = explicit.filter(|n| !n.is_empty()) {
            return Ok(name.to_string());
        }

        let kind = endpoint.kind();
        self.default_property(&kind)
            .map(str::to_string)
            .ok_or_else(|| MapperError::Resolution {
                endpoint: endpoint.endpoint_id(),
                kind: kind.tag().to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::HeadlessWidget;

    #[test]
    fn test_default_table() {
        let table = EndpointKindTable::default();
        assert_eq!(table.len(), 5);
        assert_eq!(table.default_property(&EndpointKind::ToggleControl), Some("checked"));
        assert_eq!(table.default_property(&EndpointKind::SingleChoiceList), Some("selected-index"));
        assert_eq!(table.default_property(&EndpointKind::SingleLineText), Some("text"));
        assert_eq!(table.default_property(&EndpointKind::NumericEntry), Some("value"));
        assert_eq!(table.default_property(&EndpointKind::MultiLineText), Some("plain-text"));
        assert_eq!(table.default_property(&EndpointKind::Other("dial".into())), None);
    }

    #[test]
    fn test_tag_round_trip() {
        for kind in [
            EndpointKind::ToggleControl,
            EndpointKind::SingleChoiceList,
            EndpointKind::SingleLineText,
            EndpointKind::NumericEntry,
            EndpointKind::MultiLineText,
            EndpointKind::Other("dial".into()),
        ] {
            assert_eq!(kind.tag().parse::<EndpointKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_resolve_explicit_wins() {
        let table = EndpointKindTable::default();
        let widget = HeadlessWidget::numeric_entry(0.0);
        assert_eq!(table.resolve(&widget, Some("minimum")).unwrap(), "minimum");
        // Empty name means "infer"
        assert_eq!(table.resolve(&widget, Some("")).unwrap(), "value");
        assert_eq!(table.resolve(&widget, None).unwrap(), "value");
    }

    #[test]
    fn test_resolve_unknown_kind() {
        let mut table = EndpointKindTable::default();
        let widget = HeadlessWidget::new(EndpointKind::Other("dial".into()));

        let err = table.resolve(&widget, None).unwrap_err();
        assert!(matches!(err, MapperError::Resolution { ref kind, .. } if kind == "dial"));

        table.register(EndpointKind::Other("dial".into()), "value");
        assert_eq!(table.resolve(&widget, None).unwrap(), "value");
    }
}
