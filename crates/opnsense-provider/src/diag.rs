// ── Diagnostics ──
//
// Nothing in this crate returns an error across the host boundary.
// Handlers collect `Diagnostic`s instead, and the server ships them back
// with whatever state was produced.

use serde::{Deserialize, Serialize};

use opnsense_config::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
    /// Attribute path (`filter.priority.match`) the diagnostic points at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

/// Ordered collection of diagnostics produced by one operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.push(Severity::Error, summary.into(), detail.into(), None);
    }

    pub fn add_attribute_error(
        &mut self,
        attribute: impl Into<String>,
        summary: impl Into<String>,
        detail: impl Into<String>,
    ) {
        self.push(
            Severity::Error,
            summary.into(),
            detail.into(),
            Some(attribute.into()),
        );
    }

    pub fn add_warning(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.push(Severity::Warning, summary.into(), detail.into(), None);
    }

    /// Report a failed client call: `Unable to <action> <kind>, got error: ...`.
    pub fn add_client_error(&mut self, action: &str, kind: &str, err: &opnsense_api::Error) {
        self.add_error(
            "Client Error",
            format!("Unable to {action} {kind}, got error: {err}"),
        );
    }

    /// Report a provider configuration failure, scoped to the offending
    /// attribute when there is one.
    pub fn add_config_error(&mut self, err: &ConfigError) {
        let summary = match err {
            ConfigError::Missing { .. } => "Missing Provider Attribute",
            ConfigError::Validation { .. } => "Invalid Attribute Configuration",
            ConfigError::Figment(_) => "Invalid Provider Configuration",
        };
        match err.attribute() {
            Some(attribute) => self.add_attribute_error(attribute, summary, err.to_string()),
            None => self.add_error(summary, err.to_string()),
        }
    }

    pub fn has_error(&self) -> bool {
        self.0.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    fn push(
        &mut self,
        severity: Severity,
        summary: String,
        detail: String,
        attribute: Option<String>,
    ) {
        self.0.push(Diagnostic {
            severity,
            summary,
            detail,
            attribute,
        });
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl From<&ConfigError> for Diagnostics {
    fn from(err: &ConfigError) -> Self {
        let mut diags = Self::new();
        diags.add_config_error(err);
        diags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warnings_do_not_count_as_errors() {
        let mut diags = Diagnostics::new();
        diags.add_warning("Deprecated", "use something else");
        assert!(!diags.has_error());

        diags.add_attribute_error("tag", "Invalid Attribute Configuration", "out of range");
        assert!(diags.has_error());
        assert_eq!(diags.len(), 2);
        assert_eq!(
            diags.iter().last().and_then(|d| d.attribute.as_deref()),
            Some("tag")
        );
    }

    #[test]
    fn client_error_detail_names_action_and_kind() {
        let err = opnsense_api::Error::NotDeleted {
            kind: "route",
            result: "failed".into(),
        };
        let mut diags = Diagnostics::new();
        diags.add_client_error("delete", "route", &err);

        let diag = diags.iter().next().cloned();
        assert_eq!(
            diag.map(|d| (d.summary, d.detail)),
            Some((
                "Client Error".to_owned(),
                "Unable to delete route, got error: route not deleted. result: failed".to_owned()
            ))
        );
    }

    #[test]
    fn missing_config_is_attribute_scoped() {
        let err = ConfigError::Missing {
            field: "api_key",
            env: "OPNSENSE_API_KEY".into(),
        };
        let diags = Diagnostics::from(&err);
        let diag = diags.iter().next();
        assert_eq!(diag.and_then(|d| d.attribute.as_deref()), Some("api_key"));
        assert_eq!(diag.map(|d| d.summary.as_str()), Some("Missing Provider Attribute"));
    }

    #[test]
    fn serializes_severity_lowercase() {
        let mut diags = Diagnostics::new();
        diags.add_error("Boom", "detail");
        let json = serde_json::to_value(&diags).unwrap_or_default();
        assert_eq!(json[0]["severity"], "error");
        assert!(json[0].get("attribute").is_none());
    }
}
