//! Display-time gating of console affordances.
//!
//! The gate hides or disables UI the session cannot use. It is not a
//! security boundary: the server re-checks every request.

use crate::matcher::{AccessQuery, Resources};
use crate::PolicySnapshot;
use serde::Serialize;

/// Properties forced onto children the session may not use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ErrorProps {
    pub disabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
}

impl ErrorProps {
    pub fn disabled() -> Self {
        Self {
            disabled: true,
            tooltip: None,
        }
    }

    pub fn with_tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = Some(tooltip.into());
        self
    }
}

/// What the presentation layer should do with gated children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Render the children unchanged.
    Render,
    /// Render the children with these properties applied.
    Disable(ErrorProps),
    /// Render the error fragment instead, or nothing.
    Hide,
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Verdict::Render)
    }
}

/// A piece of UI that can be augmented with [`ErrorProps`].
pub trait Fragment {
    fn with_props(self, props: &ErrorProps) -> Self;
}

/// Gate over a set of children, built once per affordance.
#[derive(Debug, Clone)]
pub struct SecureGate {
    query: AccessQuery,
    error_props: Option<ErrorProps>,
}

impl SecureGate {
    pub fn new<S: AsRef<str>>(resources: impl Into<Resources>, scopes: &[S]) -> Self {
        Self {
            query: AccessQuery::new(resources, scopes),
            error_props: None,
        }
    }

    pub fn match_all(mut self) -> Self {
        self.query = self.query.match_all();
        self
    }

    pub fn contains_resource(mut self) -> Self {
        self.query = self.query.contains_resource();
        self
    }

    /// Disable instead of hiding when denied.
    pub fn error_props(mut self, props: ErrorProps) -> Self {
        self.error_props = Some(props);
        self
    }

    pub fn query(&self) -> &AccessQuery {
        &self.query
    }

    /// Decide how the gated children display.
    ///
    /// A denied gate without error props hides its children, even when no
    /// error fragment will be rendered in their place. Children are never
    /// rendered unchanged on a denial.
    pub fn decide(&self, snapshot: &PolicySnapshot) -> Verdict {
        if snapshot.evaluate(&self.query) {
            return Verdict::Render;
        }
        match &self.error_props {
            Some(props) => Verdict::Disable(props.clone()),
            None => Verdict::Hide,
        }
    }

    /// Apply the verdict to `children`. `render_error` is only called when
    /// the children are hidden.
    pub fn render<F, E>(&self, snapshot: &PolicySnapshot, children: Vec<F>, render_error: E) -> Vec<F>
    where
        F: Fragment,
        E: FnOnce() -> Option<F>,
    {
        match self.decide(snapshot) {
            Verdict::Render => children,
            Verdict::Disable(props) => children.into_iter().map(|c| c.with_props(&props)).collect(),
            Verdict::Hide => render_error().into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scopes::*;
    use crate::{PolicyStatement, Session};

    #[derive(Debug, Clone, PartialEq)]
    struct Button {
        label: &'static str,
        disabled: bool,
    }

    impl Fragment for Button {
        fn with_props(mut self, props: &ErrorProps) -> Self {
            self.disabled = props.disabled;
            self
        }
    }

    fn button(label: &'static str) -> Button {
        Button { label, disabled: false }
    }

    fn browse_snapshot() -> PolicySnapshot {
        PolicySnapshot::of(Session::new("alice").with_statement(
            "list",
            PolicyStatement::allow([S3_LIST_BUCKET], ["arn:aws:s3:::bucket1"]).unwrap(),
        ))
    }

    #[test]
    fn test_allowed_renders_children_unchanged() {
        let gate = SecureGate::new("bucket1", BROWSE_SCOPES);
        let out = gate.render(&browse_snapshot(), vec![button("browse")], || Some(button("error")));
        assert_eq!(out, vec![button("browse")]);
    }

    #[test]
    fn test_denied_with_props_disables_every_child() {
        let gate = SecureGate::new("bucket2", BROWSE_SCOPES).error_props(ErrorProps::disabled());
        let out = gate.render(&browse_snapshot(), vec![button("a"), button("b")], || None);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|b| b.disabled));
    }

    #[test]
    fn test_denied_with_error_fragment_renders_it() {
        let gate = SecureGate::new("bucket2", BROWSE_SCOPES);
        let out = gate.render(&browse_snapshot(), vec![button("browse")], || Some(button("error")));
        assert_eq!(out, vec![button("error")]);
    }

    #[test]
    fn test_denied_without_fallback_renders_nothing() {
        let gate = SecureGate::new("bucket2", BROWSE_SCOPES);
        assert_eq!(gate.decide(&browse_snapshot()), Verdict::Hide);
        let out = gate.render(&browse_snapshot(), vec![button("browse")], || None);
        assert!(out.is_empty());
    }

    #[test]
    fn test_props_win_over_error_fragment() {
        let gate = SecureGate::new("bucket2", BROWSE_SCOPES).error_props(ErrorProps::disabled());
        let out = gate.render(&browse_snapshot(), vec![button("browse")], || Some(button("error")));
        assert_eq!(out, vec![Button { label: "browse", disabled: true }]);
    }

    #[test]
    fn test_decide_carries_tooltip() {
        let tip = permission_tooltip(UPLOAD_SCOPES, "upload files to this bucket");
        let gate = SecureGate::new("bucket1/", UPLOAD_SCOPES)
            .error_props(ErrorProps::disabled().with_tooltip(tip.clone()));
        match gate.decide(&browse_snapshot()) {
            Verdict::Disable(props) => assert_eq!(props.tooltip, Some(tip)),
            other => panic!("expected disable, got {other:?}"),
        }
    }

    #[test]
    fn test_signed_out_hides() {
        let gate = SecureGate::new("bucket1", BROWSE_SCOPES);
        assert_eq!(gate.decide(&PolicySnapshot::empty()), Verdict::Hide);
    }
}
