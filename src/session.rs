//! Compilation session
//!
//! All mutable state of one compilation run: file identities, component names
//! and the diagnostics collected so far. A session is built fresh for each run
//! and threaded through every sub-compiler.

use crate::blueprint::View;
use crate::codegen::names::{ComponentNames, IdentityResolver};
use crate::graph::{DiagnosticCode, DiagnosticItem, Diagnostics};

#[derive(Debug, Default)]
pub struct CompileSession {
    identities: IdentityResolver,
    components: ComponentNames,
    pub diagnostics: Diagnostics,
}

impl CompileSession {
    /// `reserved` component names are never assigned to views
    pub fn new<I, S>(reserved: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            identities: IdentityResolver::new(),
            components: ComponentNames::new(reserved),
            diagnostics: Diagnostics::new(),
        }
    }

    /// File identity of a view, recording disambiguations
    pub fn identity(&mut self, view: &View) -> String {
        let resolution = self.identities.resolve_tracked(view);
        if resolution.fresh && resolution.disambiguated() {
            self.diagnostics.push(
                DiagnosticItem::new(
                    &view.id,
                    DiagnosticCode::IdentityDisambiguated,
                    format!("identity '{}' was taken; using '{}'", resolution.base, resolution.identity),
                )
                .with_context(format!("kind: {}", view.kind().tag())),
            );
        }
        resolution.identity
    }

    /// Identity already assigned to a view id
    pub fn lookup_identity(&self, id: &str) -> Option<&str> {
        self.identities.lookup(id)
    }

    pub fn identities(&self) -> &IdentityResolver {
        &self.identities
    }

    /// Component name for an identity
    pub fn component_name(&mut self, identity: &str) -> String {
        self.components.name_for(identity)
    }

    /// Hand the collected diagnostics to the caller, leaving an empty collection
    pub fn take_diagnostics(&mut self) -> Diagnostics {
        std::mem::take(&mut self.diagnostics)
    }

    /// Clear all run state; reserved names are kept
    pub fn reset(&mut self) {
        self.identities.reset();
        self.components.reset();
        self.diagnostics = Diagnostics::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn view(id: &str, name: &str) -> View {
        serde_json::from_value(json!({"id": id, "name": name, "type": "text"})).unwrap()
    }

    #[test]
    fn test_disambiguation_is_reported_once() {
        let mut session = CompileSession::new(Vec::<String>::new());
        session.identity(&view("1", "Hero"));
        let second = view("2", "Hero");
        session.identity(&second);
        session.identity(&second);

        assert_eq!(
            session.diagnostics.with_code(DiagnosticCode::IdentityDisambiguated).count(),
            1
        );
    }

    #[test]
    fn test_reset_clears_state() {
        let mut session = CompileSession::new(["Page"]);
        let id = session.identity(&view("1", "Hero"));
        assert_eq!(session.component_name(&id), "Hero");
        assert_eq!(session.component_name("page"), "Page2");

        session.reset();
        assert!(session.identities().is_empty());
        assert!(session.diagnostics.is_empty());
        assert_eq!(session.lookup_identity("1"), None);
        assert_eq!(session.component_name("page"), "Page2");
    }
}
