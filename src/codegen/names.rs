//! Name Resolution
//!
//! Assigns every view a file identity and every identity a component name.
//! Both mappings are memoized for one compilation run and are collision-free:
//! - identities are lowercase slugs, disambiguated by view kind, then by a
//!   short hash of the view id
//! - component names are PascalCase, disambiguated by a numeric suffix
//!
//! The same slug convention drives page routes, both here and in the shared
//! runtime link helper the generated modules import.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;

use crate::blueprint::View;
use crate::checksum::Checksum;
use crate::graph::ViewId;

/// Fallback identity for names with no usable characters
const EMPTY_SLUG: &str = "view";

/// Length of the id-derived disambiguation suffix
const HASH_SUFFIX_LEN: usize = 6;

fn non_alphanumeric() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9]+").unwrap())
}

// =============================================================================
// Slugs
// =============================================================================

/// Lowercase, non-alphanumerics become single underscores, trimmed.
pub fn slugify(s: &str) -> String {
    let lower = s.to_lowercase();
    non_alphanumeric()
        .replace_all(&lower, "_")
        .trim_matches('_')
        .to_string()
}

/// Slug usable as a file identity and JS module name
pub fn identity_slug(name: &str) -> String {
    let slug = slugify(name);
    match slug.chars().next() {
        None => EMPTY_SLUG.to_string(),
        Some(c) if c.is_ascii_digit() => format!("v_{}", slug),
        Some(_) => slug,
    }
}

/// Route slug for a page name; `None` for the site root.
pub fn page_slug(name: &str) -> Option<String> {
    let slug = slugify(name);
    match slug.as_str() {
        "" | "home" | "index" => None,
        _ => Some(slug),
    }
}

/// Route for a page id that no page owns: the bare id when it is already a
/// slug, otherwise the route derived from the linking item's name.
pub fn fallback_page_path(page_id: &str, name: &str) -> String {
    let id = page_id.trim();
    if !id.is_empty() && slugify(id) == id {
        return format!("/{}", id);
    }
    match page_slug(name) {
        Some(slug) => format!("/{}", slug),
        None => "/".to_string(),
    }
}

/// Convert a slug to PascalCase
pub fn to_pascal_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for word in s.split(|c: char| !c.is_ascii_alphanumeric()).filter(|w| !w.is_empty()) {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            result.push(first.to_ascii_uppercase());
            result.extend(chars.map(|c| c.to_ascii_lowercase()));
        }
    }
    match result.chars().next() {
        None => "View".to_string(),
        Some(c) if c.is_ascii_digit() => format!("V{}", result),
        Some(_) => result,
    }
}

// =============================================================================
// Identity Resolver
// =============================================================================

/// Outcome of resolving one view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The assigned identity
    pub identity: String,
    /// The slug the identity started from
    pub base: String,
    /// Whether this call made the assignment (false when memoized)
    pub fresh: bool,
}

impl Resolution {
    pub fn disambiguated(&self) -> bool {
        self.identity != self.base
    }
}

/// Resolves view ids to stable, collision-free file identities.
#[derive(Debug, Default)]
pub struct IdentityResolver {
    /// view id -> identity
    assigned: HashMap<ViewId, String>,

    /// identity -> view id, for collision checks
    taken: HashMap<String, ViewId>,
}

impl IdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity for a view, assigning one on first sight
    pub fn resolve(&mut self, view: &View) -> String {
        self.resolve_tracked(view).identity
    }

    /// Like [`resolve`](Self::resolve), also reporting how the identity was chosen
    pub fn resolve_tracked(&mut self, view: &View) -> Resolution {
        let base = identity_slug(view.display_name());

        if let Some(identity) = self.assigned.get(&view.id) {
            return Resolution {
                identity: identity.clone(),
                base,
                fresh: false,
            };
        }

        let identity = self.pick(view, &base);
        self.taken.insert(identity.clone(), view.id.clone());
        self.assigned.insert(view.id.clone(), identity.clone());

        Resolution {
            identity,
            base,
            fresh: true,
        }
    }

    fn pick(&self, view: &View, base: &str) -> String {
        if self.is_free(base, &view.id) {
            return base.to_string();
        }

        let tag = slugify(&view.kind().tag());
        let typed = if tag.is_empty() || is_redundant(base, &tag) {
            base.to_string()
        } else {
            format!("{}_{}", base, tag)
        };
        if self.is_free(&typed, &view.id) {
            return typed;
        }

        let hashed = format!("{}_{}", typed, Checksum::of_str(&view.id).short(HASH_SUFFIX_LEN));
        if self.is_free(&hashed, &view.id) {
            return hashed;
        }

        // Two ids with the same hash prefix
        (2..)
            .map(|n| format!("{}_{}", hashed, n))
            .find(|candidate| self.is_free(candidate, &view.id))
            .unwrap_or(hashed)
    }

    fn is_free(&self, identity: &str, id: &str) -> bool {
        self.taken.get(identity).map_or(true, |owner| owner == id)
    }

    /// Identity already assigned to a view id
    pub fn lookup(&self, id: &str) -> Option<&str> {
        self.assigned.get(id).map(|s| s.as_str())
    }

    /// All assignments
    pub fn assignments(&self) -> impl Iterator<Item = (&ViewId, &String)> {
        self.assigned.iter()
    }

    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }

    /// Forget every assignment
    pub fn reset(&mut self) {
        self.assigned.clear();
        self.taken.clear();
    }
}

/// A kind tag adds nothing when the name already says it
fn is_redundant(base: &str, tag: &str) -> bool {
    base == tag
        || base.ends_with(&format!("_{}", tag))
        || base.starts_with(&format!("{}_", tag))
}

// =============================================================================
// Component Names
// =============================================================================

/// Unique PascalCase component names per identity
#[derive(Debug, Default)]
pub struct ComponentNames {
    by_identity: HashMap<String, String>,
    used: HashSet<String>,
    reserved: HashSet<String>,
}

impl ComponentNames {
    /// Names in `reserved` are never handed out (imports that share a scope)
    pub fn new<I, S>(reserved: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            reserved: reserved.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Component name for an identity, assigning one on first sight
    pub fn name_for(&mut self, identity: &str) -> String {
        if let Some(name) = self.by_identity.get(identity) {
            return name.clone();
        }

        let base = to_pascal_case(identity);
        let name = if self.is_free(&base) {
            base
        } else {
            (2..)
                .map(|n| format!("{}{}", base, n))
                .find(|candidate| self.is_free(candidate))
                .unwrap_or(base)
        };

        self.used.insert(name.clone());
        self.by_identity.insert(identity.to_string(), name.clone());
        name
    }

    fn is_free(&self, name: &str) -> bool {
        !self.used.contains(name) && !self.reserved.contains(name)
    }

    pub fn reset(&mut self) {
        self.by_identity.clear();
        self.used.clear();
    }
}
