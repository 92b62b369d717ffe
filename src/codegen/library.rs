//! Pre-built component library
//!
//! The compiler never renders widgets or internal views itself. It imports
//! them by stable name from the library and forwards configuration.

use std::collections::BTreeMap;

use crate::blueprint::{InternalView, ViewKind, WidgetKind};
use crate::config::LibraryConfig;

/// An importable library component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryComponent {
    pub name: String,
    pub path: String,
}

/// Library addressing, with per-kind name overrides from configuration
#[derive(Debug, Clone)]
pub struct ComponentLibrary {
    import_base: String,
    overrides: BTreeMap<String, String>,
}

impl Default for ComponentLibrary {
    fn default() -> Self {
        Self::from_config(&LibraryConfig::default())
    }
}

impl ComponentLibrary {
    pub fn from_config(config: &LibraryConfig) -> Self {
        Self {
            import_base: config.import_base.trim_end_matches('/').to_string(),
            overrides: config.components.clone(),
        }
    }

    pub fn widget(&self, kind: WidgetKind) -> LibraryComponent {
        let default = match kind {
            WidgetKind::Form => "FormView",
            WidgetKind::Testimonials => "TestimonialsView",
            WidgetKind::Gallery => "GalleryView",
            WidgetKind::SocialLinks => "SocialLinksView",
            WidgetKind::CallToAction => "CallToActionView",
        };
        self.component(&ViewKind::Widget(kind).tag(), default)
    }

    pub fn internal(&self, view: InternalView) -> LibraryComponent {
        let default = match view {
            InternalView::Login => "LoginView",
            InternalView::Profile => "ProfileView",
            InternalView::Admin => "AdminView",
            InternalView::LoggedInMenu => "LoggedInMenuView",
        };
        self.component(&ViewKind::Internal(view).tag(), default)
    }

    fn component(&self, tag: &str, default: &str) -> LibraryComponent {
        let name = self
            .overrides
            .get(tag)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .unwrap_or(default)
            .to_string();
        LibraryComponent {
            path: format!("{}/{}", self.import_base, name),
            name,
        }
    }

    /// Every library component name, so generated names never shadow them
    pub fn names(&self) -> Vec<String> {
        let widgets = [
            WidgetKind::Form,
            WidgetKind::Testimonials,
            WidgetKind::Gallery,
            WidgetKind::SocialLinks,
            WidgetKind::CallToAction,
        ]
        .into_iter()
        .map(|k| self.widget(k).name);
        let internals = [
            InternalView::Login,
            InternalView::Profile,
            InternalView::Admin,
            InternalView::LoggedInMenu,
        ]
        .into_iter()
        .map(|v| self.internal(v).name);
        widgets.chain(internals).collect()
    }
}

// =============================================================================
// Icon Registry
// =============================================================================

/// Stroke path drawn for unknown icon keys
pub const DEFAULT_ICON: &str = "M12 8a4 4 0 1 0 0 8a4 4 0 1 0 0-8z";

/// Icon key -> 24x24 stroke path
const ICONS: &[(&str, &str)] = &[
    ("home", "M3 12l9-9 9 9M5 10v10h5v-6h4v6h5V10"),
    ("mail", "M3 5h18v14H3zM3 5l9 8 9-8"),
    ("phone", "M5 3h4l2 5-3 2a11 11 0 0 0 6 6l2-3 5 2v4a2 2 0 0 1-2 2A18 18 0 0 1 3 5a2 2 0 0 1 2-2z"),
    ("user", "M12 12a4 4 0 1 0 0-8a4 4 0 1 0 0 8zM4 21a8 8 0 0 1 16 0"),
    ("search", "M11 18a7 7 0 1 0 0-14a7 7 0 1 0 0 14zM21 21l-5-5"),
    ("star", "M12 2l3 7h7l-5.5 4.5 2 7.5-6.5-4.5-6.5 4.5 2-7.5L2 9h7z"),
    ("heart", "M12 21l-8-8a5 5 0 0 1 8-6 5 5 0 0 1 8 6z"),
    ("cart", "M3 3h2l3 12h11l2-8H6M9 20a1 1 0 1 0 0 .1M18 20a1 1 0 1 0 0 .1"),
    ("calendar", "M4 5h16v16H4zM4 9h16M8 3v4M16 3v4"),
    ("info", "M12 22a10 10 0 1 0 0-20a10 10 0 1 0 0 20zM12 16v-5M12 8h.01"),
    ("menu", "M4 6h16M4 12h16M4 18h16"),
    ("settings", "M12 15a3 3 0 1 0 0-6a3 3 0 1 0 0 6zM12 2v3M12 19v3M2 12h3M19 12h3"),
    ("location", "M12 22s7-7 7-12a7 7 0 0 0-14 0c0 5 7 12 7 12zM12 12a2 2 0 1 0 0-4a2 2 0 1 0 0 4z"),
];

const ICON_ALIASES: &[(&str, &str)] = &[
    ("house", "home"),
    ("email", "mail"),
    ("envelope", "mail"),
    ("telephone", "phone"),
    ("call", "phone"),
    ("person", "user"),
    ("account", "user"),
    ("profile", "user"),
    ("favorite", "heart"),
    ("like", "heart"),
    ("shop", "cart"),
    ("basket", "cart"),
    ("events", "calendar"),
    ("about", "info"),
    ("gear", "settings"),
    ("map", "location"),
    ("pin", "location"),
];

/// Path for an icon key, `None` when the key is unknown
pub fn icon_path(key: &str) -> Option<&'static str> {
    let key = key.trim().to_ascii_lowercase();
    let key = ICON_ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, target)| *target)
        .unwrap_or(key.as_str());
    ICONS.iter().find(|(k, _)| *k == key).map(|(_, path)| *path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_widget_names() {
        let library = ComponentLibrary::default();
        let gallery = library.widget(WidgetKind::Gallery);
        assert_eq!(gallery.name, "GalleryView");
        assert_eq!(gallery.path, "@/components/library/GalleryView");
        assert_eq!(library.names().len(), 9);
    }

    #[test]
    fn test_overrides() {
        let mut config = LibraryConfig::default();
        config.import_base = "@/ui/".to_string();
        config.components.insert("social_links".to_string(), "SocialBar".to_string());
        let library = ComponentLibrary::from_config(&config);

        let social = library.widget(WidgetKind::SocialLinks);
        assert_eq!(social.path, "@/ui/SocialBar");
        assert_eq!(library.internal(InternalView::Login).path, "@/ui/LoginView");
    }

    #[test]
    fn test_icon_lookup() {
        assert_eq!(icon_path("Home"), icon_path("house"));
        assert!(icon_path("mail").is_some());
        assert_eq!(icon_path("unicorn"), None);
    }
}
