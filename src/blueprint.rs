//! Blueprint IR
//!
//! The declarative site description handed to the compiler by the upstream
//! generation service. Everything here is read-only during a run.
//!
//! Upstream producers are loose with scalar types: ids arrive as numbers or
//! strings, flags as `"True"`, `"false"`, `1` or `true`, and column hints as
//! numeric strings. The deserializers in this module normalize all of that so
//! the compilers only ever see clean values.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{CompileError, Result};

// =============================================================================
// Lenient scalars
// =============================================================================

/// A boolean that tolerates the string encodings used upstream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flag(bool);

impl Flag {
    pub fn is_set(self) -> bool {
        self.0
    }

    pub fn from_value(value: &Value) -> Self {
        let set = match value {
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
            Value::String(s) => matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "true" | "yes" | "y" | "1" | "on"
            ),
            _ => false,
        };
        Self(set)
    }
}

impl From<bool> for Flag {
    fn from(b: bool) -> Self {
        Self(b)
    }
}

impl<'de> Deserialize<'de> for Flag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

impl Serialize for Flag {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_bool(self.0)
    }
}

fn value_to_u32(value: &Value) -> Option<u32> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if number.is_finite() && number >= 0.0 {
        Some(number.floor().min(u32::MAX as f64) as u32)
    } else {
        None
    }
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<u32>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_to_u32))
}

fn lenient_row<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u32, D::Error> {
    Ok(lenient_u32(deserializer)?.unwrap_or(0))
}

fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_to_string).unwrap_or_default())
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

fn lenient_opt_string<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(value_to_string)
        .filter(|s| !s.trim().is_empty()))
}

/// Scalar keyword, lowercased; empty when absent or not a scalar
fn keyword<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(value_to_string)
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase())
}

/// A list whose unreadable entries are dropped instead of failing the document
fn lenient_list<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items,
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(other) => {
            tracing::warn!(found = %other, "expected a list; ignoring");
            return Ok(Vec::new());
        }
    };
    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!(error = %e, "dropping unreadable blueprint entry");
                None
            }
        })
        .collect())
}

fn lenient_field<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<Field>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(value @ Value::Object(_)) => serde_json::from_value(value).ok(),
        _ => None,
    })
}

// =============================================================================
// Blueprint
// =============================================================================

/// Root of the IR
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Blueprint {
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub pages: Vec<Page>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub views: Vec<View>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub menus: Vec<Menu>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub models: Vec<Model>,
    #[serde(default, alias = "journal", deserialize_with = "lenient_list")]
    pub migrations: Vec<Migration>,
}

impl Blueprint {
    /// Parse a blueprint from JSON text
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| CompileError::InvalidBlueprint(e.to_string()))
    }

    /// Load a blueprint file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(CompileError::MissingBlueprint(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn view(&self, id: &str) -> Option<&View> {
        self.views.iter().find(|v| v.id == id)
    }

    pub fn menu(&self, id: &str) -> Option<&Menu> {
        self.menus.iter().find(|m| m.id == id)
    }

    pub fn page(&self, id: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.id == id)
    }
}

// =============================================================================
// Views
// =============================================================================

/// Style attributes shared by every view
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewStyle {
    #[serde(default, deserialize_with = "lenient_opt_string", alias = "backgroundColor", alias = "background")]
    pub background_color: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string", alias = "textColor", alias = "color")]
    pub text_color: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub padding: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub margin: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string", alias = "horizontalAlign", alias = "align")]
    pub horizontal_align: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string", alias = "verticalAlign")]
    pub vertical_align: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string", alias = "minWidth")]
    pub min_width: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string", alias = "maxWidth")]
    pub max_width: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string", alias = "minHeight")]
    pub min_height: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string", alias = "maxHeight")]
    pub max_height: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string", alias = "fontSize")]
    pub font_size: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string", alias = "fontFamily")]
    pub font_family: Option<String>,
}

/// A single page section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct View {
    #[serde(deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_id")]
    pub name: String,
    #[serde(rename = "type", default, deserialize_with = "lenient_id")]
    pub view_type: String,
    /// Authoring prompt, shown by the placeholder for unknown kinds
    #[serde(default, deserialize_with = "lenient_text")]
    pub prompt: Option<String>,
    /// Markup, URL or JSON depending on the kind
    #[serde(default, deserialize_with = "lenient_text")]
    pub content: Option<String>,
    /// JSON configuration, either inline or JSON-encoded as a string
    #[serde(default)]
    pub config: Option<Value>,
    #[serde(default, alias = "menuId", deserialize_with = "lenient_opt_string")]
    pub menu_id: Option<String>,
    #[serde(default, alias = "imageUrl", alias = "src", deserialize_with = "lenient_opt_string")]
    pub image_url: Option<String>,
    /// Container payload: an array, or a JSON-encoded string of one
    #[serde(default)]
    pub subviews: Option<Value>,
    #[serde(default, alias = "flowVertical")]
    pub flow_vertical: Flag,
    #[serde(flatten)]
    pub style: ViewStyle,
}

/// Result of reading a view's JSON payload
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Absent,
    Parsed(Value),
    Malformed(String),
}

impl View {
    pub fn kind(&self) -> ViewKind {
        ViewKind::parse(&self.view_type)
    }

    /// The JSON configuration payload.
    ///
    /// `config` wins over `content`. String payloads are decoded as JSON.
    pub fn payload(&self) -> Payload {
        match (&self.config, &self.content) {
            (Some(Value::Null), _) | (None, None) => Payload::Absent,
            (Some(Value::String(s)), _) => decode_json_text(s),
            (Some(value), _) => Payload::Parsed(value.clone()),
            (None, Some(s)) => decode_json_text(s),
        }
    }

    /// The container's subview list, raw.
    pub fn subview_payload(&self) -> Payload {
        match &self.subviews {
            None | Some(Value::Null) => Payload::Absent,
            Some(Value::String(s)) => decode_json_text(s),
            Some(value) => Payload::Parsed(value.clone()),
        }
    }

    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

/// One entry of a container's subview list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubviewPlacement {
    pub id: String,
    pub hints: ColumnHints,
}

/// Parsed subview list plus the entries that could not be read
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubviewList {
    pub entries: Vec<SubviewPlacement>,
    pub problems: Vec<String>,
}

impl View {
    /// Read the container's subview list.
    ///
    /// Entries are bare ids (`"hero"`, `7`) or objects carrying an id and
    /// optional `colpos`/`colpos_md`/`colpos_sm` hints.
    pub fn subview_list(&self) -> SubviewList {
        let mut list = SubviewList::default();
        let items = match self.subview_payload() {
            Payload::Absent => return list,
            Payload::Malformed(error) => {
                list.problems.push(error);
                return list;
            }
            Payload::Parsed(Value::Array(items)) => items,
            Payload::Parsed(other) => {
                list.problems.push(format!("expected a list of subviews, found {}", other));
                return list;
            }
        };

        for item in &items {
            match item {
                Value::Object(map) => {
                    let id = ["id", "view_id", "viewId"]
                        .iter()
                        .find_map(|key| map.get(*key).and_then(value_to_string));
                    match id {
                        Some(id) if !id.trim().is_empty() => {
                            let hint = |key: &str| map.get(key).and_then(value_to_u32);
                            list.entries.push(SubviewPlacement {
                                id,
                                hints: ColumnHints::new(hint("colpos"), hint("colpos_md"), hint("colpos_sm")),
                            });
                        }
                        _ => list.problems.push(format!("subview entry without an id: {}", item)),
                    }
                }
                other => match value_to_string(other) {
                    Some(id) if !id.trim().is_empty() => list.entries.push(SubviewPlacement {
                        id,
                        hints: ColumnHints::default(),
                    }),
                    _ => list.problems.push(format!("unreadable subview entry: {}", other)),
                },
            }
        }
        list
    }
}

fn decode_json_text(text: &str) -> Payload {
    if text.trim().is_empty() {
        return Payload::Absent;
    }
    match serde_json::from_str(text) {
        Ok(value) => Payload::Parsed(value),
        Err(e) => Payload::Malformed(e.to_string()),
    }
}

/// Rich widgets backed by pre-built presentation components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    Form,
    Testimonials,
    Gallery,
    SocialLinks,
    CallToAction,
}

/// Internal views (auth and admin) backed by fixed pre-built views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InternalView {
    Login,
    Profile,
    Admin,
    LoggedInMenu,
}

/// Closed set of view kinds
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ViewKind {
    Text,
    Image,
    Logo,
    Menu,
    Container,
    Component,
    IconBar,
    Widget(WidgetKind),
    Internal(InternalView),
    Unknown(String),
}

impl ViewKind {
    pub fn parse(raw: &str) -> Self {
        let normalized: String = raw
            .trim()
            .to_ascii_lowercase()
            .chars()
            .map(|c| if c == '_' || c == ' ' { '-' } else { c })
            .collect();

        match normalized.as_str() {
            "text" | "html" | "markup" => Self::Text,
            "image" | "img" => Self::Image,
            "logo" => Self::Logo,
            "menu" | "nav" | "navigation" => Self::Menu,
            "container" => Self::Container,
            "component" => Self::Component,
            "icon-bar" | "iconbar" | "icons" => Self::IconBar,
            "form" | "contact-form" => Self::Widget(WidgetKind::Form),
            "testimonials" | "testimonial" => Self::Widget(WidgetKind::Testimonials),
            "gallery" | "image-gallery" => Self::Widget(WidgetKind::Gallery),
            "social-links" | "social" | "sociallinks" => Self::Widget(WidgetKind::SocialLinks),
            "call-to-action" | "cta" | "calltoaction" => Self::Widget(WidgetKind::CallToAction),
            "login" | "signin" | "sign-in" => Self::Internal(InternalView::Login),
            "profile" | "user-profile" => Self::Internal(InternalView::Profile),
            "admin" | "admin-panel" => Self::Internal(InternalView::Admin),
            "loggedin-menu" | "logged-in-menu" | "loggedinmenu" | "user-menu" => {
                Self::Internal(InternalView::LoggedInMenu)
            }
            _ => Self::Unknown(raw.trim().to_string()),
        }
    }

    /// Lowercase tag used when disambiguating file identities
    pub fn tag(&self) -> String {
        let tag = match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Logo => "logo",
            Self::Menu => "menu",
            Self::Container => "container",
            Self::Component => "component",
            Self::IconBar => "icon_bar",
            Self::Widget(WidgetKind::Form) => "form",
            Self::Widget(WidgetKind::Testimonials) => "testimonials",
            Self::Widget(WidgetKind::Gallery) => "gallery",
            Self::Widget(WidgetKind::SocialLinks) => "social_links",
            Self::Widget(WidgetKind::CallToAction) => "call_to_action",
            Self::Internal(InternalView::Login) => "login",
            Self::Internal(InternalView::Profile) => "profile",
            Self::Internal(InternalView::Admin) => "admin",
            Self::Internal(InternalView::LoggedInMenu) => "logged_in_menu",
            Self::Unknown(raw) => return raw.to_ascii_lowercase(),
        };
        tag.to_string()
    }
}

// =============================================================================
// Pages and placements
// =============================================================================

/// Per-breakpoint column hints for one placement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnHints {
    pub large: Option<u32>,
    pub medium: Option<u32>,
    pub small: Option<u32>,
}

impl ColumnHints {
    pub fn new(large: Option<u32>, medium: Option<u32>, small: Option<u32>) -> Self {
        Self { large, medium, small }
    }
}

/// A view attached to a page row
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Placement {
    #[serde(alias = "view_id", alias = "viewId", deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default, alias = "row", deserialize_with = "lenient_row")]
    pub rowpos: u32,
    #[serde(default, alias = "cols", deserialize_with = "lenient_u32")]
    pub colpos: Option<u32>,
    #[serde(default, alias = "colpos_medium", deserialize_with = "lenient_u32")]
    pub colpos_md: Option<u32>,
    #[serde(default, alias = "colpos_small", deserialize_with = "lenient_u32")]
    pub colpos_sm: Option<u32>,
}

impl Placement {
    pub fn hints(&self) -> ColumnHints {
        ColumnHints::new(self.colpos, self.colpos_md, self.colpos_sm)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Page {
    #[serde(deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_id")]
    pub name: String,
    #[serde(default, alias = "is_home", alias = "isHome")]
    pub home: Flag,
    #[serde(default, alias = "pageviews", alias = "placements", deserialize_with = "lenient_list")]
    pub views: Vec<Placement>,
}

// =============================================================================
// Menus
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MenuLayout {
    #[default]
    Horizontal,
    Vertical,
    Tiled,
}

impl MenuLayout {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
            Self::Tiled => "tiled",
        }
    }
}

impl<'de> Deserialize<'de> for MenuLayout {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(match keyword(deserializer)?.as_str() {
            "vertical" | "column" | "stacked" => Self::Vertical,
            "tiled" | "tiles" | "grid" | "cards" => Self::Tiled,
            _ => Self::Horizontal,
        })
    }
}

impl Serialize for MenuLayout {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MenuItem {
    #[serde(default, alias = "label", alias = "title", deserialize_with = "lenient_id")]
    pub name: String,
    #[serde(default, alias = "page_id", alias = "pageId", deserialize_with = "lenient_opt_string")]
    pub page: Option<String>,
    #[serde(default, alias = "href", alias = "link", deserialize_with = "lenient_opt_string")]
    pub url: Option<String>,
    #[serde(default, alias = "file_id", alias = "filename", deserialize_with = "lenient_opt_string")]
    pub file: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Menu {
    #[serde(deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_id")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_list")]
    pub items: Vec<MenuItem>,
    #[serde(default, alias = "direction")]
    pub layout: MenuLayout,
    #[serde(default, alias = "fontSize", deserialize_with = "lenient_opt_string")]
    pub font_size: Option<String>,
    #[serde(default, alias = "fontFamily", deserialize_with = "lenient_opt_string")]
    pub font_family: Option<String>,
    #[serde(default, alias = "align", deserialize_with = "lenient_opt_string")]
    pub alignment: Option<String>,
    #[serde(default, alias = "collapseWidth", deserialize_with = "lenient_u32")]
    pub collapse_width: Option<u32>,
}

// =============================================================================
// Data model
// =============================================================================

/// Key role of a field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyRole {
    #[default]
    None,
    Primary,
    Unique,
}

impl<'de> Deserialize<'de> for KeyRole {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(match keyword(deserializer)?.as_str() {
            "primary" | "primary key" | "primary_key" | "pk" => Self::Primary,
            "unique" | "uniq" => Self::Unique,
            _ => Self::None,
        })
    }
}

impl Serialize for KeyRole {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::None => serializer.serialize_none(),
            Self::Primary => serializer.serialize_str("primary"),
            Self::Unique => serializer.serialize_str("unique"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Field {
    #[serde(default, deserialize_with = "lenient_id")]
    pub name: String,
    #[serde(default, alias = "type", alias = "data_type", deserialize_with = "lenient_id")]
    pub datatype: String,
    #[serde(default, alias = "length", deserialize_with = "lenient_u32")]
    pub size: Option<u32>,
    #[serde(default)]
    pub required: Flag,
    #[serde(default)]
    pub key: KeyRole,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Model {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_id")]
    pub name: String,
    #[serde(default, alias = "user_specific")]
    pub data_is_user_specific: Flag,
    #[serde(default, deserialize_with = "lenient_list")]
    pub fields: Vec<Field>,
}

// =============================================================================
// Migration journal
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationAction {
    Create,
    Update,
    Delete,
    Unknown(String),
}

impl<'de> Deserialize<'de> for MigrationAction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = keyword(deserializer)?;
        Ok(match raw.as_str() {
            "create" | "add" => Self::Create,
            "update" | "alter" | "modify" => Self::Update,
            "delete" | "drop" | "remove" => Self::Delete,
            _ => Self::Unknown(raw),
        })
    }
}

impl Serialize for MigrationAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Create => serializer.serialize_str("create"),
            Self::Update => serializer.serialize_str("update"),
            Self::Delete => serializer.serialize_str("delete"),
            Self::Unknown(raw) => serializer.serialize_str(raw),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeOp {
    Add,
    Remove,
    Modify,
    Unknown(String),
}

impl<'de> Deserialize<'de> for ChangeOp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = keyword(deserializer)?;
        Ok(match raw.as_str() {
            "add" | "create" => Self::Add,
            "remove" | "delete" | "drop" => Self::Remove,
            "modify" | "update" | "alter" | "change" => Self::Modify,
            _ => Self::Unknown(raw),
        })
    }
}

impl Serialize for ChangeOp {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Add => serializer.serialize_str("add"),
            Self::Remove => serializer.serialize_str("remove"),
            Self::Modify => serializer.serialize_str("modify"),
            Self::Unknown(raw) => serializer.serialize_str(raw),
        }
    }
}

/// A field named by a change: either just its name or a full definition
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldRef {
    Name(String),
    Definition(Field),
}

fn lenient_field_ref<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<FieldRef>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(value @ Value::Object(_)) => serde_json::from_value(value).ok().map(FieldRef::Definition),
        Some(other) => value_to_string(&other)
            .filter(|s| !s.trim().is_empty())
            .map(FieldRef::Name),
        None => None,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldChange {
    #[serde(rename = "type", default = "default_change_target", deserialize_with = "change_target")]
    pub target: String,
    pub operation: ChangeOp,
    #[serde(default, deserialize_with = "lenient_field_ref")]
    pub field: Option<FieldRef>,
    #[serde(default, deserialize_with = "lenient_field")]
    pub old: Option<Field>,
    #[serde(default, deserialize_with = "lenient_field")]
    pub new: Option<Field>,
}

fn default_change_target() -> String {
    "field".to_string()
}

fn change_target<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    let target = keyword(deserializer)?;
    Ok(if target.is_empty() { default_change_target() } else { target })
}

impl FieldChange {
    /// Name of the affected column
    pub fn field_name(&self) -> Option<&str> {
        let name = match &self.field {
            Some(FieldRef::Name(name)) => Some(name.as_str()),
            Some(FieldRef::Definition(field)) => Some(field.name.as_str()),
            None => None,
        };
        name.or_else(|| self.new.as_ref().map(|f| f.name.as_str()))
            .or_else(|| self.old.as_ref().map(|f| f.name.as_str()))
            .filter(|n| !n.trim().is_empty())
    }

    /// The new definition of the affected column, if one was recorded
    pub fn definition(&self) -> Option<&Field> {
        self.new.as_ref().or(match &self.field {
            Some(FieldRef::Definition(field)) => Some(field),
            _ => None,
        })
    }
}

/// One journal entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Migration {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub timestamp: Option<String>,
    #[serde(default, alias = "model_name", alias = "table", deserialize_with = "lenient_id")]
    pub model: String,
    /// Disambiguates models that share a name
    #[serde(default, alias = "modelId", deserialize_with = "lenient_opt_string")]
    pub model_id: Option<String>,
    #[serde(default, alias = "user_specific")]
    pub data_is_user_specific: Flag,
    pub action: MigrationAction,
    #[serde(default, deserialize_with = "lenient_list")]
    pub changes: Vec<FieldChange>,
}
