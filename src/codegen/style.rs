//! Style projection
//!
//! Maps a view's declared style onto inline style maps for the places it is
//! rendered: a container cell, a page cell, or the view's own root element.

use crate::blueprint::ViewStyle;

use super::markup::StyleMap;

/// Alignment keyword as a CSS box-alignment value
fn align_value(raw: &str) -> Option<&'static str> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "left" | "top" | "start" | "flex-start" => Some("start"),
        "center" | "centre" | "middle" => Some("center"),
        "right" | "bottom" | "end" | "flex-end" => Some("end"),
        "stretch" | "fill" => Some("stretch"),
        _ => None,
    }
}

fn flex_value(raw: &str) -> Option<&'static str> {
    align_value(raw).map(|v| match v {
        "start" => "flex-start",
        "end" => "flex-end",
        other => other,
    })
}

/// Combined `place-items` rule: block axis first, then inline axis
pub fn place_items(style: &ViewStyle) -> Option<String> {
    let vertical = style.vertical_align.as_deref().and_then(align_value);
    let horizontal = style.horizontal_align.as_deref().and_then(align_value);
    match (vertical, horizontal) {
        (None, None) => None,
        (v, h) => Some(format!("{} {}", v.unwrap_or("stretch"), h.unwrap_or("stretch"))),
    }
}

/// Background, color and spacing
fn base_style(style: &ViewStyle) -> StyleMap {
    let mut map = StyleMap::new();
    map.set_opt("backgroundColor", style.background_color.as_deref());
    map.set_opt("color", style.text_color.as_deref());
    map.set_opt("padding", style.padding.as_deref());
    map.set_opt("margin", style.margin.as_deref());
    map
}

/// Style of a container cell wrapping a subview
pub fn container_cell_style(style: &ViewStyle) -> StyleMap {
    let mut map = base_style(style);
    map.set_opt("minWidth", style.min_width.as_deref());
    map.set_opt("maxWidth", style.max_width.as_deref());
    map.set_opt("minHeight", style.min_height.as_deref());
    map.set_opt("maxHeight", style.max_height.as_deref());
    if let Some(place) = place_items(style) {
        map.set("display", "grid");
        map.set("placeItems", place);
    }
    map
}

/// Inner flex wrapper matching the subview's declared alignment
pub fn flex_wrapper_style(style: &ViewStyle) -> StyleMap {
    let mut map = StyleMap::new();
    map.set("display", "flex");
    map.set("flexDirection", "column");
    if let Some(v) = style.vertical_align.as_deref().and_then(flex_value) {
        map.set("justifyContent", v);
    }
    if let Some(h) = style.horizontal_align.as_deref().and_then(flex_value) {
        map.set("alignItems", h);
    }
    map
}

/// Style of a page cell: page-level attributes only
pub fn page_cell_style(style: &ViewStyle) -> StyleMap {
    base_style(style)
}

/// Typography applied to a view's own root element
pub fn view_root_style(style: &ViewStyle) -> StyleMap {
    let mut map = StyleMap::new();
    map.set_opt("fontSize", style.font_size.as_deref());
    map.set_opt("fontFamily", style.font_family.as_deref());
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style() -> ViewStyle {
        ViewStyle {
            background_color: Some("#fff".to_string()),
            text_color: Some("#111".to_string()),
            padding: Some("8px".to_string()),
            min_height: Some("200px".to_string()),
            horizontal_align: Some("Right".to_string()),
            vertical_align: Some("middle".to_string()),
            ..ViewStyle::default()
        }
    }

    #[test]
    fn test_place_items_combines_axes() {
        assert_eq!(place_items(&style()), Some("center end".to_string()));
        assert_eq!(place_items(&ViewStyle::default()), None);

        let only_h = ViewStyle {
            horizontal_align: Some("left".to_string()),
            ..ViewStyle::default()
        };
        assert_eq!(place_items(&only_h), Some("stretch start".to_string()));
    }

    #[test]
    fn test_container_cell_style() {
        let map = container_cell_style(&style());
        assert_eq!(map.get("backgroundColor"), Some("#fff"));
        assert_eq!(map.get("minHeight"), Some("200px"));
        assert_eq!(map.get("placeItems"), Some("center end"));
    }

    #[test]
    fn test_flex_wrapper_follows_alignment() {
        let map = flex_wrapper_style(&style());
        assert_eq!(map.get("justifyContent"), Some("center"));
        assert_eq!(map.get("alignItems"), Some("flex-end"));
    }

    #[test]
    fn test_page_cell_ignores_nesting_style() {
        let map = page_cell_style(&style());
        assert_eq!(map.get("padding"), Some("8px"));
        assert_eq!(map.get("minHeight"), None);
        assert_eq!(map.get("placeItems"), None);
    }
}
