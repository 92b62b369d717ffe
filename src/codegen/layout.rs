//! Layout Placement
//!
//! Converts row/column hints into spans over a 12-unit responsive grid.

use crate::blueprint::ColumnHints;

/// Grid width in units
pub const GRID_UNITS: u32 = 12;

/// Per-breakpoint spans for one cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spans {
    pub small: u32,
    pub medium: u32,
    pub large: u32,
}

impl Spans {
    pub fn uniform(units: u32) -> Self {
        Self {
            small: units,
            medium: units,
            large: units,
        }
    }

    /// Tailwind classes: small is the mobile-first base
    pub fn classes(&self) -> String {
        format!(
            "col-span-{} md:col-span-{} lg:col-span-{}",
            self.small, self.medium, self.large
        )
    }
}

/// How a group of placements is laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutMode {
    /// Declared large spans sum to the grid width; use them as given
    Explicit,
    /// Equal split, for blueprints without usable hints
    Legacy { units: u32 },
}

impl LayoutMode {
    /// Decide the mode for a group from its members' hints
    pub fn for_group(group: &[ColumnHints]) -> Self {
        let declared = group
            .iter()
            .try_fold(0u32, |acc, h| h.large.and_then(|units| acc.checked_add(units)));
        match declared {
            Some(GRID_UNITS) if !group.is_empty() => Self::Explicit,
            _ => Self::Legacy {
                units: legacy_units(group.len()),
            },
        }
    }

    /// Spans for one member of the group
    pub fn spans(&self, hints: &ColumnHints) -> Spans {
        match *self {
            Self::Legacy { units } => Spans::uniform(units),
            Self::Explicit => {
                let large = clamp(hints.large.unwrap_or(GRID_UNITS));
                let medium = hints.medium.map(clamp).unwrap_or(large);
                let small = hints.small.map(clamp).unwrap_or(medium);
                Spans { small, medium, large }
            }
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, Self::Legacy { .. })
    }
}

/// Spans for `hints` as a member of `group`
pub fn spans(hints: &ColumnHints, group: &[ColumnHints]) -> Spans {
    LayoutMode::for_group(group).spans(hints)
}

fn legacy_units(group_size: usize) -> u32 {
    let size = u32::try_from(group_size.max(1)).unwrap_or(u32::MAX);
    (GRID_UNITS / size).max(1)
}

fn clamp(units: u32) -> u32 {
    units.clamp(1, GRID_UNITS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hints(large: Option<u32>, medium: Option<u32>, small: Option<u32>) -> ColumnHints {
        ColumnHints::new(large, medium, small)
    }

    #[test]
    fn test_explicit_group_keeps_declared_values() {
        let group = [
            hints(Some(8), Some(6), Some(12)),
            hints(Some(4), None, None),
        ];
        assert_eq!(
            spans(&group[0], &group),
            Spans { small: 12, medium: 6, large: 8 }
        );
        assert_eq!(spans(&group[1], &group), Spans::uniform(4));
    }

    #[test]
    fn test_legacy_split() {
        let group = [hints(Some(6), None, None), hints(Some(3), None, None), hints(None, None, None)];
        assert_eq!(spans(&group[0], &group), Spans::uniform(4));

        let wide: Vec<ColumnHints> = (0..20).map(|_| ColumnHints::default()).collect();
        assert_eq!(spans(&wide[0], &wide), Spans::uniform(1));
    }

    #[test]
    fn test_missing_hint_forces_legacy() {
        let group = [hints(Some(12), None, None), hints(None, None, None)];
        assert!(LayoutMode::for_group(&group).is_legacy());
    }

    #[test]
    fn test_explicit_values_are_clamped() {
        let group = [hints(Some(12), Some(40), Some(0))];
        assert_eq!(
            spans(&group[0], &group),
            Spans { small: 1, medium: 12, large: 12 }
        );
    }

    #[test]
    fn test_classes() {
        let s = Spans { small: 12, medium: 6, large: 4 };
        assert_eq!(s.classes(), "col-span-12 md:col-span-6 lg:col-span-4");
    }
}
