//! Concrete entity placements for one scene instantiation

use std::collections::BTreeMap;

use glam::{Quat, Vec2};
use serde::{Deserialize, Serialize};

/// Where one entity goes
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Placement {
    /// Position in the arena plane
    pub position: Vec2,
    /// Orientation, set only for free bodies
    pub orientation: Option<Quat>,
}

impl Placement {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            orientation: None,
        }
    }
}

/// Entity name → placement
///
/// Keyed by name; iteration is in name order so that anything derived from
/// a layout (scene descriptors, logs) is stable.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Layout {
    placements: BTreeMap<String, Placement>,
}

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, placement: Placement) {
        self.placements.insert(name.into(), placement);
    }

    pub fn get(&self, name: &str) -> Option<&Placement> {
        self.placements.get(name)
    }

    pub fn position(&self, name: &str) -> Option<Vec2> {
        self.placements.get(name).map(|p| p.position)
    }

    /// Overwrite the position of an existing entry, keeping its orientation
    ///
    /// Returns false if `name` is not in the layout.
    pub fn set_position(&mut self, name: &str, position: Vec2) -> bool {
        match self.placements.get_mut(name) {
            Some(placement) => {
                placement.position = position;
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.placements.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.placements.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Placement)> {
        self.placements.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Copy every entry of `other` into this layout, replacing existing ones
    pub fn merge(&mut self, other: Layout) {
        self.placements.extend(other.placements);
    }

    /// Distance between two placed entities
    pub fn distance(&self, a: &str, b: &str) -> Option<f32> {
        Some(self.position(a)?.distance(self.position(b)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_distance() {
        let mut layout = Layout::new();
        layout.insert("robot", Placement::at(Vec2::ZERO));
        layout.insert("goal", Placement::at(Vec2::new(3.0, 4.0)));

        assert_eq!(layout.len(), 2);
        assert_eq!(layout.distance("robot", "goal"), Some(5.0));
        assert_eq!(layout.distance("robot", "box"), None);
    }

    #[test]
    fn test_names_sorted() {
        let mut layout = Layout::new();
        layout.insert("robot", Placement::default());
        layout.insert("box", Placement::default());
        layout.insert("goal", Placement::default());
        let names: Vec<&str> = layout.names().collect();
        assert_eq!(names, vec!["box", "goal", "robot"]);
    }

    #[test]
    fn test_merge_replaces_entries() {
        let mut base = Layout::new();
        base.insert("robot", Placement::at(Vec2::ZERO));
        base.insert("goal", Placement::at(Vec2::X));

        let mut update = Layout::new();
        update.insert("goal", Placement::at(Vec2::Y));
        base.merge(update);

        assert_eq!(base.position("goal"), Some(Vec2::Y));
        assert_eq!(base.position("robot"), Some(Vec2::ZERO));
    }

    #[test]
    fn test_set_position_keeps_orientation() {
        let mut layout = Layout::new();
        layout.insert(
            "box",
            Placement {
                position: Vec2::ZERO,
                orientation: Some(Quat::from_rotation_z(1.0)),
            },
        );
        assert!(layout.set_position("box", Vec2::ONE));
        assert!(!layout.set_position("missing", Vec2::ONE));
        let placement = layout.get("box").unwrap();
        assert_eq!(placement.position, Vec2::ONE);
        assert!(placement.orientation.is_some());
    }
}
