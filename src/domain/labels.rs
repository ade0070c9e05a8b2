// ============================================================
// Layer 3 — Label Map
// ============================================================
// Maps the relaxed gold-standard strings to contiguous class ids.
//
// Ids are handed out in order of FIRST APPEARANCE in the data,
// so the mapping is stable for a given file and doesn't depend
// on alphabetical order:
//
//   rows:  "No", "Yes", "No", "In the middle, ..."
//   ids:   No → 0, Yes → 1, In the middle, ... → 2
//
// The map is saved next to the checkpoints so evaluation and
// prediction decode class ids exactly as training did.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelMap {
    names: Vec<String>,
}

impl LabelMap {
    /// Build from label strings, keeping first-seen order and
    /// dropping duplicates.
    pub fn from_labels<'a, I>(labels: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut names: Vec<String> = Vec::new();
        for label in labels {
            if !names.iter().any(|n| n == label) {
                names.push(label.to_string());
            }
        }
        Self { names }
    }

    pub fn id(&self, label: &str) -> Option<usize> {
        self.names.iter().position(|n| n == label)
    }

    pub fn name(&self, id: usize) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_appearance_order() {
        let map = LabelMap::from_labels(["No", "Yes", "No", "In the middle"]);
        assert_eq!(map.id("No"), Some(0));
        assert_eq!(map.id("Yes"), Some(1));
        assert_eq!(map.id("In the middle"), Some(2));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_unknown_label() {
        let map = LabelMap::from_labels(["Yes"]);
        assert_eq!(map.id("Maybe"), None);
        assert_eq!(map.name(7), None);
    }

    #[test]
    fn test_repeated_labels_collapse() {
        let map = LabelMap::from_labels(["Yes", "Yes", "No", "Yes"]);
        assert_eq!(map.names(), ["Yes".to_string(), "No".to_string()]);
    }

    #[test]
    fn test_json_roundtrip_keeps_order() {
        let map  = LabelMap::from_labels(["b", "a"]);
        let json = serde_json::to_string(&map).unwrap();
        let back: LabelMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back.name(0), Some("b"));
    }
}
