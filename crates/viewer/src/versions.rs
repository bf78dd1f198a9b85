use streaming::MapVersion;

/// A selectable tile-set version and its slider label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapVersionMark {
    pub value: MapVersion,
    pub label: String,
}

impl MapVersionMark {
    pub fn new(value: MapVersion, label: impl Into<String>) -> Self {
        Self {
            value,
            label: label.into(),
        }
    }
}

/// Ordered, de-duplicated set of configured versions. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionMarks {
    marks: Vec<MapVersionMark>,
}

impl VersionMarks {
    /// Returns `None` for an empty list. Later duplicates of a value are dropped.
    pub fn new(marks: impl IntoIterator<Item = MapVersionMark>) -> Option<Self> {
        let mut out: Vec<MapVersionMark> = Vec::new();
        for m in marks {
            if !out.iter().any(|o| o.value == m.value) {
                out.push(m);
            }
        }
        out.sort_by_key(|m| m.value);
        (!out.is_empty()).then_some(Self { marks: out })
    }

    pub fn min(&self) -> MapVersion {
        self.marks[0].value
    }

    pub fn max(&self) -> MapVersion {
        self.marks[self.marks.len() - 1].value
    }

    pub fn contains(&self, value: MapVersion) -> bool {
        self.marks.iter().any(|m| m.value == value)
    }

    pub fn label(&self, value: MapVersion) -> Option<&str> {
        self.marks
            .iter()
            .find(|m| m.value == value)
            .map(|m| m.label.as_str())
    }

    /// Accessible text for a slider value, e.g. `Version 3 (Dec 25)`.
    pub fn value_text(&self, value: MapVersion) -> String {
        match self.label(value) {
            Some(label) => format!("Version {value} ({label})"),
            None => format!("Version {value}"),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &MapVersionMark> {
        self.marks.iter()
    }
}

impl Default for VersionMarks {
    fn default() -> Self {
        Self {
            marks: vec![
                MapVersionMark::new(2, "Aug 25"),
                MapVersionMark::new(3, "Dec 25"),
                MapVersionMark::new(4, "Jan 26"),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_marks_span_two_to_four() {
        let marks = VersionMarks::default();
        assert_eq!(marks.min(), 2);
        assert_eq!(marks.max(), 4);
        assert!(marks.contains(3));
        assert!(!marks.contains(5));
    }

    #[test]
    fn value_text_uses_label_when_known() {
        let marks = VersionMarks::default();
        assert_eq!(marks.value_text(3), "Version 3 (Dec 25)");
        assert_eq!(marks.value_text(9), "Version 9");
    }

    #[test]
    fn new_sorts_and_dedups() {
        let marks = VersionMarks::new([
            MapVersionMark::new(7, "b"),
            MapVersionMark::new(1, "a"),
            MapVersionMark::new(7, "dup"),
        ])
        .unwrap();
        let values: Vec<_> = marks.iter().map(|m| m.value).collect();
        assert_eq!(values, vec![1, 7]);
        assert_eq!(marks.label(7), Some("b"));
        assert!(VersionMarks::new(Vec::new()).is_none());
    }
}
