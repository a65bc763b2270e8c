//! Header analysis for equipment files.
//!
//! Column order is not fixed across sources, so each semantic field is
//! located by a substring of its header text. Lookup is two-staged: the
//! header match first, then the field's ordinal slot when no header matched.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticField {
    Name,
    Type,
    Flow,
    Pressure,
    Temp,
    Status,
}

impl SemanticField {
    pub const ALL: [SemanticField; 6] = [
        SemanticField::Name,
        SemanticField::Type,
        SemanticField::Flow,
        SemanticField::Pressure,
        SemanticField::Temp,
        SemanticField::Status,
    ];

    /// Substrings that identify the field in a normalized header.
    pub fn needles(&self) -> &'static [&'static str] {
        match self {
            SemanticField::Name => &["name", "equipment"],
            SemanticField::Type => &["type"],
            SemanticField::Flow => &["flow"],
            SemanticField::Pressure => &["press"],
            SemanticField::Temp => &["temp"],
            SemanticField::Status => &["stat"],
        }
    }

    /// Ordinal fallback slot. Status has none; it is derived instead.
    pub fn positional_index(&self) -> Option<usize> {
        match self {
            SemanticField::Name => Some(0),
            SemanticField::Type => Some(1),
            SemanticField::Flow => Some(2),
            SemanticField::Pressure => Some(3),
            SemanticField::Temp => Some(4),
            SemanticField::Status => None,
        }
    }

    fn slot(&self) -> usize {
        match self {
            SemanticField::Name => 0,
            SemanticField::Type => 1,
            SemanticField::Flow => 2,
            SemanticField::Pressure => 3,
            SemanticField::Temp => 4,
            SemanticField::Status => 5,
        }
    }

    fn matches(&self, header: &str) -> bool {
        self.needles().iter().any(|needle| header.contains(needle))
    }
}

pub fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMapping {
    matched: [Option<usize>; 6],
}

impl ColumnMapping {
    /// Map each semantic field to the first header containing one of its
    /// needles. Fields are resolved independently of one another.
    pub fn analyze<S: AsRef<str>>(headers: &[S]) -> Self {
        let normalized: Vec<String> = headers
            .iter()
            .map(|header| normalize_header(header.as_ref()))
            .collect();

        let mut matched = [None; 6];
        for field in SemanticField::ALL {
            matched[field.slot()] = normalized.iter().position(|header| field.matches(header));
        }

        Self { matched }
    }

    /// Index of the header that matched `field`, if any.
    pub fn matched(&self, field: SemanticField) -> Option<usize> {
        self.matched[field.slot()]
    }

    /// Header match, falling back to the positional slot.
    pub fn resolve(&self, field: SemanticField) -> Option<usize> {
        self.matched(field).or_else(|| field.positional_index())
    }

    pub fn unmatched(&self) -> Vec<SemanticField> {
        SemanticField::ALL
            .into_iter()
            .filter(|field| self.matched(*field).is_none())
            .collect()
    }
}
