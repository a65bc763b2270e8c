use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusKind {
    Stable,
    Warning,
    Critical,
}

impl StatusKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusKind::Stable => "Stable",
            StatusKind::Warning => "Warning",
            StatusKind::Critical => "Critical",
        }
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Only the canonical spelling names a kind; `"critical"` is operator text.
impl TryFrom<&str> for StatusKind {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "Stable" => Ok(StatusKind::Stable),
            "Warning" => Ok(StatusKind::Warning),
            "Critical" => Ok(StatusKind::Critical),
            other => Err(format!("unknown status kind '{other}'")),
        }
    }
}

/// Operational status of a piece of equipment.
///
/// Files may carry an operator-written status that is not one of the known
/// kinds; that text is kept verbatim as `Raw` so it can still be displayed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Status {
    Known(StatusKind),
    Raw(String),
}

impl Status {
    /// Interpret status text taken from a file or a stored document. Text is
    /// kept exactly as written unless it is a canonical kind name.
    pub fn from_text(text: &str) -> Self {
        match StatusKind::try_from(text) {
            Ok(kind) => Status::Known(kind),
            Err(_) => Status::Raw(text.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Status::Known(kind) => kind.as_str(),
            Status::Raw(text) => text,
        }
    }

    pub fn kind(&self) -> Option<StatusKind> {
        match self {
            Status::Known(kind) => Some(*kind),
            Status::Raw(_) => None,
        }
    }

    pub fn is_critical(&self) -> bool {
        self.kind() == Some(StatusKind::Critical)
    }

    /// Critical or warning; the set the critical-only table filter keeps.
    pub fn needs_attention(&self) -> bool {
        matches!(
            self.kind(),
            Some(StatusKind::Critical) | Some(StatusKind::Warning)
        )
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::Known(StatusKind::Stable)
    }
}

impl From<StatusKind> for Status {
    fn from(kind: StatusKind) -> Self {
        Status::Known(kind)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(Status::from_text(&text))
    }
}

/// One row of equipment readings.
///
/// Readings stay as the text found in the file; they are only interpreted as
/// numbers when a status is derived from them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub equipment_type: String,
    pub flow: String,
    pub pressure: String,
    pub temp: String,
    #[serde(default)]
    pub status: Status,
}

impl EquipmentRecord {
    /// Field names in declaration order, as written in exported CSV headers.
    pub const FIELD_NAMES: [&'static str; 6] = ["name", "type", "flow", "pressure", "temp", "status"];

    pub fn values(&self) -> [&str; 6] {
        [
            self.name.as_str(),
            self.equipment_type.as_str(),
            self.flow.as_str(),
            self.pressure.as_str(),
            self.temp.as_str(),
            self.status.as_str(),
        ]
    }
}
