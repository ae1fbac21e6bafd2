use serde::{Deserialize, Serialize};

/// Collection targeted when the user leaves the field blank.
pub const DEFAULT_COLLECTION: &str = "Default";

/// Where the draft image came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    Upload,
    Generated,
}

impl SourceMode {
    /// Value of the provenance attribute in the metadata document.
    pub fn provenance(&self) -> &'static str {
        match self {
            Self::Upload => "Upload",
            Self::Generated => "Stability AI",
        }
    }
}

/// User-entered mint form. Mutated field by field, read once at mint time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintDetails {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_collection")]
    pub collection_name: String,
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

impl Default for MintDetails {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            collection_name: default_collection(),
        }
    }
}

impl MintDetails {
    /// Target collection, falling back to [`DEFAULT_COLLECTION`] when blank.
    pub fn collection(&self) -> &str {
        let name = self.collection_name.trim();
        if name.is_empty() { DEFAULT_COLLECTION } else { name }
    }

    /// Close the form after a confirmed mint. The collection choice survives.
    pub fn reset_form(&mut self) {
        self.name.clear();
        self.description.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_collection_falls_back_to_default() {
        let details = MintDetails {
            name: "a".into(),
            description: String::new(),
            collection_name: "  ".into(),
        };
        assert_eq!(details.collection(), DEFAULT_COLLECTION);
    }

    #[test]
    fn test_missing_collection_deserializes_to_default() {
        let details: MintDetails = serde_json::from_str(r#"{"name":"x"}"#).unwrap();
        assert_eq!(details.collection_name, "Default");
        assert_eq!(details.description, "");
    }

    #[test]
    fn test_reset_form_keeps_collection() {
        let mut details = MintDetails {
            name: "a".into(),
            description: "b".into(),
            collection_name: "Art".into(),
        };
        details.reset_form();
        assert!(details.name.is_empty());
        assert!(details.description.is_empty());
        assert_eq!(details.collection(), "Art");
    }

    #[test]
    fn test_provenance_values() {
        assert_eq!(SourceMode::Generated.provenance(), "Stability AI");
        assert_eq!(SourceMode::Upload.provenance(), "Upload");
    }
}
