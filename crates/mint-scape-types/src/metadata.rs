//! The JSON metadata document pinned next to every image.

use crate::{Locator, MintDetails, SourceMode};
use serde::{Deserialize, Serialize};

pub const PROVENANCE_TRAIT: &str = "Generated From";
pub const PROMPT_TRAIT: &str = "Prompt";
/// Prompt value when the image was uploaded rather than generated.
pub const NOT_APPLICABLE: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftMetadata {
    pub name: String,
    pub description: String,
    pub image: String,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub trait_type: String,
    pub value: String,
}

impl NftMetadata {
    pub fn attribute(&self, trait_type: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.trait_type == trait_type)
            .map(|a| a.value.as_str())
    }
}

/// Build the document that references an already-pinned image.
pub fn build_metadata_document(
    details: &MintDetails,
    source: SourceMode,
    prompt: Option<&str>,
    image: &Locator,
) -> NftMetadata {
    let prompt = match (source, prompt.map(str::trim)) {
        (SourceMode::Generated, Some(p)) if !p.is_empty() => p.to_string(),
        _ => NOT_APPLICABLE.to_string(),
    };
    NftMetadata {
        name: details.name.trim().to_string(),
        description: details.description.clone(),
        image: image.uri(),
        attributes: vec![
            Attribute {
                trait_type: PROVENANCE_TRAIT.into(),
                value: source.provenance().into(),
            },
            Attribute {
                trait_type: PROMPT_TRAIT.into(),
                value: prompt,
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details() -> MintDetails {
        MintDetails {
            name: " Neon Fox ".into(),
            description: "a fox in the rain".into(),
            collection_name: "Default".into(),
        }
    }

    #[test]
    fn test_generated_document() {
        let image = Locator::new("QmImage");
        let doc = build_metadata_document(
            &details(),
            SourceMode::Generated,
            Some("neon fox, rain"),
            &image,
        );
        assert_eq!(doc.name, "Neon Fox");
        assert_eq!(doc.image, "ipfs://QmImage");
        assert_eq!(doc.attribute(PROVENANCE_TRAIT), Some("Stability AI"));
        assert_eq!(doc.attribute(PROMPT_TRAIT), Some("neon fox, rain"));
    }

    #[test]
    fn test_upload_document_uses_sentinel_prompt() {
        let image = Locator::new("QmUpload");
        let doc = build_metadata_document(&details(), SourceMode::Upload, Some("ignored"), &image);
        assert_eq!(doc.attribute(PROVENANCE_TRAIT), Some("Upload"));
        assert_eq!(doc.attribute(PROMPT_TRAIT), Some(NOT_APPLICABLE));
    }

    #[test]
    fn test_json_shape() {
        let image = Locator::new("Qm1");
        let doc = build_metadata_document(&details(), SourceMode::Upload, None, &image);
        let s = serde_json::to_string(&doc).unwrap();
        assert_eq!(
            s,
            concat!(
                r#"{"name":"Neon Fox","description":"a fox in the rain","image":"ipfs://Qm1","#,
                r#""attributes":[{"trait_type":"Generated From","value":"Upload"},"#,
                r#"{"trait_type":"Prompt","value":"N/A"}]}"#
            )
        );
    }
}
