/*!
 * Capability interface for descriptive metadata collaborators.
 *
 * Metadata extraction itself (XML records, repository graphs) lives
 * outside this crate; a collaborator only has to answer for a title and
 * its identifiers, and each concrete format implements that directly.
 */

use crate::bag::{AccessLevel, AptrustInfo, BagInfo};
use crate::error::{Error, Result};

/// What any descriptive metadata source must be able to answer
pub trait DescriptiveMetadata {
    /// The item's display title, if the record carries one
    fn title(&self) -> Option<String>;

    /// All identifiers asserted for the item, most authoritative first
    fn identifiers(&self) -> Vec<String>;
}

/// Pre-extracted metadata for callers that already hold plain fields
#[derive(Debug, Clone, Default)]
pub struct StaticMetadata {
    title: Option<String>,
    identifiers: Vec<String>,
}

impl StaticMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn identifier<S: Into<String>>(mut self, id: S) -> Self {
        self.identifiers.push(id.into());
        self
    }
}

impl DescriptiveMetadata for StaticMetadata {
    fn title(&self) -> Option<String> {
        self.title.clone()
    }

    fn identifiers(&self) -> Vec<String> {
        self.identifiers.clone()
    }
}

/// Build the `aptrust-info.txt` fields from a metadata source, failing
/// fast when the source provides no title
pub fn aptrust_info_for(
    metadata: &dyn DescriptiveMetadata,
    access: AccessLevel,
) -> Result<AptrustInfo> {
    let title = metadata
        .title()
        .ok_or_else(|| Error::invalid_metadata("metadata source provides no title"))?;
    AptrustInfo::new(title, access)
}

/// Fold a metadata source's primary identifier into a bag descriptor
pub fn with_sender_identifier(bag_info: BagInfo, metadata: &dyn DescriptiveMetadata) -> BagInfo {
    match metadata.identifiers().into_iter().next() {
        Some(id) => bag_info.internal_sender_identifier(id),
        None => bag_info,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aptrust_info_from_metadata() {
        let metadata = StaticMetadata::new().title("A Broadcast Recording");
        let info = aptrust_info_for(&metadata, AccessLevel::Restricted).unwrap();
        assert_eq!(info.title(), "A Broadcast Recording");
        assert_eq!(info.access(), AccessLevel::Restricted);
    }

    #[test]
    fn test_missing_title_is_invalid_metadata() {
        let metadata = StaticMetadata::new().identifier("uva-lib:123");
        let err = aptrust_info_for(&metadata, AccessLevel::Consortia).unwrap_err();
        assert!(matches!(err, Error::InvalidMetadata { .. }));
    }

    #[test]
    fn test_first_identifier_becomes_sender_identifier() {
        let metadata = StaticMetadata::new()
            .identifier("uva-lib:123")
            .identifier("local:xyz");
        let bag_info = with_sender_identifier(BagInfo::new(), &metadata);
        assert!(bag_info
            .render()
            .contains("Internal-Sender-Identifier : uva-lib:123\n"));
    }

    #[test]
    fn test_no_identifier_leaves_descriptor_unchanged() {
        let bag_info = with_sender_identifier(BagInfo::new(), &StaticMetadata::new());
        assert!(!bag_info.render().contains("Internal-Sender-Identifier"));
    }
}
