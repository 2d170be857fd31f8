//! JSON wire codec.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Result type for codec operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors raised while encoding or decoding wire payloads.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Payload could not be encoded.
    #[error("failed to encode payload: {0}")]
    Encode(String),

    /// Payload could not be decoded.
    #[error("failed to decode payload: {0}")]
    Decode(String),
}

/// Encodes a value to JSON bytes.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> ProtocolResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| ProtocolError::Encode(e.to_string()))
}

/// Decodes a value from JSON bytes.
pub fn from_json<T: DeserializeOwned>(bytes: &[u8]) -> ProtocolResult<T> {
    serde_json::from_slice(bytes).map_err(|e| ProtocolError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Attachment, AttachmentKind, FeedItem, ItemId};

    #[test]
    fn decodes_server_shape() {
        let json = br#"[{
            "id": 12,
            "author": "Netology",
            "authorAvatar": "netology.jpg",
            "content": "First post",
            "published": 1700000000,
            "likedByMe": true,
            "likes": 7,
            "attachment": {"url": "img.png", "type": "IMAGE"}
        }]"#;

        let items: Vec<FeedItem> = from_json(json).unwrap();
        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.id, ItemId::new(12));
        assert_eq!(item.author_avatar, "netology.jpg");
        assert_eq!(item.like_count, 7);
        assert!(item.liked_by_me);
        assert_eq!(
            item.attachment,
            Some(Attachment {
                url: "img.png".into(),
                description: None,
                kind: AttachmentKind::Image,
            })
        );
    }

    #[test]
    fn encodes_wire_names() {
        let item = FeedItem::draft("me", "text");
        let json = String::from_utf8(to_json(&item).unwrap()).unwrap();
        assert!(json.contains("\"likes\":0"));
        assert!(json.contains("\"likedByMe\":false"));
        assert!(json.contains("\"id\":0"));
        assert!(!json.contains("attachment"));
    }

    #[test]
    fn invalid_payload() {
        let result: ProtocolResult<FeedItem> = from_json(b"{not json");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }
}
