//! Feed item read model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-assigned, stable identifier of a feed item.
///
/// Identifiers grow over time, so a higher id means a newer item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(i64);

impl ItemId {
    /// Identifier carried by a draft that the server has not assigned yet.
    pub const UNSAVED: ItemId = ItemId(0);

    /// Creates an identifier from its raw value.
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Returns the raw value.
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Returns true for a draft identifier.
    pub fn is_unsaved(self) -> bool {
        self == Self::UNSAVED
    }
}

impl From<i64> for ItemId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of media attached to an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttachmentKind {
    /// A still image.
    Image,
}

/// Attachment metadata. The media itself lives on the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Location of the media.
    pub url: String,
    /// Optional caption.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Media kind.
    #[serde(rename = "type")]
    pub kind: AttachmentKind,
}

/// A feed item as seen by readers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    /// Unique identifier, [`ItemId::UNSAVED`] for drafts.
    pub id: ItemId,
    /// Author display name.
    pub author: String,
    /// Author avatar reference.
    #[serde(default)]
    pub author_avatar: String,
    /// Text content.
    pub content: String,
    /// Publication time in unix seconds.
    #[serde(default)]
    pub published: i64,
    /// Number of likes.
    #[serde(rename = "likes", default)]
    pub like_count: u32,
    /// Whether the current user liked the item.
    #[serde(default)]
    pub liked_by_me: bool,
    /// Optional attachment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
}

impl FeedItem {
    /// Creates a draft item with no id, likes or attachment.
    pub fn draft(author: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: ItemId::UNSAVED,
            author: author.into(),
            author_avatar: String::new(),
            content: content.into(),
            published: 0,
            like_count: 0,
            liked_by_me: false,
            attachment: None,
        }
    }

    /// Sets the identifier.
    pub fn with_id(mut self, id: impl Into<ItemId>) -> Self {
        self.id = id.into();
        self
    }

    /// Sets the attachment.
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    /// Returns a copy in the given like state.
    ///
    /// `liked_by_me` and `like_count` always move together: liking adds one,
    /// unliking removes one (never below zero). A copy already in the target
    /// state is returned unchanged.
    pub fn with_like(&self, liked: bool) -> Self {
        let mut next = self.clone();
        if next.liked_by_me == liked {
            return next;
        }
        next.liked_by_me = liked;
        next.like_count = if liked {
            next.like_count.saturating_add(1)
        } else {
            next.like_count.saturating_sub(1)
        };
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(likes: u32, liked: bool) -> FeedItem {
        let mut item = FeedItem::draft("Netology", "hello").with_id(1);
        item.like_count = likes;
        item.liked_by_me = liked;
        item
    }

    #[test]
    fn like_moves_both_fields() {
        let liked = item(3, false).with_like(true);
        assert!(liked.liked_by_me);
        assert_eq!(liked.like_count, 4);

        let unliked = liked.with_like(false);
        assert!(!unliked.liked_by_me);
        assert_eq!(unliked.like_count, 3);
    }

    #[test]
    fn like_in_target_state_is_noop() {
        assert_eq!(item(3, true).with_like(true), item(3, true));
        assert_eq!(item(0, false).with_like(false), item(0, false));
    }

    #[test]
    fn unlike_never_underflows() {
        let unliked = item(0, true).with_like(false);
        assert_eq!(unliked.like_count, 0);
        assert!(!unliked.liked_by_me);
    }

    #[test]
    fn ids_order_by_recency() {
        assert!(ItemId::new(5) > ItemId::new(2));
        assert!(ItemId::UNSAVED.is_unsaved());
        assert_eq!(ItemId::from(7).to_string(), "7");
    }
}
