//! Keyed record map shared by the store implementations.

use crate::change_feed::ChangeKind;
use crate::item::PersistedItem;
use feedsync_protocol::{FeedItem, ItemId};
use std::collections::{BTreeMap, BTreeSet};

/// One record per identifier, ordered by identifier.
///
/// Mutators return the [`ChangeKind`] to announce, or `None` when nothing
/// changed.
#[derive(Debug, Default, Clone)]
pub(crate) struct Records {
    by_id: BTreeMap<ItemId, PersistedItem>,
}

impl Records {
    pub(crate) fn from_items(items: Vec<PersistedItem>) -> Self {
        let mut records = Self::default();
        records.upsert(items);
        records
    }

    /// Records with the given visibility, newest first.
    pub(crate) fn with_visibility(&self, hidden: bool) -> Vec<PersistedItem> {
        self.by_id
            .values()
            .rev()
            .filter(|r| r.hidden == hidden)
            .cloned()
            .collect()
    }

    /// All records, oldest first.
    pub(crate) fn all(&self) -> Vec<PersistedItem> {
        self.by_id.values().cloned().collect()
    }

    pub(crate) fn get(&self, id: ItemId) -> Option<PersistedItem> {
        self.by_id.get(&id).cloned()
    }

    pub(crate) fn hidden_count(&self) -> usize {
        self.by_id.values().filter(|r| r.hidden).count()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }

    pub(crate) fn upsert(&mut self, items: Vec<PersistedItem>) -> Option<ChangeKind> {
        if items.is_empty() {
            return None;
        }
        let ids = items.iter().map(PersistedItem::id).collect();
        for record in items {
            self.by_id.insert(record.id(), record);
        }
        Some(ChangeKind::Upserted { ids })
    }

    /// Writes `items` as visible and drops every other visible record.
    /// Hidden records not in `items` are left staged.
    pub(crate) fn replace_visible(&mut self, items: Vec<FeedItem>) -> (usize, Option<ChangeKind>) {
        let keep: BTreeSet<ItemId> = items.iter().map(|item| item.id).collect();
        let removed: Vec<ItemId> = self
            .by_id
            .values()
            .filter(|r| !r.hidden && !keep.contains(&r.id()))
            .map(PersistedItem::id)
            .collect();
        for id in &removed {
            self.by_id.remove(id);
        }
        if items.is_empty() && removed.is_empty() {
            return (0, None);
        }
        let ids = items.iter().map(|item| item.id).collect();
        for item in items {
            self.by_id.insert(item.id, PersistedItem::visible(item));
        }
        (removed.len(), Some(ChangeKind::Refreshed { ids, removed }))
    }

    /// Writes delta items as hidden. A record that is already visible keeps
    /// its visibility and only takes the new fields.
    ///
    /// Returns how many of the staged identifiers are hidden afterwards.
    pub(crate) fn stage(&mut self, items: Vec<FeedItem>) -> (usize, Option<ChangeKind>) {
        if items.is_empty() {
            return (0, None);
        }
        let mut ids = Vec::with_capacity(items.len());
        for item in items {
            let id = item.id;
            let hidden = self.by_id.get(&id).is_none_or(|r| r.hidden);
            self.by_id.insert(id, PersistedItem { item, hidden });
            ids.push(id);
        }
        ids.sort_unstable();
        ids.dedup();
        let hidden = ids
            .iter()
            .filter(|id| self.by_id.get(id).is_some_and(|r| r.hidden))
            .count();
        (hidden, Some(ChangeKind::Staged { ids }))
    }

    pub(crate) fn promote_all_hidden(&mut self) -> (usize, Option<ChangeKind>) {
        let mut count = 0;
        for record in self.by_id.values_mut().filter(|r| r.hidden) {
            record.hidden = false;
            count += 1;
        }
        if count == 0 {
            (0, None)
        } else {
            (count, Some(ChangeKind::Promoted { count }))
        }
    }

    pub(crate) fn delete(&mut self, id: ItemId) -> Option<ChangeKind> {
        self.by_id
            .remove(&id)
            .map(|_| ChangeKind::Deleted { id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: i64) -> FeedItem {
        FeedItem::draft("author", format!("item {id}")).with_id(id)
    }

    #[test]
    fn visible_is_newest_first() {
        let records = Records::from_items(vec![
            PersistedItem::visible(item(1)),
            PersistedItem::visible(item(3)),
            PersistedItem::hidden(item(4)),
            PersistedItem::visible(item(2)),
        ]);

        let ids: Vec<i64> = records
            .with_visibility(false)
            .iter()
            .map(|r| r.id().get())
            .collect();
        assert_eq!(ids, vec![3, 2, 1]);
        assert_eq!(records.hidden_count(), 1);
    }

    #[test]
    fn stage_keeps_visible_records_visible() {
        let mut records = Records::from_items(vec![PersistedItem::visible(item(1))]);

        let mut refreshed = item(1);
        refreshed.like_count = 9;
        let (hidden, change) = records.stage(vec![refreshed, item(2)]);

        assert_eq!(hidden, 1);
        assert_eq!(
            change,
            Some(ChangeKind::Staged {
                ids: vec![ItemId::new(1), ItemId::new(2)]
            })
        );
        let first = records.get(ItemId::new(1)).unwrap();
        assert!(!first.hidden);
        assert_eq!(first.item.like_count, 9);
        assert!(records.get(ItemId::new(2)).unwrap().hidden);
    }

    #[test]
    fn replace_visible_prunes_only_visible() {
        let mut records = Records::from_items(vec![
            PersistedItem::visible(item(1)),
            PersistedItem::visible(item(2)),
            PersistedItem::hidden(item(3)),
            PersistedItem::hidden(item(4)),
        ]);

        let (removed, change) = records.replace_visible(vec![item(2), item(4), item(5)]);

        assert_eq!(removed, 1);
        assert_eq!(
            change,
            Some(ChangeKind::Refreshed {
                ids: vec![ItemId::new(2), ItemId::new(4), ItemId::new(5)],
                removed: vec![ItemId::new(1)],
            })
        );
        let visible: Vec<i64> = records
            .with_visibility(false)
            .iter()
            .map(|r| r.id().get())
            .collect();
        assert_eq!(visible, vec![5, 4, 2]);
        assert!(records.get(ItemId::new(3)).unwrap().hidden);
    }

    #[test]
    fn empty_mutations_report_no_change() {
        let mut records = Records::default();
        assert!(records.upsert(vec![]).is_none());
        assert!(records.replace_visible(vec![]).1.is_none());
        assert!(records.stage(vec![]).1.is_none());
        assert!(records.promote_all_hidden().1.is_none());
        assert!(records.delete(ItemId::new(1)).is_none());
    }
}
