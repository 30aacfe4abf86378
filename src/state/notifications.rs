#[cfg(test)]
#[path = "notifications_test.rs"]
mod notifications_test;

use crate::api::types::{Notification, NotificationKind, RecordId};

/// Local copy of the notifications inbox.
#[derive(Clone, Debug, Default)]
pub struct NotificationsState {
    pub items: Vec<Notification>,
}

/// Inbox sections. Notifications of any other kind only show in the flat list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NotificationGroups<'a> {
    pub emergency: Vec<&'a Notification>,
    pub updates: Vec<&'a Notification>,
    pub reminders: Vec<&'a Notification>,
    pub results: Vec<&'a Notification>,
}

impl NotificationsState {
    #[must_use]
    pub fn new(items: Vec<Notification>) -> Self {
        Self { items }
    }

    #[must_use]
    pub fn unread_count(&self) -> usize {
        self.items.iter().filter(|n| !n.is_read).count()
    }

    #[must_use]
    pub fn emergency_unread_count(&self) -> usize {
        self.items.iter().filter(|n| n.kind == NotificationKind::Emergency && !n.is_read).count()
    }

    #[must_use]
    pub fn count_of(&self, kind: NotificationKind) -> usize {
        self.items.iter().filter(|n| n.kind == kind).count()
    }

    #[must_use]
    pub fn groups(&self) -> NotificationGroups<'_> {
        let mut groups = NotificationGroups::default();
        for n in &self.items {
            match n.kind {
                NotificationKind::Emergency => groups.emergency.push(n),
                NotificationKind::Update => groups.updates.push(n),
                NotificationKind::Reminder => groups.reminders.push(n),
                NotificationKind::Results => groups.results.push(n),
                NotificationKind::Other => {}
            }
        }
        groups
    }

    /// Returns false if no notification has `id`.
    pub fn set_read(&mut self, id: &RecordId, is_read: bool) -> bool {
        match self.items.iter_mut().find(|n| &n.id == id) {
            Some(n) => {
                n.is_read = is_read;
                true
            }
            None => false,
        }
    }

    pub fn mark_all_read(&mut self) {
        for n in &mut self.items {
            n.is_read = true;
        }
    }

    /// Returns false if no notification has `id`.
    pub fn remove(&mut self, id: &RecordId) -> bool {
        let before = self.items.len();
        self.items.retain(|n| &n.id != id);
        self.items.len() != before
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
