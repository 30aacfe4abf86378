use serde_json::Map;

use super::*;

fn notification(id: u64, kind: NotificationKind, is_read: bool) -> Notification {
    Notification {
        id: RecordId::from(id),
        title: format!("n{id}"),
        message: String::new(),
        kind,
        timestamp: None,
        is_read,
        extra: Map::new(),
    }
}

fn inbox() -> NotificationsState {
    NotificationsState::new(vec![
        notification(1, NotificationKind::Emergency, false),
        notification(2, NotificationKind::Update, true),
        notification(3, NotificationKind::Reminder, false),
        notification(4, NotificationKind::Results, false),
        notification(5, NotificationKind::Emergency, true),
        notification(6, NotificationKind::Other, false),
    ])
}

#[test]
fn notifications_state_defaults() {
    let s = NotificationsState::default();
    assert!(s.items.is_empty());
    assert_eq!(s.unread_count(), 0);
}

#[test]
fn unread_counts() {
    let s = inbox();
    assert_eq!(s.unread_count(), 4);
    assert_eq!(s.emergency_unread_count(), 1);
    assert_eq!(s.count_of(NotificationKind::Emergency), 2);
}

#[test]
fn groups_split_by_kind_and_skip_other() {
    let s = inbox();
    let groups = s.groups();
    let ids = |list: &[&Notification]| list.iter().map(|n| n.id.to_string()).collect::<Vec<_>>();
    assert_eq!(ids(&groups.emergency), vec!["1", "5"]);
    assert_eq!(ids(&groups.updates), vec!["2"]);
    assert_eq!(ids(&groups.reminders), vec!["3"]);
    assert_eq!(ids(&groups.results), vec!["4"]);
}

#[test]
fn set_read_toggles_one() {
    let mut s = inbox();
    assert!(s.set_read(&RecordId::from(1), true));
    assert_eq!(s.emergency_unread_count(), 0);
    assert!(s.set_read(&RecordId::from(1), false));
    assert_eq!(s.emergency_unread_count(), 1);
    assert!(!s.set_read(&RecordId::from(99), true));
}

#[test]
fn mark_all_read_and_remove() {
    let mut s = inbox();
    s.mark_all_read();
    assert_eq!(s.unread_count(), 0);

    assert!(s.remove(&RecordId::from(3)));
    assert!(!s.remove(&RecordId::from(3)));
    assert_eq!(s.items.len(), 5);

    s.clear();
    assert!(s.items.is_empty());
}
