use super::*;

fn msg(sender: &str, content: &str) -> ChatMessage {
    ChatMessage::new(sender, content)
}

#[test]
fn new_transcript_is_empty_and_unseeded() {
    let t = Transcript::new();
    assert!(t.is_empty());
    assert!(!t.is_seeded());
    assert_eq!(t.history_len(), 0);
}

#[test]
fn seed_keeps_server_order() {
    let mut t = Transcript::new();
    let history = vec![msg("#111111", "a"), msg("#222222", "b"), msg("#333333", "c")];
    assert!(t.seed(history.clone()));
    assert_eq!(t.as_slice(), history.as_slice());
    assert_eq!(t.history_len(), 3);
}

#[test]
fn live_messages_follow_history() {
    let mut t = Transcript::new();
    t.seed(vec![msg("#111111", "old")]);
    t.push(msg("#222222", "new-1"));
    t.push(msg("#222222", "new-2"));
    let contents: Vec<&str> = t.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["old", "new-1", "new-2"]);
}

#[test]
fn late_history_is_placed_before_early_live_messages() {
    let mut t = Transcript::new();
    t.push(msg("#aaaaaa", "live-1"));
    t.push(msg("#bbbbbb", "live-2"));
    assert!(t.seed(vec![msg("#111111", "h1"), msg("#222222", "h2")]));

    let contents: Vec<&str> = t.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["h1", "h2", "live-1", "live-2"]);
    assert_eq!(t.history_len(), 2);
}

#[test]
fn second_seed_is_ignored() {
    let mut t = Transcript::new();
    assert!(t.seed(vec![msg("#111111", "first")]));
    assert!(!t.seed(vec![msg("#222222", "second")]));
    assert_eq!(t.len(), 1);
    assert_eq!(t.last().map(|m| m.content.as_str()), Some("first"));
}

#[test]
fn duplicates_are_kept() {
    let mut t = Transcript::new();
    t.seed(vec![msg("#111111", "same")]);
    t.push(msg("#111111", "same"));
    assert_eq!(t.len(), 2);
    assert_eq!((&t).into_iter().count(), 2);
}
