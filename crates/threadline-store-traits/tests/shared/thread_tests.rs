//! Thread and SMS storage test functions

use threadline_store_traits::MessageStore;
use threadline_store_traits::Resource;
use threadline_store_traits::sms::types::SmsKind;

use super::{RecordingObserver, received, sent};

/// Threads list newest activity first and derive snippet and read flag
pub fn test_threads_newest_first<S>(storage: S)
where
    S: MessageStore,
{
    assert!(storage.threads().unwrap().is_empty());

    let a = storage.insert_message(received("555-0001", "old", 100)).unwrap();
    let b = storage.insert_message(sent("555-0002", "middle", 200)).unwrap();
    let a2 = storage.insert_message(sent("555-0001", "newest", 300)).unwrap();
    assert_eq!(a.thread_id, a2.thread_id);
    assert_ne!(a.thread_id, b.thread_id);

    let threads = storage.threads().unwrap();
    assert_eq!(threads.len(), 2);
    assert_eq!(threads[0].id, a.thread_id);
    assert_eq!(threads[0].snippet.as_deref(), Some("newest"));
    assert_eq!(threads[0].date_ms, 300);
    // The received message is still unread.
    assert_eq!(threads[0].read, Some(false));
    assert_eq!(threads[1].id, b.thread_id);
    assert_eq!(threads[1].read, Some(true));
}

/// Equal dates resolve to the later insert
pub fn test_thread_snippet_tie_break<S>(storage: S)
where
    S: MessageStore,
{
    storage.insert_message(sent("555-0001", "first", 100)).unwrap();
    storage.insert_message(sent("555-0001", "second", 100)).unwrap();

    let threads = storage.threads().unwrap();
    assert_eq!(threads[0].snippet.as_deref(), Some("second"));
}

/// Messages come back ascending and scoped to their thread
pub fn test_messages_in_thread_ordering<S>(storage: S)
where
    S: MessageStore,
{
    let late = storage.insert_message(received("555-0001", "late", 500)).unwrap();
    storage.insert_message(sent("555-0009", "other thread", 50)).unwrap();
    storage.insert_message(sent("555-0001", "early", 10)).unwrap();

    let messages = storage.messages_in_thread(late.thread_id).unwrap();
    let bodies: Vec<_> = messages.iter().map(|m| m.body.clone().unwrap()).collect();
    assert_eq!(bodies, vec!["early", "late"]);
    assert!(messages.iter().all(|m| m.thread_id == late.thread_id));
    assert_eq!(messages[1].kind, SmsKind::Inbox);
    assert_eq!(messages[0].kind, SmsKind::Sent);

    assert!(storage.messages_in_thread(9999).unwrap().is_empty());
}

/// Get-or-create matches formatted and unformatted numbers
pub fn test_thread_id_for_address<S>(storage: S)
where
    S: MessageStore,
{
    let observer = RecordingObserver::new();
    storage.register_observer(observer.clone());

    let id = storage.thread_id_for_address("555-1234").unwrap();
    assert_eq!(observer.take(), vec![Resource::Threads]);

    assert_eq!(storage.thread_id_for_address("5551234").unwrap(), id);
    assert_eq!(storage.thread_id_for_address(" 555 1234 ").unwrap(), id);
    assert!(observer.take().is_empty());

    let record = storage.insert_message(sent("555-1234", "hi", 1)).unwrap();
    assert_eq!(record.thread_id, id);

    assert!(storage.thread_id_for_address("   ").is_err());
}

/// A thread created without messages is not listed
pub fn test_empty_thread_not_listed<S>(storage: S)
where
    S: MessageStore,
{
    storage.thread_id_for_address("555-7777").unwrap();
    assert!(storage.threads().unwrap().is_empty());
}

/// Marking read is idempotent and only notifies on change
pub fn test_mark_thread_read<S>(storage: S)
where
    S: MessageStore,
{
    let first = storage.insert_message(received("555-0001", "one", 1)).unwrap();
    storage.insert_message(received("555-0001", "two", 2)).unwrap();

    let observer = RecordingObserver::new();
    storage.register_observer(observer.clone());

    assert_eq!(storage.mark_thread_read(first.thread_id).unwrap(), 2);
    assert_eq!(
        observer.take(),
        vec![Resource::Messages, Resource::Threads]
    );
    assert!(
        storage
            .messages_in_thread(first.thread_id)
            .unwrap()
            .iter()
            .all(|m| m.read == Some(true))
    );
    assert_eq!(storage.threads().unwrap()[0].read, Some(true));

    assert_eq!(storage.mark_thread_read(first.thread_id).unwrap(), 0);
    assert_eq!(storage.mark_thread_read(424242).unwrap(), 0);
    assert!(observer.take().is_empty());
}

/// Addresses are reported per message, in insertion order
pub fn test_thread_addresses<S>(storage: S)
where
    S: MessageStore,
{
    let first = storage.insert_message(received("555-0001", "a", 1)).unwrap();
    storage.insert_message(sent("5550001", "b", 2)).unwrap();

    let addresses = storage.thread_addresses(first.thread_id).unwrap();
    assert_eq!(addresses, vec!["555-0001".to_string(), "5550001".to_string()]);
    assert!(storage.thread_addresses(9999).unwrap().is_empty());
}

/// Inserts notify messages and threads
pub fn test_insert_notifies<S>(storage: S)
where
    S: MessageStore,
{
    let observer = RecordingObserver::new();
    storage.register_observer(observer.clone());

    storage.insert_message(sent("555-0001", "a", 1)).unwrap();
    assert_eq!(
        observer.take(),
        vec![Resource::Messages, Resource::Threads]
    );

    assert!(storage.insert_message(sent("", "nobody", 2)).is_err());
    assert!(observer.take().is_empty());
}
