//! Contact storage test functions

use threadline_store_traits::MessageStore;
use threadline_store_traits::Resource;

use super::{RecordingObserver, create_test_contact};

/// Contacts are ordered by name ignoring case
pub fn test_contacts_ordering<S>(storage: S)
where
    S: MessageStore,
{
    storage
        .save_contact(create_test_contact(1, "bob", true), vec!["555-0002".into()])
        .unwrap();
    storage
        .save_contact(create_test_contact(2, "Alice", true), vec!["555-0001".into()])
        .unwrap();
    storage
        .save_contact(create_test_contact(3, "carol", false), vec![])
        .unwrap();

    let names: Vec<_> = storage
        .contacts()
        .unwrap()
        .into_iter()
        .map(|c| c.display_name)
        .collect();
    assert_eq!(names, vec!["Alice", "bob", "carol"]);
}

/// Numbers keep their order and are replaced on save
pub fn test_contact_numbers<S>(storage: S)
where
    S: MessageStore,
{
    storage
        .save_contact(
            create_test_contact(1, "Ada", true),
            vec!["555-0001".into(), "555-0002".into()],
        )
        .unwrap();
    assert_eq!(
        storage.contact_numbers(1).unwrap(),
        vec!["555-0001".to_string(), "555-0002".to_string()]
    );

    storage
        .save_contact(create_test_contact(1, "Ada L.", true), vec!["555-0003".into()])
        .unwrap();
    assert_eq!(
        storage.contact_numbers(1).unwrap(),
        vec!["555-0003".to_string()]
    );
    assert_eq!(storage.contacts().unwrap()[0].display_name, "Ada L.");
    assert_eq!(storage.contacts().unwrap().len(), 1);

    assert!(storage.contact_numbers(99).unwrap().is_empty());
}

/// Display names resolve by normalized number
pub fn test_lookup_display_name<S>(storage: S)
where
    S: MessageStore,
{
    storage
        .save_contact(create_test_contact(1, "Ada", true), vec!["(555) 000-1111".into()])
        .unwrap();

    assert_eq!(
        storage.lookup_display_name("5550001111").unwrap(),
        Some("Ada".to_string())
    );
    assert_eq!(storage.lookup_display_name("555-9999").unwrap(), None);
    assert_eq!(storage.lookup_display_name("").unwrap(), None);
}

/// Saving a contact notifies the contacts resource only
pub fn test_save_contact_notifies<S>(storage: S)
where
    S: MessageStore,
{
    let observer = RecordingObserver::new();
    storage.register_observer(observer.clone());

    storage
        .save_contact(create_test_contact(1, "Ada", true), vec![])
        .unwrap();
    assert_eq!(observer.take(), vec![Resource::Contacts]);
}
