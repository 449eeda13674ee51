//! Concurrent access to the reading store.

use glove_monitor::{FingerId, ReadingStore};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

#[test]
fn test_disjoint_writers_never_interfere() {
    let store = Arc::new(ReadingStore::new());

    let writers: Vec<_> = FingerId::ALL
        .into_iter()
        .map(|finger| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for step in 0..=1000u16 {
                    store.set(finger, step + finger.ordinal() as u16);
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }

    for finger in FingerId::ALL {
        assert_eq!(store.get(finger), 1000 + finger.ordinal() as u16);
    }
}

#[test]
fn test_readers_see_whole_values() {
    let store = Arc::new(ReadingStore::new());
    let writer = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for _ in 0..5000 {
                store.set(FingerId::LeftRing, 0x0fff);
                store.set(FingerId::LeftRing, 0x0100);
            }
        })
    };

    for _ in 0..5000 {
        let value = store.get(FingerId::LeftRing);
        assert!(matches!(value, 0 | 0x0100 | 0x0fff), "torn value {:#x}", value);
    }
    writer.join().unwrap();
}

#[test]
fn test_repeated_writes_still_notify() {
    let store = ReadingStore::new();
    let notified = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&notified);
    store.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    store.set(FingerId::RightMiddle, 77);
    store.set(FingerId::RightMiddle, 77);

    assert_eq!(store.get(FingerId::RightMiddle), 77);
    assert_eq!(notified.load(Ordering::SeqCst), 2);
}
