use pinboard_core::layout::{ViewStateCache, PLACEMENT_PADDING, TILT_CHOICES, VIEW_STATE_KEY};
use pinboard_core::{BoardSize, KvStore, MemoryKvStore, ViewProps};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

const BOARD: BoardSize = BoardSize {
    width: 1000.0,
    height: 700.0,
};

#[test]
fn set_then_get_returns_stored_values() {
    let kv = Arc::new(MemoryKvStore::new());
    let mut cache = ViewStateCache::load(kv).unwrap();
    let mut rng = StdRng::seed_from_u64(1);
    let stored = ViewProps {
        x: 123.5,
        y: 77.25,
        tilt: -4.5,
    };

    cache.set("note-1", stored).unwrap();
    assert_eq!(cache.get("note-1", BOARD, &mut rng).unwrap(), stored);
}

#[test]
fn get_creates_once_and_reuses_entry() {
    let kv = Arc::new(MemoryKvStore::new());
    let mut cache = ViewStateCache::load(kv.clone()).unwrap();
    let mut rng = StdRng::seed_from_u64(2);

    let first = cache.get("note-1", BOARD, &mut rng).unwrap();
    let second = cache.get("note-1", BOARD, &mut rng).unwrap();
    assert_eq!(first, second);
    assert!(TILT_CHOICES.contains(&first.tilt));
    assert!(first.x >= PLACEMENT_PADDING && first.x <= BOARD.width - 240.0 - PLACEMENT_PADDING);
    assert!(first.y >= PLACEMENT_PADDING && first.y <= BOARD.height - 170.0 - PLACEMENT_PADDING);

    let reloaded = ViewStateCache::load(kv).unwrap();
    assert_eq!(reloaded.peek("note-1"), Some(first));
}

#[test]
fn clear_drops_entries_and_persisted_map() {
    let kv = Arc::new(MemoryKvStore::new());
    let mut cache = ViewStateCache::load(kv.clone()).unwrap();
    let mut rng = StdRng::seed_from_u64(3);
    cache.get("a", BOARD, &mut rng).unwrap();
    cache.get("b", BOARD, &mut rng).unwrap();
    assert_eq!(cache.len(), 2);

    cache.clear().unwrap();
    assert!(cache.is_empty());
    assert_eq!(kv.get(VIEW_STATE_KEY).unwrap(), None);
}

#[test]
fn corrupt_persisted_map_starts_empty() {
    let kv = Arc::new(MemoryKvStore::new());
    kv.set(VIEW_STATE_KEY, "[1, 2, 3").unwrap();
    let cache = ViewStateCache::load(kv).unwrap();
    assert!(cache.is_empty());
}
