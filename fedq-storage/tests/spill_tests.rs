use std::io::{Read, Write};

use fedq_storage::{LobStore, SpillConfig};

fn store_in(dir: &tempfile::TempDir, threshold: usize) -> LobStore {
    LobStore::new(
        SpillConfig::default()
            .with_memory_threshold(threshold)
            .with_temp_dir(dir.path()),
    )
}

fn spill_files(dir: &tempfile::TempDir) -> usize {
    std::fs::read_dir(dir.path()).unwrap().count()
}

#[test]
fn small_output_stays_in_memory() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir, 64);
    let mut sink = store.create_sink();
    sink.write_all(b"a,b,c").unwrap();
    assert!(!sink.is_spilled());

    let lob = sink.finish().unwrap();
    assert!(!lob.is_spilled());
    assert_eq!(lob.to_text().unwrap(), "a,b,c");
    assert_eq!(spill_files(&dir), 0);
}

#[test]
fn crossing_threshold_moves_to_disk_and_preserves_order() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir, 8);
    let mut sink = store.create_sink();
    for chunk in ["0123", "4567", "89ab", "cdef"] {
        sink.write_all(chunk.as_bytes()).unwrap();
    }
    assert!(sink.is_spilled());
    assert_eq!(sink.len(), 16);

    let lob = sink.finish().unwrap();
    assert!(lob.is_spilled());
    assert_eq!(lob.len(), 16);
    let mut text = String::new();
    lob.reader().unwrap().read_to_string(&mut text).unwrap();
    assert_eq!(text, "0123456789abcdef");

    let stats = store.stats();
    assert_eq!(stats.sinks_created, 1);
    assert_eq!(stats.sinks_spilled, 1);
    assert_eq!(stats.bytes_spilled, 16);
    assert_eq!(stats.handles_finished, 1);
}

#[test]
fn dropping_handles_releases_spill_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir, 2);

    let mut abandoned = store.create_sink();
    abandoned.write_all(b"abandoned output").unwrap();
    assert_eq!(spill_files(&dir), 1);
    drop(abandoned);
    assert_eq!(spill_files(&dir), 0);

    let mut sink = store.create_sink();
    sink.write_all(b"kept output").unwrap();
    let lob = sink.finish().unwrap();
    let shared = lob.clone();
    drop(lob);
    assert_eq!(spill_files(&dir), 1);
    assert_eq!(shared.to_text().unwrap(), "kept output");
    drop(shared);
    assert_eq!(spill_files(&dir), 0);
}

#[test]
fn missing_spill_directory_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("does-not-exist");
    let store = LobStore::new(
        SpillConfig::default()
            .with_memory_threshold(1)
            .with_temp_dir(missing),
    );
    let mut sink = store.create_sink();
    let err = sink.write_all(b"xyz").unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
}
