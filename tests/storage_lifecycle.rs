use std::fs;
use stowdb::layout::StorageLayout;
use stowdb::manager::DatabaseManager;
use stowdb::model::StorageMode::{Device, External};
use stowdb::update::SqliteHeaderEngine;
use tempfile::TempDir;

fn new_manager(temp: &TempDir) -> DatabaseManager<SqliteHeaderEngine> {
    let layout = StorageLayout::new(temp.path().join("device"), temp.path().join("external"));
    layout.ensure_root(Device).unwrap();
    layout.ensure_root(External).unwrap();
    DatabaseManager::new(layout, SqliteHeaderEngine).unwrap()
}

#[test]
fn transfer_moves_every_recognized_file_with_identical_content() {
    let temp = TempDir::new().unwrap();
    let mut manager = new_manager(&temp);
    let layout = manager.layout().clone();

    let contents: Vec<(String, Vec<u8>)> = (0..5)
        .map(|i| {
            let name = format!("db{}", i);
            let bytes: Vec<u8> = (0..2048u32).map(|b| (b as u8).wrapping_mul(i + 1)).collect();
            fs::write(layout.database_path(Device, &name), &bytes).unwrap();
            (name, bytes)
        })
        .collect();

    manager.set_storage_mode(External).unwrap();

    for (name, bytes) in &contents {
        assert!(!layout.database_path(Device, name).exists());
        assert_eq!(&fs::read(layout.database_path(External, name)).unwrap(), bytes);
    }
    assert!(manager.last_transfer_success().unwrap());
}

#[test]
fn mode_and_transfer_outcome_survive_restart() {
    let temp = TempDir::new().unwrap();

    {
        let mut manager = new_manager(&temp);
        fs::write(
            manager.layout().database_path(Device, "comics"),
            b"issue #1",
        )
        .unwrap();
        manager.set_storage_mode(External).unwrap();
    }

    // A fresh process picks up where the old one left off.
    let mut manager = new_manager(&temp);
    assert_eq!(manager.reload_storage_mode().unwrap(), External);
    assert!(manager.last_transfer_success().unwrap());
    assert!(manager.database_exists("comics"));
}

#[test]
fn checksum_follows_the_database_across_a_mode_switch() {
    let temp = TempDir::new().unwrap();
    let mut manager = new_manager(&temp);
    let db = manager.database_file("comics", true).unwrap();
    fs::write(&db, b"issue #1").unwrap();
    let stored = manager.store_checksum("comics").unwrap().unwrap();

    manager.set_storage_mode(External).unwrap();

    // Sidecar moved with the primary and still verifies.
    assert_eq!(manager.load_checksum("comics").unwrap().unwrap(), stored);
    assert!(manager.verify_integrity("comics").unwrap().is_verified());
}

#[test]
fn switching_back_and_forth_round_trips_the_file_set() {
    let temp = TempDir::new().unwrap();
    let mut manager = new_manager(&temp);
    let layout = manager.layout().clone();
    fs::write(layout.database_path(Device, "comics"), b"issue #1").unwrap();

    manager.set_storage_mode(External).unwrap();
    manager.set_storage_mode(Device).unwrap();

    assert_eq!(manager.storage_mode(), Device);
    assert_eq!(
        fs::read(layout.database_path(Device, "comics")).unwrap(),
        b"issue #1"
    );
    assert!(!layout.database_path(External, "comics").exists());
}
