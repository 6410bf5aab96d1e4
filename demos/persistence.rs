//! Write-through persistence: state survives container re-creation

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use statecell::{DiskStorage, PersistConfig, PersistentStateContainer, Storage};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct Settings {
    theme: String,
    volume: u8,
}

fn main() {
    println!("=== Persistence Example ===\n");

    let dir = std::env::temp_dir().join("statecell-demo");
    std::fs::create_dir_all(&dir).expect("create demo directory");
    let db_path = dir.join("settings.redb");

    let backend = DiskStorage::open(&db_path).expect("open storage");
    let container = PersistentStateContainer::with_config(
        "settings",
        Settings {
            theme: "light".to_string(),
            volume: 5,
        },
        PersistConfig {
            backend: Some(Arc::clone(&backend) as Arc<dyn Storage>),
            ..PersistConfig::default()
        },
    )
    .expect("construct container");

    // On the first run this prints the default; on later runs the state
    // rehydrated from disk.
    println!("current settings: {:?}", container.snapshot());

    println!("\nSwitching theme...");
    container
        .patch(|settings| {
            settings.theme = if settings.theme == "light" {
                "dark".to_string()
            } else {
                "light".to_string()
            };
        })
        .expect("persist settings");

    println!("saved settings: {:?}", container.snapshot());
    println!("\nRun this example again to see the state rehydrate.");
    container.complete();
}
