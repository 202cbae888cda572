use chrono::Local;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::error::Error;
use std::fs;
use std::path::Path;

use smart_bin_fleet::app::seed_demo_data;
use smart_bin_fleet::config::get_default_db_path;
use smart_bin_fleet::db::Database;

// 用法: reset_and_seed_demo_db [db_path] [rng_seed]
fn main() -> Result<(), Box<dyn Error>> {
    smart_bin_fleet::logging::init();

    let db_path = std::env::args().nth(1).unwrap_or_else(get_default_db_path);
    let seed = std::env::args().nth(2).and_then(|s| s.parse::<u64>().ok());

    backup_and_reset_db(&db_path)?;

    let db = Database::new(db_path.clone());
    db.initialize()?;

    let mut rng = match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    let report = seed_demo_data(&db, &mut rng)?;

    println!(
        "Seeded {}: {} bins, {} schedules",
        db_path, report.bins, report.schedules
    );
    Ok(())
}

fn backup_and_reset_db(db_path: &str) -> Result<(), Box<dyn Error>> {
    let path = Path::new(db_path);
    if !path.exists() {
        return Ok(());
    }

    let ts = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let backup_path = format!("{}.bak.{}", db_path, ts);
    fs::copy(path, &backup_path)?;
    fs::remove_file(path)?;

    // WAL 模式遗留的辅助文件
    for suffix in ["-wal", "-shm"] {
        let aux = format!("{}{}", db_path, suffix);
        if Path::new(&aux).exists() {
            fs::remove_file(&aux)?;
        }
    }

    eprintln!("Backed up {} -> {}", db_path, backup_path);
    Ok(())
}
