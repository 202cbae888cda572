// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试数据生成等功能
// ==========================================
#![allow(dead_code)]

use rusqlite::Connection;
use smart_bin_fleet::api::{BinApi, BinUpdateRequest, CreateBinRequest};
use smart_bin_fleet::app::AppState;
use smart_bin_fleet::config::AppConfig;
use smart_bin_fleet::db::Database;
use smart_bin_fleet::domain::Bin;
use std::error::Error;
use std::io::Write;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    Database::new(db_path.clone()).initialize()?;

    Ok((temp_file, db_path))
}

/// 创建已初始化的 Database 句柄
pub fn create_test_database() -> (NamedTempFile, Arc<Database>) {
    let (temp_file, db_path) = create_test_db().unwrap();
    (temp_file, Arc::new(Database::new(db_path)))
}

/// 创建完整的应用状态（不写演示数据，不启动模拟器）
pub fn create_test_state() -> (NamedTempFile, AppState) {
    let (temp_file, db_path) = create_test_db().unwrap();
    let state = AppState::new(AppConfig::for_db_path(db_path)).unwrap();
    (temp_file, state)
}

/// 打开一个不启用外键的原始连接（用于构造孤儿数据等异常场景）
pub fn open_raw_connection(db_path: &str) -> Connection {
    let conn = Connection::open(db_path).unwrap();
    conn.execute_batch("PRAGMA foreign_keys = OFF;").unwrap();
    conn
}

/// 创建请求构造
pub fn create_request(location: &str, district: &str, bin_type: &str) -> CreateBinRequest {
    CreateBinRequest {
        location: location.to_string(),
        district: district.to_string(),
        bin_type: Some(bin_type.to_string()),
        capacity_liters: None,
    }
}

/// 创建垃圾桶并设置填充率
pub fn create_bin_with_fill(
    api: &BinApi,
    location: &str,
    district: &str,
    bin_type: &str,
    fill: i32,
) -> Bin {
    let bin = api
        .create_bin(create_request(location, district, bin_type))
        .unwrap();
    api.update_bin(
        bin.id,
        BinUpdateRequest {
            current_fill_percentage: Some(fill),
            ..Default::default()
        },
    )
    .unwrap()
}

/// 收集日志输出的内存缓冲区
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// 在当前线程上以 DEBUG 级别执行 f，返回期间输出的全部日志
pub fn capture_logs<F: FnOnce()>(f: F) -> String {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    tracing::subscriber::with_default(subscriber, f);

    let bytes = buffer.0.lock().unwrap().clone();
    String::from_utf8_lossy(&bytes).into_owned()
}
