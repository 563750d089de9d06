pub mod connection;
pub mod migrations;

use chrono::{Local, NaiveDateTime};

/// Format kolom waktu yang ditulis aplikasi (waktu lokal).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_timestamp(dt: NaiveDateTime) -> String {
    dt.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).ok()
}

pub fn now_timestamp() -> String {
    format_timestamp(Local::now().naive_local())
}
