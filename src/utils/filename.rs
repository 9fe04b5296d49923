use chrono::{Datelike, Local};
use std::path::PathBuf;

/// Generate a dated output filename: `cattle-climate-{kind}-{YYMMDD}.{extension}`
pub fn generate_default_output_filename(kind: &str, extension: &str) -> PathBuf {
    let now = Local::now();
    let year = now.year() % 100; // Get last 2 digits of year
    let month = now.month();
    let day = now.day();

    let filename = format!(
        "cattle-climate-{}-{:02}{:02}{:02}.{}",
        kind, year, month, day, extension
    );
    PathBuf::from("output").join(filename)
}
