//! Schedule and vaccination reports with JSON and CSV output.

mod schedule;
mod vaccinations;

pub use schedule::*;
pub use vaccinations::*;

/// Quote a CSV field when it contains a separator, quote or line break.
fn escape_csv(s: &str) -> String {
    if s.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
