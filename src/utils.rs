//! Utility functions for research-assistant

use std::path::Path;
use std::time::Duration;

/// Get file extension from path, lowercased
pub fn get_file_extension<P: AsRef<Path>>(path: P) -> Option<String> {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Check if a path names a PDF document
pub fn is_pdf_file<P: AsRef<Path>>(path: P) -> bool {
    get_file_extension(path).as_deref() == Some("pdf")
}

/// First `max_chars` characters of `text`, with "..." appended
pub fn preview(text: &str, max_chars: usize) -> String {
    let head: String = text.chars().take(max_chars).collect();
    format!("{}...", head)
}

/// Format a duration as seconds with two decimals
pub fn format_seconds(duration: Duration) -> String {
    format!("{:.2} seconds", duration.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_extension() {
        assert_eq!(get_file_extension("test.pdf"), Some("pdf".to_string()));
        assert_eq!(get_file_extension("test.PDF"), Some("pdf".to_string()));
        assert_eq!(get_file_extension("test"), None);
        assert_eq!(get_file_extension("test.tar.gz"), Some("gz".to_string()));
    }

    #[test]
    fn test_pdf_detection() {
        assert!(is_pdf_file("paper.pdf"));
        assert!(is_pdf_file("/tmp/Report.PDF"));
        assert!(!is_pdf_file("notes.txt"));
        assert!(!is_pdf_file("pdf"));
    }

    #[test]
    fn test_preview_is_char_safe() {
        assert_eq!(preview("short", 100), "short...");
        assert_eq!(preview("ééééé", 3), "ééé...");
        assert_eq!(preview(&"x".repeat(150), 100).chars().count(), 103);
    }

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(Duration::from_millis(1234)), "1.23 seconds");
        assert_eq!(format_seconds(Duration::ZERO), "0.00 seconds");
    }
}
