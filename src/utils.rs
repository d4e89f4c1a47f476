// ABOUTME: Utility functions for identifier handling and reporting
// ABOUTME: Provides quoting, sanitizing, and human-readable size/duration formatting

use std::time::Duration;

/// Quote an identifier with SQL Server brackets
///
/// Closing brackets inside the identifier are doubled so the name cannot
/// break out of the quoted form.
///
/// # Examples
///
/// ```
/// # use sqldatadump::utils::quote_identifier;
/// assert_eq!(quote_identifier("Order Details"), "[Order Details]");
/// assert_eq!(quote_identifier("odd]name"), "[odd]]name]");
/// ```
pub fn quote_identifier(identifier: &str) -> String {
    format!("[{}]", identifier.replace(']', "]]"))
}

/// Sanitize an identifier (table name, schema name, etc.) for display
///
/// Removes control characters and limits length to prevent log injection attacks
/// and ensure readable error messages.
///
/// **Note**: This is for display purposes only. For SQL safety, use
/// [`quote_identifier`].
///
/// # Examples
///
/// ```
/// # use sqldatadump::utils::sanitize_identifier;
/// assert_eq!(sanitize_identifier("normal_table"), "normal_table");
/// assert_eq!(sanitize_identifier("table\x00name"), "tablename");
/// assert_eq!(sanitize_identifier("table\nname"), "tablename");
///
/// // Length limit
/// let long_name = "a".repeat(200);
/// assert_eq!(sanitize_identifier(&long_name).len(), 100);
/// ```
pub fn sanitize_identifier(identifier: &str) -> String {
    identifier
        .chars()
        .filter(|c| !c.is_control())
        .take(100)
        .collect()
}

/// Make an identifier usable as part of a file name
///
/// Path separators, characters Windows refuses in file names, and control
/// characters become underscores. Everything else is kept as is.
pub fn sanitize_file_component(component: &str) -> String {
    component
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Format bytes into human-readable format
///
/// # Examples
///
/// ```
/// # use sqldatadump::utils::format_bytes;
/// assert_eq!(format_bytes(1024), "1.0 KB");
/// assert_eq!(format_bytes(1_572_864), "1.5 MB");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    format!("{:.1} {}", size, UNITS[unit])
}

/// Format an elapsed phase duration for progress logs
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();

    if millis < 1000 {
        format!("{}ms", millis)
    } else if millis < 60_000 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m{:02}s", secs / 60, secs % 60)
    }
}
