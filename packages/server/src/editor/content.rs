use std::path::Path;

const SNIFF_LEN: usize = 8000;

/// Whether `contents` must be refused by the text editor: a NUL byte near
/// the start, or anything that is not UTF-8.
pub fn is_binary(contents: &[u8]) -> bool {
    contents[..contents.len().min(SNIFF_LEN)].contains(&0) || std::str::from_utf8(contents).is_err()
}

/// Ace editor mode for a file name, by extension.
pub fn ace_mode(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("json") => "ace/mode/json",
        Some("html" | "htm" | "mustache") => "ace/mode/html",
        Some("py") => "ace/mode/python",
        Some("js" | "mjs" | "cjs") => "ace/mode/javascript",
        Some("ts") => "ace/mode/typescript",
        Some("css") => "ace/mode/css",
        Some("md") => "ace/mode/markdown",
        Some("c" | "h" | "cc" | "cpp" | "hpp") => "ace/mode/c_cpp",
        Some("java") => "ace/mode/java",
        Some("r") => "ace/mode/r",
        Some("rs") => "ace/mode/rust",
        Some("sh") => "ace/mode/sh",
        Some("sql") => "ace/mode/sql",
        Some("yml" | "yaml") => "ace/mode/yaml",
        Some("tex") => "ace/mode/latex",
        Some("xml") => "ace/mode/xml",
        _ => "ace/mode/text",
    }
}
