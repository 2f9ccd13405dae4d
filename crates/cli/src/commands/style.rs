//! Terminal styling for confmend reports.
//!
//! Only human-facing output goes through here; resolved text is written
//! untouched.

use console::Style;

/// `glyph msg` with the glyph coloured by `style`.
fn tagged(glyph: &str, style: Style, msg: &str) -> String {
    format!("{} {}", style.apply_to(glyph), msg)
}

/// Completed step, e.g. a file written.
pub fn success(msg: &str) -> String {
    tagged("✓", Style::new().green(), msg)
}

/// A finding or failure line.
pub fn error(msg: &str) -> String {
    tagged("✗", Style::new().red(), msg)
}

/// Something the user should look at, such as a dropped assignment.
pub fn warn(msg: &str) -> String {
    tagged("⚠", Style::new().yellow(), msg)
}

/// Section title above a table or list.
pub fn header(msg: &str) -> String {
    Style::new().bold().apply_to(msg).to_string()
}

pub fn dim(msg: &str) -> String {
    Style::new().dim().apply_to(msg).to_string()
}

/// Label for how a region was resolved: ours (blue), theirs (magenta),
/// merged (cyan).
pub fn resolution(label: &str) -> String {
    let style = match label {
        "ours" => Style::new().blue(),
        "theirs" => Style::new().magenta(),
        _ => Style::new().cyan(),
    };
    style.bold().apply_to(label).to_string()
}
