//! Toolbar control values.

use crate::surface::Command;

/// Command for a heading button's `data-heading` value.
///
/// `"paragraph"` resets to a paragraph; `"1"` to `"6"` toggle that heading
/// level. Anything else is ignored.
pub fn parse_heading_control(value: &str) -> Option<Command> {
    let value = value.trim();
    if value == "paragraph" {
        return Some(Command::SetParagraph);
    }
    match value.parse::<u8>() {
        Ok(level @ 1..=6) => Some(Command::ToggleHeading { level }),
        _ => {
            tracing::debug!(value, "unrecognized heading control");
            None
        }
    }
}
