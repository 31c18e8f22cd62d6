//! Colour helpers for sender tags and the ambient accent.
//!
//! Colours arrive unvalidated on the wire; they are only parsed here, on use.

/// Perceived-luminance threshold below which a colour counts as dark.
pub const DARK_LUMINANCE_THRESHOLD: f64 = 128.0;

/// Parse `#RGB` or `#RRGGBB` values into RGB channels.
#[must_use]
pub fn parse_hex_rgb(raw: &str) -> Option<(u8, u8, u8)> {
    let hex = raw.trim().strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    match hex.len() {
        3 => {
            let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()?;
            let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()?;
            let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()?;
            Some((r, g, b))
        }
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some((r, g, b))
        }
        _ => None,
    }
}

/// Perceived luminance in `0.0..=255.0`.
#[must_use]
pub fn luminance((r, g, b): (u8, u8, u8)) -> f64 {
    0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b)
}

/// Whether a colour is dark enough to need light text on top of it.
///
/// Returns `None` when the colour cannot be parsed.
#[must_use]
pub fn is_dark(raw: &str) -> Option<bool> {
    parse_hex_rgb(raw).map(|rgb| luminance(rgb) < DARK_LUMINANCE_THRESHOLD)
}

#[cfg(test)]
#[path = "color_test.rs"]
mod tests;
