//! Icon name -> glyph mapping for the bundled icon font.
//!
//! Names follow the Material Design Icons catalogue. Unknown names resolve to
//! [`MISSING_GLYPH`], a box, so a typo shows up on screen rather than failing
//! the frame.

use tracing::warn;

/// Glyph rendered for unknown icon names.
pub const MISSING_GLYPH: char = '\u{25A1}';

/// `(name, codepoint)` pairs sorted by name.
static ICONS: &[(&str, u32)] = &[
    ("account", 0xF0004),
    ("account-circle", 0xF0009),
    ("alert", 0xF0026),
    ("alert-circle", 0xF0028),
    ("alert-circle-outline", 0xF05D6),
    ("android", 0xF0032),
    ("apple", 0xF0035),
    ("arrow-down", 0xF0045),
    ("arrow-left", 0xF004D),
    ("arrow-right", 0xF0054),
    ("arrow-up", 0xF005D),
    ("bell", 0xF009A),
    ("bell-outline", 0xF009C),
    ("blank", 0xF68C),
    ("bookmark", 0xF00C0),
    ("bookmark-outline", 0xF00C3),
    ("calendar", 0xF00ED),
    ("calendar-month", 0xF0E17),
    ("camera", 0xF0100),
    ("cart", 0xF0110),
    ("check", 0xF012C),
    ("check-circle", 0xF05E0),
    ("checkbox-blank-outline", 0xF0131),
    ("checkbox-marked", 0xF0132),
    ("chevron-down", 0xF0140),
    ("chevron-left", 0xF0141),
    ("chevron-right", 0xF0142),
    ("chevron-up", 0xF0143),
    ("clock-outline", 0xF0150),
    ("close", 0xF0156),
    ("close-circle", 0xF0159),
    ("cloud", 0xF015F),
    ("cog", 0xF0493),
    ("content-copy", 0xF018F),
    ("delete", 0xF01B4),
    ("dots-horizontal", 0xF01D8),
    ("dots-vertical", 0xF01D9),
    ("download", 0xF01DA),
    ("email", 0xF01EE),
    ("email-outline", 0xF01F0),
    ("eye", 0xF0208),
    ("eye-off", 0xF0209),
    ("file", 0xF0214),
    ("filter-variant", 0xF0236),
    ("folder", 0xF024B),
    ("format-list-bulleted", 0xF0279),
    ("gesture-tap", 0xF0741),
    ("github", 0xF02A4),
    ("heart", 0xF02D1),
    ("heart-outline", 0xF02D5),
    ("help-circle", 0xF02D7),
    ("home", 0xF02DC),
    ("home-outline", 0xF06A1),
    ("image", 0xF02E9),
    ("information", 0xF02FC),
    ("information-outline", 0xF02FD),
    ("language-python", 0xF0320),
    ("language-rust", 0xF1617),
    ("lock", 0xF033E),
    ("magnify", 0xF0349),
    ("map-marker", 0xF034E),
    ("menu", 0xF035C),
    ("menu-down", 0xF035D),
    ("message", 0xF0361),
    ("microphone", 0xF036C),
    ("minus", 0xF0374),
    ("numeric-1", 0xF0B3A),
    ("numeric-10", 0xF0FE9),
    ("numeric-2", 0xF0B3B),
    ("numeric-3", 0xF0B3C),
    ("numeric-4", 0xF0B3D),
    ("numeric-5", 0xF0B3E),
    ("numeric-6", 0xF0B3F),
    ("numeric-7", 0xF0B40),
    ("numeric-8", 0xF0B41),
    ("numeric-9", 0xF0B42),
    ("numeric-9-plus", 0xF0FEE),
    ("pencil", 0xF03EB),
    ("phone", 0xF03F2),
    ("play", 0xF040A),
    ("plus", 0xF0415),
    ("radiobox-blank", 0xF043D),
    ("radiobox-marked", 0xF043E),
    ("refresh", 0xF0450),
    ("send", 0xF048A),
    ("share-variant", 0xF0497),
    ("star", 0xF04CE),
    ("star-outline", 0xF04D2),
    ("theme-light-dark", 0xF050E),
    ("upload", 0xF0552),
    ("weather-night", 0xF0594),
    ("white-balance-sunny", 0xF05A8),
];

/// Glyph for `name`, if the catalogue has it.
pub fn glyph(name: &str) -> Option<char> {
    ICONS
        .binary_search_by(|(n, _)| n.cmp(&name))
        .ok()
        .and_then(|i| char::from_u32(ICONS[i].1))
}

/// Glyph for `name`, or [`MISSING_GLYPH`] with a warning.
pub fn glyph_or_box(name: &str) -> char {
    glyph(name).unwrap_or_else(|| {
        warn!(icon = name, "unknown icon name, rendering box");
        MISSING_GLYPH
    })
}

/// Every known icon name in sorted order.
pub fn icon_names() -> impl Iterator<Item = &'static str> {
    ICONS.iter().map(|(n, _)| *n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_is_sorted() {
        assert!(ICONS.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn known_and_unknown_names() {
        assert_eq!(glyph("android"), char::from_u32(0xF0032));
        assert!(glyph("numeric-10").is_some());
        assert_eq!(glyph_or_box("not-an-icon"), MISSING_GLYPH);
    }
}
