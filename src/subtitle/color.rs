/// An RGB color parsed from `#RRGGBB` or `#RGB` notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl AssColor {
    pub const WHITE: AssColor = AssColor { r: 0xFF, g: 0xFF, b: 0xFF };
    pub const BLACK: AssColor = AssColor { r: 0x00, g: 0x00, b: 0x00 };

    /// Parse a hex color. The leading `#` is optional; 3-digit shorthand
    /// expands by doubling each digit.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }

        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_string(),
            _ => return None,
        };

        let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).ok();
        Some(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }

    /// `&HaaBBGGRR` with the given alpha byte (`00` is opaque in ASS).
    pub fn to_ass(self, alpha: u8) -> String {
        format!("&H{:02X}{:02X}{:02X}{:02X}", alpha, self.b, self.g, self.r)
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Convert a hex color to an opaque ASS color, `None` if the input is not a color.
pub fn hex_to_ass_color(hex: &str) -> Option<String> {
    AssColor::from_hex(hex).map(|c| c.to_ass(0x00))
}
