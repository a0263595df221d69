use crate::PaletteError;

/// An RGB color, each channel from 0 to 255
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const WHITE: Color = Color::new(255, 255, 255);
    pub const GREEN: Color = Color::new(0, 255, 0);
    pub const MAGENTA: Color = Color::new(255, 0, 255);
    pub const NEUTRAL_GRAY: Color = Color::new(128, 128, 128);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// ITU-R BT.709 luminance
    pub fn luminance(self) -> f64 {
        0.2126 * self.r as f64 + 0.7152 * self.g as f64 + 0.0722 * self.b as f64
    }

    /// Parse `#RRGGBB` or `RRGGBB`
    pub fn from_hex(text: &str) -> Result<Self, PaletteError> {
        let trimmed = text.trim();
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(PaletteError::InvalidHexColor(text.to_string()));
        }
        let channel = |start: usize| {
            u8::from_str_radix(&digits[start..start + 2], 16)
                .map_err(|_| PaletteError::InvalidHexColor(text.to_string()))
        };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    pub fn to_hsv(self) -> Hsv {
        rgb_to_hsv(self)
    }
}

impl From<[u8; 3]> for Color {
    fn from(value: [u8; 3]) -> Self {
        Self::new(value[0], value[1], value[2])
    }
}

impl From<Color> for [u8; 3] {
    fn from(value: Color) -> Self {
        value.to_array()
    }
}

/// Hue in degree from 0 to 360, saturation and value from 0 to 100
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Hsv {
    pub h: f64,
    pub s: f64,
    pub v: f64,
}

impl Hsv {
    pub fn new(h: f64, s: f64, v: f64) -> Self {
        Self { h, s, v }
    }

    /// Clamp all three components in their valid range
    pub fn clamped(self) -> Self {
        Self {
            h: self.h.clamp(0.0, 360.0),
            s: self.s.clamp(0.0, 100.0),
            v: self.v.clamp(0.0, 100.0),
        }
    }

    pub fn to_rgb(self) -> Color {
        hsv_to_rgb(self)
    }
}

pub fn rgb_to_hsv(color: Color) -> Hsv {
    let r = color.r as f64 / 255.0;
    let g = color.g as f64 / 255.0;
    let b = color.b as f64 / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let v = max * 100.0;
    if delta == 0.0 {
        return Hsv::new(0.0, 0.0, v);
    }
    let s = delta / max * 100.0;
    let h = if max == r {
        60.0 * ((g - b) / delta)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    Hsv::new(h.rem_euclid(360.0), s, v)
}

pub fn hsv_to_rgb(hsv: Hsv) -> Color {
    let hsv = hsv.clamped();
    let s = hsv.s / 100.0;
    let v = hsv.v / 100.0;
    let h = hsv.h.rem_euclid(360.0) / 60.0;
    let c = v * s;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let m = v - c;
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let to_byte = |channel: f64| ((channel + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    Color::new(to_byte(r), to_byte(g), to_byte(b))
}

#[cfg(test)]
mod tests {
    use crate::{hsv_to_rgb, rgb_to_hsv, Color, Hsv};

    #[test]
    fn test_hsv_primary_colors() {
        assert_eq!(hsv_to_rgb(Hsv::new(0.0, 100.0, 100.0)), Color::new(255, 0, 0));
        assert_eq!(hsv_to_rgb(Hsv::new(120.0, 100.0, 100.0)), Color::GREEN);
        assert_eq!(hsv_to_rgb(Hsv::new(300.0, 100.0, 100.0)), Color::MAGENTA);
        assert_eq!(hsv_to_rgb(Hsv::new(360.0, 100.0, 100.0)), Color::new(255, 0, 0));
        assert_eq!(hsv_to_rgb(Hsv::new(42.0, 0.0, 50.0)), Color::new(128, 128, 128));
    }

    #[test]
    fn test_hsv_round_trip() {
        for color in [
            Color::new(200, 100, 50),
            Color::new(12, 34, 56),
            Color::new(255, 255, 255),
            Color::new(0, 0, 0),
            Color::new(1, 254, 3),
        ] {
            assert_eq!(hsv_to_rgb(rgb_to_hsv(color)), color);
        }
        let hsv = rgb_to_hsv(Color::new(0, 0, 255));
        assert_eq!((hsv.h, hsv.s, hsv.v), (240.0, 100.0, 100.0));
    }

    #[test]
    fn test_hex() {
        assert_eq!(Color::from_hex("#FF8000").unwrap(), Color::new(255, 128, 0));
        assert_eq!(Color::from_hex("0a0B0c").unwrap(), Color::new(10, 11, 12));
        assert!(Color::from_hex("#FF80").is_err());
        assert!(Color::from_hex("zzzzzz").is_err());
        assert_eq!(Color::new(1, 2, 255).to_hex(), "#0102FF");
    }

    #[test]
    fn test_luminance() {
        assert!(Color::WHITE.luminance() > Color::GREEN.luminance());
        assert!(Color::GREEN.luminance() > Color::new(255, 0, 0).luminance());
        assert_eq!(Color::BLACK.luminance(), 0.0);
    }
}
