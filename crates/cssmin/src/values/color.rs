//! Color parsing and shortest-form rendering.
//!
//! Colors can be written as:
//!
//! - **Hex**: `#RGB`, `#RRGGBB`
//! - **RGB**: `rgb(r, g, b)`, `rgba(r, g, b, a)`
//! - **HSL**: `hsl(h, s%, l%)`, `hsla(h, s%, l%, a)`
//! - **Named**: CSS color names like `red`, `aliceblue`
//!
//! [`minify_color`] turns any of these into the shortest equivalent form.

use std::fmt;

use phf::phf_map;

use super::units::minify_number;

/// Error returned when color parsing fails.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorParseError {
    pub message: String,
}

impl fmt::Display for ColorParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ColorParseError {}

/// An opaque RGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Every CSS named color.
pub static NAMED_COLORS: phf::Map<&'static str, [u8; 3]> = phf_map! {
    "aliceblue" => [240, 248, 255],
    "antiquewhite" => [250, 235, 215],
    "aqua" => [0, 255, 255],
    "aquamarine" => [127, 255, 212],
    "azure" => [240, 255, 255],
    "beige" => [245, 245, 220],
    "bisque" => [255, 228, 196],
    "black" => [0, 0, 0],
    "blanchedalmond" => [255, 235, 205],
    "blue" => [0, 0, 255],
    "blueviolet" => [138, 43, 226],
    "brown" => [165, 42, 42],
    "burlywood" => [222, 184, 135],
    "cadetblue" => [95, 158, 160],
    "chartreuse" => [127, 255, 0],
    "chocolate" => [210, 105, 30],
    "coral" => [255, 127, 80],
    "cornflowerblue" => [100, 149, 237],
    "cornsilk" => [255, 248, 220],
    "crimson" => [220, 20, 60],
    "cyan" => [0, 255, 255],
    "darkblue" => [0, 0, 139],
    "darkcyan" => [0, 139, 139],
    "darkgoldenrod" => [184, 134, 11],
    "darkgray" => [169, 169, 169],
    "darkgreen" => [0, 100, 0],
    "darkgrey" => [169, 169, 169],
    "darkkhaki" => [189, 183, 107],
    "darkmagenta" => [139, 0, 139],
    "darkolivegreen" => [85, 107, 47],
    "darkorange" => [255, 140, 0],
    "darkorchid" => [153, 50, 204],
    "darkred" => [139, 0, 0],
    "darksalmon" => [233, 150, 122],
    "darkseagreen" => [143, 188, 143],
    "darkslateblue" => [72, 61, 139],
    "darkslategray" => [47, 79, 79],
    "darkslategrey" => [47, 79, 79],
    "darkturquoise" => [0, 206, 209],
    "darkviolet" => [148, 0, 211],
    "deeppink" => [255, 20, 147],
    "deepskyblue" => [0, 191, 255],
    "dimgray" => [105, 105, 105],
    "dimgrey" => [105, 105, 105],
    "dodgerblue" => [30, 144, 255],
    "firebrick" => [178, 34, 34],
    "floralwhite" => [255, 250, 240],
    "forestgreen" => [34, 139, 34],
    "fuchsia" => [255, 0, 255],
    "gainsboro" => [220, 220, 220],
    "ghostwhite" => [248, 248, 255],
    "gold" => [255, 215, 0],
    "goldenrod" => [218, 165, 32],
    "gray" => [128, 128, 128],
    "green" => [0, 128, 0],
    "greenyellow" => [173, 255, 47],
    "grey" => [128, 128, 128],
    "honeydew" => [240, 255, 240],
    "hotpink" => [255, 105, 180],
    "indianred" => [205, 92, 92],
    "indigo" => [75, 0, 130],
    "ivory" => [255, 255, 240],
    "khaki" => [240, 230, 140],
    "lavender" => [230, 230, 250],
    "lavenderblush" => [255, 240, 245],
    "lawngreen" => [124, 252, 0],
    "lemonchiffon" => [255, 250, 205],
    "lightblue" => [173, 216, 230],
    "lightcoral" => [240, 128, 128],
    "lightcyan" => [224, 255, 255],
    "lightgoldenrodyellow" => [250, 250, 210],
    "lightgray" => [211, 211, 211],
    "lightgreen" => [144, 238, 144],
    "lightgrey" => [211, 211, 211],
    "lightpink" => [255, 182, 193],
    "lightsalmon" => [255, 160, 122],
    "lightseagreen" => [32, 178, 170],
    "lightskyblue" => [135, 206, 250],
    "lightslategray" => [119, 136, 153],
    "lightslategrey" => [119, 136, 153],
    "lightsteelblue" => [176, 196, 222],
    "lightyellow" => [255, 255, 224],
    "lime" => [0, 255, 0],
    "limegreen" => [50, 205, 50],
    "linen" => [250, 240, 230],
    "magenta" => [255, 0, 255],
    "maroon" => [128, 0, 0],
    "mediumaquamarine" => [102, 205, 170],
    "mediumblue" => [0, 0, 205],
    "mediumorchid" => [186, 85, 211],
    "mediumpurple" => [147, 112, 219],
    "mediumseagreen" => [60, 179, 113],
    "mediumslateblue" => [123, 104, 238],
    "mediumspringgreen" => [0, 250, 154],
    "mediumturquoise" => [72, 209, 204],
    "mediumvioletred" => [199, 21, 133],
    "midnightblue" => [25, 25, 112],
    "mintcream" => [245, 255, 250],
    "mistyrose" => [255, 228, 225],
    "moccasin" => [255, 228, 181],
    "navajowhite" => [255, 222, 173],
    "navy" => [0, 0, 128],
    "oldlace" => [253, 245, 230],
    "olive" => [128, 128, 0],
    "olivedrab" => [107, 142, 35],
    "orange" => [255, 165, 0],
    "orangered" => [255, 69, 0],
    "orchid" => [218, 112, 214],
    "palegoldenrod" => [238, 232, 170],
    "palegreen" => [152, 251, 152],
    "paleturquoise" => [175, 238, 238],
    "palevioletred" => [219, 112, 147],
    "papayawhip" => [255, 239, 213],
    "peachpuff" => [255, 218, 185],
    "peru" => [205, 133, 63],
    "pink" => [255, 192, 203],
    "plum" => [221, 160, 221],
    "powderblue" => [176, 224, 230],
    "purple" => [128, 0, 128],
    "rebeccapurple" => [102, 51, 153],
    "red" => [255, 0, 0],
    "rosybrown" => [188, 143, 143],
    "royalblue" => [65, 105, 225],
    "saddlebrown" => [139, 69, 19],
    "salmon" => [250, 128, 114],
    "sandybrown" => [244, 164, 96],
    "seagreen" => [46, 139, 87],
    "seashell" => [255, 245, 238],
    "sienna" => [160, 82, 45],
    "silver" => [192, 192, 192],
    "skyblue" => [135, 206, 235],
    "slateblue" => [106, 90, 205],
    "slategray" => [112, 128, 144],
    "slategrey" => [112, 128, 144],
    "snow" => [255, 250, 250],
    "springgreen" => [0, 255, 127],
    "steelblue" => [70, 130, 180],
    "tan" => [210, 180, 140],
    "teal" => [0, 128, 128],
    "thistle" => [216, 191, 216],
    "tomato" => [255, 99, 71],
    "turquoise" => [64, 224, 208],
    "violet" => [238, 130, 238],
    "wheat" => [245, 222, 179],
    "white" => [255, 255, 255],
    "whitesmoke" => [245, 245, 245],
    "yellow" => [255, 255, 0],
    "yellowgreen" => [154, 205, 50],
};

/// Named colors shorter than their hex form, keyed by six-digit hex.
static SHORT_NAMES: phf::Map<&'static str, &'static str> = phf_map! {
    "#f0ffff" => "azure",
    "#f5f5dc" => "beige",
    "#ffe4c4" => "bisque",
    "#a52a2a" => "brown",
    "#ff7f50" => "coral",
    "#ffd700" => "gold",
    "#808080" => "gray",
    "#008000" => "green",
    "#4b0082" => "indigo",
    "#fffff0" => "ivory",
    "#f0e68c" => "khaki",
    "#faf0e6" => "linen",
    "#800000" => "maroon",
    "#000080" => "navy",
    "#808000" => "olive",
    "#ffa500" => "orange",
    "#da70d6" => "orchid",
    "#cd853f" => "peru",
    "#ffc0cb" => "pink",
    "#dda0dd" => "plum",
    "#800080" => "purple",
    "#ff0000" => "red",
    "#fa8072" => "salmon",
    "#a0522d" => "sienna",
    "#c0c0c0" => "silver",
    "#fffafa" => "snow",
    "#d2b48c" => "tan",
    "#008080" => "teal",
    "#ff6347" => "tomato",
    "#ee82ee" => "violet",
    "#f5deb3" => "wheat",
};

impl Rgb {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `#rrggbb`.
    pub fn long_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// The shortest of `#rgb`, `#rrggbb` and a named color.
    pub fn shortest(&self) -> String {
        let long = self.long_hex();
        if let Some(name) = SHORT_NAMES.get(long.as_str()) {
            return (*name).to_string();
        }

        let bytes = long.as_bytes();
        if bytes[1] == bytes[2] && bytes[3] == bytes[4] && bytes[5] == bytes[6] {
            format!("#{}{}{}", &long[1..2], &long[3..4], &long[5..6])
        } else {
            long
        }
    }

    fn parse_hex(hex: &str) -> Result<Self, ColorParseError> {
        let hex = hex.to_lowercase();
        let chars: Vec<char> = hex.chars().collect();

        match chars.len() {
            3 => {
                let r = Self::parse_hex_digit(chars[0])? * 17;
                let g = Self::parse_hex_digit(chars[1])? * 17;
                let b = Self::parse_hex_digit(chars[2])? * 17;
                Ok(Self::new(r, g, b))
            }
            6 => {
                let r = Self::parse_hex_pair(chars[0], chars[1])?;
                let g = Self::parse_hex_pair(chars[2], chars[3])?;
                let b = Self::parse_hex_pair(chars[4], chars[5])?;
                Ok(Self::new(r, g, b))
            }
            _ => Err(ColorParseError {
                message: format!("invalid hex color length: {}", chars.len()),
            }),
        }
    }

    fn parse_hex_digit(c: char) -> Result<u8, ColorParseError> {
        match c {
            '0'..='9' => Ok(c as u8 - b'0'),
            'a'..='f' => Ok(c as u8 - b'a' + 10),
            _ => Err(ColorParseError {
                message: format!("invalid hex digit: {}", c),
            }),
        }
    }

    fn parse_hex_pair(c1: char, c2: char) -> Result<u8, ColorParseError> {
        let high = Self::parse_hex_digit(c1)?;
        let low = Self::parse_hex_digit(c2)?;
        Ok(high * 16 + low)
    }

    /// Parses an `rgb()` channel: `0..255` or a percentage, clamped.
    fn parse_channel(s: &str) -> Result<u8, ColorParseError> {
        let invalid = || ColorParseError {
            message: format!("invalid channel: {}", s),
        };
        let value = match s.strip_suffix('%') {
            Some(percent) => percent.parse::<f64>().map_err(|_| invalid())? * 255.0 / 100.0,
            None => s.parse::<f64>().map_err(|_| invalid())?,
        };
        Ok(value.round().clamp(0.0, 255.0) as u8)
    }

    fn parse_percentage(s: &str) -> Result<f64, ColorParseError> {
        let s = s.trim_end_matches('%');
        let val: f64 = s.parse().map_err(|_| ColorParseError {
            message: format!("invalid percentage: {}", s),
        })?;
        Ok((val / 100.0).clamp(0.0, 1.0))
    }

    fn hsl_to_rgb(h: f64, s: f64, l: f64) -> Self {
        if s == 0.0 {
            let gray = (l * 255.0).round() as u8;
            return Self::new(gray, gray, gray);
        }

        let h = (h % 360.0 + 360.0) % 360.0 / 360.0;
        let q = if l < 0.5 {
            l * (1.0 + s)
        } else {
            l + s - l * s
        };
        let p = 2.0 * l - q;

        let r = Self::hue_to_rgb(p, q, h + 1.0 / 3.0);
        let g = Self::hue_to_rgb(p, q, h);
        let b = Self::hue_to_rgb(p, q, h - 1.0 / 3.0);

        Self::new(
            (r * 255.0).round() as u8,
            (g * 255.0).round() as u8,
            (b * 255.0).round() as u8,
        )
    }

    fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }

        if t < 1.0 / 6.0 {
            return p + (q - p) * 6.0 * t;
        }
        if t < 1.0 / 2.0 {
            return q;
        }
        if t < 2.0 / 3.0 {
            return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
        }
        p
    }
}

/// A color function split into its name and comma-separated arguments.
fn function_arguments(input: &str) -> Option<(String, Vec<&str>)> {
    let open = input.find('(')?;
    let inner = input[open + 1..].strip_suffix(')')?;
    let name = input[..open].to_ascii_lowercase();
    Some((name, inner.split(',').map(str::trim).collect()))
}

fn parse_alpha(s: &str) -> Option<f64> {
    match s.strip_suffix('%') {
        Some(percent) => percent.parse::<f64>().ok().map(|value| value / 100.0),
        None => s.parse().ok(),
    }
}

/// Returns the shortest equivalent of a single color word, or `None` when
/// `word` is not a color this module understands.
///
/// With `opacity` unset, `rgba()`/`hsla()` values are left untouched.
pub fn minify_color(word: &str, opacity: bool) -> Option<String> {
    if let Some(hex) = word.strip_prefix('#') {
        return Rgb::parse_hex(hex).ok().map(|rgb| rgb.shortest());
    }

    let lower = word.to_ascii_lowercase();
    if let Some(rgb) = NAMED_COLORS.get(lower.as_str()) {
        let hex = Rgb::new(rgb[0], rgb[1], rgb[2]).shortest();
        return Some(if hex.len() < lower.len() { hex } else { lower });
    }

    let (name, arguments) = function_arguments(word)?;
    match (name.as_str(), arguments.as_slice()) {
        ("rgb", [r, g, b]) => Some(parse_rgb(r, g, b)?.shortest()),
        ("hsl", [h, s, l]) => Some(parse_hsl(h, s, l)?.shortest()),
        ("rgba" | "hsla", [first, second, third, alpha]) if opacity => {
            let alpha = parse_alpha(alpha)?;
            let rgb = if name == "rgba" {
                parse_rgb(first, second, third)?
            } else {
                parse_hsl(first, second, third)?
            };
            if alpha >= 1.0 {
                Some(rgb.shortest())
            } else if alpha <= 0.0 && rgb == Rgb::new(0, 0, 0) {
                Some("transparent".to_string())
            } else {
                let channels = [first, second, third, &arguments[3]]
                    .iter()
                    .map(|argument| minify_argument(argument))
                    .collect::<Vec<_>>()
                    .join(",");
                Some(format!("{}({})", name, channels))
            }
        }
        _ => None,
    }
}

fn parse_rgb(r: &str, g: &str, b: &str) -> Option<Rgb> {
    Some(Rgb::new(
        Rgb::parse_channel(r).ok()?,
        Rgb::parse_channel(g).ok()?,
        Rgb::parse_channel(b).ok()?,
    ))
}

fn parse_hsl(h: &str, s: &str, l: &str) -> Option<Rgb> {
    let hue: f64 = h.trim_end_matches("deg").parse().ok()?;
    let saturation = Rgb::parse_percentage(s).ok()?;
    let lightness = Rgb::parse_percentage(l).ok()?;
    Some(Rgb::hsl_to_rgb(hue, saturation, lightness))
}

fn minify_argument(argument: &str) -> String {
    match argument.strip_suffix('%') {
        Some(number) if number.parse::<f64>().is_ok() => format!("{}%", minify_number(number)),
        _ if argument.parse::<f64>().is_ok() => minify_number(argument),
        _ => argument.to_string(),
    }
}

/// Whether a word is a color value (named, hex or color function).
pub fn is_color(word: &str) -> bool {
    let lower = word.to_ascii_lowercase();
    if lower == "transparent" || lower == "currentcolor" {
        return true;
    }
    if let Some(hex) = lower.strip_prefix('#') {
        return matches!(hex.len(), 3 | 4 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    NAMED_COLORS.contains_key(lower.as_str())
        || ["rgb(", "rgba(", "hsl(", "hsla("]
            .iter()
            .any(|prefix| lower.starts_with(prefix))
}
