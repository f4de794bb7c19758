//! Color ramps and multi-stop interpolation.

use serde::{Deserialize, Serialize};

/// RGB color with channels in 0..=255.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `#rrggbb`
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// A color stop: position in [0, 1] mapped to an RGB color.
#[derive(Debug, Clone, Copy)]
pub struct ColorStop {
    pub t: f64,
    pub color: Rgb,
}

impl ColorStop {
    pub const fn new(t: f64, r: u8, g: u8, b: u8) -> Self {
        Self {
            t,
            color: Rgb::new(r, g, b),
        }
    }
}

/// Available color ramps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorScheme {
    /// Diverging red -> pale yellow -> green (ColorBrewer RdYlGn)
    #[serde(rename = "RdYlGn")]
    RdYlGn,
    /// Diverging brown -> grey -> blue-green (ColorBrewer BrBG)
    #[serde(rename = "BrBG")]
    BrBG,
    /// Pure red -> yellow -> green, the annual NDVI ramp
    #[serde(rename = "red-yellow-green")]
    RedYellowGreen,
    /// Brown -> white -> blue, the annual NDWI ramp
    #[serde(rename = "brown-white-blue")]
    BrownWhiteBlue,
    #[serde(rename = "grayscale")]
    Grayscale,
}

impl ColorScheme {
    pub const ALL: &'static [ColorScheme] = &[
        Self::RdYlGn,
        Self::BrBG,
        Self::RedYellowGreen,
        Self::BrownWhiteBlue,
        Self::Grayscale,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::RdYlGn => "RdYlGn",
            Self::BrBG => "BrBG",
            Self::RedYellowGreen => "red-yellow-green",
            Self::BrownWhiteBlue => "brown-white-blue",
            Self::Grayscale => "grayscale",
        }
    }

    pub fn stops(&self) -> &'static [ColorStop] {
        match self {
            Self::RdYlGn => RDYLGN_STOPS,
            Self::BrBG => BRBG_STOPS,
            Self::RedYellowGreen => RED_YELLOW_GREEN_STOPS,
            Self::BrownWhiteBlue => BROWN_WHITE_BLUE_STOPS,
            Self::Grayscale => GRAYSCALE_STOPS,
        }
    }

    /// Stop colors as `#rrggbb`, low to high.
    pub fn palette_hex(&self) -> Vec<String> {
        self.stops().iter().map(|s| s.color.to_hex()).collect()
    }
}

const RDYLGN_STOPS: &[ColorStop] = &[
    ColorStop::new(0.00, 165, 0, 38),
    ColorStop::new(0.25, 244, 109, 67),
    ColorStop::new(0.50, 255, 255, 191),
    ColorStop::new(0.75, 102, 189, 99),
    ColorStop::new(1.00, 0, 104, 55),
];

const BRBG_STOPS: &[ColorStop] = &[
    ColorStop::new(0.00, 84, 48, 5),
    ColorStop::new(0.25, 191, 129, 45),
    ColorStop::new(0.50, 245, 245, 245),
    ColorStop::new(0.75, 53, 151, 143),
    ColorStop::new(1.00, 0, 60, 48),
];

const RED_YELLOW_GREEN_STOPS: &[ColorStop] = &[
    ColorStop::new(0.0, 255, 0, 0),
    ColorStop::new(0.5, 255, 255, 0),
    ColorStop::new(1.0, 0, 128, 0),
];

const BROWN_WHITE_BLUE_STOPS: &[ColorStop] = &[
    ColorStop::new(0.0, 165, 42, 42),
    ColorStop::new(0.5, 255, 255, 255),
    ColorStop::new(1.0, 0, 0, 255),
];

const GRAYSCALE_STOPS: &[ColorStop] = &[
    ColorStop::new(0.0, 0, 0, 0),
    ColorStop::new(1.0, 255, 255, 255),
];

fn lerp_channel(a: u8, b: u8, t: f64) -> u8 {
    (a as f64 + (b as f64 - a as f64) * t).round() as u8
}

/// Color at `t` in [0, 1]; values outside are clamped to the end stops.
pub fn evaluate(scheme: ColorScheme, t: f64) -> Rgb {
    let stops = scheme.stops();
    let (first, last) = (stops[0], stops[stops.len() - 1]);
    if t.is_nan() || t <= first.t {
        return first.color;
    }
    if t >= last.t {
        return last.color;
    }

    for pair in stops.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        if t <= hi.t {
            let ratio = (t - lo.t) / (hi.t - lo.t);
            return Rgb::new(
                lerp_channel(lo.color.r, hi.color.r, ratio),
                lerp_channel(lo.color.g, hi.color.g, ratio),
                lerp_channel(lo.color.b, hi.color.b, ratio),
            );
        }
    }
    last.color
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_and_clamping() {
        assert_eq!(evaluate(ColorScheme::RedYellowGreen, -1.0), Rgb::new(255, 0, 0));
        assert_eq!(evaluate(ColorScheme::RedYellowGreen, 0.5), Rgb::new(255, 255, 0));
        assert_eq!(evaluate(ColorScheme::RedYellowGreen, 2.0), Rgb::new(0, 128, 0));
        assert_eq!(evaluate(ColorScheme::BrownWhiteBlue, 0.5), Rgb::new(255, 255, 255));
    }

    #[test]
    fn grayscale_midpoint() {
        assert_eq!(evaluate(ColorScheme::Grayscale, 0.5), Rgb::new(128, 128, 128));
    }

    #[test]
    fn hex_palette() {
        assert_eq!(
            ColorScheme::BrownWhiteBlue.palette_hex(),
            vec!["#a52a2a", "#ffffff", "#0000ff"]
        );
    }

    #[test]
    fn stops_are_ordered() {
        for scheme in ColorScheme::ALL {
            let stops = scheme.stops();
            assert_eq!(stops[0].t, 0.0, "{}", scheme.name());
            assert_eq!(stops[stops.len() - 1].t, 1.0, "{}", scheme.name());
            assert!(stops.windows(2).all(|w| w[0].t < w[1].t));
        }
    }
}
