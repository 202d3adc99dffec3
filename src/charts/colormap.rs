use plotters::style::RGBColor;

/// Piecewise-linear color scale over evenly spaced stops.
#[derive(Debug, Clone, Copy)]
pub struct ColorMap {
    stops: &'static [(u8, u8, u8)],
}

/// Diverging blue-to-red scale for correlations.
pub const COOLWARM: ColorMap = ColorMap {
    stops: &[
        (59, 76, 192),
        (124, 159, 249),
        (192, 212, 245),
        (221, 221, 221),
        (242, 203, 183),
        (238, 133, 104),
        (180, 4, 38),
    ],
};

pub const YL_GN_BU: ColorMap = ColorMap {
    stops: &[
        (255, 255, 217),
        (237, 248, 177),
        (199, 233, 180),
        (127, 205, 187),
        (65, 182, 196),
        (29, 145, 192),
        (34, 94, 168),
        (37, 52, 148),
        (8, 29, 88),
    ],
};

pub const OR_RD: ColorMap = ColorMap {
    stops: &[
        (255, 247, 236),
        (254, 232, 200),
        (253, 212, 158),
        (253, 187, 132),
        (252, 141, 89),
        (239, 101, 72),
        (215, 48, 31),
        (179, 0, 0),
        (127, 0, 0),
    ],
};

/// Near-white to royal blue, for hexbin densities.
pub const ROYAL_BLUE_DENSITY: ColorMap = ColorMap {
    stops: &[(234, 238, 250), (141, 165, 238), (65, 105, 225), (25, 45, 140)],
};

pub const ROYAL_BLUE: RGBColor = RGBColor(65, 105, 225);

impl ColorMap {
    /// Color at `t` in [0, 1]; values outside are clamped.
    pub fn at(&self, t: f64) -> RGBColor {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let segments = self.stops.len() - 1;
        let position = t * segments as f64;
        let index = (position.floor() as usize).min(segments - 1);
        let local = position - index as f64;

        let (r0, g0, b0) = self.stops[index];
        let (r1, g1, b1) = self.stops[index + 1];
        let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * local).round() as u8;
        RGBColor(lerp(r0, r1), lerp(g0, g1), lerp(b0, b1))
    }

    /// Color of `value` on a scale running from `min` to `max`.
    pub fn scaled(&self, value: f64, min: f64, max: f64) -> RGBColor {
        if max <= min {
            return self.at(0.5);
        }
        self.at((value - min) / (max - min))
    }
}

/// Black or white, whichever reads better on `background`.
pub fn text_color_on(background: RGBColor) -> RGBColor {
    let RGBColor(r, g, b) = background;
    let luminance = 0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64;
    if luminance < 140.0 {
        RGBColor(255, 255, 255)
    } else {
        RGBColor(0, 0, 0)
    }
}
