use crossterm::style::Color;

/// How sub-cell pixels map to terminal characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum RenderMode {
    /// Unicode braille characters (2x4 pixels per cell).
    Braille,
    /// Half-block characters ▀▄█ (1x2 pixels per cell).
    HalfBlock,
}

impl RenderMode {
    pub fn next(self) -> Self {
        match self {
            RenderMode::Braille => RenderMode::HalfBlock,
            RenderMode::HalfBlock => RenderMode::Braille,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RenderMode::Braille => "braille",
            RenderMode::HalfBlock => "halfblock",
        }
    }
}

/// Color output mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ColorMode {
    /// No color — monochrome
    Mono,
    /// ANSI 16 colors
    Ansi16,
    /// 256-color palette
    Ansi256,
    /// 24-bit true color (RGB)
    TrueColor,
}

impl ColorMode {
    pub fn next(self) -> Self {
        match self {
            ColorMode::Mono => ColorMode::Ansi16,
            ColorMode::Ansi16 => ColorMode::Ansi256,
            ColorMode::Ansi256 => ColorMode::TrueColor,
            ColorMode::TrueColor => ColorMode::Mono,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ColorMode::Mono => "mono",
            ColorMode::Ansi16 => "ansi16",
            ColorMode::Ansi256 => "ansi256",
            ColorMode::TrueColor => "truecolor",
        }
    }
}

/// A sub-cell pixel canvas. The simulation plots in HSLA; pixels store a
/// brightness in 0.0..=1.0 plus an RGB color, blended brightest-wins so
/// overlapping glow never darkens what is already lit.
pub struct Canvas {
    /// Width in pixels (sub-cell)
    pub width: usize,
    /// Height in pixels (sub-cell)
    pub height: usize,
    /// Pixel brightness 0.0..=1.0
    pub pixels: Vec<f64>,
    /// Per-pixel color (used when color mode != Mono)
    pub colors: Vec<(u8, u8, u8)>,
    pub render_mode: RenderMode,
    pub color_mode: ColorMode,
}

impl Canvas {
    pub fn new(
        term_cols: usize,
        term_rows: usize,
        render_mode: RenderMode,
        color_mode: ColorMode,
    ) -> Self {
        let (px_w, px_h) = match render_mode {
            RenderMode::Braille => (term_cols * 2, term_rows * 4),
            RenderMode::HalfBlock => (term_cols, term_rows * 2),
        };
        let size = px_w * px_h;
        Canvas {
            width: px_w,
            height: px_h,
            pixels: vec![0.0; size],
            colors: vec![(0, 0, 0); size],
            render_mode,
            color_mode,
        }
    }

    pub fn clear(&mut self) {
        self.pixels.fill(0.0);
        self.colors.fill((0, 0, 0));
    }

    /// Terminal dimensions needed for this canvas.
    pub fn term_size(&self) -> (usize, usize) {
        match self.render_mode {
            RenderMode::Braille => (self.width / 2, self.height / 4),
            RenderMode::HalfBlock => (self.width, self.height / 2),
        }
    }

    /// Plot one pixel in HSLA. Alpha doubles as brightness; a dimmer plot
    /// never overwrites a brighter pixel.
    pub fn plot_hsla(&mut self, x: f64, y: f64, hue: f64, sat: f64, light: f64, alpha: f64) {
        if alpha <= 0.0 || !x.is_finite() || !y.is_finite() {
            return;
        }
        if x < 0.0 || y < 0.0 {
            return;
        }
        let (px, py) = (x as usize, y as usize);
        if px >= self.width || py >= self.height {
            return;
        }
        let idx = py * self.width + px;
        let brightness = alpha.clamp(0.0, 1.0);
        if brightness > self.pixels[idx] {
            self.pixels[idx] = brightness;
            self.colors[idx] = hsl_to_rgb(hue, sat, light);
        }
    }

    /// Filled disc, alpha fading toward the rim.
    pub fn disc_hsla(
        &mut self,
        cx: f64,
        cy: f64,
        radius: f64,
        hue: f64,
        sat: f64,
        light: f64,
        alpha: f64,
    ) {
        if radius <= 0.0 || !cx.is_finite() || !cy.is_finite() {
            return;
        }
        let r = radius.max(0.5);
        let x0 = (cx - r).floor() as i64;
        let x1 = (cx + r).ceil() as i64;
        let y0 = (cy - r).floor() as i64;
        let y1 = (cy + r).ceil() as i64;
        for py in y0..=y1 {
            for px in x0..=x1 {
                let dx = px as f64 + 0.5 - cx;
                let dy = py as f64 + 0.5 - cy;
                let d = (dx * dx + dy * dy).sqrt();
                if d > r {
                    continue;
                }
                let falloff = 1.0 - (d / r) * 0.5;
                self.plot_hsla(px as f64, py as f64, hue, sat, light, alpha * falloff);
            }
        }
    }

    /// Straight line, stepped at pixel resolution.
    pub fn line_hsla(
        &mut self,
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
        hue: f64,
        sat: f64,
        light: f64,
        alpha: f64,
    ) {
        if !(x0.is_finite() && y0.is_finite() && x1.is_finite() && y1.is_finite()) {
            return;
        }
        let dx = x1 - x0;
        let dy = y1 - y0;
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as usize;
        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            self.plot_hsla(x0 + dx * t, y0 + dy * t, hue, sat, light, alpha);
        }
    }

    /// Render the canvas to an escape-sequence string for one frame.
    pub fn render(&self) -> String {
        match self.render_mode {
            RenderMode::Braille => super::braille::render(self),
            RenderMode::HalfBlock => super::halfblock::render(self),
        }
    }

    pub fn map_color(&self, r: u8, g: u8, b: u8) -> Color {
        match self.color_mode {
            ColorMode::Mono => Color::White,
            ColorMode::TrueColor => Color::Rgb { r, g, b },
            ColorMode::Ansi256 => {
                let idx = 16 + (36 * (r as u16 / 51)) + (6 * (g as u16 / 51)) + (b as u16 / 51);
                Color::AnsiValue(idx as u8)
            }
            ColorMode::Ansi16 => {
                let brightness = (r as u16 + g as u16 + b as u16) / 3;
                if brightness < 64 {
                    Color::Black
                } else if r > g && r > b {
                    if brightness > 180 { Color::Red } else { Color::DarkRed }
                } else if g > r && g > b {
                    if brightness > 180 { Color::Green } else { Color::DarkGreen }
                } else if b > r && b > g {
                    if brightness > 180 { Color::Blue } else { Color::DarkBlue }
                } else if brightness > 180 {
                    Color::White
                } else {
                    Color::Grey
                }
            }
        }
    }
}

/// HSL to RGB, hue in degrees, saturation/lightness in 0..=100.
pub fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (u8, u8, u8) {
    let h = h.rem_euclid(360.0);
    let s = (s / 100.0).clamp(0.0, 1.0);
    let l = (l / 100.0).clamp(0.0, 1.0);

    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0).rem_euclid(2.0) - 1.0).abs());
    let m = l - c / 2.0;

    let (r1, g1, b1) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    (
        ((r1 + m) * 255.0).round().clamp(0.0, 255.0) as u8,
        ((g1 + m) * 255.0).round().clamp(0.0, 255.0) as u8,
        ((b1 + m) * 255.0).round().clamp(0.0, 255.0) as u8,
    )
}

pub fn color_to_fg(color: Color) -> String {
    match color {
        Color::Rgb { r, g, b } => format!("38;2;{};{};{}", r, g, b),
        Color::AnsiValue(v) => format!("38;5;{}", v),
        Color::Black => "30".into(),
        Color::DarkRed => "31".into(),
        Color::DarkGreen => "32".into(),
        Color::DarkYellow => "33".into(),
        Color::DarkBlue => "34".into(),
        Color::DarkMagenta => "35".into(),
        Color::DarkCyan => "36".into(),
        Color::Grey => "37".into(),
        Color::DarkGrey => "90".into(),
        Color::Red => "91".into(),
        Color::Green => "92".into(),
        Color::Yellow => "93".into(),
        Color::Blue => "94".into(),
        Color::Magenta => "95".into(),
        Color::Cyan => "96".into(),
        Color::White => "97".into(),
        _ => "37".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hsl_primaries_convert_exactly() {
        assert_eq!(hsl_to_rgb(0.0, 100.0, 50.0), (255, 0, 0));
        assert_eq!(hsl_to_rgb(120.0, 100.0, 50.0), (0, 255, 0));
        assert_eq!(hsl_to_rgb(240.0, 100.0, 50.0), (0, 0, 255));
        assert_eq!(hsl_to_rgb(0.0, 0.0, 100.0), (255, 255, 255));
        assert_eq!(hsl_to_rgb(0.0, 0.0, 0.0), (0, 0, 0));
    }

    #[test]
    fn hsl_hue_wraps() {
        assert_eq!(hsl_to_rgb(360.0, 100.0, 50.0), hsl_to_rgb(0.0, 100.0, 50.0));
        assert_eq!(hsl_to_rgb(-120.0, 100.0, 50.0), hsl_to_rgb(240.0, 100.0, 50.0));
    }

    #[test]
    fn plot_is_brightest_wins() {
        let mut c = Canvas::new(4, 4, RenderMode::Braille, ColorMode::TrueColor);
        c.plot_hsla(1.0, 1.0, 0.0, 100.0, 50.0, 0.9);
        c.plot_hsla(1.0, 1.0, 120.0, 100.0, 50.0, 0.4);
        let idx = c.width + 1;
        assert_eq!(c.pixels[idx], 0.9);
        assert_eq!(c.colors[idx], (255, 0, 0));
        // A brighter plot does replace.
        c.plot_hsla(1.0, 1.0, 120.0, 100.0, 50.0, 1.0);
        assert_eq!(c.colors[idx], (0, 255, 0));
    }

    #[test]
    fn out_of_bounds_plots_are_ignored() {
        let mut c = Canvas::new(2, 2, RenderMode::HalfBlock, ColorMode::Mono);
        c.plot_hsla(-1.0, 0.0, 0.0, 100.0, 50.0, 1.0);
        c.plot_hsla(0.0, -5.0, 0.0, 100.0, 50.0, 1.0);
        c.plot_hsla(1000.0, 0.0, 0.0, 100.0, 50.0, 1.0);
        c.plot_hsla(f64::NAN, 0.0, 0.0, 100.0, 50.0, 1.0);
        assert!(c.pixels.iter().all(|&p| p == 0.0));
    }

    #[test]
    fn line_covers_both_endpoints() {
        let mut c = Canvas::new(8, 8, RenderMode::Braille, ColorMode::Mono);
        c.line_hsla(0.0, 0.0, 10.0, 6.0, 180.0, 100.0, 50.0, 1.0);
        assert!(c.pixels[0] > 0.0);
        assert!(c.pixels[6 * c.width + 10] > 0.0);
    }

    #[test]
    fn disc_fills_its_center() {
        let mut c = Canvas::new(8, 8, RenderMode::Braille, ColorMode::Mono);
        c.disc_hsla(8.0, 8.0, 3.0, 0.0, 100.0, 50.0, 1.0);
        assert!(c.pixels[8 * c.width + 8] > 0.5);
    }

    #[test]
    fn term_size_round_trips_pixel_dimensions() {
        let braille = Canvas::new(80, 24, RenderMode::Braille, ColorMode::Mono);
        assert_eq!(braille.term_size(), (80, 24));
        assert_eq!((braille.width, braille.height), (160, 96));
        let half = Canvas::new(80, 24, RenderMode::HalfBlock, ColorMode::Mono);
        assert_eq!(half.term_size(), (80, 24));
        assert_eq!((half.width, half.height), (80, 48));
    }
}
