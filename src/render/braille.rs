use super::canvas::{Canvas, ColorMode, color_to_fg};

/// Braille dot layout within a 2x4 cell (Unicode U+2800 + dot bits):
/// (0,0) (1,0)    dot1 dot4
/// (0,1) (1,1)    dot2 dot5
/// (0,2) (1,2)    dot3 dot6
/// (0,3) (1,3)    dot7 dot8
const BRAILLE_OFFSET: u32 = 0x2800;
const DOT_MAP: [(usize, usize, u32); 8] = [
    (0, 0, 0x01),
    (0, 1, 0x02),
    (0, 2, 0x04),
    (1, 0, 0x08),
    (1, 1, 0x10),
    (1, 2, 0x20),
    (0, 3, 0x40),
    (1, 3, 0x80),
];

/// A dot lights when its pixel brightness clears this.
const LIT_THRESHOLD: f64 = 0.25;

pub fn render(canvas: &Canvas) -> String {
    let term_cols = canvas.width / 2;
    let term_rows = canvas.height / 4;
    let mut out = String::with_capacity(term_cols * term_rows * 20);
    let use_color = canvas.color_mode != ColorMode::Mono;
    let mut last_fg = String::new();

    for row in 0..term_rows {
        for col in 0..term_cols {
            let base_x = col * 2;
            let base_y = row * 4;

            let mut bits: u32 = 0;
            // The cell takes the color of its brightest dot, which keeps
            // sparkle cores from being washed out by dim neighbors.
            let mut best = 0.0f64;
            let mut best_color = (255u8, 255u8, 255u8);

            for &(dx, dy, bit) in &DOT_MAP {
                let x = base_x + dx;
                let y = base_y + dy;
                if x >= canvas.width || y >= canvas.height {
                    continue;
                }
                let idx = y * canvas.width + x;
                let v = canvas.pixels[idx];
                if v > LIT_THRESHOLD {
                    bits |= bit;
                    if v > best {
                        best = v;
                        best_color = canvas.colors[idx];
                    }
                }
            }

            let ch = char::from_u32(BRAILLE_OFFSET + bits).unwrap_or(' ');

            if use_color && bits != 0 {
                let (r, g, b) = best_color;
                let fg = color_to_fg(canvas.map_color(r, g, b));
                if fg != last_fg {
                    out.push_str("\x1b[");
                    out.push_str(&fg);
                    out.push('m');
                    last_fg = fg;
                }
            }
            out.push(ch);
        }
        if use_color {
            out.push_str("\x1b[0m");
            last_fg.clear();
        }
        // Cursor movement instead of \n avoids scroll artifacts on the last row.
        out.push_str(&format!("\x1b[{};1H", row + 2));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RenderMode;

    #[test]
    fn lit_pixel_produces_a_braille_dot() {
        let mut c = Canvas::new(2, 2, RenderMode::Braille, ColorMode::Mono);
        c.plot_hsla(0.0, 0.0, 0.0, 100.0, 50.0, 1.0);
        let frame = render(&c);
        // Dot 1 alone is U+2801.
        assert!(frame.contains('\u{2801}'));
    }

    #[test]
    fn empty_canvas_renders_blank_cells() {
        let c = Canvas::new(4, 2, RenderMode::Braille, ColorMode::Mono);
        let frame = render(&c);
        // Every braille cell is the blank pattern.
        assert!(
            frame
                .chars()
                .filter(|ch| ('\u{2800}'..='\u{28FF}').contains(ch))
                .all(|ch| ch == '\u{2800}')
        );
    }

    #[test]
    fn dim_pixels_stay_unlit() {
        let mut c = Canvas::new(2, 2, RenderMode::Braille, ColorMode::Mono);
        c.plot_hsla(0.0, 0.0, 0.0, 100.0, 50.0, 0.1);
        let frame = render(&c);
        assert!(!frame.contains('\u{2801}'));
    }
}
