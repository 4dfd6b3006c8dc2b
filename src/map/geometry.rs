use crate::braille::BrailleCanvas;

/// Draw a line using Bresenham's algorithm
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0;
    let mut y = y0;

    loop {
        canvas.set_pixel_signed(x, y);

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;

        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }

        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}

/// Fill a polygon given in projected pixel coordinates using even-odd
/// scan-line filling. `height_px` bounds the scanline range so a deeply
/// zoomed polygon does not walk millions of off-canvas rows.
pub fn fill_polygon(canvas: &mut BrailleCanvas, ring: &[(i32, i32)], height_px: i32) {
    if ring.len() < 3 {
        return;
    }

    let min_y = ring.iter().map(|p| p.1).min().unwrap_or(0).max(0);
    let max_y = ring.iter().map(|p| p.1).max().unwrap_or(0).min(height_px - 1);

    let mut crossings: Vec<f64> = Vec::new();
    for y in min_y..=max_y {
        crossings.clear();
        let scan = y as f64;

        for i in 0..ring.len() {
            let (x0, y0) = ring[i];
            let (x1, y1) = ring[(i + 1) % ring.len()];
            if y0 == y1 {
                continue; // Horizontal edges contribute no crossing
            }
            let (top, bottom) = if y0 < y1 { (y0, y1) } else { (y1, y0) };
            // Half-open [top, bottom) so shared vertices count once
            if y < top || y >= bottom {
                continue;
            }
            let t = (scan - y0 as f64) / (y1 as f64 - y0 as f64);
            crossings.push(x0 as f64 + t * (x1 as f64 - x0 as f64));
        }

        crossings.sort_by(|a, b| a.total_cmp(b));
        for pair in crossings.chunks_exact(2) {
            canvas.fill_span(pair[0].round() as i32, pair[1].round() as i32, y);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_line() {
        let mut canvas = BrailleCanvas::new(5, 1);
        draw_line(&mut canvas, 0, 0, 9, 0);
        assert!(!canvas.is_blank());
    }

    #[test]
    fn test_vertical_line() {
        let mut canvas = BrailleCanvas::new(1, 2);
        draw_line(&mut canvas, 0, 0, 0, 7);
        assert!(!canvas.is_blank());
    }

    #[test]
    fn test_fill_square() {
        let mut canvas = BrailleCanvas::new(4, 2);
        let ring = [(0, 0), (7, 0), (7, 7), (0, 7)];
        fill_polygon(&mut canvas, &ring, 8);
        // Every interior scanline gets a full span; the first character
        // cell covers pixels (0..2, 0..4) which are all inside.
        assert_eq!(canvas.row_to_string(0).chars().next(), Some('⣿'));
    }

    #[test]
    fn test_fill_degenerate_ring_is_noop() {
        let mut canvas = BrailleCanvas::new(2, 2);
        fill_polygon(&mut canvas, &[(0, 0), (5, 5)], 8);
        assert!(canvas.is_blank());
    }

    #[test]
    fn test_fill_point_outside_concavity_left_empty() {
        // L-shape: notch at the top right should stay unfilled.
        let mut canvas = BrailleCanvas::new(4, 2);
        let ring = [(0, 0), (3, 0), (3, 4), (7, 4), (7, 7), (0, 7)];
        fill_polygon(&mut canvas, &ring, 8);
        // Pixel (6, 1) is inside the notch.
        let row0 = canvas.row_to_string(0);
        let last = row0.chars().last().unwrap();
        assert_eq!(last, '\u{2800}');
    }
}
