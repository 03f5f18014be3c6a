use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

pub fn horizontal_line(image: &mut RgbaImage, x: u32, y: u32, width: u32, colour: Rgba<u8>) {
    draw_line_segment_mut(
        image,
        (x as f32, y as f32),
        ((x + width) as f32, y as f32),
        colour,
    );
}

pub fn frame(image: &mut RgbaImage, x: u32, y: u32, width: u32, height: u32, colour: Rgba<u8>) {
    draw_hollow_rect_mut(
        image,
        Rect::at(x as i32, y as i32).of_size(width, height),
        colour,
    );
}

/// Joins consecutive points; a `None` breaks the line.
pub fn polyline(image: &mut RgbaImage, points: &[Option<(f32, f32)>], colour: Rgba<u8>) {
    for pair in points.windows(2) {
        if let [Some(from), Some(to)] = pair {
            draw_line_segment_mut(image, *from, *to, colour);
        }
    }
}
