//! PNG previews of slides and blocks
//!
//! Previews are wireframes: a white page with a one-pixel gray outline per
//! element. Text and pictures are not drawn.

use std::io::Cursor;

use image::{imageops, DynamicImage, ImageFormat, Rgb, RgbImage};

use crate::document::{Presentation, Slide};
use crate::error::{DeckError, Result};
use crate::extract::{Position, Size};
use crate::geometry::{Bounds, Emu};

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const OUTLINE: Rgb<u8> = Rgb([128, 128, 128]);
const PLACEHOLDER_FILL: Rgb<u8> = Rgb([211, 211, 211]);
const PLACEHOLDER_WIDTH: u32 = 200;
const PLACEHOLDER_HEIGHT: u32 = 150;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewOptions {
    /// Pixels
    pub width: u32,
    pub height: u32,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }
}

/// Wireframe of slide `slide_number` (1-based) as PNG bytes.
///
/// # Errors
///
/// Returns an error if the slide does not exist or encoding fails.
pub fn render_slide(
    presentation: &Presentation,
    slide_number: usize,
    options: &PreviewOptions,
) -> Result<Vec<u8>> {
    let image = draw_slide(presentation, slide_number, options)?;
    encode(image)
}

/// Wireframe of the slide cropped to a block's bounds, as PNG bytes.
///
/// A crop that falls outside the page yields the placeholder image.
pub fn render_block(
    presentation: &Presentation,
    slide_number: usize,
    position: Position,
    size: Size,
    options: &PreviewOptions,
) -> Result<Vec<u8>> {
    let page = draw_slide(presentation, slide_number, options)?;
    let (slide_width, slide_height) = presentation.slide_size();
    let scale = Scale::new(slide_width, slide_height, options);

    let x = scale.x(position.x).max(0);
    let y = scale.y(position.y).max(0);
    let right = (x + scale.x(size.width)).min(options.width as i64);
    let bottom = (y + scale.y(size.height)).min(options.height as i64);
    if right <= x || bottom <= y {
        tracing::debug!("Block crop outside slide {}, using placeholder", slide_number);
        return placeholder_png();
    }

    let cropped = imageops::crop_imm(
        &page,
        x as u32,
        y as u32,
        (right - x) as u32,
        (bottom - y) as u32,
    )
    .to_image();
    encode(cropped)
}

/// Light-gray image used when no preview is available
pub fn placeholder_png() -> Result<Vec<u8>> {
    encode(RgbImage::from_pixel(
        PLACEHOLDER_WIDTH,
        PLACEHOLDER_HEIGHT,
        PLACEHOLDER_FILL,
    ))
}

/// EMU to pixel mapping for one slide size
struct Scale {
    pixels: (i64, i64),
    slide: (Emu, Emu),
}

impl Scale {
    fn new(slide_width: Emu, slide_height: Emu, options: &PreviewOptions) -> Self {
        Self {
            pixels: (options.width as i64, options.height as i64),
            slide: (slide_width.max(1), slide_height.max(1)),
        }
    }

    fn x(&self, emu: Emu) -> i64 {
        emu * self.pixels.0 / self.slide.0
    }

    fn y(&self, emu: Emu) -> i64 {
        emu * self.pixels.1 / self.slide.1
    }
}

fn slide_by_number(presentation: &Presentation, slide_number: usize) -> Result<&Slide> {
    match slide_number.checked_sub(1) {
        Some(index) => presentation.slide(index),
        None => Err(DeckError::InvalidSlideIndex(0, presentation.slide_count())),
    }
}

fn draw_slide(
    presentation: &Presentation,
    slide_number: usize,
    options: &PreviewOptions,
) -> Result<RgbImage> {
    let slide = slide_by_number(presentation, slide_number)?;
    let (slide_width, slide_height) = presentation.slide_size();
    let scale = Scale::new(slide_width, slide_height, options);

    let mut image = RgbImage::from_pixel(options.width, options.height, BACKGROUND);
    for element in slide.elements() {
        draw_outline(&mut image, &scale, &element.bounds);
    }
    tracing::debug!(
        "Rendered {} outlines for slide {}",
        slide.elements().len(),
        slide_number
    );
    Ok(image)
}

/// Outline from (x, y) to (x + w, y + h) inclusive, clipped to the image
fn draw_outline(image: &mut RgbImage, scale: &Scale, bounds: &Bounds) {
    let left = scale.x(bounds.left);
    let top = scale.y(bounds.top);
    let right = left + scale.x(bounds.width);
    let bottom = top + scale.y(bounds.height);
    let (width, height) = (image.width() as i64, image.height() as i64);

    let mut put = |x: i64, y: i64| {
        if (0..width).contains(&x) && (0..height).contains(&y) {
            image.put_pixel(x as u32, y as u32, OUTLINE);
        }
    };
    for x in left..=right.min(width) {
        put(x, top);
        put(x, bottom);
    }
    for y in top..=bottom.min(height) {
        put(left, y);
        put(right, y);
    }
}

fn encode(image: RgbImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Element, TextBody};

    fn decode(bytes: &[u8]) -> RgbImage {
        image::load_from_memory_with_format(bytes, ImageFormat::Png)
            .unwrap()
            .to_rgb8()
    }

    fn deck() -> Presentation {
        let mut deck = Presentation::with_blank_slide().unwrap();
        deck.slide_mut(0).unwrap().insert_element(Element::text_box(
            Bounds::from_inches(1.0, 1.0, 5.0, 2.5),
            TextBody::from_text("box"),
        ));
        deck
    }

    #[test]
    fn test_slide_outline() {
        let image = decode(&render_slide(&deck(), 1, &PreviewOptions::default()).unwrap());
        assert_eq!(image.dimensions(), (800, 600));
        // 1" on a 10" x 7.5" slide is 80 px
        assert_eq!(*image.get_pixel(80, 80), OUTLINE);
        assert_eq!(*image.get_pixel(480, 280), OUTLINE);
        assert_eq!(*image.get_pixel(200, 150), BACKGROUND);
        assert_eq!(*image.get_pixel(0, 0), BACKGROUND);
    }

    #[test]
    fn test_block_crop() {
        let bytes = render_block(
            &deck(),
            1,
            Position { x: 914_400, y: 914_400 },
            Size {
                width: 914_400 * 5,
                height: 914_400 * 5 / 2,
            },
            &PreviewOptions::default(),
        )
        .unwrap();
        let image = decode(&bytes);
        assert_eq!(image.dimensions(), (400, 200));
        assert_eq!(*image.get_pixel(0, 0), OUTLINE);
    }

    #[test]
    fn test_block_outside_slide_is_placeholder() {
        let bytes = render_block(
            &deck(),
            1,
            Position { x: 9_144_000, y: 0 },
            Size {
                width: 914_400,
                height: 914_400,
            },
            &PreviewOptions::default(),
        )
        .unwrap();
        assert_eq!(bytes, placeholder_png().unwrap());
        let image = decode(&bytes);
        assert_eq!(image.dimensions(), (200, 150));
        assert_eq!(*image.get_pixel(100, 75), PLACEHOLDER_FILL);
    }

    #[test]
    fn test_slide_numbers_are_one_based() {
        let deck = deck();
        let options = PreviewOptions::default();
        assert!(matches!(
            render_slide(&deck, 0, &options),
            Err(DeckError::InvalidSlideIndex(0, 1))
        ));
        assert!(matches!(
            render_slide(&deck, 2, &options),
            Err(DeckError::InvalidSlideIndex(1, 1))
        ));
    }
}
