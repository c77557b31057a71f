use super::*;

const FONT: &[u8] = include_bytes!("../../data/fonts/DejaVuSans.ttf");

#[test]
fn layout_has_positive_extent() {
    let mut engine = TextLayoutEngine::new();
    let layout = engine
        .layout_plain("2023-01-05", FONT, 50.0, TextBrushRgba8::WHITE)
        .unwrap();
    assert!(layout.width() > 100.0);
    assert!(layout.height() > 40.0);
}

#[test]
fn layout_rejects_bad_size_and_font() {
    let mut engine = TextLayoutEngine::new();
    assert!(
        engine
            .layout_plain("x", FONT, 0.0, TextBrushRgba8::WHITE)
            .is_err()
    );
    assert!(
        engine
            .layout_plain("x", b"not a font", 20.0, TextBrushRgba8::WHITE)
            .is_err()
    );
}

#[test]
fn paint_draws_backdrop_and_glyphs() {
    let mut engine = TextLayoutEngine::new();
    let layout = engine
        .layout_plain("Hi", FONT, 40.0, TextBrushRgba8::WHITE)
        .unwrap();
    let mut img = RgbaImage::from_pixel(200, 100, image::Rgba([0, 0, 255, 255]));
    let backdrop = Backdrop {
        rect: kurbo::Rect::new(0.0, 0.0, 40.0, 40.0),
        radius: 4.0,
        color: TextBrushRgba8 {
            r: 0,
            g: 0,
            b: 0,
            a: 255,
        },
    };

    TextPainter::new(FONT)
        .paint(&mut img, &layout, (100.0, 20.0), Some(&backdrop))
        .unwrap();

    assert_eq!(img.get_pixel(20, 20).0, [0, 0, 0, 255]);
    assert_eq!(img.get_pixel(199, 99).0, [0, 0, 255, 255]);
    let lit = img
        .pixels()
        .filter(|p| p.0[0] > 200 && p.0[1] > 200)
        .count();
    assert!(lit > 20, "expected white glyph pixels, found {lit}");
    assert!(img.pixels().all(|p| p.0[3] == 255));
}

#[test]
fn paint_is_deterministic() {
    let mut engine = TextLayoutEngine::new();
    let layout = engine
        .layout_plain("7 memories", FONT, 30.0, TextBrushRgba8::WHITE)
        .unwrap();
    let painter = TextPainter::new(FONT);
    let mut a = RgbaImage::from_pixel(220, 60, image::Rgba([10, 20, 30, 255]));
    let mut b = a.clone();
    painter.paint(&mut a, &layout, (5.0, 5.0), None).unwrap();
    painter.paint(&mut b, &layout, (5.0, 5.0), None).unwrap();
    assert_eq!(a.as_raw(), b.as_raw());
}
