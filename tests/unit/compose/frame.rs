use super::*;
use image::{Rgb, Rgba};

const FONT: &[u8] = include_bytes!("../../data/fonts/DejaVuSans.ttf");

fn compositor(mask: RgbaImage, font: Option<Vec<u8>>) -> FrameCompositor {
    FrameCompositor::new(&CompositorConfig::default(), mask, font).unwrap()
}

fn solid_rgb(w: u32, h: u32, c: [u8; 3]) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb(c)))
}

#[test]
fn inset_is_third_size_at_fixed_offset() {
    let c = compositor(RgbaImage::from_pixel(4, 4, Rgba([255; 4])), None);
    let primary = solid_rgb(90, 60, [0, 0, 255]);
    let secondary = solid_rgb(40, 40, [255, 0, 0]);

    let out = c.composite(&primary, &secondary, None).unwrap();
    assert_eq!(out.dimensions(), (90, 60));
    // Inset covers x in 10..40, y in 10..30.
    assert_eq!(out.get_pixel(20, 20).0, [255, 0, 0]);
    assert_eq!(out.get_pixel(5, 5).0, [0, 0, 255]);
    assert_eq!(out.get_pixel(45, 20).0, [0, 0, 255]);
    assert_eq!(out.get_pixel(20, 35).0, [0, 0, 255]);
}

#[test]
fn black_mask_removes_secondary() {
    let c = compositor(RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 0])), None);
    let primary = solid_rgb(90, 60, [0, 200, 0]);
    let secondary = solid_rgb(16, 16, [255, 0, 0]);
    let out = c.composite(&primary, &secondary, None).unwrap();
    assert!(out.pixels().all(|p| p.0 == [0, 200, 0]));
}

#[test]
fn mask_multiplies_channels() {
    let c = compositor(RgbaImage::from_pixel(2, 2, Rgba([128, 255, 255, 255])), None);
    let mut inset = RgbaImage::from_pixel(2, 2, Rgba([200, 100, 50, 255]));
    c.apply_mask(&mut inset);
    assert_eq!(inset.get_pixel(0, 0).0, [100, 100, 50, 255]);
}

#[test]
fn caption_without_font_is_validation_error() {
    let c = compositor(RgbaImage::from_pixel(2, 2, Rgba([255; 4])), None);
    let err = c
        .composite(
            &solid_rgb(300, 200, [0, 0, 0]),
            &solid_rgb(10, 10, [0, 0, 0]),
            Some("2023-01-01"),
        )
        .unwrap_err();
    assert!(matches!(err, ReelError::Validation(_)));
}

#[test]
fn caption_darkens_backdrop_and_draws_text() {
    let c = compositor(
        RgbaImage::from_pixel(2, 2, Rgba([255; 4])),
        Some(FONT.to_vec()),
    );
    let primary = solid_rgb(600, 400, [200, 200, 200]);
    let secondary = solid_rgb(10, 10, [200, 200, 200]);

    let plain = c.composite(&primary, &secondary, None).unwrap();
    let captioned = c.composite(&primary, &secondary, Some("2023-01-01")).unwrap();

    assert_eq!(plain.get_pixel(300, 5).0, captioned.get_pixel(300, 5).0);
    let darker = captioned.pixels().filter(|p| p.0[0] < 150).count();
    let white = captioned.pixels().filter(|p| p.0[0] > 250).count();
    assert!(darker > 1000, "backdrop pixels: {darker}");
    assert!(white > 50, "caption pixels: {white}");
}

#[test]
fn compositing_is_deterministic() {
    let c = compositor(
        RgbaImage::from_pixel(3, 3, Rgba([255, 200, 255, 255])),
        Some(FONT.to_vec()),
    );
    let primary = DynamicImage::ImageRgb8(RgbImage::from_fn(120, 90, |x, y| {
        Rgb([(x * 2) as u8, (y * 2) as u8, 77])
    }));
    let secondary = solid_rgb(30, 40, [10, 250, 30]);
    let a = c.composite(&primary, &secondary, Some("x")).unwrap();
    let b = c.composite(&primary, &secondary, Some("x")).unwrap();
    assert_eq!(a.as_raw(), b.as_raw());
}

#[test]
fn invalid_config_is_rejected() {
    let cfg = CompositorConfig {
        jpeg_quality: 0,
        ..CompositorConfig::default()
    };
    assert!(FrameCompositor::new(&cfg, RgbaImage::from_pixel(1, 1, Rgba([255; 4])), None).is_err());
    assert!(
        FrameCompositor::new(&CompositorConfig::default(), RgbaImage::new(0, 0), None).is_err()
    );
}

#[test]
fn same_stem_different_extension_writes_distinct_frames() {
    let root = std::env::temp_dir().join(format!(
        "beatreel_frame_ext_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::create_dir_all(&root).unwrap();
    let jpg = root.join("x.jpg");
    let png = root.join("x.png");
    let secondary = root.join("x_s.png");
    RgbImage::from_pixel(60, 30, Rgb([200, 0, 0])).save(&jpg).unwrap();
    RgbImage::from_pixel(60, 30, Rgb([0, 0, 200])).save(&png).unwrap();
    RgbImage::from_pixel(30, 30, Rgb([0, 200, 0])).save(&secondary).unwrap();

    let pairs = [&jpg, &png]
        .into_iter()
        .map(|p| {
            Ok(ImagePair {
                primary: p.clone(),
                secondary: secondary.clone(),
                sequence_key: "x".to_owned(),
            })
        })
        .collect();
    let mask = RgbaImage::from_pixel(8, 8, Rgba([255, 255, 255, 255]));
    let out = root.join("work");
    let report = compositor(mask, None)
        .composite_all(pairs, false, &out)
        .unwrap();

    assert_eq!(report.frames.len(), 2);
    assert_ne!(report.frames[0].path, report.frames[1].path);
    assert!(report.frames.iter().all(|f| f.path.exists()));

    let _ = std::fs::remove_dir_all(&root);
}
