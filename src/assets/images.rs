use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use image::{DynamicImage, RgbImage, imageops::FilterType};

use crate::foundation::core::Canvas;
use crate::foundation::error::{ReelError, ReelResult};

/// File extensions treated as photographs (compared case-insensitively).
pub const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// List the image files directly inside `dir`, sorted by file name.
pub fn list_image_files(dir: &Path) -> ReelResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(ReelError::validation(format!(
            "image directory '{}' does not exist",
            dir.display()
        )));
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to list image directory '{}'", dir.display()))?
    {
        let path = entry
            .with_context(|| format!("failed to read entry in '{}'", dir.display()))?
            .path();
        if path.is_file() && is_image_file(&path) {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

pub fn open_image(path: &Path) -> ReelResult<DynamicImage> {
    let img = image::open(path)
        .with_context(|| format!("failed to decode image '{}'", path.display()))?;
    Ok(img)
}

/// Encode `img` as a baseline JPEG at `quality` (1..=100).
pub fn write_jpeg(img: &RgbImage, path: &Path, quality: u8) -> ReelResult<()> {
    if !(1..=100).contains(&quality) {
        return Err(ReelError::validation("jpeg quality must be in 1..=100"));
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }

    let file = File::create(path)
        .with_context(|| format!("failed to create image file '{}'", path.display()))?;
    let mut writer = BufWriter::new(file);
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut writer, quality);
    encoder
        .encode_image(img)
        .with_context(|| format!("failed to encode jpeg '{}'", path.display()))?;
    Ok(())
}

/// Scale `img` to fit inside `canvas` preserving aspect ratio, centered on black.
///
/// Images that already match the canvas are returned unchanged.
pub fn fit_to_canvas(img: &RgbImage, canvas: Canvas) -> RgbImage {
    let (w, h) = img.dimensions();
    if w == canvas.width && h == canvas.height {
        return img.clone();
    }

    let scale = f64::min(
        f64::from(canvas.width) / f64::from(w.max(1)),
        f64::from(canvas.height) / f64::from(h.max(1)),
    );
    let fit_w = ((f64::from(w) * scale).round() as u32).clamp(1, canvas.width);
    let fit_h = ((f64::from(h) * scale).round() as u32).clamp(1, canvas.height);
    let scaled = image::imageops::resize(img, fit_w, fit_h, FilterType::Triangle);

    let mut out = RgbImage::new(canvas.width, canvas.height);
    let x = i64::from((canvas.width - fit_w) / 2);
    let y = i64::from((canvas.height - fit_h) / 2);
    image::imageops::replace(&mut out, &scaled, x, y);
    out
}

#[cfg(test)]
#[path = "../../tests/unit/assets/images.rs"]
mod tests;
