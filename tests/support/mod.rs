#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

use beatreel::{AssetPaths, PipelineConfig};

pub fn font_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/fonts/DejaVuSans.ttf")
}

/// Fresh scratch directory under `target/`.
pub fn scratch(name: &str) -> PathBuf {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("target")
        .join("it")
        .join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Write a white mask and a dark end card template, and point a config at them.
pub fn config_with_assets(root: &Path) -> PipelineConfig {
    let mask_path = root.join("assets/mask.png");
    let template_path = root.join("assets/endcard.jpg");
    std::fs::create_dir_all(root.join("assets")).unwrap();
    image::RgbaImage::from_pixel(64, 64, image::Rgba([255, 255, 255, 255]))
        .save(&mask_path)
        .unwrap();
    image::RgbImage::from_pixel(1280, 720, image::Rgb([30, 30, 40]))
        .save(&template_path)
        .unwrap();

    PipelineConfig {
        assets: AssetPaths {
            mask: mask_path,
            end_card_template: template_path,
            caption_font: font_path(),
            end_card_font: font_path(),
            default_song: None,
        },
        work_dir: root.join("work"),
        ..PipelineConfig::default()
    }
}

/// Primary/secondary directories holding `keys.len()` matching pairs.
pub fn write_pairs(root: &Path, keys: &[&str]) -> (PathBuf, PathBuf) {
    let primary = root.join("primary");
    let secondary = root.join("secondary");
    std::fs::create_dir_all(&primary).unwrap();
    std::fs::create_dir_all(&secondary).unwrap();
    for (i, key) in keys.iter().enumerate() {
        let shade = 40 + (i as u8) * 50;
        image::RgbImage::from_pixel(640, 360, image::Rgb([shade, 90, 160]))
            .save(primary.join(format!("{key}_front.jpg")))
            .unwrap();
        image::RgbImage::from_pixel(480, 640, image::Rgb([200, shade, 40]))
            .save(secondary.join(format!("{key}_back.jpg")))
            .unwrap();
    }
    (primary, secondary)
}

pub fn ffmpeg_available() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Eight seconds of 10 ms clicks every half second (120 BPM).
pub fn synth_click_track(path: &Path) -> anyhow::Result<()> {
    let status = Command::new("ffmpeg")
        .args([
            "-v",
            "error",
            "-y",
            "-f",
            "lavfi",
            "-i",
            "aevalsrc='if(lt(mod(t,0.5),0.01),sin(2*PI*1000*t),0)':s=48000:d=8",
        ])
        .arg(path)
        .status()?;
    anyhow::ensure!(status.success(), "ffmpeg failed creating click track");
    Ok(())
}
