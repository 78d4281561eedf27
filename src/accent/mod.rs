//! Now-playing accent: a quip and a colour picked per track.
//!
//! The colour is the dominant colour of the track's album art when it can
//! be downloaded and decoded, otherwise a random palette entry.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use image::imageops::FilterType;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde_json::Value;

use crate::api::DashboardApi;
use crate::projection;

/// Longest side artwork is scaled to before counting colours
const SAMPLE_SIZE: u32 = 50;

/// Channel quantization step
const QUANT: u16 = 24;

const BUILTIN_QUIPS: &str = "\
Certified bop detected.
The neighbours can probably hear this one.
Somebody is having a good day.
Volume knob status: irrelevant.
Scrobbling this straight into the history books.
Your taste is showing.
Another one for the year-end wrap.
Hit replay responsibly.
";

#[derive(Debug, thiserror::Error)]
pub enum AccentError {
    #[error("Failed to decode artwork: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Artwork has no pixels")]
    EmptyImage,

    #[error("Failed to read quip file {0}: {1}")]
    QuipFile(std::path::PathBuf, std::io::Error),
}

/// An opaque colour, displayed as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

/// Fallback colours
pub const PALETTE: [Rgb; 7] = [
    Rgb(0x1D, 0xB9, 0x54),
    Rgb(0xFF, 0x6B, 0x6B),
    Rgb(0xFF, 0xD1, 0x66),
    Rgb(0x06, 0xD6, 0xA0),
    Rgb(0x11, 0x8A, 0xB2),
    Rgb(0xC7, 0x7D, 0xFF),
    Rgb(0xF0, 0x65, 0x95),
];

/// Quip and colour for one track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accent {
    pub quip: Option<String>,
    pub color: Rgb,
}

/// Quip list: the built-in one, or the lines of `path`.
pub fn load_quips(path: Option<&Path>) -> Result<String, AccentError> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| AccentError::QuipFile(path.to_path_buf(), e)),
        None => Ok(BUILTIN_QUIPS.to_string()),
    }
}

/// Random non-blank line of `quips`.
pub fn pick_quip<R: Rng + ?Sized>(quips: &str, rng: &mut R) -> Option<String> {
    let lines: Vec<&str> = quips
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    lines.choose(rng).map(|line| line.to_string())
}

pub fn random_palette_color<R: Rng + ?Sized>(rng: &mut R) -> Rgb {
    PALETTE[rng.random_range(0..PALETTE.len())]
}

/// Most common quantized colour of an encoded image.
pub fn try_dominant_color(bytes: &[u8]) -> Result<Rgb, AccentError> {
    let artwork = image::load_from_memory(bytes)?;
    let width = artwork.width().clamp(1, SAMPLE_SIZE);
    let height = artwork.height().clamp(1, SAMPLE_SIZE);
    let sample = artwork
        .resize_exact(width, height, FilterType::Triangle)
        .to_rgb8();

    let mut counts: HashMap<Rgb, u32> = HashMap::new();
    // First-seen order breaks ties
    let mut order: Vec<Rgb> = Vec::new();
    for pixel in sample.pixels() {
        let [r, g, b] = pixel.0;
        let bucket = Rgb(quantize(r), quantize(g), quantize(b));
        let count = counts.entry(bucket).or_insert_with(|| {
            order.push(bucket);
            0
        });
        *count += 1;
    }

    let mut best: Option<(Rgb, u32)> = None;
    for bucket in order {
        let count = counts[&bucket];
        if best.is_none_or(|(_, max)| count > max) {
            best = Some((bucket, count));
        }
    }
    best.map(|(color, _)| color).ok_or(AccentError::EmptyImage)
}

/// [`try_dominant_color`], with failures logged and dropped.
pub fn dominant_color(bytes: &[u8]) -> Option<Rgb> {
    match try_dominant_color(bytes) {
        Ok(color) => Some(color),
        Err(e) => {
            tracing::debug!("No dominant colour: {}", e);
            None
        }
    }
}

fn quantize(channel: u8) -> u8 {
    let step = QUANT as f32;
    let rounded = (f32::from(channel) / step).round() * step;
    rounded.min(255.0) as u8
}

/// Pick the accent for a newly playing `track`.
///
/// Random choices are made before the artwork download so the future does
/// not hold the generator.
pub async fn accent_for_track<R: Rng + ?Sized>(
    track: &Value,
    quips: &str,
    api: &dyn DashboardApi,
    rng: &mut R,
) -> Accent {
    let quip = pick_quip(quips, rng);
    let fallback = random_palette_color(rng);

    let Some(url) = projection::project_image(track) else {
        return Accent {
            quip,
            color: fallback,
        };
    };

    let color = match api.fetch_bytes(&url).await {
        Ok(bytes) => dominant_color(&bytes).unwrap_or(fallback),
        Err(e) => {
            tracing::debug!("Artwork download failed for {}: {}", url, e);
            fallback
        }
    };

    Accent { quip, color }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::traits::mocks::MockApi;
    use image::{ImageFormat, RgbImage};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use serde_json::json;
    use std::io::Cursor;

    fn png(width: u32, height: u32, paint: impl Fn(u32, u32) -> [u8; 3]) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| image::Rgb(paint(x, y)));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_rgb_display() {
        assert_eq!(PALETTE[0].to_string(), "#1DB954");
        assert_eq!(Rgb(0, 10, 255).to_string(), "#000AFF");
    }

    #[test]
    fn test_quantize() {
        assert_eq!(quantize(0), 0);
        assert_eq!(quantize(11), 0);
        assert_eq!(quantize(12), 24);
        assert_eq!(quantize(250), 240);
        assert_eq!(quantize(255), 255);
    }

    #[test]
    fn test_dominant_color_majority() {
        // Three quarters red, one quarter blue
        let bytes = png(8, 8, |x, _| if x < 6 { [255, 0, 0] } else { [0, 0, 255] });
        assert_eq!(dominant_color(&bytes), Some(Rgb(255, 0, 0)));
    }

    #[test]
    fn test_dominant_color_large_image_is_sampled() {
        let bytes = png(400, 300, |_, _| [30, 190, 100]);
        assert_eq!(dominant_color(&bytes), Some(Rgb(24, 192, 96)));
    }

    #[test]
    fn test_dominant_color_rejects_garbage() {
        assert_eq!(dominant_color(b"definitely not an image"), None);
        assert!(matches!(
            try_dominant_color(b"nope"),
            Err(AccentError::Decode(_))
        ));
    }

    #[test]
    fn test_pick_quip_skips_blank_lines() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let quip = pick_quip("\n  \nonly one\n\n", &mut rng);
            assert_eq!(quip.as_deref(), Some("only one"));
        }
        assert_eq!(pick_quip("", &mut rng), None);
        assert!(pick_quip(BUILTIN_QUIPS, &mut rng).is_some());
    }

    #[test]
    fn test_load_quips_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quips.txt");
        std::fs::write(&path, "one\ntwo\n").unwrap();

        assert_eq!(load_quips(Some(&path)).unwrap(), "one\ntwo\n");
        assert_eq!(load_quips(None).unwrap(), BUILTIN_QUIPS);
        assert!(matches!(
            load_quips(Some(&dir.path().join("missing.txt"))),
            Err(AccentError::QuipFile(..))
        ));
    }

    #[tokio::test]
    async fn test_accent_uses_artwork() {
        let api = MockApi::new();
        api.serve_bytes("https://img/a.png", png(4, 4, |_, _| [0, 0, 0]));
        let mut rng = StdRng::seed_from_u64(1);

        let track = json!({"name": "Song", "albumImage": "https://img/a.png"});
        let accent = accent_for_track(&track, "hi", &api, &mut rng).await;
        assert_eq!(accent.color, Rgb(0, 0, 0));
        assert_eq!(accent.quip.as_deref(), Some("hi"));
    }

    #[tokio::test]
    async fn test_accent_falls_back_to_palette() {
        let api = MockApi::new();
        let mut rng = StdRng::seed_from_u64(3);

        let no_art = accent_for_track(&json!({"name": "Song"}), "", &api, &mut rng).await;
        assert!(PALETTE.contains(&no_art.color));
        assert_eq!(no_art.quip, None);

        let missing = json!({"name": "Song", "image": "https://img/404.png"});
        let broken = accent_for_track(&missing, "", &api, &mut rng).await;
        assert!(PALETTE.contains(&broken.color));
    }
}
