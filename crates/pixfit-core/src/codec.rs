//! Codec adapter over the `image` crate.
//!
//! The engine treats the codec as a capability with three operations: decode
//! a file, encode in memory at a given quality (search probes), and encode
//! once to a destination file. JPEG is the supported lossy format; other
//! decodable formats pass through the fast path but cannot be re-encoded at
//! a quality level.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::{BufWriter, Cursor, Write as _};
use std::path::{Path, PathBuf};

use crate::error::JobError;

/// Lowest quality level the search may probe.
pub const QUALITY_MIN: u8 = 0;

/// Highest quality level the search may probe. This is the practical upper
/// bound for the JPEG quality parameter; above it file size climbs steeply
/// for no visible gain.
pub const QUALITY_MAX: u8 = 96;

/// Quality selection for the final write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeQuality {
    /// Re-emit the original bytes unchanged, preserving the source's encoding
    /// parameters and avoiding generation loss.
    Keep,
    /// Lossy re-encode at this quality level.
    At(u8),
}

impl std::fmt::Display for EncodeQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EncodeQuality::Keep => write!(f, "keep"),
            EncodeQuality::At(q) => write!(f, "{q}"),
        }
    }
}

/// A decoded image together with the source facts the engine needs.
pub struct DecodedImage {
    /// Decoded pixel data
    pub image: DynamicImage,

    /// Format detected from file content
    pub format: ImageFormat,

    /// Image width in pixels
    pub width: u32,

    /// Image height in pixels
    pub height: u32,

    /// Path the image was read from
    pub source_path: PathBuf,

    /// On-disk size of the source file in bytes
    pub source_size: u64,
}

/// Decode an image file, detecting the format from content rather than
/// trusting the extension.
pub fn decode(path: &Path) -> Result<DecodedImage, JobError> {
    let bytes = std::fs::read(path).map_err(|e| JobError::Decode {
        path: path.to_path_buf(),
        message: format!("cannot read file: {e}"),
    })?;
    let source_size = bytes.len() as u64;

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| JobError::Decode {
            path: path.to_path_buf(),
            message: format!("cannot detect image format: {e}"),
        })?;
    let format = reader.format().ok_or_else(|| JobError::UnsupportedFormat {
        path: path.to_path_buf(),
        format: path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("unknown")
            .to_string(),
    })?;
    let image = reader.decode().map_err(|e| JobError::Decode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let (width, height) = (image.width(), image.height());
    Ok(DecodedImage {
        image,
        format,
        width,
        height,
        source_path: path.to_path_buf(),
        source_size,
    })
}

/// Read image dimensions from the file header without a full decode.
///
/// Used at planning time, where only the pixel count is needed.
pub fn probe_dimensions(path: &Path) -> Result<(u32, u32), JobError> {
    ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|e| JobError::Decode {
            path: path.to_path_buf(),
            message: format!("cannot open file: {e}"),
        })?
        .into_dimensions()
        .map_err(|e| JobError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Whether a format has a quality-parameterized lossy encoder.
pub fn supports_lossy(format: ImageFormat) -> bool {
    matches!(format, ImageFormat::Jpeg)
}

/// Encode at the given quality into a memory buffer and return the bytes.
///
/// This is the probe operation for the size search; nothing is written to
/// disk.
pub fn encode_in_memory(decoded: &DecodedImage, quality: u8) -> Result<Vec<u8>, JobError> {
    ensure_lossy(decoded)?;

    let mut buffer = Cursor::new(Vec::new());
    // JPEG has no alpha channel; flatten before encoding.
    let rgb = decoded.image.to_rgb8();
    let mut encoder = JpegEncoder::new_with_quality(&mut buffer, effective_quality(quality));
    encoder.encode_image(&rgb).map_err(|e| JobError::Encode {
        path: decoded.source_path.clone(),
        message: e.to_string(),
    })?;
    Ok(buffer.into_inner())
}

/// Write the image to `dest` and return the written size in bytes.
///
/// `Keep` copies the source bytes untouched; `At(q)` encodes directly into
/// the destination file, never from a search probe buffer.
pub fn encode_to_file(
    decoded: &DecodedImage,
    dest: &Path,
    quality: EncodeQuality,
) -> Result<u64, JobError> {
    match quality {
        EncodeQuality::Keep => {
            std::fs::copy(&decoded.source_path, dest).map_err(|e| JobError::Write {
                path: dest.to_path_buf(),
                message: e.to_string(),
            })
        }
        EncodeQuality::At(q) => {
            ensure_lossy(decoded)?;

            let file = std::fs::File::create(dest).map_err(|e| JobError::Write {
                path: dest.to_path_buf(),
                message: e.to_string(),
            })?;
            let mut writer = BufWriter::new(file);
            let rgb = decoded.image.to_rgb8();
            let mut encoder = JpegEncoder::new_with_quality(&mut writer, effective_quality(q));
            encoder.encode_image(&rgb).map_err(|e| JobError::Encode {
                path: decoded.source_path.clone(),
                message: e.to_string(),
            })?;
            writer.flush().map_err(|e| JobError::Write {
                path: dest.to_path_buf(),
                message: e.to_string(),
            })?;

            let meta = std::fs::metadata(dest).map_err(|e| JobError::Write {
                path: dest.to_path_buf(),
                message: e.to_string(),
            })?;
            Ok(meta.len())
        }
    }
}

fn ensure_lossy(decoded: &DecodedImage) -> Result<(), JobError> {
    if supports_lossy(decoded.format) {
        return Ok(());
    }
    Err(JobError::UnsupportedFormat {
        path: decoded.source_path.clone(),
        format: format!("{:?}", decoded.format).to_lowercase(),
    })
}

/// The JPEG encoder's floor is quality 1; our search domain starts at 0.
fn effective_quality(quality: u8) -> u8 {
    quality.clamp(1, 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A busy deterministic test pattern; flat fills compress too uniformly
    /// to tell quality levels apart.
    fn textured_image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(image::RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([
                (x.wrapping_mul(31) ^ y.wrapping_mul(17)) as u8,
                (x.wrapping_mul(7) ^ y.wrapping_mul(13)) as u8,
                (x ^ y) as u8,
            ])
        }))
    }

    fn decoded_fixture(dir: &std::path::Path) -> DecodedImage {
        let path = dir.join("fixture.jpg");
        textured_image(64, 64)
            .save_with_format(&path, ImageFormat::Jpeg)
            .unwrap();
        decode(&path).unwrap()
    }

    #[test]
    fn test_decode_reads_dimensions_and_size() {
        let dir = tempfile::tempdir().unwrap();
        let decoded = decoded_fixture(dir.path());

        assert_eq!(decoded.format, ImageFormat::Jpeg);
        assert_eq!((decoded.width, decoded.height), (64, 64));
        assert_eq!(
            decoded.source_size,
            std::fs::metadata(&decoded.source_path).unwrap().len()
        );
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not_an_image.jpg");
        std::fs::write(&path, b"definitely not image data").unwrap();

        assert!(decode(&path).is_err());
    }

    #[test]
    fn test_probe_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probe.jpg");
        textured_image(48, 32)
            .save_with_format(&path, ImageFormat::Jpeg)
            .unwrap();

        assert_eq!(probe_dimensions(&path).unwrap(), (48, 32));
    }

    #[test]
    fn test_lower_quality_encodes_smaller() {
        let dir = tempfile::tempdir().unwrap();
        let decoded = decoded_fixture(dir.path());

        let low = encode_in_memory(&decoded, 5).unwrap();
        let high = encode_in_memory(&decoded, 95).unwrap();
        assert!(!low.is_empty());
        assert!(low.len() < high.len());
    }

    #[test]
    fn test_keep_copies_source_bytes_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let decoded = decoded_fixture(dir.path());
        let dest = dir.path().join("copy.jpg");

        let written = encode_to_file(&decoded, &dest, EncodeQuality::Keep).unwrap();
        assert_eq!(written, decoded.source_size);
        assert_eq!(
            std::fs::read(&dest).unwrap(),
            std::fs::read(&decoded.source_path).unwrap()
        );
    }

    #[test]
    fn test_encode_to_file_matches_in_memory_size() {
        let dir = tempfile::tempdir().unwrap();
        let decoded = decoded_fixture(dir.path());
        let dest = dir.path().join("out.jpg");

        let written = encode_to_file(&decoded, &dest, EncodeQuality::At(70)).unwrap();
        let probed = encode_in_memory(&decoded, 70).unwrap();
        assert_eq!(written, probed.len() as u64);
    }

    #[test]
    fn test_lossy_reencode_rejected_for_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.png");
        textured_image(16, 16)
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();
        let decoded = decode(&path).unwrap();

        let err = encode_in_memory(&decoded, 50).unwrap_err();
        assert!(matches!(err, JobError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_quality_zero_maps_to_encoder_floor() {
        let dir = tempfile::tempdir().unwrap();
        let decoded = decoded_fixture(dir.path());

        // Quality 0 must encode rather than error
        assert!(!encode_in_memory(&decoded, 0).unwrap().is_empty());
    }
}
