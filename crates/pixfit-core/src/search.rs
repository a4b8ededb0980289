//! Binary search over encoder quality levels to meet a byte target.
//!
//! The search assumes encoded size is non-decreasing in quality. Under that
//! assumption it finds the unique maximum quality in `[QUALITY_MIN,
//! QUALITY_MAX]` whose output fits the target, in at most
//! `ceil(log2(97)) = 7` encode probes.

use std::path::Path;

use crate::codec::{self, DecodedImage, EncodeQuality, QUALITY_MAX, QUALITY_MIN};
use crate::error::JobError;

/// Upper bound on probe encodes for one search.
pub const MAX_PROBES: u32 = 7;

/// Search kernel: find the highest quality whose probed size fits the target.
///
/// `probe` encodes at a quality and reports the resulting byte size. Returns
/// `None` when no quality in range fits (even the lowest probe overshoots).
/// Generic over the probe so the algorithm is testable without a codec.
pub fn search_quality<F>(mut probe: F, target_bytes: u64) -> Result<Option<u8>, JobError>
where
    F: FnMut(u8) -> Result<u64, JobError>,
{
    let mut q_min = QUALITY_MIN as i32;
    let mut q_max = QUALITY_MAX as i32;
    // -1 marks "no acceptable quality seen yet"
    let mut q_acc: i32 = -1;

    while q_min <= q_max {
        let mid = (q_min + q_max) / 2;
        let size = probe(mid as u8)?;
        if size <= target_bytes {
            q_acc = mid;
            q_min = mid + 1;
        } else {
            q_max = mid - 1;
        }
    }

    Ok((q_acc >= 0).then_some(q_acc as u8))
}

/// Find the highest quality at which `decoded` encodes to at most
/// `target_bytes`, probing in memory.
pub fn find_target_quality(
    decoded: &DecodedImage,
    target_bytes: u64,
) -> Result<Option<u8>, JobError> {
    search_quality(
        |quality| Ok(codec::encode_in_memory(decoded, quality)?.len() as u64),
        target_bytes,
    )
}

/// Write `decoded` to `dest` within `target_bytes`.
///
/// Fast path: when the source file already fits the target, the original
/// bytes are re-emitted unchanged and no search runs. Otherwise the search
/// picks a quality and the final write encodes once, directly to `dest`.
/// Returns the quality used and the written size.
pub fn save_with_target(
    decoded: &DecodedImage,
    dest: &Path,
    target_bytes: u64,
) -> Result<(EncodeQuality, u64), JobError> {
    if decoded.source_size <= target_bytes {
        tracing::debug!(
            path = %decoded.source_path.display(),
            source_size = decoded.source_size,
            target_bytes,
            "source already within target, re-emitting unchanged"
        );
        let written = codec::encode_to_file(decoded, dest, EncodeQuality::Keep)?;
        return Ok((EncodeQuality::Keep, written));
    }

    match find_target_quality(decoded, target_bytes)? {
        Some(quality) => {
            tracing::debug!(
                path = %decoded.source_path.display(),
                quality,
                target_bytes,
                "accepted quality found"
            );
            let written = codec::encode_to_file(decoded, dest, EncodeQuality::At(quality))?;
            Ok((EncodeQuality::At(quality), written))
        }
        None => Err(JobError::QualityNotFound {
            path: decoded.source_path.clone(),
            target_bytes,
        }),
    }
}
