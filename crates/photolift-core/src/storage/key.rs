//! Target object key construction.
//!
//! Keys look like `<segment>/<owner>/<slot>-<millis>-<suffix>.<ext>`. The
//! millisecond component never repeats within one generator and the random
//! suffix separates concurrent or repeated runs, so keys never collide.

use crate::models::{RecordId, Segment, Slot};
use rand::distr::Alphanumeric;
use rand::Rng;
use std::sync::atomic::{AtomicI64, Ordering};

const SUFFIX_LEN: usize = 10;
const FALLBACK_EXTENSION: &str = "jpg";

/// File extension for an image content type.
pub fn extension_for(content_type: &str) -> &'static str {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match mime.as_str() {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "image/heic" => "heic",
        "image/heif" => "heif",
        "image/avif" => "avif",
        "image/bmp" => "bmp",
        "image/tiff" => "tif",
        "image/svg+xml" => "svg",
        _ => FALLBACK_EXTENSION,
    }
}

/// Produces unique object keys.
#[derive(Debug, Default)]
pub struct KeyGenerator {
    last_millis: AtomicI64,
}

impl KeyGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a fresh key for one slot.
    pub fn next_key(
        &self,
        segment: Segment,
        owner: &RecordId,
        slot: Slot,
        content_type: &str,
    ) -> String {
        let millis = self.next_millis(chrono::Utc::now().timestamp_millis());
        let suffix: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(SUFFIX_LEN)
            .map(|b| (b as char).to_ascii_lowercase())
            .collect();
        format_key(segment, owner, slot, millis, &suffix, extension_for(content_type))
    }

    /// Strictly increasing timestamp: the wall clock, or one past the last
    /// value handed out if the clock has not advanced.
    fn next_millis(&self, now: i64) -> i64 {
        let mut last = self.last_millis.load(Ordering::SeqCst);
        loop {
            let next = now.max(last + 1);
            match self
                .last_millis
                .compare_exchange(last, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return next,
                Err(actual) => last = actual,
            }
        }
    }
}

fn format_key(
    segment: Segment,
    owner: &RecordId,
    slot: Slot,
    millis: i64,
    suffix: &str,
    ext: &str,
) -> String {
    format!("{}/{}/{}-{}-{}.{}", segment, owner, slot, millis, suffix, ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_key_layout() {
        let key = format_key(
            Segment::Child,
            &RecordId::from("user42"),
            Slot::Front,
            1_700_000_000_000,
            "abc123defg",
            "jpg",
        );
        assert_eq!(key, "check_photos/user42/front-1700000000000-abc123defg.jpg");
    }

    #[test]
    fn test_next_key_shape() {
        let keys = KeyGenerator::new();
        let key = keys.next_key(Segment::Singleton, &RecordId::from("u1"), Slot::Side, "image/png");
        assert!(key.starts_with("anamnesi_photos/u1/side-"));
        assert!(key.ends_with(".png"));

        let file = key.rsplit('/').next().unwrap();
        let parts: Vec<&str> = file.trim_end_matches(".png").split('-').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), SUFFIX_LEN);
        assert!(parts[2].chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_millis_strictly_increase() {
        let keys = KeyGenerator::new();
        let a = keys.next_millis(1000);
        let b = keys.next_millis(1000);
        let c = keys.next_millis(900);
        let d = keys.next_millis(5000);
        assert_eq!((a, b, c, d), (1000, 1001, 1002, 5000));
    }

    #[test]
    fn test_keys_are_unique() {
        let keys = KeyGenerator::new();
        let owner = RecordId::from("same");
        let generated: std::collections::HashSet<String> = (0..200)
            .map(|_| keys.next_key(Segment::Child, &owner, Slot::Back, "image/jpeg"))
            .collect();
        assert_eq!(generated.len(), 200);
    }

    #[test]
    fn test_extension_for() {
        assert_eq!(extension_for("image/jpeg"), "jpg");
        assert_eq!(extension_for("image/PNG; charset=binary"), "png");
        assert_eq!(extension_for("image/tiff"), "tif");
        assert_eq!(extension_for("application/octet-stream"), "jpg");
        assert_eq!(extension_for(""), "jpg");
    }
}
