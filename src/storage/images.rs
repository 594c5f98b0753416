//! Content-addressed image blob store
//!
//! Blobs are keyed by a digest of the image URL, not of the bytes: presence
//! of the file is sufficient for a hit and there is no freshness check.
//! Everything on disk is a JPEG regardless of the source format.

use crate::PetrelError;
use image::codecs::jpeg::JpegEncoder;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// Re-encode quality for stored blobs
const JPEG_QUALITY: u8 = 85;

/// Bytes of the URL hash kept for the blob key; plenty of collision margin
/// for cache addressing, this is not an adversarial boundary
const DIGEST_BYTES: usize = 16;

/// Filesystem store for re-encoded images under `<cache_dir>/images/`
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    /// Creates the blob directory if needed and returns the store
    pub fn open(cache_dir: &Path) -> Result<Self, PetrelError> {
        let root = cache_dir.join("images");
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Stable hex key for an image URL
    pub fn digest(url: &str) -> String {
        let hash = Sha256::digest(url.as_bytes());
        hex::encode(&hash[..DIGEST_BYTES])
    }

    fn blob_path(&self, digest: &str) -> PathBuf {
        self.root.join(format!("{}.jpg", digest))
    }

    /// Returns the stored JPEG bytes for a digest, if present
    pub fn get(&self, digest: &str) -> Result<Option<Vec<u8>>, PetrelError> {
        let path = self.blob_path(digest);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Decodes `raw`, re-encodes it as JPEG quality 85, stores it under
    /// `digest`, and returns the encoded bytes
    ///
    /// Fails on undecodable payloads; callers skip the image and move on.
    pub fn put(&self, digest: &str, raw: &[u8]) -> Result<Vec<u8>, PetrelError> {
        let decoded = image::load_from_memory(raw)?;
        let rgb = decoded.to_rgb8();

        let mut jpeg = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY);
        rgb.write_with_encoder(encoder)?;

        fs::write(self.blob_path(digest), &jpeg)?;
        Ok(jpeg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use tempfile::TempDir;

    fn png_fixture() -> Vec<u8> {
        let img = RgbImage::from_fn(8, 8, |x, y| image::Rgb([x as u8 * 16, y as u8 * 16, 128]));
        let mut bytes = Vec::new();
        img.write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::Png,
        )
        .unwrap();
        bytes
    }

    #[test]
    fn test_digest_is_stable_and_hex() {
        let a = ImageStore::digest("https://example.com/pic.jpg");
        let b = ImageStore::digest("https://example.com/pic.jpg");
        assert_eq!(a, b);
        assert_eq!(a.len(), DIGEST_BYTES * 2);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_digest_differs_per_url() {
        let a = ImageStore::digest("https://example.com/a.jpg");
        let b = ImageStore::digest("https://example.com/b.jpg");
        assert_ne!(a, b);
    }

    #[test]
    fn test_get_missing_blob() {
        let dir = TempDir::new().unwrap();
        let store = ImageStore::open(dir.path()).unwrap();
        assert!(store.get("deadbeef").unwrap().is_none());
    }

    #[test]
    fn test_put_reencodes_to_jpeg() {
        let dir = TempDir::new().unwrap();
        let store = ImageStore::open(dir.path()).unwrap();

        let digest = ImageStore::digest("https://example.com/pic.png");
        let jpeg = store.put(&digest, &png_fixture()).unwrap();

        assert_eq!(
            image::guess_format(&jpeg).unwrap(),
            image::ImageFormat::Jpeg
        );

        let stored = store.get(&digest).unwrap().expect("blob should exist");
        assert_eq!(stored, jpeg);
    }

    #[test]
    fn test_put_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let store = ImageStore::open(dir.path()).unwrap();
        assert!(store.put("cafebabe", b"not an image").is_err());
    }

    #[test]
    fn test_blob_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let digest = ImageStore::digest("https://example.com/IMG.JPG");

        {
            let store = ImageStore::open(dir.path()).unwrap();
            store.put(&digest, &png_fixture()).unwrap();
        }

        let store = ImageStore::open(dir.path()).unwrap();
        assert!(store.get(&digest).unwrap().is_some());
    }
}
