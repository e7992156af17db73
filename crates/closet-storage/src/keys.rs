//! Shared key generation for storage backends.
//!
//! Key format: `wardrobe/{owner_id}/{uuid}.{ext}`. The UUID component makes
//! every upload a fresh object; re-uploading the same file never overwrites.

use uuid::Uuid;

/// Extensions we will carry through to the storage key. Anything else (or a
/// missing extension) falls back to `jpg`.
const KNOWN_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Generate a storage key for the given owner and original filename.
///
/// The original filename only contributes its extension; the rest of the key
/// is server-generated so client-supplied names never reach the backend.
pub fn generate_storage_key(owner_id: &str, filename: &str) -> String {
    let ext = filename
        .rsplit('.')
        .next()
        .map(|e| e.to_ascii_lowercase())
        .filter(|e| KNOWN_EXTENSIONS.contains(&e.as_str()))
        .unwrap_or_else(|| "jpg".to_string());
    format!("wardrobe/{}/{}.{}", owner_id, Uuid::new_v4(), ext)
}
