use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use image::ImageReader;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpriteKeyError {
    #[error("sprite key must not be empty")]
    Empty,
    #[error("sprite key must not contain path separators")]
    PathSeparator,
    #[error("sprite key contains invalid character '{character}'")]
    InvalidCharacter { character: char },
}

/// Sprite keys double as item identifiers, so they stay flat file stems:
/// lowercase ascii, digits and `_`.
pub fn validate_sprite_key(key: &str) -> Result<(), SpriteKeyError> {
    if key.is_empty() {
        return Err(SpriteKeyError::Empty);
    }
    for ch in key.chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' {
            continue;
        }
        if matches!(ch, '/' | '\\' | '.') {
            return Err(SpriteKeyError::PathSeparator);
        }
        return Err(SpriteKeyError::InvalidCharacter { character: ch });
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub(crate) struct LoadedSprite {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) rgba: Vec<u8>,
}

impl LoadedSprite {
    pub(crate) fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        match self.rgba.get(offset..offset + 4) {
            Some(bytes) => [bytes[0], bytes[1], bytes[2], bytes[3]],
            None => [0, 0, 0, 0],
        }
    }
}

/// Lazily decodes `assets/sprites/<key>.png`. Failed loads are cached as
/// `None` and warned about once so the renderer can fall back to placeholders.
#[derive(Debug)]
pub(crate) struct SpriteCache {
    asset_root: PathBuf,
    sprites: HashMap<String, Option<LoadedSprite>>,
    warned_keys: HashSet<String>,
}

impl SpriteCache {
    pub(crate) fn new(asset_root: PathBuf) -> Self {
        Self {
            asset_root,
            sprites: HashMap::new(),
            warned_keys: HashSet::new(),
        }
    }

    pub(crate) fn get(&mut self, key: &str) -> Option<&LoadedSprite> {
        if !self.sprites.contains_key(key) {
            let loaded = match sprite_path(&self.asset_root, key) {
                Ok(path) => match load_sprite_rgba(&path) {
                    Ok(sprite) => Some(sprite),
                    Err(reason) => {
                        warn_once(&mut self.warned_keys, key, Some(&path), &reason);
                        None
                    }
                },
                Err(reason) => {
                    warn_once(&mut self.warned_keys, key, None, &reason);
                    None
                }
            };
            self.sprites.insert(key.to_string(), loaded);
        }
        self.sprites.get(key).and_then(Option::as_ref)
    }
}

fn sprite_path(asset_root: &Path, key: &str) -> Result<PathBuf, String> {
    validate_sprite_key(key).map_err(|error| format!("invalid_key:{error}"))?;
    Ok(asset_root.join("sprites").join(format!("{key}.png")))
}

fn load_sprite_rgba(path: &Path) -> Result<LoadedSprite, String> {
    let reader = ImageReader::open(path).map_err(|error| format!("file_open_failed:{error}"))?;
    let decoded = reader
        .decode()
        .map_err(|error| format!("decode_failed:{error}"))?;
    let image = decoded.to_rgba8();
    Ok(LoadedSprite {
        width: image.width(),
        height: image.height(),
        rgba: image.into_raw(),
    })
}

fn warn_once(warned_keys: &mut HashSet<String>, key: &str, path: Option<&Path>, reason: &str) {
    if !warned_keys.insert(key.to_string()) {
        return;
    }
    let path_display = path
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<unresolved>".to_string());
    warn!(
        sprite_key = key,
        path = %path_display,
        reason,
        "sprite_load_failed_using_placeholder"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_item_style_keys() {
        for key in ["sparkle", "chocolate_milkshake", "lunch_lady", "sprite2"] {
            assert!(validate_sprite_key(key).is_ok(), "key={key}");
        }
    }

    #[test]
    fn rejects_paths_and_uppercase() {
        assert_eq!(validate_sprite_key(""), Err(SpriteKeyError::Empty));
        assert_eq!(
            validate_sprite_key("../x"),
            Err(SpriteKeyError::PathSeparator)
        );
        assert_eq!(
            validate_sprite_key("a/b"),
            Err(SpriteKeyError::PathSeparator)
        );
        assert_eq!(
            validate_sprite_key("Taco"),
            Err(SpriteKeyError::InvalidCharacter { character: 'T' })
        );
    }

    #[test]
    fn missing_sprite_is_cached_as_none() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let mut cache = SpriteCache::new(dir.path().to_path_buf());
        assert!(cache.get("sparkle").is_none());
        assert!(cache.get("sparkle").is_none());
        assert_eq!(cache.sprites.len(), 1);
        assert_eq!(cache.warned_keys.len(), 1);
    }
}
