use serde::Deserialize;

/// Character art is chosen by variant, never by comparing sprite keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum AvatarVariant {
    Unicorn,
    Mermaid,
    LunchLady,
}

const AVATAR_SPRITES: [(AvatarVariant, &str); 3] = [
    (AvatarVariant::Unicorn, "unicorn"),
    (AvatarVariant::Mermaid, "mermaid"),
    (AvatarVariant::LunchLady, "lunch_lady"),
];

impl AvatarVariant {
    pub(crate) fn sprite_key(self) -> &'static str {
        AVATAR_SPRITES
            .iter()
            .find(|(variant, _)| *variant == self)
            .map(|(_, key)| *key)
            .unwrap_or("unicorn")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_has_a_valid_sprite_key() {
        for (variant, key) in AVATAR_SPRITES {
            assert_eq!(variant.sprite_key(), key);
            assert!(engine::validate_sprite_key(key).is_ok(), "key={key}");
        }
    }

    #[test]
    fn variants_deserialize_from_snake_case() {
        let variant: AvatarVariant =
            serde_json::from_value(serde_json::json!("lunch_lady")).expect("variant");
        assert_eq!(variant, AvatarVariant::LunchLady);
    }
}
