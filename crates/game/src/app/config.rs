use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use engine::{validate_sprite_key, Rect, SpriteKeyError, Vec2};
use serde::Deserialize;
use thiserror::Error;

use super::avatar::AvatarVariant;
use super::session::Location;

pub(crate) const SCENARIO_ENV_VAR: &str = "SCHOOLDAY_SCENARIO";
pub(crate) const SEED_ENV_VAR: &str = "SCHOOLDAY_SEED";

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("{var} must be an unsigned integer, got '{value}'")]
    InvalidSeed { var: &'static str, value: String },
    #[error("failed to read scenario file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0}")]
    Parse(String),
    #[error("validation failed at {path}: {message}")]
    Invalid { path: String, message: String },
    #[error("validation failed at {path}: {source}")]
    SpriteKey {
        path: String,
        #[source]
        source: SpriteKeyError,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub(crate) struct ConfigVec2 {
    pub(crate) x: f32,
    pub(crate) y: f32,
}

impl ConfigVec2 {
    pub(crate) const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub(crate) fn to_vec2(self) -> Vec2 {
        Vec2 {
            x: self.x,
            y: self.y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum NpcRole {
    QuestGiver,
    Teacher,
    LunchLady,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ScenarioConfig {
    pub(crate) world_size: ConfigVec2,
    pub(crate) spawn_margin: f32,
    pub(crate) initial_background: String,
    pub(crate) proximity_threshold: f32,
    pub(crate) collect_sound: String,
    pub(crate) interactable_half_extents: ConfigVec2,
    pub(crate) player: PlayerConfig,
    pub(crate) npcs: Vec<NpcConfig>,
    pub(crate) mission: MissionConfig,
    pub(crate) countdown: CountdownConfig,
    pub(crate) transition: TransitionPlan,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct PlayerConfig {
    pub(crate) variant: AvatarVariant,
    pub(crate) spawn: ConfigVec2,
    pub(crate) speed: f32,
    pub(crate) scale: f32,
    pub(crate) half_extents: ConfigVec2,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct NpcConfig {
    pub(crate) role: NpcRole,
    pub(crate) variant: AvatarVariant,
    pub(crate) position: ConfigVec2,
    #[serde(default)]
    pub(crate) tint: Option<[u8; 3]>,
    #[serde(default = "default_true")]
    pub(crate) visible: bool,
    #[serde(default = "default_avatar_scale")]
    pub(crate) scale: f32,
    #[serde(default = "default_avatar_half_extents")]
    pub(crate) half_extents: ConfigVec2,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct MissionConfig {
    pub(crate) target_item: String,
    pub(crate) min_target_separation: f32,
    pub(crate) max_sampling_attempts: u32,
    pub(crate) dialogue_offset_y: f32,
    pub(crate) offer_text: String,
    pub(crate) reminder_text: String,
    pub(crate) complete_text: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct CountdownConfig {
    pub(crate) steps: u32,
    pub(crate) interval_ms: u64,
    /// Screen pixel the countdown digits are centered on.
    pub(crate) anchor: ConfigVec2,
    pub(crate) announcer: NpcRole,
    pub(crate) announcement_text: String,
    pub(crate) announcement_offset_y: f32,
}

/// Everything that changes when the countdown reaches zero, applied once.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct TransitionPlan {
    pub(crate) to: Location,
    pub(crate) background: String,
    pub(crate) player_spawn: ConfigVec2,
    pub(crate) hide_npcs: Vec<NpcRole>,
    pub(crate) show_npcs: Vec<NpcRole>,
    pub(crate) relocate_npcs: Vec<NpcPlacement>,
    pub(crate) food: Vec<FoodPlacement>,
    pub(crate) menu_lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct NpcPlacement {
    pub(crate) role: NpcRole,
    pub(crate) position: ConfigVec2,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct FoodPlacement {
    pub(crate) item: String,
    pub(crate) position: ConfigVec2,
}

const QUEST_GIVER_TINT: [u8; 3] = [0xaa, 0xaa, 0xff];
const CAFETERIA_FOOD: [&str; 6] = [
    "fries",
    "hotdog",
    "hamburger",
    "taco",
    "chocolate_milkshake",
    "sprite",
];

fn default_true() -> bool {
    true
}

fn default_avatar_scale() -> f32 {
    2.0
}

fn default_avatar_half_extents() -> ConfigVec2 {
    ConfigVec2::new(24.0, 24.0)
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            world_size: ConfigVec2::new(1024.0, 1024.0),
            spawn_margin: 50.0,
            initial_background: "classroom".to_string(),
            proximity_threshold: 150.0,
            collect_sound: "collect".to_string(),
            interactable_half_extents: ConfigVec2::new(16.0, 16.0),
            player: PlayerConfig::default(),
            npcs: vec![
                NpcConfig {
                    role: NpcRole::QuestGiver,
                    variant: AvatarVariant::Unicorn,
                    position: ConfigVec2::new(875.0, 480.0),
                    tint: Some(QUEST_GIVER_TINT),
                    visible: true,
                    scale: default_avatar_scale(),
                    half_extents: default_avatar_half_extents(),
                },
                NpcConfig {
                    role: NpcRole::Teacher,
                    variant: AvatarVariant::Mermaid,
                    position: ConfigVec2::new(520.0, 300.0),
                    tint: None,
                    visible: true,
                    scale: default_avatar_scale(),
                    half_extents: default_avatar_half_extents(),
                },
                NpcConfig {
                    role: NpcRole::LunchLady,
                    variant: AvatarVariant::LunchLady,
                    position: ConfigVec2::new(1150.0, 400.0),
                    tint: None,
                    visible: false,
                    scale: default_avatar_scale(),
                    half_extents: default_avatar_half_extents(),
                },
            ],
            mission: MissionConfig::default(),
            countdown: CountdownConfig::default(),
            transition: TransitionPlan::default(),
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            variant: AvatarVariant::Unicorn,
            spawn: ConfigVec2::new(100.0, 100.0),
            speed: 320.0,
            scale: default_avatar_scale(),
            half_extents: default_avatar_half_extents(),
        }
    }
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            target_item: "sparkle".to_string(),
            min_target_separation: 300.0,
            max_sampling_attempts: 64,
            dialogue_offset_y: 120.0,
            offer_text: "Hi Elin! Can you find my lost sparkle?".to_string(),
            reminder_text: "Have you found my sparkle yet?".to_string(),
            complete_text: "You found it! Thank you so much!".to_string(),
        }
    }
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            steps: 5,
            interval_ms: 1000,
            anchor: ConfigVec2::new(520.0, 200.0),
            announcer: NpcRole::Teacher,
            announcement_text: "It is lunch time!".to_string(),
            announcement_offset_y: 50.0,
        }
    }
}

impl Default for TransitionPlan {
    fn default() -> Self {
        Self {
            to: Location::Cafeteria,
            background: "cafeteria".to_string(),
            player_spawn: ConfigVec2::new(100.0, 100.0),
            hide_npcs: vec![NpcRole::Teacher],
            show_npcs: vec![NpcRole::LunchLady],
            relocate_npcs: vec![NpcPlacement {
                role: NpcRole::QuestGiver,
                position: ConfigVec2::new(350.0, 390.0),
            }],
            food: CAFETERIA_FOOD
                .iter()
                .enumerate()
                .map(|(index, item)| FoodPlacement {
                    item: (*item).to_string(),
                    position: ConfigVec2::new(300.0, 20.0 + 100.0 * index as f32),
                })
                .collect(),
            menu_lines: [
                "MENU",
                "Hamburgers",
                "Hot Dogs",
                "Tacos",
                "French Fries",
                "Chocolate Milk Shake",
                "Sprite",
            ]
            .iter()
            .map(|line| (*line).to_string())
            .collect(),
        }
    }
}

impl ScenarioConfig {
    pub(crate) fn world_bounds(&self) -> Rect {
        Rect::from_size(self.world_size.x, self.world_size.y)
    }

    /// Where a mission target may appear: the world inset by the spawn margin.
    pub(crate) fn sampling_bounds(&self) -> Rect {
        self.world_bounds().inset(self.spawn_margin)
    }

    pub(crate) fn npc(&self, role: NpcRole) -> Option<&NpcConfig> {
        self.npcs.iter().find(|npc| npc.role == role)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("world_size.x", self.world_size.x)?;
        ensure_positive("world_size.y", self.world_size.y)?;
        ensure_non_negative("spawn_margin", self.spawn_margin)?;
        ensure_positive("proximity_threshold", self.proximity_threshold)?;
        ensure_positive("player.speed", self.player.speed)?;
        ensure_positive("player.scale", self.player.scale)?;
        ensure_positive("mission.min_target_separation", self.mission.min_target_separation)?;
        ensure_sprite_key("initial_background", &self.initial_background)?;
        ensure_sprite_key("mission.target_item", &self.mission.target_item)?;
        ensure_sprite_key("transition.background", &self.transition.background)?;

        if self.collect_sound.trim().is_empty() {
            return Err(invalid("collect_sound", "must not be empty"));
        }
        if self.mission.max_sampling_attempts == 0 {
            return Err(invalid("mission.max_sampling_attempts", "must be at least 1"));
        }
        if self.countdown.steps == 0 {
            return Err(invalid("countdown.steps", "must be at least 1"));
        }
        if self.countdown.interval_ms == 0 {
            return Err(invalid("countdown.interval_ms", "must be at least 1"));
        }

        let bounds = self.sampling_bounds();
        let diagonal = (bounds.width() * bounds.width() + bounds.height() * bounds.height()).sqrt();
        if self.mission.min_target_separation >= diagonal {
            return Err(invalid(
                "mission.min_target_separation",
                format!(
                    "{} must be smaller than the sampling area diagonal {diagonal:.1}",
                    self.mission.min_target_separation
                ),
            ));
        }

        let quest_givers = self
            .npcs
            .iter()
            .filter(|npc| npc.role == NpcRole::QuestGiver)
            .count();
        if quest_givers != 1 {
            return Err(invalid(
                "npcs",
                format!("expected exactly one quest_giver, found {quest_givers}"),
            ));
        }
        for (index, npc) in self.npcs.iter().enumerate() {
            ensure_positive(&format!("npcs[{index}].scale"), npc.scale)?;
            if self.npcs[..index].iter().any(|other| other.role == npc.role) {
                return Err(invalid(
                    format!("npcs[{index}].role"),
                    format!("{:?} is listed more than once", npc.role),
                ));
            }
        }
        if self.npc(self.countdown.announcer).is_none() {
            return Err(invalid(
                "countdown.announcer",
                format!("{:?} is not one of the configured npcs", self.countdown.announcer),
            ));
        }

        if self.transition.food.is_empty() {
            return Err(invalid("transition.food", "must list at least one item"));
        }
        for (index, food) in self.transition.food.iter().enumerate() {
            ensure_sprite_key(&format!("transition.food[{index}].item"), &food.item)?;
        }
        let placed_roles = self
            .transition
            .hide_npcs
            .iter()
            .chain(self.transition.show_npcs.iter())
            .copied()
            .chain(self.transition.relocate_npcs.iter().map(|placement| placement.role));
        for role in placed_roles {
            if self.npc(role).is_none() {
                return Err(invalid(
                    "transition",
                    format!("{role:?} is not one of the configured npcs"),
                ));
            }
        }
        Ok(())
    }
}

fn invalid(path: impl Into<String>, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        path: path.into(),
        message: message.into(),
    }
}

fn ensure_positive(path: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(path, format!("must be a positive number, got {value}")))
    }
}

fn ensure_non_negative(path: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(path, format!("must be zero or positive, got {value}")))
    }
}

fn ensure_sprite_key(path: &str, key: &str) -> Result<(), ConfigError> {
    validate_sprite_key(key).map_err(|source| ConfigError::SpriteKey {
        path: path.to_string(),
        source,
    })
}

pub(crate) fn parse_scenario_json(raw: &str) -> Result<ScenarioConfig, ConfigError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    match serde_path_to_error::deserialize::<_, ScenarioConfig>(&mut deserializer) {
        Ok(config) => Ok(config),
        Err(error) => {
            let path = error.path().to_string();
            let source = error.into_inner();
            if path.is_empty() || path == "." {
                Err(ConfigError::Parse(format!("parse scenario json: {source}")))
            } else {
                Err(ConfigError::Parse(format!(
                    "parse scenario json at {path}: {source}"
                )))
            }
        }
    }
}

pub(crate) fn load_scenario_file(path: &Path) -> Result<ScenarioConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_scenario_json(&raw)?;
    config.validate()?;
    Ok(config)
}

/// The reference scenario unless `SCHOOLDAY_SCENARIO` names a JSON file.
pub(crate) fn load_scenario_from_env() -> Result<ScenarioConfig, ConfigError> {
    match env::var(SCENARIO_ENV_VAR) {
        Ok(path) => load_scenario_file(Path::new(&path)),
        Err(env::VarError::NotPresent) => {
            let config = ScenarioConfig::default();
            config.validate()?;
            Ok(config)
        }
        Err(source) => Err(ConfigError::EnvVar {
            var: SCENARIO_ENV_VAR,
            source,
        }),
    }
}

pub(crate) fn seed_from_env() -> Result<Option<u64>, ConfigError> {
    match env::var(SEED_ENV_VAR) {
        Ok(value) => parse_seed(&value).map(Some),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(source) => Err(ConfigError::EnvVar {
            var: SEED_ENV_VAR,
            source,
        }),
    }
}

fn parse_seed(value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::InvalidSeed {
            var: SEED_ENV_VAR,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reference_scenario_is_valid() {
        let config = ScenarioConfig::default();
        config.validate().expect("reference scenario");
        assert_eq!(config.proximity_threshold, 150.0);
        assert_eq!(config.mission.min_target_separation, 300.0);
        assert_eq!(config.countdown.steps, 5);
        assert_eq!(config.transition.food.len(), 6);
        assert_eq!(
            config.transition.food[5].position,
            ConfigVec2::new(300.0, 520.0)
        );
    }

    #[test]
    fn empty_json_yields_reference_scenario() {
        let config = parse_scenario_json("{}").expect("parse");
        assert_eq!(config.npcs.len(), 3);
        assert_eq!(config.mission.target_item, "sparkle");
        assert_eq!(config.transition.to, Location::Cafeteria);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let raw = json!({
            "proximity_threshold": 90.0,
            "mission": { "target_item": "gem" },
            "countdown": { "steps": 3 }
        })
        .to_string();
        let config = parse_scenario_json(&raw).expect("parse");
        assert_eq!(config.proximity_threshold, 90.0);
        assert_eq!(config.mission.target_item, "gem");
        assert_eq!(config.mission.min_target_separation, 300.0);
        assert_eq!(config.countdown.steps, 3);
        assert_eq!(config.countdown.interval_ms, 1000);
        config.validate().expect("valid");
    }

    #[test]
    fn parse_error_reports_json_path() {
        let raw = json!({ "countdown": { "steps": "five" } }).to_string();
        let error = parse_scenario_json(&raw).expect_err("type mismatch");
        assert!(error.to_string().contains("countdown.steps"), "{error}");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let raw = json!({ "mission": { "target": "sparkle" } }).to_string();
        let error = parse_scenario_json(&raw).expect_err("unknown field");
        assert!(error.to_string().contains("mission"), "{error}");
    }

    #[test]
    fn npc_entries_default_visibility_and_scale() {
        let raw = json!({
            "npcs": [
                { "role": "quest_giver", "variant": "unicorn", "position": { "x": 10.0, "y": 20.0 } },
                { "role": "teacher", "variant": "mermaid", "position": { "x": 30.0, "y": 40.0 }, "visible": false }
            ],
            "transition": { "hide_npcs": ["teacher"], "show_npcs": [], "relocate_npcs": [] }
        })
        .to_string();
        let config = parse_scenario_json(&raw).expect("parse");
        assert!(config.npcs[0].visible);
        assert!(!config.npcs[1].visible);
        assert_eq!(config.npcs[0].scale, 2.0);
        config.validate().expect("valid");
    }

    #[test]
    fn exclusion_radius_must_fit_sampling_area() {
        let mut config = ScenarioConfig::default();
        config.mission.min_target_separation = 5000.0;
        let error = config.validate().expect_err("too far");
        assert!(matches!(
            error,
            ConfigError::Invalid { ref path, .. } if path == "mission.min_target_separation"
        ));
    }

    #[test]
    fn non_positive_threshold_is_rejected() {
        let mut config = ScenarioConfig::default();
        config.proximity_threshold = 0.0;
        assert!(config.validate().is_err());
        config.proximity_threshold = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_food_set_is_rejected() {
        let mut config = ScenarioConfig::default();
        config.transition.food.clear();
        let error = config.validate().expect_err("no food");
        assert!(error.to_string().contains("transition.food"), "{error}");
    }

    #[test]
    fn invalid_item_key_is_rejected() {
        let mut config = ScenarioConfig::default();
        config.transition.food[2].item = "Ham Burger".to_string();
        let error = config.validate().expect_err("bad key");
        assert!(matches!(error, ConfigError::SpriteKey { ref path, .. } if path == "transition.food[2].item"));
    }

    #[test]
    fn exactly_one_quest_giver_is_required() {
        let mut config = ScenarioConfig::default();
        config.npcs.retain(|npc| npc.role != NpcRole::QuestGiver);
        assert!(config.validate().is_err());
    }

    #[test]
    fn transition_must_reference_configured_npcs() {
        let mut config = ScenarioConfig::default();
        config.npcs.retain(|npc| npc.role != NpcRole::LunchLady);
        let error = config.validate().expect_err("missing lunch lady");
        assert!(error.to_string().contains("transition"), "{error}");
    }

    #[test]
    fn sampling_bounds_inset_world_by_margin() {
        let bounds = ScenarioConfig::default().sampling_bounds();
        assert_eq!(bounds.min, Vec2::new(50.0, 50.0));
        assert_eq!(bounds.max, Vec2::new(974.0, 974.0));
    }

    #[test]
    fn seed_parsing_accepts_integers_only() {
        assert_eq!(parse_seed(" 42 ").expect("seed"), 42);
        assert!(matches!(
            parse_seed("forty-two"),
            Err(ConfigError::InvalidSeed { .. })
        ));
    }

    #[test]
    fn load_scenario_file_reports_missing_file() {
        let error = load_scenario_file(Path::new("/definitely/not/here/scenario.json"))
            .expect_err("missing");
        assert!(matches!(error, ConfigError::Read { .. }));
    }
}
