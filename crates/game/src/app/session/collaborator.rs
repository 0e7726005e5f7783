use std::time::Duration;

use engine::{EntityId, TimerId, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InteractableKind {
    /// Collected by walking over it.
    MissionTarget,
    /// Collected by clicking it while close enough.
    Food,
}

impl InteractableKind {
    pub(crate) fn debug_name(self) -> &'static str {
        match self {
            Self::MissionTarget => "mission_target",
            Self::Food => "food",
        }
    }
}

/// The rendering/physics side the session drives. Positions are world units,
/// y down.
pub(crate) trait WorldPort {
    fn position(&self, entity: EntityId) -> Option<Vec2>;
    fn set_position(&mut self, entity: EntityId, position: Vec2);
    fn set_visible(&mut self, entity: EntityId, visible: bool);
    fn set_body_enabled(&mut self, entity: EntityId, enabled: bool);
    fn set_background(&mut self, key: &str);
    fn play_sound(&mut self, sound_id: &str);
    fn schedule_repeating(&mut self, interval: Duration, times: u32) -> TimerId;
    /// Spawns a visible, enabled entity showing `item_id` at `position`.
    fn spawn_interactable(
        &mut self,
        kind: InteractableKind,
        item_id: &str,
        position: Vec2,
    ) -> EntityId;

    /// Hides the entity and disables its body; the handle stays valid.
    fn deactivate(&mut self, entity: EntityId) {
        self.set_visible(entity, false);
        self.set_body_enabled(entity, false);
    }
}
