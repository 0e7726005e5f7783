use engine::Vec2;
use tracing::{debug, info, warn};

use super::inventory::Inventory;
use super::proximity::is_near;

/// Declaration order is progression order; phases only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum MissionPhase {
    NotOffered,
    Offered,
    ItemCollected,
    Resolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DialogueLine {
    Offer,
    Reminder,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MissionEffect {
    SpawnTarget,
    BeginTransition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MissionStep {
    /// `None` hides the dialogue.
    pub(crate) dialogue: Option<DialogueLine>,
    pub(crate) effect: Option<MissionEffect>,
}

impl MissionStep {
    const HIDDEN: Self = Self {
        dialogue: None,
        effect: None,
    };

    fn show(line: DialogueLine, effect: Option<MissionEffect>) -> Self {
        Self {
            dialogue: Some(line),
            effect,
        }
    }
}

#[derive(Debug)]
pub(crate) struct Mission {
    phase: MissionPhase,
    target_item: String,
}

impl Mission {
    pub(crate) fn new(target_item: impl Into<String>) -> Self {
        Self {
            phase: MissionPhase::NotOffered,
            target_item: target_item.into(),
        }
    }

    pub(crate) fn phase(&self) -> MissionPhase {
        self.phase
    }

    pub(crate) fn target_item(&self) -> &str {
        &self.target_item
    }

    /// Evaluated once per tick while the giver's location is active. Away
    /// from the giver nothing changes and the dialogue is hidden.
    pub(crate) fn on_tick(
        &mut self,
        player: Vec2,
        giver: Vec2,
        threshold: f32,
        inventory: &mut Inventory,
    ) -> MissionStep {
        if !is_near(player, giver, threshold) {
            return MissionStep::HIDDEN;
        }

        match self.phase {
            MissionPhase::NotOffered => {
                self.advance(MissionPhase::Offered);
                MissionStep::show(DialogueLine::Offer, Some(MissionEffect::SpawnTarget))
            }
            MissionPhase::Offered => MissionStep::show(DialogueLine::Reminder, None),
            MissionPhase::ItemCollected => {
                let consumed = inventory.remove(&self.target_item);
                self.advance(MissionPhase::Resolved);
                if consumed {
                    MissionStep::show(DialogueLine::Complete, Some(MissionEffect::BeginTransition))
                } else {
                    warn!(
                        item = self.target_item.as_str(),
                        "mission_item_missing_at_resolution"
                    );
                    MissionStep::show(DialogueLine::Complete, None)
                }
            }
            MissionPhase::Resolved => MissionStep::show(DialogueLine::Complete, None),
        }
    }

    /// Returns true when the event was accepted and the item added.
    pub(crate) fn on_target_collected(&mut self, inventory: &mut Inventory) -> bool {
        if self.phase != MissionPhase::Offered {
            debug!(phase = ?self.phase, "target_collected_ignored");
            return false;
        }
        inventory.add(&self.target_item);
        self.advance(MissionPhase::ItemCollected);
        true
    }

    fn advance(&mut self, next: MissionPhase) {
        if next <= self.phase {
            return;
        }
        info!(from = ?self.phase, to = ?next, "mission_phase_changed");
        self.phase = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GIVER: Vec2 = Vec2::new(875.0, 480.0);
    const NEAR: Vec2 = Vec2::new(825.0, 480.0);
    const FAR: Vec2 = Vec2::new(100.0, 100.0);

    fn tick(mission: &mut Mission, player: Vec2, inventory: &mut Inventory) -> MissionStep {
        mission.on_tick(player, GIVER, 150.0, inventory)
    }

    #[test]
    fn far_player_sees_nothing_and_changes_nothing() {
        let mut mission = Mission::new("sparkle");
        let mut inventory = Inventory::new();
        assert_eq!(tick(&mut mission, FAR, &mut inventory), MissionStep::HIDDEN);
        assert_eq!(mission.phase(), MissionPhase::NotOffered);
    }

    #[test]
    fn first_approach_offers_and_spawns_target() {
        let mut mission = Mission::new("sparkle");
        let mut inventory = Inventory::new();
        let step = tick(&mut mission, NEAR, &mut inventory);
        assert_eq!(step.dialogue, Some(DialogueLine::Offer));
        assert_eq!(step.effect, Some(MissionEffect::SpawnTarget));
        assert_eq!(mission.phase(), MissionPhase::Offered);

        let again = tick(&mut mission, NEAR, &mut inventory);
        assert_eq!(again.dialogue, Some(DialogueLine::Reminder));
        assert_eq!(again.effect, None);
    }

    #[test]
    fn collection_before_offer_is_a_no_op() {
        let mut mission = Mission::new("sparkle");
        let mut inventory = Inventory::new();
        assert!(!mission.on_target_collected(&mut inventory));
        assert!(inventory.contents().is_empty());
        assert_eq!(mission.phase(), MissionPhase::NotOffered);
    }

    #[test]
    fn collection_is_accepted_once() {
        let mut mission = Mission::new("sparkle");
        let mut inventory = Inventory::new();
        tick(&mut mission, NEAR, &mut inventory);
        assert!(mission.on_target_collected(&mut inventory));
        assert!(!mission.on_target_collected(&mut inventory));
        assert_eq!(inventory.contents(), ["sparkle"]);
        assert_eq!(mission.phase(), MissionPhase::ItemCollected);
    }

    #[test]
    fn returning_with_item_resolves_and_consumes_it() {
        let mut mission = Mission::new("sparkle");
        let mut inventory = Inventory::new();
        tick(&mut mission, NEAR, &mut inventory);
        mission.on_target_collected(&mut inventory);
        inventory.add("fries");

        let step = tick(&mut mission, NEAR, &mut inventory);
        assert_eq!(step.dialogue, Some(DialogueLine::Complete));
        assert_eq!(step.effect, Some(MissionEffect::BeginTransition));
        assert_eq!(inventory.contents(), ["fries"]);
        assert_eq!(mission.phase(), MissionPhase::Resolved);

        let after = tick(&mut mission, NEAR, &mut inventory);
        assert_eq!(after.dialogue, Some(DialogueLine::Complete));
        assert_eq!(after.effect, None);
    }

    #[test]
    fn missing_item_still_resolves_without_transition() {
        let mut mission = Mission::new("sparkle");
        let mut inventory = Inventory::new();
        tick(&mut mission, NEAR, &mut inventory);
        mission.on_target_collected(&mut inventory);
        inventory.remove("sparkle");

        let step = tick(&mut mission, NEAR, &mut inventory);
        assert_eq!(step.effect, None);
        assert_eq!(mission.phase(), MissionPhase::Resolved);
    }

    #[test]
    fn phases_never_move_backward() {
        let mut mission = Mission::new("sparkle");
        let mut inventory = Inventory::new();
        let mut previous = mission.phase();
        let script = [NEAR, FAR, NEAR, NEAR, FAR, NEAR, NEAR, FAR];
        for (index, player) in script.iter().enumerate() {
            if index == 3 {
                mission.on_target_collected(&mut inventory);
            }
            tick(&mut mission, *player, &mut inventory);
            mission.on_target_collected(&mut inventory);
            assert!(mission.phase() >= previous, "step={index}");
            previous = mission.phase();
        }
        assert_eq!(mission.phase(), MissionPhase::Resolved);
    }

    #[test]
    fn dialogue_visibility_tracks_proximity_in_every_phase() {
        let mut mission = Mission::new("sparkle");
        let mut inventory = Inventory::new();
        for _ in 0..4 {
            assert!(tick(&mut mission, FAR, &mut inventory).dialogue.is_none());
            assert!(tick(&mut mission, NEAR, &mut inventory).dialogue.is_some());
            mission.on_target_collected(&mut inventory);
        }
        assert_eq!(mission.phase(), MissionPhase::Resolved);
    }
}
