use engine::{EntityId, Vec2};

use super::collaborator::InteractableKind;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Interactable {
    pub(crate) handle: EntityId,
    pub(crate) kind: InteractableKind,
    pub(crate) item_id: String,
    pub(crate) position: Vec2,
    pub(crate) active: bool,
}

/// Raw notifications from the physics/input side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RawEvent {
    Overlap { actor: EntityId, target: EntityId },
    Activated { target: EntityId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InteractionEvent {
    TargetCollected { handle: EntityId },
    FoodActivated { handle: EntityId },
}

/// Owns the interactable set and maps each raw event to at most one typed
/// event. Inactive interactables never match.
#[derive(Debug, Default)]
pub(crate) struct InteractionDispatcher {
    interactables: Vec<Interactable>,
}

impl InteractionDispatcher {
    pub(crate) fn register(&mut self, interactable: Interactable) {
        self.interactables.push(interactable);
    }

    pub(crate) fn route(&self, event: RawEvent, player: EntityId) -> Option<InteractionEvent> {
        match event {
            RawEvent::Overlap { actor, target } if actor == player => {
                self.find_active(target, InteractableKind::MissionTarget)
                    .map(|found| InteractionEvent::TargetCollected {
                        handle: found.handle,
                    })
            }
            RawEvent::Overlap { .. } => None,
            RawEvent::Activated { target } => self
                .find_active(target, InteractableKind::Food)
                .map(|found| InteractionEvent::FoodActivated {
                    handle: found.handle,
                }),
        }
    }

    fn find_active(&self, handle: EntityId, kind: InteractableKind) -> Option<&Interactable> {
        self.interactables
            .iter()
            .find(|entry| entry.active && entry.handle == handle && entry.kind == kind)
    }

    pub(crate) fn interactable(&self, handle: EntityId) -> Option<&Interactable> {
        self.interactables.iter().find(|entry| entry.handle == handle)
    }

    /// Returns false when the handle is unknown or already inactive.
    pub(crate) fn deactivate(&mut self, handle: EntityId) -> bool {
        match self
            .interactables
            .iter_mut()
            .find(|entry| entry.handle == handle && entry.active)
        {
            Some(entry) => {
                entry.active = false;
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    pub(crate) fn interactables(&self) -> &[Interactable] {
        &self.interactables
    }

    pub(crate) fn active_count(&self, kind: InteractableKind) -> usize {
        self.interactables
            .iter()
            .filter(|entry| entry.active && entry.kind == kind)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAYER: EntityId = EntityId(1);

    fn dispatcher_with(entries: &[(u64, InteractableKind)]) -> InteractionDispatcher {
        let mut dispatcher = InteractionDispatcher::default();
        for (id, kind) in entries {
            dispatcher.register(Interactable {
                handle: EntityId(*id),
                kind: *kind,
                item_id: "sparkle".to_string(),
                position: Vec2::default(),
                active: true,
            });
        }
        dispatcher
    }

    #[test]
    fn player_overlap_with_target_routes_to_collection() {
        let dispatcher = dispatcher_with(&[(10, InteractableKind::MissionTarget)]);
        assert_eq!(
            dispatcher.route(
                RawEvent::Overlap {
                    actor: PLAYER,
                    target: EntityId(10)
                },
                PLAYER
            ),
            Some(InteractionEvent::TargetCollected {
                handle: EntityId(10)
            })
        );
    }

    #[test]
    fn overlaps_from_other_actors_are_ignored() {
        let dispatcher = dispatcher_with(&[(10, InteractableKind::MissionTarget)]);
        let event = RawEvent::Overlap {
            actor: EntityId(2),
            target: EntityId(10),
        };
        assert_eq!(dispatcher.route(event, PLAYER), None);
    }

    #[test]
    fn food_reacts_to_activation_not_overlap() {
        let dispatcher = dispatcher_with(&[(20, InteractableKind::Food)]);
        let overlap = RawEvent::Overlap {
            actor: PLAYER,
            target: EntityId(20),
        };
        let click = RawEvent::Activated {
            target: EntityId(20),
        };
        assert_eq!(dispatcher.route(overlap, PLAYER), None);
        assert_eq!(
            dispatcher.route(click, PLAYER),
            Some(InteractionEvent::FoodActivated {
                handle: EntityId(20)
            })
        );
    }

    #[test]
    fn deactivated_interactables_no_longer_match() {
        let mut dispatcher = dispatcher_with(&[(20, InteractableKind::Food)]);
        assert!(dispatcher.deactivate(EntityId(20)));
        assert!(!dispatcher.deactivate(EntityId(20)));
        let click = RawEvent::Activated {
            target: EntityId(20),
        };
        assert_eq!(dispatcher.route(click, PLAYER), None);
        assert_eq!(dispatcher.active_count(InteractableKind::Food), 0);
        assert!(dispatcher.interactable(EntityId(20)).is_some());
    }
}
