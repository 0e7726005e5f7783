//! Scene progression for one play session: inventory, the fetch mission, the
//! classroom to cafeteria transition and the routing between them.
//!
//! The session never touches the engine directly. Each tick it reads and
//! drives the world through [`WorldPort`], queues display changes, and the
//! caller delivers them to a [`DisplaySink`] with [`Session::flush_display`].

mod collaborator;
mod dispatcher;
mod display;
mod inventory;
mod location;
mod mission;
mod proximity;


use std::time::Duration;

use engine::{EntityId, TimerFired, Vec2};
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

pub(crate) use collaborator::{InteractableKind, WorldPort};
pub(crate) use dispatcher::RawEvent;
pub(crate) use display::DisplaySink;
pub(crate) use location::Location;
pub(crate) use mission::MissionPhase;

use dispatcher::{Interactable, InteractionDispatcher, InteractionEvent};
use display::{DisplayCommand, DisplayQueue};
use inventory::Inventory;
use location::{CountdownEvent, LocationController};
#[cfg(test)]
use location::TransitionState;
use mission::{DialogueLine, Mission, MissionEffect};
use proximity::{is_near, random_far_position};

use super::config::{NpcRole, ScenarioConfig, TransitionPlan};

/// Engine handles for the characters the session moves and toggles.
#[derive(Debug, Clone)]
pub(crate) struct SessionActors {
    pub(crate) player: EntityId,
    pub(crate) npcs: Vec<(NpcRole, EntityId)>,
}

impl SessionActors {
    fn npc(&self, role: NpcRole) -> Option<EntityId> {
        self.npcs
            .iter()
            .find(|(npc_role, _)| *npc_role == role)
            .map(|(_, id)| *id)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct DialogueState {
    text: String,
    position: Vec2,
    visible: bool,
}

pub(crate) struct Session {
    config: ScenarioConfig,
    actors: SessionActors,
    inventory: Inventory,
    published_inventory_revision: Option<u64>,
    mission: Mission,
    location: LocationController,
    dispatcher: InteractionDispatcher,
    display: DisplayQueue,
    dialogue: Option<DialogueState>,
    rng: StdRng,
}

impl Session {
    /// A fresh session: mission not offered, empty inventory, in the classroom.
    pub(crate) fn new(config: ScenarioConfig, actors: SessionActors, rng: StdRng) -> Self {
        let mission = Mission::new(config.mission.target_item.clone());
        Self {
            config,
            actors,
            inventory: Inventory::new(),
            published_inventory_revision: None,
            mission,
            location: LocationController::new(Location::Classroom),
            dispatcher: InteractionDispatcher::default(),
            display: DisplayQueue::default(),
            dialogue: None,
            rng,
        }
    }

    /// Publishes the initial background, location, empty inventory and
    /// hidden dialogue.
    pub(crate) fn start(&mut self, port: &mut impl WorldPort) {
        port.set_background(&self.config.initial_background);
        self.display
            .enqueue(DisplayCommand::Location(self.location.current()));
        self.set_dialogue(DialogueState {
            text: String::new(),
            position: Vec2::default(),
            visible: false,
        });
        self.queue_inventory_if_changed();
    }

    /// One simulation step: countdown timers first, then interaction events,
    /// then the proximity-driven mission evaluation.
    pub(crate) fn tick(
        &mut self,
        port: &mut impl WorldPort,
        events: &[RawEvent],
        fired_timers: &[TimerFired],
    ) {
        for fired in fired_timers {
            self.handle_timer(*fired, port);
        }
        for event in events {
            if let Some(routed) = self.dispatcher.route(*event, self.actors.player) {
                self.handle_interaction(routed, port);
                self.queue_inventory_if_changed();
            }
        }
        self.evaluate_mission(port);
    }

    pub(crate) fn flush_display(&mut self, sink: &mut impl DisplaySink) {
        self.display.flush(sink);
    }

    pub(crate) fn phase(&self) -> MissionPhase {
        self.mission.phase()
    }

    #[cfg(test)]
    pub(crate) fn location(&self) -> Location {
        self.location.current()
    }

    pub(crate) fn inventory(&self) -> &[String] {
        self.inventory.contents()
    }

    fn handle_interaction(&mut self, event: InteractionEvent, port: &mut impl WorldPort) {
        match event {
            InteractionEvent::TargetCollected { handle } => {
                if !self.mission.on_target_collected(&mut self.inventory) {
                    return;
                }
                self.dispatcher.deactivate(handle);
                port.deactivate(handle);
                port.play_sound(&self.config.collect_sound);
                info!(
                    item = self.mission.target_item(),
                    inventory_len = self.inventory.contents().len(),
                    "item_collected"
                );
            }
            InteractionEvent::FoodActivated { handle } => {
                let Some(food) = self.dispatcher.interactable(handle) else {
                    return;
                };
                let (food_position, item_id) = (food.position, food.item_id.clone());
                let Some(player) = port.position(self.actors.player) else {
                    return;
                };
                if !is_near(player, food_position, self.config.proximity_threshold) {
                    debug!(
                        item = item_id.as_str(),
                        distance = player.distance(food_position),
                        "food_out_of_reach"
                    );
                    return;
                }
                if !self.dispatcher.deactivate(handle) {
                    return;
                }
                port.deactivate(handle);
                self.inventory.add(&item_id);
                port.play_sound(&self.config.collect_sound);
                info!(
                    item = item_id.as_str(),
                    inventory_len = self.inventory.contents().len(),
                    "item_collected"
                );
            }
        }
    }

    fn evaluate_mission(&mut self, port: &mut impl WorldPort) {
        if self.location.current() != Location::Classroom {
            return;
        }
        let Some(giver_id) = self.actors.npc(NpcRole::QuestGiver) else {
            return;
        };
        let (Some(player), Some(giver)) =
            (port.position(self.actors.player), port.position(giver_id))
        else {
            return;
        };

        let step = self.mission.on_tick(
            player,
            giver,
            self.config.proximity_threshold,
            &mut self.inventory,
        );
        self.queue_inventory_if_changed();
        match step.dialogue {
            Some(line) => {
                let text = self.dialogue_text(line).to_string();
                self.set_dialogue(DialogueState {
                    text,
                    position: Vec2::new(giver.x, giver.y - self.config.mission.dialogue_offset_y),
                    visible: true,
                });
            }
            None => self.hide_dialogue(),
        }

        match step.effect {
            Some(MissionEffect::SpawnTarget) => self.spawn_mission_target(giver, port),
            Some(MissionEffect::BeginTransition) => self.begin_transition(port),
            None => {}
        }
    }

    fn dialogue_text(&self, line: DialogueLine) -> &str {
        let texts = &self.config.mission;
        match line {
            DialogueLine::Offer => &texts.offer_text,
            DialogueLine::Reminder => &texts.reminder_text,
            DialogueLine::Complete => &texts.complete_text,
        }
    }

    fn spawn_mission_target(&mut self, giver: Vec2, port: &mut impl WorldPort) {
        let placement = random_far_position(
            &mut self.rng,
            self.config.sampling_bounds(),
            giver,
            self.config.mission.min_target_separation,
            self.config.mission.max_sampling_attempts,
        );
        if !placement.satisfied {
            warn!(
                attempts = placement.attempts,
                distance = placement.distance,
                min_distance = self.config.mission.min_target_separation,
                "target_spawn_fallback"
            );
        }
        let item_id = self.config.mission.target_item.clone();
        let handle =
            port.spawn_interactable(InteractableKind::MissionTarget, &item_id, placement.position);
        info!(
            item = item_id.as_str(),
            x = placement.position.x,
            y = placement.position.y,
            attempts = placement.attempts,
            "mission_target_spawned"
        );
        self.dispatcher.register(Interactable {
            handle,
            kind: InteractableKind::MissionTarget,
            item_id,
            position: placement.position,
            active: true,
        });
    }

    fn begin_transition(&mut self, port: &mut impl WorldPort) {
        let countdown = &self.config.countdown;
        let started = self.location.trigger_transition(
            self.location.current(),
            self.config.transition.clone(),
            countdown.steps,
            Duration::from_millis(countdown.interval_ms),
            port,
        );
        let Some(first_value) = started else {
            return;
        };
        self.display
            .enqueue(DisplayCommand::Countdown(Some(first_value)));

        let announcer = self
            .actors
            .npc(self.config.countdown.announcer)
            .and_then(|id| port.position(id));
        if let Some(announcer) = announcer {
            self.display.enqueue(DisplayCommand::Announcement {
                text: Some(self.config.countdown.announcement_text.clone()),
                position: Vec2::new(
                    announcer.x,
                    announcer.y - self.config.countdown.announcement_offset_y,
                ),
            });
        }
    }

    fn handle_timer(&mut self, fired: TimerFired, port: &mut impl WorldPort) {
        match self.location.on_timer_fired(fired) {
            Some(CountdownEvent::Step { remaining }) => {
                self.display
                    .enqueue(DisplayCommand::Countdown(Some(remaining)));
            }
            Some(CountdownEvent::Arrive(plan)) => self.arrive(plan, port),
            None => {}
        }
    }

    /// Applies the transition plan in one go once the countdown reaches zero.
    fn arrive(&mut self, plan: TransitionPlan, port: &mut impl WorldPort) {
        self.display.enqueue(DisplayCommand::Countdown(None));
        port.set_background(&plan.background);
        port.set_position(self.actors.player, plan.player_spawn.to_vec2());
        self.display.enqueue(DisplayCommand::Announcement {
            text: None,
            position: Vec2::default(),
        });

        for role in &plan.hide_npcs {
            if let Some(id) = self.actors.npc(*role) {
                port.set_visible(id, false);
                port.set_body_enabled(id, false);
            }
        }
        for role in &plan.show_npcs {
            if let Some(id) = self.actors.npc(*role) {
                port.set_visible(id, true);
                port.set_body_enabled(id, true);
            }
        }
        for placement in &plan.relocate_npcs {
            if let Some(id) = self.actors.npc(placement.role) {
                port.set_position(id, placement.position.to_vec2());
            }
        }

        self.location.complete_transition(plan.to);
        self.display
            .enqueue(DisplayCommand::Location(self.location.current()));
        self.hide_dialogue();

        for food in &plan.food {
            let position = food.position.to_vec2();
            let handle = port.spawn_interactable(InteractableKind::Food, &food.item, position);
            self.dispatcher.register(Interactable {
                handle,
                kind: InteractableKind::Food,
                item_id: food.item.clone(),
                position,
                active: true,
            });
        }
        if !plan.menu_lines.is_empty() {
            self.display
                .enqueue(DisplayCommand::MenuBoard(plan.menu_lines.clone()));
        }
        debug!(
            food_count = self.dispatcher.active_count(InteractableKind::Food),
            state = ?self.location.state(),
            "transition_applied"
        );
    }

    fn set_dialogue(&mut self, next: DialogueState) {
        if self.dialogue.as_ref() == Some(&next) {
            return;
        }
        self.display.enqueue(DisplayCommand::Dialogue {
            text: next.text.clone(),
            position: next.position,
            visible: next.visible,
        });
        self.dialogue = Some(next);
    }

    fn hide_dialogue(&mut self) {
        let Some(current) = self.dialogue.clone() else {
            return;
        };
        self.set_dialogue(DialogueState {
            visible: false,
            ..current
        });
    }

    /// Called after every step that may mutate the inventory, so each
    /// mutation reaches the display as its own refresh.
    fn queue_inventory_if_changed(&mut self) {
        let revision = self.inventory.revision();
        if self.published_inventory_revision == Some(revision) {
            return;
        }
        self.published_inventory_revision = Some(revision);
        self.display.enqueue(DisplayCommand::Inventory(
            self.inventory.contents().to_vec(),
        ));
    }

    #[cfg(test)]
    fn transition_state(&self) -> TransitionState {
        self.location.state()
    }

    #[cfg(test)]
    fn interactables(&self) -> &[Interactable] {
        self.dispatcher.interactables()
    }
}
