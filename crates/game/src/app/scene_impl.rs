use std::time::Duration;

use engine::{
    Body, BodyKind, EntityId, InputSnapshot, LabelAnchor, LabelDesc, LabelId, LabelStyle,
    MovementIntents, RenderableDesc, RenderableKind, Scene, SceneCommand, SceneWorld, TimerId,
    Transform, Vec2,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use super::config::{NpcRole, ScenarioConfig};
use super::session::{
    DisplaySink, InteractableKind, Location, RawEvent, Session, SessionActors, WorldPort,
};

/// Screen-space center of the cafeteria menu board.
const MENU_BOARD_ANCHOR: Vec2 = Vec2::new(760.0, 250.0);

struct SceneLabels {
    dialogue: LabelId,
    countdown: LabelId,
    announcement: LabelId,
    menu_board: LabelId,
}

struct LoadedState {
    session: Session,
    player: EntityId,
    labels: SceneLabels,
    location: Location,
}

/// The school day as an engine scene: spawns the cast, feeds physics and
/// pointer events into the session and mirrors its display changes onto
/// labels and the HUD.
pub(crate) struct SchoolScene {
    config: ScenarioConfig,
    seed: Option<u64>,
    state: Option<LoadedState>,
}

impl SchoolScene {
    pub(crate) fn new(config: ScenarioConfig, seed: Option<u64>) -> Self {
        Self {
            config,
            seed,
            state: None,
        }
    }

    fn spawn_player(&self, world: &mut SceneWorld) -> EntityId {
        let player = &self.config.player;
        let id = world.spawn_with_body(
            Transform {
                position: player.spawn.to_vec2(),
            },
            RenderableDesc {
                kind: RenderableKind::Sprite(player.variant.sprite_key().to_string()),
                debug_name: "player",
            },
            Body::new(BodyKind::Dynamic, player.half_extents.to_vec2()),
        );
        if let Some(entity) = world.find_entity_mut(id) {
            entity.scale = player.scale;
        }
        world.set_camera_target(Some(id));
        id
    }

    fn spawn_npcs(&self, world: &mut SceneWorld) -> Vec<(NpcRole, EntityId)> {
        self.config
            .npcs
            .iter()
            .map(|npc| {
                let id = world.spawn_with_body(
                    Transform {
                        position: npc.position.to_vec2(),
                    },
                    RenderableDesc {
                        kind: RenderableKind::Sprite(npc.variant.sprite_key().to_string()),
                        debug_name: "npc",
                    },
                    Body::new(BodyKind::Static, npc.half_extents.to_vec2()),
                );
                if let Some(entity) = world.find_entity_mut(id) {
                    entity.tint = npc.tint;
                    entity.scale = npc.scale;
                    entity.visible = npc.visible;
                    if let Some(body) = entity.body.as_mut() {
                        body.enabled = npc.visible;
                    }
                }
                (npc.role, id)
            })
            .collect()
    }

    fn spawn_labels(&self, world: &mut SceneWorld) -> SceneLabels {
        let mut hidden = |anchor, style| {
            world.spawn_label(LabelDesc {
                text: String::new(),
                anchor,
                style,
                visible: false,
            })
        };
        SceneLabels {
            dialogue: hidden(LabelAnchor::World(Vec2::default()), LabelStyle::Bubble),
            countdown: hidden(
                LabelAnchor::Screen(self.config.countdown.anchor.to_vec2()),
                LabelStyle::Countdown,
            ),
            announcement: hidden(LabelAnchor::World(Vec2::default()), LabelStyle::Bubble),
            menu_board: hidden(LabelAnchor::Screen(MENU_BOARD_ANCHOR), LabelStyle::Panel),
        }
    }
}

impl Scene for SchoolScene {
    fn load(&mut self, world: &mut SceneWorld) {
        world.set_world_bounds(Some(self.config.world_bounds()));
        let player = self.spawn_player(world);
        let npcs = self.spawn_npcs(world);
        let labels = self.spawn_labels(world);

        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let actors = SessionActors { player, npcs };
        let mut session = Session::new(self.config.clone(), actors, rng);
        let mut location = Location::Classroom;
        let half_extents = self.config.interactable_half_extents.to_vec2();
        session.start(&mut SceneWorldPort {
            world: &mut *world,
            half_extents,
        });
        session.flush_display(&mut SceneDisplay {
            world: &mut *world,
            labels: &labels,
            location: &mut location,
        });

        info!(
            entity_count = world.entity_count(),
            seed = ?self.seed,
            location = %location,
            "scene_loaded"
        );
        self.state = Some(LoadedState {
            session,
            player,
            labels,
            location,
        });
    }

    fn update(
        &mut self,
        _fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand {
        let Some(state) = self.state.as_mut() else {
            return SceneCommand::None;
        };

        apply_player_movement(world, state.player, input.intents(), self.config.player.speed);

        let mut events: Vec<RawEvent> = world
            .take_overlaps()
            .into_iter()
            .map(|overlap| RawEvent::Overlap {
                actor: overlap.actor,
                target: overlap.sensor,
            })
            .collect();
        if input.primary_click_pressed() {
            let picked = input.cursor_position_px().and_then(|cursor| {
                world.pick_topmost_sensor_at_cursor(cursor, input.window_size())
            });
            if let Some(target) = picked {
                debug!(entity = target.0, "interactable_clicked");
                events.push(RawEvent::Activated { target });
            }
        }
        let fired = world.take_fired_timers();

        state.session.tick(
            &mut SceneWorldPort {
                world: &mut *world,
                half_extents: self.config.interactable_half_extents.to_vec2(),
            },
            &events,
            &fired,
        );
        state.session.flush_display(&mut SceneDisplay {
            world: &mut *world,
            labels: &state.labels,
            location: &mut state.location,
        });

        SceneCommand::None
    }

    fn unload(&mut self, _world: &mut SceneWorld) {
        if let Some(state) = self.state.take() {
            info!(
                location = %state.location,
                phase = ?state.session.phase(),
                items = state.session.inventory().len(),
                "scene_unloaded"
            );
        }
    }

    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        let state = self.state.as_ref()?;
        Some(format!(
            "Schoolday | {} | {:?} | items {}",
            state.location,
            state.session.phase(),
            state.session.inventory().len()
        ))
    }
}

/// Left wins over right and up over down; facing only changes while moving
/// horizontally.
fn apply_player_movement(
    world: &mut SceneWorld,
    player: EntityId,
    intents: MovementIntents,
    speed: f32,
) {
    let x = if intents.left {
        -speed
    } else if intents.right {
        speed
    } else {
        0.0
    };
    let y = if intents.up {
        -speed
    } else if intents.down {
        speed
    } else {
        0.0
    };
    world.set_velocity(player, Vec2::new(x, y));
    if x != 0.0 {
        if let Some(entity) = world.find_entity_mut(player) {
            entity.flip_x = x > 0.0;
        }
    }
}

struct SceneWorldPort<'a> {
    world: &'a mut SceneWorld,
    half_extents: Vec2,
}

impl WorldPort for SceneWorldPort<'_> {
    fn position(&self, entity: EntityId) -> Option<Vec2> {
        self.world.position(entity)
    }

    fn set_position(&mut self, entity: EntityId, position: Vec2) {
        self.world.set_position(entity, position);
    }

    fn set_visible(&mut self, entity: EntityId, visible: bool) {
        self.world.set_visible(entity, visible);
    }

    fn set_body_enabled(&mut self, entity: EntityId, enabled: bool) {
        self.world.set_body_enabled(entity, enabled);
    }

    fn set_background(&mut self, key: &str) {
        self.world.set_background(Some(key.to_string()));
    }

    fn play_sound(&mut self, sound_id: &str) {
        self.world.play_sound(sound_id);
    }

    fn schedule_repeating(&mut self, interval: Duration, times: u32) -> TimerId {
        self.world.schedule_repeating(interval, times)
    }

    fn spawn_interactable(
        &mut self,
        kind: InteractableKind,
        item_id: &str,
        position: Vec2,
    ) -> EntityId {
        self.world.spawn_with_body(
            Transform { position },
            RenderableDesc {
                kind: RenderableKind::Sprite(item_id.to_string()),
                debug_name: kind.debug_name(),
            },
            Body::new(BodyKind::Sensor, self.half_extents),
        )
    }
}

struct SceneDisplay<'a> {
    world: &'a mut SceneWorld,
    labels: &'a SceneLabels,
    location: &'a mut Location,
}

impl SceneDisplay<'_> {
    fn update_label(&mut self, id: LabelId, text: Option<String>, anchor: Option<LabelAnchor>) {
        let Some(label) = self.world.label_mut(id) else {
            return;
        };
        if let Some(anchor) = anchor {
            label.anchor = anchor;
        }
        match text {
            Some(text) => {
                label.text = text;
                label.visible = true;
            }
            None => label.visible = false,
        }
    }
}

impl DisplaySink for SceneDisplay<'_> {
    fn on_dialogue_change(&mut self, text: &str, position: Vec2, visible: bool) {
        let text = visible.then(|| text.to_string());
        self.update_label(
            self.labels.dialogue,
            text,
            Some(LabelAnchor::World(position)),
        );
    }

    fn on_inventory_change(&mut self, items: &[String]) {
        self.world.set_hud_items(items.to_vec());
    }

    fn on_location_change(&mut self, location: Location) {
        *self.location = location;
    }

    fn on_countdown_change(&mut self, remaining: Option<u32>) {
        self.update_label(
            self.labels.countdown,
            remaining.map(|value| value.to_string()),
            None,
        );
    }

    fn on_announcement_change(&mut self, text: Option<&str>, position: Vec2) {
        self.update_label(
            self.labels.announcement,
            text.map(str::to_string),
            Some(LabelAnchor::World(position)),
        );
    }

    fn on_menu_board_change(&mut self, lines: &[String]) {
        let text = (!lines.is_empty()).then(|| lines.join("\n"));
        self.update_label(self.labels.menu_board, text, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::InputAction;

    const DT: f32 = 1.0 / 60.0;

    fn loaded_scene() -> (SchoolScene, SceneWorld) {
        let mut scene = SchoolScene::new(ScenarioConfig::default(), Some(11));
        let mut world = SceneWorld::default();
        scene.load(&mut world);
        world.apply_pending();
        (scene, world)
    }

    fn player_id(scene: &SchoolScene) -> EntityId {
        scene.state.as_ref().expect("loaded").player
    }

    fn label_text(world: &SceneWorld, id: LabelId) -> Option<String> {
        let label = world.label(id).expect("label");
        label.visible.then(|| label.text.clone())
    }

    #[test]
    fn load_spawns_cast_labels_and_background() {
        let (scene, world) = loaded_scene();

        assert_eq!(world.entity_count(), 4);
        assert_eq!(world.labels().len(), 4);
        assert!(world.labels().iter().all(|label| !label.visible));
        assert_eq!(world.background(), Some("classroom"));
        assert!(world.hud_items().is_empty());

        let lunch_lady = world
            .entities()
            .iter()
            .find(|entity| entity.renderable.kind == RenderableKind::Sprite("lunch_lady".into()))
            .expect("lunch lady");
        assert!(!lunch_lady.visible);
        assert!(!lunch_lady.body.expect("body").enabled);

        let player = world.find_entity(player_id(&scene)).expect("player");
        assert_eq!(player.scale, 2.0);
        assert_eq!(player.body.expect("body").kind, BodyKind::Dynamic);
        assert_eq!(
            scene.debug_title(&world).as_deref(),
            Some("Schoolday | classroom | NotOffered | items 0")
        );
    }

    #[test]
    fn quest_giver_carries_tint() {
        let (_scene, world) = loaded_scene();
        let tinted: Vec<_> = world
            .entities()
            .iter()
            .filter(|entity| entity.tint.is_some())
            .collect();
        assert_eq!(tinted.len(), 1);
        assert_eq!(tinted[0].transform.position, Vec2::new(875.0, 480.0));
    }

    #[test]
    fn movement_sets_velocity_and_facing() {
        let (mut scene, mut world) = loaded_scene();
        let player = player_id(&scene);

        let right = InputSnapshot::empty().with_action_down(InputAction::MoveRight, true);
        scene.update(DT, &right, &mut world);
        let entity = world.find_entity(player).expect("player");
        assert_eq!(entity.body.expect("body").velocity, Vec2::new(320.0, 0.0));
        assert!(entity.flip_x);

        let both = InputSnapshot::empty()
            .with_action_down(InputAction::MoveLeft, true)
            .with_action_down(InputAction::MoveRight, true)
            .with_action_down(InputAction::MoveUp, true)
            .with_action_down(InputAction::MoveDown, true);
        scene.update(DT, &both, &mut world);
        let entity = world.find_entity(player).expect("player");
        assert_eq!(
            entity.body.expect("body").velocity,
            Vec2::new(-320.0, -320.0)
        );
        assert!(!entity.flip_x);

        scene.update(DT, &InputSnapshot::empty(), &mut world);
        let entity = world.find_entity(player).expect("player");
        assert_eq!(entity.body.expect("body").velocity, Vec2::default());
        assert!(!entity.flip_x);
    }

    #[test]
    fn approaching_giver_shows_offer_and_spawns_sensor_target() {
        let (mut scene, mut world) = loaded_scene();
        let player = player_id(&scene);
        world.set_position(player, Vec2::new(775.0, 480.0));

        scene.update(DT, &InputSnapshot::empty(), &mut world);
        world.apply_pending();

        let labels = &scene.state.as_ref().expect("loaded").labels;
        assert_eq!(
            label_text(&world, labels.dialogue).as_deref(),
            Some("Hi Elin! Can you find my lost sparkle?")
        );
        assert_eq!(
            world.label(labels.dialogue).expect("label").anchor,
            LabelAnchor::World(Vec2::new(875.0, 360.0))
        );
        let sensors: Vec<_> = world
            .entities()
            .iter()
            .filter(|entity| entity.body.map(|body| body.kind) == Some(BodyKind::Sensor))
            .collect();
        assert_eq!(sensors.len(), 1);
        assert_eq!(sensors[0].renderable.debug_name, "mission_target");
    }

    #[test]
    fn walking_onto_target_fills_hud_and_requests_sound() {
        let (mut scene, mut world) = loaded_scene();
        let player = player_id(&scene);
        world.set_position(player, Vec2::new(775.0, 480.0));
        scene.update(DT, &InputSnapshot::empty(), &mut world);
        world.apply_pending();

        let target = world
            .entities()
            .iter()
            .find(|entity| entity.body.map(|body| body.kind) == Some(BodyKind::Sensor))
            .map(|entity| entity.transform.position)
            .expect("target");
        world.set_position(player, target);
        world.step_physics(DT);
        scene.update(DT, &InputSnapshot::empty(), &mut world);

        assert_eq!(world.hud_items(), ["sparkle".to_string()]);
        assert_eq!(world.drain_sound_requests(), vec!["collect".to_string()]);
        assert!(scene
            .debug_title(&world)
            .expect("title")
            .contains("ItemCollected"));
    }
}
