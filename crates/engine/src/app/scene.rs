use std::time::Duration;

use super::input::{ActionStates, InputAction, MovementIntents};
use super::physics::{Body, OverlapEvent, Rect};
use super::rendering::{screen_to_world_px, PLACEHOLDER_HALF_SIZE_PX};
use super::timers::{TimerFired, TimerId, TimerSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    Quit,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    quit_requested: bool,
    actions: ActionStates,
    cursor_position_px: Option<Vec2>,
    primary_click_pressed: bool,
    window_width: u32,
    window_height: u32,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn new(
        quit_requested: bool,
        actions: ActionStates,
        cursor_position_px: Option<Vec2>,
        primary_click_pressed: bool,
        window_width: u32,
        window_height: u32,
    ) -> Self {
        Self {
            quit_requested,
            actions,
            cursor_position_px,
            primary_click_pressed,
            window_width,
            window_height,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    pub fn intents(&self) -> MovementIntents {
        self.actions.intents()
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        self
    }

    pub fn with_cursor_position_px(mut self, cursor_position_px: Option<Vec2>) -> Self {
        self.cursor_position_px = cursor_position_px;
        self
    }

    pub fn with_primary_click_pressed(mut self, primary_click_pressed: bool) -> Self {
        self.primary_click_pressed = primary_click_pressed;
        self
    }

    pub fn with_window_size(mut self, window_size: (u32, u32)) -> Self {
        self.window_width = window_size.0;
        self.window_height = window_size.1;
        self
    }

    pub fn cursor_position_px(&self) -> Option<Vec2> {
        self.cursor_position_px
    }

    pub fn primary_click_pressed(&self) -> bool {
        self.primary_click_pressed
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

/// World coordinates grow right (x) and down (y), matching screen space.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Vec2) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// World point drawn at the viewport center, one world unit per pixel.
#[derive(Debug, Clone, Copy, Default)]
pub struct Camera2D {
    pub position: Vec2,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Transform {
    pub position: Vec2,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderableKind {
    Placeholder,
    Sprite(String),
}

#[derive(Debug, Clone)]
pub struct RenderableDesc {
    pub kind: RenderableKind,
    pub debug_name: &'static str,
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub transform: Transform,
    pub renderable: RenderableDesc,
    pub visible: bool,
    pub body: Option<Body>,
    pub tint: Option<[u8; 3]>,
    pub scale: f32,
    pub flip_x: bool,
    applied_spawn_order: u64,
}

impl Entity {
    pub fn spawn_order(&self) -> u64 {
        self.applied_spawn_order
    }
}

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LabelId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LabelAnchor {
    /// Bottom-center of the label sits on this world point.
    World(Vec2),
    /// Center of the label sits on this screen pixel, ignoring the camera.
    Screen(Vec2),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelStyle {
    Bubble,
    Countdown,
    Panel,
}

#[derive(Debug, Clone)]
pub struct LabelDesc {
    pub text: String,
    pub anchor: LabelAnchor,
    pub style: LabelStyle,
    pub visible: bool,
}

#[derive(Debug, Clone)]
pub struct Label {
    pub id: LabelId,
    pub text: String,
    pub anchor: LabelAnchor,
    pub style: LabelStyle,
    pub visible: bool,
}

/// Everything the renderer, physics and timers need for one running scene.
/// Spawns are deferred to `apply_pending`, which the runtime
/// calls between ticks; mutators also reach entities still pending spawn.
#[derive(Debug, Default)]
pub struct SceneWorld {
    allocator: EntityIdAllocator,
    entities: Vec<Entity>,
    pending_spawns: Vec<Entity>,
    next_applied_spawn_order: u64,
    camera: Camera2D,
    camera_target: Option<EntityId>,
    world_bounds: Option<Rect>,
    background: Option<String>,
    next_label_id: u64,
    labels: Vec<Label>,
    hud_items: Vec<String>,
    sound_requests: Vec<String>,
    overlaps: Vec<OverlapEvent>,
    timers: TimerSet,
}

impl SceneWorld {
    pub fn spawn(&mut self, transform: Transform, renderable: RenderableDesc) -> EntityId {
        let id = self.allocator.allocate();
        self.pending_spawns.push(Entity {
            id,
            transform,
            renderable,
            visible: true,
            body: None,
            tint: None,
            scale: 1.0,
            flip_x: false,
            applied_spawn_order: 0,
        });
        id
    }

    pub fn spawn_with_body(
        &mut self,
        transform: Transform,
        renderable: RenderableDesc,
        body: Body,
    ) -> EntityId {
        let id = self.spawn(transform, renderable);
        if let Some(entity) = self.any_entity_mut(id) {
            entity.body = Some(body);
        }
        id
    }

    pub fn apply_pending(&mut self) {
        for mut entity in self.pending_spawns.drain(..) {
            entity.applied_spawn_order = self.next_applied_spawn_order;
            self.next_applied_spawn_order = self.next_applied_spawn_order.saturating_add(1);
            self.entities.push(entity);
        }
    }

    pub fn clear(&mut self) {
        self.entities.clear();
        self.pending_spawns.clear();
        self.next_applied_spawn_order = 0;
        self.camera = Camera2D::default();
        self.camera_target = None;
        self.background = None;
        self.labels.clear();
        self.hud_items.clear();
        self.sound_requests.clear();
        self.overlaps.clear();
        self.timers.clear();
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut [Entity] {
        &mut self.entities
    }

    pub fn find_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities
            .iter()
            .chain(self.pending_spawns.iter())
            .find(|entity| entity.id == id)
    }

    pub fn find_entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.any_entity_mut(id)
    }

    fn any_entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities
            .iter_mut()
            .chain(self.pending_spawns.iter_mut())
            .find(|entity| entity.id == id)
    }

    pub fn position(&self, id: EntityId) -> Option<Vec2> {
        self.find_entity(id).map(|entity| entity.transform.position)
    }

    pub fn set_position(&mut self, id: EntityId, position: Vec2) -> bool {
        match self.any_entity_mut(id) {
            Some(entity) => {
                entity.transform.position = position;
                true
            }
            None => false,
        }
    }

    pub fn set_visible(&mut self, id: EntityId, visible: bool) -> bool {
        match self.any_entity_mut(id) {
            Some(entity) => {
                entity.visible = visible;
                true
            }
            None => false,
        }
    }

    /// Returns false when the entity is missing or has no body.
    pub fn set_body_enabled(&mut self, id: EntityId, enabled: bool) -> bool {
        match self.any_entity_mut(id).and_then(|entity| entity.body.as_mut()) {
            Some(body) => {
                body.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn set_velocity(&mut self, id: EntityId, velocity: Vec2) -> bool {
        match self.any_entity_mut(id).and_then(|entity| entity.body.as_mut()) {
            Some(body) => {
                body.velocity = velocity;
                true
            }
            None => false,
        }
    }

    pub fn camera(&self) -> &Camera2D {
        &self.camera
    }

    pub fn set_camera_target(&mut self, target: Option<EntityId>) {
        self.camera_target = target;
    }

    pub fn follow_camera_target(&mut self) {
        if let Some(position) = self.camera_target.and_then(|id| self.position(id)) {
            self.camera.position = position;
        }
    }

    pub fn world_bounds(&self) -> Option<Rect> {
        self.world_bounds
    }

    pub fn set_world_bounds(&mut self, bounds: Option<Rect>) {
        self.world_bounds = bounds;
    }

    pub fn background(&self) -> Option<&str> {
        self.background.as_deref()
    }

    pub fn set_background(&mut self, key: Option<String>) {
        self.background = key;
    }

    pub fn spawn_label(&mut self, desc: LabelDesc) -> LabelId {
        let id = LabelId(self.next_label_id);
        self.next_label_id = self.next_label_id.saturating_add(1);
        self.labels.push(Label {
            id,
            text: desc.text,
            anchor: desc.anchor,
            style: desc.style,
            visible: desc.visible,
        });
        id
    }

    pub fn label(&self, id: LabelId) -> Option<&Label> {
        self.labels.iter().find(|label| label.id == id)
    }

    pub fn label_mut(&mut self, id: LabelId) -> Option<&mut Label> {
        self.labels.iter_mut().find(|label| label.id == id)
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn set_hud_items(&mut self, items: Vec<String>) {
        self.hud_items = items;
    }

    pub fn hud_items(&self) -> &[String] {
        &self.hud_items
    }

    pub fn play_sound(&mut self, key: &str) {
        self.sound_requests.push(key.to_string());
    }

    pub fn drain_sound_requests(&mut self) -> Vec<String> {
        std::mem::take(&mut self.sound_requests)
    }

    pub fn schedule_repeating(&mut self, interval: Duration, times: u32) -> TimerId {
        self.timers.schedule_repeating(interval, times)
    }

    pub fn advance_timers(&mut self, dt: Duration) {
        self.timers.advance(dt);
    }

    pub fn take_fired_timers(&mut self) -> Vec<TimerFired> {
        self.timers.take_fired()
    }

    pub(crate) fn set_overlaps(&mut self, overlaps: Vec<OverlapEvent>) {
        self.overlaps = overlaps;
    }

    /// Overlaps recorded by the last physics step. Each pair is reported once.
    pub fn take_overlaps(&mut self) -> Vec<OverlapEvent> {
        std::mem::take(&mut self.overlaps)
    }

    /// Topmost visible entity carrying an enabled sensor body under the
    /// cursor, using the body extents as the hit box.
    pub fn pick_topmost_sensor_at_cursor(
        &self,
        cursor_position_px: Vec2,
        window_size: (u32, u32),
    ) -> Option<EntityId> {
        let cursor_world = screen_to_world_px(self.camera(), window_size, cursor_position_px);
        let mut best: Option<(u64, EntityId)> = None;

        for entity in &self.entities {
            if !entity.visible {
                continue;
            }
            let Some(body) = entity.body.filter(|body| body.enabled) else {
                continue;
            };
            if body.kind != super::physics::BodyKind::Sensor {
                continue;
            }
            let half = Vec2 {
                x: body.half_extents.x.max(PLACEHOLDER_HALF_SIZE_PX as f32),
                y: body.half_extents.y.max(PLACEHOLDER_HALF_SIZE_PX as f32),
            };
            if !Rect::from_center(entity.transform.position, half).contains(cursor_world) {
                continue;
            }

            match best {
                Some((order, _)) if order >= entity.applied_spawn_order => {}
                _ => best = Some((entity.applied_spawn_order, entity.id)),
            }
        }

        best.map(|(_, id)| id)
    }
}

pub trait Scene {
    fn load(&mut self, world: &mut SceneWorld);
    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand;
    fn unload(&mut self, world: &mut SceneWorld);
    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        None
    }
}

/// Owns the single running scene and its world, and fixes the per-tick order:
/// timers, scene update, deferred spawns, physics, camera.
pub(crate) struct SceneRuntime {
    scene: Box<dyn Scene>,
    world: SceneWorld,
    is_loaded: bool,
}

impl SceneRuntime {
    pub(crate) fn new(scene: Box<dyn Scene>) -> Self {
        Self {
            scene,
            world: SceneWorld::default(),
            is_loaded: false,
        }
    }

    pub(crate) fn load(&mut self) {
        if self.is_loaded {
            return;
        }
        self.scene.load(&mut self.world);
        self.world.apply_pending();
        self.world.follow_camera_target();
        self.is_loaded = true;
    }

    pub(crate) fn tick(&mut self, fixed_dt: Duration, input: &InputSnapshot) -> SceneCommand {
        self.world.advance_timers(fixed_dt);
        let command = self
            .scene
            .update(fixed_dt.as_secs_f32(), input, &mut self.world);
        self.world.apply_pending();
        self.world.step_physics(fixed_dt.as_secs_f32());
        self.world.follow_camera_target();
        command
    }

    pub(crate) fn world(&self) -> &SceneWorld {
        &self.world
    }

    pub(crate) fn world_mut(&mut self) -> &mut SceneWorld {
        &mut self.world
    }

    pub(crate) fn debug_title(&self) -> Option<String> {
        self.scene.debug_title(&self.world)
    }

    pub(crate) fn shutdown(&mut self) {
        if self.is_loaded {
            self.scene.unload(&mut self.world);
            self.world.clear();
            self.is_loaded = false;
        }
    }
}
