mod input;
mod loop_runner;
mod metrics;
mod physics;
mod rendering;
mod scene;
mod timers;

pub use input::{InputAction, MovementIntents};
pub use loop_runner::{run_app, AppError, LoopConfig};
pub use physics::{Body, BodyKind, OverlapEvent, Rect};
pub use rendering::{
    screen_to_world_px, world_to_screen_px, Renderer, Viewport, PLACEHOLDER_HALF_SIZE_PX,
};
pub use scene::{
    Camera2D, Entity, EntityId, InputSnapshot, Label, LabelAnchor, LabelDesc, LabelId,
    LabelStyle, RenderableDesc, RenderableKind, Scene, SceneCommand, SceneWorld, Transform, Vec2,
};
pub use timers::{TimerFired, TimerId};
