use super::scene::{EntityId, SceneWorld, Vec2};

/// Axis-aligned rectangle in world units, `min` inclusive and `max` exclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn from_size(width: f32, height: f32) -> Self {
        Self {
            min: Vec2 { x: 0.0, y: 0.0 },
            max: Vec2 {
                x: width,
                y: height,
            },
        }
    }

    pub fn from_center(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            min: Vec2 {
                x: center.x - half_extents.x,
                y: center.y - half_extents.y,
            },
            max: Vec2 {
                x: center.x + half_extents.x,
                y: center.y + half_extents.y,
            },
        }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x < self.max.x && point.y >= self.min.y && point.y < self.max.y
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        self.max.x > other.min.x
            && self.min.x < other.max.x
            && self.max.y > other.min.y
            && self.min.y < other.max.y
    }

    /// Shrinks every edge inward by `margin`, collapsing to the center if the
    /// rect is too small.
    pub fn inset(&self, margin: f32) -> Rect {
        let center = Vec2 {
            x: (self.min.x + self.max.x) * 0.5,
            y: (self.min.y + self.max.y) * 0.5,
        };
        let half = Vec2 {
            x: (self.width() * 0.5 - margin).max(0.0),
            y: (self.height() * 0.5 - margin).max(0.0),
        };
        Rect::from_center(center, half)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Moves by velocity, collides with static bodies and world bounds.
    Dynamic,
    /// Never moves; pushes dynamic bodies out.
    Static,
    /// Never moves, never blocks; reports overlaps with dynamic bodies.
    Sensor,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub kind: BodyKind,
    pub half_extents: Vec2,
    pub enabled: bool,
    pub velocity: Vec2,
}

impl Body {
    pub fn new(kind: BodyKind, half_extents: Vec2) -> Self {
        Self {
            kind,
            half_extents,
            enabled: true,
            velocity: Vec2::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlapEvent {
    pub actor: EntityId,
    pub sensor: EntityId,
}

impl SceneWorld {
    /// Integrates dynamic bodies, resolves them against static bodies and the
    /// world bounds, then records dynamic/sensor overlaps for the next tick.
    pub fn step_physics(&mut self, fixed_dt_seconds: f32) {
        let blockers: Vec<Rect> = self
            .entities()
            .iter()
            .filter_map(|entity| {
                let body = entity.body.filter(|body| body.enabled)?;
                (body.kind == BodyKind::Static)
                    .then(|| Rect::from_center(entity.transform.position, body.half_extents))
            })
            .collect();
        let bounds = self.world_bounds();

        for entity in self.entities_mut() {
            let Some(body) = entity.body.filter(|body| body.enabled) else {
                continue;
            };
            if body.kind != BodyKind::Dynamic {
                continue;
            }
            let delta = Vec2 {
                x: body.velocity.x * fixed_dt_seconds,
                y: body.velocity.y * fixed_dt_seconds,
            };
            let mut position = entity.transform.position;

            position.x += delta.x;
            for blocker in &blockers {
                let rect = Rect::from_center(position, body.half_extents);
                if !rect.overlaps(blocker) {
                    continue;
                }
                if delta.x > 0.0 {
                    position.x = blocker.min.x - body.half_extents.x;
                } else if delta.x < 0.0 {
                    position.x = blocker.max.x + body.half_extents.x;
                }
            }

            position.y += delta.y;
            for blocker in &blockers {
                let rect = Rect::from_center(position, body.half_extents);
                if !rect.overlaps(blocker) {
                    continue;
                }
                if delta.y > 0.0 {
                    position.y = blocker.min.y - body.half_extents.y;
                } else if delta.y < 0.0 {
                    position.y = blocker.max.y + body.half_extents.y;
                }
            }

            if let Some(bounds) = bounds {
                position = clamp_to_bounds(position, body.half_extents, &bounds);
            }
            entity.transform.position = position;
        }

        let overlaps = collect_overlaps(self);
        self.set_overlaps(overlaps);
    }
}

fn clamp_to_bounds(position: Vec2, half_extents: Vec2, bounds: &Rect) -> Vec2 {
    let clamp_axis = |value: f32, half: f32, min: f32, max: f32| {
        if max - min <= half * 2.0 {
            (min + max) * 0.5
        } else {
            value.clamp(min + half, max - half)
        }
    };
    Vec2 {
        x: clamp_axis(position.x, half_extents.x, bounds.min.x, bounds.max.x),
        y: clamp_axis(position.y, half_extents.y, bounds.min.y, bounds.max.y),
    }
}

fn collect_overlaps(world: &SceneWorld) -> Vec<OverlapEvent> {
    let mut actors = Vec::new();
    let mut sensors = Vec::new();
    for entity in world.entities() {
        let Some(body) = entity.body.filter(|body| body.enabled) else {
            continue;
        };
        let rect = Rect::from_center(entity.transform.position, body.half_extents);
        match body.kind {
            BodyKind::Dynamic => actors.push((entity.id, rect)),
            BodyKind::Sensor => sensors.push((entity.id, rect)),
            BodyKind::Static => {}
        }
    }

    let mut overlaps = Vec::new();
    for (actor, actor_rect) in &actors {
        for (sensor, sensor_rect) in &sensors {
            if actor_rect.overlaps(sensor_rect) {
                overlaps.push(OverlapEvent {
                    actor: *actor,
                    sensor: *sensor,
                });
            }
        }
    }
    overlaps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{RenderableDesc, RenderableKind, Transform};

    fn spawn_body(world: &mut SceneWorld, position: Vec2, body: Body) -> EntityId {
        let id = world.spawn(
            Transform { position },
            RenderableDesc {
                kind: RenderableKind::Placeholder,
                debug_name: "body",
            },
        );
        world.apply_pending();
        world.find_entity_mut(id).expect("entity").body = Some(body);
        id
    }

    fn half(size: f32) -> Vec2 {
        Vec2 { x: size, y: size }
    }

    #[test]
    fn dynamic_body_integrates_velocity() {
        let mut world = SceneWorld::default();
        let mut body = Body::new(BodyKind::Dynamic, half(5.0));
        body.velocity = Vec2 { x: 320.0, y: -160.0 };
        let id = spawn_body(&mut world, Vec2 { x: 100.0, y: 100.0 }, body);

        world.step_physics(0.5);

        let position = world.find_entity(id).expect("entity").transform.position;
        assert_eq!(position, Vec2 { x: 260.0, y: 20.0 });
    }

    #[test]
    fn static_body_pushes_dynamic_body_out() {
        let mut world = SceneWorld::default();
        let mut body = Body::new(BodyKind::Dynamic, half(10.0));
        body.velocity = Vec2 { x: 100.0, y: 0.0 };
        let mover = spawn_body(&mut world, Vec2 { x: 0.0, y: 0.0 }, body);
        spawn_body(
            &mut world,
            Vec2 { x: 40.0, y: 0.0 },
            Body::new(BodyKind::Static, half(10.0)),
        );

        world.step_physics(0.25);

        let position = world.find_entity(mover).expect("mover").transform.position;
        assert_eq!(position.x, 20.0);
    }

    #[test]
    fn disabled_static_body_does_not_block() {
        let mut world = SceneWorld::default();
        let mut body = Body::new(BodyKind::Dynamic, half(10.0));
        body.velocity = Vec2 { x: 100.0, y: 0.0 };
        let mover = spawn_body(&mut world, Vec2 { x: 0.0, y: 0.0 }, body);
        let blocker = spawn_body(
            &mut world,
            Vec2 { x: 40.0, y: 0.0 },
            Body::new(BodyKind::Static, half(10.0)),
        );
        assert!(world.set_body_enabled(blocker, false));

        world.step_physics(0.25);

        let position = world.find_entity(mover).expect("mover").transform.position;
        assert_eq!(position.x, 25.0);
    }

    #[test]
    fn world_bounds_clamp_dynamic_body() {
        let mut world = SceneWorld::default();
        world.set_world_bounds(Some(Rect::from_size(1024.0, 1024.0)));
        let mut body = Body::new(BodyKind::Dynamic, half(16.0));
        body.velocity = Vec2 { x: -320.0, y: 320.0 };
        let id = spawn_body(&mut world, Vec2 { x: 20.0, y: 1000.0 }, body);

        world.step_physics(1.0);

        let position = world.find_entity(id).expect("entity").transform.position;
        assert_eq!(position, Vec2 { x: 16.0, y: 1008.0 });
    }

    #[test]
    fn overlaps_report_dynamic_sensor_pairs_only_when_enabled() {
        let mut world = SceneWorld::default();
        let actor = spawn_body(
            &mut world,
            Vec2 { x: 0.0, y: 0.0 },
            Body::new(BodyKind::Dynamic, half(10.0)),
        );
        let sensor = spawn_body(
            &mut world,
            Vec2 { x: 5.0, y: 5.0 },
            Body::new(BodyKind::Sensor, half(10.0)),
        );
        spawn_body(
            &mut world,
            Vec2 { x: 500.0, y: 500.0 },
            Body::new(BodyKind::Sensor, half(10.0)),
        );

        world.step_physics(1.0 / 60.0);
        assert_eq!(world.take_overlaps(), vec![OverlapEvent { actor, sensor }]);
        assert!(world.take_overlaps().is_empty());

        world.set_body_enabled(sensor, false);
        world.step_physics(1.0 / 60.0);
        assert!(world.take_overlaps().is_empty());
    }

    #[test]
    fn sensor_does_not_block_movement() {
        let mut world = SceneWorld::default();
        let mut body = Body::new(BodyKind::Dynamic, half(10.0));
        body.velocity = Vec2 { x: 100.0, y: 0.0 };
        let mover = spawn_body(&mut world, Vec2 { x: 0.0, y: 0.0 }, body);
        spawn_body(
            &mut world,
            Vec2 { x: 30.0, y: 0.0 },
            Body::new(BodyKind::Sensor, half(10.0)),
        );

        world.step_physics(0.5);

        let position = world.find_entity(mover).expect("mover").transform.position;
        assert_eq!(position.x, 50.0);
    }

    #[test]
    fn rect_inset_keeps_center() {
        let rect = Rect::from_size(1024.0, 768.0).inset(50.0);
        assert_eq!(rect.min, Vec2 { x: 50.0, y: 50.0 });
        assert_eq!(rect.max, Vec2 { x: 974.0, y: 718.0 });
        assert!(rect.contains(Vec2 { x: 512.0, y: 384.0 }));
        assert!(!rect.contains(Vec2 { x: 10.0, y: 384.0 }));
    }
}
