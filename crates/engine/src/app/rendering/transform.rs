use crate::app::{Camera2D, Vec2};

#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// The camera position maps to the viewport center at one pixel per world
/// unit; world y grows downward like screen y, so no axis flip is needed.
pub fn world_to_screen_px(camera: &Camera2D, window_size: (u32, u32), world: Vec2) -> (i32, i32) {
    let x = world.x - camera.position.x + window_size.0 as f32 * 0.5;
    let y = world.y - camera.position.y + window_size.1 as f32 * 0.5;
    (x.round() as i32, y.round() as i32)
}

pub fn screen_to_world_px(camera: &Camera2D, window_size: (u32, u32), screen_px: Vec2) -> Vec2 {
    Vec2 {
        x: screen_px.x - window_size.0 as f32 * 0.5 + camera.position.x,
        y: screen_px.y - window_size.1 as f32 * 0.5 + camera.position.y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_position_maps_to_viewport_center() {
        let camera = Camera2D {
            position: Vec2 { x: 100.0, y: 100.0 },
        };
        assert_eq!(
            world_to_screen_px(&camera, (800, 600), Vec2 { x: 100.0, y: 100.0 }),
            (400, 300)
        );
    }

    #[test]
    fn offsets_from_camera_are_one_pixel_per_unit() {
        let camera = Camera2D::default();
        assert_eq!(
            world_to_screen_px(&camera, (800, 600), Vec2 { x: 10.0, y: -5.0 }),
            (410, 295)
        );
    }

    #[test]
    fn screen_to_world_inverts_world_to_screen() {
        let camera = Camera2D {
            position: Vec2 { x: 875.0, y: 480.0 },
        };
        let world = screen_to_world_px(&camera, (1024, 768), Vec2 { x: 700.0, y: 200.0 });
        assert_eq!(world, Vec2 { x: 1063.0, y: 296.0 });
        let (sx, sy) = world_to_screen_px(&camera, (1024, 768), world);
        assert_eq!((sx, sy), (700, 200));
    }
}
