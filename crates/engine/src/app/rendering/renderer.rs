use std::path::PathBuf;
use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use crate::app::{Camera2D, Entity, Label, LabelAnchor, LabelStyle, RenderableKind, SceneWorld};
use crate::assets::{LoadedSprite, SpriteCache};

use super::canvas::Canvas;
use super::text::{draw_text, TextMetrics};
use super::{world_to_screen_px, Viewport, PLACEHOLDER_HALF_SIZE_PX};

const CLEAR_COLOR: [u8; 4] = [18, 20, 26, 255];
const PLACEHOLDER_COLOR: [u8; 4] = [220, 220, 240, 255];
const BUBBLE_BG_COLOR: [u8; 4] = [255, 255, 255, 204];
const BUBBLE_TEXT_COLOR: [u8; 4] = [0, 0, 0, 255];
const BUBBLE_PADDING: (i32, i32) = (15, 10);
const PANEL_BG_COLOR: [u8; 4] = [51, 51, 51, 255];
const PANEL_TEXT_COLOR: [u8; 4] = [255, 255, 255, 255];
const PANEL_PADDING: i32 = 20;
const COUNTDOWN_TEXT_COLOR: [u8; 4] = [255, 255, 255, 255];
const COUNTDOWN_STROKE_COLOR: [u8; 4] = [0, 0, 0, 255];
const COUNTDOWN_STROKE_PX: i32 = 6;
const LABEL_TEXT: TextMetrics = TextMetrics { scale: 3 };
const COUNTDOWN_TEXT: TextMetrics = TextMetrics { scale: 14 };
const HUD_BAR_SIZE: (i32, i32) = (400, 60);
const HUD_BAR_BOTTOM_GAP: i32 = 20;
const HUD_BAR_COLOR: [u8; 4] = [173, 216, 230, 128];
const HUD_SLOT_FIRST_OFFSET: i32 = 40;
const HUD_SLOT_SPACING: i32 = 70;
const HUD_ICON_MAX_PX: f32 = 48.0;

pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
    sprites: SpriteCache,
}

impl Renderer {
    pub fn new(window: Arc<Window>, asset_root: PathBuf) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport {
                width: size.width,
                height: size.height,
            },
            sprites: SpriteCache::new(asset_root),
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.viewport = Viewport { width, height };
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    pub(crate) fn render_world(&mut self, world: &SceneWorld) -> Result<(), Error> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Ok(());
        }
        let sprites = &mut self.sprites;
        let mut canvas = Canvas::new(
            self.pixels.frame_mut(),
            self.viewport.width,
            self.viewport.height,
        );
        draw_scene(&mut canvas, world, sprites);
        self.pixels.render()
    }
}

fn draw_scene(canvas: &mut Canvas<'_>, world: &SceneWorld, sprites: &mut SpriteCache) {
    canvas.clear(CLEAR_COLOR);
    draw_background(canvas, world, sprites);
    for entity in world.entities().iter().filter(|entity| entity.visible) {
        draw_entity(canvas, world.camera(), entity, sprites);
    }
    for label in world.labels().iter().filter(|label| label.visible) {
        draw_label(canvas, world.camera(), label);
    }
    draw_hud(canvas, world.hud_items(), sprites);
}

fn draw_background(canvas: &mut Canvas<'_>, world: &SceneWorld, sprites: &mut SpriteCache) {
    let Some(key) = world.background() else {
        return;
    };
    let window_size = (canvas.width(), canvas.height());
    let camera = world.camera();
    let origin = world
        .world_bounds()
        .map(|bounds| bounds.min)
        .unwrap_or_default();
    let (left, top) = world_to_screen_px(camera, window_size, origin);

    if let Some(sprite) = sprites.get(key) {
        draw_sprite_scaled(canvas, sprite, left, top, 1.0, false, None);
        return;
    }
    if let Some(bounds) = world.world_bounds() {
        canvas.fill_rect(
            left,
            top,
            bounds.width().round() as i32,
            bounds.height().round() as i32,
            fallback_color_for_key(key),
        );
    }
}

fn draw_entity(
    canvas: &mut Canvas<'_>,
    camera: &Camera2D,
    entity: &Entity,
    sprites: &mut SpriteCache,
) {
    let window_size = (canvas.width(), canvas.height());
    let (cx, cy) = world_to_screen_px(camera, window_size, entity.transform.position);
    let scale = entity.scale;

    if let RenderableKind::Sprite(key) = &entity.renderable.kind {
        if let Some(sprite) = sprites.get(key) {
            let w = (sprite.width as f32 * scale).round() as i32;
            let h = (sprite.height as f32 * scale).round() as i32;
            draw_sprite_scaled(
                canvas,
                sprite,
                cx - w / 2,
                cy - h / 2,
                scale,
                entity.flip_x,
                entity.tint,
            );
            return;
        }
    }

    let half = (PLACEHOLDER_HALF_SIZE_PX as f32 * scale).round() as i32;
    let color = match entity.tint {
        Some(tint) => apply_tint(PLACEHOLDER_COLOR, tint),
        None => PLACEHOLDER_COLOR,
    };
    canvas.fill_rect(cx - half, cy - half, half * 2, half * 2, color);
}

fn draw_label(canvas: &mut Canvas<'_>, camera: &Camera2D, label: &Label) {
    let window_size = (canvas.width(), canvas.height());
    let metrics = match label.style {
        LabelStyle::Countdown => COUNTDOWN_TEXT,
        LabelStyle::Bubble | LabelStyle::Panel => LABEL_TEXT,
    };
    let (text_w, text_h) = metrics.measure(&label.text);
    let (pad_x, pad_y) = match label.style {
        LabelStyle::Bubble => BUBBLE_PADDING,
        LabelStyle::Panel => (PANEL_PADDING, PANEL_PADDING),
        LabelStyle::Countdown => (0, 0),
    };
    let box_w = text_w + pad_x * 2;
    let box_h = text_h + pad_y * 2;
    let (left, top) = match label.anchor {
        LabelAnchor::World(point) => {
            let (x, y) = world_to_screen_px(camera, window_size, point);
            (x - box_w / 2, y - box_h)
        }
        LabelAnchor::Screen(point) => (
            point.x.round() as i32 - box_w / 2,
            point.y.round() as i32 - box_h / 2,
        ),
    };

    match label.style {
        LabelStyle::Bubble => {
            canvas.fill_rect(left, top, box_w, box_h, BUBBLE_BG_COLOR);
            canvas.outline_rect(left, top, box_w, box_h, BUBBLE_TEXT_COLOR);
            draw_text(
                canvas,
                left + pad_x,
                top + pad_y,
                &label.text,
                metrics,
                BUBBLE_TEXT_COLOR,
            );
        }
        LabelStyle::Panel => {
            canvas.fill_rect(left, top, box_w, box_h, PANEL_BG_COLOR);
            draw_text(
                canvas,
                left + pad_x,
                top + pad_y,
                &label.text,
                metrics,
                PANEL_TEXT_COLOR,
            );
        }
        LabelStyle::Countdown => {
            for (dx, dy) in [
                (-COUNTDOWN_STROKE_PX, 0),
                (COUNTDOWN_STROKE_PX, 0),
                (0, -COUNTDOWN_STROKE_PX),
                (0, COUNTDOWN_STROKE_PX),
            ] {
                draw_text(
                    canvas,
                    left + dx,
                    top + dy,
                    &label.text,
                    metrics,
                    COUNTDOWN_STROKE_COLOR,
                );
            }
            draw_text(
                canvas,
                left,
                top,
                &label.text,
                metrics,
                COUNTDOWN_TEXT_COLOR,
            );
        }
    }
}

/// Bottom-center inventory bar; slots are laid out left to right in item order.
fn draw_hud(canvas: &mut Canvas<'_>, items: &[String], sprites: &mut SpriteCache) {
    let (bar_left, bar_top) = hud_bar_origin(canvas.width(), canvas.height());
    canvas.fill_rect(
        bar_left,
        bar_top,
        HUD_BAR_SIZE.0,
        HUD_BAR_SIZE.1,
        HUD_BAR_COLOR,
    );
    for (index, item) in items.iter().enumerate() {
        let (cx, cy) = hud_slot_center(canvas.width(), canvas.height(), index);
        match sprites.get(item) {
            Some(sprite) => {
                let longest = sprite.width.max(sprite.height).max(1) as f32;
                let scale = (HUD_ICON_MAX_PX / longest).min(1.0);
                let w = (sprite.width as f32 * scale).round() as i32;
                let h = (sprite.height as f32 * scale).round() as i32;
                draw_sprite_scaled(canvas, sprite, cx - w / 2, cy - h / 2, scale, false, None);
            }
            None => {
                let half = PLACEHOLDER_HALF_SIZE_PX;
                canvas.fill_rect(
                    cx - half,
                    cy - half,
                    half * 2,
                    half * 2,
                    fallback_color_for_key(item),
                );
            }
        }
    }
}

fn hud_bar_origin(width: u32, height: u32) -> (i32, i32) {
    (
        width as i32 / 2 - HUD_BAR_SIZE.0 / 2,
        height as i32 - HUD_BAR_SIZE.1 - HUD_BAR_BOTTOM_GAP,
    )
}

fn hud_slot_center(width: u32, height: u32, index: usize) -> (i32, i32) {
    let (bar_left, bar_top) = hud_bar_origin(width, height);
    (
        bar_left + HUD_SLOT_FIRST_OFFSET + index as i32 * HUD_SLOT_SPACING,
        bar_top + HUD_BAR_SIZE.1 / 2,
    )
}

fn draw_sprite_scaled(
    canvas: &mut Canvas<'_>,
    sprite: &LoadedSprite,
    left: i32,
    top: i32,
    scale: f32,
    flip_x: bool,
    tint: Option<[u8; 3]>,
) {
    if scale <= 0.0 || !scale.is_finite() || sprite.width == 0 || sprite.height == 0 {
        return;
    }
    let dest_w = (sprite.width as f32 * scale).round() as i32;
    let dest_h = (sprite.height as f32 * scale).round() as i32;
    let start_x = left.max(0);
    let start_y = top.max(0);
    let end_x = (left + dest_w).min(canvas.width() as i32);
    let end_y = (top + dest_h).min(canvas.height() as i32);

    for py in start_y..end_y {
        let src_y = (((py - top) as f32 / scale) as u32).min(sprite.height - 1);
        for px in start_x..end_x {
            let mut src_x = (((px - left) as f32 / scale) as u32).min(sprite.width - 1);
            if flip_x {
                src_x = sprite.width - 1 - src_x;
            }
            let mut color = sprite.pixel(src_x, src_y);
            if let Some(tint) = tint {
                color = apply_tint(color, tint);
            }
            canvas.blend_pixel(px, py, color);
        }
    }
}

fn apply_tint(color: [u8; 4], tint: [u8; 3]) -> [u8; 4] {
    [
        (color[0] as u16 * tint[0] as u16 / 255) as u8,
        (color[1] as u16 * tint[1] as u16 / 255) as u8,
        (color[2] as u16 * tint[2] as u16 / 255) as u8,
        color[3],
    ]
}

/// Stable, muted color per key so missing art still tells entities apart.
fn fallback_color_for_key(key: &str) -> [u8; 4] {
    let hash = key
        .bytes()
        .fold(2166136261u32, |acc, byte| (acc ^ byte as u32).wrapping_mul(16777619));
    [
        64 + (hash & 0x7f) as u8,
        64 + ((hash >> 8) & 0x7f) as u8,
        64 + ((hash >> 16) & 0x7f) as u8,
        255,
    ]
}
