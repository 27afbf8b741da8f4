use eframe::egui::{self, Color32, Pos2, Rect, Sense, TextureOptions, Ui, Vec2};

use hyperspec_inspector::config::ColormapKind;
use hyperspec_inspector::input::{InputEvent, MouseButton};

use crate::state::AppState;

const COLORBAR_WIDTH: f32 = 18.0;

// ---------------------------------------------------------------------------
// Band image (central panel)
// ---------------------------------------------------------------------------

/// Texture cache for the band image.
#[derive(Default)]
pub struct ImageView {
    texture: Option<egui::TextureHandle>,
    modifier_held: bool,
}

impl ImageView {
    /// Render the current band and forward input events to the state.
    pub fn show(&mut self, ui: &mut Ui, state: &mut AppState) {
        self.forward_modifier(ui, state);

        if state.texture_dirty || (self.texture.is_none() && state.display.is_some()) {
            self.texture = state.display.as_ref().map(|img| {
                ui.ctx().load_texture(
                    "band_image",
                    state.colormap.colorize(img),
                    TextureOptions::NEAREST,
                )
            });
            state.texture_dirty = false;
        }

        let (Some(texture), Some(display)) = (&self.texture, &state.display) else {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Open an image to inspect  (File → Open…)");
            });
            return;
        };
        let image_size = Vec2::new(display.width as f32, display.height as f32);

        let show_colorbar = state.config.colormap == ColormapKind::Inferno;
        let mut available = ui.available_size();
        if show_colorbar {
            available.x -= COLORBAR_WIDTH + 90.0;
        }
        let scale = (available.x / image_size.x).min(available.y / image_size.y).max(0.01);
        let shown = image_size * scale;

        let mut event = None;
        ui.horizontal(|ui: &mut Ui| {
            let response = ui.add(
                egui::Image::new((texture.id(), shown)).sense(Sense::click()),
            );

            let position = response.interact_pointer_pos().map(|pos| {
                let rel = (pos - response.rect.min) / scale;
                (rel.x as f64, rel.y as f64)
            });
            let button = if response.clicked() {
                Some(MouseButton::Primary)
            } else if response.secondary_clicked() {
                Some(MouseButton::Secondary)
            } else if response.middle_clicked() {
                Some(MouseButton::Middle)
            } else {
                None
            };
            event = button.map(|button| InputEvent::Click {
                button,
                double: response.double_clicked(),
                position,
            });

            if show_colorbar {
                colorbar(ui, state, shown.y);
            }
        });

        if let Some(event) = event {
            state.handle_input(event);
        }
    }

    /// Turn Shift transitions into explicit modifier events.
    fn forward_modifier(&mut self, ui: &Ui, state: &mut AppState) {
        let held = ui.input(|i| i.modifiers.shift);
        if held != self.modifier_held {
            self.modifier_held = held;
            state.handle_input(if held {
                InputEvent::ModifierDown
            } else {
                InputEvent::ModifierUp
            });
        }
    }
}

/// Vertical colour bar labelled with the 8-bit extremes.
fn colorbar(ui: &mut Ui, state: &AppState, height: f32) {
    ui.vertical(|ui: &mut Ui| {
        ui.label("255 = Hot");
        let (rect, _) = ui.allocate_exact_size(
            Vec2::new(COLORBAR_WIDTH, (height - 40.0).max(32.0)),
            Sense::hover(),
        );
        let painter = ui.painter_at(rect);
        let steps = 256;
        let step_h = rect.height() / steps as f32;
        for i in 0..steps {
            let value = (steps - 1 - i) as u8;
            let top = rect.top() + i as f32 * step_h;
            painter.rect_filled(
                Rect::from_min_max(
                    Pos2::new(rect.left(), top),
                    Pos2::new(rect.right(), top + step_h + 0.5),
                ),
                0.0,
                state.colormap.color_for(value),
            );
        }
        painter.rect_stroke(rect, 0.0, (1.0, Color32::GRAY), egui::StrokeKind::Inside);
        ui.label("0 = Cold");
    });
}
