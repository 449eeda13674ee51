//! The eframe/egui glove window.
//!
//! Repaints are driven by the store: a listener registered at construction
//! asks egui for a repaint whenever any finger changes, and each frame reads
//! the current values back from the store.

use eframe::egui;
use egui::{Align2, Color32, FontId, Pos2, Rect, Stroke, Vec2};
use std::sync::Arc;

use crate::error::{GloveError, GloveResult};
use crate::gui::layout::{BarGeometry, BAR_COLOR, BAR_WIDTH, CANVAS_SIZE};
use crate::hardware::finger::FingerId;
use crate::hardware::store::{ReadingStore, SubscriptionId};

const BACKGROUND: Color32 = Color32::from_rgb(24, 24, 28);
const EMPTY: Color32 = Color32::WHITE;
const OUTLINE: Color32 = Color32::from_gray(90);
const LABEL: Color32 = Color32::from_gray(200);

/// Main window showing one bar per finger.
pub struct GloveDisplay {
    store: Arc<ReadingStore>,
    subscription: SubscriptionId,
}

impl GloveDisplay {
    /// Build the app and register the repaint listener.
    pub fn new(cc: &eframe::CreationContext<'_>, store: Arc<ReadingStore>) -> Self {
        let ctx = cc.egui_ctx.clone();
        let subscription = store.subscribe(move |_finger| ctx.request_repaint());
        Self {
            store,
            subscription,
        }
    }
}

impl Drop for GloveDisplay {
    fn drop(&mut self) {
        self.store.unsubscribe(self.subscription);
    }
}

impl eframe::App for GloveDisplay {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }

        let values = self.store.snapshot();
        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(BACKGROUND))
            .show(ctx, |ui| {
                let origin = ui.max_rect().min;
                let painter = ui.painter();
                for finger in FingerId::ALL {
                    paint_bar(painter, origin, finger, values[finger.ordinal()]);
                }
            });
    }
}

fn paint_bar(painter: &egui::Painter, origin: Pos2, finger: FingerId, magnitude: u16) {
    let bar = BarGeometry::for_finger(finger);
    let top_left = origin + Vec2::new(bar.x, bar.y);
    let outline = Rect::from_min_size(top_left, Vec2::new(BAR_WIDTH, bar.height as f32));

    let empty = (bar.height - bar.filled_pixels(magnitude)) as f32;
    let fill = Rect::from_min_max(outline.min + Vec2::new(0.0, empty), outline.max);

    painter.rect_filled(outline, 0.0, EMPTY);
    painter.rect_filled(
        fill,
        0.0,
        Color32::from_rgb(BAR_COLOR[0], BAR_COLOR[1], BAR_COLOR[2]),
    );
    painter.rect_stroke(outline, 0.0, Stroke::new(1.0, OUTLINE));
    painter.text(
        outline.center_bottom() + Vec2::new(0.0, 4.0),
        Align2::CENTER_TOP,
        finger.label(),
        FontId::proportional(11.0),
        LABEL,
    );
}

/// Open the window and block until the user closes it (window close or Esc).
///
/// Must be called from the main thread.
pub fn run_window(store: Arc<ReadingStore>, title: &str) -> GloveResult<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(CANVAS_SIZE)
            .with_resizable(false)
            .with_title(title),
        ..Default::default()
    };

    eframe::run_native(
        title,
        options,
        Box::new(move |cc| Ok(Box::new(GloveDisplay::new(cc, store)))),
    )
    .map_err(|err| GloveError::Display(err.to_string()))
}
