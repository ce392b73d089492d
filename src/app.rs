use eframe::egui;
use egui::{Color32, Pos2, Rect, Sense, TextureHandle, TextureOptions, Vec2};

use crate::actions::{self, Action};
use crate::display::{DisplayBuffer, FrameSlot};
use crate::io::DialogStorage;
use crate::session::{EditSession, PointerSample, Redraw};
use crate::settings::EditorSettings;

/// Hands display conversions to the rayon pool and delivers the results to
/// the UI thread through a one-slot [`FrameSlot`].
struct Presenter {
    slot: FrameSlot,
}

impl Presenter {
    fn new(ctx: &egui::Context) -> Self {
        let ctx = ctx.clone();
        Self {
            slot: FrameSlot::with_waker(move || ctx.request_repaint()),
        }
    }

    /// Snapshot the current image and convert it off the UI thread.
    fn schedule(&self, session: &EditSession) {
        let store = session.store();
        let Some(image) = store.image() else { return };
        let snapshot = image.clone();
        let generation = store.generation();
        let slot = self.slot.clone();
        rayon::spawn(move || {
            slot.publish(generation, DisplayBuffer::from_image(&snapshot));
        });
    }

    fn take(&self) -> Option<DisplayBuffer> {
        self.slot.take()
    }
}

pub struct PaintLiteApp {
    session: EditSession,
    storage: DialogStorage,
    presenter: Presenter,

    /// Texture currently assigned to the canvas (UI thread only)
    canvas_texture: Option<TextureHandle>,
    /// Canvas region size in image pixels
    canvas_size: Option<[u32; 2]>,

    /// Error shown in a modal window until dismissed
    error_message: Option<String>,
}

impl PaintLiteApp {
    pub fn new(cc: &eframe::CreationContext<'_>, settings: EditorSettings) -> Self {
        Self {
            session: EditSession::new(settings.brush),
            storage: DialogStorage::new(),
            presenter: Presenter::new(&cc.egui_ctx),
            canvas_texture: None,
            canvas_size: None,
            error_message: None,
        }
    }

    fn run_action(&mut self, action: Action) {
        match actions::dispatch(action, &mut self.session, &mut self.storage) {
            Ok(redraw) => self.apply_redraw(redraw),
            Err(e) => self.error_message = Some(e.to_string()),
        }
    }

    fn apply_redraw(&mut self, redraw: Redraw) {
        if let Redraw::Resize { width, height } = redraw {
            self.canvas_size = Some([width, height]);
        }
        if redraw.needs_refresh() {
            self.presenter.schedule(&self.session);
        }
    }

    /// Assign the latest converted frame to the canvas texture.
    fn present_pending_frame(&mut self, ctx: &egui::Context) {
        let Some(frame) = self.presenter.take() else { return };
        let image = frame.to_color_image();
        match &mut self.canvas_texture {
            Some(tex) => tex.set(image, TextureOptions::NEAREST),
            None => {
                self.canvas_texture = Some(ctx.load_texture("canvas", image, TextureOptions::NEAREST));
            }
        }
    }

    fn menu_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button(Action::Open.label()).clicked() {
                        ui.close_menu();
                        self.run_action(Action::Open);
                    }
                    let has_image = self.session.store().has_image();
                    if ui.add_enabled(has_image, egui::Button::new(Action::Save.label())).clicked() {
                        ui.close_menu();
                        self.run_action(Action::Save);
                    }
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
                ui.menu_button("Filter", |ui| {
                    if ui.button(Action::Grayscale.label()).clicked() {
                        ui.close_menu();
                        self.run_action(Action::Grayscale);
                    }
                });
            });
        });
    }

    fn canvas(&mut self, ui: &mut egui::Ui) {
        let Some([w, h]) = self.canvas_size else {
            ui.centered_and_justified(|ui| {
                ui.label("File → Open… to load an image");
            });
            return;
        };

        egui::ScrollArea::both().drag_to_scroll(false).show(ui, |ui| {
            let (rect, response) = ui.allocate_exact_size(Vec2::new(w as f32, h as f32), Sense::drag());

            if let Some(tex) = &self.canvas_texture {
                let uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));
                ui.painter().image(tex.id(), rect, uv, Color32::WHITE);
            }

            let to_canvas = |p: Pos2| (p.x - rect.min.x, p.y - rect.min.y);
            let (pressed, released, primary_down, pos, moved) = ui.input(|i| {
                (
                    i.pointer.primary_pressed(),
                    i.pointer.primary_released(),
                    i.pointer.primary_down(),
                    i.pointer.interact_pos(),
                    i.pointer.delta() != Vec2::ZERO,
                )
            });

            let mut redraw = Redraw::None;
            if pressed
                && response.hovered()
                && let Some(p) = pos
            {
                redraw = self.session.pointer_down(to_canvas(p));
            } else if moved && let Some(p) = pos {
                redraw = self.session.pointer_move(PointerSample { pos: to_canvas(p), primary_down });
            }
            if released {
                self.session.pointer_up();
            }
            self.apply_redraw(redraw);
        });
    }

    fn error_window(&mut self, ctx: &egui::Context) {
        let Some(message) = self.error_message.clone() else { return };
        egui::Window::new("Error")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(message);
                if ui.button("OK").clicked() {
                    self.error_message = None;
                }
            });
    }
}

impl eframe::App for PaintLiteApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let title = match self.storage.current_path.as_ref().and_then(|p| p.file_name()) {
            Some(name) => format!("PaintLite - {}", name.to_string_lossy()),
            None => "PaintLite".to_string(),
        };
        ctx.send_viewport_cmd(egui::ViewportCommand::Title(title));

        self.present_pending_frame(ctx);

        self.menu_bar(ctx);
        egui::CentralPanel::default().show(ctx, |ui| self.canvas(ui));
        self.error_window(ctx);
    }
}
