use crate::backend::DisplayList;
use crate::render_options::RenderOptions;
use crate::state_machine::{Control, ViewStateMachine};
use crate::{Result, ViewerError};
use eframe::egui;

const ORBIT_SPEED: f32 = 0.01;
const ZOOM_SPEED: f32 = 0.002;

pub struct NativeViewer {
    machine: ViewStateMachine,
    display: DisplayList,

    texture: Option<egui::TextureHandle>,
    rendered_revision: Option<u64>,
    status: Option<String>,
}

impl NativeViewer {
    pub fn new(machine: ViewStateMachine, display: DisplayList) -> Self {
        Self {
            machine,
            display,
            texture: None,
            rendered_revision: None,
            status: None,
        }
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        let keys: Vec<char> = ctx.input(|i| {
            i.events
                .iter()
                .filter_map(|e| match e {
                    egui::Event::Text(text) => Some(text.chars().collect::<Vec<_>>()),
                    _ => None,
                })
                .flatten()
                .collect()
        });

        for key in keys {
            match self.machine.handle_key(key, &mut self.display) {
                Ok(Control::Continue) => self.status = None,
                Ok(Control::Exit) => ctx.send_viewport_cmd(egui::ViewportCommand::Close),
                Err(err) => {
                    tracing::error!("key '{key}': {err}");
                    self.status = Some(err.to_string());
                }
            }
        }
    }

    /// Re-rasterize only when the display list or camera changed.
    fn refresh_texture(&mut self, ctx: &egui::Context) {
        let revision = self.display.revision();
        if self.rendered_revision == Some(revision) && self.texture.is_some() {
            return;
        }

        let image = self.display.render();
        let size = [image.width() as usize, image.height() as usize];
        let color = egui::ColorImage::from_rgb(size, image.as_raw());
        match &mut self.texture {
            Some(texture) => texture.set(color, egui::TextureOptions::LINEAR),
            None => {
                self.texture = Some(ctx.load_texture("scene", color, egui::TextureOptions::LINEAR))
            }
        }
        self.rendered_revision = Some(revision);
    }
}

impl eframe::App for NativeViewer {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_keys(ctx);

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let (rect, response) =
                    ui.allocate_exact_size(ui.available_size(), egui::Sense::drag());

                let ppp = ctx.pixels_per_point();
                self.display
                    .resize((rect.width() * ppp) as u32, (rect.height() * ppp) as u32);

                if response.dragged() {
                    let delta = response.drag_delta();
                    self.display
                        .camera_mut()
                        .orbit(-delta.x * ORBIT_SPEED, delta.y * ORBIT_SPEED);
                }
                if response.hovered() {
                    let scroll = ui.input(|i| i.raw_scroll_delta.y);
                    if scroll != 0.0 {
                        self.display.camera_mut().zoom((-scroll * ZOOM_SPEED).exp());
                    }
                }

                self.refresh_texture(ctx);
                let painter = ui.painter();
                if let Some(texture) = &self.texture {
                    let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
                    painter.image(texture.id(), rect, uv, egui::Color32::WHITE);
                }

                if let Some(state) = self.machine.current_state() {
                    painter.text(
                        rect.left_top() + egui::vec2(8.0, 8.0),
                        egui::Align2::LEFT_TOP,
                        state.to_string(),
                        egui::FontId::proportional(14.0),
                        egui::Color32::GRAY,
                    );
                }
                if let Some(status) = &self.status {
                    painter.text(
                        rect.left_bottom() + egui::vec2(8.0, -8.0),
                        egui::Align2::LEFT_BOTTOM,
                        status,
                        egui::FontId::proportional(14.0),
                        egui::Color32::RED,
                    );
                }
            });
    }
}

/// Open a window and run the key loop until the user quits.
pub fn run_native_viewer(
    machine: ViewStateMachine,
    display: DisplayList,
    options: &RenderOptions,
) -> Result<()> {
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("KCP registration viewer")
            .with_inner_size([options.width as f32, options.height as f32]),
        ..Default::default()
    };

    eframe::run_native(
        "KCP registration viewer",
        native_options,
        Box::new(|_cc| Ok(Box::new(NativeViewer::new(machine, display)))),
    )
    .map_err(|e| ViewerError::Window(e.to_string()))
}
