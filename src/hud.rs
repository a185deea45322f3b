use winit::window::Window;

use crate::core::Intent;
use crate::scene::Scene;

/// Values shown in the overlay for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct HudStats {
    pub fps: f32,
    pub frame_time_ms: f32,
    pub velocity: f64,
    pub max_speed: f64,
    pub heading_degrees: f64,
    pub position: [f64; 2],
    pub intents: Vec<Intent>,
    pub wheels: usize,
}

impl HudStats {
    pub fn collect(scene: &Scene, max_speed: f64, fps: f32, frame_time_ms: f32) -> Self {
        let state = &scene.vehicle.state;
        Self {
            fps,
            frame_time_ms,
            velocity: state.velocity,
            max_speed,
            heading_degrees: state.heading.to_degrees(),
            position: [state.position.x, state.position.z],
            intents: scene.last_input.active().collect(),
            wheels: scene.vehicle.wheels().count(),
        }
    }

    /// Fraction of max speed, signed
    pub fn throttle(&self) -> f64 {
        if self.max_speed > 0.0 {
            self.velocity / self.max_speed
        } else {
            0.0
        }
    }

    pub fn intent_label(&self) -> String {
        if self.intents.is_empty() {
            return "-".to_string();
        }
        self.intents
            .iter()
            .map(|intent| format!("{:?}", intent))
            .collect::<Vec<_>>()
            .join(" + ")
    }
}

/// egui overlay drawn on top of the scene
pub struct Hud {
    ctx: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
}

impl Hud {
    pub fn new(window: &Window, device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let ctx = egui::Context::default();
        let state = egui_winit::State::new(
            ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let renderer =
            egui_wgpu::Renderer::new(device, format, egui_wgpu::RendererOptions::default());

        Self {
            ctx,
            state,
            renderer,
        }
    }

    /// Returns true if egui consumed the event
    pub fn handle_event(&mut self, window: &Window, event: &winit::event::WindowEvent) -> bool {
        self.state.on_window_event(window, event).consumed
    }

    /// Record the overlay into `encoder`, loading over `view`
    pub fn draw(
        &mut self,
        window: &Window,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        size: (u32, u32),
        stats: &HudStats,
    ) {
        let raw_input = self.state.take_egui_input(window);

        let full_output = self.ctx.run(raw_input, |ctx| {
            egui::Window::new("Rover")
                .title_bar(false)
                .resizable(false)
                .fixed_pos(egui::pos2(10.0, 10.0))
                .default_width(220.0)
                .show(ctx, |ui| {
                    ui.label(
                        egui::RichText::new(format!("{:.0} FPS", stats.fps))
                            .size(20.0)
                            .color(egui::Color32::from_rgb(74, 158, 255)),
                    );
                    ui.label(
                        egui::RichText::new(format!("{:.2} ms", stats.frame_time_ms))
                            .size(12.0)
                            .color(egui::Color32::GRAY),
                    );
                    ui.separator();
                    ui.label(
                        egui::RichText::new(format!(
                            "Speed {:+.3} ({:+.0}%)",
                            stats.velocity,
                            stats.throttle() * 100.0
                        ))
                        .color(egui::Color32::from_rgb(100, 200, 100)),
                    );
                    ui.label(format!("Heading {:.1}°", stats.heading_degrees));
                    ui.label(format!(
                        "Position x {:.2}  z {:.2}",
                        stats.position[0], stats.position[1]
                    ));
                    ui.label(
                        egui::RichText::new(format!("Input {}", stats.intent_label()))
                            .color(egui::Color32::from_rgb(200, 150, 100)),
                    );
                    ui.label(
                        egui::RichText::new(format!("{} wheels", stats.wheels))
                            .size(12.0)
                            .color(egui::Color32::GRAY),
                    );
                });
        });

        self.state
            .handle_platform_output(window, full_output.platform_output);

        let tris = self
            .ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        for (id, image_delta) in &full_output.textures_delta.set {
            self.renderer.update_texture(device, queue, *id, image_delta);
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [size.0, size.1],
            pixels_per_point: full_output.pixels_per_point,
        };

        self.renderer
            .update_buffers(device, queue, encoder, &tris, &screen_descriptor);

        {
            let mut render_pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("HUD Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: None,
                    occlusion_query_set: None,
                    timestamp_writes: None,
                })
                .forget_lifetime();

            self.renderer
                .render(&mut render_pass, &tris, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.renderer.free_texture(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ControlInput, VehicleState};
    use crate::loaders::ModelAsset;
    use crate::scene::VehicleEntity;

    fn scene_with(state: VehicleState, input: ControlInput) -> Scene {
        let mut scene = Scene::new(VehicleEntity::new(ModelAsset::placeholder(), state));
        scene.last_input = input;
        scene
    }

    #[test]
    fn test_collect_reads_vehicle() {
        let state = VehicleState {
            velocity: -0.15,
            heading: std::f64::consts::PI,
            ..Default::default()
        };
        let mut input = ControlInput::default();
        input.set_intent(Intent::Brake, true);

        let stats = HudStats::collect(&scene_with(state, input), 0.3, 60.0, 16.6);
        assert!((stats.heading_degrees - 180.0).abs() < 1e-9);
        assert!((stats.throttle() + 0.5).abs() < 1e-9);
        assert_eq!(stats.intents, vec![Intent::Brake]);
        assert_eq!(stats.wheels, 4);
    }

    #[test]
    fn test_intent_label() {
        let mut input = ControlInput::default();
        let stats = HudStats::collect(&scene_with(VehicleState::default(), input), 0.3, 0.0, 0.0);
        assert_eq!(stats.intent_label(), "-");

        input.set_intent(Intent::Accelerate, true);
        input.set_intent(Intent::TurnLeft, true);
        let stats = HudStats::collect(&scene_with(VehicleState::default(), input), 0.3, 0.0, 0.0);
        assert_eq!(stats.intent_label(), "Accelerate + TurnLeft");
    }
}
