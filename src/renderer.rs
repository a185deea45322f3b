use std::sync::Arc;

use anyhow::Result;
use glam::Mat4;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::camera::Camera;
use crate::core::gpu_context::DEPTH_FORMAT;
use crate::core::{FpsCounter, GpuContext};
use crate::error::RenderError;
use crate::hud::{Hud, HudStats};
use crate::scene::{Scene, GROUND_HALF_EXTENT};
use crate::traits::SceneRenderer;
use crate::types::{DrawUniform, MeshData, Vertex};

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.53,
    g: 0.71,
    b: 0.92,
    a: 1.0,
};
const GROUND_COLOR: [f32; 3] = [0.45, 0.38, 0.3];

/// GPU-resident mesh with its own uniform slot
struct MeshBuffers {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl MeshBuffers {
    /// Returns `None` for empty meshes so nothing is drawn for them
    fn upload(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        mesh: &MeshData,
        label: &str,
    ) -> Option<Self> {
        if mesh.is_empty() {
            log::warn!("{} mesh is empty, skipping upload", label);
            return None;
        }

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertices", label)),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Indices", label)),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{} Uniform", label)),
            size: std::mem::size_of::<DrawUniform>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
            label: Some(&format!("{} Bind Group", label)),
        });

        Some(Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
            uniform_buffer,
            bind_group,
        })
    }

    fn write_uniform(&self, queue: &wgpu::Queue, uniform: &DrawUniform) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[*uniform]));
    }

    fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

/// Rasterizes the ground and the vehicle, then the HUD on top
pub struct GpuRenderer {
    window: Arc<Window>,
    gpu: GpuContext,
    pipeline: wgpu::RenderPipeline,
    ground: Option<MeshBuffers>,
    vehicle: Option<MeshBuffers>,
    hud: Option<Hud>,
    fps: FpsCounter,
    max_speed: f64,
}

impl GpuRenderer {
    /// Set up the surface and upload the scene's static geometry.
    /// `show_hud` controls the egui overlay.
    pub async fn new(
        window: Arc<Window>,
        scene: &Scene,
        max_speed: f64,
        show_hud: bool,
    ) -> Result<Self> {
        let gpu = GpuContext::new(window.clone()).await?;
        let device = gpu.device();

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("draw_bind_group_layout"),
        });
        let pipeline = Self::create_pipeline(device, &bind_group_layout, gpu.format());

        let mut ground_mesh = MeshData::default();
        ground_mesh.push_box(
            [-GROUND_HALF_EXTENT, -0.1, -GROUND_HALF_EXTENT],
            [GROUND_HALF_EXTENT, 0.0, GROUND_HALF_EXTENT],
            GROUND_COLOR,
        );
        let ground = MeshBuffers::upload(device, &bind_group_layout, &ground_mesh, "Ground");
        let vehicle = MeshBuffers::upload(
            device,
            &bind_group_layout,
            &scene.vehicle.model.mesh,
            "Vehicle",
        );

        let hud = show_hud.then(|| Hud::new(&window, device, gpu.format()));

        log::info!(
            "Renderer initialized: {} vehicle triangles, HUD {}",
            scene.vehicle.model.mesh.triangle_count(),
            if show_hud { "on" } else { "off" }
        );

        Ok(Self {
            window,
            gpu,
            pipeline,
            ground,
            vehicle,
            hud,
            fps: FpsCounter::default(),
            max_speed,
        })
    }

    fn create_pipeline(
        device: &wgpu::Device,
        bind_group_layout: &wgpu::BindGroupLayout,
        surface_format: wgpu::TextureFormat,
    ) -> wgpu::RenderPipeline {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Mesh Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("mesh.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Mesh Pipeline Layout"),
            bind_group_layouts: &[bind_group_layout],
            push_constant_ranges: &[],
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Mesh Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // glTF winding is not guaranteed after node transforms
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        })
    }

    /// Returns true if the HUD consumed the event
    pub fn handle_event(&mut self, event: &winit::event::WindowEvent) -> bool {
        match self.hud.as_mut() {
            Some(hud) => hud.handle_event(&self.window, event),
            None => false,
        }
    }

    fn acquire_frame(&mut self) -> Result<Option<wgpu::SurfaceTexture>, RenderError> {
        match self.gpu.surface().get_current_texture() {
            Ok(frame) => Ok(Some(frame)),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface lost or outdated, reconfiguring");
                self.gpu.reconfigure();
                Ok(None)
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Surface timeout, skipping frame");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl SceneRenderer for GpuRenderer {
    fn resize_if_needed(&mut self, camera: &mut Camera) -> bool {
        let size = self.window.inner_size();
        if !self.gpu.resize(size.width, size.height) {
            return false;
        }
        camera.set_viewport(size.width, size.height);
        true
    }

    fn render(&mut self, scene: &Scene, camera: &Camera) -> Result<(), RenderError> {
        // Same clock the integrator stepped with
        if self.fps.tick(scene.last_delta) {
            log::debug!("FPS: {:.1}", self.fps.fps());
        }

        let Some(output) = self.acquire_frame()? else {
            return Ok(());
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let view_proj = camera.view_projection();
        let light_dir = scene.light_direction.to_array();
        let queue = self.gpu.queue();
        if let Some(ground) = &self.ground {
            ground.write_uniform(
                queue,
                &DrawUniform::new(view_proj, Mat4::IDENTITY, scene.ambient, light_dir),
            );
        }
        if let Some(vehicle) = &self.vehicle {
            vehicle.write_uniform(
                queue,
                &DrawUniform::new(view_proj, scene.vehicle.transform(), scene.ambient, light_dir),
            );
        }

        let mut encoder = self
            .gpu
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.gpu.depth_view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            for mesh in [&self.ground, &self.vehicle].into_iter().flatten() {
                mesh.draw(&mut render_pass);
            }
        }

        if let Some(hud) = self.hud.as_mut() {
            let stats = HudStats::collect(
                scene,
                self.max_speed,
                self.fps.fps(),
                self.fps.frame_time_ms(),
            );
            hud.draw(
                &self.window,
                self.gpu.device(),
                self.gpu.queue(),
                &mut encoder,
                &view,
                self.gpu.size(),
                &stats,
            );
        }

        self.gpu.queue().submit(std::iter::once(encoder.finish()));
        self.window.pre_present_notify();
        output.present();

        Ok(())
    }
}
