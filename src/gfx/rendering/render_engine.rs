//! WGPU-based renderer for the scene viewer
//!
//! Owns the surface, device and queue, the depth buffer, the global uniform,
//! the sun's shadow map and the scene pipeline.

use std::sync::Arc;
use wgpu::Device;

use crate::{
    config::{parse_hex_color, LightingOptions},
    error::{Result, ViewerError},
    gfx::{
        camera::camera_utils::CameraUniform,
        resources::{
            global_bindings::{update_global_ubo, GlobalBindings, GlobalUBO, LightConfig},
            texture_resource::TextureResource,
        },
        scene::{mesh::DrawMesh, scene::Scene},
    },
    wgpu_utils::binding_types,
};

use super::pipeline_manager::{PipelineConfig, PipelineManager};

const SCENE_PIPELINE: &str = "Scene";
const SHADOW_PIPELINE: &str = "Shadow";
const SHADOW_MAP_SIZE: u32 = 2048;

/// Core rendering engine managing GPU resources and draw calls
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_texture: TextureResource,
    shadow_map: TextureResource,
    shadow_bind_group: wgpu::BindGroup,
    // The scene and the sun are static, so the map is drawn once.
    shadow_map_valid: bool,
    pub pipeline_manager: PipelineManager,
    global_ubo: GlobalUBO,
    global_bindings: GlobalBindings,
    node_bind_group_layout: wgpu::BindGroupLayout,
    light_config: LightConfig,
    clear_color: wgpu::Color,
}

impl RenderEngine {
    /// Creates a render engine drawing into `window`.
    ///
    /// Fails if no adapter or device is available or a pipeline cannot be
    /// built.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        lighting: &LightingOptions,
    ) -> Result<RenderEngine> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .map_err(|e| ViewerError::Surface(e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        log::info!("Using adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits::downlevel_defaults()
                    .using_resolution(adapter.limits()),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .ok_or_else(|| ViewerError::Surface("surface reports no formats".to_string()))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_capabilities
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture =
            TextureResource::create_depth_texture(&device, &config, "depth_texture");

        let shadow_map = TextureResource::create_shadow_map(&device, SHADOW_MAP_SIZE);
        let shadow_layout = binding_types::shadow_map_layout(&device, "Shadow Map Layout");
        let shadow_sampler = shadow_map
            .sampler
            .as_ref()
            .ok_or_else(|| ViewerError::Pipeline("shadow map has no sampler".to_string()))?;
        let shadow_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Shadow Bind Group"),
            layout: &shadow_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&shadow_map.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(shadow_sampler),
                },
            ],
        });

        let light_config = LightConfig::from_options(lighting);
        let [r, g, b, a] = parse_hex_color(&lighting.sky_color)?;
        let clear_color = wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: a as f64,
        };

        let global_ubo = GlobalUBO::new(&device);
        let global_bindings = GlobalBindings::new(&device, &global_ubo);

        let node_bind_group_layout = binding_types::single_uniform_layout(
            &device,
            "Node Bind Group Layout",
            wgpu::ShaderStages::VERTEX_FRAGMENT,
        );

        let device_handle: Arc<Device> = device.into();
        let queue_handle: Arc<wgpu::Queue> = queue.into();
        let mut pipeline_manager = PipelineManager::new(device_handle.clone());

        pipeline_manager.load_shader("scene", include_str!("scene.wgsl"));
        pipeline_manager.load_shader("shadow", include_str!("shadow.wgsl"));
        pipeline_manager.register_pipeline(
            SHADOW_PIPELINE,
            PipelineConfig::default()
                .with_label("SHADOW")
                .with_shader("shadow")
                .with_depth_format(TextureResource::DEPTH_FORMAT)
                .with_cull_mode(None)
                .with_bind_group_layouts(vec![
                    global_bindings.bind_group_layout().clone(),
                    node_bind_group_layout.clone(),
                ])
                .with_vertex_only(),
        );
        pipeline_manager.register_pipeline(
            SCENE_PIPELINE,
            PipelineConfig::default()
                .with_label("SCENE")
                .with_shader("scene")
                .with_color_format(format)
                .with_depth_format(TextureResource::DEPTH_FORMAT)
                .with_cull_mode(None) // imported models are not reliably closed
                .with_bind_group_layouts(vec![
                    global_bindings.bind_group_layout().clone(),
                    node_bind_group_layout.clone(),
                    shadow_layout,
                ]),
        );
        pipeline_manager.create_all_pipelines()?;

        Ok(RenderEngine {
            surface,
            device: device_handle,
            queue: queue_handle,
            config,
            depth_texture,
            shadow_map,
            shadow_bind_group,
            shadow_map_valid: false,
            pipeline_manager,
            global_ubo,
            global_bindings,
            node_bind_group_layout,
            light_config,
            clear_color,
        })
    }

    /// Draws one frame of `scene`, rendering the shadow map first if it is
    /// not yet valid.
    ///
    /// A lost or outdated surface is reconfigured and the frame skipped.
    pub fn render_frame(&mut self, scene: &Scene) -> Result<()> {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Timed out acquiring surface texture, skipping frame");
                return Ok(());
            }
            Err(e) => return Err(ViewerError::Surface(e.to_string())),
        };

        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        if !self.shadow_map_valid {
            self.shadow_map_valid = self.render_shadow_map(&mut encoder, scene);
        }

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, self.global_bindings.bind_group(), &[]);
            render_pass.set_bind_group(2, &self.shadow_bind_group, &[]);

            if let Some(pipeline) = self.pipeline_manager.get_pipeline(SCENE_PIPELINE) {
                render_pass.set_pipeline(pipeline);

                scene.visit(|node, _| {
                    let (Some(mesh), Some(bind_group)) =
                        (node.mesh.and_then(|id| scene.mesh(id)), node.bind_group())
                    else {
                        return;
                    };
                    render_pass.set_bind_group(1, bind_group, &[]);
                    render_pass.draw_mesh(mesh);
                });
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        Ok(())
    }

    /// Depth-only pass of every mesh as seen from the sun.
    ///
    /// Returns false when the shadow pipeline is unavailable.
    fn render_shadow_map(&mut self, encoder: &mut wgpu::CommandEncoder, scene: &Scene) -> bool {
        let mut shadow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Shadow Depth Pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.shadow_map.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        shadow_pass.set_bind_group(0, self.global_bindings.bind_group(), &[]);

        let Some(pipeline) = self.pipeline_manager.get_pipeline(SHADOW_PIPELINE) else {
            log::warn!("Shadow pipeline unavailable, drawing without shadows");
            return false;
        };
        shadow_pass.set_pipeline(pipeline);

        scene.visit(|node, _| {
            let (Some(mesh), Some(bind_group)) =
                (node.mesh.and_then(|id| scene.mesh(id)), node.bind_group())
            else {
                return;
            };
            shadow_pass.set_bind_group(1, bind_group, &[]);
            shadow_pass.draw_mesh(mesh);
        });
        log::debug!("Rendered shadow map ({SHADOW_MAP_SIZE}x{SHADOW_MAP_SIZE})");
        true
    }

    /// Uploads this frame's camera matrices together with the lights.
    pub fn update(&mut self, camera_uniform: CameraUniform) {
        update_global_ubo(
            &mut self.global_ubo,
            &self.queue,
            &camera_uniform,
            &self.light_config,
        );
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            TextureResource::create_depth_texture(&self.device, &self.config, "depth_texture");
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Layout of the per-node uniform bound at group 1.
    pub fn node_bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.node_bind_group_layout
    }
}
