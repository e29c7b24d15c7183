//! Render pipeline management for wgpu
//!
//! Shaders and pipeline configurations are registered by name; pipelines are
//! created lazily on first use or all at once with `create_all_pipelines`.

use std::{collections::HashMap, sync::Arc};
use wgpu::*;

use crate::{
    error::{Result, ViewerError},
    gfx::scene::vertex::Vertex3D,
};

/// Configuration for creating a render pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub label: String,
    pub shader: String,
    pub bind_group_layouts: Vec<BindGroupLayout>,
    pub primitive_topology: PrimitiveTopology,
    pub cull_mode: Option<Face>,
    pub depth_format: Option<TextureFormat>,
    pub multisample: MultisampleState,
    pub color_targets: Vec<Option<ColorTargetState>>,
    pub vertex_only: bool, // depth-only passes such as the shadow map
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            label: "Default Pipeline".to_string(),
            shader: "scene".to_string(),
            bind_group_layouts: Vec::new(),
            primitive_topology: PrimitiveTopology::TriangleList,
            cull_mode: Some(Face::Back),
            depth_format: None,
            multisample: MultisampleState::default(),
            color_targets: vec![Some(ColorTargetState {
                format: TextureFormat::Bgra8Unorm,
                blend: Some(BlendState::REPLACE),
                write_mask: ColorWrites::ALL,
            })],
            vertex_only: false,
        }
    }
}

impl PipelineConfig {
    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_owned();
        self
    }

    pub fn with_shader(mut self, shader: &str) -> Self {
        self.shader = shader.to_string();
        self
    }

    pub fn with_cull_mode(mut self, face: Option<Face>) -> Self {
        self.cull_mode = face;
        self
    }

    pub fn with_bind_group_layouts(mut self, layouts: Vec<BindGroupLayout>) -> Self {
        self.bind_group_layouts = layouts;
        self
    }

    /// Enables depth testing against a buffer of `format`.
    pub fn with_depth_format(mut self, format: TextureFormat) -> Self {
        self.depth_format = Some(format);
        self
    }

    /// Drops the fragment stage and every color target.
    pub fn with_vertex_only(mut self) -> Self {
        self.vertex_only = true;
        self.color_targets.clear();
        self
    }

    /// Single opaque color target of `format`.
    pub fn with_color_format(mut self, format: TextureFormat) -> Self {
        self.color_targets = vec![Some(ColorTargetState {
            format,
            blend: Some(BlendState::REPLACE),
            write_mask: ColorWrites::ALL,
        })];
        self
    }
}

/// Named shader modules and render pipelines.
pub struct PipelineManager {
    device: Arc<Device>,
    pipelines: HashMap<String, RenderPipeline>,
    pipeline_configs: HashMap<String, PipelineConfig>,
    shader_modules: HashMap<String, ShaderModule>,
    pending_pipelines: Vec<String>,
}

impl PipelineManager {
    pub fn new(device: Arc<Device>) -> Self {
        Self {
            device,
            pipelines: HashMap::new(),
            pipeline_configs: HashMap::new(),
            shader_modules: HashMap::new(),
            pending_pipelines: Vec::new(),
        }
    }

    /// Registers a pipeline configuration without creating it.
    pub fn register_pipeline(&mut self, name: &str, config: PipelineConfig) {
        self.pipeline_configs.insert(name.to_string(), config);
        self.pending_pipelines.push(name.to_string());
    }

    /// Compiles a WGSL shader module under `name`.
    pub fn load_shader(&mut self, name: &str, source: &str) {
        let shader_module = self.device.create_shader_module(ShaderModuleDescriptor {
            label: Some(name),
            source: ShaderSource::Wgsl(source.into()),
        });
        self.shader_modules.insert(name.to_string(), shader_module);
    }

    /// Gets or creates a pipeline (lazy loading)
    ///
    /// Returns None if no configuration is registered or creation failed.
    pub fn get_pipeline(&mut self, name: &str) -> Option<&RenderPipeline> {
        if !self.pipelines.contains_key(name) {
            let config = self.pipeline_configs.get(name)?.clone();
            match self.create_pipeline_from_config(name, &config) {
                Ok(pipeline) => {
                    self.pipelines.insert(name.to_string(), pipeline);
                    self.pending_pipelines.retain(|n| n != name);
                }
                Err(e) => {
                    log::error!("{e}");
                    return None;
                }
            }
        }
        self.pipelines.get(name)
    }

    /// Creates all pending pipelines immediately.
    pub fn create_all_pipelines(&mut self) -> Result<()> {
        let mut errors = Vec::new();
        let pending = std::mem::take(&mut self.pending_pipelines);

        for name in pending {
            let Some(config) = self.pipeline_configs.get(&name).cloned() else {
                continue;
            };
            match self.create_pipeline_from_config(&name, &config) {
                Ok(pipeline) => {
                    log::debug!("Created pipeline '{name}'");
                    self.pipelines.insert(name, pipeline);
                }
                Err(e) => {
                    errors.push(e.to_string());
                    self.pending_pipelines.push(name);
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ViewerError::Pipeline(errors.join("; ")))
        }
    }

    fn create_pipeline_from_config(
        &self,
        name: &str,
        config: &PipelineConfig,
    ) -> Result<RenderPipeline> {
        let shader = self.shader_modules.get(&config.shader).ok_or_else(|| {
            ViewerError::Pipeline(format!(
                "pipeline '{name}': shader '{}' not found",
                config.shader
            ))
        })?;

        let bind_group_layout_refs: Vec<&BindGroupLayout> =
            config.bind_group_layouts.iter().collect();
        let pipeline_layout = self
            .device
            .create_pipeline_layout(&PipelineLayoutDescriptor {
                label: Some(&format!("{} Layout", name)),
                bind_group_layouts: &bind_group_layout_refs,
                push_constant_ranges: &[],
            });

        let depth_stencil = config.depth_format.map(|format| DepthStencilState {
            format,
            depth_write_enabled: true,
            depth_compare: CompareFunction::Less,
            stencil: StencilState::default(),
            bias: DepthBiasState::default(),
        });

        let fragment = if config.vertex_only {
            None
        } else {
            Some(FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                targets: &config.color_targets,
                compilation_options: PipelineCompilationOptions::default(),
            })
        };

        let pipeline = self
            .device
            .create_render_pipeline(&RenderPipelineDescriptor {
                label: Some(&config.label),
                layout: Some(&pipeline_layout),
                vertex: VertexState {
                    module: shader,
                    entry_point: Some("vs_main"),
                    buffers: &[Vertex3D::desc()],
                    compilation_options: PipelineCompilationOptions::default(),
                },
                fragment,
                primitive: PrimitiveState {
                    topology: config.primitive_topology,
                    strip_index_format: None,
                    front_face: FrontFace::Ccw,
                    cull_mode: config.cull_mode,
                    polygon_mode: PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil,
                multisample: config.multisample,
                multiview: None,
                cache: None,
            });

        Ok(pipeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_only_config_has_no_color_targets() {
        let config = PipelineConfig::default()
            .with_shader("shadow")
            .with_depth_format(TextureFormat::Depth32Float)
            .with_vertex_only();
        assert!(config.vertex_only);
        assert!(config.color_targets.is_empty());
        assert_eq!(config.depth_format, Some(TextureFormat::Depth32Float));
    }

    #[test]
    fn color_format_replaces_the_default_target() {
        let config = PipelineConfig::default().with_color_format(TextureFormat::Rgba8Unorm);
        assert!(!config.vertex_only);
        assert_eq!(config.color_targets.len(), 1);
        assert_eq!(
            config.color_targets[0].as_ref().map(|t| t.format),
            Some(TextureFormat::Rgba8Unorm)
        );
    }
}
