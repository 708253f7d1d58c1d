//! GPU post-process chain
//!
//! One fullscreen render pipeline per stage plus a shared passthrough
//! pipeline. Stages read the previous stage's output and write into two
//! ping-pong targets; the last stage writes straight into the caller's
//! output view.

use super::capabilities::TextureInput;
use super::post_process::{EffectKind, PassMode, PostEffectChain, StageState};
use super::shaders::{ShaderId, ShaderRegistry};
use super::ViewParams;
use crate::error::Result;
use std::sync::Arc;
use tracing::debug;

/// Auxiliary scene textures supplied by the host for this frame
#[derive(Clone, Copy, Debug, Default)]
pub struct SceneTextures<'a> {
    pub depth: Option<&'a wgpu::TextureView>,
    pub normal: Option<&'a wgpu::TextureView>,
    pub velocity: Option<&'a wgpu::TextureView>,
}

impl<'a> SceneTextures<'a> {
    pub fn get(&self, input: TextureInput) -> Option<&'a wgpu::TextureView> {
        match input {
            TextureInput::Depth => self.depth,
            TextureInput::Normal => self.normal,
            TextureInput::Velocity => self.velocity,
        }
    }
}

/// Compiled pipeline for one shader
struct PassPipeline {
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
    inputs: &'static [TextureInput],
    uniform: Option<wgpu::Buffer>,
}

/// Intermediate colour targets
struct PingPong {
    width: u32,
    height: u32,
    views: [wgpu::TextureView; 2],
    _textures: [wgpu::Texture; 2],
}

/// Runs a [`PostEffectChain`] on the GPU
pub struct PostProcessRenderer {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    format: wgpu::TextureFormat,
    shaders: ShaderRegistry,
    sampler: wgpu::Sampler,
    passthrough: PassPipeline,
    /// Full pipelines of the stages that probed active, in chain order
    full: Vec<(EffectKind, PassPipeline)>,
    targets: Option<PingPong>,
}

impl PostProcessRenderer {
    /// Build pipelines for a probed chain
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        format: wgpu::TextureFormat,
        chain: &PostEffectChain,
    ) -> Result<Self> {
        let mut shaders = ShaderRegistry::new();
        shaders.register_defaults(&device);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("post_process_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let passthrough = Self::create_pass_pipeline(
            &device,
            shaders.require(ShaderId::Passthrough)?,
            format,
            "passthrough",
            &[],
            false,
        );

        let mut renderer = Self {
            device,
            queue,
            format,
            shaders,
            sampler,
            passthrough,
            full: Vec::new(),
            targets: None,
        };
        renderer.rebuild(chain)?;
        Ok(renderer)
    }

    /// Rebuild the full pipelines after a capability change
    pub fn rebuild(&mut self, chain: &PostEffectChain) -> Result<()> {
        self.full.clear();

        for effect in chain.effects() {
            let kind = effect.kind();
            if effect.stage().state() != StageState::Active {
                debug!(effect = kind.name(), "no full pipeline, stage stays passthrough");
                continue;
            }

            let module = self.shaders.require(kind.shader_id())?;
            let pipeline = Self::create_pass_pipeline(
                &self.device,
                module,
                self.format,
                kind.name(),
                kind.required_inputs(),
                true,
            );
            self.full.push((kind, pipeline));
        }

        debug!(full = self.full.len(), "post-process pipelines built");
        Ok(())
    }

    /// Reallocate the intermediate targets
    pub fn resize(&mut self, width: u32, height: u32) {
        let width = width.max(1);
        let height = height.max(1);
        if let Some(targets) = &self.targets {
            if targets.width == width && targets.height == height {
                return;
            }
        }

        let create = |index: usize| {
            self.device.create_texture(&wgpu::TextureDescriptor {
                label: Some(&format!("post_process_target_{}", index)),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: self.format,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            })
        };
        let textures = [create(0), create(1)];
        let views = [
            textures[0].create_view(&wgpu::TextureViewDescriptor::default()),
            textures[1].create_view(&wgpu::TextureViewDescriptor::default()),
        ];

        debug!(width, height, "post-process targets allocated");
        self.targets = Some(PingPong {
            width,
            height,
            views,
            _textures: textures,
        });
    }

    /// Which shader each stage would run with the given textures
    pub fn plan(&self, chain: &PostEffectChain, textures: &SceneTextures) -> [ShaderId; 4] {
        chain.effects().map(|effect| {
            let kind = effect.kind();
            if self.use_full(kind, effect.pass_mode(), textures) {
                kind.shader_id()
            } else {
                ShaderId::Passthrough
            }
        })
    }

    /// Record the whole chain into `encoder`
    ///
    /// A stage whose full pipeline is missing or whose scene texture was
    /// not supplied this frame runs as passthrough.
    #[allow(clippy::too_many_arguments)]
    pub fn apply(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        chain: &PostEffectChain,
        view: &ViewParams,
        input: &wgpu::TextureView,
        textures: &SceneTextures,
        output: &wgpu::TextureView,
        width: u32,
        height: u32,
    ) -> Result<()> {
        self.resize(width, height);
        let Some(targets) = &self.targets else {
            return Ok(());
        };

        let effects = chain.effects();
        let last = effects.len() - 1;
        let mut source = input;

        for (index, effect) in effects.iter().enumerate() {
            let kind = effect.kind();
            let target = if index == last {
                output
            } else {
                &targets.views[index % 2]
            };

            let pass = if self.use_full(kind, effect.pass_mode(), textures) {
                self.full_pipeline(kind)
            } else {
                None
            };

            let bind_group = match pass {
                Some(pass) => {
                    if let Some(buffer) = &pass.uniform {
                        let bytes = effect.uniform_bytes(width, height, view);
                        self.queue.write_buffer(buffer, 0, &bytes);
                    }
                    self.create_bind_group(kind.name(), pass, source, textures)
                }
                None => self.create_bind_group("passthrough", &self.passthrough, source, textures),
            };
            let pipeline = &pass.unwrap_or(&self.passthrough).pipeline;

            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(kind.name()),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            render_pass.set_pipeline(pipeline);
            render_pass.set_bind_group(0, &bind_group, &[]);
            render_pass.draw(0..3, 0..1);
            drop(render_pass);

            source = target;
        }

        Ok(())
    }

    fn use_full(&self, kind: EffectKind, mode: PassMode, textures: &SceneTextures) -> bool {
        mode == PassMode::Full
            && self.full_pipeline(kind).is_some()
            && kind
                .required_inputs()
                .iter()
                .all(|input| textures.get(*input).is_some())
    }

    fn full_pipeline(&self, kind: EffectKind) -> Option<&PassPipeline> {
        self.full
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, pipeline)| pipeline)
    }

    fn create_bind_group(
        &self,
        label: &str,
        pass: &PassPipeline,
        source: &wgpu::TextureView,
        textures: &SceneTextures,
    ) -> wgpu::BindGroup {
        let mut entries = vec![
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(source),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&self.sampler),
            },
        ];
        if let Some(buffer) = &pass.uniform {
            entries.push(wgpu::BindGroupEntry {
                binding: 2,
                resource: buffer.as_entire_binding(),
            });
        }
        for input in pass.inputs {
            if let Some(view) = textures.get(*input) {
                entries.push(wgpu::BindGroupEntry {
                    binding: input.binding(),
                    resource: wgpu::BindingResource::TextureView(view),
                });
            }
        }

        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{}_bind_group", label)),
            layout: &pass.layout,
            entries: &entries,
        })
    }

    fn create_pass_pipeline(
        device: &wgpu::Device,
        shader: &wgpu::ShaderModule,
        format: wgpu::TextureFormat,
        label: &str,
        inputs: &'static [TextureInput],
        with_uniform: bool,
    ) -> PassPipeline {
        let mut entries = vec![
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ];
        if with_uniform {
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            });
        }
        for input in inputs {
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: input.binding(),
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: input.sample_type(),
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            });
        }

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("{}_bind_group_layout", label)),
            entries: &entries,
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{}_layout", label)),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        // 32 bytes covers every effect uniform block
        let uniform = with_uniform.then(|| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(&format!("{}_uniform", label)),
                size: 32,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        });

        PassPipeline {
            pipeline,
            layout: bind_group_layout,
            inputs,
            uniform,
        }
    }
}
