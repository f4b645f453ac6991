//! Headless wgpu backend.
//!
//! Renders into an offscreen `Rgba8UnormSrgb` target. The host composites
//! or reads back the result; no window surface is involved.
//!
//! ## Passes
//!
//! ```text
//! 1. Shadow   depth-only, 2048² map, card only       (Ultra, casts_shadow)
//! 2. Main     card mesh, program pipeline             (opaque or alpha)
//! 3. Particle additive billboards, depth read-only    (premium cards)
//! ```
//!
//! Every pipeline and allocation runs inside a wgpu error scope, so shader
//! validation failures and out-of-memory come back as [`RenderError`]s
//! instead of reaching the uncaptured-error handler.

use super::{
    card_mesh, CardVertex, DrawFrame, DrawReport, MaterialHandle, ParticleHandle, RenderBackend,
    SceneUniforms,
};
use crate::effects::{ParticleShaders, ParticleVertex};
use crate::error::{RenderError, RenderResult};
use crate::material::{MaterialDescriptor, MaterialShaders, ShaderProgram, TextureImage};
use std::collections::HashMap;
use wgpu::util::DeviceExt;

const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

struct GpuMaterial {
    program: ShaderProgram,
    uniforms: wgpu::Buffer,
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

struct GpuParticles {
    buffer: wgpu::Buffer,
    capacity: usize,
}

struct ShadowMap {
    size: u32,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

/// wgpu-backed [`RenderBackend`].
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    adapter_name: String,
    width: u32,
    height: u32,
    color_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,

    scene_buffer: wgpu::Buffer,
    scene_layout: wgpu::BindGroupLayout,
    scene_bind_group: wgpu::BindGroup,
    shadow_scene_bind_group: wgpu::BindGroup,
    shadow_sampler: wgpu::Sampler,
    shadow: ShadowMap,

    material_layout: wgpu::BindGroupLayout,
    material_pipeline_layout: wgpu::PipelineLayout,
    material_module: wgpu::ShaderModule,
    program_pipelines: HashMap<ShaderProgram, wgpu::RenderPipeline>,
    shadow_pipeline: wgpu::RenderPipeline,
    particle_pipeline: wgpu::RenderPipeline,

    card_vertices: wgpu::Buffer,
    card_indices: wgpu::Buffer,
    card_index_count: u32,

    materials: HashMap<MaterialHandle, GpuMaterial>,
    particles: HashMap<ParticleHandle, GpuParticles>,
    next_handle: u64,
}

impl std::fmt::Debug for WgpuBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WgpuBackend")
            .field("adapter", &self.adapter_name)
            .field("size", &(self.width, self.height))
            .field("materials", &self.materials.len())
            .field("particle_buffers", &self.particles.len())
            .finish_non_exhaustive()
    }
}

impl WgpuBackend {
    /// Creates a device on the best available adapter and an offscreen
    /// `width` x `height` target.
    ///
    /// # Errors
    ///
    /// [`RenderError::Backend`] if no adapter or device can be created,
    /// [`RenderError::ShaderCompilation`] if a built-in module fails
    /// validation.
    pub fn new_headless(width: u32, height: u32) -> RenderResult<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| RenderError::Backend("no graphics adapter available".to_string()))?;

        let adapter_name = adapter.get_info().name;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("HOLOCARD Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits()),
            },
            None,
        ))
        .map_err(|e| RenderError::Backend(e.to_string()))?;

        tracing::info!(adapter = %adapter_name, width, height, "wgpu backend ready");
        Self::from_device(device, queue, adapter_name, width, height)
    }

    fn from_device(
        device: wgpu::Device,
        queue: wgpu::Queue,
        adapter_name: String,
        width: u32,
        height: u32,
    ) -> RenderResult<Self> {
        let (width, height) = (width.max(1), height.max(1));
        let (color_view, depth_view) = create_targets(&device, width, height);

        // === Scene bindings ===
        let scene_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Scene Uniforms"),
            size: SceneUniforms::SIZE as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let scene_entry = wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let scene_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Scene Layout"),
            entries: &[
                scene_entry,
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
        });

        // The shadow pass writes the map, so it cannot also bind it.
        let shadow_scene_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Shadow Scene Layout"),
            entries: &[scene_entry],
        });
        let shadow_scene_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Shadow Scene Bind Group"),
            layout: &shadow_scene_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: scene_buffer.as_entire_binding(),
            }],
        });

        let shadow_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Shadow Sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        // 1x1 stand-in until a frame asks for a real map.
        let shadow = create_shadow_map(&device, 1);
        let scene_bind_group =
            create_scene_bind_group(&device, &scene_layout, &scene_buffer, &shadow.view, &shadow_sampler);

        // === Material bindings ===
        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Material Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let material_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Material Pipeline Layout"),
            bind_group_layouts: &[&scene_layout, &material_layout],
            push_constant_ranges: &[],
        });

        let material_module = validated(&device, "material", || {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Material Shaders"),
                source: wgpu::ShaderSource::Wgsl(MaterialShaders::source().into()),
            })
        })?;

        // === Shadow pipeline ===
        let shadow_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Shadow Pipeline Layout"),
            bind_group_layouts: &[&shadow_scene_layout],
            push_constant_ranges: &[],
        });

        let shadow_pipeline = validated(&device, "shadow", || {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Shadow Pipeline"),
                layout: Some(&shadow_pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &material_module,
                    entry_point: MaterialShaders::SHADOW_ENTRY,
                    buffers: &[CardVertex::desc()],
                },
                fragment: None,
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::LessEqual,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState {
                        constant: 2,
                        slope_scale: 2.0,
                        clamp: 0.0,
                    },
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
            })
        })?;

        // === Particle pipeline ===
        let particle_module = validated(&device, "particle", || {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Particle Shaders"),
                source: wgpu::ShaderSource::Wgsl(ParticleShaders::source().into()),
            })
        })?;

        let particle_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Particle Pipeline Layout"),
            bind_group_layouts: &[&scene_layout],
            push_constant_ranges: &[],
        });

        let particle_pipeline = validated(&device, "particle", || {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Particle Pipeline"),
                layout: Some(&particle_pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &particle_module,
                    entry_point: ParticleShaders::VERTEX_ENTRY,
                    buffers: &[ParticleVertex::desc()],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &particle_module,
                    entry_point: ParticleShaders::FRAGMENT_ENTRY,
                    targets: &[Some(wgpu::ColorTargetState {
                        format: COLOR_FORMAT,
                        blend: Some(ParticleShaders::BLEND_MODE.blend_state()),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: ParticleShaders::BLEND_MODE.writes_depth(),
                    depth_compare: wgpu::CompareFunction::LessEqual,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
            })
        })?;

        // === Card mesh ===
        let (vertices, indices) = card_mesh();
        let card_vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Card Vertices"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let card_indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Card Indices"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Ok(Self {
            device,
            queue,
            adapter_name,
            width,
            height,
            color_view,
            depth_view,
            scene_buffer,
            scene_layout,
            scene_bind_group,
            shadow_scene_bind_group,
            shadow_sampler,
            shadow,
            material_layout,
            material_pipeline_layout,
            material_module,
            program_pipelines: HashMap::new(),
            shadow_pipeline,
            particle_pipeline,
            card_vertices,
            card_indices,
            card_index_count: indices.len() as u32,
            materials: HashMap::new(),
            particles: HashMap::new(),
            next_handle: 0,
        })
    }

    /// Name reported by the adapter.
    #[must_use]
    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    fn issue(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    /// Builds (once) the pipeline for `program`.
    fn ensure_program(&mut self, program: ShaderProgram) -> RenderResult<()> {
        if self.program_pipelines.contains_key(&program) {
            return Ok(());
        }

        let blend_mode = program.blend_mode();
        let device = &self.device;
        let pipeline = validated(device, program.id(), || {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(program.id()),
                layout: Some(&self.material_pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &self.material_module,
                    entry_point: MaterialShaders::VERTEX_ENTRY,
                    buffers: &[CardVertex::desc()],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &self.material_module,
                    entry_point: MaterialShaders::fragment_entry(program),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: COLOR_FORMAT,
                        blend: Some(blend_mode.blend_state()),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    front_face: wgpu::FrontFace::Ccw,
                    // Both faces carry artwork; a flip shows the back.
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: blend_mode.writes_depth(),
                    depth_compare: wgpu::CompareFunction::LessEqual,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
            })
        })?;

        tracing::debug!(program = program.id(), "material pipeline compiled");
        self.program_pipelines.insert(program, pipeline);
        Ok(())
    }

    /// Reallocates the shadow map when the requested size changes.
    fn ensure_shadow_map(&mut self, size: u32) {
        if self.shadow.size == size {
            return;
        }
        let shadow = create_shadow_map(&self.device, size);
        self.scene_bind_group = create_scene_bind_group(
            &self.device,
            &self.scene_layout,
            &self.scene_buffer,
            &shadow.view,
            &self.shadow_sampler,
        );
        let old = std::mem::replace(&mut self.shadow, shadow);
        old.texture.destroy();
    }

    fn upload_texture(&self, desc: &MaterialDescriptor, image: &TextureImage) -> wgpu::Texture {
        let mip_level_count = desc.filtering.mip_level_count(image.width(), image.height());
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Card Artwork"),
            size: wgpu::Extent3d {
                width: image.width(),
                height: image.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: COLOR_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (level, (width, height, pixels)) in mip_chain(image, mip_level_count).iter().enumerate() {
            self.queue.write_texture(
                wgpu::ImageCopyTexture {
                    texture: &texture,
                    mip_level: level as u32,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                pixels,
                wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * width),
                    rows_per_image: Some(*height),
                },
                wgpu::Extent3d {
                    width: *width,
                    height: *height,
                    depth_or_array_layers: 1,
                },
            );
        }
        texture
    }
}

impl RenderBackend for WgpuBackend {
    fn name(&self) -> &str {
        "wgpu"
    }

    fn create_material(
        &mut self,
        desc: &MaterialDescriptor,
        image: &TextureImage,
    ) -> RenderResult<MaterialHandle> {
        self.ensure_program(desc.program)?;

        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);

        let texture = self.upload_texture(desc, image);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = self.device.create_sampler(&desc.filtering.sampler_descriptor());
        let uniforms = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Material Uniforms"),
            contents: bytemuck::bytes_of(&desc.pack()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Material Bind Group"),
            layout: &self.material_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        if let Some(error) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(RenderError::ResourceExhausted(error.to_string()));
        }

        let handle = MaterialHandle(self.issue());
        self.materials.insert(
            handle,
            GpuMaterial {
                program: desc.program,
                uniforms,
                texture,
                bind_group,
            },
        );
        Ok(handle)
    }

    fn release_material(&mut self, handle: MaterialHandle) -> RenderResult<()> {
        let material = self
            .materials
            .remove(&handle)
            .ok_or(RenderError::UnknownHandle(handle.0))?;
        material.uniforms.destroy();
        material.texture.destroy();
        Ok(())
    }

    fn create_particle_buffer(&mut self, capacity: usize) -> RenderResult<ParticleHandle> {
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Particle Instances"),
            size: (capacity.max(1) * ParticleVertex::SIZE) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        if let Some(error) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(RenderError::ResourceExhausted(error.to_string()));
        }

        let handle = ParticleHandle(self.issue());
        self.particles.insert(handle, GpuParticles { buffer, capacity });
        Ok(handle)
    }

    fn release_particle_buffer(&mut self, handle: ParticleHandle) -> RenderResult<()> {
        let particles = self
            .particles
            .remove(&handle)
            .ok_or(RenderError::UnknownHandle(handle.0))?;
        particles.buffer.destroy();
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) -> RenderResult<()> {
        let (width, height) = (width.max(1), height.max(1));
        if (width, height) == (self.width, self.height) {
            return Ok(());
        }
        let (color_view, depth_view) = create_targets(&self.device, width, height);
        self.color_view = color_view;
        self.depth_view = depth_view;
        self.width = width;
        self.height = height;
        Ok(())
    }

    fn draw(&mut self, frame: &DrawFrame<'_>) -> RenderResult<DrawReport> {
        if let Some(card) = &frame.card {
            if !self.materials.contains_key(&card.material) {
                return Err(RenderError::UnknownHandle(card.material.0));
            }
        }
        if let Some(pass) = &frame.particles {
            if !self.particles.contains_key(&pass.buffer) {
                return Err(RenderError::UnknownHandle(pass.buffer.0));
            }
        }

        let shadow_size = match (frame.card, frame.shadow_map_size) {
            (Some(card), Some(size)) if card.casts_shadow => Some(size),
            _ => None,
        };
        if let Some(size) = shadow_size {
            self.ensure_shadow_map(size);
        }

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let this = &*self;
        let mut report = DrawReport::default();
        this.queue
            .write_buffer(&this.scene_buffer, 0, bytemuck::bytes_of(&frame.scene));

        let card = frame
            .card
            .and_then(|draw| this.materials.get(&draw.material).map(|material| (draw, material)));
        if let Some((draw, material)) = card {
            this.queue
                .write_buffer(&material.uniforms, 0, bytemuck::bytes_of(&draw.uniforms));
        }

        let particles = frame.particles.and_then(|pass| {
            this.particles.get(&pass.buffer).map(|gpu| {
                let count = pass.instances.len().min(gpu.capacity);
                (gpu, count, &pass.instances[..count])
            })
        });
        if let Some((gpu, count, instances)) = particles {
            if count > 0 {
                this.queue
                    .write_buffer(&gpu.buffer, 0, bytemuck::cast_slice(instances));
            }
        }

        let mut encoder = this
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Card Frame"),
            });

        // === Pass 1: shadow ===
        if shadow_size.is_some() && card.is_some() {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &this.shadow.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&this.shadow_pipeline);
            pass.set_bind_group(0, &this.shadow_scene_bind_group, &[]);
            pass.set_vertex_buffer(0, this.card_vertices.slice(..));
            pass.set_index_buffer(this.card_indices.slice(..), wgpu::IndexFormat::Uint16);
            pass.draw_indexed(0..this.card_index_count, 0, 0..1);
            report.draw_calls += 1;
        }

        // === Pass 2 + 3: card, then particles ===
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &this.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &this.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let Some((_, material)) = card {
                if let Some(pipeline) = this.program_pipelines.get(&material.program) {
                    pass.set_pipeline(pipeline);
                    pass.set_bind_group(0, &this.scene_bind_group, &[]);
                    pass.set_bind_group(1, &material.bind_group, &[]);
                    pass.set_vertex_buffer(0, this.card_vertices.slice(..));
                    pass.set_index_buffer(this.card_indices.slice(..), wgpu::IndexFormat::Uint16);
                    pass.draw_indexed(0..this.card_index_count, 0, 0..1);
                    report.draw_calls += 1;
                }
            }

            if let Some((gpu, count, _)) = particles {
                if count > 0 {
                    pass.set_pipeline(&this.particle_pipeline);
                    pass.set_bind_group(0, &this.scene_bind_group, &[]);
                    pass.set_vertex_buffer(0, gpu.buffer.slice(..));
                    pass.draw(0..6, 0..count as u32);
                    report.draw_calls += 1;
                }
            }
        }

        this.queue.submit(std::iter::once(encoder.finish()));
        let _ = this.device.poll(wgpu::Maintain::Wait);

        if let Some(error) = pollster::block_on(this.device.pop_error_scope()) {
            return Err(RenderError::Backend(error.to_string()));
        }
        Ok(report)
    }

    fn live_resources(&self) -> usize {
        self.materials.len() + self.particles.len()
    }
}

/// Runs `create` inside a validation scope.
fn validated<T>(
    device: &wgpu::Device,
    program: &'static str,
    create: impl FnOnce() -> T,
) -> RenderResult<T> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = create();
    match pollster::block_on(device.pop_error_scope()) {
        Some(error) => Err(RenderError::ShaderCompilation {
            program,
            message: error.to_string(),
        }),
        None => Ok(value),
    }
}

fn create_targets(device: &wgpu::Device, width: u32, height: u32) -> (wgpu::TextureView, wgpu::TextureView) {
    let size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let color = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Card Target"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: COLOR_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let depth = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Card Depth"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    (
        color.create_view(&wgpu::TextureViewDescriptor::default()),
        depth.create_view(&wgpu::TextureViewDescriptor::default()),
    )
}

fn create_shadow_map(device: &wgpu::Device, size: u32) -> ShadowMap {
    let size = size.max(1);
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Shadow Map"),
        size: wgpu::Extent3d {
            width: size,
            height: size,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    ShadowMap { size, texture, view }
}

fn create_scene_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    buffer: &wgpu::Buffer,
    shadow_view: &wgpu::TextureView,
    shadow_sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Scene Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(shadow_view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(shadow_sampler),
            },
        ],
    })
}

/// Box-filtered mip chain, level 0 first.
fn mip_chain(image: &TextureImage, levels: u32) -> Vec<(u32, u32, Vec<u8>)> {
    let mut chain = vec![(image.width(), image.height(), image.pixels().to_vec())];
    for _ in 1..levels {
        let Some((w, h, pixels)) = chain.last() else {
            break;
        };
        let (nw, nh) = ((w / 2).max(1), (h / 2).max(1));
        let mut next = vec![0u8; (nw * nh * 4) as usize];
        for y in 0..nh {
            for x in 0..nw {
                for c in 0..4 {
                    let mut sum = 0u32;
                    for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                        let sx = (x * 2 + dx).min(w - 1);
                        let sy = (y * 2 + dy).min(h - 1);
                        sum += u32::from(pixels[((sy * w + sx) * 4 + c) as usize]);
                    }
                    next[((y * nw + x) * 4 + c) as usize] = (sum / 4) as u8;
                }
            }
        }
        chain.push((nw, nh, next));
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mip_chain_sizes() {
        let image = TextureImage::new("a", 8, 4, vec![200; 8 * 4 * 4]).unwrap();
        let chain = mip_chain(&image, 4);
        let sizes: Vec<_> = chain.iter().map(|(w, h, _)| (*w, *h)).collect();
        assert_eq!(sizes, vec![(8, 4), (4, 2), (2, 1), (1, 1)]);
        assert!(chain.iter().all(|(w, h, p)| p.len() == (w * h * 4) as usize));
    }

    #[test]
    fn test_mip_chain_averages() {
        let mut pixels = vec![0u8; 2 * 2 * 4];
        pixels[0] = 255;
        pixels[4] = 255;
        let image = TextureImage::new("a", 2, 2, pixels).unwrap();
        let chain = mip_chain(&image, 2);
        assert_eq!(chain[1].2[0], 127);
    }

    #[test]
    fn test_single_level_is_untouched() {
        let image = TextureImage::placeholder();
        let chain = mip_chain(&image, 1);
        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0].2, image.pixels());
    }
}
