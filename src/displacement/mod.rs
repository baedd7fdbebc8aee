//! Displacement field simulation.
//!
//! Each step re-renders every wave train into a pair of float render targets
//! (displaced position + packed normal) with one additive full-screen pass
//! per wave. The field is recomputed from scratch every step; nothing
//! persists between frames except the targets themselves.

mod readback;

pub use readback::{half_to_f32, read_texels, save_texels_png};

use crate::lookup::LookupTableCache;
use crate::params::{OceanConfig, WaveParams};

/// Render target format for both field textures. Float, filterable and
/// blendable without extra device features (stands in for the original
/// 32-bit float targets).
pub const FIELD_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
pub const FIELD_DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Full per-pass parameter bag for one wave. Every pass gets the complete
/// set; no state is carried over from the previous pass.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct WaveUniforms {
    pub orbit_radius: f32,
    pub wave_number: f32,
    pub angular_speed: f32,
    pub max_stretch: f32,
    pub max_displacement: f32,
    pub displacement_factor: f32,
    pub center: [f32; 2],
    /// Additive blend weight, 1/N for N waves
    pub mix_weight: f32,
    pub time: f32,
    pub _padding: [f32; 2],
}

impl WaveUniforms {
    fn pack(wave: &WaveParams, mix_weight: f32, time: f32) -> Self {
        Self {
            orbit_radius: wave.orbit_radius,
            wave_number: wave.wave_number,
            angular_speed: wave.angular_speed,
            max_stretch: wave.max_stretch,
            max_displacement: wave.max_displacement,
            displacement_factor: wave.displacement_factor,
            center: wave.center,
            mix_weight,
            time,
            _padding: [0.0; 2],
        }
    }
}

/// Plan one simulation step: one uniform bag per wave, weighted so the N
/// additive passes sum to a normalized contribution. An empty wave list
/// yields no plan at all -- the field keeps whatever it last held.
pub fn plan_step(waves: &[WaveParams], time: f32) -> Option<Vec<WaveUniforms>> {
    if waves.is_empty() {
        return None;
    }
    let mix_weight = 1.0 / waves.len() as f32;
    Some(
        waves
            .iter()
            .map(|w| WaveUniforms::pack(w, mix_weight, time))
            .collect(),
    )
}

/// Outcome of a simulation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stepped {
    /// Empty wave list or missing lookup table; field untouched
    Skipped,
    /// Field was cleared and re-accumulated with this many passes
    Accumulated { passes: usize },
}

/// The two field render targets plus their shared depth buffer.
pub struct FieldTextures {
    pub position: wgpu::Texture,
    pub position_view: wgpu::TextureView,
    pub normal: wgpu::Texture,
    pub normal_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
    resolution: u32,
}

impl FieldTextures {
    fn new(device: &wgpu::Device, resolution: u32) -> Self {
        let descriptor = |label, format, usage| wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: resolution,
                height: resolution,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        };

        let field_usage = wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_SRC;

        let position = device.create_texture(&descriptor(
            "Field Position Texture",
            FIELD_FORMAT,
            field_usage,
        ));
        let normal =
            device.create_texture(&descriptor("Field Normal Texture", FIELD_FORMAT, field_usage));
        let depth = device.create_texture(&descriptor(
            "Field Depth Texture",
            FIELD_DEPTH_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        ));

        let position_view = position.create_view(&wgpu::TextureViewDescriptor::default());
        let normal_view = normal.create_view(&wgpu::TextureViewDescriptor::default());
        let depth_view = depth.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            position,
            position_view,
            normal,
            normal_view,
            depth_view,
            resolution,
        }
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }
}

/// Owns the field textures, the baked lookup texture and the additive
/// accumulation pipeline, and re-renders the field once per step.
pub struct DisplacementSimulator {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    lookup_sampler: wgpu::Sampler,

    field: Option<FieldTextures>,
    field_generation: u32,

    lookup: LookupTableCache,
    lookup_view: Option<wgpu::TextureView>,

    // One uniform buffer + bind group per wave, reused across steps
    passes: Vec<(wgpu::Buffer, wgpu::BindGroup)>,
}

impl DisplacementSimulator {
    /// Build the accumulation pipeline. The shader is compiled here; a
    /// missing or invalid shader is a host misconfiguration and faults at
    /// construction rather than producing garbage frames later.
    pub fn new(device: &wgpu::Device) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Wave Accumulation Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("waves.wgsl").into()),
        });

        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Wave Pass Bind Group Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
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

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Wave Pass Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let additive = wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
        };

        let target = Some(wgpu::ColorTargetState {
            format: FIELD_FORMAT,
            blend: Some(additive),
            write_mask: wgpu::ColorWrites::ALL,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Wave Accumulation Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[target.clone(), target],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: Some(wgpu::DepthStencilState {
                format: FIELD_DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Always,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let lookup_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Lookup Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            pipeline,
            bind_group_layout,
            lookup_sampler,
            field: None,
            field_generation: 0,
            lookup: LookupTableCache::new(),
            lookup_view: None,
            passes: Vec::new(),
        }
    }

    /// Bring every owned GPU resource in line with `config`: field targets,
    /// lookup texture and the per-wave uniform pool. Callable every frame;
    /// a no-op when nothing changed.
    pub fn reconfigure(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        config: &OceanConfig,
    ) {
        self.ensure_field(device, config.resolution);
        self.ensure_lookup(device, queue, config.lookup_size);
        self.ensure_passes(device, config.waves.len());
    }

    /// (Re)allocate the field targets when absent or sized differently.
    /// The old textures are dropped before the new ones are created.
    pub fn ensure_field(&mut self, device: &wgpu::Device, resolution: u32) {
        assert!(resolution >= 2, "resolution must be at least 2");
        if let Some(field) = &self.field {
            if field.resolution == resolution {
                return;
            }
        }
        self.release_field();
        log::debug!("field textures provisioned at {0}x{0}", resolution);
        self.field = Some(FieldTextures::new(device, resolution));
        self.field_generation += 1;
    }

    /// Drop both field textures. Idempotent.
    pub fn release_field(&mut self) {
        self.field = None;
    }

    /// Drop every owned GPU resource. Idempotent.
    pub fn teardown(&mut self) {
        self.release_field();
        self.lookup_view = None;
        self.passes.clear();
    }

    fn ensure_lookup(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, size: u32) {
        let rebuilt = self.lookup.ensure(size);
        if !rebuilt && self.lookup_view.is_some() {
            return;
        }
        if !self.lookup.is_built() {
            return;
        }

        let width = self.lookup.size();
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Wave Lookup Texture"),
            size: wgpu::Extent3d {
                width,
                height: 1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &self.lookup.samples_u8(),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(width),
                rows_per_image: Some(1),
            },
            wgpu::Extent3d {
                width,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
        self.lookup_view = Some(texture.create_view(&wgpu::TextureViewDescriptor::default()));
        // Bind groups reference the old view; rebuild them lazily
        self.passes.clear();
    }

    fn ensure_passes(&mut self, device: &wgpu::Device, count: usize) {
        let Some(lookup_view) = &self.lookup_view else {
            return;
        };
        if self.passes.len() == count {
            return;
        }
        self.passes.truncate(count);
        while self.passes.len() < count {
            let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Wave Uniform Buffer"),
                size: std::mem::size_of::<WaveUniforms>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Wave Pass Bind Group"),
                layout: &self.bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(lookup_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(&self.lookup_sampler),
                    },
                ],
            });
            self.passes.push((buffer, bind_group));
        }
    }

    /// Run one simulation step at `time` seconds: clear both targets, then
    /// accumulate one additive full-screen pass per wave. An empty wave list
    /// leaves the previous field contents untouched.
    pub fn step(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        waves: &[WaveParams],
        time: f32,
    ) -> Stepped {
        let Some(plan) = plan_step(waves, time) else {
            return Stepped::Skipped;
        };
        if self.lookup_view.is_none() {
            log::warn!("step called without a lookup table; skipping");
            return Stepped::Skipped;
        }
        self.ensure_passes(device, plan.len());

        for (uniforms, (buffer, _)) in plan.iter().zip(&self.passes) {
            queue.write_buffer(buffer, 0, bytemuck::bytes_of(uniforms));
        }

        let Some(field) = &self.field else {
            log::warn!("step called before field provisioning; skipping");
            return Stepped::Skipped;
        };

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Wave Accumulation Encoder"),
        });

        for (i, (_, bind_group)) in self.passes.iter().enumerate().take(plan.len()) {
            // First pass clears: position to black (no displacement yet),
            // normal to mid-gray (packed zero vector). Later passes load
            // and the blend state accumulates.
            let (position_load, normal_load, depth_load) = if i == 0 {
                (
                    wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    wgpu::LoadOp::Clear(wgpu::Color {
                        r: 0.5,
                        g: 0.5,
                        b: 0.5,
                        a: 0.5,
                    }),
                    wgpu::LoadOp::Clear(1.0),
                )
            } else {
                (wgpu::LoadOp::Load, wgpu::LoadOp::Load, wgpu::LoadOp::Load)
            };

            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Wave Pass"),
                color_attachments: &[
                    Some(wgpu::RenderPassColorAttachment {
                        view: &field.position_view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: position_load,
                            store: wgpu::StoreOp::Store,
                        },
                    }),
                    Some(wgpu::RenderPassColorAttachment {
                        view: &field.normal_view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: normal_load,
                            store: wgpu::StoreOp::Store,
                        },
                    }),
                ],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &field.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: depth_load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, bind_group, &[]);
            pass.draw(0..3, 0..1);
        }

        queue.submit(std::iter::once(encoder.finish()));
        Stepped::Accumulated { passes: plan.len() }
    }

    pub fn field(&self) -> Option<&FieldTextures> {
        self.field.as_ref()
    }

    /// Bumped whenever the field textures are reallocated; lets the renderer
    /// know its texture bind group went stale.
    pub fn field_generation(&self) -> u32 {
        self.field_generation
    }

    pub fn lookup_rebuilds(&self) -> u32 {
        self.lookup.rebuilds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wave() -> WaveParams {
        WaveParams::default()
    }

    #[test]
    fn test_empty_wave_list_plans_nothing() {
        assert!(plan_step(&[], 1.0).is_none());
    }

    #[test]
    fn test_mix_weight_is_one_over_n() {
        for n in 1..=8 {
            let waves = vec![wave(); n];
            let plan = plan_step(&waves, 0.0).unwrap();
            assert_eq!(plan.len(), n);
            for uniforms in &plan {
                assert_eq!(uniforms.mix_weight, 1.0 / n as f32);
            }
        }
    }

    #[test]
    fn test_plan_carries_full_parameter_bag() {
        let w = WaveParams {
            orbit_radius: 0.5,
            wave_number: 12.0,
            angular_speed: 3.0,
            max_stretch: 2.0,
            max_displacement: 0.25,
            displacement_factor: 0.75,
            center: [0.25, 0.75],
        };
        let plan = plan_step(&[w], 4.5).unwrap();
        let u = plan[0];
        assert_eq!(u.orbit_radius, 0.5);
        assert_eq!(u.wave_number, 12.0);
        assert_eq!(u.angular_speed, 3.0);
        assert_eq!(u.max_stretch, 2.0);
        assert_eq!(u.max_displacement, 0.25);
        assert_eq!(u.displacement_factor, 0.75);
        assert_eq!(u.center, [0.25, 0.75]);
        assert_eq!(u.time, 4.5);
        assert_eq!(u.mix_weight, 1.0);
    }

    #[test]
    fn test_wave_uniforms_wgsl_layout() {
        // Must match the WaveUniforms struct in waves.wgsl
        assert_eq!(std::mem::size_of::<WaveUniforms>(), 48);
        assert_eq!(std::mem::offset_of!(WaveUniforms, center), 24);
        assert_eq!(std::mem::offset_of!(WaveUniforms, mix_weight), 32);
        assert_eq!(std::mem::offset_of!(WaveUniforms, time), 36);
    }
}
