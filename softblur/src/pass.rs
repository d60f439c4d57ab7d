//! Two-pass blur orchestration.
//!
//! [`BlurPass`] owns the GPU side of the effect: the compute pipelines, a
//! shared sampler and two half-resolution scratch textures used as ping-pong
//! targets. The pass starts without any GPU resources and creates them on
//! the first blur request (or an explicit [`BlurPass::initialize`] call);
//! once ready it only reallocates the scratch textures when the effective
//! source resolution changes.
//!
//! A blur request encodes three dispatches into a single submission:
//!
//! 1. downscale-copy of the source into scratch A,
//! 2. horizontal convolution A → B,
//! 3. vertical convolution B → A.
//!
//! Queue ordering sequences the dispatches, so the result view handed back
//! to the caller (scratch A) is safe to consume in any later work on the
//! same queue.

use std::num::NonZeroU32;

use tracing::{debug, info};

use crate::{
    error::BlurError,
    params::BlurParameters,
    pipeline::{BlurPipeline, BlurUniforms, DownscalePipeline, SCRATCH_FORMAT},
    weights::WeightTable,
};

/// Default downscale factor applied to the source before blurring.
///
/// Halving the resolution both cuts the per-pass cost and widens the
/// effective blur radius relative to source pixels.
pub const DEFAULT_DOWNSCALE_FACTOR: NonZeroU32 = NonZeroU32::new(2).unwrap();

/// Separable two-pass Gaussian blur over a source texture.
///
/// The host keeps ownership of the source; the pass only samples it. The
/// returned result view points at a scratch texture owned by the pass and
/// stays valid until the next [`BlurPass::blur`] call or until the pass is
/// dropped.
pub struct BlurPass {
    params: BlurParameters,
    weights: WeightTable,
    downscale_factor: NonZeroU32,
    gpu: Option<GpuState>,
}

impl BlurPass {
    /// Creates an uninitialized pass; GPU resources are allocated on the
    /// first blur request.
    pub fn new(params: BlurParameters) -> Self {
        Self {
            params,
            weights: WeightTable::compute(params.spread()),
            downscale_factor: DEFAULT_DOWNSCALE_FACTOR,
            gpu: None,
        }
    }

    /// Current parameters.
    pub fn parameters(&self) -> BlurParameters {
        self.params
    }

    /// Current weight table.
    pub fn weight_table(&self) -> &WeightTable {
        &self.weights
    }

    /// Whether GPU resources have been created.
    pub fn is_ready(&self) -> bool {
        self.gpu.is_some()
    }

    /// Updates `offset` and `spread`, validating both ranges.
    ///
    /// The weight table is recomputed only when `spread` actually changed;
    /// `offset` only affects sample spacing. On error the previous
    /// parameters stay in effect.
    pub fn set_parameters(&mut self, offset: f32, spread: f32) -> Result<(), BlurError> {
        let next = BlurParameters::new(offset, spread)?;
        if next.spread() != self.params.spread() {
            self.weights = WeightTable::compute(next.spread());
        }
        self.params = next;
        Ok(())
    }

    /// Sets the downscale factor applied to the source before blurring.
    ///
    /// Takes effect on the next blur request; a change reallocates the
    /// scratch textures at that point.
    pub fn set_downscale_factor(&mut self, factor: NonZeroU32) {
        self.downscale_factor = factor;
    }

    /// Configured downscale factor.
    pub fn downscale_factor(&self) -> NonZeroU32 {
        self.downscale_factor
    }

    /// View of the last blur result, if any blur has run.
    pub fn result_view(&self) -> Option<&wgpu::TextureView> {
        self.gpu.as_ref().map(|gpu| &gpu.scratch_a.view)
    }

    /// Texture behind [`BlurPass::result_view`], for copies and readback.
    pub fn result_texture(&self) -> Option<&wgpu::Texture> {
        self.gpu.as_ref().map(|gpu| &gpu.scratch_a.texture)
    }

    /// Explicitly creates GPU resources for the given source.
    ///
    /// Idempotent: calling this while already initialized only reallocates
    /// the scratch textures if the effective source size changed. On error
    /// the pass stays uninitialized and the next request retries.
    pub fn initialize(
        &mut self,
        device: &wgpu::Device,
        source: &wgpu::Texture,
    ) -> Result<(), BlurError> {
        self.ensure_ready(device, source)?;
        Ok(())
    }

    /// Runs the two-pass blur and returns a view of the blurred result at
    /// `source size / downscale factor`.
    ///
    /// Performs lazy initialization if needed. A failed call leaves any
    /// previous result untouched.
    pub fn blur(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        source: &wgpu::Texture,
    ) -> Result<&wgpu::TextureView, BlurError> {
        let params = self.params;
        let weights = self.weights;
        let gpu = self.ensure_ready(device, source)?;

        let (width, height) = gpu.scratch_a.size();
        let source_view = source.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Blur Encoder"),
        });

        gpu.downscale.encode(
            device,
            &mut encoder,
            &source_view,
            &gpu.sampler,
            &gpu.scratch_a.view,
            (width, height),
        );

        // Tap spacing in UV units of the scratch targets.
        let step_x = params.offset() / width as f32;
        let step_y = params.offset() / height as f32;

        gpu.blur.encode(
            device,
            &mut encoder,
            BlurUniforms::new(&weights, [step_x, 0.0]),
            &gpu.scratch_a.view,
            &gpu.sampler,
            &gpu.scratch_b.view,
            (width, height),
            "horizontal_blur_pass",
        );
        gpu.blur.encode(
            device,
            &mut encoder,
            BlurUniforms::new(&weights, [0.0, step_y]),
            &gpu.scratch_b.view,
            &gpu.sampler,
            &gpu.scratch_a.view,
            (width, height),
            "vertical_blur_pass",
        );

        queue.submit(std::iter::once(encoder.finish()));

        Ok(&gpu.scratch_a.view)
    }

    fn ensure_ready(
        &mut self,
        device: &wgpu::Device,
        source: &wgpu::Texture,
    ) -> Result<&mut GpuState, BlurError> {
        let size = self.scratch_size(source)?;
        let was_ready = self.gpu.is_some();
        let gpu = self.gpu.get_or_insert_with(|| {
            info!(
                width = size.0,
                height = size.1,
                "initializing blur pass resources"
            );
            GpuState::new(device, size)
        });
        if was_ready {
            gpu.ensure_scratch(device, size);
        }
        Ok(gpu)
    }

    /// Validates the source and derives the scratch-texture extent.
    fn scratch_size(&self, source: &wgpu::Texture) -> Result<(u32, u32), BlurError> {
        if source.dimension() != wgpu::TextureDimension::D2 {
            return Err(BlurError::ResourceUnavailable(
                "source texture must be 2-dimensional".into(),
            ));
        }
        if !source.usage().contains(wgpu::TextureUsages::TEXTURE_BINDING) {
            return Err(BlurError::ResourceUnavailable(
                "source texture was created without TEXTURE_BINDING usage".into(),
            ));
        }
        let factor = self.downscale_factor.get();
        let width = source.width() / factor;
        let height = source.height() / factor;
        if width == 0 || height == 0 {
            return Err(BlurError::ResourceUnavailable(format!(
                "source extent {}x{} is too small for downscale factor {factor}",
                source.width(),
                source.height()
            )));
        }
        Ok((width, height))
    }
}

impl Default for BlurPass {
    fn default() -> Self {
        Self::new(BlurParameters::default())
    }
}

struct GpuState {
    downscale: DownscalePipeline,
    blur: BlurPipeline,
    sampler: wgpu::Sampler,
    scratch_a: ScratchTarget,
    scratch_b: ScratchTarget,
}

impl GpuState {
    fn new(device: &wgpu::Device, size: (u32, u32)) -> Self {
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Blur Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            downscale: DownscalePipeline::new(device),
            blur: BlurPipeline::new(device),
            sampler,
            scratch_a: ScratchTarget::new(device, size, "Blur Scratch A"),
            scratch_b: ScratchTarget::new(device, size, "Blur Scratch B"),
        }
    }

    /// Reallocates both scratch textures when the effective size changed.
    fn ensure_scratch(&mut self, device: &wgpu::Device, size: (u32, u32)) {
        if self.scratch_a.size() == size {
            return;
        }
        debug!(
            width = size.0,
            height = size.1,
            "reallocating blur scratch textures"
        );
        self.scratch_a = ScratchTarget::new(device, size, "Blur Scratch A");
        self.scratch_b = ScratchTarget::new(device, size, "Blur Scratch B");
    }
}

struct ScratchTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl ScratchTarget {
    fn new(device: &wgpu::Device, size: (u32, u32), label: &str) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: size.0,
                height: size.1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: SCRATCH_FORMAT,
            // COPY_SRC lets hosts read the result back or copy it onward.
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::STORAGE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }

    fn size(&self) -> (u32, u32) {
        (self.texture.width(), self.texture.height())
    }
}
