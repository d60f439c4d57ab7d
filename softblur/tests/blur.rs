//! Headless GPU tests for the blur pass.
//!
//! Each test acquires its own device from whatever adapter is available and
//! skips (with a message on stderr) when the environment has none.

use std::num::NonZeroU32;

use softblur::{BlurError, BlurParameters, BlurPass};

struct Gpu {
    device: wgpu::Device,
    queue: wgpu::Queue,
}

fn gpu() -> Option<Gpu> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::default(),
        compatible_surface: None,
        force_fallback_adapter: false,
    }))
    .ok()?;
    let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
        required_features: wgpu::Features::empty(),
        required_limits: wgpu::Limits::downlevel_defaults(),
        label: None,
        memory_hints: wgpu::MemoryHints::MemoryUsage,
        trace: wgpu::Trace::Off,
        experimental_features: wgpu::ExperimentalFeatures::default(),
    }))
    .ok()?;
    Some(Gpu { device, queue })
}

macro_rules! require_gpu {
    () => {
        match gpu() {
            Some(gpu) => gpu,
            None => {
                eprintln!("skipping: no GPU adapter available");
                return;
            }
        }
    };
}

fn make_source(
    gpu: &Gpu,
    width: u32,
    height: u32,
    usage: wgpu::TextureUsages,
    fill: impl Fn(u32, u32) -> [u8; 4],
) -> wgpu::Texture {
    let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Test Source"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage,
        view_formats: &[],
    });

    let mut pixels = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            pixels.extend_from_slice(&fill(x, y));
        }
    }
    gpu.queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(width * 4),
            rows_per_image: Some(height),
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    texture
}

/// Reads an `Rgba8Unorm` texture back as tightly packed RGBA bytes.
fn read_texture(gpu: &Gpu, texture: &wgpu::Texture) -> Vec<u8> {
    let width = texture.width();
    let height = texture.height();
    let unpadded = width * 4;
    let padded = unpadded.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
        * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

    let buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Readback Buffer"),
        size: u64::from(padded) * u64::from(height),
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = gpu
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Readback Encoder"),
        });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    gpu.queue.submit(std::iter::once(encoder.finish()));

    let slice = buffer.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        tx.send(result).ok();
    });
    gpu.device
        .poll(wgpu::PollType::wait_indefinitely())
        .expect("wait for readback");
    rx.recv().expect("map callback").expect("map readback buffer");

    let mapped = slice.get_mapped_range();
    let mut pixels = Vec::with_capacity((unpadded * height) as usize);
    for row in 0..height {
        let start = (row * padded) as usize;
        pixels.extend_from_slice(&mapped[start..start + unpadded as usize]);
    }
    drop(mapped);
    buffer.unmap();
    pixels
}

const SOURCE_USAGE: wgpu::TextureUsages = wgpu::TextureUsages::TEXTURE_BINDING
    .union(wgpu::TextureUsages::COPY_DST);

#[test]
fn test_uniform_image_stays_uniform() {
    let gpu = require_gpu!();
    let source = make_source(&gpu, 64, 64, SOURCE_USAGE, |_, _| [120, 130, 140, 255]);

    let mut pass = BlurPass::default();
    pass.blur(&gpu.device, &gpu.queue, &source).unwrap();

    let result = pass.result_texture().unwrap();
    assert_eq!((result.width(), result.height()), (32, 32));

    let pixels = read_texture(&gpu, result);
    for (i, chunk) in pixels.chunks_exact(4).enumerate() {
        for (channel, expected) in chunk.iter().zip([120u8, 130, 140, 255]) {
            assert!(
                channel.abs_diff(expected) <= 2,
                "pixel {i}: got {chunk:?}"
            );
        }
    }
}

#[test]
fn test_repeated_blur_is_reproducible() {
    let gpu = require_gpu!();
    let source = make_source(&gpu, 64, 64, SOURCE_USAGE, |x, y| {
        [(x * 4) as u8, (y * 4) as u8, 90, 255]
    });

    let mut pass = BlurPass::default();
    pass.blur(&gpu.device, &gpu.queue, &source).unwrap();
    let first = read_texture(&gpu, pass.result_texture().unwrap());
    pass.blur(&gpu.device, &gpu.queue, &source).unwrap();
    let second = read_texture(&gpu, pass.result_texture().unwrap());

    assert_eq!(first, second);
}

#[test]
fn test_checkerboard_flattens_toward_mean() {
    let gpu = require_gpu!();
    // One-texel checkerboard: the downscale already averages each 2x2 block,
    // so a wide kernel must land every pixel near mid-gray.
    let source = make_source(&gpu, 64, 64, SOURCE_USAGE, |x, y| {
        if (x + y) % 2 == 0 {
            [255, 255, 255, 255]
        } else {
            [0, 0, 0, 255]
        }
    });

    let mut pass = BlurPass::default();
    pass.set_parameters(1.0, 1000.0).unwrap();
    pass.blur(&gpu.device, &gpu.queue, &source).unwrap();

    let pixels = read_texture(&gpu, pass.result_texture().unwrap());
    for (i, chunk) in pixels.chunks_exact(4).enumerate() {
        for channel in &chunk[..3] {
            assert!(
                channel.abs_diff(128) <= 8,
                "pixel {i}: got {chunk:?}"
            );
        }
    }
}

#[test]
fn test_scratch_reallocates_on_source_resize() {
    let gpu = require_gpu!();
    let large = make_source(&gpu, 64, 64, SOURCE_USAGE, |_, _| [10, 20, 30, 255]);
    let small = make_source(&gpu, 32, 16, SOURCE_USAGE, |_, _| [10, 20, 30, 255]);

    let mut pass = BlurPass::default();
    pass.blur(&gpu.device, &gpu.queue, &large).unwrap();
    let result = pass.result_texture().unwrap();
    assert_eq!((result.width(), result.height()), (32, 32));

    pass.blur(&gpu.device, &gpu.queue, &small).unwrap();
    let result = pass.result_texture().unwrap();
    assert_eq!((result.width(), result.height()), (16, 8));
    assert!(pass.is_ready());
}

#[test]
fn test_downscale_factor_is_honored() {
    let gpu = require_gpu!();
    let source = make_source(&gpu, 64, 64, SOURCE_USAGE, |_, _| [10, 20, 30, 255]);

    let mut pass = BlurPass::default();
    pass.set_downscale_factor(NonZeroU32::new(4).unwrap());
    pass.blur(&gpu.device, &gpu.queue, &source).unwrap();

    let result = pass.result_texture().unwrap();
    assert_eq!((result.width(), result.height()), (16, 16));
}

#[test]
fn test_unsampleable_source_is_rejected() {
    let gpu = require_gpu!();
    // Missing TEXTURE_BINDING, so the pass cannot sample it.
    let source = make_source(
        &gpu,
        64,
        64,
        wgpu::TextureUsages::COPY_DST.union(wgpu::TextureUsages::COPY_SRC),
        |_, _| [0, 0, 0, 255],
    );

    let mut pass = BlurPass::default();
    let err = pass.blur(&gpu.device, &gpu.queue, &source).unwrap_err();
    assert!(matches!(err, BlurError::ResourceUnavailable(_)), "{err}");
    assert!(!pass.is_ready(), "failed init must leave the pass unready");
}

#[test]
fn test_too_small_source_is_rejected_then_retried() {
    let gpu = require_gpu!();
    let tiny = make_source(&gpu, 1, 1, SOURCE_USAGE, |_, _| [0, 0, 0, 255]);
    let ok = make_source(&gpu, 8, 8, SOURCE_USAGE, |_, _| [0, 0, 0, 255]);

    let mut pass = BlurPass::default();
    let err = pass.blur(&gpu.device, &gpu.queue, &tiny).unwrap_err();
    assert!(matches!(err, BlurError::ResourceUnavailable(_)), "{err}");
    assert!(!pass.is_ready());

    // The next request retries initialization and succeeds.
    pass.blur(&gpu.device, &gpu.queue, &ok).unwrap();
    assert!(pass.is_ready());
}

#[test]
fn test_explicit_initialize_is_idempotent() {
    let gpu = require_gpu!();
    let source = make_source(&gpu, 64, 64, SOURCE_USAGE, |_, _| [50, 60, 70, 255]);

    let mut pass = BlurPass::new(BlurParameters::new(2.0, 200.0).unwrap());
    pass.initialize(&gpu.device, &source).unwrap();
    assert!(pass.is_ready());
    pass.initialize(&gpu.device, &source).unwrap();
    assert!(pass.is_ready());

    pass.blur(&gpu.device, &gpu.queue, &source).unwrap();
}
