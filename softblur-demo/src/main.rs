//! Offscreen blur sample.
//!
//! Generates a test card, runs the two-pass blur against a headless device
//! and writes `blur_input.png` / `blur_output.png` to the working directory.

use std::error::Error;

use softblur::{BlurParameters, BlurPass};
use tracing::info;

const SOURCE_SIZE: u32 = 512;

fn main() -> Result<(), Box<dyn Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let (device, queue) = pollster::block_on(setup_gpu())?;

    let card = test_card(SOURCE_SIZE);
    card.save("blur_input.png")?;
    info!("wrote blur_input.png");

    let source = upload(&device, &queue, &card);

    let mut pass = BlurPass::new(BlurParameters::new(1.0, 400.0)?);
    pass.blur(&device, &queue, &source)?;

    let result = pass
        .result_texture()
        .ok_or("blur pass produced no result texture")?;
    let pixels = read_texture(&device, &queue, result)?;
    let output = image::RgbaImage::from_raw(result.width(), result.height(), pixels)
        .ok_or("readback size mismatch")?;
    output.save("blur_output.png")?;
    info!(
        width = result.width(),
        height = result.height(),
        "wrote blur_output.png"
    );

    Ok(())
}

async fn setup_gpu() -> Result<(wgpu::Device, wgpu::Queue), Box<dyn Error>> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await?;
    info!("using adapter: {}", adapter.get_info().name);

    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_defaults(),
            label: None,
            memory_hints: wgpu::MemoryHints::MemoryUsage,
            trace: wgpu::Trace::Off,
            experimental_features: wgpu::ExperimentalFeatures::default(),
        })
        .await?;
    Ok((device, queue))
}

/// A gradient with a checker overlay, so the blur is easy to eyeball.
fn test_card(size: u32) -> image::RgbaImage {
    image::RgbaImage::from_fn(size, size, |x, y| {
        let checker = (x / 32 + y / 32) % 2 == 0;
        if checker {
            image::Rgba([240, 240, 240, 255])
        } else {
            let r = (x * 255 / size) as u8;
            let g = (y * 255 / size) as u8;
            image::Rgba([r, g, 96, 255])
        }
    })
}

fn upload(device: &wgpu::Device, queue: &wgpu::Queue, card: &image::RgbaImage) -> wgpu::Texture {
    let size = wgpu::Extent3d {
        width: card.width(),
        height: card.height(),
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Demo Source"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        card.as_raw(),
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(card.width() * 4),
            rows_per_image: Some(card.height()),
        },
        size,
    );
    texture
}

/// Reads an `Rgba8Unorm` texture back as tightly packed RGBA bytes.
fn read_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
) -> Result<Vec<u8>, Box<dyn Error>> {
    let width = texture.width();
    let height = texture.height();
    let unpadded = width * 4;
    let padded = unpadded.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
        * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Demo Readback Buffer"),
        size: u64::from(padded) * u64::from(height),
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Demo Readback Encoder"),
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
    queue.submit(std::iter::once(encoder.finish()));

    let slice = buffer.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        tx.send(result).ok();
    });
    device.poll(wgpu::PollType::wait_indefinitely())?;
    rx.recv()??;

    let mapped = slice.get_mapped_range();
    let mut pixels = Vec::with_capacity((unpadded * height) as usize);
    for row in 0..height {
        let start = (row * padded) as usize;
        pixels.extend_from_slice(&mapped[start..start + unpadded as usize]);
    }
    drop(mapped);
    buffer.unmap();
    Ok(pixels)
}
