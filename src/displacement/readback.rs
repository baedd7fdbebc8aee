//! Field texture readback for offline inspection.

/// Copy an Rgba16Float field texture into host memory as f32 texels
/// (4 channels per pixel, row-major).
pub fn read_texels(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    resolution: u32,
) -> Vec<f32> {
    const BYTES_PER_PIXEL: u32 = 8; // 4 x f16

    let unpadded_bytes_per_row = resolution * BYTES_PER_PIXEL;
    let padded_bytes_per_row = unpadded_bytes_per_row.div_ceil(256) * 256;

    let output_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Field Readback Buffer"),
        size: (padded_bytes_per_row * resolution) as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Field Readback Encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::ImageCopyTexture {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::ImageCopyBuffer {
            buffer: &output_buffer,
            layout: wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(padded_bytes_per_row),
                rows_per_image: Some(resolution),
            },
        },
        wgpu::Extent3d {
            width: resolution,
            height: resolution,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(std::iter::once(encoder.finish()));

    let slice = output_buffer.slice(..);
    slice.map_async(wgpu::MapMode::Read, |_| {});
    device.poll(wgpu::Maintain::Wait);

    let data = slice.get_mapped_range();
    let mut texels = Vec::with_capacity((resolution * resolution * 4) as usize);
    for row in 0..resolution {
        let start = (row * padded_bytes_per_row) as usize;
        let row_bytes = &data[start..start + unpadded_bytes_per_row as usize];
        for half in row_bytes.chunks_exact(2) {
            texels.push(half_to_f32(u16::from_le_bytes([half[0], half[1]])));
        }
    }
    drop(data);
    output_buffer.unmap();
    texels
}

/// Save f32 texels as an 8-bit RGBA PNG, clamping to [0,1].
pub fn save_texels_png(path: &str, texels: &[f32], resolution: u32) -> Result<(), String> {
    let pixels: Vec<u8> = texels
        .iter()
        .map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
        .collect();

    image::save_buffer(
        path,
        &pixels,
        resolution,
        resolution,
        image::ColorType::Rgba8,
    )
    .map_err(|e| format!("failed to save {path}: {e}"))
}

/// Decode one IEEE 754 half-precision value.
pub fn half_to_f32(h: u16) -> f32 {
    let sign = (h >> 15) as u32;
    let exp = ((h >> 10) & 0x1f) as u32;
    let frac = (h & 0x3ff) as u32;

    let bits = match (exp, frac) {
        (0, 0) => sign << 31,
        (0, _) => {
            // subnormal: renormalize into f32
            let mut exp = 127 - 15 + 1;
            let mut frac = frac;
            while frac & 0x400 == 0 {
                frac <<= 1;
                exp -= 1;
            }
            (sign << 31) | ((exp as u32) << 23) | ((frac & 0x3ff) << 13)
        }
        (0x1f, 0) => (sign << 31) | 0x7f80_0000,
        (0x1f, _) => (sign << 31) | 0x7f80_0000 | (frac << 13),
        _ => (sign << 31) | ((exp + 127 - 15) << 23) | (frac << 13),
    };
    f32::from_bits(bits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_decode_basics() {
        assert_eq!(half_to_f32(0x0000), 0.0);
        assert_eq!(half_to_f32(0x3C00), 1.0);
        assert_eq!(half_to_f32(0xC000), -2.0);
        assert_eq!(half_to_f32(0x3800), 0.5);
        assert_eq!(half_to_f32(0x7C00), f32::INFINITY);
        assert!(half_to_f32(0x7E00).is_nan());
    }

    #[test]
    fn test_half_decode_subnormal() {
        // Smallest positive subnormal: 2^-24
        assert_eq!(half_to_f32(0x0001), 2.0_f32.powi(-24));
        // Largest subnormal: (1023/1024) * 2^-14
        assert_eq!(half_to_f32(0x03FF), (1023.0 / 1024.0) * 2.0_f32.powi(-14));
    }

    #[test]
    fn test_half_decode_negative_zero() {
        let v = half_to_f32(0x8000);
        assert_eq!(v, 0.0);
        assert!(v.is_sign_negative());
    }
}
