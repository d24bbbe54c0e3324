//! GPU textures and CPU-side image loading.
//!
//! Game art is authored at the 160x144 logical resolution and blown up by an
//! integer factor at load time with nearest-neighbour sampling, so pixels stay
//! square and crisp at any screen scale.

use std::path::Path;

use image::imageops::FilterType;
use image::RgbaImage;

pub struct Texture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub size: (u32, u32),
}

impl Texture {
    pub fn from_rgba8(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        rgba: &[u8],
        width: u32,
        height: u32,
        label: &str,
    ) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
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
            rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
            size: (width, height),
        }
    }

    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &RgbaImage,
        label: &str,
    ) -> Self {
        Self::from_rgba8(
            device,
            queue,
            image.as_raw(),
            image.width(),
            image.height(),
            label,
        )
    }
}

/// Decode a PNG and scale it by `scale` with nearest-neighbour filtering.
pub fn load_scaled_image(path: &Path, scale: u32) -> Result<RgbaImage, String> {
    let decoded = image::open(path)
        .map_err(|e| format!("Failed to load image {}: {e}", path.display()))?;
    Ok(scale_image(&decoded.to_rgba8(), scale))
}

pub fn scale_image(source: &RgbaImage, scale: u32) -> RgbaImage {
    let scale = scale.max(1);
    if scale == 1 {
        return source.clone();
    }
    image::imageops::resize(
        source,
        source.width() * scale,
        source.height() * scale,
        FilterType::Nearest,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "m2_texture_test_{}_{}_{}.png",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    fn checker() -> RgbaImage {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img.put_pixel(1, 0, Rgba([0, 0, 255, 255]));
        img
    }

    #[test]
    fn scale_image_multiplies_dimensions_without_blending() {
        let scaled = scale_image(&checker(), 5);
        assert_eq!(scaled.dimensions(), (10, 5));
        assert_eq!(*scaled.get_pixel(4, 4), Rgba([255, 0, 0, 255]));
        assert_eq!(*scaled.get_pixel(5, 0), Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn scale_of_one_is_identity() {
        let scaled = scale_image(&checker(), 1);
        assert_eq!(scaled, checker());
    }

    #[test]
    fn load_scaled_image_reads_png_from_disk() {
        let path = temp_file_path("png");
        checker().save(&path).expect("write temp png");
        let loaded = load_scaled_image(&path, 3).expect("png should load");
        assert_eq!(loaded.dimensions(), (6, 3));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn load_scaled_image_reports_missing_file() {
        let path = temp_file_path("missing");
        let err = load_scaled_image(&path, 2).expect_err("missing file should fail");
        assert!(err.contains("Failed to load image"));
    }
}
