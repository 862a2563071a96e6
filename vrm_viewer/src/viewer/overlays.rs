//! On-screen log panel. Renders HUD lines into an RGBA texture with the
//! 8x8 bitmap font and draws it as a translucent quad pinned to the
//! top-left corner of the window.

use std::borrow::Cow;

use anyhow::{Result, ensure};
use bytemuck::cast_slice;
use font8x8::legacy::BASIC_LEGACY;
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;

use super::shaders::QuadVertex;

const GLYPH_WIDTH: u32 = 8;
const GLYPH_HEIGHT: u32 = 8;
const SCREEN_MARGIN: f32 = 12.0;

pub(super) struct OverlayConfig {
    pub width: u32,
    pub height: u32,
    pub padding_x: u32,
    pub padding_y: u32,
    pub label: &'static str,
}

pub(super) struct TextOverlay {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    padding_x: u32,
    padding_y: u32,
    dirty: bool,
    visible: bool,
    label: &'static str,
}

impl TextOverlay {
    const FG_COLOR: [u8; 4] = [255, 255, 255, 235];
    const BG_COLOR: [u8; 4] = [16, 20, 28, 200];

    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        bind_group_layout: &wgpu::BindGroupLayout,
        window_size: PhysicalSize<u32>,
        config: OverlayConfig,
    ) -> Result<Self> {
        let (texture, bind_group) = create_resources(
            device,
            bind_group_layout,
            config.width,
            config.height,
            config.label,
        );
        let vertex_buffer =
            create_vertex_buffer(device, window_size, config.width, config.height, config.label);

        let mut overlay = Self {
            texture,
            bind_group,
            vertex_buffer,
            pixels: vec![0u8; (config.width * config.height * 4) as usize],
            width: config.width,
            height: config.height,
            padding_x: config.padding_x,
            padding_y: config.padding_y,
            dirty: true,
            visible: false,
            label: config.label,
        };
        overlay.fill_background();
        overlay.upload(queue);
        Ok(overlay)
    }

    /// How many text rows fit in the panel.
    pub fn max_rows(&self) -> usize {
        (self.height.saturating_sub(self.padding_y * 2) / GLYPH_HEIGHT) as usize
    }

    pub fn set_lines(&mut self, lines: &[String]) {
        self.fill_background();

        let usable_width = self.width.saturating_sub(self.padding_x * 2);
        let usable_height = self.height.saturating_sub(self.padding_y * 2);
        let max_cols = (usable_width / GLYPH_WIDTH) as usize;
        let max_rows = (usable_height / GLYPH_HEIGHT) as usize;
        if max_cols == 0 || max_rows == 0 {
            self.visible = false;
            self.dirty = true;
            return;
        }

        for (row_idx, line) in lines.iter().take(max_rows).enumerate() {
            let glyph_row = self.padding_y + row_idx as u32 * GLYPH_HEIGHT;
            for (col_idx, ch) in line.chars().take(max_cols).enumerate() {
                let glyph = glyph_for_char(ch);
                let glyph_col = self.padding_x + col_idx as u32 * GLYPH_WIDTH;
                for (y_offset, bits) in glyph.iter().enumerate() {
                    let y = glyph_row + y_offset as u32;
                    if y >= self.height {
                        continue;
                    }
                    for x_bit in 0..GLYPH_WIDTH {
                        if (bits >> x_bit) & 0x01 == 0 {
                            continue;
                        }
                        let x = glyph_col + x_bit;
                        if x >= self.width {
                            continue;
                        }
                        let idx = ((y * self.width + x) * 4) as usize;
                        self.pixels[idx..idx + 4].copy_from_slice(&Self::FG_COLOR);
                    }
                }
            }
        }

        self.visible = !lines.is_empty();
        self.dirty = true;
    }

    pub fn upload(&mut self, queue: &wgpu::Queue) {
        if !self.dirty {
            return;
        }
        let upload = match prepare_rgba_upload(self.width, self.height, &self.pixels) {
            Ok(upload) => upload,
            Err(err) => {
                log::warn!(
                    "overlay upload failed ({}x{}): {err}",
                    self.width,
                    self.height
                );
                return;
            }
        };
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            upload.pixels(),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(upload.bytes_per_row()),
                rows_per_image: Some(self.height),
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
        self.dirty = false;
    }

    /// Rebuild the quad for a new window size; the panel keeps its pixel
    /// dimensions and stays anchored to the corner.
    pub fn update_layout(&mut self, device: &wgpu::Device, window_size: PhysicalSize<u32>) {
        self.vertex_buffer =
            create_vertex_buffer(device, window_size, self.width, self.height, self.label);
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    pub fn vertex_buffer(&self) -> &wgpu::Buffer {
        &self.vertex_buffer
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    fn fill_background(&mut self) {
        for chunk in self.pixels.chunks_exact_mut(4) {
            chunk.copy_from_slice(&Self::BG_COLOR);
        }
    }
}

fn glyph_for_char(ch: char) -> [u8; 8] {
    let index = ch as usize;
    if index < BASIC_LEGACY.len() {
        BASIC_LEGACY[index]
    } else {
        BASIC_LEGACY[b'?' as usize]
    }
}

fn create_resources(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    width: u32,
    height: u32,
    label: &str,
) -> (wgpu::Texture, wgpu::BindGroup) {
    let extent = wgpu::Extent3d {
        width: width.max(1),
        height: height.max(1),
        depth_or_array_layers: 1,
    };
    let texture_label = format!("{label}-texture");
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(texture_label.as_str()),
        size: extent,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let sampler_label = format!("{label}-sampler");
    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(sampler_label.as_str()),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Nearest,
        min_filter: wgpu::FilterMode::Nearest,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    });
    let bind_label = format!("{label}-bind-group");
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(bind_label.as_str()),
        layout: bind_group_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&sampler),
            },
        ],
    });
    (texture, bind_group)
}

fn create_vertex_buffer(
    device: &wgpu::Device,
    window_size: PhysicalSize<u32>,
    width: u32,
    height: u32,
    label: &str,
) -> wgpu::Buffer {
    let win_width = window_size.width.max(1) as f32;
    let win_height = window_size.height.max(1) as f32;
    let left = (SCREEN_MARGIN / win_width) * 2.0 - 1.0;
    let right = ((SCREEN_MARGIN + width as f32) / win_width) * 2.0 - 1.0;
    let top = 1.0 - (SCREEN_MARGIN / win_height) * 2.0;
    let bottom = 1.0 - ((SCREEN_MARGIN + height as f32) / win_height) * 2.0;

    let vertices = [
        QuadVertex {
            position: [left, top],
            uv: [0.0, 0.0],
        },
        QuadVertex {
            position: [right, top],
            uv: [1.0, 0.0],
        },
        QuadVertex {
            position: [left, bottom],
            uv: [0.0, 1.0],
        },
        QuadVertex {
            position: [right, bottom],
            uv: [1.0, 1.0],
        },
    ];

    let buffer_label = format!("{label}-vertex-buffer");
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(buffer_label.as_str()),
        contents: cast_slice(&vertices),
        usage: wgpu::BufferUsages::VERTEX,
    })
}

struct TextureUpload<'a> {
    data: Cow<'a, [u8]>,
    bytes_per_row: u32,
}

impl TextureUpload<'_> {
    fn pixels(&self) -> &[u8] {
        &self.data
    }

    fn bytes_per_row(&self) -> u32 {
        self.bytes_per_row
    }
}

/// Pad RGBA rows out to wgpu's copy alignment when needed.
fn prepare_rgba_upload(width: u32, height: u32, data: &[u8]) -> Result<TextureUpload<'_>> {
    ensure!(width > 0 && height > 0, "texture has no dimensions");
    let row_bytes = 4usize * width as usize;
    let alignment = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as usize;
    ensure!(
        data.len() >= row_bytes * height as usize,
        "texture buffer ({}) smaller than {}x{} RGBA ({})",
        data.len(),
        width,
        height,
        row_bytes * height as usize
    );

    if row_bytes % alignment == 0 && data.len() == row_bytes * height as usize {
        return Ok(TextureUpload {
            data: Cow::Borrowed(data),
            bytes_per_row: row_bytes as u32,
        });
    }

    let padded_row_bytes = row_bytes.div_ceil(alignment) * alignment;
    let mut buffer = vec![0u8; padded_row_bytes * height as usize];
    for row in 0..height as usize {
        let src_offset = row * row_bytes;
        let dst_offset = row * padded_row_bytes;
        buffer[dst_offset..dst_offset + row_bytes]
            .copy_from_slice(&data[src_offset..src_offset + row_bytes]);
    }

    Ok(TextureUpload {
        data: Cow::Owned(buffer),
        bytes_per_row: padded_row_bytes as u32,
    })
}
