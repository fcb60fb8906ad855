use crate::error::{DemoError, Result};
use crate::guard::Guard;
use crate::renderer::{create_buffer, find_memory_type};

use std::fs;
use std::path::Path;
use std::rc::Rc;

use gfx_hal as hal;

use hal::{
    buffer, command, format as f, image as i, memory as m,
    prelude::*,
    pso,
    queue::QueueGroup,
};

use std::{iter, mem::ManuallyDrop, ptr};

const COLOR_RANGE: i::SubresourceRange = i::SubresourceRange {
    aspects: f::Aspects::COLOR,
    level_start: 0,
    level_count: None,
    layer_start: 0,
    layer_count: None,
};

const TEXEL_BYTES: usize = 4;

/// Reads a PNG from disk and decodes it to 8-bit RGBA.
pub fn load_image(path: &Path) -> Result<image::RgbaImage> {
    let bytes = fs::read(path).map_err(|source| DemoError::FileNotFound {
        path: path.to_path_buf(),
        source,
    })?;
    let decoded = image::load_from_memory_with_format(&bytes, image::ImageFormat::Png)
        .map_err(|source| DemoError::TextureDecode {
            path: path.to_path_buf(),
            source,
        })?;

    let rgba = decoded.to_rgba8();
    log::info!(
        "loaded texture {} ({}x{})",
        path.display(),
        rgba.width(),
        rgba.height()
    );
    Ok(rgba)
}

/// Copies `img` row by row into a buffer whose rows start on multiples of
/// `pitch_alignment` bytes. Returns the data and the padded row pitch.
pub fn pad_rows(img: &image::RgbaImage, pitch_alignment: u32) -> (Vec<u8>, u32) {
    let row_alignment_mask = pitch_alignment.max(1) - 1;
    let row_bytes = img.width() as usize * TEXEL_BYTES;
    let row_pitch = (row_bytes as u32 + row_alignment_mask) & !row_alignment_mask;

    let mut data = vec![0u8; row_pitch as usize * img.height() as usize];
    for (y, row) in img.as_raw().chunks_exact(row_bytes.max(1)).enumerate() {
        let start = y * row_pitch as usize;
        data[start..start + row_bytes].copy_from_slice(row);
    }
    (data, row_pitch)
}

/// A sampled RGBA image living in device memory.
pub struct Texture<B: hal::Backend> {
    device: Rc<B::Device>,
    image: ManuallyDrop<B::Image>,
    memory: ManuallyDrop<B::Memory>,
    view: ManuallyDrop<B::ImageView>,
    sampler: ManuallyDrop<B::Sampler>,
    width: u32,
    height: u32,
}

impl<B: hal::Backend> Texture<B> {
    /// Uploads `img` through a staging buffer and waits for the copy to finish.
    pub fn upload(
        device: Rc<B::Device>,
        memory_types: &[hal::adapter::MemoryType],
        limits: &hal::Limits,
        queue_group: &mut QueueGroup<B>,
        command_pool: &mut B::CommandPool,
        img: &image::RgbaImage,
    ) -> Result<Self> {
        let (width, height) = img.dimensions();
        let (staging_data, row_pitch) =
            pad_rows(img, limits.optimal_buffer_copy_pitch_alignment as u32);

        // Staging resources are destroyed when these guards go out of scope.
        let (staging_buffer, _staging_memory) = create_buffer::<B, u8>(
            &device,
            memory_types,
            buffer::Usage::TRANSFER_SRC,
            &staging_data,
        )?;

        let mut image = Guard::new(
            &device,
            unsafe {
                (*device).create_image(
                    i::Kind::D2(width as i::Size, height as i::Size, 1, 1),
                    1,
                    f::Format::Rgba8Srgb,
                    i::Tiling::Optimal,
                    i::Usage::TRANSFER_DST | i::Usage::SAMPLED,
                    m::SparseFlags::empty(),
                    i::ViewCapabilities::empty(),
                )
            }
            .map_err(|e| DemoError::backend("create texture image", e))?,
            |device, image| unsafe { device.destroy_image(image) },
        );

        let image_req = unsafe { (*device).get_image_requirements(&image) };
        let device_type = find_memory_type(memory_types, image_req.type_mask, m::Properties::DEVICE_LOCAL)?;
        let memory = Guard::new(
            &device,
            unsafe { (*device).allocate_memory(device_type, image_req.size) }
                .map_err(|e| DemoError::backend("allocate texture memory", e))?,
            |device, memory| unsafe { device.free_memory(memory) },
        );

        unsafe { (*device).bind_image_memory(&memory, 0, &mut image) }
            .map_err(|e| DemoError::backend("bind texture memory", e))?;

        let view = Guard::new(
            &device,
            unsafe {
                (*device).create_image_view(
                    &image,
                    i::ViewKind::D2,
                    f::Format::Rgba8Srgb,
                    f::Swizzle::NO,
                    i::Usage::SAMPLED,
                    COLOR_RANGE.clone(),
                )
            }
            .map_err(|e| DemoError::backend("create texture view", e))?,
            |device, view| unsafe { device.destroy_image_view(view) },
        );

        let sampler = Guard::new(
            &device,
            unsafe {
                (*device).create_sampler(&i::SamplerDesc::new(i::Filter::Linear, i::WrapMode::Tile))
            }
            .map_err(|e| DemoError::backend("create sampler", e))?,
            |device, sampler| unsafe { device.destroy_sampler(sampler) },
        );

        let texture = Texture {
            device: device.clone(),
            image: ManuallyDrop::new(image.release()),
            memory: ManuallyDrop::new(memory.release()),
            view: ManuallyDrop::new(view.release()),
            sampler: ManuallyDrop::new(sampler.release()),
            width,
            height,
        };

        let copied = texture.copy_from_staging(
            &*staging_buffer,
            row_pitch,
            queue_group,
            command_pool,
        );

        copied.map(|_| texture)
    }

    fn copy_from_staging(
        &self,
        staging_buffer: &B::Buffer,
        row_pitch: u32,
        queue_group: &mut QueueGroup<B>,
        command_pool: &mut B::CommandPool,
    ) -> Result<()> {
        let mut copy_fence = (*self.device)
            .create_fence(false)
            .map_err(|e| DemoError::backend("create fence", e))?;

        let waited = unsafe {
            let mut cmd_buffer = command_pool.allocate_one(command::Level::Primary);
            cmd_buffer.begin_primary(command::CommandBufferFlags::ONE_TIME_SUBMIT);

            let image_barrier = m::Barrier::Image {
                states: (i::Access::empty(), i::Layout::Undefined)
                    ..(i::Access::TRANSFER_WRITE, i::Layout::TransferDstOptimal),
                target: &*self.image,
                families: None,
                range: COLOR_RANGE.clone(),
            };
            cmd_buffer.pipeline_barrier(
                pso::PipelineStage::TOP_OF_PIPE..pso::PipelineStage::TRANSFER,
                m::Dependencies::empty(),
                iter::once(image_barrier),
            );

            let (width, height) = self.dimensions();
            cmd_buffer.copy_buffer_to_image(
                staging_buffer,
                &self.image,
                i::Layout::TransferDstOptimal,
                iter::once(command::BufferImageCopy {
                    buffer_offset: 0,
                    buffer_width: row_pitch / TEXEL_BYTES as u32,
                    buffer_height: height,
                    image_layers: i::SubresourceLayers {
                        aspects: f::Aspects::COLOR,
                        level: 0,
                        layers: 0..1,
                    },
                    image_offset: i::Offset { x: 0, y: 0, z: 0 },
                    image_extent: i::Extent {
                        width,
                        height,
                        depth: 1,
                    },
                }),
            );

            let image_barrier = m::Barrier::Image {
                states: (i::Access::TRANSFER_WRITE, i::Layout::TransferDstOptimal)
                    ..(i::Access::SHADER_READ, i::Layout::ShaderReadOnlyOptimal),
                target: &*self.image,
                families: None,
                range: COLOR_RANGE.clone(),
            };
            cmd_buffer.pipeline_barrier(
                pso::PipelineStage::TRANSFER..pso::PipelineStage::FRAGMENT_SHADER,
                m::Dependencies::empty(),
                iter::once(image_barrier),
            );

            cmd_buffer.finish();

            queue_group.queues[0].submit(
                iter::once(&cmd_buffer),
                iter::empty(),
                iter::empty(),
                Some(&mut copy_fence),
            );

            let waited = (*self.device).wait_for_fence(&copy_fence, !0);
            command_pool.free(iter::once(cmd_buffer));
            waited
        };

        unsafe { (*self.device).destroy_fence(copy_fence) };
        waited.map_err(|e| DemoError::backend("wait for texture upload", e))?;
        Ok(())
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Points binding 0 (image) and binding 1 (sampler) of `set` at this texture.
    pub unsafe fn write_descriptors(&self, set: &mut B::DescriptorSet) {
        (*self.device).write_descriptor_set(pso::DescriptorSetWrite {
            set,
            binding: 0,
            array_offset: 0,
            descriptors: vec![
                pso::Descriptor::Image(&*self.view, i::Layout::ShaderReadOnlyOptimal),
                pso::Descriptor::Sampler(&*self.sampler),
            ]
            .into_iter(),
        });
    }
}

impl<B: hal::Backend> Drop for Texture<B> {
    fn drop(&mut self) {
        unsafe {
            (*self.device).destroy_sampler(ManuallyDrop::into_inner(ptr::read(&self.sampler)));
            (*self.device).destroy_image_view(ManuallyDrop::into_inner(ptr::read(&self.view)));
            (*self.device).destroy_image(ManuallyDrop::into_inner(ptr::read(&self.image)));
            (*self.device).free_memory(ManuallyDrop::into_inner(ptr::read(&self.memory)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn missing_texture_is_file_not_found() {
        match load_image(Path::new("no/such/retro.png")) {
            Err(DemoError::FileNotFound { path, .. }) => {
                assert_eq!(path, PathBuf::from("no/such/retro.png"))
            }
            other => panic!("expected FileNotFound, got {:?}", other.map(|i| i.dimensions())),
        }
    }

    #[test]
    fn non_png_bytes_are_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("retro.png");
        fs::write(&path, b"not a png").unwrap();

        match load_image(&path) {
            Err(DemoError::TextureDecode { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected TextureDecode, got {:?}", other.map(|i| i.dimensions())),
        }
    }

    #[test]
    fn shipped_texture_decodes_to_rgba() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets").join("retro.png");
        let img = load_image(&path).unwrap();
        assert!(img.width() > 0 && img.height() > 0);
        assert_eq!(img.as_raw().len(), (img.width() * img.height()) as usize * TEXEL_BYTES);
    }

    #[test]
    fn rows_are_padded_to_the_pitch_alignment() {
        let img = image::RgbaImage::from_fn(3, 2, |x, y| image::Rgba([x as u8, y as u8, 7, 255]));
        let (data, pitch) = pad_rows(&img, 256);
        assert_eq!(pitch, 256);
        assert_eq!(data.len(), 512);
        assert_eq!(&data[0..4], &[0, 0, 7, 255]);
        assert_eq!(&data[256 + 8..256 + 12], &[2, 1, 7, 255]);
        assert!(data[12..256].iter().all(|&b| b == 0));
    }

    #[test]
    fn tight_alignment_keeps_rows_packed() {
        let img = image::RgbaImage::new(5, 3);
        let (data, pitch) = pad_rows(&img, 1);
        assert_eq!(pitch, 20);
        assert_eq!(data.len(), 60);
    }
}
