//! Texture atlases.
//!
//! Several source textures are packed into one image with a simple shelf
//! packer: sources are sorted by height and laid out left to right in rows
//! ("shelves") no wider than the atlas. Each source keeps its own animation.

use glam::Mat3;
use image::RgbaImage;
use indexmap::IndexMap;

use crate::{
    error::{RenderError, RenderResult},
    resource::ResourceLocation,
    texture::{FrameAnimation, TextureMap, TextureMeta, single::frame_height},
    vertex::UvModifier,
};

/// A texture to be packed into an atlas.
#[derive(Clone, Debug)]
pub struct AtlasSource {
    pub location: ResourceLocation,
    pub image: RgbaImage,
    pub meta: TextureMeta,
}

/// Where a source ended up in the atlas.
#[derive(Clone, Debug)]
pub struct AtlasRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    /// Height of one animation frame. The full strip is `frame_height * strip length`.
    pub frame_height: u32,
    animation: FrameAnimation,
}

impl AtlasRegion {
    pub fn animation(&self) -> &FrameAnimation {
        &self.animation
    }
}

/// Lays out `sizes` on shelves and returns the positions plus the atlas size.
fn pack_shelves(sizes: &[(u32, u32)]) -> (Vec<(u32, u32)>, u32, u32) {
    let area: u64 = sizes.iter().map(|(w, h)| *w as u64 * *h as u64).sum();
    let widest = sizes.iter().map(|(w, _)| *w).max().unwrap_or(1);
    let width = ((area as f64).sqrt().ceil() as u32)
        .max(widest)
        .next_power_of_two();

    let mut order: Vec<usize> = (0..sizes.len()).collect();
    order.sort_by(|a, b| sizes[*b].1.cmp(&sizes[*a].1));

    let mut positions = vec![(0, 0); sizes.len()];
    let (mut x, mut y, mut shelf) = (0, 0, 0);
    for i in order {
        let (w, h) = sizes[i];
        if x + w > width {
            y += shelf;
            x = 0;
            shelf = 0;
        }
        positions[i] = (x, y);
        x += w;
        shelf = shelf.max(h);
    }

    let height = (y + shelf).max(1).next_power_of_two();
    (positions, width, height)
}

/// Many textures composed into a single image.
///
/// [`TextureMap::activate_texture`] selects which source subsequent UV mapping
/// and frame matrices refer to.
#[derive(Clone, Debug)]
pub struct AtlasTextureMap {
    image: RgbaImage,
    regions: IndexMap<ResourceLocation, AtlasRegion>,
    active: usize,
    interpolate: bool,
}

impl AtlasTextureMap {
    pub fn build(sources: Vec<AtlasSource>, interpolate: bool) -> RenderResult<Self> {
        if sources.is_empty() {
            return Err(RenderError::configuration("an atlas needs at least one texture"));
        }

        let sizes: Vec<_> = sources
            .iter()
            .map(|s| (s.image.width(), s.image.height()))
            .collect();
        let (positions, width, height) = pack_shelves(&sizes);
        let mut image = RgbaImage::new(width, height);
        let mut regions = IndexMap::with_capacity(sources.len());

        for (source, (x, y)) in sources.into_iter().zip(positions) {
            let frame_height = frame_height(source.image.height(), &source.meta.frames)
                .map_err(|e| RenderError::configuration(format!("{}: {e}", source.location)))?;
            let step = frame_height as f32 / height as f32;
            let animation =
                FrameAnimation::new(source.meta.frames.clone(), source.meta.frame_time, 1.0, step)?;

            image::imageops::replace(&mut image, &source.image, x as i64, y as i64);
            let region = AtlasRegion {
                x,
                y,
                width: source.image.width(),
                frame_height,
                animation,
            };
            if regions.insert(source.location.clone(), region).is_some() {
                return Err(RenderError::configuration(format!(
                    "{} added to the atlas twice",
                    source.location
                )));
            }
        }

        log::debug!("built {width}x{height} atlas from {} textures", regions.len());
        Ok(Self {
            image,
            regions,
            active: 0,
            interpolate,
        })
    }

    pub fn region(&self, location: &ResourceLocation) -> Option<&AtlasRegion> {
        self.regions.get(location)
    }

    pub fn locations(&self) -> impl Iterator<Item = &ResourceLocation> {
        self.regions.keys()
    }

    pub fn active_location(&self) -> Option<&ResourceLocation> {
        self.regions.get_index(self.active).map(|(location, _)| location)
    }

    fn active_region(&self) -> &AtlasRegion {
        // `build` guarantees at least one region and `active` only takes valid indices.
        &self.regions[self.active]
    }
}

impl UvModifier for AtlasTextureMap {
    fn map_u(&self, u: f32) -> f32 {
        let region = self.active_region();
        (region.x as f32 + u * region.width as f32) / self.image.width() as f32
    }

    fn map_v(&self, v: f32) -> f32 {
        let region = self.active_region();
        (region.y as f32 + v * region.frame_height as f32) / self.image.height() as f32
    }
}

impl TextureMap for AtlasTextureMap {
    fn image_width(&self) -> u32 {
        self.active_region().width
    }

    fn image_height(&self) -> u32 {
        self.active_region().frame_height
    }

    fn map_width(&self) -> u32 {
        self.image.width()
    }

    fn map_height(&self) -> u32 {
        self.image.height()
    }

    fn pixels(&self) -> &RgbaImage {
        &self.image
    }

    fn interpolate(&self) -> bool {
        self.interpolate
    }

    fn activate_texture(&mut self, location: &ResourceLocation) -> RenderResult<()> {
        self.active = self
            .regions
            .get_index_of(location)
            .ok_or_else(|| RenderError::state(format!("{location} is not part of this atlas")))?;
        Ok(())
    }

    fn frame_matrix(&self) -> Mat3 {
        self.active_region().animation.frame_matrix()
    }

    fn last_frame_matrix(&self) -> Mat3 {
        self.active_region().animation.last_frame_matrix()
    }

    fn next_frame(&mut self) {
        for region in self.regions.values_mut() {
            region.animation.next_frame();
        }
    }

    fn tick(&mut self) -> bool {
        let mut changed = false;
        for region in self.regions.values_mut() {
            changed |= region.animation.tick();
        }
        changed
    }

    fn partial_tick(&self) -> f32 {
        self.active_region().animation.partial_tick()
    }
}
