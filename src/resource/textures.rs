//! Loading texture maps from the `textures` folder of a namespace.
//!
//! A texture `engine:blocks/stone` is the file `blocks/stone.png`. An optional
//! `blocks/stone.json` next to it holds its [`TextureMeta`].

use crate::{
    error::{RenderError, RenderResult},
    resource::{ResourceCache, ResourceLoader, ResourceLocation, SourceFolder},
    texture::{AtlasSource, AtlasTextureMap, SingleTextureMap, TextureMap, TextureMeta},
};

const IMAGE_EXTENSION: &str = ".png";
const META_EXTENSION: &str = ".json";

/// Loads textures and keeps the atlases built from whole folders.
#[derive(Debug)]
pub struct TextureLoader {
    resources: ResourceLoader,
    atlases: ResourceCache<ResourceLocation, AtlasTextureMap>,
}

impl TextureLoader {
    pub fn new(resources: ResourceLoader) -> Self {
        Self {
            resources,
            atlases: ResourceCache::new(),
        }
    }

    pub fn resources(&self) -> &ResourceLoader {
        &self.resources
    }

    /// Loads one texture, with its animation if it has a meta file.
    pub fn load_single(&self, location: &ResourceLocation) -> RenderResult<SingleTextureMap> {
        let source = load_source(&self.resources, location)?;
        let meta = source.meta;
        SingleTextureMap::from_rgba(source.image, meta.frames, meta.frame_time, meta.interpolate)
    }

    /// Builds an atlas of every texture in `folder` and its subfolders, or
    /// returns the one built before.
    pub fn load_atlas(
        &mut self,
        folder: &ResourceLocation,
        interpolate: bool,
    ) -> RenderResult<&mut AtlasTextureMap> {
        let resources = &self.resources;
        self.atlases.get_or_try_insert_with(folder.clone(), |folder| {
            let mut sources = Vec::new();
            collect_sources(resources, folder, &mut sources)?;
            if sources.is_empty() {
                return Err(RenderError::configuration(format!(
                    "no textures found in {}",
                    resources.resolve(SourceFolder::Textures, folder).display()
                )));
            }
            log::debug!("loading {} textures from {folder}", sources.len());
            AtlasTextureMap::build(sources, interpolate)
        })
    }

    /// The atlas built from `folder`, if it is loaded.
    pub fn texture_map(&self, folder: &ResourceLocation) -> Option<&AtlasTextureMap> {
        self.atlases.get(folder)
    }

    pub fn texture_map_mut(&mut self, folder: &ResourceLocation) -> Option<&mut AtlasTextureMap> {
        self.atlases.get_mut(folder)
    }

    /// Drops a loaded atlas so the next [`load_atlas`](Self::load_atlas) reads it again.
    pub fn unload(&mut self, folder: &ResourceLocation) -> Option<AtlasTextureMap> {
        self.atlases.evict(folder)
    }

    /// Advances the animations of every loaded atlas by one tick.
    pub fn tick(&mut self) {
        for atlas in self.atlases.values_mut() {
            atlas.tick();
        }
    }
}

fn load_source(resources: &ResourceLoader, location: &ResourceLocation) -> RenderResult<AtlasSource> {
    let image_file = ResourceLocation::new(
        location.namespace(),
        format!("{}{IMAGE_EXTENSION}", location.path()),
    );
    let reader = resources.open(SourceFolder::Textures, &image_file)?;
    let image = image::load(reader, image::ImageFormat::Png)?.to_rgba8();

    let meta_file = ResourceLocation::new(
        location.namespace(),
        format!("{}{META_EXTENSION}", location.path()),
    );
    let meta = if resources.exists(SourceFolder::Textures, &meta_file) {
        TextureMeta::from_json(&resources.read_to_string(SourceFolder::Textures, &meta_file)?)?
    } else {
        TextureMeta::default()
    };

    Ok(AtlasSource {
        location: location.clone(),
        image,
        meta,
    })
}

fn collect_sources(
    resources: &ResourceLoader,
    folder: &ResourceLocation,
    sources: &mut Vec<AtlasSource>,
) -> RenderResult<()> {
    for file in resources.list_files(SourceFolder::Textures, folder)? {
        if let Some(name) = file.strip_suffix(IMAGE_EXTENSION) {
            sources.push(load_source(resources, &folder.location_of_file(name))?);
        }
    }
    for sub in resources.list_folders(SourceFolder::Textures, folder)? {
        collect_sources(resources, &folder.location_of_file(&sub), sources)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use image::{Rgba, RgbaImage};

    use super::*;

    fn write_png(dir: &Path, name: &str, width: u32, height: u32, color: [u8; 4]) {
        let path = dir.join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        RgbaImage::from_pixel(width, height, Rgba(color)).save(path).unwrap();
    }

    fn textures_dir(root: &Path) -> std::path::PathBuf {
        root.join("engine").join("textures")
    }

    #[test]
    fn single_texture_reads_meta() {
        let root = tempfile::tempdir().unwrap();
        let textures = textures_dir(root.path());
        write_png(&textures, "water.png", 4, 16, [0, 0, 255, 255]);
        std::fs::write(
            textures.join("water.json"),
            r#"{ "frames": [0, 1, 2, 3], "frametime": 2, "interpolate": true }"#,
        )
        .unwrap();
        write_png(&textures, "stone.png", 4, 4, [128, 128, 128, 255]);

        let loader = TextureLoader::new(ResourceLoader::new(root.path()));
        let water = loader.load_single(&"engine:water".parse().unwrap()).unwrap();
        assert_eq!(water.image_height(), 4);
        assert_eq!(water.animation().frame_time(), 2);
        assert!(water.interpolate());

        let stone = loader.load_single(&"engine:stone".parse().unwrap()).unwrap();
        assert!(!stone.animation().is_animated());

        assert!(matches!(
            loader.load_single(&"engine:missing".parse().unwrap()),
            Err(RenderError::Io(_))
        ));
    }

    #[test]
    fn atlas_collects_folder_recursively_and_is_cached() {
        let root = tempfile::tempdir().unwrap();
        let textures = textures_dir(root.path());
        write_png(&textures, "blocks/stone.png", 16, 16, [128, 128, 128, 255]);
        write_png(&textures, "blocks/ores/gold.png", 16, 16, [255, 215, 0, 255]);
        std::fs::write(textures.join("blocks/readme.txt"), "ignored").unwrap();

        let mut loader = TextureLoader::new(ResourceLoader::new(root.path()));
        let folder: ResourceLocation = "engine:blocks".parse().unwrap();
        let atlas = loader.load_atlas(&folder, false).unwrap();
        let mut names: Vec<_> = atlas.locations().map(|l| l.to_string()).collect();
        names.sort();
        assert_eq!(names, vec!["engine:blocks/ores/gold", "engine:blocks/stone"]);

        let gold: ResourceLocation = "engine:blocks/ores/gold".parse().unwrap();
        atlas.activate_texture(&gold).unwrap();
        let region = atlas.region(&gold).unwrap().clone();
        assert_eq!(
            atlas.pixels().get_pixel(region.x, region.y),
            &Rgba([255, 215, 0, 255])
        );

        std::fs::remove_dir_all(&textures).unwrap();
        assert!(loader.load_atlas(&folder, false).is_ok());
        assert!(loader.texture_map(&folder).is_some());

        assert!(loader.unload(&folder).is_some());
        assert!(matches!(
            loader.load_atlas(&folder, false),
            Err(RenderError::Configuration(_))
        ));
        assert!(loader.texture_map_mut(&folder).is_none());
    }
}
