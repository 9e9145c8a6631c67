use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Largest accepted framebuffer width or height, in pixels.
pub const MAX_DIMENSION: i32 = 8192;

/// Engine creation parameters.
///
/// `EngineArgs::default()` means "nothing was specified"; [`EngineArgs::new`],
/// any builder setter and TOML loading produce explicit args, even when the
/// values equal the defaults. [`is_default`](Self::is_default) reports that
/// marker. Equality compares values only.
///
/// TOML layout (every key optional):
///
/// ```toml
/// width = 384
/// height = 216
/// layers = 3
/// sprites = 64
/// animations = 64
/// target_fps = 60
/// load_path = "assets"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineArgs {
    width: i32,
    height: i32,
    layers: i32,
    sprites: i32,
    animations: i32,
    target_fps: i32,
    load_path: Option<String>,

    #[serde(skip)]
    explicit: bool,
}

impl Default for EngineArgs {
    fn default() -> Self {
        Self {
            width: 384,
            height: 216,
            layers: 3,
            sprites: 64,
            animations: 64,
            target_fps: 60,
            load_path: None,
            explicit: false,
        }
    }
}

impl PartialEq for EngineArgs {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.layers == other.layers
            && self.sprites == other.sprites
            && self.animations == other.animations
            && self.target_fps == other.target_fps
            && self.load_path == other.load_path
    }
}

impl Eq for EngineArgs {}

impl EngineArgs {
    /// Default values, marked explicit.
    pub fn new() -> Self {
        Self {
            explicit: true,
            ..Self::default()
        }
    }

    /// `true` only for args nobody specified.
    pub fn is_default(&self) -> bool {
        !self.explicit
    }

    pub fn with_resolution(mut self, width: i32, height: i32) -> Self {
        self.width = width;
        self.height = height;
        self.explicit = true;
        self
    }

    pub fn with_layers(mut self, layers: i32) -> Self {
        self.layers = layers;
        self.explicit = true;
        self
    }

    pub fn with_sprites(mut self, sprites: i32) -> Self {
        self.sprites = sprites;
        self.explicit = true;
        self
    }

    pub fn with_animations(mut self, animations: i32) -> Self {
        self.animations = animations;
        self.explicit = true;
        self
    }

    pub fn with_target_fps(mut self, fps: i32) -> Self {
        self.target_fps = fps;
        self.explicit = true;
        self
    }

    pub fn with_load_path(mut self, path: impl Into<String>) -> Self {
        self.load_path = Some(path.into());
        self.explicit = true;
        self
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn layers(&self) -> i32 {
        self.layers
    }

    pub fn sprites(&self) -> i32 {
        self.sprites
    }

    pub fn animations(&self) -> i32 {
        self.animations
    }

    pub fn target_fps(&self) -> i32 {
        self.target_fps
    }

    pub fn load_path(&self) -> Option<&str> {
        self.load_path.as_deref()
    }

    /// Parses explicit args from TOML and validates them.
    pub fn from_toml_str(src: &str) -> Result<Self, EngineError> {
        let mut args: EngineArgs = toml::from_str(src)?;
        args.explicit = true;
        args.validate()?;
        Ok(args)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let src = std::fs::read_to_string(path)?;
        Self::from_toml_str(&src)
    }

    /// Checks value ranges: resolution and fps positive, counts non-negative.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.width <= 0 || self.height <= 0 {
            return Err(EngineError::InvalidArgs(format!(
                "resolution must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if self.width > MAX_DIMENSION || self.height > MAX_DIMENSION {
            return Err(EngineError::InvalidArgs(format!(
                "resolution {}x{} exceeds {MAX_DIMENSION}x{MAX_DIMENSION}",
                self.width, self.height
            )));
        }
        for (name, count) in [
            ("layers", self.layers),
            ("sprites", self.sprites),
            ("animations", self.animations),
        ] {
            if count < 0 {
                return Err(EngineError::InvalidArgs(format!("{name} must be >= 0, got {count}")));
            }
        }
        if self.target_fps <= 0 {
            return Err(EngineError::InvalidArgs(format!(
                "target_fps must be positive, got {}",
                self.target_fps
            )));
        }
        Ok(())
    }
}
