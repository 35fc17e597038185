//! Render material descriptor written onto representations

use serde::{Deserialize, Serialize};

/// Packed ARGB value meaning "no emission" (opaque black)
pub const NO_EMISSION: i32 = -16_777_216;

/// Type tag emitted for serialized materials
pub const MATERIAL_TYPE: &str = "Objects.Other.RenderMaterial";

/// Visual material for a representation
///
/// Colours are packed as `0xAARRGGBB` and stored as signed 32-bit values,
/// which is how the scene-graph wire format carries them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderMaterial {
    /// Material name
    pub name: String,
    /// Packed diffuse colour
    pub diffuse: i32,
    /// Opacity in `[0, 1]`
    pub opacity: f64,
    /// Metalness in `[0, 1]`
    pub metalness: f64,
    /// Roughness in `[0, 1]`
    pub roughness: f64,
    /// Packed emissive colour
    pub emissive: i32,
}

impl RenderMaterial {
    /// Opaque, non-metallic, fully rough material with the given diffuse colour
    #[inline]
    #[must_use]
    pub fn with_diffuse(name: impl Into<String>, diffuse: i32) -> Self {
        Self {
            name: name.into(),
            diffuse,
            ..Self::default()
        }
    }
}

impl Default for RenderMaterial {
    fn default() -> Self {
        Self {
            name: String::new(),
            diffuse: pack_argb(0xFF, 0xFF, 0xFF),
            opacity: 1.0,
            metalness: 0.0,
            roughness: 1.0,
            emissive: NO_EMISSION,
        }
    }
}

/// Pack an opaque RGB colour as a signed `0xFFRRGGBB` value
#[inline]
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub fn pack_argb(red: u8, green: u8, blue: u8) -> i32 {
    let packed = 0xFF00_0000_u32 | (u32::from(red) << 16) | (u32::from(green) << 8) | u32::from(blue);
    packed as i32
}
