/*
 * Bounded Volume Module
 *
 * The aquarium: an axis-aligned cube centred on the origin. Agents are kept
 * inside an inner cube shrunk by a padding fraction of the edge length so
 * that they never touch the glass.
 */

use glam::Vec3;
use rand::Rng;

use crate::error::{invalid, Result};

pub const DEFAULT_PADDING: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundedVolume {
    size: f32,
    padding: f32,
    half_extent: f32,
}

impl BoundedVolume {
    // Cube of edge `size` with the default 5% padding
    pub fn new(size: f32) -> Result<Self> {
        Self::with_padding(size, DEFAULT_PADDING)
    }

    pub fn with_padding(size: f32, padding: f32) -> Result<Self> {
        if !size.is_finite() || size <= 0.0 {
            return Err(invalid(format!("volume size must be positive, got {size}")));
        }
        if !padding.is_finite() || padding < 0.0 {
            return Err(invalid(format!("volume padding must be non-negative, got {padding}")));
        }

        let half_extent = size / 2.0 - size * padding;
        if half_extent <= 0.0 {
            return Err(invalid(format!(
                "padding {padding} leaves no interior in a volume of size {size}"
            )));
        }

        Ok(Self { size, padding, half_extent })
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn padding(&self) -> f32 {
        self.padding
    }

    pub fn half_extent(&self) -> f32 {
        self.half_extent
    }

    #[inline]
    pub fn min_corner(&self) -> Vec3 {
        Vec3::splat(-self.half_extent)
    }

    #[inline]
    pub fn max_corner(&self) -> Vec3 {
        Vec3::splat(self.half_extent)
    }

    // Inclusive on every face
    #[inline]
    pub fn contains(&self, p: Vec3) -> bool {
        let h = self.half_extent;
        (-h..=h).contains(&p.x) && (-h..=h).contains(&p.y) && (-h..=h).contains(&p.z)
    }

    #[inline]
    pub fn clamp(&self, p: Vec3) -> Vec3 {
        p.clamp(self.min_corner(), self.max_corner())
    }

    // Uniform point inside the padded interior
    pub fn random_point<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        let h = self.half_extent;
        Vec3::new(
            rng.gen_range(-h..=h),
            rng.gen_range(-h..=h),
            rng.gen_range(-h..=h),
        )
    }
}
