//! Display-space to device-space conversion.

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// A point in native device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DevicePoint {
    pub x: u32,
    pub y: u32,
}

impl DevicePoint {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: DevicePoint) -> f64 {
        let dx = f64::from(self.x) - f64::from(other.x);
        let dy = f64::from(self.y) - f64::from(other.y);
        dx.hypot(dy)
    }

    /// Clamps the point into `[0, width) x [0, height)`.
    pub fn clamp_to(&self, size: ImageSize) -> DevicePoint {
        DevicePoint {
            x: self.x.min(size.width.saturating_sub(1)),
            y: self.y.min(size.height.saturating_sub(1)),
        }
    }
}

/// A point on the rendered mirror image, relative to its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayPoint {
    pub x: f64,
    pub y: f64,
}

/// Natural (native) pixel size of the mirrored screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Size at which the mirror image is currently laid out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderedSize {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("mirror image has not been rendered yet")]
    NotRendered,
    #[error("native screen size is unknown")]
    NativeSizeUnknown,
    #[error("pointer position is not a finite number")]
    InvalidPoint,
}

/// Converts a rendered-image point into device pixels.
///
/// Each axis is scaled by `native / rendered` and rounded to the nearest pixel. Points that
/// round onto or past the far edge are clamped to the last addressable pixel.
pub fn to_device_space(
    point: DisplayPoint,
    rendered: RenderedSize,
    native: ImageSize,
) -> Result<DevicePoint, MappingError> {
    if !(rendered.width > 0.0 && rendered.height > 0.0) {
        return Err(MappingError::NotRendered);
    }
    if native.is_empty() {
        return Err(MappingError::NativeSizeUnknown);
    }
    if !point.x.is_finite() || !point.y.is_finite() {
        return Err(MappingError::InvalidPoint);
    }

    let x = scale_axis(point.x, rendered.width, native.width);
    let y = scale_axis(point.y, rendered.height, native.height);
    Ok(DevicePoint { x, y })
}

fn scale_axis(value: f64, rendered: f64, native: u32) -> u32 {
    let scaled = (value * f64::from(native) / rendered).round();
    let max = f64::from(native.saturating_sub(1));
    scaled.clamp(0.0, max) as u32
}

/// Rounds a raw device coordinate reported by an external source.
///
/// Negative and non-finite values collapse to zero; the result is clamped into `native` when
/// the screen size is known.
pub fn device_point_from_raw(x: f64, y: f64, native: Option<ImageSize>) -> DevicePoint {
    let round = |v: f64| {
        if v.is_finite() && v > 0.0 {
            v.round().min(f64::from(u32::MAX)) as u32
        } else {
            0
        }
    };
    let point = DevicePoint::new(round(x), round(y));
    match native {
        Some(size) if !size.is_empty() => point.clamp_to(size),
        _ => point,
    }
}
