use crate::error::DecodeError;

/// Resource limits applied before any pixel buffer is allocated.
///
/// All fields default to `None` (no limit).
#[derive(Clone, Debug, Default)]
pub struct Limits {
    pub max_width: Option<u64>,
    pub max_height: Option<u64>,
    /// Maximum pixel count (width * height).
    pub max_pixels: Option<u64>,
    /// Maximum size of the decoded pixel buffer in bytes.
    pub max_memory_bytes: Option<u64>,
}

impl Limits {
    /// Check declared dimensions.
    pub(crate) fn check(&self, width: u32, height: u32) -> Result<(), DecodeError> {
        if let Some(max_w) = self.max_width
            && u64::from(width) > max_w
        {
            return Err(DecodeError::LimitExceeded(alloc::format!(
                "width {width} exceeds limit {max_w}"
            )));
        }
        if let Some(max_h) = self.max_height
            && u64::from(height) > max_h
        {
            return Err(DecodeError::LimitExceeded(alloc::format!(
                "height {height} exceeds limit {max_h}"
            )));
        }
        if let Some(max_px) = self.max_pixels {
            let pixels = u64::from(width) * u64::from(height);
            if pixels > max_px {
                return Err(DecodeError::LimitExceeded(alloc::format!(
                    "pixel count {pixels} exceeds limit {max_px}"
                )));
            }
        }
        Ok(())
    }

    /// Check the size of the output buffer.
    pub(crate) fn check_memory(&self, bytes: usize) -> Result<(), DecodeError> {
        if let Some(max_mem) = self.max_memory_bytes
            && bytes as u64 > max_mem
        {
            return Err(DecodeError::LimitExceeded(alloc::format!(
                "output of {bytes} bytes exceeds memory limit {max_mem}"
            )));
        }
        Ok(())
    }
}
