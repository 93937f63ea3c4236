#![no_main]
use libfuzzer_sys::fuzz_target;
use zentexture::{DecodeRequest, ImageFormat, Limits};

fuzz_target!(|data: &[u8]| {
    let limits = Limits {
        max_pixels: Some(16 * 1024 * 1024),
        max_memory_bytes: Some(256 * 1024 * 1024),
        ..Limits::default()
    };

    // Auto-detect (BMP, ICO) — must never panic
    let _ = DecodeRequest::new(data)
        .with_limits(&limits)
        .decode(enough::Unstoppable);

    // Formats without magic bytes, and the detected ones explicitly
    for format in [
        ImageFormat::Bmp,
        ImageFormat::Tga,
        ImageFormat::Pcx,
        ImageFormat::Ico,
    ] {
        let request = DecodeRequest::new(data)
            .with_format(format)
            .with_limits(&limits);
        let _ = request.probe();
        let _ = request.decode(enough::Unstoppable);
    }
});
