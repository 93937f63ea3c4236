#!/usr/bin/env -S cargo +nightly -Zscript
//! Generate seed corpus files for fuzzing.
//! Run: cargo +nightly -Zscript fuzz/generate_seeds.rs

fn main() {
    use std::fs;
    let dir = "fuzz/corpus/fuzz_decode";
    fs::create_dir_all(dir).unwrap();

    // Minimal BMP 1x1 24-bit
    let mut bmp = vec![0u8; 58]; // 54 header + 4 pixel (3 + 1 padding)
    bmp[0] = b'B'; bmp[1] = b'M';
    bmp[2..6].copy_from_slice(&58u32.to_le_bytes()); // file size
    bmp[10..14].copy_from_slice(&54u32.to_le_bytes()); // data offset
    bmp[14..18].copy_from_slice(&40u32.to_le_bytes()); // DIB header size
    bmp[18..22].copy_from_slice(&1i32.to_le_bytes()); // width
    bmp[22..26].copy_from_slice(&1i32.to_le_bytes()); // height
    bmp[26..28].copy_from_slice(&1u16.to_le_bytes()); // planes
    bmp[28..30].copy_from_slice(&24u16.to_le_bytes()); // bpp
    bmp[54] = 0xff; bmp[55] = 0x00; bmp[56] = 0x00; // BGR
    fs::write(format!("{dir}/bmp_1x1.bmp"), &bmp).unwrap();

    // ICO wrapping a 1x1 32-bit DIB (XOR rows, then 4 bytes of mask)
    let mut dib = bmp[14..54].to_vec();
    dib[8..12].copy_from_slice(&2i32.to_le_bytes()); // doubled height
    dib[14..16].copy_from_slice(&32u16.to_le_bytes());
    dib.extend_from_slice(&[0x10, 0x20, 0x30, 0x00, 0, 0, 0, 0]);
    let mut ico = vec![0, 0, 1, 0, 1, 0];
    ico.extend_from_slice(&[1, 1, 0, 0, 1, 0, 32, 0]);
    ico.extend_from_slice(&(dib.len() as u32).to_le_bytes());
    ico.extend_from_slice(&22u32.to_le_bytes());
    ico.extend_from_slice(&dib);
    fs::write(format!("{dir}/ico_1x1.ico"), ico).unwrap();

    // TGA 2x1 RLE 24-bit: one run of two pixels
    let mut tga = vec![0u8; 18];
    tga[2] = 10;
    tga[12] = 2;
    tga[14] = 1;
    tga[16] = 24;
    tga.extend_from_slice(&[0x81, 0x01, 0x02, 0x03]);
    fs::write(format!("{dir}/tga_rle_2x1.tga"), tga).unwrap();

    // PCX 1x1 24-bit, three RLE planes
    let mut pcx = vec![0u8; 128];
    pcx[0] = 10; pcx[1] = 5; pcx[2] = 1; pcx[3] = 8;
    pcx[65] = 3;
    pcx[66] = 2;
    pcx.extend_from_slice(&[0xC2, 0x11, 0xC2, 0x22, 0xC2, 0x33]);
    fs::write(format!("{dir}/pcx_rgb_1x1.pcx"), pcx).unwrap();

    // Truncated/malformed seeds for edge coverage
    fs::write(format!("{dir}/empty.bin"), b"").unwrap();
    fs::write(format!("{dir}/bm_short.bin"), b"BM\x00\x00").unwrap();
    fs::write(format!("{dir}/ico_dir_only.bin"), b"\x00\x00\x01\x00\x05\x00").unwrap();

    println!("Generated seed corpus in {dir}/");
}
