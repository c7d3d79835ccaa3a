//! End-to-end encode/decode round trips over synthetic pixel buffers.

use hqoi::{Colors, Qoi};

fn gradient_rgba(width: u32, height: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            pixels.extend_from_slice(&[x as u8, y as u8, (x ^ y) as u8, 255]);
        }
    }
    pixels
}

fn gradient_rgb(width: u32, height: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            pixels.extend_from_slice(&[x as u8, y as u8, (x.wrapping_add(y)) as u8]);
        }
    }
    pixels
}

fn roundtrip(qoi: Qoi, pixels: &[u8]) {
    let encoded = qoi.encode_alloc(pixels).expect("encode");
    let (decoded_qoi, decoded_pixels) = Qoi::decode_alloc(&encoded, 0).expect("decode");
    assert_eq!(decoded_qoi, qoi);
    assert_eq!(decoded_pixels, pixels);
}

#[test]
fn gradients_roundtrip_rgba_and_rgb() {
    for &(w, h) in &[(1u32, 1u32), (7, 3), (64, 64), (300, 200)] {
        let pixels = gradient_rgba(w, h);
        roundtrip(
            Qoi {
                width: w,
                height: h,
                colors: Colors::SrgbLinA,
            },
            &pixels,
        );

        let pixels = gradient_rgb(w, h);
        roundtrip(
            Qoi {
                width: w,
                height: h,
                colors: Colors::Srgb,
            },
            &pixels,
        );
    }
}

#[test]
fn repetitive_image_engages_entropy_layer() {
    let width = 512u32;
    let height = 512u32;
    let mut pixels = Vec::with_capacity((width * height * 4) as usize);
    for _ in 0..width * height {
        pixels.extend_from_slice(&[30, 30, 30, 255]);
    }

    let qoi = Qoi {
        width,
        height,
        colors: Colors::SrgbLinA,
    };
    let encoded = qoi.encode_alloc(&pixels).unwrap();

    let (_, entropy_coded) = Qoi::decode_header(&encoded).unwrap();
    assert!(
        entropy_coded,
        "a large, highly repetitive chunk stream should trip the entropy layer's savings threshold"
    );

    let (decoded_qoi, decoded_pixels) = Qoi::decode_alloc(&encoded, 0).unwrap();
    assert_eq!(decoded_qoi, qoi);
    assert_eq!(decoded_pixels, pixels);
}

#[test]
fn noisy_image_falls_back_to_plain_encoding() {
    let width = 256u32;
    let height = 256u32;
    let mut pixels = Vec::with_capacity((width * height * 4) as usize);
    let mut state: u32 = 0x1234_5678;
    for _ in 0..width * height {
        state = state.wrapping_mul(1664525).wrapping_add(1013904223);
        pixels.extend_from_slice(&[
            (state >> 24) as u8,
            (state >> 16) as u8,
            (state >> 8) as u8,
            255,
        ]);
    }

    let qoi = Qoi {
        width,
        height,
        colors: Colors::SrgbLinA,
    };
    let encoded = qoi.encode_alloc(&pixels).unwrap();
    let (_, entropy_coded) = Qoi::decode_header(&encoded).unwrap();
    assert!(
        !entropy_coded,
        "near-incompressible noise should not pass the entropy layer's 3% savings threshold"
    );

    let (decoded_qoi, decoded_pixels) = Qoi::decode_alloc(&encoded, 0).unwrap();
    assert_eq!(decoded_qoi, qoi);
    assert_eq!(decoded_pixels, pixels);
}

#[test]
fn single_opaque_black_pixel_matches_the_documented_byte_count() {
    let qoi = Qoi {
        width: 1,
        height: 1,
        colors: Colors::SrgbLinA,
    };
    let pixels = [0u8, 0, 0, 255];
    let encoded = qoi.encode_alloc(&pixels).unwrap();
    assert_eq!(encoded.len(), 14 + 1 + 8);
}

#[test]
fn two_identical_pixels_is_one_run_chunk() {
    let qoi = Qoi {
        width: 2,
        height: 1,
        colors: Colors::SrgbLinA,
    };
    let pixels = [0u8, 0, 0, 255, 0, 0, 0, 255];
    let encoded = qoi.encode_alloc(&pixels).unwrap();
    assert_eq!(encoded.len(), 14 + 1 + 8);
}

#[test]
fn decode_rejects_a_corrupt_header() {
    let garbage = [0xFFu8; 32];
    let mut output = [0u8; 16];
    assert!(Qoi::decode(&garbage, &mut output, 0).is_err());
}

#[test]
fn encode_reports_output_too_small() {
    let qoi = Qoi {
        width: 4,
        height: 4,
        colors: Colors::SrgbLinA,
    };
    let pixels = vec![0u8; qoi.decoded_size()];
    let mut output = vec![0u8; 4];
    assert!(qoi.encode(&pixels, &mut output).is_err());
}

#[test]
fn requested_channels_convert_rgba_source_to_rgb_and_back() {
    let width = 5u32;
    let height = 3u32;
    let pixels = gradient_rgba(width, height);
    let qoi = Qoi {
        width,
        height,
        colors: Colors::SrgbLinA,
    };
    let encoded = qoi.encode_alloc(&pixels).unwrap();

    let (rgb_qoi, rgb_pixels) = Qoi::decode_alloc(&encoded, 3).unwrap();
    assert_eq!(rgb_qoi, qoi);
    let expected_rgb: Vec<u8> = pixels
        .chunks_exact(4)
        .flat_map(|p| [p[0], p[1], p[2]])
        .collect();
    assert_eq!(rgb_pixels, expected_rgb);

    let (rgba_qoi, rgba_pixels) = Qoi::decode_alloc(&encoded, 4).unwrap();
    assert_eq!(rgba_qoi, qoi);
    assert_eq!(rgba_pixels, pixels);
}

#[test]
fn run_length_bias_byte_never_encodes_63_or_64() {
    // §8: "no RUN chunk carries length-bias byte 0x3E or 0x3F" — those two
    // values of the low six bits are reserved for the 0xFE/0xFF literal tags.
    let width = 64u32 * 3 + 1;
    let mut pixels = Vec::with_capacity(width as usize * 4);
    for _ in 0..width {
        pixels.extend_from_slice(&[9, 9, 9, 255]);
    }
    let qoi = Qoi {
        width,
        height: 1,
        colors: Colors::SrgbLinA,
    };
    let limit = qoi.encoded_size_limit();
    let mut output = vec![0u8; limit];
    let size = qoi.encode(&pixels, &mut output).unwrap();
    let body = &output[14..size - 8];

    for &byte in body {
        if byte & 0xC0 == 0xC0 {
            let bias = byte & 0x3F;
            assert_ne!(bias, 0x3E, "RUN chunk must not carry bias byte 0x3E");
            assert_ne!(bias, 0x3F, "RUN chunk must not carry bias byte 0x3F");
        }
    }
}

#[test]
fn encoded_body_never_ends_with_seven_zero_bytes_before_padding() {
    // §8: a body ending in 7 consecutive 0x00 bytes right before the 8-byte
    // padding would be indistinguishable from the end marker itself.
    for &(w, h) in &[(1u32, 1u32), (8, 8), (37, 11)] {
        let pixels = gradient_rgba(w, h);
        let qoi = Qoi {
            width: w,
            height: h,
            colors: Colors::SrgbLinA,
        };
        let limit = qoi.encoded_size_limit();
        let mut output = vec![0u8; limit];
        let size = qoi.encode(&pixels, &mut output).unwrap();
        let body = &output[14..size - 8];

        if body.len() >= 7 {
            let tail = &body[body.len() - 7..];
            assert!(
                tail.iter().any(|&b| b != 0),
                "encoded body must not end with 7 zero bytes before the padding"
            );
        }
    }
}

#[test]
fn worked_example_three_single_luma_pixel() {
    // §8 scenario 3: {1,2,3,255} against prev {0,0,0,255} takes the LUMA
    // path (vg=2 is out of DIFF range) and produces bytes `A2 79`.
    let qoi = Qoi {
        width: 1,
        height: 1,
        colors: Colors::SrgbLinA,
    };
    let pixels = [1u8, 2, 3, 255];
    let encoded = qoi.encode_alloc(&pixels).unwrap();
    assert_eq!(&encoded[14..16], &[0xA2, 0x79]);
    assert_eq!(encoded.len(), 14 + 2 + 8);
}

#[test]
fn worked_example_five_luma_literal_then_luma_cache_miss() {
    // §8 scenario 5: {5,5,5,255} then {0,0,0,255}. Both pixels' r/g/b deltas
    // are equal to each other (vg_r = vg_b = 0 in both cases), which always
    // fits LUMA's -8..7 window regardless of how large the shared delta is,
    // so neither pixel ever falls through to an RGB literal here. The second
    // pixel hashes to a cache slot the encoder never seeded (the
    // previous-pixel slot is never primed), so it's a cache miss that falls
    // through to LUMA against the first pixel rather than hitting INDEX.
    let qoi = Qoi {
        width: 2,
        height: 1,
        colors: Colors::SrgbLinA,
    };
    let pixels = [5u8, 5, 5, 255, 0, 0, 0, 255];
    let encoded = qoi.encode_alloc(&pixels).unwrap();
    assert_eq!(&encoded[14..18], &[0xA5, 0x88, 0x9B, 0x88]);
    assert_eq!(encoded.len(), 14 + 2 + 2 + 8);
}
