use super::*;
use crate::header::{Header, HeaderError, QOI_HEADER_SIZE as HDR_SIZE, QOI_PADDING as PAD};

#[cfg(feature = "alloc")]
use alloc::vec;
#[cfg(feature = "alloc")]
use alloc::vec::Vec;

/// Supplies chunk-stream bytes one at a time to the chunk decoder.
///
/// The plain format reads straight out of a slice; the entropy-coded format
/// (see [`crate::entropy`]) has no declared byte length up front, so the
/// chunk decoder pulls bytes on demand instead of matching against a
/// pre-sliced buffer — it stops exactly when it has produced the pixel count
/// the header promised, same as the plain path.
pub(crate) trait ByteSource {
    fn next_byte(&mut self) -> Option<u8>;
}

struct PlainSource<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> PlainSource<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        PlainSource { bytes, pos: 0 }
    }
}

impl<'a> ByteSource for PlainSource<'a> {
    #[inline(always)]
    fn next_byte(&mut self) -> Option<u8> {
        let b = *self.bytes.get(self.pos)?;
        self.pos += 1;
        Some(b)
    }
}

/// Writes one reconstructed pixel into an output slot sized for the
/// requested output channel count (3 or 4), independent of the chunk
/// stream's own channel count: dropping alpha when 3 channels were
/// requested from a 4-channel stream, or supplying it (via `px.a()`, which
/// is the constant 255 for an RGB [`Pixel`]) when 4 were requested from 3.
#[inline(always)]
fn write_pixel<P: Pixel>(px: &P, slot: &mut [u8]) {
    slot[0] = px.r();
    slot[1] = px.g();
    slot[2] = px.b();
    if let Some(a) = slot.get_mut(3) {
        *a = px.a();
    }
}

impl Qoi {
    /// Reads the header from an encoded QOI/HQOI image without decoding pixels.
    pub fn decode_header(bytes: &[u8]) -> Result<(Self, bool), DecodeError> {
        let header = Header::parse(bytes)?;
        Ok((
            Qoi {
                width: header.width,
                height: header.height,
                colors: header.colors,
            },
            header.entropy_coded,
        ))
    }

    /// Resolves a caller's `requested_channels` (`0`, `3` or `4`) against this
    /// image's header channel count, per §6: `0` means "use the header's own
    /// channel count".
    fn resolve_requested_channels(&self, requested_channels: u8) -> Result<usize, DecodeError> {
        match requested_channels {
            0 => Ok(self.colors.channels()),
            3 => Ok(3),
            4 => Ok(4),
            _ => Err(DecodeError::InvalidRequestedChannels),
        }
    }

    /// Decode a QOI/HQOI image from a byte slice. Decoded pixels are written
    /// into the `output` slice with `requested_channels` channels per pixel
    /// (`0` to keep the header's own channel count, or `3`/`4` to convert:
    /// dropping alpha or synthesizing an opaque one as the source requires).
    ///
    /// On success this function returns `Ok(qoi)` with `qoi` describing the
    /// image dimensions and the *header's* color space (not necessarily the
    /// channel count the pixels were actually written with).
    pub fn decode(
        bytes: &[u8],
        output: &mut [u8],
        requested_channels: u8,
    ) -> Result<Self, DecodeError> {
        let header = Header::parse(bytes)?;
        let qoi = Qoi {
            width: header.width,
            height: header.height,
            colors: header.colors,
        };
        let out_channels = qoi.resolve_requested_channels(requested_channels)?;

        if header.entropy_coded {
            #[cfg(feature = "alloc")]
            {
                let mut source = crate::entropy::decode_source(&bytes[HDR_SIZE..])
                    .ok_or(DecodeError::Header(HeaderError::InvalidColorSpaceValue))?;
                qoi.decode_dispatch(&mut source, output, out_channels)?;
                return Ok(qoi);
            }
            #[cfg(not(feature = "alloc"))]
            {
                return Err(DecodeError::Header(HeaderError::InvalidColorSpaceValue));
            }
        }

        // Exclude the 8-byte end marker (`body_end = size - 8`, §4.2) so a
        // malformed body that runs dry early never has the padding's literal
        // bytes mistaken for further chunk tags; clamp to `HDR_SIZE` so a
        // buffer shorter than header + padding yields an empty body instead
        // of panicking on an inverted slice range.
        let body_end = bytes.len().saturating_sub(PAD).max(HDR_SIZE);
        let mut source = PlainSource::new(&bytes[HDR_SIZE..body_end]);
        qoi.decode_dispatch(&mut source, output, out_channels)?;
        Ok(qoi)
    }

    fn decode_dispatch<S: ByteSource>(
        &self,
        src: &mut S,
        output: &mut [u8],
        out_channels: usize,
    ) -> Result<(), DecodeError> {
        if self.width == 0 || self.height == 0 {
            return Ok(());
        }

        let px_len = self.width as usize * self.height as usize * out_channels;

        let output = match output.get_mut(..px_len) {
            None => return Err(DecodeError::OutputIsTooSmall),
            Some(output) => output,
        };

        if self.colors.has_alpha() {
            Self::decode_chunks::<Rgba, S>(src, output, out_channels);
        } else {
            Self::decode_chunks::<Rgb, S>(src, output, out_channels);
        }
        Ok(())
    }

    /// Decodes a chunk stream into `pixels`, pulling bytes from `src` as
    /// needed and writing each reconstructed pixel through [`write_pixel`] so
    /// the output channel count can differ from the chunk stream's own `P`.
    ///
    /// Truncated input is tolerated: remaining pixel slots are filled with
    /// the last reconstructed pixel, matching the encoder/decoder's
    /// soft-failure policy for partial streams.
    fn decode_chunks<P: Pixel, S: ByteSource>(src: &mut S, pixels: &mut [u8], out_channels: usize) {
        debug_assert_eq!(pixels.len() % out_channels, 0);

        let mut index = [P::new(); 64];
        let mut px = P::new_opaque();
        let mut run: u32 = 0;

        let mut out = pixels.chunks_exact_mut(out_channels);

        'pixels: while let Some(slot) = out.next() {
            if run > 0 {
                run -= 1;
                write_pixel(&px, slot);
                continue;
            }

            let b1 = match src.next_byte() {
                Some(b) => b,
                None => {
                    write_pixel(&px, slot);
                    for slot in out {
                        write_pixel(&px, slot);
                    }
                    break 'pixels;
                }
            };

            macro_rules! need {
                () => {
                    match src.next_byte() {
                        Some(b) => b,
                        None => {
                            write_pixel(&px, slot);
                            for slot in out {
                                write_pixel(&px, slot);
                            }
                            break 'pixels;
                        }
                    }
                };
            }

            match b1 {
                0xFE => {
                    let r = need!();
                    let g = need!();
                    let b = need!();
                    px.set_r(r);
                    px.set_g(g);
                    px.set_b(b);
                }
                0xFF => {
                    let r = need!();
                    let g = need!();
                    let b = need!();
                    let a = need!();
                    px.set_r(r);
                    px.set_g(g);
                    px.set_b(b);
                    px.set_a(a);
                }
                0b0000_0000..=0b0011_1111 => {
                    px = index[b1 as usize];
                    write_pixel(&px, slot);
                    continue;
                }
                0b0100_0000..=0b0111_1111 => {
                    let vr = ((b1 >> 4) & 0x03).wrapping_sub(2);
                    let vg = ((b1 >> 2) & 0x03).wrapping_sub(2);
                    let vb = (b1 & 0x03).wrapping_sub(2);
                    px.set_r(px.r().wrapping_add(vr));
                    px.set_g(px.g().wrapping_add(vg));
                    px.set_b(px.b().wrapping_add(vb));
                }
                0b1000_0000..=0b1011_1111 => {
                    let b2 = need!();
                    let vg = (b1 & 0x3f).wrapping_sub(32);
                    let vr = ((b2 >> 4) & 0x0f).wrapping_sub(8).wrapping_add(vg);
                    let vb = (b2 & 0x0f).wrapping_sub(8).wrapping_add(vg);
                    px.set_r(px.r().wrapping_add(vr));
                    px.set_g(px.g().wrapping_add(vg));
                    px.set_b(px.b().wrapping_add(vb));
                }
                0b1100_0000..=0b1111_1101 => {
                    run = (b1 & 0x3f) as u32;
                    write_pixel(&px, slot);
                    continue;
                }
            }

            index[px.hash() as usize] = px;
            write_pixel(&px, slot);
        }
    }

    /// Decode a QOI/HQOI image from a byte slice. Decoded pixels are written
    /// into an allocated `Vec` with `requested_channels` channels per pixel
    /// (`0`, `3` or `4`; see [`Qoi::decode`]).
    #[cfg(feature = "alloc")]
    pub fn decode_alloc(
        bytes: &[u8],
        requested_channels: u8,
    ) -> Result<(Self, Vec<u8>), DecodeError> {
        let (qoi, _) = Self::decode_header(bytes)?;
        let out_channels = qoi.resolve_requested_channels(requested_channels)?;
        let size = qoi.width as usize * qoi.height as usize * out_channels;
        let mut output = vec![0; size];
        let qoi = Self::decode(bytes, &mut output, requested_channels)?;
        Ok((qoi, output))
    }
}
