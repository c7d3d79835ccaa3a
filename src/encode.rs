use super::*;
use crate::header::{Header, QOI_HEADER_SIZE as HDR_SIZE, QOI_PADDING as PAD};

#[cfg(feature = "alloc")]
use alloc::{vec, vec::Vec};

impl Qoi {
    /// Encode raw RGB or RGBA pixels into a chunk stream, followed by the 8-byte
    /// end marker. Does not write the frame header.
    fn encode_chunks<P: Pixel>(pixels: &[u8], output: &mut [u8]) -> Result<usize, EncodeError> {
        let channels = P::CHANNELS;
        let px_len = pixels.len();

        if px_len % channels != 0 {
            return Err(EncodeError::NotEnoughPixelData);
        }

        let mut index = [P::new(); 64];
        let mut run = 0u16;
        let mut px_prev = P::new_opaque();

        let mut chunks = pixels.chunks_exact(channels);
        let mut rest = output;

        while let Some(bytes) = chunks.next() {
            if unlikely(rest.len() <= PAD) {
                return Err(EncodeError::OutputIsTooSmall);
            }

            let mut px = P::new();
            px.read(bytes);

            if px == px_prev {
                run += 1;

                if run == 62 || chunks.len() == 0 {
                    rest[0] = QOI_OP_RUN | (run - 1) as u8;
                    rest = &mut rest[1..];
                    run = 0;
                }
                continue;
            }

            if run > 0 {
                rest[0] = QOI_OP_RUN | (run - 1) as u8;
                rest = &mut rest[1..];
                run = 0;
            }

            if rest.len() <= PAD {
                return Err(EncodeError::OutputIsTooSmall);
            }

            let index_pos = px.hash() as usize;

            if index[index_pos] == px {
                rest[0] = QOI_OP_INDEX | index_pos as u8;
                rest = &mut rest[1..];
            } else {
                index[index_pos] = px;

                if px.a() == px_prev.a() {
                    let v = px.var(&px_prev);

                    if let Some(diff) = v.diff() {
                        rest[0] = diff;
                        rest = &mut rest[1..];
                    } else if let Some([lu, ma]) = v.luma() {
                        rest[0] = lu;
                        rest[1] = ma;
                        rest = &mut rest[2..];
                    } else {
                        rest[0] = QOI_OP_RGB;
                        rest[1] = px.r();
                        rest[2] = px.g();
                        rest[3] = px.b();
                        rest = &mut rest[4..];
                    }
                } else {
                    rest[0] = QOI_OP_RGBA;
                    rest[1] = px.r();
                    rest[2] = px.g();
                    rest[3] = px.b();
                    rest[4] = px.a();
                    rest = &mut rest[5..];
                }
            }

            px_prev = px;
        }

        if rest.len() < PAD {
            return Err(EncodeError::OutputIsTooSmall);
        }

        rest[..PAD - 1].fill(0);
        rest[PAD - 1] = 1;

        let tail = rest.len() - PAD;
        Ok(output.len() - tail)
    }

    /// Encode raw RGB or RGBA pixels into a plain (non entropy-coded) QOI image.
    /// Encoded image is written into the `output` slice.
    ///
    /// On success this function returns `Ok(size)` with `size` the number of
    /// bytes written to `output`.
    pub fn encode(&self, pixels: &[u8], output: &mut [u8]) -> Result<usize, EncodeError> {
        Header::validate_dimensions(self.width, self.height)
            .map_err(|_| EncodeError::InvalidDimensions)?;

        let channels = self.colors.channels();
        let px_len = self.width as usize * self.height as usize * channels;

        let pixels = match pixels.get(..px_len) {
            None => return Err(EncodeError::NotEnoughPixelData),
            Some(pixels) => pixels,
        };

        if output.len() <= HDR_SIZE {
            return Err(EncodeError::OutputIsTooSmall);
        }

        let header = Header {
            width: self.width,
            height: self.height,
            colors: self.colors,
            entropy_coded: false,
        };
        header.write(output);

        let body_len = if self.colors.has_alpha() {
            Self::encode_chunks::<Rgba>(pixels, &mut output[HDR_SIZE..])?
        } else {
            Self::encode_chunks::<Rgb>(pixels, &mut output[HDR_SIZE..])?
        };

        Ok(HDR_SIZE + body_len)
    }

    /// Returns the maximum size of the `Qoi::encode` output.
    /// Using a smaller slice may cause `Qoi::encode` to return
    /// `Err(EncodeError::OutputIsTooSmall)`.
    pub fn encoded_size_limit(&self) -> usize {
        self.width as usize * self.height as usize * (self.colors.channels() + 1)
            + HDR_SIZE
            + PAD
    }

    /// Encode raw RGB or RGBA pixels into a QOI image in memory, applying the
    /// entropy layer when it is estimated to help (see [`crate::entropy`]).
    ///
    /// On success this function returns `Ok(vec)` with `vec` containing the
    /// encoded image.
    #[cfg(feature = "alloc")]
    pub fn encode_alloc(&self, pixels: &[u8]) -> Result<Vec<u8>, EncodeError> {
        let limit = self.encoded_size_limit();
        let mut output = vec![0; limit];
        let size = self.encode(pixels, &mut output)?;
        output.truncate(size);

        if let Some(frame_body) = crate::entropy::try_encode(&output[HDR_SIZE..]) {
            let header = Header {
                width: self.width,
                height: self.height,
                colors: self.colors,
                entropy_coded: true,
            };
            let mut entropy_output = vec![0u8; HDR_SIZE];
            header.write(&mut entropy_output);
            entropy_output.extend_from_slice(&frame_body);
            return Ok(entropy_output);
        }

        Ok(output)
    }
}
