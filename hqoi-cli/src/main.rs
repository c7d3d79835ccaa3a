//! Command-line encoder/decoder for the HQOI image format.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use hqoi::{Colors, Qoi};
use log::info;

#[derive(Parser)]
#[command(name = "hqoi-cli")]
#[command(about = "Encode and decode HQOI images", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Encode an image into HQOI.
    Encode {
        /// Input image. Any format `image` understands, or `.raw` for a headerless pixel dump.
        input: PathBuf,
        /// Output `.qoi` file.
        output: PathBuf,
        /// Width in pixels, required when `input` is `.raw`.
        #[arg(long)]
        width: Option<u32>,
        /// Height in pixels, required when `input` is `.raw`.
        #[arg(long)]
        height: Option<u32>,
        /// Channel count, required when `input` is `.raw`.
        #[arg(long, value_enum)]
        channels: Option<ChannelArg>,
        /// Color space to record in the header.
        #[arg(long, value_enum, default_value_t = ColorspaceArg::Srgb)]
        colorspace: ColorspaceArg,
        /// Skip the entropy layer even when it would shrink the stream.
        #[arg(long)]
        no_entropy: bool,
    },
    /// Decode an HQOI image.
    Decode {
        /// Input `.qoi` file.
        input: PathBuf,
        /// Output image. Any format `image` understands, or `.raw` for a headerless pixel dump.
        output: PathBuf,
        /// Force the output channel count; 0 keeps the header's own count.
        #[arg(long, default_value_t = 0)]
        channels: u8,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ChannelArg {
    #[value(name = "3")]
    Rgb,
    #[value(name = "4")]
    Rgba,
}

#[derive(Clone, Copy, ValueEnum)]
enum ColorspaceArg {
    Srgb,
    Linear,
}

fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    let cli = Cli::parse();

    match cli.command {
        Command::Encode {
            input,
            output,
            width,
            height,
            channels,
            colorspace,
            no_entropy,
        } => encode(input, output, width, height, channels, colorspace, no_entropy),
        Command::Decode {
            input,
            output,
            channels,
        } => decode(input, output, channels),
    }
}

fn encode(
    input: PathBuf,
    output: PathBuf,
    width: Option<u32>,
    height: Option<u32>,
    channels: Option<ChannelArg>,
    colorspace: ColorspaceArg,
    no_entropy: bool,
) -> anyhow::Result<()> {
    let linear = matches!(colorspace, ColorspaceArg::Linear);
    let is_raw = input.extension().map_or(false, |ext| ext == "raw");

    let (pixels, width, height, has_alpha) = if is_raw {
        let width = width.context("--width is required for .raw input")?;
        let height = height.context("--height is required for .raw input")?;
        let channels = channels.context("--channels is required for .raw input")?;
        let pixels = std::fs::read(&input)
            .with_context(|| format!("reading '{}'", input.display()))?;
        (pixels, width, height, matches!(channels, ChannelArg::Rgba))
    } else {
        let image = image::open(&input).with_context(|| format!("opening '{}'", input.display()))?;
        let width = image.width();
        let height = image.height();
        let has_alpha = match channels {
            Some(ChannelArg::Rgba) => true,
            Some(ChannelArg::Rgb) => false,
            None => image.color().has_alpha(),
        };
        let pixels = if has_alpha {
            image.to_rgba8().into_raw()
        } else {
            image.to_rgb8().into_raw()
        };
        (pixels, width, height, has_alpha)
    };

    let colors = match (has_alpha, linear) {
        (false, false) => Colors::Srgb,
        (true, false) => Colors::SrgbLinA,
        (false, true) => Colors::Rgb,
        (true, true) => Colors::Rgba,
    };

    let qoi = Qoi {
        width,
        height,
        colors,
    };

    let encoded = if no_entropy {
        let limit = qoi.encoded_size_limit();
        let mut buf = vec![0u8; limit];
        let size = qoi
            .encode(&pixels, &mut buf)
            .context("encoding image")?;
        buf.truncate(size);
        buf
    } else {
        qoi.encode_alloc(&pixels).context("encoding image")?
    };

    info!(
        "encoded {}x{} ({} channels) -> {} bytes",
        width,
        height,
        colors.channels(),
        encoded.len()
    );

    std::fs::write(&output, &encoded)
        .with_context(|| format!("writing '{}'", output.display()))?;
    Ok(())
}

fn decode(input: PathBuf, output: PathBuf, requested_channels: u8) -> anyhow::Result<()> {
    if !matches!(requested_channels, 0 | 3 | 4) {
        bail!("--channels must be 0, 3 or 4");
    }

    let bytes = std::fs::read(&input).with_context(|| format!("reading '{}'", input.display()))?;
    let (qoi, pixels) = Qoi::decode_alloc(&bytes, requested_channels)
        .map_err(|err| anyhow::anyhow!("{}", err))?;

    info!(
        "decoded {}x{} ({} channels)",
        qoi.width,
        qoi.height,
        qoi.colors.channels()
    );

    let want_alpha = match requested_channels {
        0 => qoi.colors.has_alpha(),
        4 => true,
        3 => false,
        _ => unreachable!(),
    };

    if output.extension().map_or(false, |ext| ext == "raw") {
        std::fs::write(&output, &pixels)
            .with_context(|| format!("writing '{}'", output.display()))?;
        return Ok(());
    }

    let dynamic = if want_alpha {
        image::DynamicImage::ImageRgba8(
            image::RgbaImage::from_raw(qoi.width, qoi.height, pixels)
                .context("pixel buffer does not match image dimensions")?,
        )
    } else {
        image::DynamicImage::ImageRgb8(
            image::RgbImage::from_raw(qoi.width, qoi.height, pixels)
                .context("pixel buffer does not match image dimensions")?,
        )
    };

    dynamic
        .save(&output)
        .with_context(|| format!("saving '{}'", output.display()))?;
    Ok(())
}
