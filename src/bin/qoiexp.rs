//! qoiexp CLI - QOI image codec command-line utility.
//!
//! Converts between QOI and raw or Netpbm (PPM/PAM) pixel buffers.

use clap::{Parser, Subcommand, ValueEnum};
use qoiexp_rs::constants::{COLORSPACE_LINEAR, COLORSPACE_SRGB};
use qoiexp_rs::pnm::{PnmImage, read_pnm, write_pnm};
use qoiexp_rs::{ImageInfo, decode_from_file, encode_to_file, read_info};
use std::fs;
use std::path::{Path, PathBuf};

/// Lossless QOI image codec
#[derive(Parser)]
#[command(name = "qoiexp")]
#[command(author = "qoiexp-rs contributors")]
#[command(version)]
#[command(about = "QOI codec for encoding, decoding, and inspecting images", long_about = None)]
#[command(after_help = "EXAMPLES:
    qoiexp encode -i image.ppm -o image.qoi
    qoiexp encode -i pixels.raw -o image.qoi -w 512 -H 512 -n 4
    qoiexp decode -i image.qoi -o image.pam -f pnm
    qoiexp convert image.qoi image.ppm
    qoiexp info -i image.qoi")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a PPM/PAM image or raw pixels to QOI
    ///
    /// Raw input requires --width, --height and --channels.
    #[command(visible_alias = "e")]
    Encode {
        /// Input file path (.ppm, .pam or raw pixels)
        #[arg(short, long, help = "Path to the input pixel file")]
        input: PathBuf,

        /// Output QOI file
        #[arg(short, long, help = "Path for the encoded output file")]
        output: PathBuf,

        /// Image width in pixels (raw input only)
        #[arg(short, long)]
        width: Option<u32>,

        /// Image height in pixels (raw input only)
        #[arg(short = 'H', long)]
        height: Option<u32>,

        /// Samples per pixel, 3=RGB or 4=RGBA (raw input only)
        #[arg(short = 'n', long, default_value = "4")]
        channels: u8,

        /// Colorspace tag stored in the header (0=sRGB, 1=linear)
        #[arg(long, default_value = "0")]
        colorspace: u8,
    },

    /// Decode a QOI image to raw pixels or a Netpbm image
    #[command(visible_alias = "d")]
    Decode {
        /// Input QOI file
        #[arg(short, long, help = "Path to the QOI file")]
        input: PathBuf,

        /// Output file path for decoded pixels
        #[arg(short, long, help = "Path for the output file")]
        output: PathBuf,

        /// Output format: raw (binary pixels) or pnm (PPM for RGB, PAM for RGBA)
        #[arg(short, long, default_value = "pnm", value_enum)]
        format: OutputFormat,
    },

    /// Convert by file extension: exactly one side must be .qoi
    #[command(visible_alias = "c")]
    Convert {
        /// Input file (.qoi, .ppm or .pam)
        input: PathBuf,

        /// Output file (.qoi, .ppm or .pam)
        output: PathBuf,
    },

    /// Display QOI header information
    #[command(visible_alias = "i")]
    Info {
        /// Input file path
        #[arg(short, long, help = "Path to the QOI file to inspect")]
        input: PathBuf,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Raw binary pixel data
    Raw,
    /// Portable PixMap (P6) or Portable Arbitrary Map (P7)
    Pnm,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Encode {
            input,
            output,
            width,
            height,
            channels,
            colorspace,
        } => encode_image(&input, &output, width, height, channels, colorspace),
        Commands::Decode {
            input,
            output,
            format,
        } => decode_image(&input, &output, &format),
        Commands::Convert { input, output } => convert_image(&input, &output),
        Commands::Info { input } => show_info(&input),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn encode_image(
    input: &Path,
    output: &Path,
    width: Option<u32>,
    height: Option<u32>,
    channels: u8,
    colorspace: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read(input)?;

    let (pixels, info) = match (width, height) {
        (Some(width), Some(height)) => {
            let info = ImageInfo::from_raw(width, height, channels, colorspace)?;
            (data, info)
        }
        (None, None) => {
            let image = read_pnm(&data)?;
            let info = image.image_info(colorspace);
            (image.pixels, info)
        }
        _ => return Err("raw input needs both --width and --height".into()),
    };

    let written = encode_to_file(output, &pixels, &info)?;
    println!(
        "✓ Encoded {}x{} image ({} channels) to {:?}: {} bytes",
        info.width,
        info.height,
        info.channels.count(),
        output,
        written
    );
    Ok(())
}

fn decode_image(
    input: &Path,
    output: &Path,
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let (info, pixels) = decode_from_file(input)?;

    match format {
        OutputFormat::Raw => {
            fs::write(output, &pixels)?;
        }
        OutputFormat::Pnm => {
            write_pnm_file(output, info, pixels)?;
        }
    }

    println!(
        "✓ Decoded {}x{} image ({} channels) to {:?}",
        info.width,
        info.height,
        info.channels.count(),
        output
    );
    Ok(())
}

fn convert_image(input: &Path, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let input_is_qoi = has_qoi_extension(input);
    let output_is_qoi = has_qoi_extension(output);

    println!("loading {:?}...", input);
    match (input_is_qoi, output_is_qoi) {
        (true, false) => {
            let (info, pixels) = decode_from_file(input)?;
            println!("saving  {:?}...", output);
            write_pnm_file(output, info, pixels)?;
        }
        (false, true) => {
            let image = read_pnm(&fs::read(input)?)?;
            println!("saving  {:?}...", output);
            encode_to_file(output, &image.pixels, &image.image_info(COLORSPACE_SRGB))?;
        }
        (true, true) => return Err("same file extensions".into()),
        (false, false) => return Err("one of the files must have a .qoi extension".into()),
    }
    println!("finished!");
    Ok(())
}

fn show_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read(input)?;
    let info = read_info(&data)?;
    let raw_size = info.buffer_size()?;

    println!("File: {:?}", input);
    println!("Size: {} bytes", data.len());
    println!();
    println!("Format: QOI");
    println!("  Dimensions: {}x{}", info.width, info.height);
    println!("  Channels:   {}", info.channels.count());
    println!(
        "  Colorspace: {}",
        match info.colorspace {
            COLORSPACE_SRGB => "sRGB with linear alpha".to_string(),
            COLORSPACE_LINEAR => "all channels linear".to_string(),
            other => format!("unknown ({})", other),
        }
    );
    if raw_size > 0 {
        println!(
            "  Ratio:      {:.1}% of raw",
            data.len() as f64 * 100.0 / raw_size as f64
        );
    }
    Ok(())
}

// Internal helpers

fn has_qoi_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("qoi"))
}

fn write_pnm_file(
    path: &Path,
    info: ImageInfo,
    pixels: Vec<u8>,
) -> Result<(), Box<dyn std::error::Error>> {
    use std::io::Write;
    let image = PnmImage {
        width: info.width,
        height: info.height,
        channels: info.channels,
        pixels,
    };
    let mut file = std::io::BufWriter::new(fs::File::create(path)?);
    write_pnm(&mut file, &image)?;
    file.flush()?;
    Ok(())
}
