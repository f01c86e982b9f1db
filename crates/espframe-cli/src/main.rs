//! espframe Control Tool
//!
//! CLI for preparing 240x240 RGB565 frames and sending them to the device.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use espframe_client::{DeviceClient, DeviceReply, SessionClock, DEFAULT_DEVICE_URL};
use espframe_image::{
    convert, parse_hex_color, rgb565_to_rgb888, Bitmap565, CanvasSurface, SourceImage,
    FRAME_BYTES,
};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "espframectl")]
#[command(about = "Control tool for espframe devices")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Device base URL
    #[arg(long, global = true, default_value = DEFAULT_DEVICE_URL)]
    device: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an image and upload it to the device
    Upload {
        /// Image file (any format the decoder understands)
        image: PathBuf,
    },
    /// Set the device clock to the current time
    SyncTime,
    /// Convert an image and write the raw upload payload
    Convert {
        /// Image file
        image: PathBuf,

        /// Output file for the 115200-byte RGB565 payload
        #[arg(short, long, default_value = "frame.bin")]
        output: PathBuf,
    },
    /// Write the 240x240 preview of an image as PNG
    Preview {
        /// Image file
        image: PathBuf,

        /// Output PNG path
        #[arg(short, long, default_value = "preview.png")]
        output: PathBuf,
    },
    /// Upload a solid colour frame
    Fill {
        /// Color in hex format (e.g., #FF0000 for red)
        #[arg(default_value = "#000000")]
        color: String,
    },
    /// Validate a payload file and show its first pixels
    Inspect {
        /// Payload file produced by `convert`
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Upload { image } => handle_upload(&image, &cli.device).await,
        Commands::SyncTime => handle_sync_time(&cli.device).await,
        Commands::Convert { image, output } => handle_convert(&image, &output),
        Commands::Preview { image, output } => handle_preview(&image, &output),
        Commands::Fill { color } => handle_fill(&color, &cli.device).await,
        Commands::Inspect { file } => handle_inspect(&file),
    }
}

/// Decodes, stretches and encodes an image file.
fn load_frame(path: &Path) -> Result<(Bitmap565, CanvasSurface)> {
    let image = SourceImage::open(path)
        .with_context(|| format!("Failed to load image {}", path.display()))?;
    debug!(
        "Loaded {} ({}x{})",
        path.display(),
        image.width(),
        image.height()
    );

    let mut canvas = CanvasSurface::new();
    let bitmap = convert(image, &mut canvas).context("Failed to convert image")?;
    Ok((bitmap, canvas))
}

fn connect(device: &str) -> Result<DeviceClient> {
    DeviceClient::new(device).context("Invalid device address")
}

fn print_reply(reply: &DeviceReply) {
    println!("Response: {}", reply.body);
}

async fn handle_upload(image: &Path, device: &str) -> Result<()> {
    let client = connect(device)?;
    let (bitmap, _) = load_frame(image)?;
    let reply = client.upload(&bitmap).await.context("Failed to send")?;
    print_reply(&reply);
    Ok(())
}

async fn handle_sync_time(device: &str) -> Result<()> {
    let client = connect(device)?;
    let now_ms = SessionClock::new().now_ms();
    let reply = client.sync_time(now_ms).await.context("Failed to send")?;
    debug!("Sent t={}", now_ms);
    print_reply(&reply);
    Ok(())
}

fn handle_convert(image: &Path, output: &Path) -> Result<()> {
    let (bitmap, _) = load_frame(image)?;
    std::fs::write(output, bitmap.to_bytes()).context("Failed to write payload file")?;
    println!("Payload saved to: {} ({} bytes)", output.display(), FRAME_BYTES);
    Ok(())
}

fn handle_preview(image: &Path, output: &Path) -> Result<()> {
    let (_, canvas) = load_frame(image)?;
    let png_data = canvas.to_png().context("Failed to encode preview")?;
    std::fs::write(output, &png_data).context("Failed to write preview file")?;
    println!("Preview saved to: {}", output.display());
    Ok(())
}

async fn handle_fill(color: &str, device: &str) -> Result<()> {
    let pixel = parse_hex_color(color)
        .with_context(|| format!("Invalid color: {}. Use #RRGGBB", color))?;
    let client = connect(device)?;
    let reply = client
        .upload(&Bitmap565::solid(pixel))
        .await
        .context("Failed to send")?;
    print_reply(&reply);
    Ok(())
}

fn handle_inspect(file: &Path) -> Result<()> {
    let bytes = std::fs::read(file).context("Failed to read payload file")?;
    let bitmap = Bitmap565::from_bytes(&bytes).context("Not a valid payload")?;

    println!("Payload: {}", file.display());
    println!("  Size: {} bytes", bytes.len());
    println!("  Pixels: {}", bitmap.len());
    for (i, &pixel) in bitmap.pixels().iter().take(4).enumerate() {
        let (r, g, b) = rgb565_to_rgb888(pixel);
        println!("  [{}] 0x{:04X} (#{:02X}{:02X}{:02X})", i, pixel, r, g, b);
    }
    Ok(())
}
