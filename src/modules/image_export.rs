use image::{ImageEncoder, RgbImage};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use crate::error::{EditorError, Result};

pub const DEFAULT_JPEG_QUALITY: u8 = 75;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Jpeg,
    Png,
    Bmp,
}

impl ExportFormat {
    pub fn as_str(&self) -> &str {
        match self {
            ExportFormat::Jpeg => "JPEG",
            ExportFormat::Png => "PNG",
            ExportFormat::Bmp => "BMP",
        }
    }

    pub fn extension(&self) -> &str {
        match self {
            ExportFormat::Jpeg => "jpg",
            ExportFormat::Png => "png",
            ExportFormat::Bmp => "bmp",
        }
    }

    /// Picks the encoder from the file extension. Anything unknown is written as JPEG.
    pub fn from_path(path: &Path) -> Self {
        let ext: String = path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "png" => ExportFormat::Png,
            "bmp" => ExportFormat::Bmp,
            _ => ExportFormat::Jpeg,
        }
    }
}

pub fn export_image(img: &RgbImage, path: &Path, format: ExportFormat, jpeg_quality: u8) -> Result<()> {
    let io_err = |source: std::io::Error| EditorError::Io { path: path.to_path_buf(), source };
    let encode_err = |source: image::ImageError| EditorError::Encode { path: path.to_path_buf(), source };
    let file: File = File::create(path).map_err(io_err)?;
    let mut writer: BufWriter<File> = BufWriter::new(file);

    match format {
        ExportFormat::Jpeg => {
            let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut writer, jpeg_quality.clamp(1, 100));
            encoder.encode_image(img).map_err(encode_err)?;
        }
        ExportFormat::Png => {
            let encoder = image::codecs::png::PngEncoder::new_with_quality(
                &mut writer,
                image::codecs::png::CompressionType::Default,
                image::codecs::png::FilterType::Adaptive,
            );
            encoder.write_image(img.as_raw(), img.width(), img.height(), image::ExtendedColorType::Rgb8)
                .map_err(encode_err)?;
        }
        ExportFormat::Bmp => {
            let encoder = image::codecs::bmp::BmpEncoder::new(&mut writer);
            encoder.write_image(img.as_raw(), img.width(), img.height(), image::ExtendedColorType::Rgb8)
                .map_err(encode_err)?;
        }
    }
    // BufWriter swallows errors on drop
    writer.flush().map_err(io_err)?;

    log::info!("wrote {} {}x{} to {}", format.as_str(), img.width(), img.height(), path.display());
    Ok(())
}
