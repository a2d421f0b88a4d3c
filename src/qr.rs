use image::Luma;
use qrcode::QrCode;
use std::error::Error;
use std::path::Path;

/// Render a QR code of the public survey URL to a PNG file
///
/// One-time startup side effect; the image is served from the static assets
/// directory and embedded in the info page. Failure is reported to the
/// caller, who logs it and keeps serving.
///
/// # Arguments
/// * `url` - The public survey URL to encode
/// * `out` - Destination PNG path
pub fn write_survey_qr(url: &str, out: &Path) -> Result<(), Box<dyn Error>> {
    let code = QrCode::new(url.as_bytes())?;
    let image = code
        .render::<Luma<u8>>()
        .min_dimensions(360, 360)
        .build();
    image.save(out)?;
    Ok(())
}
