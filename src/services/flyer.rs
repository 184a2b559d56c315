//! Participant flyer rendering
//!
//! Composes a 900x1200 PNG with the event details, the participant's name and
//! their attendance QR code, optionally drawn over a background template.

use ab_glyph::{FontVec, PxScale};
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use tracing::{debug, info};

use super::qr::{encode_png, render_qr_image, QrOptions};
use crate::config::FlyerConfig;
use crate::models::{Event, Participant};
use crate::utils::errors::{EventPassError, Result};
use crate::utils::helpers::format_event_date;

pub const FLYER_WIDTH: u32 = 900;
pub const FLYER_HEIGHT: u32 = 1200;

/// DejaVu Sans Bold, used when no font is configured
static DEFAULT_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf");

const QR_SIZE: u32 = 360;
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const DARK_GREEN: Rgb<u8> = Rgb([0, 100, 0]);
const LIGHT_GREEN: Rgb<u8> = Rgb([123, 192, 67]);
const TEXT_GRAY: Rgb<u8> = Rgb([51, 51, 51]);

pub struct FlyerRenderer {
    template: Option<RgbImage>,
    font: FontVec,
    qr_options: QrOptions,
}

impl FlyerRenderer {
    /// Load the configured template and font. Without a template the flyer
    /// gets a plain background; without a font it uses the bundled one.
    pub fn new(config: &FlyerConfig, qr_options: QrOptions) -> Result<Self> {
        let template = match config.template_path.as_deref().filter(|p| !p.is_empty()) {
            Some(path) => {
                let image = image::open(path)?;
                info!(path = path, "Loaded flyer template");
                Some(
                    image
                        .resize_to_fill(FLYER_WIDTH, FLYER_HEIGHT, FilterType::Lanczos3)
                        .to_rgb8(),
                )
            }
            None => None,
        };

        let font = match config.font_path.as_deref().filter(|p| !p.is_empty()) {
            Some(path) => {
                let bytes = std::fs::read(path)?;
                let font = FontVec::try_from_vec(bytes)
                    .map_err(|e| EventPassError::Config(format!("Invalid flyer font {}: {}", path, e)))?;
                info!(path = path, "Loaded flyer font");
                font
            }
            None => FontVec::try_from_vec(DEFAULT_FONT.to_vec())
                .map_err(|e| EventPassError::Internal(format!("Bundled flyer font is invalid: {}", e)))?,
        };

        Ok(Self {
            template,
            font,
            qr_options: qr_options.with_size(QR_SIZE),
        })
    }

    /// Render the flyer for `participant` with `qr_payload` embedded
    pub fn render(&self, event: &Event, participant: &Participant, qr_payload: &str) -> Result<Vec<u8>> {
        let name = participant.name.trim();
        if name.is_empty() {
            return Err(EventPassError::RenderFailure("Participant name is empty".to_string()));
        }

        let mut canvas = match &self.template {
            Some(template) => template.clone(),
            None => Self::plain_background(),
        };

        // Name banner
        let banner = Rect::at(100, 640).of_size(FLYER_WIDTH - 200, 110);
        draw_filled_rect_mut(&mut canvas, banner, WHITE);
        draw_hollow_rect_mut(&mut canvas, banner, LIGHT_GREEN);
        draw_hollow_rect_mut(&mut canvas, Rect::at(101, 641).of_size(FLYER_WIDTH - 202, 108), LIGHT_GREEN);

        let qr = DynamicImage::ImageLuma8(render_qr_image(qr_payload, &self.qr_options)?).to_rgb8();
        let qr_x = (FLYER_WIDTH - QR_SIZE) / 2;
        imageops::overlay(&mut canvas, &qr, qr_x as i64, 790);

        let dates = format!(
            "{} - {}",
            format_event_date(event.start_date),
            format_event_date(event.end_date)
        );
        self.draw_centered(&mut canvas, &event.name, 70, 52.0, WHITE);
        self.draw_centered(&mut canvas, &dates, 170, 30.0, WHITE);
        self.draw_centered(&mut canvas, &event.location, 220, 30.0, WHITE);
        self.draw_centered(&mut canvas, &name.to_uppercase(), 670, 44.0, DARK_GREEN);
        if let Some(position) = participant.display_position() {
            self.draw_centered(&mut canvas, &position, 560, 28.0, TEXT_GRAY);
        }
        debug!(participant_id = %participant.id, "Flyer rendered");

        encode_png(DynamicImage::ImageRgb8(canvas))
    }

    fn plain_background() -> RgbImage {
        let mut canvas = RgbImage::from_pixel(FLYER_WIDTH, FLYER_HEIGHT, WHITE);
        draw_filled_rect_mut(&mut canvas, Rect::at(0, 0).of_size(FLYER_WIDTH, 300), DARK_GREEN);
        draw_filled_rect_mut(&mut canvas, Rect::at(0, 300).of_size(FLYER_WIDTH, 12), LIGHT_GREEN);
        draw_filled_rect_mut(&mut canvas, Rect::at(0, FLYER_HEIGHT as i32 - 20).of_size(FLYER_WIDTH, 20), DARK_GREEN);
        canvas
    }

    fn draw_centered(&self, canvas: &mut RgbImage, text: &str, y: i32, size: f32, color: Rgb<u8>) {
        let scale = PxScale::from(size);
        let (width, _) = text_size(scale, &self.font, text);
        let x = (FLYER_WIDTH as i32 - width as i32).max(0) / 2;
        draw_text_mut(canvas, color, x, y, scale, &self.font, text);
    }
}
