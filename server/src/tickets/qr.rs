use qrcode::{Color, EcLevel, QrCode};

use super::TicketError;

/// Light modules required around the code when printed.
pub const QUIET_ZONE: usize = 4;

/// Square module grid of an encoded QR code, row-major, `true` = dark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrMatrix {
    width: usize,
    modules: Vec<bool>,
}

impl QrMatrix {
    /// Encodes `payload` at error-correction level H.
    pub fn encode(payload: &str) -> Result<Self, TicketError> {
        let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::H)
            .map_err(|e| TicketError::Qr(e.to_string()))?;

        Ok(Self {
            width: code.width(),
            modules: code.to_colors().into_iter().map(|c| c == Color::Dark).collect(),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Width including the quiet zone on both sides.
    pub fn padded_width(&self) -> usize {
        self.width + 2 * QUIET_ZONE
    }

    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.width && self.modules.get(y * self.width + x) == Some(&true)
    }

    /// Dark modules as `(x, y)` coordinates.
    pub fn dark_modules(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.modules
            .iter()
            .enumerate()
            .filter(|(_, dark)| **dark)
            .map(|(i, _)| (i % self.width, i / self.width))
    }
}
