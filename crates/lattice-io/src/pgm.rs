//! Binary (P5) PGM encoding and decoding for world grids.
//!
//! The format is the raw-greymap subset the controller needs: magic `P5`,
//! ASCII width/height/maxval separated by whitespace (with `#` comments
//! allowed in the header), a single whitespace byte, then `height * width`
//! raster bytes row-major. Maxval is always 255 so cell bytes map directly
//! onto the grid's dead/alive values, and an encode followed by a decode
//! reproduces the grid bit-for-bit.

use lattice_types::{World, WorldError};

/// Errors raised while encoding or decoding PGM data.
#[derive(Debug, thiserror::Error)]
pub enum PgmError {
    /// The magic number was not `P5`.
    #[error("unsupported magic {magic:?}, expected P5")]
    UnsupportedMagic {
        /// The magic token found.
        magic: String,
    },

    /// The header ended early or contained a malformed field.
    #[error("malformed header: {message}")]
    MalformedHeader {
        /// What was wrong.
        message: String,
    },

    /// The maxval was not 255.
    #[error("unsupported maxval {maxval}, expected 255")]
    UnsupportedMaxval {
        /// The maxval found.
        maxval: usize,
    },

    /// The raster did not contain a legal grid.
    #[error("bad raster: {source}")]
    Raster {
        /// The underlying grid validation error.
        #[from]
        source: WorldError,
    },
}

/// Encode a world as P5 PGM bytes.
pub fn encode(world: &World) -> Vec<u8> {
    let header = format!("P5\n{} {}\n255\n", world.width(), world.height());
    let mut bytes = Vec::with_capacity(header.len().saturating_add(world.cells().len()));
    bytes.extend_from_slice(header.as_bytes());
    bytes.extend_from_slice(world.cells());
    bytes
}

/// Decode P5 PGM bytes into a world.
///
/// # Errors
///
/// Returns [`PgmError`] if the magic, header, maxval, or raster is not a
/// well-formed grid image.
pub fn decode(bytes: &[u8]) -> Result<World, PgmError> {
    let mut cursor = Cursor::new(bytes);

    let magic = cursor.token()?;
    if magic != "P5" {
        return Err(PgmError::UnsupportedMagic { magic });
    }

    let width = cursor.dimension("width")?;
    let height = cursor.dimension("height")?;

    let maxval = cursor.dimension("maxval")?;
    if maxval != 255 {
        return Err(PgmError::UnsupportedMaxval { maxval });
    }

    // Exactly one whitespace byte separates the header from the raster.
    match cursor.next_byte() {
        Some(byte) if byte.is_ascii_whitespace() => {}
        _ => {
            return Err(PgmError::MalformedHeader {
                message: String::from("missing separator before raster"),
            });
        }
    }

    let raster = cursor.rest().to_vec();
    let world = World::from_cells(height, width, raster)?;
    Ok(world)
}

/// Byte-wise reader over the PGM header.
struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn next_byte(&mut self) -> Option<u8> {
        let byte = self.peek();
        if byte.is_some() {
            self.pos = self.pos.saturating_add(1);
        }
        byte
    }

    /// Skip whitespace and `#`-to-end-of-line comments.
    fn skip_separators(&mut self) {
        while let Some(byte) = self.peek() {
            if byte.is_ascii_whitespace() {
                self.pos = self.pos.saturating_add(1);
            } else if byte == b'#' {
                while let Some(inner) = self.next_byte() {
                    if inner == b'\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    /// Read the next whitespace-delimited header token.
    fn token(&mut self) -> Result<String, PgmError> {
        self.skip_separators();
        let mut token = Vec::new();
        while let Some(byte) = self.peek() {
            if byte.is_ascii_whitespace() {
                break;
            }
            token.push(byte);
            self.pos = self.pos.saturating_add(1);
        }
        if token.is_empty() {
            return Err(PgmError::MalformedHeader {
                message: String::from("unexpected end of header"),
            });
        }
        String::from_utf8(token).map_err(|_| PgmError::MalformedHeader {
            message: String::from("non-ASCII header token"),
        })
    }

    /// Read a numeric header field.
    fn dimension(&mut self, field: &str) -> Result<usize, PgmError> {
        let token = self.token()?;
        token.parse().map_err(|_| PgmError::MalformedHeader {
            message: format!("{field} is not a number: {token:?}"),
        })
    }

    /// The unread remainder of the input.
    fn rest(&self) -> &'a [u8] {
        self.bytes.get(self.pos..).unwrap_or(&[])
    }
}
