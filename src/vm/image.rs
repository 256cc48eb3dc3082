//! Imagen binaria de memoria.
//!
//! Una imagen consiste en un encabezado mágico de 4 bytes seguido de
//! 512 bytes de datos y código. El encabezado se valida pero no se
//! carga: las direcciones `0..4` de la memoria quedan en cero.

use std::{fs, path::Path};

use thiserror::Error;
use tracing::warn;

/// Encabezado que identifica una imagen válida.
pub const HEADER: [u8; HEADER_SIZE] = [0x03, 0x4E, 0x44, 0x52];

pub const HEADER_SIZE: usize = 4;

/// Tamaño total de la memoria direccionable, incluyendo la zona del encabezado.
pub const MEMORY_SIZE: usize = 516;

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    #[error("Bad image header {0:02x?}")]
    BadHeader(Vec<u8>),
}

/// Contenido de memoria listo para ejecutarse.
pub struct Image {
    memory: [u8; MEMORY_SIZE],
}

impl Image {
    /// Valida el encabezado y dispone el cuerpo en memoria.
    ///
    /// Una imagen corta se completa con ceros y los bytes excedentes se
    /// ignoran; ambos casos solo generan una advertencia.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ImageError> {
        let header = &bytes[..bytes.len().min(HEADER_SIZE)];
        if header != HEADER {
            return Err(ImageError::BadHeader(header.to_vec()));
        }

        if bytes.len() != MEMORY_SIZE {
            warn!(
                size = bytes.len(),
                expected = MEMORY_SIZE,
                "image size mismatch"
            );
        }

        let body = &bytes[HEADER_SIZE..bytes.len().min(MEMORY_SIZE)];
        let mut memory = [0; MEMORY_SIZE];
        memory[HEADER_SIZE..HEADER_SIZE + body.len()].copy_from_slice(body);

        Ok(Image { memory })
    }

    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, ImageError> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    pub fn memory(&self) -> &[u8; MEMORY_SIZE] {
        &self.memory
    }
}
