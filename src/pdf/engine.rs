//! Process-wide PDFium binding
//!
//! PDFium must be bound once before the first document is loaded. The
//! binding is installed lazily, lives for the rest of the process and is
//! shared by every extraction run. Installing again is a no-op.

use crate::error::{Error, Result};
use pdfium_render::prelude::*;
use std::sync::OnceLock;

static PDFIUM: OnceLock<Pdfium> = OnceLock::new();

/// Environment variable naming a directory that holds the PDFium library
pub const PDFIUM_DIR_ENV: &str = "PDFIUM_DYNAMIC_LIB_PATH";

fn bind_pdfium() -> Result<Pdfium> {
    let configured = std::env::var(PDFIUM_DIR_ENV).ok();

    let bindings = configured
        .as_deref()
        .map(|dir| Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir)))
        .unwrap_or_else(|| {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        })
        .or_else(|_| {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                "/opt/pdfium/lib",
            ))
        })
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| Error::EngineUnavailable {
            reason: format!("Failed to initialize PDFium: {}", e),
        })?;

    Ok(Pdfium::new(bindings))
}

/// Install the PDFium binding for this process and return it.
///
/// The first successful call binds the library; every later call returns
/// the same instance. A failed bind leaves nothing installed, so a later
/// call may retry.
pub fn install() -> Result<&'static Pdfium> {
    if let Some(pdfium) = PDFIUM.get() {
        return Ok(pdfium);
    }

    let pdfium = bind_pdfium()?;
    // Another thread may have won the race; its instance is kept and ours dropped.
    let installed = PDFIUM.get_or_init(|| pdfium);
    tracing::debug!("PDFium binding installed");
    Ok(installed)
}

/// Whether the binding has been installed in this process
pub fn is_installed() -> bool {
    PDFIUM.get().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_is_idempotent() {
        // Hosts without a PDFium library cannot bind; nothing is installed then.
        let Ok(first) = install() else {
            assert!(!is_installed());
            return;
        };
        let second = install().expect("second install");
        assert!(std::ptr::eq(first, second));
        assert!(is_installed());
    }
}
