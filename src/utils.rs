//! Directory management and system integration
//!
//! Follows the XDG Base Directory specification for saved configurations:
//! data lives under `~/.local/share/nftgrid/`.

use directories::ProjectDirs;
use network_interface::{NetworkInterface, NetworkInterfaceConfig};
use std::path::PathBuf;

use crate::core::error::{Error, Result};

pub fn get_data_dir() -> Option<PathBuf> {
    ProjectDirs::from("com", "nftgrid", "nftgrid").map(|pd| pd.data_dir().to_path_buf())
}

pub fn ensure_dirs() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::fs::DirBuilder;
        use std::os::unix::fs::DirBuilderExt;

        let mut builder = DirBuilder::new();
        builder.mode(0o700); // User read/write/execute only
        builder.recursive(true);

        if let Some(dir) = get_data_dir() {
            builder.create(dir)?;
        }
    }

    #[cfg(not(unix))]
    {
        if let Some(dir) = get_data_dir() {
            std::fs::create_dir_all(dir)?;
        }
    }

    Ok(())
}

/// One live interface as reported by the operating system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedInterface {
    pub name: String,
    /// Space-joined address list, display only
    pub addresses: String,
    pub loopback: bool,
}

/// Lists the system's network interfaces.
///
/// # Errors
///
/// Returns `Err` if the platform interface enumeration fails.
pub fn detect_interfaces() -> Result<Vec<DetectedInterface>> {
    let interfaces =
        NetworkInterface::show().map_err(|e| Error::Internal(format!("interface listing: {e}")))?;

    let mut detected = Vec::with_capacity(interfaces.len());
    for itf in interfaces {
        let addresses: Vec<String> = itf.addr.iter().map(|a| a.ip().to_string()).collect();
        let loopback = itf.addr.iter().any(|a| a.ip().is_loopback());
        detected.push(DetectedInterface {
            name: itf.name,
            addresses: addresses.join(" "),
            loopback,
        });
    }
    Ok(detected)
}

/// Kernel names of the live interfaces, for the existence check.
pub fn system_interface_names() -> Result<Vec<String>> {
    Ok(detect_interfaces()?
        .into_iter()
        .map(|itf| itf.name)
        .collect())
}
