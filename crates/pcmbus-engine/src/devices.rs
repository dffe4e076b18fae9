use anyhow::Result;
use cpal::traits::{DeviceTrait, HostTrait};

#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub index: usize,
    pub name: String,
    pub is_default: bool,
    /// Highest channel count among the supported output configs.
    pub max_channels: u16,
}

pub fn list_devices() -> Result<Vec<DeviceInfo>> {
    let host = cpal::default_host();
    let default_out = host.default_output_device().map(|d| d.name().unwrap_or_default());

    let mut out = Vec::new();
    for (index, dev) in host.output_devices()?.enumerate() {
        let name = dev.name().unwrap_or_else(|_| "<unknown>".to_string());
        let is_default = default_out.as_ref().map(|n| n == &name).unwrap_or(false);
        let max_channels = dev
            .supported_output_configs()
            .map(|cfgs| cfgs.map(|c| c.channels()).max().unwrap_or(0))
            .unwrap_or(0);
        out.push(DeviceInfo { index, name, is_default, max_channels });
    }
    Ok(out)
}

/// Pretty-print for CLI
pub fn print_devices() -> Result<()> {
    let list = list_devices()?;
    if list.is_empty() {
        println!("(no output devices found)");
        return Ok(());
    }
    for d in &list {
        let mark = if d.is_default { "[*] " } else { "    " };
        println!("{mark}{:>2}  {}  ({} ch max)", d.index, d.name, d.max_channels);
    }
    Ok(())
}

/// Output device by index (as listed by [`list_devices`]), then by
/// case-insensitive name substring, then the host default.
pub fn pick_output_device(
    host: &cpal::Host,
    name_substr: Option<&str>,
    index: Option<usize>,
) -> Result<Option<cpal::Device>> {
    if let Some(idx) = index {
        if let Some(dev) = host.output_devices()?.nth(idx) {
            return Ok(Some(dev));
        }
        // fallthrough to name/default if index not found
    }

    if let Some(q) = name_substr {
        let qn = q.to_lowercase();
        for dev in host.output_devices()? {
            let name = dev.name().unwrap_or_default();
            if name.to_lowercase().contains(&qn) {
                return Ok(Some(dev));
            }
        }
    }

    Ok(host.default_output_device())
}
