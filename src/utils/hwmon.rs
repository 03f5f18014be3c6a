use std::fs::{read_dir, File};
use std::io::Read;
use std::path::Path;
use walkdir::WalkDir;

use crate::models::sensor::Sensor;
use crate::utils::file::get_file_line;

/// Every temperature input under `root` (normally `/sys/class/hwmon`), in
/// device then input order.
pub fn scan(root: &Path) -> Vec<Sensor> {
    let mut devices: Vec<_> = WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .flatten()
        .map(|entry| entry.into_path())
        .collect();
    devices.sort();

    let mut sensors = Vec::new();
    for device in devices {
        from_hwmon(&mut sensors, &device);
    }
    sensors
}

/// Reads the `tempN_input` files of one hwmon device folder into `sensors`.
///
/// - Mandatory: `name` of the device.
/// - Mandatory: `tempN_input`, the reading is dropped if missing.
/// - Optional: `tempN_label`.
///
/// Kernel hwmon API: https://www.kernel.org/doc/html/latest/hwmon/hwmon-kernel-api.html
pub fn from_hwmon(sensors: &mut Vec<Sensor>, folder: &Path) -> Option<()> {
    let dir = read_dir(folder).ok()?;
    let name = get_file_line(&folder.join("name"), 16).unwrap_or_default();

    let mut found = Vec::new();
    for entry in dir.flatten() {
        if !entry.file_type().is_ok_and(|file_type| !file_type.is_dir()) {
            continue;
        }

        let entry = entry.path();
        let filename = entry.file_name().and_then(|x| x.to_str()).unwrap_or("");
        let Some(id) = filename
            .strip_prefix("temp")
            .and_then(|f| f.strip_suffix("_input"))
            .and_then(|id| id.parse::<u32>().ok())
        else {
            continue;
        };

        let Some(temperature) = get_temperature_from_file(&entry) else {
            continue;
        };
        let label = get_file_line(&folder.join(format!("temp{id}_label")), 16).unwrap_or_default();
        found.push(Sensor {
            id,
            name: name.clone(),
            label,
            temperature,
        });
    }

    found.sort_by_key(|sensor| sensor.id);
    sensors.extend(found);
    Some(())
}

/// Designed at first for reading an `i32` or `u32` aka `c_long`
/// from a `/sys/class/hwmon` sysfs file.
pub fn read_number_from_file<N>(file: &Path) -> Option<N>
where
    N: std::str::FromStr,
{
    let mut reader = [0u8; 32];
    let mut f = File::open(file).ok()?;
    let n = f.read(&mut reader).ok()?;
    // parse and trim would complain about `\0`.
    let number = &reader[..n];
    let number = std::str::from_utf8(number).ok()?;
    number.trim().parse().ok()
}

// Read a temperature from a `tempN_input` sensor file; the kernel reports
// milli-celsius.
#[inline]
fn get_temperature_from_file(file: &Path) -> Option<f32> {
    read_number_from_file::<i32>(file).map(|n| (n as f32) / 1000f32)
}
