/// A temperature input found under a hwmon device directory.
#[derive(Debug, Clone, Default)]
pub struct Sensor {
    pub id: u32,
    /// Device name from the `name` file, e.g. `coretemp` or `BAT0`.
    pub name: String,
    pub label: String,
    pub temperature: f32,
}
