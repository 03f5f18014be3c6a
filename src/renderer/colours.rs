use image::Rgba;

pub(crate) struct Colours {
    pub background: Rgba<u8>,
    pub grid: Rgba<u8>,
    pub frame: Rgba<u8>,
    pub battery: Rgba<u8>,
    pub cpu: Rgba<u8>,
    pub temperature: Rgba<u8>,
    pub power: Rgba<u8>,
}

impl Default for Colours {
    fn default() -> Self {
        Self {
            background: Rgba([0, 0, 0, 255]),
            grid: Rgba([60, 60, 60, 255]),
            frame: Rgba([100, 100, 100, 255]),
            battery: Rgba([87, 174, 36, 255]),      // Vibrant green
            cpu: Rgba([114, 159, 207, 255]),        // Steel blue
            temperature: Rgba([245, 121, 0, 255]),  // Burnt orange
            power: Rgba([237, 212, 0, 255]),        // Golden yellow
        }
    }
}
