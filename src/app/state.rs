//! Immutable per-tick snapshot of the car.

/// One raw camera frame, row-major `[height][width][channels]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub channels: u32,
    pub data: Vec<u8>,
}

impl Frame {
    pub fn new(width: u32, height: u32, channels: u32, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), (width * height * channels) as usize);
        Self {
            width,
            height,
            channels,
            data,
        }
    }

    /// `(height, width, channels)`, the shape learning code expects.
    pub fn shape(&self) -> (u32, u32, u32) {
        (self.height, self.width, self.channels)
    }
}

/// What the learning side sees each tick.  Distances are median-filtered
/// and in the sonars' output unit.
#[derive(Debug, Clone, PartialEq)]
pub struct CarState {
    pub steering: f64,
    pub throttle: f64,
    pub front_distance: f64,
    pub rear_distance: f64,
    pub frame: Frame,
}

impl CarState {
    /// `[steering, throttle, front_distance, rear_distance]`.
    pub fn sensors(&self) -> [f64; 4] {
        [
            self.steering,
            self.throttle,
            self.front_distance,
            self.rear_distance,
        ]
    }
}
