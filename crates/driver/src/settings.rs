use isomech_library::lights::Palette;
use isomech_library::{
    BoardSize, ChannelMode, EngineOptions, Error, Scale, ScaleDb, SustainSplit, VelocityCurve,
};
use serde::Deserialize;

#[derive(Deserialize, Debug)]
#[serde(default)]
pub(crate) struct Settings {
    /// Pad count of the controller: 128 or 200.
    pub size: u32,
    /// Use the controller's own left/right split instead of the diagonal one.
    pub hardware_split: bool,
    /// 0 keeps one channel per note, 1-16 sends everything on that channel.
    pub one_channel: u8,
    pub velocity_curve: f32,
    /// Curve with the right expression pedal fully down.
    pub velocity_curve_low: f32,
    /// Curve with the right expression pedal released.
    pub velocity_curve_high: f32,
    pub min_velocity: u8,
    pub max_velocity: u8,
    /// Light color per scale degree (tonic first), indices 0-11.
    pub lights: Vec<u8>,
    pub split_lights: Vec<u8>,
    /// Start with the split on.
    pub split: bool,
    /// Where sustain goes while split: "left", "right" or "both".
    pub sustain_split: String,
    pub stable_left: bool,
    pub stable_right: bool,
    pub jazz: bool,
    pub chord_analyzer: bool,
    pub octave: i32,
    pub visualizer_octave: i32,
    pub fps: u32,
    pub client_name: String,
    /// Substring of the controller's port names.
    pub device_name: String,
    pub midi_out: String,
    pub split_out: String,
    pub visualizer_in: String,
    pub foot_in: String,
    /// Substring of the 8x8 grid controller's input port name.
    pub grid_in: String,
    /// Sweep colors across the pads at startup.
    pub self_test: bool,
    pub debug: bool,
    /// Replaces the built-in scale list when not empty.
    pub scales: Vec<Scale>,
}

impl Default for Settings {
    fn default() -> Self {
        let curve = VelocityCurve::default();
        Self {
            size: 128,
            hardware_split: false,
            one_channel: 0,
            velocity_curve: curve.curve,
            velocity_curve_low: curve.low,
            velocity_curve_high: curve.high,
            min_velocity: curve.min,
            max_velocity: curve.max,
            lights: vec![4, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3],
            split_lights: vec![4, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5],
            split: false,
            sustain_split: "both".to_string(),
            stable_left: false,
            stable_right: false,
            jazz: false,
            chord_analyzer: false,
            octave: 0,
            visualizer_octave: 0,
            fps: 60,
            client_name: "isomech".to_string(),
            device_name: "linnstrument".to_string(),
            midi_out: "isomech".to_string(),
            split_out: "split".to_string(),
            visualizer_in: "visualizer".to_string(),
            foot_in: "".to_string(),
            grid_in: "launchpad".to_string(),
            self_test: false,
            debug: false,
            scales: Vec::new(),
        }
    }
}

impl Settings {
    /// Check the raw values and turn them into engine options.
    pub(crate) fn validate(&self) -> Result<(EngineOptions, ScaleDb), Error> {
        if self.fps == 0 {
            return Err(Error::InvalidConfig("fps must be at least 1".to_string()));
        }

        if self.client_name.is_empty() {
            return Err(Error::InvalidConfig(
                "Client name must not be empty".to_string(),
            ));
        }

        if self.midi_out.is_empty() {
            return Err(Error::InvalidConfig(
                "midi_out must name an output port".to_string(),
            ));
        }

        let size = BoardSize::from_pad_count(self.size)?;
        let velocity = VelocityCurve {
            curve: self.velocity_curve,
            low: self.velocity_curve_low,
            high: self.velocity_curve_high,
            min: self.min_velocity,
            max: self.max_velocity,
        };
        velocity.validate()?;

        let scales = if self.scales.is_empty() {
            ScaleDb::builtin()
        } else {
            ScaleDb::new(self.scales.clone())?
        };

        let options = EngineOptions {
            size,
            hardware_split: self.hardware_split,
            channel_mode: ChannelMode::from_one_channel(self.one_channel)?,
            velocity,
            palette: Palette::from_indices(&self.lights, &self.split_lights)?,
            split: self.split,
            sustain_split: self.sustain_split.parse::<SustainSplit>()?,
            jazz: self.jazz,
            chord_analyzer: self.chord_analyzer,
            stable_left: self.stable_left,
            stable_right: self.stable_right,
            octave: self.octave,
            visualizer_octave: self.visualizer_octave,
        };
        Ok((options, scales))
    }
}
