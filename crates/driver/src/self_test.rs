use crate::ports::Outputs;
use isomech_library::board::LightUpdate;
use isomech_library::device;
use isomech_library::lights::LightColor;
use isomech_library::{BoardSize, Outgoing, Pad};
use std::{thread, time};

const RAINBOW: [LightColor; 10] = [
    LightColor::Red,
    LightColor::Orange,
    LightColor::Yellow,
    LightColor::Lime,
    LightColor::Green,
    LightColor::Cyan,
    LightColor::Blue,
    LightColor::Magenta,
    LightColor::Pink,
    LightColor::White,
];

/// One frame of the diagonal rainbow wave.
pub(crate) fn wave_frame(size: BoardSize, height: usize, frame: usize) -> Vec<Outgoing> {
    let mut out = Vec::new();
    for row in 0..height {
        for col in 0..size.width() {
            let color = RAINBOW[(col + row + frame * 2) % RAINBOW.len()];
            let update = LightUpdate {
                pad: Pad::new(col, row),
                color,
            };
            out.extend(device::light(update, height));
        }
    }
    out
}

/// Sweep colors across the pads, then hand them back to the device.
pub(crate) fn self_test(outputs: &mut Outputs, size: BoardSize, height: usize) {
    for frame in 0..8 {
        outputs.send_all(&wave_frame(size, height, frame));
        thread::sleep(time::Duration::from_millis(50));
    }

    // Final flash, all pads white
    let flash: Vec<Outgoing> = (0..height)
        .flat_map(|row| (0..size.width()).map(move |col| (col, row)))
        .flat_map(|(col, row)| device::raw_light((col + 1) as u8, row as u8, LightColor::White))
        .collect();
    outputs.send_all(&flash);
    thread::sleep(time::Duration::from_millis(200));

    outputs.send_all(&device::reset_lights(size.width(), height));
}

#[cfg(test)]
mod tests {
    use super::*;
    use isomech_library::device::CC_COLOR;
    use isomech_library::Port;

    #[test]
    fn wave_lights_every_pad_once() {
        let frame = wave_frame(BoardSize::Small, 8, 0);
        assert_eq!(frame.len(), 16 * 8 * 3);
        assert!(frame.iter().all(|m| m.port() == Some(Port::Device)));
    }

    #[test]
    fn wave_moves_between_frames() {
        let color = |frame: usize| {
            wave_frame(BoardSize::Small, 8, frame)
                .iter()
                .filter_map(|m| m.bytes())
                .find(|b| b[1] == CC_COLOR)
                .map(|b| b[2])
        };
        assert_ne!(color(0), color(1));
    }
}
