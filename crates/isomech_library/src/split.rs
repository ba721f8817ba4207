//! Diagonal keyboard split.
//!
//! The boundary leans right as it goes up: every two rows move it one column, which keeps the
//! split between the same pitch classes on a whole tone grid.

use crate::layout::LayoutState;
use crate::outbox::Port;
use crate::pitch::{effective_row, Pad};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    /// Left of the diagonal, the main output.
    Main,
    /// Right of the diagonal, the split output.
    Split,
}

impl Region {
    pub fn index(self) -> usize {
        match self {
            Region::Main => 0,
            Region::Split => 1,
        }
    }

    pub fn port(self) -> Port {
        match self {
            Region::Main => Port::Main,
            Region::Split => Port::Split,
        }
    }
}

/// Side of the diagonal, regardless of whether the split is on.
pub fn side(pad: Pad, layout: &LayoutState) -> Region {
    let row = effective_row(pad, layout);
    let adjusted = pad.col as i32 + 1 - (row + 1) / 2;
    if adjusted >= (layout.width() / 2) as i32 {
        Region::Split
    } else {
        Region::Main
    }
}

/// Output region for a pad: its side while the split is on, otherwise main.
pub fn region(pad: Pad, layout: &LayoutState) -> Region {
    if layout.split_enabled() {
        side(pad, layout)
    } else {
        Region::Main
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::BoardSize;
    use crate::scales::ScaleSelection;

    fn layout(split: bool) -> LayoutState {
        let mut layout = LayoutState::new(BoardSize::Small, false, ScaleSelection::chromatic());
        layout.set_split(split);
        layout
    }

    #[test]
    fn boundary_on_the_bottom_row() {
        let layout = layout(true);
        assert_eq!(region(Pad::new(6, 7), &layout), Region::Main);
        assert_eq!(region(Pad::new(7, 7), &layout), Region::Split);
    }

    #[test]
    fn boundary_leans_right_going_up() {
        let layout = layout(true);
        // effective rows 1 and 2 move the boundary one column
        assert_eq!(region(Pad::new(7, 6), &layout), Region::Main);
        assert_eq!(region(Pad::new(8, 6), &layout), Region::Split);
        assert_eq!(region(Pad::new(7, 5), &layout), Region::Main);
        // top row, effective row 7
        assert_eq!(region(Pad::new(10, 0), &layout), Region::Main);
        assert_eq!(region(Pad::new(11, 0), &layout), Region::Split);
    }

    #[test]
    fn disabled_split_routes_to_main_but_side_still_resolves() {
        let layout = layout(false);
        let pad = Pad::new(15, 7);
        assert_eq!(region(pad, &layout), Region::Main);
        assert_eq!(side(pad, &layout), Region::Split);
    }
}
