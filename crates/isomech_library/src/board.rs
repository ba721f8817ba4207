//! On-screen mirror of the pad grid and the light state machine of every pad.
//!
//! Each cell has two flags: `lit` (a note sounding there, what the screen draws) and `marked`
//! (the device light should show [`MARK_COLOR`]). A marked pad shows the mark color, any other
//! pad its steady color. Light changes queue up as [`LightUpdate`]s until the engine flushes them.

use crate::layout::LayoutState;
use crate::lights::{steady_color, LightColor, Palette, MARK_COLOR};
use crate::pitch::{matches, Pad};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightUpdate {
    pub pad: Pad,
    pub color: LightColor,
}

#[derive(Debug, Clone)]
pub struct Board {
    width: usize,
    height: usize,
    cells: Vec<bool>,
    marks: Vec<bool>,
    pending: Vec<LightUpdate>,
}

impl Board {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![false; width * height],
            marks: vec![false; width * height],
            pending: Vec::new(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Drop everything and take new dimensions.
    pub fn resize(&mut self, width: usize, height: usize) {
        *self = Self::new(width, height);
    }

    fn index(&self, pad: Pad) -> Option<usize> {
        (pad.col < self.width && pad.row < self.height).then(|| pad.row * self.width + pad.col)
    }

    pub fn is_lit(&self, pad: Pad) -> bool {
        self.index(pad).is_some_and(|i| self.cells[i])
    }

    pub fn is_marked(&self, pad: Pad) -> bool {
        self.index(pad).is_some_and(|i| self.marks[i])
    }

    pub fn lit_cells(&self) -> Vec<Pad> {
        self.pads().filter(|pad| self.is_lit(*pad)).collect()
    }

    pub fn pads(&self) -> impl Iterator<Item = Pad> + use<> {
        let (width, height) = (self.width, self.height);
        (0..height).flat_map(move |row| (0..width).map(move |col| Pad::new(col, row)))
    }

    /// Light or unlight every cell sounding `pitch`, optionally only on one row. A row off the
    /// board searches the whole board. With a palette the device lights follow. Returns the
    /// number of cells changed.
    pub fn mark(
        &mut self,
        pitch: i32,
        on: bool,
        only_row: Option<usize>,
        layout: &LayoutState,
        lights: Option<&Palette>,
    ) -> usize {
        let rows = match only_row {
            Some(row) if row < self.height => row..row + 1,
            _ => 0..self.height,
        };
        let mut changed = 0;
        for row in rows {
            for col in 0..self.width {
                let pad = Pad::new(col, row);
                if matches(pad, pitch, layout) && self.mark_cell(pad, on, layout, lights) {
                    changed += 1;
                }
            }
        }
        changed
    }

    /// Light or unlight one cell. Returns false for a cell off the board.
    pub fn mark_cell(
        &mut self,
        pad: Pad,
        on: bool,
        layout: &LayoutState,
        lights: Option<&Palette>,
    ) -> bool {
        let Some(i) = self.index(pad) else {
            return false;
        };
        self.cells[i] = on;
        if let Some(palette) = lights {
            if on {
                self.marks[i] = true;
                self.queue(pad, MARK_COLOR);
            } else {
                self.reset_light(pad, layout, palette);
            }
        }
        true
    }

    /// Put a pad back to its steady color.
    pub fn reset_light(&mut self, pad: Pad, layout: &LayoutState, palette: &Palette) {
        let Some(i) = self.index(pad) else {
            return;
        };
        self.marks[i] = false;
        self.queue(pad, steady_color(pad, layout, palette).light());
    }

    /// Unlight and unmark everything, optionally queueing the steady colors right away.
    pub fn clear_marks(&mut self, layout: &LayoutState, lights: Option<&Palette>) {
        self.cells.fill(false);
        self.marks.fill(false);
        if let Some(palette) = lights {
            for pad in self.pads() {
                self.reset_light(pad, layout, palette);
            }
        }
    }

    /// Queue a light for every pad.
    pub fn setup_lights(&mut self, layout: &LayoutState, palette: &Palette) {
        for pad in self.pads() {
            if self.is_marked(pad) {
                self.queue(pad, MARK_COLOR);
            } else {
                self.reset_light(pad, layout, palette);
            }
        }
    }

    /// Move the cell contents `delta` columns to the left (negative: right). Columns pushed off
    /// the edge are lost, the trailing edge fills with empty cells.
    pub fn shift(&mut self, delta: i32) {
        let steps = delta.unsigned_abs() as usize;
        for _ in 0..steps {
            for flags in [&mut self.cells, &mut self.marks] {
                for row in flags.chunks_mut(self.width) {
                    if delta > 0 {
                        row.rotate_left(1);
                        row[self.width - 1] = false;
                    } else {
                        row.rotate_right(1);
                        row[0] = false;
                    }
                }
            }
        }
    }

    fn queue(&mut self, pad: Pad, color: LightColor) {
        self.pending.push(LightUpdate { pad, color });
    }

    pub fn take_pending(&mut self) -> Vec<LightUpdate> {
        std::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::BoardSize;
    use crate::pitch::absolute_pitch;
    use crate::scales::ScaleDb;

    fn setup() -> (Board, LayoutState, Palette) {
        let layout = LayoutState::new(BoardSize::Small, false, ScaleDb::builtin().select(0, 0));
        (Board::new(16, 8), layout, Palette::default())
    }

    #[test]
    fn mark_lights_every_cell_of_the_pitch() {
        let (mut board, layout, _) = setup();
        let pitch = absolute_pitch(Pad::new(7, 4), &layout);
        let changed = board.mark(pitch, true, None, &layout, None);
        // the same pitch sits 5 columns left and 2 rows up
        assert_eq!(changed, 2);
        assert!(board.is_lit(Pad::new(7, 4)));
        assert!(board.is_lit(Pad::new(2, 2)));
        assert!(board.take_pending().is_empty());

        assert_eq!(board.mark(pitch, false, None, &layout, None), 2);
        assert!(board.lit_cells().is_empty());
    }

    #[test]
    fn mark_restricted_to_a_row() {
        let (mut board, layout, _) = setup();
        let pitch = absolute_pitch(Pad::new(7, 4), &layout);
        assert_eq!(board.mark(pitch, true, Some(4), &layout, None), 1);
        assert_eq!(board.lit_cells(), vec![Pad::new(7, 4)]);
        // a row off the board falls back to the whole board
        assert_eq!(board.mark(pitch, true, Some(42), &layout, None), 2);
    }

    #[test]
    fn marking_with_lights_queues_mark_then_steady() {
        let (mut board, layout, palette) = setup();
        let pad = Pad::new(2, 7);
        assert!(board.mark_cell(pad, true, &layout, Some(&palette)));
        assert!(board.is_marked(pad));
        assert!(board.mark_cell(pad, false, &layout, Some(&palette)));
        assert!(!board.is_marked(pad));
        assert_eq!(
            board.take_pending(),
            vec![
                LightUpdate { pad, color: MARK_COLOR },
                LightUpdate { pad, color: LightColor::Cyan },
            ]
        );
        assert!(!board.mark_cell(Pad::new(16, 0), true, &layout, Some(&palette)));
    }

    #[test]
    fn setup_lights_covers_every_pad() {
        let (mut board, layout, palette) = setup();
        board.mark_cell(Pad::new(0, 0), true, &layout, Some(&palette));
        board.take_pending();
        board.setup_lights(&layout, &palette);
        let lights = board.take_pending();
        assert_eq!(lights.len(), 16 * 8);
        assert_eq!(lights[0].color, MARK_COLOR);
        assert!(lights[1..].iter().all(|l| l.color != MARK_COLOR));
    }

    #[test]
    fn clear_marks_resets_both_layers() {
        let (mut board, layout, palette) = setup();
        board.mark_cell(Pad::new(3, 3), true, &layout, Some(&palette));
        board.mark_cell(Pad::new(4, 3), true, &layout, None);
        board.take_pending();
        board.clear_marks(&layout, None);
        assert!(board.lit_cells().is_empty());
        assert!(!board.is_marked(Pad::new(3, 3)));
        assert!(board.take_pending().is_empty());
    }

    #[test]
    fn shift_moves_columns_and_pads_the_edge() {
        let (mut board, layout, _) = setup();
        board.mark_cell(Pad::new(0, 1), true, &layout, None);
        board.mark_cell(Pad::new(5, 1), true, &layout, None);
        board.mark_cell(Pad::new(15, 6), true, &layout, None);

        board.shift(1);
        assert_eq!(board.lit_cells(), vec![Pad::new(4, 1), Pad::new(14, 6)]);
        board.shift(-1);
        assert_eq!(board.lit_cells(), vec![Pad::new(5, 1), Pad::new(15, 6)]);
        board.shift(-2);
        assert_eq!(board.lit_cells(), vec![Pad::new(7, 1)]);
    }
}
