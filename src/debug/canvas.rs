use std::fmt;

/// Width of one cell in characters.
pub const CELL_WIDTH: usize = 8;

/// Text rows per tree level: three label rows and a spacer.
pub const ROWS_PER_LEVEL: usize = 4;

/// A character grid for drawing a tree one labelled cell per node.
///
/// Cells are addressed by `(x, y)` with `x` the column and `y` the level.
/// Each level holds [`ROWS_PER_LEVEL`] text rows; `row` picks one of the
/// first three.
#[derive(Debug, Clone)]
pub struct Canvas {
    columns: usize,
    levels: usize,
    chars: Vec<char>,
}

impl Canvas {
    /// Creates a blank canvas of `columns` by `levels` cells.
    #[must_use]
    pub fn new(columns: usize, levels: usize) -> Self {
        Self {
            columns,
            levels,
            chars: vec![' '; columns * CELL_WIDTH * levels * ROWS_PER_LEVEL],
        }
    }

    /// Number of cell columns.
    #[must_use]
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Number of cell levels.
    #[must_use]
    pub fn levels(&self) -> usize {
        self.levels
    }

    fn line_width(&self) -> usize {
        self.columns * CELL_WIDTH
    }

    /// Writes `label` into row `row` of cell `(x, y)`.
    ///
    /// Labels are truncated to the cell width less one separator column.
    /// Draws outside the grid are ignored.
    pub fn draw(&mut self, x: usize, y: usize, label: impl fmt::Display, row: usize) {
        if x >= self.columns || y >= self.levels || row + 1 >= ROWS_PER_LEVEL {
            tracing::warn!(x, y, row, columns = self.columns, levels = self.levels, "draw outside canvas");
            return;
        }
        let line = y * ROWS_PER_LEVEL + row;
        let start = line * self.line_width() + x * CELL_WIDTH;
        for (offset, c) in label.to_string().chars().take(CELL_WIDTH - 1).enumerate() {
            self.chars[start + offset] = c;
        }
    }

    /// Blanks every cell.
    pub fn clear(&mut self) {
        self.chars.fill(' ');
    }

    /// Emits the rendered canvas as one log event.
    pub fn print(&self) {
        tracing::info!("\n{self}");
    }
}

impl fmt::Display for Canvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.line_width();
        if width == 0 {
            return Ok(());
        }
        for line in self.chars.chunks(width) {
            let text: String = line.iter().collect();
            writeln!(f, "{}", text.trim_end())?;
        }
        Ok(())
    }
}
