/// 1 pt = 1/72 inch
pub const POINTS_PER_INCH: f64 = 72.0;

/// Axis-aligned rectangle in page points, origin at the bottom-left corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Fixed-size cells laid out in rows and columns on one page.
///
/// All lengths are in points. Row 0 is the top row, so rows grow downward
/// while page y coordinates grow upward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    pub page_width: f64,
    pub page_height: f64,
    pub cell_width: f64,
    pub cell_height: f64,
    pub margin: f64,
    pub rows: u32,
    pub cols: u32,
}

impl GridGeometry {
    pub fn new(
        page_size_pt: (f64, f64),
        cell_width_in: f64,
        cell_height_in: f64,
        margin_in: f64,
        rows: u32,
        cols: u32,
    ) -> Self {
        Self {
            page_width: page_size_pt.0,
            page_height: page_size_pt.1,
            cell_width: cell_width_in * POINTS_PER_INCH,
            cell_height: cell_height_in * POINTS_PER_INCH,
            margin: margin_in * POINTS_PER_INCH,
            rows,
            cols,
        }
    }

    /// Width of all columns plus a margin on either side of each
    pub fn total_width(&self) -> f64 {
        self.cols as f64 * self.cell_width + (self.cols as f64 + 1.0) * self.margin
    }

    pub fn total_height(&self) -> f64 {
        self.rows as f64 * self.cell_height + (self.rows as f64 + 1.0) * self.margin
    }

    /// Whether the whole grid fits on the page
    pub fn fits(&self) -> bool {
        self.total_width() <= self.page_width && self.total_height() <= self.page_height
    }

    pub fn per_page(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    /// Row-major cell of the `index`-th image on a page
    pub fn cell_for_index(&self, index: usize) -> (u32, u32) {
        let cols = self.cols.max(1) as usize;
        ((index / cols) as u32, (index % cols) as u32)
    }

    /// Bottom-left corner of a cell
    pub fn cell_origin(&self, row: u32, col: u32) -> (f64, f64) {
        let x = self.margin + col as f64 * (self.cell_width + self.margin);
        let y = self.page_height - (row as f64 + 1.0) * (self.cell_height + self.margin);
        (x, y)
    }

    /// Where an image of `width_px` x `height_px` rendered at `dpi` is drawn
    /// so that it sits centered in its cell.
    pub fn place(&self, row: u32, col: u32, width_px: u32, height_px: u32, dpi: u32) -> Rect {
        let (cell_x, cell_y) = self.cell_origin(row, col);
        let width = width_px as f64 * POINTS_PER_INCH / dpi as f64;
        let height = height_px as f64 * POINTS_PER_INCH / dpi as f64;

        Rect {
            x: cell_x + (self.cell_width - width) / 2.0,
            y: cell_y + (self.cell_height - height) / 2.0,
            width,
            height,
        }
    }
}

/// Number of pages needed for `images` with `per_page` images each
pub fn page_count(images: usize, per_page: usize) -> usize {
    if per_page == 0 {
        0
    } else {
        images.div_ceil(per_page)
    }
}

/// Split `items` into consecutive pages of `rows * cols`, keeping their order
pub fn paginate<T>(items: &[T], rows: u32, cols: u32) -> std::slice::Chunks<'_, T> {
    let per_page = (rows as usize * cols as usize).max(1);
    items.chunks(per_page)
}
