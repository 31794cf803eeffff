//! Win-line overlays: turns the server's winning line names into coloured
//! paths across the reel columns and marks the cells each line runs through.

use crate::{
    service::WinDetail,
    table::SharedTable,
};
use ratatui::style::Color;

/// Vertical step of the braille canvas the paths are drawn on, in terminal rows.
const BRAILLE_DOT: f64 = 0.25;

pub const LINE_PALETTE: [Color; 5] = [
    Color::Rgb(255, 0, 0),
    Color::Rgb(0, 255, 0),
    Color::Rgb(0, 136, 255),
    Color::Rgb(255, 255, 0),
    Color::Rgb(255, 0, 255),
];

/// A named row pattern, one row index per reel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Payline {
    pub name: &'static str,
    pub rows: Vec<usize>,
}

impl Payline {
    pub fn new(name: &'static str, rows: impl Into<Vec<usize>>) -> Self {
        Self {
            name,
            rows: rows.into(),
        }
    }

    pub fn straight(name: &'static str, row: usize, reel_count: usize) -> Self {
        Self::new(name, vec![row; reel_count])
    }
}

/// The five lines of the 5x3 machine.
pub fn grand_paylines() -> Vec<Payline> {
    vec![
        Payline::straight("Center", 1, 5),
        Payline::straight("Top", 0, 5),
        Payline::straight("Bottom", 2, 5),
        Payline::new("V-Shape", [0, 1, 2, 1, 0]),
        Payline::new("A-Shape", [2, 1, 0, 1, 2]),
    ]
}

/// The single line of the three-reel machine.
pub fn classic_paylines() -> Vec<Payline> {
    vec![Payline::straight("Center", 0, 3)]
}

/// Horizontal extent of one reel column, in layout units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColumnRect {
    pub left: f64,
    pub width: f64,
}

/// Screen geometry of the reel area, as last laid out by the renderer.
/// Units are terminal cells; `row_origin` is the y of the first visible row.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutGeometry {
    pub columns: Vec<ColumnRect>,
    pub row_origin: f64,
    pub cell_height: f64,
}

impl LayoutGeometry {
    /// Evenly spaced columns, used until the renderer reports real geometry.
    pub fn uniform(reel_count: usize, column_width: f64, cell_height: f64) -> Self {
        Self {
            columns: (0..reel_count)
                .map(|idx| ColumnRect {
                    left: idx as f64 * column_width,
                    width: column_width,
                })
                .collect(),
            row_origin: 0.0,
            cell_height,
        }
    }

    pub fn center_x(&self, reel: usize) -> Option<f64> {
        self.columns
            .get(reel)
            .map(|col| col.left + col.width / 2.0)
    }

    pub fn center_y(&self, row: usize) -> f64 {
        self.row_origin + row as f64 * self.cell_height + self.cell_height / 2.0
    }
}

/// A drawn win line.
#[derive(Clone, Debug, PartialEq)]
pub struct LinePath {
    pub name: String,
    pub color: Color,
    pub points: Vec<(f64, f64)>,
    /// Vertical shift keeping overlapping lines apart.
    pub offset_y: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HighlightedCell {
    pub reel: usize,
    /// Index into the settled strip, which keeps one hidden cell above the window.
    pub strip_index: usize,
    pub color: Color,
}

#[derive(Clone, Debug)]
pub struct WinLinePresenter {
    paylines: Vec<Payline>,
}

impl WinLinePresenter {
    pub fn new(paylines: Vec<Payline>) -> Self {
        Self { paylines }
    }

    pub fn payline(&self, name: &str) -> Option<&Payline> {
        self.paylines.iter().find(|line| line.name == name)
    }

    /// Draws every reported line onto the table and returns how many were drawn.
    /// Names without a known pattern are skipped.
    pub fn present(
        &self,
        table: &SharedTable,
        fallback: &LayoutGeometry,
        lines: &[WinDetail],
    ) -> usize {
        if lines.is_empty() {
            return 0;
        }
        let geometry = table
            .update(|state| state.layout.clone())
            .unwrap_or_else(|| fallback.clone());

        let mut paths = Vec::with_capacity(lines.len());
        let mut cells = Vec::new();
        for (idx, line) in lines.iter().enumerate() {
            let Some(payline) = self.payline(&line.name) else {
                tracing::warn!(name = %line.name, "unknown payline reported by server");
                continue;
            };
            let color = LINE_PALETTE[idx % LINE_PALETTE.len()];
            let points = payline
                .rows
                .iter()
                .enumerate()
                .filter_map(|(reel, row)| {
                    geometry.center_x(reel).map(|x| (x, geometry.center_y(*row)))
                })
                .collect();
            cells.extend(payline.rows.iter().enumerate().map(|(reel, row)| {
                HighlightedCell {
                    reel,
                    strip_index: row + 1,
                    color,
                }
            }));
            paths.push(LinePath {
                name: line.name.clone(),
                color,
                points,
                offset_y: path_offset(idx),
            });
        }

        let drawn = paths.len();
        table.update(|state| {
            state.win_lines = paths;
            // a later line recolours a shared cell
            for cell in cells {
                state
                    .highlights
                    .retain(|c| !(c.reel == cell.reel && c.strip_index == cell.strip_index));
                state.highlights.push(cell);
            }
        });
        tracing::debug!(drawn, "win lines presented");
        drawn
    }
}

/// Offsets are whole braille dots, the smallest step the canvas can show.
fn path_offset(line_index: usize) -> f64 {
    if line_index == 0 {
        return 0.0;
    }
    (line_index as f64 - 2.0) * BRAILLE_DOT
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use crate::table::TableState;

    fn table() -> SharedTable {
        SharedTable::new(TableState::new(Vec::new()))
    }

    fn geometry() -> LayoutGeometry {
        LayoutGeometry::uniform(5, 10.0, 120.0)
    }

    #[test]
    fn present__empty_list_is_a_noop() {
        // given
        let table = table();
        let presenter = WinLinePresenter::new(grand_paylines());

        // when
        let drawn = presenter.present(&table, &geometry(), &[]);

        // then
        assert_eq!(drawn, 0);
        let state = table.snapshot();
        assert!(state.win_lines.is_empty());
        assert!(state.highlights.is_empty());
    }

    #[test]
    fn present__v_shape_path_follows_the_rows() {
        // given
        let table = table();
        let presenter = WinLinePresenter::new(grand_paylines());

        // when
        presenter.present(&table, &geometry(), &[WinDetail::new("V-Shape", 3)]);

        // then
        let state = table.snapshot();
        let path = &state.win_lines[0];
        let ys: Vec<f64> = path.points.iter().map(|(_, y)| *y).collect();
        let xs: Vec<f64> = path.points.iter().map(|(x, _)| *x).collect();
        assert_eq!(ys, vec![60.0, 180.0, 300.0, 180.0, 60.0]);
        assert_eq!(xs, vec![5.0, 15.0, 25.0, 35.0, 45.0]);
        assert_eq!(path.color, LINE_PALETTE[0]);
        assert_eq!(path.offset_y, 0.0);
    }

    #[test]
    fn present__highlights_window_cells_below_the_hidden_row() {
        let table = table();
        let presenter = WinLinePresenter::new(grand_paylines());

        presenter.present(&table, &geometry(), &[WinDetail::new("Top", 5)]);

        let state = table.snapshot();
        assert_eq!(state.highlights.len(), 5);
        assert!(state.highlights.iter().all(|cell| cell.strip_index == 1));
    }

    #[test]
    fn present__lines_get_distinct_colours_and_offsets() {
        // given
        let table = table();
        let presenter = WinLinePresenter::new(grand_paylines());
        let lines = [
            WinDetail::new("Center", 3),
            WinDetail::new("Top", 4),
            WinDetail::new("Bottom", 5),
        ];

        // when
        presenter.present(&table, &geometry(), &lines);

        // then
        let state = table.snapshot();
        let colors: Vec<Color> = state.win_lines.iter().map(|l| l.color).collect();
        let offsets: Vec<f64> = state.win_lines.iter().map(|l| l.offset_y).collect();
        assert_eq!(colors, LINE_PALETTE[..3].to_vec());
        assert_eq!(offsets, vec![0.0, -0.25, 0.0]);
    }

    #[test]
    fn present__overlapping_lines_are_at_least_a_braille_dot_apart() {
        // given
        let table = table();
        let presenter = WinLinePresenter::new(grand_paylines());
        let lines = [WinDetail::new("Center", 5), WinDetail::new("V-Shape", 5)];

        // when
        presenter.present(&table, &geometry(), &lines);

        // then
        let state = table.snapshot();
        let gap = (state.win_lines[0].offset_y - state.win_lines[1].offset_y).abs();
        assert!(gap >= 0.25, "gap was {gap}");
    }

    #[test]
    fn present__palette_cycles_after_five_lines() {
        let table = table();
        let presenter = WinLinePresenter::new(grand_paylines());
        let lines: Vec<WinDetail> = ["Center", "Top", "Bottom", "V-Shape", "A-Shape", "Center"]
            .iter()
            .map(|name| WinDetail::new(*name, 3))
            .collect();

        presenter.present(&table, &geometry(), &lines);

        let state = table.snapshot();
        assert_eq!(state.win_lines[5].color, state.win_lines[0].color);
    }

    #[test]
    fn present__skips_unknown_line_names() {
        let table = table();
        let presenter = WinLinePresenter::new(grand_paylines());

        let drawn = presenter.present(
            &table,
            &geometry(),
            &[WinDetail::new("Zigzag", 3), WinDetail::new("Center", 3)],
        );

        assert_eq!(drawn, 1);
        assert_eq!(table.snapshot().win_lines[0].color, LINE_PALETTE[1]);
    }

    #[test]
    fn present__prefers_geometry_reported_by_the_renderer() {
        // given
        let table = table();
        let reported = LayoutGeometry {
            columns: vec![ColumnRect { left: 2.0, width: 8.0 }; 3],
            row_origin: 1.0,
            cell_height: 3.0,
        };
        table.update(|state| state.layout = Some(reported));
        let presenter = WinLinePresenter::new(classic_paylines());

        // when
        presenter.present(&table, &geometry(), &[WinDetail::new("Center", 3)]);

        // then
        let state = table.snapshot();
        assert_eq!(state.win_lines[0].points, vec![(6.0, 2.5); 3]);
    }
}
