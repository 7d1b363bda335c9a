//! Table layout: column sizing, grid placement, and the two-pass render.

use super::blocks::INDENT_STEP;
use super::layout::{DrawOp, LayoutContext, RULE_COLOR};
use super::text::{layout_lines, lines_height, paint_line, Line, LINE_SPACING};
use crate::model::{Cell, Color, Paragraph, Table};

const CELL_PADDING: f32 = 4.0;
const HEADER_SHADE: Color = Color::rgb(0xf3, 0xf4, 0xf6);

/// Splits the available width `available` between the table's columns.
///
/// Declared widths are scaled proportionally. Auto-sized columns (declared 0)
/// share what is left up to the declared minimum table width, or get the mean
/// declared width when there is no such remainder. Without any declared width
/// every column gets an equal share.
pub fn column_widths(table: &Table, available: f32) -> Vec<f32> {
    let count = table.column_count();
    if count == 0 {
        return Vec::new();
    }
    let mut declared: Vec<f32> = table.col_widths.iter().map(|w| *w as f32).collect();
    declared.resize(count, 0.0);
    let sum: f32 = declared.iter().sum();
    if sum <= 0.0 {
        return vec![available / count as f32; count];
    }
    let autos = declared.iter().filter(|w| **w <= 0.0).count();
    if autos > 0 {
        let remainder = table.min_width as f32 - sum;
        let share = if remainder > 0.0 {
            remainder / autos as f32
        } else {
            sum / (count - autos) as f32
        };
        for width in declared.iter_mut().filter(|w| **w <= 0.0) {
            *width = share;
        }
    }
    let total: f32 = declared.iter().sum();
    declared.iter().map(|w| available * w / total).collect()
}

/// A cell anchored in the grid.
#[derive(Debug)]
struct Placement<'t> {
    row: usize,
    col: usize,
    col_span: usize,
    row_span: usize,
    cell: &'t Cell,
}

/// Places cells on the grid, skipping slots taken by earlier row spans.
fn place_cells(table: &Table, columns: usize) -> Vec<Placement<'_>> {
    let rows = table.rows.len();
    let mut occupied = vec![vec![false; columns]; rows];
    let mut placements = Vec::new();
    for (r, row) in table.rows.iter().enumerate() {
        let mut c = 0;
        for cell in row {
            while c < columns && occupied[r][c] {
                c += 1;
            }
            if c >= columns {
                log::debug!("table row {r}: cell beyond the last column dropped");
                break;
            }
            let col_span = (cell.col_span.max(1) as usize).min(columns - c);
            let row_span = (cell.row_span.max(1) as usize).min(rows - r);
            for taken in occupied.iter_mut().skip(r).take(row_span) {
                for slot in taken.iter_mut().skip(c).take(col_span) {
                    *slot = true;
                }
            }
            placements.push(Placement {
                row: r,
                col: c,
                col_span,
                row_span,
                cell,
            });
            c += col_span;
        }
    }
    placements
}

/// Laid-out cell content: each paragraph's indent and lines.
struct CellContent {
    paragraphs: Vec<(f32, Vec<Line>)>,
    height: f32,
}

fn measure_cell(ctx: &mut LayoutContext, content: &[Paragraph], width: f32) -> CellContent {
    let gap = ctx.body_size * 0.3;
    let mut paragraphs = Vec::with_capacity(content.len());
    let mut height = 0.0;
    for (i, paragraph) in content.iter().enumerate() {
        let indent = (paragraph.indent as f32 * INDENT_STEP).min(width / 2.0);
        let lines = layout_lines(ctx, &paragraph.content, width - indent, paragraph.align);
        if i > 0 {
            height += gap;
        }
        height += lines_height(&lines);
        paragraphs.push((indent, lines));
    }
    CellContent { paragraphs, height }
}

fn paint_cell(ctx: &mut LayoutContext, content: &CellContent, x: f32, top: f32, width: f32) {
    for (indent, line, offset) in content.lines(ctx.body_size) {
        paint_line(ctx, line, x + indent, top + offset, width - indent);
    }
}

impl CellContent {
    /// Every line with its paragraph indent and its offset from the content top.
    fn lines(&self, body_size: f32) -> Vec<(f32, &Line, f32)> {
        let gap = body_size * 0.3;
        let mut y = 0.0_f32;
        let mut placed = Vec::new();
        for (i, (indent, lines)) in self.paragraphs.iter().enumerate() {
            if i > 0 {
                y += gap;
            }
            for line in lines {
                placed.push((*indent, line, y));
                y += line.height();
            }
        }
        placed
    }
}

/// Cell background and border.
fn paint_frame(ctx: &mut LayoutContext, header: bool, x: f32, y: f32, w: f32, h: f32) {
    if header {
        ctx.push(DrawOp::FillRect {
            x,
            y,
            w,
            h,
            color: HEADER_SHADE,
        });
    }
    ctx.push(DrawOp::StrokeRect {
        x,
        y,
        w,
        h,
        color: RULE_COLOR,
        width: 0.5,
    });
}

/// A cell of one row group, positioned relative to the group's top.
struct GroupCell<'c> {
    x: f32,
    top: f32,
    w: f32,
    h: f32,
    header: bool,
    content: &'c CellContent,
}

/// Paints a row group taller than the page body, continuing it on the next
/// pages. Slices end on line boundaries; each page repeats the frames of the
/// cells it shows.
fn paint_split_group(ctx: &mut LayoutContext, cells: &[GroupCell<'_>], group_height: f32) {
    let body_size = ctx.body_size;
    // (cell index, indent, line, top, bottom) relative to the group top.
    let mut lines = Vec::new();
    for (index, cell) in cells.iter().enumerate() {
        for (indent, line, offset) in cell.content.lines(body_size) {
            let line_top = cell.top + CELL_PADDING + offset;
            lines.push((index, indent, line, line_top, line_top + line.height()));
        }
    }

    let mut start = 0.0;
    while start < group_height {
        let mut cut = (start + ctx.remaining_height()).min(group_height);
        loop {
            let straddling = lines
                .iter()
                .filter(|(_, _, _, top, bottom)| *top > start && *top < cut && *bottom > cut + 0.01)
                .map(|(_, _, _, top, _)| *top)
                .fold(cut, f32::min);
            if straddling >= cut {
                break;
            }
            cut = straddling;
        }

        let page_top = ctx.y;
        for cell in cells {
            let visible_top = cell.top.max(start);
            let visible_bottom = (cell.top + cell.h).min(cut);
            if visible_bottom > visible_top {
                let y = page_top + visible_top - start;
                paint_frame(ctx, cell.header, cell.x, y, cell.w, visible_bottom - visible_top);
            }
        }
        for (index, indent, line, top, _) in &lines {
            if *top >= start && *top < cut {
                let cell = &cells[*index];
                let inner = cell.w - 2.0 * CELL_PADDING;
                let x = cell.x + CELL_PADDING + indent;
                paint_line(ctx, line, x, page_top + top - start, inner - indent);
            }
        }
        ctx.advance(cut - start);
        start = cut;
        if start < group_height {
            ctx.new_page();
        }
    }
}

/// Renders a table at the cursor, breaking pages between rows.
pub fn render_table(ctx: &mut LayoutContext, table: &Table) {
    let widths = column_widths(table, ctx.available_width());
    if widths.is_empty() || table.rows.is_empty() {
        log::debug!("empty table skipped");
        return;
    }
    let mut offsets = Vec::with_capacity(widths.len() + 1);
    let mut acc = 0.0_f32;
    offsets.push(acc);
    for width in &widths {
        acc += width;
        offsets.push(acc);
    }
    let placements = place_cells(table, widths.len());

    // Pass 1: measure.
    let min_row = ctx.body_size * LINE_SPACING + 2.0 * CELL_PADDING;
    let mut row_heights = vec![min_row; table.rows.len()];
    let mut contents = Vec::with_capacity(placements.len());
    for placement in &placements {
        let width = offsets[placement.col + placement.col_span] - offsets[placement.col];
        let content = measure_cell(ctx, &placement.cell.content, width - 2.0 * CELL_PADDING);
        if placement.row_span == 1 {
            let needed = content.height + 2.0 * CELL_PADDING;
            row_heights[placement.row] = row_heights[placement.row].max(needed);
        }
        contents.push(content);
    }
    for (placement, content) in placements.iter().zip(&contents) {
        if placement.row_span > 1 {
            let last = placement.row + placement.row_span - 1;
            let spanned: f32 = row_heights[placement.row..=last].iter().sum();
            let needed = content.height + 2.0 * CELL_PADDING;
            if needed > spanned {
                row_heights[last] += needed - spanned;
            }
        }
    }

    // Pass 2: paint, one row group at a time. A group keeps row-spanning
    // cells on one page unless it is taller than the page body.
    let left = ctx.left;
    let mut row = 0;
    while row < table.rows.len() {
        let mut end = row;
        let mut scan = row;
        while scan <= end {
            for placement in placements.iter().filter(|p| p.row == scan) {
                end = end.max(placement.row + placement.row_span - 1);
            }
            scan += 1;
        }
        let group_height: f32 = row_heights[row..=end].iter().sum();
        ctx.ensure_space(group_height);
        let mut row_tops = Vec::with_capacity(end - row + 2);
        let mut y = 0.0_f32;
        for height in &row_heights[row..=end] {
            row_tops.push(y);
            y += height;
        }
        row_tops.push(y);

        let cells: Vec<GroupCell> = placements
            .iter()
            .zip(&contents)
            .filter(|(placement, _)| placement.row >= row && placement.row <= end)
            .map(|(placement, content)| {
                let x = left + offsets[placement.col];
                let w = offsets[placement.col + placement.col_span] - offsets[placement.col];
                let top = row_tops[placement.row - row];
                let h = row_tops[placement.row - row + placement.row_span] - top;
                GroupCell {
                    x,
                    top,
                    w,
                    h,
                    header: placement.cell.header,
                    content,
                }
            })
            .collect();

        if group_height > ctx.remaining_height() {
            log::debug!("table rows {row}..={end} taller than the page, splitting");
            paint_split_group(ctx, &cells, group_height);
            row = end + 1;
            continue;
        }
        let group_top = ctx.y;
        for cell in &cells {
            paint_frame(ctx, cell.header, cell.x, group_top + cell.top, cell.w, cell.h);
            paint_cell(
                ctx,
                cell.content,
                cell.x + CELL_PADDING,
                group_top + cell.top + CELL_PADDING,
                cell.w - 2.0 * CELL_PADDING,
            );
        }
        ctx.advance(group_height);
        row = end + 1;
    }
    ctx.advance(ctx.body_size * 0.6);
}
