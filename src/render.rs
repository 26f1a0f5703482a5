//! Clustermap rendering: an annotated heatmap with its rows and columns in
//! dendrogram order, the dendrogram drawn above and to the left, and a
//! colour bar in the free corner.
//!
//! ```text
//!  ┌──────┬───────────────┐
//!  │ bar  │  dendrogram   │
//!  ├──────┼───────────────┼───────┐
//!  │ dend │   heatmap     │ rows  │
//!  │ rogr │               │       │
//!  └──────┴───────────────┴───────┘
//!         │  columns      │
//!         └───────────────┘
//! ```

use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::FontTransform;

use crate::cluster::{display_percentage, Linkage};
use crate::color::{annotation_color, HeatmapScale};
use crate::data::model::SimilarityMatrix;
use crate::error::{Error, Result};
use crate::similarity::IDENTITY;

const FONT: &str = "sans-serif";
const LABEL_SIZE: f64 = 12.0;
const ANNOTATION_SIZE: f64 = 10.0;

const MARGIN: i32 = 20;
const CELL: i32 = 32;
const DENDROGRAM_DEPTH: i32 = 120;
const GAP: i32 = 6;
const COLOR_BAR_WIDTH: i32 = 16;
const COLOR_BAR_STEPS: i32 = 64;

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Pixel geometry of a clustermap with `n` items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub n: i32,
    /// Top-left corner of the heatmap.
    pub origin: (i32, i32),
    pub size: (u32, u32),
}

impl Layout {
    pub fn new(labels: &[String]) -> Self {
        let n = labels.len() as i32;
        let longest = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        // Room for row labels (right) and column labels (below). A
        // sans-serif glyph advances roughly 0.6 em.
        let label_extent = (longest as f64 * LABEL_SIZE * 0.6).ceil() as i32 + 2 * GAP;

        let start = MARGIN + DENDROGRAM_DEPTH + GAP;
        let side = (start + n * CELL + label_extent + MARGIN) as u32;
        Layout {
            n,
            origin: (start, start),
            size: (side, side),
        }
    }

    /// Top-left pixel of heatmap cell (`row`, `col`).
    pub fn cell(&self, row: i32, col: i32) -> (i32, i32) {
        (self.origin.0 + col * CELL, self.origin.1 + row * CELL)
    }

    /// Pixel offset along the leaf axis of a dendrogram position.
    fn along(&self, position: f64) -> i32 {
        (position * CELL as f64).round() as i32
    }

    /// Distance from the heatmap edge for a merge at `height`.
    fn depth(&self, height: f64, tallest: f64) -> i32 {
        (height / tallest * (DENDROGRAM_DEPTH - GAP) as f64).round() as i32
    }

    /// Far edge of the heatmap, as (right, bottom).
    fn far_edge(&self) -> (i32, i32) {
        (self.origin.0 + self.n * CELL, self.origin.1 + self.n * CELL)
    }
}

// ---------------------------------------------------------------------------
// Drawing
// ---------------------------------------------------------------------------

type Area<'a> = DrawingArea<SVGBackend<'a>, Shift>;

/// Render `similarity` ordered by `linkage` into an SVG file at `path`.
///
/// Cells show percentages rounded half to even; the colour scale runs from
/// the smallest shown value to 100.
pub fn render_clustermap(
    similarity: &SimilarityMatrix,
    linkage: &Linkage,
    path: &Path,
) -> Result<()> {
    let layout = Layout::new(similarity.labels());
    let order = linkage.leaf_order();

    let shown: Vec<Vec<i64>> = order
        .iter()
        .map(|&i| order.iter().map(|&j| display_percentage(similarity.get(i, j))).collect())
        .collect();
    let vmin = shown.iter().flatten().copied().min().unwrap_or(0) as f64;
    let scale = HeatmapScale::new(vmin, IDENTITY);

    let render_err = |message: String| Error::Render {
        path: path.to_path_buf(),
        message,
    };

    let root = SVGBackend::new(path, layout.size).into_drawing_area();
    draw(&root, &layout, similarity.labels(), &order, &shown, &scale, linkage)
        .map_err(|e| render_err(e.to_string()))?;
    root.present().map_err(|e| render_err(e.to_string()))?;
    Ok(())
}

type DrawResult = std::result::Result<(), DrawingAreaErrorKind<std::io::Error>>;

fn draw(
    root: &Area<'_>,
    layout: &Layout,
    labels: &[String],
    order: &[usize],
    shown: &[Vec<i64>],
    scale: &HeatmapScale,
    linkage: &Linkage,
) -> DrawResult {
    root.fill(&WHITE)?;
    draw_cells(root, layout, shown, scale)?;
    draw_labels(root, layout, labels, order)?;
    draw_dendrograms(root, layout, linkage)?;
    draw_color_bar(root, scale)?;
    Ok(())
}

fn draw_cells(
    root: &Area<'_>,
    layout: &Layout,
    shown: &[Vec<i64>],
    scale: &HeatmapScale,
) -> DrawResult {
    for (r, row) in shown.iter().enumerate() {
        for (c, &value) in row.iter().enumerate() {
            let (x, y) = layout.cell(r as i32, c as i32);
            let fill = scale.color_for(value as f64);
            root.draw(&Rectangle::new([(x, y), (x + CELL, y + CELL)], fill.filled()))?;

            let style = (FONT, ANNOTATION_SIZE)
                .into_font()
                .color(&annotation_color(fill))
                .pos(Pos::new(HPos::Center, VPos::Center));
            root.draw(&Text::new(value.to_string(), (x + CELL / 2, y + CELL / 2), style))?;
        }
    }
    Ok(())
}

fn draw_labels(root: &Area<'_>, layout: &Layout, labels: &[String], order: &[usize]) -> DrawResult {
    let (right, bottom) = layout.far_edge();
    let row_style = (FONT, LABEL_SIZE)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Left, VPos::Center));
    let col_style = (FONT, LABEL_SIZE)
        .into_font()
        .transform(FontTransform::Rotate90)
        .color(&BLACK)
        .pos(Pos::new(HPos::Left, VPos::Center));

    for (rank, &item) in order.iter().enumerate() {
        let mid = layout.along(rank as f64 + 0.5);
        root.draw(&Text::new(
            labels[item].clone(),
            (right + GAP, layout.origin.1 + mid),
            row_style.clone(),
        ))?;
        root.draw(&Text::new(
            labels[item].clone(),
            (layout.origin.0 + mid, bottom + GAP),
            col_style.clone(),
        ))?;
    }
    Ok(())
}

/// Draws every merge as a bracket: down from the merge height to each
/// child's height, joined across at the merge height.
fn draw_dendrograms(root: &Area<'_>, layout: &Layout, linkage: &Linkage) -> DrawResult {
    let coords = linkage.node_coordinates();
    let n = linkage.observations();
    let tallest = match linkage.height() {
        h if h > 0.0 => h,
        _ => 1.0,
    };
    let stroke = BLACK.stroke_width(1);
    let top_base = layout.origin.1 - GAP;
    let left_base = layout.origin.0 - GAP;

    for (k, step) in linkage.steps.iter().enumerate() {
        let (_, ph) = coords[n + k];
        let (lx, lh) = coords[step.left];
        let (rx, rh) = coords[step.right];

        let (a, b) = (layout.along(lx), layout.along(rx));
        let (da, db, dm) = (
            layout.depth(lh, tallest),
            layout.depth(rh, tallest),
            layout.depth(ph, tallest),
        );

        // Column dendrogram, growing upwards from the heatmap.
        let x0 = layout.origin.0;
        root.draw(&PathElement::new(
            vec![
                (x0 + a, top_base - da),
                (x0 + a, top_base - dm),
                (x0 + b, top_base - dm),
                (x0 + b, top_base - db),
            ],
            stroke,
        ))?;

        // Row dendrogram, growing leftwards.
        let y0 = layout.origin.1;
        root.draw(&PathElement::new(
            vec![
                (left_base - da, y0 + a),
                (left_base - dm, y0 + a),
                (left_base - dm, y0 + b),
                (left_base - db, y0 + b),
            ],
            stroke,
        ))?;
    }
    Ok(())
}

fn draw_color_bar(root: &Area<'_>, scale: &HeatmapScale) -> DrawResult {
    let (x, top) = (MARGIN, MARGIN);
    let height = DENDROGRAM_DEPTH - 2 * GAP;
    let step = height as f64 / COLOR_BAR_STEPS as f64;

    // Top of the bar is vmax.
    for k in 0..COLOR_BAR_STEPS {
        let fraction = (k as f64 + 0.5) / COLOR_BAR_STEPS as f64;
        let value = scale.vmax - fraction * (scale.vmax - scale.vmin);
        let y0 = top + (k as f64 * step).floor() as i32;
        let y1 = top + ((k + 1) as f64 * step).ceil() as i32;
        root.draw(&Rectangle::new(
            [(x, y0), (x + COLOR_BAR_WIDTH, y1)],
            scale.color_for(value).filled(),
        ))?;
    }
    root.draw(&Rectangle::new(
        [(x, top), (x + COLOR_BAR_WIDTH, top + height)],
        BLACK.stroke_width(1),
    ))?;

    let tick = (FONT, ANNOTATION_SIZE)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Left, VPos::Center));
    for (value, y) in [(scale.vmax, top), (scale.vmin, top + height)] {
        root.draw(&Text::new(
            format!("{value:.0}"),
            (x + COLOR_BAR_WIDTH + GAP, y),
            tick.clone(),
        ))?;
    }
    Ok(())
}
