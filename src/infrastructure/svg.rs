// SVG backend for chart frames
use crate::domain::chart::{ChartFrame, Gridline, PlotArea, Polyline};
use axum::{
    body::Body,
    http::{header, Response, StatusCode},
};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use thiserror::Error;

const GRID_COLOR: RGBColor = RGBColor(229, 231, 235);
const LABEL_COLOR: RGBColor = RGBColor(107, 114, 128);
const AXIS_COLOR: RGBColor = RGBColor(55, 65, 81);
const FONT: &str = "sans-serif";

#[derive(Debug, Error)]
#[error("failed to draw chart: {0}")]
pub struct SvgError(String);

type Canvas<'a> = DrawingArea<SVGBackend<'a>, Shift>;

/// Draw a chart frame onto a standalone SVG document
pub fn frame_to_svg(frame: &ChartFrame) -> Result<String, SvgError> {
    let (width, height) = frame.size();
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_error)?;

        match frame {
            ChartFrame::Placeholder { message, .. } => {
                let style = (FONT, 14)
                    .into_font()
                    .color(&LABEL_COLOR)
                    .pos(Pos::new(HPos::Center, VPos::Center));
                root.draw(&Text::new(
                    message.as_str(),
                    ((width / 2) as i32, (height / 2) as i32),
                    style,
                ))
                .map_err(draw_error)?;
            }
            ChartFrame::Plot {
                area,
                gridlines,
                series,
                unit_label,
                ..
            } => {
                draw_gridlines(&root, area, gridlines)?;
                for line in series {
                    draw_series(&root, line)?;
                }
                draw_axes(&root, area, unit_label)?;
            }
        }

        root.present().map_err(draw_error)?;
    }
    Ok(svg)
}

fn draw_gridlines(root: &Canvas<'_>, area: &PlotArea, gridlines: &[Gridline]) -> Result<(), SvgError> {
    let label_style = (FONT, 12)
        .into_font()
        .color(&LABEL_COLOR)
        .pos(Pos::new(HPos::Right, VPos::Center));

    for line in gridlines {
        let y = px(line.y);
        root.draw(&PathElement::new(
            vec![(px(area.x), y), (px(area.right()), y)],
            GRID_COLOR.stroke_width(1),
        ))
        .map_err(draw_error)?;
        root.draw(&Text::new(
            line.label.as_str(),
            (px(area.x - 5.0), y),
            label_style.clone(),
        ))
        .map_err(draw_error)?;
    }
    Ok(())
}

fn draw_series(root: &Canvas<'_>, line: &Polyline) -> Result<(), SvgError> {
    let points: Vec<(i32, i32)> = line.points.iter().map(|p| (px(p.x), px(p.y))).collect();
    root.draw(&PathElement::new(points, parse_color(&line.color).stroke_width(2)))
        .map_err(draw_error)
}

fn draw_axes(root: &Canvas<'_>, area: &PlotArea, unit_label: &str) -> Result<(), SvgError> {
    root.draw(&PathElement::new(
        vec![
            (px(area.x), px(area.y)),
            (px(area.x), px(area.bottom())),
            (px(area.right()), px(area.bottom())),
        ],
        AXIS_COLOR.stroke_width(2),
    ))
    .map_err(draw_error)?;

    let style = (FONT, 14)
        .into_font()
        .color(&AXIS_COLOR)
        .pos(Pos::new(HPos::Center, VPos::Bottom));
    root.draw(&Text::new(
        unit_label,
        (px(area.x - 20.0), px(area.y - 10.0)),
        style,
    ))
    .map_err(draw_error)
}

fn draw_error<E: std::fmt::Display>(e: E) -> SvgError {
    SvgError(e.to_string())
}

fn px(value: f64) -> i32 {
    value.round() as i32
}

/// `#rrggbb` to a plotters colour; anything else draws grey
fn parse_color(hex: &str) -> RGBColor {
    let digits = hex.trim_start_matches('#');
    if digits.len() == 6 {
        if let Ok(rgb) = u32::from_str_radix(digits, 16) {
            return RGBColor((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8);
        }
    }
    LABEL_COLOR
}

/// Build an `image/svg+xml` response that is never cached
pub fn svg_response(svg: String) -> Result<Response<Body>, StatusCode> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "image/svg+xml")
        .header(header::CACHE_CONTROL, "no-store")
        .body(Body::from(svg))
        .map_err(|e| {
            tracing::error!(error = %e, "Response build error");
            StatusCode::INTERNAL_SERVER_ERROR
        })
}
