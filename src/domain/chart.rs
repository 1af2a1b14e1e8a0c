// Chart frame domain model - backend-neutral output of the renderer

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Plotting rectangle inside the chart surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotArea {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PlotArea {
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Gridline {
    pub y: f64,
    pub value: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub channel: String,
    pub color: String,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartFrame {
    Placeholder {
        width: u32,
        height: u32,
        message: String,
    },
    Plot {
        width: u32,
        height: u32,
        area: PlotArea,
        axis_max: f64,
        gridlines: Vec<Gridline>,
        series: Vec<Polyline>,
        unit_label: String,
    },
}

impl ChartFrame {
    pub fn size(&self) -> (u32, u32) {
        match self {
            ChartFrame::Placeholder { width, height, .. } => (*width, *height),
            ChartFrame::Plot { width, height, .. } => (*width, *height),
        }
    }
}

#[cfg(test)]
impl ChartFrame {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, ChartFrame::Placeholder { .. })
    }
}
