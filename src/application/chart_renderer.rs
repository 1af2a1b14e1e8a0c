// Chart renderer - turns a series snapshot into a backend-neutral chart frame
use crate::domain::channel::ChannelSet;
use crate::domain::chart::{ChartFrame, Gridline, PlotArea, Point, Polyline};
use crate::domain::series::SeriesSnapshot;
use crate::domain::visibility::Visibility;

pub const WAITING_MESSAGE: &str = "Waiting for data...";

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSettings {
    pub width: u32,
    pub height: u32,
    pub padding: f64,
    pub min_scale: f64,
    pub headroom: f64,
    pub grid_divisions: u32,
    pub unit_label: String,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            width: 800,
            height: 400,
            padding: 40.0,
            min_scale: 10.0,
            headroom: 0.1,
            grid_divisions: 5,
            unit_label: "µg/m³".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChartRenderer {
    settings: ChartSettings,
}

impl ChartRenderer {
    pub fn new(settings: ChartSettings) -> Self {
        Self { settings }
    }

    /// Follow the container width; the height stays fixed
    pub fn resize(&mut self, width: u32) {
        self.settings.width = width;
    }

    /// Full repaint of every visible series
    pub fn render(
        &self,
        snapshot: &SeriesSnapshot,
        channels: &ChannelSet,
        visibility: &Visibility,
    ) -> ChartFrame {
        let ChartSettings { width, height, .. } = self.settings;

        if snapshot.len() < 2 {
            return ChartFrame::Placeholder {
                width,
                height,
                message: WAITING_MESSAGE.to_string(),
            };
        }

        let area = self.plot_area();
        let axis_max = axis_max(
            snapshot,
            visibility,
            self.settings.min_scale,
            self.settings.headroom,
        );

        let series = channels
            .iter()
            .enumerate()
            .filter(|(index, _)| visibility.is_visible(*index))
            .filter_map(|(index, channel)| {
                let values = snapshot.channel(index);
                if values.len() < 2 {
                    return None;
                }
                Some(Polyline {
                    channel: channel.key.clone(),
                    color: channel.color.clone(),
                    points: project(values, snapshot.capacity, &area, axis_max),
                })
            })
            .collect();

        ChartFrame::Plot {
            width,
            height,
            area,
            axis_max,
            gridlines: self.gridlines(&area, axis_max),
            series,
            unit_label: self.settings.unit_label.clone(),
        }
    }

    fn plot_area(&self) -> PlotArea {
        let padding = self.settings.padding;
        PlotArea {
            x: padding,
            y: padding,
            width: (self.settings.width as f64 - padding * 2.0).max(0.0),
            height: (self.settings.height as f64 - padding * 2.0).max(0.0),
        }
    }

    fn gridlines(&self, area: &PlotArea, axis_max: f64) -> Vec<Gridline> {
        let divisions = self.settings.grid_divisions.max(1);
        (0..=divisions)
            .map(|i| {
                let fraction = i as f64 / divisions as f64;
                let value = axis_max - axis_max * fraction;
                Gridline {
                    y: area.y + area.height * fraction,
                    value,
                    label: format!("{:.0}", value),
                }
            })
            .collect()
    }
}

/// Vertical scale shared by all visible series.
///
/// Below the floor the floor wins; otherwise the visible maximum plus headroom,
/// rounded up to a whole unit so the scale moves in steps.
pub fn axis_max(
    snapshot: &SeriesSnapshot,
    visibility: &Visibility,
    min_scale: f64,
    headroom: f64,
) -> f64 {
    let visible_max = snapshot
        .channels
        .iter()
        .enumerate()
        .filter(|(index, _)| visibility.is_visible(*index))
        .flat_map(|(_, values)| values.iter().copied())
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))));

    match visible_max {
        Some(max) if max >= min_scale => {
            let inflated = (max * (1.0 + headroom)).min(f64::MAX);
            // snap float noise before rounding up
            let ceiling = inflated.ceil();
            if ceiling - inflated > 1.0 - 1e-9 * inflated.abs().max(1.0) {
                ceiling - 1.0
            } else {
                ceiling
            }
        }
        _ => min_scale,
    }
}

/// Horizontal spacing uses the configured capacity, so a partial window grows
/// from the left edge instead of stretching across the plot.
fn project(values: &[f64], capacity: usize, area: &PlotArea, axis_max: f64) -> Vec<Point> {
    let step = area.width / (capacity.max(2) - 1) as f64;
    values
        .iter()
        .enumerate()
        .map(|(i, value)| {
            Point::new(
                area.x + step * i as f64,
                area.bottom() - (value / axis_max) * area.height,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(capacity: usize, channels: Vec<Vec<f64>>) -> SeriesSnapshot {
        let len = channels.first().map(Vec::len).unwrap_or(0);
        SeriesSnapshot {
            capacity,
            timestamps: (0..len as i64).collect(),
            channels,
        }
    }

    fn all_visible() -> Visibility {
        Visibility::all_visible(&ChannelSet::particulate())
    }

    #[test]
    fn test_scale_floor() {
        let snap = snapshot(10, vec![vec![1.0, 9.9]; 4]);
        assert_eq!(axis_max(&snap, &all_visible(), 10.0, 0.1), 10.0);

        let zeros = snapshot(10, vec![vec![0.0, 0.0]; 4]);
        assert_eq!(axis_max(&zeros, &all_visible(), 10.0, 0.1), 10.0);
    }

    #[test]
    fn test_scale_headroom() {
        let cases = [(10.0, 11.0), (20.0, 22.0), (47.0, 52.0), (100.0, 110.0), (33.3, 37.0)];
        for (max, expected) in cases {
            let snap = snapshot(10, vec![vec![0.0, max], vec![1.0, 2.0], vec![0.0, 0.0], vec![0.0, 0.0]]);
            assert_eq!(
                axis_max(&snap, &all_visible(), 10.0, 0.1),
                expected,
                "max {}",
                max
            );
        }
    }

    #[test]
    fn test_scale_stays_finite_for_huge_values() {
        let snap = snapshot(10, vec![vec![0.0, 1e300]; 4]);
        let max = axis_max(&snap, &all_visible(), 10.0, 0.1);
        assert!(max.is_finite());
        assert!((max / 1.1e300 - 1.0).abs() < 1e-12);

        let extreme = snapshot(10, vec![vec![0.0, f64::MAX]; 4]);
        assert_eq!(axis_max(&extreme, &all_visible(), 10.0, 0.1), f64::MAX);

        let renderer = ChartRenderer::new(ChartSettings::default());
        let ChartFrame::Plot { gridlines, series, area, .. } =
            renderer.render(&snap, &ChannelSet::particulate(), &all_visible())
        else {
            panic!("expected plot");
        };
        assert_ne!(gridlines[0].label, "NaN");
        let top = series[0].points.last().unwrap();
        assert!(top.y < area.bottom() && top.y > area.y);
    }

    #[test]
    fn test_scale_ignores_hidden_channels() {
        let snap = snapshot(
            10,
            vec![vec![500.0, 900.0], vec![20.0, 5.0], vec![1.0, 1.0], vec![2.0, 2.0]],
        );
        let mut visibility = all_visible();
        visibility.set(0, false);
        assert_eq!(axis_max(&snap, &visibility, 10.0, 0.1), 22.0);

        for i in 0..4 {
            visibility.set(i, false);
        }
        assert_eq!(axis_max(&snap, &visibility, 10.0, 0.1), 10.0);
    }

    #[test]
    fn test_placeholder_until_two_samples() {
        let renderer = ChartRenderer::new(ChartSettings::default());
        let channels = ChannelSet::particulate();

        for len in [0usize, 1] {
            let snap = snapshot(300, vec![vec![5.0; len]; 4]);
            let frame = renderer.render(&snap, &channels, &all_visible());
            assert_eq!(
                frame,
                ChartFrame::Placeholder {
                    width: 800,
                    height: 400,
                    message: WAITING_MESSAGE.to_string(),
                }
            );
        }
    }

    #[test]
    fn test_partial_window_grows_from_left() {
        let renderer = ChartRenderer::new(ChartSettings::default());
        let channels = ChannelSet::particulate();
        let snap = snapshot(5, vec![vec![0.0, 11.0, 22.0]; 4]);

        let ChartFrame::Plot { series, axis_max, area, .. } =
            renderer.render(&snap, &channels, &all_visible())
        else {
            panic!("expected plot");
        };

        assert_eq!(axis_max, 25.0);
        assert_eq!(area.width, 720.0);
        let xs: Vec<f64> = series[0].points.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![40.0, 220.0, 400.0]);

        let ys: Vec<f64> = series[0].points.iter().map(|p| p.y).collect();
        assert_eq!(ys[0], area.bottom());
        assert!(ys[2] > area.y && ys[2] < ys[1]);
    }

    #[test]
    fn test_full_window_spans_plot_width() {
        let renderer = ChartRenderer::new(ChartSettings::default());
        let channels = ChannelSet::particulate();
        let snap = snapshot(3, vec![vec![1.0, 2.0, 3.0]; 4]);

        let ChartFrame::Plot { series, area, .. } =
            renderer.render(&snap, &channels, &all_visible())
        else {
            panic!("expected plot");
        };
        let last = series[0].points.last().unwrap();
        assert_eq!(last.x, area.right());
    }

    #[test]
    fn test_gridlines_and_labels() {
        let renderer = ChartRenderer::new(ChartSettings::default());
        let channels = ChannelSet::particulate();
        let snap = snapshot(10, vec![vec![10.0, 20.0]; 4]);

        let ChartFrame::Plot { gridlines, area, .. } =
            renderer.render(&snap, &channels, &all_visible())
        else {
            panic!("expected plot");
        };

        assert_eq!(gridlines.len(), 6);
        assert_eq!(gridlines[0].y, area.y);
        assert_eq!(gridlines[0].label, "22");
        assert_eq!(gridlines[5].y, area.bottom());
        assert_eq!(gridlines[5].label, "0");
        let spacing = gridlines[1].y - gridlines[0].y;
        assert!((spacing - area.height / 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_hidden_channels_are_not_drawn() {
        let renderer = ChartRenderer::new(ChartSettings::default());
        let channels = ChannelSet::particulate();
        let snap = snapshot(10, vec![vec![1.0, 2.0]; 4]);
        let mut visibility = all_visible();
        visibility.set(1, false);
        visibility.set(3, false);

        let ChartFrame::Plot { series, .. } = renderer.render(&snap, &channels, &visibility) else {
            panic!("expected plot");
        };
        let drawn: Vec<&str> = series.iter().map(|s| s.channel.as_str()).collect();
        assert_eq!(drawn, vec!["pm1", "pm4"]);
        assert_eq!(series[1].color, "#f59e0b");
    }

    #[test]
    fn test_resize_changes_width_only() {
        let mut renderer = ChartRenderer::new(ChartSettings::default());
        renderer.resize(1200);
        let channels = ChannelSet::particulate();
        let frame = renderer.render(&snapshot(10, vec![vec![]; 4]), &channels, &all_visible());
        assert_eq!(frame.size(), (1200, 400));
    }
}
