//! Visualization utilities for cartesian_planner
//!
//! Draws a planning scene (road, obstacles, start pose, trajectory) with gnuplot.

use gnuplot::{AutoOption, AxesCommon, Caption, Color, Figure, LineWidth, PointSize, PointSymbol};

use crate::common::Pose2D;
use crate::environment::{Environment, ReferenceLine};
use crate::geometry::Polygon2d;
use crate::path_planning::DiscretizedTrajectory;

/// Color palette of the scene
pub mod colors {
    pub const OBSTACLE: &str = "#000000";
    pub const DYNAMIC_OBSTACLE: &str = "#FFA500";
    pub const REFERENCE: &str = "#808080";
    pub const ROAD: &str = "#0000FF";
    pub const START: &str = "#00FF00";
    pub const PATH: &str = "#FF0000";
}

/// Scene plotter; calls chain and draw into one figure
pub struct Visualizer {
    figure: Figure,
    title: String,
    /// Number of curves drawn so far
    curves: usize,
}

impl Visualizer {
    pub fn new() -> Self {
        Self {
            figure: Figure::new(),
            title: String::new(),
            curves: 0,
        }
    }

    pub fn set_title(&mut self, title: &str) -> &mut Self {
        self.title = title.to_string();
        self
    }

    pub fn curves(&self) -> usize {
        self.curves
    }

    /// Reference line and both road edges
    pub fn plot_road(&mut self, reference: &ReferenceLine) -> &mut Self {
        let edge = |left: bool| -> (Vec<f64>, Vec<f64>) {
            reference
                .points()
                .iter()
                .map(|p| {
                    let l = if left { p.left_bound } else { -p.right_bound };
                    let q = reference.get_cartesian(p.s, l);
                    (q.x, q.y)
                })
                .unzip()
        };
        let (cx, cy): (Vec<f64>, Vec<f64>) = reference.points().iter().map(|p| (p.x, p.y)).unzip();
        let (lx, ly) = edge(true);
        let (rx, ry) = edge(false);

        self.figure.axes2d()
            .lines(&cx, &cy, &[Caption("Reference"), Color(colors::REFERENCE), LineWidth(1.0)])
            .lines(&lx, &ly, &[Caption("Road edge"), Color(colors::ROAD), LineWidth(1.5)])
            .lines(&rx, &ry, &[Color(colors::ROAD), LineWidth(1.5)]);
        self.curves += 3;
        self
    }

    /// Static obstacles and every keyframe of the dynamic ones
    pub fn plot_obstacles(&mut self, env: &Environment) -> &mut Self {
        for obstacle in env.obstacles() {
            self.plot_polygon(obstacle, colors::OBSTACLE);
        }
        for obstacle in env.dynamic_obstacles() {
            for (_, polygon) in obstacle.keyframes() {
                self.plot_polygon(polygon, colors::DYNAMIC_OBSTACLE);
            }
        }
        self
    }

    fn plot_polygon(&mut self, polygon: &Polygon2d, color: &str) {
        let (mut x, mut y): (Vec<f64>, Vec<f64>) = polygon.points().iter().map(|p| (p.x, p.y)).unzip();
        if let Some(first) = polygon.points().first() {
            x.push(first.x);
            y.push(first.y);
        }
        self.figure.axes2d()
            .lines(&x, &y, &[Color(color), LineWidth(2.0)]);
        self.curves += 1;
    }

    /// Start pose with a heading tick
    pub fn plot_pose(&mut self, pose: &Pose2D, size: f64) -> &mut Self {
        let end_x = pose.x + 2.0 * size * pose.yaw.cos();
        let end_y = pose.y + 2.0 * size * pose.yaw.sin();

        self.figure.axes2d()
            .points(&[pose.x], &[pose.y], &[
                Caption("Start"),
                Color(colors::START),
                PointSymbol('O'),
                PointSize(size),
            ])
            .lines(&[pose.x, end_x], &[pose.y, end_y], &[Color(colors::START), LineWidth(2.0)]);
        self.curves += 2;
        self
    }

    pub fn plot_trajectory(&mut self, trajectory: &DiscretizedTrajectory, caption: &str) -> &mut Self {
        self.figure.axes2d()
            .lines(&trajectory.x_coords(), &trajectory.y_coords(), &[
                Caption(caption),
                Color(colors::PATH),
                LineWidth(2.0),
            ]);
        self.curves += 1;
        self
    }

    /// Finalize and show the plot
    pub fn show(&mut self) -> Result<(), String> {
        let axes = self.figure.axes2d();
        if !self.title.is_empty() {
            axes.set_title(&self.title, &[]);
        }
        axes.set_x_label("X [m]", &[]);
        axes.set_y_label("Y [m]", &[]);
        axes.set_aspect_ratio(AutoOption::Fix(1.0));
        self.figure.show().map_err(|e| e.to_string()).map(|_| ())
    }
}

impl Default for Visualizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Road, obstacles, start pose and the planned trajectory in one figure
pub fn plot_scene(env: &Environment, start: &Pose2D, trajectory: Option<&DiscretizedTrajectory>, title: &str) -> Visualizer {
    let mut vis = Visualizer::new();
    vis.set_title(title);
    vis.plot_road(env.reference());
    vis.plot_obstacles(env);
    vis.plot_pose(start, 1.5);
    if let Some(trajectory) = trajectory {
        vis.plot_trajectory(trajectory, "DP seed");
    }
    vis
}
