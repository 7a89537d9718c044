// https://github.com/AtsushiSakai/PythonRobotics/tree/master/PathPlanning/CubicSpline
// Cubic spline through 2D waypoints, parameterized by arc length.
// Used to smooth reference-line waypoints before they are discretized.

extern crate nalgebra as na;

use crate::common::{PlannerError, PlannerResult};

/// Natural cubic spline y(x) over strictly increasing knots
#[derive(Debug, Clone)]
struct Spline {
    a: Vec<f64>,
    b: Vec<f64>,
    c: Vec<f64>,
    d: Vec<f64>,
    x: Vec<f64>,
}

impl Spline {
    fn new(x: &[f64], y: &[f64]) -> PlannerResult<Spline> {
        let nx = x.len();
        let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
        if h.iter().any(|&hi| hi <= 0.0) {
            return Err(PlannerError::InvalidReference(
                "spline knots must be strictly increasing".to_string(),
            ));
        }

        let a = y.to_vec();
        let a_mat = Spline::calc_a(&h);
        let b_mat = Spline::calc_b(&h, &a);
        let c_na = a_mat.lu().solve(&b_mat).ok_or_else(|| {
            PlannerError::InvalidReference("singular spline system".to_string())
        })?;
        let c: Vec<f64> = c_na.iter().copied().collect();

        let mut b = Vec::with_capacity(nx - 1);
        let mut d = Vec::with_capacity(nx - 1);
        for i in 0..nx - 1 {
            d.push((c[i + 1] - c[i]) / (3.0 * h[i]));
            b.push((a[i + 1] - a[i]) / h[i] - h[i] * (c[i + 1] + 2.0 * c[i]) / 3.0);
        }

        Ok(Spline { a, b, c, d, x: x.to_vec() })
    }

    fn calc(&self, t: f64) -> f64 {
        let i = self.search_index(t);
        let dx = t - self.x[i];
        self.a[i] + self.b[i] * dx + self.c[i] * dx.powi(2) + self.d[i] * dx.powi(3)
    }

    fn calcd(&self, t: f64) -> f64 {
        let i = self.search_index(t);
        let dx = t - self.x[i];
        self.b[i] + 2.0 * self.c[i] * dx + 3.0 * self.d[i] * dx.powi(2)
    }

    fn calcdd(&self, t: f64) -> f64 {
        let i = self.search_index(t);
        let dx = t - self.x[i];
        2.0 * self.c[i] + 6.0 * self.d[i] * dx
    }

    /// Index of the polynomial piece covering `t` (clamped to the end pieces)
    fn search_index(&self, t: f64) -> usize {
        let upper = self.x.partition_point(|&xi| xi <= t);
        upper.saturating_sub(1).min(self.x.len() - 2)
    }

    fn calc_a(h: &[f64]) -> na::DMatrix<f64> {
        let nx = h.len() + 1;
        let mut a = na::DMatrix::zeros(nx, nx);
        a[(0, 0)] = 1.0;
        for i in 0..nx - 1 {
            if i != nx - 2 {
                a[(i + 1, i + 1)] = 2.0 * (h[i] + h[i + 1]);
            }
            a[(i + 1, i)] = h[i];
            a[(i, i + 1)] = h[i];
        }
        a[(0, 1)] = 0.0;
        a[(nx - 1, nx - 2)] = 0.0;
        a[(nx - 1, nx - 1)] = 1.0;
        a
    }

    fn calc_b(h: &[f64], a: &[f64]) -> na::DVector<f64> {
        let nx = h.len() + 1;
        let mut b = na::DVector::zeros(nx);
        for i in 0..nx.saturating_sub(2) {
            b[i + 1] = 3.0 * (a[i + 2] - a[i + 1]) / h[i + 1] - 3.0 * (a[i + 1] - a[i]) / h[i];
        }
        b
    }
}

/// Arc-length parameterized 2D spline
#[derive(Debug, Clone)]
pub struct Spline2D {
    pub s: Vec<f64>,
    sx: Spline,
    sy: Spline,
}

impl Spline2D {
    pub fn new(x: &[f64], y: &[f64]) -> PlannerResult<Spline2D> {
        if x.len() != y.len() || x.len() < 2 {
            return Err(PlannerError::InvalidReference(format!(
                "need at least 2 waypoints with matching x/y, got {} x and {} y",
                x.len(),
                y.len()
            )));
        }
        let s = Spline2D::calc_s(x, y);
        let sx = Spline::new(&s, x)?;
        let sy = Spline::new(&s, y)?;

        Ok(Spline2D { s, sx, sy })
    }

    fn calc_s(x: &[f64], y: &[f64]) -> Vec<f64> {
        let mut s = Vec::with_capacity(x.len());
        s.push(0.0);
        for i in 0..x.len() - 1 {
            let ds = ((x[i + 1] - x[i]).powi(2) + (y[i + 1] - y[i]).powi(2)).sqrt();
            s.push(s[i] + ds);
        }
        s
    }

    /// Total arc length
    pub fn length(&self) -> f64 {
        self.s.last().copied().unwrap_or(0.0)
    }

    pub fn calc_position(&self, is: f64) -> (f64, f64) {
        (self.sx.calc(is), self.sy.calc(is))
    }

    pub fn calc_curvature(&self, is: f64) -> f64 {
        let dx = self.sx.calcd(is);
        let ddx = self.sx.calcdd(is);
        let dy = self.sy.calcd(is);
        let ddy = self.sy.calcdd(is);
        (ddy * dx - ddx * dy) / (dx.powi(2) + dy.powi(2)).powf(1.5)
    }

    pub fn calc_yaw(&self, is: f64) -> f64 {
        let dx = self.sx.calcd(is);
        let dy = self.sy.calcd(is);
        dy.atan2(dx)
    }
}

/// Sampled course along a spline
#[derive(Debug, Clone, Default)]
pub struct SplineCourse {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub yaw: Vec<f64>,
    pub curvature: Vec<f64>,
    pub s: Vec<f64>,
}

/// Sample the spline through the waypoints every `ds` metres (end point included)
pub fn calc_spline_course(x: &[f64], y: &[f64], ds: f64) -> PlannerResult<SplineCourse> {
    if ds <= 0.0 {
        return Err(PlannerError::InvalidParameter(format!(
            "course resolution must be positive, got {}",
            ds
        )));
    }
    let sp = Spline2D::new(x, y)?;
    let s_end = sp.length();
    let n = ((s_end / ds).ceil() as usize).max(1);

    let mut course = SplineCourse::default();
    for i in 0..=n {
        let is = s_end * i as f64 / n as f64;
        let (px, py) = sp.calc_position(is);
        course.x.push(px);
        course.y.push(py);
        course.yaw.push(sp.calc_yaw(is));
        course.curvature.push(sp.calc_curvature(is));
        course.s.push(is);
    }
    Ok(course)
}
