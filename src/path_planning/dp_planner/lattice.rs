//! Discretization grid of the DP search

use crate::common::PlanningEnvironment;

use super::config::DpPlannerConfig;

/// `n` evenly spaced values over `[start, end]`, both ends included.
///
/// A single sample sits at the midpoint.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![(start + end) / 2.0],
        _ => (0..n)
            .map(|i| {
                if i == n - 1 {
                    end
                } else {
                    start + (end - start) * i as f64 / (n - 1) as f64
                }
            })
            .collect(),
    }
}

/// Time, station and lateral samples of the lattice
#[derive(Debug, Clone, PartialEq)]
pub struct Lattice {
    nt: usize,
    ns: usize,
    nl: usize,
    nseg: usize,
    unit_time: f64,
    safety_margin: f64,
    /// end time of every layer, `unit_time ..= horizon`
    time: Vec<f64>,
    /// station increments per step, `0 ..= max_velocity * unit_time`
    station: Vec<f64>,
    /// normalized lateral positions of the non-centerline buckets
    lateral: Vec<f64>,
}

impl Lattice {
    pub fn new(config: &DpPlannerConfig) -> Self {
        let nt = config.num_time_layers;
        let unit_time = config.unit_time();
        Self {
            nt,
            ns: config.num_station_buckets,
            nl: config.num_lateral_buckets,
            nseg: config.nseg(),
            unit_time,
            safety_margin: config.safety_margin,
            time: linspace(unit_time, config.horizon, nt),
            station: linspace(0.0, unit_time * config.max_velocity, config.num_station_buckets),
            lateral: linspace(0.0, 1.0, config.num_lateral_buckets - 1),
        }
    }

    pub fn nt(&self) -> usize {
        self.nt
    }

    pub fn ns(&self) -> usize {
        self.ns
    }

    pub fn nl(&self) -> usize {
        self.nl
    }

    pub fn nseg(&self) -> usize {
        self.nseg
    }

    pub fn unit_time(&self) -> f64 {
        self.unit_time
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn station(&self) -> &[f64] {
        &self.station
    }

    pub fn lateral(&self) -> &[f64] {
        &self.lateral
    }

    /// Time at which layer `t` is entered (its parent's time)
    pub fn layer_start_time(&self, t: usize) -> f64 {
        if t == 0 {
            0.0
        } else {
            self.time[t - 1]
        }
    }

    /// Index of the reserved "on the reference line" bucket
    pub fn centerline_index(&self) -> usize {
        self.nl - 1
    }

    pub fn is_centerline(&self, l_idx: usize) -> bool {
        l_idx == self.centerline_index()
    }

    /// Physical lateral offset of bucket `l_idx` at station `s`.
    ///
    /// `None` when the corridor at `s` is narrower than twice the safety
    /// margin; the centerline bucket is always available.
    pub fn lateral_offset<E>(&self, env: &E, s: f64, l_idx: usize) -> Option<f64>
    where
        E: PlanningEnvironment + ?Sized,
    {
        if self.is_centerline(l_idx) {
            return Some(0.0);
        }
        let (lb, ub) = env.evaluate_station(s).shrink(self.safety_margin)?;
        Some(lb + (ub - lb) * self.lateral[l_idx])
    }

    /// How far `l` lies outside the margin-reduced corridor at `s`, zero inside.
    ///
    /// A collapsed corridor admits only the reference line itself.
    pub fn margin_excess<E>(&self, env: &E, s: f64, l: f64) -> f64
    where
        E: PlanningEnvironment + ?Sized,
    {
        match env.evaluate_station(s).shrink(self.safety_margin) {
            Some((lb, ub)) => (lb - l).max(l - ub).max(0.0),
            None => l.abs(),
        }
    }

    /// Distance from `l` to the closer margin-reduced bound, zero when outside or collapsed
    pub fn bound_clearance<E>(&self, env: &E, s: f64, l: f64) -> f64
    where
        E: PlanningEnvironment + ?Sized,
    {
        match env.evaluate_station(s).shrink(self.safety_margin) {
            Some((lb, ub)) => (ub - l).min(l - lb).max(0.0),
            None => 0.0,
        }
    }
}
