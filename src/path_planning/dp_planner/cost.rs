//! Transition and collision costs between lattice cells

use itertools::Itertools;

use crate::common::{normalize_angle, PlanningEnvironment};

use super::config::DpPlannerConfig;
use super::interpolation::Segment;
use super::lattice::Lattice;

/// Heading is undefined below this point spacing
const MIN_HEADING_DISTANCE: f64 = 1e-6;

/// Rounding slack of the corridor check on interpolated points
const CORRIDOR_EPS: f64 = 1e-9;

/// Kinematic state at the end of a transition (or at the start anchor)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeState {
    /// Achieved station
    pub s: f64,
    /// Physical lateral offset
    pub l: f64,
    /// Mean velocity over the incoming step, `None` at the start anchor
    pub velocity: Option<f64>,
    /// Lateral increment of the incoming step
    pub dl: f64,
    /// World heading at the end of the incoming step
    pub heading: f64,
}

impl NodeState {
    /// Anchor state derived from the start pose
    pub fn anchor(s: f64, l: f64, heading: f64) -> Self {
        Self {
            s,
            l,
            velocity: None,
            dl: 0.0,
            heading,
        }
    }
}

/// Result of a feasible kinematic transition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub state: NodeState,
    pub cost: f64,
}

/// Evaluates transitions against the read-only environment
pub struct CostEvaluator<'a, E: ?Sized> {
    config: &'a DpPlannerConfig,
    lattice: &'a Lattice,
    env: &'a E,
}

impl<'a, E> CostEvaluator<'a, E>
where
    E: PlanningEnvironment + ?Sized,
{
    pub fn new(config: &'a DpPlannerConfig, lattice: &'a Lattice, env: &'a E) -> Self {
        Self { config, lattice, env }
    }

    /// Station increment achievable in one step when bucket `nominal` is requested.
    ///
    /// Without a known parent velocity only the speed limit applies.
    pub fn achieved_increment(&self, parent_velocity: Option<f64>, nominal: f64) -> f64 {
        let dt = self.lattice.unit_time();
        let max_ds = self.config.max_velocity * dt;
        let (lo, hi) = match parent_velocity {
            None => (0.0, max_ds),
            Some(v) => {
                let reach = 0.5 * self.config.max_acceleration * dt * dt;
                let lo = (v * dt - reach).clamp(0.0, max_ds);
                let hi = (v * dt + reach).clamp(lo, max_ds);
                (lo, hi)
            }
        };
        nominal.clamp(lo, hi)
    }

    /// Segment from `parent` to `target` during layer `t`
    pub fn segment(&self, parent: &NodeState, target_s: f64, target_l: f64, t: usize) -> Segment<'a, E> {
        Segment::new(
            self.env,
            (parent.s, parent.l),
            (target_s, target_l),
            self.lattice.layer_start_time(t),
            self.lattice.unit_time(),
            self.lattice.nseg(),
        )
    }

    /// Kinematic cost of moving from `parent` into cell `(t, s_idx, l_idx)`.
    ///
    /// `None` when the lateral bucket does not exist at the achieved station
    /// (collapsed corridor).
    pub fn transition(&self, parent: &NodeState, t: usize, s_idx: usize, l_idx: usize) -> Option<Transition> {
        let dt = self.lattice.unit_time();
        let weights = &self.config.weights;

        let ds = self.achieved_increment(parent.velocity, self.lattice.station()[s_idx]);
        let s = parent.s + ds;
        let l = self.lattice.lateral_offset(self.env, s, l_idx)?;
        let dl = l - parent.l;
        let velocity = ds / dt;

        let segment = self.segment(parent, s, l, t);
        let (entry_heading, exit_heading) = segment_headings(&segment, parent.heading);

        let clearance = self.lattice.bound_clearance(self.env, s, l);
        let boundary = (1.0 - clearance / self.config.boundary_influence_distance)
            .max(0.0)
            .powi(2);

        let cost = weights.longitudinal_velocity_bias * (velocity - self.config.nominal_velocity).abs()
            + weights.lateral * l.abs()
            + weights.lateral_change * dl.abs()
            + weights.lateral_velocity_change * (dl - parent.dl).abs() / dt
            + weights.heading_change * normalize_angle(entry_heading - parent.heading).abs()
            + weights.boundary * boundary;

        Some(Transition {
            state: NodeState {
                s,
                l,
                velocity: Some(velocity),
                dl,
                heading: exit_heading,
            },
            cost,
        })
    }

    /// Collision cost of the segment `parent -> target` during layer `t`.
    ///
    /// Infinite if any sub-segment overlaps an obstacle, any point leaves the
    /// road or any point lies outside the margin-reduced corridor; otherwise
    /// the weighted mean obstacle-proximity penalty.
    ///
    /// A start pose outside the margin-reduced corridor may only move back
    /// towards it during layer 0: no point of the first segment may lie
    /// further outside than the start itself.
    pub fn collision_cost(&self, parent: &NodeState, target: &NodeState, t: usize) -> f64 {
        let segment = self.segment(parent, target.s, target.l, t);
        let points = segment.points();
        let influence = self.config.obstacle_influence_distance;
        let tolerance = if t == 0 {
            self.lattice.margin_excess(self.env, parent.s, parent.l)
        } else {
            0.0
        };

        let mut penalty = 0.0;
        for p in points.clone() {
            if !self.env.evaluate_station(p.s).contains(p.l)
                || self.lattice.margin_excess(self.env, p.s, p.l) > tolerance + CORRIDOR_EPS
            {
                return f64::INFINITY;
            }
            let clearance = self.env.clearance(p.position, p.time);
            if clearance <= 0.0 {
                return f64::INFINITY;
            }
            penalty += (1.0 - clearance / influence).max(0.0).powi(2);
        }

        for (a, b) in points.clone().tuple_windows() {
            if self.env.check_collision(a.position, b.position, a.time)
                || self.env.check_collision(a.position, b.position, b.time)
            {
                return f64::INFINITY;
            }
        }

        self.config.weights.obstacle * penalty / points.len() as f64
    }
}

/// Heading entering and leaving the segment, falling back to `fallback`
/// where consecutive points coincide.
fn segment_headings<E>(segment: &Segment<'_, E>, fallback: f64) -> (f64, f64)
where
    E: PlanningEnvironment + ?Sized,
{
    let mut points = segment.points();
    let first = points.next();
    let second = points.next();
    let entry = match (first, second) {
        (Some(a), Some(b)) if a.position.distance(&b.position) > MIN_HEADING_DISTANCE => {
            a.position.heading_to(&b.position)
        }
        _ => fallback,
    };

    let mut tail = segment.points().skip(segment.nseg() - 1);
    let exit = match (tail.next(), tail.next()) {
        (Some(a), Some(b)) if a.position.distance(&b.position) > MIN_HEADING_DISTANCE => {
            a.position.heading_to(&b.position)
        }
        _ => entry,
    };
    (entry, exit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::{Environment, ReferenceLine};
    use crate::geometry::Polygon2d;
    use crate::common::Point2D;
    use approx::assert_relative_eq;

    fn test_config() -> DpPlannerConfig {
        DpPlannerConfig {
            horizon: 10.0,
            nfe: 160,
            num_time_layers: 5,
            num_station_buckets: 5,
            num_lateral_buckets: 10,
            ..DpPlannerConfig::default()
        }
    }

    fn straight_env() -> Environment {
        Environment::new(
            ReferenceLine::from_waypoints(&[0.0, 300.0], &[0.0, 0.0], 1.0, 5.0, 5.0).unwrap(),
        )
    }

    #[test]
    fn test_achieved_increment_clamps_to_acceleration() {
        let config = test_config();
        let lattice = Lattice::new(&config);
        let env = straight_env();
        let eval = CostEvaluator::new(&config, &lattice, &env);

        // unit time 2 s, a = 2 m/ss -> +-4 m around v * dt
        assert_relative_eq!(eval.achieved_increment(None, 5.0), 5.0);
        assert_relative_eq!(eval.achieved_increment(Some(10.0), 0.0), 16.0);
        assert_relative_eq!(eval.achieved_increment(Some(10.0), 20.0), 20.0);
        assert_relative_eq!(eval.achieved_increment(Some(0.0), 20.0), 4.0);
        assert_relative_eq!(eval.achieved_increment(Some(1.0), 0.0), 0.0);
    }

    #[test]
    fn test_cruising_on_centerline_is_free() {
        let config = test_config();
        let lattice = Lattice::new(&config);
        let env = straight_env();
        let eval = CostEvaluator::new(&config, &lattice, &env);

        let anchor = NodeState::anchor(0.0, 0.0, 0.0);
        let tr = eval.transition(&anchor, 0, 4, lattice.centerline_index()).unwrap();
        assert_relative_eq!(tr.state.s, 20.0);
        assert_eq!(tr.state.l, 0.0);
        assert_relative_eq!(tr.cost, 0.0, epsilon = 1e-9);
        assert_eq!(eval.collision_cost(&anchor, &tr.state, 0), 0.0);
    }

    #[test]
    fn test_slow_and_offset_transitions_cost_more() {
        let config = test_config();
        let lattice = Lattice::new(&config);
        let env = straight_env();
        let eval = CostEvaluator::new(&config, &lattice, &env);
        let anchor = NodeState::anchor(0.0, 0.0, 0.0);

        let cruise = eval.transition(&anchor, 0, 4, 9).unwrap();
        let slow = eval.transition(&anchor, 0, 2, 9).unwrap();
        let shifted = eval.transition(&anchor, 0, 4, 5).unwrap();
        assert!(slow.cost > cruise.cost);
        assert!(shifted.cost > cruise.cost);
        assert_relative_eq!(shifted.state.l, 1.0, epsilon = 1e-12);
        assert!(shifted.state.heading > 0.0);
    }

    #[test]
    fn test_collision_cost_blocks_overlap() {
        let config = test_config();
        let lattice = Lattice::new(&config);
        let mut env = straight_env();
        env.add_obstacle(Polygon2d::from_box(Point2D::new(10.0, 0.0), 0.0, 2.0, 1.0).unwrap());
        let eval = CostEvaluator::new(&config, &lattice, &env);
        let anchor = NodeState::anchor(0.0, 0.0, 0.0);

        let through = eval.transition(&anchor, 0, 4, 9).unwrap();
        assert!(eval.collision_cost(&anchor, &through.state, 0).is_infinite());

        // ends at l = 2 and clears the box edge by ~0.4 m: finite
        let aside = eval.transition(&anchor, 0, 4, 6).unwrap();
        let cost = eval.collision_cost(&anchor, &aside.state, 0);
        assert!(cost.is_finite());
        assert!(cost > 0.0);
    }

    #[test]
    fn test_collision_cost_leaving_road() {
        let config = test_config();
        let lattice = Lattice::new(&config);
        let env = straight_env();
        let eval = CostEvaluator::new(&config, &lattice, &env);

        // start outside the 5 m corridor
        let outside = NodeState::anchor(0.0, 6.0, 0.0);
        let target = eval.transition(&outside, 0, 4, 9).unwrap();
        assert!(eval.collision_cost(&outside, &target.state, 0).is_infinite());
    }

    fn narrowed_env() -> Environment {
        let reference = ReferenceLine::from_waypoints(&[0.0, 300.0], &[0.0, 0.0], 1.0, 5.0, 5.0)
            .unwrap()
            .with_bounds(|s| {
                if (33.0..=37.0).contains(&s) {
                    crate::common::RoadBounds::new(1.5, 1.5)
                } else {
                    crate::common::RoadBounds::new(5.0, 5.0)
                }
            });
        Environment::new(reference)
    }

    #[test]
    fn test_segment_through_narrowing_is_blocked() {
        let config = test_config();
        let lattice = Lattice::new(&config);
        let env = narrowed_env();
        let eval = CostEvaluator::new(&config, &lattice, &env);

        let parent = NodeState {
            s: 20.0,
            l: 0.0,
            velocity: Some(10.0),
            dl: 0.0,
            heading: 0.0,
        };
        // both ends admissible, but the segment crosses [33, 37] at |l| > 0.5
        let aside = eval.transition(&parent, 1, 4, 3).unwrap();
        assert_relative_eq!(aside.state.l, -1.0, epsilon = 1e-12);
        assert!(eval.collision_cost(&parent, &aside.state, 1).is_infinite());

        let center = eval.transition(&parent, 1, 4, 9).unwrap();
        assert!(eval.collision_cost(&parent, &center.state, 1).is_finite());
    }

    #[test]
    fn test_start_outside_margin_may_only_recover() {
        let config = test_config();
        let lattice = Lattice::new(&config);
        let env = straight_env();
        let eval = CostEvaluator::new(&config, &lattice, &env);

        // 0.6 m beyond the 4 m margin-reduced bound
        let anchor = NodeState::anchor(0.0, 4.6, 0.0);
        let back = eval.transition(&anchor, 0, 4, 9).unwrap();
        assert!(eval.collision_cost(&anchor, &back.state, 0).is_finite());

        // the same segment later in the horizon gets no allowance
        let mut parent = anchor;
        parent.velocity = Some(10.0);
        let later = eval.transition(&parent, 1, 4, 9).unwrap();
        assert!(eval.collision_cost(&parent, &later.state, 1).is_infinite());
    }

    #[test]
    fn test_collapsed_corridor_only_centerline() {
        let config = test_config();
        let lattice = Lattice::new(&config);
        let reference = ReferenceLine::from_waypoints(&[0.0, 300.0], &[0.0, 0.0], 1.0, 5.0, 5.0)
            .unwrap()
            .with_bounds(|s| {
                if s > 15.0 && s < 25.0 {
                    crate::common::RoadBounds::new(0.8, 0.8)
                } else {
                    crate::common::RoadBounds::new(5.0, 5.0)
                }
            });
        let env = Environment::new(reference);
        let eval = CostEvaluator::new(&config, &lattice, &env);
        let anchor = NodeState::anchor(0.0, 0.0, 0.0);

        assert!(eval.transition(&anchor, 0, 4, 3).is_none());
        let center = eval.transition(&anchor, 0, 4, 9).unwrap();
        assert!(center.cost.is_finite());
        // clearance to the collapsed bounds is zero: full boundary penalty
        assert_relative_eq!(center.cost, config.weights.boundary, epsilon = 1e-9);
    }
}
