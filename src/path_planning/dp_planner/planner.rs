//! DP seed planner
//!
//! Forward stage-wise search over a (time, station, lateral) lattice with
//! back-pointers, followed by reconstruction of a densified Cartesian
//! trajectory along the winning chain.
//!
//! Based on:
//! - Bai Li et al., "Autonomous Driving on Curvy Roads without Reliance on
//!   Frenet Frame: A Cartesian-based Trajectory Planning Method", IEEE T-ITS 2022

use log::{debug, trace};
use ordered_float::OrderedFloat;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::common::{PlannerResult, PlanningEnvironment, Point2D, Pose2D, TrajectoryPlanner};

use super::config::DpPlannerConfig;
use super::cost::{CostEvaluator, NodeState};
use super::interpolation::{Segment, SegmentPoint};
use super::lattice::Lattice;
use super::trajectory::{DiscretizedTrajectory, TrajectoryPoint};

const MIN_HEADING_DISTANCE: f64 = 1e-6;

/// Lattice coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateIndex {
    pub t: usize,
    pub s: usize,
    pub l: usize,
}

impl StateIndex {
    pub fn new(t: usize, s: usize, l: usize) -> Self {
        Self { t, s, l }
    }
}

/// Search state of one lattice cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateCell {
    /// Cumulative cost, infinite while unreached
    pub cost: f64,
    /// Achieved state, `None` while unset
    pub state: Option<NodeState>,
    /// (s, l) of the best predecessor in the previous layer; `None` for layer 0
    pub parent: Option<(usize, usize)>,
}

impl Default for StateCell {
    fn default() -> Self {
        Self {
            cost: f64::INFINITY,
            state: None,
            parent: None,
        }
    }
}

impl StateCell {
    pub fn is_reachable(&self) -> bool {
        self.cost.is_finite() && self.state.is_some()
    }
}

/// Dense row-major (t, s, l) arena
#[derive(Debug, Clone)]
struct StateSpace {
    ns: usize,
    nl: usize,
    cells: Vec<StateCell>,
}

impl StateSpace {
    fn new(nt: usize, ns: usize, nl: usize) -> Self {
        Self {
            ns,
            nl,
            cells: vec![StateCell::default(); nt * ns * nl],
        }
    }

    fn reset(&mut self) {
        self.cells.fill(StateCell::default());
    }

    fn layer_len(&self) -> usize {
        self.ns * self.nl
    }

    fn offset(&self, index: StateIndex) -> usize {
        index.t * self.layer_len() + index.s * self.nl + index.l
    }

    fn get(&self, index: StateIndex) -> Option<&StateCell> {
        if index.s >= self.ns || index.l >= self.nl {
            return None;
        }
        self.cells.get(self.offset(index))
    }

    fn layer(&self, t: usize) -> &[StateCell] {
        let len = self.layer_len();
        &self.cells[t * len..(t + 1) * len]
    }

    /// Finalized layer `t - 1` (empty for `t == 0`) and mutable layer `t`
    fn split_layer(&mut self, t: usize) -> (&[StateCell], &mut [StateCell]) {
        let len = self.layer_len();
        let (done, rest) = self.cells.split_at_mut(t * len);
        let prev = if t == 0 { &done[..0] } else { &done[(t - 1) * len..] };
        (prev, &mut rest[..len])
    }
}

/// One cell of the winning chain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainNode {
    pub index: StateIndex,
    /// Achieved station
    pub s: f64,
    /// Physical lateral offset
    pub l: f64,
    /// Cumulative cost at this cell
    pub cost: f64,
}

/// Ordering of equally good candidates: cost, then the centerline bucket,
/// then the smaller absolute offset, then the lower station and lateral index.
type RankKey = (OrderedFloat<f64>, bool, OrderedFloat<f64>, usize, usize);

fn rank(lattice: &Lattice, cost: f64, s_idx: usize, l_idx: usize, l: f64) -> RankKey {
    (
        OrderedFloat(cost),
        !lattice.is_centerline(l_idx),
        OrderedFloat(l.abs()),
        s_idx,
        l_idx,
    )
}

/// Best cell for `(t, s_idx, l_idx)` given the finalized previous layer
fn relax_cell<E>(
    evaluator: &CostEvaluator<'_, E>,
    lattice: &Lattice,
    anchor: &NodeState,
    index: StateIndex,
    prev: &[StateCell],
) -> StateCell
where
    E: PlanningEnvironment + ?Sized,
{
    let mut best = StateCell::default();
    let mut best_rank: Option<RankKey> = None;

    let mut consider = |parent_cost: f64, parent: &NodeState, parent_idx: Option<(usize, usize)>| {
        let transition = match evaluator.transition(parent, index.t, index.s, index.l) {
            Some(transition) => transition,
            None => return,
        };
        let partial = parent_cost + transition.cost;
        // collision cost is non-negative
        if let Some(r) = best_rank {
            if partial > r.0.into_inner() {
                return;
            }
        }
        let total = partial + evaluator.collision_cost(parent, &transition.state, index.t);
        if !total.is_finite() {
            return;
        }

        let key = match parent_idx {
            Some((ps, pl)) => rank(lattice, total, ps, pl, parent.l),
            None => (OrderedFloat(total), false, OrderedFloat(0.0), 0, 0),
        };
        if best_rank.map_or(true, |r| key < r) {
            best_rank = Some(key);
            best = StateCell {
                cost: total,
                state: Some(transition.state),
                parent: parent_idx,
            };
        }
    };

    if index.t == 0 {
        consider(0.0, anchor, None);
    } else {
        let nl = lattice.nl();
        for (i, cell) in prev.iter().enumerate() {
            if let Some(state) = cell.state.filter(|_| cell.cost.is_finite()) {
                consider(cell.cost, &state, Some((i / nl, i % nl)));
            }
        }
    }
    best
}

/// DP seed planner over a borrowed, read-only environment.
///
/// The lattice is owned by the planner and reset on every call to
/// [`DpPlanner::plan`]; `plan` takes `&mut self`, so one instance cannot run
/// two searches at once.
pub struct DpPlanner<'a, E: ?Sized> {
    env: &'a E,
    config: DpPlannerConfig,
    lattice: Lattice,
    state_space: StateSpace,
    last_cost: Option<f64>,
    last_chain: Vec<ChainNode>,
}

impl<'a, E> DpPlanner<'a, E>
where
    E: PlanningEnvironment + ?Sized,
{
    pub fn new(config: DpPlannerConfig, env: &'a E) -> PlannerResult<Self> {
        config.validate()?;
        let lattice = Lattice::new(&config);
        let state_space = StateSpace::new(lattice.nt(), lattice.ns(), lattice.nl());
        Ok(Self {
            env,
            config,
            lattice,
            state_space,
            last_cost: None,
            last_chain: Vec::new(),
        })
    }

    pub fn with_defaults(env: &'a E) -> PlannerResult<Self> {
        Self::new(DpPlannerConfig::default(), env)
    }

    pub fn config(&self) -> &DpPlannerConfig {
        &self.config
    }

    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    /// Cumulative cost of the last successful plan
    pub fn last_cost(&self) -> Option<f64> {
        self.last_cost
    }

    /// Winning chain of the last successful plan, start to goal
    pub fn last_chain(&self) -> &[ChainNode] {
        &self.last_chain
    }

    /// Search state of a lattice cell after the last plan
    pub fn state_cell(&self, index: StateIndex) -> Option<&StateCell> {
        if index.t >= self.lattice.nt() {
            return None;
        }
        self.state_space.get(index)
    }

    pub fn plan_from(&mut self, start: Pose2D) -> Option<DiscretizedTrajectory> {
        self.plan(start.x, start.y, start.yaw)
    }

    /// Plan a seed trajectory from the start pose.
    ///
    /// Returns `None` when no lattice chain is collision free; the caller
    /// decides how to fall back.
    pub fn plan(&mut self, start_x: f64, start_y: f64, start_theta: f64) -> Option<DiscretizedTrajectory> {
        self.last_cost = None;
        self.last_chain.clear();

        let (start_s, start_l) = self.env.project(Point2D::new(start_x, start_y));
        let anchor = NodeState::anchor(start_s, start_l, start_theta);
        debug!(
            "[DpPlanner] plan: start=({:.2},{:.2},{:.2}) -> s={:.2} l={:.2}",
            start_x, start_y, start_theta, start_s, start_l
        );

        self.state_space.reset();
        let terminal = self.search(&anchor)?;
        let chain = self.backtrack(terminal);
        let trajectory = self.reconstruct(&anchor, &chain);

        let cost = chain.last().map(|n| n.cost);
        debug!(
            "[DpPlanner] success: cost={:.3} terminal=({},{},{}) points={}",
            cost.unwrap_or(f64::NAN),
            terminal.t,
            terminal.s,
            terminal.l,
            trajectory.len()
        );
        self.last_cost = cost;
        self.last_chain = chain;
        Some(trajectory)
    }

    /// Fill every layer in order; returns the selected terminal cell
    fn search(&mut self, anchor: &NodeState) -> Option<StateIndex> {
        let nl = self.lattice.nl();
        let evaluator = CostEvaluator::new(&self.config, &self.lattice, self.env);
        let lattice = &self.lattice;

        for t in 0..lattice.nt() {
            let (prev, cur) = self.state_space.split_layer(t);

            #[cfg(feature = "parallel")]
            cur.par_iter_mut().enumerate().for_each(|(i, cell)| {
                *cell = relax_cell(&evaluator, lattice, anchor, StateIndex::new(t, i / nl, i % nl), prev);
            });
            #[cfg(not(feature = "parallel"))]
            for (i, cell) in cur.iter_mut().enumerate() {
                *cell = relax_cell(&evaluator, lattice, anchor, StateIndex::new(t, i / nl, i % nl), prev);
            }

            let reachable = cur.iter().filter(|c| c.is_reachable()).count();
            trace!("[DpPlanner] layer {}: {}/{} cells reachable", t, reachable, cur.len());
            if reachable == 0 {
                // later layers can only be reached through this one
                debug!("[DpPlanner] FAILED: layer {} unreachable, stopping early", t);
                return None;
            }
        }

        let t = lattice.nt() - 1;
        self.state_space
            .layer(t)
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_reachable())
            .min_by_key(|(i, c)| {
                let l = c.state.map_or(0.0, |st| st.l);
                rank(lattice, c.cost, i / nl, i % nl, l)
            })
            .map(|(i, _)| StateIndex::new(t, i / nl, i % nl))
    }

    /// Follow back-pointers from `terminal`; returns the chain start to goal
    fn backtrack(&self, terminal: StateIndex) -> Vec<ChainNode> {
        let mut chain = Vec::with_capacity(self.lattice.nt());
        let mut current = Some(terminal);

        while let Some(index) = current {
            let cell = match self.state_space.get(index) {
                Some(cell) => cell,
                None => break,
            };
            if let Some(state) = cell.state {
                chain.push(ChainNode {
                    index,
                    s: state.s,
                    l: state.l,
                    cost: cell.cost,
                });
            }
            current = match cell.parent {
                Some((s, l)) if index.t > 0 => Some(StateIndex::new(index.t - 1, s, l)),
                _ => None,
            };
        }

        chain.reverse();
        chain
    }

    /// Densify the chain into a time-stamped Cartesian trajectory
    fn reconstruct(&self, anchor: &NodeState, chain: &[ChainNode]) -> DiscretizedTrajectory {
        let nseg = self.lattice.nseg();
        let mut samples: Vec<SegmentPoint> = Vec::with_capacity(chain.len() * nseg + 1);
        let mut from = (anchor.s, anchor.l);
        let mut final_point = None;

        for node in chain {
            let segment = Segment::new(
                self.env,
                from,
                (node.s, node.l),
                self.lattice.layer_start_time(node.index.t),
                self.lattice.unit_time(),
                nseg,
            );
            samples.extend(segment.points().take(nseg));
            final_point = segment.points().last();
            from = (node.s, node.l);
        }
        samples.extend(final_point);

        let mut points = Vec::with_capacity(samples.len());
        let mut theta = anchor.heading;
        let mut velocity = 0.0;
        for (i, p) in samples.iter().enumerate() {
            if let Some(next) = samples.get(i + 1) {
                let distance = p.position.distance(&next.position);
                if distance > MIN_HEADING_DISTANCE {
                    theta = p.position.heading_to(&next.position);
                }
                let dt = next.time - p.time;
                velocity = if dt > 0.0 { distance / dt } else { 0.0 };
            }
            points.push(TrajectoryPoint {
                time: p.time,
                s: p.s,
                l: p.l,
                x: p.position.x,
                y: p.position.y,
                theta,
                velocity,
            });
        }
        DiscretizedTrajectory::new(points)
    }
}

impl<'a, E> TrajectoryPlanner for DpPlanner<'a, E>
where
    E: PlanningEnvironment + ?Sized,
{
    fn plan_trajectory(&mut self, start: Pose2D) -> Option<DiscretizedTrajectory> {
        self.plan_from(start)
    }
}
