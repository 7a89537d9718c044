//! End-to-end planning scenarios on straight and curvy roads

use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use cartesian_planner::environment::{DynamicObstacle, Environment, ReferenceLine};
use cartesian_planner::geometry::Polygon2d;
use cartesian_planner::path_planning::dp_planner::{DiscretizedTrajectory, DpPlanner, DpPlannerConfig};
use cartesian_planner::{PlanningEnvironment, Point2D, RoadBounds};

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

fn straight_road() -> ReferenceLine {
    ReferenceLine::from_waypoints(&[0.0, 300.0], &[0.0, 0.0], 1.0, 5.0, 5.0).unwrap()
}

fn curvy_road() -> ReferenceLine {
    ReferenceLine::from_waypoints(
        &[0.0, 10.0, 20.5, 35.0, 70.5, 100.0, 140.0, 180.0],
        &[0.0, -6.0, 5.0, 6.5, 0.0, -5.0, 0.0, 3.0],
        0.5,
        5.0,
        5.0,
    )
    .unwrap()
}

/// Largest distance of any trajectory point outside the margin-reduced corridor
fn worst_margin_excess(env: &Environment, margin: f64, traj: &DiscretizedTrajectory) -> f64 {
    traj.points()
        .iter()
        .map(|p| match env.evaluate_station(p.s).shrink(margin) {
            Some((lb, ub)) => (lb - p.l).max(p.l - ub).max(0.0),
            None => p.l.abs(),
        })
        .fold(0.0, f64::max)
}

fn wall(x_min: f64, x_max: f64) -> Polygon2d {
    Polygon2d::new(vec![
        Point2D::new(x_min, -6.0),
        Point2D::new(x_max, -6.0),
        Point2D::new(x_max, 6.0),
        Point2D::new(x_min, 6.0),
    ])
    .unwrap()
}

#[test]
fn test_empty_road_follows_centerline() {
    let env = Environment::new(straight_road());
    let config = test_config();
    let mut planner = DpPlanner::new(config.clone(), &env).unwrap();
    let traj = planner.plan(0.0, 0.0, 0.0).unwrap();

    assert_eq!(traj.len(), config.num_time_layers * config.nseg() + 1);
    assert!(planner
        .last_chain()
        .iter()
        .all(|n| n.index.l == planner.lattice().centerline_index()));
    assert_relative_eq!(traj.total_length(), config.max_velocity * config.horizon, epsilon = 1e-6);
    assert_relative_eq!(traj.duration(), config.horizon, epsilon = 1e-9);
    assert_relative_eq!(planner.last_cost().unwrap(), 0.0, epsilon = 1e-9);

    for w in traj.points().windows(2) {
        assert!(w[1].time > w[0].time);
        assert_relative_eq!(w[0].velocity, config.max_velocity, epsilon = 1e-6);
        assert_relative_eq!(w[0].theta, 0.0, epsilon = 1e-9);
    }
}

#[test]
fn test_single_obstacle_sidestep() {
    let mut env = Environment::new(straight_road());
    let mut planner = DpPlanner::new(test_config(), &env).unwrap();
    planner.plan(0.0, 0.0, 0.0).unwrap();
    let free_cost = planner.last_cost().unwrap();

    env.add_obstacle(Polygon2d::from_box(Point2D::new(40.0, 0.0), 0.0, 4.0, 1.0).unwrap());
    let mut planner = DpPlanner::new(test_config(), &env).unwrap();
    planner.plan(0.0, 0.0, 0.0).unwrap();

    let chain = planner.last_chain();
    assert_eq!(chain.len(), 5);
    // the node level with the obstacle moves one bucket aside
    assert_relative_eq!(chain[1].s, 40.0, epsilon = 1e-9);
    assert_relative_eq!(chain[1].l.abs(), 1.0, epsilon = 1e-9);
    for (i, node) in chain.iter().enumerate().filter(|(i, _)| *i != 1) {
        assert!(node.l.abs() < 1e-9, "layer {} left the centerline", i);
    }
    assert!(planner.last_cost().unwrap() > free_cost);
}

#[test]
fn test_planning_is_deterministic() {
    let env = Environment::new(curvy_road())
        .with_obstacles(vec![Polygon2d::from_box(Point2D::new(30.0, 4.0), 0.3, 4.0, 2.0).unwrap()]);

    let mut first = DpPlanner::new(test_config(), &env).unwrap();
    let mut second = DpPlanner::new(test_config(), &env).unwrap();
    let a = first.plan(0.0, 0.0, -0.5);
    let b = first.plan(0.0, 0.0, -0.5);
    let c = second.plan(0.0, 0.0, -0.5);

    assert!(a.is_some());
    assert_eq!(a, b);
    assert_eq!(a, c);
    assert_eq!(first.last_chain(), second.last_chain());
}

#[test]
fn test_progress_is_monotonic_and_bounded() {
    let env = Environment::new(curvy_road());
    let config = test_config();
    let mut planner = DpPlanner::new(config.clone(), &env).unwrap();
    let traj = planner.plan(0.0, 0.0, -0.5).unwrap();

    let max_step = config.max_velocity * config.unit_time() + 1e-9;
    let mut prev_s = 0.0;
    for node in planner.last_chain() {
        let ds = node.s - prev_s;
        assert!(ds >= 0.0 && ds <= max_step);
        prev_s = node.s;
    }
    for w in traj.points().windows(2) {
        assert!(w[1].s >= w[0].s);
    }
}

#[test]
fn test_lateral_positions_are_admissible() {
    let env = Environment::new(straight_road())
        .with_obstacles(vec![Polygon2d::from_box(Point2D::new(40.0, 1.0), 0.0, 4.0, 2.0).unwrap()]);
    let config = test_config();
    let mut planner = DpPlanner::new(config.clone(), &env).unwrap();
    planner.plan(0.0, 0.0, 0.0).unwrap();

    for node in planner.last_chain() {
        if planner.lattice().is_centerline(node.index.l) {
            assert_eq!(node.l, 0.0);
        } else {
            let (lb, ub) = env
                .evaluate_station(node.s)
                .shrink(config.safety_margin)
                .unwrap();
            assert!(node.l >= lb - 1e-9 && node.l <= ub + 1e-9);
        }
    }
}

#[test]
fn test_trajectory_stays_inside_narrowed_corridor() {
    let reference = straight_road().with_bounds(|s| {
        if (33.0..=37.0).contains(&s) {
            RoadBounds::new(1.5, 1.5)
        } else {
            RoadBounds::new(5.0, 5.0)
        }
    });
    let env = Environment::new(reference)
        .with_obstacles(vec![Polygon2d::from_box(Point2D::new(40.0, 0.0), 0.0, 4.0, 1.0).unwrap()]);
    let config = test_config();
    let mut planner = DpPlanner::new(config.clone(), &env).unwrap();
    let traj = planner.plan(0.0, 0.0, 0.0).unwrap();

    // chain nodes alone are not enough: every densified point must fit
    assert!(worst_margin_excess(&env, config.safety_margin, &traj) <= 1e-9);
}

#[test]
fn test_start_outside_margin_recovers() {
    let env = Environment::new(straight_road());
    let config = test_config();
    let mut planner = DpPlanner::new(config.clone(), &env).unwrap();
    let traj = planner.plan(0.0, 4.6, 0.0).unwrap();

    // never further out than the start, and inside once layer 0 is over
    assert!(worst_margin_excess(&env, config.safety_margin, &traj) <= 0.6 + 1e-9);
    let later: Vec<_> = traj
        .points()
        .iter()
        .filter(|p| p.time >= config.unit_time())
        .copied()
        .collect();
    let later = DiscretizedTrajectory::new(later);
    assert!(!later.is_empty());
    assert!(worst_margin_excess(&env, config.safety_margin, &later) <= 1e-9);
}

#[test]
fn test_random_obstacles_are_never_hit() {
    let mut rng = StdRng::seed_from_u64(7);
    let reference = straight_road();

    for _ in 0..5 {
        let mut env = Environment::new(reference.clone());
        for _ in 0..3 {
            let center = Point2D::new(rng.gen_range(30.0..90.0), rng.gen_range(-3.0..3.0));
            env.add_obstacle(Polygon2d::from_box(center, rng.gen_range(-0.5..0.5), 4.0, 2.0).unwrap());
        }

        let mut planner = DpPlanner::new(test_config(), &env).unwrap();
        let traj = match planner.plan(0.0, 0.0, 0.0) {
            Some(traj) => traj,
            None => continue,
        };
        for w in traj.points().windows(2) {
            let a = Point2D::new(w[0].x, w[0].y);
            let b = Point2D::new(w[1].x, w[1].y);
            assert!(!env.check_collision(a, b, w[0].time));
            assert!(!env.check_collision(a, b, w[1].time));
        }
        for p in traj.points() {
            assert!(env.evaluate_station(p.s).contains(p.l));
        }
        assert!(worst_margin_excess(&env, 1.0, &traj) <= 1e-9);
    }
}

#[test]
fn test_wall_ahead_forces_a_stop() {
    let env = Environment::new(straight_road()).with_obstacles(vec![wall(48.0, 52.0)]);
    let mut planner = DpPlanner::new(test_config(), &env).unwrap();
    let traj = planner.plan(0.0, 0.0, 0.0).unwrap();

    assert!(traj.points().iter().all(|p| p.x < 48.0));
    assert!(planner.last_cost().unwrap() > 0.0);
}

#[test]
fn test_wall_over_start_is_infeasible() {
    let env = Environment::new(straight_road()).with_obstacles(vec![wall(-10.0, 250.0)]);
    let mut planner = DpPlanner::new(test_config(), &env).unwrap();
    assert!(planner.plan(0.0, 0.0, 0.0).is_none());
    assert!(planner.last_cost().is_none());
}

#[test]
fn test_dynamic_wall_is_infeasible() {
    let mut env = Environment::new(straight_road());
    env.add_dynamic_obstacle(DynamicObstacle::new(vec![(1.0, wall(-10.0, 250.0))]).unwrap());
    let mut planner = DpPlanner::new(test_config(), &env).unwrap();
    assert!(planner.plan(0.0, 0.0, 0.0).is_none());
}

#[test]
fn test_dynamic_obstacle_timing() {
    let obstacle = Polygon2d::from_box(Point2D::new(40.0, 0.0), 0.0, 4.0, 1.0).unwrap();

    // appears after the vehicle has passed
    let mut late = Environment::new(straight_road());
    late.add_dynamic_obstacle(DynamicObstacle::new(vec![(6.0, obstacle.clone())]).unwrap());
    let mut planner = DpPlanner::new(test_config(), &late).unwrap();
    planner.plan(0.0, 0.0, 0.0).unwrap();
    assert_relative_eq!(planner.last_cost().unwrap(), 0.0, epsilon = 1e-9);

    // present when the vehicle arrives
    let mut early = Environment::new(straight_road());
    early.add_dynamic_obstacle(DynamicObstacle::new(vec![(3.0, obstacle)]).unwrap());
    let mut planner = DpPlanner::new(test_config(), &early).unwrap();
    planner.plan(0.0, 0.0, 0.0).unwrap();
    assert!(planner.last_cost().unwrap() > 0.0);
    assert_relative_eq!(planner.last_chain()[1].l.abs(), 1.0, epsilon = 1e-9);
}

#[test]
fn test_curvy_road_plan() {
    let reference = curvy_road();
    let heading = reference.evaluate_station(0.0).theta;
    let env = Environment::new(reference);
    let config = test_config();
    let mut planner = DpPlanner::new(config.clone(), &env).unwrap();
    let traj = planner.plan(0.0, 0.0, heading).unwrap();

    assert_eq!(traj.len(), config.nfe + 1);
    assert_relative_eq!(traj.points()[0].x, 0.0, epsilon = 1e-6);
    assert_relative_eq!(traj.points()[0].y, 0.0, epsilon = 1e-6);
    for p in traj.points() {
        assert!(env.evaluate_station(p.s).contains(p.l));
    }
}
