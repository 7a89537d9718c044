// DP seed trajectory planning on a curvy road
//
// Usage: dp_planner [config.yaml]
//
// Reference: Bai Li et al., "Autonomous Driving on Curvy Roads without
// Reliance on Frenet Frame: A Cartesian-based Trajectory Planning Method"

use std::error::Error;
use std::path::Path;

use log::{info, warn};

use cartesian_planner::environment::{DynamicObstacle, Environment, ReferenceLine};
use cartesian_planner::geometry::Polygon2d;
use cartesian_planner::path_planning::dp_planner::{DpPlanner, DpPlannerConfig};
use cartesian_planner::utils::plot_scene;
use cartesian_planner::Pose2D;

/// Vehicle-sized box on the road at (s, l), aligned with the reference
fn box_on_road(reference: &ReferenceLine, s: f64, l: f64) -> Result<Polygon2d, Box<dyn Error>> {
    let center = reference.get_cartesian(s, l);
    let heading = reference.evaluate_station(s).theta;
    Ok(Polygon2d::from_box(center, heading, 4.0, 2.0)?)
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            info!("loading config from {}", path);
            DpPlannerConfig::load(Path::new(&path))?
        }
        None => DpPlannerConfig::default(),
    };

    let wx = [0.0, 10.0, 20.5, 35.0, 70.5, 100.0, 140.0, 180.0];
    let wy = [0.0, -6.0, 5.0, 6.5, 0.0, -5.0, 0.0, 3.0];
    let reference = ReferenceLine::from_waypoints(&wx, &wy, 0.5, 5.0, 5.0)?;

    let mut env = Environment::new(reference.clone());
    env.add_obstacle(box_on_road(&reference, 30.0, 1.5)?);
    env.add_obstacle(box_on_road(&reference, 75.0, -2.0)?);

    // slower vehicle in the lane ahead
    let keyframes = (0..=16)
        .map(|i| {
            let t = i as f64;
            box_on_road(&reference, 50.0 + 5.0 * t, 0.0).map(|b| (t, b))
        })
        .collect::<Result<Vec<_>, _>>()?;
    env.add_dynamic_obstacle(DynamicObstacle::new(keyframes)?);

    let start = Pose2D::new(0.0, 0.0, reference.evaluate_station(0.0).theta);
    let mut planner = DpPlanner::new(config, &env)?;

    let trajectory = planner.plan_from(start);
    match &trajectory {
        Some(traj) => {
            info!(
                "found seed trajectory: {} points, {:.1} m, cost {:.3}",
                traj.len(),
                traj.total_length(),
                planner.last_cost().unwrap_or(f64::NAN)
            );
            for node in planner.last_chain() {
                info!(
                    "  layer {}: s={:.2} l={:.2} cost={:.3}",
                    node.index.t, node.s, node.l, node.cost
                );
            }
        }
        None => warn!("no collision-free seed trajectory found"),
    }

    let mut vis = plot_scene(&env, &start, trajectory.as_ref(), "DP seed trajectory");
    if let Err(e) = vis.show() {
        warn!("plotting failed: {}", e);
    }
    Ok(())
}
