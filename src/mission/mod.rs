pub mod planner;
pub mod waypoint;
