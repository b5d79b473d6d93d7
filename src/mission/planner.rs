use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tracing::debug;

use super::waypoint::Waypoint;
use crate::error::MissionError;

/// Flat 3D Euclidean distance over `(lat, lng, alt)`.
///
/// Deliberately non-geodesic: a single mission covers a small enough extent
/// that treating degrees as a flat coordinate space is acceptable.
pub fn dist3(a: &Waypoint, b: &Waypoint) -> f64 {
    let dlat = a.lat - b.lat;
    let dlng = a.lng - b.lng;
    let dalt = a.alt - b.alt;
    (dlat * dlat + dlng * dlng + dalt * dalt).sqrt()
}

/// Open-set entry; min-heap ordering on the provisional priority.
struct OpenEntry {
    priority: f64,
    cost: f64,
    node: usize,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.node == other.node
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for BinaryHeap's max-heap; ties broken by node index so
        // the visit order is deterministic.
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.node.cmp(&self.node))
    }
}

/// Orders the waypoint set into a visitation path from `start` using a
/// best-first search over the remaining-waypoints frontier.
///
/// This is a heuristic tour, not exact TSP: waypoint counts are small (tens)
/// and responsiveness to the operator matters more than optimality. The
/// heuristic term for a candidate is the distance to its nearest other
/// remaining waypoint (zero when it is the last one), a lower bound on the
/// tour still ahead of it.
///
/// The output is always a duplicate-free permutation of `waypoints`; losing
/// or inventing a point is a programming defect, not a recoverable state.
pub fn plan(start: &Waypoint, waypoints: &[Waypoint]) -> Result<Vec<Waypoint>, MissionError> {
    let n = waypoints.len();
    if n == 0 {
        return Ok(Vec::new());
    }

    // Node 0 is the start location; node i in 1..=n is waypoints[i - 1].
    let point = |node: usize| if node == 0 { start } else { &waypoints[node - 1] };

    let mut cost = vec![f64::INFINITY; n + 1];
    cost[0] = 0.0;
    let mut remaining = vec![true; n + 1];
    remaining[0] = false;

    let mut order: Vec<usize> = Vec::with_capacity(n);
    let mut open = BinaryHeap::new();
    open.push(OpenEntry {
        priority: 0.0,
        cost: 0.0,
        node: 0,
    });

    while let Some(entry) = open.pop() {
        if entry.cost > cost[entry.node] {
            continue; // stale entry, a cheaper path was found since the push
        }
        if entry.node != 0 {
            if !remaining[entry.node] {
                continue;
            }
            remaining[entry.node] = false;
            order.push(entry.node);
        }

        let current = point(entry.node);
        for neighbor in 1..=n {
            if !remaining[neighbor] {
                continue;
            }
            let tentative = cost[entry.node] + dist3(current, &waypoints[neighbor - 1]);
            if tentative < cost[neighbor] {
                cost[neighbor] = tentative;
                open.push(OpenEntry {
                    priority: tentative + nearest_remaining(neighbor, &remaining, waypoints),
                    cost: tentative,
                    node: neighbor,
                });
            }
        }
    }

    if order.len() != n {
        return Err(MissionError::PlanningDefect(format!(
            "ordered {} of {} waypoints",
            order.len(),
            n
        )));
    }

    debug!("Planned visitation order for {} waypoints", n);
    Ok(order.into_iter().map(|node| waypoints[node - 1]).collect())
}

/// Distance from `node` to its nearest other remaining waypoint, zero when
/// it is the last one left.
fn nearest_remaining(node: usize, remaining: &[bool], waypoints: &[Waypoint]) -> f64 {
    let from = &waypoints[node - 1];
    let mut best = f64::INFINITY;
    for (other, still_remaining) in remaining.iter().enumerate().skip(1) {
        if other == node || !still_remaining {
            continue;
        }
        let d = dist3(from, &waypoints[other - 1]);
        if d < best {
            best = d;
        }
    }
    if best.is_finite() {
        best
    } else {
        0.0
    }
}
