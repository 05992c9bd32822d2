// graph_layout/src/simulation.rs
//! Discrete-time force relaxation over a merged graph.
//!
//! Positions are seeded heuristically (disease at the canvas center,
//! factors fanned out by relationship type, everything else on an outer
//! ring), then relaxed under spring, repulsion, collision and weak
//! centering forces while a decaying alpha parameter scales each step.
//! The loop never errors: it stops when alpha falls below the threshold
//! or the wall-clock budget runs out, and stays frozen until reheated.
//! No randomness is involved, so equal inputs settle identically.

use std::collections::HashMap;
use std::f64::consts::PI;
use std::time::Instant;

use log::debug;

use models::graph::CombinedGraph;
use models::links::Relationship;
use models::nodes::NodeType;

use crate::forces::{charge_scale, distance_multiplier, node_radius, LayoutConfig};

// Collision separation is a multiple of the rendered radius so labels fit
// between neighbors.
const COLLIDE_RADIUS_FACTOR: f64 = 3.0;
const SEED_RADIUS: f64 = 140.0;
const OUTER_RING_RADIUS: f64 = 280.0;
const SEED_SECTOR_SPREAD: f64 = PI / 3.0;

struct Body {
    id: String,
    x: f64,
    y: f64,
    vx: f64,
    vy: f64,
    fx: Option<f64>,
    fy: Option<f64>,
    charge: f64,
    collide_radius: f64,
}

struct Spring {
    source: usize,
    target: usize,
    rest_length: f64,
}

pub struct Simulation {
    bodies: Vec<Body>,
    springs: Vec<Spring>,
    index: HashMap<String, usize>,
    alpha: f64,
    alpha_target: f64,
    frozen: bool,
    config: LayoutConfig,
}

impl Simulation {
    pub fn new(graph: &CombinedGraph, config: LayoutConfig) -> Self {
        let seeds = seed_positions(graph, &config);

        let mut index = HashMap::with_capacity(graph.node_count());
        let mut bodies = Vec::with_capacity(graph.node_count());
        for node in &graph.nodes {
            let (x, y) = seeds[&node.id];
            index.insert(node.id.clone(), bodies.len());
            bodies.push(Body {
                id: node.id.clone(),
                x,
                y,
                vx: 0.0,
                vy: 0.0,
                fx: None,
                fy: None,
                charge: config.charge_strength * charge_scale(&node.node_type),
                collide_radius: node_radius(&node.node_type) * COLLIDE_RADIUS_FACTOR,
            });
        }

        let springs = graph
            .links
            .iter()
            .map(|link| Spring {
                source: index[&link.source],
                target: index[&link.target],
                rest_length: config.link_distance * distance_multiplier(&link.relationship),
            })
            .collect();

        // A degenerate graph has nothing to relax.
        let frozen = bodies.is_empty();

        Simulation {
            bodies,
            springs,
            index,
            alpha: if frozen { 0.0 } else { 1.0 },
            alpha_target: 0.0,
            frozen,
            config,
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// True once the relaxation has stopped mutating positions.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn has_converged(&self) -> bool {
        self.alpha < self.config.alpha_min && self.alpha_target < self.config.alpha_min
    }

    /// Advance one tick. Returns false without touching positions when the
    /// simulation is frozen.
    pub fn step(&mut self) -> bool {
        if self.frozen {
            return false;
        }

        self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;
        if self.has_converged() {
            self.freeze();
            return false;
        }

        self.apply_springs();
        self.apply_charges();
        self.apply_collisions();
        self.apply_centering();
        self.integrate();
        true
    }

    /// Relax until convergence or until the wall-clock budget elapses,
    /// whichever comes first, then freeze.
    pub fn run(&mut self) {
        let started = Instant::now();
        let mut steps = 0u32;
        while !self.frozen {
            if started.elapsed() >= self.config.time_budget {
                debug!("layout budget elapsed after {} steps (alpha {:.4})", steps, self.alpha);
                self.freeze();
                break;
            }
            if !self.step() {
                break;
            }
            steps += 1;
        }
        debug!("layout settled after {} steps (alpha {:.4})", steps, self.alpha);
    }

    fn freeze(&mut self) {
        self.frozen = true;
        for body in &mut self.bodies {
            body.vx = 0.0;
            body.vy = 0.0;
        }
    }

    /// Pin a node at the drag position and reheat so the rest of the graph
    /// re-settles around it.
    pub fn pin(&mut self, id: &str, x: f64, y: f64) {
        if let Some(&pos) = self.index.get(id) {
            let body = &mut self.bodies[pos];
            body.fx = Some(x);
            body.fy = Some(y);
            body.x = x;
            body.y = y;
            self.alpha_target = self.config.reheat_alpha;
            self.alpha = self.alpha.max(self.config.reheat_alpha);
            self.frozen = false;
        }
    }

    /// Move an already-pinned node; positions of everything else keep
    /// relaxing around the pin.
    pub fn drag(&mut self, id: &str, x: f64, y: f64) {
        if let Some(&pos) = self.index.get(id) {
            let body = &mut self.bodies[pos];
            if body.fx.is_some() {
                body.fx = Some(x);
                body.fy = Some(y);
                body.x = x;
                body.y = y;
            }
        }
    }

    /// Release a pinned node and let alpha decay naturally again.
    pub fn release(&mut self, id: &str) {
        if let Some(&pos) = self.index.get(id) {
            self.bodies[pos].fx = None;
            self.bodies[pos].fy = None;
        }
        self.alpha_target = 0.0;
    }

    /// Restart the relaxation from the current positions.
    pub fn reheat(&mut self) {
        self.alpha = 1.0;
        self.alpha_target = 0.0;
        self.frozen = self.bodies.is_empty();
    }

    pub fn position(&self, id: &str) -> Option<(f64, f64)> {
        self.index.get(id).map(|&pos| (self.bodies[pos].x, self.bodies[pos].y))
    }

    pub fn positions(&self) -> impl Iterator<Item = (&str, f64, f64)> {
        self.bodies.iter().map(|b| (b.id.as_str(), b.x, b.y))
    }

    /// Write the current coordinates back onto the graph's nodes.
    pub fn apply_to(&self, graph: &mut CombinedGraph) {
        for body in &self.bodies {
            if let Some(node) = graph.node_mut(&body.id) {
                node.x = Some(body.x);
                node.y = Some(body.y);
                node.fx = body.fx;
                node.fy = body.fy;
            }
        }
    }

    fn apply_springs(&mut self) {
        for spring in &self.springs {
            if spring.source == spring.target {
                continue;
            }
            let (sx, sy) = (self.bodies[spring.source].x, self.bodies[spring.source].y);
            let (tx, ty) = (self.bodies[spring.target].x, self.bodies[spring.target].y);
            let dx = tx - sx;
            let dy = ty - sy;
            let dist = (dx * dx + dy * dy).sqrt().max(1e-3);
            let displacement = (dist - spring.rest_length) / dist * 0.5 * self.alpha;
            let (mx, my) = (dx * displacement, dy * displacement);

            let source = &mut self.bodies[spring.source];
            source.vx += mx * 0.5;
            source.vy += my * 0.5;
            let target = &mut self.bodies[spring.target];
            target.vx -= mx * 0.5;
            target.vy -= my * 0.5;
        }
    }

    // Pairwise many-body repulsion, O(n^2); the run budget bounds total
    // CPU on large graphs.
    fn apply_charges(&mut self) {
        for i in 0..self.bodies.len() {
            for j in (i + 1)..self.bodies.len() {
                let dx = self.bodies[i].x - self.bodies[j].x;
                let dy = self.bodies[i].y - self.bodies[j].y;
                let d2 = (dx * dx + dy * dy).max(1.0);

                let push_i = -self.bodies[j].charge * self.alpha / d2;
                self.bodies[i].vx += dx * push_i;
                self.bodies[i].vy += dy * push_i;

                let push_j = -self.bodies[i].charge * self.alpha / d2;
                self.bodies[j].vx -= dx * push_j;
                self.bodies[j].vy -= dy * push_j;
            }
        }
    }

    fn apply_collisions(&mut self) {
        let strength = self.config.collide_strength.clamp(0.0, 1.0);
        for i in 0..self.bodies.len() {
            for j in (i + 1)..self.bodies.len() {
                let min_dist = self.bodies[i].collide_radius + self.bodies[j].collide_radius;
                let dx = self.bodies[i].x - self.bodies[j].x;
                let dy = self.bodies[i].y - self.bodies[j].y;
                let dist = (dx * dx + dy * dy).sqrt().max(1e-3);
                if dist >= min_dist {
                    continue;
                }
                let overlap = (min_dist - dist) / dist * 0.5 * strength;
                let (mx, my) = (dx * overlap, dy * overlap);
                self.bodies[i].vx += mx;
                self.bodies[i].vy += my;
                self.bodies[j].vx -= mx;
                self.bodies[j].vy -= my;
            }
        }
    }

    fn apply_centering(&mut self) {
        let cx = self.config.width / 2.0;
        let cy = self.config.height / 2.0;
        let strength = self.config.centering_strength * self.alpha;
        for body in &mut self.bodies {
            body.vx += (cx - body.x) * strength;
            body.vy += (cy - body.y) * strength;
        }
    }

    fn integrate(&mut self) {
        let retain = 1.0 - self.config.velocity_decay;
        for body in &mut self.bodies {
            match (body.fx, body.fy) {
                (Some(fx), Some(fy)) => {
                    body.x = fx;
                    body.y = fy;
                    body.vx = 0.0;
                    body.vy = 0.0;
                }
                _ => {
                    body.vx *= retain;
                    body.vy *= retain;
                    body.x += body.vx;
                    body.y += body.vy;
                }
            }
        }
    }
}

/// Heuristic initial placement: the first disease sits at the canvas
/// center, its direct factors fan out on angular sectors grouped by
/// relationship type, and everything else lands on an outer ring. Purely
/// a function of input order, no randomness.
fn seed_positions(graph: &CombinedGraph, config: &LayoutConfig) -> HashMap<String, (f64, f64)> {
    let cx = config.width / 2.0;
    let cy = config.height / 2.0;
    let mut seeds: HashMap<String, (f64, f64)> = HashMap::with_capacity(graph.node_count());

    let center_disease = graph
        .nodes
        .iter()
        .find(|n| n.node_type == NodeType::Disease)
        .map(|n| n.id.clone());

    if let Some(disease_id) = &center_disease {
        seeds.insert(disease_id.clone(), (cx, cy));

        // Factors of the central disease, grouped by the relationship that
        // connects them, in first-seen order.
        let mut groups: Vec<(Relationship, Vec<String>)> = Vec::new();
        for link in graph.links.iter().filter(|l| &l.source == disease_id) {
            if seeds.contains_key(&link.target) {
                continue;
            }
            match groups.iter_mut().find(|(rel, _)| rel == &link.relationship) {
                Some((_, members)) => members.push(link.target.clone()),
                None => groups.push((link.relationship.clone(), vec![link.target.clone()])),
            }
        }

        let total_groups = groups.len().max(1);
        for (group_pos, (_, members)) in groups.iter().enumerate() {
            let sector = 2.0 * PI / total_groups as f64 * group_pos as f64;
            let count = members.len();
            for (member_pos, id) in members.iter().enumerate() {
                let angle = sector
                    + SEED_SECTOR_SPREAD / (count as f64 + 1.0) * (member_pos as f64 + 1.0)
                    - SEED_SECTOR_SPREAD / 2.0;
                seeds.insert(
                    id.clone(),
                    (cx + SEED_RADIUS * angle.cos(), cy + SEED_RADIUS * angle.sin()),
                );
            }
        }
    }

    // Whatever is left (secondary diseases, orphan factors) goes on an
    // outer ring so no two seeds coincide.
    let remaining: Vec<&str> = graph
        .nodes
        .iter()
        .filter(|n| !seeds.contains_key(&n.id))
        .map(|n| n.id.as_str())
        .collect();
    let count = remaining.len().max(1);
    for (pos, id) in remaining.into_iter().enumerate() {
        let angle = 2.0 * PI / count as f64 * pos as f64;
        seeds.insert(
            id.to_string(),
            (
                cx + OUTER_RING_RADIUS * angle.cos(),
                cy + OUTER_RING_RADIUS * angle.sin(),
            ),
        );
    }

    seeds
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::links::Link;
    use models::nodes::Node;

    fn combined(mut nodes: Vec<Node>, mut links: Vec<Link>) -> CombinedGraph {
        use models::nodes::SourceTag;
        for node in &mut nodes {
            node.source = Some(SourceTag::GroundTruth);
        }
        for link in &mut links {
            link.source_graph = Some(SourceTag::GroundTruth);
        }
        CombinedGraph::new(nodes, links).unwrap()
    }

    fn star_graph(satellites: usize) -> CombinedGraph {
        let mut nodes = vec![Node::new("Flu", NodeType::Disease)];
        let mut links = Vec::new();
        for i in 0..satellites {
            let id = format!("Symptom {}", i);
            nodes.push(Node::new(id.clone(), NodeType::Symptom));
            links.push(Link::new("Flu", id, Relationship::HasSymptom, 0.5));
        }
        combined(nodes, links)
    }

    #[test]
    fn empty_graph_is_immediately_frozen() {
        let graph = combined(vec![], vec![]);
        let mut sim = Simulation::new(&graph, LayoutConfig::default());
        assert!(sim.is_frozen());
        sim.run();
        assert_eq!(sim.positions().count(), 0);
    }

    #[test]
    fn run_assigns_finite_positions_to_every_node() {
        let graph = star_graph(6);
        let mut sim = Simulation::new(&graph, LayoutConfig::default());
        sim.run();

        assert!(sim.is_frozen());
        assert_eq!(sim.positions().count(), graph.node_count());
        for (_, x, y) in sim.positions() {
            assert!(x.is_finite() && y.is_finite());
        }
    }

    #[test]
    fn converges_within_the_time_budget() {
        let graph = star_graph(120);
        let config = LayoutConfig::default();
        let budget = config.time_budget;
        let started = Instant::now();
        let mut sim = Simulation::new(&graph, config);
        sim.run();
        // Either alpha decayed below threshold or the budget cut it off;
        // both freeze the simulation within the budget plus one step.
        assert!(sim.is_frozen());
        assert!(started.elapsed() < budget + std::time::Duration::from_secs(1));
    }

    #[test]
    fn disease_stays_nearer_the_center_than_its_satellites() {
        let graph = star_graph(6);
        let config = LayoutConfig::default();
        let (cx, cy) = (config.width / 2.0, config.height / 2.0);
        let mut sim = Simulation::new(&graph, config);
        sim.run();

        let dist = |x: f64, y: f64| ((x - cx).powi(2) + (y - cy).powi(2)).sqrt();
        let (dx, dy) = sim.position("Flu").unwrap();
        let disease_dist = dist(dx, dy);
        let mean_sat: f64 = (0..6)
            .map(|i| {
                let (x, y) = sim.position(&format!("Symptom {}", i)).unwrap();
                dist(x, y)
            })
            .sum::<f64>()
            / 6.0;
        assert!(disease_dist < mean_sat);
    }

    #[test]
    fn frozen_simulation_does_not_move_until_reheated() {
        let graph = star_graph(3);
        let mut sim = Simulation::new(&graph, LayoutConfig::default());
        sim.run();
        let before = sim.position("Symptom 0").unwrap();
        assert!(!sim.step());
        assert_eq!(sim.position("Symptom 0").unwrap(), before);

        sim.reheat();
        assert!(!sim.is_frozen());
        assert!(sim.step());
    }

    #[test]
    fn dragging_pins_the_node_and_reheats() {
        let graph = star_graph(3);
        let mut sim = Simulation::new(&graph, LayoutConfig::default());
        sim.run();

        sim.pin("Symptom 0", 10.0, 20.0);
        assert!(!sim.is_frozen());
        assert!(sim.alpha() >= 0.3);
        for _ in 0..10 {
            sim.step();
        }
        assert_eq!(sim.position("Symptom 0").unwrap(), (10.0, 20.0));

        sim.drag("Symptom 0", 30.0, 40.0);
        sim.step();
        assert_eq!(sim.position("Symptom 0").unwrap(), (30.0, 40.0));

        sim.release("Symptom 0");
        sim.run();
        assert!(sim.is_frozen());
        assert_ne!(sim.position("Symptom 0").unwrap(), (30.0, 40.0));
    }

    #[test]
    fn equal_inputs_settle_identically() {
        let graph = star_graph(8);
        let mut a = Simulation::new(&graph, LayoutConfig::default());
        let mut b = Simulation::new(&graph, LayoutConfig::default());
        for _ in 0..50 {
            a.step();
            b.step();
        }
        for ((_, ax, ay), (_, bx, by)) in a.positions().zip(b.positions()) {
            assert_eq!((ax, ay), (bx, by));
        }
    }

    #[test]
    fn positions_write_back_onto_the_graph() {
        let mut graph = star_graph(2);
        let mut sim = Simulation::new(&graph, LayoutConfig::default());
        sim.run();
        sim.apply_to(&mut graph);
        assert!(graph.nodes.iter().all(|n| n.x.is_some() && n.y.is_some()));
    }
}
