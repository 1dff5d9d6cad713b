//! Connectivity Graph
//!
//! Undirected graph over the quantized coordinate space. Shared coordinate nodes
//! hold pins, wire endpoints and junctions; a wire's interior vertices get private
//! nodes that only a junction can tie to anything outside the wire. Bus wires live
//! on their own coordinate nodes, so a bus never touches a signal wire or pin.
//! Connected components become candidate nets.

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::Bfs;
use std::collections::{BTreeSet, HashMap, HashSet};

use super::geometry::{pin_position, point_on_segment, points_near, SpatialIndex};
use super::ConnectivityOptions;
use crate::library::SymbolLibrary;
use crate::model::{ComponentInstance, GridPoint, Junction, PinRef, Point, Wire};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum NodeKey {
    /// Shared lattice point
    Point(GridPoint),
    /// Shared lattice point on the bus layer
    Bus(GridPoint),
    /// Interior vertex of one wire
    Vertex { wire: usize, index: usize },
}

/// A library pin resolved onto a placed component.
#[derive(Debug, Clone)]
pub(crate) struct PlacedPin {
    pub component: usize,
    pub pin_ref: PinRef,
    pub at: Point,
}

/// One connected component of the graph with at least one pin or wire.
#[derive(Debug, Clone, Default)]
pub(crate) struct CandidateNet {
    /// Indices into [`ConnectivityGraph::pins`], ascending
    pub pins: Vec<usize>,
    /// Indices into the wire slice, ascending
    pub wires: Vec<usize>,
    pub points: HashSet<GridPoint>,
    /// Made of bus wires
    pub is_bus: bool,
}

/// The connectivity graph of one sheet.
#[derive(Debug)]
pub struct ConnectivityGraph {
    graph: UnGraph<GridPoint, ()>,
    index: HashMap<NodeKey, NodeIndex>,
    bus_wires: HashSet<usize>,
    pins: Vec<PlacedPin>,
    pins_at: HashMap<NodeIndex, Vec<usize>>,
    wires_at: HashMap<NodeIndex, Vec<usize>>,
}

impl ConnectivityGraph {
    fn empty() -> Self {
        Self {
            graph: UnGraph::default(),
            index: HashMap::new(),
            bus_wires: HashSet::new(),
            pins: Vec::new(),
            pins_at: HashMap::new(),
            wires_at: HashMap::new(),
        }
    }

    /// Build the graph from pins, wires and junctions. Bus wires carry many signals,
    /// so they only meet other bus wires; bus entries bridge them to members.
    pub fn build(
        library: &SymbolLibrary,
        components: &[ComponentInstance],
        wires: &[Wire],
        junctions: &[Junction],
        options: &ConnectivityOptions,
    ) -> Self {
        let tol = options.snap_tolerance;
        let mut g = Self::empty();

        // Step 1: pins
        let mut pin_nodes = Vec::new();
        for (ci, component) in components.iter().enumerate() {
            let Some(def) = library.definition_of(component) else {
                tracing::warn!(
                    "Unknown symbol '{}' for component {}; its pins are ignored",
                    component.symbol_ref,
                    component.id
                );
                continue;
            };
            for pin in &def.pins {
                let at = pin_position(component, Some(def), pin);
                let node = g.node(NodeKey::Point(at.grid()), at.grid());
                let idx = g.pins.len();
                g.pins.push(PlacedPin {
                    component: ci,
                    pin_ref: PinRef::new(&component.id, &pin.id),
                    at,
                });
                g.pins_at.entry(node).or_default().push(idx);
                pin_nodes.push(node);
            }
        }

        // Step 2: wires, always connected along their own length
        let mut wire_nodes: Vec<Vec<NodeIndex>> = Vec::with_capacity(wires.len());
        for (wi, wire) in wires.iter().enumerate() {
            if wire.is_bus {
                g.bus_wires.insert(wi);
            }
            let mut nodes = Vec::with_capacity(wire.points.len());
            let last = wire.points.len().saturating_sub(1);
            for (i, p) in wire.points.iter().enumerate() {
                let key = if i > 0 && i < last {
                    NodeKey::Vertex { wire: wi, index: i }
                } else if wire.is_bus {
                    NodeKey::Bus(p.grid())
                } else {
                    NodeKey::Point(p.grid())
                };
                let node = g.node(key, p.grid());
                let here = g.wires_at.entry(node).or_default();
                if here.last() != Some(&wi) {
                    here.push(wi);
                }
                if let Some(&prev) = nodes.last() {
                    g.connect(prev, node);
                }
                nodes.push(node);
            }
            wire_nodes.push(nodes);
        }

        // Step 3: pins touch wire endpoints only
        let mut endpoints = SpatialIndex::new(tol);
        for (wire, nodes) in wires.iter().zip(&wire_nodes).filter(|(w, _)| !w.is_bus) {
            if let (Some(first), Some(last), Some(&n_first), Some(&n_last)) =
                (wire.first(), wire.last(), nodes.first(), nodes.last())
            {
                endpoints.insert(*first, n_first);
                endpoints.insert(*last, n_last);
            }
        }
        for (pin, &pin_node) in g.pins.clone().iter().zip(&pin_nodes) {
            let hits: Vec<NodeIndex> = endpoints.near(&pin.at, tol).into_iter().copied().collect();
            for endpoint in hits {
                g.connect(pin_node, endpoint);
            }
        }

        // Step 4: junctions tie segments, interior vertices and pins at their spot.
        // On a bus the junction joins the bus layer only.
        for junction in junctions {
            let jp = junction.position;
            let j_node = g.node(NodeKey::Point(jp.grid()), jp.grid());
            for (wire, nodes) in wires.iter().zip(&wire_nodes) {
                let mut hits = Vec::new();
                for (s, (a, b)) in wire.segments().enumerate() {
                    if point_on_segment(&jp, a, b, tol) {
                        hits.push(nodes[s]);
                        hits.push(nodes[s + 1]);
                    }
                }
                for (p, &node) in wire.points.iter().zip(nodes) {
                    if points_near(p, &jp, tol) {
                        hits.push(node);
                    }
                }
                if hits.is_empty() {
                    continue;
                }
                let target = if wire.is_bus {
                    g.node(NodeKey::Bus(jp.grid()), jp.grid())
                } else {
                    j_node
                };
                for node in hits {
                    g.connect(target, node);
                }
            }
        }

        tracing::debug!(
            "Connectivity graph: {} nodes, {} edges, {} pins",
            g.graph.node_count(),
            g.graph.edge_count(),
            g.pins.len()
        );

        g
    }

    fn node(&mut self, key: NodeKey, at: GridPoint) -> NodeIndex {
        if let Some(&idx) = self.index.get(&key) {
            return idx;
        }
        let idx = self.graph.add_node(at);
        self.index.insert(key, idx);
        idx
    }

    fn connect(&mut self, a: NodeIndex, b: NodeIndex) {
        if a != b {
            self.graph.update_edge(a, b, ());
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub(crate) fn pins(&self) -> &[PlacedPin] {
        &self.pins
    }

    /// Breadth-first partition into connected components, in node insertion order.
    /// Components with neither pins nor wires (a stray junction) are dropped.
    pub(crate) fn candidate_nets(&self) -> Vec<CandidateNet> {
        let mut visited = vec![false; self.graph.node_count()];
        let mut candidates = Vec::new();

        for start in self.graph.node_indices() {
            if visited[start.index()] {
                continue;
            }

            let mut pins = BTreeSet::new();
            let mut wires = BTreeSet::new();
            let mut points = HashSet::new();

            let mut bfs = Bfs::new(&self.graph, start);
            while let Some(node) = bfs.next(&self.graph) {
                visited[node.index()] = true;
                points.insert(self.graph[node]);
                if let Some(here) = self.pins_at.get(&node) {
                    pins.extend(here.iter().copied());
                }
                if let Some(here) = self.wires_at.get(&node) {
                    wires.extend(here.iter().copied());
                }
            }

            if pins.is_empty() && wires.is_empty() {
                continue;
            }
            let is_bus = wires.iter().any(|w| self.bus_wires.contains(w));
            candidates.push(CandidateNet {
                pins: pins.into_iter().collect(),
                wires: wires.into_iter().collect(),
                points,
                is_bus,
            });
        }

        tracing::debug!("Found {} candidate nets", candidates.len());
        candidates
    }
}
