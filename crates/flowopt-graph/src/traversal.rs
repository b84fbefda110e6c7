// Graph traversal operations
// Reachability, distances and split/join block navigation

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::{GatewayKind, Node, NodeId, ProcessGraph, ResourceName};

impl ProcessGraph {
    /// Whether `to` can be reached from `from` through at least one flow
    pub fn is_reachable(&self, from: &str, to: &str) -> bool {
        self.reachable_avoiding(from, to, None)
    }

    /// Reachability ignoring one flow
    pub fn is_reachable_without(&self, from: &str, to: &str, excluded_flow: &str) -> bool {
        self.reachable_avoiding(from, to, Some(excluded_flow))
    }

    fn reachable_avoiding(&self, from: &str, to: &str, excluded_flow: Option<&str>) -> bool {
        let mut visited = BTreeSet::new();
        let mut stack = vec![from.to_string()];
        while let Some(current) = stack.pop() {
            if !visited.insert(current.clone()) {
                continue;
            }
            for flow in self.outgoing(&current) {
                if Some(flow.id.as_str()) == excluded_flow {
                    continue;
                }
                if flow.target == to {
                    return true;
                }
                stack.push(flow.target.clone());
            }
        }
        false
    }

    /// Number of flows going from `source` to `target`
    pub fn count_flows_between(&self, source: &str, target: &str) -> usize {
        self.flows()
            .filter(|f| f.source == source && f.target == target)
            .count()
    }

    /// Shortest distance (in flows) from Start for every reachable node
    pub fn distances_from_start(&self) -> BTreeMap<NodeId, usize> {
        let mut distances = BTreeMap::new();
        let Some(start) = self.start_node() else {
            return distances;
        };
        let mut queue = VecDeque::from([(start.id.clone(), 0usize)]);
        distances.insert(start.id.clone(), 0);
        while let Some((current, distance)) = queue.pop_front() {
            for next in self.successors(&current) {
                if !distances.contains_key(&next.id) {
                    distances.insert(next.id.clone(), distance + 1);
                    queue.push_back((next.id.clone(), distance + 1));
                }
            }
        }
        distances
    }

    /// Distance of one node from Start; `None` when unreachable
    pub fn distance_from_start(&self, id: &str) -> Option<usize> {
        self.distances_from_start().get(id).copied()
    }

    /// Union of the resources used by activities between two nodes
    ///
    /// Walks forward from `from` and stops at `to`. Assumes the region
    /// between both nodes is a balanced block.
    pub fn resources_between(&self, from: &str, to: &str) -> BTreeSet<ResourceName> {
        let mut resources = BTreeSet::new();
        let mut visited = BTreeSet::new();
        let mut stack = vec![from.to_string()];
        while let Some(current) = stack.pop() {
            if current == to || !visited.insert(current.clone()) {
                continue;
            }
            for next in self.successors(&current) {
                if let Some(activity) = next.as_activity() {
                    resources.extend(activity.resources.iter().cloned());
                }
                stack.push(next.id.clone());
            }
        }
        resources
    }

    /// An exclusive split closing a loop feeds an exclusive join directly
    pub fn is_loop_split(&self, split: &str) -> bool {
        self.successors(split)
            .iter()
            .any(|n| n.is_join() && n.gateway_kind() == Some(GatewayKind::Exclusive))
    }

    /// A join opening a loop is fed directly by an exclusive split
    pub fn is_loop_join(&self, join: &str) -> bool {
        self.predecessors(join)
            .iter()
            .any(|n| n.is_split() && n.gateway_kind() == Some(GatewayKind::Exclusive))
    }

    /// Join closing the block opened by `split`
    ///
    /// Returns `None` when the node is not a split or the region is not a
    /// balanced block (matching kind and fan-out/fan-in).
    pub fn get_merge_node(&self, split: &str) -> Option<&Node> {
        let node = self.node(split).filter(|n| n.is_split())?;
        self.block_partner(node, Direction::Forward)
    }

    /// Split opening the block closed by `join`
    pub fn get_split_node(&self, join: &str) -> Option<&Node> {
        let node = self.node(join).filter(|n| n.is_join())?;
        self.block_partner(node, Direction::Backward)
    }

    fn block_partner(&self, gateway: &Node, direction: Direction) -> Option<&Node> {
        let kind = gateway.gateway_kind()?;
        let arity = match direction {
            Direction::Forward => self.outgoing(&gateway.id).len(),
            Direction::Backward => self.incoming(&gateway.id).len(),
        };
        let mut visited = BTreeSet::new();
        self.walk_to_partner(&gateway.id, kind, arity, direction, 1, &mut visited)
    }

    fn walk_to_partner(
        &self,
        current: &str,
        kind: GatewayKind,
        arity: usize,
        direction: Direction,
        open: i64,
        visited: &mut BTreeSet<NodeId>,
    ) -> Option<&Node> {
        if !visited.insert(current.to_string()) {
            return None;
        }
        let neighbours = match direction {
            Direction::Forward => self.successors(current),
            Direction::Backward => self.predecessors(current),
        };
        for next in neighbours {
            let (opens, closes) = match direction {
                Direction::Forward => (next.is_split(), next.is_join()),
                Direction::Backward => (next.is_join(), next.is_split()),
            };
            let depth = if opens {
                open + 1
            } else if closes {
                open - 1
            } else {
                open
            };
            if depth == 0 && closes && next.gateway_kind() == Some(kind) {
                let partner_arity = match direction {
                    Direction::Forward => self.incoming(&next.id).len(),
                    Direction::Backward => self.outgoing(&next.id).len(),
                };
                if partner_arity == arity {
                    return Some(next);
                }
            }
            if next.is_start() || next.is_end() {
                continue;
            }
            if let Some(found) = self.walk_to_partner(&next.id, kind, arity, direction, depth, visited) {
                return Some(found);
            }
        }
        None
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Forward,
    Backward,
}
