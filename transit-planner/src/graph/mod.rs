//! Uniform node and edge view over the street and transit networks.
//!
//! The search only ever sees [`Node`] and [`Edge`]. Both are closed sets of
//! variants; every capability is answered by matching on the variant and
//! reading from the [`Network`]. Nothing here mutates the network.

use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::NaiveDateTime;

use crate::domain::{
    DomainError, IntersectionId, LineId, Point, RouteId, SegmentId, Speed, StopId, StreetId,
};
use crate::network::Network;

/// A position part-way along a street segment.
#[derive(Debug, Clone, Copy)]
pub struct PointOnStreet {
    pub segment: SegmentId,
    pub position: Point,
}

impl PartialEq for PointOnStreet {
    fn eq(&self, other: &Self) -> bool {
        self.segment == other.segment
            && self.position.x.to_bits() == other.position.x.to_bits()
            && self.position.y.to_bits() == other.position.y.to_bits()
    }
}

impl Eq for PointOnStreet {}

impl Hash for PointOnStreet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.segment.hash(state);
        self.position.x.to_bits().hash(state);
        self.position.y.to_bits().hash(state);
    }
}

/// Any place a journey can start, end or pass through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Node {
    Intersection(IntersectionId),
    Stop(StopId),
    PointOnStreet(PointOnStreet),
}

/// Any traversable connection between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    /// A street segment, driven in whichever direction it is entered.
    Street(SegmentId),
    /// One hop of a transit line.
    Transit(RouteId),
}

/// The service an edge belongs to. Consecutive edges with the same
/// associated id continue the same ride.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssociatedId {
    Street(StreetId),
    Line(LineId),
}

impl Node {
    pub fn location(&self, net: &Network) -> Result<Point, DomainError> {
        Ok(match self {
            Node::Intersection(id) => net.intersection(*id)?.position,
            Node::Stop(id) => net.stop(*id)?.position,
            Node::PointOnStreet(p) => p.position,
        })
    }

    /// Intersections a street edge may be entered from at this node.
    fn street_anchors(&self, net: &Network) -> Result<Vec<IntersectionId>, DomainError> {
        Ok(match self {
            Node::Intersection(id) => vec![*id],
            Node::Stop(_) => Vec::new(),
            Node::PointOnStreet(p) => {
                let seg = net.segment(p.segment)?;
                if net.street(seg.street)?.one_way {
                    vec![seg.end]
                } else {
                    vec![seg.end, seg.start]
                }
            }
        })
    }

    /// Outgoing edges.
    ///
    /// A point on a street reaches everything its segment's end intersection
    /// does, and for two-way streets everything its start intersection does.
    pub fn edges(&self, net: &Network) -> Result<Vec<Edge>, DomainError> {
        match self {
            Node::Stop(id) => Ok(net.stop(*id)?.outgoing.iter().copied().map(Edge::Transit).collect()),
            _ => {
                let mut edges = Vec::new();
                for anchor in self.street_anchors(net)? {
                    for seg in &net.intersection(anchor)?.segments {
                        let edge = Edge::Street(*seg);
                        if !edges.contains(&edge) {
                            edges.push(edge);
                        }
                    }
                }
                Ok(edges)
            }
        }
    }

    /// Whether a vehicle may turn back along the edge it arrived on.
    ///
    /// Only dead ends (a single touching segment) allow it.
    pub fn u_turn_allowed(&self, net: &Network) -> Result<bool, DomainError> {
        Ok(match self {
            Node::Intersection(id) => net.intersection(*id)?.segments.len() == 1,
            Node::Stop(_) | Node::PointOnStreet(_) => false,
        })
    }

    /// Whether standing at this node counts as having reached `goal`.
    pub fn is_goal_reached(&self, goal: &Node, net: &Network) -> Result<bool, DomainError> {
        if self == goal {
            return Ok(true);
        }
        Ok(match (self, goal) {
            (Node::Intersection(i), Node::PointOnStreet(p)) => net.segment(p.segment)?.touches(*i),
            (Node::PointOnStreet(p), Node::Intersection(g)) => net.segment(p.segment)?.touches(*g),
            (Node::PointOnStreet(p), Node::PointOnStreet(q)) => p.segment == q.segment,
            _ => false,
        })
    }

    pub fn as_intersection(&self) -> Option<IntersectionId> {
        match self {
            Node::Intersection(id) => Some(*id),
            _ => None,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Intersection(id) => write!(f, "{id}"),
            Node::Stop(id) => write!(f, "{id}"),
            Node::PointOnStreet(p) => write!(f, "{}@{}", p.segment, p.position),
        }
    }
}

impl Edge {
    pub fn begin(&self, net: &Network) -> Result<Node, DomainError> {
        Ok(match self {
            Edge::Street(id) => Node::Intersection(net.segment(*id)?.start),
            Edge::Transit(id) => Node::Stop(net.route(*id)?.begin),
        })
    }

    pub fn end(&self, net: &Network) -> Result<Node, DomainError> {
        Ok(match self {
            Edge::Street(id) => Node::Intersection(net.segment(*id)?.end),
            Edge::Transit(id) => Node::Stop(net.route(*id)?.end),
        })
    }

    pub fn one_way(&self, net: &Network) -> Result<bool, DomainError> {
        Ok(match self {
            Edge::Street(id) => net.street_of(*id)?.one_way,
            Edge::Transit(_) => true,
        })
    }

    pub fn is_transit(&self) -> bool {
        matches!(self, Edge::Transit(_))
    }

    pub fn average_speed(&self, net: &Network) -> Result<Speed, DomainError> {
        Ok(match self {
            Edge::Street(id) => net.street_of(*id)?.speed,
            Edge::Transit(id) => net.line(net.route(*id)?.line)?.speed,
        })
    }

    /// Seconds needed to traverse the whole edge.
    pub fn travel_secs(&self, net: &Network) -> Result<f64, DomainError> {
        Ok(match self {
            Edge::Street(id) => {
                let seg = net.segment(*id)?;
                net.street(seg.street)?.speed.travel_secs(seg.length)
            }
            Edge::Transit(id) => net.route(*id)?.travel_secs,
        })
    }

    pub fn associated_id(&self, net: &Network) -> Result<AssociatedId, DomainError> {
        Ok(match self {
            Edge::Street(id) => AssociatedId::Street(net.segment(*id)?.street),
            Edge::Transit(id) => AssociatedId::Line(net.route(*id)?.line),
        })
    }

    /// When this edge can next be entered at or after `after`.
    ///
    /// Streets are always available. Transit edges follow their line's
    /// schedule and return `None` if the line never runs again.
    pub fn next_departure(
        &self,
        net: &Network,
        after: NaiveDateTime,
    ) -> Result<Option<NaiveDateTime>, DomainError> {
        match self {
            Edge::Street(_) => Ok(Some(after)),
            Edge::Transit(id) => {
                let route = net.route(*id)?;
                let line = net.line(route.line)?;
                Ok(route.next_departure(&line.schedule, after))
            }
        }
    }

    /// The node reached by taking this edge from `from`, or `None` if the
    /// edge cannot be entered there (wrong end, or against a one-way street).
    pub fn neighbor_from(&self, from: &Node, net: &Network) -> Result<Option<Node>, DomainError> {
        match self {
            Edge::Street(id) => {
                let seg = net.segment(*id)?;
                let one_way = net.street(seg.street)?.one_way;
                let anchors = from.street_anchors(net)?;
                if anchors.contains(&seg.start) {
                    Ok(Some(Node::Intersection(seg.end)))
                } else if anchors.contains(&seg.end) && !one_way {
                    Ok(Some(Node::Intersection(seg.start)))
                } else {
                    Ok(None)
                }
            }
            Edge::Transit(id) => {
                let route = net.route(*id)?;
                if *from == Node::Stop(route.begin) {
                    Ok(Some(Node::Stop(route.end)))
                } else {
                    Ok(None)
                }
            }
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edge::Street(id) => write!(f, "{id}"),
            Edge::Transit(id) => write!(f, "{id}"),
        }
    }
}
