//! Graph container: owns components by uid, arcs in insertion order, and a
//! derived adjacency index kept in sync on every mutation.
//!
//! The arc list is authoritative. The adjacency index exists only to answer
//! incidence queries without scanning every arc.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::GraphError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentUid(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArcUid(pub u32);

impl fmt::Display for ComponentUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ArcUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic uid source. Values are handed out once and never reused, even
/// after the entity holding them is removed.
#[derive(Debug, Clone)]
pub struct UidSequence {
    next: u32,
}

impl Default for UidSequence {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl UidSequence {
    pub fn next_value(&mut self) -> u32 {
        let value = self.next;
        self.next += 1;
        value
    }

    pub fn peek(&self) -> u32 {
        self.next
    }
}

pub trait Vertex {
    fn uid(&self) -> ComponentUid;
}

pub trait Edge {
    fn uid(&self) -> ArcUid;
    fn from_vertex(&self) -> ComponentUid;
    fn to_vertex(&self) -> ComponentUid;

    fn is_incident_to(&self, uid: ComponentUid) -> bool {
        self.from_vertex() == uid || self.to_vertex() == uid
    }
}

/// Component removed together with the arcs its removal cascaded to.
#[derive(Debug, Clone)]
pub struct RemovedComponent<C, A> {
    pub component: C,
    pub arcs: Vec<A>,
}

#[derive(Debug, Clone)]
pub struct Graph<C, A> {
    components: BTreeMap<ComponentUid, C>,
    arcs: Vec<A>,
    /// from -> to -> arc uids
    outgoing: HashMap<ComponentUid, HashMap<ComponentUid, BTreeSet<ArcUid>>>,
    /// to -> sources with at least one arc into it
    incoming: HashMap<ComponentUid, BTreeSet<ComponentUid>>,
}

impl<C, A> Default for Graph<C, A> {
    fn default() -> Self {
        Self {
            components: BTreeMap::new(),
            arcs: Vec::new(),
            outgoing: HashMap::new(),
            incoming: HashMap::new(),
        }
    }
}

impl<C: Vertex, A: Edge> Graph<C, A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn component(&self, uid: ComponentUid) -> Option<&C> {
        self.components.get(&uid)
    }

    pub fn component_mut(&mut self, uid: ComponentUid) -> Option<&mut C> {
        self.components.get_mut(&uid)
    }

    pub fn arc(&self, uid: ArcUid) -> Option<&A> {
        self.arcs.iter().find(|arc| arc.uid() == uid)
    }

    pub fn arc_mut(&mut self, uid: ArcUid) -> Option<&mut A> {
        self.arcs.iter_mut().find(|arc| arc.uid() == uid)
    }

    /// Components in ascending uid order.
    pub fn components(&self) -> impl Iterator<Item = &C> {
        self.components.values()
    }

    /// Arcs in insertion order.
    pub fn arcs(&self) -> &[A] {
        &self.arcs
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn arc_count(&self) -> usize {
        self.arcs.len()
    }

    pub fn add_component(&mut self, component: C) -> Result<&C, GraphError> {
        let uid = component.uid();
        if self.components.contains_key(&uid) {
            return Err(GraphError::DuplicateComponent(uid));
        }

        self.outgoing.entry(uid).or_default();
        Ok(&*self.components.entry(uid).or_insert(component))
    }

    pub fn add_arc(&mut self, arc: A) -> Result<&A, GraphError> {
        let uid = arc.uid();
        if self.arcs.iter().any(|existing| existing.uid() == uid) {
            return Err(GraphError::DuplicateArc(uid));
        }

        for endpoint in [arc.from_vertex(), arc.to_vertex()] {
            if !self.components.contains_key(&endpoint) {
                return Err(GraphError::DanglingEndpoint {
                    arc: uid,
                    component: endpoint,
                });
            }
        }

        let (from, to) = (arc.from_vertex(), arc.to_vertex());
        self.outgoing
            .entry(from)
            .or_default()
            .entry(to)
            .or_default()
            .insert(uid);
        self.incoming.entry(to).or_default().insert(from);

        self.arcs.push(arc);
        let index = self.arcs.len() - 1;
        Ok(&self.arcs[index])
    }

    /// Arc uids recorded in the adjacency index for `from -> to`.
    pub fn connections(&self, from: ComponentUid, to: ComponentUid) -> Vec<ArcUid> {
        self.outgoing
            .get(&from)
            .and_then(|targets| targets.get(&to))
            .map(|uids| uids.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Arcs with either endpoint on `uid`, in insertion order.
    pub fn arcs_incident_to(&self, uid: ComponentUid) -> Vec<&A> {
        let incident = self.incident_arc_uids(uid);
        if incident.is_empty() {
            return Vec::new();
        }

        self.arcs
            .iter()
            .filter(|arc| incident.contains(&arc.uid()))
            .collect()
    }

    fn incident_arc_uids(&self, uid: ComponentUid) -> BTreeSet<ArcUid> {
        let mut incident = BTreeSet::new();

        if let Some(targets) = self.outgoing.get(&uid) {
            for uids in targets.values() {
                incident.extend(uids.iter().copied());
            }
        }

        if let Some(sources) = self.incoming.get(&uid) {
            for source in sources {
                if let Some(uids) = self.outgoing.get(source).and_then(|t| t.get(&uid)) {
                    incident.extend(uids.iter().copied());
                }
            }
        }

        incident
    }

    /// Removes a component and every arc touching it.
    pub fn take_component(&mut self, uid: ComponentUid) -> Option<RemovedComponent<C, A>> {
        let component = self.components.remove(&uid)?;
        let incident = self.incident_arc_uids(uid);

        let mut removed = Vec::with_capacity(incident.len());
        if !incident.is_empty() {
            let mut kept = Vec::with_capacity(self.arcs.len() - incident.len());
            for arc in self.arcs.drain(..) {
                if incident.contains(&arc.uid()) {
                    removed.push(arc);
                } else {
                    kept.push(arc);
                }
            }
            self.arcs = kept;
        }

        if let Some(targets) = self.outgoing.remove(&uid) {
            for target in targets.keys() {
                self.drop_incoming(*target, uid);
            }
        }

        if let Some(sources) = self.incoming.remove(&uid) {
            for source in sources {
                if let Some(targets) = self.outgoing.get_mut(&source) {
                    targets.remove(&uid);
                }
            }
        }

        Some(RemovedComponent {
            component,
            arcs: removed,
        })
    }

    pub fn remove_component(&mut self, uid: ComponentUid) -> Option<C> {
        self.take_component(uid).map(|removed| removed.component)
    }

    pub fn remove_arc(&mut self, uid: ArcUid) -> Option<A> {
        let index = self.arcs.iter().position(|arc| arc.uid() == uid)?;
        let arc = self.arcs.remove(index);

        let (from, to) = (arc.from_vertex(), arc.to_vertex());
        let now_empty = match self.outgoing.get_mut(&from) {
            Some(targets) => match targets.get_mut(&to) {
                Some(uids) => {
                    uids.remove(&uid);
                    if uids.is_empty() {
                        targets.remove(&to);
                        true
                    } else {
                        false
                    }
                }
                None => false,
            },
            None => false,
        };

        if now_empty {
            self.drop_incoming(to, from);
        }

        Some(arc)
    }

    fn drop_incoming(&mut self, to: ComponentUid, from: ComponentUid) {
        if let Some(sources) = self.incoming.get_mut(&to) {
            sources.remove(&from);
            if sources.is_empty() {
                self.incoming.remove(&to);
            }
        }
    }
}
