//! Dense agent arena keyed by id

use ahash::AHashMap;

use crate::core::types::AgentId;
use crate::entity::agent::{Agent, Archetype};

/// Live agents in creation order with O(1) id lookup
///
/// Creation order is preserved across removals so iteration (and therefore
/// cluster grouping) is stable.
#[derive(Debug, Default)]
pub struct AgentStore {
    agents: Vec<Agent>,
    index: AHashMap<AgentId, usize>,
    next_id: u32,
}

impl AgentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh id; ids are never reused
    pub fn allocate_id(&mut self) -> AgentId {
        let id = AgentId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn insert(&mut self, agent: Agent) {
        self.index.insert(agent.id, self.agents.len());
        self.agents.push(agent);
    }

    pub fn remove(&mut self, id: AgentId) -> Option<Agent> {
        let idx = self.index.remove(&id)?;
        let agent = self.agents.remove(idx);
        self.reindex_from(idx);
        Some(agent)
    }

    /// Remove every agent matching `pred`, returning them in creation order
    pub fn remove_where(&mut self, mut pred: impl FnMut(&Agent) -> bool) -> Vec<Agent> {
        let (removed, kept): (Vec<Agent>, Vec<Agent>) =
            std::mem::take(&mut self.agents).into_iter().partition(|a| pred(a));
        self.agents = kept;
        self.index.clear();
        self.reindex_from(0);
        removed
    }

    fn reindex_from(&mut self, start: usize) {
        for (i, agent) in self.agents.iter().enumerate().skip(start) {
            self.index.insert(agent.id, i);
        }
    }

    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.index.get(&id).map(|&i| &self.agents[i])
    }

    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        match self.index.get(&id) {
            Some(&i) => self.agents.get_mut(i),
            None => None,
        }
    }

    pub fn contains(&self, id: AgentId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Agent> {
        self.agents.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Agent> {
        self.agents.iter_mut()
    }

    pub fn ids(&self) -> Vec<AgentId> {
        self.agents.iter().map(|a| a.id).collect()
    }

    pub fn count_of(&self, archetype: Archetype) -> usize {
        self.agents.iter().filter(|a| a.archetype() == archetype).count()
    }

    /// Borrow the agent at `idx` mutably alongside a view of everyone else
    pub fn split_for_update(&mut self, idx: usize) -> Option<(&mut Agent, Others<'_>)> {
        if idx >= self.agents.len() {
            return None;
        }
        let (before, rest) = self.agents.split_at_mut(idx);
        let (current, after) = rest.split_first_mut()?;
        Some((
            current,
            Others {
                before,
                after,
                index: &self.index,
                split: idx,
            },
        ))
    }
}

/// Every agent except the one currently being updated
pub struct Others<'a> {
    before: &'a mut [Agent],
    after: &'a mut [Agent],
    index: &'a AHashMap<AgentId, usize>,
    split: usize,
}

impl<'a> Others<'a> {
    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        let &i = self.index.get(&id)?;
        if i < self.split {
            self.before.get(i)
        } else if i > self.split {
            self.after.get(i - self.split - 1)
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        let &i = self.index.get(&id)?;
        if i < self.split {
            self.before.get_mut(i)
        } else if i > self.split {
            self.after.get_mut(i - self.split - 1)
        } else {
            None
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.before.iter().chain(self.after.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Agent> {
        self.before.iter_mut().chain(self.after.iter_mut())
    }
}
