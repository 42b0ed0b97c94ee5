use std::collections::HashMap;

use super::{Agent, AgentId};
use crate::{
    cell::{Portion, PortionKey, portion_block_2x2},
    collision::{settings::CollisionConfig, types::Vec3},
};

/// Agents by id, plus an index of agents per portion ("moved objects").
///
/// An agent taken out with [`AgentRegistry::take`] is invisible to queries until it is
/// inserted again; the resolver relies on this to never test an agent against itself.
#[derive(Clone, Debug, Default)]
pub struct AgentRegistry {
    agents: HashMap<AgentId, Agent>,
    by_portion: HashMap<PortionKey, Vec<AgentId>>,
    portion_of: HashMap<AgentId, PortionKey>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    #[inline]
    pub fn contains(&self, id: AgentId) -> bool {
        self.agents.contains_key(&id)
    }

    #[inline]
    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    /// Inserts (or replaces) an agent and indexes it under its current portion.
    pub fn insert(&mut self, agent: Agent, config: &CollisionConfig) {
        let id = agent.id;
        self.unindex(id);
        let key =
            Portion::containing(agent.position, config.square_size, config.portion_size).key();
        self.by_portion.entry(key).or_default().push(id);
        self.portion_of.insert(id, key);
        self.agents.insert(id, agent);
    }

    /// Removes an agent from the registry and the portion index.
    pub fn take(&mut self, id: AgentId) -> Option<Agent> {
        self.unindex(id);
        self.agents.remove(&id)
    }

    fn unindex(&mut self, id: AgentId) {
        let Some(key) = self.portion_of.remove(&id) else {
            return;
        };
        if let Some(ids) = self.by_portion.get_mut(&key) {
            ids.retain(|&other| other != id);
            if ids.is_empty() {
                self.by_portion.remove(&key);
            }
        }
    }

    /// Agents indexed in the 2x2 block of portions nearest to `at`.
    pub fn nearby(&self, at: Vec3, config: &CollisionConfig) -> impl Iterator<Item = &Agent> + '_ {
        portion_block_2x2(at, config.square_size, config.portion_size)
            .into_iter()
            .filter_map(|portion| self.by_portion.get(&portion.key()))
            .flatten()
            .filter_map(|id| self.agents.get(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Agent> + '_ {
        self.agents.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        agent::{AgentBounds, AgentKind, pack_agent_id},
        collision::types::BoxSpec,
    };

    fn agent(serial: u32, at: Vec3) -> Agent {
        Agent::new(
            pack_agent_id(serial, AgentKind::Monster),
            at,
            vec![AgentBounds::fixed(BoxSpec::new(
                Vec3::new(0.0, 8.0, 0.0),
                Vec3::new(8.0, 16.0, 8.0),
            ))],
        )
    }

    #[test]
    fn nearby_covers_neighbouring_portions_only() {
        let config = CollisionConfig::default();
        let mut registry = AgentRegistry::new();
        // Portion span is 256 px. (250, 0, 250) is near the +X/+Z corner of portion 0.
        registry.insert(agent(1, Vec3::new(250.0, 0.0, 250.0)), &config);
        registry.insert(agent(2, Vec3::new(260.0, 0.0, 260.0)), &config);
        registry.insert(agent(3, Vec3::new(900.0, 0.0, 900.0)), &config);

        let ids: Vec<AgentId> = registry
            .nearby(Vec3::new(250.0, 0.0, 250.0), &config)
            .map(|a| a.id)
            .collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&pack_agent_id(1, AgentKind::Monster)));
        assert!(ids.contains(&pack_agent_id(2, AgentKind::Monster)));
    }

    #[test]
    fn taken_agent_is_not_nearby() {
        let config = CollisionConfig::default();
        let mut registry = AgentRegistry::new();
        let id = pack_agent_id(1, AgentKind::Monster);
        registry.insert(agent(1, Vec3::new(10.0, 0.0, 10.0)), &config);

        let taken = registry.take(id).unwrap();
        assert_eq!(registry.nearby(Vec3::new(10.0, 0.0, 10.0), &config).count(), 0);
        assert!(!registry.contains(id));

        registry.insert(taken, &config);
        assert_eq!(registry.nearby(Vec3::new(10.0, 0.0, 10.0), &config).count(), 1);
    }

    #[test]
    fn reinsert_moves_index_entry() {
        let config = CollisionConfig::default();
        let mut registry = AgentRegistry::new();
        let mut a = agent(1, Vec3::new(10.0, 0.0, 10.0));
        registry.insert(a.clone(), &config);
        a.set_position(Vec3::new(2000.0, 0.0, 10.0));
        registry.insert(a, &config);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.nearby(Vec3::new(10.0, 0.0, 10.0), &config).count(), 0);
        assert_eq!(registry.nearby(Vec3::new(2000.0, 0.0, 10.0), &config).count(), 1);
    }
}
