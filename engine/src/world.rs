/*!
Explicit world context.

`World` owns everything one collision pass needs: the config, the portion index, the
agent registry, the scratch volume pool and the warning sink. Operations that refer to
missing agents or portions report a [`CollisionError`] to the sink and return `None`
instead of failing.
*/

use crate::{
    agent::{Agent, AgentId, AgentKind, AgentRegistry, try_unpack_agent_kind, validate_agent_id},
    cell::Portion,
    collision::{
        broad::PortionIndex,
        descriptor::{CollisionDescriptor, DescriptorRecord},
        ray::RayResolver,
        settings::CollisionConfig,
        types::{RayOutcome, Vec3},
        volume::VolumePool,
    },
    error::{CollisionError, LogWarnings, WarningSink},
};

pub struct World {
    pub(crate) config: CollisionConfig,
    pub(crate) portions: PortionIndex,
    pub(crate) agents: AgentRegistry,
    pub(crate) hero: Option<AgentId>,
    /// Number of frames the hero actually moved.
    pub(crate) steps: u64,
    /// Duration of the current frame in milliseconds.
    pub(crate) elapsed_ms: f32,
    pub(crate) pool: VolumePool,
    warnings: Box<dyn WarningSink>,
}

impl World {
    pub fn new(config: CollisionConfig) -> Self {
        Self {
            portions: PortionIndex::new(&config),
            config,
            agents: AgentRegistry::new(),
            hero: None,
            steps: 0,
            elapsed_ms: 0.0,
            pool: VolumePool::new(),
            warnings: Box::new(LogWarnings),
        }
    }

    pub fn with_warnings(mut self, sink: impl WarningSink + 'static) -> Self {
        self.warnings = Box::new(sink);
        self
    }

    #[inline]
    pub fn config(&self) -> &CollisionConfig {
        &self.config
    }

    #[inline]
    pub fn portions(&self) -> &PortionIndex {
        &self.portions
    }

    #[inline]
    pub fn agents(&self) -> &AgentRegistry {
        &self.agents
    }

    #[inline]
    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id)
    }

    #[inline]
    pub fn hero(&self) -> Option<AgentId> {
        self.hero
    }

    #[inline]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Sets the duration of the frame being simulated.
    pub fn set_frame_time(&mut self, elapsed_ms: f32) {
        self.elapsed_ms = elapsed_ms.max(0.0);
    }

    pub(crate) fn report(&self, error: CollisionError) {
        self.warnings.warn(&error);
    }

    pub fn load_portion(&mut self, portion: Portion, descriptors: Vec<CollisionDescriptor>) {
        self.portions.load_portion(portion, descriptors);
    }

    /// Converts and loads external records. Invalid records are reported and skipped.
    ///
    /// Returns the number of descriptors loaded.
    pub fn load_portion_records(&mut self, portion: Portion, records: Vec<DescriptorRecord>) -> usize {
        let mut descriptors = Vec::with_capacity(records.len());
        for record in records {
            match record.into_descriptor(&self.config) {
                Ok(descriptor) => descriptors.push(descriptor),
                Err(error) => self.report(error),
            }
        }
        let count = descriptors.len();
        self.portions.load_portion(portion, descriptors);
        count
    }

    pub fn unload_portion(&mut self, portion: Portion) {
        if !self.portions.unload_portion(portion) {
            self.report(CollisionError::MissingPortion(portion));
        }
    }

    /// Registers an agent. Ids must be well-formed.
    pub fn spawn(&mut self, agent: Agent) -> Result<(), CollisionError> {
        validate_agent_id(agent.id).map_err(|reason| CollisionError::InvalidAgentId(agent.id, reason))?;
        self.agents.insert(agent, &self.config);
        Ok(())
    }

    /// Registers the hero. Its id must carry the hero kind.
    pub fn spawn_hero(&mut self, agent: Agent) -> Result<(), CollisionError> {
        if try_unpack_agent_kind(agent.id) != Some(AgentKind::Hero) {
            return Err(CollisionError::InvalidAgentId(agent.id, "hero id must have the hero kind"));
        }
        let id = agent.id;
        self.spawn(agent)?;
        self.hero = Some(id);
        Ok(())
    }

    pub fn despawn(&mut self, id: AgentId) -> Option<Agent> {
        let agent = self.agents.take(id);
        if agent.is_none() {
            self.report(CollisionError::MissingAgent(id));
        } else if self.hero == Some(id) {
            self.hero = None;
        }
        agent
    }

    /// Removes an agent for resolution, reporting it when missing.
    pub(crate) fn take_agent(&mut self, id: AgentId) -> Option<Agent> {
        let agent = self.agents.take(id);
        if agent.is_none() {
            self.report(CollisionError::MissingAgent(id));
        }
        agent
    }

    /// Resolves `agent` (not registered) moving from `before` to `after`.
    pub(crate) fn resolve(
        &mut self,
        agent: &mut Agent,
        before: Vec3,
        after: Vec3,
        reverse_test_objects: bool,
    ) -> RayOutcome {
        let mut resolver = RayResolver::new(
            &self.config,
            &self.portions,
            &self.agents,
            self.hero,
            &mut self.pool,
        );
        resolver.check_ray(before, after, agent, reverse_test_objects)
    }

    /// Asks the resolver about a move without committing it.
    pub fn check_ray(
        &mut self,
        id: AgentId,
        before: Vec3,
        after: Vec3,
        reverse_test_objects: bool,
    ) -> Option<RayOutcome> {
        let mut agent = self.take_agent(id)?;
        let outcome = self.resolve(&mut agent, before, after, reverse_test_objects);
        let position = agent.position;
        agent.place_volumes(position);
        self.agents.insert(agent, &self.config);
        Some(outcome)
    }
}
