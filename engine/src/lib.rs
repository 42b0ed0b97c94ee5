pub mod agent;
pub mod bitmask_flags;
pub mod cell;
pub mod collision;
pub mod constants;
pub mod error;
pub mod motion;
pub mod movement;
pub mod position;
pub mod utils;
pub mod world;

pub use agent::{Agent, AgentBounds, AgentId, AgentKind, Detection, pack_agent_id};
pub use cell::{GridCell, Portion, PortionKey};
pub use collision::{
    BoxSpec, CollisionConfig, CollisionDescriptor, DescriptorRecord, Orientation, RayOutcome, Vec3,
};
pub use error::{CollisionError, LogWarnings, WarningSink};
pub use movement::{MoveInput, MoveReport};
pub use position::Position;
pub use world::World;
