/// Identifier of any agent registered in a [`World`](crate::world::World).
///
/// # Bit layout
/// Least-significant bit = bit 0:
///
/// - bits 0..=31  : per-kind serial (u32)
/// - bits 32..=39 : [`AgentKind`] tag (u8)
/// - bits 40..=63 : reserved (must be zero)
///
/// Two different `(serial, kind)` pairs never produce the same id, so heroes, NPCs and
/// monsters share one registry without collisions.
pub type AgentId = u64;

/// Per-kind serial number.
pub type AgentSerial = u32;

/// Discriminator for the kind of agent referenced by an [`AgentId`].
///
/// The numeric values are part of the packed id. Do not reorder or reuse values.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum AgentKind {
    Hero = 1,
    Npc = 2,
    Monster = 3,
}

const KIND_MASK: u64 = u8::MAX as u64;
const RESERVED_SHIFT: u32 = AgentSerial::BITS + 8;

pub fn pack_agent_id(serial: AgentSerial, kind: AgentKind) -> AgentId {
    (serial as u64) | ((kind as u64) << AgentSerial::BITS)
}

/// Returns `None` if the tag is unknown.
pub fn try_unpack_agent_kind(id: AgentId) -> Option<AgentKind> {
    match ((id >> AgentSerial::BITS) & KIND_MASK) as u8 {
        1 => Some(AgentKind::Hero),
        2 => Some(AgentKind::Npc),
        3 => Some(AgentKind::Monster),
        _ => None,
    }
}

/// Note: this does not validate the kind tag.
pub fn unpack_agent_serial(id: AgentId) -> AgentSerial {
    (id & AgentSerial::MAX as u64) as AgentSerial
}

/// Checks that the kind tag is recognized and the reserved bits are zero.
pub fn validate_agent_id(id: AgentId) -> Result<(), &'static str> {
    if id >> RESERVED_SHIFT != 0 {
        return Err("agent id reserved bits are non-zero");
    }
    if try_unpack_agent_kind(id).is_none() {
        return Err("agent id has unknown kind tag");
    }
    Ok(())
}
