use crate::ActorId;

/// Read-only world access.
///
/// The kernel does not prescribe which queries a world must expose; sensors and leaf behaviors
/// define their own extension traits on top of it.
pub trait WorldView {
    type Actor: ActorId;
}

/// Write access / effect sink handed to behavior callbacks.
pub trait WorldMut: WorldView {}
