pub mod close_registrations;
pub mod commit_draw;
pub mod register_participant;
pub mod reveal_winner;

pub use close_registrations::*;
pub use commit_draw::*;
pub use register_participant::*;
pub use reveal_winner::*;
