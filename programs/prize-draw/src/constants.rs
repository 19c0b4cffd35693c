pub const SEED_DRAW: &[u8] = b"draw";
pub const SEED_ENTRY: &[u8] = b"entry";

/// Upper bound on registrations per draw.
pub const MAX_PARTICIPANTS: u32 = 1024;

/// A draw cannot be closed with fewer entries than this.
pub const MIN_PARTICIPANTS: u32 = 2;

pub const SALT_LEN: usize = 32;
pub const COMMITMENT_LEN: usize = 32;
