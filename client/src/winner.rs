use prize_draw::constants::MIN_PARTICIPANTS;
use prize_draw::state::winner_index;
use solana_program::pubkey::Pubkey;

use crate::commitment::{verify_commitment, Commitment, DrawSecret};
use crate::error::{DrawError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WinnerSelection {
    pub index: u32,
    pub address: Pubkey,
}

/// Picks `participants[secret mod n]` over the frozen participant list.
pub fn select_winner(secret_number: u64, participants: &[Pubkey]) -> Result<WinnerSelection> {
    let count = participants.len() as u32;
    if count < MIN_PARTICIPANTS {
        return Err(DrawError::NotEnoughParticipants(count));
    }
    let index = winner_index(secret_number, count);
    Ok(WinnerSelection {
        index,
        address: participants[index as usize],
    })
}

/// What an outside observer runs after the reveal: check the published
/// commitment against the revealed secret, then recompute the winner.
pub fn verify_draw(
    commitment: &Commitment,
    secret: &DrawSecret,
    participants: &[Pubkey],
) -> Result<WinnerSelection> {
    if !verify_commitment(commitment, secret) {
        return Err(DrawError::CommitmentMismatch);
    }
    select_winner(secret.secret_number(), participants)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addresses(n: usize) -> Vec<Pubkey> {
        (0..n).map(|_| Pubkey::new_unique()).collect()
    }

    #[test]
    fn seven_over_three_picks_index_one() {
        let participants = addresses(3);
        let selection = select_winner(7, &participants).unwrap();
        assert_eq!(selection.index, 1);
        assert_eq!(selection.address, participants[1]);
    }

    #[test]
    fn index_stays_in_range() {
        for n in 2..40 {
            let participants = addresses(n);
            for secret in [1u64, 2, 97, 1 << 40, u64::MAX] {
                let selection = select_winner(secret, &participants).unwrap();
                assert!((selection.index as usize) < n);
            }
        }
    }

    #[test]
    fn needs_two_participants() {
        assert_eq!(
            select_winner(5, &addresses(1)),
            Err(DrawError::NotEnoughParticipants(1))
        );
    }

    #[test]
    fn observer_reproduces_winner() {
        let participants = addresses(5);
        let secret = DrawSecret::from_parts(13, [0x1a; 32]).unwrap();
        let published = secret.commitment();
        let selection = verify_draw(&published, &secret, &participants).unwrap();
        assert_eq!(selection.index, 3);
    }

    #[test]
    fn observer_rejects_tampered_secret() {
        let participants = addresses(5);
        let published = DrawSecret::from_parts(13, [0x1a; 32]).unwrap().commitment();
        let claimed = DrawSecret::from_parts(14, [0x1a; 32]).unwrap();
        assert_eq!(
            verify_draw(&published, &claimed, &participants),
            Err(DrawError::CommitmentMismatch)
        );
    }
}
