//! Instruction builders and account readers for the draw program, and the
//! prize transfer.

use anchor_lang::{AccountDeserialize, Discriminator, InstructionData, ToAccountMetas};
use prize_draw::constants::{SEED_DRAW, SEED_ENTRY};
use prize_draw::state::{DrawPhase as ChainPhase, DrawSession as DrawAccount, Entry};
use solana_program::instruction::Instruction;
use solana_program::pubkey::Pubkey;
use solana_program::{system_instruction, system_program};

use crate::chain::{MemcmpFilter, Rpc};
use crate::commitment::{Commitment, DrawSecret};
use crate::error::{DrawError, Result};
use crate::winner::{verify_draw, WinnerSelection};

/// Offset of `Entry::draw`: discriminator, then bump.
const ENTRY_DRAW_OFFSET: usize = 8 + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawProgram {
    program_id: Pubkey,
}

impl DrawProgram {
    pub fn new(program_id: Pubkey) -> Self {
        Self { program_id }
    }

    pub fn program_id(&self) -> Pubkey {
        self.program_id
    }

    pub fn draw_address(&self, session_id: u32) -> Pubkey {
        Pubkey::find_program_address(&[SEED_DRAW, &session_id.to_le_bytes()], &self.program_id).0
    }

    pub fn entry_address(&self, session_id: u32, participant: &Pubkey) -> Pubkey {
        let draw = self.draw_address(session_id);
        Pubkey::find_program_address(
            &[SEED_ENTRY, draw.as_ref(), participant.as_ref()],
            &self.program_id,
        )
        .0
    }

    pub fn commit_draw(
        &self,
        authority: &Pubkey,
        session_id: u32,
        commitment: &Commitment,
    ) -> Instruction {
        Instruction {
            program_id: self.program_id,
            accounts: prize_draw::accounts::CommitDraw {
                authority: *authority,
                draw: self.draw_address(session_id),
                system_program: system_program::ID,
            }
            .to_account_metas(None),
            data: prize_draw::instruction::CommitDraw {
                session_id,
                commitment: *commitment,
            }
            .data(),
        }
    }

    pub fn register_participant(
        &self,
        authority: &Pubkey,
        session_id: u32,
        participant: &Pubkey,
    ) -> Instruction {
        Instruction {
            program_id: self.program_id,
            accounts: prize_draw::accounts::RegisterParticipant {
                authority: *authority,
                draw: self.draw_address(session_id),
                entry: self.entry_address(session_id, participant),
                system_program: system_program::ID,
            }
            .to_account_metas(None),
            data: prize_draw::instruction::RegisterParticipant {
                participant: *participant,
            }
            .data(),
        }
    }

    pub fn close_registrations(&self, authority: &Pubkey, session_id: u32) -> Instruction {
        Instruction {
            program_id: self.program_id,
            accounts: prize_draw::accounts::CloseRegistrations {
                authority: *authority,
                draw: self.draw_address(session_id),
            }
            .to_account_metas(None),
            data: prize_draw::instruction::CloseRegistrations {}.data(),
        }
    }

    /// `winner` is the participant the client expects at `secret mod n`; the
    /// program rejects the call if its entry carries a different index.
    pub fn reveal_winner(
        &self,
        authority: &Pubkey,
        session_id: u32,
        secret: &DrawSecret,
        winner: &Pubkey,
    ) -> Instruction {
        Instruction {
            program_id: self.program_id,
            accounts: prize_draw::accounts::RevealWinner {
                authority: *authority,
                draw: self.draw_address(session_id),
                winner_entry: self.entry_address(session_id, winner),
            }
            .to_account_metas(None),
            data: prize_draw::instruction::RevealWinner {
                secret_number: secret.secret_number(),
                salt: *secret.salt(),
            }
            .data(),
        }
    }
}

impl DrawProgram {
    /// The draw account of `session_id`, `None` before the commit lands.
    pub async fn fetch_draw<R: Rpc>(&self, rpc: &R, session_id: u32) -> Result<Option<DrawAccount>> {
        let address = self.draw_address(session_id);
        match rpc.get_account_data(&address).await? {
            Some(data) => decode_account(&address, &data).map(Some),
            None => Ok(None),
        }
    }

    /// Registration entries of the draw, in registration order.
    pub async fn fetch_entries<R: Rpc>(&self, rpc: &R, session_id: u32) -> Result<Vec<Entry>> {
        let draw = self.draw_address(session_id);
        let filters = [
            MemcmpFilter::new(0, Entry::DISCRIMINATOR),
            MemcmpFilter::new(ENTRY_DRAW_OFFSET, draw.to_bytes()),
        ];
        let mut entries = rpc
            .get_program_accounts(&self.program_id, &filters)
            .await?
            .into_iter()
            .map(|(address, data)| decode_account::<Entry>(&address, &data))
            .collect::<Result<Vec<_>>>()?;
        entries.sort_by_key(|entry| entry.index);
        Ok(entries)
    }

    /// Participant addresses by entry index. Gaps in the indices are an error.
    pub async fn fetch_participants<R: Rpc>(&self, rpc: &R, session_id: u32) -> Result<Vec<Pubkey>> {
        let entries = self.fetch_entries(rpc, session_id).await?;
        entries
            .iter()
            .enumerate()
            .map(|(position, entry)| {
                if entry.index as usize != position {
                    return Err(DrawError::Account(format!(
                        "draw {} has no entry at index {}",
                        session_id, position
                    )));
                }
                Ok(entry.participant)
            })
            .collect()
    }

    /// Checks a revealed draw from account data alone: the revealed secret
    /// must open the commitment and select the recorded winner.
    pub async fn audit_draw<R: Rpc>(&self, rpc: &R, session_id: u32) -> Result<WinnerSelection> {
        let draw = self
            .fetch_draw(rpc, session_id)
            .await?
            .ok_or_else(|| DrawError::Account(format!("draw {} not found", session_id)))?;
        if draw.phase != ChainPhase::Revealed {
            return Err(DrawError::Account(format!(
                "draw {} is not revealed yet",
                session_id
            )));
        }

        let participants = self.fetch_participants(rpc, session_id).await?;
        if participants.len() as u32 != draw.num_participants {
            return Err(DrawError::Account(format!(
                "draw {} counts {} participants but has {} entries",
                session_id,
                draw.num_participants,
                participants.len()
            )));
        }

        let secret = DrawSecret::from_parts(draw.revealed_secret, draw.revealed_salt)?;
        let selection = verify_draw(&draw.commitment, &secret, &participants)?;
        if selection.index != draw.winner_index || selection.address != draw.winner {
            return Err(DrawError::Account(format!(
                "draw {} records winner #{} but the secret selects #{}",
                session_id, draw.winner_index, selection.index
            )));
        }
        Ok(selection)
    }
}

fn decode_account<T: AccountDeserialize>(address: &Pubkey, data: &[u8]) -> Result<T> {
    T::try_deserialize(&mut &data[..]).map_err(|e| DrawError::Account(format!("{}: {}", address, e)))
}

/// Native transfer of the prize from the operator to the winner.
pub fn prize_payment(from: &Pubkey, winner: &Pubkey, lamports: u64) -> Instruction {
    system_instruction::transfer(from, winner, lamports)
}
