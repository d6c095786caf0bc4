use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};
use solana_system_interface::program as system_program;

use crate::{
    address::{derive_campaign_address, DerivedAddress},
    codec::{encode_to_vec, MAX_RECORD_LEN},
    error::InstructionError,
    state::{CampaignFields, CampaignInstruction},
};

/// Wraps an encoded payload into an instruction for `program_id`.
///
/// The signer pays and is read-only, the target is the writable account the
/// program creates, and the system program rides along for the allocation.
pub fn build(
    payload: Vec<u8>,
    signer: &Pubkey,
    target: &Pubkey,
    program_id: &Pubkey,
) -> Result<Instruction, InstructionError> {
    if payload.is_empty() || payload.len() > MAX_RECORD_LEN {
        return Err(InstructionError::MalformedPayload(payload.len()));
    }

    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*signer, true),
            AccountMeta::new(*target, false),
            AccountMeta::new_readonly(system_program::ID, false),
        ],
        data: payload,
    })
}

/// Derives the campaign address, encodes the create request and builds the
/// instruction.
pub fn create_campaign_instruction(
    fields: &CampaignFields,
    payer: &Pubkey,
    program_id: &Pubkey,
) -> Result<(Instruction, DerivedAddress), InstructionError> {
    let derived = derive_campaign_address(payer, &fields.title, program_id)?;
    let payload = encode_to_vec(&CampaignInstruction::Create(fields.clone()))?;
    let ix = build(payload, payer, &derived.address, program_id)?;
    Ok((ix, derived))
}
