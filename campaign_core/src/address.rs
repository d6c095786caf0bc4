//! Program-scoped address derivation.

use solana_sdk::pubkey::{Pubkey, PubkeyError, MAX_SEEDS, MAX_SEED_LEN};

use crate::error::AddressError;

/// A derived address together with the bump seed that moved it off the curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DerivedAddress {
    pub address: Pubkey,
    pub bump: u8,
}

fn validate_seeds(seeds: &[&[u8]]) -> Result<(), AddressError> {
    // one slot is reserved for the bump
    if seeds.len() >= MAX_SEEDS {
        return Err(AddressError::TooManySeeds(seeds.len()));
    }
    if let Some((index, seed)) = seeds
        .iter()
        .enumerate()
        .find(|(_, seed)| seed.len() > MAX_SEED_LEN)
    {
        return Err(AddressError::SeedTooLong {
            index,
            len: seed.len(),
        });
    }
    Ok(())
}

fn with_bump(program_id: &Pubkey, seeds: &[&[u8]], bump: u8) -> Result<Pubkey, PubkeyError> {
    let bump_seed = [bump];
    let mut all: Vec<&[u8]> = Vec::with_capacity(seeds.len() + 1);
    all.extend_from_slice(seeds);
    all.push(&bump_seed);
    Pubkey::create_program_address(&all, program_id)
}

/// Derives the address for `seeds` under `program_id`.
///
/// Bumps are tried from 255 downwards. A candidate on the ed25519 curve has a
/// private key and cannot belong to the program, so it is skipped and the next
/// bump tried.
pub fn derive(seeds: &[&[u8]], program_id: &Pubkey) -> Result<DerivedAddress, AddressError> {
    validate_seeds(seeds)?;

    for bump in (0..=u8::MAX).rev() {
        match with_bump(program_id, seeds, bump) {
            Ok(address) => return Ok(DerivedAddress { address, bump }),
            Err(PubkeyError::InvalidSeeds) => {
                log::trace!("bump {} lands on curve, retrying", bump);
            }
            Err(e) => return Err(AddressError::Rejected(e.to_string())),
        }
    }

    Err(AddressError::NoViableBump)
}

/// Re-derives with a known bump and checks it against `expected`.
pub fn verify(seeds: &[&[u8]], bump: u8, program_id: &Pubkey, expected: &Pubkey) -> bool {
    validate_seeds(seeds).is_ok()
        && with_bump(program_id, seeds, bump)
            .map(|address| address == *expected)
            .unwrap_or(false)
}

/// Seeds of a campaign account: the payer's key, then the title's bytes.
pub fn campaign_seeds<'a>(payer: &'a Pubkey, title: &'a str) -> [&'a [u8]; 2] {
    [payer.as_ref(), title.as_bytes()]
}

/// One address per (payer, title). Titles over 32 bytes cannot be seeds.
pub fn derive_campaign_address(
    payer: &Pubkey,
    title: &str,
    program_id: &Pubkey,
) -> Result<DerivedAddress, AddressError> {
    derive(&campaign_seeds(payer, title), program_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_runtime_derivation() {
        let program_id = Pubkey::new_unique();
        let payer = Pubkey::new_unique();

        let derived = derive_campaign_address(&payer, "Anaconda", &program_id).unwrap();
        let (expected, bump) =
            Pubkey::find_program_address(&[payer.as_ref(), &b"Anaconda"[..]], &program_id);

        assert_eq!(derived.address, expected);
        assert_eq!(derived.bump, bump);
        assert!(!derived.address.is_on_curve());
    }

    #[test]
    fn derivation_is_deterministic() {
        let program_id = Pubkey::new_unique();
        let payer = Pubkey::new_unique();
        let first = derive_campaign_address(&payer, "Otter", &program_id).unwrap();
        let second = derive_campaign_address(&payer, "Otter", &program_id).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn distinct_titles_and_payers_get_distinct_addresses() {
        let program_id = Pubkey::new_unique();
        let alice = Pubkey::new_unique();
        let bob = Pubkey::new_unique();

        let a = derive_campaign_address(&alice, "Otter", &program_id).unwrap();
        let b = derive_campaign_address(&alice, "Beaver", &program_id).unwrap();
        let c = derive_campaign_address(&bob, "Otter", &program_id).unwrap();
        assert_ne!(a.address, b.address);
        assert_ne!(a.address, c.address);
    }

    #[test]
    fn long_title_is_rejected() {
        let program_id = Pubkey::new_unique();
        let payer = Pubkey::new_unique();
        let title = "t".repeat(33);
        assert_eq!(
            derive_campaign_address(&payer, &title, &program_id),
            Err(AddressError::SeedTooLong { index: 1, len: 33 })
        );
    }

    #[test]
    fn too_many_seeds_are_rejected() {
        let seeds: Vec<&[u8]> = vec![&b"s"[..]; MAX_SEEDS];
        assert_eq!(
            derive(&seeds, &Pubkey::new_unique()),
            Err(AddressError::TooManySeeds(MAX_SEEDS))
        );
    }

    #[test]
    fn verify_accepts_only_the_derived_bump() {
        let program_id = Pubkey::new_unique();
        let payer = Pubkey::new_unique();
        let seeds = campaign_seeds(&payer, "Kestrel");
        let derived = derive(&seeds, &program_id).unwrap();

        assert!(verify(&seeds, derived.bump, &program_id, &derived.address));
        assert!(!verify(&seeds, derived.bump, &program_id, &payer));
    }
}
