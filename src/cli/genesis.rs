//! `quorum genesis`: print a genesis document built from the config template.

use quorum::gov::GenesisState;

use super::config::QuorumConfig;

/// Build the genesis document, with `bond_denom` overriding the template.
pub fn build(
    config: &QuorumConfig,
    bond_denom: Option<String>,
) -> Result<GenesisState, Box<dyn std::error::Error>> {
    let mut template = config.genesis.clone();
    if let Some(denom) = bond_denom {
        template.bond_denom = denom;
    }
    template.to_genesis()
}

pub fn execute(
    config: &QuorumConfig,
    bond_denom: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let genesis = build(config, bond_denom)?;
    let denom = genesis.params.bond_denom()?;
    tracing::debug!(
        bond_denom = denom,
        starting_proposal_id = genesis.starting_proposal_id,
        "generated genesis"
    );
    println!("{}", serde_json::to_string_pretty(&genesis)?);
    Ok(())
}
