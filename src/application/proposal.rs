//! Proposal token discovery.

use alloy_primitives::Address;
use tracing::debug;

use crate::domain::pool::ProposalTokens;
use crate::error::Result;
use crate::port::outbound::chain::Chain;

const YES_COMPANY: u8 = 0;
const NO_COMPANY: u8 = 1;
const YES_CURRENCY: u8 = 2;
const NO_CURRENCY: u8 = 3;

/// Read collateral and wrapped outcome tokens of a proposal.
pub async fn load_proposal_tokens(chain: &dyn Chain, proposal: Address) -> Result<ProposalTokens> {
    let ((company, currency), yes_company, no_company, yes_currency, no_currency) = tokio::try_join!(
        chain.collateral_tokens(proposal),
        chain.wrapped_outcome(proposal, YES_COMPANY),
        chain.wrapped_outcome(proposal, NO_COMPANY),
        chain.wrapped_outcome(proposal, YES_CURRENCY),
        chain.wrapped_outcome(proposal, NO_CURRENCY),
    )?;
    let tokens = ProposalTokens {
        company,
        currency,
        yes_company,
        no_company,
        yes_currency,
        no_currency,
    };
    debug!(proposal = %proposal, ?tokens, "Loaded proposal tokens");
    Ok(tokens)
}
