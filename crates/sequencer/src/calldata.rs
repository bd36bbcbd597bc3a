use alloy_primitives::Bytes;
use alloy_sol_types::SolCall;
use binding::sequencer_inbox::{ILegacySequencerInbox, ISequencerInbox};
use eyre::{bail, eyre};

/// Extract the batch payload from `addSequencerL2BatchFromOrigin` calldata.
///
/// Both the current entrypoint (with message counts) and the legacy
/// four-argument one are accepted.
pub fn decode_batch_calldata(input: &[u8]) -> eyre::Result<Bytes> {
    let Some(selector) = input.get(..4) else {
        bail!("Calldata too short: {} bytes", input.len());
    };

    if selector == ISequencerInbox::addSequencerL2BatchFromOriginCall::SELECTOR {
        let call = ISequencerInbox::addSequencerL2BatchFromOriginCall::abi_decode(input)
            .map_err(|e| eyre!("Malformed addSequencerL2BatchFromOrigin call: {}", e))?;
        return Ok(call.data);
    }

    if selector == ILegacySequencerInbox::addSequencerL2BatchFromOriginCall::SELECTOR {
        let call = ILegacySequencerInbox::addSequencerL2BatchFromOriginCall::abi_decode(input)
            .map_err(|e| eyre!("Malformed legacy addSequencerL2BatchFromOrigin call: {}", e))?;
        return Ok(call.data);
    }

    bail!(
        "Not a batch posting call (selector 0x{})",
        alloy_primitives::hex::encode(selector)
    )
}
