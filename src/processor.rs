use crate::chain::ChainSource;
use crate::scan::scan;
use crate::sink::PayloadSink;
use log::{debug, error, warn};

/// Payloads this long (in hex chars) or shorter are left out: 80 bytes is the standard
/// OP_RETURN relay limit, and those small pushes are mostly protocol markers.
pub const PAYLOAD_HEX_THRESHOLD: usize = 160;

pub fn qualifies(payload: &str) -> bool {
    payload.len() > PAYLOAD_HEX_THRESHOLD
}

pub struct TransactionProcessor<'a, S, K> {
    source: &'a S,
    sink: &'a K,
}

impl<'a, S, K> TransactionProcessor<'a, S, K>
where
    S: ChainSource,
    K: PayloadSink,
{
    pub fn new(source: &'a S, sink: &'a K) -> Self {
        Self { source, sink }
    }

    /// Fetches `txid` and persists its large OP_RETURN payloads.
    ///
    /// Failures stay local to the transaction and are only logged. Returns the number of
    /// payloads written.
    pub fn process(&self, txid: &str) -> usize {
        let tx = match self.source.transaction(txid) {
            Ok(tx) => tx,
            Err(e) => {
                warn!("Skipping transaction {txid}: {e:#}");
                return 0;
            }
        };
        if tx.vout.is_none() {
            warn!("No outputs found in transaction {txid}");
            return 0;
        }
        if tx.is_coinbase() {
            debug!("Skipping coinbase transaction {txid}");
            return 0;
        }

        let mut written = 0_usize;
        for payload in scan(&tx) {
            if !qualifies(&payload) {
                continue;
            }
            debug!("Tx {txid}: {} bytes of OP_RETURN data", payload.len() / 2);
            match self.sink.append(txid, &payload) {
                Ok(()) => written += 1,
                Err(e) => error!("Failed to persist payload of {txid}: {e:#}"),
            }
        }
        written
    }
}
