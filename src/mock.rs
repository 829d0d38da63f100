//! In-memory chain and sink for tests.

use crate::chain::{Block, ChainSource, Transaction};
use crate::sink::PayloadSink;
use anyhow::anyhow;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct MockChain {
    blocks: Vec<Block>,
    txs: HashMap<String, Transaction>,
    calls: Mutex<Vec<String>>,
}

impl MockChain {
    /// A linear chain of `len` blocks; block `h` holds a coinbase followed by `txids(h)`.
    pub fn linear(len: u64, txids: impl Fn(u64) -> Vec<String>) -> Self {
        let mut chain = Self::default();
        for h in 0..len {
            let mut tx = vec![format!("coinbase-{h}")];
            tx.extend(txids(h));
            chain.blocks.push(Block {
                hash: block_hash(h),
                height: h,
                n_tx: tx.len() as u64,
                tx,
                previousblockhash: h.checked_sub(1).map(block_hash),
            });
        }
        chain
    }

    pub fn set_parent(&mut self, height: u64, parent: &str) {
        self.blocks[height as usize].previousblockhash = Some(parent.into());
    }

    pub fn add_tx(&mut self, tx: Transaction) {
        self.txs.insert(tx.txid.clone(), tx);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

pub fn block_hash(height: u64) -> String {
    format!("{height:064x}")
}

/// A transaction with one output per OP_RETURN script in `scripts`.
pub fn op_return_tx<I, S>(txid: &str, scripts: I) -> Transaction
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let vout = scripts
        .into_iter()
        .enumerate()
        .map(|(n, hex)| {
            json!({
                "value": 0.0,
                "n": n,
                "scriptPubKey": {"asm": "OP_RETURN", "hex": hex.as_ref()},
            })
        })
        .collect::<Vec<_>>();
    serde_json::from_value(json!({
        "txid": txid,
        "vin": [{"txid": "00", "vout": 0}],
        "vout": vout,
    }))
    .unwrap()
}

impl ChainSource for MockChain {
    fn chain_tip_height(&self) -> anyhow::Result<u64> {
        self.record("getblockchaininfo".into());
        self.blocks
            .len()
            .checked_sub(1)
            .map(|x| x as u64)
            .ok_or_else(|| anyhow!("getblockchaininfo failed"))
    }

    fn block_hash(&self, height: u64) -> anyhow::Result<String> {
        self.record(format!("getblockhash {height}"));
        self.blocks
            .get(height as usize)
            .map(|x| x.hash.clone())
            .ok_or_else(|| anyhow!("getblockhash {height} failed"))
    }

    fn block(&self, hash: &str) -> anyhow::Result<Block> {
        self.record(format!("getblock {hash}"));
        self.blocks
            .iter()
            .find(|x| x.hash == hash)
            .cloned()
            .ok_or_else(|| anyhow!("getblock {hash} failed"))
    }

    fn transaction(&self, txid: &str) -> anyhow::Result<Transaction> {
        self.record(format!("getrawtransaction {txid}"));
        self.txs
            .get(txid)
            .cloned()
            .ok_or_else(|| anyhow!("getrawtransaction {txid} failed"))
    }
}

#[derive(Default)]
pub struct MemorySink {
    lines: Mutex<Vec<(String, String)>>,
    failing: bool,
}

impl MemorySink {
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Default::default()
        }
    }

    pub fn lines(&self) -> Vec<(String, String)> {
        self.lines.lock().unwrap().clone()
    }
}

impl PayloadSink for MemorySink {
    fn append(&self, txid: &str, payload: &str) -> anyhow::Result<()> {
        if self.failing {
            return Err(anyhow!("disk full"));
        }
        self.lines
            .lock()
            .unwrap()
            .push((txid.into(), payload.into()));
        Ok(())
    }
}
