//! Backward walk from a starting block down towards genesis.

use crate::chain::{Block, ChainSource};
use crate::processor::TransactionProcessor;
use crate::sink::PayloadSink;
use log::{debug, info, warn};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

#[derive(Debug, Clone, Copy)]
pub struct WalkOptions {
    /// 0 starts at the chain tip. Heights at or above the tip fall back to the tip.
    pub start_height: u64,
    /// 0 walks all the way down to genesis.
    pub max_blocks: u64,
    /// Transactions of one block fetched concurrently.
    pub jobs: usize,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            start_height: 0,
            max_blocks: 0,
            jobs: 1,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WalkSummary {
    pub blocks: u64,
    pub transactions: u64,
    pub payloads: u64,
}

#[derive(Debug)]
enum State {
    Start,
    FetchingChainInfo,
    FetchingBlock {
        height: u64,
        /// Known once we came from a child block.
        hash: Option<String>,
    },
    ProcessingTransactions {
        height: u64,
        block: Block,
    },
    AdvancingToParent {
        height: u64,
        parent: Option<String>,
    },
    Done,
}

pub struct BlockWalker<'a, S, K> {
    source: &'a S,
    processor: TransactionProcessor<'a, S, K>,
    options: WalkOptions,
    pool: Option<ThreadPool>,
    /// Blocks to process; settled once the start height is known.
    limit: u64,
    summary: WalkSummary,
}

impl<'a, S, K> BlockWalker<'a, S, K>
where
    S: ChainSource + Sync,
    K: PayloadSink + Sync,
{
    pub fn new(source: &'a S, sink: &'a K, options: WalkOptions) -> anyhow::Result<Self> {
        let pool = if options.jobs > 1 {
            Some(ThreadPoolBuilder::new().num_threads(options.jobs).build()?)
        } else {
            None
        };
        Ok(Self {
            source,
            processor: TransactionProcessor::new(source, sink),
            options,
            pool,
            limit: 0,
            summary: WalkSummary::default(),
        })
    }

    /// Runs the walk to completion. Failing to fetch a block aborts it.
    pub fn walk(mut self) -> anyhow::Result<WalkSummary> {
        let mut state = State::Start;
        while !matches!(state, State::Done) {
            state = self.step(state)?;
        }
        Ok(self.summary)
    }

    fn step(&mut self, state: State) -> anyhow::Result<State> {
        let next = match state {
            State::Start => State::FetchingChainInfo,
            State::FetchingChainInfo => {
                let tip = self.source.chain_tip_height()?;
                let start = self.options.start_height;
                let height = if start > 0 && start < tip { start } else { tip };
                self.limit = match self.options.max_blocks {
                    0 => height.saturating_add(1),
                    n => n,
                };
                info!("Chain tip: #{tip}, walking back from #{height}");
                State::FetchingBlock { height, hash: None }
            }
            State::FetchingBlock { height, hash } => {
                let hash = match hash {
                    Some(hash) => hash,
                    None => self.source.block_hash(height)?,
                };
                let block = self.source.block(&hash)?;
                State::ProcessingTransactions { height, block }
            }
            State::ProcessingTransactions { height, block } => {
                if block.height != height {
                    warn!(
                        "Block {} reports height {}, expected {height}",
                        block.hash, block.height
                    );
                }
                info!("Block #{height} {}, tx count: {}", block.hash, block.n_tx);
                let (transactions, payloads) = self.process_transactions(&block.tx);
                self.summary.blocks += 1;
                self.summary.transactions += transactions;
                self.summary.payloads += payloads;
                State::AdvancingToParent {
                    height,
                    parent: block.previousblockhash,
                }
            }
            State::AdvancingToParent { height, parent } => {
                if self.summary.blocks >= self.limit {
                    State::Done
                } else {
                    match (parent, height.checked_sub(1)) {
                        (Some(hash), Some(height)) => State::FetchingBlock {
                            height,
                            hash: Some(hash),
                        },
                        _ => {
                            debug!("Reached genesis");
                            State::Done
                        }
                    }
                }
            }
            State::Done => State::Done,
        };
        Ok(next)
    }

    /// Hands every transaction but the first (coinbase) to the processor.
    ///
    /// Returns the number of transactions handled and payloads written.
    fn process_transactions(&self, txids: &[String]) -> (u64, u64) {
        let txids = txids.get(1..).unwrap_or_default();
        let written: usize = match &self.pool {
            Some(pool) => pool.install(|| {
                txids
                    .par_iter()
                    .map(|txid| self.processor.process(txid))
                    .sum()
            }),
            None => txids
                .iter()
                .map(|txid| self.processor.process(txid))
                .sum(),
        };
        (txids.len() as u64, written as u64)
    }
}
