//! Chain data as Bitcoin-core reports it, and the ways of fetching it.
//!
//! Blocks come from `getblock <hash> 1` (transaction ids only) and transactions from
//! `getrawtransaction <txid> true`, so `txindex=1` has to be enabled on the node.

use anyhow::{anyhow, Context};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Command;

#[derive(Deserialize, Debug, Clone)]
pub struct Block {
    pub hash: String,
    pub height: u64,
    #[serde(rename = "nTx")]
    pub n_tx: u64,
    pub tx: Vec<String>,
    /// Absent for the genesis block.
    pub previousblockhash: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Transaction {
    pub txid: String,
    #[serde(default)]
    pub vin: Vec<Input>,
    pub vout: Option<Vec<Output>>,
}

impl Transaction {
    pub fn is_coinbase(&self) -> bool {
        self.vin.first().is_some_and(|x| x.coinbase.is_some())
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct Input {
    pub coinbase: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Output {
    #[serde(rename = "scriptPubKey")]
    pub script_pub_key: Option<ScriptPubKey>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ScriptPubKey {
    pub asm: Option<String>,
    pub hex: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ChainInfo {
    blocks: u64,
}

/// Where blocks and transactions come from.
pub trait ChainSource {
    fn chain_tip_height(&self) -> anyhow::Result<u64>;

    fn block_hash(&self, height: u64) -> anyhow::Result<String>;

    fn block(&self, hash: &str) -> anyhow::Result<Block>;

    fn transaction(&self, txid: &str) -> anyhow::Result<Transaction>;
}

/// A transport able to issue Bitcoin-core RPC calls.
pub trait JsonRpc {
    fn request<T: DeserializeOwned>(&self, method: &str, params: &[Value]) -> anyhow::Result<T>;
}

impl JsonRpc for bitcoincore_rpc::Client {
    fn request<T: DeserializeOwned>(&self, method: &str, params: &[Value]) -> anyhow::Result<T> {
        use bitcoincore_rpc::RpcApi;
        Ok(self.call(method, params)?)
    }
}

/// Shells out to `bitcoin-cli`, one process per call.
#[derive(Debug, Clone)]
pub struct BitcoinCli {
    program: PathBuf,
    args: Vec<OsString>,
}

impl BitcoinCli {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Extra arguments put before the RPC method, like `-testnet` or `-datadir=...`.
    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl JsonRpc for BitcoinCli {
    fn request<T: DeserializeOwned>(&self, method: &str, params: &[Value]) -> anyhow::Result<T> {
        let mut command = Command::new(&self.program);
        command.args(&self.args).arg(method);
        for param in params {
            match param {
                Value::String(s) => command.arg(s),
                other => command.arg(other.to_string()),
            };
        }

        let output = command
            .output()
            .with_context(|| format!("Failed to run {}", self.program.display()))?;
        if !output.status.success() {
            return Err(anyhow!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        let stdout = String::from_utf8(output.stdout)?;
        parse_cli_output(&stdout)
    }
}

/// `bitcoin-cli` prints string results bare, not as JSON strings.
fn parse_cli_output<T: DeserializeOwned>(stdout: &str) -> anyhow::Result<T> {
    match serde_json::from_str(stdout) {
        Ok(x) => Ok(x),
        Err(e) => serde_json::from_value(Value::String(stdout.trim().into()))
            .map_err(|_| anyhow!(e).context("Unparseable bitcoin-cli output")),
    }
}

pub struct NodeSource<C> {
    rpc: C,
}

impl<C: JsonRpc> NodeSource<C> {
    pub fn new(rpc: C) -> Self {
        Self { rpc }
    }
}

impl<C: JsonRpc> ChainSource for NodeSource<C> {
    fn chain_tip_height(&self) -> anyhow::Result<u64> {
        let info: ChainInfo = self
            .rpc
            .request("getblockchaininfo", &[])
            .context("getblockchaininfo failed")?;
        Ok(info.blocks)
    }

    fn block_hash(&self, height: u64) -> anyhow::Result<String> {
        self.rpc
            .request("getblockhash", &[json!(height)])
            .with_context(|| format!("getblockhash {height} failed"))
    }

    fn block(&self, hash: &str) -> anyhow::Result<Block> {
        self.rpc
            .request("getblock", &[json!(hash), json!(1)])
            .with_context(|| format!("getblock {hash} failed"))
    }

    fn transaction(&self, txid: &str) -> anyhow::Result<Transaction> {
        self.rpc
            .request("getrawtransaction", &[json!(txid), json!(true)])
            .with_context(|| format!("getrawtransaction {txid} failed"))
    }
}
