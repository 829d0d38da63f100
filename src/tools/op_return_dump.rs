//! Walk the chain backwards and dump OP_RETURN payloads larger than 80 bytes.
//!
//! Each qualifying payload is appended, hex-encoded, to `<output-dir>/<txid>.txt`.
//! `getrawtransaction` needs `txindex=1` on the node.

use bitcoincore_rpc::Auth;
use clap::builder::RangedU64ValueParser;
use clap::Parser;
use log::{info, LevelFilter};
use op_return_dump::chain::{BitcoinCli, ChainSource, NodeSource};
use op_return_dump::sink::FileSink;
use op_return_dump::{
    bitcoin_rpc, set_up_logging, BlockWalker, WalkOptions, WalkSummary, DEFAULT_RPC_ADDRESS,
    PAYLOAD_HEX_THRESHOLD,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(about)]
struct Args {
    /// Block height to start from; 0 means the chain tip
    #[arg(default_value_t = 0)]
    start_height: u64,
    /// Number of blocks to scan; 0 means down to genesis
    #[arg(default_value_t = 0)]
    max_blocks: u64,
    #[arg(long, default_value = DEFAULT_RPC_ADDRESS)]
    rpc_url: String,
    #[arg(long, requires = "rpc_password")]
    rpc_user: Option<String>,
    #[arg(long, requires = "rpc_user")]
    rpc_password: Option<String>,
    #[arg(long, conflicts_with = "rpc_user")]
    rpc_cookie: Option<PathBuf>,
    /// Talk to the node through this `bitcoin-cli` executable instead of RPC
    #[arg(long)]
    bitcoin_cli: Option<PathBuf>,
    /// Extra argument for `bitcoin-cli`, e.g. `--cli-arg=-testnet`
    #[arg(long = "cli-arg", requires = "bitcoin_cli", allow_hyphen_values = true)]
    cli_args: Vec<String>,
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,
    /// Transactions of a block fetched concurrently
    #[arg(short, long, default_value_t = 1, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    jobs: usize,
    #[arg(long)]
    log_file: Option<PathBuf>,
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    set_up_logging(level, args.log_file.as_deref())?;

    let sink = FileSink::new(&args.output_dir)?;
    info!(
        "Dumping OP_RETURN payloads over {} bytes to {}",
        PAYLOAD_HEX_THRESHOLD / 2,
        sink.dir().display()
    );
    let options = WalkOptions {
        start_height: args.start_height,
        max_blocks: args.max_blocks,
        jobs: args.jobs,
    };

    let summary = match &args.bitcoin_cli {
        Some(program) => {
            info!("Using {}", program.display());
            let cli = BitcoinCli::new(program).args(&args.cli_args);
            run(&NodeSource::new(cli), &sink, options)?
        }
        None => {
            let auth = match (args.rpc_cookie, args.rpc_user, args.rpc_password) {
                (Some(cookie), _, _) => Auth::CookieFile(cookie),
                (None, Some(user), Some(password)) => Auth::UserPass(user, password),
                _ => Auth::None,
            };
            info!("Bitcoin-core RPC address: {}", args.rpc_url);
            let client = bitcoin_rpc(&args.rpc_url, auth)?;
            run(&NodeSource::new(client), &sink, options)?
        }
    };

    info!(
        "Done: {} blocks, {} transactions, {} payloads written to {}",
        summary.blocks,
        summary.transactions,
        summary.payloads,
        sink.dir().display()
    );
    Ok(())
}

fn run<S>(source: &S, sink: &FileSink, options: WalkOptions) -> anyhow::Result<WalkSummary>
where
    S: ChainSource + Sync,
{
    BlockWalker::new(source, sink, options)?.walk()
}
