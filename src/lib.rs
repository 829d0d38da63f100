use bitcoincore_rpc::Auth;
use log::LevelFilter;
use std::io;
use std::path::Path;

pub mod chain;
pub mod processor;
pub mod scan;
pub mod script;
pub mod sink;
pub mod walker;

#[cfg(test)]
mod mock;

pub use processor::PAYLOAD_HEX_THRESHOLD;
pub use walker::{BlockWalker, WalkOptions, WalkSummary};

pub const DEFAULT_RPC_ADDRESS: &str = "localhost:8332";

pub fn bitcoin_rpc(address: &str, auth: Auth) -> bitcoincore_rpc::Result<bitcoincore_rpc::Client> {
    bitcoincore_rpc::Client::new(address, auth)
}

pub fn set_up_logging(level: LevelFilter, file: Option<&Path>) -> anyhow::Result<()> {
    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                humantime::format_rfc3339(std::time::SystemTime::now()),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(io::stdout());
    if let Some(file) = file {
        dispatch = dispatch.chain(fern::log_file(file)?);
    }
    dispatch.apply()?;
    Ok(())
}
