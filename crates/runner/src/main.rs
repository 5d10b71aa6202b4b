//! utilkit Runner - drives the async helpers against simulated workloads
//!
//! This binary is the composition root: it loads configuration from the
//! environment, installs logging and runs each helper once so their
//! behaviour can be observed in the log output.

mod config;
mod run;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    run::run().await
}
