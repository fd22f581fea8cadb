//! Binary entrypoint for the qbdeck CLI.

#[tokio::main]
async fn main() {
    let exit_code = qbdeck_cli::run().await;
    std::process::exit(exit_code);
}
