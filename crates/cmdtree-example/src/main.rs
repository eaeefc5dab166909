use std::process::ExitCode;
use std::sync::Arc;

use cmdtree_example::{router, HttpTransport};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("info"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let transport = match HttpTransport::new() {
        Ok(transport) => transport,
        Err(err) => {
            eprintln!("Error: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    let router = match router(Arc::new(transport)) {
        Ok(router) => router,
        Err(err) => {
            eprintln!("Error: {err}");
            return ExitCode::FAILURE;
        }
    };

    cmdtree::run(&router)
}
