use std::process::ExitCode;

use clinicdesk::config::Config;

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::from_env();
    clinicdesk::init_tracing(&config);

    match clinicdesk::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
