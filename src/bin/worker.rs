pub use slack_recap::worker::handler;

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    slack_recap::setup_logging();
    lambda_runtime::run(lambda_runtime::service_fn(handler)).await
}
