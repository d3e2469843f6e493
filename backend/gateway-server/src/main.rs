use gateway_server::{app, configs, logger};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    #[allow(clippy::expect_used)]
    let config = configs::Config::new().expect("failed while parsing config");

    #[allow(clippy::expect_used)]
    let _guard = logger::setup(
        &config.log,
        gateway_server::service_name!(),
        [gateway_server::service_name!(), "gateway_server", "tower_http"],
    )
    .expect("failed to initialize logging subsystem");

    let metrics_server = app::metrics_server_builder(config.clone());
    let server = app::server_builder(config);

    tokio::try_join!(metrics_server, server)?;

    Ok(())
}
