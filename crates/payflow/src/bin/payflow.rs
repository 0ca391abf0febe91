use payflow::{configs::settings::Settings, core::errors::ApplicationResult, logger};

#[actix_web::main]
async fn main() -> ApplicationResult<()> {
    // Configuration or migration failure propagates out of main and exits
    // non-zero.
    let conf = Settings::new()?;
    payflow_env::logger::setup(conf.log.format);
    logger::info!(version = %payflow_env::version(), "starting payflow");

    payflow::start_server(conf).await?;

    logger::info!("payflow shut down cleanly");
    Ok(())
}
