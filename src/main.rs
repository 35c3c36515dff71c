use actix_web::web::{self, Data, JsonConfig, PathConfig, QueryConfig};
use actix_web::{App, HttpResponse, HttpServer};
use clap::Parser;
use mongodb::Client;
use tracing::info;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::fmt::format::FmtSpan;

mod campaign;
mod config;
mod database;
mod error;

use error::Error;

use crate::campaign::reconciler;
use crate::config::Config;
use crate::database::{Database, MongoDatabase};

async fn path_not_found() -> Result<HttpResponse, Error> {
    Err(Error::PathNotFound)
}

#[actix_web::main]
async fn main() -> Result<(), Error> {
    let _ = dotenvy::dotenv();
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_span_events(FmtSpan::NEW)
        .compact()
        .init();

    info!("connecting to db: {}", config.mongodb_uri);
    let db = Client::with_uri_str(&config.mongodb_uri)
        .await?
        .database(&config.database_name);
    let db = MongoDatabase::initialize(db).await?;

    info!(
        period_secs = config.reconcile_interval_secs,
        "starting campaign activation reconciler"
    );
    actix_web::rt::spawn(reconciler::run(
        Box::new(db.clone()),
        config.reconcile_interval(),
    ));

    let policy = Data::new(config.validation_policy());
    let db = Data::new(Box::new(db) as Box<dyn Database>);

    info!("listening on {}", config.bind_address);
    HttpServer::new(move || {
        App::new()
            .app_data(JsonConfig::default().error_handler(|err, _req| {
                // format json errors with custom format
                Error::InvalidJson(err).into()
            }))
            .app_data(PathConfig::default().error_handler(|err, _req| {
                // format path errors with custom format
                Error::InvalidPath(err).into()
            }))
            .app_data(QueryConfig::default().error_handler(|err, _req| {
                // format query errors with custom format
                Error::InvalidQuery(err).into()
            }))
            .app_data(db.clone())
            .app_data(policy.clone())
            .wrap(TracingLogger::default())
            .service(campaign::endpoints::create_campaign)
            .service(campaign::endpoints::get_campaigns)
            .service(campaign::endpoints::get_campaign_by_id)
            .service(campaign::endpoints::update_campaign)
            .service(campaign::endpoints::delete_campaign_by_id)
            .service(campaign::endpoints::delete_campaigns_by_name)
            .default_service(web::to(path_not_found))
    })
    .bind(&config.bind_address)?
    .run()
    .await?;

    Ok(())
}
