mod cors;

use std::{sync::Arc, time::Duration};

use actix_web::{
    App, HttpServer,
    web::{self},
};
use api_auth::services::auth::{GoogleTokenVerifier, IdTokenVerifier};
use common::env_config::Config;
use db::{
    catalog::CatalogStore, memory::MemoryStore, postgres::PgStore, sale::SaleStore,
    user::UserStore,
};
use mailer::{OtpMailer, SmtpMailer};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // get env vars
    let config = Config::from_env();
    let config_data = config.clone();

    // get info
    let is_production = config.environment == "production";
    let origin = config.cors_allowed_origin.clone();
    let timeout = Duration::from_secs(config.collaborator_timeout_secs);

    // init logger
    if config.console_logging_enabled {
        logger::setup().expect("Failed to set up logger");
    }

    // init stores; memory-backed unless a database is configured
    let (users, sales, catalog) = match &config.database_url {
        Some(database_url) => {
            let pool = db::setup(database_url, is_production)
                .await
                .expect("Failed to set up database");
            let store = Arc::new(PgStore::new(pool));
            (
                store.clone() as Arc<dyn UserStore>,
                store.clone() as Arc<dyn SaleStore>,
                store as Arc<dyn CatalogStore>,
            )
        }
        None => {
            log::warn!("DATABASE_URL not set, falling back to the in-memory store");
            let store = Arc::new(MemoryStore::new());
            (
                store.clone() as Arc<dyn UserStore>,
                store.clone() as Arc<dyn SaleStore>,
                store as Arc<dyn CatalogStore>,
            )
        }
    };

    // init external collaborators
    let otp_mailer: Arc<dyn OtpMailer> =
        Arc::new(SmtpMailer::new(&config.smtp, timeout).expect("Failed to set up SMTP mailer"));
    let verifier: Arc<dyn IdTokenVerifier> = Arc::new(
        GoogleTokenVerifier::new(config.google_client_id.clone(), timeout)
            .expect("Failed to set up Google token verifier"),
    );

    // seed the configured admin account
    api_auth::services::user::ensure_admin(&*users, &config)
        .await
        .expect("Failed to bootstrap admin user");

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(users.clone()))
            .app_data(web::Data::new(sales.clone()))
            .app_data(web::Data::new(catalog.clone()))
            .app_data(web::Data::new(otp_mailer.clone()))
            .app_data(web::Data::new(verifier.clone()))
            .app_data(web::Data::new(config_data.clone()))
            .wrap(logger::middleware()) // 3rd
            .wrap(extractor::middleware()) // 2nd
            .wrap(cors::middleware(&origin)) // 1st
            .service(
                web::scope("/api")
                    .service(api_auth::mount_auth())
                    .service(
                        web::scope("")
                            .wrap(api_auth::auth_middleware())
                            .service(api_auth::mount_user())
                            .service(api_sales::mount_sales()),
                    ),
            )
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .workers(config.num_workers)
    .run()
    .await
}
