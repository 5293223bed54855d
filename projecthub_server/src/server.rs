use std::{fs, time::Duration};

use actix_files::Files;
use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use projecthub_engine::{AuthApi, CatalogApi, PaymentFlowApi, ProjectApi, SqliteDatabase};

use crate::{
    auth::{JwtVerifier, TokenIssuer},
    config::ServerConfig,
    errors::ServerError,
    gateway::RazorpayGateway,
    routes::{
        health,
        AddPortfolioItemRoute,
        AllPaymentsRoute,
        AllProjectsRoute,
        ApproveUserRoute,
        BuyProjectRoute,
        BuyRequestsRoute,
        ConfirmProjectPaymentRoute,
        CreateOrderRoute,
        DeletePortfolioItemRoute,
        GatewayKeyId,
        LoginRoute,
        MyPaymentsRoute,
        MyProjectRoute,
        MyProjectsRoute,
        MyPurchasesRoute,
        OverrideStatusRoute,
        PaymentReceiptRoute,
        PendingUsersRoute,
        PortfolioAssetsRoute,
        PortfolioCodeRoute,
        PortfolioItemRoute,
        PortfolioListRoute,
        PortfolioVideoRoute,
        ProjectDeliveryAssetsRoute,
        ProjectDeliveryCodeRoute,
        ProjectDeliveryVideoRoute,
        RegisterRoute,
        SendQuoteRoute,
        SetProgressRoute,
        SubmitProjectRoute,
        UpdatePortfolioItemRoute,
        UploadDir,
        VerifyPaymentRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    SqliteDatabase::create_database_if_missing(&config.database_url)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if let Some(email) = &config.admin_email {
        let auth_api = AuthApi::new(db.clone());
        auth_api.ensure_admin(email).await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    }
    fs::create_dir_all(&config.upload_dir)?;
    info!("🚀️ Starting server on {}:{}", config.host, config.port);
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        let auth_api = AuthApi::new(db.clone());
        let project_api = ProjectApi::new(db.clone());
        let catalog_api = CatalogApi::new(db.clone());
        let payment_api = PaymentFlowApi::new(db.clone(), config.gateway.key_secret.clone())
            .with_currency(&config.gateway.currency);
        let jwt_signer = TokenIssuer::new(&config.auth);
        let jwt_verifier = JwtVerifier::new(&config.auth);
        let gateway = RazorpayGateway::new(config.gateway.clone());
        // Every route carries its full path, so everything registers on the app root. Admin routes carry their
        // own ACL wrapper; the rest authenticate through the JwtClaims extractor.
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("ph::access_log"))
            .app_data(web::Data::new(auth_api))
            .app_data(web::Data::new(project_api))
            .app_data(web::Data::new(catalog_api))
            .app_data(web::Data::new(payment_api))
            .app_data(web::Data::new(jwt_signer))
            .app_data(web::Data::new(jwt_verifier))
            .app_data(web::Data::new(gateway))
            .app_data(web::Data::new(UploadDir(config.upload_dir.clone())))
            .app_data(web::Data::new(GatewayKeyId(config.gateway.key_id.clone())))
            .service(health)
            .service(RegisterRoute::<SqliteDatabase>::new())
            .service(LoginRoute::<SqliteDatabase>::new())
            .service(PortfolioListRoute::<SqliteDatabase>::new())
            .service(PortfolioItemRoute::<SqliteDatabase>::new())
            .service(AddPortfolioItemRoute::<SqliteDatabase>::new())
            .service(UpdatePortfolioItemRoute::<SqliteDatabase>::new())
            .service(DeletePortfolioItemRoute::<SqliteDatabase>::new())
            .service(SubmitProjectRoute::<SqliteDatabase>::new())
            .service(MyProjectsRoute::<SqliteDatabase>::new())
            .service(MyProjectRoute::<SqliteDatabase>::new())
            .service(MyPaymentsRoute::<SqliteDatabase>::new())
            .service(MyPurchasesRoute::<SqliteDatabase>::new())
            .service(BuyProjectRoute::<SqliteDatabase>::new())
            .service(ConfirmProjectPaymentRoute::<SqliteDatabase>::new())
            .service(CreateOrderRoute::<SqliteDatabase, RazorpayGateway>::new())
            .service(VerifyPaymentRoute::<SqliteDatabase>::new())
            .service(PaymentReceiptRoute::<SqliteDatabase>::new())
            .service(PendingUsersRoute::<SqliteDatabase>::new())
            .service(ApproveUserRoute::<SqliteDatabase>::new())
            .service(AllProjectsRoute::<SqliteDatabase>::new())
            .service(SendQuoteRoute::<SqliteDatabase>::new())
            .service(SetProgressRoute::<SqliteDatabase>::new())
            .service(OverrideStatusRoute::<SqliteDatabase>::new())
            .service(ProjectDeliveryVideoRoute::<SqliteDatabase>::new())
            .service(ProjectDeliveryCodeRoute::<SqliteDatabase>::new())
            .service(ProjectDeliveryAssetsRoute::<SqliteDatabase>::new())
            .service(PortfolioVideoRoute::<SqliteDatabase>::new())
            .service(PortfolioCodeRoute::<SqliteDatabase>::new())
            .service(PortfolioAssetsRoute::<SqliteDatabase>::new())
            .service(AllPaymentsRoute::<SqliteDatabase>::new())
            .service(BuyRequestsRoute::<SqliteDatabase>::new())
            .service(Files::new("/uploads", config.upload_dir.clone()))
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
