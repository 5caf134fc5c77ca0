use clap::Parser;
use cookiegate::cli::{
    Args, build_config, handle_create_user, init_logging, load_jwt_secret, open_database,
    validate_origin,
};
use cookiegate::jwt::JwtConfig;
use cookiegate::{init_cleanup, run_server};
use tracing::{error, info};

fn main() {
    let args = Args::parse();

    init_logging(&args.log_format);

    // Read (and scrub) the secret before the runtime spawns its workers.
    let Some(jwt_secret) = load_jwt_secret(args.jwt_secret_file.as_deref()) else {
        std::process::exit(1);
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|e| {
            error!(error = %e, "Failed to start runtime");
            std::process::exit(1);
        });

    runtime.block_on(serve(args, jwt_secret));
}

async fn serve(args: Args, jwt_secret: String) {
    let Some(db) = open_database(&args.database).await else {
        std::process::exit(1);
    };

    if let Some(username) = args.create_user.as_deref() {
        let jwt = JwtConfig::with_durations(jwt_secret.as_bytes(), args.access_ttl, args.refresh_ttl);
        handle_create_user(&db, &jwt, username, args.admin).await;
    }

    let Some(origin) = validate_origin(&args.origin) else {
        std::process::exit(1);
    };

    init_cleanup(&db).await;

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            error!(address = %addr, error = %e, "Failed to bind");
            std::process::exit(1);
        });

    let config = build_config(&args, db, &origin, jwt_secret);

    match listener.local_addr() {
        Ok(local_addr) => info!(
            address = %local_addr,
            base = config.base.as_deref().unwrap_or("/"),
            secure_cookies = config.secure_cookies,
            "Listening"
        ),
        Err(e) => error!(error = %e, "Failed to read local address"),
    }

    if let Err(e) = run_server(config, listener).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
