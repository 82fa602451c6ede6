use std::net::TcpListener;

use actix_web::{dev::Server, middleware::Logger, web, App, HttpServer};

pub mod auth;
pub mod config;
pub mod cors;
pub mod error;
pub mod proxy;

pub use config::Config;
pub use error::{ErrorEnvelope, RelayError};
pub use proxy::RelayState;

pub fn app_state(config: Config) -> web::Data<RelayState> {
    web::Data::new(RelayState::new(config))
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(proxy::health_check)
        .service(proxy::preflight)
        .service(proxy::predict_proxy);
}

/// Start serving on an already bound listener. The returned server must be awaited or spawned.
pub fn run(config: Config, listener: TcpListener) -> std::io::Result<Server> {
    let app_state = app_state(config);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(Logger::default())
            .wrap(cors::cors_headers())
            .configure(routes)
    })
    .listen(listener)?
    .run();

    Ok(server)
}
