pub mod handlers;
pub mod page;

use actix_web::{middleware::Logger, web, App, HttpServer};

use crate::byteplus::SeedreamClient;

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(handlers::index))
        .route("/", web::post().to(handlers::generate));
}

/// Serves the form on `0.0.0.0:port` until the process is stopped.
pub async fn run(client: SeedreamClient, port: u16) -> std::io::Result<()> {
    let client = web::Data::new(client);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%a \"%r\" %s %Dms"))
            .app_data(client.clone())
            .configure(routes)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
