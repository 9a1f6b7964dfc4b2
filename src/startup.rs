use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::AuthService;
use crate::logger::RequestLogger;
use crate::middleware::JwtMiddleware;
use crate::routes::{
    create_user, delete_user, get_current_user, get_user, health_check, list_users, login, logout,
    refresh, register,
};
use crate::store::UserStore;

/// Build the HTTP server on `listener`.
///
/// `auth` and `store` are shared by every worker; the store handed to the
/// auth service and the one serving `/users` should be the same instance.
pub fn run(
    listener: TcpListener,
    auth: AuthService,
    store: Arc<dyn UserStore>,
) -> Result<Server, std::io::Error> {
    let auth = web::Data::new(auth);
    let store: web::Data<dyn UserStore> = web::Data::from(store);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(RequestLogger)
            .wrap(Logger::default())
            .app_data(auth.clone())
            .app_data(store.clone())
            .route("/health_check", web::get().to(health_check))
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(register))
                    .route("/login", web::post().to(login))
                    .route("/refresh", web::post().to(refresh))
                    .service(
                        web::resource("/logout")
                            .wrap(JwtMiddleware::new(auth.clone()))
                            .route(web::post().to(logout)),
                    )
                    .service(
                        web::resource("/me")
                            .wrap(JwtMiddleware::new(auth.clone()))
                            .route(web::get().to(get_current_user)),
                    ),
            )
            .service(
                web::scope("/users")
                    .wrap(JwtMiddleware::new(auth.clone()))
                    .route("", web::get().to(list_users))
                    .route("", web::post().to(create_user))
                    .route("/{user_id}", web::get().to(get_user))
                    .route("/{user_id}", web::delete().to(delete_user)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
