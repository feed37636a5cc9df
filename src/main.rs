mod handlers;
mod middleware;
mod models;
mod services;
mod utils;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use utils::{config::Config, db::establish_connection};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file FIRST before anything else
    dotenv::dotenv().ok();

    // Initialize logger with default level if RUST_LOG not set
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("=================================================");
    println!("🏫 SAE Backend Server");
    println!("=================================================");

    // Load configuration
    let config = Config::from_env().expect("Failed to load configuration");
    let host = config.host.clone();
    let port = config.port;

    println!("📝 Configuration loaded:");
    println!(
        "   - Database: {}",
        config.database_url.split('@').last().unwrap_or("***")
    );
    println!("   - Host: {}", host);
    println!("   - Port: {}", port);
    println!(
        "   - Campus: ({}, {}) within {} m",
        config.campus_latitude, config.campus_longitude, config.campus_radius_meters
    );
    println!("   - UTC offset: {}h", config.utc_offset_hours);
    println!(
        "   - Registration: {}",
        if config.allow_registration {
            "ENABLED"
        } else {
            "DISABLED"
        }
    );
    println!(
        "   - Log level: {}",
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string())
    );

    // Establish database connection
    print!("🔌 Connecting to database... ");
    let db = establish_connection(&config.database_url)
        .await
        .expect("Failed to connect to database");
    println!("✅ Connected!");

    log::info!("Database connection established");

    // Start the auto-absence scheduler
    log::info!("Starting auto-absence scheduler");
    services::absence_scheduler::start_absence_scheduler(db.clone(), config.clone());

    // Start HTTP server
    println!("🌐 Starting HTTP server at http://{}:{}", host, port);
    println!("📍 Available endpoints:");
    println!("   - POST http://{}:{}/api/auth/register", host, port);
    println!("   - POST http://{}:{}/api/auth/login", host, port);
    println!(
        "   - POST http://{}:{}/api/class-schedules (JWT required)",
        host, port
    );
    println!(
        "   - PUT  http://{}:{}/api/class-schedule/:id (JWT required)",
        host, port
    );
    println!(
        "   - POST http://{}:{}/api/register-by-turn (JWT required)",
        host, port
    );
    println!(
        "   - POST http://{}:{}/api/attendance/auto-absence (JWT required)",
        host, port
    );
    println!("=================================================");

    log::info!("Server started at http://{}:{}", host, port);

    HttpServer::new(move || {
        // Strict CORS for authenticated API endpoints
        let cors = Cors::default()
            .allowed_origin("http://localhost:5173")
            .allowed_origin("http://localhost:3000")
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::ACCEPT,
                actix_web::http::header::CONTENT_TYPE,
            ])
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(db.clone()))
            .app_data(web::Data::new(config.clone()))
            .wrap(Logger::default())
            .wrap(cors) // CORS must be wrapped AFTER Logger to ensure headers are added to all responses
            .service(
                web::scope("/api")
                    // Public endpoints (no authentication required)
                    .service(
                        web::scope("/auth")
                            .route("/register", web::post().to(handlers::auth::register))
                            .route("/login", web::post().to(handlers::auth::login)),
                    )
                    // Schedule management (JWT required)
                    .service(
                        web::scope("/class-schedules")
                            .wrap(crate::middleware::auth::JwtMiddleware)
                            .route(
                                "",
                                web::post().to(handlers::class_schedules::create_schedule),
                            )
                            .route("", web::get().to(handlers::class_schedules::list_schedules))
                            .route(
                                "/filter",
                                web::get().to(handlers::class_schedules::filter_schedules),
                            )
                            .route(
                                "/{id}/details",
                                web::get().to(handlers::class_schedules::schedule_details),
                            ),
                    )
                    .service(
                        web::scope("/class-schedule")
                            .wrap(crate::middleware::auth::JwtMiddleware)
                            .route(
                                "/{id}",
                                web::put().to(handlers::class_schedules::update_schedule),
                            ),
                    )
                    // Teacher check-in (JWT required)
                    .service(
                        web::scope("/register-by-turn")
                            .wrap(crate::middleware::auth::JwtMiddleware)
                            .route("", web::post().to(handlers::attendance::register_by_turn))
                            .route("", web::get().to(handlers::attendance::attendance_history)),
                    )
                    // Absence run trigger (JWT required)
                    .service(
                        web::scope("/attendance")
                            .wrap(crate::middleware::auth::JwtMiddleware)
                            .route(
                                "/auto-absence",
                                web::post().to(handlers::attendance::trigger_auto_absence),
                            ),
                    ),
            )
    })
    .bind((host, port))?
    .run()
    .await
}
