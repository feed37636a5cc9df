use serde::Deserialize;
use std::env;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub allow_registration: bool,
    /// Campus reference point for check-in geofencing.
    pub campus_latitude: f64,
    pub campus_longitude: f64,
    pub campus_radius_meters: f64,
    /// Offset applied to UTC to get campus wall-clock time (e.g. -3 for Brasília).
    pub utc_offset_hours: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv::dotenv().ok();

        Ok(Config {
            database_url: env::var("DATABASE_URL")?,
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("PORT must be a number"),
            jwt_secret: env::var("JWT_SECRET")?,
            jwt_expiration_hours: env::var("JWT_EXPIRATION_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .expect("JWT_EXPIRATION_HOURS must be a number"),
            allow_registration: env::var("ALLOW_REGISTRATION")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .expect("ALLOW_REGISTRATION must be true or false"),
            campus_latitude: env::var("CAMPUS_LATITUDE")?
                .parse()
                .expect("CAMPUS_LATITUDE must be a number"),
            campus_longitude: env::var("CAMPUS_LONGITUDE")?
                .parse()
                .expect("CAMPUS_LONGITUDE must be a number"),
            campus_radius_meters: env::var("CAMPUS_RADIUS_METERS")
                .unwrap_or_else(|_| "200".to_string())
                .parse()
                .expect("CAMPUS_RADIUS_METERS must be a number"),
            utc_offset_hours: env::var("UTC_OFFSET_HOURS")
                .unwrap_or_else(|_| "-3".to_string())
                .parse()
                .expect("UTC_OFFSET_HOURS must be a number"),
        })
    }
}
