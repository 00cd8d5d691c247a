use actix_web::web::ServiceConfig;

mod health;
mod monitors;

pub fn routes(cfg: &mut ServiceConfig) {
    health::routes(cfg);
    monitors::routes(cfg);
}
