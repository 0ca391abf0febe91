use actix_web::HttpResponse;
use payflow_env::logger;

pub async fn health() -> HttpResponse {
    logger::debug!("health was called");
    HttpResponse::Ok().body("health is good")
}
