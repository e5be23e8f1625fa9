pub mod employee;

use actix_web::{error, web};

use crate::errors::AppError;

/// JSON extractor settings: malformed bodies become a 400 in the API's error shape.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        log::debug!("Rejected request body: {}", err);
        let message = match &err {
            error::JsonPayloadError::ContentType => "El cuerpo de la petición debe ser JSON",
            _ => "El cuerpo de la petición no es válido",
        };
        AppError::BadRequest(message.to_string()).into()
    })
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(
            web::resource("/employees")
                .route(web::get().to(employee::list_employees))
                .route(web::post().to(employee::create_employee)),
        )
        .service(
            web::resource("/employees/{employee_id}")
                .route(web::get().to(employee::show_employee))
                .route(web::put().to(employee::update_employee))
                .route(web::patch().to(employee::update_employee))
                .route(web::delete().to(employee::delete_employee)),
        );
}
