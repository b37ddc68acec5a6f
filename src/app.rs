//! app.rs
use crate::handlers::{campaign_handler, dispatch_handler, recipient_handler, template_handler};
use actix_web::web;

pub fn init_app(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(
                web::scope("/recipients")
                    .route("", web::post().to(recipient_handler::create_recipient_endpoint))
                    .route("", web::get().to(recipient_handler::list_recipients_endpoint))
                    .route("/{id}", web::get().to(recipient_handler::get_recipient_endpoint))
                    .route("/{id}", web::put().to(recipient_handler::update_recipient_endpoint))
                    .route(
                        "/{id}",
                        web::delete().to(recipient_handler::delete_recipient_endpoint),
                    ),
            )
            .service(
                web::scope("/templates")
                    .route("", web::post().to(template_handler::create_template_endpoint))
                    .route("", web::get().to(template_handler::list_templates_endpoint))
                    .route("/{id}", web::get().to(template_handler::get_template_endpoint))
                    .route("/{id}", web::put().to(template_handler::update_template_endpoint))
                    .route(
                        "/{id}",
                        web::delete().to(template_handler::delete_template_endpoint),
                    ),
            )
            .service(
                web::scope("/campaigns")
                    .route("", web::post().to(campaign_handler::create_campaign_endpoint))
                    .route("", web::get().to(campaign_handler::list_campaigns_endpoint))
                    .route("/{id}", web::get().to(campaign_handler::get_campaign_endpoint))
                    .route("/{id}", web::put().to(campaign_handler::update_campaign_endpoint))
                    .route(
                        "/{id}",
                        web::delete().to(campaign_handler::delete_campaign_endpoint),
                    ),
            )
            .route("/logs", web::get().to(dispatch_handler::list_logs_endpoint))
            .service(
                web::scope("/dispatch")
                    .route("/run", web::post().to(dispatch_handler::run_dispatch_endpoint)),
            ),
    );
}
