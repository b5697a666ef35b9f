use actix_web::{
    HttpResponse, delete, get, post, route,
    web::{self, Data, Path, ServiceConfig, scope},
};
use actix_web_validator::Json;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::dto::{CreateWorkerRequest, DeletedResponse, WorkerResponse};
use super::service::WorkerService;
use crate::error::ServiceError;

#[get("")]
async fn list_workers(service: Data<WorkerService>) -> Result<HttpResponse, ServiceError> {
    let workers = service.list().await?;
    Ok(HttpResponse::Ok().json(workers))
}

#[get("/{id}")]
async fn get_worker(service: Data<WorkerService>, id: Path<Uuid>) -> Result<HttpResponse, ServiceError> {
    let worker = service.get(id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(worker))
}

#[post("")]
async fn create_worker(
    service: Data<WorkerService>,
    body: Json<CreateWorkerRequest>,
) -> Result<HttpResponse, ServiceError> {
    let worker = service.create(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(WorkerResponse {
        message: "Worker created successfully".to_string(),
        worker,
    }))
}

#[route("/{id}", method = "PATCH", method = "PUT")]
async fn update_worker(
    service: Data<WorkerService>,
    id: Path<Uuid>,
    body: web::Json<Map<String, Value>>,
) -> Result<HttpResponse, ServiceError> {
    let worker = service.update(id.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(WorkerResponse {
        message: "Worker updated successfully".to_string(),
        worker,
    }))
}

#[delete("/{id}")]
async fn delete_worker(service: Data<WorkerService>, id: Path<Uuid>) -> Result<HttpResponse, ServiceError> {
    let id = id.into_inner();
    service.delete(id).await?;
    Ok(HttpResponse::Ok().json(DeletedResponse {
        message: "Worker deleted successfully".to_string(),
        id,
    }))
}

pub fn worker_config(config: &mut ServiceConfig) {
    config.service(
        scope("workers")
            .service(list_workers)
            .service(create_worker)
            .service(get_worker)
            .service(update_worker)
            .service(delete_worker),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::validation::json_config;
    use crate::db::{memory::MemoryStore, SharedStore};
    use crate::matching::{MatchDetector, SharedDetector};
    use actix_web::{http::StatusCode, test, App};
    use serde_json::json;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    fn worker_service() -> Data<WorkerService> {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let detector: SharedDetector = Arc::new(Mutex::new(MatchDetector::new()));
        Data::new(WorkerService::new(store, detector))
    }

    fn body() -> Value {
        json!({
            "email": "noa@example.com",
            "firstName": "Noa",
            "lastName": "Bar",
            "username": "noa",
            "experience_level": "Entry-level",
            "salary_min": 10.0,
            "salary_max": 20.0,
            "salary_unit": "hour",
            "location_lat": 31.0,
            "location_lng": 35.0
        })
    }

    #[actix_web::test]
    async fn create_then_fetch_worker() {
        let app = test::init_service(
            App::new()
                .app_data(worker_service())
                .app_data(json_config())
                .configure(worker_config),
        )
        .await;

        let req = test::TestRequest::post().uri("/workers").set_json(body()).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: Value = test::read_body_json(resp).await;
        let id = created["worker"]["id"].as_str().unwrap().to_string();
        assert_eq!(created["worker"]["role"], "Worker");

        let req = test::TestRequest::get().uri(&format!("/workers/{}", id)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn invalid_coordinates_are_rejected() {
        let app = test::init_service(
            App::new()
                .app_data(worker_service())
                .app_data(json_config())
                .configure(worker_config),
        )
        .await;

        let mut invalid = body();
        invalid["location_lat"] = json!(123.0);
        let req = test::TestRequest::post().uri("/workers").set_json(invalid).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn unknown_worker_is_not_found() {
        let app = test::init_service(App::new().app_data(worker_service()).configure(worker_config)).await;

        let req = test::TestRequest::get()
            .uri(&format!("/workers/{}", Uuid::new_v4()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
