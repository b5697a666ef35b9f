use actix_web::{
    HttpResponse, get, post,
    web::{Data, Path, ServiceConfig, scope},
};
use actix_web_validator::Json;
use uuid::Uuid;

use super::dto::{BusinessSwipeRequest, WorkerSwipeRequest};
use super::service::SwipeService;
use crate::error::ServiceError;
use crate::matching::SwipeEvent;

#[post("/workers/{worker_id}")]
async fn worker_swipe(
    service: Data<SwipeService>,
    worker_id: Path<Uuid>,
    body: Json<WorkerSwipeRequest>,
) -> Result<HttpResponse, ServiceError> {
    let event = SwipeEvent::worker(worker_id.into_inner(), body.job_id, body.decision);
    let response = service.swipe(event).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[post("/businesses/{business_id}")]
async fn business_swipe(
    service: Data<SwipeService>,
    business_id: Path<Uuid>,
    body: Json<BusinessSwipeRequest>,
) -> Result<HttpResponse, ServiceError> {
    let event = SwipeEvent::business(business_id.into_inner(), body.worker_id, body.decision);
    let response = service.swipe(event).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[get("/{worker_id}/{job_id}")]
async fn pair_state(service: Data<SwipeService>, path: Path<(Uuid, Uuid)>) -> Result<HttpResponse, ServiceError> {
    let (worker_id, job_id) = path.into_inner();
    let response = service.pair(worker_id, job_id).await?;
    Ok(HttpResponse::Ok().json(response))
}

pub fn swipe_config(config: &mut ServiceConfig) {
    config
        .service(scope("swipes").service(worker_swipe).service(business_swipe))
        .service(scope("pairs").service(pair_state));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::validation::json_config;
    use crate::db::{memory::MemoryStore, DocPath, DocumentStore, SharedStore, WriteOp};
    use crate::matching::{MatchDetector, SharedDetector};
    use crate::models::job::tests::job;
    use crate::models::user::tests::{business, worker};
    use actix_web::{http::StatusCode, test, App};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[actix_web::test]
    async fn like_after_dislike_is_conflict() {
        let (w, b, j) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let store: SharedStore = Arc::new(MemoryStore::new());
        store
            .commit(&[
                WriteOp::set(DocPath::user(w), &worker(w)).unwrap(),
                WriteOp::set(DocPath::user(b), &business(b)).unwrap(),
                WriteOp::set(DocPath::job(j), &job(j, b)).unwrap(),
            ])
            .await
            .unwrap();
        let detector: SharedDetector = Arc::new(Mutex::new(MatchDetector::hydrate(store.as_ref()).await.unwrap()));
        let app = test::init_service(
            App::new()
                .app_data(Data::new(SwipeService::new(store, detector)))
                .app_data(json_config())
                .configure(swipe_config),
        )
        .await;

        let uri = format!("/swipes/workers/{}", w);
        let req = test::TestRequest::post()
            .uri(&uri)
            .set_json(json!({"job_id": j, "decision": "dislike"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::post()
            .uri(&uri)
            .set_json(json!({"job_id": j, "decision": "like"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let req = test::TestRequest::get().uri(&format!("/pairs/{}/{}", w, j)).to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["state"], "declined");
    }

    #[actix_web::test]
    async fn unknown_decision_is_bad_request() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let detector: SharedDetector = Arc::new(Mutex::new(MatchDetector::new()));
        let app = test::init_service(
            App::new()
                .app_data(Data::new(SwipeService::new(store, detector)))
                .app_data(json_config())
                .configure(swipe_config),
        )
        .await;

        let req = test::TestRequest::post()
            .uri(&format!("/swipes/workers/{}", Uuid::new_v4()))
            .set_json(json!({"job_id": Uuid::new_v4(), "decision": "superlike"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
