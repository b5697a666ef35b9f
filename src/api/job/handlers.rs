use actix_web::{
    HttpResponse, delete, get, post, route,
    web::{self, Data, Path, Query, ServiceConfig, scope},
};
use actix_web_validator::Json;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::dto::{DeletedResponse, JobResponse, ListJobsQuery};
use super::models::CreateJobRequest;
use super::service::JobService;
use crate::error::ServiceError;

#[get("")]
async fn list_jobs(service: Data<JobService>, query: Query<ListJobsQuery>) -> Result<HttpResponse, ServiceError> {
    let jobs = service.list(&query).await?;
    Ok(HttpResponse::Ok().json(jobs))
}

#[get("/{id}")]
async fn get_job(service: Data<JobService>, id: Path<Uuid>) -> Result<HttpResponse, ServiceError> {
    let job = service.get(id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(job))
}

#[post("")]
async fn create_job(service: Data<JobService>, body: Json<CreateJobRequest>) -> Result<HttpResponse, ServiceError> {
    let job = service.create(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(JobResponse {
        message: "Job created successfully".to_string(),
        job,
    }))
}

#[route("/{id}", method = "PATCH", method = "PUT")]
async fn update_job(
    service: Data<JobService>,
    id: Path<Uuid>,
    body: web::Json<Map<String, Value>>,
) -> Result<HttpResponse, ServiceError> {
    let job = service.update(id.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(JobResponse {
        message: "Job updated successfully".to_string(),
        job,
    }))
}

#[delete("/{id}")]
async fn delete_job(service: Data<JobService>, id: Path<Uuid>) -> Result<HttpResponse, ServiceError> {
    let id = id.into_inner();
    service.delete(id).await?;
    Ok(HttpResponse::Ok().json(DeletedResponse {
        message: "Job deleted successfully".to_string(),
        id,
    }))
}

pub fn job_config(config: &mut ServiceConfig) {
    config.service(
        scope("jobs")
            .service(list_jobs)
            .service(create_job)
            .service(get_job)
            .service(update_job)
            .service(delete_job),
    );
}
