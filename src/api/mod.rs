use crate::engine::EngineError;
use crate::service::{ScanFileRequest, ScannerService, VersionRequest};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::net::SocketAddr;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: chrono::Utc::now(),
        }
    }

    fn failed(data: Option<T>, error: String) -> Self {
        Self {
            success: false,
            data,
            error: Some(error),
            timestamp: chrono::Utc::now(),
        }
    }
}

pub struct ApiServer {
    addr: SocketAddr,
    api_key: Option<String>,
    max_message_size: u64,
}

impl ApiServer {
    pub fn new(addr: SocketAddr, api_key: Option<String>, max_message_size: u64) -> Self {
        Self {
            addr,
            api_key,
            max_message_size,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub async fn start(&self, service: ScannerService) -> Result<(), anyhow::Error> {
        let routes = Self::routes(service, self.api_key.clone(), self.max_message_size);

        log::info!("API服务器启动，监听: {}", self.addr);
        warp::serve(routes).run(self.addr).await;

        Ok(())
    }

    pub fn routes(
        service: ScannerService,
        api_key: Option<String>,
        max_message_size: u64,
    ) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
        let log = warp::log("multiav::api");

        Self::service_routes(service, api_key, max_message_size)
            .or(Self::health_routes())
            .recover(Self::handle_rejection)
            .with(log)
    }

    fn service_routes(
        service: ScannerService,
        api_key: Option<String>,
        max_message_size: u64,
    ) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
        let service_filter = warp::any().map(move || service.clone());
        let auth_filter = warp::header::optional("X-API-Key")
            .and(warp::any().map(move || api_key.clone()))
            .and_then(|key: Option<String>, expected_key: Option<String>| async move {
                match expected_key {
                    Some(expected) if key.as_ref() != Some(&expected) => {
                        Err(warp::reject::custom(ApiError::Unauthorized))
                    }
                    _ => Ok::<_, Rejection>(()),
                }
            })
            .untuple_one();

        let version_route = warp::path!("api" / "v1" / "version")
            .and(warp::post())
            .and(auth_filter.clone())
            .and(warp::body::content_length_limit(max_message_size))
            .and(warp::body::json())
            .and(service_filter.clone())
            .and_then(Self::handle_version);

        let scan_route = warp::path!("api" / "v1" / "scan")
            .and(warp::post())
            .and(auth_filter.clone())
            .and(warp::body::content_length_limit(max_message_size))
            .and(warp::body::json())
            .and(service_filter.clone())
            .and_then(Self::handle_scan);

        let database_route = warp::path!("api" / "v1" / "database")
            .and(warp::get())
            .and(auth_filter)
            .and(service_filter)
            .and_then(Self::handle_database);

        version_route.or(scan_route).or(database_route)
    }

    fn health_routes() -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
        warp::path!("health").and(warp::get()).map(|| {
            let response = ApiResponse::<()> {
                success: true,
                data: None,
                error: None,
                timestamp: chrono::Utc::now(),
            };
            warp::reply::json(&response)
        })
    }

    async fn handle_version(
        request: VersionRequest,
        service: ScannerService,
    ) -> Result<warp::reply::Response, Rejection> {
        Ok(match service.get_version(request).await {
            Ok(response) => reply(ApiResponse::ok(response), StatusCode::OK),
            Err(e) => Self::engine_failure::<crate::service::VersionResponse>(None, &e),
        })
    }

    async fn handle_scan(
        request: ScanFileRequest,
        service: ScannerService,
    ) -> Result<warp::reply::Response, Rejection> {
        Ok(match service.scan_file(request).await {
            Ok(response) => reply(ApiResponse::ok(response), StatusCode::OK),
            Err(e) => {
                let partial = e.partial_result().map(|r| crate::service::ScanResponse {
                    infected: r.infected,
                    output: r.output.clone(),
                });
                Self::engine_failure(partial, &e)
            }
        })
    }

    async fn handle_database(service: ScannerService) -> Result<warp::reply::Response, Rejection> {
        Ok(match service.get_database_version().await {
            Ok(info) => reply(ApiResponse::ok(info), StatusCode::OK),
            Err(e) => Self::engine_failure::<crate::engine::EngineVersionInfo>(None, &e),
        })
    }

    fn engine_failure<T: Serialize>(data: Option<T>, error: &EngineError) -> warp::reply::Response {
        let status = match error {
            EngineError::Unsupported { .. } => StatusCode::NOT_IMPLEMENTED,
            _ => StatusCode::BAD_GATEWAY,
        };
        reply(ApiResponse::failed(data, error.to_string()), status)
    }

    async fn handle_rejection(rejection: Rejection) -> Result<warp::reply::Response, Infallible> {
        let (status, message) = if let Some(e) = rejection.find::<ApiError>() {
            (e.status(), e.to_string())
        } else if rejection.is_not_found() {
            (StatusCode::NOT_FOUND, ApiError::NotFound.to_string())
        } else if rejection.find::<warp::reject::PayloadTooLarge>().is_some() {
            (StatusCode::PAYLOAD_TOO_LARGE, "请求体过大".to_string())
        } else if let Some(e) = rejection.find::<warp::filters::body::BodyDeserializeError>() {
            (
                StatusCode::BAD_REQUEST,
                ApiError::ValidationError(e.to_string()).to_string(),
            )
        } else if rejection.find::<warp::reject::MethodNotAllowed>().is_some() {
            (StatusCode::METHOD_NOT_ALLOWED, "不支持的请求方法".to_string())
        } else {
            log::error!("未处理的请求拒绝: {:?}", rejection);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::InternalError(format!("{:?}", rejection)).to_string(),
            )
        };

        Ok(reply(ApiResponse::<()>::failed(None, message), status))
    }
}

fn reply<T: Serialize>(body: ApiResponse<T>, status: StatusCode) -> warp::reply::Response {
    warp::reply::with_status(warp::reply::json(&body), status).into_response()
}

#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    NotFound,
    InternalError(String),
    ValidationError(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl warp::reject::Reject for ApiError {}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Unauthorized => write!(f, "未授权访问"),
            ApiError::NotFound => write!(f, "资源不存在"),
            ApiError::InternalError(e) => write!(f, "内部错误: {}", e),
            ApiError::ValidationError(e) => write!(f, "验证错误: {}", e),
        }
    }
}
