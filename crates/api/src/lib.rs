//! # Users API
//!
//! 用户服务的REST API模块，基于Axum构建。
//!
//! ## 概述
//!
//! - 用户管理（注册、查询、更新、删除）
//! - JWT认证（登录、个人资料）
//! - Prometheus指标端点（HTTP Basic认证）
//! - 健康检查
//!
//! 每个请求都经过同一条可观测性管道：请求span、HTTP指标、`X-Trace-ID`
//! 响应头，以及统一的JSON错误体。
//!
//! ## API 端点
//!
//! - `GET /health` - 健康检查
//! - `GET /metrics` - Prometheus指标
//! - `POST /users` - 注册用户
//! - `GET /users` - 获取用户列表
//! - `GET /users/simulate-latency` - 延迟后获取用户列表
//! - `GET /users/{id}` - 获取用户详情
//! - `PATCH /users/{id}` - 更新用户
//! - `DELETE /users/{id}` - 删除用户
//! - `POST /auth/login` - 登录
//! - `GET /auth/profile` - 当前用户信息
//!
//! ## 错误响应
//!
//! ```json
//! {
//!   "statusCode": 404,
//!   "timestamp": "2024-01-01T00:00:00.000Z",
//!   "path": "/users/42",
//!   "message": "User with identifier 42 not found",
//!   "error": "Not Found"
//! }
//! ```

pub mod auth;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod metrics_guard;
pub mod middleware;
pub mod routes;

pub use auth::{AuthError, AuthenticatedUser, Claims, JwtService};
pub use error::{ApiError, ApiResult};
pub use extract::ValidatedJson;
pub use routes::{create_app, routes, with_observability, AppState};
