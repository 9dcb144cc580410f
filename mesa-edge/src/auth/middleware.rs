//! 认证中间件
//!
//! 为令牌认证和模块权限检查提供 Axum 中间件

use std::future::Future;
use std::pin::Pin;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use http::Method;
use shared::{Module, PermissionAction, Role};

use crate::AppError;
use crate::auth::{AuthState, CurrentUser};
use crate::security_log;

type MiddlewareFuture = Pin<Box<dyn Future<Output = Result<Response, AppError>> + Send>>;

/// 认证中间件 - 要求用户登录
///
/// 从 `Authorization: Bearer <token>` 头提取令牌并交给 [`TokenVerifier`](super::TokenVerifier)
/// 解析。成功后将 [`CurrentUser`] 注入请求扩展。
///
/// # 跳过认证的路径
///
/// - `OPTIONS *` (CORS 预检)
/// - 非 `/api/` 路径
/// - `/api/auth/login` (登录接口)
///
/// # 错误处理
///
/// | 错误 | HTTP 状态码 |
/// |------|------------|
/// | 无 Authorization 头 | 401 Unauthorized |
/// | 令牌过期 | 401 TokenExpired |
/// | 无效令牌 | 401 InvalidToken |
/// | 验证器不可用 | 503 |
pub async fn require_auth(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if req.method() == Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    let path = req.uri().path();
    if !path.starts_with("/api/") || path == "/api/auth/login" {
        return Ok(next.run(req).await);
    }

    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) => extract_bearer(header)
            .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?
            .to_string(),
        None => {
            security_log!("WARN", "auth_missing", uri = req.uri().path().to_string());
            return Err(AppError::unauthorized());
        }
    };

    match state.resolve(&token).await {
        Ok(user) => {
            req.extensions_mut().insert(user);
            Ok(next.run(req).await)
        }
        Err(e) => {
            security_log!(
                "WARN",
                "auth_failed",
                error = e.to_string(),
                uri = req.uri().path().to_string()
            );
            Err(e)
        }
    }
}

fn extract_bearer(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// 权限检查中间件 - 要求模块上的特定操作
///
/// 用户的角色与覆盖项由 [`PermissionEvaluator`](shared::PermissionEvaluator) 解析。
/// 关键模块 (permissions/backups/accounting/settings) 的写操作会重新向验证器
/// 解析用户，并写入 `security` 审计日志。
///
/// # 用法
///
/// ```ignore
/// Router::new()
///     .route("/api/backups", post(handler::create))
///     .layer(middleware::from_fn_with_state(
///         state.clone(),
///         require_permission(Module::Backups, PermissionAction::Create),
///     ));
/// ```
///
/// # 错误
///
/// 无权限返回 403 Forbidden
pub fn require_permission(
    module: Module,
    action: PermissionAction,
) -> impl Fn(State<AuthState>, Request, Next) -> MiddlewareFuture + Clone {
    move |State(state): State<AuthState>, req: Request, next: Next| {
        Box::pin(authorize(state, req, next, module, action))
    }
}

/// Like [`require_permission`] with the action taken from the HTTP method
///
/// GET/HEAD → view, POST → create, PUT/PATCH → edit, DELETE → delete.
pub fn require_module(
    module: Module,
) -> impl Fn(State<AuthState>, Request, Next) -> MiddlewareFuture + Clone {
    move |State(state): State<AuthState>, req: Request, next: Next| {
        Box::pin(async move {
            if req.method() == Method::OPTIONS {
                return Ok(next.run(req).await);
            }
            let action = action_for_method(req.method()).ok_or_else(|| {
                AppError::Validation(format!("Unsupported method: {}", req.method()))
            })?;
            authorize(state, req, next, module, action).await
        })
    }
}

/// 角色检查中间件 - 要求特定角色
///
/// 用于不属于任何模块的路由。非该角色返回 403 (`E2002`)。
pub fn require_role(
    role: Role,
) -> impl Fn(State<AuthState>, Request, Next) -> MiddlewareFuture + Clone {
    move |State(_): State<AuthState>, req: Request, next: Next| {
        Box::pin(async move {
            let caller = req.current_user()?;
            if caller.role() != Some(role) {
                security_log!(
                    "WARN",
                    "role_required",
                    user_id = caller.id().to_string(),
                    username = caller.username().to_string(),
                    user_role = caller.user.role.clone(),
                    required_role = role.as_str()
                );
                return Err(AppError::role_required(format!("Role required: {role}")));
            }
            Ok(next.run(req).await)
        })
    }
}

/// Permission action implied by an HTTP method
pub fn action_for_method(method: &Method) -> Option<PermissionAction> {
    if method == Method::GET || method == Method::HEAD {
        Some(PermissionAction::View)
    } else if method == Method::POST {
        Some(PermissionAction::Create)
    } else if method == Method::PUT || method == Method::PATCH {
        Some(PermissionAction::Edit)
    } else if method == Method::DELETE {
        Some(PermissionAction::Delete)
    } else {
        None
    }
}

async fn authorize(
    state: AuthState,
    mut req: Request,
    next: Next,
    module: Module,
    action: PermissionAction,
) -> Result<Response, AppError> {
    let caller = req
        .extensions()
        .get::<CurrentUser>()
        .cloned()
        .ok_or(AppError::unauthorized())?;

    let critical_write = module.is_critical() && action.is_mutating();
    let caller = if critical_write {
        // 关键模块写操作不沿用认证时的用户快照
        let fresh = state.resolve(caller.token()).await?;
        req.extensions_mut().insert(fresh.clone());
        fresh
    } else {
        caller
    };

    if !state
        .evaluator
        .user_has_permission(&caller.user, module, action)
    {
        security_log!(
            "WARN",
            "permission_denied",
            user_id = caller.id().to_string(),
            username = caller.username().to_string(),
            user_role = caller.user.role.clone(),
            module = module.key(),
            action = action.as_str()
        );
        // 矩阵缺项属于配置缺陷，单独报错
        let unconfigured = caller
            .role()
            .filter(|role| state.evaluator.matrix().actions(*role, module).is_none());
        if let Some(role) = unconfigured {
            return Err(AppError::module_not_configured(format!(
                "Module {module} is not configured for role {role}"
            )));
        }
        let message = format!("Permission denied: {action} on {module}");
        return Err(if module.is_critical() {
            AppError::critical_denied(message)
        } else {
            AppError::forbidden(message)
        });
    }

    if critical_write {
        security_log!(
            "INFO",
            "critical_mutation",
            user_id = caller.id().to_string(),
            username = caller.username().to_string(),
            module = module.key(),
            action = action.as_str(),
            uri = req.uri().path().to_string()
        );
    }

    Ok(next.run(req).await)
}

/// 从请求中提取 CurrentUser 的扩展方法
pub trait CurrentUserExt {
    /// 未认证返回 401 Unauthorized
    fn current_user(&self) -> Result<&CurrentUser, AppError>;
}

impl CurrentUserExt for Request {
    fn current_user(&self) -> Result<&CurrentUser, AppError> {
        self.extensions()
            .get::<CurrentUser>()
            .ok_or(AppError::unauthorized())
    }
}
